use crate::{PacketReader, PacketWriter, PROTOCOL_VERSION, STRING_LENGTH};

// Server-to-client packet IDs
pub const SERVER_IDENTIFICATION: u8 = 0x00;
pub const SERVER_LEVEL_INITIALIZE: u8 = 0x02;
pub const SERVER_LEVEL_DATA_CHUNK: u8 = 0x03;
pub const SERVER_LEVEL_FINALIZE: u8 = 0x04;
pub const SERVER_SET_BLOCK: u8 = 0x06;
pub const SERVER_SPAWN_PLAYER: u8 = 0x07;
pub const SERVER_TELEPORT: u8 = 0x08;
pub const SERVER_POSITION_UPDATE: u8 = 0x09;
pub const SERVER_DESPAWN_PLAYER: u8 = 0x0c;
pub const SERVER_MESSAGE: u8 = 0x0d;
pub const SERVER_DISCONNECT: u8 = 0x0e;

// Client-to-server packet IDs
pub const CLIENT_IDENTIFICATION: u8 = 0x00;
pub const CLIENT_SET_BLOCK: u8 = 0x05;
pub const CLIENT_POSITION: u8 = 0x08;
pub const CLIENT_MESSAGE: u8 = 0x0d;

/// Sent from the server to the client.
///
/// All positions are fixed-point pixels (1 block = 32 pixels). Spawn
/// coordinates held in whole blocks convert once, at session init, with
/// `(block << 5) + 16`; packet construction does no conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientBound<'a> {
    ServerIdentification {
        name: &'a str,
        motd: &'a str,
        op: bool,
    },
    LevelInitialize,
    LevelDataChunk {
        data: &'a [u8],
        percent: u8,
    },
    LevelFinalize {
        width: i16,
        height: i16,
        depth: i16,
    },
    SetBlock {
        x: i16,
        y: i16,
        z: i16,
        block: u8,
    },
    SpawnPlayer {
        id: u8,
        name: &'a str,
        x: i16,
        y: i16,
        z: i16,
        yaw: u8,
        pitch: u8,
    },
    /// Absolute position update (the client treats id 0xff as itself).
    Teleport {
        id: u8,
        x: i16,
        y: i16,
        z: i16,
        yaw: u8,
        pitch: u8,
    },
    /// Relative movement; the deltas are wrapping 8-bit pixel offsets.
    PositionUpdate {
        id: u8,
        dx: i8,
        dy: i8,
        dz: i8,
        yaw: u8,
        pitch: u8,
    },
    DespawnPlayer {
        id: u8,
    },
    Message {
        source: u8,
        text: &'a str,
    },
    Disconnect {
        reason: &'a str,
    },
}

impl ClientBound<'_> {
    pub fn write(&self, w: &mut PacketWriter) {
        match *self {
            Self::ServerIdentification { name, motd, op } => {
                w.write_byte(SERVER_IDENTIFICATION);
                w.write_byte(PROTOCOL_VERSION);
                w.write_string(name);
                w.write_string(motd);
                w.write_byte(if op { 0x64 } else { 0x00 });
            }
            Self::LevelInitialize => {
                w.write_byte(SERVER_LEVEL_INITIALIZE);
            }
            Self::LevelDataChunk { data, percent } => {
                w.write_byte(SERVER_LEVEL_DATA_CHUNK);
                w.write_short(data.len() as i16);
                w.write_byte_array(data);
                w.write_byte(percent);
            }
            Self::LevelFinalize {
                width,
                height,
                depth,
            } => {
                w.write_byte(SERVER_LEVEL_FINALIZE);
                w.write_short(width);
                w.write_short(height);
                w.write_short(depth);
            }
            Self::SetBlock { x, y, z, block } => {
                w.write_byte(SERVER_SET_BLOCK);
                w.write_short(x);
                w.write_short(y);
                w.write_short(z);
                w.write_byte(block);
            }
            Self::SpawnPlayer {
                id,
                name,
                x,
                y,
                z,
                yaw,
                pitch,
            } => {
                w.write_byte(SERVER_SPAWN_PLAYER);
                w.write_byte(id);
                w.write_string(name);
                w.write_short(x);
                w.write_short(y);
                w.write_short(z);
                w.write_byte(yaw);
                w.write_byte(pitch);
            }
            Self::Teleport {
                id,
                x,
                y,
                z,
                yaw,
                pitch,
            } => {
                w.write_byte(SERVER_TELEPORT);
                w.write_byte(id);
                w.write_short(x);
                w.write_short(y);
                w.write_short(z);
                w.write_byte(yaw);
                w.write_byte(pitch);
            }
            Self::PositionUpdate {
                id,
                dx,
                dy,
                dz,
                yaw,
                pitch,
            } => {
                w.write_byte(SERVER_POSITION_UPDATE);
                w.write_byte(id);
                w.write_byte(dx as u8);
                w.write_byte(dy as u8);
                w.write_byte(dz as u8);
                w.write_byte(yaw);
                w.write_byte(pitch);
            }
            Self::DespawnPlayer { id } => {
                w.write_byte(SERVER_DESPAWN_PLAYER);
                w.write_byte(id);
            }
            Self::Message { source, text } => {
                w.write_byte(SERVER_MESSAGE);
                w.write_byte(source);
                w.write_string(text);
            }
            Self::Disconnect { reason } => {
                w.write_byte(SERVER_DISCONNECT);
                w.write_string(reason);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = PacketWriter::new();
        self.write(&mut w);
        w.into_inner()
    }
}

/// Sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerBound {
    Identification {
        protocol: u8,
        username: String,
        verification_key: String,
    },
    SetBlock {
        x: i16,
        y: i16,
        z: i16,
        /// 0x00 = destroy, 0x01 = create.
        mode: u8,
        block: u8,
    },
    Position {
        x: i16,
        y: i16,
        z: i16,
        yaw: u8,
        pitch: u8,
    },
    Message {
        text: String,
    },
}

impl ServerBound {
    /// Body length (excluding the ID byte) of each inbound packet, or
    /// `None` for an unknown ID.
    pub fn body_len(id: u8) -> Option<usize> {
        match id {
            CLIENT_IDENTIFICATION => Some(1 + STRING_LENGTH + STRING_LENGTH + 1),
            CLIENT_SET_BLOCK => Some(2 + 2 + 2 + 1 + 1),
            CLIENT_POSITION => Some(1 + 2 + 2 + 2 + 1 + 1),
            CLIENT_MESSAGE => Some(1 + STRING_LENGTH),
            _ => None,
        }
    }

    /// Parses the body of a packet whose ID byte has already been read.
    pub fn parse(id: u8, body: &[u8]) -> Option<Self> {
        let mut r = PacketReader::new(body);

        match id {
            CLIENT_IDENTIFICATION => {
                let protocol = r.read_byte();
                let username = r.read_string();
                let verification_key = r.read_string();
                // trailing unused byte
                Some(Self::Identification {
                    protocol,
                    username,
                    verification_key,
                })
            }
            CLIENT_SET_BLOCK => Some(Self::SetBlock {
                x: r.read_short(),
                y: r.read_short(),
                z: r.read_short(),
                mode: r.read_byte(),
                block: r.read_byte(),
            }),
            CLIENT_POSITION => {
                // the leading player-ID byte is always 0xff from the
                // client and carries no information
                r.advance(1);
                Some(Self::Position {
                    x: r.read_short(),
                    y: r.read_short(),
                    z: r.read_short(),
                    yaw: r.read_byte(),
                    pitch: r.read_byte(),
                })
            }
            CLIENT_MESSAGE => {
                r.advance(1);
                Some(Self::Message {
                    text: r.read_string(),
                })
            }
            _ => None,
        }
    }
}

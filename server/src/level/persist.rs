use super::{BlockUpdate, Kind, Level, Spawnpoint, BLOCK_UPDATE_SIZE};
use protocol::codec;
use thiserror::Error;

const PLAIN_MAGIC: &[u8; 5] = b"LEVEL";
const CHAIN_MAGIC: &[u8; 5] = b"CHAIN";
const FORMAT_VERSION: u8 = 0x01;

// magic(5) version(1) dims(3x2) spawn(3x2) yaw(1) pitch(1)
const HEADER_SIZE: usize = 5 + 1 + 2 + 2 + 2 + 2 + 2 + 2 + 1 + 1;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("unrecognized level format")]
    BadMagic,
    #[error("unsupported level format version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("level file is truncated")]
    Truncated,
    #[error("level dimensions are invalid")]
    BadDimensions,
    #[error("block update {hash} contains an invalid previous block hash")]
    BrokenChain { hash: String },
    #[error("block update {hash} contains an invalid position")]
    OutOfBounds { hash: String },
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

impl Level {
    /// On-disk serialization: the 20-byte header followed by either the
    /// raw block array (`LEVEL`) or the packed update chain (`CHAIN`).
    /// The file itself is this, gzip-wrapped.
    pub fn serialize(&self) -> Vec<u8> {
        let body = match self.kind {
            Kind::Plain => self.data.len(),
            Kind::Chain => self.chain.len() * BLOCK_UPDATE_SIZE,
        };
        let mut buffer = Vec::with_capacity(HEADER_SIZE + body);

        buffer.extend_from_slice(match self.kind {
            Kind::Plain => PLAIN_MAGIC,
            Kind::Chain => CHAIN_MAGIC,
        });
        buffer.push(FORMAT_VERSION);

        buffer.extend_from_slice(&codec::encode_short(self.width));
        buffer.extend_from_slice(&codec::encode_short(self.height));
        buffer.extend_from_slice(&codec::encode_short(self.depth));

        buffer.extend_from_slice(&codec::encode_short(self.spawn.x));
        buffer.extend_from_slice(&codec::encode_short(self.spawn.y));
        buffer.extend_from_slice(&codec::encode_short(self.spawn.z));
        buffer.push(self.spawn.yaw);
        buffer.push(self.spawn.pitch);

        match self.kind {
            Kind::Plain => buffer.extend_from_slice(&self.data),
            Kind::Chain => {
                for update in &self.chain {
                    buffer.extend_from_slice(&update.to_bytes());
                }
            }
        }

        buffer
    }

    /// Loads a level from its serialization. A chain body is replayed into
    /// a fresh block array, verifying every `prev_hash` link; the first
    /// violation aborts the load.
    pub fn deserialize(data: &[u8]) -> Result<Self, LevelError> {
        if data.len() < HEADER_SIZE {
            return Err(LevelError::Truncated);
        }

        let kind = match &data[0..5] {
            magic if magic == PLAIN_MAGIC => Kind::Plain,
            magic if magic == CHAIN_MAGIC => Kind::Chain,
            _ => return Err(LevelError::BadMagic),
        };

        if data[5] != FORMAT_VERSION {
            return Err(LevelError::UnsupportedVersion(data[5]));
        }

        let width = codec::decode_short(data, 6);
        let height = codec::decode_short(data, 8);
        let depth = codec::decode_short(data, 10);
        if width <= 0 || height <= 0 || depth <= 0 {
            return Err(LevelError::BadDimensions);
        }

        let spawn = Spawnpoint {
            x: codec::decode_short(data, 12),
            y: codec::decode_short(data, 14),
            z: codec::decode_short(data, 16),
            yaw: data[18],
            pitch: data[19],
        };

        let body = &data[HEADER_SIZE..];
        let mut level = Level::new(width, height, depth, spawn, kind);

        match kind {
            Kind::Plain => {
                if body.len() != level.data.len() {
                    return Err(LevelError::Truncated);
                }
                level.data.copy_from_slice(body);
            }
            Kind::Chain => {
                if body.len() % BLOCK_UPDATE_SIZE != 0 {
                    return Err(LevelError::Truncated);
                }

                for raw in body.chunks_exact(BLOCK_UPDATE_SIZE) {
                    let update = BlockUpdate::from_bytes(raw);

                    if let Some(previous) = level.chain.last() {
                        if update.prev_hash != previous.hash() {
                            return Err(LevelError::BrokenChain {
                                hash: to_hex(&update.hash()),
                            });
                        }
                    }

                    if !level.in_bounds(update.x, update.y, update.z) {
                        return Err(LevelError::OutOfBounds {
                            hash: to_hex(&update.hash()),
                        });
                    }

                    let index = level.index(update.x, update.y, update.z);
                    level.data[index] = update.id;
                    level.chain.push(update);
                }
            }
        }

        Ok(level)
    }

    /// Client-facing transfer encoding sent (gzipped and chunked) during
    /// session init: a 4-byte big-endian length prefix and the raw blocks.
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(4 + self.data.len());

        buffer.extend_from_slice(&codec::encode_int(self.data.len() as i32));
        buffer.extend_from_slice(&self.data);

        buffer
    }
}

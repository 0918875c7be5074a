use crate::command;
use crate::compression;
use crate::roster::{Outbound, NO_EXCLUDE};
use crate::Server;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use protocol::blocks;
use protocol::packets::{ClientBound, ServerBound};
use protocol::{PacketWriter, BYTE_ARRAY_LENGTH, PROTOCOL_VERSION};
use std::io::ErrorKind;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Duration, Instant};

/// A connection that stays silent this long is dropped. Classic clients
/// stream position packets continuously, so a quiet peer is gone.
const READ_TIMEOUT: Duration = Duration::from_secs(120);

const WELCOME_FILE: &str = "welcome.txt";

/// Player-ID byte the client interprets as "self"; also used as the
/// source of system chat messages.
const SELF_ID: u8 = 0xff;
/// Source ID for welcome-file lines.
const WELCOME_SOURCE: u8 = 126;

enum State {
    AwaitIdentification,
    Playing,
}

/// Whether the read loop should keep going after a packet.
enum Flow {
    Continue,
    Close,
}

struct Connection {
    server: Arc<Server>,
    socket: BufReader<TcpStream>,
    slot: u8,
    username: String,
    state: State,
}

/// Runs one client for its whole lifetime. Errors are contained here:
/// whatever happens to this socket, the server keeps serving.
pub async fn handle_connection(server: Arc<Server>, mut socket: TcpStream) {
    let address = match socket.peer_addr() {
        Ok(address) => address,
        Err(_) => return,
    };
    info!("Accepted connection: {address}");

    let claimed = server.roster.write().await.claim();
    let Some((slot, outbound)) = claimed else {
        let payload = ClientBound::Disconnect {
            reason: "The server is full!",
        }
        .to_bytes();
        let _ = socket.write_all(&payload).await;

        info!("Closed connection: {address} (server is full)");
        return;
    };

    let mut connection = Connection {
        server,
        socket: BufReader::new(socket),
        slot,
        username: String::new(),
        state: State::AwaitIdentification,
    };

    if let Err(error) = connection.run(outbound).await {
        debug!("Session error on slot {slot}: {error:#}");
    }

    connection.close().await;
    info!("Closed connection: {address}");
}

impl Connection {
    async fn run(&mut self, mut outbound: UnboundedReceiver<Outbound>) -> Result<()> {
        let mut deadline = Instant::now() + READ_TIMEOUT;

        loop {
            tokio::select!(
                // Read only the ID byte inside the select; once a packet
                // has started, the body is read to completion below so an
                // interleaved write cannot split it.
                id = self.socket.read_u8() => {
                    let id = match id {
                        Ok(id) => id,
                        Err(error) if error.kind() == ErrorKind::UnexpectedEof => return Ok(()),
                        Err(error) => return Err(error.into()),
                    };

                    deadline = Instant::now() + READ_TIMEOUT;

                    if let Flow::Close = self.dispatch(id).await? {
                        return Ok(());
                    }
                },
                message = outbound.recv() => {
                    // the sender half lives in the roster for as long as
                    // the slot is claimed, so the queue cannot close here
                    match message.context("outbound queue closed")? {
                        Outbound::Data(payload) => {
                            self.socket.write_all(&payload).await?;
                        }
                        Outbound::Kick(payload) => {
                            self.socket.write_all(&payload).await?;
                            return Ok(());
                        }
                    }
                },
                _ = sleep_until(deadline) => bail!("client timed out"),
            );
        }
    }

    async fn dispatch(&mut self, id: u8) -> Result<Flow> {
        let Some(body_len) = ServerBound::body_len(id) else {
            // the reference server dropped unknown packets on the floor
            debug!("Ignoring unknown packet {id:#04x} from slot {}", self.slot);
            return Ok(Flow::Continue);
        };

        let mut body = vec![0u8; body_len];
        self.socket.read_exact(&mut body).await?;

        let Some(packet) = ServerBound::parse(id, &body) else {
            return Ok(Flow::Continue);
        };

        let identifying = matches!(self.state, State::AwaitIdentification);

        match packet {
            ServerBound::Identification {
                protocol, username, ..
            } => {
                if !identifying {
                    debug!("Slot {} sent a second identification packet", self.slot);
                    return Ok(Flow::Continue);
                }

                if protocol != PROTOCOL_VERSION {
                    self.disconnect("Incorrect protocol version!").await?;
                    return Ok(Flow::Close);
                }

                self.spawn_init(username).await?;
                self.state = State::Playing;
                Ok(Flow::Continue)
            }
            _ if identifying => bail!("client sent {id:#04x} before identifying"),
            ServerBound::SetBlock { x, y, z, mode, block } => {
                self.handle_set_block(x, y, z, mode, block).await
            }
            ServerBound::Position { x, y, z, yaw, pitch } => {
                self.handle_position(x, y, z, yaw, pitch).await?;
                Ok(Flow::Continue)
            }
            ServerBound::Message { text } => {
                self.handle_chat(&text).await?;
                Ok(Flow::Continue)
            }
        }
    }

    /// The one-time join sequence: identify, stream the compressed level,
    /// spawn everyone everywhere, greet.
    async fn spawn_init(&mut self, username: String) -> Result<()> {
        let mut writer = PacketWriter::new();

        ClientBound::ServerIdentification {
            name: &self.server.settings.server_name,
            motd: &self.server.settings.motd,
            op: false,
        }
        .write(&mut writer);
        ClientBound::LevelInitialize.write(&mut writer);
        writer.flush_to(&mut self.socket).await?;

        let (compressed, width, height, depth, spawn) = {
            let level = self.server.level.read().await;
            (
                compression::compress(&level.encode())
                    .context("failed to compress the level for transfer")?,
                level.width(),
                level.height(),
                level.depth(),
                level.spawn(),
            )
        };

        let chunk_count = (compressed.len() + BYTE_ARRAY_LENGTH - 1) / BYTE_ARRAY_LENGTH;
        for (i, chunk) in compressed.chunks(BYTE_ARRAY_LENGTH).enumerate() {
            let percent = (((i + 1) * 100) / chunk_count) as u8;
            ClientBound::LevelDataChunk {
                data: chunk,
                percent,
            }
            .write(&mut writer);
            writer.flush_to(&mut self.socket).await?;
        }

        ClientBound::LevelFinalize {
            width,
            height,
            depth,
        }
        .write(&mut writer);
        writer.flush_to(&mut self.socket).await?;

        // session position in pixel units, centered on the spawn block
        let x = (spawn.x << 5) + 16;
        let y = (spawn.y << 5) + 16;
        let z = (spawn.z << 5) + 16;

        {
            let mut roster = self.server.roster.write().await;
            let session = roster
                .get_mut(self.slot)
                .context("session slot released while spawning")?;
            session.username = username.clone();
            session.x = x;
            session.y = y;
            session.z = z;
            session.yaw = spawn.yaw;
            session.pitch = spawn.pitch;
            session.spawned = true;
        }
        self.username = username;

        ClientBound::SpawnPlayer {
            id: SELF_ID,
            name: &self.username,
            x,
            y,
            z,
            yaw: spawn.yaw,
            pitch: spawn.pitch,
        }
        .write(&mut writer);
        writer.flush_to(&mut self.socket).await?;

        {
            let roster = self.server.roster.read().await;
            roster.broadcast(
                self.slot,
                &ClientBound::SpawnPlayer {
                    id: self.slot,
                    name: &self.username,
                    x,
                    y,
                    z,
                    yaw: spawn.yaw,
                    pitch: spawn.pitch,
                }
                .to_bytes(),
            );
        }

        self.send_welcome(&mut writer).await?;

        info!("{} joined the game", self.username);
        {
            let roster = self.server.roster.read().await;
            roster.broadcast(
                NO_EXCLUDE,
                &ClientBound::Message {
                    source: SELF_ID,
                    text: &format!("{} joined the game", self.username),
                }
                .to_bytes(),
            );

            // catch the new client up on everyone already here
            for (slot, session) in roster.spawned() {
                if slot == self.slot {
                    continue;
                }
                ClientBound::SpawnPlayer {
                    id: slot,
                    name: &session.username,
                    x: session.x,
                    y: session.y,
                    z: session.z,
                    yaw: session.yaw,
                    pitch: session.pitch,
                }
                .write(&mut writer);
            }
        }
        writer.flush_to(&mut self.socket).await?;

        Ok(())
    }

    async fn send_welcome(&mut self, writer: &mut PacketWriter) -> Result<()> {
        let text = match tokio::fs::read_to_string(WELCOME_FILE).await {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!("No {WELCOME_FILE}, not showing a welcome message");
                return Ok(());
            }
            Err(error) => {
                warn!("Failed to read {WELCOME_FILE}: {error}");
                return Ok(());
            }
        };

        let lines: Vec<&str> = text.split('\n').collect();
        for line in &lines {
            ClientBound::Message {
                source: WELCOME_SOURCE,
                text: line,
            }
            .write(writer);
        }

        // finish with a blank line unless the file already did
        if lines.last().is_some_and(|line| !line.is_empty()) {
            ClientBound::Message {
                source: WELCOME_SOURCE,
                text: "",
            }
            .write(writer);
        }

        writer.flush_to(&mut self.socket).await?;
        Ok(())
    }

    async fn handle_set_block(
        &mut self,
        x: i16,
        y: i16,
        z: i16,
        mode: u8,
        block: u8,
    ) -> Result<Flow> {
        let mut level = self.server.level.write().await;

        if !level.in_bounds(x, y, z) {
            return Ok(Flow::Continue);
        }

        // destroy mode places air no matter what the client claims
        let mut block = if mode == 0x01 { block } else { blocks::AIR };

        if !blocks::is_valid(block) {
            drop(level);
            self.disconnect("Invalid block!").await?;
            return Ok(Flow::Close);
        }

        // freshly placed dirt with nothing on top grows over immediately
        if block == blocks::DIRT && level.get(x, y + 1, z) == blocks::AIR {
            block = blocks::GRASS;
        }

        level.set_by(x, y, z, block, &self.username);
        drop(level);

        let payload = ClientBound::SetBlock { x, y, z, block }.to_bytes();
        self.server.roster.read().await.broadcast(NO_EXCLUDE, &payload);

        Ok(Flow::Continue)
    }

    async fn handle_position(&mut self, x: i16, y: i16, z: i16, yaw: u8, pitch: u8) -> Result<()> {
        let mut roster = self.server.roster.write().await;
        let session = roster
            .get_mut(self.slot)
            .context("session slot released while playing")?;

        let dx = i32::from(x) - i32::from(session.x);
        let dy = i32::from(y) - i32::from(session.y);
        let dz = i32::from(z) - i32::from(session.z);

        session.x = x;
        session.y = y;
        session.z = z;
        session.yaw = yaw;
        session.pitch = pitch;

        let fits = |delta: i32| i8::try_from(delta).is_ok();
        let payload = if fits(dx) && fits(dy) && fits(dz) {
            ClientBound::PositionUpdate {
                id: self.slot,
                dx: dx as i8,
                dy: dy as i8,
                dz: dz as i8,
                yaw,
                pitch,
            }
            .to_bytes()
        } else {
            // past ±127 px the 8-bit delta would alias; fall back to an
            // absolute update
            ClientBound::Teleport {
                id: self.slot,
                x,
                y,
                z,
                yaw,
                pitch,
            }
            .to_bytes()
        };

        roster.broadcast(self.slot, &payload);
        Ok(())
    }

    async fn handle_chat(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        if text.starts_with('/') {
            return self.handle_command(text).await;
        }

        info!("{}: {}", self.username, text);

        let message = format!("{}: {}", self.username, text);
        let payload = ClientBound::Message {
            source: self.slot,
            text: &message,
        }
        .to_bytes();
        self.server.roster.read().await.broadcast(NO_EXCLUDE, &payload);

        Ok(())
    }

    async fn handle_command(&mut self, text: &str) -> Result<()> {
        let Some(parsed) = command::parse(&self.username, self.slot, text) else {
            return Ok(());
        };

        if !command::can_run(&parsed.source, &parsed.name) {
            return self.reply("You may not run this command.").await;
        }

        match parsed.name.as_str() {
            "help" => self.reply("Commands: /help, /kick <name> [reason]").await,
            "kick" => {
                let Some(target_name) = parsed.args.first() else {
                    return self.reply("Usage: /kick <name> [reason]").await;
                };

                let reason = if parsed.args.len() > 1 {
                    parsed.args[1..].join(" ")
                } else {
                    "Kicked from the server!".to_string()
                };

                let target = {
                    let roster = self.server.roster.read().await;
                    match roster.find_by_username(target_name) {
                        Some(target) => {
                            let payload = ClientBound::Disconnect { reason: &reason }.to_bytes();
                            if let Some(session) = roster.get(target) {
                                session.send(Outbound::Kick(payload));
                            }
                            Some(target)
                        }
                        None => None,
                    }
                };

                match target {
                    Some(_) => {
                        info!("{} kicked {}", self.username, target_name);
                        Ok(())
                    }
                    None => self.reply("No such player.").await,
                }
            }
            _ => self.reply("Unknown command.").await,
        }
    }

    /// Sends a system chat line straight back to this client.
    async fn reply(&mut self, text: &str) -> Result<()> {
        let payload = ClientBound::Message {
            source: SELF_ID,
            text,
        }
        .to_bytes();
        self.socket.write_all(&payload).await?;
        Ok(())
    }

    async fn disconnect(&mut self, reason: &str) -> Result<()> {
        let payload = ClientBound::Disconnect { reason }.to_bytes();
        self.socket.write_all(&payload).await?;
        Ok(())
    }

    /// Releases the slot and, if the player had spawned, tells everyone
    /// they left.
    async fn close(&mut self) {
        let spawned = {
            let mut roster = self.server.roster.write().await;
            let spawned = roster
                .get(self.slot)
                .map_or(false, |session| session.spawned);
            roster.release(self.slot);
            spawned
        };

        if spawned {
            info!("{} left the game", self.username);

            let roster = self.server.roster.read().await;
            roster.broadcast(
                NO_EXCLUDE,
                &ClientBound::DespawnPlayer { id: self.slot }.to_bytes(),
            );
            roster.broadcast(
                NO_EXCLUDE,
                &ClientBound::Message {
                    source: SELF_ID,
                    text: &format!("{} left the game", self.username),
                }
                .to_bytes(),
            );
        }
    }
}

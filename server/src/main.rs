use anyhow::{bail, Context, Result};
use log::info;
use protocol::blocks;
use quarry::cli::{self, OPT};
use quarry::config::{Config, Settings};
use quarry::level::{self, Kind, Level, Mode};
use quarry::roster::Roster;
use quarry::{checkpoint, compression, config, connection, Server};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{Notify, RwLock};

const LEVEL_WIDTH: i16 = 128;
const LEVEL_HEIGHT: i16 = 64;
const LEVEL_DEPTH: i16 = 128;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if matches!(OPT.command, Some(cli::Command::Levelhistory)) {
        return level_history();
    }

    info!("Starting server...");

    let config = Config::load_or_create(Path::new(config::PROPERTIES_FILE))?;
    let settings = Settings::from_config(&config)?;

    let level = load_or_generate_level()?;

    let listener = TcpListener::bind(("127.0.0.1", settings.port))
        .await
        .with_context(|| format!("failed to bind 127.0.0.1:{}", settings.port))?;

    let server = Arc::new(Server {
        roster: RwLock::new(Roster::new(settings.max_players)),
        level: RwLock::new(level),
        settings,
    });

    info!("Starting level save task...");
    let shutdown = Arc::new(Notify::new());
    let saver = tokio::spawn(checkpoint::run(server.clone(), shutdown.clone()));

    let mut interrupt =
        signal(SignalKind::interrupt()).context("failed to install the SIGINT handler")?;
    let mut terminate =
        signal(SignalKind::terminate()).context("failed to install the SIGTERM handler")?;

    info!("Listening for clients on 127.0.0.1:{}...", server.settings.port);

    loop {
        tokio::select!(
            accepted = listener.accept() => {
                let (socket, _) = accepted.context("failed to accept a connection")?;
                tokio::spawn(connection::handle_connection(server.clone(), socket));
            }
            _ = interrupt.recv() => break,
            _ = terminate.recv() => break,
        );
    }

    info!("Shutting down...");
    shutdown.notify_one();
    saver.await.context("the level save task failed")?;

    Ok(())
}

fn load_or_generate_level() -> Result<Level> {
    let path = Path::new(checkpoint::LEVEL_FILE);

    if path.exists() {
        info!("Loading level...");
        load_level(path)
    } else {
        info!("Generating level...");
        let kind = if OPT.chain_level {
            Kind::Chain
        } else {
            Kind::Plain
        };
        level::generate(LEVEL_WIDTH, LEVEL_HEIGHT, LEVEL_DEPTH, Mode::Experimental, kind)
    }
}

fn load_level(path: &Path) -> Result<Level> {
    let compressed =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let serialized = compression::decompress(&compressed)
        .with_context(|| format!("{} is not valid gzip data", path.display()))?;

    Level::deserialize(&serialized).with_context(|| format!("failed to load {}", path.display()))
}

/// `levelhistory`: print every block update in the chain with its hash.
fn level_history() -> Result<()> {
    let path = Path::new(checkpoint::LEVEL_FILE);
    if !path.exists() {
        bail!("the level file does not exist");
    }

    let level = load_level(path)?;
    if level.kind() != Kind::Chain {
        bail!("level history is only available in chain levels");
    }

    for update in level.chain() {
        let hash = level::to_hex(&update.hash());

        let mut line = if update.id == blocks::AIR {
            format!(
                "{hash}: Block at {}, {}, {} removed",
                update.x, update.y, update.z
            )
        } else {
            format!(
                "{hash}: Block at {}, {}, {} set to ID {}",
                update.x, update.y, update.z, update.id
            )
        };
        if !update.name.is_empty() {
            line.push_str(&format!(" by {}", update.name));
        }

        println!("{line}");
    }

    Ok(())
}

pub mod checkpoint;
pub mod cli;
pub mod command;
pub mod compression;
pub mod config;
pub mod connection;
pub mod level;
pub mod roster;

use config::Settings;
use level::Level;
use roster::Roster;
use tokio::sync::RwLock;

/// State shared by every task: the validated settings, the level, and the
/// session roster. The two locks are never held across each other.
pub struct Server {
    pub settings: Settings,
    pub level: RwLock<Level>,
    pub roster: RwLock<Roster>,
}

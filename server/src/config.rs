use anyhow::{bail, Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::Path;

pub const PROPERTIES_FILE: &str = "server.properties";

const DEFAULT_PROPERTIES: &str = "\
# Minecraft server properties (quarry)
server-name=Minecraft Server
motd=Welcome to my Minecraft Server!
public=false
port=25565
verify-names=false
max-players=32
max-connections=1
grow-trees=false
admin-slot=false
";

/// Key/value view of `server.properties`. Read-only after startup.
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Parses line-oriented `key=value` data. Blank lines and `#` comments
    /// are skipped; any other line without `=` is an error.
    pub fn parse(data: &str) -> Result<Self> {
        let mut values = HashMap::new();

        for (number, line) in data.lines().enumerate() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .with_context(|| format!("line {} does not contain the \"=\" character", number + 1))?;

            values.insert(key.to_string(), value.to_string());
        }

        Ok(Self { values })
    }

    /// Reads the properties file, creating it with defaults when missing.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Reading {}...", path.display());
            let data = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Self::parse(&data).with_context(|| format!("failed to parse {}", path.display()))
        } else {
            info!("Creating {}...", path.display());
            std::fs::write(path, DEFAULT_PROPERTIES)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Self::parse(DEFAULT_PROPERTIES)
        }
    }

    pub fn string(&self, key: &str) -> Result<&str> {
        match self.values.get(key) {
            Some(value) => Ok(value),
            None => bail!("the option {key} does not exist"),
        }
    }

    pub fn number(&self, key: &str) -> Result<i32> {
        self.string(key)?
            .parse()
            .with_context(|| format!("the option {key} contains an invalid number value"))
    }

    pub fn boolean(&self, key: &str) -> Result<bool> {
        match self.string(key)? {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => bail!("the option {key} contains an invalid boolean value"),
        }
    }
}

/// The settings the server actually runs on, validated once at startup.
pub struct Settings {
    pub server_name: String,
    pub motd: String,
    pub port: u16,
    pub max_players: usize,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let port = config.number("port")?;
        if !(1..=65535).contains(&port) {
            bail!("the option port is out of range");
        }

        let max_players = config.number("max-players")?;
        // slots are wire-level player IDs; 126 and 0xff are reserved
        if !(1..=125).contains(&max_players) {
            bail!("the option max-players must be between 1 and 125");
        }

        // recognized keys without a counterpart in the dispatch core yet;
        // still validated so a typo fails at startup
        config.boolean("public")?;
        config.boolean("verify-names")?;
        config.number("max-connections")?;
        config.boolean("grow-trees")?;
        config.boolean("admin-slot")?;

        Ok(Self {
            server_name: config.string("server-name")?.to_string(),
            motd: config.string("motd")?.to_string(),
            port: port as u16,
            max_players: max_players as usize,
        })
    }
}

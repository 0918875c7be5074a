use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Persist a newly generated level as a hash-linked chain of block
    /// updates instead of a raw block array
    #[arg(long)]
    pub chain_level: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print every block update recorded in the level's chain
    Levelhistory,
}

pub static OPT: Lazy<Cli> = Lazy::new(Cli::parse);

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "countmein-server", about = "Webhook server for the CountMeIn poll bot")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "countmein.toml")]
    pub config: PathBuf,

    /// Override the bind address from the config file.
    #[arg(long)]
    pub bind: Option<String>,
}

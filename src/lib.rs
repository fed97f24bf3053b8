pub mod cli;
pub mod dataset;
pub mod gap;
pub mod industries;
pub mod io_utils;
pub mod products;
pub mod schema;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("sni_gap", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Industries(args) => industries::execute(&args),
        Commands::Products(args) => products::execute(&args),
        Commands::Gap(args) => gap::execute(&args),
    }
}

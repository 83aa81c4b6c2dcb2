//! # Stats Server - Entry Point
//! src/main.rs

use stats_server::config::Config;
use stats_server::logging;
use stats_server::server::Server;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let config = Config::new();
    config.validate()?;

    logging::init(&config.log_level, config.log_file.as_deref().map(Path::new))?;
    config.print_summary();

    let server = Server::from_config(&config)?;
    server.run()?;

    Ok(())
}

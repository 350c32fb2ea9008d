//! ncgc-server: the guarantee desk over HTTP.
//!
//! Usage:
//!   ncgc-server --db ncgc.db --data-dir ./data --host 127.0.0.1 --port 8080

use anyhow::Result;
use ncgc_core::{config::DeskConfig, store::DeskStore, GuaranteeDesk};
use ncgc_server::{create_router, AppState};
use std::env;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = string_arg(&args, "--db", "ncgc.db");
    let data_dir = string_arg(&args, "--data-dir", "./data");
    let host = string_arg(&args, "--host", "127.0.0.1");
    let port = parse_arg(&args, "--port", 8080u16);

    let config = DeskConfig::load(&data_dir)?;
    let store = DeskStore::open(&db)?;
    let desk = GuaranteeDesk::build(store, config)?;
    log::info!("Desk store: {db}, config from {data_dir}");

    let router = create_router(AppState::new(desk));
    let listener = TcpListener::bind((host.as_str(), port)).await?;
    log::info!("NCGC desk listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

fn string_arg(args: &[String], flag: &str, default: &str) -> String {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .unwrap_or_else(|| default.to_string())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use cubehack_server::{GameServer, ServerConfig, ServerEvent, logging};

const STATS_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "cubehack-server")]
#[command(about = "CubeHack simulation server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = cubehack::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long)]
    tick_rate: Option<u32>,

    #[arg(short, long)]
    max_clients: Option<usize>,

    #[arg(long, help = "Number of AI entities spawned at startup")]
    ai_population: Option<usize>,

    #[arg(short, long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Also write the log to this file")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(max_clients) = self.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(ai_population) = self.ai_population {
            config.ai_population = ai_population;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref())?;

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let server = GameServer::new(&bind_addr, config)
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    log::info!("Server started on {}", server.local_addr()?);

    let server = server.spawn()?;
    let mut last_stats = Instant::now();

    while server.is_running() {
        for event in server.drain_events() {
            log_event(event);
        }

        if last_stats.elapsed() >= STATS_INTERVAL {
            let stats = server.stats();
            log::info!(
                "tick {}: {} players, {} entities",
                stats.tick,
                stats.players,
                stats.entities
            );
            last_stats = Instant::now();
        }

        thread::sleep(Duration::from_millis(50));
    }

    log::info!("Server shutting down");
    log::logger().flush();
    Ok(())
}

fn log_event(event: ServerEvent) {
    match event {
        ServerEvent::ClientConnected {
            client_id,
            addr,
            entity_id,
        } => {
            log::info!("Client {client_id} connected from {addr} (entity #{entity_id})");
        }
        ServerEvent::ClientDisconnected { client_id, reason } => {
            log::info!("Client {client_id} {}", reason.as_str());
        }
        ServerEvent::ConnectionDenied { addr, reason } => {
            log::warn!("Connection denied to {addr}: {reason}");
        }
        ServerEvent::Error { message } => {
            log::error!("{message}");
        }
    }
}

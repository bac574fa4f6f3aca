use std::net::TcpStream;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use glam::Vec3;

use cubehack::{ChannelError, FramedChannel, GameClient, GameDuration, PositionData, ServerMessage};

use crate::stats::BotStats;

const PING_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub server: String,
    /// Player updates per second.
    pub rate: u32,
    pub duration: Duration,
}

/// Connects one bot, jumps in place for `config.duration`, then leaves.
pub fn run_bot(index: usize, config: &BotConfig) -> Result<BotStats> {
    let mut client = GameClient::connect(config.server.as_str())
        .with_context(|| format!("bot {index} failed to connect"))?;
    log::debug!("bot {index} joined as entity #{}", client.entity_id());

    let started = Instant::now();
    let reader = client.try_clone_reader()?;
    let reader_thread = thread::Builder::new()
        .name(format!("bot-{index}-reader"))
        .spawn(move || read_updates(reader, started))?;

    let physics = *client.physics();
    let period = Duration::from_secs_f64(1.0 / config.rate.max(1) as f64);
    let step = GameDuration::from(period);

    let mut position_data = PositionData::default();
    cubehack::physics::respawn(&mut rand::rng(), &mut position_data);
    let mut last_ping: Option<Instant> = None;

    while started.elapsed() < config.duration {
        if !position_data.is_falling {
            position_data.velocity = Vec3::Y * physics.jump_velocity();
        }
        cubehack::physics::move_entity(&physics, &mut position_data, step);
        client.send_update((&position_data).into())?;

        if last_ping.is_none_or(|at| at.elapsed() >= PING_INTERVAL) {
            let timestamp_ms = started.elapsed().as_millis() as u64;
            client.send(&cubehack::ClientMessage::Ping { timestamp_ms })?;
            last_ping = Some(Instant::now());
        }

        thread::sleep(period);
    }

    client.disconnect()?;
    reader_thread
        .join()
        .map_err(|_| anyhow!("bot {index} reader panicked"))
}

fn read_updates(mut reader: FramedChannel<TcpStream>, started: Instant) -> BotStats {
    let mut stats = BotStats::new();
    loop {
        match reader.receive_object::<ServerMessage>() {
            Ok(ServerMessage::WorldUpdate(update)) => stats.record_update(update.tick),
            Ok(ServerMessage::Pong { timestamp_ms }) => {
                let now_ms = started.elapsed().as_secs_f64() * 1000.0;
                stats.record_rtt((now_ms - timestamp_ms as f64).max(0.0) as f32);
            }
            Ok(other) => log::debug!("ignoring {other:?}"),
            Err(ChannelError::ConnectionClosed) => break,
            Err(e) => {
                if !e.is_disconnect() {
                    log::warn!("reader stopped: {e}");
                }
                break;
            }
        }
    }
    stats
}

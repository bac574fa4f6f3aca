mod bot;
mod stats;

use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;

use bot::{BotConfig, run_bot};
use stats::BotStats;

#[derive(Parser)]
#[command(name = "cubehack-loadtest")]
#[command(about = "Connects jumping bots to a CubeHack server and reports what they saw")]
struct Args {
    #[arg(short, long, default_value_t = format!("127.0.0.1:{}", cubehack::DEFAULT_PORT))]
    server: String,

    #[arg(short, long, default_value_t = 10)]
    bots: usize,

    #[arg(short, long, default_value_t = 20, help = "Player updates per second per bot")]
    rate: u32,

    #[arg(short, long, default_value_t = 10, help = "Seconds each bot stays connected")]
    duration: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = BotConfig {
        server: args.server,
        rate: args.rate,
        duration: Duration::from_secs(args.duration),
    };
    log::info!(
        "starting {} bots against {} for {:?}",
        args.bots,
        config.server,
        config.duration
    );

    let handles = (0..args.bots)
        .map(|index| {
            let config = config.clone();
            thread::Builder::new()
                .name(format!("bot-{index}"))
                .spawn(move || run_bot(index, &config))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut results = Vec::with_capacity(handles.len());
    for (index, handle) in handles.into_iter().enumerate() {
        let result = handle
            .join()
            .map_err(|_| anyhow!("bot {index} panicked"))?;
        match result {
            Ok(stats) => results.push((index, stats)),
            Err(e) => log::error!("bot {index}: {e:#}"),
        }
    }

    print_report(&results);
    if results.is_empty() && args.bots > 0 {
        return Err(anyhow!("no bot completed"));
    }
    Ok(())
}

fn print_report(results: &[(usize, BotStats)]) {
    println!(
        "{:>5} {:>8} {:>8} {:>9} {:>8} {:>18}",
        "bot", "updates", "skipped", "rate/s", "rtt ms", "rtt min/max"
    );
    for (index, stats) in results {
        let avg = stats
            .rtt_avg()
            .map_or_else(|| "-".to_owned(), |rtt| format!("{rtt:.2}"));
        let range = stats
            .rtt_range()
            .map_or_else(|| "-".to_owned(), |(min, max)| format!("{min:.2}/{max:.2}"));
        println!(
            "{:>5} {:>8} {:>8} {:>9.1} {:>8} {:>18}",
            index,
            stats.updates(),
            stats.skipped_ticks(),
            stats.update_rate(),
            avg,
            range
        );
    }

    let updates: u64 = results.iter().map(|(_, s)| s.updates()).sum();
    let skipped: u64 = results.iter().map(|(_, s)| s.skipped_ticks()).sum();
    let rtts: Vec<f32> = results.iter().filter_map(|(_, s)| s.rtt_avg()).collect();
    println!("{} bots completed", results.len());
    println!("total updates: {updates} ({skipped} ticks skipped)");
    if !rtts.is_empty() {
        println!(
            "mean round trip: {:.2} ms",
            rtts.iter().sum::<f32>() / rtts.len() as f32
        );
    }
}

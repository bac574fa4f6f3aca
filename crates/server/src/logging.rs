//! Logger that keeps formatting and I/O off the tick thread.
//!
//! `QueuedLogger` copies each record into an owned message and pushes it
//! onto an unbounded channel. A dedicated `logger` thread forwards the
//! messages to `env_logger` sinks (console, and optionally a file).

use std::fs::File;
use std::io;
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use env_logger::{Env, Target, WriteStyle};
use log::{Level, LevelFilter, Log, Metadata, Record};

const FLUSH_TIMEOUT: Duration = Duration::from_millis(250);

struct OwnedRecord {
    level: Level,
    target: String,
    message: String,
    module_path: Option<String>,
    file: Option<String>,
    line: Option<u32>,
}

impl OwnedRecord {
    fn from_record(record: &Record<'_>) -> Self {
        Self {
            level: record.level(),
            target: record.target().to_owned(),
            message: record.args().to_string(),
            module_path: record.module_path().map(str::to_owned),
            file: record.file().map(str::to_owned),
            line: record.line(),
        }
    }
}

enum LogMessage {
    Record(OwnedRecord),
    Flush(Sender<()>),
}

pub struct QueuedLogger {
    sender: Sender<LogMessage>,
    max_level: LevelFilter,
}

impl QueuedLogger {
    /// Starts the worker thread that owns `sinks`.
    pub fn new(sinks: Vec<env_logger::Logger>) -> io::Result<(Self, JoinHandle<()>)> {
        let max_level = sinks
            .iter()
            .map(|sink| sink.filter())
            .max()
            .unwrap_or(LevelFilter::Off);
        let (sender, receiver) = unbounded();
        let worker = thread::Builder::new()
            .name("logger".into())
            .spawn(move || drain(receiver, sinks))?;
        Ok((Self { sender, max_level }, worker))
    }

    pub fn max_level(&self) -> LevelFilter {
        self.max_level
    }
}

impl Log for QueuedLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = self
            .sender
            .send(LogMessage::Record(OwnedRecord::from_record(record)));
    }

    fn flush(&self) {
        let (ack, done) = crossbeam_channel::bounded(1);
        if self.sender.send(LogMessage::Flush(ack)).is_ok() {
            let _ = done.recv_timeout(FLUSH_TIMEOUT);
        }
    }
}

fn drain(receiver: Receiver<LogMessage>, sinks: Vec<env_logger::Logger>) {
    while let Ok(message) = receiver.recv() {
        match message {
            LogMessage::Record(record) => {
                for sink in &sinks {
                    sink.log(
                        &Record::builder()
                            .args(format_args!("{}", record.message))
                            .level(record.level)
                            .target(&record.target)
                            .module_path(record.module_path.as_deref())
                            .file(record.file.as_deref())
                            .line(record.line)
                            .build(),
                    );
                }
            }
            LogMessage::Flush(ack) => {
                for sink in &sinks {
                    sink.flush();
                }
                let _ = ack.send(());
            }
        }
    }
    for sink in &sinks {
        sink.flush();
    }
}

fn env() -> Env<'static> {
    Env::default().default_filter_or("info")
}

/// Sink writing plain text to `file`, filtered like the console.
pub fn file_sink(file: File) -> env_logger::Logger {
    env_logger::Builder::from_env(env())
        .target(Target::Pipe(Box::new(file)))
        .write_style(WriteStyle::Never)
        .build()
}

/// Installs the queued logger as the global `log` backend.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<()> {
    let mut sinks = vec![env_logger::Builder::from_env(env()).build()];
    if let Some(path) = log_file {
        sinks.push(file_sink(File::create(path)?));
    }

    let (logger, _worker) = QueuedLogger::new(sinks)?;
    let max_level = logger.max_level();
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_reach_file_sink_after_drop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let sink = env_logger::Builder::new()
            .filter_level(LevelFilter::Info)
            .target(Target::Pipe(Box::new(file.reopen().unwrap())))
            .write_style(WriteStyle::Never)
            .build();

        let (logger, worker) = QueuedLogger::new(vec![sink]).unwrap();
        assert_eq!(logger.max_level(), LevelFilter::Info);

        logger.log(
            &Record::builder()
                .args(format_args!("client {} connected", 7))
                .level(Level::Info)
                .target("cubehack_server::connection")
                .build(),
        );
        logger.log(
            &Record::builder()
                .args(format_args!("noisy detail"))
                .level(Level::Debug)
                .target("cubehack_server::connection")
                .build(),
        );
        logger.flush();
        drop(logger);
        worker.join().unwrap();

        let written = std::fs::read_to_string(file.path()).unwrap();
        assert!(written.contains("client 7 connected"), "log file: {written}");
        assert!(!written.contains("noisy detail"));
    }
}

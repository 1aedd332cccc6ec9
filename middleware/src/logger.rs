use crate::LOG_FILE_PREFIX;
use chrono::{DateTime, Local};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Copy, Clone)]
pub struct EndSignal {}

pub const END_SIGNAL: EndSignal = EndSignal {};

/// Record handed over to the writer task.
#[derive(Debug, Clone)]
pub struct LogMessage {
    pub elapsed: f64,
    pub level: Level,
    pub source: String,
    pub message: String,
}

impl LogMessage {
    pub fn format(&self) -> String {
        format!(
            "[{:^.3},{:^16}] {:^6}: {}\n",
            self.elapsed, self.source, self.level, self.message
        )
    }
}

/// Where the writer task writes the formatted records.
pub enum FileDescriptor {
    Stderr,
    Directory(PathBuf),
    AbsolutePath(PathBuf),
}

enum LogOutput {
    Stderr,
    File(File),
}

impl LogOutput {
    fn open(descriptor: FileDescriptor, date: DateTime<Local>) -> std::io::Result<Self> {
        let path = match descriptor {
            FileDescriptor::Stderr => return Ok(LogOutput::Stderr),
            FileDescriptor::Directory(mut dir) => {
                fs::create_dir_all(&dir)?;
                dir.push(format!(
                    "{}_{}.txt",
                    LOG_FILE_PREFIX,
                    date.format("%Y-%m-%d_%H-%M-%S")
                ));
                dir
            }
            FileDescriptor::AbsolutePath(path) => {
                if let Some(dir) = path.parent() {
                    fs::create_dir_all(dir)?;
                }
                path
            }
        };
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(LogOutput::File(file))
    }

    fn write(&mut self, message: &LogMessage) {
        let line = message.format();
        match self {
            LogOutput::Stderr => eprint!("{}", line),
            LogOutput::File(file) => {
                if let Err(e) = file.write_all(line.as_bytes()) {
                    eprintln!("could not write to log file: {}", e);
                }
            }
        }
    }
}

/// Backend of the `log` facade.
/// Records are formatted by a writer task so that logging never blocks on io.
pub struct Logger {
    system_start: SystemTime,
    max_log_level: Level,
    sender_log: mpsc::UnboundedSender<LogMessage>,
}

/// Keeps the writer task of a [`Logger`] running until [`end`](LoggerHandle::end).
pub struct LoggerHandle {
    end_sender: mpsc::Sender<EndSignal>,
    handle: JoinHandle<()>,
}

impl LoggerHandle {
    /// Stops the writer task once every pending record has been written.
    pub async fn end(self) {
        let _ = self.end_sender.send(END_SIGNAL).await;
        let _ = self.handle.await;
    }
}

impl Logger {
    /// Creates a logger and spawns its writer task on the current runtime.
    pub fn new(
        max_log_level: Level,
        descriptor: FileDescriptor,
        date: DateTime<Local>,
    ) -> std::io::Result<(Self, LoggerHandle)> {
        let output = LogOutput::open(descriptor, date)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let (tx_end, rx_end) = mpsc::channel(1);
        let handle = tokio::spawn(Logger::run_logger(output, rx_end, rx));
        let logger = Self {
            system_start: SystemTime::now(),
            max_log_level,
            sender_log: tx,
        };
        Ok((
            logger,
            LoggerHandle {
                end_sender: tx_end,
                handle,
            },
        ))
    }

    pub fn max_level_filter(&self) -> LevelFilter {
        self.max_log_level.to_level_filter()
    }

    async fn run_logger(
        mut output: LogOutput,
        mut end_signal: mpsc::Receiver<EndSignal>,
        mut receiver: mpsc::UnboundedReceiver<LogMessage>,
    ) {
        'main: loop {
            tokio::select! {
                _ = end_signal.recv() => {
                    break 'main;
                }
                message = receiver.recv() => {
                    match message {
                        Some(message) => output.write(&message),
                        None => break 'main,
                    }
                }
            }
        }
        receiver.close();
        while let Some(message) = receiver.recv().await {
            output.write(&message);
        }
        if let LogOutput::File(file) = &mut output {
            let _ = file.flush();
        }
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_log_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let elapsed = self
            .system_start
            .elapsed()
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        // the writer task is gone once the handle ended, records are dropped
        let _ = self.sender_log.send(LogMessage {
            elapsed,
            level: record.level(),
            source: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {}
}

use chrono::{DateTime, Local};
use crossbeam_channel::{unbounded, Sender};
use once_cell::sync::Lazy;
use std::{
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("collector"));

pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    /// 建立記錄器,寫入檔案的操作交由另一個線程處理
    pub(crate) fn new(log_name: &str) -> Self {
        let log_path = Self::log_path(log_name).unwrap_or_else(|| {
            panic!("Failed to create log directory.");
        });
        let (tx, rx) = unbounded::<LogMessage>();

        thread::spawn(move || {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .unwrap_or_else(|e| {
                    panic!("Failed to open log file: {}", e);
                });
            let mut writer = BufWriter::new(file);

            while let Ok(received) = rx.recv() {
                let line = format!(
                    "{} {} {}",
                    received.created_at.format("%F %X%.6f"),
                    received.level,
                    received.msg
                );

                if writeln!(writer, "{}", line).is_err() {
                    info_console(line);
                    continue;
                }

                // 等待中的訊息都寫完才 flush
                if rx.is_empty() && writer.flush().is_err() {
                    error_console("Failed to flush log file.".to_string());
                }
            }
        });

        Logger { writer: tx }
    }

    pub(crate) fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub(crate) fn warn(&self, log: String) {
        self.send(log::Level::Warn, log);
    }

    pub(crate) fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    pub(crate) fn debug(&self, log: String) {
        self.send(log::Level::Debug, log);
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }

    fn log_path(name: &str) -> Option<PathBuf> {
        let dir = Path::new("log");

        if !dir.exists() {
            fs::create_dir_all(dir).ok()?;
        }

        let mut log_path = PathBuf::from(dir);
        log_path.push(format!("{}_{}.log", name, Local::now().format("%Y-%m-%d")));

        Some(log_path)
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    println!(
        "{} Error {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

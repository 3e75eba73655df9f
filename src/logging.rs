/*
 * Process-wide logging: `log` macros routed through an `env_logger` backend
 * whose target is a re-openable append-mode file. Logging starts disabled
 * (max level `Off`) and is switched at runtime from the tray menu.
 */
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

use crate::error::{AppError, AppResult};

/*
 * Shared writer handed to env_logger. While closed, records are dropped so
 * the logger can stay installed for the life of the process.
 */
#[derive(Clone, Default)]
pub struct LogSink {
    file: Arc<Mutex<Option<File>>>,
}

impl LogSink {
    fn guard(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn open(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        *self.guard() = Some(file);
        Ok(())
    }

    pub fn close(&self) {
        if let Some(mut file) = self.guard().take() {
            let _ = file.flush();
        }
    }

    pub fn is_open(&self) -> bool {
        self.guard().is_some()
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.guard().as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.guard().as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// One log line, without the trailing newline.
pub fn render_line(pid: u32, timestamp: &str, level: log::Level, target: &str, message: &str) -> String {
    format!("{timestamp} {level:<5} ProcID <{pid}>: [{target}] {message}")
}

pub struct Logging {
    sink: LogSink,
    path: Option<PathBuf>,
}

/*
 * Installs the global logger. A logger installed earlier (tests, or a host
 * embedding the library) is left in place and only the sink is returned.
 */
pub fn init(path: Option<PathBuf>) -> Logging {
    let sink = LogSink::default();
    let pid = std::process::id();

    let result = Builder::new()
        .target(Target::Pipe(Box::new(sink.clone())))
        .write_style(WriteStyle::Never)
        .filter_level(LevelFilter::Trace)
        .format(move |buf, record| {
            let timestamp = buf.timestamp_millis().to_string();
            let line = render_line(
                pid,
                &timestamp,
                record.level(),
                record.target(),
                &record.args().to_string(),
            );
            writeln!(buf, "{line}")
        })
        .try_init();

    if result.is_err() {
        eprintln!("Logging: a logger is already installed; file logging disabled");
    }
    log::set_max_level(LevelFilter::Off);

    Logging { sink, path }
}

impl Logging {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_open() && log::max_level() != LevelFilter::Off
    }

    pub fn enable(&self) -> AppResult<()> {
        let path = self
            .path
            .as_deref()
            .ok_or_else(|| AppError::app("Logging: no log file location available"))?;
        self.sink.open(path)?;
        log::set_max_level(LevelFilter::Trace);
        log::info!("Logging: Enabled, writing to {}", path.display());
        Ok(())
    }

    pub fn disable(&self) {
        log::info!("Logging: Disabling logging");
        log::set_max_level(LevelFilter::Off);
        self.sink.close();
    }
}

//! Subscriber installation and the central JSONL writer.
//!
//! All processes append to one file. Each line is flushed as soon as it is
//! written so concurrent readers see complete records.

use crate::json_layer::JsonLayer;
use crate::LogConfig;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Central log file location, `~/.loop-social/logs/dev.jsonl`.
fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".loop-social").join("logs").join("dev.jsonl"))
}

/// Append-only file writer shared by every layer clone.
#[derive(Clone)]
pub struct CentralLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl CentralLogWriter {
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl io::Write for CentralLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let result = guard.write(buf);
        guard.flush()?;
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// MakeWriter implementation for tracing-subscriber.
#[derive(Clone)]
pub struct WriterFactory {
    writer: CentralLogWriter,
}

impl<'a> MakeWriter<'a> for WriterFactory {
    type Writer = CentralLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber: JSONL file layer plus optional stderr.
pub fn init_subscriber(config: &LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let json_layer = match log_path.as_deref().map(CentralLogWriter::new) {
        Some(Ok(writer)) => Some(
            JsonLayer::new(config.service_name.clone(), WriterFactory { writer })
                .with_filter(env_filter(&config.default_level)),
        ),
        Some(Err(e)) => {
            eprintln!("observability: failed to open log file {:?}: {}", log_path, e);
            None
        }
        None => None,
    };

    // Without a file there must still be somewhere to log to.
    let want_stderr = config.also_stderr || json_layer.is_none();
    let stderr_layer = want_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_ansi(true)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            service = %config.service_name,
            log_path = ?log_path,
            "observability initialized"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    #[test]
    fn test_central_log_writer_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("test.jsonl");

        let mut writer = CentralLogWriter::new(&path).unwrap();
        writer.write_all(b"test line\n").unwrap();

        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "test line\n");
    }

    #[test]
    fn test_writer_appends_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.jsonl");

        CentralLogWriter::new(&path)
            .unwrap()
            .write_all(b"first\n")
            .unwrap();
        CentralLogWriter::new(&path)
            .unwrap()
            .write_all(b"second\n")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "first\nsecond\n");
    }
}

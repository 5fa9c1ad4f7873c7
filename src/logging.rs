//! Event log sink: a single append-mode file, one `timestamp | text` line
//! per event.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

pub struct FileLogger {
    sink: Mutex<Option<File>>,
}

impl FileLogger {
    fn new(sink: Option<File>) -> Self {
        FileLogger {
            sink: Mutex::new(sink),
        }
    }
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Call sites format the `timestamp | text` line themselves (the
        // timestamp is the simulated clock tick, not wall-clock time), so
        // the sink just appends the already-formatted record.
        let mut sink = self.sink.lock().unwrap();
        if let Some(file) = sink.as_mut() {
            let _ = writeln!(file, "{}", record.args());
        }
        eprintln!("{}", record.args());
    }

    fn flush(&self) {
        if let Some(file) = self.sink.lock().unwrap().as_mut() {
            let _ = file.flush();
        }
    }
}

/// Installs the process-wide logger. `log_file` is opened in append mode
/// when `enable_logs` is true; when false, events are still mirrored to
/// stderr but nothing is written to disk. Safe to call at most once per
/// process; a second call is a no-op (`log::set_logger` fails silently).
pub fn init(enable_logs: bool, log_file: impl AsRef<Path>) {
    let sink = if enable_logs {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .ok()
    } else {
        None
    };

    let logger = Box::new(FileLogger::new(sink));
    if log::set_boxed_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Info);
    }
}

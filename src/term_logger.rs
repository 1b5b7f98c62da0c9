use std::io::{stderr, Stderr, Write};
use std::sync::Mutex;

use crossterm::style::{style, Color, Print, PrintStyledContent};
use crossterm::QueueableCommand;
use log::{Level, LevelFilter, Log, Metadata, Record};
use time::OffsetDateTime;

use crate::error::{ErrorExt, VoidResult};

struct Logger {
    output: Stderr,
    level: LevelFilter,
}

impl Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && (metadata.target() == "pinconfig" || metadata.target().starts_with("pinconfig::"))
    }

    fn log(&mut self, record: &Record) -> VoidResult {
        if !self.enabled(record.metadata()) {
            return Ok(());
        }

        let time = OffsetDateTime::now_utc().time();
        self.output
            .queue(Print(format!("[{} ", time.format("%H:%M:%S"))))
            .as_err()?;

        self.output
            .queue(PrintStyledContent(match record.level() {
                Level::Error => style("ERROR").with(Color::Red),
                Level::Warn => style(" WARN").with(Color::Yellow),
                Level::Info => style(" INFO").with(Color::White),
                Level::Debug => style("DEBUG").with(Color::Grey),
                Level::Trace => style("TRACE").with(Color::DarkGrey),
            }))
            .as_err()?;

        self.output
            .queue(Print(format!(" {}] {}\n", record.target(), record.args())))
            .as_err()?;

        Ok(())
    }

    fn flush(&mut self) -> VoidResult {
        self.output
            .flush()
            .map_err(|_| String::from("Failed to flush output."))?;
        Ok(())
    }
}

/// Coloured, timestamped log output on stderr, limited to this crate's
/// targets.
pub struct TermLogger {
    inner: Mutex<Logger>,
}

impl TermLogger {
    pub fn init(level: LevelFilter) -> VoidResult {
        log::set_boxed_logger(Box::new(TermLogger {
            inner: Mutex::new(Logger {
                output: stderr(),
                level,
            }),
        }))
        .map_err(|_| String::from("Logging already initialized."))?;
        log::set_max_level(level);
        Ok(())
    }

    /// Maps a `-v` count onto a level: warnings by default, then info, debug
    /// and trace.
    pub fn level_for(verbosity: u64) -> LevelFilter {
        match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

impl Log for TermLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.enabled(metadata))
            .unwrap_or(false)
    }

    fn log(&self, record: &Record) {
        if let Ok(mut inner) = self.inner.lock() {
            let _ = inner.log(record);
        }
    }

    fn flush(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            let _ = inner.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(TermLogger::level_for(0), LevelFilter::Warn);
        assert_eq!(TermLogger::level_for(2), LevelFilter::Debug);
        assert_eq!(TermLogger::level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn only_this_crate_is_logged() {
        let logger = Logger {
            output: stderr(),
            level: LevelFilter::Info,
        };
        let ours = Metadata::builder()
            .target("pinconfig::loader")
            .level(Level::Info)
            .build();
        let theirs = Metadata::builder()
            .target("tokio::fs")
            .level(Level::Info)
            .build();
        let chatty = Metadata::builder()
            .target("pinconfig::validator")
            .level(Level::Trace)
            .build();

        assert!(logger.enabled(&ours));
        assert!(!logger.enabled(&theirs));
        assert!(!logger.enabled(&chatty));
    }
}

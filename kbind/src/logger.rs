//! `log` backend writing to the kernel log.
//!
//! The maximum level is fixed at build time through the `LOG` environment
//! variable (`ERROR`, `WARN`, `INFO`, `DEBUG` or `TRACE`; `INFO` by default).

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::{
    error::{linux_err::EBUSY, KernelResult},
    pr_alert, pr_debug, pr_info, pr_warn, println,
};

/// Log target whose records are printed bare, without level or module prefix.
const PLAIN_TARGET: &str = chrdev::BANNER_TARGET;

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }
    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if record.target() == PLAIN_TARGET {
            println!("{}", record.args());
            return;
        }
        match record.level() {
            Level::Error => {
                pr_alert!("[ERROR] {}", record.args());
            }
            Level::Warn => {
                pr_warn!("[ WARN] {}", record.args());
            }
            Level::Info => {
                pr_info!("[ INFO] {}", record.args());
            }
            Level::Debug => {
                pr_debug!("[DEBUG] [{}] {}", record.module_path().unwrap_or_default(), record.args());
            }
            Level::Trace => {
                pr_debug!("[TRACE] [{}] {}", record.module_path().unwrap_or_default(), record.args());
            }
        };
    }
    fn flush(&self) {}
}

fn max_level() -> LevelFilter {
    match option_env!("LOG") {
        Some("ERROR") => LevelFilter::Error,
        Some("WARN") => LevelFilter::Warn,
        Some("INFO") => LevelFilter::Info,
        Some("DEBUG") => LevelFilter::Debug,
        Some("TRACE") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs the logger. Fails with `EBUSY` if one is already installed.
pub fn init_logger() -> KernelResult<()> {
    log::set_logger(&SimpleLogger).map_err(|_| EBUSY)?;
    log::set_max_level(max_level());
    log::debug!("logger ready, LOG={:?}", option_env!("LOG"));
    Ok(())
}

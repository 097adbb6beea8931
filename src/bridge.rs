use chrono::Local;
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::{Condition, Rank};

/// Forwards `log` records to the process-wide facility.
struct MonitorLogger;

impl Log for MonitorLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let (condition, rank) = match record.level() {
            Level::Error => (Condition::Error, Rank::Important),
            Level::Warn => (Condition::Error, Rank::Normal),
            Level::Info => (Condition::NonError, Rank::Normal),
            Level::Debug | Level::Trace => (Condition::NonError, Rank::Unimportant),
        };
        crate::global().println_to_readout(&format_record(record), condition, rank);
    }

    fn flush(&self) {}
}

fn format_record(record: &Record) -> String {
    let time = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f");
    let level = match record.level() {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".green(),
        Level::Debug => "DEBUG".blue(),
        Level::Trace => "TRACE".purple(),
    };
    format!("[{time} {level}] {}", record.args())
}

static BRIDGE: MonitorLogger = MonitorLogger;

/// Routes `log::info!` and friends through the facility. `log`'s own level
/// filter is opened wide; the facility's rank filter takes over from there.
pub fn install_log_bridge() -> Result<(), SetLoggerError> {
    log::set_logger(&BRIDGE)?;
    log::set_max_level(LevelFilter::Trace);
    Ok(())
}

//! # mtdiag
//! Multi-threaded diagnostics facility: serialized console and log-file
//! readouts with a severity filter, assertions that stop the entire
//! application rather than just the current thread, application termination
//! with a truncated stack trace, and polling for background events.
//!
//! ## Usage
//! ```rust
//! use mtdiag::monitor_config;
//!
//! let monitor = monitor_config()
//!     .no_log_file()
//!     .build();
//! monitor.print("Hello, world!");
//! monitor.check(true, "the world is still here");
//! monitor.close();
//! ```
//!
//! ## Process-wide facility
//! The free functions mirror the instance API and share one lazily-created
//! monitor. The guard's drop at the end of `main` closes the log file and
//! retires the background worker.
//!
//! ```rust,no_run
//! let _guard = mtdiag::monitor_config().init_global();
//!
//! mtdiag::print("Hello from the main thread!");
//! std::thread::spawn(|| mtdiag::print_error("and hello from another one"))
//!     .join()
//!     .unwrap();
//! ```
//!
//! ## Severity filtering
//! Every readout carries a [`Rank`]. Messages below the configured minimum
//! rank are squelched from the console but still reach the log file, so a
//! quiet terminal loses no evidence.
//!
//! ```rust,no_run
//! use mtdiag::Rank;
//!
//! let _guard = mtdiag::monitor_config().init_global();
//! mtdiag::set_min_rank(Rank::Important);
//! mtdiag::print("nobody sees this on the terminal");
//! mtdiag::print_important("everybody sees this");
//! ```
//!
//! ## Background events
//! ```rust,no_run
//! use mtdiag::PeriodicCheck;
//!
//! struct QueueBacklog;
//!
//! impl PeriodicCheck for QueueBacklog {
//!     fn check_for_occurrence(&mut self) -> bool {
//!         // poll something cheap here
//!         false
//!     }
//!     fn respond_to_occurrence(&mut self) {
//!         mtdiag::print_error("the queue is falling behind");
//!     }
//! }
//!
//! let _guard = mtdiag::monitor_config().init_global();
//! assert!(mtdiag::register_periodic_check(QueueBacklog, 1_000, 1_000));
//! ```

use std::{error::Error, sync::OnceLock};

mod bridge;
mod config;
mod log_file;
mod monitor;
pub mod paths;
mod router;
mod scheduler;
mod trace;
#[cfg(test)]
mod testutil;

pub use bridge::install_log_bridge;
pub use config::{Condition, DiagConfig, Rank, StreamTarget};
pub use monitor::{AppMonitor, MonitorBuilder, MonitorGuard, monitor_config};
pub use router::{ConsoleSink, StandardStreams};
pub use scheduler::PeriodicCheck;
pub use trace::StackSnapshot;

static GLOBAL_MONITOR: OnceLock<AppMonitor> = OnceLock::new();

/// The process-wide facility, created with default configuration on first
/// use.
pub fn global() -> &'static AppMonitor {
    GLOBAL_MONITOR.get_or_init(|| monitor_config().build())
}

/// Installs `monitor` as the process-wide facility. When one already exists
/// (some readout was routed before `init_global`), its policy is updated in
/// place instead.
pub(crate) fn install_global(monitor: AppMonitor) {
    if let Err(replacement) = GLOBAL_MONITOR.set(monitor) {
        let current = global();
        let config = replacement.config();
        current.configure(
            config.min_rank,
            config.stream_target,
            config.log_to_file,
            config.print_to_console,
        );
        current.set_stack_trace_row_limit(replacement.stack_trace_row_limit());
    }
}

/// Prints a normal non-error readout through the process-wide facility.
#[track_caller]
pub fn print(message: &str) {
    global().print(message);
}

/// Prints a non-error readout that cannot be squelched by the default
/// minimum rank.
#[track_caller]
pub fn print_important(message: &str) {
    global().print_important(message);
}

/// Prints an unimportant non-error readout; squelched from the console by
/// default but still logged.
#[track_caller]
pub fn print_unimportant(message: &str) {
    global().print_unimportant(message);
}

/// Prints an error readout through the process-wide facility.
#[track_caller]
pub fn print_error(message: &str) {
    global().print_error(message);
}

/// Prints an important error readout.
#[track_caller]
pub fn print_error_important(message: &str) {
    global().print_error_important(message);
}

/// Prints an unimportant error readout.
#[track_caller]
pub fn print_error_unimportant(message: &str) {
    global().print_error_unimportant(message);
}

/// Prints an error with its source chain and a stack snapshot of the call
/// site.
#[track_caller]
pub fn print_exception(error: &dyn Error) {
    global().print_exception(error);
}

/// Same as [`print_exception`], with a leading message.
#[track_caller]
pub fn print_exception_with(message: &str, error: &dyn Error) {
    global().print_exception_with(message, error);
}

/// Routes `message` verbatim through the process-wide facility.
pub fn print_to_readout(message: &str, condition: Condition, rank: Rank) {
    global().print_to_readout(message, condition, rank);
}

/// Routes `message` followed by a newline.
pub fn println_to_readout(message: &str, condition: Condition, rank: Rank) {
    global().println_to_readout(message, condition, rank);
}

/// Checks an assertion; a false assertion stops the entire application.
pub fn check(assertion: bool, message: &str) {
    global().check(assertion, message);
}

/// Kills the entire application, leaving a stack trace.
pub fn kill_application(message: &str) -> ! {
    global().kill_application(message)
}

/// Kills the entire application; the description and source chain of
/// `cause` are appended to the message.
pub fn kill_application_with_cause(message: &str, cause: &dyn Error) -> ! {
    global().kill_application_with_cause(message, cause)
}

/// Kills the entire application without leaving a stack trace.
pub fn kill_application_no_trace(message: &str) -> ! {
    global().kill_application_no_trace(message)
}

/// Polls for and responds to a background event at a fixed delay. True on
/// successful submission; false once the scheduler has been shut down.
pub fn register_periodic_check<C>(check: C, interval_ms: u64, initial_delay_ms: u64) -> bool
where
    C: PeriodicCheck + 'static,
{
    global().register_periodic_check(check, interval_ms, initial_delay_ms)
}

/// Replaces the whole readout policy of the process-wide facility.
pub fn configure(
    min_rank: Rank,
    stream_target: StreamTarget,
    log_to_file: bool,
    print_to_console: bool,
) {
    global().configure(min_rank, stream_target, log_to_file, print_to_console);
}

/// All messages at this rank or higher are printed to the console.
pub fn set_min_rank(rank: Rank) {
    global().set_min_rank(rank);
}

pub fn set_stream_target(target: StreamTarget) {
    global().set_stream_target(target);
}

pub fn set_log_to_file(enabled: bool) {
    global().set_log_to_file(enabled);
}

pub fn set_print_to_console(enabled: bool) {
    global().set_print_to_console(enabled);
}

/// The number of important rows displayed in stack traces.
pub fn set_stack_trace_row_limit(rows: usize) {
    global().set_stack_trace_row_limit(rows);
}

/// The readout policy currently in effect.
pub fn config() -> DiagConfig {
    global().config()
}

/// The name of the process-wide log file, once one has been created.
pub fn log_file_name() -> Option<String> {
    global().log_file_name()
}

/// Closes the process-wide facility. Idempotent.
pub fn close() {
    global().close();
}

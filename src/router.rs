use std::{
    io::{self, Write},
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    config::{Condition, DiagConfig, Rank, StreamTarget},
    log_file::LogFileManager,
};

/// Destination for console-bound readout text.
pub trait ConsoleSink: Send {
    fn write_out(&mut self, text: &str);
    fn write_err(&mut self, text: &str);
}

/// Writes readouts to the process's real standard streams, flushing each
/// write so console and log never drift apart on a crash.
pub struct StandardStreams;

impl ConsoleSink for StandardStreams {
    fn write_out(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn write_err(&mut self, text: &str) {
        let mut err = io::stderr().lock();
        let _ = err.write_all(text.as_bytes());
        let _ = err.flush();
    }
}

struct RouterInner {
    config: DiagConfig,
    log_file: LogFileManager,
    console: Box<dyn ConsoleSink>,
}

/// The single serialization point all output passes through. Every routed
/// message is written to the log file first (when logging is enabled) and
/// then, depending on configuration, to one console stream; the whole
/// decision runs under one lock so concurrent messages never interleave
/// below message granularity.
pub struct Router {
    inner: Mutex<RouterInner>,
}

impl Router {
    pub fn new(config: DiagConfig, log_file: LogFileManager, console: Box<dyn ConsoleSink>) -> Self {
        Self {
            inner: Mutex::new(RouterInner {
                config,
                log_file,
                console,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RouterInner> {
        // A panicking writer must not silence every thread that follows.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routes `message` verbatim.
    pub fn route(&self, message: &str, condition: Condition, rank: Rank) {
        let mut guard = self.lock();
        dispatch(&mut guard, message, condition, rank);
    }

    /// Routes `message` followed by a newline.
    pub fn routeln(&self, message: &str, condition: Condition, rank: Rank) {
        self.route(&format!("{message}\n"), condition, rank);
    }

    pub fn config(&self) -> DiagConfig {
        self.lock().config
    }

    pub fn set_config(&self, config: DiagConfig) {
        self.lock().config = config;
    }

    pub fn update_config(&self, update: impl FnOnce(&mut DiagConfig)) {
        update(&mut self.lock().config);
    }

    pub fn log_file_name(&self) -> Option<String> {
        self.lock().log_file.file_name().map(str::to_owned)
    }

    /// Announces and closes the log writer. Idempotent; console output keeps
    /// working afterwards.
    pub fn close(&self) {
        let mut guard = self.lock();
        let inner = &mut *guard;
        if inner.log_file.is_open() {
            dispatch(
                inner,
                "\nThe log file is being shut down.\n",
                Condition::NonError,
                Rank::Normal,
            );
        }
        inner.log_file.close();
    }
}

fn dispatch(inner: &mut RouterInner, message: &str, condition: Condition, rank: Rank) {
    // Logging happens regardless of rank.
    if inner.config.log_to_file {
        let _ = inner.log_file.try_write(message);
    }
    if !inner.config.print_to_console {
        return;
    }
    if rank.importance() < inner.config.min_rank.importance() {
        // Not important enough for the terminal; it is already in the log.
        return;
    }
    match inner.config.stream_target {
        StreamTarget::OnlyStdout => inner.console.write_out(message),
        StreamTarget::OnlyStderr => inner.console.write_err(message),
        StreamTarget::ByCondition => match condition {
            Condition::Error => inner.console.write_err(message),
            Condition::NonError => inner.console.write_out(message),
        },
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::PathBuf,
};

use chrono::Local;

use crate::paths;

/// The platform's native line ending; `\n` in routed text is rewritten to
/// this before it reaches the file.
pub const LINE_ENDING: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Lifecycle of the single per-process log file. Once the state leaves
/// `Uninitialized` it never goes back; `Closed` is entered exactly once
/// during shutdown.
enum LogFileState {
    Uninitialized,
    Ready {
        file_name: String,
        writer: BufWriter<File>,
    },
    Unavailable,
    Closed,
}

/// Owns the log folder and the append-only, timestamp-named log file.
/// Initialization is lazy, fallible and attempted exactly once; every
/// failure degrades to "no log file" without raising.
pub struct LogFileManager {
    folder: PathBuf,
    state: LogFileState,
}

impl LogFileManager {
    pub fn new(folder: PathBuf) -> Self {
        Self {
            folder,
            state: LogFileState::Uninitialized,
        }
    }

    /// Tries to write text to the log file, creating folder and file on the
    /// first attempt. Replaces `\n` with the OS line ending, flushes so the
    /// content survives an abrupt kill, and reports failure instead of
    /// raising.
    pub fn try_write(&mut self, text: &str) -> bool {
        if matches!(self.state, LogFileState::Uninitialized) {
            self.state = self.initialize();
        }
        match &mut self.state {
            LogFileState::Ready { writer, .. } => {
                let normalized = text.replace('\n', LINE_ENDING);
                writer
                    .write_all(normalized.as_bytes())
                    .and_then(|()| writer.flush())
                    .is_ok()
            }
            _ => false,
        }
    }

    fn initialize(&self) -> LogFileState {
        if paths::ensure_dir(&self.folder).is_err() {
            return LogFileState::Unavailable;
        }
        let file_name = format!("{}.txt", Local::now().format("%Y_%m_%d___%H:%M:%S"));
        let path = self.folder.join(&file_name);
        let file = match OpenOptions::new().create_new(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return LogFileState::Unavailable,
        };
        // A file that was just created must be discoverable on disk.
        if paths::find_file_in(&self.folder, &file_name).is_none() {
            return LogFileState::Unavailable;
        }
        let mut writer = BufWriter::new(file);
        let banner = format!("Starting log file{LINE_ENDING}");
        match writer
            .write_all(banner.as_bytes())
            .and_then(|()| writer.flush())
        {
            Ok(()) => LogFileState::Ready { file_name, writer },
            Err(_) => LogFileState::Unavailable,
        }
    }

    /// The name of the log file, once one has been created.
    pub fn file_name(&self) -> Option<&str> {
        match &self.state {
            LogFileState::Ready { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, LogFileState::Ready { .. })
    }

    /// Flushes and releases the writer. Safe to call when never opened or
    /// already closed.
    pub fn close(&mut self) {
        if let LogFileState::Ready { writer, .. } = &mut self.state {
            let _ = writer.flush();
        }
        self.state = LogFileState::Closed;
    }
}

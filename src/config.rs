use std::sync::LazyLock;

use derive_from_env::FromEnv;

/// Ranks terminal readouts by relative importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Unimportant,
    Normal,
    Important,
}

impl Rank {
    /// Importance level used for comparison. Starts at zero and increases
    /// with increasing importance.
    pub fn importance(self) -> u8 {
        match self {
            Rank::Unimportant => 0,
            Rank::Normal => 1,
            Rank::Important => 2,
        }
    }
}

/// Which standard stream terminal-bound readouts are sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamTarget {
    /// All terminal output goes through standard out.
    OnlyStdout,
    /// All terminal output goes through standard error.
    OnlyStderr,
    /// Error readouts go through standard error, everything else through
    /// standard out.
    ByCondition,
}

/// Whether a readout happens under an error or a non-error situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Error,
    NonError,
}

/// Mutable readout policy shared by every caller of one facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagConfig {
    /// Messages at this rank or higher are printed to the console.
    pub min_rank: Rank,
    pub stream_target: StreamTarget,
    /// When false the log file is not written to, even if it is available.
    pub log_to_file: bool,
    /// When false the console is not printed to.
    pub print_to_console: bool,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            min_rank: Rank::Normal,
            stream_target: StreamTarget::OnlyStdout,
            log_to_file: true,
            print_to_console: true,
        }
    }
}

#[derive(FromEnv)]
#[from_env(prefix = "MTDIAG")]
#[allow(non_snake_case)]
pub struct MTDiagConfig {
    /// Name of the folder holding the log files, under the working directory.
    #[from_env(default = "log_files")]
    pub LOG_FOLDER: String,
    /// Default number of important rows displayed in stack traces.
    #[from_env(default = "6")]
    pub TRACE_ROWS: u64,
}

pub static MTDIAG_CONFIG: LazyLock<MTDiagConfig> =
    LazyLock::new(|| MTDiagConfig::from_env().unwrap());

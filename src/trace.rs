use backtrace::Backtrace;

/// A call stack captured at the moment of a print or assert, one
/// human-readable row per frame.
#[derive(Debug, Clone)]
pub struct StackSnapshot {
    rows: Vec<String>,
}

impl StackSnapshot {
    /// Captures and symbolizes the current call stack. Frames that cannot be
    /// resolved still produce a row, so a snapshot is never empty.
    pub fn capture() -> Self {
        let trace = Backtrace::new();
        let mut rows = Vec::new();
        for frame in trace.frames() {
            let symbols = frame.symbols();
            if symbols.is_empty() {
                rows.push(format!("<unresolved frame> @ {:p}", frame.ip()));
                continue;
            }
            for symbol in symbols {
                let name = symbol
                    .name()
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| String::from("<unknown>"));
                let row = match (symbol.filename(), symbol.lineno()) {
                    (Some(file), Some(line)) => format!("{name} @ {}:{line}", file.display()),
                    _ => name,
                };
                rows.push(row);
            }
        }
        Self { rows }
    }

    pub fn from_rows(rows: Vec<String>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }
}

/// Frames belonging to the capture machinery or the facility itself; a
/// reported trace starts just above the last of these.
const INTERNAL_MARKERS: &[&str] = &[
    "backtrace::",
    "StackSnapshot",
    "AppMonitor",
    "MonitorCore",
    "mtdiag::check",
    "mtdiag::kill_application",
    "mtdiag::print",
];

/// Index of the first row that does not belong to the facility. Falls back
/// to zero when no internal frames are recognizable.
pub fn first_caller_row(rows: &[String]) -> usize {
    let mut first = 0;
    for (index, row) in rows.iter().enumerate() {
        if INTERNAL_MARKERS.iter().any(|marker| row.contains(marker)) {
            first = index + 1;
        }
    }
    if first >= rows.len() { 0 } else { first }
}

/// Splits the rows from `first_row` on into a head printed at high
/// importance and a tail printed at low importance. When the remainder fits
/// within `limit` the tail is empty. `None` when `first_row` lies beyond the
/// end of the snapshot.
pub fn split_rows(
    rows: &[String],
    first_row: usize,
    limit: usize,
) -> Option<(&[String], &[String])> {
    if first_row > rows.len() {
        return None;
    }
    let remaining = &rows[first_row..];
    if remaining.len() <= limit {
        Some((remaining, &[]))
    } else {
        Some(remaining.split_at(limit))
    }
}

use std::{
    error::Error,
    panic::Location,
    path::PathBuf,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use crate::{
    config::{Condition, DiagConfig, MTDIAG_CONFIG, Rank, StreamTarget},
    log_file::LogFileManager,
    paths,
    router::{ConsoleSink, Router, StandardStreams},
    scheduler::{LivenessProbe, PeriodicCheck, Scheduler},
    trace::{self, StackSnapshot},
};

const FAILURE_EXIT_CODE: i32 = 1;

/// What the fatal path does once readouts are flushed and the writer is
/// closed.
#[derive(Debug, Clone, Copy)]
enum FatalAction {
    ExitProcess,
    /// Panic instead of exiting, so tests can observe the fatal path.
    Panic,
}

enum SchedulerSlot {
    Idle,
    Running(Scheduler),
    Stopped,
}

struct MonitorCore {
    router: Router,
    scheduler: Mutex<SchedulerSlot>,
    alive: Arc<AtomicBool>,
    trace_rows: AtomicUsize,
    liveness: LivenessProbe,
    fatal_action: FatalAction,
}

impl MonitorCore {
    /// Shutdown path taken by the worker thread itself; must not join the
    /// worker.
    fn shutdown_outputs(&self) {
        self.alive.store(false, Ordering::SeqCst);
        self.router.close();
    }

    fn close(&self) {
        self.alive.store(false, Ordering::SeqCst);
        let scheduler = {
            let mut slot = self.scheduler.lock().unwrap_or_else(PoisonError::into_inner);
            match std::mem::replace(&mut *slot, SchedulerSlot::Stopped) {
                SchedulerSlot::Running(scheduler) => Some(scheduler),
                _ => None,
            }
        };
        if let Some(scheduler) = scheduler {
            scheduler.shutdown();
            self.router.routeln(
                "\nThe scheduler has been shut down",
                Condition::NonError,
                Rank::Unimportant,
            );
        }
        self.router.close();
    }
}

/// The diagnostic facility: multi-threaded print statements with built-in
/// call-site context, assertions that stop the entire application rather
/// than just the current thread, application termination with a truncated
/// stack trace, and polling for background events.
///
/// Cloning is cheap and every clone shares the same state.
#[derive(Clone)]
pub struct AppMonitor {
    core: Arc<MonitorCore>,
}

impl AppMonitor {
    fn print_ranked(
        &self,
        message: &str,
        condition: Condition,
        rank: Rank,
        location: &Location<'_>,
    ) {
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        self.core.router.routeln(
            &format!("\nThread \"{name}\": {location}\n{message}"),
            condition,
            rank,
        );
    }

    /// Prints a normal non-error readout with the calling thread's name and
    /// the call-site location.
    #[track_caller]
    pub fn print(&self, message: &str) {
        self.print_ranked(message, Condition::NonError, Rank::Normal, Location::caller());
    }

    /// Prints a non-error readout so important that it cannot be squelched
    /// by the default minimum rank.
    #[track_caller]
    pub fn print_important(&self, message: &str) {
        self.print_ranked(
            message,
            Condition::NonError,
            Rank::Important,
            Location::caller(),
        );
    }

    /// Prints an unimportant non-error readout, squelched from the console
    /// under the default minimum rank but still logged.
    #[track_caller]
    pub fn print_unimportant(&self, message: &str) {
        self.print_ranked(
            message,
            Condition::NonError,
            Rank::Unimportant,
            Location::caller(),
        );
    }

    /// Prints an error readout with the calling thread's name and the
    /// call-site location.
    #[track_caller]
    pub fn print_error(&self, message: &str) {
        self.print_ranked(message, Condition::Error, Rank::Normal, Location::caller());
    }

    /// Prints an important error readout.
    #[track_caller]
    pub fn print_error_important(&self, message: &str) {
        self.print_ranked(
            message,
            Condition::Error,
            Rank::Important,
            Location::caller(),
        );
    }

    /// Prints an unimportant error readout.
    #[track_caller]
    pub fn print_error_unimportant(&self, message: &str) {
        self.print_ranked(
            message,
            Condition::Error,
            Rank::Unimportant,
            Location::caller(),
        );
    }

    /// Prints an error together with its source chain and a stack snapshot
    /// of the call site.
    #[track_caller]
    pub fn print_exception(&self, error: &dyn Error) {
        self.print_exception_inner(None, error, Location::caller());
    }

    /// Same as [`Self::print_exception`], with a leading message.
    #[track_caller]
    pub fn print_exception_with(&self, message: &str, error: &dyn Error) {
        self.print_exception_inner(Some(message), error, Location::caller());
    }

    fn print_exception_inner(
        &self,
        message: Option<&str>,
        error: &dyn Error,
        location: &Location<'_>,
    ) {
        let mut header = String::from("\n");
        if let Some(message) = message {
            header.push_str(message);
            header.push('\n');
        }
        header.push_str(&describe_error(error));
        let snapshot = StackSnapshot::capture();
        let first_row = trace::first_caller_row(snapshot.rows());
        self.emit_trace(&header, snapshot.rows(), first_row);
        self.core
            .router
            .routeln(&format!("{location}\n"), Condition::Error, Rank::Important);
    }

    /// Routes `message` verbatim; the raw entry point behind every other
    /// print.
    pub fn print_to_readout(&self, message: &str, condition: Condition, rank: Rank) {
        self.core.router.route(message, condition, rank);
    }

    /// Routes `message` followed by a newline.
    pub fn println_to_readout(&self, message: &str, condition: Condition, rank: Rank) {
        self.core.router.routeln(message, condition, rank);
    }

    /// Checks an assertion. A false assertion prints a truncated stack
    /// trace and stops the whole application, not just the current thread.
    pub fn check(&self, assertion: bool, message: &str) {
        if assertion {
            return;
        }
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        self.fail(format!(
            "\nAssertion failed in thread \"{name}\": {message}"
        ));
    }

    /// Kills the entire application, leaving a stack trace.
    pub fn kill_application(&self, message: &str) -> ! {
        let current = thread::current();
        let name = current.name().unwrap_or("<unnamed>");
        self.fail(format!(
            "\nAssertion failed in thread \"{name}\": {message}"
        ))
    }

    /// Kills the entire application; the description and source chain of
    /// `cause` are appended to the message.
    pub fn kill_application_with_cause(&self, message: &str, cause: &dyn Error) -> ! {
        self.kill_application_no_trace(&format!("{message}\n{}", describe_error(cause)))
    }

    /// Kills the entire application without leaving a stack trace.
    pub fn kill_application_no_trace(&self, message: &str) -> ! {
        self.core
            .router
            .routeln(&format!("\n{message}"), Condition::Error, Rank::Important);
        self.core.close();
        self.terminate(message)
    }

    fn fail(&self, header: String) -> ! {
        let snapshot = StackSnapshot::capture();
        let first_row = trace::first_caller_row(snapshot.rows());
        self.emit_trace(&header, snapshot.rows(), first_row);
        self.core.close();
        self.terminate(&header)
    }

    /// Routes the head of the trace at [`Rank::Important`] and the tail at
    /// [`Rank::Unimportant`], so the terminal stays short while the log file
    /// keeps everything.
    fn emit_trace(&self, header: &str, rows: &[String], first_row: usize) {
        self.check(
            first_row <= rows.len(),
            "The first row of the stack trace is outside of the bounds of the snapshot.",
        );
        let limit = self.core.trace_rows.load(Ordering::SeqCst);
        let Some((head, tail)) = trace::split_rows(rows, first_row, limit) else {
            return;
        };
        let mut block = String::from(header);
        block.push('\n');
        for row in head {
            block.push_str(row);
            block.push('\n');
        }
        self.core
            .router
            .routeln(&block, Condition::Error, Rank::Important);
        if !tail.is_empty() {
            let mut block = String::new();
            for row in tail {
                block.push_str(row);
                block.push('\n');
            }
            self.core
                .router
                .routeln(&block, Condition::Error, Rank::Unimportant);
        }
    }

    fn terminate(&self, context: &str) -> ! {
        match self.core.fatal_action {
            FatalAction::ExitProcess => std::process::exit(FAILURE_EXIT_CODE),
            FatalAction::Panic => panic!("fatal diagnostic path: {context}"),
        }
    }

    /// Polls for and responds to a background event at a fixed delay; the
    /// first poll happens after `initial_delay_ms`. Lazily starts the single
    /// worker thread. True on successful submission; false once the
    /// scheduler has been shut down.
    pub fn register_periodic_check<C>(
        &self,
        check: C,
        interval_ms: u64,
        initial_delay_ms: u64,
    ) -> bool
    where
        C: PeriodicCheck + 'static,
    {
        self.check(interval_ms > 0, "Interval must be positive");
        self.check(initial_delay_ms > 0, "Delay must be positive");

        let mut slot = self
            .core
            .scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let SchedulerSlot::Idle = &*slot {
            let weak = Arc::downgrade(&self.core);
            let on_death = Box::new(move || {
                if let Some(core) = weak.upgrade() {
                    core.shutdown_outputs();
                }
            });
            match Scheduler::start(Arc::clone(&self.core.liveness), on_death) {
                Some(scheduler) => *slot = SchedulerSlot::Running(scheduler),
                None => return false,
            }
        }
        match &*slot {
            SchedulerSlot::Running(scheduler) => scheduler.register(
                Box::new(check),
                Duration::from_millis(interval_ms),
                Duration::from_millis(initial_delay_ms),
            ),
            _ => false,
        }
    }

    /// Same as [`Self::register_periodic_check`], with the first poll after
    /// one full interval.
    pub fn register_periodic_check_after_interval<C>(&self, check: C, interval_ms: u64) -> bool
    where
        C: PeriodicCheck + 'static,
    {
        self.register_periodic_check(check, interval_ms, interval_ms)
    }

    /// Replaces the whole readout policy in one step.
    pub fn configure(
        &self,
        min_rank: Rank,
        stream_target: StreamTarget,
        log_to_file: bool,
        print_to_console: bool,
    ) {
        self.core.router.set_config(DiagConfig {
            min_rank,
            stream_target,
            log_to_file,
            print_to_console,
        });
    }

    pub fn config(&self) -> DiagConfig {
        self.core.router.config()
    }

    /// All messages at this rank or higher are printed to the console.
    pub fn set_min_rank(&self, rank: Rank) {
        self.core.router.update_config(|c| c.min_rank = rank);
    }

    pub fn set_stream_target(&self, target: StreamTarget) {
        self.core.router.update_config(|c| c.stream_target = target);
    }

    pub fn set_log_to_file(&self, enabled: bool) {
        self.core.router.update_config(|c| c.log_to_file = enabled);
    }

    pub fn set_print_to_console(&self, enabled: bool) {
        self.core
            .router
            .update_config(|c| c.print_to_console = enabled);
    }

    /// The number of important rows displayed in stack traces; the rest of a
    /// trace only appears in the log file.
    pub fn stack_trace_row_limit(&self) -> usize {
        self.core.trace_rows.load(Ordering::SeqCst)
    }

    pub fn set_stack_trace_row_limit(&self, rows: usize) {
        self.core.trace_rows.store(rows, Ordering::SeqCst);
    }

    /// The name of the log file, once one has been created.
    pub fn log_file_name(&self) -> Option<String> {
        self.core.router.log_file_name()
    }

    /// Closes the facility: stops the background worker and closes the log
    /// writer. Idempotent; console printing keeps working afterwards.
    pub fn close(&self) {
        self.core.close();
    }
}

fn describe_error(error: &dyn Error) -> String {
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        description.push_str(&format!("\ncaused by: {cause}"));
        source = cause.source();
    }
    description
}

/// Builder for configuring and creating an [`AppMonitor`].
pub struct MonitorBuilder {
    config: DiagConfig,
    log_folder: Option<PathBuf>,
    console: Option<Box<dyn ConsoleSink>>,
    trace_rows: Option<usize>,
    liveness: Option<LivenessProbe>,
    panic_on_fatal: bool,
}

impl Default for MonitorBuilder {
    fn default() -> Self {
        Self {
            config: DiagConfig::default(),
            log_folder: None,
            console: None,
            trace_rows: None,
            liveness: None,
            panic_on_fatal: false,
        }
    }
}

impl MonitorBuilder {
    /// Messages below this rank are squelched from the console.
    pub fn with_min_rank(self, rank: Rank) -> Self {
        Self {
            config: DiagConfig {
                min_rank: rank,
                ..self.config
            },
            ..self
        }
    }

    pub fn with_stream_target(self, target: StreamTarget) -> Self {
        Self {
            config: DiagConfig {
                stream_target: target,
                ..self.config
            },
            ..self
        }
    }

    /// Never write a log file.
    pub fn no_log_file(self) -> Self {
        Self {
            config: DiagConfig {
                log_to_file: false,
                ..self.config
            },
            ..self
        }
    }

    /// Never print to the console.
    pub fn no_console(self) -> Self {
        Self {
            config: DiagConfig {
                print_to_console: false,
                ..self.config
            },
            ..self
        }
    }

    /// Sets the folder the log file is created in. Defaults to the
    /// `MTDIAG_LOG_FOLDER` name under the working directory.
    pub fn with_log_folder<P: Into<PathBuf>>(self, folder: P) -> Self {
        Self {
            log_folder: Some(folder.into()),
            ..self
        }
    }

    /// Substitutes the console sink, e.g. to capture output in tests.
    pub fn with_console_sink(self, sink: Box<dyn ConsoleSink>) -> Self {
        Self {
            console: Some(sink),
            ..self
        }
    }

    pub fn with_trace_row_limit(self, rows: usize) -> Self {
        Self {
            trace_rows: Some(rows),
            ..self
        }
    }

    /// Substitutes the probe the background worker uses to decide whether
    /// the owning context is still alive. Defaults to the facility's own
    /// alive flag, cleared by `close`.
    pub fn with_liveness_probe<F>(self, probe: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            liveness: Some(Arc::new(probe)),
            ..self
        }
    }

    /// Makes the fatal path panic instead of exiting the process, so tests
    /// can observe it.
    pub fn panic_on_fatal(self) -> Self {
        Self {
            panic_on_fatal: true,
            ..self
        }
    }

    pub fn build(self) -> AppMonitor {
        let Self {
            config,
            log_folder,
            console,
            trace_rows,
            liveness,
            panic_on_fatal,
        } = self;
        let folder = log_folder
            .unwrap_or_else(|| paths::WORKING_DIRECTORY.join(&MTDIAG_CONFIG.LOG_FOLDER));
        let console = console.unwrap_or_else(|| Box::new(StandardStreams));
        let alive = Arc::new(AtomicBool::new(true));
        let liveness = liveness.unwrap_or_else(|| {
            let alive = Arc::clone(&alive);
            Arc::new(move || alive.load(Ordering::SeqCst))
        });
        AppMonitor {
            core: Arc::new(MonitorCore {
                router: Router::new(config, LogFileManager::new(folder), console),
                scheduler: Mutex::new(SchedulerSlot::Idle),
                alive,
                trace_rows: AtomicUsize::new(
                    trace_rows.unwrap_or(MTDIAG_CONFIG.TRACE_ROWS as usize),
                ),
                liveness,
                fatal_action: if panic_on_fatal {
                    FatalAction::Panic
                } else {
                    FatalAction::ExitProcess
                },
            }),
        }
    }

    /// Builds the monitor and installs it as the process-wide facility.
    /// Returns a guard whose drop closes the facility, which is what retires
    /// the background worker when `main` ends.
    #[must_use = "MonitorGuard must be kept alive; its drop shuts the facility down. Do \"let _guard = monitor_config().init_global();\""]
    pub fn init_global(self) -> MonitorGuard {
        crate::install_global(self.build());
        MonitorGuard { _private: () }
    }
}

/// Returns a default [`MonitorBuilder`].
pub fn monitor_config() -> MonitorBuilder {
    MonitorBuilder::default()
}

/// Closes the process-wide facility when dropped.
#[must_use = "MonitorGuard must be kept alive; its drop shuts the facility down. Do \"let _guard = monitor_config().init_global();\""]
pub struct MonitorGuard {
    pub(crate) _private: (),
}

impl Drop for MonitorGuard {
    fn drop(&mut self) {
        crate::global().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::CaptureSink;
    use std::{
        fmt, fs,
        panic::{self, AssertUnwindSafe},
        sync::atomic::AtomicUsize,
    };

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from(format!("/tmp/mtdiag_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn log_content(dir: &PathBuf) -> String {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .collect();
        files.sort();
        assert_eq!(files.len(), 1, "expected exactly one log file");
        fs::read_to_string(&files[0]).unwrap()
    }

    fn monitor(dir: &PathBuf) -> (AppMonitor, CaptureSink) {
        let sink = CaptureSink::default();
        let monitor = monitor_config()
            .with_log_folder(dir.clone())
            .with_console_sink(Box::new(sink.clone()))
            .panic_on_fatal()
            .build();
        (monitor, sink)
    }

    #[derive(Debug)]
    struct BrokenPipeline;

    impl fmt::Display for BrokenPipeline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "the pipeline fell over")
        }
    }

    impl Error for BrokenPipeline {}

    #[derive(Debug)]
    struct PipelineWrapper(BrokenPipeline);

    impl fmt::Display for PipelineWrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "startup aborted")
        }
    }

    impl Error for PipelineWrapper {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    struct FlagCheck {
        responded: Arc<AtomicUsize>,
    }

    impl PeriodicCheck for FlagCheck {
        fn check_for_occurrence(&mut self) -> bool {
            true
        }

        fn respond_to_occurrence(&mut self) {
            self.responded.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_check_true_is_silent() {
        let dir = test_dir("monitor_check_true");
        let (monitor, sink) = monitor(&dir);
        monitor.check(true, "nothing to see");
        assert_eq!(sink.out_text(), "");
        assert_eq!(sink.err_text(), "");
        assert!(!dir.exists());
    }

    #[test]
    fn test_check_false_is_fatal_and_reports() {
        let dir = test_dir("monitor_check_false");
        let (monitor, sink) = monitor(&dir);
        // The head of the trace may never be squelched.
        monitor.set_min_rank(Rank::Important);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.check(false, "I am an assertion and you failed me.");
        }));
        assert!(result.is_err());

        let console = sink.out_text();
        assert!(console.contains("Assertion failed in thread"));
        assert!(console.contains("I am an assertion and you failed me."));

        let log = log_content(&dir);
        assert!(log.contains("I am an assertion and you failed me."));
        assert!(log.contains("The log file is being shut down."));
        // The tail of the trace is log-only.
        assert!(log.len() > console.len());
    }

    #[test]
    fn test_fatal_head_respects_row_limit() {
        let dir = test_dir("monitor_row_limit");
        let (monitor, sink) = monitor(&dir);
        monitor.set_stack_trace_row_limit(0);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.check(false, "short readout");
        }));
        assert!(result.is_err());

        let console = sink.out_text();
        assert!(console.contains("short readout"));
        // With a row limit of zero every frame lands in the log-only tail.
        let log = log_content(&dir);
        assert!(log.len() > console.len() + 100);
    }

    #[test]
    fn test_kill_application_reports_and_terminates() {
        let dir = test_dir("monitor_kill");
        let (monitor, sink) = monitor(&dir);

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.kill_application("everything is on fire");
        }));
        assert!(result.is_err());
        assert!(sink.out_text().contains("everything is on fire"));
        assert!(log_content(&dir).contains("everything is on fire"));
    }

    #[test]
    fn test_kill_application_with_cause_names_the_cause() {
        let dir = test_dir("monitor_kill_cause");
        let (monitor, _sink) = monitor(&dir);

        let cause = PipelineWrapper(BrokenPipeline);
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.kill_application_with_cause("could not start", &cause);
        }));
        assert!(result.is_err());

        let log = log_content(&dir);
        assert!(log.contains("could not start"));
        assert!(log.contains("startup aborted"));
        assert!(log.contains("caused by: the pipeline fell over"));
    }

    #[test]
    fn test_print_exception_reports_chain_and_location() {
        let dir = test_dir("monitor_exception");
        let (monitor, sink) = monitor(&dir);
        monitor.set_stream_target(StreamTarget::ByCondition);

        let error = PipelineWrapper(BrokenPipeline);
        monitor.print_exception(&error);

        let console = sink.err_text();
        assert!(console.contains("startup aborted"));
        assert!(console.contains("caused by: the pipeline fell over"));
        assert!(console.contains("monitor.rs"));
        let log = log_content(&dir);
        assert!(log.contains("startup aborted"));
    }

    #[test]
    fn test_rank_squelching_end_to_end() {
        let dir = test_dir("monitor_squelch");
        let (monitor, sink) = monitor(&dir);

        monitor.print_unimportant("code flow explanation");
        assert_eq!(sink.out_text(), "");
        assert!(log_content(&dir).contains("code flow explanation"));

        monitor.set_min_rank(Rank::Important);
        monitor.print("normal chatter");
        monitor.print_important("cannot be squelched");
        let console = sink.out_text();
        assert!(!console.contains("normal chatter"));
        assert!(console.contains("cannot be squelched"));
    }

    #[test]
    fn test_by_condition_scenario() {
        let dir = test_dir("monitor_by_condition");
        let (monitor, sink) = monitor(&dir);
        monitor.configure(Rank::Normal, StreamTarget::ByCondition, true, true);

        monitor.print_error("xerxes");
        monitor.print("yaxley");

        assert!(sink.err_text().contains("xerxes"));
        assert!(sink.out_text().contains("yaxley"));
        let log = log_content(&dir);
        assert!(log.find("xerxes").unwrap() < log.find("yaxley").unwrap());
    }

    #[test]
    fn test_print_carries_thread_name_and_location() {
        let dir = test_dir("monitor_context_header");
        let (monitor, sink) = monitor(&dir);

        monitor.print("where am I");
        let console = sink.out_text();
        assert!(console.contains("Thread \""));
        assert!(console.contains("monitor.rs"));
        assert!(console.contains("where am I"));
    }

    #[test]
    fn test_register_with_zero_interval_is_fatal() {
        let dir = test_dir("monitor_zero_interval");
        let (monitor, _sink) = monitor(&dir);

        let responded = Arc::new(AtomicUsize::new(0));
        let check = FlagCheck {
            responded: Arc::clone(&responded),
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.register_periodic_check(check, 0, 10);
        }));
        assert!(result.is_err());
        assert!(log_content(&dir).contains("Interval must be positive"));
    }

    #[test]
    fn test_periodic_check_runs_until_close() {
        let dir = test_dir("monitor_periodic");
        let (monitor, _sink) = monitor(&dir);

        let responded = Arc::new(AtomicUsize::new(0));
        assert!(monitor.register_periodic_check(
            FlagCheck {
                responded: Arc::clone(&responded),
            },
            5,
            5,
        ));
        thread::sleep(Duration::from_millis(100));
        assert!(responded.load(Ordering::SeqCst) >= 1);

        monitor.close();
        let after_close = responded.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(responded.load(Ordering::SeqCst), after_close);

        // The scheduler is created at most once; registration after close
        // fails without crashing.
        let rejected = FlagCheck {
            responded: Arc::clone(&responded),
        };
        assert!(!monitor.register_periodic_check(rejected, 5, 5));
        assert!(log_content(&dir).contains("The scheduler has been shut down"));
    }

    #[test]
    fn test_dead_liveness_probe_shuts_outputs_down() {
        let dir = test_dir("monitor_liveness");
        let sink = CaptureSink::default();
        let monitor = monitor_config()
            .with_log_folder(dir.clone())
            .with_console_sink(Box::new(sink.clone()))
            .with_liveness_probe(|| false)
            .panic_on_fatal()
            .build();

        monitor.print("before death");
        let responded = Arc::new(AtomicUsize::new(0));
        assert!(monitor.register_periodic_check(
            FlagCheck {
                responded: Arc::clone(&responded),
            },
            5,
            5,
        ));
        thread::sleep(Duration::from_millis(100));

        // The worker noticed the dead context: no check ever ran and the
        // log writer is closed.
        assert_eq!(responded.load(Ordering::SeqCst), 0);
        assert!(log_content(&dir).contains("The log file is being shut down."));
        monitor.close();
    }

    #[test]
    fn test_close_is_idempotent_and_console_survives() {
        let dir = test_dir("monitor_close");
        let (monitor, sink) = monitor(&dir);

        monitor.print("logged line");
        assert!(monitor.log_file_name().is_some());
        monitor.close();
        monitor.close();

        monitor.print("console still works");
        assert!(sink.out_text().contains("console still works"));
        assert!(!log_content(&dir).contains("console still works"));
    }

    #[test]
    fn test_log_file_name_appears_after_first_write() {
        let dir = test_dir("monitor_file_name");
        let (monitor, _sink) = monitor(&dir);

        assert!(monitor.log_file_name().is_none());
        monitor.print("force initialization");
        let name = monitor.log_file_name().unwrap();
        assert!(name.ends_with(".txt"));
    }
}

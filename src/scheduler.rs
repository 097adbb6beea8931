use std::{
    sync::{Arc, Mutex, PoisonError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

/// A background occurrence which needs to be polled for and responded to.
pub trait PeriodicCheck: Send {
    /// Checks whether the occurrence has happened. When this returns true,
    /// [`Self::respond_to_occurrence`] is called to handle it.
    fn check_for_occurrence(&mut self) -> bool;

    /// Handles the occurrence detected by [`Self::check_for_occurrence`].
    fn respond_to_occurrence(&mut self);
}

/// Tells the worker whether the owning context is still alive.
pub type LivenessProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// Runs once when the worker detects that the owning context has died.
pub type ShutdownAction = Box<dyn FnOnce() + Send>;

enum Command {
    Register(Task),
    Shutdown,
}

struct Task {
    check: Box<dyn PeriodicCheck>,
    interval: Duration,
    next_due: Instant,
}

/// Single-worker scheduler for [`PeriodicCheck`]s. Ticks use fixed-delay
/// semantics, so a slow check self-throttles instead of piling up. The
/// worker retires itself, shutting the facility's outputs down first, once
/// the liveness probe reports death.
pub struct Scheduler {
    sender: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Spawns the worker thread. `None` when the thread cannot be created.
    pub fn start(alive: LivenessProbe, on_death: ShutdownAction) -> Option<Self> {
        let (sender, receiver) = unbounded::<Command>();
        let handle = thread::Builder::new()
            .name(String::from("event_checker"))
            .spawn(move || run_worker(receiver, alive, on_death))
            .ok()?;
        Some(Self {
            sender,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Hands a check to the worker. Never blocks; false once the worker is
    /// gone.
    pub fn register(
        &self,
        check: Box<dyn PeriodicCheck>,
        interval: Duration,
        initial_delay: Duration,
    ) -> bool {
        let task = Task {
            check,
            interval,
            next_due: Instant::now() + initial_delay,
        };
        self.sender.send(Command::Register(task)).is_ok()
    }

    /// Stops the worker and joins it. Idempotent.
    pub fn shutdown(&self) {
        let mut guard = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = guard.take() {
            let _ = self.sender.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(receiver: Receiver<Command>, alive: LivenessProbe, on_death: ShutdownAction) {
    let mut on_death = Some(on_death);
    let mut tasks: Vec<Task> = Vec::new();
    loop {
        let now = Instant::now();
        let next_due = tasks.iter().map(|task| task.next_due).min();
        let command = match next_due {
            Some(due) => receiver.recv_timeout(due.saturating_duration_since(now)),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match command {
            Ok(Command::Register(task)) => tasks.push(task),
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if !alive() {
                    if let Some(on_death) = on_death.take() {
                        on_death();
                    }
                    break;
                }
                let now = Instant::now();
                for task in &mut tasks {
                    if task.next_due <= now {
                        if task.check.check_for_occurrence() {
                            task.check.respond_to_occurrence();
                        }
                        // Fixed delay: the next tick is relative to the
                        // completion of this one.
                        task.next_due = Instant::now() + task.interval;
                    }
                }
            }
        }
    }
}

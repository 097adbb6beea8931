//! Walk-through of the diagnostics facility: stream targets, severity
//! squelching, exception readouts, background event polling and a terminal
//! failed assertion. Run with `cargo run --example diagnostics_demo`; the
//! process exits non-zero on purpose and the full story lands in
//! `log_files/`.

use std::{error::Error, io, thread, time::Duration};

use mtdiag::{PeriodicCheck, Rank, StreamTarget};

struct HeartbeatCheck {
    remaining: u32,
}

impl PeriodicCheck for HeartbeatCheck {
    fn check_for_occurrence(&mut self) -> bool {
        self.remaining > 0
    }

    fn respond_to_occurrence(&mut self) {
        self.remaining -= 1;
        mtdiag::print("A background event was polled for and handled.");
    }
}

fn main() {
    let _guard = mtdiag::monitor_config().init_global();
    mtdiag::install_log_bridge().expect("no other logger is installed");

    // Only print to standard out.
    mtdiag::set_stream_target(StreamTarget::OnlyStdout);
    mtdiag::print_error("I am to be printed on standard out");
    thread::sleep(Duration::from_millis(20));
    // Only print to standard error.
    mtdiag::set_stream_target(StreamTarget::OnlyStderr);
    mtdiag::print_error("I am to be printed on standard error");
    // Errors to standard error, everything else to standard out.
    mtdiag::set_stream_target(StreamTarget::ByCondition);

    log::info!("Ordinary log records are forwarded to the facility.");

    if let Err(error) = two() {
        mtdiag::print_exception(error.as_ref());
        mtdiag::print_exception_with(
            "Input mismatch",
            &io::Error::other("I am another exception"),
        );
    }

    mtdiag::register_periodic_check(HeartbeatCheck { remaining: 3 }, 50, 50);
    thread::sleep(Duration::from_millis(250));

    four();
}

fn two() -> Result<(), Box<dyn Error>> {
    three();
    mtdiag::print_error("I am a method called by another method.");
    Err(Box::new(io::Error::other("Hi, I am an exception.")))
}

fn three() {
    mtdiag::print_unimportant(
        "I am not important enough to appear on the terminal,\nalthough I am in the log file.",
    );
    // Only important messages show.
    mtdiag::set_min_rank(Rank::Important);
    mtdiag::print_important("I am so important that I cannot be squelched.");
    mtdiag::set_min_rank(Rank::Normal);
}

fn four() {
    five();
    mtdiag::print_error("lalala 4");
}

fn five() {
    six();
}

fn six() {
    seven();
}

fn seven() {
    mtdiag::print_error("lalala 7");
    // Only display 4 rows of stack trace; the rest only appears in the log.
    mtdiag::set_stack_trace_row_limit(4);
    mtdiag::check(false, "I am an assertion and you failed me.");
    // Not reached.
}

use std::sync::{Arc, Mutex};

use crate::router::ConsoleSink;

/// Console sink that captures both streams for assertions.
#[derive(Clone, Default)]
pub struct CaptureSink {
    out: Arc<Mutex<String>>,
    err: Arc<Mutex<String>>,
}

impl CaptureSink {
    pub fn out_text(&self) -> String {
        self.out.lock().unwrap().clone()
    }

    pub fn err_text(&self) -> String {
        self.err.lock().unwrap().clone()
    }
}

impl ConsoleSink for CaptureSink {
    fn write_out(&mut self, text: &str) {
        self.out.lock().unwrap().push_str(text);
    }

    fn write_err(&mut self, text: &str) {
        self.err.lock().unwrap().push_str(text);
    }
}

//! Spinner for slow remote calls.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

const SPINNER_UPDATE_INTERVAL_MS: u64 = 100;
const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Spinner drawn on stderr so it never mixes with command output.
///
/// It stays silent when stderr is not a terminal.
pub struct ProgressSpinner {
    message: String,
    enabled: bool,
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ProgressSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            enabled: atty::is(atty::Stream::Stderr),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    /// Force the spinner off, e.g. for `--quiet` or structured output.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&mut self) {
        if !self.enabled || self.handle.is_some() {
            return;
        }
        self.running.store(true, Ordering::Relaxed);
        let running = Arc::clone(&self.running);
        let message = self.message.clone();

        let handle = thread::spawn(move || {
            let mut index = 0;
            let mut stderr = io::stderr();

            while running.load(Ordering::Relaxed) {
                let _ = write!(stderr, "\r{} {}", SPINNER_CHARS[index], message);
                let _ = stderr.flush();

                index = (index + 1) % SPINNER_CHARS.len();
                thread::sleep(Duration::from_millis(SPINNER_UPDATE_INTERVAL_MS));
            }

            let _ = write!(stderr, "\r{:<width$}\r", "", width = message.chars().count() + 2);
            let _ = stderr.flush();
        });

        self.handle = Some(handle);
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressSpinner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_spinner_never_spawns() {
        let mut spinner = ProgressSpinner::new("Listing services").disabled();
        spinner.start();
        assert!(!spinner.is_enabled());
        assert!(spinner.handle.is_none());
        spinner.stop();
    }
}

//! Keypress watching for the supervision loop
//!
//! The bring-up command holds port-forwards open until the user asks to quit.
//! A detached thread reads stdin line by line and flips a shared flag when a
//! `q` arrives; the supervision loop polls the flag.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::debug;

/// Watches stdin for a quit request on a background thread
#[derive(Debug)]
pub struct QuitWatcher {
    requested: Arc<AtomicBool>,
}

impl QuitWatcher {
    /// Start watching stdin.
    ///
    /// The reader thread is detached; it dies with the process. Stdin being
    /// closed (e.g. running non-interactively) just ends the thread without
    /// ever requesting quit.
    #[must_use]
    pub fn spawn() -> Self {
        let requested = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&requested);

        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().eq_ignore_ascii_case("q") {
                    debug!("Quit requested from stdin");
                    flag.store(true, Ordering::Relaxed);
                    break;
                }
            }
        });

        Self { requested }
    }

    /// Whether a quit has been requested
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.requested.load(Ordering::Relaxed)
    }
}

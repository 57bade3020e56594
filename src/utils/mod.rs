//! Utility modules for common functionality
//!
//! Provides reusable utilities for process execution, local port probing,
//! and terminal input.

pub mod net;
pub mod process;
pub mod term;

pub use process::ProcessRunner;
pub use term::QuitWatcher;

//! Terminal output: colored `log!`/`debug!` lines and a progress counter.
//!
//! ```ignore
//! log!("sprite"; "emitted {}", name);
//!
//! let progress = ProgressLine::new("emit", 4);
//! progress.inc();
//! progress.finish();
//! ```
//!
//! While a [`ProgressLine`] is on screen, log lines are printed above it
//! and the counter is redrawn underneath.

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::io::{Write, stdout};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Rendered text of the active progress line, if any.
static PROGRESS: Mutex<Option<String>> = Mutex::new(None);

/// Set verbose mode globally (`--verbose`).
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print one prefixed line, keeping an active progress line at the bottom.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let progress = PROGRESS.lock();

    let mut stdout = stdout().lock();
    if progress.is_some() {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }
    writeln!(stdout, "{prefix} {message}").ok();
    if let Some(line) = progress.as_deref() {
        write!(stdout, "{line}").ok();
    }
    stdout.flush().ok();
}

fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "sprite" | "emit" => prefix.bright_blue().bold().to_string(),
        "build" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        "warning" => prefix.yellow().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// In-place `[label] done/total` counter.
///
/// Dropping without [`finish`](Self::finish) erases the line.
pub struct ProgressLine {
    label: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    pub fn new(label: &'static str, total: usize) -> Self {
        let progress = Self {
            label,
            total,
            current: AtomicUsize::new(0),
        };
        progress.redraw();
        progress
    }

    pub fn inc(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        self.redraw();
    }

    fn line(&self) -> String {
        format!(
            "{} {}/{}",
            colorize_prefix(self.label),
            self.current.load(Ordering::Relaxed),
            self.total
        )
    }

    fn redraw(&self) {
        let line = self.line();
        let mut progress = PROGRESS.lock();
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{line}").ok();
        stdout.flush().ok();
        *progress = Some(line);
    }

    /// Leave the final count on screen.
    pub fn finish(self) {
        if PROGRESS.lock().take().is_some() {
            let mut stdout = stdout().lock();
            writeln!(stdout).ok();
            stdout.flush().ok();
        }
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        if PROGRESS.lock().take().is_some() {
            let mut stdout = stdout().lock();
            execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
            stdout.flush().ok();
        }
    }
}

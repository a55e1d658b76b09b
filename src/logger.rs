//! Terminal output for kiln.
//!
//! - `log!` / `debug!` / `debug_do!`: lines tagged with a colored `[module]`
//! - `status_success` / `status_error`: the watch-mode result block, which is
//!   redrawn in place after every batch
//! - `ProgressLine`: per-kind task counters shown while a full build runs
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! debug!("plan"; "{} -> {} dependent(s)", path.display(), n);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set while a `ProgressLine` owns the bottom terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

#[allow(dead_code)] // read through `debug!`
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// macros
// ============================================================================

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

/// Run a block only with `--verbose`, for debug output that costs something
/// to compute.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

/// Print `[module] message`, keeping an active progress line at the bottom.
pub fn log(module: &str, message: &str) {
    let mut out = stdout().lock();
    let progress = PROGRESS_ACTIVE.load(Ordering::SeqCst);

    if progress {
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    } else {
        execute!(out, Clear(ClearType::UntilNewLine)).ok();
    }
    writeln!(out, "{} {message}", tag(module)).ok();
    out.flush().ok();
}

fn tag(module: &str) -> String {
    let tag = format!("[{module}]");
    match module {
        "serve" | "ws" => tag.bright_blue().bold().to_string(),
        "watch" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// watch status
// ============================================================================

/// Batch results in watch mode. Each result replaces the previous block, so
/// a failure listing disappears once the next batch succeeds.
struct StatusBlock {
    /// Terminal lines the previous block occupies
    height: usize,
}

static STATUS: Mutex<StatusBlock> = parking_lot::const_mutex(StatusBlock { height: 0 });

impl StatusBlock {
    fn show(&mut self, symbol: &str, message: &str) {
        let mut out = stdout().lock();
        if self.height > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let up = self.height.min(u16::MAX as usize) as u16;
            execute!(out, cursor::MoveUp(up), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock(unix_now())).dimmed().to_string();
        writeln!(out, "{stamp} {symbol} {message}").ok();
        out.flush().ok();

        self.height = line_count(message);
    }
}

pub fn status_success(message: &str) {
    STATUS.lock().show(&"✓".green().to_string(), message);
}

/// `summary` on the status line, `detail` (one failure per line) below it.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    STATUS.lock().show(&"✗".red().to_string(), &message);
}

fn line_count(message: &str) -> usize {
    message.lines().count().max(1)
}

fn unix_now() -> u64 {
    use std::time::SystemTime;
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// `HH:MM:SS` (UTC) of a unix timestamp.
fn clock(secs: u64) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs / 60) % 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

// ============================================================================
// progress line
// ============================================================================

/// `[build] style(1/2) markup(42/69) markdown(5/10) merge(0/10)`
///
/// Workers call `inc` concurrently; a redraw is skipped while another
/// thread is drawing.
pub struct ProgressLine {
    counters: Vec<Counter>,
    drawing: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    done: AtomicUsize,
}

impl ProgressLine {
    /// Kinds with nothing to do get no counter.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| Counter {
                name,
                total,
                done: AtomicUsize::new(0),
            })
            .collect();

        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            counters,
            drawing: Mutex::new(()),
        };
        progress.draw(false);
        progress
    }

    pub fn inc(&self, name: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.done.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.drawing.try_lock() {
            self.draw(false);
        }
    }

    /// Leave the final counts on screen.
    pub fn finish(self) {
        {
            let _guard = self.drawing.lock();
            self.draw(true);
        }
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        std::mem::forget(self);
    }

    fn render(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.done.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn draw(&self, last: bool) {
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if last {
            writeln!(out, "{} {}", tag("build"), self.render()).ok();
        } else {
            write!(out, "{} {}", tag("build"), self.render()).ok();
        }
        out.flush().ok();
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut out = stdout().lock();
        execute!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        out.flush().ok();
    }
}

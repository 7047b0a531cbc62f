//! A minimal, zero-dependency logging crate for the Cobbler runtime.
//!
//! Records go to standard error with the emitting module path and a colored
//! level tag. Tests can redirect the current thread's records into memory with
//! [`capture`] and assert on them.
//!
//! # Example
//!
//! ```
//! use cobbler_log::{debug, info, warn, Level};
//!
//! cobbler_log::set_level(Level::Debug);
//!
//! info!("runtime ready");
//! debug!("{} classes registered", 4);
//! warn!("release pool still holds {} objects", 2);
//! ```

use std::cell::RefCell;
use std::fmt::{self, Arguments};
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log levels, ordered from most severe (`Error`) to least severe (`Trace`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Failures the runtime recovered from but could not complete.
    Error = 0,
    /// Suspicious situations, such as a constructor returning nil.
    Warn = 1,
    /// Informational messages.
    Info = 2,
    /// Registry and pool events.
    Debug = 3,
    /// Per-instance lifecycle events.
    Trace = 4,
}

impl Level {
    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Returns the upper-case name of this level.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            3 => Level::Debug,
            4 => Level::Trace,
            _ => Level::Info,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Level`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError {
    input: String,
}

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.input)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    /// Parses a level name, ignoring case.
    ///
    /// ```
    /// use cobbler_log::Level;
    ///
    /// assert_eq!("warn".parse::<Level>(), Ok(Level::Warn));
    /// assert!("loud".parse::<Level>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Ok(Level::Error),
            "WARN" | "WARNING" => Ok(Level::Warn),
            "INFO" => Ok(Level::Info),
            "DEBUG" => Ok(Level::Debug),
            "TRACE" => Ok(Level::Trace),
            _ => Err(ParseLevelError {
                input: s.to_string(),
            }),
        }
    }
}

/// The process-wide level filter.
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    /// Sets the minimum level that reaches standard error.
    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    /// Returns the current minimum level.
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Checks whether a record at `level` passes the filter.
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, initialized at `Level::Info`.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Info))
}

/// Sets the minimum level of the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Returns the minimum level of the global logger.
pub fn level() -> Level {
    get_logger().level()
}

/// Applies the level named by environment variable `var`, if it is set.
///
/// Returns the level in effect afterwards. An unset variable leaves the
/// current level alone; a value that is not a level name is an error and
/// also leaves it alone.
///
/// ```
/// use cobbler_log::{init_from_env, Level};
///
/// // Not set in the doc-test environment.
/// let level = init_from_env("COBBLER_DOCTEST_LOG").unwrap();
/// assert_eq!(level, cobbler_log::level());
/// ```
pub fn init_from_env(var: &str) -> Result<Level, ParseLevelError> {
    if let Ok(value) = std::env::var(var) {
        set_level(value.parse()?);
    }
    Ok(level())
}

/// One log record as seen by [`capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Severity.
    pub level: Level,
    /// Module path of the call site.
    pub target: String,
    /// Formatted message.
    pub message: String,
}

thread_local! {
    static CAPTURE: RefCell<Option<Vec<Record>>> = const { RefCell::new(None) };
}

fn capturing() -> bool {
    CAPTURE
        .try_with(|sink| sink.borrow().is_some())
        .unwrap_or(false)
}

/// Runs `f` while collecting this thread's log records instead of printing them.
///
/// Every level is collected regardless of the global filter. Captures nest:
/// an inner capture takes the records emitted inside it, and the outer one
/// resumes afterwards.
///
/// ```
/// use cobbler_log::{capture, trace, Level};
///
/// let ((), records) = capture(|| trace!("allocated {}", 3));
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].level, Level::Trace);
/// assert_eq!(records[0].message, "allocated 3");
/// ```
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Record>) {
    let mut guard = CaptureGuard {
        outer: Some(CAPTURE.with(|sink| sink.borrow_mut().replace(Vec::new()))),
    };
    let result = f();
    (result, guard.finish())
}

/// Reinstates the enclosing sink when a capture ends, also on unwind.
struct CaptureGuard {
    outer: Option<Option<Vec<Record>>>,
}

impl CaptureGuard {
    fn finish(&mut self) -> Vec<Record> {
        let Some(outer) = self.outer.take() else {
            return Vec::new();
        };
        CAPTURE
            .try_with(|sink| std::mem::replace(&mut *sink.borrow_mut(), outer))
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Returns `true` when a record at `level` would be printed or captured.
pub fn enabled(level: Level) -> bool {
    get_logger().enabled(level) || capturing()
}

#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments) {
    static RESET: &str = "\x1b[0m";

    let captured = CAPTURE
        .try_with(|sink| match sink.borrow_mut().as_mut() {
            Some(records) => {
                records.push(Record {
                    level,
                    target: target.to_string(),
                    message: args.to_string(),
                });
                true
            }
            None => false,
        })
        .unwrap_or(false);
    if captured || !get_logger().enabled(level) {
        return;
    }

    let color = level.color_code();
    eprintln!("{color}[{level}]{RESET} {target}: {args}");
}

/// Logs a message at an explicit level, tagged with the calling module.
///
/// ```
/// use cobbler_log::{log, Level};
///
/// log!(level: Level::Info, "pool depth {}", 1);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::enabled(level) {
            $crate::__log_with_target(level, module_path!(), format_args!($($arg)*));
        }
    }};
}

/// Logs at [`Level::Error`].
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

/// Logs at [`Level::Warn`].
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

/// Logs at [`Level::Info`].
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

/// Logs at [`Level::Debug`].
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

/// Logs at [`Level::Trace`].
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}

// Logging bridge: `log` facade records forwarded to a host-supplied sink.

use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record};
use mirror_ffi::MirrorLogCallback;

#[doc(hidden)]
pub use log as __log;

/// Log level constants for the `mlog!` macro and the host callback.
pub const LOG_DISPLAY: u8 = 0;
pub const LOG_WARNING: u8 = 1;
pub const LOG_ERROR: u8 = 2;

/// Map a host level constant onto the `log` facade.
pub fn level_from_u8(level: u8) -> Level {
    match level {
        LOG_DISPLAY => Level::Info,
        LOG_WARNING => Level::Warn,
        _ => Level::Error,
    }
}

/// Map a `log` level onto the host level constants.
pub fn level_to_u8(level: Level) -> u8 {
    match level {
        Level::Error => LOG_ERROR,
        Level::Warn => LOG_WARNING,
        _ => LOG_DISPLAY,
    }
}

/// Log a message with one of the host level constants.
///
/// Usage:
/// ```ignore
/// mlog!(LOG_DISPLAY, "registered {} types", count);
/// mlog!(LOG_WARNING, "type {name} registered twice");
/// ```
#[macro_export]
macro_rules! mlog {
    ($level:expr, $($arg:tt)*) => {{
        $crate::logging::__log::log!($crate::logging::level_from_u8($level), $($arg)*);
    }};
}

/// `log::Log` implementation that forwards every record to the host.
struct HostLogger {
    callback: MirrorLogCallback,
}

impl Log for HostLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[mirror] {}", record.args());
        let bytes = msg.as_bytes();
        // SAFETY: the host guarantees the callback stays valid for the process
        // lifetime once installed; the slice outlives the call.
        unsafe {
            (self.callback)(level_to_u8(record.level()), bytes.as_ptr(), bytes.len() as u32);
        }
    }

    fn flush(&self) {}
}

static HOST_LOGGER: OnceLock<HostLogger> = OnceLock::new();

/// Install a host log sink as the global `log` logger.
///
/// Returns `false` if a logger (host or otherwise) is already installed.
pub fn install_host_logger(callback: MirrorLogCallback, max_level: LevelFilter) -> bool {
    if HOST_LOGGER.get().is_some() {
        return false;
    }
    let logger = HOST_LOGGER.get_or_init(|| HostLogger { callback });
    if log::set_logger(logger).is_err() {
        return false;
    }
    log::set_max_level(max_level);
    true
}

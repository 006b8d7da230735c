//! Module-gated logging macros.
//!
//! Every module that logs declares its own switch and then calls the
//! macros, which are exported at the crate root:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_debug, log_info, log_warn};
//!
//! log_info!("session {} finalized", id);
//! ```
//!
//! Output goes through the `log` facade, so whichever backend the host
//! installed (the binary uses `env_logger`, see [`crate::init_logging`])
//! decides what is shown.

/// `log::info!` guarded by the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// `log::warn!` guarded by the calling module's `ENABLE_LOGS`.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// `log::debug!` guarded by the calling module's `ENABLE_LOGS`.
///
/// Used for per-entry chatter (unsupported channels, ignored late samples)
/// that would drown the info stream.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

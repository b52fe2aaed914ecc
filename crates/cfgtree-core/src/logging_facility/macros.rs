//! Operation boundary macros
//!
//! Every public entry point that touches a file or an editor session
//! (`open_editor`, `accept_editor`, `load`, `save`, `build_config`) brackets
//! its work with one start event and exactly one end or end-error event.
//! Extra `key = value` fields are passed through to `tracing` unchanged.

/// Log the start of an operation
///
/// ```
/// # use cfgtree_core::log_op_start;
/// log_op_start!("open_editor");
/// log_op_start!("load", path = "config.yaml", encoded = false);
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_START,
            $($($field)*)?
        );
    };
}

/// Log the successful end of an operation with its duration
///
/// ```
/// # use cfgtree_core::log_op_end;
/// log_op_end!("accept_editor", duration_ms = 3, changed = 2u64);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END,
            duration_ms = $duration,
            $($($field)*)?
        );
    };
}

/// Log a failed operation
///
/// The error goes through `ExError`, so the event carries the stable
/// `err.code` (e.g. `ERR_MALFORMED_DOCUMENT`) next to `err.kind`.
///
/// ```
/// # use cfgtree_core::{log_op_error, errors::CfgTreeError};
/// let err = CfgTreeError::NodeNotFound { path: "ss1/missing".to_string() };
/// log_op_error!("force_hide", err, duration_ms = 1);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let ex_err: $crate::errors::ExError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            $($($field)*)?
        );
    }};
}

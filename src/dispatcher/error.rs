//! Dispatcher errors.

// Layer 2: Third-party crate imports
use thiserror::Error;

/// Errors raised while resolving or invoking a remote call (§4.4, §7).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Neither the plugin's table nor its own module namespace has
    /// `classname`/`method` (§4.4 step 1).
    #[error("no remote method {classname}.{method}")]
    NotFound { classname: String, method: String },

    /// The call supplied the wrong number of positional arguments.
    #[error("{classname}.{method} expects {expected_min}..{expected_max:?} args, got {got}")]
    ArityMismatch {
        classname: String,
        method: String,
        expected_min: usize,
        expected_max: Option<usize>,
        got: usize,
    },

    /// A second registration attempted to bind a classname/method pair
    /// the dispatcher already holds.
    #[error("{classname}.{method} is already registered")]
    AlreadyRegistered { classname: String, method: String },
}

impl DispatchError {
    /// Per §7, `NotFound` and arity errors are packaged as a remote
    /// exception on the reply rather than surfaced as a transport fault.
    /// `AlreadyRegistered` instead aborts the registering plugin's load.
    pub fn is_remote_exception(&self) -> bool {
        !matches!(self, DispatchError::AlreadyRegistered { .. })
    }
}

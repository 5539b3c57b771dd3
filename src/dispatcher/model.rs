//! `Return` packaging (§4.4 step 4): the dispatcher-internal result of
//! one call, before it is folded into a reply [`crate::envelope::ReplyResult`].

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use serde_json::Value;

// Layer 3: Internal module imports
use crate::envelope::ReplyResult;

/// Enough detail to reconstruct a typed exception on the client
/// (§6 `{exval, xmodule, xclass, xstate, xargs}`).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteException {
    pub exclass: String,
    pub exmsg: String,
    pub xmodule: Option<String>,
    pub xstate: Option<Value>,
    pub xargs: Option<Value>,
}

impl RemoteException {
    pub fn new(exclass: impl Into<String>, exmsg: impl Into<String>) -> Self {
        Self {
            exclass: exclass.into(),
            exmsg: exmsg.into(),
            xmodule: None,
            xstate: None,
            xargs: None,
        }
    }

    pub fn with_xargs(mut self, xargs: Value) -> Self {
        self.xargs = Some(xargs);
        self
    }
}

/// The outcome of one dispatched call: a success value, or an
/// exception captured rather than propagated (§4.4, §7 "all user
/// exceptions are captured into `Return.exval` — never propagated out").
#[derive(Debug, Clone, PartialEq)]
pub enum Return {
    Success(Value),
    Exception(RemoteException),
}

impl Return {
    pub fn success(value: Value) -> Self {
        Self::Success(value)
    }

    pub fn exception(exclass: impl Into<String>, exmsg: impl Into<String>) -> Self {
        Self::Exception(RemoteException::new(exclass, exmsg))
    }

    pub fn is_exception(&self) -> bool {
        matches!(self, Self::Exception(_))
    }
}

impl From<Return> for ReplyResult {
    fn from(value: Return) -> Self {
        match value {
            Return::Success(retval) => ReplyResult::Success { retval },
            Return::Exception(exc) => ReplyResult::Failure {
                exval: exc.exmsg,
                xmodule: exc.xmodule,
                xclass: Some(exc.exclass),
                xstate: exc.xstate,
                xargs: exc.xargs,
            },
        }
    }
}

/// Optional gates a registered remote method may impose beyond plain
/// resolution (§4.4 "constrained by required secret, permitted user, or window").
#[derive(Debug, Clone, Default)]
pub struct RemoteConstraints {
    pub required_secret: Option<String>,
    pub permitted_user: Option<String>,
    pub window_required: bool,
}

pub type Kws = BTreeMap<String, Value>;

//! The envelope wire model (§3, §6).

// Layer 1: Standard library imports
use std::collections::BTreeMap;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use super::error::EnvelopeError;
use super::window::Window;
use crate::auth::Authenticator;
use crate::util::Sn;

/// The protocol version this crate speaks. A consumer discards any
/// envelope whose `version` does not equal this, per §4.1.
pub const SUPPORTED_VERSION: &str = "1";

/// `(from, to)` addresses, serialized on the wire as a 2-element JSON
/// array (§3 "Destination", §6 `routing: [from, to]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routing(pub String, pub String);

impl Routing {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self(from.into(), to.into())
    }

    pub fn from(&self) -> &str {
        &self.0
    }

    pub fn to(&self) -> &str {
        &self.1
    }
}

/// Constructor arguments for the target class, when the call implies
/// building an instance before invoking the method (§3 "cntr").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cntr {
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kws: BTreeMap<String, Value>,
}

/// The nested `request` body of a request envelope (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub classname: String,
    pub method: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kws: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cntr: Option<Cntr>,
}

impl Request {
    pub fn new(classname: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            classname: classname.into(),
            method: method.into(),
            args: Vec::new(),
            kws: BTreeMap::new(),
            cntr: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_kws(mut self, kws: BTreeMap<String, Value>) -> Self {
        self.kws = kws;
        self
    }

    pub fn with_cntr(mut self, cntr: Cntr) -> Self {
        self.cntr = Some(cntr);
        self
    }
}

/// Non-terminal progress markers a consumer may emit for a call in
/// flight (§3, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Started,
    Progress,
    Accepted,
    Rejected,
}

/// The terminal outcome of a call (§3, §6): either a return value, or
/// enough detail to reconstruct a typed remote exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyResult {
    Success {
        retval: Value,
    },
    Failure {
        exval: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        xmodule: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        xclass: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        xstate: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        xargs: Option<Value>,
    },
}

impl ReplyResult {
    pub fn success(retval: Value) -> Self {
        Self::Success { retval }
    }

    pub fn failure(exval: impl Into<String>) -> Self {
        Self::Failure {
            exval: exval.into(),
            xmodule: None,
            xclass: None,
            xstate: None,
            xargs: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// The universal message body carried on every queue (§3).
///
/// Schema-less but field-typed: optional fields are `Option<T>`
/// rather than the original's "absent is empty string" convention
/// (REDESIGN FLAGS, §9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub sn: Sn,
    pub version: String,
    pub routing: Routing,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub request: Option<Request>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub replyto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub window: Option<Window>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub any: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ttl: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<ReplyResult>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub completed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub signature: Option<String>,
}

impl Envelope {
    fn base(routing: Routing) -> Self {
        Self {
            sn: Sn::new(),
            version: SUPPORTED_VERSION.to_string(),
            routing,
            request: None,
            replyto: None,
            window: None,
            any: None,
            secret: None,
            ttl: None,
            status: None,
            result: None,
            total: None,
            completed: None,
            details: None,
            signature: None,
        }
    }

    /// Build a new request envelope with a freshly generated `sn`.
    pub fn request(routing: Routing, request: Request) -> Self {
        let mut env = Self::base(routing);
        env.request = Some(request);
        env
    }

    /// Build a `started` status reply correlated to `sn`.
    pub fn started(routing: Routing, sn: Sn, any: Option<Value>) -> Self {
        let mut env = Self::base(routing);
        env.sn = sn;
        env.any = any;
        env.status = Some(Status::Started);
        env
    }

    /// Build a `progress` status reply correlated to `sn`.
    pub fn progress(
        routing: Routing,
        sn: Sn,
        any: Option<Value>,
        total: Option<u64>,
        completed: Option<u64>,
        details: Option<Value>,
    ) -> Self {
        let mut env = Self::base(routing);
        env.sn = sn;
        env.any = any;
        env.status = Some(Status::Progress);
        env.total = total;
        env.completed = completed;
        env.details = details;
        env
    }

    /// Build a terminal reply correlated to `sn`.
    pub fn reply(routing: Routing, sn: Sn, any: Option<Value>, result: ReplyResult) -> Self {
        let mut env = Self::base(routing);
        env.sn = sn;
        env.any = any;
        env.result = Some(result);
        env
    }

    pub fn with_replyto(mut self, replyto: impl Into<String>) -> Self {
        self.replyto = Some(replyto.into());
        self
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_any(mut self, any: Value) -> Self {
        self.any = Some(any);
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_started(&self) -> bool {
        matches!(self.status, Some(Status::Started))
    }

    pub fn is_progress(&self) -> bool {
        matches!(self.status, Some(Status::Progress))
    }

    /// `true` when `version` matches [`SUPPORTED_VERSION`] (§4.1).
    pub fn version_supported(&self) -> bool {
        self.version == SUPPORTED_VERSION
    }

    /// §6 invariant: exactly one of `{request, result, status}`, and
    /// (equivalently) §3's "terminal envelopes carry `result` XOR
    /// `status∈{started,progress}`".
    pub fn validate(&self) -> Result<(), EnvelopeError> {
        let present = [
            self.request.is_some(),
            self.result.is_some(),
            self.status.is_some(),
        ]
        .into_iter()
        .filter(|b| *b)
        .count();
        if present != 1 {
            return Err(EnvelopeError::AmbiguousKind { found: present });
        }
        if self.result.is_some() && self.status.is_some() {
            return Err(EnvelopeError::ResultAndStatusBothPresent { sn: self.sn });
        }
        Ok(())
    }

    /// Serialize to the wire JSON format, validating shape first.
    pub fn dump(&self) -> Result<String, EnvelopeError> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize and append a detached signature computed by `auth`
    /// over the canonical (unsigned) body (§4.1 "Optional signing").
    pub fn dump_signed(&self, auth: &dyn Authenticator) -> Result<String, EnvelopeError> {
        self.validate()?;
        let mut unsigned = self.clone();
        unsigned.signature = None;
        let body = serde_json::to_vec(&unsigned)?;
        let signature = auth
            .sign(&body)
            .map_err(|_| EnvelopeError::SignatureInvalid { sn: Some(self.sn) })?;
        unsigned.signature = Some(signature);
        Ok(serde_json::to_string(&unsigned)?)
    }

    /// Parse and validate shape, without verifying any signature.
    pub fn load(s: &str) -> Result<Self, EnvelopeError> {
        let env: Self = serde_json::from_str(s)?;
        env.validate()?;
        Ok(env)
    }

    /// Parse, validate shape, and verify the detached signature against
    /// the canonicalized (unsigned) body. Fails if no signature is present.
    pub fn load_verified(s: &str, auth: &dyn Authenticator) -> Result<Self, EnvelopeError> {
        let env = Self::load(s)?;
        let signature = env
            .signature
            .as_deref()
            .ok_or(EnvelopeError::SignatureInvalid { sn: Some(env.sn) })?;
        let mut unsigned = env.clone();
        unsigned.signature = None;
        let body = serde_json::to_vec(&unsigned)?;
        auth.verify(&body, signature)
            .map_err(|_| EnvelopeError::SignatureInvalid { sn: Some(env.sn) })?;
        Ok(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SharedSecretAuthenticator;

    fn routing() -> Routing {
        Routing::new("client", "agent-1")
    }

    #[test]
    fn sn_round_trips_through_dump_and_load() {
        let env = Envelope::request(routing(), Request::new("TestAdmin", "echo"));
        let sn = env.sn;
        let text = env.dump().unwrap();
        let back = Envelope::load(&text).unwrap();
        assert_eq!(back.sn, sn);
    }

    #[test]
    fn rejects_envelope_with_no_kind() {
        let env = Envelope::base(routing());
        assert!(env.validate().is_err());
    }

    #[test]
    fn rejects_envelope_with_result_and_status() {
        let mut env = Envelope::reply(routing(), Sn::new(), None, ReplyResult::success(Value::Null));
        env.status = Some(Status::Started);
        assert!(matches!(
            env.validate(),
            Err(EnvelopeError::ResultAndStatusBothPresent { .. })
        ));
    }

    #[test]
    fn signed_round_trip_verifies() {
        let auth = SharedSecretAuthenticator::new("s3cr3t");
        let env = Envelope::request(routing(), Request::new("TestAdmin", "echo"));
        let text = env.dump_signed(&auth).unwrap();
        let back = Envelope::load_verified(&text, &auth).unwrap();
        assert_eq!(back.sn, env.sn);
    }

    #[test]
    fn tampered_body_fails_verification() {
        let auth = SharedSecretAuthenticator::new("s3cr3t");
        let env = Envelope::request(routing(), Request::new("TestAdmin", "echo"));
        let text = env.dump_signed(&auth).unwrap();
        let mut value: Value = serde_json::from_str(&text).unwrap();
        value["request"]["method"] = Value::String("delete_everything".to_string());
        let tampered = serde_json::to_string(&value).unwrap();
        assert!(Envelope::load_verified(&tampered, &auth).is_err());
    }

    #[test]
    fn version_mismatch_detected() {
        let mut env = Envelope::request(routing(), Request::new("TestAdmin", "echo"));
        env.version = "2".to_string();
        assert!(!env.version_supported());
    }
}

//! # errs
//!
//! Structured service errors with operation context, classification, and
//! deterministic HTTP surfacing.
//!
//! ## Design Philosophy
//!
//! 1. **One error type** carries everything a failure needs: the operation
//!    that saw it, the actor, a [`Kind`], the implicated [`Parameter`], a
//!    client-facing [`Code`], an auth [`Realm`], and the wrapped cause
//! 2. **Every layer wraps** instead of discarding, adding its own [`Op`]
//! 3. **Attributes appear once** in a chain: wrapping merges Kind, Code,
//!    Param and Realm up to the outermost error
//! 4. **Clients see classification, not internals**: 500-class messages are
//!    redacted, 401/403 carry no body at all
//!
//! ## Quick Start
//!
//! ```rust
//! use errs::{e, Code, Kind};
//!
//! fn validate(name: &str) -> errs::Result<()> {
//!     if name.is_empty() {
//!         return Err(e!(
//!             op("users/validate"),
//!             kind(Kind::Validation),
//!             param("name"),
//!             code("NAME_REQUIRED"),
//!             msg("name is required"),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! fn create(name: &str) -> errs::Result<()> {
//!     validate(name).map_err(|inner| e!(op("users/Service.Create"), wrap(inner)))
//! }
//!
//! let err = create("").unwrap_err();
//! // Kind and Code were pulled up to the outermost error.
//! assert_eq!(err.kind(), Kind::Validation);
//! assert_eq!(err.code().map(Code::as_str), Some("NAME_REQUIRED"));
//! assert_eq!(err.op_stack().as_slice(), ["users/validate", "users/Service.Create"]);
//! ```
//!
//! ## HTTP
//!
//! ```rust
//! use errs::{e, respond, Kind, ResponseConfig};
//!
//! let config = ResponseConfig::default();
//! let err = e!(kind(Kind::Exist), code("E1"), param("name"), msg("already there"));
//! let response = respond(&config, Some(&err));
//! assert_eq!(response.status().as_u16(), 400);
//! assert_eq!(
//!     response.body(),
//!     Some(r#"{"error":{"kind":"item already exists","code":"E1","param":"name","message":"already there"}}"#),
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;
use std::result;

pub mod builder;
pub mod compare;
pub mod config;
pub mod http;
pub mod kind;
pub mod logging;
pub mod models;
pub mod trace;

pub use builder::*;
pub use compare::*;
pub use config::*;
pub use http::*;
pub use kind::*;
pub use logging::*;
pub use models::*;
pub use trace::*;

/// Type alias for Results using our error type.
pub type Result<T> = result::Result<T, Error>;

/// Boxed foreign error accepted as a root cause.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ============================================================================
// Plain message cause
// ============================================================================

/// Trivial error holding nothing but a message.
///
/// Plain-text causes passed to [`ErrorBuilder::msg`] become one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message(Cow<'static, str>);

impl Message {
    /// Create a message error.
    #[inline]
    pub fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self(text.into())
    }

    /// The message text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl StdError for Message {}

// ============================================================================
// Cause chain
// ============================================================================

/// What an [`Error`] wraps.
///
/// The chain runs from the outermost (most recent) error to the innermost
/// root cause. Outer owns inner, and every link is built once, so the chain
/// cannot form a cycle.
pub enum Cause {
    /// A plain message or a foreign error, with the backtrace captured when
    /// the first [`Error`] of the chain was built around it.
    Root {
        /// The foreign error or [`Message`].
        error: BoxError,
        /// Captured per `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
        backtrace: Backtrace,
    },
    /// Another [`Error`] of this crate.
    Wrapped(Box<Error>),
}

impl Cause {
    #[inline]
    pub(crate) fn root(error: BoxError) -> Self {
        Self::Root {
            error,
            backtrace: Backtrace::capture(),
        }
    }

    /// The cause as a generic error.
    #[inline]
    pub fn as_error(&self) -> &(dyn StdError + 'static) {
        match self {
            Self::Root { error, .. } => &**error,
            Self::Wrapped(inner) => &**inner,
        }
    }

    /// The nested [`Error`], if this cause is one.
    #[inline]
    pub fn wrapped(&self) -> Option<&Error> {
        match self {
            Self::Wrapped(inner) => Some(inner.as_ref()),
            Self::Root { .. } => None,
        }
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root { error, .. } => f.debug_tuple("Root").field(error).finish(),
            Self::Wrapped(inner) => f.debug_tuple("Wrapped").field(inner).finish(),
        }
    }
}

// ============================================================================
// Error
// ============================================================================

/// The service error.
///
/// Built with [`Error::builder`] or the [`e!`] macro and immutable
/// afterwards. Each intermediate caller that wants to add context wraps the
/// error it received in a new one; the HTTP layer consumes the outermost
/// error exactly once through [`respond`].
///
/// `Display` renders the root cause's message, which is what a client sees
/// for 400-class failures. Use [`Error::log`] for the full structured view.
#[must_use = "errors should be handled or surfaced"]
pub struct Error {
    op: Option<Op>,
    user: Option<UserName>,
    kind: Kind,
    param: Option<Parameter>,
    code: Option<Code>,
    realm: Option<Realm>,
    cause: Option<Cause>,
}

impl Error {
    #[inline]
    pub(crate) const fn blank() -> Self {
        Self {
            op: None,
            user: None,
            kind: Kind::Other,
            param: None,
            code: None,
            realm: None,
            cause: None,
        }
    }

    /// Start building an error.
    #[inline]
    pub fn builder() -> ErrorBuilder {
        ErrorBuilder::new()
    }

    /// Authentication failure for `realm`; surfaces as 401 with no body.
    pub fn unauthenticated(
        realm: impl Into<Realm>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::builder()
            .kind(Kind::Unauthenticated)
            .realm(realm)
            .msg(message)
            .build()
    }

    /// Authorization failure; surfaces as 403 with no body.
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::builder().kind(Kind::Unauthorized).msg(message).build()
    }

    /// Internal failure in `op` caused by a foreign error.
    pub fn internal<E>(op: impl Into<Op>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::builder()
            .op(op)
            .kind(Kind::Internal)
            .source(source)
            .build()
    }

    /// Operation label.
    #[inline]
    pub fn op(&self) -> Option<&Op> {
        self.op.as_ref()
    }

    /// Actor associated with the failure.
    #[inline]
    pub fn user(&self) -> Option<&UserName> {
        self.user.as_ref()
    }

    /// Classification. `Other` when unset.
    #[inline]
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Implicated input parameter.
    #[inline]
    pub fn param(&self) -> Option<&Parameter> {
        self.param.as_ref()
    }

    /// Client-facing code.
    #[inline]
    pub fn code(&self) -> Option<&Code> {
        self.code.as_ref()
    }

    /// Authentication realm.
    #[inline]
    pub fn realm(&self) -> Option<&Realm> {
        self.realm.as_ref()
    }

    /// The wrapped cause.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// The nested [`Error`] this one wraps, if any.
    #[inline]
    pub fn wrapped(&self) -> Option<&Error> {
        self.cause.as_ref().and_then(Cause::wrapped)
    }

    /// Innermost non-`Error` cause reachable through wrapped errors.
    pub fn root_cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        let mut current = self;
        loop {
            match current.cause.as_ref()? {
                Cause::Root { error, .. } => return Some(error.as_ref()),
                Cause::Wrapped(inner) => current = inner.as_ref(),
            }
        }
    }

    /// Root cause message, if there is a root cause.
    pub fn message(&self) -> Option<String> {
        self.root_cause().map(ToString::to_string)
    }

    /// True when every attribute is unset and there is no cause.
    ///
    /// Such a value carries no information and must never reach a client.
    pub fn is_zero(&self) -> bool {
        self.op.is_none()
            && self.user.is_none()
            && self.kind == Kind::Other
            && self.param.is_none()
            && self.code.is_none()
            && self.realm.is_none()
            && self.cause.is_none()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root_cause() {
            Some(root) => fmt::Display::fmt(root, f),
            None if self.kind != Kind::Other => f.write_str(self.kind.label()),
            None => f.write_str("no error"),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Error");
        if let Some(op) = &self.op {
            s.field("op", &op.as_str());
        }
        if self.user.is_some() {
            s.field("user", &"<REDACTED>");
        }
        if self.kind != Kind::Other {
            s.field("kind", &self.kind);
        }
        if let Some(param) = &self.param {
            s.field("param", &param.as_str());
        }
        if let Some(code) = &self.code {
            s.field("code", &code.as_str());
        }
        if let Some(realm) = &self.realm {
            s.field("realm", &realm.as_str());
        }
        if let Some(cause) = &self.cause {
            s.field("cause", cause);
        }
        s.finish()
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(Cause::as_error)
    }
}

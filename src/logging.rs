//! Structured log view and `tracing` emission.
//!
//! # Properties
//!
//! - [`ErrorLog`] borrows from the [`Error`] that created it and cannot
//!   outlive it
//! - every rendered field is capped at [`MAX_FIELD_OUTPUT_LEN`] bytes, so a
//!   hostile or runaway message cannot flood a log sink
//! - the actor identity is rendered only as a presence flag
//!
//! Events surfaced by [`respond`](crate::respond) are emitted at `ERROR`
//! level under the [`LOG_TARGET`] target with the fields `http_statuscode`,
//! `kind`, `parameter`, `code`, `realm`, `stack` or `backtrace`, and `error`.

use crate::{top_error, Error, Kind, OpStack, Trace};
use axum::http::StatusCode;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

/// `tracing` target of every event this crate emits.
pub const LOG_TARGET: &str = "errs";

/// Maximum length for any individual field in formatted output.
pub const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Appended to fields cut at [`MAX_FIELD_OUTPUT_LEN`].
pub const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Structured view of an error chain, borrowed from the [`Error`].
///
/// ```rust
/// use errs::{e, Kind};
///
/// let inner = e!(op("store/Get"), kind(Kind::NotExist), msg("no row"));
/// let err = e!(op("api/Get"), user("carol"), wrap(inner));
///
/// let mut line = String::new();
/// err.log().write_to(&mut line).unwrap();
/// assert_eq!(
///     line,
///     "kind='item does not exist' ops='store/Get > api/Get' user=present error='no row'"
/// );
/// ```
#[derive(Debug)]
pub struct ErrorLog<'a> {
    /// Op labels, root cause first.
    pub ops: OpStack<'a>,
    /// Outermost kind.
    pub kind: Kind,
    /// Outermost parameter.
    pub param: Option<&'a str>,
    /// Outermost code.
    pub code: Option<&'a str>,
    /// Outermost realm.
    pub realm: Option<&'a str>,
    /// Whether any layer names an actor.
    pub has_user: bool,
    /// Innermost cause.
    pub root: Option<&'a (dyn StdError + Send + Sync + 'static)>,
}

impl Error {
    /// Borrow a structured log view of this error chain.
    pub fn log(&self) -> ErrorLog<'_> {
        let mut has_user = false;
        let mut layer = Some(self);
        while let Some(current) = layer {
            has_user |= current.user().is_some();
            layer = current.wrapped();
        }

        ErrorLog {
            ops: self.op_stack(),
            kind: self.kind(),
            param: self.param().map(|p| p.as_str()),
            code: self.code().map(|c| c.as_str()),
            realm: self.realm().map(|r| r.as_str()),
            has_user,
            root: self.root_cause(),
        }
    }
}

impl ErrorLog<'_> {
    /// Write the view as `key='value'` pairs, skipping unset fields.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(f, "kind='{}'", self.kind)?;

        if !self.ops.is_empty() {
            f.write_str(" ops='")?;
            let mut joined = String::new();
            for (i, op) in self.ops.iter().enumerate() {
                if i > 0 {
                    joined.push_str(" > ");
                }
                joined.push_str(op);
            }
            f.write_str(&truncate_with_indicator(&joined))?;
            f.write_str("'")?;
        }

        if let Some(param) = self.param {
            write!(f, " param='{}'", truncate_with_indicator(param))?;
        }

        if let Some(code) = self.code {
            write!(f, " code='{}'", truncate_with_indicator(code))?;
        }

        if let Some(realm) = self.realm {
            write!(f, " realm='{}'", truncate_with_indicator(realm))?;
        }

        if self.has_user {
            f.write_str(" user=present")?;
        }

        if let Some(root) = self.root {
            let message = root.to_string();
            write!(f, " error='{}'", truncate_with_indicator(&message))?;
        }

        Ok(())
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// Cut `s` to at most [`MAX_FIELD_OUTPUT_LEN`] bytes on a char boundary,
/// ending in [`TRUNCATION_INDICATOR`]. Borrows when nothing is cut.
pub fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

// ============================================================================
// Event emission
// ============================================================================

macro_rules! error_with_trace {
    ($trace:expr, $($rest:tt)+) => {
        match $trace {
            Trace::Ops(ops) => tracing::error!(
                target: LOG_TARGET,
                stack = ?ops.as_slice(),
                $($rest)+
            ),
            Trace::Captured(backtrace) => tracing::error!(
                target: LOG_TARGET,
                backtrace = %backtrace,
                $($rest)+
            ),
        }
    };
}

pub(crate) fn nil_error(status: StatusCode) {
    tracing::error!(
        target: LOG_TARGET,
        http_statuscode = status.as_u16(),
        "nil error passed"
    );
}

pub(crate) fn zero_error(status: StatusCode) {
    tracing::error!(
        target: LOG_TARGET,
        http_statuscode = status.as_u16(),
        "Error value is zero"
    );
}

/// Every layer of a source chain, outermost first, joined with `": "`.
struct SourceChain<'a>(&'a (dyn StdError + 'static));

impl fmt::Display for SourceChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut next = self.0.source();
        while let Some(layer) = next {
            write!(f, ": {layer}")?;
            next = layer.source();
        }
        Ok(())
    }
}

pub(crate) fn unknown_error(status: StatusCode, err: &(dyn StdError + 'static)) {
    tracing::error!(
        target: LOG_TARGET,
        http_statuscode = status.as_u16(),
        error = %SourceChain(err),
        root = %top_error(err),
        "unknown error"
    );
}

pub(crate) fn unauthenticated(status: StatusCode, realm: &str, trace: &Trace<'_>, err: &Error) {
    error_with_trace!(
        trace,
        http_statuscode = status.as_u16(),
        realm = realm,
        error = %top_error(err),
        "unauthenticated request"
    );
}

pub(crate) fn unauthorized(status: StatusCode, trace: &Trace<'_>, err: &Error) {
    error_with_trace!(
        trace,
        http_statuscode = status.as_u16(),
        error = %top_error(err),
        "unauthorized request"
    );
}

pub(crate) fn response_sent(status: StatusCode, trace: &Trace<'_>, err: &Error) {
    error_with_trace!(
        trace,
        http_statuscode = status.as_u16(),
        kind = %err.kind(),
        parameter = err.param().map(|p| p.as_str()),
        code = err.code().map(|c| c.as_str()),
        error = %top_error(err),
        "error response sent to client"
    );
}

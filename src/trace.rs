//! Trace reconstruction.
//!
//! Two mutually exclusive views of where an error came from:
//!
//! - **Op stack**: the [`Op`](crate::Op) labels collected along the wrap
//!   chain, root cause first and most recent wrapper last, the order a call
//!   stack is read in.
//! - **Captured stack**: the [`Backtrace`] taken when the first error of the
//!   chain was built around a plain message or foreign error. Only usable if
//!   backtraces were enabled (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`) when it
//!   was captured; otherwise the op stack is used instead.
//!
//! The mode is a plain value carried in
//! [`ResponseConfig`](crate::ResponseConfig), chosen once at startup.

use crate::{Cause, Error};
use serde::Deserialize;
use smallvec::SmallVec;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Operation labels, root cause first. Chains rarely exceed eight layers.
pub type OpStack<'a> = SmallVec<[&'a str; 8]>;

// ============================================================================
// Mode selection
// ============================================================================

/// Which trace a surfaced error is logged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TraceMode {
    /// Op labels collected from the wrap chain.
    #[default]
    OpStack,
    /// Backtrace captured at the root cause.
    CapturedStack,
}

impl TraceMode {
    /// Canonical name, as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpStack => "op_stack",
            Self::CapturedStack => "captured_stack",
        }
    }
}

impl fmt::Display for TraceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized trace mode name.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown trace mode `{0}`, expected `op_stack` or `captured_stack`")]
pub struct ParseTraceModeError(String);

impl FromStr for TraceMode {
    type Err = ParseTraceModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "op_stack" | "opstack" | "ops" => Ok(Self::OpStack),
            "captured_stack" | "capturedstack" | "stack" | "backtrace" => Ok(Self::CapturedStack),
            _ => Err(ParseTraceModeError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for TraceMode {
    type Error = ParseTraceModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Chain walking
// ============================================================================

/// First [`Error`] in `err`'s source chain, starting with `err` itself.
pub fn find_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Error> {
    let mut current = Some(err);
    while let Some(candidate) = current {
        if let Some(found) = candidate.downcast_ref::<Error>() {
            return Some(found);
        }
        current = candidate.source();
    }
    None
}

/// Op labels of every [`Error`] in the chain, root cause first.
///
/// Errors reached through a foreign error's `source()` are included. Empty
/// if no layer set an op.
pub fn op_stack<'a>(err: &'a (dyn StdError + 'static)) -> OpStack<'a> {
    let mut ops = OpStack::new();
    let mut current = find_error(err);
    while let Some(layer) = current {
        if let Some(op) = layer.op() {
            ops.push(op.as_str());
        }
        current = match layer.cause() {
            Some(Cause::Wrapped(inner)) => Some(inner.as_ref()),
            Some(Cause::Root { error, .. }) => find_error(&**error),
            None => None,
        };
    }
    ops.reverse();
    ops
}

/// Innermost error of the chain, the one whose message is worth logging.
pub fn top_error<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current
}

impl Error {
    /// Op labels of this chain, root cause first.
    pub fn op_stack(&self) -> OpStack<'_> {
        op_stack(self)
    }

    /// Backtrace captured at the root cause, whether or not it is populated.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        let mut current = self;
        loop {
            match current.cause.as_ref()? {
                Cause::Wrapped(inner) => current = inner.as_ref(),
                Cause::Root { backtrace, .. } => return Some(backtrace),
            }
        }
    }
}

// ============================================================================
// Mode-resolved trace
// ============================================================================

/// Trace chosen for one error under a [`TraceMode`].
#[derive(Debug)]
pub enum Trace<'a> {
    /// Op labels, root cause first.
    Ops(OpStack<'a>),
    /// Populated backtrace from the root cause.
    Captured(&'a Backtrace),
}

/// Resolve the trace for `err`.
///
/// [`TraceMode::CapturedStack`] falls back to the op stack when the root
/// backtrace is missing or was not captured.
pub fn trace(mode: TraceMode, err: &Error) -> Trace<'_> {
    if mode == TraceMode::CapturedStack {
        if let Some(bt) = err.backtrace().filter(|bt| bt.status() == BacktraceStatus::Captured) {
            return Trace::Captured(bt);
        }
    }
    Trace::Ops(err.op_stack())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{e, Kind};
    use std::io;

    #[derive(Debug)]
    struct Foreign(Error);

    impl fmt::Display for Foreign {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("foreign wrapper")
        }
    }

    impl StdError for Foreign {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn op_stack_is_root_first() {
        let root = e!(op("store/Find"), kind(Kind::NotExist), msg("missing"));
        let mid = e!(op("service/Get"), wrap(root));
        let top = e!(op("handler/Get"), wrap(mid));
        assert_eq!(
            top.op_stack().as_slice(),
            ["store/Find", "service/Get", "handler/Get"]
        );
    }

    #[test]
    fn op_stack_skips_layers_without_op() {
        let root = e!(op("a"), msg("x"));
        let mid = e!(kind(Kind::IO), wrap(root));
        let top = e!(op("c"), wrap(mid));
        assert_eq!(top.op_stack().as_slice(), ["a", "c"]);
    }

    #[test]
    fn op_stack_empty_without_ops() {
        let err = e!(kind(Kind::Validation), msg("bad"));
        assert!(err.op_stack().is_empty());
        assert!(op_stack(&io::Error::other("plain")).is_empty());
    }

    #[test]
    fn op_stack_crosses_foreign_wrappers() {
        let inner = e!(op("db/Exec"), msg("locked"));
        let foreign = Foreign(inner);
        let outer = e!(op("jobs/Run"), source(foreign));
        assert_eq!(outer.op_stack().as_slice(), ["db/Exec", "jobs/Run"]);
    }

    #[test]
    fn find_error_walks_sources() {
        let foreign = Foreign(e!(op("x"), msg("y")));
        let found = find_error(&foreign).expect("error behind wrapper");
        assert_eq!(found.op().map(crate::Op::as_str), Some("x"));
        assert!(find_error(&io::Error::other("z")).is_none());
    }

    #[test]
    fn top_error_is_innermost() {
        let root = e!(op("a"), source(io::Error::other("disk full")));
        let outer = e!(op("b"), wrap(root));
        let top = top_error(&outer);
        assert_eq!(top.to_string(), "disk full");
        assert!(top.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn backtrace_lives_at_root() {
        let root = e!(op("a"), msg("x"));
        let outer = e!(op("b"), wrap(root));
        assert!(outer.backtrace().is_some());
        assert!(e!(kind(Kind::Internal)).backtrace().is_none());
    }

    #[test]
    fn captured_mode_falls_back_when_not_captured() {
        let err = e!(op("a"), msg("x"));
        let captured = err.backtrace().map(Backtrace::status) == Some(BacktraceStatus::Captured);
        match trace(TraceMode::CapturedStack, &err) {
            Trace::Captured(_) => assert!(captured),
            Trace::Ops(ops) => {
                assert!(!captured);
                assert_eq!(ops.as_slice(), ["a"]);
            }
        }
        assert!(matches!(trace(TraceMode::OpStack, &err), Trace::Ops(_)));
    }

    #[test]
    fn captured_mode_without_cause_uses_ops() {
        let err = e!(op("only"), kind(Kind::Internal));
        match trace(TraceMode::CapturedStack, &err) {
            Trace::Ops(ops) => assert_eq!(ops.as_slice(), ["only"]),
            Trace::Captured(_) => panic!("no root cause to capture at"),
        }
    }

    #[test]
    fn parse_trace_mode() {
        assert_eq!("op_stack".parse(), Ok(TraceMode::OpStack));
        assert_eq!("OPS".parse(), Ok(TraceMode::OpStack));
        assert_eq!(" backtrace ".parse(), Ok(TraceMode::CapturedStack));
        assert_eq!("Captured_Stack".parse(), Ok(TraceMode::CapturedStack));
        let err = "zerolog".parse::<TraceMode>().unwrap_err();
        assert!(err.to_string().contains("zerolog"));
    }

    #[test]
    fn trace_mode_deserializes_through_from_str() {
        let mode: TraceMode = serde_json::from_str(r#""stack""#).unwrap();
        assert_eq!(mode, TraceMode::CapturedStack);
        assert!(serde_json::from_str::<TraceMode>(r#""nope""#).is_err());
        assert_eq!(TraceMode::default().to_string(), "op_stack");
    }
}

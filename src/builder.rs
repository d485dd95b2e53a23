//! Typed construction of [`Error`] values.
//!
//! Every setter names the field it fills, so there is no argument sniffing:
//! `op`, `user`, `kind`, `param`, `code`, `realm` set attributes; `msg`,
//! `source` and `wrap` fill the single cause slot. `source` given an
//! [`Error`] behaves like `wrap`. Calling a setter twice
//! keeps the last value.
//!
//! # Merge
//!
//! When the cause is another [`Error`], [`ErrorBuilder::build`] merges once,
//! immediately. For each of Kind, Code, Param and Realm:
//!
//! - outer unset, inner set: the value moves up and is cleared in the inner
//! - both set to the same value: the inner copy is cleared
//! - both set to different values: both are kept, the outer one wins when
//!   the error is surfaced
//!
//! After the merge every attribute appears once across the chain, however
//! deep it is. Callers can wrap without knowing what the inner error carries.
//!
//! # Example
//!
//! ```rust
//! use errs::{Error, Kind};
//!
//! let inner = Error::builder()
//!     .op("store/MovieStore.Insert")
//!     .kind(Kind::Exist)
//!     .code("DUPLICATE_TITLE")
//!     .msg("title already exists")
//!     .build();
//!
//! let outer = Error::builder().op("movies/Service.Create").wrap(inner).build();
//!
//! assert_eq!(outer.kind(), Kind::Exist);
//! assert_eq!(outer.wrapped().unwrap().kind(), Kind::Other);
//! ```

use crate::{
    BoxError, Cause, Code, Error, Kind, LOG_TARGET, Message, Op, Parameter, Realm, UserName,
};
use std::borrow::Cow;
use std::error::Error as StdError;

/// Operation label of the error returned for a builder with no attributes.
pub const BAD_CALL_OP: &str = "errs/ErrorBuilder.build";

/// Message of the error returned for a builder with no attributes.
pub const BAD_CALL_MESSAGE: &str = "errs: build called with no attributes";

/// Builder for [`Error`].
#[must_use = "builders do nothing until `build` is called"]
pub struct ErrorBuilder {
    attributes: usize,
    error: Error,
}

impl Default for ErrorBuilder {
    fn default() -> Self {
        Self {
            attributes: 0,
            error: Error::blank(),
        }
    }
}

impl ErrorBuilder {
    /// Empty builder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn touched(mut self) -> Self {
        self.attributes += 1;
        self
    }

    /// Operation label.
    pub fn op(mut self, op: impl Into<Op>) -> Self {
        self.error.op = Some(op.into()).filter(|op| !op.is_empty());
        self.touched()
    }

    /// Actor associated with the failure.
    pub fn user(mut self, user: impl Into<UserName>) -> Self {
        self.error.user = Some(user.into()).filter(|user| !user.is_empty());
        self.touched()
    }

    /// Classification. `Kind::Other` counts as an attribute but leaves the
    /// kind unset for merging.
    pub fn kind(mut self, kind: Kind) -> Self {
        self.error.kind = kind;
        self.touched()
    }

    /// Implicated input parameter.
    pub fn param(mut self, param: impl Into<Parameter>) -> Self {
        self.error.param = Some(param.into()).filter(|param| !param.is_empty());
        self.touched()
    }

    /// Client-facing code.
    pub fn code(mut self, code: impl Into<Code>) -> Self {
        self.error.code = Some(code.into()).filter(|code| !code.is_empty());
        self.touched()
    }

    /// Authentication realm.
    pub fn realm(mut self, realm: impl Into<Realm>) -> Self {
        self.error.realm = Some(realm.into()).filter(|realm| !realm.is_empty());
        self.touched()
    }

    /// Plain-text cause.
    pub fn msg(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        self.error.cause = Some(Cause::root(Box::new(Message::new(text))));
        self.touched()
    }

    /// Error value as the cause.
    ///
    /// An [`Error`] of this crate passed here is wrapped exactly as with
    /// [`wrap`](Self::wrap) and merged on build; anything else becomes the
    /// root cause.
    pub fn source<E>(self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.boxed_source(Box::new(source))
    }

    /// Already-boxed error as the cause. Same rules as
    /// [`source`](Self::source).
    pub fn boxed_source(mut self, source: BoxError) -> Self {
        self.error.cause = Some(match source.downcast::<Error>() {
            Ok(inner) => Cause::Wrapped(inner),
            Err(foreign) => Cause::root(foreign),
        });
        self.touched()
    }

    /// Another [`Error`] as the cause.
    pub fn wrap(mut self, inner: Error) -> Self {
        self.error.cause = Some(Cause::Wrapped(Box::new(inner)));
        self.touched()
    }

    /// Finish the error, merging with a wrapped [`Error`] if there is one.
    ///
    /// A builder on which no setter was called describes nothing. Rather
    /// than hand back an empty error, this returns an
    /// [`Internal`](Kind::Internal) error labelled [`BAD_CALL_OP`] and logs
    /// it.
    pub fn build(self) -> Error {
        if self.attributes == 0 {
            return bad_call();
        }
        let mut error = self.error;
        merge(&mut error);
        error
    }
}

fn bad_call() -> Error {
    tracing::error!(target: LOG_TARGET, op = BAD_CALL_OP, "{}", BAD_CALL_MESSAGE);
    let mut error = Error::blank();
    error.op = Some(Op::from(BAD_CALL_OP));
    error.kind = Kind::Internal;
    error.cause = Some(Cause::root(Box::new(Message::new(BAD_CALL_MESSAGE))));
    error
}

fn merge(outer: &mut Error) {
    let Some(Cause::Wrapped(inner)) = outer.cause.as_mut() else {
        return;
    };

    if outer.kind == Kind::Other {
        outer.kind = std::mem::take(&mut inner.kind);
    } else if outer.kind == inner.kind {
        inner.kind = Kind::Other;
    }
    pull_up(&mut outer.code, &mut inner.code);
    pull_up(&mut outer.param, &mut inner.param);
    pull_up(&mut outer.realm, &mut inner.realm);
}

fn pull_up<T: PartialEq>(outer: &mut Option<T>, inner: &mut Option<T>) {
    if outer.is_none() {
        *outer = inner.take();
    } else if outer == inner {
        *inner = None;
    }
}

/// Build an [`Error`] from a list of setter calls.
///
/// Each argument is `setter(value)` where `setter` is an [`ErrorBuilder`]
/// method: `op`, `user`, `kind`, `param`, `code`, `realm`, `msg`, `source`,
/// `boxed_source` or `wrap`.
///
/// ```rust
/// use errs::{e, Kind};
///
/// let err = e!(op("orgs/Service.Delete"), kind(Kind::NotExist), msg("no such org"));
/// assert_eq!(err.kind(), Kind::NotExist);
/// ```
///
/// An error with no attributes is rejected at compile time:
///
/// ```rust,compile_fail
/// let err = errs::e!();
/// ```
#[macro_export]
macro_rules! e {
    () => {
        compile_error!("e! needs at least one attribute, e.g. e!(kind(Kind::Validation))")
    };
    ($($setter:ident ( $value:expr )),+ $(,)?) => {
        $crate::Error::builder()$(.$setter($value))+.build()
    };
}

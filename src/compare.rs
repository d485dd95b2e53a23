//! Partial equivalence and classification checks.
//!
//! [`matches`] is meant for tests: the reference lists only the fields that
//! matter, and anything it leaves unset is ignored on the candidate.
//! [`kind_is`] lets application code branch on the failure class without
//! looking at HTTP status codes.

use crate::{find_error, Cause, Error, Kind};
use std::error::Error as StdError;

/// True if every field set on `reference` is equal on `candidate`.
///
/// Both arguments must be [`Error`] values at the outermost level; anything
/// else never matches.
///
/// ```rust
/// use errs::{e, matches, Kind};
///
/// let reference = e!(op("x"), kind(Kind::Validation));
/// assert!(matches(&reference, &e!(op("x"), kind(Kind::Validation), code("c1"))));
/// assert!(!matches(&reference, &e!(op("y"), kind(Kind::Validation))));
/// ```
pub fn matches(reference: &(dyn StdError + 'static), candidate: &(dyn StdError + 'static)) -> bool {
    match (
        reference.downcast_ref::<Error>(),
        candidate.downcast_ref::<Error>(),
    ) {
        (Some(reference), Some(candidate)) => reference.matches(candidate),
        _ => false,
    }
}

/// True if the first non-`Other` kind along `err`'s chain is `kind`.
///
/// Foreign errors are searched for an [`Error`] in their source chain;
/// `false` if there is none.
pub fn kind_is(kind: Kind, err: &(dyn StdError + 'static)) -> bool {
    let Some(found) = find_error(err) else {
        return false;
    };
    if found.kind() != Kind::Other {
        return found.kind() == kind;
    }
    found
        .cause()
        .is_some_and(|cause| kind_is(kind, cause.as_error()))
}

#[inline]
fn field_matches<T: PartialEq>(reference: Option<&T>, candidate: Option<&T>) -> bool {
    reference.is_none() || reference == candidate
}

impl Error {
    /// Partial comparison with `self` as the reference. See [`matches`].
    pub fn matches(&self, candidate: &Error) -> bool {
        if !field_matches(self.op(), candidate.op())
            || !field_matches(self.user(), candidate.user())
            || !field_matches(self.param(), candidate.param())
            || !field_matches(self.code(), candidate.code())
            || !field_matches(self.realm(), candidate.realm())
        {
            return false;
        }

        if self.kind() != Kind::Other && self.kind() != candidate.kind() {
            return false;
        }

        match self.cause() {
            None => true,
            Some(Cause::Wrapped(inner)) => candidate
                .wrapped()
                .is_some_and(|other| inner.matches(other)),
            Some(Cause::Root { error, .. }) => candidate
                .cause()
                .is_some_and(|other| other.as_error().to_string() == error.to_string()),
        }
    }

    /// True if the first non-`Other` kind along this chain is `kind`.
    pub fn kind_is(&self, kind: Kind) -> bool {
        kind_is(kind, self)
    }
}

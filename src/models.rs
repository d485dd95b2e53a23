//! Attribute types carried by [`Error`](crate::Error).
//!
//! Each attribute is its own newtype so a builder setter can only ever
//! receive the field it names. A bare `&str` means nothing on its own; an
//! `Op`, a `Code`, or a `Realm` does.
//!
//! Empty strings are normalized away at the builder: an attribute is either
//! present and non-empty or absent.

use std::borrow::Cow;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Operation label
// ============================================================================

/// Label of the operation that produced or rewrapped an error, conventionally
/// `"package/Type.Method"`.
///
/// Labels are almost always constants, so `&'static str` is stored without
/// allocating.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Op(Cow<'static, str>);

impl Op {
    /// Wrap a label.
    #[inline]
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self(label.into())
    }

    /// The underlying string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Op {
    fn from(label: &'static str) -> Self {
        Self(Cow::Borrowed(label))
    }
}

impl From<String> for Op {
    fn from(label: String) -> Self {
        Self(Cow::Owned(label))
    }
}

// ============================================================================
// Actor identity
// ============================================================================

/// Identity of the actor associated with a failure.
///
/// Treated as personal data: it is logged only as a presence flag, never
/// written to a response, and wiped when dropped.
#[derive(Clone, PartialEq, Eq, Hash, Zeroize, ZeroizeOnDrop)]
pub struct UserName(String);

impl UserName {
    /// Wrap an actor identity.
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The underlying string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty string.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UserName(<REDACTED>)")
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<String> for UserName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ============================================================================
// Plain string attributes
// ============================================================================

macro_rules! string_attribute {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Wrap a value as a `", stringify!($name), "`.")]
            #[inline]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// The underlying string.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// True for the empty string.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_attribute! {
    /// Name of the input field or parameter implicated in the failure.
    Parameter
}

string_attribute! {
    /// Short machine-readable token clients can branch on.
    ///
    /// Orthogonal to [`Kind`](crate::Kind): many codes can share one kind.
    Code
}

string_attribute! {
    /// Authentication realm, used to build `WWW-Authenticate` for
    /// [`Kind::Unauthenticated`](crate::Kind::Unauthenticated) errors.
    Realm
}

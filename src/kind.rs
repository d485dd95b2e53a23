//! Error classification taxonomy.
//!
//! `Kind` answers "what sort of failure is this" independently of where it
//! happened. The set is closed and ordered. Discriminants are explicit and
//! append-only: a value that has been persisted or compared across versions
//! must keep meaning the same class forever, so variants are never
//! renumbered or removed. New classes go at the end.
//!
//! `Other` is the zero value and means "unclassified". The builder treats it
//! as unset, which lets an inner, more specific Kind bubble up to the
//! outermost error.

use axum::http::StatusCode;
use std::fmt;

/// Label rendered for raw values outside the known range.
pub const UNKNOWN_KIND_LABEL: &str = "unknown error kind";

/// Classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Kind {
    /// Unclassified error.
    #[default]
    Other = 0,
    /// Invalid operation for this type of item.
    Invalid = 1,
    /// External I/O error such as a network failure.
    IO = 2,
    /// Item already exists.
    Exist = 3,
    /// Item does not exist.
    NotExist = 4,
    /// Information withheld.
    Private = 5,
    /// Internal error or inconsistency.
    Internal = 6,
    /// Link target does not exist.
    BrokenLink = 7,
    /// Error from the database.
    Database = 8,
    /// Input validation error.
    Validation = 9,
    /// Unanticipated error.
    Unanticipated = 10,
    /// Invalid request.
    InvalidRequest = 11,
    /// The caller could not be authenticated (maps to 401).
    Unauthenticated = 12,
    /// The caller is authenticated but not allowed (maps to 403).
    Unauthorized = 13,
}

impl Kind {
    /// Every kind, in discriminant order.
    pub const ALL: [Kind; 14] = [
        Kind::Other,
        Kind::Invalid,
        Kind::IO,
        Kind::Exist,
        Kind::NotExist,
        Kind::Private,
        Kind::Internal,
        Kind::BrokenLink,
        Kind::Database,
        Kind::Validation,
        Kind::Unanticipated,
        Kind::InvalidRequest,
        Kind::Unauthenticated,
        Kind::Unauthorized,
    ];

    /// Canonical lowercase label.
    #[inline]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Other => "other error",
            Self::Invalid => "invalid operation",
            Self::IO => "I/O error",
            Self::Exist => "item already exists",
            Self::NotExist => "item does not exist",
            Self::Private => "information withheld",
            Self::Internal => "internal error",
            Self::BrokenLink => "link target does not exist",
            Self::Database => "database error",
            Self::Validation => "input validation error",
            Self::Unanticipated => "unanticipated error",
            Self::InvalidRequest => "invalid request error",
            Self::Unauthenticated => "unauthenticated request",
            Self::Unauthorized => "unauthorized request",
        }
    }

    /// Numeric identity of this kind.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Resolve a raw numeric value, `None` if it names no known kind.
    #[inline]
    pub const fn from_repr(raw: u8) -> Option<Self> {
        if (raw as usize) < Self::ALL.len() {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    /// Label for a raw numeric value.
    ///
    /// Values from another version or from untrusted input may be out of
    /// range; those render [`UNKNOWN_KIND_LABEL`] instead of panicking.
    #[inline]
    pub const fn label_of(raw: u8) -> &'static str {
        match Self::from_repr(raw) {
            Some(kind) => kind.label(),
            None => UNKNOWN_KIND_LABEL,
        }
    }

    /// True for kinds caused by the client's input (the 400 class).
    #[inline]
    pub const fn is_client_error(self) -> bool {
        matches!(
            self,
            Self::Invalid
                | Self::Exist
                | Self::NotExist
                | Self::Private
                | Self::BrokenLink
                | Self::Validation
                | Self::InvalidRequest
        )
    }

    /// HTTP status a response for this kind carries.
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            k if k.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Kinds whose message must never reach a client.
    #[inline]
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Internal | Self::Database)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Kind> for u8 {
    fn from(kind: Kind) -> Self {
        kind.as_u8()
    }
}

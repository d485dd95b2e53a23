//! HTTP surfacing.
//!
//! [`respond`] turns the outcome of a request into exactly one response and
//! one log event:
//!
//! | Input | Status | Body |
//! |---|---|---|
//! | `None` | 500 | none |
//! | not an [`Error`] anywhere in the chain | 500 | unanticipated envelope |
//! | zero [`Error`] | 500 | none |
//! | [`Kind::Unauthenticated`] | 401 | none, `WWW-Authenticate: Bearer realm="…"` |
//! | [`Kind::Unauthorized`] | 403 | none |
//! | any other kind | [`Kind::http_status`] | JSON envelope |
//!
//! The envelope is `{"error":{"kind","code","param","message"}}` with empty
//! fields left out. 500-class messages are replaced by
//! [`ResponseConfig::redacted_message`]; `Internal` and `Database` errors
//! additionally hide their code and param and report the kind as
//! `internal error`. The real message is always logged.
//!
//! `Content-Type` and `X-Content-Type-Options` are set only when there is a
//! body.

use crate::{find_error, logging, trace, Error, Kind, TraceMode};
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, WWW_AUTHENTICATE, X_CONTENT_TYPE_OPTIONS};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

/// Realm used when neither the error nor the config names one.
pub const DEFAULT_REALM: &str = "default";

/// Default client-facing text for 500-class errors.
pub const DEFAULT_REDACTED_MESSAGE: &str = "internal server error - please contact support";

/// Code sent for errors that carry no classification.
pub const UNANTICIPATED_CODE: &str = "Unanticipated";

/// Message sent for errors that carry no classification.
pub const UNANTICIPATED_MESSAGE: &str = "Unexpected error - contact support";

// ============================================================================
// Configuration
// ============================================================================

/// Settings for [`respond`], built once at startup.
///
/// See [`ResponseConfig::from_env`] for loading from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Trace attached to log events.
    pub trace_mode: TraceMode,
    /// Realm for `WWW-Authenticate` when the error has none.
    pub default_realm: String,
    /// Message sent in place of any 500-class error text.
    pub redacted_message: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            trace_mode: TraceMode::default(),
            default_realm: DEFAULT_REALM.to_owned(),
            redacted_message: DEFAULT_REDACTED_MESSAGE.to_owned(),
        }
    }
}

impl ResponseConfig {
    /// Replace the trace mode.
    pub fn with_trace_mode(mut self, mode: TraceMode) -> Self {
        self.trace_mode = mode;
        self
    }

    fn realm_or_default<'a>(&'a self, err: &'a Error) -> &'a str {
        match err.realm() {
            Some(realm) => realm.as_str(),
            None if !self.default_realm.is_empty() => &self.default_realm,
            None => DEFAULT_REALM,
        }
    }

    fn redacted(&self) -> &str {
        if self.redacted_message.is_empty() {
            DEFAULT_REDACTED_MESSAGE
        } else {
            &self.redacted_message
        }
    }
}

// ============================================================================
// Body
// ============================================================================

/// JSON envelope of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error description.
    pub error: ServiceError,
}

/// Client-facing description of an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceError {
    /// Kind label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Machine-readable code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    /// Implicated parameter.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub param: String,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ServiceError {
    fn unanticipated() -> Self {
        Self {
            kind: Kind::Unanticipated.label().to_owned(),
            code: UNANTICIPATED_CODE.to_owned(),
            param: String::new(),
            message: UNANTICIPATED_MESSAGE.to_owned(),
        }
    }

    fn from_error(config: &ResponseConfig, err: &Error) -> Self {
        let kind = err.kind();
        if kind.is_internal() {
            return Self {
                kind: Kind::Internal.label().to_owned(),
                message: config.redacted().to_owned(),
                ..Self::default()
            };
        }

        let message = if kind.http_status().is_server_error() {
            config.redacted().to_owned()
        } else {
            err.to_string()
        };

        Self {
            kind: kind.label().to_owned(),
            code: err.code().map(|c| c.as_str().to_owned()).unwrap_or_default(),
            param: err.param().map(|p| p.as_str().to_owned()).unwrap_or_default(),
            message,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

/// Status, headers and optional JSON body of an error response.
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<String>,
}

impl ErrorResponse {
    fn bare(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn json(status: StatusCode, error: ServiceError) -> Self {
        let body = match serde_json::to_string(&ErrorBody { error }) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(target: logging::LOG_TARGET, error = %err, "error body serialization failed");
                return Self::bare(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
        Self {
            status,
            headers,
            body: Some(body),
        }
    }

    /// Bare 401 challenging with the first usable of `realm`, `fallback` and
    /// [`DEFAULT_REALM`]. Also returns the realm that was sent.
    fn challenge<'a>(realm: &'a str, fallback: &'a str) -> (Self, &'a str) {
        let (sent, value) = [realm, fallback]
            .into_iter()
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| bearer_challenge(candidate).map(|value| (candidate, value)))
            .unwrap_or((DEFAULT_REALM, HeaderValue::from_static("Bearer realm=\"default\"")));
        let mut response = Self::bare(StatusCode::UNAUTHORIZED);
        response.headers.insert(WWW_AUTHENTICATE, value);
        (response, sent)
    }

    /// HTTP status.
    #[inline]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[inline]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// JSON body, `None` for bare responses.
    #[inline]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Split into status, headers and body.
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<String>) {
        (self.status, self.headers, self.body)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            Some(json) => Body::from(json),
            None => Body::empty(),
        };
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl IntoResponse for Error {
    /// Surface with [`ResponseConfig::default`]. Handlers that load a config
    /// at startup should call [`respond`] instead.
    fn into_response(self) -> Response {
        respond(&ResponseConfig::default(), Some(&self)).into_response()
    }
}

/// `Bearer realm="<realm>"`, with `\` and `"` escaped. `None` if the realm
/// cannot appear in a header value.
fn bearer_challenge(realm: &str) -> Option<HeaderValue> {
    let mut value = String::with_capacity(realm.len() + 16);
    value.push_str("Bearer realm=\"");
    for c in realm.chars() {
        if matches!(c, '"' | '\\') {
            value.push('\\');
        }
        value.push(c);
    }
    value.push('"');
    HeaderValue::from_str(&value).ok()
}

// ============================================================================
// Entry point
// ============================================================================

/// Build the response for `err` and log it.
///
/// `None` stands for "no error", which should never reach an error path and
/// is answered with a bare 500. Foreign errors are searched for an
/// [`Error`] in their source chain before being treated as unanticipated.
pub fn respond(config: &ResponseConfig, err: Option<&(dyn StdError + 'static)>) -> ErrorResponse {
    let Some(err) = err else {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        logging::nil_error(status);
        return ErrorResponse::bare(status);
    };

    let Some(found) = find_error(err) else {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        logging::unknown_error(status, err);
        return ErrorResponse::json(status, ServiceError::unanticipated());
    };

    if found.is_zero() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        logging::zero_error(status);
        return ErrorResponse::bare(status);
    }

    let resolved = trace(config.trace_mode, found);
    let status = found.kind().http_status();

    match found.kind() {
        Kind::Unauthenticated => {
            let (response, sent) = ErrorResponse::challenge(config.realm_or_default(found), &config.default_realm);
            logging::unauthenticated(status, sent, &resolved, found);
            response
        }
        Kind::Unauthorized => {
            logging::unauthorized(status, &resolved, found);
            ErrorResponse::bare(status)
        }
        _ => {
            logging::response_sent(status, &resolved, found);
            ErrorResponse::json(status, ServiceError::from_error(config, found))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e;
    use crate::logging::capture::logs;
    use std::io;

    fn config() -> ResponseConfig {
        ResponseConfig::default()
    }

    fn body_of(response: &ErrorResponse) -> ServiceError {
        let body: ErrorBody = serde_json::from_str(response.body().unwrap()).unwrap();
        body.error
    }

    fn assert_json_headers(response: &ErrorResponse) {
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    fn assert_no_body(response: &ErrorResponse) {
        assert!(response.body().is_none());
        assert!(response.headers().get(CONTENT_TYPE).is_none());
        assert!(response.headers().get(X_CONTENT_TYPE_OPTIONS).is_none());
    }

    #[test]
    fn nil_is_bare_500() {
        let (response, output) = logs(|| respond(&config(), None));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_no_body(&response);
        assert!(output.contains("nil error passed"));
    }

    #[test]
    fn zero_error_is_bare_500() {
        let zero = e!(kind(Kind::Other));
        let (response, output) = logs(|| respond(&config(), Some(&zero)));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_no_body(&response);
        assert!(output.contains("Error value is zero"));
    }

    #[test]
    fn foreign_error_is_unanticipated() {
        let foreign = io::Error::other("socket closed");
        let (response, output) = logs(|| respond(&config(), Some(&foreign)));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_json_headers(&response);
        assert_eq!(
            response.body(),
            Some(r#"{"error":{"kind":"unanticipated error","code":"Unanticipated","message":"Unexpected error - contact support"}}"#)
        );
        assert!(output.contains("unknown error"));
        assert!(output.contains("socket closed"));
    }

    #[derive(Debug)]
    struct Context {
        what: &'static str,
        source: io::Error,
    }

    impl std::fmt::Display for Context {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.what)
        }
    }

    impl StdError for Context {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.source)
        }
    }

    #[test]
    fn foreign_error_logs_every_layer() {
        let foreign = Context {
            what: "loading movie catalog",
            source: io::Error::other("disk full"),
        };
        let (response, output) = logs(|| respond(&config(), Some(&foreign)));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(output.contains("unknown error"));
        assert!(output.contains("loading movie catalog: disk full"));
        assert!(output.contains("root=disk full"));
        assert!(!response.body().unwrap().contains("disk full"));
    }

    #[test]
    fn unauthenticated_without_realm_uses_default() {
        let err = e!(kind(Kind::Unauthenticated), msg("x"));
        let (response, output) = logs(|| respond(&ResponseConfig::default(), Some(&err)));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_no_body(&response);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"default\"");
        assert!(output.contains("realm=\"default\""));
    }

    #[test]
    fn unauthenticated_sets_challenge() {
        let err = e!(kind(Kind::Unauthenticated), realm("default"), msg("bad token"));
        let (response, output) = logs(|| respond(&config(), Some(&err)));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_no_body(&response);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"default\"");
        assert!(output.contains("unauthenticated request"));
        assert!(output.contains("realm=\"default\""));
    }

    #[test]
    fn unauthenticated_uses_config_realm() {
        let err = e!(kind(Kind::Unauthenticated), msg("no token"));
        let config = ResponseConfig {
            default_realm: "movies".to_owned(),
            ..ResponseConfig::default()
        };
        let response = respond(&config, Some(&err));
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"movies\"");
    }

    #[test]
    fn challenge_escapes_quotes() {
        let err = e!(kind(Kind::Unauthenticated), realm(r#"a"b\c"#));
        let response = respond(&config(), Some(&err));
        assert_eq!(response.headers()[WWW_AUTHENTICATE], r#"Bearer realm="a\"b\\c""#);
    }

    #[test]
    fn challenge_falls_back_on_unencodable_realm() {
        let err = e!(kind(Kind::Unauthenticated), realm("line\nbreak"));
        let response = respond(&config(), Some(&err));
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"default\"");
    }

    #[test]
    fn empty_default_realm_is_skipped() {
        let err = e!(kind(Kind::Unauthenticated), realm("line\nbreak"));
        let config = ResponseConfig {
            default_realm: String::new(),
            ..ResponseConfig::default()
        };
        let (response, output) = logs(|| respond(&config, Some(&err)));
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"default\"");
        assert!(output.contains("realm=\"default\""));
    }

    #[test]
    fn log_names_the_realm_sent() {
        let err = e!(kind(Kind::Unauthenticated), realm("line\nbreak"));
        let config = ResponseConfig {
            default_realm: "movies".to_owned(),
            ..ResponseConfig::default()
        };
        let (response, output) = logs(|| respond(&config, Some(&err)));
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer realm=\"movies\"");
        assert!(output.contains("realm=\"movies\""));
    }

    #[test]
    fn error_given_as_source_surfaces_its_kind() {
        let err = e!(op("o"), source(e!(kind(Kind::Validation), msg("m"))));
        let response = respond(&config(), Some(&err));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_of(&response);
        assert_eq!(body.kind, "input validation error");
        assert_eq!(body.message, "m");
    }

    #[test]
    fn unauthorized_is_bare_403() {
        let err = e!(kind(Kind::Unauthorized), msg("no access"));
        let (response, output) = logs(|| respond(&config(), Some(&err)));
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_no_body(&response);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
        assert!(output.contains("unauthorized request"));
        assert!(output.contains("no access"));
    }

    #[test]
    fn client_error_carries_message() {
        let err = e!(kind(Kind::Exist), code("E1"), param("name"), msg("already there"));
        let response = respond(&config(), Some(&err));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_json_headers(&response);
        assert_eq!(
            response.body(),
            Some(r#"{"error":{"kind":"item already exists","code":"E1","param":"name","message":"already there"}}"#)
        );
    }

    #[test]
    fn empty_fields_are_omitted() {
        let err = e!(kind(Kind::Validation), msg("bad input"));
        let response = respond(&config(), Some(&err));
        assert_eq!(
            response.body(),
            Some(r#"{"error":{"kind":"input validation error","message":"bad input"}}"#)
        );
    }

    #[test]
    fn database_message_is_redacted() {
        let err = e!(kind(Kind::Database), code("PG"), param("id"), msg("connection refused"));
        let (response, output) = logs(|| respond(&config(), Some(&err)));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(&response);
        assert_eq!(body.kind, "internal error");
        assert_eq!(body.message, DEFAULT_REDACTED_MESSAGE);
        assert!(body.code.is_empty());
        assert!(body.param.is_empty());
        assert!(!response.body().unwrap().contains("connection refused"));
        assert!(output.contains("connection refused"));
    }

    #[test]
    fn other_server_kinds_keep_classification() {
        let err = e!(kind(Kind::IO), code("UPSTREAM"), msg("dial tcp: timeout"));
        let response = respond(&config(), Some(&err));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(&response);
        assert_eq!(body.kind, "I/O error");
        assert_eq!(body.code, "UPSTREAM");
        assert_eq!(body.message, DEFAULT_REDACTED_MESSAGE);
    }

    #[test]
    fn custom_redacted_message() {
        let config = ResponseConfig {
            redacted_message: "try again later".to_owned(),
            ..ResponseConfig::default()
        };
        let err = e!(kind(Kind::Internal), msg("panic in worker"));
        let response = respond(&config, Some(&err));
        assert_eq!(body_of(&response).message, "try again later");
    }

    #[test]
    fn error_inside_foreign_wrapper_is_surfaced() {
        #[derive(Debug)]
        struct Wrapper(Error);

        impl std::fmt::Display for Wrapper {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("wrapper")
            }
        }

        impl StdError for Wrapper {
            fn source(&self) -> Option<&(dyn StdError + 'static)> {
                Some(&self.0)
            }
        }

        let wrapped = Wrapper(e!(kind(Kind::NotExist), msg("no such movie")));
        let response = respond(&config(), Some(&wrapped));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(&response).message, "no such movie");
    }

    #[test]
    fn into_response_preserves_parts() {
        let err = e!(kind(Kind::Validation), msg("bad"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");

        let response = respond(&config(), None).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: ResponseConfig =
            serde_json::from_str(r#"{"trace_mode":"backtrace","default_realm":"api"}"#).unwrap();
        assert_eq!(config.trace_mode, TraceMode::CapturedStack);
        assert_eq!(config.default_realm, "api");
        assert_eq!(config.redacted_message, DEFAULT_REDACTED_MESSAGE);
    }
}

//! # Error and Result for this crate
//!
//! This crate defines a common [Error] structure that's used across all of its modules, from
//! schema reconstruction down to the network layer.
//!
//! Errors that a remote GraphQL service reports in its response's `errors` list are represented
//! by [GraphQLError] and collected into an [ErrorList], which is carried by
//! [`ErrorType::GraphQL`]. These are non-fatal to the transport: the response's `data` is still
//! decoded, so a caller must inspect both the receiver and the returned error.

use serde::{Deserialize, Serialize};
use serde_json::{Map as JSMap, Value as JSValue};
use std::{error, fmt, result};

/// This crate's result type using the [Error] structure.
pub type Result<T> = result::Result<T, Error>;

/// This crate's error structure which internal errors are converted into.
///
/// The error is split into a general message and a context string. For transport failures, for
/// instance, the context string is populated with a snippet of the response body.
///
/// Errors are cheap to clone, since a single failed batch request is reported to every operation
/// that was part of that batch.
#[derive(PartialEq, Clone)]
pub struct Error {
    pub(crate) message: String,
    pub(crate) context: Option<String>,
    pub(crate) error_type: ErrorType,
}

/// The kind of failure an [Error] represents.
#[derive(Debug, PartialEq, Clone)]
pub enum ErrorType {
    /// A connection failure, an unreadable body, or a response with a non-2xx status code.
    Transport { status: Option<u16> },
    /// A request that didn't complete before its deadline.
    Timeout,
    /// A response that doesn't follow the GraphQL protocol, e.g. invalid JSON or an inconsistent
    /// introspection result.
    Protocol,
    /// Errors reported by the remote service in the response's `errors` list.
    GraphQL(ErrorList),
    /// A selection set that can't be flattened, e.g. a spread of an unknown fragment.
    Selection,
}

impl Error {
    /// Create a new Error with only a main message from an input string.
    pub fn new<S: Into<String>>(message: S, error_type: ErrorType) -> Self {
        Self {
            message: message.into(),
            context: None,
            error_type,
        }
    }

    /// Create a new Error with a main message and a context string from two input strings.
    pub fn new_with_context<S: Into<String>, C: Into<String>>(
        message: S,
        context: C,
        error_type: ErrorType,
    ) -> Self {
        Self {
            message: message.into(),
            context: Some(context.into()),
            error_type,
        }
    }

    #[inline]
    pub(crate) fn protocol<S: Into<String>>(message: S) -> Self {
        Self::new(message, ErrorType::Protocol)
    }

    #[inline]
    pub(crate) fn transport<S: Into<String>>(message: S) -> Self {
        Self::new(message, ErrorType::Transport { status: None })
    }

    /// Returns the message of the current error. The context is discarded.
    pub fn message(&self) -> &str {
        self.message.as_ref()
    }

    /// Returns the context of the current error, if any was attached.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns the kind of the current error.
    pub fn error_type(&self) -> &ErrorType {
        &self.error_type
    }

    /// Returns the list of errors the remote service reported, if this is a GraphQL error.
    pub fn graphql_errors(&self) -> Option<&ErrorList> {
        match self.error_type {
            ErrorType::GraphQL(ref errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns the HTTP status code of a failed response, if this is a transport error.
    pub fn status(&self) -> Option<u16> {
        match self.error_type {
            ErrorType::Transport { status } => status,
            _ => None,
        }
    }

    /// Formats this error, with the option to include the context information as well,
    /// which will cause the string to be multi-line.
    pub fn print(&self, include_ctx: bool) -> String {
        let formatted = match self.error_type {
            ErrorType::Transport { .. } => format!("Transport Error: {}", self.message),
            ErrorType::Timeout => format!("Timeout Error: {}", self.message),
            ErrorType::Protocol => format!("Protocol Error: {}", self.message),
            ErrorType::GraphQL(_) => format!("GraphQL Error: {}", self.message),
            ErrorType::Selection => format!("Selection Error: {}", self.message),
        };

        match self.context {
            Some(ref context) if include_ctx => format!("{}\n{}", formatted, context),
            _ => formatted,
        }
    }
}

impl From<ErrorList> for Error {
    fn from(errors: ErrorList) -> Self {
        Error {
            message: errors.to_string(),
            context: None,
            error_type: ErrorType::GraphQL(errors),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|status| status.as_u16());
        if err.is_timeout() {
            Error::new(err.to_string(), ErrorType::Timeout)
        } else {
            Error::new(err.to_string(), ErrorType::Transport { status })
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::protocol(err.to_string())
    }
}

impl From<graphql_query::error::Error> for Error {
    fn from(err: graphql_query::error::Error) -> Self {
        Error::new(err.message(), ErrorType::Selection)
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::new("deadline elapsed before the request completed", ErrorType::Timeout)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.print(true))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n{}\n", self)
    }
}

impl error::Error for Error {}

/// A segment of the response path an error occurred at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Field name or alias.
    Key(String),
    /// List index.
    Index(i64),
}

/// An error as reported by a GraphQL service.
///
/// [Reference](https://spec.graphql.org/October2021/#sec-Errors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<JSMap<String, JSValue>>,
}

impl GraphQLError {
    /// Create an error with a message and an `extensions.code` entry.
    pub fn new<C: Into<String>, S: Into<String>>(code: C, message: S) -> Self {
        let mut extensions = JSMap::new();
        extensions.insert("code".into(), JSValue::String(code.into()));
        GraphQLError {
            message: message.into(),
            path: None,
            extensions: Some(extensions),
        }
    }

    /// Returns the `extensions.code` entry if it's present and a string.
    pub fn code(&self) -> Option<&str> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.get("code"))
            .and_then(|code| code.as_str())
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl error::Error for GraphQLError {}

/// A list of [GraphQLError]s as returned in a single response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorList(pub Vec<GraphQLError>);

impl ErrorList {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, GraphQLError> {
        self.0.iter()
    }
}

impl IntoIterator for ErrorList {
    type Item = GraphQLError;
    type IntoIter = std::vec::IntoIter<GraphQLError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(". ")?;
            }
            f.write_str(&error.message)?;
        }
        Ok(())
    }
}

impl error::Error for ErrorList {}

/// Collects the `errors` list of a response object, if it's present.
///
/// Returns `Ok(None)` when the response carries no `errors` key. Entries must be objects with a
/// string `message`; a malformed `path` or `extensions` value is ignored.
pub fn extract_errors(response: &JSMap<String, JSValue>) -> Result<Option<ErrorList>> {
    let errors = match response.get("errors") {
        Some(errors) => errors,
        None => return Ok(None),
    };

    let errors = errors
        .as_array()
        .ok_or_else(|| Error::protocol("errors was not a list"))?;

    let mut list = Vec::with_capacity(errors.len());
    for error in errors.iter() {
        let obj = error
            .as_object()
            .ok_or_else(|| Error::protocol("encountered non-object error"))?;

        let message = obj
            .get("message")
            .and_then(|message| message.as_str())
            .ok_or_else(|| Error::protocol("error message was not a string"))?;

        let path = obj
            .get("path")
            .and_then(|path| serde_json::from_value::<Vec<PathSegment>>(path.clone()).ok());

        let extensions = obj
            .get("extensions")
            .and_then(|extensions| extensions.as_object())
            .cloned();

        list.push(GraphQLError {
            message: message.to_string(),
            path,
            extensions,
        });
    }

    Ok(Some(ErrorList(list)))
}

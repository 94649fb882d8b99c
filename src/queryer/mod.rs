//! # Sending Queries to Remote Services
//!
//! A [Queryer] takes a [QueryInput] and returns the raw response object of a remote GraphQL
//! service. Three implementations are provided:
//!
//! - [SingleRequestQueryer] sends one HTTP request per query and switches to a multipart request
//!   when the query's variables contain [Upload]s.
//! - [MultiOpQueryer] collects the queries issued within a short interval and sends them as a
//!   single batched request.
//! - [QueryerFn] wraps a plain function, which is mostly useful for tests.
//!
//! The [QueryerExt] trait adds [`query`](QueryerExt::query) to every queryer, which decodes the
//! response's `data` into a receiver and surfaces the service's `errors` list as an
//! [`ErrorType::GraphQL`](crate::error::ErrorType::GraphQL) error.

use crate::error::{extract_errors, Error, ErrorType, Result};
use async_trait::async_trait;
use graphql_query::ast::{Document, PrintNode};
use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

mod multi_op;
mod network;
mod single;
mod upload;

pub use multi_op::*;
pub use network::*;
pub use single::*;
pub use upload::*;

use network::body_context;

/// A raw JSON response object.
pub type JSMap = serde_json::Map<String, Value>;

/// The payload of a single GraphQL request.
///
/// Serializes to `{"query": ..., "operationName": ..., "variables": ...}`. The operation name is
/// sent as `null` when it's absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInput {
    pub query: String,
    pub operation_name: Option<String>,
    pub variables: IndexMap<String, VariableValue>,
}

impl QueryInput {
    pub fn new<S: Into<String>>(query: S) -> Self {
        QueryInput {
            query: query.into(),
            operation_name: None,
            variables: IndexMap::new(),
        }
    }

    /// Creates an input from an already parsed document by printing it back into query text.
    pub fn from_document(document: &Document, operation_name: Option<&str>) -> Self {
        QueryInput {
            query: document.print(),
            operation_name: operation_name.map(|name| name.to_string()),
            variables: IndexMap::new(),
        }
    }

    pub fn with_operation_name<S: Into<String>>(mut self, operation_name: S) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    pub fn with_variable<S: Into<String>, V: Into<VariableValue>>(
        mut self,
        name: S,
        value: V,
    ) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: IndexMap<String, VariableValue>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Returns a string identifying this input, which is its JSON encoding.
    pub fn identity(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Sends a [QueryInput] to a GraphQL service and returns its raw response object.
#[async_trait]
pub trait Queryer: Send + Sync {
    /// Executes a query and returns the response object, including its `data` and `errors` keys.
    ///
    /// Only failures to retrieve a response are returned as errors. The response's `errors` list
    /// is left for the caller to inspect, see [`QueryerExt::query`].
    async fn execute(&self, input: &QueryInput) -> Result<JSMap>;

    /// Replaces the middlewares of this queryer's network layer, if it has one.
    fn with_middlewares(self, _middlewares: Vec<Middleware>) -> Self
    where
        Self: Sized,
    {
        self
    }

    /// Replaces the HTTP client of this queryer's network layer, if it has one.
    fn with_http_client(self, _client: reqwest::Client) -> Self
    where
        Self: Sized,
    {
        self
    }
}

#[async_trait]
pub trait QueryerExt: Queryer {
    /// Executes a query and decodes the response's `data` into the receiver.
    ///
    /// The receiver is left untouched when `data` is `null` or missing. When the response carries
    /// errors, `data` is still decoded before the errors are returned as an
    /// [`ErrorType::GraphQL`] error, so both the receiver and the result must be checked.
    async fn query<T: DeserializeOwned + Send>(
        &self,
        input: &QueryInput,
        receiver: &mut T,
    ) -> Result<()> {
        let response = self.execute(input).await?;
        decode_response(response, receiver)
    }
}

impl<Q: Queryer + ?Sized> QueryerExt for Q {}

pub(crate) fn decode_response<T: DeserializeOwned>(
    mut response: JSMap,
    receiver: &mut T,
) -> Result<()> {
    let errors = extract_errors(&response)?;

    let decoded = match response.remove("data") {
        Some(Value::Null) | None => Ok(()),
        Some(data) => serde_json::from_value(data).map(|data| *receiver = data),
    };

    match errors {
        Some(errors) if !errors.is_empty() => {
            // GraphQL errors win; a failure to decode `data` is attached as their context.
            let mut error = Error::from(errors);
            if let Err(decode_error) = decoded {
                error.context = Some(decode_error.to_string());
            }
            Err(error)
        }
        _ => Ok(decoded?),
    }
}

/// Parses a response body, attaching the body as context when it isn't valid JSON.
pub(crate) fn parse_response<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|_| {
        Error::new_with_context(
            "Response body was not valid json",
            body_context(body),
            ErrorType::Protocol,
        )
    })
}

/// A [Queryer] that resolves queries by calling a function returning the response's `data`.
pub struct QueryerFn<F>(pub F);

#[async_trait]
impl<F> Queryer for QueryerFn<F>
where
    F: Fn(&QueryInput) -> Result<Value> + Send + Sync,
{
    async fn execute(&self, input: &QueryInput) -> Result<JSMap> {
        let data = (self.0)(input)?;
        let mut response = JSMap::new();
        response.insert("data".to_string(), data);
        Ok(response)
    }
}

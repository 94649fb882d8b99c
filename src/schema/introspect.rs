use super::{
    build_client_schema::BuildClientSchema,
    introspection::{IntrospectionQuery, INTROSPECTION_OPERATION_NAME, INTROSPECTION_QUERY},
    schema::Schema,
};
use crate::{
    error::Result,
    queryer::{Middleware, QueryInput, Queryer, QueryerExt, SingleRequestQueryer},
    retry::Retrier,
};
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Options that are applied when a schema is introspected.
///
/// Options may be combined with [`IntrospectOptions::merge`], which appends the other options'
/// middlewares and lets every other option that's set override this one's.
#[derive(Clone, Default)]
pub struct IntrospectOptions {
    middlewares: Vec<Middleware>,
    http_client: Option<reqwest::Client>,
    timeout: Option<Duration>,
    retrier: Option<Arc<dyn Retrier>>,
}

impl fmt::Debug for IntrospectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntrospectOptions")
            .field("middlewares", &self.middlewares.len())
            .field("http_client", &self.http_client.is_some())
            .field("timeout", &self.timeout)
            .field("retrier", &self.retrier.is_some())
            .finish()
    }
}

impl IntrospectOptions {
    pub fn new() -> Self {
        IntrospectOptions::default()
    }

    /// Adds middlewares that are applied to the introspection request.
    pub fn middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.middlewares.extend(middlewares);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets a deadline for every attempt to introspect the schema.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the [Retrier] that's consulted when an attempt fails.
    pub fn retrier<R: Retrier + 'static>(mut self, retrier: R) -> Self {
        self.retrier = Some(Arc::new(retrier));
        self
    }

    pub fn merge(mut self, other: IntrospectOptions) -> Self {
        self.middlewares.extend(other.middlewares);
        if other.http_client.is_some() {
            self.http_client = other.http_client;
        }
        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        if other.retrier.is_some() {
            self.retrier = other.retrier;
        }
        self
    }

    fn apply<Q: Queryer>(&self, queryer: Q) -> Q {
        let queryer = if self.middlewares.is_empty() {
            queryer
        } else {
            queryer.with_middlewares(self.middlewares.clone())
        };
        match &self.http_client {
            Some(client) => queryer.with_http_client(client.clone()),
            None => queryer,
        }
    }
}

/// A schema along with the URL it was introspected from.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSchema {
    pub url: String,
    pub schema: Schema,
}

async fn fetch_introspection<Q: Queryer>(
    queryer: &Q,
    input: &QueryInput,
    timeout: Option<Duration>,
) -> Result<IntrospectionQuery> {
    let mut result = IntrospectionQuery::default();
    let request = queryer.query(input, &mut result);
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, request).await??,
        None => request.await?,
    }
    Ok(result)
}

/// Sends the introspection query through a [Queryer] and builds a [Schema] from its response.
///
/// Failed attempts are repeated for as long as the options' [Retrier] allows it. A response that
/// was received but can't be built into a schema isn't retried.
pub async fn introspect_api<Q: Queryer>(
    queryer: Q,
    options: &IntrospectOptions,
) -> Result<Schema> {
    let queryer = options.apply(queryer);
    let input =
        QueryInput::new(INTROSPECTION_QUERY).with_operation_name(INTROSPECTION_OPERATION_NAME);

    let mut attempts: u32 = 0;
    let introspection = loop {
        attempts += 1;
        match fetch_introspection(&queryer, &input, options.timeout).await {
            Ok(introspection) => break introspection,
            Err(error) => match &options.retrier {
                Some(retrier) if retrier.should_retry(&error, attempts) => {
                    warn!(attempts, error = %error, "introspection failed, retrying");
                }
                _ => return Err(error),
            },
        }
    };

    let schema = introspection.build_client_schema()?;
    debug!(
        types = schema.types().count(),
        attempts, "reconstructed schema from introspection"
    );
    Ok(schema)
}

/// Introspects the schema of the GraphQL service at a URL.
pub async fn introspect_remote_schema(
    url: &str,
    options: &IntrospectOptions,
) -> Result<RemoteSchema> {
    let schema = introspect_api(SingleRequestQueryer::new(url), options).await?;
    Ok(RemoteSchema {
        url: url.to_string(),
        schema,
    })
}

/// Introspects the schemas of several services one after another, stopping at the first failure.
pub async fn introspect_remote_schemas<S: AsRef<str>>(
    urls: &[S],
    options: &IntrospectOptions,
) -> Result<Vec<RemoteSchema>> {
    let mut schemas = Vec::with_capacity(urls.len());
    for url in urls.iter() {
        schemas.push(introspect_remote_schema(url.as_ref(), options).await?);
    }
    Ok(schemas)
}

use super::{parse_response, JSMap, Middleware, NetworkQueryer, QueryInput, Queryer};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{mem, sync::Arc, time::Duration};
use tokio::sync::oneshot;
use tracing::{debug, trace};

struct BatchedOperation {
    input: QueryInput,
    sender: oneshot::Sender<Result<JSMap>>,
}

#[derive(Default)]
struct BatchState {
    pending: Vec<BatchedOperation>,
    /// Incremented every time a batch is closed, so a timer only ever drains the batch it was
    /// started for.
    batch_id: u64,
}

impl BatchState {
    fn close(&mut self) -> Vec<BatchedOperation> {
        self.batch_id = self.batch_id.wrapping_add(1);
        mem::take(&mut self.pending)
    }
}

/// A [Queryer] that batches queries into a single request.
///
/// The first query that's issued opens a batch and starts a timer. Every query issued until the
/// timer fires joins that batch, and the batch is then sent as a JSON list of query payloads. The
/// response must be a list of response objects in the same order. When `max_batch_size` is
/// non-zero a batch is also sent as soon as it holds that many queries.
///
/// A failed request is reported to every query of its batch, while the GraphQL errors of each
/// response object only affect their own query.
///
/// Dropping the future of a query doesn't remove it from its batch. It's still sent and its
/// response is discarded. Uploads aren't supported by batched requests and are sent as `null`.
#[derive(Clone)]
pub struct MultiOpQueryer {
    max_batch_size: usize,
    batch_interval: Duration,
    queryer: Arc<NetworkQueryer>,
    state: Arc<Mutex<BatchState>>,
}

impl MultiOpQueryer {
    pub fn new<S: Into<String>>(url: S, batch_interval: Duration, max_batch_size: usize) -> Self {
        MultiOpQueryer {
            max_batch_size,
            batch_interval,
            queryer: Arc::new(NetworkQueryer::new(url)),
            state: Arc::new(Mutex::new(BatchState::default())),
        }
    }

    #[inline]
    pub fn url(&self) -> &str {
        self.queryer.url()
    }

    #[inline]
    pub fn batch_interval(&self) -> Duration {
        self.batch_interval
    }

    #[inline]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    fn schedule(&self, batch_id: u64) {
        let state = self.state.clone();
        let queryer = self.queryer.clone();
        let interval = self.batch_interval;
        tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            let batch = {
                let mut state = state.lock();
                if state.batch_id == batch_id && !state.pending.is_empty() {
                    Some(state.close())
                } else {
                    None
                }
            };
            if let Some(batch) = batch {
                dispatch(&queryer, batch).await;
            }
        });
    }
}

#[async_trait]
impl Queryer for MultiOpQueryer {
    async fn execute(&self, input: &QueryInput) -> Result<JSMap> {
        let (sender, receiver) = oneshot::channel();

        let full_batch = {
            let mut state = self.state.lock();
            state.pending.push(BatchedOperation {
                input: input.clone(),
                sender,
            });
            if self.max_batch_size > 0 && state.pending.len() >= self.max_batch_size {
                Some(state.close())
            } else {
                if state.pending.len() == 1 {
                    trace!(batch_id = state.batch_id, "opened batch");
                    self.schedule(state.batch_id);
                }
                None
            }
        };

        if let Some(batch) = full_batch {
            let queryer = self.queryer.clone();
            tokio::spawn(async move { dispatch(&queryer, batch).await });
        }

        receiver
            .await
            .map_err(|_| Error::transport("batch was dropped before its response was delivered"))?
    }

    fn with_middlewares(mut self, middlewares: Vec<Middleware>) -> Self {
        self.queryer = Arc::new((*self.queryer).clone().with_middlewares(middlewares));
        self
    }

    fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.queryer = Arc::new((*self.queryer).clone().with_http_client(client));
        self
    }
}

async fn send_batch(queryer: &NetworkQueryer, inputs: &[QueryInput]) -> Result<Vec<JSMap>> {
    let payload = serde_json::to_vec(inputs)?;
    let body = queryer.send_query(payload).await?;
    parse_response(&body)
}

async fn dispatch(queryer: &NetworkQueryer, batch: Vec<BatchedOperation>) {
    debug!(operations = batch.len(), "sending batch");
    let (inputs, senders): (Vec<_>, Vec<_>) = batch
        .into_iter()
        .map(|operation| (operation.input, operation.sender))
        .unzip();

    match send_batch(queryer, &inputs).await {
        Ok(results) => {
            let mut results = results.into_iter();
            for sender in senders {
                let result = results.next().ok_or_else(|| {
                    Error::protocol("batch response did not contain a result for every operation")
                });
                if sender.send(result).is_err() {
                    trace!("caller went away before its result was delivered");
                }
            }
        }
        Err(error) => {
            for sender in senders {
                if sender.send(Err(error.clone())).is_err() {
                    trace!("caller went away before its result was delivered");
                }
            }
        }
    }
}

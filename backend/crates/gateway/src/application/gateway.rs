//! Request Gateway
//!
//! Single choke point for one shop's outbound GraphQL traffic. Operations are
//! queued FIFO and drained by one background task that enforces the request
//! ceiling, backs off on throttle signals and retries transient failures.
//!
//! ## Guarantees
//! - At most one drain task per gateway (`is_processing` guard)
//! - Retried requests go back to the front of the queue
//! - Every submitted request is resolved exactly once; the completion is a
//!   `oneshot::Sender`, consumed on use
//! - At most `max_retries + 1` delivery attempts per request

use platform::rate_limit::RateWindow;
use serde::Serialize;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::time::{self, Instant};

use crate::application::config::GatewayConfig;
use crate::domain::operation::{GraphqlOperation, RawResponse};
use crate::domain::throttle::{Outcome, classify};
use crate::domain::transport::GraphqlTransport;
use crate::error::{GatewayError, GatewayResult};

/// Read-only snapshot of a gateway's queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    pub queue_length: usize,
    pub is_processing: bool,
    pub request_count: u32,
}

/// A pending unit of work
struct QueuedRequest {
    operation: GraphqlOperation,
    retry_count: u32,
    completion: oneshot::Sender<GatewayResult<RawResponse>>,
}

impl QueuedRequest {
    fn resolve(self, result: GatewayResult<RawResponse>) {
        // The caller may have stopped waiting; nothing to do then.
        let _ = self.completion.send(result);
    }
}

struct GatewayState {
    queue: VecDeque<QueuedRequest>,
    is_processing: bool,
    window: RateWindow,
}

struct Inner<T> {
    name: String,
    transport: T,
    config: GatewayConfig,
    state: Mutex<GatewayState>,
}

impl<T> Inner<T> {
    fn lock_state(&self) -> MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Rate-limited, retrying request queue in front of a [`GraphqlTransport`]
pub struct RequestGateway<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RequestGateway<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> RequestGateway<T>
where
    T: GraphqlTransport + Send + Sync + 'static,
{
    /// Create a gateway; `name` is used in log events (usually the shop)
    pub fn new(name: impl Into<String>, transport: T, config: GatewayConfig) -> Self {
        let window = RateWindow::new(config.rate_limit, Instant::now());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                transport,
                config,
                state: Mutex::new(GatewayState {
                    queue: VecDeque::new(),
                    is_processing: false,
                    window,
                }),
            }),
        }
    }

    /// Queue an operation and wait for its terminal result
    ///
    /// The operation is enqueued when this is called, not when the returned
    /// future is first polled, so call order is queue order. Must be called
    /// from within a Tokio runtime.
    pub fn submit(
        &self,
        operation: GraphqlOperation,
    ) -> impl Future<Output = GatewayResult<RawResponse>> + Send + 'static {
        let (completion, receiver) = oneshot::channel();

        let start_drain = {
            let mut state = self.inner.lock_state();
            state.queue.push_back(QueuedRequest {
                operation,
                retry_count: 0,
                completion,
            });
            !std::mem::replace(&mut state.is_processing, true)
        };

        if start_drain {
            tracing::debug!(gateway = %self.inner.name, "Starting drain loop");
            tokio::spawn(drain(self.inner.clone()));
        }

        async move { receiver.await.unwrap_or(Err(GatewayError::Closed)) }
    }

    pub fn queue_status(&self) -> QueueStatus {
        let state = self.inner.lock_state();
        QueueStatus {
            queue_length: state.queue.len(),
            is_processing: state.is_processing,
            request_count: state.window.request_count(),
        }
    }

    /// Nothing queued or in flight, no handle held outside the registry and
    /// no request counted in the current window
    ///
    /// Only such a gateway can be dropped without a replacement exceeding
    /// the shop's ceiling.
    pub(crate) fn is_idle(&self) -> bool {
        if Arc::strong_count(&self.inner) > 1 {
            return false;
        }
        let mut state = self.inner.lock_state();
        state.window.roll(Instant::now());
        state.queue.is_empty() && !state.is_processing && state.window.request_count() == 0
    }

    /// Reject every queued request with [`GatewayError::QueueCleared`]
    ///
    /// A request already in flight is not affected. Returns how many were
    /// rejected.
    pub fn clear_queue(&self) -> usize {
        let cleared: Vec<QueuedRequest> = self.inner.lock_state().queue.drain(..).collect();
        let count = cleared.len();

        for request in cleared {
            request.resolve(Err(GatewayError::QueueCleared));
        }

        if count > 0 {
            tracing::warn!(gateway = %self.inner.name, cleared = count, "Request queue cleared");
        }
        count
    }
}

/// Drain loop; exits when the queue is empty
async fn drain<T>(inner: Arc<Inner<T>>)
where
    T: GraphqlTransport + Send + Sync + 'static,
{
    let config = inner.config;

    loop {
        let window_wait = {
            let mut state = inner.lock_state();
            if state.queue.is_empty() {
                state.is_processing = false;
                tracing::debug!(gateway = %inner.name, "Queue drained");
                return;
            }

            let now = Instant::now();
            state.window.roll(now);
            state
                .window
                .is_exhausted()
                .then(|| state.window.remaining_wait(now))
        };

        if let Some(wait) = window_wait {
            tracing::debug!(
                gateway = %inner.name,
                wait_ms = wait.as_millis() as u64,
                "Request ceiling reached, waiting for next window"
            );
            time::sleep(wait).await;
            inner.lock_state().window.reset(Instant::now());
        }

        let next = inner.lock_state().queue.pop_front();
        let Some(mut request) = next else {
            continue;
        };

        let result = inner.transport.execute(&request.operation).await;

        match classify(result) {
            Outcome::Delivered(response) => {
                inner.lock_state().window.record(Instant::now());
                request.resolve(Ok(response));
            }
            Outcome::Throttled => {
                if config.retry.can_retry(request.retry_count) {
                    request.retry_count += 1;
                    let delay = config.retry.delay_for(request.retry_count);
                    tracing::warn!(
                        gateway = %inner.name,
                        retry_count = request.retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "Upstream throttled request, backing off"
                    );
                    time::sleep(delay).await;

                    let mut state = inner.lock_state();
                    state.window.reset(Instant::now());
                    state.queue.push_front(request);
                } else {
                    let attempts = request.retry_count + 1;
                    tracing::error!(
                        gateway = %inner.name,
                        attempts,
                        max_attempts = config.retry.max_attempts(),
                        "Rate limit exceeded after maximum retries"
                    );
                    request.resolve(Err(GatewayError::RateLimitExceeded { attempts }));
                }
            }
            Outcome::Failed(error) => {
                inner.lock_state().window.record(Instant::now());

                if config.retry.can_retry(request.retry_count) {
                    request.retry_count += 1;
                    tracing::warn!(
                        gateway = %inner.name,
                        retry_count = request.retry_count,
                        error = %error,
                        "Request failed, retrying"
                    );
                    inner.lock_state().queue.push_front(request);
                    time::sleep(config.retry.base_delay).await;
                    continue;
                }

                let attempts = request.retry_count + 1;
                tracing::error!(
                    gateway = %inner.name,
                    attempts,
                    max_attempts = config.retry.max_attempts(),
                    error = %error,
                    "Request failed after maximum retries"
                );
                request.resolve(Err(GatewayError::Transport {
                    attempts,
                    source: error,
                }));
            }
        }

        if !config.request_gap.is_zero() {
            time::sleep(config.request_gap).await;
        }
    }
}

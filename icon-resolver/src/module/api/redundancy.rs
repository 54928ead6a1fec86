///! Host redundancy for API queries
///!
///! A query is sent to one host at a time. If that host does not answer within
///! `rotate` ms the next host is raced against it, so a dead host costs about
///! `rotate` ms instead of a full `timeout`. Soft failures are retried on the
///! same host up to `limit` times, hard failures end the session at once.
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::config::ProviderConfig;
use crate::error::QueryError;

/// Classified result of a single transport call
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    /// Usable payload
    Success(T),
    /// Timeout or transient error, eligible for retry
    Soft(String),
    /// Authoritative "does not exist", never retried
    Hard(String),
}

/// Per-call options for a redundant query
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    /// Start from a random host instead of the preferred one
    pub shuffle: bool,
}

/// Successful query together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySuccess<T> {
    pub data: T,
    /// Host that answered
    pub host: String,
    /// Index of that host in the configured list
    pub host_index: usize,
    /// Attempts launched during the session, including abandoned ones
    pub attempts: usize,
}

/// Redundancy state of one provider
///
/// Holds the immutable config plus the index of the host that answered last.
#[derive(Debug)]
pub struct Redundancy {
    provider: String,
    config: Arc<ProviderConfig>,
    preferred: AtomicUsize,
}

impl Redundancy {
    pub fn new(provider: impl Into<String>, config: ProviderConfig) -> Self {
        let preferred = AtomicUsize::new(config.start_index());
        Self {
            provider: provider.into(),
            config: Arc::new(config),
            preferred,
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn config(&self) -> &Arc<ProviderConfig> {
        &self.config
    }

    /// Index of the host the next session starts with
    pub fn preferred_index(&self) -> usize {
        self.preferred.load(Ordering::Acquire) % self.config.resources.len()
    }

    /// Host indexes in the order a session visits them
    pub fn traversal_order(&self, shuffle: bool) -> Vec<usize> {
        let len = self.config.resources.len();
        let start = if shuffle {
            rand::thread_rng().gen_range(0..len)
        } else {
            self.preferred_index()
        };
        (0..len).map(|offset| (start + offset) % len).collect()
    }

    fn record_success(&self, host_index: usize) {
        let previous = self.preferred.swap(host_index, Ordering::AcqRel);
        if previous != host_index {
            debug!(
                "Provider '{}' now prefers host {} ({})",
                self.provider, host_index, self.config.resources[host_index]
            );
        }
    }

    /// Run `query_fn` against the provider's hosts until one answers
    ///
    /// `query_fn(host, cancel)` performs one transport call. The token is
    /// cancelled once the session is decided; the call is also aborted.
    pub async fn query<T, F, Fut>(&self, query_fn: F) -> Result<QuerySuccess<T>, QueryError>
    where
        T: Send + 'static,
        F: Fn(String, CancellationToken) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>> + Send + 'static,
    {
        self.query_with(QueryOptions::default(), query_fn).await
    }

    pub async fn query_with<T, F, Fut>(
        &self,
        options: QueryOptions,
        query_fn: F,
    ) -> Result<QuerySuccess<T>, QueryError>
    where
        T: Send + 'static,
        F: Fn(String, CancellationToken) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>> + Send + 'static,
    {
        let mut session = FetchSession::new(&self.config, self.traversal_order(options.shuffle));
        let result = session.run(&query_fn).await;

        match &result {
            Ok(success) => self.record_success(success.host_index),
            Err(e) => debug!("Query for provider '{}' failed: {}", self.provider, e),
        }
        result
    }
}

/// State of one logical query across the host list
///
/// Dropping the session aborts every attempt still in flight.
struct FetchSession<'a, T> {
    config: &'a ProviderConfig,
    /// Host indexes in visiting order
    order: Vec<usize>,
    /// Attempts left per position in `order`
    remaining: Vec<u32>,
    /// Next position in `order` that has not been tried yet
    next_host: usize,
    attempts: usize,
    cancel: CancellationToken,
    tasks: JoinSet<(usize, AttemptOutcome<T>)>,
    next_rotation: Instant,
}

impl<'a, T: Send + 'static> FetchSession<'a, T> {
    fn new(config: &'a ProviderConfig, order: Vec<usize>) -> Self {
        let remaining = vec![config.limit.max(1); order.len()];
        Self {
            config,
            order,
            remaining,
            next_host: 0,
            attempts: 0,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            next_rotation: Instant::now(),
        }
    }

    fn host(&self, position: usize) -> &str {
        &self.config.resources[self.order[position]]
    }

    fn launch<F, Fut>(&mut self, position: usize, query_fn: &F)
    where
        F: Fn(String, CancellationToken) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>> + Send + 'static,
    {
        self.remaining[position] -= 1;
        self.attempts += 1;
        if position >= self.next_host {
            self.next_host = position + 1;
        }

        let host = self.host(position).to_string();
        debug!("Attempt {} on {}", self.attempts, host);

        let token = self.cancel.child_token();
        let call = query_fn(host, token.clone());
        let limit = self.config.timeout_duration();
        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => AttemptOutcome::Soft("cancelled".to_string()),
                result = timeout(limit, call) => match result {
                    Ok(outcome) => outcome,
                    Err(_) => AttemptOutcome::Soft(format!("timed out after {:?}", limit)),
                },
            };
            (position, outcome)
        });
        self.next_rotation = Instant::now() + self.config.rotate_duration();
    }

    /// Position to launch after a soft failure on `failed`
    fn next_after_failure(&self, failed: usize) -> Option<usize> {
        if self.remaining[failed] > 0 {
            return Some(failed);
        }
        self.next_untried()
    }

    fn next_untried(&self) -> Option<usize> {
        (self.next_host < self.order.len()).then_some(self.next_host)
    }

    /// Any position with attempts left, untried hosts first
    fn next_candidate(&self) -> Option<usize> {
        self.next_untried()
            .or_else(|| self.remaining.iter().position(|left| *left > 0))
    }

    fn finish(&mut self) {
        self.cancel.cancel();
        self.tasks.abort_all();
    }

    async fn run<F, Fut>(&mut self, query_fn: &F) -> Result<QuerySuccess<T>, QueryError>
    where
        F: Fn(String, CancellationToken) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>> + Send + 'static,
    {
        loop {
            if self.tasks.is_empty() {
                match self.next_candidate() {
                    Some(position) => self.launch(position, query_fn),
                    None => {
                        warn!(
                            "All {} host(s) failed after {} attempts",
                            self.order.len(),
                            self.attempts
                        );
                        return Err(QueryError::Exhausted { attempts: self.attempts });
                    }
                }
            }

            let can_rotate = self.next_untried().is_some();
            tokio::select! {
                joined = self.tasks.join_next() => {
                    let Some(joined) = joined else { continue };
                    let (position, outcome) = match joined {
                        Ok(result) => result,
                        Err(e) => {
                            // Panicked attempt, counts as a soft failure of an unknown host
                            warn!("Attempt task failed: {}", e);
                            continue;
                        }
                    };

                    match outcome {
                        AttemptOutcome::Success(data) => {
                            self.finish();
                            let host_index = self.order[position];
                            return Ok(QuerySuccess {
                                data,
                                host: self.config.resources[host_index].clone(),
                                host_index,
                                attempts: self.attempts,
                            });
                        }
                        AttemptOutcome::Hard(reason) => {
                            self.finish();
                            return Err(QueryError::NotFound {
                                host: self.host(position).to_string(),
                                reason,
                            });
                        }
                        AttemptOutcome::Soft(reason) => {
                            warn!("Soft failure on {}: {}", self.host(position), reason);
                            if let Some(next) = self.next_after_failure(position) {
                                self.launch(next, query_fn);
                            }
                        }
                    }
                }
                _ = sleep_until(self.next_rotation), if can_rotate => {
                    if let Some(next) = self.next_untried() {
                        debug!(
                            "No answer within {}ms, racing next host",
                            self.config.rotate
                        );
                        self.launch(next, query_fn);
                    }
                }
            }
        }
    }
}

impl<T> Drop for FetchSession<'_, T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

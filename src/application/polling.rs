//! Token Polling Cache
//!
//! Keeps the last good token list and refreshes it on a timer, on terminal
//! focus (when stale) and on demand. Every trigger goes through one
//! coordinator, so at most one request is in flight; triggers arriving while
//! it runs join it.

use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::PollingSection;
use crate::domain::Token;
use crate::ports::{MarketDataError, TokenFeed};

/// Freshness and refetch timing
#[derive(Debug, Clone, PartialEq)]
pub struct PollingPolicy {
    /// Data is fresh for this long after a successful fetch
    pub stale_after: Duration,
    /// Unconditional refetch period
    pub refetch_interval: Duration,
    pub refetch_on_focus: bool,
}

impl Default for PollingPolicy {
    fn default() -> Self {
        Self {
            stale_after: Duration::from_secs(30),
            refetch_interval: Duration::from_secs(60),
            refetch_on_focus: true,
        }
    }
}

impl From<&PollingSection> for PollingPolicy {
    fn from(section: &PollingSection) -> Self {
        Self {
            stale_after: Duration::from_secs(section.stale_after_secs),
            refetch_interval: Duration::from_secs(section.refetch_interval_secs),
            refetch_on_focus: section.refetch_on_focus,
        }
    }
}

/// What observers of the cache see
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenSnapshot {
    /// Last good list, upstream order
    pub tokens: Vec<Token>,
    /// No successful fetch yet and one is outstanding
    pub is_loading: bool,
    /// Message of the most recent failed fetch, cleared on success
    pub error: Option<String>,
    /// Wall-clock time of the last success
    pub updated_at: Option<DateTime<Utc>>,
    /// A fetch is in flight
    pub is_refreshing: bool,
}

impl TokenSnapshot {
    pub fn has_data(&self) -> bool {
        self.updated_at.is_some()
    }
}

/// Why a fetch was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    Initial,
    Interval,
    Focus,
    Manual,
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new request was started
    Started,
    /// A request was already in flight; the caller joined it
    Coalesced,
    /// Nothing to do (focus while fresh, or focus refetch disabled)
    Skipped,
}

type InFlight = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
struct Coordinator {
    in_flight: Option<InFlight>,
    fetched_at: Option<Instant>,
}

struct Inner {
    feed: Arc<dyn TokenFeed>,
    policy: PollingPolicy,
    state: watch::Sender<TokenSnapshot>,
    coordinator: Mutex<Coordinator>,
}

/// Polling cache over a `TokenFeed`; cheap to clone
#[derive(Clone)]
pub struct TokenPoller {
    inner: Arc<Inner>,
}

impl TokenPoller {
    pub fn new(feed: Arc<dyn TokenFeed>, policy: PollingPolicy) -> Self {
        let (state, _) = watch::channel(TokenSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                feed,
                policy,
                state,
                coordinator: Mutex::new(Coordinator::default()),
            }),
        }
    }

    pub fn policy(&self) -> &PollingPolicy {
        &self.inner.policy
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn subscribe(&self) -> watch::Receiver<TokenSnapshot> {
        self.inner.state.subscribe()
    }

    /// Start a fetch, or join the one in flight, without waiting for it
    pub async fn trigger(&self, trigger: FetchTrigger) -> FetchOutcome {
        self.request(trigger).await.0
    }

    /// Start or join a fetch and wait until it has been applied
    pub async fn refresh(&self, trigger: FetchTrigger) -> FetchOutcome {
        let (outcome, in_flight) = self.request(trigger).await;
        in_flight.await;
        outcome
    }

    /// Wait for the in-flight fetch, if any
    pub async fn settle(&self) {
        let in_flight = self.inner.coordinator.lock().await.in_flight.clone();
        if let Some(in_flight) = in_flight {
            in_flight.await;
        }
    }

    /// Mark the data stale and fetch immediately
    pub async fn invalidate(&self) -> FetchOutcome {
        self.inner.coordinator.lock().await.fetched_at = None;
        self.trigger(FetchTrigger::Manual).await
    }

    /// Terminal regained focus: refetch only stale data
    pub async fn on_focus(&self) -> FetchOutcome {
        if !self.inner.policy.refetch_on_focus || !self.is_stale().await {
            return FetchOutcome::Skipped;
        }
        self.trigger(FetchTrigger::Focus).await
    }

    pub async fn is_stale(&self) -> bool {
        match self.inner.coordinator.lock().await.fetched_at {
            Some(at) => at.elapsed() >= self.inner.policy.stale_after,
            None => true,
        }
    }

    /// Drive the refetch timer; the first tick is the initial fetch
    pub fn spawn_interval(&self) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(poller.inner.policy.refetch_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut trigger = FetchTrigger::Initial;
            loop {
                interval.tick().await;
                poller.trigger(trigger).await;
                trigger = FetchTrigger::Interval;
            }
        })
    }

    async fn request(&self, trigger: FetchTrigger) -> (FetchOutcome, InFlight) {
        let mut coordinator = self.inner.coordinator.lock().await;

        if let Some(in_flight) = &coordinator.in_flight {
            tracing::debug!("Token fetch in flight, joining ({:?})", trigger);
            return (FetchOutcome::Coalesced, in_flight.clone());
        }

        tracing::debug!("Fetching tokens ({:?})", trigger);
        self.inner.state.send_modify(|s| {
            s.is_refreshing = true;
            s.is_loading = !s.has_data();
        });

        // The task clears `in_flight` under the lock we still hold, so the
        // store below always happens first.
        let handle = tokio::spawn(run_fetch(self.inner.clone()));
        let in_flight: InFlight = async move {
            let _ = handle.await;
        }
        .boxed()
        .shared();

        coordinator.in_flight = Some(in_flight.clone());
        (FetchOutcome::Started, in_flight)
    }
}

async fn run_fetch(inner: Arc<Inner>) {
    let feed = inner.feed.clone();
    let result = tokio::spawn(async move { feed.fetch_tokens().await })
        .await
        .unwrap_or_else(|e| Err(MarketDataError::Network(format!("fetch task failed: {}", e))));

    let mut coordinator = inner.coordinator.lock().await;
    match result {
        Ok(tokens) => {
            tracing::debug!("Token list updated ({} rows)", tokens.len());
            coordinator.fetched_at = Some(Instant::now());
            inner.state.send_modify(|s| {
                s.tokens = tokens;
                s.error = None;
                s.updated_at = Some(Utc::now());
                s.is_loading = false;
                s.is_refreshing = false;
            });
        }
        Err(e) => {
            tracing::warn!("Token fetch failed: {}", e);
            inner.state.send_modify(|s| {
                s.error = Some(e.to_string());
                s.is_loading = false;
                s.is_refreshing = false;
            });
        }
    }
    coordinator.in_flight = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::MockTokenFeed;
    use rust_decimal_macros::dec;

    fn token(id: &str, rank: u32) -> Token {
        Token {
            id: id.to_string(),
            symbol: id[..3].to_string(),
            name: id.to_string(),
            current_price: dec!(1.5),
            market_cap: dec!(1000000),
            market_cap_rank: rank,
            price_change_percentage_24h: Some(dec!(2.1)),
            total_volume: dec!(50000),
            total_supply: None,
            image: format!("https://example.invalid/{}.png", id),
        }
    }

    fn poller(feed: Arc<MockTokenFeed>) -> TokenPoller {
        TokenPoller::new(feed, PollingPolicy::default())
    }

    #[tokio::test]
    async fn test_concurrent_triggers_share_one_request() {
        let feed = Arc::new(MockTokenFeed::gated().with_response(Ok(vec![token("bitcoin", 1)])));
        let poller = poller(feed.clone());

        assert_eq!(poller.trigger(FetchTrigger::Interval).await, FetchOutcome::Started);
        assert_eq!(poller.trigger(FetchTrigger::Manual).await, FetchOutcome::Coalesced);
        assert_eq!(poller.on_focus().await, FetchOutcome::Coalesced);
        assert_eq!(poller.invalidate().await, FetchOutcome::Coalesced);

        let snapshot = poller.snapshot();
        assert!(snapshot.is_loading);
        assert!(snapshot.is_refreshing);

        feed.release(1);
        poller.settle().await;

        assert_eq!(feed.call_count(), 1);
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.tokens.len(), 1);
        assert!(!snapshot.is_loading);
        assert!(!snapshot.is_refreshing);
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_consecutive_fetches_replace_list() {
        let feed = Arc::new(
            MockTokenFeed::new()
                .with_response(Ok(vec![token("bitcoin", 1), token("ethereum", 2)]))
                .with_response(Ok(vec![token("solana", 1)])),
        );
        let poller = poller(feed);

        poller.refresh(FetchTrigger::Initial).await;
        assert_eq!(poller.snapshot().tokens.len(), 2);

        poller.refresh(FetchTrigger::Manual).await;
        let tokens = poller.snapshot().tokens;
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, "solana");
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_previous_list() {
        let feed = Arc::new(
            MockTokenFeed::new()
                .with_response(Ok(vec![token("bitcoin", 1)]))
                .with_response(Err(MarketDataError::FetchFailed { status: 500 }))
                .with_response(Ok(vec![token("ethereum", 1)])),
        );
        let poller = poller(feed);

        poller.refresh(FetchTrigger::Initial).await;
        let first_update = poller.snapshot().updated_at;

        poller.refresh(FetchTrigger::Interval).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.tokens[0].id, "bitcoin");
        assert_eq!(snapshot.error.as_deref(), Some("Failed to fetch token data"));
        assert!(!snapshot.is_refreshing);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.updated_at, first_update);

        poller.refresh(FetchTrigger::Interval).await;
        let snapshot = poller.snapshot();
        assert_eq!(snapshot.tokens[0].id, "ethereum");
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_first_fetch_failure_has_no_data() {
        let feed = Arc::new(MockTokenFeed::new().with_response(Err(MarketDataError::Network("dns".into()))));
        let poller = poller(feed);

        poller.refresh(FetchTrigger::Initial).await;

        let snapshot = poller.snapshot();
        assert!(!snapshot.has_data());
        assert!(!snapshot.is_loading);
        assert!(snapshot.error.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_focus_refetches_only_when_stale() {
        let feed = Arc::new(
            MockTokenFeed::new()
                .with_response(Ok(vec![token("bitcoin", 1)]))
                .with_response(Ok(vec![token("bitcoin", 1)])),
        );
        let poller = poller(feed.clone());

        poller.refresh(FetchTrigger::Initial).await;
        assert!(!poller.is_stale().await);
        assert_eq!(poller.on_focus().await, FetchOutcome::Skipped);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(poller.is_stale().await);
        assert_eq!(poller.on_focus().await, FetchOutcome::Started);
        poller.settle().await;

        assert_eq!(feed.call_count(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fetch_of_fresh_data() {
        let feed = Arc::new(
            MockTokenFeed::new()
                .with_response(Ok(vec![token("bitcoin", 1)]))
                .with_response(Ok(vec![token("ethereum", 1)])),
        );
        let poller = poller(feed.clone());
        poller.refresh(FetchTrigger::Initial).await;

        assert_eq!(poller.invalidate().await, FetchOutcome::Started);
        poller.settle().await;

        assert_eq!(feed.call_count(), 2);
        assert_eq!(poller.snapshot().tokens[0].id, "ethereum");
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_fetches_regardless_of_freshness() {
        let feed = Arc::new(MockTokenFeed::new());
        for _ in 0..3 {
            feed.push_response(Ok(vec![token("bitcoin", 1)]));
        }
        let poller = poller(feed.clone());

        let handle = poller.spawn_interval();
        tokio::time::sleep(Duration::from_secs(125)).await;
        poller.settle().await;
        handle.abort();

        assert_eq!(feed.call_count(), 3);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let feed = Arc::new(MockTokenFeed::new().with_response(Ok(vec![token("bitcoin", 1)])));
        let poller = poller(feed);
        let mut rx = poller.subscribe();

        poller.refresh(FetchTrigger::Initial).await;

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().tokens.len(), 1);
    }
}

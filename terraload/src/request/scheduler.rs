//! Request admission control.
//!
//! The scheduler bounds how many throttled requests are in flight, globally
//! and per server, and decides which waiting requests start first. It is
//! polled, never blocking:
//!
//! 1. Callers submit requests with [`RequestScheduler::request`]. A `None`
//!    return means "try again next tick".
//! 2. Once per tick the owner calls [`RequestScheduler::update`], which
//!    observes settled transports, releases their slots, and starts the most
//!    urgent queued requests that fit.
//! 3. Callers poll their [`RequestHandle`] for the outcome.
//!
//! Unthrottled requests (and every request while throttling is disabled)
//! start immediately and may push the active count past the global limit.
//!
//! # Example
//!
//! ```ignore
//! use terraload::config::SchedulerConfig;
//! use terraload::request::RequestScheduler;
//!
//! let mut scheduler = RequestScheduler::new(SchedulerConfig::default());
//! let mut completed = scheduler.subscribe_completed();
//!
//! let handle = scheduler.request(request);
//! loop {
//!     scheduler.update();
//!     // ... poll handles, render ...
//! }
//! ```

use super::error::{FetchError, FetchResult};
use super::handle::{Request, RequestHandle, RequestType};
use super::queue::PriorityRequestQueue;
use super::server_key::{derive_server_key, is_data_or_blob_uri};
use super::state::RequestState;
use super::stats::RequestStatistics;
use crate::config::SchedulerConfig;
use crate::poll::poll_once;
use futures::future::BoxFuture;
use reqwest::Url;
use std::collections::HashMap;
use tokio::sync::broadcast;

// =============================================================================
// Completion Event
// =============================================================================

/// Emitted once for every request that settles, and once for every data/blob
/// request. Never emitted for cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestCompleted {
    /// URL of the completed request.
    pub url: String,
    /// What the request fetched.
    pub request_type: RequestType,
    /// The transport error, if the request failed.
    pub error: Option<FetchError>,
}

// =============================================================================
// Active Request
// =============================================================================

/// A request holding a slot, plus its in-flight transport.
struct ActiveRequest {
    request: Request,
    transport: BoxFuture<'static, FetchResult>,
}

// =============================================================================
// Request Scheduler
// =============================================================================

/// Bounded-concurrency, priority-ordered admission controller.
pub struct RequestScheduler {
    config: SchedulerConfig,
    base_url: Option<Url>,
    queue: PriorityRequestQueue,
    active: Vec<ActiveRequest>,
    active_by_server: HashMap<String, usize>,
    statistics: RequestStatistics,
    completed: broadcast::Sender<RequestCompleted>,
}

impl RequestScheduler {
    /// Creates a scheduler with no queued or active requests.
    pub fn new(config: SchedulerConfig) -> Self {
        let base_url = match Url::parse(&config.base_url) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(
                    base_url = %config.base_url,
                    error = %err,
                    "Invalid base URL, relative request URLs get an empty server key"
                );
                None
            }
        };
        let (completed, _) = broadcast::channel(config.completed_event_capacity.max(1));

        Self {
            queue: PriorityRequestQueue::new(config.request_queue_length),
            base_url,
            active: Vec::new(),
            active_by_server: HashMap::new(),
            statistics: RequestStatistics::default(),
            completed,
            config,
        }
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// The active configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Sets the global limit on simultaneous throttled requests.
    pub fn set_maximum_requests(&mut self, max_requests: usize) {
        self.config.max_requests = max_requests;
    }

    /// Sets the per-server limit on simultaneous throttled-by-server requests.
    pub fn set_maximum_requests_per_server(&mut self, max_requests_per_server: usize) {
        self.config.max_requests_per_server = max_requests_per_server;
    }

    /// Enables or disables throttling. When disabled every request starts
    /// immediately.
    pub fn set_throttle_requests(&mut self, throttle_requests: bool) {
        self.config.throttle_requests = throttle_requests;
    }

    /// Enables or disables per-tick statistics logging.
    pub fn set_debug_show_statistics(&mut self, debug_show_statistics: bool) {
        self.config.debug_show_statistics = debug_show_statistics;
    }

    /// Capacity of the admission queue.
    pub fn request_queue_length(&self) -> usize {
        self.queue.capacity()
    }

    /// Cancels every queued request and installs an empty queue of `length`.
    pub fn set_request_queue_length(&mut self, length: usize) {
        for mut request in self.queue.drain() {
            self.cancel_request(&mut request);
        }
        self.queue = PriorityRequestQueue::new(length);
        self.config.request_queue_length = length;
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Current counters.
    pub fn statistics(&self) -> &RequestStatistics {
        &self.statistics
    }

    /// Active requests for `server_key`, or `None` if the key was never seen.
    pub fn number_of_active_requests_by_server(&self, server_key: &str) -> Option<usize> {
        self.active_by_server.get(server_key).copied()
    }

    /// Requests holding a slot whose settlement has not been observed yet.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Requests waiting in the admission queue.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Subscribes to completion events.
    pub fn subscribe_completed(&self) -> broadcast::Receiver<RequestCompleted> {
        self.completed.subscribe()
    }

    /// Derives the server key for `url` and registers it with a zero count.
    pub fn server_key(&mut self, url: &str) -> String {
        let key = derive_server_key(url, self.base_url.as_ref());
        self.active_by_server.entry(key.clone()).or_insert(0);
        key
    }

    // -------------------------------------------------------------------------
    // Admission
    // -------------------------------------------------------------------------

    /// Submits a request.
    ///
    /// Returns `None` when the request cannot be admitted now: the global or
    /// per-server limit is saturated, or the queue is full of more urgent
    /// requests. The request is dropped and the caller should build a new one
    /// next tick.
    pub fn request(&mut self, mut request: Request) -> Option<RequestHandle> {
        if is_data_or_blob_uri(request.url()) {
            self.emit_completed(request.url(), request.request_type(), None);
            return Some(request.start_direct());
        }

        self.statistics.number_of_attempted_requests += 1;

        match request.server_key() {
            Some(key) => {
                self.active_by_server.entry(key.to_string()).or_insert(0);
            }
            None => {
                let key = self.server_key(request.url());
                request.set_server_key(key);
            }
        }

        if !self.config.throttle_requests || !request.throttle() {
            return Some(self.start_request(request));
        }

        if self.active.len() >= self.config.max_requests {
            tracing::trace!(url = %request.url(), "Active requests saturated");
            return None;
        }

        if request.throttle_by_server() && !self.server_has_open_slots(request.server_key()) {
            tracing::trace!(url = %request.url(), "Server saturated");
            return None;
        }

        request.update_priority();
        let handle = request.issue();
        if let Some(mut removed) = self.queue.insert(request) {
            if removed.is_handled_by(&handle) {
                return None;
            }
            tracing::debug!(url = %removed.url(), "Request bumped from queue");
            self.cancel_request(&mut removed);
        }
        Some(handle)
    }

    /// Runs one scheduling tick.
    ///
    /// Sweeps active requests (cancelling flagged ones before observing their
    /// transport), re-sorts the queue by fresh priorities, then starts queued
    /// requests into the open slots. Queued requests that are flagged, or whose
    /// server is saturated, are cancelled rather than kept for later.
    pub fn update(&mut self) {
        let active = std::mem::take(&mut self.active);
        for mut entry in active {
            if entry.request.is_cancel_requested() {
                self.cancel_request(&mut entry.request);
                continue;
            }
            if entry.request.state() != RequestState::Active {
                continue;
            }
            match poll_once(&mut entry.transport) {
                Some(result) => self.settle(entry.request, result),
                None => self.active.push(entry),
            }
        }

        for request in self.queue.iter_mut() {
            request.update_priority();
        }
        self.queue.sort();

        let open_slots = self.config.max_requests.saturating_sub(self.active.len());
        let mut filled_slots = 0;
        while filled_slots < open_slots {
            let Some(mut request) = self.queue.pop_front() else {
                break;
            };
            if request.is_cancel_requested() {
                self.cancel_request(&mut request);
                continue;
            }
            if request.throttle_by_server() && !self.server_has_open_slots(request.server_key()) {
                self.cancel_request(&mut request);
                continue;
            }
            self.start_request(request);
            filled_slots += 1;
        }

        self.update_statistics();
    }

    /// Cancels every queued and active request and zeroes all counters.
    pub fn reset(&mut self) {
        for mut request in self.queue.drain() {
            self.cancel_request(&mut request);
        }
        for mut entry in std::mem::take(&mut self.active) {
            self.cancel_request(&mut entry.request);
        }
        self.active_by_server.clear();
        self.statistics = RequestStatistics::default();
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn server_has_open_slots(&self, server_key: Option<&str>) -> bool {
        let active = server_key
            .and_then(|key| self.active_by_server.get(key))
            .copied()
            .unwrap_or_default();
        active < self.config.max_requests_per_server
    }

    fn start_request(&mut self, mut request: Request) -> RequestHandle {
        let handle = request.issue();
        let transport = request.activate();

        self.statistics.number_of_active_requests += 1;
        self.statistics.number_of_active_requests_ever += 1;
        if let Some(key) = request.server_key() {
            *self.active_by_server.entry(key.to_string()).or_insert(0) += 1;
        }

        tracing::debug!(
            url = %request.url(),
            request_type = %request.request_type(),
            priority = request.priority(),
            "Request started"
        );
        self.active.push(ActiveRequest { request, transport });
        handle
    }

    fn release_slot(&mut self, request: &Request) {
        self.statistics.number_of_active_requests =
            self.statistics.number_of_active_requests.saturating_sub(1);
        if let Some(count) = request
            .server_key()
            .and_then(|key| self.active_by_server.get_mut(key))
        {
            *count = count.saturating_sub(1);
        }
    }

    fn settle(&mut self, request: Request, result: FetchResult) {
        let error = result.as_ref().err().cloned();
        if !request.settle(result) {
            return;
        }

        if let Some(err) = &error {
            self.statistics.number_of_failed_requests += 1;
            tracing::warn!(url = %request.url(), error = %err, "Request failed");
        } else {
            tracing::debug!(url = %request.url(), "Request received");
        }
        self.release_slot(&request);
        self.statistics.record_completed(request.request_type());
        self.emit_completed(request.url(), request.request_type(), error);
    }

    fn cancel_request(&mut self, request: &mut Request) {
        let previous = request.mark_cancelled();
        self.statistics.number_of_cancelled_requests += 1;

        if previous == RequestState::Active {
            self.release_slot(request);
            self.statistics.number_of_cancelled_active_requests += 1;
        }
        tracing::debug!(url = %request.url(), previous = %previous, "Request cancelled");
    }

    fn emit_completed(&self, url: &str, request_type: RequestType, error: Option<FetchError>) {
        // No receivers is fine.
        let _ = self.completed.send(RequestCompleted {
            url: url.to_string(),
            request_type,
            error,
        });
    }

    fn update_statistics(&mut self) {
        if !self.config.debug_show_statistics {
            return;
        }
        self.statistics.log();
        self.statistics.clear_interval();
    }
}

impl Default for RequestScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl std::fmt::Debug for RequestScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScheduler")
            .field("config", &self.config)
            .field("queued", &self.queue.len())
            .field("active", &self.active.len())
            .field("statistics", &self.statistics)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestStatus;
    use bytes::Bytes;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn scheduler() -> RequestScheduler {
        RequestScheduler::new(SchedulerConfig::default())
    }

    fn ready_request(url: &str) -> Request {
        Request::new(url, || async { Ok(Bytes::from_static(b"ok")) }.boxed())
    }

    fn pending_request(url: &str) -> (Request, oneshot::Sender<FetchResult>) {
        let (tx, rx) = oneshot::channel();
        let request = Request::new(url, move || {
            rx.map(|r| r.unwrap_or(Err(FetchError::Aborted))).boxed()
        });
        (request, tx)
    }

    #[test]
    fn test_unthrottled_request_starts_immediately() {
        let mut scheduler = scheduler();
        let handle = scheduler.request(ready_request("http://a.com/1")).unwrap();

        assert_eq!(handle.state(), RequestState::Active);
        assert_eq!(scheduler.active_len(), 1);
        assert_eq!(scheduler.statistics().number_of_active_requests, 1);
        assert_eq!(scheduler.number_of_active_requests_by_server("a.com:80"), Some(1));
    }

    #[test]
    fn test_update_observes_settlement() {
        let mut scheduler = scheduler();
        let mut events = scheduler.subscribe_completed();
        let handle = scheduler.request(ready_request("http://a.com/1")).unwrap();

        scheduler.update();

        assert_eq!(handle.state(), RequestState::Received);
        assert_eq!(handle.poll(), RequestStatus::Received(Bytes::from_static(b"ok")));
        assert_eq!(scheduler.active_len(), 0);
        assert_eq!(scheduler.statistics().number_of_active_requests, 0);
        assert_eq!(scheduler.number_of_active_requests_by_server("a.com:80"), Some(0));

        let event = events.try_recv().unwrap();
        assert_eq!(event.url, "http://a.com/1");
        assert!(event.error.is_none());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_failed_request_counts_and_emits_error() {
        let mut scheduler = scheduler();
        let mut events = scheduler.subscribe_completed();
        let request = Request::new("http://a.com/1", || {
            async { Err(FetchError::Http { status: 503 }) }.boxed()
        });
        let handle = scheduler.request(request).unwrap();

        scheduler.update();

        assert_eq!(handle.state(), RequestState::Failed);
        assert_eq!(scheduler.statistics().number_of_failed_requests, 1);
        assert_eq!(
            events.try_recv().unwrap().error,
            Some(FetchError::Http { status: 503 })
        );
    }

    #[test]
    fn test_throttled_request_is_queued_then_started() {
        let mut scheduler = scheduler();
        let (request, _tx) = pending_request("http://a.com/1");
        let handle = scheduler.request(request.with_throttle(true)).unwrap();

        assert_eq!(handle.state(), RequestState::Issued);
        assert_eq!(scheduler.queued_len(), 1);

        scheduler.update();
        assert_eq!(handle.state(), RequestState::Active);
        assert_eq!(scheduler.queued_len(), 0);
        assert_eq!(scheduler.active_len(), 1);
    }

    #[test]
    fn test_rejects_when_active_saturated() {
        let mut scheduler =
            RequestScheduler::new(SchedulerConfig::default().with_max_requests(1));
        let (first, _tx1) = pending_request("http://a.com/1");
        scheduler.request(first.with_throttle(true)).unwrap();
        scheduler.update();

        let (second, _tx2) = pending_request("http://b.com/2");
        assert!(scheduler.request(second.with_throttle(true)).is_none());
        assert_eq!(scheduler.statistics().number_of_attempted_requests, 2);
    }

    #[test]
    fn test_rejects_when_server_saturated() {
        let mut scheduler =
            RequestScheduler::new(SchedulerConfig::default().with_max_requests_per_server(1));
        let (first, _tx1) = pending_request("http://a.com/1");
        scheduler
            .request(first.with_throttle(true).with_throttle_by_server(true))
            .unwrap();
        scheduler.update();

        let (second, _tx2) = pending_request("http://a.com/2");
        assert!(scheduler
            .request(second.with_throttle(true).with_throttle_by_server(true))
            .is_none());

        let (other, _tx3) = pending_request("http://b.com/2");
        assert!(scheduler
            .request(other.with_throttle(true).with_throttle_by_server(true))
            .is_some());
    }

    #[test]
    fn test_queue_eviction_cancels_worse_request() {
        let mut scheduler =
            RequestScheduler::new(SchedulerConfig::default().with_request_queue_length(1));
        let far = scheduler
            .request(ready_request("http://a.com/far").with_throttle(true).with_priority(9.0))
            .unwrap();
        let near = scheduler
            .request(ready_request("http://a.com/near").with_throttle(true).with_priority(1.0))
            .unwrap();

        assert_eq!(far.state(), RequestState::Cancelled);
        assert_eq!(near.state(), RequestState::Issued);
        assert_eq!(scheduler.statistics().number_of_cancelled_requests, 1);

        let worse = ready_request("http://a.com/worse")
            .with_throttle(true)
            .with_priority(5.0);
        assert!(scheduler.request(worse).is_none());
        assert_eq!(scheduler.queued_len(), 1);
    }

    #[test]
    fn test_cancel_queued_request_never_activates() {
        let mut scheduler = scheduler();
        let handle = scheduler
            .request(ready_request("http://a.com/1").with_throttle(true))
            .unwrap();
        handle.cancel();

        scheduler.update();

        assert_eq!(handle.state(), RequestState::Cancelled);
        assert_eq!(handle.poll(), RequestStatus::Cancelled);
        assert_eq!(scheduler.active_len(), 0);
        assert_eq!(scheduler.statistics().number_of_active_requests_ever, 0);
    }

    #[test]
    fn test_cancel_active_request_releases_slot_and_runs_cancel_function() {
        let mut scheduler = scheduler();
        let mut events = scheduler.subscribe_completed();
        let aborted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&aborted);
        let (request, tx) = pending_request("http://a.com/1");
        let handle = scheduler
            .request(request.with_cancel_function(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        handle.cancel();
        // The transport settles before the tick observes it; cancellation wins.
        tx.send(Ok(Bytes::from_static(b"late"))).unwrap();
        scheduler.update();

        assert_eq!(handle.poll(), RequestStatus::Cancelled);
        assert_eq!(aborted.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.statistics().number_of_active_requests, 0);
        assert_eq!(scheduler.statistics().number_of_cancelled_active_requests, 1);
        assert_eq!(scheduler.number_of_active_requests_by_server("a.com:80"), Some(0));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_server_busy_in_update_cancels_request() {
        let mut scheduler =
            RequestScheduler::new(SchedulerConfig::default().with_max_requests_per_server(1));
        let first = scheduler
            .request(
                ready_request("http://a.com/1")
                    .with_throttle(true)
                    .with_throttle_by_server(true)
                    .with_priority(1.0),
            )
            .unwrap();
        let second = scheduler
            .request(
                ready_request("http://a.com/2")
                    .with_throttle(true)
                    .with_throttle_by_server(true)
                    .with_priority(2.0),
            )
            .unwrap();

        scheduler.update();

        assert_eq!(first.state(), RequestState::Active);
        assert_eq!(second.state(), RequestState::Cancelled);
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_priority_function_reorders_queue() {
        let mut scheduler =
            RequestScheduler::new(SchedulerConfig::default().with_max_requests(1));
        let urgent = Arc::new(AtomicUsize::new(10));
        let later = Arc::clone(&urgent);

        let a = scheduler
            .request(ready_request("http://a.com/a").with_throttle(true).with_priority(1.0))
            .unwrap();
        let b = scheduler
            .request(
                ready_request("http://b.com/b")
                    .with_throttle(true)
                    .with_priority_function(move || later.load(Ordering::SeqCst) as f64),
            )
            .unwrap();
        urgent.store(0, Ordering::SeqCst);

        scheduler.update();

        assert_eq!(b.state(), RequestState::Active);
        assert_eq!(a.state(), RequestState::Issued);
    }

    #[test]
    fn test_data_uri_bypasses_scheduling() {
        let mut scheduler = scheduler();
        let mut events = scheduler.subscribe_completed();
        let handle = scheduler
            .request(ready_request("data:text/plain,ok").with_throttle(true))
            .unwrap();

        assert_eq!(handle.state(), RequestState::Received);
        assert_eq!(handle.poll(), RequestStatus::Received(Bytes::from_static(b"ok")));
        assert_eq!(scheduler.statistics(), &RequestStatistics::default());
        assert_eq!(scheduler.active_len(), 0);
        assert!(events.try_recv().unwrap().error.is_none());
    }

    #[test]
    fn test_throttling_disabled_ignores_limits() {
        let mut scheduler = RequestScheduler::new(
            SchedulerConfig::default()
                .with_max_requests(1)
                .with_throttle_requests(false),
        );
        for i in 0..3 {
            let (request, _tx) = pending_request(&format!("http://a.com/{i}"));
            assert!(scheduler.request(request.with_throttle(true)).is_some());
        }
        assert_eq!(scheduler.active_len(), 3);
    }

    #[test]
    fn test_set_request_queue_length_cancels_queued() {
        let mut scheduler = scheduler();
        let handle = scheduler
            .request(ready_request("http://a.com/1").with_throttle(true))
            .unwrap();

        scheduler.set_request_queue_length(5);

        assert_eq!(handle.state(), RequestState::Cancelled);
        assert_eq!(scheduler.queued_len(), 0);
        assert_eq!(scheduler.request_queue_length(), 5);
    }

    #[test]
    fn test_reset_cancels_everything_and_zeroes_counters() {
        let mut scheduler = scheduler();
        let (active_request, _tx) = pending_request("http://a.com/1");
        let active = scheduler.request(active_request).unwrap();
        let queued = scheduler
            .request(ready_request("http://a.com/2").with_throttle(true))
            .unwrap();

        scheduler.reset();

        assert_eq!(active.state(), RequestState::Cancelled);
        assert_eq!(queued.state(), RequestState::Cancelled);
        assert_eq!(scheduler.statistics(), &RequestStatistics::default());
        assert_eq!(scheduler.number_of_active_requests_by_server("a.com:80"), None);
        assert_eq!(scheduler.active_len(), 0);
        assert_eq!(scheduler.queued_len(), 0);
    }

    #[test]
    fn test_update_on_empty_scheduler_is_noop() {
        let mut scheduler = scheduler();
        let mut events = scheduler.subscribe_completed();
        scheduler.update();
        scheduler.update();

        assert_eq!(scheduler.statistics(), &RequestStatistics::default());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_debug_statistics_clear_interval_counters() {
        let mut scheduler = scheduler();
        scheduler.set_debug_show_statistics(true);
        let (request, _tx) = pending_request("http://a.com/1");
        scheduler.request(request).unwrap();
        assert_eq!(scheduler.statistics().number_of_attempted_requests, 1);

        scheduler.update();

        assert_eq!(scheduler.statistics().number_of_attempted_requests, 0);
        assert_eq!(scheduler.statistics().number_of_active_requests, 1);
    }

    #[test]
    fn test_server_key_registers_zero_count() {
        let mut scheduler = scheduler();
        assert_eq!(scheduler.server_key("https://example.com/tile.png"), "example.com:443");
        assert_eq!(
            scheduler.number_of_active_requests_by_server("example.com:443"),
            Some(0)
        );
        assert_eq!(scheduler.server_key("tile.png"), "localhost:80");
    }

    #[test]
    fn test_explicit_server_key_is_used() {
        let mut scheduler = scheduler();
        let (request, _tx) = pending_request("http://a.com/1");
        scheduler.request(request.with_server_key("shared:1")).unwrap();
        assert_eq!(scheduler.number_of_active_requests_by_server("shared:1"), Some(1));
    }
}

//! Request descriptions and the handles returned on admission.
//!
//! A [`Request`] describes one fetch: its URL, the function that starts the
//! transport, its priority and how it is throttled. Submitting it to the
//! [`RequestScheduler`](super::RequestScheduler) either rejects it (the caller
//! tries again next tick) or yields a [`RequestHandle`]. The handle shares
//! state with the request and is polled by the caller each tick until it
//! reports a terminal [`RequestStatus`].
//!
//! # Example
//!
//! ```ignore
//! use futures::FutureExt;
//! use terraload::request::{Request, RequestScheduler, RequestStatus};
//!
//! let request = Request::new("https://tiles.example.com/0/0/0.terrain", || {
//!     async { Ok(bytes::Bytes::from_static(b"...")) }.boxed()
//! })
//! .with_throttle(true)
//! .with_priority(2.5);
//!
//! if let Some(handle) = scheduler.request(request) {
//!     // later, once per tick
//!     scheduler.update();
//!     if let RequestStatus::Received(bytes) = handle.poll() {
//!         // decode
//!     }
//! }
//! ```

use super::error::{FetchError, FetchResult};
use super::state::RequestState;
use crate::poll::poll_slot;
use bytes::Bytes;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Starts the transport for a request. Called at most once, on admission.
pub type RequestFunction = Box<dyn FnOnce() -> BoxFuture<'static, FetchResult> + Send>;

/// Aborts an in-flight transport. Called when an active request is cancelled.
pub type CancelFunction = Box<dyn FnOnce() + Send>;

/// Recomputes a request's priority each scheduling tick (lower is more urgent).
pub type PriorityFunction = Box<dyn Fn() -> f64 + Send>;

/// What a request fetches. Used for log fields and completion events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RequestType {
    /// Terrain geometry.
    Terrain,
    /// Imagery tiles.
    Imagery,
    /// Anything else.
    #[default]
    Other,
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terrain => f.write_str("terrain"),
            Self::Imagery => f.write_str("imagery"),
            Self::Other => f.write_str("other"),
        }
    }
}

/// Observable status of a submitted request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestStatus {
    /// Queued, in flight, or a bypass request whose future has not resolved.
    Pending,
    /// The transport resolved with a body.
    Received(Bytes),
    /// The transport resolved with an error.
    Failed(FetchError),
    /// The request was cancelled; no result will ever be reported.
    Cancelled,
}

impl RequestStatus {
    /// Returns true once the status can no longer change.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// State shared between a request (owned by the scheduler) and its handles.
#[derive(Default)]
struct Shared {
    state: RequestState,
    cancel_requested: bool,
    outcome: Option<FetchResult>,
    /// Transport of a data/blob request, polled by the handle itself.
    direct: Option<BoxFuture<'static, FetchResult>>,
}

/// A request waiting to be admitted by the scheduler.
pub struct Request {
    url: String,
    request_type: RequestType,
    request_function: Option<RequestFunction>,
    cancel_function: Option<CancelFunction>,
    priority_function: Option<PriorityFunction>,
    priority: f64,
    throttle: bool,
    throttle_by_server: bool,
    server_key: Option<String>,
    shared: Arc<Mutex<Shared>>,
}

impl Request {
    /// Creates an unthrottled request with priority 0.
    ///
    /// Unthrottled requests bypass every limit. Call
    /// [`with_throttle`](Self::with_throttle) and/or
    /// [`with_throttle_by_server`](Self::with_throttle_by_server) to make the
    /// request compete for slots.
    pub fn new<F>(url: impl Into<String>, request_function: F) -> Self
    where
        F: FnOnce() -> BoxFuture<'static, FetchResult> + Send + 'static,
    {
        Self {
            url: url.into(),
            request_type: RequestType::default(),
            request_function: Some(Box::new(request_function)),
            cancel_function: None,
            priority_function: None,
            priority: 0.0,
            throttle: false,
            throttle_by_server: false,
            server_key: None,
            shared: Arc::new(Mutex::new(Shared::default())),
        }
    }

    /// Sets the initial priority (lower is more urgent).
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets a function that recomputes the priority every tick.
    pub fn with_priority_function<F>(mut self, priority_function: F) -> Self
    where
        F: Fn() -> f64 + Send + 'static,
    {
        self.priority_function = Some(Box::new(priority_function));
        self
    }

    /// Sets the function that aborts the transport when an active request is cancelled.
    pub fn with_cancel_function<F>(mut self, cancel_function: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel_function = Some(Box::new(cancel_function));
        self
    }

    /// Whether the request competes for global slots.
    pub fn with_throttle(mut self, throttle: bool) -> Self {
        self.throttle = throttle;
        self
    }

    /// Whether the request also competes for per-server slots.
    pub fn with_throttle_by_server(mut self, throttle_by_server: bool) -> Self {
        self.throttle_by_server = throttle_by_server;
        self
    }

    /// Overrides the server key instead of deriving it from the URL.
    pub fn with_server_key(mut self, server_key: impl Into<String>) -> Self {
        self.server_key = Some(server_key.into());
        self
    }

    /// Tags the request with what it fetches.
    pub fn with_request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = request_type;
        self
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// What the request fetches.
    pub fn request_type(&self) -> RequestType {
        self.request_type
    }

    /// The current priority value.
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Whether the request competes for global slots.
    pub fn throttle(&self) -> bool {
        self.throttle
    }

    /// Whether the request competes for per-server slots.
    pub fn throttle_by_server(&self) -> bool {
        self.throttle_by_server
    }

    /// The server key, if assigned.
    pub fn server_key(&self) -> Option<&str> {
        self.server_key.as_deref()
    }

    /// The current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.shared.lock().state
    }

    /// Flags the request for cancellation at the next scheduler tick.
    pub fn cancel(&self) {
        self.shared.lock().cancel_requested = true;
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.shared.lock().cancel_requested
    }

    /// Returns a handle sharing this request's state.
    pub fn handle(&self) -> RequestHandle {
        RequestHandle {
            url: Arc::from(self.url.as_str()),
            shared: Arc::clone(&self.shared),
        }
    }

    pub(crate) fn set_server_key(&mut self, server_key: String) {
        self.server_key = Some(server_key);
    }

    pub(crate) fn update_priority(&mut self) {
        if let Some(priority_function) = &self.priority_function {
            self.priority = priority_function();
        }
    }

    /// Moves `Unissued` to `Issued` and returns a handle.
    pub(crate) fn issue(&mut self) -> RequestHandle {
        {
            let mut shared = self.shared.lock();
            if shared.state == RequestState::Unissued {
                shared.state = RequestState::Issued;
            }
        }
        self.handle()
    }

    /// Marks the request active and hands out its transport future.
    pub(crate) fn activate(&mut self) -> BoxFuture<'static, FetchResult> {
        self.shared.lock().state = RequestState::Active;
        self.take_transport()
    }

    /// Bypasses scheduling: the request is `Received` immediately and the
    /// handle polls the transport itself.
    pub(crate) fn start_direct(&mut self) -> RequestHandle {
        let transport = self.take_transport();
        {
            let mut shared = self.shared.lock();
            shared.state = RequestState::Received;
            shared.direct = Some(transport);
        }
        self.handle()
    }

    /// Returns true if `handle` was issued for this request.
    pub(crate) fn is_handled_by(&self, handle: &RequestHandle) -> bool {
        Arc::ptr_eq(&self.shared, &handle.shared)
    }

    fn take_transport(&mut self) -> BoxFuture<'static, FetchResult> {
        match self.request_function.take() {
            Some(request_function) => request_function(),
            None => Box::pin(futures::future::ready(Err(FetchError::Transport(
                "request function already consumed".to_string(),
            )))),
        }
    }

    /// Records the transport result. Returns false (and discards the result)
    /// if the request was cancelled first.
    pub(crate) fn settle(&self, result: FetchResult) -> bool {
        let mut shared = self.shared.lock();
        if shared.state == RequestState::Cancelled {
            return false;
        }
        shared.state = if result.is_ok() {
            RequestState::Received
        } else {
            RequestState::Failed
        };
        shared.outcome = Some(result);
        true
    }

    /// Marks the request cancelled and runs its cancel function.
    ///
    /// Returns the state the request was in before cancellation.
    pub(crate) fn mark_cancelled(&mut self) -> RequestState {
        let previous = {
            let mut shared = self.shared.lock();
            let previous = shared.state;
            shared.state = RequestState::Cancelled;
            shared.outcome = None;
            shared.direct = None;
            previous
        };
        if let Some(cancel_function) = self.cancel_function.take() {
            cancel_function();
        }
        previous
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url)
            .field("request_type", &self.request_type)
            .field("priority", &self.priority)
            .field("throttle", &self.throttle)
            .field("throttle_by_server", &self.throttle_by_server)
            .field("server_key", &self.server_key)
            .field("state", &self.state())
            .finish()
    }
}

/// Caller-side view of a submitted request.
#[derive(Clone)]
pub struct RequestHandle {
    url: Arc<str>,
    shared: Arc<Mutex<Shared>>,
}

impl RequestHandle {
    /// The request URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The current lifecycle state.
    pub fn state(&self) -> RequestState {
        self.shared.lock().state
    }

    /// Flags the request for cancellation at the next scheduler tick.
    ///
    /// Has no effect once the request has settled.
    pub fn cancel(&self) {
        self.shared.lock().cancel_requested = true;
    }

    /// Returns true if cancellation was requested.
    pub fn is_cancel_requested(&self) -> bool {
        self.shared.lock().cancel_requested
    }

    /// Reports the current status without blocking.
    pub fn poll(&self) -> RequestStatus {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        if let Some(result) = poll_slot(&mut shared.direct) {
            shared.outcome = Some(result);
        }
        match shared.state {
            RequestState::Cancelled => RequestStatus::Cancelled,
            RequestState::Received | RequestState::Failed => match &shared.outcome {
                Some(Ok(bytes)) => RequestStatus::Received(bytes.clone()),
                Some(Err(err)) => RequestStatus::Failed(err.clone()),
                None => RequestStatus::Pending,
            },
            _ => RequestStatus::Pending,
        }
    }
}

impl fmt::Debug for RequestHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandle")
            .field("url", &self.url)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn ok_request(url: &str) -> Request {
        Request::new(url, || async { Ok(Bytes::from_static(b"tile")) }.boxed())
    }

    #[test]
    fn test_defaults() {
        let request = ok_request("http://example.com/a");
        assert_eq!(request.state(), RequestState::Unissued);
        assert_eq!(request.priority(), 0.0);
        assert!(!request.throttle());
        assert!(!request.throttle_by_server());
        assert_eq!(request.server_key(), None);
        assert_eq!(request.request_type(), RequestType::Other);
    }

    #[test]
    fn test_priority_function_updates_priority() {
        let mut request = ok_request("http://example.com/a").with_priority_function(|| 3.5);
        assert_eq!(request.priority(), 0.0);
        request.update_priority();
        assert_eq!(request.priority(), 3.5);
    }

    #[test]
    fn test_issue_only_moves_unissued() {
        let mut request = ok_request("http://example.com/a");
        let handle = request.issue();
        assert_eq!(handle.state(), RequestState::Issued);

        let _transport = request.activate();
        let _ = request.issue();
        assert_eq!(request.state(), RequestState::Active);
    }

    #[test]
    fn test_settle_after_cancel_is_discarded() {
        let mut request = ok_request("http://example.com/a");
        let handle = request.issue();
        let _ = request.activate();
        request.mark_cancelled();

        assert!(!request.settle(Ok(Bytes::from_static(b"late"))));
        assert_eq!(handle.poll(), RequestStatus::Cancelled);
    }

    #[test]
    fn test_settle_records_outcome() {
        let mut request = ok_request("http://example.com/a");
        let handle = request.issue();
        let _ = request.activate();

        assert_eq!(handle.poll(), RequestStatus::Pending);
        assert!(request.settle(Err(FetchError::Http { status: 500 })));
        assert_eq!(handle.state(), RequestState::Failed);
        assert_eq!(
            handle.poll(),
            RequestStatus::Failed(FetchError::Http { status: 500 })
        );
    }

    #[test]
    fn test_cancel_function_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut request = ok_request("http://example.com/a").with_cancel_function(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        request.mark_cancelled();
        request.mark_cancelled();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_direct_start_polls_future_from_handle() {
        let mut request = ok_request("data:application/octet-stream;base64,AA==");
        let handle = request.start_direct();
        assert_eq!(handle.state(), RequestState::Received);
        assert_eq!(
            handle.poll(),
            RequestStatus::Received(Bytes::from_static(b"tile"))
        );
    }

    #[test]
    fn test_handle_cancel_sets_flag() {
        let request = ok_request("http://example.com/a");
        let handle = request.handle();
        assert!(!request.is_cancel_requested());
        handle.cancel();
        assert!(request.is_cancel_requested());
    }
}

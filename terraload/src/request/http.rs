//! HTTP-backed request functions.
//!
//! [`HttpFetcher`] builds [`Request`]s whose transport is a `reqwest` GET
//! spawned on a Tokio runtime. The scheduler itself stays runtime-agnostic:
//! it only polls the returned future. Cancelling an active request aborts
//! the spawned task.
//!
//! # Example
//!
//! ```ignore
//! use terraload::request::{HttpFetcher, RequestScheduler};
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let fetcher = HttpFetcher::new(runtime.handle().clone())?;
//!
//! let request = fetcher.get("https://tiles.example.com/3/4/2.png");
//! let handle = scheduler.request(request);
//! ```

use super::error::{FetchError, FetchResult};
use super::handle::{Request, RequestType};
use futures::FutureExt;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("terraload/", env!("CARGO_PKG_VERSION"));

/// Connect timeout for the underlying client. Requests themselves have no
/// timeout; a stalled request holds its slot until cancelled.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds throttled GET requests executed on a Tokio runtime.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    runtime: Handle,
}

impl HttpFetcher {
    /// Creates a fetcher with a default client.
    pub fn new(runtime: Handle) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(FetchError::transport)?;
        Ok(Self::with_client(client, runtime))
    }

    /// Creates a fetcher around an existing client.
    pub fn with_client(client: reqwest::Client, runtime: Handle) -> Self {
        Self { client, runtime }
    }

    /// Builds a GET request that competes for global and per-server slots.
    pub fn get(&self, url: impl Into<String>) -> Request {
        self.request(url, RequestType::Other)
    }

    /// Builds a GET request of the given type.
    pub fn request(&self, url: impl Into<String>, request_type: RequestType) -> Request {
        let url = url.into();
        let abort: Arc<Mutex<Option<AbortHandle>>> = Arc::new(Mutex::new(None));

        let client = self.client.clone();
        let runtime = self.runtime.clone();
        let target = url.clone();
        let started = Arc::clone(&abort);
        let request_function = move || {
            let task = runtime.spawn(fetch(client, target));
            *started.lock() = Some(task.abort_handle());
            async move {
                match task.await {
                    Ok(result) => result,
                    Err(err) if err.is_cancelled() => Err(FetchError::Aborted),
                    Err(err) => Err(FetchError::transport(err)),
                }
            }
            .boxed()
        };

        Request::new(url, request_function)
            .with_request_type(request_type)
            .with_throttle(true)
            .with_throttle_by_server(true)
            .with_cancel_function(move || {
                if let Some(handle) = abort.lock().take() {
                    handle.abort();
                }
            })
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher").finish_non_exhaustive()
    }
}

async fn fetch(client: reqwest::Client, url: String) -> FetchResult {
    let response = client.get(&url).send().await?.error_for_status()?;
    let body = response.bytes().await?;
    tracing::trace!(url = %url, bytes = body.len(), "Response body read");
    Ok(body)
}

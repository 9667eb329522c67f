//! Network request scheduling.
//!
//! Every fetch the tile pipeline makes goes through a [`RequestScheduler`],
//! which bounds concurrency globally and per server and admits queued
//! requests in priority order.
//!
//! # Architecture
//!
//! ```text
//! caller ──request()──► RequestScheduler ──┬─► start now (unthrottled)
//!    ▲                      │              └─► PriorityRequestQueue
//!    │                      │ update()              │
//!    │                      ▼                       │
//!    └──poll()── RequestHandle ◄── active set ◄─────┘
//! ```
//!
//! - [`Request`]: what to fetch and how it is throttled
//! - [`RequestHandle`]: the caller's view, polled each tick
//! - [`PriorityRequestQueue`]: bounded queue of requests awaiting a slot
//! - [`HttpFetcher`]: builds requests backed by `reqwest`

mod error;
mod handle;
mod http;
mod queue;
mod scheduler;
mod server_key;
mod state;
mod stats;

pub use error::{FetchError, FetchResult};
pub use handle::{
    CancelFunction, PriorityFunction, Request, RequestFunction, RequestHandle, RequestStatus,
    RequestType,
};
pub use http::{HttpFetcher, DEFAULT_CONNECT_TIMEOUT, DEFAULT_USER_AGENT};
pub use queue::PriorityRequestQueue;
pub use scheduler::{RequestCompleted, RequestScheduler};
pub use server_key::{derive_server_key, is_data_or_blob_uri};
pub use state::RequestState;
pub use stats::RequestStatistics;

/// URL type accepted by [`derive_server_key`].
pub use reqwest::Url;

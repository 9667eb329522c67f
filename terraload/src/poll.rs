//! Single-shot polling of boxed futures.
//!
//! The scheduler and the tile state machines never block. Each tick they poll
//! outstanding work exactly once with a no-op waker and look at the result;
//! anything still pending is polled again on the next tick.

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use std::future::Future;
use std::task::{Context, Poll};

/// Polls `future` once without registering interest in wakeups.
///
/// Returns `Some(output)` when the future completed on this poll. A future
/// that has completed must not be polled again, so callers drop it as soon
/// as they receive `Some`.
pub fn poll_once<T>(future: &mut BoxFuture<'static, T>) -> Option<T> {
    let mut cx = Context::from_waker(noop_waker_ref());
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(value) => Some(value),
        Poll::Pending => None,
    }
}

/// Polls an optional in-flight future once, clearing the slot on completion.
pub fn poll_slot<T>(slot: &mut Option<BoxFuture<'static, T>>) -> Option<T> {
    let output = poll_once(slot.as_mut()?);
    if output.is_some() {
        *slot = None;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use tokio::sync::oneshot;

    #[test]
    fn test_ready_future_completes_on_first_poll() {
        let mut future = async { 7 }.boxed();
        assert_eq!(poll_once(&mut future), Some(7));
    }

    #[test]
    fn test_pending_future_completes_after_send() {
        let (tx, rx) = oneshot::channel::<u32>();
        let mut slot = Some(rx.map(|r| r.unwrap_or(0)).boxed());

        assert_eq!(poll_slot(&mut slot), None);
        assert!(slot.is_some());

        tx.send(42).unwrap();
        assert_eq!(poll_slot(&mut slot), Some(42));
        assert!(slot.is_none());
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let mut slot: Option<BoxFuture<'static, u32>> = None;
        assert_eq!(poll_slot(&mut slot), None);
    }
}

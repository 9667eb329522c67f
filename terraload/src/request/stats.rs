//! Scheduler counters.

use super::handle::RequestType;
use std::collections::HashMap;

/// Aggregate request counters kept by the scheduler.
///
/// `attempted`, `cancelled` and `cancelled_active` are per-interval counters:
/// when debug statistics are enabled they are logged and cleared at the end
/// of every [`update`](super::RequestScheduler::update). The others persist
/// until [`reset`](super::RequestScheduler::reset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestStatistics {
    /// Calls to `request()` for network URLs.
    pub number_of_attempted_requests: usize,
    /// Requests currently holding a slot.
    pub number_of_active_requests: usize,
    /// Requests cancelled for any reason.
    pub number_of_cancelled_requests: usize,
    /// Cancelled requests that were active at the time.
    pub number_of_cancelled_active_requests: usize,
    /// Requests whose transport failed.
    pub number_of_failed_requests: usize,
    /// Requests ever started.
    pub number_of_active_requests_ever: usize,
    completed_by_type: HashMap<RequestType, usize>,
}

impl RequestStatistics {
    /// Settled (received or failed) requests of one type.
    pub fn completed_by_type(&self, request_type: RequestType) -> usize {
        self.completed_by_type
            .get(&request_type)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn record_completed(&mut self, request_type: RequestType) {
        *self.completed_by_type.entry(request_type).or_default() += 1;
    }

    /// Clears the per-interval counters.
    pub(crate) fn clear_interval(&mut self) {
        self.number_of_attempted_requests = 0;
        self.number_of_cancelled_requests = 0;
        self.number_of_cancelled_active_requests = 0;
    }

    /// Logs non-zero counters.
    pub(crate) fn log(&self) {
        if self.number_of_attempted_requests > 0 {
            tracing::info!(
                count = self.number_of_attempted_requests,
                "Number of attempted requests"
            );
        }
        if self.number_of_active_requests > 0 {
            tracing::info!(
                count = self.number_of_active_requests,
                "Number of active requests"
            );
        }
        if self.number_of_cancelled_requests > 0 {
            tracing::info!(
                count = self.number_of_cancelled_requests,
                "Number of cancelled requests"
            );
        }
        if self.number_of_cancelled_active_requests > 0 {
            tracing::info!(
                count = self.number_of_cancelled_active_requests,
                "Number of cancelled active requests"
            );
        }
        if self.number_of_failed_requests > 0 {
            tracing::info!(
                count = self.number_of_failed_requests,
                "Number of failed requests"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_interval_keeps_persistent_counters() {
        let mut stats = RequestStatistics {
            number_of_attempted_requests: 5,
            number_of_active_requests: 2,
            number_of_cancelled_requests: 3,
            number_of_cancelled_active_requests: 1,
            number_of_failed_requests: 4,
            number_of_active_requests_ever: 7,
            ..Default::default()
        };
        stats.clear_interval();

        assert_eq!(stats.number_of_attempted_requests, 0);
        assert_eq!(stats.number_of_cancelled_requests, 0);
        assert_eq!(stats.number_of_cancelled_active_requests, 0);
        assert_eq!(stats.number_of_active_requests, 2);
        assert_eq!(stats.number_of_failed_requests, 4);
        assert_eq!(stats.number_of_active_requests_ever, 7);
    }

    #[test]
    fn test_completed_by_type() {
        let mut stats = RequestStatistics::default();
        stats.record_completed(RequestType::Terrain);
        stats.record_completed(RequestType::Terrain);
        stats.record_completed(RequestType::Imagery);

        assert_eq!(stats.completed_by_type(RequestType::Terrain), 2);
        assert_eq!(stats.completed_by_type(RequestType::Imagery), 1);
        assert_eq!(stats.completed_by_type(RequestType::Other), 0);
    }
}

//! Request/response correlation.
//!
//! The correlator mints an [`EchoToken`] per outgoing request and keeps a
//! table of pending waiters keyed by that token. Each waiter is a oneshot
//! sender, so a result can be written at most once; removing the entry
//! before writing makes every resolution path (reply, timeout, disconnect)
//! mutually exclusive.
//!
//! The correlator does no I/O and never sleeps. Deadlines are enforced by
//! the caller, which cancels the entry when its timer wins.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::EchoToken;
use crate::protocol::Response;

// ============================================================================
// Constants
// ============================================================================

/// Maximum pending requests before rejecting new ones.
pub const MAX_PENDING_REQUESTS: usize = 100;

// ============================================================================
// Types
// ============================================================================

/// Receiving half of a pending request's result slot.
pub type ResponseReceiver = oneshot::Receiver<Result<Value>>;

/// One outstanding request.
struct PendingRequest {
    action: String,
    issued_at: Instant,
    slot: oneshot::Sender<Result<Value>>,
}

// ============================================================================
// Correlator
// ============================================================================

/// Waiter table for requests sharing one connection.
pub struct Correlator {
    /// Next sequence number to mint.
    next_seq: u64,
    /// Pending requests by token.
    pending: FxHashMap<EchoToken, PendingRequest>,
    /// Pending limit.
    max_pending: usize,
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}

impl Correlator {
    /// Creates an empty correlator with the default pending limit.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_limit(MAX_PENDING_REQUESTS)
    }

    /// Creates an empty correlator with a custom pending limit.
    #[inline]
    #[must_use]
    pub fn with_limit(max_pending: usize) -> Self {
        Self {
            next_seq: 1,
            pending: FxHashMap::default(),
            max_pending,
        }
    }

    /// Mints a token and registers a waiter for it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the pending limit is reached.
    pub fn register(&mut self, action: &str) -> Result<(EchoToken, ResponseReceiver)> {
        if self.pending.len() >= self.max_pending {
            warn!(
                pending = self.pending.len(),
                max = self.max_pending,
                "Too many pending requests"
            );
            return Err(Error::protocol(format!(
                "Too many pending requests: {}/{}",
                self.pending.len(),
                self.max_pending
            )));
        }

        let token = self.mint();
        let (slot, receiver) = oneshot::channel();

        self.pending.insert(
            token,
            PendingRequest {
                action: action.to_string(),
                issued_at: Instant::now(),
                slot,
            },
        );

        trace!(%token, action, "Request registered");
        Ok((token, receiver))
    }

    /// Routes a response to the waiter holding its token.
    ///
    /// Returns `false` if no waiter matches, e.g. the request already timed out.
    pub fn resolve(&mut self, response: Response) -> bool {
        let Some(pending) = self.pending.remove(&response.echo) else {
            warn!(echo = %response.echo, "Response for unknown request");
            return false;
        };

        debug!(
            echo = %response.echo,
            action = %pending.action,
            retcode = response.retcode,
            elapsed_ms = pending.issued_at.elapsed().as_millis() as u64,
            "Response matched"
        );

        // Receiver dropped means the caller gave up; nothing to deliver to.
        let _ = pending.slot.send(response.into_result());
        true
    }

    /// Removes a waiter without resolving it.
    ///
    /// Returns `true` if the token was still pending.
    pub fn cancel(&mut self, token: &EchoToken) -> bool {
        let removed = self.pending.remove(token).is_some();
        if removed {
            debug!(%token, "Removed timed-out correlation");
        }
        removed
    }

    /// Fails every pending request with [`Error::ConnectionLost`].
    ///
    /// Returns the number of requests failed.
    pub fn fail_all(&mut self) -> usize {
        let count = self.pending.len();

        for (_, pending) in self.pending.drain() {
            let _ = pending.slot.send(Err(Error::ConnectionLost));
        }

        if count > 0 {
            debug!(count, "Failed pending requests on shutdown");
        }
        count
    }

    /// Returns the number of pending requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` if the token is still awaiting a response.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, token: &EchoToken) -> bool {
        self.pending.contains_key(token)
    }

    fn mint(&mut self) -> EchoToken {
        let seq = self.next_seq;
        self.next_seq += 1;
        EchoToken::new(seq, Utc::now().timestamp_millis().max(0) as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;
    use serde_json::json;

    fn reply(token: EchoToken, retcode: i64, data: Value) -> Response {
        serde_json::from_value(json!({
            "retcode": retcode,
            "data": data,
            "echo": token,
        }))
        .expect("valid response")
    }

    #[test]
    fn test_tokens_are_unique_and_increasing() {
        let mut correlator = Correlator::new();
        let (a, _rx_a) = correlator.register("a").expect("register");
        let (b, _rx_b) = correlator.register("b").expect("register");

        assert_ne!(a, b);
        assert!(b.seq() > a.seq());
        assert_eq!(correlator.pending_count(), 2);
    }

    #[test]
    fn test_resolve_success() {
        let mut correlator = Correlator::new();
        let (token, mut rx) = correlator.register("get_status").expect("register");

        assert!(correlator.resolve(reply(token, 0, json!({"online": true}))));
        assert!(!correlator.is_pending(&token));

        let data = rx.try_recv().expect("delivered").expect("success");
        assert_eq!(data["online"], true);
    }

    #[test]
    fn test_resolve_remote_error() {
        let mut correlator = Correlator::new();
        let (token, mut rx) = correlator.register("get_status").expect("register");

        correlator.resolve(reply(token, 1404, Value::Null));

        let result = rx.try_recv().expect("delivered");
        assert!(matches!(result, Err(Error::RemoteError { code: 1404, .. })));
    }

    #[test]
    fn test_late_response_after_cancel_is_dropped() {
        let mut correlator = Correlator::new();
        let (token, mut rx) = correlator.register("slow").expect("register");

        assert!(correlator.cancel(&token));
        assert!(!correlator.cancel(&token));
        assert!(!correlator.resolve(reply(token, 0, json!(1))));
        assert_eq!(correlator.pending_count(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_second_resolution_is_noop() {
        let mut correlator = Correlator::new();
        let (token, mut rx) = correlator.register("once").expect("register");

        assert!(correlator.resolve(reply(token, 0, json!("first"))));
        assert!(!correlator.resolve(reply(token, 0, json!("second"))));

        let data = rx.try_recv().expect("delivered").expect("success");
        assert_eq!(data, json!("first"));
    }

    #[test]
    fn test_fail_all() {
        let mut correlator = Correlator::new();
        let (_, mut rx_a) = correlator.register("a").expect("register");
        let (_, mut rx_b) = correlator.register("b").expect("register");

        assert_eq!(correlator.fail_all(), 2);
        assert_eq!(correlator.pending_count(), 0);

        for rx in [&mut rx_a, &mut rx_b] {
            let result = rx.try_recv().expect("delivered");
            assert!(matches!(result, Err(Error::ConnectionLost)));
        }
    }

    #[test]
    fn test_pending_limit() {
        let mut correlator = Correlator::with_limit(2);
        let _a = correlator.register("a").expect("register");
        let _b = correlator.register("b").expect("register");

        let err = correlator.register("c").expect_err("limit reached");
        assert!(matches!(err, Error::Protocol { .. }));
    }

    #[test]
    fn test_dropped_receiver_still_clears_entry() {
        let mut correlator = Correlator::new();
        let (token, rx) = correlator.register("abandoned").expect("register");
        drop(rx);

        assert!(correlator.resolve(reply(token, 0, Value::Null)));
        assert_eq!(correlator.pending_count(), 0);
    }

    proptest! {
        /// Every response reaches exactly the waiter whose token it carries,
        /// whatever order the responses arrive in.
        #[test]
        fn prop_routing_is_a_bijection(
            order in (1usize..24).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let mut correlator = Correlator::new();
            let mut waiters = Vec::new();

            for index in 0..order.len() {
                let (token, rx) = correlator.register("get_status").expect("register");
                waiters.push((index, token, rx));
            }

            for &index in &order {
                let token = waiters[index].1;
                prop_assert!(correlator.resolve(reply(token, 0, json!(index))));
            }

            prop_assert_eq!(correlator.pending_count(), 0);

            for (index, _, mut rx) in waiters {
                let data = rx.try_recv().expect("delivered").expect("success");
                prop_assert_eq!(data, json!(index));
            }
        }
    }
}

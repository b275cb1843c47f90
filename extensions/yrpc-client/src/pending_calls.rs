use crate::CallError;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::oneshot;
use yrpc::message::RpcResponse;

pub type CallOutcome = Result<RpcResponse, CallError>;

/// Correlates in-flight request ids to their suspended callers.
///
/// Shared between caller tasks (which register and await) and every
/// channel's reader task (which completes). Exactly one of
/// `complete`/`fail`/`expire` takes effect per id: whichever removes the
/// entry first wins, and the losers of that race become no-ops. That is the
/// whole idempotency story, and it is what makes the timeout-versus-late-
/// response race safe.
///
/// The mutex is only ever held for map operations, never across an await.
pub struct PendingCalls {
    inner: Mutex<HashMap<u64, oneshot::Sender<CallOutcome>>>,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Creates the entry for a fresh request id and hands back the receiver
    /// the caller will await. Must run before the request bytes hit the
    /// wire, or a fast response could arrive with nowhere to land.
    pub fn register(&self, request_id: u64) -> oneshot::Receiver<CallOutcome> {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .inner
            .lock()
            .expect("pending-call lock")
            .insert(request_id, tx);
        // Ids are unique while a call is outstanding; a collision would
        // orphan the earlier caller.
        debug_assert!(previous.is_none(), "request id reused while pending");
        rx
    }

    pub fn complete(&self, request_id: u64, response: RpcResponse) {
        if let Some(tx) = self.take(request_id) {
            let _ = tx.send(Ok(response));
        }
    }

    pub fn fail(&self, request_id: u64, error: CallError) {
        if let Some(tx) = self.take(request_id) {
            let _ = tx.send(Err(error));
        }
    }

    /// Drops the entry after a local timeout. Returns whether the entry was
    /// still present, i.e. whether the timeout actually won the race.
    pub fn expire(&self, request_id: u64) -> bool {
        self.take(request_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("pending-call lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take(&self, request_id: u64) -> Option<oneshot::Sender<CallOutcome>> {
        self.inner
            .lock()
            .expect("pending-call lock")
            .remove(&request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yrpc::message::ResponseCode;

    #[tokio::test]
    async fn response_resolves_the_registered_caller() {
        let pending = PendingCalls::new();
        let rx = pending.register(1);

        pending.complete(1, RpcResponse::success(b"ok".to_vec()));
        let outcome = rx.await.unwrap().unwrap();
        assert_eq!(outcome.code, ResponseCode::Success);
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn expire_after_complete_is_a_no_op() {
        let pending = PendingCalls::new();
        let rx = pending.register(7);

        pending.complete(7, RpcResponse::success(Vec::new()));
        assert!(!pending.expire(7));

        // The caller still observes the response, not the expiry.
        assert!(rx.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn late_response_after_expire_is_dropped() {
        let pending = PendingCalls::new();
        let rx = pending.register(7);

        assert!(pending.expire(7));
        pending.complete(7, RpcResponse::success(Vec::new()));

        // The receiver observes cancellation, never a double resolution.
        assert!(rx.await.is_err());
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn failures_carry_the_error_to_the_caller() {
        let pending = PendingCalls::new();
        let rx = pending.register(3);

        pending.fail(3, CallError::ChannelClosed);
        assert!(matches!(rx.await.unwrap(), Err(CallError::ChannelClosed)));
    }

    #[tokio::test]
    async fn distinct_ids_resolve_independently() {
        let pending = PendingCalls::new();
        let rx_a = pending.register(1);
        let rx_b = pending.register(2);

        pending.complete(2, RpcResponse::success(b"b".to_vec()));
        pending.complete(1, RpcResponse::success(b"a".to_vec()));

        assert_eq!(rx_a.await.unwrap().unwrap().body, Some(b"a".to_vec()));
        assert_eq!(rx_b.await.unwrap().unwrap().body, Some(b"b".to_vec()));
    }
}

//! Outbound RPC wrappers.
//!
//! Every call is bound to the caller's cancellation token, the engine's
//! shutdown token and the per-RPC deadline, and every response must echo the
//! request id it answers.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::domain::{
    new_request_id, Contact, FindNodeRequest, FindValueRequest, FindValueResult, NodeAddress,
    NodeId, PingRequest, PingResponse, Record, RpcError, StoreRequest,
};

use super::core::DhtEngine;

/// Reject a response that does not answer our request.
pub(crate) fn check_request_id(expected: &str, actual: &str) -> Result<(), RpcError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RpcError::RequestIdMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

impl DhtEngine {
    /// Drive one RPC future under cancellation and the configured deadline.
    async fn bounded<T, F>(&self, cancel: &CancellationToken, call: F) -> Result<T, RpcError>
    where
        F: Future<Output = Result<T, RpcError>>,
    {
        if cancel.is_cancelled() || self.shutdown.is_cancelled() {
            return Err(RpcError::Cancelled);
        }
        tokio::select! {
            _ = cancel.cancelled() => Err(RpcError::Cancelled),
            _ = self.shutdown.cancelled() => Err(RpcError::Cancelled),
            result = tokio::time::timeout(self.config.rpc_timeout(), call) => match result {
                Ok(inner) => inner,
                Err(_) => Err(RpcError::Timeout),
            },
        }
    }

    /// Liveness check against `peer`.
    pub(crate) async fn ping_peer(
        &self,
        peer: &NodeAddress,
        cancel: &CancellationToken,
    ) -> Result<PingResponse, RpcError> {
        let request = PingRequest {
            sender: self.sender(),
            request_id: new_request_id(),
        };
        let expected = request.request_id.clone();
        let response = self.bounded(cancel, self.rpc.ping(peer, request)).await?;
        check_request_id(&expected, &response.request_id)?;
        Ok(response)
    }

    /// FIND_NODE against `peer`; returns the responder and its contacts.
    pub(crate) async fn find_node_rpc(
        &self,
        peer: &NodeAddress,
        target: &NodeId,
        cancel: &CancellationToken,
    ) -> Result<(Contact, Vec<Contact>), RpcError> {
        let request = FindNodeRequest {
            sender: self.sender(),
            request_id: new_request_id(),
            target: *target,
        };
        let expected = request.request_id.clone();
        let response = self.bounded(cancel, self.rpc.find_node(peer, request)).await?;
        check_request_id(&expected, &response.request_id)?;
        Ok((response.sender, response.closest))
    }

    /// FIND_VALUE against `peer`; returns the responder and its answer.
    pub(crate) async fn find_value_rpc(
        &self,
        peer: &NodeAddress,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<(Contact, FindValueResult), RpcError> {
        let request = FindValueRequest {
            sender: self.sender(),
            request_id: new_request_id(),
            key: key.to_string(),
        };
        let expected = request.request_id.clone();
        let response = self.bounded(cancel, self.rpc.find_value(peer, request)).await?;
        check_request_id(&expected, &response.request_id)?;
        Ok((response.sender, response.result))
    }

    /// STORE against `peer`; `Ok(false)` when the peer already held the key.
    pub(crate) async fn store_rpc(
        &self,
        peer: &NodeAddress,
        key: &str,
        record: &Record,
        cancel: &CancellationToken,
    ) -> Result<bool, RpcError> {
        let request = StoreRequest {
            sender: self.sender(),
            request_id: new_request_id(),
            key: key.to_string(),
            record: record.clone(),
        };
        let expected = request.request_id.clone();
        let response = self.bounded(cancel, self.rpc.store(peer, request)).await?;
        check_request_id(&expected, &response.request_id)?;
        Ok(response.success)
    }
}

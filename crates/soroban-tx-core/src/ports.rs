//! Collaborator seams of the lifecycle.
//!
//! The driver only needs [`RpcEndpoint`]; the full invocation pipeline also
//! needs an account source, a builder, a simulator and a signer.
//! [`crate::client::StellarRpcClient`] implements the network-facing ones.

use async_trait::async_trait;

use crate::builder::UnsignedTransaction;
use crate::error::{
    AccountError, BuildError, DecodeError, SimulationError, SubmissionError, TransportError,
};
use crate::signer::SignedTransaction;
use crate::types::{
    AccountRef, ContractCall, SimulationResult, StatusRecord, SubmissionHandle, SubmissionRequest,
    TimeBounds,
};

/// Fetches the current state of a source account
#[async_trait]
pub trait AccountLoader: Send + Sync {
    async fn load(&self, public_key: &str) -> Result<AccountRef, AccountError>;
}

/// Turns a contract call into an unsigned transaction
pub trait TransactionBuilder: Send + Sync {
    fn build(
        &self,
        source: &AccountRef,
        passphrase: &str,
        call: &ContractCall,
        time_bounds: TimeBounds,
    ) -> Result<UnsignedTransaction, BuildError>;
}

/// Computes footprint and resource usage for an unsigned transaction
#[async_trait]
pub trait Simulator: Send + Sync {
    async fn simulate(&self, tx: &UnsignedTransaction) -> Result<SimulationResult, SimulationError>;
}

/// Signs transactions with a key it holds
pub trait Signer: Send + Sync {
    /// `G...` strkey of the signing account
    fn public_key(&self) -> String;

    fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, BuildError>;
}

/// Remote service accepting signed transactions and reporting their status
#[async_trait]
pub trait RpcEndpoint: Send + Sync {
    /// Identifier requests must target (the RPC URL)
    fn endpoint_id(&self) -> &str;

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionHandle, SubmissionError>;

    async fn get_status(&self, handle: &SubmissionHandle) -> Result<StatusRecord, TransportError>;
}

/// Converts a terminal-success payload into an application value
pub trait ScalarDecoder {
    type Value;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, DecodeError>;
}

impl<F, V> ScalarDecoder for F
where
    F: Fn(&[u8]) -> Result<V, DecodeError>,
{
    type Value = V;

    fn decode(&self, bytes: &[u8]) -> Result<V, DecodeError> {
        self(bytes)
    }
}

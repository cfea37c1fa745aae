use std::time::Duration;
use thiserror::Error;

use crate::types::{StatusRecord, SubmissionHandle};

/// Faults talking to the RPC endpoint
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("RPC returned error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Network timeout")]
    Timeout,
}

/// Ways an endpoint can refuse a signed payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("endpoint rejected transaction with status {status}")]
    Rejected {
        status: String,
        /// `TransactionResult` XDR, when the endpoint supplied one
        result_xdr: Option<Vec<u8>>,
    },
    #[error("request targets {requested} but driver is bound to {bound}")]
    EndpointMismatch { requested: String, bound: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no value present in result")]
    Missing,
    #[error("malformed XDR: {0}")]
    Xdr(String),
    #[error("expected {expected}, got {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: String,
    },
    #[error("{0}")]
    Other(String),
}

/// Failures of the submit / confirm / extract lifecycle
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("submission rejected: {0}")]
    SubmissionRejected(SubmissionError),

    #[error("endpoint unavailable after {attempts} attempt(s): {source}")]
    EndpointUnavailable {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    #[error("transaction {handle} still {last_seen} after {waited:?} ({polls} polls)")]
    ConfirmationTimeout {
        handle: SubmissionHandle,
        waited: Duration,
        polls: u32,
        last_seen: StatusRecord,
    },

    #[error("transaction {handle} failed on ledger")]
    RemoteExecutionFailed {
        handle: SubmissionHandle,
        reason: Vec<u8>,
    },

    #[error("record is {status}, not a terminal success")]
    NotTerminalSuccess { status: &'static str },

    #[error("failed to decode result: {0}")]
    Decode(#[from] DecodeError),

    #[error("confirmation cancelled after {polls} polls")]
    Cancelled { polls: u32 },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid network: {0}. Allowed values: mainnet, testnet, futurenet")]
    InvalidNetwork(String),
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret seed")]
    InvalidSecret,
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
    #[error("invalid contract id: {0}")]
    InvalidContractId(String),
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("XDR encoding failed: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),
    #[error("invalid function name: {0}")]
    FunctionName(String),
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("account {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("malformed account entry: {0}")]
    Malformed(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("simulation failed: {0}")]
    Failed(String),
    #[error("simulation response invalid: {0}")]
    InvalidResult(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Failures of the end-to-end contract invocation
#[derive(Error, Debug)]
pub enum InvokeError {
    #[error("failed to load source account: {0}")]
    AccountLoad(#[from] AccountError),
    #[error("failed to build transaction: {0}")]
    Build(#[from] BuildError),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("signing failed: {0}")]
    Sign(BuildError),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<DecodeError> for InvokeError {
    fn from(e: DecodeError) -> Self {
        InvokeError::Lifecycle(LifecycleError::Decode(e))
    }
}

//! soroban-tx-core: Soroban contract invocation and transaction confirmation
//!
//! Builds, simulates, signs and submits `InvokeHostFunction` transactions over
//! Stellar RPC, then polls until the transaction reaches a terminal status.

pub mod backoff;
pub mod builder;
pub mod client;
pub mod config;
pub mod decoder;
pub mod driver;
pub mod error;
pub mod invoke;
pub mod ports;
pub mod signer;
pub mod types;

pub use builder::{StellarTransactionBuilder, UnsignedTransaction};
pub use client::StellarRpcClient;
pub use config::{DriverConfig, NetworkConfig};
pub use decoder::{decode_scval_bytes, I128Decoder, U64Decoder, ValueDecoder};
pub use driver::{extract_scalar, TransactionLifecycleDriver};
pub use error::*;
pub use invoke::{ContractInvoker, InvocationReceipt};
pub use ports::*;
pub use signer::{Keypair, SignedTransaction};
pub use types::*;


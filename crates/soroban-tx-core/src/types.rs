/// Shared types for the transaction lifecycle
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use stellar_xdr::curr::{
    LedgerFootprint, ScVal, SorobanAuthorizationEntry, SorobanTransactionData,
};

use crate::error::ConfigError;

pub const TESTNET_RPC: &str = "https://soroban-testnet.stellar.org";
pub const FUTURENET_RPC: &str = "https://rpc-futurenet.stellar.org";
pub const MAINNET_RPC: &str = "https://mainnet.stellar.validationcloud.io/v1/soroban/rpc";

pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";
pub const MAINNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Stellar network the client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
    Futurenet,
}

impl Network {
    pub fn passphrase(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_PASSPHRASE,
            Network::Testnet => TESTNET_PASSPHRASE,
            Network::Futurenet => FUTURENET_PASSPHRASE,
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_RPC,
            Network::Testnet => TESTNET_RPC,
            Network::Futurenet => FUTURENET_RPC,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Futurenet => write!(f, "futurenet"),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "public" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "futurenet" => Ok(Network::Futurenet),
            other => Err(ConfigError::InvalidNetwork(other.to_string())),
        }
    }
}

/// Signed payload bound for a specific endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    payload: Vec<u8>,
    endpoint: String,
}

impl SubmissionRequest {
    pub fn new(payload: Vec<u8>, endpoint: impl Into<String>) -> Self {
        Self {
            payload,
            endpoint: endpoint.into(),
        }
    }

    /// Signed transaction envelope, XDR encoded
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Identifier the endpoint hands back after accepting a submission.
///
/// For Stellar RPC this is the hex transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionHandle(String);

impl SubmissionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latest known status of a submission.
///
/// Only ever moves from `Pending` to one of the terminal variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusRecord {
    Pending,
    /// Return value of the invocation (`ScVal` XDR, empty if none)
    Success(Vec<u8>),
    /// `TransactionResult` XDR describing the failure
    Failed(Vec<u8>),
}

impl StatusRecord {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StatusRecord::Pending)
    }

    pub fn tag(&self) -> &'static str {
        match self {
            StatusRecord::Pending => "pending",
            StatusRecord::Success(_) => "success",
            StatusRecord::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusRecord::Pending => write!(f, "PENDING"),
            StatusRecord::Success(p) => write!(f, "SUCCESS ({} bytes)", p.len()),
            StatusRecord::Failed(r) => write!(f, "FAILED ({} bytes)", r.len()),
        }
    }
}

/// Source account state needed to build a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRef {
    pub account_id: String,
    pub public_key: [u8; 32],
    pub sequence: i64,
}

impl AccountRef {
    pub fn next_sequence(&self) -> i64 {
        self.sequence + 1
    }
}

/// A contract function call to wrap in an `InvokeHostFunction` operation
#[derive(Debug, Clone)]
pub struct ContractCall {
    /// Hex contract hash or `C...` strkey
    pub contract_id: String,
    pub function: String,
    pub args: Vec<ScVal>,
    /// Explicit authorization; when empty the simulation's entries are used
    pub auth: Vec<SorobanAuthorizationEntry>,
}

impl ContractCall {
    pub fn new(contract_id: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            function: function.into(),
            args: Vec::new(),
            auth: Vec::new(),
        }
    }

    pub fn arg(mut self, value: ScVal) -> Self {
        self.args.push(value);
        self
    }
}

/// Transaction validity window, in unix seconds. Zero means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub min_time: u64,
    pub max_time: u64,
}

impl TimeBounds {
    /// Valid from now until `secs` seconds in the future
    pub fn expiring_in(secs: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            min_time: 0,
            max_time: now.saturating_add(secs),
        }
    }
}

/// Resource cost reported by simulation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationCost {
    pub cpu_instructions: u64,
    pub memory_bytes: u64,
}

/// Outcome of simulating an unsigned transaction
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub transaction_data: SorobanTransactionData,
    pub min_resource_fee: u64,
    pub auth: Vec<SorobanAuthorizationEntry>,
    /// Return value of the simulated call (`ScVal` XDR)
    pub return_value: Option<Vec<u8>>,
    pub cost: SimulationCost,
    pub latest_ledger: u32,
}

impl SimulationResult {
    pub fn footprint(&self) -> &LedgerFootprint {
        &self.transaction_data.resources.footprint
    }
}

/// Decoded value from XDR
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum DecodedValue {
    Bool(bool),
    Int32(i32),
    Uint32(u32),
    Int64(i64),
    Uint64(u64),
    Int128(i128),
    Uint128(u128),
    Bytes(String), // hex-encoded
    String(String),
    Symbol(String),
    Address(String), // strkey
    Map(Vec<(DecodedValue, DecodedValue)>),
    Vec(Vec<DecodedValue>),
    Void,
    Error(String),
    Unknown(String),
}

impl DecodedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            DecodedValue::Bool(_) => "bool",
            DecodedValue::Int32(_) => "i32",
            DecodedValue::Uint32(_) => "u32",
            DecodedValue::Int64(_) => "i64",
            DecodedValue::Uint64(_) => "u64",
            DecodedValue::Int128(_) => "i128",
            DecodedValue::Uint128(_) => "u128",
            DecodedValue::Bytes(_) => "bytes",
            DecodedValue::String(_) => "string",
            DecodedValue::Symbol(_) => "symbol",
            DecodedValue::Address(_) => "address",
            DecodedValue::Map(_) => "map",
            DecodedValue::Vec(_) => "vec",
            DecodedValue::Void => "void",
            DecodedValue::Error(_) => "error",
            DecodedValue::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Bool(b) => write!(f, "{}", b),
            DecodedValue::Int32(n) => write!(f, "{}", n),
            DecodedValue::Uint32(n) => write!(f, "{}", n),
            DecodedValue::Int64(n) => write!(f, "{}", n),
            DecodedValue::Uint64(n) => write!(f, "{}", n),
            DecodedValue::Int128(n) => write!(f, "{}", n),
            DecodedValue::Uint128(n) => write!(f, "{}", n),
            DecodedValue::Bytes(s) => write!(f, "0x{}", s),
            DecodedValue::String(s) => write!(f, "\"{}\"", s),
            DecodedValue::Symbol(s) => write!(f, ":{}", s),
            DecodedValue::Address(a) => write!(f, "{}", a),
            DecodedValue::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            DecodedValue::Vec(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            DecodedValue::Void => write!(f, "void"),
            DecodedValue::Error(e) => write!(f, "error({})", e),
            DecodedValue::Unknown(u) => write!(f, "unknown({})", u),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_bounds_expiring_in() {
        let before = chrono::Utc::now().timestamp() as u64;
        let bounds = TimeBounds::expiring_in(300);
        let after = chrono::Utc::now().timestamp() as u64;

        assert_eq!(bounds.min_time, 0);
        assert!(bounds.max_time >= before + 300);
        assert!(bounds.max_time <= after + 300);
        assert_eq!(TimeBounds::default(), TimeBounds { min_time: 0, max_time: 0 });
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("futurenet".parse::<Network>().unwrap(), Network::Futurenet);
        assert!("devnet".parse::<Network>().is_err());
    }

    #[test]
    fn test_status_record_terminal() {
        assert!(!StatusRecord::Pending.is_terminal());
        assert!(StatusRecord::Success(vec![]).is_terminal());
        assert!(StatusRecord::Failed(vec![1]).is_terminal());
        assert_eq!(StatusRecord::Failed(vec![1]).tag(), "failed");
    }

    #[test]
    fn test_decoded_value_display() {
        let v = DecodedValue::Vec(vec![DecodedValue::Uint64(1), DecodedValue::Symbol("a".into())]);
        assert_eq!(v.to_string(), "[1, :a]");
    }
}

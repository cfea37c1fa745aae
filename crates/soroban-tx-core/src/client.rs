/// Stellar RPC client for submitting and tracking transactions
use async_trait::async_trait;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use stellar_xdr::curr::{
    LedgerEntryData, LedgerKey, LedgerKeyAccount, Limits, ReadXdr, ScVal, SorobanAuthorizationEntry,
    SorobanTransactionData, TransactionMeta, WriteXdr,
};
use tracing::debug;

use crate::builder::UnsignedTransaction;
use crate::error::{AccountError, SimulationError, SubmissionError, TransportError};
use crate::ports::{AccountLoader, RpcEndpoint, Simulator};
use crate::signer::{account_id, parse_public_key};
use crate::types::{
    AccountRef, Network, SimulationCost, SimulationResult, StatusRecord, SubmissionHandle,
    SubmissionRequest,
};

/// Client for communicating with Stellar RPC
#[derive(Debug, Clone)]
pub struct StellarRpcClient {
    pub endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub passphrase: String,
    pub protocol_version: u32,
    #[serde(default)]
    pub friendbot_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionResponse {
    status: String,
    hash: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTransactionResponse {
    status: String,
    #[serde(default)]
    result_xdr: Option<String>,
    #[serde(default)]
    result_meta_xdr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateTransactionResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    transaction_data: Option<String>,
    #[serde(default)]
    min_resource_fee: Option<String>,
    #[serde(default)]
    results: Vec<SimulateHostFunctionResult>,
    #[serde(default)]
    cost: Option<SimulateCost>,
    latest_ledger: u32,
}

#[derive(Debug, Deserialize)]
struct SimulateHostFunctionResult {
    #[serde(default)]
    auth: Vec<String>,
    xdr: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateCost {
    cpu_insns: String,
    mem_bytes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerEntriesResponse {
    #[serde(default)]
    entries: Option<Vec<LedgerEntryResult>>,
}

#[derive(Debug, Deserialize)]
struct LedgerEntryResult {
    xdr: String,
}

impl StellarRpcClient {
    /// Create a new RPC client with the given endpoint
    pub fn new(endpoint: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.to_string(),
            client,
        }
    }

    /// Create a client for the network's default endpoint
    pub fn for_network(network: Network) -> Self {
        Self::new(network.default_rpc_url())
    }

    pub fn testnet() -> Self {
        Self::for_network(Network::Testnet)
    }

    pub fn futurenet() -> Self {
        Self::for_network(Network::Futurenet)
    }

    pub fn mainnet() -> Self {
        Self::for_network(Network::Mainnet)
    }

    /// Network passphrase and protocol version served by the endpoint
    pub async fn get_network(&self) -> Result<NetworkInfo, TransportError> {
        self.jsonrpc_call("getNetwork", json!({})).await
    }

    pub async fn get_health(&self) -> Result<String, TransportError> {
        let response: serde_json::Value = self.jsonrpc_call("getHealth", json!({})).await?;
        response
            .get("status")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| TransportError::InvalidResponse("Invalid getHealth response".into()))
    }

    /// Get the latest ledger height
    pub async fn get_latest_ledger(&self) -> Result<u32, TransportError> {
        let response: serde_json::Value = self.jsonrpc_call("getLatestLedger", json!({})).await?;
        response
            .get("sequence")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .ok_or_else(|| TransportError::InvalidResponse("Invalid getLatestLedger response".into()))
    }

    /// Internal JSON-RPC 2.0 call. Retrying is left to the caller.
    async fn jsonrpc_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, TransportError> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": if params.is_null() { json!({}) } else { params }
        });

        debug!(method, endpoint = %self.endpoint, "RPC request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(TransportError::RequestFailed(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse {} response: {}", method, e))
        })?;

        if let Some(error) = body.get("error") {
            return Err(TransportError::Rpc {
                code: error.get("code").and_then(|c| c.as_i64()).unwrap_or(0),
                message: error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let result = body
            .get("result")
            .cloned()
            .ok_or_else(|| TransportError::InvalidResponse("No result in RPC response".into()))?;

        serde_json::from_value::<T>(result).map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse {} result: {}", method, e))
        })
    }
}

#[async_trait]
impl RpcEndpoint for StellarRpcClient {
    fn endpoint_id(&self) -> &str {
        &self.endpoint
    }

    async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionHandle, SubmissionError> {
        let envelope = base64::engine::general_purpose::STANDARD.encode(request.payload());
        let response: SendTransactionResponse = self
            .jsonrpc_call("sendTransaction", json!({ "transaction": envelope }))
            .await?;

        match response.status.as_str() {
            "PENDING" | "DUPLICATE" => Ok(SubmissionHandle::new(response.hash)),
            _ => {
                let result_xdr = match response.error_result_xdr {
                    Some(b64) => Some(decode_base64(&b64)?),
                    None => None,
                };
                Err(SubmissionError::Rejected {
                    status: response.status,
                    result_xdr,
                })
            }
        }
    }

    async fn get_status(&self, handle: &SubmissionHandle) -> Result<StatusRecord, TransportError> {
        let response: GetTransactionResponse = self
            .jsonrpc_call("getTransaction", json!({ "hash": handle.as_str() }))
            .await?;

        match response.status.as_str() {
            "NOT_FOUND" | "PENDING" => Ok(StatusRecord::Pending),
            "SUCCESS" => {
                let payload = match response.result_meta_xdr {
                    Some(meta) => return_value_xdr(&meta)?,
                    None => Vec::new(),
                };
                Ok(StatusRecord::Success(payload))
            }
            "FAILED" => {
                let reason = match response.result_xdr {
                    Some(b64) => decode_base64(&b64)?,
                    None => Vec::new(),
                };
                Ok(StatusRecord::Failed(reason))
            }
            other => Err(TransportError::InvalidResponse(format!(
                "Unknown transaction status: {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl AccountLoader for StellarRpcClient {
    async fn load(&self, public_key: &str) -> Result<AccountRef, AccountError> {
        let key_bytes = parse_public_key(public_key)?;
        let key = LedgerKey::Account(LedgerKeyAccount {
            account_id: account_id(key_bytes),
        });
        let key_xdr = key
            .to_xdr(Limits::none())
            .map_err(|e| AccountError::Malformed(e.to_string()))?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(key_xdr);

        let response: LedgerEntriesResponse = self
            .jsonrpc_call("getLedgerEntries", json!({ "keys": [encoded] }))
            .await?;

        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| AccountError::NotFound(public_key.to_string()))?;

        let data = LedgerEntryData::from_xdr(decode_base64(&entry.xdr)?, Limits::none())
            .map_err(|e| AccountError::Malformed(e.to_string()))?;

        match data {
            LedgerEntryData::Account(account) => Ok(AccountRef {
                account_id: public_key.to_string(),
                public_key: key_bytes,
                sequence: account.seq_num.0,
            }),
            _ => Err(AccountError::Malformed("not an account entry".to_string())),
        }
    }
}

#[async_trait]
impl Simulator for StellarRpcClient {
    async fn simulate(&self, tx: &UnsignedTransaction) -> Result<SimulationResult, SimulationError> {
        let envelope = tx
            .to_xdr_base64()
            .map_err(|e| SimulationError::InvalidResult(e.to_string()))?;

        let response: SimulateTransactionResponse = self
            .jsonrpc_call("simulateTransaction", json!({ "transaction": envelope }))
            .await?;

        simulation_from_response(response)
    }
}

fn simulation_from_response(
    response: SimulateTransactionResponse,
) -> Result<SimulationResult, SimulationError> {
    if let Some(error) = response.error {
        return Err(SimulationError::Failed(error));
    }

    let data_b64 = response
        .transaction_data
        .ok_or_else(|| SimulationError::InvalidResult("missing transactionData".into()))?;
    let transaction_data =
        SorobanTransactionData::from_xdr(decode_base64(&data_b64)?, Limits::none())
            .map_err(|e| SimulationError::InvalidResult(e.to_string()))?;

    let min_resource_fee = response
        .min_resource_fee
        .as_deref()
        .unwrap_or("0")
        .parse::<u64>()
        .map_err(|e| SimulationError::InvalidResult(format!("minResourceFee: {}", e)))?;

    let (auth, return_value) = match response.results.into_iter().next() {
        Some(result) => {
            let mut auth = Vec::with_capacity(result.auth.len());
            for entry in &result.auth {
                auth.push(
                    SorobanAuthorizationEntry::from_xdr(decode_base64(entry)?, Limits::none())
                        .map_err(|e| SimulationError::InvalidResult(e.to_string()))?,
                );
            }
            (auth, Some(decode_base64(&result.xdr)?))
        }
        None => (Vec::new(), None),
    };

    let cost = response
        .cost
        .map(|c| SimulationCost {
            cpu_instructions: c.cpu_insns.parse().unwrap_or(0),
            memory_bytes: c.mem_bytes.parse().unwrap_or(0),
        })
        .unwrap_or_default();

    Ok(SimulationResult {
        transaction_data,
        min_resource_fee,
        auth,
        return_value,
        cost,
        latest_ledger: response.latest_ledger,
    })
}

/// Contract return value carried in transaction meta, re-encoded as XDR
fn return_value_xdr(meta_b64: &str) -> Result<Vec<u8>, TransportError> {
    let meta = TransactionMeta::from_xdr(decode_base64(meta_b64)?, Limits::none())
        .map_err(|e| TransportError::InvalidResponse(format!("resultMetaXdr: {}", e)))?;

    let value: Option<ScVal> = match meta {
        TransactionMeta::V3(v3) => v3.soroban_meta.map(|m| m.return_value),
        TransactionMeta::V4(v4) => v4.soroban_meta.and_then(|m| m.return_value),
        _ => None,
    };

    match value {
        Some(v) => v
            .to_xdr(Limits::none())
            .map_err(|e| TransportError::InvalidResponse(e.to_string())),
        None => Ok(Vec::new()),
    }
}

fn decode_base64(b64: &str) -> Result<Vec<u8>, TransportError> {
    base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| TransportError::InvalidResponse(format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = StellarRpcClient::testnet();
        assert!(client.endpoint.contains("testnet"));
        assert_eq!(client.endpoint_id(), client.endpoint);
    }

    #[test]
    fn test_mainnet_endpoint() {
        let client = StellarRpcClient::mainnet();
        assert!(client.endpoint.contains("mainnet"));
    }

    #[test]
    fn test_simulation_error_surfaces() {
        let response = SimulateTransactionResponse {
            error: Some("HostError: contract not found".into()),
            transaction_data: None,
            min_resource_fee: None,
            results: vec![],
            cost: None,
            latest_ledger: 10,
        };
        assert!(matches!(
            simulation_from_response(response),
            Err(SimulationError::Failed(msg)) if msg.contains("contract not found")
        ));
    }
}

//! End-to-end contract invocation: load the source account, build,
//! simulate, assemble, sign, submit, confirm and decode.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::StellarTransactionBuilder;
use crate::config::DriverConfig;
use crate::driver::{extract_scalar, TransactionLifecycleDriver};
use crate::error::{DecodeError, InvokeError, LifecycleError};
use crate::ports::{AccountLoader, RpcEndpoint, ScalarDecoder, Signer, Simulator, TransactionBuilder};
use crate::types::{ContractCall, SimulationResult, StatusRecord, SubmissionHandle, TimeBounds};

/// Result of a confirmed invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReceipt {
    pub handle: SubmissionHandle,
    /// Return value XDR, empty when the call returned nothing
    pub payload: Vec<u8>,
    pub fee: u32,
}

pub struct ContractInvoker<C, B = StellarTransactionBuilder> {
    driver: TransactionLifecycleDriver<C>,
    builder: B,
    passphrase: String,
    validity_secs: Option<u64>,
}

impl<C> ContractInvoker<C, StellarTransactionBuilder>
where
    C: AccountLoader + Simulator + RpcEndpoint,
{
    pub fn new(client: C, passphrase: impl Into<String>, config: DriverConfig) -> Self {
        Self::with_builder(client, StellarTransactionBuilder::default(), passphrase, config)
    }
}

impl<C, B> ContractInvoker<C, B>
where
    C: AccountLoader + Simulator + RpcEndpoint,
    B: TransactionBuilder,
{
    pub fn with_builder(
        client: C,
        builder: B,
        passphrase: impl Into<String>,
        config: DriverConfig,
    ) -> Self {
        Self {
            driver: TransactionLifecycleDriver::new(client, config),
            builder,
            passphrase: passphrase.into(),
            validity_secs: None,
        }
    }

    /// Bound submitted transactions to a validity window of `secs` seconds
    pub fn with_validity(mut self, secs: u64) -> Self {
        self.validity_secs = Some(secs);
        self
    }

    pub fn driver(&self) -> &TransactionLifecycleDriver<C> {
        &self.driver
    }

    fn time_bounds(&self) -> TimeBounds {
        self.validity_secs
            .map(TimeBounds::expiring_in)
            .unwrap_or_default()
    }

    /// Simulate `call` as `source` without submitting anything
    pub async fn simulate(
        &self,
        call: &ContractCall,
        source: &str,
    ) -> Result<SimulationResult, InvokeError> {
        let client = self.driver.endpoint();
        let account = client.load(source).await?;
        debug!(account = %account.account_id, sequence = account.sequence, "Loaded source account");

        let unsigned = self
            .builder
            .build(&account, &self.passphrase, call, self.time_bounds())?;
        let simulation = client.simulate(&unsigned).await?;
        debug!(
            cpu = simulation.cost.cpu_instructions,
            mem = simulation.cost.memory_bytes,
            min_resource_fee = simulation.min_resource_fee,
            "Simulation complete"
        );
        Ok(simulation)
    }

    /// Decode the return value of a read-only call from simulation alone
    pub async fn simulate_and_decode<D: ScalarDecoder>(
        &self,
        call: &ContractCall,
        source: &str,
        decoder: &D,
    ) -> Result<D::Value, InvokeError> {
        let simulation = self.simulate(call, source).await?;
        let bytes = simulation.return_value.ok_or(DecodeError::Missing)?;
        Ok(decoder.decode(&bytes)?)
    }

    /// Run `call` on ledger and wait for it to be confirmed.
    ///
    /// A ledger-level failure is reported as
    /// [`LifecycleError::RemoteExecutionFailed`].
    pub async fn invoke<S: Signer>(
        &self,
        call: &ContractCall,
        signer: &S,
        cancel: &CancellationToken,
    ) -> Result<InvocationReceipt, InvokeError> {
        let client = self.driver.endpoint();
        let source = signer.public_key();

        info!(contract = %call.contract_id, function = %call.function, "Preparing transaction");
        let account = client.load(&source).await?;
        let unsigned = self
            .builder
            .build(&account, &self.passphrase, call, self.time_bounds())?;

        let simulation = client.simulate(&unsigned).await?;
        let assembled = unsigned.assemble(&simulation)?;
        let fee = assembled.tx.fee;

        let signed = signer.sign(&assembled).map_err(InvokeError::Sign)?;
        debug!(hash = %signed.hash_hex(), fee, "Transaction signed");
        let request = signed
            .into_request(client.endpoint_id())
            .map_err(InvokeError::Sign)?;

        let (handle, record) = self.driver.submit_and_confirm(&request, cancel).await?;
        match record {
            StatusRecord::Success(payload) => Ok(InvocationReceipt {
                handle,
                payload,
                fee,
            }),
            StatusRecord::Failed(reason) => {
                warn!(handle = %handle, "Transaction failed on ledger");
                Err(LifecycleError::RemoteExecutionFailed { handle, reason }.into())
            }
            StatusRecord::Pending => {
                Err(LifecycleError::NotTerminalSuccess { status: "pending" }.into())
            }
        }
    }

    pub async fn invoke_and_decode<S: Signer, D: ScalarDecoder>(
        &self,
        call: &ContractCall,
        signer: &S,
        decoder: &D,
        cancel: &CancellationToken,
    ) -> Result<D::Value, InvokeError> {
        let receipt = self.invoke(call, signer, cancel).await?;
        let record = StatusRecord::Success(receipt.payload);
        Ok(extract_scalar(&record, decoder)?)
    }
}

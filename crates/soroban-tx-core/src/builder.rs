/// Construction of `InvokeHostFunction` transactions
use base64::Engine;
use stellar_xdr::curr::{
    ContractId, Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo,
    MuxedAccount, Operation, OperationBody, Preconditions, ScAddress, ScSymbol, SequenceNumber,
    StringM, TimePoint, Transaction, TransactionEnvelope, TransactionExt, TransactionV1Envelope,
    Uint256, VecM, WriteXdr,
};

use crate::error::BuildError;
use crate::ports::TransactionBuilder;
use crate::signer::parse_contract_id;
use crate::types::{AccountRef, ContractCall, SimulationResult, TimeBounds};

/// Minimum inclusion fee per operation, in stroops
pub const BASE_FEE: u32 = 100;

/// Transaction plus the network it will be signed for
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub tx: Transaction,
    pub passphrase: String,
}

impl UnsignedTransaction {
    /// Envelope with no signatures, as accepted by `simulateTransaction`
    pub fn envelope(&self) -> TransactionEnvelope {
        TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: self.tx.clone(),
            signatures: VecM::default(),
        })
    }

    pub fn to_xdr_base64(&self) -> Result<String, BuildError> {
        let bytes = self.envelope().to_xdr(Limits::none())?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    /// Apply simulation output: resource fee, soroban data and, where the
    /// call carried none, the simulated authorization entries.
    pub fn assemble(&self, simulation: &SimulationResult) -> Result<UnsignedTransaction, BuildError> {
        let mut tx = self.tx.clone();

        let resource_fee = u32::try_from(simulation.min_resource_fee).unwrap_or(u32::MAX);
        tx.fee = tx.fee.saturating_add(resource_fee);
        tx.ext = TransactionExt::V1(simulation.transaction_data.clone());

        let mut operations: Vec<Operation> = tx.operations.to_vec();
        for op in operations.iter_mut() {
            if let OperationBody::InvokeHostFunction(invoke) = &mut op.body {
                if invoke.auth.is_empty() && !simulation.auth.is_empty() {
                    invoke.auth = simulation.auth.clone().try_into()?;
                }
            }
        }
        tx.operations = operations.try_into()?;

        Ok(UnsignedTransaction {
            tx,
            passphrase: self.passphrase.clone(),
        })
    }
}

/// Builds single-operation contract invocation transactions
#[derive(Debug, Clone)]
pub struct StellarTransactionBuilder {
    base_fee: u32,
}

impl StellarTransactionBuilder {
    pub fn new(base_fee: u32) -> Self {
        Self { base_fee }
    }
}

impl Default for StellarTransactionBuilder {
    fn default() -> Self {
        Self::new(BASE_FEE)
    }
}

impl TransactionBuilder for StellarTransactionBuilder {
    fn build(
        &self,
        source: &AccountRef,
        passphrase: &str,
        call: &ContractCall,
        time_bounds: TimeBounds,
    ) -> Result<UnsignedTransaction, BuildError> {
        let contract = parse_contract_id(&call.contract_id)?;
        let function_name = StringM::try_from(call.function.as_str())
            .map(ScSymbol)
            .map_err(|_| BuildError::FunctionName(call.function.clone()))?;

        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(InvokeContractArgs {
                    contract_address: ScAddress::Contract(ContractId(Hash(contract))),
                    function_name,
                    args: call.args.clone().try_into()?,
                }),
                auth: call.auth.clone().try_into()?,
            }),
        };

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(source.public_key)),
            fee: self.base_fee,
            seq_num: SequenceNumber(source.next_sequence()),
            cond: Preconditions::Time(stellar_xdr::curr::TimeBounds {
                min_time: TimePoint(time_bounds.min_time),
                max_time: TimePoint(time_bounds.max_time),
            }),
            memo: Memo::None,
            operations: vec![operation].try_into()?,
            ext: TransactionExt::V0,
        };

        Ok(UnsignedTransaction {
            tx,
            passphrase: passphrase.to_string(),
        })
    }
}

// End-to-end ContractInvoker tests against an in-memory chain

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use soroban_tx_core::signer::parse_public_key;
    use soroban_tx_core::{
        AccountError, AccountLoader, AccountRef, ContractCall, ContractInvoker, DriverConfig,
        I128Decoder, InvokeError, Keypair, LifecycleError, RpcEndpoint, SimulationCost,
        SimulationError, SimulationResult, Simulator, StatusRecord, SubmissionError,
        SubmissionHandle, SubmissionRequest, TransportError, U64Decoder, UnsignedTransaction,
        TESTNET_PASSPHRASE,
    };
    use std::time::Duration;
    use stellar_xdr::curr::{
        Int128Parts, Limits, Preconditions, ReadXdr, ScVal, SorobanTransactionData,
        TransactionEnvelope, TransactionExt, WriteXdr,
    };
    use tokio_util::sync::CancellationToken;

    const CONTRACT: &str = "d93f5c7bb0ebc4a9c8f727c5cebc4e41194d38257e1d0d910356b43bfc528813";
    const MIN_RESOURCE_FEE: u64 = 5_000;

    /// ext v0, empty footprint, 100 instructions, no I/O, resource fee 100
    fn transaction_data() -> SorobanTransactionData {
        let mut bytes = vec![0u8; 12];
        bytes.extend_from_slice(&100u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 8]);
        bytes.extend_from_slice(&100i64.to_be_bytes());
        SorobanTransactionData::from_xdr(bytes, Limits::none()).unwrap()
    }

    fn scval_xdr(value: ScVal) -> Vec<u8> {
        value.to_xdr(Limits::none()).unwrap()
    }

    struct InMemoryChain {
        sequence: i64,
        simulation_error: Option<String>,
        return_value: ScVal,
        final_status: StatusRecord,
        submitted: Mutex<Vec<TransactionEnvelope>>,
        polls: Mutex<u32>,
    }

    impl InMemoryChain {
        fn returning(value: ScVal) -> Self {
            Self {
                sequence: 100,
                simulation_error: None,
                final_status: StatusRecord::Success(scval_xdr(value.clone())),
                return_value: value,
                submitted: Mutex::new(Vec::new()),
                polls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl AccountLoader for InMemoryChain {
        async fn load(&self, public_key: &str) -> Result<AccountRef, AccountError> {
            Ok(AccountRef {
                account_id: public_key.to_string(),
                public_key: parse_public_key(public_key)?,
                sequence: self.sequence,
            })
        }
    }

    #[async_trait]
    impl Simulator for InMemoryChain {
        async fn simulate(
            &self,
            _tx: &UnsignedTransaction,
        ) -> Result<SimulationResult, SimulationError> {
            if let Some(error) = &self.simulation_error {
                return Err(SimulationError::Failed(error.clone()));
            }
            Ok(SimulationResult {
                transaction_data: transaction_data(),
                min_resource_fee: MIN_RESOURCE_FEE,
                auth: vec![],
                return_value: Some(scval_xdr(self.return_value.clone())),
                cost: SimulationCost {
                    cpu_instructions: 100,
                    memory_bytes: 64,
                },
                latest_ledger: 1234,
            })
        }
    }

    #[async_trait]
    impl RpcEndpoint for InMemoryChain {
        fn endpoint_id(&self) -> &str {
            "mock://chain"
        }

        async fn submit(
            &self,
            request: &SubmissionRequest,
        ) -> Result<SubmissionHandle, SubmissionError> {
            let envelope = TransactionEnvelope::from_xdr(request.payload(), Limits::none())
                .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
            self.submitted.lock().push(envelope);
            Ok(SubmissionHandle::new("feedface"))
        }

        async fn get_status(
            &self,
            _handle: &SubmissionHandle,
        ) -> Result<StatusRecord, TransportError> {
            let mut polls = self.polls.lock();
            *polls += 1;
            if *polls < 2 {
                Ok(StatusRecord::Pending)
            } else {
                Ok(self.final_status.clone())
            }
        }
    }

    fn config() -> DriverConfig {
        DriverConfig {
            poll_interval: Duration::from_secs(1),
            confirm_timeout: Some(Duration::from_secs(30)),
            ..DriverConfig::default()
        }
    }

    fn invoker(chain: InMemoryChain) -> ContractInvoker<InMemoryChain> {
        ContractInvoker::new(chain, TESTNET_PASSPHRASE, config())
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_and_decode_u64() {
        let invoker = invoker(InMemoryChain::returning(ScVal::U64(1000)));
        let signer = Keypair::from_seed([5u8; 32]);
        let call = ContractCall::new(CONTRACT, "balance");

        let value = invoker
            .invoke_and_decode(&call, &signer, &U64Decoder, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(value, 1000);
        assert_eq!(*invoker.driver().endpoint().polls.lock(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submitted_envelope_is_assembled_and_signed() {
        let invoker = invoker(InMemoryChain::returning(ScVal::Void));
        let signer = Keypair::from_seed([5u8; 32]);
        let call = ContractCall::new(CONTRACT, "bump").arg(ScVal::U32(1));

        let receipt = invoker
            .invoke(&call, &signer, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(receipt.handle.as_str(), "feedface");
        assert_eq!(receipt.fee, 100 + MIN_RESOURCE_FEE as u32);

        let submitted = invoker.driver().endpoint().submitted.lock();
        assert_eq!(submitted.len(), 1);
        match &submitted[0] {
            TransactionEnvelope::Tx(env) => {
                assert_eq!(env.signatures.len(), 1);
                assert_eq!(env.tx.seq_num.0, 101);
                assert_eq!(env.tx.fee, receipt.fee);
                assert!(matches!(env.tx.ext, TransactionExt::V1(_)));
            }
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    fn submitted_time_bounds(invoker: &ContractInvoker<InMemoryChain>) -> (u64, u64) {
        let submitted = invoker.driver().endpoint().submitted.lock();
        match &submitted[0] {
            TransactionEnvelope::Tx(env) => match &env.tx.cond {
                Preconditions::Time(tb) => (tb.min_time.0, tb.max_time.0),
                other => panic!("unexpected preconditions {:?}", other),
            },
            other => panic!("unexpected envelope {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_validity_window_bounds_max_time() {
        let invoker = invoker(InMemoryChain::returning(ScVal::Void)).with_validity(300);
        let before = chrono::Utc::now().timestamp() as u64;

        invoker
            .invoke(
                &ContractCall::new(CONTRACT, "bump"),
                &Keypair::from_seed([5u8; 32]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let (min_time, max_time) = submitted_time_bounds(&invoker);
        assert_eq!(min_time, 0);
        assert!(max_time >= before + 300);
        assert!(max_time <= chrono::Utc::now().timestamp() as u64 + 300);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_time_bounds_are_unbounded() {
        let invoker = invoker(InMemoryChain::returning(ScVal::Void));

        invoker
            .invoke(
                &ContractCall::new(CONTRACT, "bump"),
                &Keypair::from_seed([5u8; 32]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(submitted_time_bounds(&invoker), (0, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ledger_failure_is_remote_execution_failed() {
        let mut chain = InMemoryChain::returning(ScVal::U64(1));
        chain.final_status = StatusRecord::Failed(vec![0xde, 0xad]);
        let invoker = invoker(chain);

        let err = invoker
            .invoke(
                &ContractCall::new(CONTRACT, "balance"),
                &Keypair::from_seed([5u8; 32]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        match err {
            InvokeError::Lifecycle(LifecycleError::RemoteExecutionFailed { handle, reason }) => {
                assert_eq!(handle.as_str(), "feedface");
                assert_eq!(reason, vec![0xde, 0xad]);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_simulation_failure_stops_before_submit() {
        let mut chain = InMemoryChain::returning(ScVal::U64(1));
        chain.simulation_error = Some("HostError: Error(Contract, #1)".into());
        let invoker = invoker(chain);

        let err = invoker
            .invoke(
                &ContractCall::new(CONTRACT, "balance"),
                &Keypair::from_seed([5u8; 32]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InvokeError::Simulation(SimulationError::Failed(_))));
        assert!(invoker.driver().endpoint().submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_simulate_and_decode_token_balance() {
        let balance = ScVal::I128(Int128Parts {
            hi: 0,
            lo: 25_000_000,
        });
        let invoker = invoker(InMemoryChain::returning(balance));
        let source = Keypair::from_seed([5u8; 32]);

        let value = invoker
            .simulate_and_decode(
                &ContractCall::new(CONTRACT, "balance"),
                &soroban_tx_core::Signer::public_key(&source),
                &I128Decoder,
            )
            .await
            .unwrap();

        assert_eq!(value, 25_000_000);
        assert!(invoker.driver().endpoint().submitted.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_contract_id_is_build_error() {
        let invoker = invoker(InMemoryChain::returning(ScVal::Void));

        let err = invoker
            .invoke(
                &ContractCall::new("not-a-contract", "balance"),
                &Keypair::from_seed([5u8; 32]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, InvokeError::Build(_)));
    }
}

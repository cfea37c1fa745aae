use anyhow::{anyhow, bail, Context, Result};
use colored::Colorize;
use soroban_tx_core::decoder::format_decoded;
use soroban_tx_core::signer::{account_address, contract_address};
use soroban_tx_core::{
    ContractCall, ContractInvoker, DriverConfig, I128Decoder, Keypair, NetworkConfig, RpcEndpoint,
    Signer, StatusRecord, StellarRpcClient, SubmissionHandle, TransactionLifecycleDriver,
    U64Decoder, ValueDecoder,
};
use stellar_xdr::curr::{Int128Parts, ScString, ScSymbol, ScVal, StringM, UInt128Parts};
use tokio_util::sync::CancellationToken;

pub fn load_keypair(secret_key: Option<&str>) -> Result<Keypair> {
    let secret = secret_key
        .ok_or_else(|| anyhow!("No secret key given. Pass --secret-key or set STELLAR_SECRET_KEY"))?;
    Keypair::from_secret(secret).context("Failed to parse secret key")
}

fn print_header(title: &str, network: &NetworkConfig) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "=".repeat(80).cyan());
    println!("{}: {}", "Network".bold(), network.network.to_string().bright_blue());
    println!("{}: {}", "RPC".bold(), network.rpc_url.bright_black());
}

/// Token balance of `account` (default: the signer), confirmed on ledger
/// unless `simulate_only` is set.
pub async fn balance(
    network: &NetworkConfig,
    driver_config: DriverConfig,
    signer: &Keypair,
    contract_id: &str,
    account: Option<&str>,
    i128_balance: bool,
    simulate_only: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let holder = account
        .map(str::to_string)
        .unwrap_or_else(|| signer.public_key());
    let call = ContractCall::new(contract_id, "balance").arg(account_address(&holder)?);

    print_header("Token Balance:", network);
    println!("{}: {}", "Account".bold(), holder);

    let client = StellarRpcClient::new(&network.rpc_url);
    let invoker = ContractInvoker::new(client, network.passphrase.clone(), driver_config);

    let value = match (simulate_only, i128_balance) {
        (true, true) => invoker
            .simulate_and_decode(&call, &signer.public_key(), &I128Decoder)
            .await?
            .to_string(),
        (true, false) => invoker
            .simulate_and_decode(&call, &signer.public_key(), &U64Decoder)
            .await?
            .to_string(),
        (false, true) => invoker
            .invoke_and_decode(&call, signer, &I128Decoder, cancel)
            .await?
            .to_string(),
        (false, false) => invoker
            .invoke_and_decode(&call, signer, &U64Decoder, cancel)
            .await?
            .to_string(),
    };

    println!("\n{} {}", "Your Token Balance:".green().bold(), value);
    println!();
    Ok(())
}

/// Invoke an arbitrary contract function and print its return value
pub async fn invoke(
    network: &NetworkConfig,
    driver_config: DriverConfig,
    signer: &Keypair,
    contract_id: &str,
    function: &str,
    args: &[String],
    simulate_only: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut call = ContractCall::new(contract_id, function);
    for raw in args {
        call = call.arg(parse_arg(raw)?);
    }

    print_header("Contract Invocation:", network);
    println!("{}: {}", "Contract".bold(), contract_id);
    println!("{}: {}({} args)", "Function".bold(), function, args.len());

    let client = StellarRpcClient::new(&network.rpc_url);
    let invoker = ContractInvoker::new(client, network.passphrase.clone(), driver_config);

    if simulate_only {
        let simulation = invoker.simulate(&call, &signer.public_key()).await?;
        println!(
            "{}: {} cpu insns, {} mem bytes, min resource fee {}",
            "Cost".bold(),
            simulation.cost.cpu_instructions,
            simulation.cost.memory_bytes,
            simulation.min_resource_fee
        );
        match simulation.return_value {
            Some(bytes) => print_value(&bytes)?,
            None => println!("{}", "No return value.".yellow()),
        }
        return Ok(());
    }

    let receipt = invoker.invoke(&call, signer, cancel).await?;
    println!("{}", "✓ Transaction confirmed".green().bold());
    println!("{}: {}", "Hash".bold(), receipt.handle);
    println!("{}: {} stroops", "Fee".bold(), receipt.fee);

    if receipt.payload.is_empty() {
        println!("{}", "No return value.".yellow());
    } else {
        print_value(&receipt.payload)?;
    }
    println!();
    Ok(())
}

/// Show the status of a submitted transaction, optionally waiting for it
pub async fn status(
    network: &NetworkConfig,
    driver_config: DriverConfig,
    hash: &str,
    wait: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let handle = SubmissionHandle::new(hash);
    let client = StellarRpcClient::new(&network.rpc_url);

    let record = if wait {
        let driver = TransactionLifecycleDriver::new(client, driver_config);
        driver.await_terminal_default(&handle, cancel).await?
    } else {
        client.get_status(&handle).await?
    };

    print_header("Transaction Status:", network);
    println!("{}: {}", "Hash".bold(), handle);

    match &record {
        StatusRecord::Pending => println!("{}: {}", "Status".bold(), "PENDING".yellow()),
        StatusRecord::Success(payload) => {
            println!("{}: {}", "Status".bold(), "SUCCESS".green());
            if !payload.is_empty() {
                print_value(payload)?;
            }
        }
        StatusRecord::Failed(reason) => {
            println!("{}: {}", "Status".bold(), "FAILED".red());
            println!("{}: {}", "Result XDR".bold(), hex_preview(reason));
        }
    }
    println!();
    Ok(())
}

fn print_value(bytes: &[u8]) -> Result<()> {
    use soroban_tx_core::ScalarDecoder;

    let value = ValueDecoder.decode(bytes)?;
    println!("{}: {}", "Result".bold(), format_decoded(&value, 0));
    Ok(())
}

fn hex_preview(bytes: &[u8]) -> String {
    const MAX: usize = 64;
    let hex = hex::encode(bytes);
    if hex.len() > MAX {
        format!("{}... ({} bytes)", &hex[..MAX], bytes.len())
    } else {
        hex
    }
}

/// Parse a `type:value` argument, e.g. `u64:100`, `sym:transfer`,
/// `addr:G...`
pub fn parse_arg(raw: &str) -> Result<ScVal> {
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("Argument '{}' must be of the form type:value", raw))?;

    let scval = match kind {
        "bool" => ScVal::Bool(value.parse().with_context(|| format!("Invalid bool: {}", value))?),
        "u32" => ScVal::U32(value.parse().with_context(|| format!("Invalid u32: {}", value))?),
        "i32" => ScVal::I32(value.parse().with_context(|| format!("Invalid i32: {}", value))?),
        "u64" => ScVal::U64(value.parse().with_context(|| format!("Invalid u64: {}", value))?),
        "i64" => ScVal::I64(value.parse().with_context(|| format!("Invalid i64: {}", value))?),
        "u128" => {
            let n: u128 = value.parse().with_context(|| format!("Invalid u128: {}", value))?;
            ScVal::U128(UInt128Parts {
                hi: (n >> 64) as u64,
                lo: n as u64,
            })
        }
        "i128" => {
            let n: i128 = value.parse().with_context(|| format!("Invalid i128: {}", value))?;
            ScVal::I128(Int128Parts {
                hi: (n >> 64) as i64,
                lo: n as u64,
            })
        }
        "sym" => ScVal::Symbol(ScSymbol(
            StringM::try_from(value).map_err(|_| anyhow!("Invalid symbol: {}", value))?,
        )),
        "str" => ScVal::String(ScString(
            StringM::try_from(value).map_err(|_| anyhow!("Invalid string: {}", value))?,
        )),
        "addr" if value.starts_with('C') => contract_address(value)?,
        "addr" => account_address(value)?,
        other => bail!(
            "Unknown argument type '{}'. Allowed: bool, u32, i32, u64, i64, u128, i128, sym, str, addr",
            other
        ),
    };
    Ok(scval)
}

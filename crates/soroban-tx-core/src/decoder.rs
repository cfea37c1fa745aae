/// XDR decoders for contract return values
use crate::error::DecodeError;
use crate::ports::ScalarDecoder;
use crate::types::DecodedValue;
use std::string::String as StdString;
use std::vec::Vec as StdVec;
use stellar_xdr::curr::{Limits, ReadXdr, ScVal};

/// Decode XDR bytes directly into a DecodedValue
pub fn decode_scval_bytes(bytes: &[u8]) -> Result<DecodedValue, DecodeError> {
    decode_scval_native(&parse_scval(bytes)?)
}

/// Parse raw `ScVal` XDR; an empty payload means no value was returned
pub fn parse_scval(bytes: &[u8]) -> Result<ScVal, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Missing);
    }
    ScVal::from_xdr(bytes, Limits::none()).map_err(|e| DecodeError::Xdr(e.to_string()))
}

/// Decode a native ScVal into DecodedValue
pub fn decode_scval_native(scval: &ScVal) -> Result<DecodedValue, DecodeError> {
    use stellar_xdr::curr::ScVal::*;

    match scval {
        Bool(b) => Ok(DecodedValue::Bool(*b)),
        Void => Ok(DecodedValue::Void),
        Error(e) => Ok(DecodedValue::Error(format!("{:?}", e))),
        U32(n) => Ok(DecodedValue::Uint32(*n)),
        I32(n) => Ok(DecodedValue::Int32(*n)),
        U64(n) => Ok(DecodedValue::Uint64(*n)),
        I64(n) => Ok(DecodedValue::Int64(*n)),
        U128(parts) => Ok(DecodedValue::Uint128(
            ((parts.hi as u128) << 64) | (parts.lo as u128),
        )),
        I128(parts) => Ok(DecodedValue::Int128(
            ((parts.hi as i128) << 64) | (parts.lo as i128),
        )),
        Timepoint(t) => Ok(DecodedValue::Uint64(t.0)),
        Duration(d) => Ok(DecodedValue::Uint64(d.0)),
        U256(parts) => Ok(DecodedValue::Bytes(format!(
            "{:016x}{:016x}{:016x}{:016x}",
            parts.hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo
        ))),
        I256(parts) => Ok(DecodedValue::Bytes(format!(
            "{:016x}{:016x}{:016x}{:016x}",
            parts.hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo
        ))),
        Bytes(b) => Ok(DecodedValue::Bytes(hex::encode(b.as_slice()))),
        String(s) => Ok(DecodedValue::String(
            StdString::from_utf8_lossy(s.as_slice()).to_string(),
        )),
        Symbol(s) => Ok(DecodedValue::Symbol(
            StdString::from_utf8_lossy(s.as_slice()).to_string(),
        )),
        Vec(Some(items)) => {
            let mut decoded = StdVec::new();
            for item in items.0.iter() {
                decoded.push(decode_scval_native(item)?);
            }
            Ok(DecodedValue::Vec(decoded))
        }
        Vec(None) => Ok(DecodedValue::Vec(StdVec::new())),
        Map(Some(entries)) => {
            let mut decoded = StdVec::new();
            for entry in entries.0.iter() {
                decoded.push((
                    decode_scval_native(&entry.key)?,
                    decode_scval_native(&entry.val)?,
                ));
            }
            Ok(DecodedValue::Map(decoded))
        }
        Map(None) => Ok(DecodedValue::Map(StdVec::new())),
        Address(addr) => Ok(DecodedValue::Address(format_address(addr))),
        ContractInstance(_) => Ok(DecodedValue::String("[contract instance]".to_string())),
        LedgerKeyContractInstance => Ok(DecodedValue::String("[ledger key]".to_string())),
        LedgerKeyNonce(_) => Ok(DecodedValue::String("[nonce key]".to_string())),
    }
}

/// Format an address in Stellar strkey format where one exists
fn format_address(addr: &stellar_xdr::curr::ScAddress) -> StdString {
    use stellar_xdr::curr::ScAddress::*;
    match addr {
        Account(a) => match &a.0 {
            stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) => {
                stellar_strkey::ed25519::PublicKey(key.0).to_string()
            }
        },
        Contract(c) => stellar_strkey::Contract(c.0 .0).to_string(),
        MuxedAccount(m) => format!("MuxedAccount({}:{})", hex::encode(m.ed25519.0), m.id),
        ClaimableBalance(b) => match b {
            stellar_xdr::curr::ClaimableBalanceId::ClaimableBalanceIdTypeV0(hash) => {
                format!("ClaimableBalance({})", hex::encode(hash.0))
            }
        },
        LiquidityPool(p) => format!("LiquidityPool({})", hex::encode(p.0 .0)),
    }
}

fn shape_of(scval: &ScVal) -> StdString {
    decode_scval_native(scval)
        .map(|v| v.kind().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Exactly one `u64` return value
#[derive(Debug, Clone, Copy, Default)]
pub struct U64Decoder;

impl ScalarDecoder for U64Decoder {
    type Value = u64;

    fn decode(&self, bytes: &[u8]) -> Result<u64, DecodeError> {
        match parse_scval(bytes)? {
            ScVal::U64(n) => Ok(n),
            other => Err(DecodeError::UnexpectedShape {
                expected: "u64",
                found: shape_of(&other),
            }),
        }
    }
}

/// Any integer return value that fits in `i128` (SEP-41 token balances)
#[derive(Debug, Clone, Copy, Default)]
pub struct I128Decoder;

impl ScalarDecoder for I128Decoder {
    type Value = i128;

    fn decode(&self, bytes: &[u8]) -> Result<i128, DecodeError> {
        match parse_scval(bytes)? {
            ScVal::I128(parts) => Ok(((parts.hi as i128) << 64) | (parts.lo as i128)),
            ScVal::U128(parts) => {
                let value = ((parts.hi as u128) << 64) | (parts.lo as u128);
                i128::try_from(value).map_err(|_| DecodeError::UnexpectedShape {
                    expected: "i128",
                    found: "u128 out of range".to_string(),
                })
            }
            ScVal::U64(n) => Ok(n as i128),
            ScVal::I64(n) => Ok(n as i128),
            ScVal::U32(n) => Ok(n as i128),
            ScVal::I32(n) => Ok(n as i128),
            other => Err(DecodeError::UnexpectedShape {
                expected: "integer",
                found: shape_of(&other),
            }),
        }
    }
}

/// Any return value, as a [`DecodedValue`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueDecoder;

impl ScalarDecoder for ValueDecoder {
    type Value = DecodedValue;

    fn decode(&self, bytes: &[u8]) -> Result<DecodedValue, DecodeError> {
        decode_scval_bytes(bytes)
    }
}

/// Format a decoded value with optional indentation
pub fn format_decoded(value: &DecodedValue, indent: usize) -> StdString {
    let prefix = "  ".repeat(indent);
    match value {
        DecodedValue::Map(entries) => {
            let mut result = StdString::from("{\n");
            for (k, v) in entries {
                result.push_str(&format!(
                    "{}  {}: {},\n",
                    prefix,
                    format_decoded(k, indent + 1),
                    format_decoded(v, indent + 1)
                ));
            }
            result.push_str(&format!("{}}}", prefix));
            result
        }
        DecodedValue::Vec(items) => {
            let mut result = StdString::from("[\n");
            for item in items {
                result.push_str(&format!("{}  {},\n", prefix, format_decoded(item, indent + 1)));
            }
            result.push_str(&format!("{}]", prefix));
            result
        }
        _ => value.to_string(),
    }
}

/// Ed25519 keys, strkey parsing and network-bound transaction signing
use ed25519_dalek::{Signer as _, SigningKey};
use sha2::{Digest, Sha256};
use std::fmt;
use stellar_xdr::curr::{
    AccountId, ContractId, DecoratedSignature, Hash, Limits, PublicKey, ScAddress, ScVal,
    Signature, SignatureHint, Transaction, TransactionEnvelope, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, Uint256, WriteXdr,
};

use crate::builder::UnsignedTransaction;
use crate::error::{BuildError, KeyError};
use crate::ports::Signer;
use crate::types::SubmissionRequest;

/// Signing keypair for a Stellar account
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Parse an `S...` secret seed
    pub fn from_secret(secret: &str) -> Result<Self, KeyError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|_| KeyError::InvalidSecret)?;
        Ok(Self::from_seed(seed.0))
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn secret_seed(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Sign a 32-byte transaction hash
    pub fn sign_hash(&self, hash: &[u8; 32]) -> Result<DecoratedSignature, BuildError> {
        let public = self.public_key_bytes();
        let signature = self.signing_key.sign(hash);

        Ok(DecoratedSignature {
            hint: SignatureHint([public[28], public[29], public[30], public[31]]),
            signature: Signature(signature.to_bytes().to_vec().try_into()?),
        })
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl Signer for Keypair {
    fn public_key(&self) -> String {
        stellar_strkey::ed25519::PublicKey(self.public_key_bytes()).to_string()
    }

    fn sign(&self, tx: &UnsignedTransaction) -> Result<SignedTransaction, BuildError> {
        let hash = transaction_hash(&tx.tx, &tx.passphrase)?;
        let signature = self.sign_hash(&hash)?;

        let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: tx.tx.clone(),
            signatures: vec![signature].try_into()?,
        });

        Ok(SignedTransaction { envelope, hash })
    }
}

/// Envelope ready for submission, with its network hash
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub envelope: TransactionEnvelope,
    pub hash: [u8; 32],
}

impl SignedTransaction {
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn to_xdr(&self) -> Result<Vec<u8>, BuildError> {
        Ok(self.envelope.to_xdr(Limits::none())?)
    }

    pub fn to_xdr_base64(&self) -> Result<String, BuildError> {
        use base64::Engine;
        Ok(base64::engine::general_purpose::STANDARD.encode(self.to_xdr()?))
    }

    pub fn into_request(self, endpoint: &str) -> Result<SubmissionRequest, BuildError> {
        Ok(SubmissionRequest::new(self.to_xdr()?, endpoint))
    }
}

/// SHA-256 of the network passphrase
pub fn network_id(passphrase: &str) -> [u8; 32] {
    let digest = Sha256::digest(passphrase.as_bytes());
    let mut id = [0u8; 32];
    id.copy_from_slice(&digest);
    id
}

/// Hash a transaction is signed over on a given network
pub fn transaction_hash(tx: &Transaction, passphrase: &str) -> Result<[u8; 32], BuildError> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;

    let digest = Sha256::digest(&bytes);
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    Ok(hash)
}

/// Parse a `G...` account strkey into raw key bytes
pub fn parse_public_key(account: &str) -> Result<[u8; 32], KeyError> {
    stellar_strkey::ed25519::PublicKey::from_string(account.trim())
        .map(|k| k.0)
        .map_err(|_| KeyError::InvalidPublicKey(account.to_string()))
}

/// Parse a contract id given as 64 hex chars or a `C...` strkey
pub fn parse_contract_id(contract_id: &str) -> Result<[u8; 32], KeyError> {
    let contract_id = contract_id.trim();

    if contract_id.starts_with('C') {
        return stellar_strkey::Contract::from_string(contract_id)
            .map(|c| c.0)
            .map_err(|_| KeyError::InvalidContractId(contract_id.to_string()));
    }

    let bytes =
        hex::decode(contract_id).map_err(|_| KeyError::InvalidContractId(contract_id.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| KeyError::InvalidContractId(contract_id.to_string()))
}

/// `C...` strkey for raw contract bytes
pub fn contract_strkey(contract: &[u8; 32]) -> String {
    stellar_strkey::Contract(*contract).to_string()
}

pub fn account_id(public_key: [u8; 32]) -> AccountId {
    AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(public_key)))
}

/// `Address` argument for an account
pub fn account_address(account: &str) -> Result<ScVal, KeyError> {
    let key = parse_public_key(account)?;
    Ok(ScVal::Address(ScAddress::Account(account_id(key))))
}

/// `Address` argument for a contract
pub fn contract_address(contract_id: &str) -> Result<ScVal, KeyError> {
    let contract = parse_contract_id(contract_id)?;
    Ok(ScVal::Address(ScAddress::Contract(ContractId(Hash(contract)))))
}

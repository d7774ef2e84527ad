// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account keys and transaction signing.
//!
//! A [`SigningIdentity`] wraps an Ed25519 secret and the account address
//! derived from it. Identities are built per request and dropped with it;
//! the secret is zeroized on drop by `ed25519-dalek`.

use std::fmt;

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use sha3::{Digest, Sha3_256};

use super::client::ChainError;
use super::types::{AccountAddress, RawTransaction, SignedTransaction, TransactionAuthenticator};

/// Domain separator prepended to the BCS bytes of a raw transaction.
const RAW_TRANSACTION_SALT: &[u8] = b"SUPRA::RawTransaction";

/// Authentication key scheme byte for single Ed25519 keys.
const ED25519_SCHEME: u8 = 0x00;

/// Ed25519 signing identity.
pub struct SigningIdentity {
    key: SigningKey,
    address: AccountAddress,
}

impl SigningIdentity {
    /// Build an identity from a hex-encoded 32-byte private key.
    ///
    /// Accepts an optional `0x` prefix and surrounding whitespace.
    ///
    /// # Errors
    /// `ChainError::MalformedKey` if the input is not hex or not 32 bytes.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, ChainError> {
        let trimmed = private_key_hex.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let bytes = hex::decode(digits)
            .map_err(|e| ChainError::MalformedKey(format!("not valid hex: {e}")))?;
        let secret: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            ChainError::MalformedKey(format!(
                "expected 32 bytes for an Ed25519 key, got {}",
                bytes.len()
            ))
        })?;

        Ok(Self::from_bytes(&secret))
    }

    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let key = SigningKey::from_bytes(secret);
        let address = derive_address(&key.verifying_key());
        Self { key, address }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }

    pub fn public_key_hex(&self) -> String {
        format!("0x{}", hex::encode(self.public_key()))
    }

    /// Sign a raw transaction.
    pub fn sign_transaction(&self, raw_txn: RawTransaction) -> Result<SignedTransaction, ChainError> {
        let message = signing_message(&raw_txn)?;
        let signature = self.key.sign(&message);

        Ok(SignedTransaction {
            raw_txn,
            authenticator: TransactionAuthenticator::Ed25519 {
                public_key: self.public_key().to_vec(),
                signature: signature.to_bytes().to_vec(),
            },
        })
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Account address for a single Ed25519 key: `sha3_256(public_key || 0x00)`.
pub fn derive_address(public_key: &VerifyingKey) -> AccountAddress {
    let mut hasher = Sha3_256::new();
    hasher.update(public_key.as_bytes());
    hasher.update([ED25519_SCHEME]);
    AccountAddress::new(hasher.finalize().into())
}

/// Bytes covered by the transaction signature.
pub fn signing_message(raw_txn: &RawTransaction) -> Result<Vec<u8>, ChainError> {
    let mut message = Sha3_256::digest(RAW_TRANSACTION_SALT).to_vec();
    message.extend_from_slice(&raw_txn.to_bcs()?);
    Ok(message)
}

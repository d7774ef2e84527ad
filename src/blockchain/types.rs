// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Move transaction types and their wire encodings.
//!
//! Every type here serializes two ways through the same serde impls:
//! BCS (non human-readable) for signing and hashing, and JSON (human-readable)
//! for the node's RPC surface. Addresses and key material switch between raw
//! bytes and `0x`-prefixed hex depending on the format.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha3::{Digest, Sha3_256};
use utoipa::ToSchema;

use super::client::ChainError;

/// Domain separator prepended to committed transactions before hashing.
const TRANSACTION_SALT: &[u8] = b"SUPRA::Transaction";

// =============================================================================
// Account Address
// =============================================================================

/// 32-byte Move account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; AccountAddress::LENGTH]);

impl AccountAddress {
    pub const LENGTH: usize = 32;

    /// The framework address `0x1`.
    pub const ONE: Self = {
        let mut bytes = [0u8; Self::LENGTH];
        bytes[Self::LENGTH - 1] = 1;
        Self(bytes)
    };

    pub const fn new(bytes: [u8; Self::LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Self::LENGTH] {
        &self.0
    }

    /// Full-width lowercase hex with `0x` prefix.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a hex address. The `0x` prefix is optional and short forms such
    /// as `0x1` are left-padded with zeros.
    pub fn from_hex_literal(raw: &str) -> Result<Self, ChainError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(ChainError::InvalidAddress(format!("`{raw}` is empty")));
        }
        if digits.len() > Self::LENGTH * 2 {
            return Err(ChainError::InvalidAddress(format!(
                "`{raw}` is longer than {} hex characters",
                Self::LENGTH * 2
            )));
        }

        let padded = format!("{digits:0>width$}", width = Self::LENGTH * 2);
        let mut bytes = [0u8; Self::LENGTH];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| ChainError::InvalidAddress(format!("`{raw}`: {e}")))?;
        Ok(Self(bytes))
    }
}

impl FromStr for AccountAddress {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex_literal(s)
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.to_hex())
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let raw = String::deserialize(deserializer)?;
            Self::from_hex_literal(&raw).map_err(de::Error::custom)
        } else {
            <[u8; Self::LENGTH]>::deserialize(deserializer).map(Self)
        }
    }
}

// =============================================================================
// Type Tags
// =============================================================================

/// Move type tag. Variant order matches the on-chain BCS indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
}

impl TypeTag {
    pub fn struct_tag(tag: StructTag) -> Self {
        TypeTag::Struct(Box::new(tag))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{inner}>"),
            TypeTag::Struct(tag) => write!(f, "{tag}"),
        }
    }
}

/// Fully qualified struct type: `<address>::<module>::<name><type_args>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
    pub type_args: Vec<TypeTag>,
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_args.is_empty() {
            let args: Vec<String> = self.type_args.iter().map(ToString::to_string).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Transactions
// =============================================================================

/// Module identifier (`address::name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleId {
    pub address: AccountAddress,
    pub name: String,
}

/// Call to a public entry function. Arguments are already BCS-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunction {
    pub module: ModuleId,
    pub function: String,
    pub ty_args: Vec<TypeTag>,
    pub args: Vec<Vec<u8>>,
}

impl EntryFunction {
    pub fn new(
        module_address: AccountAddress,
        module_name: impl Into<String>,
        function: impl Into<String>,
        ty_args: Vec<TypeTag>,
        args: Vec<Vec<u8>>,
    ) -> Self {
        Self {
            module: ModuleId {
                address: module_address,
                name: module_name.into(),
            },
            function: function.into(),
            ty_args,
            args,
        }
    }

    /// `address::module::function`, as logged and as used by view calls.
    pub fn qualified_name(&self) -> String {
        format!(
            "{}::{}::{}",
            self.module.address, self.module.name, self.function
        )
    }
}

/// Transaction payload. Only entry function calls are produced here, but the
/// variant keeps its on-chain index (2) so the encoding stays compatible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionPayload {
    EntryFunction(EntryFunction),
}

impl TransactionPayload {
    pub fn entry_function(&self) -> &EntryFunction {
        match self {
            TransactionPayload::EntryFunction(call) => call,
        }
    }
}

impl Serialize for TransactionPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TransactionPayload::EntryFunction(call) => {
                serializer.serialize_newtype_variant("TransactionPayload", 2, "EntryFunction", call)
            }
        }
    }
}

/// Unsigned transaction. Field order is the BCS layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawTransaction {
    pub sender: AccountAddress,
    pub sequence_number: u64,
    pub payload: TransactionPayload,
    pub max_gas_amount: u64,
    pub gas_unit_price: u64,
    pub expiration_timestamp_secs: u64,
    pub chain_id: u8,
}

impl RawTransaction {
    pub fn to_bcs(&self) -> Result<Vec<u8>, ChainError> {
        bcs::to_bytes(self).map_err(|e| ChainError::Encoding(e.to_string()))
    }
}

/// Ed25519 account authenticator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TransactionAuthenticator {
    Ed25519 {
        #[serde(with = "hex_bytes")]
        public_key: Vec<u8>,
        #[serde(with = "hex_bytes")]
        signature: Vec<u8>,
    },
}

/// Signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    pub raw_txn: RawTransaction,
    pub authenticator: TransactionAuthenticator,
}

impl SignedTransaction {
    /// Copy of `raw_txn` carrying a zeroed signature, as the node expects for
    /// simulation requests.
    pub fn for_simulation(raw_txn: RawTransaction, public_key: [u8; 32]) -> Self {
        Self {
            raw_txn,
            authenticator: TransactionAuthenticator::Ed25519 {
                public_key: public_key.to_vec(),
                signature: vec![0u8; 64],
            },
        }
    }

    pub fn function(&self) -> &str {
        &self.raw_txn.payload.entry_function().function
    }

    /// Hash of the committed user transaction:
    /// `sha3_256(sha3_256(salt) || 0x00 || bcs(self))`.
    pub fn committed_hash(&self) -> Result<String, ChainError> {
        let body = bcs::to_bytes(self).map_err(|e| ChainError::Encoding(e.to_string()))?;
        let mut hasher = Sha3_256::new();
        hasher.update(Sha3_256::digest(TRANSACTION_SALT));
        hasher.update([0u8]);
        hasher.update(&body);
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

/// BCS-encode a single entry function argument.
pub fn bcs_arg<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ChainError> {
    bcs::to_bytes(value).map_err(|e| ChainError::Encoding(e.to_string()))
}

/// Byte vectors as `0x` hex in JSON and as length-prefixed bytes in BCS.
mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }
}

// =============================================================================
// Node Responses
// =============================================================================

/// Account state as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub sequence_number: u64,
    #[serde(default)]
    pub authentication_key: Option<String>,
}

fn u64_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("{n} is not a u64"))),
        Value::String(s) => s.parse().map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected u64, got {other}"))),
    }
}

/// Execution status reported for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainTxStatus {
    Pending,
    Success,
    Fail,
    Invalid,
}

impl ChainTxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChainTxStatus::Pending)
    }
}

/// A transaction as returned by `GET /rpc/v1/transactions/{hash}`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub hash: String,
    pub status: ChainTxStatus,
    pub vm_status: Option<String>,
    pub raw: Value,
}

impl TransactionRecord {
    /// Interpret a node response. Unknown status strings are treated as
    /// pending so polling continues until the confirmation deadline.
    pub fn from_json(hash: &str, raw: Value) -> Self {
        let status = match raw.get("status").and_then(Value::as_str) {
            Some(s) if s.eq_ignore_ascii_case("success") => ChainTxStatus::Success,
            Some(s) if s.eq_ignore_ascii_case("fail") || s.eq_ignore_ascii_case("failed") => {
                ChainTxStatus::Fail
            }
            Some(s) if s.eq_ignore_ascii_case("invalid") => ChainTxStatus::Invalid,
            _ => ChainTxStatus::Pending,
        };
        let vm_status = vm_status(&raw);
        Self {
            hash: raw
                .get("hash")
                .and_then(Value::as_str)
                .unwrap_or(hash)
                .to_string(),
            status,
            vm_status,
            raw,
        }
    }
}

/// VM status message, wherever the node placed it.
pub fn vm_status(raw: &Value) -> Option<String> {
    ["/output/Move/vm_status", "/vm_status", "/0/vm_status"]
        .iter()
        .find_map(|pointer| raw.pointer(pointer))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// =============================================================================
// Submission Result
// =============================================================================

/// Outcome of a submission as seen by API callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Accepted by the node, confirmation not awaited.
    Pending,
    /// Executed successfully on chain.
    Success,
}

/// Result of one transaction submission.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    /// Transaction hash (0x-prefixed hex)
    pub tx_hash: String,
    /// Chain outcome
    pub status: SubmissionStatus,
    /// Sequence number the transaction was signed with
    pub sequence_number: u64,
    /// VM status reported by the node, when confirmed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_status: Option<String>,
    /// Raw simulation output
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub simulation: Option<Value>,
    /// Raw transaction record returned by the node after confirmation
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub transaction: Option<Value>,
}

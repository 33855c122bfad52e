use std::{cmp::min, fmt::Display};

use bytes::Bytes;
use ethereum_types::{Address, H256, Signature, U256};
use keccak_hash::keccak;
use once_cell::sync::OnceCell;
use secp256k1::{ecdsa::RecoveryId, Message};
use serde::{ser::SerializeStruct, Serialize};
use sha3::{Digest, Keccak256};
use tracing::debug;

use corten_rlp::{
    constants::RLP_NULL,
    decode::{decode_rlp_item, is_encoded_as_bytes, RLPDecode},
    encode::RLPEncode,
    error::RLPDecodeError,
    structs::{Decoder, Encoder},
};

use crate::constants::SECP256K1_N_HALF;
use crate::types::{access_list_cost, AccessList, AccessListEntry, ChainConfig, Fork};

pub use serde_impl::GenericTransaction;

// The `#[serde(untagged)]` attribute allows the `Transaction` enum to be serialized without
// a tag indicating the variant type. Serde serializes each variant directly through the
// serialization logic implemented for its inner type.
//
// A custom Deserialization method is implemented to match the specific transaction `type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Transaction {
    LegacyTransaction(LegacyTransaction),
    EIP2930Transaction(EIP2930Transaction),
    EIP1559Transaction(EIP1559Transaction),
    DepositTransaction(DepositTransaction),
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u64,
    pub gas: u64,
    /// The recipient of the transaction.
    /// Create transactions contain a [`null`](RLP_NULL) value in this field.
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub v: U256,
    pub r: U256,
    pub s: U256,
    pub inner_hash: OnceCell<H256>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EIP2930Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
    pub inner_hash: OnceCell<H256>,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct EIP1559Transaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_priority_fee_per_gas: u64,
    pub max_fee_per_gas: u64,
    pub gas_limit: u64,
    pub to: TxKind,
    pub value: U256,
    pub data: Bytes,
    pub access_list: AccessList,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
    pub inner_hash: OnceCell<H256>,
}

/// Settlement-layer originated transaction, minted on this chain rather than
/// signed by its sender.
///
/// The wire format is `0x7e || rlp([source_hash, from, to, mint, value,
/// gas_limit, is_system_tx, data])`. Deposits never carry gas pricing, an
/// access list, or a signature on the wire; the signature fields below exist
/// so deposits expose the same signing surface as the signed variants and are
/// ignored by the encoder.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DepositTransaction {
    /// Uniquely identifies the settlement-layer event that produced this
    /// deposit.
    pub source_hash: H256,
    /// Deposits are pre-authorized by the settlement layer, so the sender is
    /// an explicit field instead of being recovered from a signature.
    pub from: Address,
    pub to: TxKind,
    /// Amount created on this chain and credited to `from` before execution.
    pub mint: U256,
    pub value: U256,
    pub gas_limit: u64,
    /// Exempts the transaction from gas metering. Retired by the regolith
    /// fork: configurations that schedule it force this to false.
    pub is_system_tx: bool,
    pub data: Bytes,
    pub signature_y_parity: bool,
    pub signature_r: U256,
    pub signature_s: U256,
    pub inner_hash: OnceCell<H256>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TxType {
    #[default]
    Legacy = 0x00,
    EIP2930 = 0x01,
    EIP1559 = 0x02,
    // Same type prefix Optimism assigns to its deposited transactions
    // https://github.com/ethereum-optimism/specs/blob/main/specs/protocol/deposits.md#the-deposited-transaction-type
    Deposit = 0x7e,
}

impl From<TxType> for u8 {
    fn from(val: TxType) -> Self {
        match val {
            TxType::Legacy => 0x00,
            TxType::EIP2930 => 0x01,
            TxType::EIP1559 => 0x02,
            TxType::Deposit => 0x7e,
        }
    }
}

impl TxType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Legacy),
            0x01 => Some(Self::EIP2930),
            0x02 => Some(Self::EIP1559),
            0x7e => Some(Self::Deposit),
            _ => None,
        }
    }
}

impl Display for TxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxType::Legacy => write!(f, "Legacy"),
            TxType::EIP2930 => write!(f, "EIP2930"),
            TxType::EIP1559 => write!(f, "EIP1559"),
            TxType::Deposit => write!(f, "Deposit"),
        }
    }
}

/// The transaction's kind: call or create.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum TxKind {
    Call(Address),
    #[default]
    Create,
}

impl RLPEncode for TxKind {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Self::Call(address) => address.encode(buf),
            Self::Create => buf.put_u8(RLP_NULL),
        }
    }
}

impl RLPDecode for TxKind {
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        let first_byte = rlp.first().ok_or(RLPDecodeError::InvalidLength)?;
        if *first_byte == RLP_NULL {
            return Ok((Self::Create, &rlp[1..]));
        }
        Address::decode_unfinished(rlp).map(|(t, rest)| (Self::Call(t), rest))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Expected a type {expected} transaction, found type {found:#04x}")]
    TypeMismatch { expected: TxType, found: u8 },
    #[error("Chain configuration does not schedule the {0} fork")]
    UnsupportedFork(Fork),
    #[error("Signature s value is above half the curve order")]
    SignatureMalleability,
    #[error(transparent)]
    Rlp(#[from] RLPDecodeError),
}

/// Behavior bundles a variant opts into.
///
/// The set is a static, per-variant declaration used for validation and
/// assertions only; encoding, hashing and signing are resolved statically on
/// the variant types themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxCapability {
    LegacySigning,
    TypedEnvelope,
    AccessLists,
    FeeMarket,
}

static EMPTY_ACCESS_LIST: AccessList = Vec::new();

/// Type-prefixed framing shared by every non-legacy variant: the canonical
/// encoding is the one-byte type tag followed by the RLP list of the
/// variant's wire fields.
pub trait TypedEnvelope: RLPEncode + RLPDecode {
    const TYPE: TxType;

    fn encode_canonical(&self, buf: &mut dyn bytes::BufMut) {
        buf.put_u8(Self::TYPE as u8);
        self.encode(buf);
    }

    fn encode_canonical_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_canonical(&mut buf);
        buf
    }

    /// Inverse of [`TypedEnvelope::encode_canonical`]. The leading byte must
    /// match the variant's own type tag.
    fn decode_canonical(bytes: &[u8]) -> Result<Self, TransactionError> {
        match bytes.first() {
            Some(tag) if *tag == Self::TYPE as u8 => Ok(Self::decode(&bytes[1..])?),
            Some(tag) => Err(TransactionError::TypeMismatch {
                expected: Self::TYPE,
                found: *tag,
            }),
            None => Err(TransactionError::Rlp(RLPDecodeError::InvalidLength)),
        }
    }

    /// Content hash of the framed encoding.
    fn canonical_hash(&self) -> H256 {
        keccak(self.encode_canonical_to_vec())
    }
}

impl TypedEnvelope for EIP2930Transaction {
    const TYPE: TxType = TxType::EIP2930;
}

impl TypedEnvelope for EIP1559Transaction {
    const TYPE: TxType = TxType::EIP1559;
}

impl TypedEnvelope for DepositTransaction {
    const TYPE: TxType = TxType::Deposit;
}

/// Fee-market pricing against a block's base fee.
pub trait FeeMarketPricing {
    fn max_fee_per_gas(&self) -> u64;
    fn max_priority_fee_per_gas(&self) -> u64;
    fn gas_limit(&self) -> u64;
    fn value(&self) -> U256;

    /// Tip actually paid on top of `base_fee`, clamped at zero when the fee
    /// cap does not cover the base fee.
    fn effective_priority_fee(&self, base_fee: u64) -> u64 {
        min(
            self.max_priority_fee_per_gas(),
            self.max_fee_per_gas().saturating_sub(base_fee),
        )
    }

    /// Wei reserved before execution: gas at the effective price, plus the
    /// transferred value. Computed in 256 bits so gas * price cannot wrap.
    fn upfront_cost(&self, base_fee: u64) -> U256 {
        let effective_gas_price =
            U256::from(base_fee) + U256::from(self.effective_priority_fee(base_fee));
        U256::from(self.gas_limit())
            .saturating_mul(effective_gas_price)
            .saturating_add(self.value())
    }
}

impl FeeMarketPricing for EIP1559Transaction {
    fn max_fee_per_gas(&self) -> u64 {
        self.max_fee_per_gas
    }
    fn max_priority_fee_per_gas(&self) -> u64 {
        self.max_priority_fee_per_gas
    }
    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }
    fn value(&self) -> U256 {
        self.value
    }
}

// Deposits are not fee-market priced; the capability is active for interface
// parity only and both caps are pinned to zero.
impl FeeMarketPricing for DepositTransaction {
    fn max_fee_per_gas(&self) -> u64 {
        0
    }
    fn max_priority_fee_per_gas(&self) -> u64 {
        0
    }
    fn gas_limit(&self) -> u64 {
        self.gas_limit
    }
    fn value(&self) -> U256 {
        self.value
    }
}

/// Access-list handling for the variants that declare it.
pub trait WithAccessList {
    fn access_list(&self) -> &AccessList;

    fn access_list_entries(&self) -> Vec<AccessListEntry> {
        self.access_list().iter().map(AccessListEntry::from).collect()
    }

    /// Intrinsic gas the access list adds to the transaction.
    fn access_list_gas_cost(&self) -> u64 {
        access_list_cost(self.access_list())
    }
}

impl WithAccessList for EIP2930Transaction {
    fn access_list(&self) -> &AccessList {
        &self.access_list
    }
}

impl WithAccessList for EIP1559Transaction {
    fn access_list(&self) -> &AccessList {
        &self.access_list
    }
}

// Deposits carry no access list on the wire; the capability is pinned empty.
impl WithAccessList for DepositTransaction {
    fn access_list(&self) -> &AccessList {
        &EMPTY_ACCESS_LIST
    }
}

impl Transaction {
    pub fn tx_type(&self) -> TxType {
        match self {
            Transaction::LegacyTransaction(_) => TxType::Legacy,
            Transaction::EIP2930Transaction(_) => TxType::EIP2930,
            Transaction::EIP1559Transaction(_) => TxType::EIP1559,
            Transaction::DepositTransaction(_) => TxType::Deposit,
        }
    }

    /// The capability set the variant declared at its definition. Encoding and
    /// signing never dispatch through this; it exists for validation and
    /// assertions.
    pub fn capabilities(&self) -> &'static [TxCapability] {
        match self {
            Transaction::LegacyTransaction(_) => &[TxCapability::LegacySigning],
            Transaction::EIP2930Transaction(_) => {
                &[TxCapability::TypedEnvelope, TxCapability::AccessLists]
            }
            Transaction::EIP1559Transaction(_) => &[
                TxCapability::TypedEnvelope,
                TxCapability::AccessLists,
                TxCapability::FeeMarket,
            ],
            // Deposits declare the full typed set for interface uniformity
            // even though their fee and access-list state is pinned.
            Transaction::DepositTransaction(_) => &[
                TxCapability::TypedEnvelope,
                TxCapability::AccessLists,
                TxCapability::FeeMarket,
            ],
        }
    }

    pub fn supports(&self, capability: TxCapability) -> bool {
        self.capabilities().contains(&capability)
    }

    fn calc_effective_gas_price(&self, base_fee_per_gas: Option<u64>) -> Option<u64> {
        debug_assert!(self.supports(TxCapability::FeeMarket));
        if self.max_fee_per_gas()? < base_fee_per_gas? {
            // This is invalid, can't calculate
            return None;
        }

        let priority_fee_per_gas = min(
            self.max_priority_fee()?,
            self.max_fee_per_gas()?.saturating_sub(base_fee_per_gas?),
        );
        Some(priority_fee_per_gas + base_fee_per_gas?)
    }

    pub fn effective_gas_price(&self, base_fee_per_gas: Option<u64>) -> Option<u64> {
        match self.tx_type() {
            TxType::Legacy => Some(self.gas_price()),
            TxType::EIP2930 => Some(self.gas_price()),
            TxType::EIP1559 => self.calc_effective_gas_price(base_fee_per_gas),
            // Deposits pay for their gas on the settlement layer.
            TxType::Deposit => Some(0),
        }
    }

    pub fn cost_without_base_fee(&self) -> Option<U256> {
        let price = match self.tx_type() {
            TxType::Legacy => self.gas_price(),
            TxType::EIP2930 => self.gas_price(),
            TxType::EIP1559 => self.max_fee_per_gas()?,
            TxType::Deposit => 0,
        };

        Some(U256::saturating_add(
            U256::saturating_mul(price.into(), self.gas_limit().into()),
            self.value(),
        ))
    }

    pub fn sender(&self) -> Result<Address, secp256k1::Error> {
        match self {
            Transaction::LegacyTransaction(tx) => {
                let chain_id = self.chain_id();
                let signature_y_parity = match chain_id {
                    Some(chain_id) => tx.v.low_u64().saturating_sub(35 + chain_id * 2) != 0,
                    None => tx.v.low_u64().saturating_sub(27) != 0,
                };
                let mut sig = [0u8; 65];
                sig[..32].copy_from_slice(&tx.r.to_big_endian());
                sig[32..64].copy_from_slice(&tx.s.to_big_endian());
                sig[64] = signature_y_parity as u8;
                recover_address_from_message(
                    Signature::from_slice(&sig),
                    &Bytes::from(tx.signing_payload(chain_id)),
                )
            }
            Transaction::EIP2930Transaction(tx) => {
                let mut sig = [0u8; 65];
                sig[..32].copy_from_slice(&tx.signature_r.to_big_endian());
                sig[32..64].copy_from_slice(&tx.signature_s.to_big_endian());
                sig[64] = tx.signature_y_parity as u8;
                recover_address_from_message(
                    Signature::from_slice(&sig),
                    &Bytes::from(tx.signing_payload()),
                )
            }
            Transaction::EIP1559Transaction(tx) => {
                let mut sig = [0u8; 65];
                sig[..32].copy_from_slice(&tx.signature_r.to_big_endian());
                sig[32..64].copy_from_slice(&tx.signature_s.to_big_endian());
                sig[64] = tx.signature_y_parity as u8;
                recover_address_from_message(
                    Signature::from_slice(&sig),
                    &Bytes::from(tx.signing_payload()),
                )
            }
            // The settlement layer already authorized the sender.
            Transaction::DepositTransaction(tx) => Ok(tx.from),
        }
    }

    pub fn gas_limit(&self) -> u64 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.gas,
            Transaction::EIP2930Transaction(tx) => tx.gas_limit,
            Transaction::EIP1559Transaction(tx) => tx.gas_limit,
            Transaction::DepositTransaction(tx) => tx.gas_limit,
        }
    }

    pub fn gas_price(&self) -> u64 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.gas_price,
            Transaction::EIP2930Transaction(tx) => tx.gas_price,
            Transaction::EIP1559Transaction(tx) => tx.max_fee_per_gas,
            Transaction::DepositTransaction(_) => 0,
        }
    }

    pub fn to(&self) -> TxKind {
        match self {
            Transaction::LegacyTransaction(tx) => tx.to.clone(),
            Transaction::EIP2930Transaction(tx) => tx.to.clone(),
            Transaction::EIP1559Transaction(tx) => tx.to.clone(),
            Transaction::DepositTransaction(tx) => tx.to.clone(),
        }
    }

    pub fn value(&self) -> U256 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.value,
            Transaction::EIP2930Transaction(tx) => tx.value,
            Transaction::EIP1559Transaction(tx) => tx.value,
            Transaction::DepositTransaction(tx) => tx.value,
        }
    }

    pub fn max_priority_fee(&self) -> Option<u64> {
        match self {
            Transaction::LegacyTransaction(_tx) => None,
            Transaction::EIP2930Transaction(_tx) => None,
            Transaction::EIP1559Transaction(tx) => Some(tx.max_priority_fee_per_gas),
            Transaction::DepositTransaction(tx) => Some(FeeMarketPricing::max_priority_fee_per_gas(tx)),
        }
    }

    pub fn max_fee_per_gas(&self) -> Option<u64> {
        match self {
            Transaction::LegacyTransaction(_tx) => None,
            Transaction::EIP2930Transaction(_tx) => None,
            Transaction::EIP1559Transaction(tx) => Some(tx.max_fee_per_gas),
            Transaction::DepositTransaction(tx) => Some(FeeMarketPricing::max_fee_per_gas(tx)),
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            Transaction::LegacyTransaction(tx) => derive_legacy_chain_id(tx.v),
            Transaction::EIP2930Transaction(tx) => Some(tx.chain_id),
            Transaction::EIP1559Transaction(tx) => Some(tx.chain_id),
            // The wire format carries no chain id; deposits bind to a chain
            // through the configuration checked at construction.
            Transaction::DepositTransaction(_) => None,
        }
    }

    pub fn access_list(&self) -> &AccessList {
        match self {
            Transaction::LegacyTransaction(_tx) => &EMPTY_ACCESS_LIST,
            Transaction::EIP2930Transaction(tx) => &tx.access_list,
            Transaction::EIP1559Transaction(tx) => &tx.access_list,
            Transaction::DepositTransaction(tx) => WithAccessList::access_list(tx),
        }
    }

    pub fn nonce(&self) -> u64 {
        match self {
            Transaction::LegacyTransaction(tx) => tx.nonce,
            Transaction::EIP2930Transaction(tx) => tx.nonce,
            Transaction::EIP1559Transaction(tx) => tx.nonce,
            // Deposits are ordered by their settlement-layer origin.
            Transaction::DepositTransaction(_) => 0,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            Transaction::LegacyTransaction(tx) => &tx.data,
            Transaction::EIP2930Transaction(tx) => &tx.data,
            Transaction::EIP1559Transaction(tx) => &tx.data,
            Transaction::DepositTransaction(tx) => &tx.data,
        }
    }

    pub fn mint(&self) -> Option<U256> {
        match self {
            Transaction::DepositTransaction(tx) => Some(tx.mint),
            _ => None,
        }
    }

    pub fn source_hash(&self) -> Option<H256> {
        match self {
            Transaction::DepositTransaction(tx) => Some(tx.source_hash),
            _ => None,
        }
    }

    pub fn is_contract_creation(&self) -> bool {
        match &self {
            Transaction::LegacyTransaction(t) => matches!(t.to, TxKind::Create),
            Transaction::EIP2930Transaction(t) => matches!(t.to, TxKind::Create),
            Transaction::EIP1559Transaction(t) => matches!(t.to, TxKind::Create),
            Transaction::DepositTransaction(t) => matches!(t.to, TxKind::Create),
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self, Transaction::DepositTransaction(_))
    }

    fn compute_hash(&self) -> H256 {
        keccak(self.encode_canonical_to_vec())
    }

    pub fn hash(&self) -> H256 {
        let inner_hash = match self {
            Transaction::LegacyTransaction(tx) => &tx.inner_hash,
            Transaction::EIP2930Transaction(tx) => &tx.inner_hash,
            Transaction::EIP1559Transaction(tx) => &tx.inner_hash,
            Transaction::DepositTransaction(tx) => &tx.inner_hash,
        };

        *inner_hash.get_or_init(|| self.compute_hash())
    }

    pub fn gas_tip_cap(&self) -> u64 {
        self.max_priority_fee().unwrap_or(self.gas_price())
    }

    pub fn gas_fee_cap(&self) -> u64 {
        self.max_fee_per_gas().unwrap_or(self.gas_price())
    }

    pub fn effective_gas_tip(&self, base_fee: Option<u64>) -> Option<u64> {
        let Some(base_fee) = base_fee else {
            return Some(self.gas_tip_cap());
        };
        self.gas_fee_cap()
            .checked_sub(base_fee)
            .map(|tip| min(tip, self.gas_tip_cap()))
    }

    /// Returns whether the transaction is replay-protected.
    /// For more information check out [EIP-155](https://github.com/ethereum/EIPs/blob/master/EIPS/eip-155.md)
    pub fn protected(&self) -> bool {
        match self {
            Transaction::LegacyTransaction(tx) if tx.v.bits() <= 8 => {
                let v = tx.v.low_u64();
                v != 27 && v != 28 && v != 1 && v != 0
            }
            _ => true,
        }
    }
}

impl RLPEncode for LegacyTransaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.v)
            .encode_field(&self.r)
            .encode_field(&self.s)
            .finish();
    }
}

impl RLPEncode for EIP2930Transaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
            .encode_field(&self.signature_y_parity)
            .encode_field(&self.signature_r)
            .encode_field(&self.signature_s)
            .finish()
    }
}

impl RLPEncode for EIP1559Transaction {
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.max_priority_fee_per_gas)
            .encode_field(&self.max_fee_per_gas)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
            .encode_field(&self.signature_y_parity)
            .encode_field(&self.signature_r)
            .encode_field(&self.signature_s)
            .finish()
    }
}

impl RLPEncode for DepositTransaction {
    // Exactly the eight wire fields, in their fixed order. Signature, access
    // list and fee state never reach the encoding.
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        Encoder::new(buf)
            .encode_field(&self.source_hash)
            .encode_field(&self.from)
            .encode_field(&self.to)
            .encode_field(&self.mint)
            .encode_field(&self.value)
            .encode_field(&self.gas_limit)
            .encode_field(&self.is_system_tx)
            .encode_field(&self.data)
            .finish()
    }
}

impl RLPDecode for LegacyTransaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(LegacyTransaction, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, decoder) = decoder.decode_field("gas_price")?;
        let (gas, decoder) = decoder.decode_field("gas")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (v, decoder) = decoder.decode_field("v")?;
        let (r, decoder) = decoder.decode_field("r")?;
        let (s, decoder) = decoder.decode_field("s")?;
        let inner_hash = OnceCell::new();

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas,
            to,
            value,
            data,
            v,
            r,
            s,
            inner_hash,
        };
        Ok((tx, decoder.finish()?))
    }
}

impl RLPDecode for EIP2930Transaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(EIP2930Transaction, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (chain_id, decoder) = decoder.decode_field("chain_id")?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (gas_price, decoder) = decoder.decode_field("gas_price")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (access_list, decoder) = decoder.decode_field("access_list")?;
        let (signature_y_parity, decoder) = decoder.decode_field("signature_y_parity")?;
        let (signature_r, decoder) = decoder.decode_field("signature_r")?;
        let (signature_s, decoder) = decoder.decode_field("signature_s")?;
        let inner_hash = OnceCell::new();

        let tx = EIP2930Transaction {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data,
            access_list,
            signature_y_parity,
            signature_r,
            signature_s,
            inner_hash,
        };
        Ok((tx, decoder.finish()?))
    }
}

impl RLPDecode for EIP1559Transaction {
    fn decode_unfinished(rlp: &[u8]) -> Result<(EIP1559Transaction, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (chain_id, decoder) = decoder.decode_field("chain_id")?;
        let (nonce, decoder) = decoder.decode_field("nonce")?;
        let (max_priority_fee_per_gas, decoder) =
            decoder.decode_field("max_priority_fee_per_gas")?;
        let (max_fee_per_gas, decoder) = decoder.decode_field("max_fee_per_gas")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (access_list, decoder) = decoder.decode_field("access_list")?;
        let (signature_y_parity, decoder) = decoder.decode_field("signature_y_parity")?;
        let (signature_r, decoder) = decoder.decode_field("signature_r")?;
        let (signature_s, decoder) = decoder.decode_field("signature_s")?;
        let inner_hash = OnceCell::new();

        let tx = EIP1559Transaction {
            chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit,
            to,
            value,
            data,
            access_list,
            signature_y_parity,
            signature_r,
            signature_s,
            inner_hash,
        };
        Ok((tx, decoder.finish()?))
    }
}

impl RLPDecode for DepositTransaction {
    /// The wire list has exactly eight positional fields; decoders accept
    /// signature fields as an optional tail so a re-derived signed form can
    /// round-trip, but never fewer than the eight.
    fn decode_unfinished(rlp: &[u8]) -> Result<(DepositTransaction, &[u8]), RLPDecodeError> {
        let decoder = Decoder::new(rlp)?;
        let (source_hash, decoder) = decoder.decode_field("source_hash")?;
        let (from, decoder) = decoder.decode_field("from")?;
        let (to, decoder) = decoder.decode_field("to")?;
        let (mint, decoder) = decoder.decode_field("mint")?;
        let (value, decoder) = decoder.decode_field("value")?;
        let (gas_limit, decoder) = decoder.decode_field("gas_limit")?;
        let (is_system_tx, decoder) = decoder.decode_field("is_system_tx")?;
        let (data, decoder) = decoder.decode_field("data")?;
        let (signature_y_parity, decoder) = decoder.decode_optional_field()?;
        let (signature_r, decoder) = decoder.decode_optional_field()?;
        let (signature_s, decoder) = decoder.decode_optional_field()?;
        let inner_hash = OnceCell::new();

        let tx = DepositTransaction {
            source_hash,
            from,
            to,
            mint,
            value,
            gas_limit,
            is_system_tx,
            data,
            signature_y_parity: signature_y_parity.unwrap_or_default(),
            signature_r: signature_r.unwrap_or_default(),
            signature_s: signature_s.unwrap_or_default(),
            inner_hash,
        };
        Ok((tx, decoder.finish()?))
    }
}

impl RLPEncode for Transaction {
    /// Transactions can be encoded in the following formats:
    /// A) Legacy transactions: rlp(LegacyTransaction)
    /// B) Non legacy transactions: rlp(Bytes) where Bytes represents the canonical encoding for the transaction as a bytes object.
    /// Checkout [Transaction::encode_canonical] for more information
    fn encode(&self, buf: &mut dyn bytes::BufMut) {
        match self {
            Transaction::LegacyTransaction(t) => t.encode(buf),
            tx => Bytes::copy_from_slice(&tx.encode_canonical_to_vec()).encode(buf),
        };
    }
}

impl RLPDecode for Transaction {
    /// Transactions can be encoded in the following formats:
    /// A) Legacy transactions: rlp(LegacyTransaction)
    /// B) Non legacy transactions: rlp(Bytes) where Bytes represents the canonical encoding for the transaction as a bytes object.
    /// Checkout [Transaction::decode_canonical] for more information
    fn decode_unfinished(rlp: &[u8]) -> Result<(Self, &[u8]), RLPDecodeError> {
        if is_encoded_as_bytes(rlp)? {
            // Unwrap the byte-string item to get the canonical encoding
            let (_, payload, remaining) = decode_rlp_item(rlp)?;
            let tx_type = payload.first().ok_or(RLPDecodeError::InvalidLength)?;
            let tx_encoding = payload.get(1..).ok_or(RLPDecodeError::InvalidLength)?;
            // Look at the first byte to check if it corresponds to a TransactionType
            let tx = match *tx_type {
                0x01 => {
                    EIP2930Transaction::decode(tx_encoding).map(Transaction::EIP2930Transaction)?
                }
                0x02 => {
                    EIP1559Transaction::decode(tx_encoding).map(Transaction::EIP1559Transaction)?
                }
                0x7e => {
                    DepositTransaction::decode(tx_encoding).map(Transaction::DepositTransaction)?
                }
                ty => {
                    return Err(RLPDecodeError::Custom(format!(
                        "Invalid transaction type: {ty}"
                    )))
                }
            };
            Ok((tx, remaining))
        } else {
            // LegacyTransaction
            LegacyTransaction::decode_unfinished(rlp)
                .map(|(tx, rem)| (Transaction::LegacyTransaction(tx), rem))
        }
    }
}

/// Canonical Transaction Encoding
/// Transactions can be encoded in the following formats:
/// A) `TransactionType || Transaction` (Where Transaction type is an 8-bit number between 0 and 0x7f, and Transaction is an rlp encoded transaction of type TransactionType)
/// B) `LegacyTransaction` (An rlp encoded LegacyTransaction)
mod canonic_encoding {
    use super::*;

    impl Transaction {
        /// Decodes a single transaction in canonical format. The type prefix
        /// is the single source of truth for variant dispatch.
        pub fn decode_canonical(bytes: &[u8]) -> Result<Self, RLPDecodeError> {
            // Look at the first byte to check if it corresponds to a TransactionType
            match bytes.first() {
                // First byte is a valid TransactionType
                Some(tx_type) if *tx_type < 0x7f => {
                    // Decode tx based on type
                    let tx_bytes = &bytes[1..];
                    match *tx_type {
                        0x01 => EIP2930Transaction::decode(tx_bytes)
                            .map(Transaction::EIP2930Transaction),
                        0x02 => EIP1559Transaction::decode(tx_bytes)
                            .map(Transaction::EIP1559Transaction),
                        0x7e => DepositTransaction::decode(tx_bytes)
                            .map(Transaction::DepositTransaction),
                        ty => {
                            debug!("Rejected transaction with unknown type {ty:#04x}");
                            Err(RLPDecodeError::Custom(format!(
                                "Invalid transaction type: {ty}"
                            )))
                        }
                    }
                }
                // LegacyTransaction
                _ => LegacyTransaction::decode(bytes).map(Transaction::LegacyTransaction),
            }
        }

        /// Encodes a transaction in canonical format
        pub fn encode_canonical(&self, buf: &mut dyn bytes::BufMut) {
            match self {
                // Legacy transactions don't have a prefix
                Transaction::LegacyTransaction(_) => {}
                _ => buf.put_u8(self.tx_type() as u8),
            }
            match self {
                Transaction::LegacyTransaction(t) => t.encode(buf),
                Transaction::EIP2930Transaction(t) => t.encode(buf),
                Transaction::EIP1559Transaction(t) => t.encode(buf),
                Transaction::DepositTransaction(t) => t.encode(buf),
            };
        }

        /// Encodes a transaction in canonical format into a newly created buffer
        pub fn encode_canonical_to_vec(&self) -> Vec<u8> {
            let mut buf = Vec::new();
            self.encode_canonical(&mut buf);
            buf
        }
    }
}

pub fn recover_address_from_message(
    signature: Signature,
    message: &Bytes,
) -> Result<Address, secp256k1::Error> {
    // Hash message
    let payload: [u8; 32] = Keccak256::new_with_prefix(message.as_ref())
        .finalize()
        .into();
    recover_address(signature, H256::from_slice(&payload))
}

pub fn recover_address(signature: Signature, payload: H256) -> Result<Address, secp256k1::Error> {
    let signature_bytes = signature.to_fixed_bytes();
    // Signatures must use the low-s form (s <= secp256k1n/2) since EIP-2.
    if U256::from_big_endian(&signature_bytes[32..64]) > *SECP256K1_N_HALF {
        return Err(secp256k1::Error::InvalidSignature);
    }
    let signature = secp256k1::ecdsa::RecoverableSignature::from_compact(
        &signature_bytes[..64],
        RecoveryId::from_i32(signature_bytes[64] as i32)?,
    )?;
    // Recover public key
    let public = secp256k1::SECP256K1
        .recover_ecdsa(&Message::from_digest(payload.to_fixed_bytes()), &signature)?;
    // Hash public key to obtain address
    let hash = Keccak256::new_with_prefix(&public.serialize_uncompressed()[1..]).finalize();
    Ok(Address::from_slice(&hash[12..]))
}

fn derive_legacy_chain_id(v: U256) -> Option<u64> {
    if v.bits() > 64 {
        return None;
    }
    let v = v.low_u64();
    if v == 27 || v == 28 {
        None
    } else {
        Some(v.saturating_sub(35) / 2)
    }
}

// Signing pipeline: each variant knows the exact byte sequence that gets
// hashed for its signature, and attaching a signature always produces a new
// instance instead of mutating the receiver.

impl LegacyTransaction {
    /// Pre-signature byte sequence: the unsigned field list, extended with
    /// `[chain_id, 0, 0]` once replay protection applies.
    pub fn signing_payload(&self, chain_id: Option<u64>) -> Vec<u8> {
        let mut buf = vec![];
        match chain_id {
            None => Encoder::new(&mut buf)
                .encode_field(&self.nonce)
                .encode_field(&self.gas_price)
                .encode_field(&self.gas)
                .encode_field(&self.to)
                .encode_field(&self.value)
                .encode_field(&self.data)
                .finish(),
            Some(chain_id) => Encoder::new(&mut buf)
                .encode_field(&self.nonce)
                .encode_field(&self.gas_price)
                .encode_field(&self.gas)
                .encode_field(&self.to)
                .encode_field(&self.value)
                .encode_field(&self.data)
                .encode_field(&chain_id)
                .encode_field(&0u8)
                .encode_field(&0u8)
                .finish(),
        }
        buf
    }

    pub fn signing_hash(&self, chain_id: Option<u64>) -> H256 {
        keccak(self.signing_payload(chain_id))
    }

    pub fn with_signature(&self, v: U256, r: U256, s: U256) -> Self {
        Self {
            v,
            r,
            s,
            inner_hash: OnceCell::new(),
            ..self.clone()
        }
    }
}

impl EIP2930Transaction {
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = vec![Self::TYPE as u8];
        Encoder::new(&mut buf)
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.gas_price)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
            .finish();
        buf
    }

    pub fn signing_hash(&self) -> H256 {
        keccak(self.signing_payload())
    }

    pub fn with_signature(&self, y_parity: bool, r: U256, s: U256) -> Self {
        Self {
            signature_y_parity: y_parity,
            signature_r: r,
            signature_s: s,
            inner_hash: OnceCell::new(),
            ..self.clone()
        }
    }
}

impl EIP1559Transaction {
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut buf = vec![Self::TYPE as u8];
        Encoder::new(&mut buf)
            .encode_field(&self.chain_id)
            .encode_field(&self.nonce)
            .encode_field(&self.max_priority_fee_per_gas)
            .encode_field(&self.max_fee_per_gas)
            .encode_field(&self.gas_limit)
            .encode_field(&self.to)
            .encode_field(&self.value)
            .encode_field(&self.data)
            .encode_field(&self.access_list)
            .finish();
        buf
    }

    pub fn signing_hash(&self) -> H256 {
        keccak(self.signing_payload())
    }

    pub fn with_signature(&self, y_parity: bool, r: U256, s: U256) -> Self {
        Self {
            signature_y_parity: y_parity,
            signature_r: r,
            signature_s: s,
            inner_hash: OnceCell::new(),
            ..self.clone()
        }
    }
}

impl DepositTransaction {
    /// Builds a deposit from its RPC form.
    ///
    /// Deposits only exist once the fee-market era does, even though they are
    /// not fee-market priced themselves. A missing sender defaults to the
    /// all-zero address; fee and access-list inputs are ignored since the
    /// variant pins both.
    pub fn from_generic(
        value: &GenericTransaction,
        config: &ChainConfig,
    ) -> Result<Self, TransactionError> {
        if value.r#type != TxType::Deposit {
            return Err(TransactionError::TypeMismatch {
                expected: TxType::Deposit,
                found: value.r#type as u8,
            });
        }
        if !config.is_fee_market_scheduled() {
            return Err(TransactionError::UnsupportedFork(Fork::London));
        }
        let is_system_tx = if config.is_regolith_scheduled() {
            false
        } else {
            value.is_system_tx.unwrap_or(false)
        };
        let tx = Self {
            source_hash: value.source_hash.unwrap_or_default(),
            from: value.from,
            to: value.to.clone(),
            mint: value.mint.unwrap_or_default(),
            value: value.value,
            gas_limit: value.gas.unwrap_or_default(),
            is_system_tx,
            data: value.input.clone(),
            ..Default::default()
        };
        tx.validate_signature()?;
        Ok(tx)
    }

    /// Decodes the canonical `0x7e`-prefixed form and applies the chain-level
    /// construction rules on top of the structural ones.
    pub fn decode_with_config(
        bytes: &[u8],
        config: &ChainConfig,
    ) -> Result<Self, TransactionError> {
        if !config.is_fee_market_scheduled() {
            return Err(TransactionError::UnsupportedFork(Fork::London));
        }
        let mut tx = Self::decode_canonical(bytes)?;
        if config.is_regolith_scheduled() {
            tx.is_system_tx = false;
        }
        tx.validate_signature()?;
        Ok(tx)
    }

    /// Deposits are never independently signed, but any signature they carry
    /// must still be in low-s form. Structural check shared by every
    /// construction path.
    pub fn validate_signature(&self) -> Result<(), TransactionError> {
        if self.signature_s > *SECP256K1_N_HALF {
            return Err(TransactionError::SignatureMalleability);
        }
        Ok(())
    }

    /// Pre-signature byte sequence. Deposits have no narrower unsigned form:
    /// the full canonical envelope is what gets hashed.
    pub fn signing_payload(&self) -> Vec<u8> {
        self.encode_canonical_to_vec()
    }

    pub fn signing_hash(&self) -> H256 {
        keccak(self.signing_payload())
    }

    /// Returns a new deposit carrying the supplied signature. The triple is
    /// held for interface parity with the signed variants and never reaches
    /// the wire encoding.
    pub fn with_signature(&self, y_parity: bool, r: U256, s: U256) -> Self {
        Self {
            signature_y_parity: y_parity,
            signature_r: r,
            signature_s: s,
            inner_hash: OnceCell::new(),
            ..self.clone()
        }
    }
}

impl Display for DepositTransaction {
    // Keeps the fee caps visible for diagnostic parity with the fee-market
    // variants even though they are always zero here.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DepositTransaction {{ source_hash: {:#x}, from: {:#x}, to: {:?}, mint: {}, value: {}, gas_limit: {}, is_system_tx: {}, max_fee_per_gas: {}, max_priority_fee_per_gas: {} }}",
            self.source_hash,
            self.from,
            self.to,
            self.mint,
            self.value,
            self.gas_limit,
            self.is_system_tx,
            FeeMarketPricing::max_fee_per_gas(self),
            FeeMarketPricing::max_priority_fee_per_gas(self),
        )
    }
}

// Serialization
// This is used for RPC messaging

mod serde_impl {
    use serde::Deserialize;
    use serde::{de::Error, Deserializer};
    use serde_json::Value;
    use std::{collections::HashMap, str::FromStr};

    use super::*;

    impl Serialize for TxKind {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            match self {
                TxKind::Call(address) => serializer.serialize_str(&format!("{address:#x}")),
                TxKind::Create => serializer.serialize_none(),
            }
        }
    }

    impl<'de> Deserialize<'de> for TxKind {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let str_option = Option::<String>::deserialize(deserializer)?;
            match str_option {
                Some(str) if !str.is_empty() => Ok(TxKind::Call(
                    Address::from_str(str.trim_start_matches("0x")).map_err(|_| {
                        serde::de::Error::custom(format!("Failed to deserialize hex value {str}"))
                    })?,
                )),
                _ => Ok(TxKind::Create),
            }
        }
    }

    impl Serialize for TxType {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            serializer.serialize_str(&format!("{:#x}", *self as u8))
        }
    }

    impl<'de> Deserialize<'de> for TxType {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let str = String::deserialize(deserializer)?;
            let tx_num = u8::from_str_radix(str.trim_start_matches("0x"), 16).map_err(|_| {
                serde::de::Error::custom(format!("Failed to deserialize hex value {str}"))
            })?;
            TxType::from_u8(tx_num).ok_or_else(|| {
                serde::de::Error::custom(format!("Invalid transaction type {tx_num}"))
            })
        }
    }

    impl Serialize for LegacyTransaction {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let mut struct_serializer = serializer.serialize_struct("LegacyTransaction", 11)?;
            struct_serializer.serialize_field("type", &TxType::Legacy)?;
            struct_serializer.serialize_field("nonce", &format!("{:#x}", self.nonce))?;
            struct_serializer.serialize_field("to", &self.to)?;
            struct_serializer.serialize_field("gas", &format!("{:#x}", self.gas))?;
            struct_serializer.serialize_field("value", &self.value)?;
            struct_serializer.serialize_field("input", &format!("0x{:x}", self.data))?;
            struct_serializer.serialize_field("gasPrice", &format!("{:#x}", self.gas_price))?;
            struct_serializer.serialize_field(
                "chainId",
                &format!("{:#x}", derive_legacy_chain_id(self.v).unwrap_or_default()),
            )?;
            struct_serializer.serialize_field("v", &self.v)?;
            struct_serializer.serialize_field("r", &self.r)?;
            struct_serializer.serialize_field("s", &self.s)?;
            struct_serializer.end()
        }
    }

    impl Serialize for EIP2930Transaction {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let mut struct_serializer = serializer.serialize_struct("Eip2930Transaction", 12)?;
            struct_serializer.serialize_field("type", &TxType::EIP2930)?;
            struct_serializer.serialize_field("nonce", &format!("{:#x}", self.nonce))?;
            struct_serializer.serialize_field("to", &self.to)?;
            struct_serializer.serialize_field("gas", &format!("{:#x}", self.gas_limit))?;
            struct_serializer.serialize_field("value", &self.value)?;
            struct_serializer.serialize_field("input", &format!("0x{:x}", self.data))?;
            struct_serializer.serialize_field("gasPrice", &format!("{:#x}", self.gas_price))?;
            struct_serializer.serialize_field("accessList", &self.access_list_entries())?;
            struct_serializer.serialize_field("chainId", &format!("{:#x}", self.chain_id))?;
            struct_serializer
                .serialize_field("yParity", &format!("{:#x}", self.signature_y_parity as u8))?;
            struct_serializer
                .serialize_field("v", &format!("{:#x}", self.signature_y_parity as u8))?;
            struct_serializer.serialize_field("r", &self.signature_r)?;
            struct_serializer.serialize_field("s", &self.signature_s)?;
            struct_serializer.end()
        }
    }

    impl Serialize for EIP1559Transaction {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let mut struct_serializer = serializer.serialize_struct("Eip1559Transaction", 14)?;
            struct_serializer.serialize_field("type", &TxType::EIP1559)?;
            struct_serializer.serialize_field("nonce", &format!("{:#x}", self.nonce))?;
            struct_serializer.serialize_field("to", &self.to)?;
            struct_serializer.serialize_field("gas", &format!("{:#x}", self.gas_limit))?;
            struct_serializer.serialize_field("value", &self.value)?;
            struct_serializer.serialize_field("input", &format!("0x{:x}", self.data))?;
            struct_serializer.serialize_field(
                "maxPriorityFeePerGas",
                &format!("{:#x}", self.max_priority_fee_per_gas),
            )?;
            struct_serializer
                .serialize_field("maxFeePerGas", &format!("{:#x}", self.max_fee_per_gas))?;
            struct_serializer
                .serialize_field("gasPrice", &format!("{:#x}", self.max_fee_per_gas))?;
            struct_serializer.serialize_field("accessList", &self.access_list_entries())?;
            struct_serializer.serialize_field("chainId", &format!("{:#x}", self.chain_id))?;
            struct_serializer
                .serialize_field("yParity", &format!("{:#x}", self.signature_y_parity as u8))?;
            struct_serializer
                .serialize_field("v", &format!("{:#x}", self.signature_y_parity as u8))?;
            struct_serializer.serialize_field("r", &self.signature_r)?;
            struct_serializer.serialize_field("s", &self.signature_s)?;
            struct_serializer.end()
        }
    }

    impl Serialize for DepositTransaction {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
        {
            let mut struct_serializer = serializer.serialize_struct("DepositTransaction", 12)?;
            struct_serializer.serialize_field("type", &TxType::Deposit)?;
            struct_serializer.serialize_field("sourceHash", &self.source_hash)?;
            struct_serializer.serialize_field("from", &self.from)?;
            struct_serializer.serialize_field("to", &self.to)?;
            struct_serializer.serialize_field("mint", &self.mint)?;
            struct_serializer.serialize_field("value", &self.value)?;
            struct_serializer.serialize_field("gas", &format!("{:#x}", self.gas_limit))?;
            struct_serializer.serialize_field("isSystemTx", &self.is_system_tx)?;
            struct_serializer.serialize_field("input", &format!("0x{:x}", self.data))?;
            struct_serializer.serialize_field("nonce", &format!("{:#x}", 0))?;
            // Zero by construction; emitted for parity with the fee-market
            // variants.
            struct_serializer.serialize_field(
                "maxFeePerGas",
                &format!("{:#x}", FeeMarketPricing::max_fee_per_gas(self)),
            )?;
            struct_serializer.serialize_field(
                "maxPriorityFeePerGas",
                &format!("{:#x}", FeeMarketPricing::max_priority_fee_per_gas(self)),
            )?;
            struct_serializer.end()
        }
    }

    impl<'de> Deserialize<'de> for Transaction {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mut map = <HashMap<String, serde_json::Value>>::deserialize(deserializer)?;
            let tx_type =
                serde_json::from_value::<TxType>(map.remove("type").unwrap_or(Value::default()))
                    .unwrap_or(TxType::EIP1559);

            let iter = map.into_iter();
            match tx_type {
                TxType::Legacy => {
                    LegacyTransaction::deserialize(serde::de::value::MapDeserializer::new(iter))
                        .map(Transaction::LegacyTransaction)
                        .map_err(|e| {
                            serde::de::Error::custom(format!("Couldn't Deserialize Legacy {e}"))
                        })
                }
                TxType::EIP2930 => {
                    EIP2930Transaction::deserialize(serde::de::value::MapDeserializer::new(iter))
                        .map(Transaction::EIP2930Transaction)
                        .map_err(|e| {
                            serde::de::Error::custom(format!("Couldn't Deserialize EIP2930 {e}"))
                        })
                }
                TxType::EIP1559 => {
                    EIP1559Transaction::deserialize(serde::de::value::MapDeserializer::new(iter))
                        .map(Transaction::EIP1559Transaction)
                        .map_err(|e| {
                            serde::de::Error::custom(format!("Couldn't Deserialize EIP1559 {e}"))
                        })
                }
                TxType::Deposit => {
                    DepositTransaction::deserialize(serde::de::value::MapDeserializer::new(iter))
                        .map(Transaction::DepositTransaction)
                        .map_err(|e| {
                            serde::de::Error::custom(format!("Couldn't Deserialize Deposit: {e}"))
                        })
                }
            }
        }
    }

    fn deserialize_input_field(
        map: &mut std::collections::HashMap<String, Value>,
    ) -> Result<Bytes, serde_json::Error> {
        let data_str: String = serde_json::from_value(
            map.remove("input")
                .ok_or_else(|| serde::de::Error::missing_field("input"))?,
        )
        .map_err(serde::de::Error::custom)?;
        if let Some(stripped) = data_str.strip_prefix("0x") {
            match hex::decode(stripped) {
                Ok(decoded_bytes) => Ok(Bytes::from(decoded_bytes)),
                Err(_) => Err(serde::de::Error::custom(
                    "Invalid hex format in 'input' field",
                ))?,
            }
        } else {
            Err(serde::de::Error::custom(
                "'input' field must start with '0x'",
            ))?
        }
    }

    fn deserialize_field<'de, T, D>(
        map: &mut HashMap<String, serde_json::Value>,
        key: &str,
    ) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        map.remove(key)
            .ok_or_else(|| D::Error::custom(format!("Missing field: {key}")))
            .and_then(|value| {
                serde_json::from_value(value).map_err(|err| D::Error::custom(err.to_string()))
            })
    }

    fn deserialize_optional_field<'de, T, D>(
        map: &mut HashMap<String, serde_json::Value>,
        key: &str,
    ) -> Result<Option<T>, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        map.remove(key)
            .map(|value| {
                serde_json::from_value(value).map_err(|err| D::Error::custom(err.to_string()))
            })
            .transpose()
    }

    impl<'de> Deserialize<'de> for LegacyTransaction {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mut map = <HashMap<String, serde_json::Value>>::deserialize(deserializer)?;

            Ok(LegacyTransaction {
                nonce: deserialize_field::<U256, D>(&mut map, "nonce")?.low_u64(),
                gas_price: deserialize_field::<U256, D>(&mut map, "gasPrice")?.low_u64(),
                gas: deserialize_field::<U256, D>(&mut map, "gas")?.low_u64(),
                to: deserialize_field::<TxKind, D>(&mut map, "to")?,
                value: deserialize_field::<U256, D>(&mut map, "value")?,
                data: deserialize_input_field(&mut map).map_err(serde::de::Error::custom)?,
                v: deserialize_field::<U256, D>(&mut map, "v")?,
                r: deserialize_field::<U256, D>(&mut map, "r")?,
                s: deserialize_field::<U256, D>(&mut map, "s")?,
                ..Default::default()
            })
        }
    }

    impl<'de> Deserialize<'de> for EIP2930Transaction {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mut map = <HashMap<String, serde_json::Value>>::deserialize(deserializer)?;

            Ok(EIP2930Transaction {
                chain_id: deserialize_field::<U256, D>(&mut map, "chainId")?.low_u64(),
                nonce: deserialize_field::<U256, D>(&mut map, "nonce")?.low_u64(),
                gas_price: deserialize_field::<U256, D>(&mut map, "gasPrice")?.low_u64(),
                gas_limit: deserialize_field::<U256, D>(&mut map, "gas")?.low_u64(),
                to: deserialize_field::<TxKind, D>(&mut map, "to")?,
                value: deserialize_field::<U256, D>(&mut map, "value")?,
                data: deserialize_input_field(&mut map).map_err(serde::de::Error::custom)?,
                access_list: deserialize_field::<Vec<AccessListEntry>, D>(&mut map, "accessList")?
                    .iter()
                    .map(Into::into)
                    .collect(),
                signature_y_parity: u8::from_str_radix(
                    deserialize_field::<String, D>(&mut map, "yParity")?.trim_start_matches("0x"),
                    16,
                )
                .map_err(serde::de::Error::custom)?
                    != 0,
                signature_r: deserialize_field::<U256, D>(&mut map, "r")?,
                signature_s: deserialize_field::<U256, D>(&mut map, "s")?,
                ..Default::default()
            })
        }
    }

    impl<'de> Deserialize<'de> for EIP1559Transaction {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mut map = <HashMap<String, serde_json::Value>>::deserialize(deserializer)?;

            Ok(EIP1559Transaction {
                chain_id: deserialize_field::<U256, D>(&mut map, "chainId")?.low_u64(),
                nonce: deserialize_field::<U256, D>(&mut map, "nonce")?.low_u64(),
                max_priority_fee_per_gas: deserialize_field::<U256, D>(
                    &mut map,
                    "maxPriorityFeePerGas",
                )?
                .low_u64(),
                max_fee_per_gas: deserialize_field::<U256, D>(&mut map, "maxFeePerGas")?.low_u64(),
                gas_limit: deserialize_field::<U256, D>(&mut map, "gas")?.low_u64(),
                to: deserialize_field::<TxKind, D>(&mut map, "to")?,
                value: deserialize_field::<U256, D>(&mut map, "value")?,
                data: deserialize_input_field(&mut map).map_err(serde::de::Error::custom)?,
                access_list: deserialize_field::<Vec<AccessListEntry>, D>(&mut map, "accessList")?
                    .iter()
                    .map(Into::into)
                    .collect(),
                signature_y_parity: u8::from_str_radix(
                    deserialize_field::<String, D>(&mut map, "yParity")?.trim_start_matches("0x"),
                    16,
                )
                .map_err(serde::de::Error::custom)?
                    != 0,
                signature_r: deserialize_field::<U256, D>(&mut map, "r")?,
                signature_s: deserialize_field::<U256, D>(&mut map, "s")?,
                ..Default::default()
            })
        }
    }

    impl<'de> Deserialize<'de> for DepositTransaction {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            let mut map = <HashMap<String, serde_json::Value>>::deserialize(deserializer)?;

            Ok(DepositTransaction {
                source_hash: deserialize_optional_field::<H256, D>(&mut map, "sourceHash")?
                    .unwrap_or_default(),
                from: deserialize_optional_field::<Address, D>(&mut map, "from")?
                    .unwrap_or_default(),
                to: deserialize_field::<TxKind, D>(&mut map, "to")?,
                mint: deserialize_optional_field::<U256, D>(&mut map, "mint")?
                    .unwrap_or_default(),
                value: deserialize_field::<U256, D>(&mut map, "value")?,
                gas_limit: deserialize_field::<U256, D>(&mut map, "gas")?.low_u64(),
                is_system_tx: deserialize_optional_field::<bool, D>(&mut map, "isSystemTx")?
                    .unwrap_or_default(),
                data: deserialize_input_field(&mut map).map_err(serde::de::Error::custom)?,
                ..Default::default()
            })
        }
    }

    /// Unsigned Transaction struct generic to all types which may not contain all required transaction fields
    /// Used to build concrete variants out of RPC input
    #[derive(Deserialize, Debug, PartialEq, Clone, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct GenericTransaction {
        #[serde(default)]
        pub r#type: TxType,
        #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
        pub nonce: Option<u64>,
        #[serde(default)]
        pub to: TxKind,
        #[serde(default)]
        pub from: Address,
        #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
        pub gas: Option<u64>,
        #[serde(default)]
        pub value: U256,
        #[serde(default, with = "crate::serde_utils::u64::hex_str")]
        pub gas_price: u64,
        #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
        pub max_priority_fee_per_gas: Option<u64>,
        #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
        pub max_fee_per_gas: Option<u64>,
        #[serde(default)]
        pub access_list: Vec<AccessListEntry>,
        #[serde(default, with = "crate::serde_utils::u64::hex_str_opt")]
        pub chain_id: Option<u64>,
        /// Deposit-only: origin event on the settlement layer.
        #[serde(default)]
        pub source_hash: Option<H256>,
        /// Deposit-only: amount minted on this chain.
        #[serde(default, with = "crate::serde_utils::u256::hex_str_opt")]
        pub mint: Option<U256>,
        /// Deposit-only: gas metering exemption flag.
        #[serde(default)]
        pub is_system_tx: Option<bool>,
        // rename is needed here so we dont attempt to deserialize the `input` field rather than the remainder of the fields
        #[serde(
            flatten,
            rename = "input_or_data",
            deserialize_with = "deserialize_input"
        )]
        pub input: Bytes,
    }

    /// Custom deserialization function to parse either `data` or `input` fields, or both as long as they have the same value
    pub fn deserialize_input<'de, D>(deserializer: D) -> Result<Bytes, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The input field can be named either input or data
        // In case we have both fields both should be named the same
        let variables = HashMap::<String, Value>::deserialize(deserializer)?;
        let data = variables.get("data");
        let input = variables.get("input");
        let value = match (data, input) {
            // This replaces `default` attribute for this custom implementation
            (None, None) => return Ok(Bytes::new()),
            (None, Some(val)) => val,
            (Some(val), None) => val,
            (Some(val_a), Some(val_b)) => {
                if val_a == val_b {
                    val_a
                } else {
                    return Err(D::Error::custom(
                        "Transaction has both `data` and `input` fields with different values",
                    ));
                }
            }
        };
        let value = String::deserialize(value).map_err(D::Error::custom)?;
        let bytes = hex::decode(value.trim_start_matches("0x"))
            .map_err(|e| D::Error::custom(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    impl From<LegacyTransaction> for GenericTransaction {
        fn from(value: LegacyTransaction) -> Self {
            Self {
                r#type: TxType::Legacy,
                nonce: Some(value.nonce),
                to: value.to.clone(),
                gas: Some(value.gas),
                value: value.value,
                input: value.data.clone(),
                gas_price: value.gas_price,
                chain_id: derive_legacy_chain_id(value.v),
                ..Default::default()
            }
        }
    }

    impl From<EIP2930Transaction> for GenericTransaction {
        fn from(value: EIP2930Transaction) -> Self {
            Self {
                r#type: TxType::EIP2930,
                nonce: Some(value.nonce),
                to: value.to.clone(),
                gas: Some(value.gas_limit),
                value: value.value,
                input: value.data.clone(),
                gas_price: value.gas_price,
                access_list: value.access_list_entries(),
                chain_id: Some(value.chain_id),
                ..Default::default()
            }
        }
    }

    impl From<EIP1559Transaction> for GenericTransaction {
        fn from(value: EIP1559Transaction) -> Self {
            Self {
                r#type: TxType::EIP1559,
                nonce: Some(value.nonce),
                to: value.to.clone(),
                gas: Some(value.gas_limit),
                value: value.value,
                input: value.data.clone(),
                gas_price: value.max_fee_per_gas,
                max_priority_fee_per_gas: Some(value.max_priority_fee_per_gas),
                max_fee_per_gas: Some(value.max_fee_per_gas),
                access_list: value.access_list_entries(),
                chain_id: Some(value.chain_id),
                ..Default::default()
            }
        }
    }

    impl From<DepositTransaction> for GenericTransaction {
        fn from(value: DepositTransaction) -> Self {
            Self {
                r#type: TxType::Deposit,
                nonce: Some(0),
                to: value.to.clone(),
                from: value.from,
                gas: Some(value.gas_limit),
                value: value.value,
                input: value.data.clone(),
                // Pinned to zero on deposits; kept for interface parity.
                max_priority_fee_per_gas: Some(FeeMarketPricing::max_priority_fee_per_gas(&value)),
                max_fee_per_gas: Some(FeeMarketPricing::max_fee_per_gas(&value)),
                source_hash: Some(value.source_hash),
                mint: Some(value.mint),
                is_system_tx: Some(value.is_system_tx),
                ..Default::default()
            }
        }
    }

    impl LegacyTransaction {
        pub fn from_generic(value: &GenericTransaction) -> Result<Self, TransactionError> {
            if value.r#type != TxType::Legacy {
                return Err(TransactionError::TypeMismatch {
                    expected: TxType::Legacy,
                    found: value.r#type as u8,
                });
            }
            Ok(Self {
                nonce: value.nonce.unwrap_or_default(),
                gas_price: value.gas_price,
                gas: value.gas.unwrap_or_default(),
                to: value.to.clone(),
                value: value.value,
                data: value.input.clone(),
                ..Default::default()
            })
        }
    }

    impl EIP2930Transaction {
        pub fn from_generic(
            value: &GenericTransaction,
            config: &ChainConfig,
        ) -> Result<Self, TransactionError> {
            if value.r#type != TxType::EIP2930 {
                return Err(TransactionError::TypeMismatch {
                    expected: TxType::EIP2930,
                    found: value.r#type as u8,
                });
            }
            if !config.is_access_list_scheduled() {
                return Err(TransactionError::UnsupportedFork(Fork::Berlin));
            }
            Ok(Self {
                chain_id: value.chain_id.unwrap_or(config.chain_id),
                nonce: value.nonce.unwrap_or_default(),
                gas_price: value.gas_price,
                gas_limit: value.gas.unwrap_or_default(),
                to: value.to.clone(),
                value: value.value,
                data: value.input.clone(),
                access_list: value.access_list.iter().map(Into::into).collect(),
                ..Default::default()
            })
        }
    }

    impl EIP1559Transaction {
        pub fn from_generic(
            value: &GenericTransaction,
            config: &ChainConfig,
        ) -> Result<Self, TransactionError> {
            if value.r#type != TxType::EIP1559 {
                return Err(TransactionError::TypeMismatch {
                    expected: TxType::EIP1559,
                    found: value.r#type as u8,
                });
            }
            if !config.is_fee_market_scheduled() {
                return Err(TransactionError::UnsupportedFork(Fork::London));
            }
            Ok(Self {
                chain_id: value.chain_id.unwrap_or(config.chain_id),
                nonce: value.nonce.unwrap_or_default(),
                max_priority_fee_per_gas: value.max_priority_fee_per_gas.unwrap_or_default(),
                max_fee_per_gas: value.max_fee_per_gas.unwrap_or(value.gas_price),
                gas_limit: value.gas.unwrap_or_default(),
                to: value.to.clone(),
                value: value.value,
                data: value.input.clone(),
                access_list: value.access_list.iter().map(Into::into).collect(),
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use std::str::FromStr;

    fn deposit_era_config() -> ChainConfig {
        ChainConfig {
            chain_id: 1729,
            eip155_block: Some(0),
            berlin_block: Some(0),
            london_block: Some(0),
            regolith_time: None,
        }
    }

    fn sample_deposit() -> DepositTransaction {
        DepositTransaction {
            source_hash: H256::from_slice(&[0x11; 32]),
            from: Address::from_slice(&hex!("8943545177806ed17b9f23f0a21ee5948ecaa776")),
            to: TxKind::Call(Address::from_slice(&hex!(
                "6177843db3138ae69679a54b95cf345ed759450d"
            ))),
            mint: U256::from(5),
            value: U256::from(10),
            gas_limit: 21000,
            is_system_tx: false,
            data: Bytes::new(),
            ..Default::default()
        }
    }

    #[test]
    fn legacy_tx_rlp_decode() {
        let encoded_tx = "f86d80843baa0c4082f618946177843db3138ae69679a54b95cf345ed759450d870aa87bee538000808360306ba0151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65da064c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4";
        let encoded_tx_bytes = hex::decode(encoded_tx).unwrap();
        let tx = LegacyTransaction::decode(&encoded_tx_bytes).unwrap();
        let expected_tx = LegacyTransaction {
            nonce: 0,
            gas_price: 1001000000,
            gas: 63000,
            to: TxKind::Call(Address::from_slice(
                &hex::decode("6177843db3138ae69679A54b95cf345ED759450d").unwrap(),
            )),
            value: 3000000000000000_u64.into(),
            data: Bytes::new(),
            r: U256::from_str_radix(
                "151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65d",
                16,
            )
            .unwrap(),
            s: U256::from_str_radix(
                "64c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4",
                16,
            )
            .unwrap(),
            v: 6303851.into(),
            ..Default::default()
        };
        assert_eq!(tx, expected_tx);
    }

    #[test]
    fn eip1559_tx_rlp_decode() {
        let encoded_tx = "f86c8330182480114e82f618946177843db3138ae69679a54b95cf345ed759450d870aa87bee53800080c080a0151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65da064c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4";
        let encoded_tx_bytes = hex::decode(encoded_tx).unwrap();
        let tx = EIP1559Transaction::decode(&encoded_tx_bytes).unwrap();
        let expected_tx = EIP1559Transaction {
            nonce: 0,
            max_fee_per_gas: 78,
            max_priority_fee_per_gas: 17,
            to: TxKind::Call(Address::from_slice(
                &hex::decode("6177843db3138ae69679A54b95cf345ED759450d").unwrap(),
            )),
            value: 3000000000000000_u64.into(),
            data: Bytes::new(),
            signature_r: U256::from_str_radix(
                "151ccc02146b9b11adf516e6787b59acae3e76544fdcd75e77e67c6b598ce65d",
                16,
            )
            .unwrap(),
            signature_s: U256::from_str_radix(
                "64c5dd5aae2fbb535830ebbdad0234975cd7ece3562013b63ea18cc0df6c97d4",
                16,
            )
            .unwrap(),
            signature_y_parity: false,
            chain_id: 3151908,
            gas_limit: 63000,
            access_list: vec![],
            ..Default::default()
        };
        assert_eq!(tx, expected_tx);
    }

    #[test]
    fn deposit_canonical_encoding_starts_with_type_byte() {
        let tx = sample_deposit();
        let encoded = tx.encode_canonical_to_vec();
        assert_eq!(encoded[0], 0x7e);
        let decoded = DepositTransaction::decode_canonical(&encoded).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn deposit_wire_list_has_exactly_eight_fields() {
        let tx = sample_deposit();
        let encoded = tx.encode_to_vec();
        let mut decoder = Decoder::new(&encoded).unwrap();
        let mut fields = 0;
        while !decoder.is_done() {
            let (_, rest) = decoder.decode_field::<Bytes>("field").unwrap();
            decoder = rest;
            fields += 1;
        }
        assert_eq!(fields, 8);
    }

    #[test]
    fn deposit_signature_never_reaches_the_wire() {
        let tx = sample_deposit();
        let signed = tx.with_signature(true, U256::from(7), U256::from(9));
        assert_eq!(signed.encode_canonical_to_vec(), tx.encode_canonical_to_vec());
    }

    #[test]
    fn deposit_fee_caps_are_pinned_to_zero() {
        let tx = sample_deposit();
        assert_eq!(FeeMarketPricing::max_fee_per_gas(&tx), 0);
        assert_eq!(FeeMarketPricing::max_priority_fee_per_gas(&tx), 0);
        assert_eq!(tx.effective_priority_fee(1_000_000), 0);
        // The shared formula with zeroed caps: gas at the bare base fee plus
        // the transferred value.
        assert_eq!(
            tx.upfront_cost(1_000_000),
            U256::from(21000u64 * 1_000_000 + 10)
        );
        assert_eq!(tx.upfront_cost(0), U256::from(10));
    }

    #[test]
    fn deposit_from_generic_defaults_sender_to_zero_address() {
        let generic = GenericTransaction {
            r#type: TxType::Deposit,
            source_hash: Some(H256::from_slice(&[0x11; 32])),
            to: TxKind::Call(Address::from_slice(&[0xaa; 20])),
            mint: Some(U256::from(5)),
            value: U256::zero(),
            gas: Some(0x5208),
            ..Default::default()
        };
        let tx = DepositTransaction::from_generic(&generic, &deposit_era_config()).unwrap();
        assert_eq!(tx.from, Address::zero());
        assert_eq!(tx.mint, U256::from(5));
        assert!(!tx.is_system_tx);
        let serialized = tx.encode_canonical_to_vec();
        assert_eq!(serialized[0], 0x7e);
    }

    #[test]
    fn deposit_requires_fee_market_fork() {
        let generic = GenericTransaction {
            r#type: TxType::Deposit,
            source_hash: Some(H256::from_slice(&[0x11; 32])),
            to: TxKind::Call(Address::from_slice(&[0xaa; 20])),
            gas: Some(0x5208),
            ..Default::default()
        };
        let config = ChainConfig {
            london_block: None,
            ..deposit_era_config()
        };
        assert_eq!(
            DepositTransaction::from_generic(&generic, &config),
            Err(TransactionError::UnsupportedFork(Fork::London))
        );
    }

    #[test]
    fn regolith_forces_system_flag_off() {
        let generic = GenericTransaction {
            r#type: TxType::Deposit,
            to: TxKind::Call(Address::from_slice(&[0xaa; 20])),
            gas: Some(0x5208),
            is_system_tx: Some(true),
            ..Default::default()
        };
        let pre_regolith = deposit_era_config();
        let tx = DepositTransaction::from_generic(&generic, &pre_regolith).unwrap();
        assert!(tx.is_system_tx);

        let post_regolith = ChainConfig {
            regolith_time: Some(0),
            ..deposit_era_config()
        };
        let tx = DepositTransaction::from_generic(&generic, &post_regolith).unwrap();
        assert!(!tx.is_system_tx);
    }

    #[test]
    fn attaching_signatures_produces_new_instances() {
        let tx = sample_deposit();
        let first = tx.with_signature(false, U256::from(1), U256::from(2));
        let second = tx.with_signature(true, U256::from(3), U256::from(4));
        assert_ne!(first, second);
        // The original stays untouched.
        assert_eq!(tx.signature_r, U256::zero());
        assert_eq!(tx.signature_s, U256::zero());
        assert_eq!(first.signature_r, U256::from(1));
        assert_eq!(second.signature_r, U256::from(3));
    }

    #[test]
    fn deposit_rejects_high_s_signature() {
        let tx = sample_deposit().with_signature(
            false,
            U256::from(1),
            *crate::constants::SECP256K1_N_HALF + U256::one(),
        );
        assert_eq!(
            tx.validate_signature(),
            Err(TransactionError::SignatureMalleability)
        );
    }

    #[test]
    fn deposit_decode_rejects_wrong_type_prefix() {
        let tx = sample_deposit();
        let mut encoded = tx.encode_canonical_to_vec();
        encoded[0] = 0x02;
        assert!(matches!(
            DepositTransaction::decode_canonical(&encoded),
            Err(TransactionError::TypeMismatch {
                expected: TxType::Deposit,
                found: 0x02
            })
        ));
    }

    #[test]
    fn deposit_decode_rejects_short_field_list() {
        let mut payload = Vec::new();
        Encoder::new(&mut payload)
            .encode_field(&H256::from_slice(&[0x11; 32]))
            .encode_field(&Address::zero())
            .encode_field(&TxKind::Create)
            .encode_field(&U256::zero())
            .encode_field(&U256::zero())
            .finish();
        let err = DepositTransaction::decode(&payload).unwrap_err();
        assert_eq!(err, RLPDecodeError::MissingField("gas_limit"));
    }

    #[test]
    fn deposit_decode_rejects_non_minimal_integer() {
        // gas_limit of 0x5208 padded with a zero byte.
        let mut payload = Vec::new();
        Encoder::new(&mut payload)
            .encode_field(&H256::from_slice(&[0x11; 32]))
            .encode_field(&Address::zero())
            .encode_field(&TxKind::Create)
            .encode_field(&U256::from(5))
            .encode_field(&U256::zero())
            .encode_field(&Bytes::from(vec![0x00, 0x52, 0x08]))
            .encode_field(&false)
            .encode_field(&Bytes::new())
            .finish();
        let err = DepositTransaction::decode(&payload).unwrap_err();
        assert_eq!(err, RLPDecodeError::NonCanonicalInteger);
    }

    #[test]
    fn deposit_decode_with_config_checks_fork() {
        let encoded = sample_deposit().encode_canonical_to_vec();
        let config = ChainConfig {
            london_block: None,
            ..deposit_era_config()
        };
        assert_eq!(
            DepositTransaction::decode_with_config(&encoded, &config),
            Err(TransactionError::UnsupportedFork(Fork::London))
        );
        assert!(DepositTransaction::decode_with_config(&encoded, &deposit_era_config()).is_ok());
    }

    #[test]
    fn canonical_round_trip_every_variant() {
        let legacy = Transaction::LegacyTransaction(LegacyTransaction {
            nonce: 1,
            gas_price: 7,
            gas: 21000,
            to: TxKind::Call(Address::from_low_u64_be(0xaa)),
            value: U256::from(100),
            data: Bytes::from_static(b"\x01\x02"),
            v: U256::from(27),
            r: U256::from(5),
            s: U256::from(6),
            ..Default::default()
        });
        let eip2930 = Transaction::EIP2930Transaction(EIP2930Transaction {
            chain_id: 1729,
            nonce: 2,
            gas_price: 9,
            gas_limit: 30000,
            to: TxKind::Create,
            value: U256::zero(),
            data: Bytes::new(),
            access_list: vec![(Address::from_low_u64_be(1), vec![H256::from_low_u64_be(2)])],
            signature_y_parity: true,
            signature_r: U256::from(3),
            signature_s: U256::from(4),
            ..Default::default()
        });
        let eip1559 = Transaction::EIP1559Transaction(EIP1559Transaction {
            chain_id: 1729,
            nonce: 3,
            max_priority_fee_per_gas: 2,
            max_fee_per_gas: 20,
            gas_limit: 42000,
            to: TxKind::Call(Address::from_low_u64_be(0xbb)),
            value: U256::from(1_000_000),
            data: Bytes::new(),
            access_list: vec![],
            signature_y_parity: false,
            signature_r: U256::from(8),
            signature_s: U256::from(9),
            ..Default::default()
        });
        let deposit = Transaction::DepositTransaction(sample_deposit());

        for tx in [legacy, eip2930, eip1559, deposit] {
            let encoded = tx.encode_canonical_to_vec();
            let decoded = Transaction::decode_canonical(&encoded).unwrap();
            assert_eq!(decoded, tx);
        }
    }

    #[test]
    fn deposit_capability_set_is_uniform_with_fee_market_variants() {
        let tx = Transaction::DepositTransaction(sample_deposit());
        assert!(tx.supports(TxCapability::TypedEnvelope));
        assert!(tx.supports(TxCapability::AccessLists));
        assert!(tx.supports(TxCapability::FeeMarket));
        assert!(!tx.supports(TxCapability::LegacySigning));
        // Nominally active, pinned empty/zero.
        assert!(tx.access_list().is_empty());
        assert_eq!(tx.max_fee_per_gas(), Some(0));
        assert_eq!(tx.max_priority_fee(), Some(0));
    }

    #[test]
    fn deposit_sender_is_the_wire_from_field() {
        let tx = sample_deposit();
        let sender = Transaction::DepositTransaction(tx.clone()).sender().unwrap();
        assert_eq!(sender, tx.from);
    }

    #[test]
    fn effective_priority_fee_clamps_at_zero() {
        let tx = EIP1559Transaction {
            max_priority_fee_per_gas: 5,
            max_fee_per_gas: 10,
            gas_limit: 100,
            value: U256::from(7),
            ..Default::default()
        };
        assert_eq!(tx.effective_priority_fee(8), 2);
        assert_eq!(tx.effective_priority_fee(3), 5);
        assert_eq!(tx.effective_priority_fee(12), 0);
        // gas_limit * (base_fee + tip) + value
        assert_eq!(tx.upfront_cost(8), U256::from(100 * 10 + 7));
    }

    #[test]
    fn recover_address_rejects_high_s() {
        let mut sig = [0u8; 65];
        sig[..32].copy_from_slice(&U256::from(1).to_big_endian());
        sig[32..64].copy_from_slice(&(*SECP256K1_N_HALF + U256::one()).to_big_endian());
        let result = recover_address(Signature::from_slice(&sig), H256::zero());
        assert_eq!(result, Err(secp256k1::Error::InvalidSignature));
    }

    #[test]
    fn deserialize_tx_kind() {
        let tx_kind_create = r#""""#;
        let tx_kind_call = r#""0x6177843db3138ae69679A54b95cf345ED759450d""#;
        let deserialized_tx_kind_create = TxKind::Create;
        let deserialized_tx_kind_call = TxKind::Call(Address::from_slice(
            &hex::decode("6177843db3138ae69679A54b95cf345ED759450d").unwrap(),
        ));
        assert_eq!(
            deserialized_tx_kind_create,
            serde_json::from_str(tx_kind_create).unwrap()
        );
        assert_eq!(
            deserialized_tx_kind_call,
            serde_json::from_str(tx_kind_call).unwrap()
        )
    }

    #[test]
    fn deserialize_tx_type() {
        let tx_type_eip2930 = r#""0x01""#;
        let tx_type_deposit = r#""0x7e""#;
        assert_eq!(
            TxType::EIP2930,
            serde_json::from_str::<TxType>(tx_type_eip2930).unwrap()
        );
        assert_eq!(
            TxType::Deposit,
            serde_json::from_str::<TxType>(tx_type_deposit).unwrap()
        );
    }

    #[test]
    fn serialize_deserialize_deposit_transaction() {
        let tx = Transaction::DepositTransaction(sample_deposit());
        let serialized = serde_json::to_string(&tx).expect("Failed to serialize");
        assert!(serialized.contains("\"sourceHash\""));
        assert!(serialized.contains("\"isSystemTx\""));
        // Interface parity with the fee-market variants.
        assert!(serialized.contains("\"maxFeePerGas\":\"0x0\""));
        assert!(serialized.contains("\"maxPriorityFeePerGas\":\"0x0\""));

        let deserialized: Transaction =
            serde_json::from_str(&serialized).expect("Failed to deserialize");
        assert_eq!(deserialized, tx);
    }

    #[test]
    fn deserialize_generic_transaction() {
        let generic_transaction = r#"{
            "type":"0x7e",
            "to":"0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
            "gas":"0x5208",
            "value":"0x0",
            "mint":"0x5",
            "sourceHash":"0x1111111111111111111111111111111111111111111111111111111111111111",
            "input":"0x"
        }"#;
        let generic: GenericTransaction = serde_json::from_str(generic_transaction).unwrap();
        assert_eq!(generic.r#type, TxType::Deposit);
        assert_eq!(generic.mint, Some(U256::from(5)));
        assert_eq!(
            generic.source_hash,
            Some(H256::from_slice(&[0x11; 32]))
        );
        let tx = DepositTransaction::from_generic(&generic, &deposit_era_config()).unwrap();
        assert_eq!(tx.from, Address::zero());
        assert_eq!(tx.gas_limit, 0x5208);
    }

    #[test]
    fn network_form_round_trip() {
        let deposit = Transaction::DepositTransaction(sample_deposit());
        let encoded = deposit.encode_to_vec();
        let decoded = Transaction::decode(&encoded).unwrap();
        assert_eq!(decoded, deposit);
    }
}

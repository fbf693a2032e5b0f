//! SSZ receipts.

use alloy_primitives::{Address, Bloom, Bytes, B256};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        capacity::MAX_RECEIPT_FIELDS,
        limits::{
            BYTES_PER_ADDRESS, BYTES_PER_LOGS_BLOOM, MAX_LOGS_PER_RECEIPT, MAX_LOG_DATA_SIZE,
            MAX_TOPICS_PER_LOG,
        },
    },
    object::{fixed_list, parse_fixed_list, stable_value},
    ssz::{field, Schema, SszError, StableValue, Value},
    FieldCombination, SszObject, TransactionError,
};

/// Slot indices of `Receipt`.
pub mod receipt_slot {
    /// `root`.
    pub const ROOT: usize = 0;
    /// `gas_used`.
    pub const GAS_USED: usize = 1;
    /// `contract_address`.
    pub const CONTRACT_ADDRESS: usize = 2;
    /// `logs_bloom`.
    pub const LOGS_BLOOM: usize = 3;
    /// `logs`.
    pub const LOGS: usize = 4;
    /// `status`.
    pub const STATUS: usize = 5;
}

/// `Log` schema.
pub static LOG_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::Container(vec![
        field("address", Schema::ByteVector(BYTES_PER_ADDRESS)),
        field("topics", Schema::list(Schema::BYTES32, MAX_TOPICS_PER_LOG)),
        field("data", Schema::ByteList(MAX_LOG_DATA_SIZE)),
    ])
});

/// `Receipt` schema.
pub static RECEIPT_SCHEMA: Lazy<Schema> = Lazy::new(|| {
    Schema::stable_container(
        MAX_RECEIPT_FIELDS,
        vec![
            field("root", Schema::optional(Schema::BYTES32)),
            field("gas_used", Schema::UINT64),
            field("contract_address", Schema::optional(Schema::ByteVector(BYTES_PER_ADDRESS))),
            field("logs_bloom", Schema::ByteVector(BYTES_PER_LOGS_BLOOM)),
            field("logs", Schema::list(LOG_SCHEMA.clone(), MAX_LOGS_PER_RECEIPT)),
            field("status", Schema::optional(Schema::Boolean)),
        ],
    )
});

/// A log emitted during execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting contract.
    pub address: Address,
    /// Indexed topics.
    pub topics: Vec<B256>,
    /// Unindexed data.
    pub data: Bytes,
}

impl SszObject for Log {
    fn schema() -> &'static Schema {
        &LOG_SCHEMA
    }

    fn to_value(&self) -> Value {
        Value::Container(vec![
            Value::address(self.address),
            fixed_list(&self.topics),
            Value::Bytes(self.data.clone()),
        ])
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        let [address, topics, data] = value.as_fields::<3>()?;
        Ok(Self {
            address: address.as_address()?,
            topics: parse_fixed_list(topics)?,
            data: data.as_bytes()?.clone(),
        })
    }
}

/// Outcome of a transaction.
///
/// Unlike legacy receipts, `gas_used` is the gas used by this transaction alone and
/// `contract_address` is recorded directly for contract creations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Post-state root, for receipts of blocks before Byzantium.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<B256>,
    /// Gas used by the transaction.
    pub gas_used: u64,
    /// Created contract, for contract creations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    /// Bloom filter over `logs`.
    pub logs_bloom: Bloom,
    /// Emitted logs.
    pub logs: Vec<Log>,
    /// Execution status, for receipts of blocks from Byzantium on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl Receipt {
    /// Slots that are active in this receipt.
    pub fn active_fields(&self) -> crate::ssz::ActiveFields {
        self.to_stable().active_fields()
    }

    fn to_stable(&self) -> StableValue {
        use receipt_slot::*;

        StableValue::new(MAX_RECEIPT_FIELDS)
            .with_optional(ROOT, self.root.map(Value::fixed))
            .with(GAS_USED, Value::uint(self.gas_used))
            .with_optional(CONTRACT_ADDRESS, self.contract_address.map(Value::address))
            .with(LOGS_BLOOM, Value::fixed(self.logs_bloom.0))
            .with(LOGS, Value::List(self.logs.iter().map(SszObject::to_value).collect()))
            .with_optional(STATUS, self.status.map(Value::Bool))
    }
}

impl SszObject for Receipt {
    fn schema() -> &'static Schema {
        &RECEIPT_SCHEMA
    }

    fn to_value(&self) -> Value {
        self.to_stable().into()
    }

    fn from_value(value: &Value) -> Result<Self, SszError> {
        use receipt_slot::*;

        let fields = stable_value(Self::schema(), value)?;
        Ok(Self {
            root: fields.get(ROOT).map(Value::as_fixed).transpose()?,
            gas_used: fields.required(GAS_USED, "gas_used")?.as_u64()?,
            contract_address: fields.get(CONTRACT_ADDRESS).map(Value::as_address).transpose()?,
            logs_bloom: Bloom::from(fields.required(LOGS_BLOOM, "logs_bloom")?.as_fixed::<256>()?),
            logs: fields
                .required(LOGS, "logs")?
                .as_list()?
                .iter()
                .map(Log::from_value)
                .collect::<Result<_, _>>()?,
            status: fields.get(STATUS).map(Value::as_bool).transpose()?,
        })
    }
}

/// Checks that `receipt` carries exactly one of a post-state root and a status.
pub fn check_receipt_supported(receipt: &Receipt) -> Result<(), TransactionError> {
    if receipt.root.is_some() == receipt.status.is_some() {
        return Err(FieldCombination::ReceiptOutcome.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn receipt() -> Receipt {
        Receipt {
            gas_used: 21_000,
            logs: vec![Log {
                address: address!("0x4444444444444444444444444444444444444444"),
                topics: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
                data: Bytes::from_static(b"hello"),
            }],
            status: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_receipt_roundtrip() {
        let receipt = receipt();
        check_receipt_supported(&receipt).unwrap();
        assert_eq!(receipt.active_fields().iter().collect::<Vec<_>>(), vec![1, 3, 4, 5]);
        let decoded = Receipt::from_ssz_bytes(&receipt.ssz_bytes().unwrap()).unwrap();
        assert_eq!(decoded, receipt);
    }

    #[test]
    fn test_receipt_outcome_is_exclusive() {
        let mut both = receipt();
        both.root = Some(B256::repeat_byte(9));
        assert!(matches!(
            check_receipt_supported(&both),
            Err(TransactionError::UnsupportedFieldCombination(FieldCombination::ReceiptOutcome))
        ));

        let mut neither = receipt();
        neither.status = None;
        assert!(check_receipt_supported(&neither).is_err());
    }

    #[test]
    fn test_too_many_topics() {
        let mut receipt = receipt();
        receipt.logs[0].topics = vec![B256::ZERO; MAX_TOPICS_PER_LOG + 1];
        assert!(receipt.hash_tree_root().is_err());
    }
}

//! Root stability, summaries and field proofs of stable containers.

use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, B256, U256};
use ssz_tx::{
    ssz::{
        self, expand, field, field_proof, summarize, Schema, SchemaViolation, SszError,
        StableSchema, StableValue, Summary, Value,
    },
    from_legacy, payload_slot,
    test_utils::{basic_payload, eip1559_tx, TEST_CHAIN_ID},
    SszObject, TransactionPayload, TRANSACTION_PAYLOAD_SCHEMA,
};

fn two_field_schema() -> StableSchema {
    StableSchema::new(
        32,
        vec![field("a", Schema::UINT64), field("b", Schema::optional(Schema::UINT64))],
    )
}

fn payload_schema() -> &'static StableSchema {
    match &*TRANSACTION_PAYLOAD_SCHEMA {
        Schema::StableContainer(schema) => schema,
        other => panic!("unexpected payload schema {other:?}"),
    }
}

fn stable_bytes(schema: &StableSchema, value: &StableValue) -> Vec<u8> {
    ssz::serialize(&Schema::StableContainer(schema.clone()), &Value::Stable(value.clone())).unwrap()
}

#[test]
fn test_root_survives_added_field() {
    let schema = two_field_schema();
    let value = StableValue::new(32).with(0, Value::uint(7u64));
    let root = ssz::stable_root(&schema, &value).unwrap();
    let bytes = stable_bytes(&schema, &value);

    let extended = schema.extended(vec![field("c", Schema::optional(Schema::ByteList(1024)))]);
    let decoded = ssz::deserialize(&Schema::StableContainer(extended.clone()), &bytes)
        .unwrap()
        .into_stable()
        .unwrap();
    assert_eq!(decoded, value);
    assert_eq!(ssz::stable_root(&extended, &decoded).unwrap(), root);
    assert_eq!(stable_bytes(&extended, &decoded), bytes);

    // activating the new field changes the root, leaving the old one untouched
    let grown = decoded.with(2, Value::bytes(vec![1, 2, 3]));
    assert_ne!(ssz::stable_root(&extended, &grown).unwrap(), root);

    // raising the capacity itself from 32 to 33 is rejected
    let wider = StableSchema::new(33, extended.fields().to_vec());
    assert_eq!(
        ssz::stable_root(&wider, &value),
        Err(SszError::CapacityMisconfiguration { schema: 33, value: 32 })
    );
    assert_eq!(
        ssz::serialize(&Schema::StableContainer(wider.clone()), &Value::Stable(value.clone())),
        Err(SszError::CapacityMisconfiguration { schema: 33, value: 32 })
    );
    assert!(ssz::deserialize(&Schema::StableContainer(wider), &bytes).is_err());
}

#[test]
fn test_payload_root_survives_future_fields() {
    let payload = basic_payload(3);
    let root = payload.hash_tree_root().unwrap();

    let future = payload_schema().extended(vec![
        field("authorization_list", Schema::optional(Schema::list(Schema::BYTES32, 16))),
        field("max_fee_per_data_gas", Schema::optional(Schema::UINT256)),
    ]);
    assert_eq!(future.capacity(), payload_schema().capacity());
    let value = payload.to_value();
    assert_eq!(ssz::stable_root(&future, value.as_stable().unwrap()).unwrap(), root);
}

#[test]
fn test_capacity_is_part_of_the_type() {
    let schema = two_field_schema();
    let value = StableValue::new(16).with(0, Value::uint(7u64));
    assert_eq!(
        ssz::stable_root(&schema, &value),
        Err(SszError::CapacityMisconfiguration { schema: 32, value: 16 })
    );

    let smaller = StableSchema::new(16, schema.fields().to_vec());
    let same = StableValue::new(16).with(0, Value::uint(7u64));
    assert_ne!(
        ssz::stable_root(&smaller, &same).unwrap(),
        ssz::stable_root(&schema, &StableValue::new(32).with(0, Value::uint(7u64))).unwrap()
    );
}

#[test]
fn test_summary_shares_leaves_with_full_value() {
    let tx = from_legacy(&eip1559_tx(5).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
    let schema = payload_schema();
    let value = tx.payload.to_value().into_stable().unwrap();
    let keep = [payload_slot::NONCE, payload_slot::TO, payload_slot::MAX_PRIORITY_FEE_PER_GAS];

    let summary = summarize(schema, &value, &keep).unwrap();
    assert_eq!(summary.value().len(), 3);

    // every retained field proves against the summary root with the same leaf as in the full value
    let summary_root = summary.hash_tree_root().unwrap();
    for slot in keep {
        let partial = summary.field_proof(slot).unwrap();
        let full = field_proof(schema, &value, slot).unwrap();
        assert!(partial.verify(&summary_root));
        assert_eq!(partial.leaf, full.leaf);
        assert_eq!(partial.generalized_index(), full.generalized_index());
    }

    let decoded = Summary::from_bytes(schema, &summary.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, summary);

    let rest = value
        .iter()
        .filter(|(slot, _)| !keep.contains(slot))
        .fold(StableValue::new(value.capacity()), |rest, (slot, field)| rest.with(slot, field.clone()));
    let expanded = expand(schema, &summary, &rest).unwrap();
    assert_eq!(expanded, value);
    assert_eq!(TransactionPayload::from_value(&expanded.into()).unwrap(), tx.payload);
}

#[test]
fn test_expand_rejects_conflicts_and_gaps() {
    let schema = payload_schema();
    let value = basic_payload(1).to_value().into_stable().unwrap();
    let summary = summarize(schema, &value, &[payload_slot::NONCE]).unwrap();

    let conflicting = value.clone().with(payload_slot::NONCE, Value::uint(2u64));
    assert_eq!(
        expand(schema, &summary, &conflicting),
        Err(SchemaViolation::ConflictingField(payload_slot::NONCE).into())
    );

    let mut missing_gas = value;
    missing_gas.remove(payload_slot::GAS);
    missing_gas.remove(payload_slot::NONCE);
    assert_eq!(
        expand(schema, &summary, &missing_gas),
        Err(SchemaViolation::MissingField("gas").into())
    );
}

#[test]
fn test_field_proof_against_object_root() {
    let payload = TransactionPayload { to: Some(Address::repeat_byte(0x44)), ..basic_payload(9) };
    let root = payload.hash_tree_root().unwrap();
    let value = payload.to_value().into_stable().unwrap();

    let proof = field_proof(payload_schema(), &value, payload_slot::VALUE).unwrap();
    assert!(proof.verify(&root));
    assert_eq!(proof.branch.len(), 5);
    assert_eq!(proof.generalized_index(), 64 + payload_slot::VALUE);

    let mut tampered = proof.clone();
    tampered.leaf = ssz::hash_tree_root(&Schema::UINT256, &Value::Uint(U256::from(1))).unwrap();
    assert!(!tampered.verify(&root));

    // inactive slots prove a zero leaf
    let absent = field_proof(payload_schema(), &value, payload_slot::ACCESS_LIST).unwrap();
    assert_eq!(absent.leaf, B256::ZERO);
    assert!(absent.verify(&root));

    assert_eq!(
        field_proof(payload_schema(), &value, 32),
        Err(SchemaViolation::UndefinedField(32).into())
    );
}

//! Benchmarks for merkleization, encoding and legacy conversion.
#![allow(missing_docs)]

use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, B256};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ssz_tx::{
    from_legacy,
    test_utils::{basic_payload, eip1559_tx, TEST_CHAIN_ID},
    AccessTuple, SignedTransaction, SszObject, TransactionPayload,
};

/// A fee market payload with a large access list and call data.
fn heavy_payload() -> TransactionPayload {
    let access_list = (0..64u8)
        .map(|i| AccessTuple {
            address: Address::repeat_byte(i),
            storage_keys: (0..16u8).map(|k| B256::repeat_byte(k ^ i)).collect(),
        })
        .collect();
    TransactionPayload {
        input: Bytes::from(vec![0xab; 16 * 1024]),
        access_list: Some(access_list),
        max_priority_fee_per_gas: Some(alloy_primitives::U256::from(1)),
        ..basic_payload(0)
    }
}

fn bench_hash_tree_root(c: &mut Criterion) {
    let basic = basic_payload(0);
    let heavy = heavy_payload();
    c.bench_function("hash_tree_root/basic_payload", |b| {
        b.iter(|| black_box(&basic).hash_tree_root().unwrap())
    });
    c.bench_function("hash_tree_root/heavy_payload", |b| {
        b.iter(|| black_box(&heavy).hash_tree_root().unwrap())
    });
}

fn bench_codec(c: &mut Criterion) {
    let tx = from_legacy(&eip1559_tx(0).encoded_2718(), TEST_CHAIN_ID).unwrap().tx;
    let bytes = tx.ssz_bytes().unwrap();
    c.bench_function("codec/serialize", |b| b.iter(|| black_box(&tx).ssz_bytes().unwrap()));
    c.bench_function("codec/deserialize", |b| {
        b.iter(|| SignedTransaction::from_ssz_bytes(black_box(&bytes)).unwrap())
    });
}

fn bench_from_legacy(c: &mut Criterion) {
    let encoded = eip1559_tx(0).encoded_2718();
    c.bench_function("legacy/from_legacy", |b| {
        b.iter(|| from_legacy(black_box(&encoded), TEST_CHAIN_ID).unwrap())
    });
}

criterion_group!(benches, bench_hash_tree_root, bench_codec, bench_from_legacy);
criterion_main!(benches);

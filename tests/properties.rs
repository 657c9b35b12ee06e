//! Invariants, round-trip laws, idempotence, and boundary behaviours from
//! SPEC_FULL.md §8, exercised through `apply_record`.

use utxo_engine::testutil::{MockHost, MockRecord};
use utxo_engine::value::{MapKey, Value};
use utxo_engine::{apply_record, bins, Record};

fn hash(byte: u8) -> Vec<u8> {
    vec![byte; 32]
}

fn spending(byte: u8) -> Vec<u8> {
    vec![byte; 36]
}

fn status_of(v: &Value) -> String {
    v.as_map().unwrap().get(&MapKey::Str("status".into())).unwrap().as_str().unwrap().to_string()
}

fn error_code_of(v: &Value) -> Option<String> {
    v.as_map().unwrap().get(&MapKey::Str("errorCode".into())).and_then(Value::as_str).map(str::to_string)
}

fn counted_spent(record: &MockRecord) -> i64 {
    record
        .get(bins::UTXOS)
        .and_then(Value::as_list)
        .map(|l| l.iter().filter(|v| v.as_bytes().map(|b| b.len() == 68).unwrap_or(false)).count() as i64)
        .unwrap_or(0)
}

#[test]
fn spent_utxos_matches_68_byte_entries_after_spend() {
    let mut record = MockRecord::with_bins([(
        bins::UTXOS,
        Value::List(vec![Value::Bytes(hash(0)), Value::Bytes(hash(1))]),
    )]);
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(100),
    ];
    apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), counted_spent(&record));
}

#[test]
fn spent_extra_recs_stays_within_total() {
    let mut record = MockRecord::with_bins([(bins::TOTAL_EXTRA_RECS, Value::Int(3))]);
    let mut host = MockHost::new();

    let inc = |n: i64| vec![Value::Int(n), Value::Int(1000), Value::Int(100)];

    let r = apply_record(&mut record, Some("incrementSpentExtraRecs"), &inc(3), Some(&mut host)).unwrap();
    assert_eq!(status_of(&r), "OK");
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_EXTRA_RECS, -1), 3);

    let r = apply_record(&mut record, Some("incrementSpentExtraRecs"), &inc(1), Some(&mut host)).unwrap();
    assert_eq!(status_of(&r), "ERROR");

    let r = apply_record(&mut record, Some("incrementSpentExtraRecs"), &inc(-3), Some(&mut host)).unwrap();
    assert_eq!(status_of(&r), "OK");
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_EXTRA_RECS, -1), 0);

    let r = apply_record(&mut record, Some("incrementSpentExtraRecs"), &inc(-1), Some(&mut host)).unwrap();
    assert_eq!(status_of(&r), "ERROR");
}

#[test]
fn block_id_lists_stay_parallel() {
    let mut record = MockRecord::new();
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(1),
        Value::Int(10),
        Value::Int(0),
        Value::Int(1000),
        Value::Int(100),
        Value::Bool(true),
        Value::Bool(false),
    ];
    apply_record(&mut record, Some("setMined"), &args, Some(&mut host)).unwrap();
    let args2 = vec![
        Value::Int(2),
        Value::Int(20),
        Value::Int(1),
        Value::Int(1000),
        Value::Int(100),
        Value::Bool(true),
        Value::Bool(false),
    ];
    apply_record(&mut record, Some("setMined"), &args2, Some(&mut host)).unwrap();

    let len = |bin: &str| record.get(bin).and_then(Value::as_list).unwrap().len();
    assert_eq!(len(bins::BLOCK_IDS), len(bins::BLOCK_HEIGHTS));
    assert_eq!(len(bins::BLOCK_IDS), len(bins::SUBTREE_IDXS));
}

#[test]
fn unspend_after_spend_restores_encoding_and_counter() {
    let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
    let mut host = MockHost::new();
    let spend_args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(100),
    ];
    apply_record(&mut record, Some("spend"), &spend_args, Some(&mut host)).unwrap();
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 1);

    let unspend_args = vec![Value::Int(0), Value::Bytes(hash(0)), Value::Int(1000), Value::Int(100)];
    apply_record(&mut record, Some("unspend"), &unspend_args, Some(&mut host)).unwrap();

    assert_eq!(
        record.get(bins::UTXOS).and_then(Value::as_list).unwrap()[0].as_bytes().unwrap(),
        hash(0).as_slice()
    );
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 0);
}

#[test]
fn unfreeze_after_freeze_restores_unspent_encoding() {
    let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
    let mut host = MockHost::new();

    let args = vec![Value::Int(0), Value::Bytes(hash(0))];
    apply_record(&mut record, Some("freeze"), &args, Some(&mut host)).unwrap();
    assert_eq!(
        record.get(bins::UTXOS).and_then(Value::as_list).unwrap()[0].as_bytes().unwrap().len(),
        68
    );
    apply_record(&mut record, Some("unfreeze"), &args, Some(&mut host)).unwrap();
    assert_eq!(
        record.get(bins::UTXOS).and_then(Value::as_list).unwrap()[0].as_bytes().unwrap(),
        hash(0).as_slice()
    );
}

#[test]
fn freeze_unfreeze_freeze_succeeds_each_step() {
    let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
    let mut host = MockHost::new();
    let args = vec![Value::Int(0), Value::Bytes(hash(0))];

    assert_eq!(status_of(&apply_record(&mut record, Some("freeze"), &args, Some(&mut host)).unwrap()), "OK");
    assert_eq!(status_of(&apply_record(&mut record, Some("unfreeze"), &args, Some(&mut host)).unwrap()), "OK");
    assert_eq!(status_of(&apply_record(&mut record, Some("freeze"), &args, Some(&mut host)).unwrap()), "OK");
}

#[test]
fn idempotent_respend_increments_counter_exactly_once() {
    let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(100),
    ];
    let r1 = apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert_eq!(status_of(&r1), "OK");
    let r2 = apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert_eq!(status_of(&r2), "OK");
    assert_eq!(bins::get_i64_or(&record, bins::SPENT_UTXOS, -1), 1);
}

#[test]
fn spend_boundary_spending_height_equal_to_current_succeeds() {
    let mut record = MockRecord::with_bins([
        (bins::SPENDING_HEIGHT, Value::Int(1000)),
        (bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))])),
    ]);
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(100),
    ];
    let r = apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert_eq!(status_of(&r), "OK");
}

#[test]
fn spend_boundary_frozen_until_equal_to_current_fails() {
    let mut spendable_in = std::collections::BTreeMap::new();
    spendable_in.insert(MapKey::Int(0), Value::Int(1000));
    let mut record = MockRecord::with_bins([
        (bins::UTXO_SPENDABLE_IN, Value::Map(spendable_in)),
        (bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))])),
    ]);
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(100),
    ];
    let r = apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert_eq!(error_code_of(&r).as_deref(), Some("FROZEN_UNTIL"));
}

#[test]
fn zero_retention_never_writes_delete_at_height() {
    let mut record = MockRecord::with_bins([(bins::UTXOS, Value::List(vec![Value::Bytes(hash(0))]))]);
    let mut host = MockHost::new();
    let args = vec![
        Value::Int(0),
        Value::Bytes(hash(0)),
        Value::Bytes(spending(0xEE)),
        Value::Bool(false),
        Value::Bool(false),
        Value::Int(1000),
        Value::Int(0),
    ];
    let r = apply_record(&mut record, Some("spend"), &args, Some(&mut host)).unwrap();
    assert!(r.as_map().unwrap().get(&MapKey::Str("signal".into())).is_none());
    assert!(record.get(bins::DELETE_AT_HEIGHT).is_none());
}

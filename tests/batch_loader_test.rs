//! Batch partitioning and the per-batch transaction state machine.

mod common;

use bank_loader::error::LoadError;
use bank_loader::loader::{BatchLoader, BatchState, CancelToken};
use bank_loader::store::{InsertTemplate, StoreError};
use common::{int_rows, Call, RecordingStore};

fn template() -> InsertTemplate {
    InsertTemplate::new("t", vec!["n".to_string()])
}

fn load_sizes(rows: i64, batch_size: usize) -> (Vec<usize>, RecordingStore<bank_loader::store::SqlScriptStore>) {
    let mut store = RecordingStore::detached();
    let data = int_rows(rows);
    let loader = BatchLoader::new(batch_size);
    let outcome = loader
        .load(&mut store, &template(), &data, &CancelToken::new(), &mut |_: BatchState| {})
        .unwrap();
    assert_eq!(outcome.rows, rows as u64);
    assert_eq!(store.inserted_rows("t"), data, "every row exactly once, in order");
    (store.insert_sizes("t"), store)
}

// =============================================================================
// Partitioning
// =============================================================================

#[test]
fn test_zero_rows_issue_no_batches() {
    let (sizes, store) = load_sizes(0, 4);
    assert!(sizes.is_empty());
    assert_eq!(store.count(&Call::Begin), 0);
}

#[test]
fn test_single_row() {
    let (sizes, _) = load_sizes(1, 4);
    assert_eq!(sizes, vec![1]);
}

#[test]
fn test_exactly_one_batch() {
    let (sizes, _) = load_sizes(4, 4);
    assert_eq!(sizes, vec![4]);
}

#[test]
fn test_batch_size_plus_one() {
    let (sizes, _) = load_sizes(5, 4);
    assert_eq!(sizes, vec![4, 1]);
}

#[test]
fn test_chunks_and_batch_count_agree() {
    let loader = BatchLoader::new(3);
    let rows = int_rows(10);
    let chunks: Vec<usize> = loader.chunks(&rows).map(|c| c.len()).collect();
    assert_eq!(chunks, vec![3, 3, 3, 1]);
    assert_eq!(loader.batch_count(10), 4);
    assert_eq!(loader.batch_count(0), 0);
}

#[test]
fn test_zero_batch_size_clamped() {
    assert_eq!(BatchLoader::new(0).batch_size(), 1);
}

// =============================================================================
// Transactions and state machine
// =============================================================================

#[test]
fn test_each_batch_is_its_own_transaction() {
    let (_, store) = load_sizes(5, 2);
    let shape: Vec<&str> = store
        .calls
        .iter()
        .map(|c| match c {
            Call::Begin => "begin",
            Call::Insert { .. } => "insert",
            Call::Commit => "commit",
            _ => "other",
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            "begin", "insert", "commit", "begin", "insert", "commit", "begin", "insert", "commit"
        ]
    );
}

#[test]
fn test_state_sequence() {
    let mut store = RecordingStore::detached();
    let mut states = Vec::new();
    BatchLoader::new(2)
        .load(&mut store, &template(), &int_rows(3), &CancelToken::new(), &mut |s: BatchState| {
            states.push(s)
        })
        .unwrap();

    assert_eq!(
        states,
        vec![
            BatchState::Pending,
            BatchState::Inserting { batch: 1, rows: 2 },
            BatchState::Committed { batch: 1, committed_rows: 2 },
            BatchState::Inserting { batch: 2, rows: 1 },
            BatchState::Committed { batch: 2, committed_rows: 3 },
            BatchState::Done { batches: 2, committed_rows: 3 },
        ]
    );
}

#[test]
fn test_failed_batch_rolls_back_and_stops() {
    let mut store = RecordingStore::detached().fail_insert("t", 2);
    let mut states = Vec::new();
    let err = BatchLoader::new(2)
        .load(&mut store, &template(), &int_rows(6), &CancelToken::new(), &mut |s: BatchState| {
            states.push(s)
        })
        .unwrap_err();

    match err {
        LoadError::BatchInsert {
            table,
            batch,
            committed_rows,
            ..
        } => {
            assert_eq!(table, "t");
            assert_eq!(batch, 2);
            assert_eq!(committed_rows, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.count(&Call::Commit), 1);
    assert_eq!(store.count(&Call::Rollback), 1);
    assert_eq!(store.insert_sizes("t"), vec![2, 2], "no batch after the failure");
    assert_eq!(
        states.last(),
        Some(&BatchState::Failed { batch: 2, committed_rows: 2 })
    );
}

#[test]
fn test_short_insert_count_fails_batch() {
    let mut store = RecordingStore::detached().short_by(1);
    let err = BatchLoader::new(4)
        .load(&mut store, &template(), &int_rows(8), &CancelToken::new(), &mut |_: BatchState| {})
        .unwrap_err();

    match err {
        LoadError::BatchInsert {
            batch,
            committed_rows,
            source: StoreError::RowCountMismatch { expected, affected },
            ..
        } => {
            assert_eq!(batch, 1);
            assert_eq!(committed_rows, 0);
            assert_eq!((expected, affected), (4, 3));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.count(&Call::Commit), 0);
    assert_eq!(store.count(&Call::Rollback), 1);
}

#[test]
fn test_committed_rows_follow_store_count() {
    let mut store = RecordingStore::detached();
    let mut last = None;
    let outcome = BatchLoader::new(4)
        .load(&mut store, &template(), &int_rows(8), &CancelToken::new(), &mut |s: BatchState| {
            last = Some(s)
        })
        .unwrap();
    assert_eq!(outcome.rows, 8);
    assert_eq!(last, Some(BatchState::Done { batches: 2, committed_rows: 8 }));
}

#[test]
fn test_cancellation_keeps_committed_batches() {
    let cancel = CancelToken::new();
    let mut store = RecordingStore::detached().cancel_after(cancel.clone(), 2);
    let err = BatchLoader::new(2)
        .load(&mut store, &template(), &int_rows(9), &cancel, &mut |_: BatchState| {})
        .unwrap_err();

    match err {
        LoadError::Cancelled {
            table,
            committed_rows,
        } => {
            assert_eq!(table, "t");
            assert_eq!(committed_rows, 4);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.count(&Call::Commit), 2);
    assert_eq!(store.count(&Call::Rollback), 0);
}

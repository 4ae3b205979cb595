//! Racing tills against a file-backed database.

mod common;

use std::time::Duration;

use common::*;
use minipos_sales::{CommitContext, SaleEngine, SaleError, SalesConfig};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_never_oversell() {
    let temp = TempDb::new().await;
    add_product(&temp.db, "A", 1000, 5).await;
    let engine = SaleEngine::new(temp.db.clone(), SalesConfig::default());

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                engine
                    .commit(&cash_sale(vec![item("A", 1)]), CommitContext::default())
                    .await
            })
        })
        .collect();

    let mut committed = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => committed += 1,
            Err(SaleError::InsufficientStock { available, .. }) => {
                assert_eq!(available, 0);
                short += 1;
            }
            Err(other) => panic!("unexpected {other:?}"),
        }
    }

    assert_eq!(committed, 5);
    assert_eq!(short, 15);
    assert_eq!(stock_of(&temp.db, "A").await, 0);
    assert_eq!(sale_count(&temp.db).await, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_retries_with_same_key_commit_once() {
    let temp = TempDb::new().await;
    add_product(&temp.db, "A", 1000, 50).await;
    let engine = SaleEngine::new(temp.db.clone(), SalesConfig::default());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                let ctx = CommitContext {
                    idempotency_key: Some("till-1-receipt-77".to_string()),
                    ..Default::default()
                };
                engine.commit(&cash_sale(vec![item("A", 2)]), ctx).await
            })
        })
        .collect();

    let mut ids = Vec::new();
    let mut fresh = 0;
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        if !outcome.replayed {
            fresh += 1;
        }
        ids.push(outcome.sale.sale.id);
    }

    assert_eq!(fresh, 1);
    assert!(ids.iter().all(|id| id == &ids[0]));
    assert_eq!(stock_of(&temp.db, "A").await, 48);
    assert_eq!(sale_count(&temp.db).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn commit_times_out_behind_held_write_lock() {
    let temp = TempDb::new().await;
    add_product(&temp.db, "A", 1000, 10).await;
    let engine = SaleEngine::new(
        temp.db.clone(),
        SalesConfig::default().commit_timeout(Duration::from_millis(200)),
    );

    // Another writer holds the lock for longer than the engine will wait
    let mut holder = temp.db.begin().await.unwrap();
    sqlx::query("UPDATE products SET min_stock = min_stock WHERE id = 'A'")
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = engine
        .commit(&cash_sale(vec![item("A", 1)]), CommitContext::default())
        .await
        .unwrap_err();

    holder.rollback().await.unwrap();

    assert!(err.is_retryable(), "unexpected {err:?}");
    assert!(matches!(err, SaleError::Persistence { .. }));
    assert_eq!(stock_of(&temp.db, "A").await, 10);
    assert_eq!(sale_count(&temp.db).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn customer_deleted_mid_commit_is_not_found() {
    let temp = TempDb::new().await;
    add_product(&temp.db, "A", 1000, 10).await;
    add_customer(&temp.db, "C1").await;
    let engine = SaleEngine::new(temp.db.clone(), SalesConfig::default());

    // The delete holds the write lock, so the engine sees the customer in its
    // pre-check and then queues behind the delete
    let mut holder = temp.db.begin().await.unwrap();
    sqlx::query("DELETE FROM customers WHERE id = 'C1'")
        .execute(&mut *holder)
        .await
        .unwrap();

    let mut request = cash_sale(vec![item("A", 1)]);
    request.customer_id = Some("C1".to_string());
    let pending = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.commit(&request, CommitContext::default()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    holder.commit().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();

    assert!(
        matches!(err, SaleError::NotFound { ref entity, ref id } if entity == "Customer" && id == "C1"),
        "unexpected {err:?}"
    );
    assert_eq!(stock_of(&temp.db, "A").await, 10);
    assert_eq!(sale_count(&temp.db).await, 0);
}

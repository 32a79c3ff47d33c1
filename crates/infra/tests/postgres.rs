//! Postgres-backed integration tests.
//!
//! These run against a real database and skip themselves when
//! `DATABASE_URL` is not set, so the default `cargo test` stays hermetic.
//! Each test builds its own catalog/orders and never assumes a clean
//! database beyond the migrated schema.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sqlx::PgPool;

use shopworks_catalog::NewProduct;
use shopworks_core::UserId;
use shopworks_events::{CatalogEvent, InMemoryEventBus};
use shopworks_infra::{
    CatalogService, NewDiscount, OrderService, RecomputeDispatcher, StoreError, connect,
    run_migrations, sweep_stale_pending,
};
use shopworks_orders::{OrderStatus, TransitionError};

type Bus = InMemoryEventBus<CatalogEvent>;

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = connect(&url).await.expect("failed to connect test database");
    run_migrations(&pool).await.expect("failed to run migrations");
    Some(pool)
}

fn catalog(pool: &PgPool) -> CatalogService<Bus> {
    CatalogService::new(pool.clone(), Arc::new(Bus::new()))
}

fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::now_v7().simple())
}

async fn seed_product(
    catalog: &CatalogService<Bus>,
    price: rust_decimal::Decimal,
    inventory: u32,
) -> shopworks_catalog::Product {
    catalog
        .create_product(NewProduct {
            name: unique_name("product"),
            price,
            description: String::new(),
            inventory,
        })
        .await
        .expect("failed to seed product")
}

#[tokio::test]
async fn confirm_decrements_stock_and_freezes_total() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());

    let product = seed_product(&catalog, dec!(150.83), 4).await;
    let now = Utc::now();
    let view = orders.create_order(UserId::new(), now).await.unwrap();
    orders
        .add_item(view.order.id, product.id, 3, now)
        .await
        .unwrap();

    let confirmed = orders.confirm(view.order.id).await.unwrap();
    assert_eq!(confirmed.order.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.order.total_price, dec!(452.49));

    let after = catalog.get_product(product.id).await.unwrap();
    assert_eq!(after.inventory, 1);
}

#[tokio::test]
async fn failing_confirm_reports_all_lines_and_touches_nothing() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());

    let scarce = seed_product(&catalog, dec!(10.00), 1).await;
    let plenty = seed_product(&catalog, dec!(20.00), 10).await;
    let now = Utc::now();
    let view = orders.create_order(UserId::new(), now).await.unwrap();
    // Lines pass the add-time check, then stock is pulled out from under them.
    orders.add_item(view.order.id, scarce.id, 1, now).await.unwrap();
    orders.add_item(view.order.id, plenty.id, 2, now).await.unwrap();
    orders
        .update_item(view.order.id, scarce.id, 1, now)
        .await
        .unwrap();

    // Drain the scarce product through another confirmed order.
    let other = orders.create_order(UserId::new(), now).await.unwrap();
    orders.add_item(other.order.id, scarce.id, 1, now).await.unwrap();
    orders.confirm(other.order.id).await.unwrap();

    let err = orders.confirm(view.order.id).await.unwrap_err();
    match err {
        StoreError::Transition(TransitionError::InsufficientStock(shortages)) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].product_id, scarce.id);
            assert_eq!(shortages[0].available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing moved: still pending, no inventory consumed beyond the other order.
    let unchanged = orders.get_order(view.order.id).await.unwrap();
    assert_eq!(unchanged.order.status, OrderStatus::Pending);
    assert_eq!(catalog.get_product(plenty.id).await.unwrap().inventory, 10);
}

#[tokio::test]
async fn discount_event_updates_pending_totals_and_delete_reverts() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());
    let dispatcher = RecomputeDispatcher::new(pool.clone());

    let first = seed_product(&catalog, dec!(150.83), 10).await;
    let second = seed_product(&catalog, dec!(500.00), 10).await;
    let now = Utc::now();
    let view = orders.create_order(UserId::new(), now).await.unwrap();
    orders.add_item(view.order.id, first.id, 1, now).await.unwrap();
    orders.add_item(view.order.id, second.id, 1, now).await.unwrap();
    assert_eq!(
        orders.get_order(view.order.id).await.unwrap().order.total_price,
        dec!(650.83)
    );

    let discount = catalog
        .create_discount(
            second.id,
            NewDiscount {
                percentage: dec!(50),
                starts_at: now - Duration::hours(1),
                ends_at: now + Duration::hours(1),
                is_active: true,
            },
            now,
        )
        .await
        .unwrap();
    dispatcher
        .handle(&CatalogEvent::DiscountChanged {
            product_id: second.id,
            occurred_at: now,
        })
        .await
        .unwrap();
    assert_eq!(
        orders.get_order(view.order.id).await.unwrap().order.total_price,
        dec!(400.83)
    );

    catalog.delete_discount(discount.id, now).await.unwrap();
    dispatcher
        .handle(&CatalogEvent::DiscountRemoved {
            product_id: second.id,
            occurred_at: now,
        })
        .await
        .unwrap();
    assert_eq!(
        orders.get_order(view.order.id).await.unwrap().order.total_price,
        dec!(650.83)
    );
}

#[tokio::test]
async fn dispatcher_application_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());
    let dispatcher = RecomputeDispatcher::new(pool.clone());

    let product = seed_product(&catalog, dec!(100.00), 10).await;
    let now = Utc::now();
    let view = orders.create_order(UserId::new(), now).await.unwrap();
    orders.add_item(view.order.id, product.id, 2, now).await.unwrap();

    catalog.update_price(product.id, dec!(80.00), now).await.unwrap();
    let event = CatalogEvent::ProductPriceChanged {
        product_id: product.id,
        occurred_at: now,
    };
    dispatcher.handle(&event).await.unwrap();
    let once = orders.get_order(view.order.id).await.unwrap();
    dispatcher.handle(&event).await.unwrap();
    let twice = orders.get_order(view.order.id).await.unwrap();

    assert_eq!(once.order.total_price, dec!(160.00));
    assert_eq!(once.order.total_price, twice.order.total_price);
    assert_eq!(once.items[0].price, dec!(80.00));
}

#[tokio::test]
async fn sweep_cancels_only_stale_pending_orders() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());

    let product = seed_product(&catalog, dec!(10.00), 10).await;
    let now = Utc::now();

    let stale = orders
        .create_order(UserId::new(), now - Duration::hours(6))
        .await
        .unwrap();
    orders.add_item(stale.order.id, product.id, 2, now).await.unwrap();
    let fresh = orders
        .create_order(UserId::new(), now - Duration::hours(1))
        .await
        .unwrap();

    let report = sweep_stale_pending(&pool, now).await.unwrap();
    assert!(report.canceled >= 1);

    assert_eq!(
        orders.get_order(stale.order.id).await.unwrap().order.status,
        OrderStatus::Canceled
    );
    assert_eq!(
        orders.get_order(fresh.order.id).await.unwrap().order.status,
        OrderStatus::Pending
    );
    // Cancel released the pending reservation back (preserved rule: cancel
    // always releases, even from never-confirmed pending).
    assert_eq!(catalog.get_product(product.id).await.unwrap().inventory, 12);
}

#[tokio::test]
async fn regenerate_snapshots_current_prices() {
    let Some(pool) = test_pool().await else { return };
    let catalog = catalog(&pool);
    let orders = OrderService::new(pool.clone());

    let product = seed_product(&catalog, dec!(50.00), 10).await;
    let now = Utc::now();
    let source = orders.create_order(UserId::new(), now).await.unwrap();
    orders.add_item(source.order.id, product.id, 2, now).await.unwrap();
    orders.confirm(source.order.id).await.unwrap();
    orders.complete(source.order.id).await.unwrap();

    catalog.update_price(product.id, dec!(75.00), now).await.unwrap();

    let actor = UserId::new();
    let regenerated = orders.regenerate(source.order.id, actor, now).await.unwrap();
    assert_eq!(regenerated.order.status, OrderStatus::Pending);
    assert_eq!(regenerated.order.customer, actor);
    assert_ne!(regenerated.order.id, source.order.id);
    assert_eq!(regenerated.items.len(), 1);
    assert_eq!(regenerated.items[0].quantity, 2);
    assert_eq!(regenerated.items[0].price, dec!(75.00));
    assert_eq!(regenerated.order.total_price, dec!(150.00));
}

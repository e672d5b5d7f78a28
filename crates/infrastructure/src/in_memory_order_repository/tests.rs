use chrono::Duration;

use sealworks_application::{OrderFilter, OrderRepository, OrderSortField, SortDirection};
use sealworks_core::AppError;
use sealworks_domain::{OrderStatus, PageRequest};

use super::InMemoryOrderRepository;
use crate::test_fixtures::{order, payment, shipment};

fn seeded() -> InMemoryOrderRepository {
    let mut first = order("ord_1", OrderStatus::Paid, 0);
    first.channel = Some("web".to_owned());
    first.production_queue = Some("pqu_1".to_owned());
    first.updated_at = first.created_at + Duration::hours(5);

    let mut second = order("ord_2", OrderStatus::Shipped, 10);
    second.channel = Some("store".to_owned());
    second.shipments.push(shipment("shp_1", "1Z999"));

    let mut third = order("ord_3", OrderStatus::InProduction, 20);
    third.channel = Some("web".to_owned());
    third.production_queue = Some("pqu_1".to_owned());
    third.payments.push(payment("pay_1", "pi_123"));

    InMemoryOrderRepository::with_orders([first, second, third])
}

fn ids(orders: &[sealworks_domain::Order]) -> Vec<&str> {
    orders.iter().map(|order| order.id.as_str()).collect()
}

#[tokio::test]
async fn list_sorts_by_requested_field() {
    let repository = seeded();

    let by_updated = repository
        .list_orders(&OrderFilter::default())
        .await
        .unwrap_or_default();
    assert_eq!(ids(&by_updated.items), vec!["ord_1", "ord_3", "ord_2"]);

    let by_created = repository
        .list_orders(&OrderFilter {
            sort: OrderSortField::CreatedAt,
            direction: SortDirection::Asc,
            ..OrderFilter::default()
        })
        .await
        .unwrap_or_default();
    assert_eq!(ids(&by_created.items), vec!["ord_1", "ord_2", "ord_3"]);
}

#[tokio::test]
async fn list_filters_and_pages() {
    let repository = seeded();
    let mut filter = OrderFilter {
        channel: Some("web".to_owned()),
        page: PageRequest::new(Some(1), None),
        ..OrderFilter::default()
    };

    let first = repository.list_orders(&filter).await.unwrap_or_default();
    assert_eq!(ids(&first.items), vec!["ord_1"]);
    assert!(first.next_page_token.is_some());

    filter.page.page_token = first.next_page_token;
    let second = repository.list_orders(&filter).await.unwrap_or_default();
    assert_eq!(ids(&second.items), vec!["ord_3"]);
    assert_eq!(second.next_page_token, None);
}

#[tokio::test]
async fn lookups_by_reference() {
    let repository = seeded();

    let by_tracking = repository
        .find_order_by_tracking_code("1z999")
        .await
        .unwrap_or_default();
    assert_eq!(by_tracking.map(|order| order.id), Some("ord_2".to_owned()));

    let by_intent = repository
        .find_order_by_payment_intent("pi_123")
        .await
        .unwrap_or_default();
    assert_eq!(by_intent.map(|order| order.id), Some("ord_3".to_owned()));

    let queued = repository
        .list_queue_orders("pqu_1")
        .await
        .unwrap_or_default();
    assert_eq!(ids(&queued), vec!["ord_1", "ord_3"]);
}

#[tokio::test]
async fn save_detects_concurrent_modification() {
    let repository = seeded();
    let stored = repository
        .find_order("ord_2")
        .await
        .unwrap_or_default()
        .unwrap_or_else(|| unreachable!("seeded order"));

    let mut changed = stored.clone();
    changed.status = OrderStatus::Delivered;
    changed.updated_at = stored.updated_at + Duration::minutes(1);
    assert!(
        repository
            .save_order(changed.clone(), stored.updated_at)
            .await
            .is_ok()
    );

    assert!(matches!(
        repository.save_order(changed, stored.updated_at).await,
        Err(AppError::Conflict(_))
    ));
}

#[tokio::test]
async fn save_requires_existing_order() {
    let repository = InMemoryOrderRepository::new();
    let missing = order("ord_9", OrderStatus::Paid, 0);
    let expected = missing.updated_at;
    assert!(matches!(
        repository.save_order(missing, expected).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn queue_assignment_enforces_capacity_atomically() {
    let repository = std::sync::Arc::new(InMemoryOrderRepository::with_orders([
        order("ord_a", OrderStatus::Paid, 0),
        order("ord_b", OrderStatus::Paid, 1),
    ]));

    let assign = |order_id: &'static str| {
        let repository = repository.clone();
        async move {
            let stored = repository
                .find_order(order_id)
                .await
                .unwrap_or_default()
                .unwrap_or_else(|| unreachable!("seeded order"));
            let expected = stored.updated_at;
            let mut queued = stored;
            queued.production_queue = Some("pqu_2".to_owned());
            queued.updated_at = expected + Duration::minutes(1);
            repository.save_queue_assignment(queued, expected, 1).await
        }
    };

    let (first, second) = tokio::join!(
        tokio::spawn(assign("ord_a")),
        tokio::spawn(assign("ord_b"))
    );
    let outcomes = [
        first.unwrap_or_else(|_| unreachable!("task completes")),
        second.unwrap_or_else(|_| unreachable!("task completes")),
    ];

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .any(|outcome| matches!(outcome, Err(AppError::Conflict(_))))
    );
    assert_eq!(
        repository
            .list_queue_orders("pqu_2")
            .await
            .unwrap_or_default()
            .len(),
        1
    );
}

#[tokio::test]
async fn queue_assignment_ignores_finished_orders() {
    let mut delivered = order("ord_done", OrderStatus::Delivered, 0);
    delivered.production_queue = Some("pqu_2".to_owned());
    let waiting = order("ord_new", OrderStatus::Paid, 1);
    let expected = waiting.updated_at;
    let repository = InMemoryOrderRepository::with_orders([delivered, waiting.clone()]);

    let mut queued = waiting;
    queued.production_queue = Some("pqu_2".to_owned());
    assert!(
        repository
            .save_queue_assignment(queued, expected, 1)
            .await
            .is_ok()
    );
}

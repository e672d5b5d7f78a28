use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use sealworks_domain::{Order, ProductionQueueWip};

/// Summarizes the work-in-progress orders of one queue at `now`.
///
/// Orders outside the production statuses are ignored. Ages are measured
/// from checkout time, and an order older than `sla` counts as a breach.
pub(super) fn summarize(
    queue_id: &str,
    orders: &[Order],
    sla: Duration,
    now: DateTime<Utc>,
) -> ProductionQueueWip {
    let mut status_counts = BTreeMap::new();
    let mut total_age = Duration::zero();
    let mut oldest_age = Duration::zero();
    let mut sla_breach_count = 0_i64;
    let mut total = 0_i64;

    for order in orders
        .iter()
        .filter(|order| order.status.is_work_in_progress())
    {
        let age = (now - order.age_reference()).max(Duration::zero());
        *status_counts
            .entry(order.status.as_str().to_owned())
            .or_insert(0_i64) += 1;
        total += 1;
        total_age += age;
        oldest_age = oldest_age.max(age);
        if age > sla {
            sla_breach_count += 1;
        }
    }

    let average_age = if total > 0 {
        Duration::seconds(total_age.num_seconds() / total)
    } else {
        Duration::zero()
    };

    ProductionQueueWip {
        queue_id: queue_id.to_owned(),
        total,
        status_counts,
        average_age,
        oldest_age,
        sla_breach_count,
        generated_at: now,
    }
    .normalized(queue_id)
}

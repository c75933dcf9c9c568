//! Property tests for the keep-latest and age-based cleanup passes.

mod common;

use std::collections::BTreeSet;

use chrono::Duration;
use planner_janitor::{PlanTarget, ScanScope, TaskSeed};
use proptest::prelude::*;

use common::{Fixture, PLAN_TITLE};

fn target() -> PlanTarget {
    PlanTarget::Title(PLAN_TITLE.to_string())
}

/// How a seeded task is presented by the store.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Complete,
    NoTimestamp,
    BadTimestamp,
    NoToken,
}

fn shape() -> impl Strategy<Value = Shape> {
    prop_oneof![
        4 => Just(Shape::Complete),
        1 => Just(Shape::NoTimestamp),
        1 => Just(Shape::BadTimestamp),
        1 => Just(Shape::NoToken),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Keep-latest N deletes everything except the N newest, and ties keep
    /// the first-enumerated task.
    #[test]
    fn prop_keep_latest_keeps_newest(
        hours in prop::collection::vec(0u32..48, 0..15),
        keep in 0usize..5,
    ) {
        let survivors = tokio_test::block_on(async {
            let fx = Fixture::new().await;
            for (i, h) in hours.iter().enumerate() {
                let created = fx.aged(Duration::hours(i64::from(*h)));
                fx.store
                    .add_task(&fx.bucket, TaskSeed::new(format!("t{i}")).id(format!("t{i}")).created(created))
                    .await;
            }
            let outcome = fx
                .reconciler(1000, 60.0)
                .cleanup_duplicates(&target(), keep)
                .await
                .unwrap();
            prop_assert_eq!(outcome.skipped_count(), 0);
            Ok(fx.store.task_ids().await)
        })?;

        // Newest first: smallest age, then lowest index.
        let mut ranked: Vec<(u32, usize)> = hours.iter().copied().zip(0..).collect();
        ranked.sort();
        let expected: BTreeSet<String> = ranked
            .iter()
            .take(keep)
            .map(|(_, i)| format!("t{i}"))
            .collect();
        let actual: BTreeSet<String> = survivors.into_iter().collect();
        prop_assert_eq!(actual, expected);
    }

    /// The age pass deletes exactly the tasks at least seven days old.
    #[test]
    fn prop_age_pass_matches_threshold(hours in prop::collection::vec(100u32..250, 0..15)) {
        let (deleted, remaining) = tokio_test::block_on(async {
            let fx = Fixture::new().await;
            for (i, h) in hours.iter().enumerate() {
                let created = fx.aged(Duration::hours(i64::from(*h)));
                fx.store
                    .add_task(&fx.bucket, TaskSeed::new(format!("t{i}")).id(format!("t{i}")).created(created))
                    .await;
            }
            let outcome = fx
                .reconciler(1000, 60.0)
                .cleanup_expired(&ScanScope::Plan(target()))
                .await
                .unwrap();
            let deleted: BTreeSet<String> =
                outcome.deleted_ids().into_iter().map(str::to_string).collect();
            (deleted, fx.store.task_ids().await.len())
        });

        let expected: BTreeSet<String> = hours
            .iter()
            .enumerate()
            .filter(|(_, h)| **h >= 7 * 24)
            .map(|(i, _)| format!("t{i}"))
            .collect();
        prop_assert_eq!(remaining, hours.len() - expected.len());
        prop_assert_eq!(deleted, expected);
    }

    /// Neither pass deletes more tasks than the cap allows.
    #[test]
    fn prop_deletions_never_exceed_cap(count in 0usize..20, cap in 1usize..8) {
        let (dup, expired) = tokio_test::block_on(async {
            let fx = Fixture::new().await;
            for i in 0..count {
                let created = fx.aged(Duration::days(10 + i as i64));
                fx.store
                    .add_task(&fx.bucket, TaskSeed::new(format!("t{i}")).created(created))
                    .await;
            }
            let reconciler = fx.reconciler(cap, 60.0);
            let dup = reconciler.cleanup_duplicates(&target(), 1).await.unwrap();
            let expired = reconciler
                .cleanup_expired(&ScanScope::AllPlans)
                .await
                .unwrap();
            (dup.deleted_count(), expired.deleted_count())
        });
        prop_assert!(dup <= cap);
        prop_assert!(expired <= cap);
    }

    /// Tasks without a parseable timestamp or a token are never deleted.
    #[test]
    fn prop_incomplete_tasks_survive(shapes in prop::collection::vec(shape(), 1..12)) {
        let (dup_ids, expired_ids) = tokio_test::block_on(async {
            let fx = Fixture::new().await;
            for (i, shape) in shapes.iter().enumerate() {
                let old = fx.aged(Duration::days(30 + i as i64));
                let seed = TaskSeed::new(format!("t{i}")).id(format!("t{i}"));
                let seed = match shape {
                    Shape::Complete => seed.created(old),
                    Shape::NoTimestamp => seed,
                    Shape::BadTimestamp => seed.created("last tuesday"),
                    Shape::NoToken => seed.created(old).without_etag(),
                };
                fx.store.add_task(&fx.bucket, seed).await;
            }
            let reconciler = fx.reconciler(1000, 60.0);
            let dup = reconciler.cleanup_duplicates(&target(), 0).await.unwrap();
            let expired = reconciler
                .cleanup_expired(&ScanScope::AllPlans)
                .await
                .unwrap();
            let ids = |o: &planner_janitor::CleanupOutcome| -> Vec<String> {
                o.attempts
                    .iter()
                    .map(|a| match a {
                        Ok(d) => d.task_id.clone(),
                        Err(s) => s.task.task_id.clone(),
                    })
                    .collect()
            };
            (ids(&dup), ids(&expired))
        });

        for (i, shape) in shapes.iter().enumerate() {
            if !matches!(shape, Shape::Complete) {
                let id = format!("t{i}");
                prop_assert!(!dup_ids.contains(&id));
                prop_assert!(!expired_ids.contains(&id));
            }
        }
    }

    /// A second keep-latest run over unchanged data deletes nothing.
    #[test]
    fn prop_dedup_is_idempotent(hours in prop::collection::vec(0u32..48, 0..12), keep in 1usize..4) {
        let second = tokio_test::block_on(async {
            let fx = Fixture::new().await;
            for (i, h) in hours.iter().enumerate() {
                let created = fx.aged(Duration::hours(i64::from(*h)));
                fx.store
                    .add_task(&fx.bucket, TaskSeed::new(format!("t{i}")).created(created))
                    .await;
            }
            let reconciler = fx.reconciler(1000, 60.0);
            reconciler.cleanup_duplicates(&target(), keep).await.unwrap();
            reconciler.cleanup_duplicates(&target(), keep).await.unwrap()
        });
        prop_assert!(second.attempts.is_empty());
        prop_assert_eq!(second.examined, hours.len().min(keep));
    }
}

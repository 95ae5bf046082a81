//! Slot selection policy for a day plan.
//!
//! Pure logic, generic over the random source so tests can drive it with
//! a seeded [`rand::rngs::StdRng`]. The handler in [`crate::slots`] owns
//! persistence.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use ritual_db::models::SelectedPracticeRow;
use ritual_types::models::TimeOfDay;

/// Hard cap on slots per generated batch. Fewer selected practices
/// means fewer slots; this is a ceiling, not a target.
pub const MAX_SLOTS_PER_BATCH: usize = 6;

/// A slot as the policy decides it, before ids and persistence.
#[derive(Debug)]
pub struct PlannedSlot {
    pub user_practice_id: String,
    pub time_of_day: TimeOfDay,
    pub scheduled_at_utc: DateTime<Utc>,
    pub duration_sec_snapshot: u32,
}

/// Pick up to [`MAX_SLOTS_PER_BATCH`] of the user's selected practices,
/// uniformly at random without repeats, and lay them out at
/// `now + i hours` so the batch has strictly increasing, collision-free
/// timestamps. Each slot's time-of-day bucket is drawn independently and
/// uniformly; repeats across the batch are allowed.
///
/// The hour offsets are a placeholder ordering scheme, not a
/// calendar-aware schedule.
pub fn build_slot_batch<R: Rng + ?Sized>(
    rng: &mut R,
    practices: &[SelectedPracticeRow],
    now: DateTime<Utc>,
) -> Vec<PlannedSlot> {
    let mut chosen: Vec<&SelectedPracticeRow> = practices.iter().collect();
    chosen.shuffle(rng);
    chosen.truncate(MAX_SLOTS_PER_BATCH);

    chosen
        .into_iter()
        .enumerate()
        .map(|(i, practice)| PlannedSlot {
            user_practice_id: practice.user_practice_id.clone(),
            time_of_day: TimeOfDay::ALL[rng.random_range(0..TimeOfDay::ALL.len())],
            scheduled_at_utc: now + Duration::hours(i as i64),
            duration_sec_snapshot: practice.default_duration_sec,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn practices(n: usize) -> Vec<SelectedPracticeRow> {
        (0..n)
            .map(|i| SelectedPracticeRow {
                user_practice_id: format!("up-{i}"),
                template_id: format!("tpl-{i}"),
                title: format!("Practice {i}"),
                description: String::new(),
                default_duration_sec: 60 * (i as u32 + 1),
                created_at: "2024-05-01 08:00:00".to_string(),
                updated_at: "2024-05-01 08:00:00".to_string(),
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        "2024-05-01T08:00:00Z".parse().unwrap()
    }

    #[test]
    fn batch_size_is_min_of_cap_and_selection() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(build_slot_batch(&mut rng, &practices(3), now()).len(), 3);
        assert_eq!(build_slot_batch(&mut rng, &practices(6), now()).len(), 6);
        assert_eq!(build_slot_batch(&mut rng, &practices(9), now()).len(), 6);
    }

    #[test]
    fn empty_selection_yields_empty_batch() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(build_slot_batch(&mut rng, &[], now()).is_empty());
    }

    #[test]
    fn timestamps_step_one_hour_from_now() {
        let mut rng = StdRng::seed_from_u64(42);
        let batch = build_slot_batch(&mut rng, &practices(6), now());
        for (i, slot) in batch.iter().enumerate() {
            assert_eq!(slot.scheduled_at_utc, now() + Duration::hours(i as i64));
        }
    }

    #[test]
    fn seven_selected_gives_six_distinct_practices() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = build_slot_batch(&mut rng, &practices(7), now());
        assert_eq!(batch.len(), 6);

        let ids: HashSet<&str> = batch.iter().map(|s| s.user_practice_id.as_str()).collect();
        assert_eq!(ids.len(), 6, "no practice may repeat within a batch");
        for slot in &batch {
            assert!(TimeOfDay::ALL.contains(&slot.time_of_day));
        }
    }

    #[test]
    fn duration_snapshot_comes_from_the_template() {
        let mut rng = StdRng::seed_from_u64(3);
        let input = practices(4);
        let batch = build_slot_batch(&mut rng, &input, now());
        for slot in &batch {
            let source = input
                .iter()
                .find(|p| p.user_practice_id == slot.user_practice_id)
                .unwrap();
            assert_eq!(slot.duration_sec_snapshot, source.default_duration_sec);
        }
    }

    #[test]
    fn seeded_rng_makes_the_batch_deterministic() {
        let input = practices(9);
        let a = build_slot_batch(&mut StdRng::seed_from_u64(99), &input, now());
        let b = build_slot_batch(&mut StdRng::seed_from_u64(99), &input, now());
        let order_a: Vec<_> = a.iter().map(|s| s.user_practice_id.clone()).collect();
        let order_b: Vec<_> = b.iter().map(|s| s.user_practice_id.clone()).collect();
        assert_eq!(order_a, order_b);
        let buckets_a: Vec<_> = a.iter().map(|s| s.time_of_day).collect();
        let buckets_b: Vec<_> = b.iter().map(|s| s.time_of_day).collect();
        assert_eq!(buckets_a, buckets_b);
    }

    #[test]
    fn every_bucket_eventually_appears() {
        // Buckets are drawn uniformly; over many seeds all three show up.
        let input = practices(6);
        let mut seen = HashSet::new();
        for seed in 0..32 {
            let batch = build_slot_batch(&mut StdRng::seed_from_u64(seed), &input, now());
            for slot in batch {
                seen.insert(slot.time_of_day);
            }
        }
        assert_eq!(seen.len(), 3);
    }
}

use chrono::{Duration, Utc};
use proptest::prelude::*;

use vocab_backend::srs::config::MIN_EASE_FACTOR;
use vocab_backend::srs::scheduler::{apply_review, Quality};
use vocab_backend::store::operations::progress::VocabularyProgress;

fn quality_seq() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(0_i64..=5, 1..40)
}

proptest! {
    #[test]
    fn pt_ease_factor_never_below_floor(qualities in quality_seq()) {
        let now = Utc::now();
        let mut progress = VocabularyProgress::fresh("u1", "w1", 2.5, now);

        for q in qualities {
            apply_review(&mut progress, Quality::new(q).unwrap(), now);
            prop_assert!(progress.ease_factor >= MIN_EASE_FACTOR);
            prop_assert!(progress.interval_days >= 1);
        }
    }

    #[test]
    fn pt_success_never_shrinks_interval(qualities in prop::collection::vec(3_i64..=5, 1..30)) {
        let now = Utc::now();
        let mut progress = VocabularyProgress::fresh("u1", "w1", 2.5, now);
        let mut previous_interval = 0u32;

        for q in qualities {
            apply_review(&mut progress, Quality::new(q).unwrap(), now);
            prop_assert!(progress.interval_days >= previous_interval);
            previous_interval = progress.interval_days;
        }
    }

    #[test]
    fn pt_failure_always_resets(
        warmup in prop::collection::vec(3_i64..=5, 0..20),
        failure in 0_i64..3,
    ) {
        let now = Utc::now();
        let mut progress = VocabularyProgress::fresh("u1", "w1", 2.5, now);

        for q in warmup {
            apply_review(&mut progress, Quality::new(q).unwrap(), now);
        }

        apply_review(&mut progress, Quality::new(failure).unwrap(), now);
        prop_assert_eq!(progress.repetitions, 0);
        prop_assert_eq!(progress.interval_days, 1);
    }

    #[test]
    fn pt_next_review_is_last_review_plus_interval(qualities in quality_seq()) {
        let now = Utc::now();
        let mut progress = VocabularyProgress::fresh("u1", "w1", 2.5, now);

        for q in qualities {
            apply_review(&mut progress, Quality::new(q).unwrap(), now);
            let last = progress.last_reviewed_at.unwrap();
            let next = progress.next_review_at.unwrap();
            prop_assert_eq!(next - last, Duration::days(progress.interval_days as i64));
            prop_assert!(next >= last);
        }
    }

    #[test]
    fn pt_ease_is_non_decreasing_for_good_reviews(qualities in prop::collection::vec(4_i64..=5, 1..30)) {
        let now = Utc::now();
        let mut progress = VocabularyProgress::fresh("u1", "w1", 2.5, now);
        let mut previous_ease = progress.ease_factor;

        for q in qualities {
            apply_review(&mut progress, Quality::new(q).unwrap(), now);
            prop_assert!(progress.ease_factor >= previous_ease - 1e-12);
            previous_ease = progress.ease_factor;
        }
    }
}

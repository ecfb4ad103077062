use chrono::{DateTime, Duration, Utc};

use crate::srs::config::{
    SrsConfig, FIRST_INTERVAL_DAYS, MIN_EASE_FACTOR, SECOND_INTERVAL_DAYS,
};
use crate::store::operations::progress::{ProgressStatus, VocabularyProgress};

/// A validated recall quality score (0–5). Anything below 3 is a failed
/// recall. Out-of-range input is rejected, never clamped, so a bad caller
/// cannot silently corrupt the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const FAILED: Quality = Quality(0);
    pub const PERFECT: Quality = Quality(5);

    pub fn new(value: i64) -> Result<Self, &'static str> {
        if !(0..=5).contains(&value) {
            return Err("quality score must be between 0 and 5");
        }
        Ok(Self(value as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_failure(self) -> bool {
        self.0 < 3
    }
}

/// SM-2 review update.
///
/// The ease factor moves on every review (success or failure) and is floored
/// at 1.3. A failure resets the repetition streak and the interval; a
/// success walks the 1 / 6 / round(interval × ease) ladder. The next review
/// date is always `now + interval_days`, so
/// `next_review_at - last_reviewed_at == interval_days` holds exactly.
pub fn apply_review(progress: &mut VocabularyProgress, quality: Quality, now: DateTime<Utc>) {
    let q = quality.value() as f64;
    let new_ease = progress.ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    progress.ease_factor = new_ease.max(MIN_EASE_FACTOR);

    if quality.is_failure() {
        progress.repetitions = 0;
        progress.interval_days = FIRST_INTERVAL_DAYS;
    } else {
        progress.interval_days = match progress.repetitions {
            0 => FIRST_INTERVAL_DAYS,
            1 => SECOND_INTERVAL_DAYS,
            _ => {
                let scaled = (progress.interval_days as f64 * progress.ease_factor).round();
                (scaled as u32).max(1)
            }
        };
        progress.repetitions += 1;
    }

    progress.last_reviewed_at = Some(now);
    progress.next_review_at = Some(now + Duration::days(progress.interval_days as i64));
    progress.updated_at = now;
}

/// Status promotion after a successful review. The mastered check runs
/// before the learned check; with the checks the other way around the
/// mastered branch can never fire, since its thresholds imply the learned
/// ones.
pub fn promote_after_success(progress: &mut VocabularyProgress, config: &SrsConfig) {
    if progress.repetitions >= config.mastered_min_repetitions
        && progress.ease_factor >= config.mastered_min_ease
    {
        progress.status = ProgressStatus::Mastered;
    } else if progress.repetitions >= config.learned_min_repetitions
        && progress.ease_factor >= config.learned_min_ease
        && progress.status != ProgressStatus::Mastered
    {
        progress.status = ProgressStatus::Learned;
    }
}

/// Status regression after an incorrect use. A learned or mastered word
/// drops back to learning; a word that has been wrong more than twice as
/// often as right is marked forgotten.
pub fn demote_after_failure(progress: &mut VocabularyProgress) {
    if matches!(
        progress.status,
        ProgressStatus::Learned | ProgressStatus::Mastered
    ) {
        progress.status = ProgressStatus::Learning;
    }

    if progress.times_incorrect > progress.times_correct.saturating_mul(2) {
        progress.status = ProgressStatus::Forgotten;
    }
}

/// Exposure without a graded recall: bump `times_seen` and pull forgotten
/// words (or repeatedly seen new words) into learning.
pub fn register_encounter(progress: &mut VocabularyProgress) {
    progress.times_seen += 1;

    if progress.status == ProgressStatus::Forgotten {
        progress.status = ProgressStatus::Learning;
    } else if progress.status == ProgressStatus::New && progress.times_seen >= 2 {
        progress.status = ProgressStatus::Learning;
    }
}

/// "Already know this word" shortcut: jump straight to mastered with a long
/// review horizon.
pub fn mark_known(progress: &mut VocabularyProgress, config: &SrsConfig, now: DateTime<Utc>) {
    progress.status = ProgressStatus::Mastered;
    progress.repetitions = config.known_repetitions;
    progress.ease_factor = config.known_ease;
    progress.interval_days = config.known_interval_days;
    progress.last_reviewed_at = Some(now);
    progress.next_review_at = Some(now + Duration::days(config.known_interval_days as i64));
    progress.updated_at = now;
}

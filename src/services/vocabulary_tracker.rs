use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::srs::config::SrsConfig;
use crate::srs::scheduler::{self, Quality};
use crate::store::operations::progress::{
    ProgressStatus, VocabularyProgress, VocabularyStats,
};
use crate::store::{Store, StoreError};

/// Per-user vocabulary progress tracking on top of the SM-2 scheduler.
///
/// Every mutation goes through `Store::update_progress_with`, so concurrent
/// events for the same (user, word) are serialized by the storage
/// transaction. Callers supply the clock; the tracker never reads wall time
/// itself.
pub struct VocabularyTracker {
    store: Arc<Store>,
    config: SrsConfig,
}

impl VocabularyTracker {
    pub fn new(config: SrsConfig, store: Arc<Store>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    /// The word was shown to the user (in a lesson, a dialogue, ...) without
    /// a graded recall. Creates the record on first sight.
    pub fn mark_encountered(
        &self,
        user_id: &str,
        word_id: &str,
        now: DateTime<Utc>,
    ) -> Result<VocabularyProgress, StoreError> {
        let config = &self.config;
        let updated = self.store.update_progress_with(user_id, word_id, |existing| {
            let mut progress = existing.unwrap_or_else(|| {
                VocabularyProgress::fresh(user_id, word_id, config.default_ease_factor, now)
            });
            scheduler::register_encounter(&mut progress);
            progress.updated_at = now;
            progress
        })?;

        tracing::debug!(
            user_id,
            word_id,
            times_seen = updated.times_seen,
            "Word encountered"
        );
        Ok(updated)
    }

    /// Correct use of the word, graded 0–5. Runs the SM-2 update and the
    /// promotion policy.
    pub fn mark_correct(
        &self,
        user_id: &str,
        word_id: &str,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<VocabularyProgress, StoreError> {
        let config = &self.config;
        let updated = self.store.update_progress_with(user_id, word_id, |existing| {
            let mut progress = existing.unwrap_or_else(|| {
                let mut fresh =
                    VocabularyProgress::fresh(user_id, word_id, config.default_ease_factor, now);
                fresh.status = ProgressStatus::Learning;
                fresh
            });
            progress.times_correct += 1;
            scheduler::apply_review(&mut progress, quality, now);
            scheduler::promote_after_success(&mut progress, config);
            progress
        })?;

        tracing::debug!(
            user_id,
            word_id,
            quality = quality.value(),
            interval_days = updated.interval_days,
            "Correct review applied"
        );
        Ok(updated)
    }

    /// Incorrect use: recorded as a failed (quality 0) review, with the
    /// regression policy applied afterwards.
    pub fn mark_incorrect(
        &self,
        user_id: &str,
        word_id: &str,
        now: DateTime<Utc>,
    ) -> Result<VocabularyProgress, StoreError> {
        let config = &self.config;
        let updated = self.store.update_progress_with(user_id, word_id, |existing| {
            let mut progress = existing.unwrap_or_else(|| {
                let mut fresh =
                    VocabularyProgress::fresh(user_id, word_id, config.default_ease_factor, now);
                fresh.status = ProgressStatus::Learning;
                fresh
            });
            progress.times_incorrect += 1;
            scheduler::apply_review(&mut progress, Quality::FAILED, now);
            scheduler::demote_after_failure(&mut progress);
            progress
        })?;

        tracing::debug!(user_id, word_id, "Incorrect review applied, interval reset");
        Ok(updated)
    }

    /// The user already knows this word; skip the learning ladder.
    pub fn mark_known(
        &self,
        user_id: &str,
        word_id: &str,
        now: DateTime<Utc>,
    ) -> Result<VocabularyProgress, StoreError> {
        let config = &self.config;
        let updated = self.store.update_progress_with(user_id, word_id, |existing| {
            let mut progress = existing.unwrap_or_else(|| {
                VocabularyProgress::fresh(user_id, word_id, config.default_ease_factor, now)
            });
            scheduler::mark_known(&mut progress, config, now);
            progress
        })?;
        Ok(updated)
    }

    /// Wipe the learning history for one word back to a fresh record.
    pub fn reset(
        &self,
        user_id: &str,
        word_id: &str,
        now: DateTime<Utc>,
    ) -> Result<VocabularyProgress, StoreError> {
        let config = &self.config;
        self.store.update_progress_with(user_id, word_id, |_| {
            VocabularyProgress::fresh(user_id, word_id, config.default_ease_factor, now)
        })
    }

    pub fn get_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<VocabularyProgress>, StoreError> {
        self.store.get_progress(user_id, word_id)
    }

    /// Words due at `now`, earliest first.
    pub fn due_for_review(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<VocabularyProgress>, StoreError> {
        self.store.get_due_progress(user_id, now, limit)
    }

    pub fn stats(&self, user_id: &str, now: DateTime<Utc>) -> Result<VocabularyStats, StoreError> {
        self.store.get_vocabulary_stats(user_id, now)
    }
}

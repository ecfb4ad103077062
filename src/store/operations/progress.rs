use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::Transactional;
use std::collections::HashSet;

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyProgress {
    pub user_id: String,
    pub word_id: String,
    pub status: ProgressStatus,
    pub times_seen: u32,
    pub times_correct: u32,
    pub times_incorrect: u32,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    New,
    Learning,
    Learned,
    Mastered,
    Forgotten,
}

impl VocabularyProgress {
    /// First-encounter record: immediately due, so new words enter the
    /// review queue right away.
    pub fn fresh(
        user_id: &str,
        word_id: &str,
        default_ease_factor: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            word_id: word_id.to_string(),
            status: ProgressStatus::New,
            times_seen: 0,
            times_correct: 0,
            times_incorrect: 0,
            ease_factor: default_ease_factor,
            interval_days: 1,
            repetitions: 0,
            last_reviewed_at: None,
            next_review_at: Some(now),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyStats {
    pub total_words: u64,
    pub new_count: u64,
    pub learning: u64,
    pub learned: u64,
    pub mastered: u64,
    pub forgotten: u64,
    pub due_for_review: u64,
    pub average_accuracy: f64,
}

fn due_index_key_for(progress: &VocabularyProgress) -> Result<Option<String>, StoreError> {
    match progress.next_review_at {
        Some(next_review_at) => Ok(Some(keys::progress_due_index_key(
            &progress.user_id,
            next_review_at.timestamp_millis(),
            &progress.word_id,
        )?)),
        None => Ok(None),
    }
}

impl Store {
    pub fn get_progress(
        &self,
        user_id: &str,
        word_id: &str,
    ) -> Result<Option<VocabularyProgress>, StoreError> {
        let key = keys::progress_key(user_id, word_id)?;
        match self.vocabulary_progress.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serialized read-modify-write of one progress record. The read, the
    /// `apply` closure and the write (including due-index maintenance) run
    /// in a single sled transaction, so concurrent reviews of the same
    /// (user, word) retry instead of losing updates. `apply` must be pure:
    /// it may run more than once.
    pub fn update_progress_with<F>(
        &self,
        user_id: &str,
        word_id: &str,
        apply: F,
    ) -> Result<VocabularyProgress, StoreError>
    where
        F: Fn(Option<VocabularyProgress>) -> VocabularyProgress,
    {
        let key = keys::progress_key(user_id, word_id)?;

        let updated = (&self.vocabulary_progress, &self.progress_due_index)
            .transaction(|(tx_progress, tx_due_index)| {
                use sled::transaction::ConflictableTransactionError as TxError;

                let old = match tx_progress.get(key.as_bytes())? {
                    Some(raw) => Some(
                        serde_json::from_slice::<VocabularyProgress>(&raw)
                            .map_err(|error| TxError::Abort(StoreError::Serialization(error)))?,
                    ),
                    None => None,
                };

                if let Some(ref old_state) = old {
                    if let Some(old_due_key) =
                        due_index_key_for(old_state).map_err(TxError::Abort)?
                    {
                        tx_due_index.remove(old_due_key.as_bytes())?;
                    }
                }

                let updated = apply(old);
                let value = serde_json::to_vec(&updated)
                    .map_err(|error| TxError::Abort(StoreError::Serialization(error)))?;
                tx_progress.insert(key.as_bytes(), value)?;

                if let Some(due_key) = due_index_key_for(&updated).map_err(TxError::Abort)? {
                    tx_due_index.insert(due_key.as_bytes(), &[] as &[u8])?;
                }

                Ok(updated)
            })
            .map_err(
                |error: sled::transaction::TransactionError<StoreError>| match error {
                    sled::transaction::TransactionError::Abort(store_error) => store_error,
                    sled::transaction::TransactionError::Storage(storage_error) => {
                        StoreError::Sled(storage_error)
                    }
                },
            )?;

        Ok(updated)
    }

    pub fn set_progress(&self, progress: &VocabularyProgress) -> Result<(), StoreError> {
        let cloned = progress.clone();
        self.update_progress_with(&progress.user_id, &progress.word_id, move |_| cloned.clone())?;
        Ok(())
    }

    /// Due records for one user, earliest `next_review_at` first, capped to
    /// `limit`. Stale index entries (due date moved by a later update) are
    /// skipped by re-checking against the live record.
    pub fn get_due_progress(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<VocabularyProgress>, StoreError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let prefix = keys::progress_due_index_prefix(user_id)?;
        let now_ms = now.timestamp_millis().max(0);
        let mut due = Vec::with_capacity(limit);
        let mut seen_word_ids = HashSet::new();

        for item in self.progress_due_index.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            let Some((due_ts_ms, word_id)) = keys::parse_due_index_key(&key) else {
                continue;
            };

            if due_ts_ms > now_ms {
                break;
            }

            if let Some(progress) = self.get_progress(user_id, &word_id)? {
                if let Some(next_review_at) = progress.next_review_at {
                    let state_due_ts_ms = next_review_at.timestamp_millis().max(0);
                    if state_due_ts_ms == due_ts_ms
                        && state_due_ts_ms <= now_ms
                        && seen_word_ids.insert(word_id)
                    {
                        due.push(progress);
                        if due.len() >= limit {
                            break;
                        }
                    }
                }
            }
        }

        Ok(due)
    }

    pub fn get_vocabulary_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<VocabularyStats, StoreError> {
        let prefix = keys::progress_prefix(user_id)?;
        let mut stats = VocabularyStats::default();
        let mut total_correct = 0u64;
        let mut total_attempts = 0u64;

        for item in self.vocabulary_progress.scan_prefix(prefix.as_bytes()) {
            let (_, v) = item?;
            let progress: VocabularyProgress = Self::deserialize(&v)?;
            stats.total_words += 1;
            match progress.status {
                ProgressStatus::New => stats.new_count += 1,
                ProgressStatus::Learning => stats.learning += 1,
                ProgressStatus::Learned => stats.learned += 1,
                ProgressStatus::Mastered => stats.mastered += 1,
                ProgressStatus::Forgotten => stats.forgotten += 1,
            }
            if let Some(next_review_at) = progress.next_review_at {
                if next_review_at <= now {
                    stats.due_for_review += 1;
                }
            }
            total_correct += progress.times_correct as u64;
            total_attempts += (progress.times_correct + progress.times_incorrect) as u64;
        }

        stats.average_accuracy = if total_attempts > 0 {
            total_correct as f64 / total_attempts as f64 * 100.0
        } else {
            0.0
        };

        Ok(stats)
    }

    pub fn delete_progress(&self, user_id: &str, word_id: &str) -> Result<(), StoreError> {
        let key = keys::progress_key(user_id, word_id)?;

        (&self.vocabulary_progress, &self.progress_due_index)
            .transaction(|(tx_progress, tx_due_index)| {
                let removed = tx_progress.remove(key.as_bytes())?;

                if let Some(raw) = removed {
                    let removed_state: VocabularyProgress = serde_json::from_slice(&raw)
                        .map_err(|error| {
                            sled::transaction::ConflictableTransactionError::Abort(
                                StoreError::Serialization(error),
                            )
                        })?;
                    if let Some(due_key) = due_index_key_for(&removed_state)
                        .map_err(sled::transaction::ConflictableTransactionError::Abort)?
                    {
                        tx_due_index.remove(due_key.as_bytes())?;
                    }
                }

                Ok(())
            })
            .map_err(
                |error: sled::transaction::TransactionError<StoreError>| match error {
                    sled::transaction::TransactionError::Abort(store_error) => store_error,
                    sled::transaction::TransactionError::Storage(storage_error) => {
                        StoreError::Sled(storage_error)
                    }
                },
            )?;

        Ok(())
    }
}

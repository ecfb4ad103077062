use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: String,
    pub text: String,
    pub translation: String,
    pub definition: String,
    pub example_sentence: Option<String>,
    pub word_type: WordType,
    pub level: CefrLevel,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WordType {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Preposition,
    Conjunction,
    Pronoun,
    Interjection,
    Phrase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CefrLevel {
    A0,
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl Store {
    /// Create a word, enforcing case-insensitive uniqueness of `text` with a
    /// compare-and-swap on the text index so concurrent creates cannot both
    /// pass an existence check.
    pub fn create_word(&self, word: &Word) -> Result<(), StoreError> {
        let text_key = keys::word_text_index_key(&word.text);

        let cas_result = self
            .words
            .compare_and_swap(
                text_key.as_bytes(),
                None::<&[u8]>,
                Some(word.id.as_bytes().to_vec()),
            )
            .map_err(StoreError::Sled)?;

        if cas_result.is_err() {
            return Err(StoreError::Conflict {
                entity: "word_text".to_string(),
                key: word.text.clone(),
            });
        }

        let word_key = keys::word_key(&word.id)?;
        let word_bytes = Self::serialize(word)?;
        if let Err(e) = self.words.insert(word_key.as_bytes(), word_bytes) {
            let _ = self.words.remove(text_key.as_bytes());
            return Err(StoreError::Sled(e));
        }

        let idx_key =
            keys::words_by_created_at_key(word.created_at.timestamp_millis(), &word.id)?;
        self.words_by_created_at
            .insert(idx_key.as_bytes(), word.id.as_bytes())?;

        Ok(())
    }

    pub fn get_word(&self, word_id: &str) -> Result<Option<Word>, StoreError> {
        let key = keys::word_key(word_id)?;
        match self.words.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn get_word_by_text(&self, text: &str) -> Result<Option<Word>, StoreError> {
        let index_key = keys::word_text_index_key(text);
        let Some(word_id_raw) = self.words.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        let word_id = match String::from_utf8(word_id_raw.to_vec()) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid UTF-8 in word text index");
                return Ok(None);
            }
        };
        self.get_word(&word_id)
    }

    pub fn list_words(&self, limit: usize, offset: usize) -> Result<Vec<Word>, StoreError> {
        // words_by_created_at uses reverse timestamps: iteration is newest first
        let mut words = Vec::new();
        let mut skipped = 0usize;
        for item in self.words_by_created_at.iter() {
            let (_, value) = item?;
            let word_id = String::from_utf8(value.to_vec()).unwrap_or_default();
            if skipped < offset {
                skipped += 1;
                continue;
            }
            if let Some(word) = self.get_word(&word_id)? {
                words.push(word);
            }
            if words.len() >= limit {
                break;
            }
        }
        Ok(words)
    }

    pub fn count_words(&self) -> Result<u64, StoreError> {
        Ok(self.words_by_created_at.len() as u64)
    }
}

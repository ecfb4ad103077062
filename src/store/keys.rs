use crate::store::StoreError;

/// 键组件最大长度
const MAX_COMPONENT_LEN: usize = 128;

/// Key components are joined with ':'. A component containing the separator
/// would corrupt prefix scans and is rejected at the boundary.
fn validate_component(value: &str, what: &str) -> Result<(), StoreError> {
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{what} must not be empty")));
    }
    if value.len() > MAX_COMPONENT_LEN {
        return Err(StoreError::Validation(format!(
            "{what} exceeds {MAX_COMPONENT_LEN} bytes"
        )));
    }
    if value.contains(':') {
        return Err(StoreError::Validation(format!(
            "{what} must not contain ':'"
        )));
    }
    Ok(())
}

pub fn user_key(user_id: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    Ok(user_id.to_string())
}

pub fn user_email_index_key(email: &str) -> String {
    format!("email:{}", email.to_lowercase())
}

pub fn session_key(token_hash: &str) -> Result<String, StoreError> {
    validate_component(token_hash, "token_hash")?;
    Ok(token_hash.to_string())
}

pub fn session_user_index_key(user_id: &str, token_hash: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    validate_component(token_hash, "token_hash")?;
    Ok(format!("user:{}:{}", user_id, token_hash))
}

pub fn session_user_index_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    Ok(format!("user:{}:", user_id))
}

pub fn word_key(word_id: &str) -> Result<String, StoreError> {
    validate_component(word_id, "word_id")?;
    Ok(word_id.to_string())
}

pub fn word_text_index_key(text: &str) -> String {
    format!("text:{}", text.to_lowercase())
}

/// Newest-first word listing: reverse timestamp so iteration order is
/// most-recently-created first.
pub fn words_by_created_at_key(timestamp_ms: i64, word_id: &str) -> Result<String, StoreError> {
    validate_component(word_id, "word_id")?;
    let ts = timestamp_ms.max(0) as u64;
    let reverse_ts = u64::MAX - ts;
    Ok(format!("{:020}:{}", reverse_ts, word_id))
}

// Vocabulary progress keys
pub fn progress_key(user_id: &str, word_id: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    validate_component(word_id, "word_id")?;
    Ok(format!("{}:{}", user_id, word_id))
}

pub fn progress_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    Ok(format!("{}:", user_id))
}

/// Due-index keys sort by due timestamp ascending within a user prefix, so a
/// prefix scan yields earliest-due first.
pub fn progress_due_index_key(
    user_id: &str,
    due_ts_ms: i64,
    word_id: &str,
) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    validate_component(word_id, "word_id")?;
    Ok(format!("{}:{:020}:{}", user_id, due_ts_ms.max(0) as u64, word_id))
}

pub fn progress_due_index_prefix(user_id: &str) -> Result<String, StoreError> {
    validate_component(user_id, "user_id")?;
    Ok(format!("{}:", user_id))
}

/// Parse `(due_ts_ms, word_id)` out of a due-index key.
/// Key format: `{user_id}:{due_ts_ms:020}:{word_id}`.
pub fn parse_due_index_key(key: &[u8]) -> Option<(i64, String)> {
    let key_str = std::str::from_utf8(key).ok()?;
    let (_, rest) = key_str.split_once(':')?;
    let (ts_str, word_id) = rest.split_once(':')?;
    if ts_str.len() != 20 || word_id.is_empty() {
        return None;
    }
    let ts = ts_str.parse::<u64>().ok()?;
    Some((i64::try_from(ts).ok()?, word_id.to_string()))
}

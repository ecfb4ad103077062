pub const USERS: &str = "users";
pub const SESSIONS: &str = "sessions";
pub const WORDS: &str = "words";
pub const VOCABULARY_PROGRESS: &str = "vocabulary_progress";
pub const PROGRESS_DUE_INDEX: &str = "progress_due_index";
pub const CONFIG_VERSIONS: &str = "config_versions";

// Secondary index trees
pub const WORDS_BY_CREATED_AT: &str = "words_by_created_at";

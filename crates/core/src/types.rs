/// Prompt identifiers are random UUIDs assigned at creation.
pub type PromptId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

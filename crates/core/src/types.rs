/// All primary keys are random UUID v4 values.
///
/// Verification code ids are mailed to users as opaque codes, so ids must
/// never be sequential or guessable.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

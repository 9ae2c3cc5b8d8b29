/// All deadlines are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Milliseconds in one day. Every delta in this crate is in milliseconds.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

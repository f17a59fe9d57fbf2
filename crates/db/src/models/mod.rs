mod benchmark;
mod benchmark_session;

pub use benchmark::*;
pub use benchmark_session::*;

use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(ts, 0).single().unwrap_or_default()
}

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}

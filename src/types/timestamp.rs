// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::Duration;
use chrono::SecondsFormat;
use chrono::SubsecRound;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// A UTC instant with microsecond precision. Stored in the database as
/// fixed-width RFC 3339 text, so that string comparison agrees with
/// chronological order.
///
/// Sub-microsecond digits are dropped on construction, so a value read back
/// from the database equals the one written.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(from = "DateTime<Utc>", into = "DateTime<Utc>")]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts.trunc_subsecs(6))
    }

    pub fn now() -> Self {
        Self::new(Utc::now())
    }

    pub fn from_rfc3339(s: &str) -> Fallible<Self> {
        let ts = DateTime::parse_from_rfc3339(s)
            .map_err(|e| ErrorReport::new(format!("invalid timestamp '{s}': {e}")))?;
        Ok(Self::new(ts.with_timezone(&Utc)))
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// Adds a (possibly fractional) number of minutes, rounded to the
    /// millisecond. Returns `None` if the result is not representable.
    pub fn checked_add_minutes(self, minutes: f64) -> Option<Self> {
        let millis = (minutes * MILLIS_PER_MINUTE).round();
        if !millis.is_finite() || millis < i64::MIN as f64 || millis > i64::MAX as f64 {
            return None;
        }
        let delta = Duration::try_milliseconds(millis as i64)?;
        self.0.checked_add_signed(delta).map(Self::new)
    }

    /// The signed duration from `earlier` to `self`.
    pub fn since(self, earlier: Timestamp) -> Duration {
        self.0.signed_duration_since(earlier.0)
    }

    fn to_db_string(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_db_string()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(Timestamp::new(ts.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn ts(h: u32, m: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, h, m, 0).unwrap())
    }

    #[test]
    fn test_add_minutes() {
        assert_eq!(ts(10, 0).checked_add_minutes(40.0), Some(ts(10, 40)));
        assert_eq!(ts(10, 0).checked_add_minutes(0.0), Some(ts(10, 0)));
    }

    #[test]
    fn test_add_minutes_out_of_range() {
        assert_eq!(ts(10, 0).checked_add_minutes(f64::INFINITY), None);
        assert_eq!(ts(10, 0).checked_add_minutes(1e300), None);
    }

    #[test]
    fn test_db_string_sorts_chronologically() {
        let a = ts(9, 5).to_db_string();
        let b = ts(10, 0).checked_add_minutes(0.5).unwrap().to_db_string();
        assert_eq!(a, "2025-01-01T09:05:00.000000Z");
        assert!(a < b);
    }

    #[test]
    fn test_parse_rfc3339() -> Fallible<()> {
        let parsed = Timestamp::from_rfc3339("2025-01-01T12:30:00+02:00")?;
        assert_eq!(parsed, ts(10, 30));
        assert!(Timestamp::from_rfc3339("yesterday").is_err());
        Ok(())
    }

    #[test]
    fn test_sub_microseconds_are_dropped() -> Fallible<()> {
        let precise = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
            + Duration::nanoseconds(123_456_789);
        let t = Timestamp::new(precise);
        assert_eq!(t.into_inner().timestamp_subsec_nanos(), 123_456_000);
        assert_eq!(Timestamp::from_rfc3339(&t.to_db_string())?, t);
        assert_eq!(
            Timestamp::from_rfc3339("2025-01-01T10:00:00.123456789Z")?,
            t
        );
        let parsed: Timestamp = serde_json::from_str("\"2025-01-01T10:00:00.123456789Z\"")?;
        assert_eq!(parsed, t);
        Ok(())
    }
}

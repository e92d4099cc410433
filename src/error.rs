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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

use crate::types::card_id::CardId;

/// Errors raised by the scheduler core.
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerError {
    /// The input scheduling state violates an invariant. This is a bug in
    /// whatever produced the record, and is never repaired here.
    InvalidState(String),
    /// The scheduler configuration is malformed.
    InvalidConfig(String),
    /// A query argument is out of range.
    InvalidRequest(String),
    /// The storage collaborator could not serve the request.
    StorageUnavailable(String),
    /// No scheduling state exists for the card.
    NotFound(CardId),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulerError::InvalidState(msg) => write!(f, "invalid scheduling state: {msg}"),
            SchedulerError::InvalidConfig(msg) => write!(f, "invalid scheduler config: {msg}"),
            SchedulerError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            SchedulerError::StorageUnavailable(msg) => write!(f, "storage unavailable: {msg}"),
            SchedulerError::NotFound(card_id) => write!(f, "card not found: {card_id}"),
        }
    }
}

impl Error for SchedulerError {}

impl From<rusqlite::Error> for SchedulerError {
    fn from(value: rusqlite::Error) -> Self {
        SchedulerError::StorageUnavailable(value.to_string())
    }
}

pub type SchedResult<T> = Result<T, SchedulerError>;

/// Application-level error: a message for the user.
#[derive(Debug, PartialEq)]
pub struct ErrorReport {
    message: String,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

impl From<SchedulerError> for ErrorReport {
    fn from(value: SchedulerError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("TOML error: {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_display() {
        let err = ErrorReport::new("directory does not exist.");
        assert_eq!(err.to_string(), "error: directory does not exist.");
    }

    #[test]
    fn test_fail() {
        let result: Fallible<()> = fail("nope");
        assert_eq!(result, Err(ErrorReport::new("nope")));
    }

    #[test]
    fn test_scheduler_error_into_report() {
        let err = SchedulerError::NotFound(CardId::new("c1"));
        let report: ErrorReport = err.into();
        assert_eq!(report.to_string(), "error: card not found: c1");
    }
}

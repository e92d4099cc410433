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

use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::engine::compute_next;
use crate::error::SchedResult;
use crate::store::SchedulingStore;
use crate::types::outcome::StudyOutcome;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

/// Apply one answer: read the card's current state, compute the next one,
/// and write it back. A card with no stored state fails with `NotFound`;
/// new cards get their default state when they are registered with the
/// store.
///
/// Each call reads immediately before writing, so concurrent answers for the
/// same card resolve as last-write-wins. Retrying a call against the same
/// prior state writes the same result.
pub fn record_outcome<S: SchedulingStore>(
    store: &S,
    outcome: &StudyOutcome,
    config: &SchedulerConfig,
) -> SchedResult<CardSchedulingState> {
    let current = store.load_scheduling_state(&outcome.card_id)?;
    let next = compute_next(&current, outcome.is_correct, outcome.answered_at, config)?;
    store.save_scheduling_state(&outcome.card_id, &next)?;
    Ok(next)
}

/// The answers given during one study session.
pub struct StudySession {
    started_at: Timestamp,
    results: Vec<StudyOutcome>,
}

impl StudySession {
    pub fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            results: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: StudyOutcome) {
        self.results.push(outcome);
    }

    pub fn results(&self) -> &[StudyOutcome] {
        &self.results
    }

    pub fn summary(&self, ended_at: Timestamp) -> SessionSummary {
        let total_cards = self.results.len();
        let correct_answers = self.results.iter().filter(|r| r.is_correct).count();
        let incorrect_answers = total_cards - correct_answers;
        let success_rate = if total_cards == 0 {
            0.0
        } else {
            (correct_answers as f64 / total_cards as f64) * 100.0
        };
        let duration_minutes = ended_at.since(self.started_at).num_minutes().max(0) as u64;
        SessionSummary {
            total_cards,
            correct_answers,
            incorrect_answers,
            success_rate,
            duration_minutes,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub total_cards: usize,
    pub correct_answers: usize,
    pub incorrect_answers: usize,
    /// Percentage of correct answers, 0 to 100.
    pub success_rate: f64,
    pub duration_minutes: u64,
}

/// Totals across a user's sessions.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_sessions: usize,
    pub total_cards_studied: usize,
    pub total_correct: usize,
    pub total_incorrect: usize,
    /// Mean of the per-session success rates.
    pub average_success_rate: f64,
    pub total_study_time_minutes: u64,
}

impl UserStats {
    pub fn from_sessions(sessions: &[SessionSummary]) -> Self {
        let total_sessions = sessions.len();
        let average_success_rate = if total_sessions == 0 {
            0.0
        } else {
            sessions.iter().map(|s| s.success_rate).sum::<f64>() / total_sessions as f64
        };
        Self {
            total_sessions,
            total_cards_studied: sessions.iter().map(|s| s.total_cards).sum(),
            total_correct: sessions.iter().map(|s| s.correct_answers).sum(),
            total_incorrect: sessions.iter().map(|s| s.incorrect_answers).sum(),
            average_success_rate,
            total_study_time_minutes: sessions.iter().map(|s| s.duration_minutes).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;

    use super::*;
    use crate::error::SchedulerError;
    use crate::store::memory::MemoryStore;
    use crate::types::scope::Scope;
    use crate::types::card_id::CardId;
    use crate::types::card_id::DeckId;
    use crate::types::card_id::UserId;

    fn at(h: u32, m: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, h, m, 0).unwrap())
    }

    fn outcome(id: &str, is_correct: bool, answered_at: Timestamp) -> StudyOutcome {
        StudyOutcome {
            card_id: CardId::new(id),
            is_correct,
            answered_at,
            time_spent_ms: 1500,
        }
    }

    fn store_with(id: &str) -> SchedResult<MemoryStore> {
        let store = MemoryStore::new();
        let state =
            CardSchedulingState::new(CardId::new(id), at(9, 0), &SchedulerConfig::default());
        store.register_card(&UserId::new("u"), &DeckId::new("d"), &state)?;
        Ok(store)
    }

    #[test]
    fn test_record_outcome_persists() -> SchedResult<()> {
        let store = store_with("a")?;
        let config = SchedulerConfig::default();
        let next = record_outcome(&store, &outcome("a", true, at(10, 0)), &config)?;
        assert_eq!(next.review_count, 1);
        assert_eq!(next.next_review_at, at(10, 10));
        assert_eq!(store.load_scheduling_state(&CardId::new("a"))?, next);

        let next = record_outcome(&store, &outcome("a", true, at(10, 10)), &config)?;
        assert_eq!(next.consecutive_correct, 2);
        assert_eq!(next.next_review_at, at(10, 30));
        Ok(())
    }

    #[test]
    fn test_unregistered_card() {
        let store = MemoryStore::new();
        let result = record_outcome(
            &store,
            &outcome("ghost", true, at(10, 0)),
            &SchedulerConfig::default(),
        );
        assert_eq!(result, Err(SchedulerError::NotFound(CardId::new("ghost"))));
        assert_eq!(store.is_empty(), Ok(true));
    }

    struct DownStore;

    impl SchedulingStore for DownStore {
        fn load_scheduling_state(&self, _: &CardId) -> SchedResult<CardSchedulingState> {
            Err(SchedulerError::StorageUnavailable("down".to_string()))
        }

        fn save_scheduling_state(&self, _: &CardId, _: &CardSchedulingState) -> SchedResult<()> {
            Err(SchedulerError::StorageUnavailable("down".to_string()))
        }

        fn scan_cards_in_scope(&self, _: &Scope) -> SchedResult<Vec<CardSchedulingState>> {
            Err(SchedulerError::StorageUnavailable("down".to_string()))
        }
    }

    /// Loads fine, but every write fails.
    struct ReadOnlyStore(MemoryStore);

    impl SchedulingStore for ReadOnlyStore {
        fn load_scheduling_state(&self, card_id: &CardId) -> SchedResult<CardSchedulingState> {
            self.0.load_scheduling_state(card_id)
        }

        fn save_scheduling_state(&self, _: &CardId, _: &CardSchedulingState) -> SchedResult<()> {
            Err(SchedulerError::StorageUnavailable("read-only".to_string()))
        }

        fn scan_cards_in_scope(&self, scope: &Scope) -> SchedResult<Vec<CardSchedulingState>> {
            self.0.scan_cards_in_scope(scope)
        }
    }

    #[test]
    fn test_storage_failure_is_surfaced() -> SchedResult<()> {
        let config = SchedulerConfig::default();
        let answer = outcome("a", true, at(10, 0));
        assert_eq!(
            record_outcome(&DownStore, &answer, &config),
            Err(SchedulerError::StorageUnavailable("down".to_string()))
        );

        let store = ReadOnlyStore(store_with("a")?);
        let before = store.load_scheduling_state(&CardId::new("a"))?;
        assert_eq!(
            record_outcome(&store, &answer, &config),
            Err(SchedulerError::StorageUnavailable("read-only".to_string()))
        );
        assert_eq!(store.load_scheduling_state(&CardId::new("a"))?, before);
        Ok(())
    }

    #[test]
    fn test_invalid_stored_state_is_not_masked() -> SchedResult<()> {
        let store = MemoryStore::new();
        let mut state =
            CardSchedulingState::new(CardId::new("bad"), at(9, 0), &SchedulerConfig::default());
        state.difficulty = 42.0;
        store.register_card(&UserId::new("u"), &DeckId::new("d"), &state)?;
        let result = record_outcome(
            &store,
            &outcome("bad", true, at(10, 0)),
            &SchedulerConfig::default(),
        );
        assert!(matches!(result, Err(SchedulerError::InvalidState(_))));
        assert_eq!(store.load_scheduling_state(&CardId::new("bad"))?, state);
        Ok(())
    }

    #[test]
    fn test_summary() {
        let mut session = StudySession::new(at(10, 0));
        session.record(outcome("a", true, at(10, 1)));
        session.record(outcome("b", false, at(10, 2)));
        session.record(outcome("c", true, at(10, 3)));
        session.record(outcome("d", true, at(10, 4)));
        let summary = session.summary(at(10, 25));
        assert_eq!(summary.total_cards, 4);
        assert_eq!(summary.correct_answers, 3);
        assert_eq!(summary.incorrect_answers, 1);
        assert_eq!(summary.success_rate, 75.0);
        assert_eq!(summary.duration_minutes, 25);
        assert_eq!(session.results().len(), 4);
    }

    #[test]
    fn test_empty_summary() {
        let session = StudySession::new(at(10, 0));
        let summary = session.summary(at(9, 0));
        assert_eq!(summary.total_cards, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.duration_minutes, 0);
    }

    #[test]
    fn test_user_stats() {
        let mut first = StudySession::new(at(8, 0));
        first.record(outcome("a", true, at(8, 1)));
        first.record(outcome("b", true, at(8, 2)));
        let mut second = StudySession::new(at(9, 0));
        second.record(outcome("a", false, at(9, 1)));
        second.record(outcome("b", true, at(9, 2)));
        let summaries = [first.summary(at(8, 10)), second.summary(at(9, 5))];
        let stats = UserStats::from_sessions(&summaries);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_cards_studied, 4);
        assert_eq!(stats.total_correct, 3);
        assert_eq!(stats.total_incorrect, 1);
        assert_eq!(stats.average_success_rate, 75.0);
        assert_eq!(stats.total_study_time_minutes, 15);
        assert_eq!(UserStats::from_sessions(&[]).average_success_rate, 0.0);
    }
}

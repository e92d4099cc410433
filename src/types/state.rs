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

use serde::Deserialize;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::error::SchedResult;
use crate::error::SchedulerError;
use crate::types::card_id::CardId;
use crate::types::timestamp::Timestamp;

/// The scheduling information of a single card.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSchedulingState {
    /// The card this state belongs to.
    pub card_id: CardId,
    /// How well the card is known. Higher is easier.
    pub difficulty: f64,
    /// The card is due once this instant has been reached.
    pub next_review_at: Timestamp,
    /// The number of completed reviews, correct or not.
    pub review_count: u32,
    /// The number of correct answers since the last incorrect one.
    pub consecutive_correct: u32,
}

impl CardSchedulingState {
    /// The state of a freshly created card: never reviewed, due immediately.
    pub fn new(card_id: CardId, now: Timestamp, config: &SchedulerConfig) -> Self {
        Self {
            card_id,
            difficulty: config.initial_difficulty,
            next_review_at: now,
            review_count: 0,
            consecutive_correct: 0,
        }
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review_at <= now
    }

    /// Checks the invariants that must hold for any stored state.
    pub fn check_invariants(&self, config: &SchedulerConfig) -> SchedResult<()> {
        if !self.difficulty.is_finite() {
            return Err(SchedulerError::InvalidState(format!(
                "card {}: difficulty is not a finite number",
                self.card_id
            )));
        }
        if self.difficulty < config.min_difficulty || self.difficulty > config.max_difficulty {
            return Err(SchedulerError::InvalidState(format!(
                "card {}: difficulty {} outside [{}, {}]",
                self.card_id, self.difficulty, config.min_difficulty, config.max_difficulty
            )));
        }
        if self.consecutive_correct > self.review_count {
            return Err(SchedulerError::InvalidState(format!(
                "card {}: streak of {} exceeds review count {}",
                self.card_id, self.consecutive_correct, self.review_count
            )));
        }
        Ok(())
    }
}

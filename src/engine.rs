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

//! The scheduling model.
//!
//! A correct answer extends the card's streak and the interval grows
//! geometrically with the streak length:
//!
//! ```text
//! interval = base_interval * growth_factor ^ (streak - 1)
//! ```
//!
//! capped at `max_interval_minutes`. Difficulty moves a fixed fraction of
//! the way towards the maximum, so gains shrink as the card gets easier.
//!
//! A miss resets the streak, drops the difficulty by a flat
//! `penalty_factor`, and brings the card back after `base_interval`.
//!
//! Everything here is a pure function of its arguments: the current time is
//! passed in, and the input state is never modified.

use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::error::SchedResult;
use crate::error::SchedulerError;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

/// Compute a card's next scheduling state after a single review.
pub fn compute_next(
    state: &CardSchedulingState,
    is_correct: bool,
    now: Timestamp,
    config: &SchedulerConfig,
) -> SchedResult<CardSchedulingState> {
    config.validate()?;
    state.check_invariants(config)?;

    let review_count = state.review_count.checked_add(1).ok_or_else(|| {
        SchedulerError::InvalidState(format!("card {}: review count overflow", state.card_id))
    })?;

    let (consecutive_correct, difficulty, interval) = if is_correct {
        let streak = state.consecutive_correct.checked_add(1).ok_or_else(|| {
            SchedulerError::InvalidState(format!("card {}: streak overflow", state.card_id))
        })?;
        let step_up = (config.max_difficulty - state.difficulty) * config.step_up_ratio;
        let difficulty = (state.difficulty + step_up).min(config.max_difficulty);
        (streak, difficulty, interval_minutes(streak, config))
    } else {
        let difficulty = (state.difficulty - config.penalty_factor).max(config.min_difficulty);
        (0, difficulty, config.base_interval_minutes)
    };

    let next_review_at = now.checked_add_minutes(interval).ok_or_else(|| {
        SchedulerError::InvalidState(format!(
            "card {}: next review time is out of range",
            state.card_id
        ))
    })?;

    Ok(CardSchedulingState {
        card_id: state.card_id.clone(),
        difficulty,
        next_review_at,
        review_count,
        consecutive_correct,
    })
}

/// [`compute_next`] with the default configuration.
pub fn compute_next_default(
    state: &CardSchedulingState,
    is_correct: bool,
    now: Timestamp,
) -> SchedResult<CardSchedulingState> {
    compute_next(state, is_correct, now, &SchedulerConfig::default())
}

/// The interval that follows a correct answer completing a streak of
/// `streak` answers. `streak` is at least 1.
pub fn interval_minutes(streak: u32, config: &SchedulerConfig) -> f64 {
    let exponent = streak.saturating_sub(1);
    // `powi` takes an i32; anything past that has long since hit the cap.
    let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);
    let interval = config.base_interval_minutes * config.growth_factor.powi(exponent);
    interval.min(config.max_interval_minutes)
}

/// Both possible outcomes of the next review, for display before the user
/// answers.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPreview {
    pub if_correct: CardSchedulingState,
    pub if_incorrect: CardSchedulingState,
}

pub fn preview(
    state: &CardSchedulingState,
    now: Timestamp,
    config: &SchedulerConfig,
) -> SchedResult<ReviewPreview> {
    Ok(ReviewPreview {
        if_correct: compute_next(state, true, now, config)?,
        if_incorrect: compute_next(state, false, now, config)?,
    })
}

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

//! Due-card queries.
//!
//! Study order is: most overdue first (`next_review_at` ascending), then
//! hardest first (`difficulty` ascending), then card ID, so the order is
//! total and repeatable. The store's own ordering is never relied upon, and
//! the due predicate is re-applied to whatever the store returns.
//!
//! A study batch may instead be shuffled with a caller-supplied seed. The
//! same seed over the same selection always yields the same order.

use std::cmp::Ordering;
use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::error::SchedResult;
use crate::error::SchedulerError;
use crate::store::SchedulingStore;
use crate::types::card_id::CardId;
use crate::types::scope::Scope;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Longest forecast `get_upcoming` will produce, in days.
pub const MAX_UPCOMING_HORIZON_DAYS: u32 = 366;

/// Number of cards that become due in one day-long window.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDay {
    /// 0 for the next 24 hours, 1 for the 24 hours after that, and so on.
    pub days_ahead: u32,
    pub count: usize,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyMode {
    /// Every card in scope.
    All,
    /// Cards whose review time has passed.
    Due,
    /// Cards at or below the configured difficulty threshold.
    Difficult,
}

impl Display for StudyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StudyMode::All => write!(f, "all"),
            StudyMode::Due => write!(f, "due"),
            StudyMode::Difficult => write!(f, "difficult"),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StudyOptions {
    pub mode: StudyMode,
    /// Seed for shuffling the selection. `None` keeps the mode's order.
    pub shuffle: Option<u64>,
    pub limit: Option<usize>,
}

impl Default for StudyOptions {
    fn default() -> Self {
        Self {
            mode: StudyMode::Due,
            shuffle: None,
            limit: None,
        }
    }
}

pub struct DueSetIndex<S> {
    store: S,
}

impl<S: SchedulingStore> DueSetIndex<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The IDs of the cards in `scope` due at `now`, most urgent first.
    pub fn get_due_cards(
        &self,
        scope: &Scope,
        now: Timestamp,
        limit: Option<usize>,
    ) -> SchedResult<Vec<CardId>> {
        Ok(take_ids(self.due_in_order(scope, now)?, limit))
    }

    /// Counts of not-yet-due cards per day, for the next `horizon_days`
    /// days. Always returns `horizon_days` buckets. Horizons longer than
    /// [`MAX_UPCOMING_HORIZON_DAYS`] are rejected.
    pub fn get_upcoming(
        &self,
        scope: &Scope,
        now: Timestamp,
        horizon_days: u32,
    ) -> SchedResult<Vec<UpcomingDay>> {
        if horizon_days > MAX_UPCOMING_HORIZON_DAYS {
            return Err(SchedulerError::InvalidRequest(format!(
                "horizon of {horizon_days} days exceeds the maximum of {MAX_UPCOMING_HORIZON_DAYS}"
            )));
        }
        let mut counts = vec![0usize; horizon_days as usize];
        for card in self.store.scan_cards_in_scope(scope)? {
            if card.is_due(now) {
                continue;
            }
            let millis = card.next_review_at.since(now).num_milliseconds();
            // A card due exactly at the end of a window belongs to it.
            let day = (millis - 1) / MILLIS_PER_DAY;
            if let Some(count) = usize::try_from(day).ok().and_then(|d| counts.get_mut(d)) {
                *count += 1;
            }
        }
        Ok(counts
            .into_iter()
            .enumerate()
            .map(|(day, count)| UpcomingDay {
                days_ahead: day as u32,
                count,
            })
            .collect())
    }

    /// A batch of cards to study, selected by `options.mode`, shuffled if
    /// a seed is given, then cut to `options.limit`.
    pub fn study_batch(
        &self,
        scope: &Scope,
        now: Timestamp,
        options: &StudyOptions,
        config: &SchedulerConfig,
    ) -> SchedResult<Vec<CardId>> {
        let mut cards = match options.mode {
            StudyMode::Due => self.due_in_order(scope, now)?,
            StudyMode::All => {
                let mut cards = self.store.scan_cards_in_scope(scope)?;
                cards.sort_by(by_urgency);
                cards
            }
            StudyMode::Difficult => {
                let mut cards = self.store.scan_cards_in_scope(scope)?;
                cards.retain(|card| card.difficulty <= config.difficult_threshold);
                cards.sort_by(by_difficulty);
                cards
            }
        };
        if let Some(seed) = options.shuffle {
            // Sorted first, so the result does not depend on store order.
            let mut rng = StdRng::seed_from_u64(seed);
            cards.shuffle(&mut rng);
        }
        Ok(take_ids(cards, options.limit))
    }

    fn due_in_order(
        &self,
        scope: &Scope,
        now: Timestamp,
    ) -> SchedResult<Vec<CardSchedulingState>> {
        let mut cards = self.store.scan_due_in_scope(scope, now)?;
        cards.retain(|card| card.is_due(now));
        cards.sort_by(by_urgency);
        Ok(cards)
    }
}

fn by_urgency(a: &CardSchedulingState, b: &CardSchedulingState) -> Ordering {
    a.next_review_at
        .cmp(&b.next_review_at)
        .then_with(|| a.difficulty.total_cmp(&b.difficulty))
        .then_with(|| a.card_id.cmp(&b.card_id))
}

fn by_difficulty(a: &CardSchedulingState, b: &CardSchedulingState) -> Ordering {
    a.difficulty
        .total_cmp(&b.difficulty)
        .then_with(|| a.next_review_at.cmp(&b.next_review_at))
        .then_with(|| a.card_id.cmp(&b.card_id))
}

fn take_ids(cards: Vec<CardSchedulingState>, limit: Option<usize>) -> Vec<CardId> {
    let limit = limit.unwrap_or(usize::MAX);
    cards.into_iter().take(limit).map(|card| card.card_id).collect()
}

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

pub mod memory;
pub mod sqlite;

use crate::error::SchedResult;
use crate::types::card_id::CardId;
use crate::types::scope::Scope;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

/// The record store that holds scheduling state.
///
/// Infrastructure failures are reported as
/// [`SchedulerError::StorageUnavailable`](crate::error::SchedulerError::StorageUnavailable),
/// unknown cards as
/// [`SchedulerError::NotFound`](crate::error::SchedulerError::NotFound).
pub trait SchedulingStore {
    fn load_scheduling_state(&self, card_id: &CardId) -> SchedResult<CardSchedulingState>;

    fn save_scheduling_state(
        &self,
        card_id: &CardId,
        state: &CardSchedulingState,
    ) -> SchedResult<()>;

    /// Every card in the scope, in no particular order.
    fn scan_cards_in_scope(&self, scope: &Scope) -> SchedResult<Vec<CardSchedulingState>>;

    /// The cards in the scope that are due at `now`, in no particular order.
    /// Stores that can filter on the review time should override this.
    fn scan_due_in_scope(
        &self,
        scope: &Scope,
        now: Timestamp,
    ) -> SchedResult<Vec<CardSchedulingState>> {
        let mut cards = self.scan_cards_in_scope(scope)?;
        cards.retain(|card| card.is_due(now));
        Ok(cards)
    }
}

impl<S: SchedulingStore + ?Sized> SchedulingStore for &S {
    fn load_scheduling_state(&self, card_id: &CardId) -> SchedResult<CardSchedulingState> {
        (**self).load_scheduling_state(card_id)
    }

    fn save_scheduling_state(
        &self,
        card_id: &CardId,
        state: &CardSchedulingState,
    ) -> SchedResult<()> {
        (**self).save_scheduling_state(card_id, state)
    }

    fn scan_cards_in_scope(&self, scope: &Scope) -> SchedResult<Vec<CardSchedulingState>> {
        (**self).scan_cards_in_scope(scope)
    }

    fn scan_due_in_scope(
        &self,
        scope: &Scope,
        now: Timestamp,
    ) -> SchedResult<Vec<CardSchedulingState>> {
        (**self).scan_due_in_scope(scope, now)
    }
}

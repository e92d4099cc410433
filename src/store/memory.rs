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

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::SchedResult;
use crate::error::SchedulerError;
use crate::store::SchedulingStore;
use crate::types::card_id::CardId;
use crate::types::card_id::DeckId;
use crate::types::card_id::UserId;
use crate::types::scope::Scope;
use crate::types::state::CardSchedulingState;

/// An in-memory store, keyed by card ID.
pub struct MemoryStore {
    cards: Mutex<HashMap<CardId, Entry>>,
}

struct Entry {
    owner: UserId,
    deck: DeckId,
    state: CardSchedulingState,
}

impl Entry {
    fn in_scope(&self, scope: &Scope) -> bool {
        match scope {
            Scope::User(user) => &self.owner == user,
            Scope::Deck(deck) => &self.deck == deck,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cards: Mutex::new(HashMap::new()),
        }
    }

    /// Add a card. Replaces any previous card with the same ID.
    pub fn register_card(
        &self,
        owner: &UserId,
        deck: &DeckId,
        state: &CardSchedulingState,
    ) -> SchedResult<()> {
        let mut cards = self.acquire()?;
        let entry = Entry {
            owner: owner.clone(),
            deck: deck.clone(),
            state: state.clone(),
        };
        cards.insert(state.card_id.clone(), entry);
        Ok(())
    }

    /// Remove a card, returning whether it existed.
    pub fn remove_card(&self, card_id: &CardId) -> SchedResult<bool> {
        let mut cards = self.acquire()?;
        Ok(cards.remove(card_id).is_some())
    }

    pub fn len(&self) -> SchedResult<usize> {
        Ok(self.acquire()?.len())
    }

    pub fn is_empty(&self) -> SchedResult<bool> {
        Ok(self.acquire()?.is_empty())
    }

    fn acquire(&self) -> SchedResult<MutexGuard<'_, HashMap<CardId, Entry>>> {
        self.cards
            .lock()
            .map_err(|_| SchedulerError::StorageUnavailable("store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulingStore for MemoryStore {
    fn load_scheduling_state(&self, card_id: &CardId) -> SchedResult<CardSchedulingState> {
        let cards = self.acquire()?;
        match cards.get(card_id) {
            Some(entry) => Ok(entry.state.clone()),
            None => Err(SchedulerError::NotFound(card_id.clone())),
        }
    }

    fn save_scheduling_state(
        &self,
        card_id: &CardId,
        state: &CardSchedulingState,
    ) -> SchedResult<()> {
        let mut cards = self.acquire()?;
        match cards.get_mut(card_id) {
            Some(entry) => {
                entry.state = CardSchedulingState {
                    card_id: card_id.clone(),
                    ..state.clone()
                };
                Ok(())
            }
            None => Err(SchedulerError::NotFound(card_id.clone())),
        }
    }

    fn scan_cards_in_scope(&self, scope: &Scope) -> SchedResult<Vec<CardSchedulingState>> {
        let cards = self.acquire()?;
        Ok(cards
            .values()
            .filter(|entry| entry.in_scope(scope))
            .map(|entry| entry.state.clone())
            .collect())
    }
}

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

use crate::types::card_id::DeckId;
use crate::types::card_id::UserId;

/// The set of cards a query ranges over.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Scope {
    /// Every card owned by a user, across all their decks.
    User(UserId),
    /// Every card in one deck.
    Deck(DeckId),
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::User(user) => write!(f, "user:{user}"),
            Scope::Deck(deck) => write!(f, "deck:{deck}"),
        }
    }
}

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

//! flashsched: review scheduling for flashcards.
//!
//! - [`engine`]: computes a card's next review from an answer
//! - [`due`]: finds and orders the cards due in a deck or user collection
//! - [`store`]: the storage boundary, with in-memory and SQLite stores
//! - [`session`]: applies answers through a store and summarises sessions

pub mod cli;
pub mod config;
pub mod due;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;
pub mod types;

pub use config::SchedulerConfig;
pub use due::DueSetIndex;
pub use engine::compute_next;
pub use error::ErrorReport;
pub use error::Fallible;
pub use error::SchedResult;
pub use error::SchedulerError;
pub use error::fail;
pub use types::card_id::CardId;
pub use types::scope::Scope;
pub use types::state::CardSchedulingState;
pub use types::timestamp::Timestamp;

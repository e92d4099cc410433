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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;

use crate::config::SchedulerConfig;
use crate::due::DueSetIndex;
use crate::due::StudyMode;
use crate::due::StudyOptions;
use crate::due::UpcomingDay;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::session::record_outcome;
use crate::store::sqlite::SqliteStore;
use crate::types::card_id::CardId;
use crate::types::card_id::DeckId;
use crate::types::card_id::UserId;
use crate::types::outcome::StudyOutcome;
use crate::types::scope::Scope;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the scheduling database.
    #[arg(long, default_value = "flashsched.db")]
    db: PathBuf,
    /// Optional path to a TOML scheduler configuration.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use this instant instead of the current time (RFC 3339).
    #[arg(long)]
    now: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new card, due immediately.
    Add {
        card_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        deck: String,
    },
    /// Record an answer to a card.
    Answer {
        card_id: String,
        #[command(flatten)]
        result: AnswerArgs,
    },
    /// List the cards due now, most urgent first.
    Due {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Count the cards coming due over the next days.
    Upcoming {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value_t = 14)]
        horizon: u32,
    },
    /// Select a batch of cards to study.
    Batch {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value_t = StudyMode::Due)]
        mode: StudyMode,
        /// Shuffle the batch using this seed.
        #[arg(long, value_name = "SEED")]
        shuffle: Option<u64>,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct AnswerArgs {
    /// The card was answered correctly.
    #[arg(long)]
    correct: bool,
    /// The card was answered incorrectly.
    #[arg(long)]
    incorrect: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScopeArgs {
    /// All cards owned by this user.
    #[arg(long)]
    user: Option<String>,
    /// All cards in this deck.
    #[arg(long)]
    deck: Option<String>,
}

impl ScopeArgs {
    fn into_scope(self) -> Fallible<Scope> {
        match (self.user, self.deck) {
            (Some(user), None) => Ok(Scope::User(UserId::new(user))),
            (None, Some(deck)) => Ok(Scope::Deck(DeckId::new(deck))),
            _ => fail("exactly one of --user and --deck is required."),
        }
    }
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let json = run(cli)?;
    println!("{json}");
    Ok(())
}

fn run(cli: Cli) -> Fallible<String> {
    let config = match &cli.config {
        Some(path) => SchedulerConfig::load(path)?,
        None => SchedulerConfig::default(),
    };
    let now = match &cli.now {
        Some(s) => Timestamp::from_rfc3339(s)?,
        None => Timestamp::now(),
    };
    let db_path = cli
        .db
        .to_str()
        .ok_or_else(|| ErrorReport::new("invalid database path"))?;
    let store = SqliteStore::open(db_path)?;
    match cli.command {
        Command::Add {
            card_id,
            user,
            deck,
        } => {
            let state = CardSchedulingState::new(CardId::new(card_id), now, &config);
            store.register_card(&UserId::new(user), &DeckId::new(deck), &state)?;
            to_json(&state)
        }
        Command::Answer { card_id, result } => {
            let outcome = StudyOutcome {
                card_id: CardId::new(card_id),
                is_correct: result.correct,
                answered_at: now,
                time_spent_ms: 0,
            };
            let next = record_outcome(&store, &outcome, &config)?;
            to_json(&next)
        }
        Command::Due { scope, limit } => {
            let index = DueSetIndex::new(&store);
            let due: Vec<CardId> = index.get_due_cards(&scope.into_scope()?, now, limit)?;
            log::debug!("{} cards due.", due.len());
            to_json(&due)
        }
        Command::Upcoming { scope, horizon } => {
            let index = DueSetIndex::new(&store);
            let upcoming: Vec<UpcomingDay> =
                index.get_upcoming(&scope.into_scope()?, now, horizon)?;
            to_json(&upcoming)
        }
        Command::Batch {
            scope,
            mode,
            shuffle,
            limit,
        } => {
            let index = DueSetIndex::new(&store);
            let options = StudyOptions {
                mode,
                shuffle,
                limit,
            };
            let batch = index.study_batch(&scope.into_scope()?, now, &options, &config)?;
            to_json(&batch)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Fallible<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

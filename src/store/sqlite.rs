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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::ToSql;
use rusqlite::Transaction;
use rusqlite::params;

use crate::error::SchedResult;
use crate::error::SchedulerError;
use crate::store::SchedulingStore;
use crate::types::card_id::CardId;
use crate::types::card_id::DeckId;
use crate::types::card_id::UserId;
use crate::types::scope::Scope;
use crate::types::state::CardSchedulingState;
use crate::types::timestamp::Timestamp;

const COLUMNS: &str = "card_id, difficulty, next_review_at, review_count, consecutive_correct";

/// A SQLite-backed store. Review times are indexed per user and per deck,
/// so due queries are range scans.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(database_path: &str) -> SchedResult<Self> {
        log::debug!("Opening database at {database_path}");
        let mut conn = Connection::open(database_path)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                log::debug!("Creating schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Add a card. Replaces any previous card with the same ID.
    pub fn register_card(
        &self,
        owner: &UserId,
        deck: &DeckId,
        state: &CardSchedulingState,
    ) -> SchedResult<()> {
        log::debug!("Registering card {} in deck {deck}", state.card_id);
        let conn = self.acquire()?;
        let sql = "insert or replace into cards (card_id, user_id, deck_id, difficulty, next_review_at, review_count, consecutive_correct) values (?, ?, ?, ?, ?, ?, ?);";
        conn.execute(
            sql,
            (
                &state.card_id,
                owner,
                deck,
                state.difficulty,
                state.next_review_at,
                state.review_count,
                state.consecutive_correct,
            ),
        )?;
        Ok(())
    }

    /// Remove a card, returning whether it existed.
    pub fn remove_card(&self, card_id: &CardId) -> SchedResult<bool> {
        let conn = self.acquire()?;
        let changed = conn.execute("delete from cards where card_id = ?;", [card_id])?;
        Ok(changed > 0)
    }

    pub fn card_count(&self) -> SchedResult<usize> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row("select count(*) from cards;", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn query_states(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> SchedResult<Vec<CardSchedulingState>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut states = Vec::new();
        while let Some(row) = rows.next()? {
            states.push(state_from_row(row)?);
        }
        Ok(states)
    }

    fn acquire(&self) -> SchedResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            SchedulerError::StorageUnavailable("database connection lock poisoned".to_string())
        })
    }
}

impl SchedulingStore for SqliteStore {
    fn load_scheduling_state(&self, card_id: &CardId) -> SchedResult<CardSchedulingState> {
        let conn = self.acquire()?;
        let sql = format!("select {COLUMNS} from cards where card_id = ?;");
        let state = conn
            .query_row(&sql, [card_id], state_from_row)
            .optional()?;
        state.ok_or_else(|| SchedulerError::NotFound(card_id.clone()))
    }

    fn save_scheduling_state(
        &self,
        card_id: &CardId,
        state: &CardSchedulingState,
    ) -> SchedResult<()> {
        let conn = self.acquire()?;
        let sql = "update cards set difficulty = ?, next_review_at = ?, review_count = ?, consecutive_correct = ? where card_id = ?;";
        let changed = conn.execute(
            sql,
            (
                state.difficulty,
                state.next_review_at,
                state.review_count,
                state.consecutive_correct,
                card_id,
            ),
        )?;
        if changed == 0 {
            return Err(SchedulerError::NotFound(card_id.clone()));
        }
        Ok(())
    }

    fn scan_cards_in_scope(&self, scope: &Scope) -> SchedResult<Vec<CardSchedulingState>> {
        let (column, value) = scope_filter(scope);
        let sql = format!("select {COLUMNS} from cards where {column} = ?;");
        self.query_states(&sql, params![value])
    }

    fn scan_due_in_scope(
        &self,
        scope: &Scope,
        now: Timestamp,
    ) -> SchedResult<Vec<CardSchedulingState>> {
        log::debug!("Scanning due cards in {scope} at {now}");
        let (column, value) = scope_filter(scope);
        let sql =
            format!("select {COLUMNS} from cards where {column} = ? and next_review_at <= ?;");
        self.query_states(&sql, params![value, now])
    }
}

fn scope_filter(scope: &Scope) -> (&'static str, &str) {
    match scope {
        Scope::User(user) => ("user_id", user.as_str()),
        Scope::Deck(deck) => ("deck_id", deck.as_str()),
    }
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<CardSchedulingState> {
    Ok(CardSchedulingState {
        card_id: row.get(0)?,
        difficulty: row.get(1)?,
        next_review_at: row.get(2)?,
        review_count: row.get(3)?,
        consecutive_correct: row.get(4)?,
    })
}

fn probe_schema_exists(tx: &Transaction) -> SchedResult<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use tempfile::TempDir;
    use tempfile::tempdir;

    use super::*;
    use crate::config::SchedulerConfig;
    use crate::session::record_outcome;
    use crate::types::outcome::StudyOutcome;

    fn at(h: u32, m: u32) -> Timestamp {
        Timestamp::new(Utc.with_ymd_and_hms(2025, 1, 1, h, m, 0).unwrap())
    }

    fn open_tmp() -> SchedResult<(TempDir, SqliteStore)> {
        let dir = tempdir().map_err(|e| SchedulerError::StorageUnavailable(e.to_string()))?;
        let path = dir.path().join("cards.db");
        let store = SqliteStore::open(path.to_str().unwrap())?;
        Ok((dir, store))
    }

    fn card(id: &str, due: Timestamp) -> CardSchedulingState {
        CardSchedulingState::new(CardId::new(id), due, &SchedulerConfig::default())
    }

    #[test]
    fn test_round_trip() -> SchedResult<()> {
        let (_dir, store) = open_tmp()?;
        let state = CardSchedulingState {
            card_id: CardId::new("a"),
            difficulty: 2.6,
            next_review_at: at(10, 40),
            review_count: 4,
            consecutive_correct: 3,
        };
        store.register_card(&UserId::new("u"), &DeckId::new("d"), &state)?;
        assert_eq!(store.load_scheduling_state(&CardId::new("a"))?, state);
        Ok(())
    }

    #[test]
    fn test_save_updates_existing_card() -> SchedResult<()> {
        let (_dir, store) = open_tmp()?;
        let id = CardId::new("a");
        store.register_card(&UserId::new("u"), &DeckId::new("d"), &card("a", at(9, 0)))?;
        let mut state = store.load_scheduling_state(&id)?;
        state.review_count = 1;
        state.next_review_at = at(9, 10);
        store.save_scheduling_state(&id, &state)?;
        assert_eq!(store.load_scheduling_state(&id)?, state);
        Ok(())
    }

    #[test]
    fn test_unknown_card() -> SchedResult<()> {
        let (_dir, store) = open_tmp()?;
        let id = CardId::new("ghost");
        assert_eq!(
            store.load_scheduling_state(&id),
            Err(SchedulerError::NotFound(id.clone()))
        );
        assert_eq!(
            store.save_scheduling_state(&id, &card("ghost", at(9, 0))),
            Err(SchedulerError::NotFound(id))
        );
        Ok(())
    }

    #[test]
    fn test_due_scan_pushes_filter_down() -> SchedResult<()> {
        let (_dir, store) = open_tmp()?;
        let user = UserId::new("u");
        let deck = DeckId::new("d");
        store.register_card(&user, &deck, &card("past", at(9, 0)))?;
        store.register_card(&user, &deck, &card("now", at(10, 0)))?;
        store.register_card(&user, &deck, &card("future", at(11, 0)))?;
        store.register_card(&UserId::new("other"), &DeckId::new("x"), &card("theirs", at(8, 0)))?;

        let mut due: Vec<String> = store
            .scan_due_in_scope(&Scope::User(user), at(10, 0))?
            .into_iter()
            .map(|s| s.card_id.to_string())
            .collect();
        due.sort();
        assert_eq!(due, vec!["now", "past"]);

        let all = store.scan_cards_in_scope(&Scope::Deck(deck))?;
        assert_eq!(all.len(), 3);
        Ok(())
    }

    #[test]
    fn test_stored_review_time_is_not_before_answer() -> SchedResult<()> {
        let (_dir, store) = open_tmp()?;
        let config = SchedulerConfig {
            base_interval_minutes: 1e-9,
            ..SchedulerConfig::default()
        };
        let answered_at = Timestamp::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
                + chrono::Duration::nanoseconds(123_456_789),
        );
        store.register_card(&UserId::new("u"), &DeckId::new("d"), &card("a", at(9, 0)))?;
        let outcome = StudyOutcome {
            card_id: CardId::new("a"),
            is_correct: true,
            answered_at,
            time_spent_ms: 0,
        };
        let computed = record_outcome(&store, &outcome, &config)?;
        let loaded = store.load_scheduling_state(&CardId::new("a"))?;
        assert_eq!(loaded, computed);
        assert!(loaded.next_review_at >= answered_at);
        Ok(())
    }

    #[test]
    fn test_reopen_keeps_data() -> SchedResult<()> {
        let dir = tempdir().map_err(|e| SchedulerError::StorageUnavailable(e.to_string()))?;
        let path = dir.path().join("cards.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteStore::open(path)?;
            store.register_card(&UserId::new("u"), &DeckId::new("d"), &card("a", at(9, 0)))?;
        }
        let store = SqliteStore::open(path)?;
        assert_eq!(store.card_count()?, 1);
        assert!(store.remove_card(&CardId::new("a"))?);
        assert_eq!(store.card_count()?, 0);
        Ok(())
    }
}

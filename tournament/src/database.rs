// ═══════════════════════════════════════════════════════════════════════
// Database - SQLite storage for tournament results and ELO ratings
// ═══════════════════════════════════════════════════════════════════════

use crate::error::TournamentError;
use crate::runner::GameResult;
use caylus_agents::AgentKind;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;

/// Rating every agent starts from.
pub const INITIAL_ELO: f64 = 1500.0;

pub struct Database {
    conn: Connection,
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStanding {
    pub name: String,
    pub elo: f64,
    pub games: u32,
    pub wins: u32,
    pub draws: u32,
}

impl Database {
    /// Open (or create) a database at the given path.
    pub fn new(path: &str) -> Result<Self, TournamentError> {
        let db = Database { conn: Connection::open(path)? };
        db.create_schema()?;
        Ok(db)
    }

    /// In-memory database (useful for tests).
    pub fn in_memory() -> Result<Self, TournamentError> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<(), TournamentError> {
        self.conn.execute_batch("
            CREATE TABLE IF NOT EXISTS agents (
                id          INTEGER PRIMARY KEY,
                name        TEXT NOT NULL UNIQUE,
                elo         REAL NOT NULL DEFAULT 1500.0,
                games       INTEGER NOT NULL DEFAULT 0,
                wins        INTEGER NOT NULL DEFAULT 0,
                draws       INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS games (
                id          INTEGER PRIMARY KEY,
                seed        INTEGER NOT NULL,
                turns       INTEGER NOT NULL,
                decisions   INTEGER NOT NULL,
                winners     TEXT NOT NULL,
                draw        INTEGER NOT NULL,
                played_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS game_players (
                id          INTEGER PRIMARY KEY,
                game_id     INTEGER NOT NULL REFERENCES games(id),
                agent_id    INTEGER NOT NULL REFERENCES agents(id),
                color       TEXT NOT NULL,
                score       INTEGER NOT NULL,
                deniers     INTEGER NOT NULL,
                houses      INTEGER NOT NULL,
                favors      INTEGER NOT NULL
            );
        ")?;
        Ok(())
    }

    /// Register an agent (or return existing ID).
    pub fn register_agent(&self, name: &str) -> Result<i64, TournamentError> {
        self.conn.execute("INSERT OR IGNORE INTO agents (name) VALUES (?1)", params![name])?;
        Ok(self.conn.query_row("SELECT id FROM agents WHERE name = ?1", params![name], |row| row.get(0))?)
    }

    fn agent_ids(&self, result: &GameResult) -> Result<HashMap<AgentKind, i64>, TournamentError> {
        let mut ids = HashMap::new();
        for pr in &result.player_results {
            if !ids.contains_key(&pr.agent) {
                ids.insert(pr.agent, self.register_agent(&pr.agent.to_string())?);
            }
        }
        Ok(ids)
    }

    /// Store a completed game and update per-agent counters.
    pub fn store_game(&mut self, result: &GameResult) -> Result<i64, TournamentError> {
        let ids = self.agent_ids(result)?;
        let tx = self.conn.transaction()?;

        let winners: Vec<String> = result.winners.iter().map(|c| c.to_string()).collect();
        tx.execute(
            "INSERT INTO games (seed, turns, decisions, winners, draw) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                result.seed as i64,
                result.turns as i64,
                result.decisions as i64,
                winners.join(","),
                result.is_draw(),
            ],
        )?;
        let game_id = tx.last_insert_rowid();

        for pr in &result.player_results {
            let agent_id = ids.get(&pr.agent).copied().unwrap_or_default();
            tx.execute(
                "INSERT INTO game_players (game_id, agent_id, color, score, deniers, houses, favors)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    game_id,
                    agent_id,
                    pr.color.to_string(),
                    pr.score as i64,
                    pr.deniers as i64,
                    pr.houses_placed as i64,
                    pr.favors as i64,
                ],
            )?;

            // Counters are per seat, so a self-play game counts once per seat
            let top = result.winners.contains(&pr.color);
            let (win, draw) = match (top, result.is_draw()) {
                (true, false) => (1, 0),
                (true, true) => (0, 1),
                _ => (0, 0),
            };
            tx.execute(
                "UPDATE agents SET games = games + 1, wins = wins + ?1, draws = draws + ?2 WHERE id = ?3",
                params![win, draw, agent_id],
            )?;
        }

        tx.commit()?;
        Ok(game_id)
    }

    fn elo_of(&self, agent_id: i64) -> Result<f64, TournamentError> {
        let elo = self
            .conn
            .query_row("SELECT elo FROM agents WHERE id = ?1", params![agent_id], |row| row.get(0))
            .optional()?;
        Ok(elo.unwrap_or(INITIAL_ELO))
    }

    /// Pairwise multiplayer ELO: every pair of seats held by different
    /// agents is a match, scored 1 / 0.5 / 0 by final VP.
    pub fn update_elo(&mut self, result: &GameResult, k: f64) -> Result<(), TournamentError> {
        let ids = self.agent_ids(result)?;
        let mut ratings: HashMap<i64, f64> = HashMap::new();
        for &id in ids.values() {
            ratings.insert(id, self.elo_of(id)?);
        }

        let mut deltas: HashMap<i64, f64> = HashMap::new();
        let seats = &result.player_results;
        for (i, a) in seats.iter().enumerate() {
            for b in &seats[i + 1..] {
                let (Some(&ia), Some(&ib)) = (ids.get(&a.agent), ids.get(&b.agent)) else {
                    continue;
                };
                if ia == ib {
                    continue;
                }
                let ra = ratings.get(&ia).copied().unwrap_or(INITIAL_ELO);
                let rb = ratings.get(&ib).copied().unwrap_or(INITIAL_ELO);
                let expected_a = 1.0 / (1.0 + 10f64.powf((rb - ra) / 400.0));
                let score_a = match a.score.cmp(&b.score) {
                    std::cmp::Ordering::Greater => 1.0,
                    std::cmp::Ordering::Equal => 0.5,
                    std::cmp::Ordering::Less => 0.0,
                };
                *deltas.entry(ia).or_insert(0.0) += k * (score_a - expected_a);
                *deltas.entry(ib).or_insert(0.0) -= k * (score_a - expected_a);
            }
        }

        let tx = self.conn.transaction()?;
        for (id, delta) in deltas {
            tx.execute("UPDATE agents SET elo = elo + ?1 WHERE id = ?2", params![delta, id])?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Get ELO leaderboard.
    pub fn leaderboard(&self) -> Result<Vec<AgentStanding>, TournamentError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, elo, games, wins, draws FROM agents ORDER BY elo DESC")?;
        let rows = stmt.query_map([], |row| {
            Ok(AgentStanding {
                name: row.get(0)?,
                elo: row.get(1)?,
                games: row.get(2)?,
                wins: row.get(3)?,
                draws: row.get(4)?,
            })
        })?;
        let standings = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(standings)
    }

    /// Get total number of games stored.
    pub fn game_count(&self) -> Result<u32, TournamentError> {
        Ok(self.conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))?)
    }
}

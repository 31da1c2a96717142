use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::HistoryError;
use crate::train::EpisodeStats;

/// One stored episode.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub run: String,
    pub episode: usize,
    pub reward: f32,
    pub steps: usize,
    pub max_length: usize,
    pub final_length: usize,
    pub epsilon: f32,
    pub reached_goal: bool,
    pub recorded_at: String,
}

/// Per-episode training history in SQLite, the series a reward-curve plot
/// is drawn from.
pub struct History {
    conn: Connection,
}

impl History {
    pub fn open(path: &Path) -> Result<Self, HistoryError> {
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS episodes (
                id INTEGER PRIMARY KEY,
                run TEXT NOT NULL,
                episode INTEGER NOT NULL,
                reward REAL NOT NULL,
                steps INTEGER NOT NULL,
                max_length INTEGER NOT NULL,
                final_length INTEGER NOT NULL,
                epsilon REAL NOT NULL,
                reached_goal INTEGER NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS episodes_run ON episodes (run, episode);",
        )?;
        Ok(Self { conn })
    }

    pub fn record(&self, run: &str, stats: &EpisodeStats) -> Result<(), HistoryError> {
        self.conn.execute(
            "INSERT INTO episodes
                (run, episode, reward, steps, max_length, final_length, epsilon, reached_goal, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run,
                stats.episode as i64,
                stats.reward as f64,
                stats.steps as i64,
                stats.max_length as i64,
                stats.final_length as i64,
                stats.epsilon as f64,
                stats.reached_goal as i64,
                chrono::Local::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    ///total reward of every episode of `run`, in episode order
    pub fn rewards(&self, run: &str) -> Result<Vec<f32>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT reward FROM episodes WHERE run = ?1 ORDER BY episode")?;
        let rows = stmt.query_map(params![run], |row| row.get::<_, f64>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r? as f32);
        }
        Ok(out)
    }

    /// Highest-reward episode of `run`.
    pub fn best(&self, run: &str) -> Result<Option<EpisodeRecord>, HistoryError> {
        let record = self
            .conn
            .query_row(
                "SELECT run, episode, reward, steps, max_length, final_length, epsilon, reached_goal, recorded_at
                 FROM episodes WHERE run = ?1 ORDER BY reward DESC, episode ASC LIMIT 1",
                params![run],
                |row| {
                    Ok(EpisodeRecord {
                        run: row.get(0)?,
                        episode: row.get::<_, i64>(1)? as usize,
                        reward: row.get::<_, f64>(2)? as f32,
                        steps: row.get::<_, i64>(3)? as usize,
                        max_length: row.get::<_, i64>(4)? as usize,
                        final_length: row.get::<_, i64>(5)? as usize,
                        epsilon: row.get::<_, f64>(6)? as f32,
                        reached_goal: row.get::<_, i64>(7)? != 0,
                        recorded_at: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn runs(&self) -> Result<Vec<String>, HistoryError> {
        let mut stmt = self
            .conn
            .prepare("SELECT run FROM episodes GROUP BY run ORDER BY MIN(id)")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

/// Identifier for a training run, from the local start time.
pub fn run_id() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S%.3f").to_string()
}

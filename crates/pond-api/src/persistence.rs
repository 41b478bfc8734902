use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use contracts::{HarvestEvent, PondRecord, PopulationEvent, SamplingEvent};
use pond_core::{CommitHook, CommitHookError, PondState, StagedMutation};
use rusqlite::{params, Connection};

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// Durable mirror of the engine's ledgers. Every mutation lands as one
/// transaction: the pond snapshot row plus the staged event tail commit or
/// roll back together.
#[derive(Debug)]
pub struct SqlitePondStore {
    conn: Mutex<Connection>,
}

impl SqlitePondStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.configure()?;
        store.migrate()?;
        Ok(store)
    }

    pub fn persist_mutation(&self, staged: StagedMutation<'_>) -> Result<(), PersistenceError> {
        let mut conn = self.lock_conn();
        let tx = conn.transaction()?;

        upsert_pond(&tx, staged.record)?;

        for event in staged.new_population_events {
            let payload_json = serde_json::to_string(event)?;
            tx.execute(
                "INSERT OR IGNORE INTO population_events (
                    pond_id,
                    event_id,
                    sequence,
                    recorded_at,
                    delta,
                    resulting_total,
                    payload_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.pond_id.as_str(),
                    event.event_id.as_str(),
                    i64::try_from(event_sequence(&event.event_id)).unwrap_or(i64::MAX),
                    event.recorded_at.to_rfc3339(),
                    event.delta,
                    event.resulting_total,
                    payload_json,
                ],
            )?;
        }

        for event in staged.new_sampling_events {
            let payload_json = serde_json::to_string(event)?;
            tx.execute(
                "INSERT OR IGNORE INTO sampling_events (
                    pond_id,
                    event_id,
                    sequence,
                    recorded_at,
                    fish_per_kg,
                    payload_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.pond_id.as_str(),
                    event.event_id.as_str(),
                    i64::try_from(event_sequence(&event.event_id)).unwrap_or(i64::MAX),
                    event.recorded_at.to_rfc3339(),
                    event.fish_per_kg,
                    payload_json,
                ],
            )?;
        }

        for event in staged.new_harvest_events {
            let payload_json = serde_json::to_string(event)?;
            tx.execute(
                "INSERT OR IGNORE INTO harvest_events (
                    pond_id,
                    event_id,
                    sequence,
                    recorded_at,
                    weight_kg,
                    harvested_count,
                    payload_json
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.pond_id.as_str(),
                    event.event_id.as_str(),
                    i64::try_from(event_sequence(&event.event_id)).unwrap_or(i64::MAX),
                    event.recorded_at.to_rfc3339(),
                    event.weight_kg,
                    event.count,
                    payload_json,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Rebuilds every pond's full state in ledger order.
    pub fn load_all(&self) -> Result<Vec<PondState>, PersistenceError> {
        let conn = self.lock_conn();

        let mut stmt = conn.prepare("SELECT payload_json FROM ponds ORDER BY pond_id ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut states = Vec::new();
        for row in rows {
            let record: PondRecord = serde_json::from_str(&row?)?;
            let pond_id = record.pond_id.clone();

            let population_events: Vec<PopulationEvent> =
                load_events(&conn, "population_events", &pond_id)?;
            let sampling_events: Vec<SamplingEvent> =
                load_events(&conn, "sampling_events", &pond_id)?;
            let harvest_events: Vec<HarvestEvent> = load_events(&conn, "harvest_events", &pond_id)?;

            let next_event_sequence = population_events
                .iter()
                .map(|event| event_sequence(&event.event_id))
                .chain(
                    sampling_events
                        .iter()
                        .map(|event| event_sequence(&event.event_id)),
                )
                .chain(
                    harvest_events
                        .iter()
                        .map(|event| event_sequence(&event.event_id)),
                )
                .max()
                .unwrap_or(0)
                + 1;

            states.push(PondState {
                record,
                population_events,
                sampling_events,
                harvest_events,
                next_event_sequence: next_event_sequence.max(1),
            });
        }

        Ok(states)
    }

    fn configure(&self) -> Result<(), PersistenceError> {
        let conn = self.lock_conn();
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&self) -> Result<(), PersistenceError> {
        let conn = self.lock_conn();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ponds (
                pond_id TEXT PRIMARY KEY,
                farm_id TEXT NOT NULL,
                population INTEGER NOT NULL,
                status TEXT NOT NULL,
                payload_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS population_events (
                pond_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                delta INTEGER NOT NULL,
                resulting_total INTEGER NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (pond_id, event_id)
            );

            CREATE TABLE IF NOT EXISTS sampling_events (
                pond_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                fish_per_kg REAL NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (pond_id, event_id)
            );

            CREATE TABLE IF NOT EXISTS harvest_events (
                pond_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                sequence INTEGER NOT NULL,
                recorded_at TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                harvested_count INTEGER NOT NULL,
                payload_json TEXT NOT NULL,
                PRIMARY KEY (pond_id, event_id)
            );

            CREATE INDEX IF NOT EXISTS idx_population_events_pond_seq
                ON population_events(pond_id, sequence);
            CREATE INDEX IF NOT EXISTS idx_sampling_events_pond_seq
                ON sampling_events(pond_id, sequence);
            CREATE INDEX IF NOT EXISTS idx_harvest_events_pond_seq
                ON harvest_events(pond_id, sequence);
            CREATE INDEX IF NOT EXISTS idx_ponds_farm ON ponds(farm_id);
            ",
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Adapter wiring the store into the engine's commit path.
pub struct SqliteCommitHook {
    store: Arc<SqlitePondStore>,
}

impl SqliteCommitHook {
    pub fn new(store: Arc<SqlitePondStore>) -> Self {
        Self { store }
    }
}

impl CommitHook for SqliteCommitHook {
    fn persist(&self, staged: StagedMutation<'_>) -> Result<(), CommitHookError> {
        self.store.persist_mutation(staged).map_err(|err| {
            log::error!(
                "sqlite commit failed for {}: {err}",
                staged.record.pond_id
            );
            CommitHookError(err.to_string())
        })
    }
}

fn upsert_pond(tx: &rusqlite::Transaction<'_>, record: &PondRecord) -> Result<(), PersistenceError> {
    let payload_json = serde_json::to_string(record)?;
    let status = serde_json::to_string(&record.status)?
        .trim_matches('\"')
        .to_string();

    tx.execute(
        "INSERT INTO ponds (
            pond_id,
            farm_id,
            population,
            status,
            payload_json,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(pond_id) DO UPDATE SET
            farm_id = excluded.farm_id,
            population = excluded.population,
            status = excluded.status,
            payload_json = excluded.payload_json,
            updated_at = excluded.updated_at",
        params![
            record.pond_id.as_str(),
            record.farm_id.as_str(),
            record.population,
            status,
            payload_json,
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(())
}

fn load_events<T: serde::de::DeserializeOwned>(
    conn: &Connection,
    table: &str,
    pond_id: &str,
) -> Result<Vec<T>, PersistenceError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT payload_json FROM {table} WHERE pond_id = ?1 ORDER BY sequence ASC"
    ))?;
    let rows = stmt.query_map(params![pond_id], |row| row.get::<_, String>(0))?;

    let mut events = Vec::new();
    for row in rows {
        events.push(serde_json::from_str::<T>(&row?)?);
    }
    Ok(events)
}

/// Event ids carry the per-pond ledger sequence as their last segment.
fn event_sequence(event_id: &str) -> u64 {
    event_id
        .rsplit(':')
        .next()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(0)
}

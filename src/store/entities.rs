//! SQLite-backed storage for the three entity kinds.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::dex::types::{Identifier, Pokemon, PokemonRecord};
use crate::error::{DexError, Result};

/// Schema for the entity tables. Type and ability names are lowercase at
/// rest and globally unique; the stats column holds a JSON object or NULL.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS types (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS abilities (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS pokemon (
    id INTEGER PRIMARY KEY,
    external_id INTEGER NOT NULL UNIQUE,
    name TEXT NOT NULL UNIQUE,
    height INTEGER,
    weight INTEGER,
    sprite_url TEXT,
    stats TEXT,
    synced_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS pokemon_types (
    pokemon_id INTEGER NOT NULL REFERENCES pokemon(id) ON DELETE CASCADE,
    type_id INTEGER NOT NULL REFERENCES types(id),
    PRIMARY KEY (pokemon_id, type_id)
);

CREATE TABLE IF NOT EXISTS pokemon_abilities (
    pokemon_id INTEGER NOT NULL REFERENCES pokemon(id) ON DELETE CASCADE,
    ability_id INTEGER NOT NULL REFERENCES abilities(id),
    PRIMARY KEY (pokemon_id, ability_id)
);

CREATE INDEX IF NOT EXISTS idx_pokemon_types_type ON pokemon_types(type_id);
CREATE INDEX IF NOT EXISTS idx_pokemon_abilities_ability ON pokemon_abilities(ability_id);
"#;

/// Local filter over stored Pokémon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreFilter {
  All,
  /// Lowercase type name.
  ByType(String),
  /// Lowercase ability name.
  ByAbility(String),
}

/// One page of query results plus the unpaged total.
#[derive(Debug, Clone)]
pub struct PageOf<T> {
  pub entries: Vec<T>,
  pub total: usize,
}

pub struct EntityStore {
  conn: Mutex<Connection>,
}

impl EntityStore {
  /// Open or create the store at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| DexError::Storage(format!("failed to create data directory: {}", e)))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| DexError::Storage(format!("failed to open {}: {}", path.display(), e)))?;
    Self::from_connection(conn)
  }

  /// In-memory store, used by tests.
  pub fn open_in_memory() -> Result<Self> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| DexError::Storage(format!("lock poisoned: {}", e)))
  }

  /// Lookup by the identifier's key kind: external id or lowercase name.
  pub fn lookup(&self, ident: &Identifier) -> Result<Option<Pokemon>> {
    match ident {
      Identifier::ExternalId(id) => self.pokemon_by_external_id(*id),
      Identifier::Name(name) => self.pokemon_by_name(name),
    }
  }

  pub fn pokemon_by_name(&self, name: &str) -> Result<Option<Pokemon>> {
    let conn = self.lock()?;
    Self::load_pokemon(&conn, "name = ?", params![name.to_lowercase()])
  }

  pub fn pokemon_by_external_id(&self, external_id: i64) -> Result<Option<Pokemon>> {
    let conn = self.lock()?;
    Self::load_pokemon(&conn, "external_id = ?", params![external_id])
  }

  /// Update-or-create a Pokémon by the key kind the caller looked it up
  /// with, then replace both relation sets wholesale. Runs in a single
  /// transaction so no reader observes stale relations against fresh
  /// scalars.
  pub fn upsert_pokemon(&self, key: &Identifier, rec: &PokemonRecord) -> Result<Pokemon> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    let stats_json = serde_json::to_string(&rec.stats)?;
    let existing: Option<i64> = match key {
      Identifier::Name(name) => tx
        .query_row("SELECT id FROM pokemon WHERE name = ?", params![name], |r| {
          r.get(0)
        })
        .optional()?,
      Identifier::ExternalId(id) => tx
        .query_row(
          "SELECT id FROM pokemon WHERE external_id = ?",
          params![id],
          |r| r.get(0),
        )
        .optional()?,
    };

    let row_id = match existing {
      Some(row_id) => {
        tx.execute(
          "UPDATE pokemon
           SET external_id = ?, name = ?, height = ?, weight = ?,
               sprite_url = ?, stats = ?, synced_at = datetime('now')
           WHERE id = ?",
          params![
            rec.external_id,
            rec.name,
            rec.height,
            rec.weight,
            rec.sprite_url,
            stats_json,
            row_id
          ],
        )?;
        row_id
      }
      None => {
        tx.execute(
          "INSERT INTO pokemon (external_id, name, height, weight, sprite_url, stats)
           VALUES (?, ?, ?, ?, ?, ?)",
          params![
            rec.external_id,
            rec.name,
            rec.height,
            rec.weight,
            rec.sprite_url,
            stats_json
          ],
        )?;
        tx.last_insert_rowid()
      }
    };

    // Replace, never merge, the relation sets.
    tx.execute(
      "DELETE FROM pokemon_types WHERE pokemon_id = ?",
      params![row_id],
    )?;
    for type_name in &rec.types {
      let type_id = Self::ensure_named(&tx, "types", type_name)?;
      tx.execute(
        "INSERT OR IGNORE INTO pokemon_types (pokemon_id, type_id) VALUES (?, ?)",
        params![row_id, type_id],
      )?;
    }

    tx.execute(
      "DELETE FROM pokemon_abilities WHERE pokemon_id = ?",
      params![row_id],
    )?;
    for ability_name in &rec.abilities {
      let ability_id = Self::ensure_named(&tx, "abilities", ability_name)?;
      tx.execute(
        "INSERT OR IGNORE INTO pokemon_abilities (pokemon_id, ability_id) VALUES (?, ?)",
        params![row_id, ability_id],
      )?;
    }

    tx.commit()?;

    let conn = &*conn;
    Self::load_pokemon(conn, "id = ?", params![row_id])?
      .ok_or_else(|| DexError::Storage("upserted row vanished".into()))
  }

  /// Lookup-by-name, create-if-absent. Idempotent and order-independent.
  pub fn ensure_type(&self, name: &str) -> Result<i64> {
    let conn = self.lock()?;
    Self::ensure_named(&conn, "types", &name.to_lowercase())
  }

  pub fn ensure_ability(&self, name: &str) -> Result<i64> {
    let conn = self.lock()?;
    Self::ensure_named(&conn, "abilities", &name.to_lowercase())
  }

  /// All known type names, sorted.
  pub fn type_names(&self) -> Result<Vec<String>> {
    self.all_names("types")
  }

  /// All known ability names, sorted.
  pub fn ability_names(&self) -> Result<Vec<String>> {
    self.all_names("abilities")
  }

  pub fn pokemon_count(&self) -> Result<usize> {
    let conn = self.lock()?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM pokemon", [], |r| r.get(0))?;
    Ok(count as usize)
  }

  /// Page of Pokémon matching the filter, ordered by external id.
  pub fn query_pokemon(
    &self,
    filter: &StoreFilter,
    page: usize,
    page_size: usize,
  ) -> Result<PageOf<Pokemon>> {
    let conn = self.lock()?;
    let (join, where_clause, bind): (&str, &str, Vec<String>) = match filter {
      StoreFilter::All => ("", "", vec![]),
      StoreFilter::ByType(name) => (
        "JOIN pokemon_types pt ON pt.pokemon_id = p.id
         JOIN types t ON t.id = pt.type_id",
        "WHERE t.name = ?",
        vec![name.clone()],
      ),
      StoreFilter::ByAbility(name) => (
        "JOIN pokemon_abilities pa ON pa.pokemon_id = p.id
         JOIN abilities a ON a.id = pa.ability_id",
        "WHERE a.name = ?",
        vec![name.clone()],
      ),
    };

    let count_sql = format!("SELECT COUNT(DISTINCT p.id) FROM pokemon p {} {}", join, where_clause);
    let total: i64 = conn.query_row(
      &count_sql,
      rusqlite::params_from_iter(bind.iter()),
      |r| r.get(0),
    )?;

    // Page numbers come from unvalidated user input; a pathological value
    // must yield an empty page, never overflow.
    let offset = page.saturating_sub(1).saturating_mul(page_size);
    let page_sql = format!(
      "SELECT DISTINCT p.id FROM pokemon p {} {} ORDER BY p.external_id LIMIT ? OFFSET ?",
      join, where_clause
    );
    let mut stmt = conn.prepare(&page_sql)?;
    let mut bind_all: Vec<rusqlite::types::Value> = bind
      .into_iter()
      .map(rusqlite::types::Value::Text)
      .collect();
    bind_all.push(rusqlite::types::Value::Integer(page_size as i64));
    bind_all.push(rusqlite::types::Value::Integer(
      i64::try_from(offset).unwrap_or(i64::MAX),
    ));

    let ids: Vec<i64> = stmt
      .query_map(rusqlite::params_from_iter(bind_all), |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?;

    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
      if let Some(p) = Self::load_pokemon(&conn, "id = ?", params![id])? {
        entries.push(p);
      }
    }

    Ok(PageOf {
      entries,
      total: total as usize,
    })
  }

  /// When the record keyed by this identifier was last synced from the
  /// remote source.
  pub fn synced_at(&self, ident: &Identifier) -> Result<Option<DateTime<Utc>>> {
    let conn = self.lock()?;
    let raw: Option<String> = match ident {
      Identifier::Name(name) => conn
        .query_row(
          "SELECT synced_at FROM pokemon WHERE name = ?",
          params![name],
          |r| r.get(0),
        )
        .optional()?,
      Identifier::ExternalId(id) => conn
        .query_row(
          "SELECT synced_at FROM pokemon WHERE external_id = ?",
          params![id],
          |r| r.get(0),
        )
        .optional()?,
    };
    raw.map(|s| parse_datetime(&s)).transpose()
  }

  fn all_names(&self, table: &str) -> Result<Vec<String>> {
    let conn = self.lock()?;
    let mut stmt = conn.prepare(&format!("SELECT name FROM {} ORDER BY name", table))?;
    let names = stmt
      .query_map([], |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?;
    Ok(names)
  }

  fn ensure_named(conn: &Connection, table: &str, name: &str) -> Result<i64> {
    let existing: Option<i64> = conn
      .query_row(
        &format!("SELECT id FROM {} WHERE name = ?", table),
        params![name],
        |r| r.get(0),
      )
      .optional()?;
    if let Some(id) = existing {
      return Ok(id);
    }
    conn.execute(
      &format!("INSERT INTO {} (name) VALUES (?)", table),
      params![name],
    )?;
    Ok(conn.last_insert_rowid())
  }

  fn load_pokemon<P: rusqlite::Params>(
    conn: &Connection,
    where_clause: &str,
    bind: P,
  ) -> Result<Option<Pokemon>> {
    let sql = format!(
      "SELECT id, external_id, name, height, weight, sprite_url, stats
       FROM pokemon WHERE {}",
      where_clause
    );
    let row: Option<(i64, i64, String, Option<i64>, Option<i64>, Option<String>, Option<String>)> =
      conn
        .query_row(&sql, bind, |r| {
          Ok((
            r.get(0)?,
            r.get(1)?,
            r.get(2)?,
            r.get(3)?,
            r.get(4)?,
            r.get(5)?,
            r.get(6)?,
          ))
        })
        .optional()?;

    let Some((row_id, external_id, name, height, weight, sprite_url, stats_json)) = row else {
      return Ok(None);
    };

    let stats: Option<BTreeMap<String, i64>> = stats_json
      .map(|s| serde_json::from_str(&s))
      .transpose()?;

    let types = Self::relation_names(
      conn,
      "SELECT t.name FROM types t
       JOIN pokemon_types pt ON pt.type_id = t.id
       WHERE pt.pokemon_id = ? ORDER BY t.name",
      row_id,
    )?;
    let abilities = Self::relation_names(
      conn,
      "SELECT a.name FROM abilities a
       JOIN pokemon_abilities pa ON pa.ability_id = a.id
       WHERE pa.pokemon_id = ? ORDER BY a.name",
      row_id,
    )?;

    Ok(Some(Pokemon {
      external_id,
      name,
      height,
      weight,
      sprite_url,
      stats,
      types,
      abilities,
    }))
  }

  fn relation_names(conn: &Connection, sql: &str, row_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let names = stmt
      .query_map(params![row_id], |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?;
    Ok(names)
  }
}

/// Parse a datetime string from SQLite format ("YYYY-MM-DD HH:MM:SS").
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| DexError::Storage(format!("failed to parse datetime '{}': {}", s, e)))
}

//! Generic document CRUD over SQLite collections.
//!
//! # Responsibility
//! - Read/write serde documents stored as JSON bodies keyed by `uid`.
//! - Manage collections and JSON-path indexes for schema migrations.
//!
//! # Invariants
//! - Each call performs at most one statement against the store; no retries.
//! - `read_one` returns `Ok(None)` when nothing matches.
//! - `save` fails with `StoreError::Integrity` when the stored identity differs
//!   from the client-generated identity.
//! - Every call honors the session deadline before and during execution.

use super::deadline::InterruptGuard;
use super::filter::{FieldPath, Filter, FindOptions};
use super::{classify_sqlite, Deadline, StoreError, StoreResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Persisted business object living in exactly one collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Collection (table) name.
    const COLLECTION: &'static str;

    /// Client-generated, immutable identity.
    fn uid(&self) -> Uuid;
}

/// Index over one or more JSON fields of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub collection: &'static str,
    pub fields: &'static [&'static str],
    pub unique: bool,
    /// Restricts the index to documents whose `deleted_at` is null.
    pub active_only: bool,
}

impl IndexSpec {
    fn create_sql(&self) -> String {
        let columns = self
            .fields
            .iter()
            .map(|field| FieldPath::trusted(field).json_expr())
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "CREATE {}INDEX IF NOT EXISTS \"{}\" ON \"{}\" ({columns})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.collection,
        );
        if self.active_only {
            sql.push_str(" WHERE json_extract(body, '$.deleted_at') IS NULL");
        }
        sql.push(';');
        sql
    }
}

/// Session-bound handle over a connection or an open transaction.
pub struct DocumentStore<'conn> {
    conn: &'conn Connection,
    deadline: Deadline,
}

impl<'conn> DocumentStore<'conn> {
    pub fn new(conn: &'conn Connection, deadline: Deadline) -> Self {
        Self { conn, deadline }
    }

    pub fn deadline(&self) -> &Deadline {
        &self.deadline
    }

    /// Returns the first document matching `filter`, or `None`.
    pub fn read_one<D: Document>(&self, filter: &Filter) -> StoreResult<Option<D>> {
        let options = FindOptions::new().limit(1);
        let mut found = self.read_many::<D>(filter, &options)?;
        Ok(if found.is_empty() {
            None
        } else {
            Some(found.swap_remove(0))
        })
    }

    /// Returns all documents matching `filter` in `options` order.
    pub fn read_many<D: Document>(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<D>> {
        let mut sql = format!("SELECT body FROM \"{}\" WHERE ", D::COLLECTION);
        let mut binds: Vec<Value> = Vec::new();
        filter.write_sql(&mut sql, &mut binds);
        options.write_sql(&mut sql, &mut binds);

        let bodies = self.run(D::COLLECTION, |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(binds))?;
            let mut bodies = Vec::new();
            while let Some(row) = rows.next()? {
                bodies.push(row.get::<_, String>(0)?);
            }
            Ok(bodies)
        })?;

        bodies
            .iter()
            .map(|body| decode::<D>(body))
            .collect::<StoreResult<Vec<_>>>()
    }

    pub fn count<D: Document>(&self, filter: &Filter) -> StoreResult<i64> {
        let mut sql = format!("SELECT COUNT(*) FROM \"{}\" WHERE ", D::COLLECTION);
        let mut binds: Vec<Value> = Vec::new();
        filter.write_sql(&mut sql, &mut binds);

        self.run(D::COLLECTION, |conn| {
            conn.query_row(&sql, params_from_iter(binds), |row| row.get(0))
        })
    }

    /// Inserts a new document and verifies the identity the store recorded.
    pub fn save<D: Document>(&self, document: &D) -> StoreResult<()> {
        let uid = document.uid();
        let body = encode(document)?;
        let sql = format!(
            "INSERT INTO \"{}\" (uid, body) VALUES (?1, ?2) RETURNING uid;",
            D::COLLECTION
        );

        let stored: String = self.run(D::COLLECTION, |conn| {
            conn.query_row(&sql, params![uid.to_string(), body], |row| row.get(0))
        })?;

        if stored != uid.to_string() {
            return Err(StoreError::Integrity {
                collection: D::COLLECTION,
                expected: uid,
                actual: stored,
            });
        }

        debug!(
            "event=doc_save module=db status=ok collection={} uid={}",
            D::COLLECTION,
            uid
        );
        Ok(())
    }

    /// Replaces the stored document with the same identity.
    pub fn update<D: Document>(&self, document: &D) -> StoreResult<()> {
        if !self.update_if(document, &Filter::All)? {
            return Err(StoreError::NotFound {
                collection: D::COLLECTION,
                uid: document.uid(),
            });
        }
        Ok(())
    }

    /// Replaces the stored document only while `guard` still matches it.
    ///
    /// Returns `false` when the identity is absent or the guard rejected it.
    pub fn update_if<D: Document>(&self, document: &D, guard: &Filter) -> StoreResult<bool> {
        let uid = document.uid();
        let body = encode(document)?;
        let mut sql = format!(
            "UPDATE \"{}\" SET body = ? WHERE uid = ? AND ",
            D::COLLECTION
        );
        let mut binds = vec![Value::Text(body), Value::Text(uid.to_string())];
        guard.write_sql(&mut sql, &mut binds);

        let changed = self.run(D::COLLECTION, |conn| {
            conn.execute(&sql, params_from_iter(binds))
        })?;

        debug!(
            "event=doc_update module=db status={} collection={} uid={}",
            if changed > 0 { "ok" } else { "noop" },
            D::COLLECTION,
            uid
        );
        Ok(changed > 0)
    }

    /// Writes only `fields` of `document` while `guard` still matches the
    /// stored body; every other field keeps its stored value.
    ///
    /// Fields absent from the serialized document are skipped.
    pub fn update_fields_if<D: Document>(
        &self,
        document: &D,
        fields: &[FieldPath],
        guard: &Filter,
    ) -> StoreResult<bool> {
        let uid = document.uid();
        let body = serde_json::to_value(document).map_err(|source| StoreError::Serialization {
            collection: D::COLLECTION,
            source,
        })?;

        let mut sql = format!("UPDATE \"{}\" SET body = json_set(body", D::COLLECTION);
        let mut binds = Vec::new();
        for field in fields {
            let pointer = format!("/{}", field.as_str().replace('.', "/"));
            if let Some(value) = body.pointer(&pointer) {
                sql.push_str(&format!(", '$.{field}', json(?)"));
                binds.push(Value::Text(value.to_string()));
            }
        }
        if binds.is_empty() {
            return Ok(false);
        }
        sql.push_str(") WHERE uid = ? AND ");
        binds.push(Value::Text(uid.to_string()));
        guard.write_sql(&mut sql, &mut binds);

        let changed = self.run(D::COLLECTION, |conn| {
            conn.execute(&sql, params_from_iter(binds))
        })?;

        debug!(
            "event=doc_patch module=db status={} collection={} uid={}",
            if changed > 0 { "ok" } else { "noop" },
            D::COLLECTION,
            uid
        );
        Ok(changed > 0)
    }

    /// Removes the stored document with the same identity.
    pub fn delete<D: Document>(&self, document: &D) -> StoreResult<()> {
        let uid = document.uid();
        let sql = format!("DELETE FROM \"{}\" WHERE uid = ?1;", D::COLLECTION);
        let changed = self.run(D::COLLECTION, |conn| {
            conn.execute(&sql, [uid.to_string()])
        })?;

        if changed == 0 {
            return Err(StoreError::NotFound {
                collection: D::COLLECTION,
                uid,
            });
        }

        debug!(
            "event=doc_delete module=db status=ok collection={} uid={}",
            D::COLLECTION,
            uid
        );
        Ok(())
    }

    /// Removes every document matching `filter`; returns the removed count.
    pub fn delete_many<D: Document>(&self, filter: &Filter) -> StoreResult<usize> {
        let mut sql = format!("DELETE FROM \"{}\" WHERE ", D::COLLECTION);
        let mut binds: Vec<Value> = Vec::new();
        filter.write_sql(&mut sql, &mut binds);

        self.run(D::COLLECTION, |conn| {
            conn.execute(&sql, params_from_iter(binds))
        })
    }

    /// Atomically adds `delta` to an integer field; a missing field counts as 0.
    ///
    /// Returns `false` when no document has identity `uid`.
    pub fn increment<D: Document>(
        &self,
        uid: Uuid,
        field: &FieldPath,
        delta: i64,
    ) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE \"{collection}\"
             SET body = json_set(body, '$.{field}', COALESCE({expr}, 0) + ?1)
             WHERE uid = ?2;",
            collection = D::COLLECTION,
            expr = field.json_expr(),
        );
        let changed = self.run(D::COLLECTION, |conn| {
            conn.execute(&sql, params![delta, uid.to_string()])
        })?;
        Ok(changed > 0)
    }

    pub fn create_collection(&self, name: &'static str) -> StoreResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{name}\" (
                uid TEXT PRIMARY KEY NOT NULL,
                body TEXT NOT NULL CHECK (json_valid(body))
            );"
        );
        self.run(name, |conn| conn.execute_batch(&sql))
    }

    pub fn drop_collection(&self, name: &'static str) -> StoreResult<()> {
        let sql = format!("DROP TABLE IF EXISTS \"{name}\";");
        self.run(name, |conn| conn.execute_batch(&sql))
    }

    pub fn collection_exists(&self, name: &'static str) -> StoreResult<bool> {
        let exists: i64 = self.run(name, |conn| {
            conn.query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM sqlite_master
                    WHERE type = 'table' AND name = ?1
                );",
                [name],
                |row| row.get(0),
            )
        })?;
        Ok(exists == 1)
    }

    pub fn create_index(&self, spec: &IndexSpec) -> StoreResult<()> {
        let sql = spec.create_sql();
        self.run(spec.collection, |conn| conn.execute_batch(&sql))
    }

    pub fn drop_index(&self, spec: &IndexSpec) -> StoreResult<()> {
        let sql = format!("DROP INDEX IF EXISTS \"{}\";", spec.name);
        self.run(spec.collection, |conn| conn.execute_batch(&sql))
    }

    fn run<T>(
        &self,
        collection: &'static str,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        self.deadline.check()?;
        let _guard = InterruptGuard::install(self.conn, &self.deadline);
        op(self.conn).map_err(|err| classify_sqlite(err, collection, &self.deadline))
    }
}

fn encode<D: Document>(document: &D) -> StoreResult<String> {
    serde_json::to_string(document).map_err(|source| StoreError::Serialization {
        collection: D::COLLECTION,
        source,
    })
}

fn decode<D: Document>(body: &str) -> StoreResult<D> {
    serde_json::from_str(body).map_err(|source| StoreError::Serialization {
        collection: D::COLLECTION,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::IndexSpec;

    #[test]
    fn active_only_unique_index_is_partial() {
        let spec = IndexSpec {
            name: "posts_slug_active",
            collection: "posts",
            fields: &["slug"],
            unique: true,
            active_only: true,
        };
        assert_eq!(
            spec.create_sql(),
            "CREATE UNIQUE INDEX IF NOT EXISTS \"posts_slug_active\" ON \"posts\" \
             (json_extract(body, '$.slug')) WHERE json_extract(body, '$.deleted_at') IS NULL;"
        );
    }
}

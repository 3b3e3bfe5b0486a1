//! SQLite implementation of the Store trait.
//!
//! The durable backend. Uses rusqlite with bundled SQLite; condition lists
//! are stored as canonical CBOR.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use authorizer_core::{
    decode_conditions, encode_conditions, Account, ChangeBatch, Condition, Mutation, Operation,
    Permission, PermissionKey,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{CommitReport, GrantResult, PermissionReader, RevokeResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened permission store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("mutex poisoned: {e}")))
    }

    /// Execute an operation on the connection.
    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute an operation that needs mutable access.
    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }

    fn query_permissions(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<Permission>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(params, |row| {
                    Ok((
                        row.get::<_, Vec<u8>>("who")?,
                        row.get::<_, Vec<u8>>("target")?,
                        row.get::<_, Vec<u8>>("what")?,
                        row.get::<_, Vec<u8>>("conditions")?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter()
                .map(|(who, target, what, conditions)| -> Result<Permission> {
                    Ok(Permission::new(
                        row_to_key(&who, &target, &what)?,
                        decode_conditions(&conditions)?,
                    ))
                })
                .collect()
        })
    }
}

fn row_to_key(who: &[u8], target: &[u8], what: &[u8]) -> Result<PermissionKey> {
    let invalid = |column: &str, len: usize| {
        StoreError::InvalidData(format!("{column} column has {len} bytes"))
    };

    let who: [u8; 20] = who.try_into().map_err(|_| invalid("who", who.len()))?;
    let target: [u8; 20] = target
        .try_into()
        .map_err(|_| invalid("target", target.len()))?;
    let what: [u8; 4] = what.try_into().map_err(|_| invalid("what", what.len()))?;

    Ok(PermissionKey::new(
        Account::from_bytes(who),
        Account::from_bytes(target),
        Operation::from_bytes(what),
    ))
}

fn grant_in(
    conn: &Connection,
    key: &PermissionKey,
    conditions: &[Condition],
) -> Result<GrantResult> {
    let encoded = encode_conditions(conditions)?;
    let existed = exists_in(conn, key)?;

    conn.execute(
        "INSERT INTO permissions (who, target, what, conditions, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (who, target, what)
         DO UPDATE SET conditions = excluded.conditions, updated_at = excluded.updated_at",
        params![
            key.who.as_bytes().as_slice(),
            key.target.as_bytes().as_slice(),
            key.what.as_bytes().as_slice(),
            encoded,
            now_millis(),
        ],
    )?;

    Ok(if existed {
        GrantResult::Replaced
    } else {
        GrantResult::Created
    })
}

fn revoke_in(conn: &Connection, key: &PermissionKey) -> Result<RevokeResult> {
    let deleted = conn.execute(
        "DELETE FROM permissions WHERE who = ?1 AND target = ?2 AND what = ?3",
        params![
            key.who.as_bytes().as_slice(),
            key.target.as_bytes().as_slice(),
            key.what.as_bytes().as_slice(),
        ],
    )?;

    Ok(if deleted > 0 {
        RevokeResult::Revoked
    } else {
        RevokeResult::Absent
    })
}

fn exists_in(conn: &Connection, key: &PermissionKey) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM permissions WHERE who = ?1 AND target = ?2 AND what = ?3)",
        params![
            key.who.as_bytes().as_slice(),
            key.target.as_bytes().as_slice(),
            key.what.as_bytes().as_slice(),
        ],
        |row| row.get(0),
    )?;
    Ok(exists)
}

impl PermissionReader for SqliteStore {
    fn get_permission(&self, key: &PermissionKey) -> Result<Option<Vec<Condition>>> {
        self.with_conn(|conn| {
            let encoded: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT conditions FROM permissions WHERE who = ?1 AND target = ?2 AND what = ?3",
                    params![
                        key.who.as_bytes().as_slice(),
                        key.target.as_bytes().as_slice(),
                        key.what.as_bytes().as_slice(),
                    ],
                    |row| row.get(0),
                )
                .optional()?;

            encoded
                .map(|bytes| decode_conditions(&bytes).map_err(StoreError::from))
                .transpose()
        })
    }

    fn is_granted(&self, key: &PermissionKey) -> Result<bool> {
        self.with_conn(|conn| exists_in(conn, key))
    }
}

impl Store for SqliteStore {
    fn grant(&self, key: &PermissionKey, conditions: &[Condition]) -> Result<GrantResult> {
        self.with_conn(|conn| grant_in(conn, key, conditions))
    }

    fn revoke(&self, key: &PermissionKey) -> Result<RevokeResult> {
        self.with_conn(|conn| revoke_in(conn, key))
    }

    fn commit(&self, batch: &ChangeBatch) -> Result<CommitReport> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut report = CommitReport::default();

            for mutation in batch {
                match mutation {
                    Mutation::Grant { key, conditions } => {
                        report.record_grant(grant_in(&tx, key, conditions)?);
                    }
                    Mutation::Revoke { key } => {
                        report.record_revoke(revoke_in(&tx, key)?);
                    }
                }
            }

            tx.commit()?;
            tracing::debug!(mutations = batch.len(), ?report, "committed batch to sqlite store");
            Ok(report)
        })
    }

    fn permissions_on(&self, target: &Account) -> Result<Vec<Permission>> {
        self.query_permissions(
            "SELECT who, target, what, conditions FROM permissions
             WHERE target = ?1 ORDER BY who, target, what",
            &[&target.as_bytes().as_slice()],
        )
    }

    fn permissions_of(&self, who: &Account, target: &Account) -> Result<Vec<Permission>> {
        self.query_permissions(
            "SELECT who, target, what, conditions FROM permissions
             WHERE who = ?1 AND target = ?2 ORDER BY who, target, what",
            &[&who.as_bytes().as_slice(), &target.as_bytes().as_slice()],
        )
    }

    fn count(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM permissions", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}

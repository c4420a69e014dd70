//! libsql-backed store.
//!
//! Supports multiple backends:
//! - Local SQLite file: `path/to/db.sqlite` or `file:path` or `sqlite://path`
//! - In-memory: `:memory:`
//! - Remote Turso: `libsql://...` or `https://...` (requires TURSO_AUTH_TOKEN env var)
//!
//! [`SqlStore`] implements the permission store, the role store and the
//! dashboard lookup over one connection. Grants are a single
//! `INSERT .. ON CONFLICT DO UPDATE` against a unique key, so concurrent
//! grants for the same principal converge without engine-side locking.

use libsql::params::IntoParams;
use libsql::{Builder, Connection, Database, Row, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::BoxFuture;
use crate::action::ActionSet;
use crate::error::{Error, Result};
use crate::principal::{Principal, PrincipalKind};
use crate::store::{Assignment, PermissionStore, Role, RoleChange, RoleDefinition, RoleStore};
use crate::validator::{Dashboard, DashboardLookup};

/// Connect to the database.
///
/// # URL formats
/// - Local file: `mydata.db`, `file:path/to/db.sqlite`, `sqlite://path`
/// - In-memory: `:memory:`
/// - Remote Turso: `libsql://your-db.turso.io` (requires `TURSO_AUTH_TOKEN` env var)
pub async fn connect(url: &str) -> Result<Database> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        let token = std::env::var("TURSO_AUTH_TOKEN")
            .map_err(|_| Error::Config("TURSO_AUTH_TOKEN not set for remote database".into()))?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        // Local file - strip sqlite:// or file: prefix if present
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        Builder::new_local(path).build().await?
    };

    Ok(db)
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dashboard (
    id INTEGER PRIMARY KEY,
    org_id INTEGER NOT NULL,
    uid TEXT NOT NULL,
    title TEXT NOT NULL,
    is_folder INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS resource_permission (
    kind TEXT NOT NULL,
    org_id INTEGER NOT NULL,
    resource_id TEXT NOT NULL,
    principal_kind TEXT NOT NULL,
    principal_id TEXT NOT NULL,
    level TEXT NOT NULL,
    created TEXT NOT NULL,
    updated TEXT NOT NULL,
    UNIQUE (kind, org_id, resource_id, principal_kind, principal_id)
);
CREATE INDEX IF NOT EXISTS resource_permission_principal
    ON resource_permission (kind, org_id, principal_kind, principal_id);
CREATE TABLE IF NOT EXISTS builtin_role (
    name TEXT PRIMARY KEY,
    uid TEXT NOT NULL,
    role_group TEXT NOT NULL,
    actions TEXT NOT NULL,
    updated TEXT NOT NULL
);
";

const ASSIGNMENT_COLUMNS: &str =
    "kind, org_id, resource_id, principal_kind, principal_id, level, created, updated";

/// Store backed by a single libsql connection.
pub struct SqlStore {
    // Keeps in-memory databases alive for as long as the store.
    _db: Database,
    conn: Connection,
}

impl SqlStore {
    /// Connect to `url` and create the schema if needed.
    pub async fn open(url: &str) -> Result<Self> {
        let db = connect(url).await?;
        let conn = db.connect()?;
        let store = Self { _db: db, conn };
        store.migrate().await?;
        info!(url, "permission store ready");
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA).await?;
        Ok(())
    }

    /// Insert or replace a dashboard row. The dashboard table belongs to the
    /// dashboard subsystem; this exists for seeding and tests.
    pub async fn insert_dashboard(&self, dashboard: &Dashboard) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO dashboard (id, org_id, uid, title, is_folder)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    dashboard.id,
                    dashboard.org_id,
                    dashboard.uid.as_str(),
                    dashboard.title.as_str(),
                    i64::from(dashboard.is_folder)
                ],
            )
            .await?;
        Ok(())
    }

    pub async fn delete_dashboard(&self, org_id: i64, id: i64) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM dashboard WHERE org_id = ?1 AND id = ?2",
                params![org_id, id],
            )
            .await?;
        Ok(())
    }

    async fn collect_assignments(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<Vec<Assignment>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(assignment_from_row(&row)?);
        }
        Ok(out)
    }
}

fn parse_timestamp(raw: &str) -> Result<jiff::Timestamp> {
    raw.parse()
        .map_err(|e| Error::Store(format!("invalid timestamp {raw:?}: {e}")))
}

fn assignment_from_row(row: &Row) -> Result<Assignment> {
    let principal_kind: String = row.get(3)?;
    let principal_kind: PrincipalKind = principal_kind
        .parse()
        .map_err(|_| Error::Store(format!("invalid principal category {principal_kind:?}")))?;
    Ok(Assignment {
        kind: row.get(0)?,
        org_id: row.get(1)?,
        resource_id: row.get(2)?,
        principal_kind,
        principal_id: row.get(4)?,
        level: row.get(5)?,
        created: parse_timestamp(&row.get::<String>(6)?)?,
        updated: parse_timestamp(&row.get::<String>(7)?)?,
    })
}

fn role_from_row(row: &Row) -> Result<Role> {
    let uid: String = row.get(1)?;
    let actions: String = row.get(3)?;
    Ok(Role {
        name: row.get(0)?,
        uid: Uuid::parse_str(&uid).map_err(|e| Error::Store(format!("invalid role uid: {e}")))?,
        group: row.get(2)?,
        actions: serde_json::from_str::<ActionSet>(&actions)?,
        updated: parse_timestamp(&row.get::<String>(4)?)?,
    })
}

impl PermissionStore for SqlStore {
    fn set_assignment<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        resource_id: &'a str,
        principal: &'a Principal,
        level: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Assignment>>> {
        Box::pin(async move {
            let principal_kind = principal.kind().as_str();
            let principal_id = principal.id();

            let Some(level) = level else {
                let removed = self
                    .conn
                    .execute(
                        "DELETE FROM resource_permission
                         WHERE kind = ?1 AND org_id = ?2 AND resource_id = ?3
                           AND principal_kind = ?4 AND principal_id = ?5",
                        params![kind, org_id, resource_id, principal_kind, principal_id.as_str()],
                    )
                    .await?;
                debug!(kind, org_id, resource_id, %principal, removed, "assignment removed");
                return Ok(None);
            };

            let now = jiff::Timestamp::now().to_string();
            // `updated` only moves when the level actually changes.
            let sql = format!(
                "INSERT INTO resource_permission ({ASSIGNMENT_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                 ON CONFLICT (kind, org_id, resource_id, principal_kind, principal_id)
                 DO UPDATE SET
                     updated = CASE WHEN resource_permission.level = excluded.level
                               THEN resource_permission.updated ELSE excluded.updated END,
                     level = excluded.level
                 RETURNING {ASSIGNMENT_COLUMNS}"
            );
            let mut rows = self
                .conn
                .query(
                    &sql,
                    params![
                        kind,
                        org_id,
                        resource_id,
                        principal_kind,
                        principal_id.as_str(),
                        level,
                        now.as_str()
                    ],
                )
                .await?;
            let row = rows
                .next()
                .await?
                .ok_or_else(|| Error::Store("upsert returned no row".into()))?;
            Ok(Some(assignment_from_row(&row)?))
        })
    }

    fn list_assignments<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        resource_id: &'a str,
    ) -> BoxFuture<'a, Result<Vec<Assignment>>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM resource_permission
                 WHERE kind = ?1 AND org_id = ?2 AND resource_id = ?3
                 ORDER BY principal_kind, principal_id"
            );
            self.collect_assignments(&sql, params![kind, org_id, resource_id])
                .await
        })
    }

    fn list_by_principal<'a>(
        &'a self,
        kind: &'a str,
        org_id: i64,
        principal: &'a Principal,
    ) -> BoxFuture<'a, Result<Vec<Assignment>>> {
        Box::pin(async move {
            let sql = format!(
                "SELECT {ASSIGNMENT_COLUMNS} FROM resource_permission
                 WHERE kind = ?1 AND org_id = ?2 AND principal_kind = ?3 AND principal_id = ?4
                 ORDER BY resource_id"
            );
            let principal_id = principal.id();
            self.collect_assignments(
                &sql,
                params![kind, org_id, principal.kind().as_str(), principal_id.as_str()],
            )
            .await
        })
    }
}

impl RoleStore for SqlStore {
    fn create_or_update_role<'a>(
        &'a self,
        role: &'a RoleDefinition,
    ) -> BoxFuture<'a, Result<RoleChange>> {
        Box::pin(async move {
            let actions = serde_json::to_string(&role.actions)?;
            let now = jiff::Timestamp::now().to_string();
            let uid = Uuid::new_v4().to_string();

            let inserted = self
                .conn
                .execute(
                    "INSERT INTO builtin_role (name, uid, role_group, actions, updated)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT (name) DO NOTHING",
                    params![
                        role.name.as_str(),
                        uid.as_str(),
                        role.group.as_str(),
                        actions.as_str(),
                        now.as_str()
                    ],
                )
                .await?;
            if inserted > 0 {
                return Ok(RoleChange::Created);
            }

            let existing = self
                .get_role(&role.name)
                .await?
                .ok_or_else(|| Error::Store(format!("role {:?} vanished", role.name)))?;
            if existing.group == role.group && existing.actions == role.actions {
                return Ok(RoleChange::Unchanged);
            }

            self.conn
                .execute(
                    "UPDATE builtin_role SET role_group = ?2, actions = ?3, updated = ?4
                     WHERE name = ?1",
                    params![
                        role.name.as_str(),
                        role.group.as_str(),
                        actions.as_str(),
                        now.as_str()
                    ],
                )
                .await?;
            Ok(RoleChange::Updated)
        })
    }

    fn get_role<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Option<Role>>> {
        Box::pin(async move {
            let mut rows = self
                .conn
                .query(
                    "SELECT name, uid, role_group, actions, updated FROM builtin_role
                     WHERE name = ?1",
                    params![name],
                )
                .await?;
            match rows.next().await? {
                Some(row) => Ok(Some(role_from_row(&row)?)),
                None => Ok(None),
            }
        })
    }
}

impl DashboardLookup for SqlStore {
    fn get_dashboard(&self, org_id: i64, id: i64) -> BoxFuture<'_, Result<Option<Dashboard>>> {
        Box::pin(async move {
            let mut rows = self
                .conn
                .query(
                    "SELECT id, org_id, uid, title, is_folder FROM dashboard
                     WHERE org_id = ?1 AND id = ?2",
                    params![org_id, id],
                )
                .await?;
            let Some(row) = rows.next().await? else {
                return Ok(None);
            };
            Ok(Some(Dashboard {
                id: row.get(0)?,
                org_id: row.get(1)?,
                uid: row.get(2)?,
                title: row.get(3)?,
                is_folder: row.get::<i64>(4)? != 0,
            }))
        })
    }
}

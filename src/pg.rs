use crate::{
    error::Failure,
    executor::{Applied, Connector, Session},
    profile::{ConnectionProfile, CredentialTable},
    statement::{Param, Statement},
};
use async_trait::async_trait;
use deadpool::managed::{Object, Pool};
use diesel::{
    pg::Pg,
    query_builder::{BoxedSqlQuery, SqlQuery},
    sql_query,
    sql_types::{Date, Double, Integer, Json, Nullable, Text},
    QueryableByName,
};
use diesel_async::{
    pooled_connection::AsyncDieselConnectionManager, scoped_futures::ScopedFutureExt,
    AsyncConnection, AsyncPgConnection, RunQueryDsl,
};
use std::collections::HashMap;

pub type DbPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

type BoundQuery = BoxedSqlQuery<'static, Pg, SqlQuery>;

/// Every statement comes back as one JSON object per row, keyed by column
/// name.
#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = Json)]
    row: serde_json::Value,
}

pub struct RolePools {
    pools: HashMap<String, DbPool>,
}

impl RolePools {
    /// Builds the pools without connecting; connections are opened lazily.
    pub fn connect(credentials: &CredentialTable) -> anyhow::Result<RolePools> {
        let mut pools = HashMap::new();
        for profile in credentials.profiles() {
            let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(profile.url()?);
            let pool = Pool::builder(manager).build()?;
            tracing::debug!(principal = %profile.principal, "built connection pool");
            pools.insert(profile.principal.clone(), pool);
        }
        Ok(RolePools { pools })
    }
}

#[async_trait]
impl Connector for RolePools {
    type Session = PgSession;

    async fn open(&self, profile: &ConnectionProfile) -> Result<PgSession, Failure> {
        let pool = self.pools.get(&profile.principal).ok_or_else(|| {
            Failure::backend(format!("no pool for principal {}", profile.principal))
        })?;
        let conn = pool.get().await.map_err(Failure::backend)?;
        Ok(PgSession(conn))
    }
}

/// A pooled connection; returned to its pool on drop.
pub struct PgSession(Object<AsyncDieselConnectionManager<AsyncPgConnection>>);

fn bind_all(sql: String, params: &[Param]) -> BoundQuery {
    let mut query: BoundQuery = sql_query(sql).into_boxed();
    for param in params.iter().cloned() {
        query = match param {
            Param::Text(s) => query.bind::<Text, _>(s),
            Param::NullableText(s) => query.bind::<Nullable<Text>, _>(s),
            Param::Int(i) => query.bind::<Integer, _>(i),
            Param::Double(f) => query.bind::<Double, _>(f),
            Param::Date(d) => query.bind::<Date, _>(d),
        };
    }
    query
}

fn select_rows(stmt: &Statement) -> String {
    match stmt.order_by() {
        Some(order) => format!(
            "SELECT row_to_json(q) AS row FROM ({}) AS q ORDER BY {order}",
            stmt.sql()
        ),
        None => format!("SELECT row_to_json(q) AS row FROM ({}) AS q", stmt.sql()),
    }
}

fn returned_rows(stmt: &Statement) -> String {
    match stmt.order_by() {
        Some(order) => format!(
            "WITH w AS ({}) SELECT row_to_json(w) AS row FROM w ORDER BY {order}",
            stmt.sql()
        ),
        None => format!("WITH w AS ({}) SELECT row_to_json(w) AS row FROM w", stmt.sql()),
    }
}

#[async_trait]
impl Session for PgSession {
    async fn fetch(&mut self, stmt: &Statement) -> Result<Vec<serde_json::Value>, Failure> {
        let sql = select_rows(stmt);
        let conn: &mut AsyncPgConnection = &mut self.0;

        let rows = bind_all(sql, stmt.params())
            .load::<JsonRow>(conn)
            .await
            .map_err(Failure::backend)?;
        Ok(rows.into_iter().map(|r| r.row).collect())
    }

    async fn apply(&mut self, stmt: &Statement) -> Result<Applied, Failure> {
        let returning = stmt.is_returning();
        let sql = if returning {
            returned_rows(stmt)
        } else {
            stmt.sql().to_string()
        };
        let query = bind_all(sql, stmt.params());
        let conn: &mut AsyncPgConnection = &mut self.0;

        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                if returning {
                    let rows = query.load::<JsonRow>(conn).await?;
                    Ok(Applied {
                        affected: rows.len(),
                        rows: rows.into_iter().map(|r| r.row).collect(),
                    })
                } else {
                    let affected = query.execute(conn).await?;
                    Ok(Applied {
                        affected,
                        rows: Vec::new(),
                    })
                }
            }
            .scope_boxed()
        })
        .await
        .map_err(Failure::backend)
    }
}

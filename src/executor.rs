//! Runs parameterized statements under the credentials of a role.
//!
//! The executor does no business authorization: `role` only picks the
//! connection profile. Callers run [`crate::guard`] checks first.

use crate::{
    error::Failure,
    profile::{ConnectionProfile, CredentialTable, Role},
    statement::Statement,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

/// Result of a committed write. A write that matched nothing is a `NoOp`,
/// never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied(usize),
    NoOp,
}

impl Mutation {
    pub fn from_count(affected: usize) -> Mutation {
        match affected {
            0 => Mutation::NoOp,
            n => Mutation::Applied(n),
        }
    }

    pub fn rows_affected(&self) -> usize {
        match self {
            Mutation::Applied(n) => *n,
            Mutation::NoOp => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<Value>),
    Mutation(Mutation),
}

/// What a write hands back before it is turned into a [`Mutation`].
/// `rows` is only filled for statements marked as returning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    pub affected: usize,
    pub rows: Vec<Value>,
}

/// A connection opened under one profile. Dropping it releases the
/// connection.
#[async_trait]
pub trait Session: Send {
    /// Every record of a read, in the order the database returned them.
    async fn fetch(&mut self, stmt: &Statement) -> Result<Vec<Value>, Failure>;

    /// Runs a write inside a transaction. Commits before returning `Ok`,
    /// rolls back on any error.
    async fn apply(&mut self, stmt: &Statement) -> Result<Applied, Failure>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    type Session: Session;

    async fn open(&self, profile: &ConnectionProfile) -> Result<Self::Session, Failure>;
}

enum Raw {
    Rows(Vec<Value>),
    Applied(Applied),
}

pub struct Executor<C> {
    credentials: CredentialTable,
    connector: C,
}

impl<C: Connector> Executor<C> {
    pub fn new(credentials: CredentialTable, connector: C) -> Self {
        Self {
            credentials,
            connector,
        }
    }

    pub fn credentials(&self) -> &CredentialTable {
        &self.credentials
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub async fn execute(
        &self,
        stmt: &Statement,
        mode: Mode,
        role: Option<Role>,
    ) -> Result<Outcome, Failure> {
        Ok(match self.run(stmt, mode, role).await? {
            Raw::Rows(rows) => Outcome::Rows(rows),
            Raw::Applied(applied) => Outcome::Mutation(Mutation::from_count(applied.affected)),
        })
    }

    pub async fn read<T: DeserializeOwned>(
        &self,
        stmt: &Statement,
        role: Option<Role>,
    ) -> Result<Vec<T>, Failure> {
        match self.run(stmt, Mode::Read, role).await? {
            Raw::Rows(rows) => decode(rows),
            Raw::Applied(_) => Err(Failure::backend("read produced a mutation")),
        }
    }

    pub async fn read_one<T: DeserializeOwned>(
        &self,
        stmt: &Statement,
        role: Option<Role>,
    ) -> Result<Option<T>, Failure> {
        Ok(self.read(stmt, role).await?.into_iter().next())
    }

    pub async fn write(&self, stmt: &Statement, role: Option<Role>) -> Result<Mutation, Failure> {
        match self.run(stmt, Mode::Write, role).await? {
            Raw::Applied(applied) => Ok(Mutation::from_count(applied.affected)),
            Raw::Rows(_) => Err(Failure::backend("write produced rows")),
        }
    }

    /// A write whose `RETURNING` rows are decoded into `T`.
    pub async fn write_returning<T: DeserializeOwned>(
        &self,
        stmt: &Statement,
        role: Option<Role>,
    ) -> Result<Vec<T>, Failure> {
        if !stmt.is_returning() {
            return Err(Failure::backend("statement has no RETURNING rows"));
        }
        match self.run(stmt, Mode::Write, role).await? {
            Raw::Applied(applied) => decode(applied.rows),
            Raw::Rows(_) => Err(Failure::backend("write produced rows")),
        }
    }

    #[tracing::instrument(
        name = "execute",
        skip_all,
        fields(mode = ?mode, principal = tracing::field::Empty)
    )]
    async fn run(&self, stmt: &Statement, mode: Mode, role: Option<Role>) -> Result<Raw, Failure> {
        let profile = self.credentials.resolve_profile(role);
        tracing::Span::current().record("principal", profile.principal.as_str());

        let mut session = self.connector.open(profile).await.map_err(|e| {
            tracing::warn!(error = %e, "could not open connection");
            e
        })?;

        let result = match mode {
            Mode::Read => session.fetch(stmt).await.map(Raw::Rows),
            Mode::Write => session.apply(stmt).await.map(Raw::Applied),
        };
        drop(session);

        match &result {
            Ok(Raw::Rows(rows)) => tracing::debug!(rows = rows.len(), "read finished"),
            Ok(Raw::Applied(applied)) => {
                tracing::debug!(affected = applied.affected, "write committed")
            }
            Err(e) => tracing::warn!(error = %e, "statement failed"),
        }
        result
    }
}

fn decode<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, Failure> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| Failure::backend(format!("unexpected row shape: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockConnector, Reply};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Name {
        name: String,
    }

    fn names() -> Vec<Value> {
        vec![json!({"name": "Chess"}), json!({"name": "Robotics"})]
    }

    #[tokio::test]
    async fn read_returns_ordered_rows_and_releases() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(names())));
        let db = mock.executor();

        let rows: Vec<Name> = db
            .read(&Statement::new("SELECT name FROM club").ordered_by("name"), None)
            .await
            .unwrap();

        assert_eq!(
            rows,
            vec![
                Name { name: "Chess".into() },
                Name { name: "Robotics".into() }
            ]
        );
        assert_eq!(mock.opened(), 1);
        assert_eq!(mock.released(), 1);
    }

    #[tokio::test]
    async fn empty_read_is_not_an_error() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![])));
        let rows: Vec<Name> = mock
            .executor()
            .read(&Statement::new("SELECT name FROM club"), None)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(names())));
        let db = mock.executor();
        let stmt = Statement::new("SELECT name FROM club").ordered_by("name");

        let first = db.execute(&stmt, Mode::Read, None).await.unwrap();
        let second = db.execute(&stmt, Mode::Read, None).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.released(), 2);
    }

    #[tokio::test]
    async fn zero_row_write_is_distinct_from_failure() {
        let noop = MockConnector::new(|_| Ok(Reply::Affected(0)));
        let failing = MockConnector::new(|_| Err(Failure::backend("constraint violated")));
        let stmt = Statement::new("DELETE FROM event WHERE event_id = $1").bind(99);

        assert_eq!(
            noop.executor().write(&stmt, Some(Role::Management)).await,
            Ok(Mutation::NoOp)
        );
        assert_eq!(
            failing.executor().write(&stmt, Some(Role::Management)).await,
            Err(Failure::backend("constraint violated"))
        );
        assert_eq!(failing.released(), 1);
    }

    #[tokio::test]
    async fn write_reports_affected_rows() {
        let mock = MockConnector::new(|_| Ok(Reply::Affected(3)));
        let outcome = mock
            .executor()
            .execute(
                &Statement::new("UPDATE event SET budget = 0"),
                Mode::Write,
                Some(Role::Management),
            )
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Mutation(Mutation::Applied(3)));
    }

    #[tokio::test]
    async fn role_picks_the_principal() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![])));
        let db = mock.executor();
        let stmt = Statement::new("SELECT 1");

        for role in [
            Some(Role::Management),
            Some(Role::ClubHead),
            Some(Role::ClubMember),
            None,
        ] {
            db.execute(&stmt, Mode::Read, role).await.unwrap();
        }

        let principals: Vec<_> = mock.calls().into_iter().map(|c| c.principal).collect();
        assert_eq!(principals, ["management", "club_head", "viewer", "viewer"]);
    }

    #[tokio::test]
    async fn connection_released_once_on_every_path() {
        let mock = MockConnector::new(|call| match call.sql.as_str() {
            "ok" => Ok(Reply::Rows(vec![json!({"name": "Chess"})])),
            "bad shape" => Ok(Reply::Rows(vec![json!({"title": 1})])),
            _ => Err(Failure::backend("syntax error")),
        });
        let db = mock.executor();

        let _ = db.read::<Name>(&Statement::new("ok"), None).await;
        let _ = db.read::<Name>(&Statement::new("bad shape"), None).await;
        let _ = db.read::<Name>(&Statement::new("broken"), None).await;
        let _ = db.write(&Statement::new("broken"), Some(Role::Management)).await;

        assert_eq!(mock.opened(), 4);
        assert_eq!(mock.released(), 4);
    }

    #[tokio::test]
    async fn connect_failure_is_normalized() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![])));
        mock.refuse_connections();

        let result = mock
            .executor()
            .execute(&Statement::new("SELECT 1"), Mode::Read, None)
            .await;

        assert!(matches!(result, Err(Failure::Backend { .. })));
        assert_eq!(mock.opened(), 0);
        assert_eq!(mock.released(), 0);
    }

    #[tokio::test]
    async fn connection_released_when_query_panics() {
        let mock = MockConnector::new(|_| panic!("driver blew up"));
        let db = std::sync::Arc::new(mock.executor());

        let task = tokio::spawn({
            let db = db.clone();
            async move { db.read::<Name>(&Statement::new("SELECT 1"), None).await }
        });

        assert!(task.await.is_err());
        assert_eq!(mock.opened(), 1);
        assert_eq!(mock.released(), 1);
    }

    #[tokio::test]
    async fn undecodable_rows_are_backend_failures() {
        let mock = MockConnector::new(|_| Ok(Reply::Rows(vec![json!({"other": true})])));
        let result = mock
            .executor()
            .read::<Name>(&Statement::new("SELECT 1"), None)
            .await;
        assert!(matches!(result, Err(Failure::Backend { reason }) if reason.starts_with("unexpected row shape")));
    }

    #[tokio::test]
    async fn returning_write_decodes_rows() {
        #[derive(Deserialize)]
        struct Id {
            event_id: i32,
        }

        let mock = MockConnector::new(|_| Ok(Reply::Returning(vec![json!({"event_id": 7})])));
        let stmt = Statement::new("INSERT INTO event (title) VALUES ($1) RETURNING event_id")
            .bind("Hack Night")
            .returning();

        let ids: Vec<Id> = mock
            .executor()
            .write_returning(&stmt, Some(Role::Management))
            .await
            .unwrap();
        assert_eq!(ids[0].event_id, 7);
        assert_eq!(mock.writes().len(), 1);
    }
}

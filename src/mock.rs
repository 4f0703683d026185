use crate::{
    error::Failure,
    executor::{Applied, Connector, Executor, Mode, Session},
    profile::{self, ConnectionProfile},
    statement::{Param, Statement},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub principal: String,
    pub mode: Mode,
    pub sql: String,
    pub params: Vec<Param>,
    pub order_by: Option<&'static str>,
}

impl Call {
    pub fn text(&self, index: usize) -> Option<&str> {
        match self.params.get(index) {
            Some(Param::Text(s)) => Some(s),
            Some(Param::NullableText(s)) => s.as_deref(),
            _ => None,
        }
    }

    pub fn int(&self, index: usize) -> Option<i32> {
        match self.params.get(index) {
            Some(Param::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

pub enum Reply {
    Rows(Vec<Value>),
    Affected(usize),
    Returning(Vec<Value>),
}

type Handler = dyn Fn(&Call) -> Result<Reply, Failure> + Send + Sync;

struct State {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
    opened: AtomicUsize,
    released: AtomicUsize,
    refuse: AtomicBool,
}

#[derive(Clone)]
pub struct MockConnector {
    state: Arc<State>,
}

impl MockConnector {
    pub fn new(handler: impl Fn(&Call) -> Result<Reply, Failure> + Send + Sync + 'static) -> Self {
        Self {
            state: Arc::new(State {
                handler: Box::new(handler),
                calls: Mutex::new(Vec::new()),
                opened: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
            }),
        }
    }

    pub fn executor(&self) -> Executor<MockConnector> {
        Executor::new(profile::test_table(), self.clone())
    }

    pub fn refuse_connections(&self) {
        self.state.refuse.store(true, Ordering::SeqCst);
    }

    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.mode == Mode::Write)
            .collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Session = MockSession;

    async fn open(&self, profile: &ConnectionProfile) -> Result<MockSession, Failure> {
        if self.state.refuse.load(Ordering::SeqCst) {
            return Err(Failure::backend("connection refused"));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            state: self.state.clone(),
            principal: profile.principal.clone(),
        })
    }
}

pub struct MockSession {
    state: Arc<State>,
    principal: String,
}

impl MockSession {
    fn call(&self, stmt: &Statement, mode: Mode) -> Result<Reply, Failure> {
        let call = Call {
            principal: self.principal.clone(),
            mode,
            sql: stmt.sql().to_string(),
            params: stmt.params().to_vec(),
            order_by: stmt.order_by(),
        };
        self.state.calls.lock().unwrap().push(call.clone());
        (self.state.handler)(&call)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn fetch(&mut self, stmt: &Statement) -> Result<Vec<Value>, Failure> {
        match self.call(stmt, Mode::Read)? {
            Reply::Rows(rows) => Ok(rows),
            _ => Err(Failure::backend("scripted a write reply for a read")),
        }
    }

    async fn apply(&mut self, stmt: &Statement) -> Result<Applied, Failure> {
        match self.call(stmt, Mode::Write)? {
            Reply::Affected(affected) => Ok(Applied {
                affected,
                rows: Vec::new(),
            }),
            Reply::Returning(rows) => Ok(Applied {
                affected: rows.len(),
                rows,
            }),
            Reply::Rows(_) => Err(Failure::backend("scripted read rows for a write")),
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

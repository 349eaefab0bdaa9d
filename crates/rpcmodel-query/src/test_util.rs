//! Scripted transport for unit tests.

use rpcmodel_core::{Error, Kwargs, RemoteFault, Result, Session, SessionConfig, Transport, Value};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

/// A call the mock transport received.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

/// Transport serving pre-scripted responses per (model, method), recording
/// every call it receives. An unscripted call fails like a remote fault.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    calls: RefCell<Vec<RecordedCall>>,
    responses: RefCell<HashMap<(String, String), VecDeque<Value>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one response for `model.method`.
    pub fn respond(&self, model: &str, method: &str, value: Value) {
        self.responses
            .borrow_mut()
            .entry((model.to_string(), method.to_string()))
            .or_default()
            .push_back(value);
    }

    /// Queue one response built from a JSON literal.
    pub fn respond_json(&self, model: &str, method: &str, json: serde_json::Value) {
        self.respond(model, method, Value::from(json));
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.borrow().clone()
    }

    /// Number of calls recorded for `model.method`.
    pub fn call_count(&self, model: &str, method: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.model == model && c.method == method)
            .count()
    }
}

impl Transport for MockTransport {
    fn authenticate(
        &self,
        _database: &str,
        _login: &str,
        _password: &str,
        _options: &Kwargs,
    ) -> Result<i64> {
        Ok(1)
    }

    fn execute(
        &self,
        _database: &str,
        _uid: i64,
        _password: &str,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value> {
        self.calls.borrow_mut().push(RecordedCall {
            model: model.to_string(),
            method: method.to_string(),
            args,
            kwargs,
        });
        self.responses
            .borrow_mut()
            .get_mut(&(model.to_string(), method.to_string()))
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                Error::Remote(RemoteFault::execution(model, method, "no scripted response"))
            })
    }
}

/// Connect a session over the given mock.
pub(crate) fn connected(transport: MockTransport) -> Session<MockTransport> {
    Session::connect(transport, SessionConfig::new("test", "admin", "secret")).expect("connect")
}

//! Shared scripted transport for integration tests.
#![allow(dead_code)]

use rpcmodel::{Error, Kwargs, RemoteFault, Result, Session, SessionConfig, Transport, Value};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

/// A call the mock transport received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub method: String,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

/// Transport serving pre-scripted responses per (model, method), recording
/// every call. An unscripted call fails like a remote fault.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: RefCell<Vec<RecordedCall>>,
    responses: RefCell<HashMap<(String, String), VecDeque<Value>>>,
    reject_auth: Cell<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `authenticate` fail.
    pub fn reject_authentication(&self) {
        self.reject_auth.set(true);
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

    /// The recorded calls for `model.method`, in order.
    pub fn calls_for(&self, model: &str, method: &str) -> Vec<RecordedCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.model == model && c.method == method)
            .cloned()
            .collect()
    }

    /// Number of calls recorded for `model.method`.
    pub fn call_count(&self, model: &str, method: &str) -> usize {
        self.calls_for(model, method).len()
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
        if self.reject_auth.get() {
            return Err(Error::Remote(RemoteFault::authentication(
                "invalid credentials",
            )));
        }
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

/// Transport pre-scripted with the order / partner / order.line schemas.
pub fn order_partner_transport() -> MockTransport {
    let transport = MockTransport::new();
    transport.respond_json(
        "order",
        "fields_get",
        serde_json::json!({
            "amount": {"string": "Amount", "type": "float"},
            "state": {"string": "State", "type": "char"},
            "customer": {"string": "Customer", "type": "many2one", "relation": "partner"},
            "lines": {"string": "Lines", "type": "one2many", "relation": "order.line"},
        }),
    );
    transport.respond_json(
        "partner",
        "fields_get",
        serde_json::json!({
            "name": {"string": "Name", "type": "char"},
            "city": {"string": "City", "type": "char"},
        }),
    );
    transport.respond_json(
        "order.line",
        "fields_get",
        serde_json::json!({
            "qty": {"string": "Quantity", "type": "integer"},
        }),
    );
    transport
}

/// Connect a session over the given mock.
pub fn connect(transport: MockTransport) -> Session<MockTransport> {
    Session::connect(transport, SessionConfig::new("test", "admin", "secret")).expect("connect")
}

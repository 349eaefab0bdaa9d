//! Session state: authentication, schema cache and default context.

use crate::error::Result;
use crate::schema::{INTROSPECTION_ATTRIBUTES, ModelSchema};
use crate::transport::{Kwargs, Transport};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Connection parameters for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Database name addressed by every call
    pub database: String,
    /// Login used for the authentication handshake
    pub login: String,
    /// Password sent with every call
    pub password: String,
    /// Initial default context merged into query execution
    pub context: BTreeMap<String, Value>,
}

impl SessionConfig {
    /// Create a configuration with the required connection parameters.
    pub fn new(
        database: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            login: login.into(),
            password: password.into(),
            context: BTreeMap::new(),
        }
    }

    /// Add an initial default-context entry.
    #[must_use]
    pub fn context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// An authenticated connection to one remote database.
///
/// Owns the transport, the per-session schema cache and the default context
/// map. Designed for the single-threaded blocking call model: interior
/// mutability is unlocked, so a `Session` is deliberately not shareable
/// across threads; use one session per thread.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: T,
    config: SessionConfig,
    uid: i64,
    schemas: RefCell<HashMap<String, Rc<ModelSchema>>>,
    context: RefCell<BTreeMap<String, Value>>,
}

impl<T: Transport> Session<T> {
    /// Authenticate against the remote service and build a session.
    ///
    /// Authentication happens exactly once; a rejected handshake is fatal
    /// for the session and is not retried.
    pub fn connect(transport: T, config: SessionConfig) -> Result<Self> {
        let uid = transport
            .authenticate(
                &config.database,
                &config.login,
                &config.password,
                &Kwargs::new(),
            )
            .map_err(crate::error::Error::into_authentication)?;
        tracing::debug!(database = %config.database, login = %config.login, uid, "authenticated");

        let context = RefCell::new(config.context.clone());
        Ok(Self {
            transport,
            config,
            uid,
            schemas: RefCell::new(HashMap::new()),
            context,
        })
    }

    /// The session id returned by the authentication handshake.
    pub fn uid(&self) -> i64 {
        self.uid
    }

    /// The database this session is bound to.
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Snapshot of the current default context.
    ///
    /// Queries capture this snapshot when they are created; later context
    /// changes affect only queries created afterward.
    pub fn context(&self) -> BTreeMap<String, Value> {
        self.context.borrow().clone()
    }

    /// Update one default-context entry for calls issued afterward.
    pub fn set_context(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.borrow_mut().insert(key.into(), value.into());
    }

    /// Field schema for `model`, memoized for the session lifetime.
    ///
    /// The first request for a model triggers one remote introspection
    /// call; the cached schema is never invalidated within the session.
    pub fn schema(&self, model: &str) -> Result<Rc<ModelSchema>> {
        if let Some(schema) = self.schemas.borrow().get(model) {
            return Ok(Rc::clone(schema));
        }

        let schema = Rc::new(self.introspect(model)?);
        self.schemas
            .borrow_mut()
            .insert(model.to_string(), Rc::clone(&schema));
        Ok(schema)
    }

    fn introspect(&self, model: &str) -> Result<ModelSchema> {
        tracing::debug!(model, "introspecting fields");
        let mut kwargs = Kwargs::new();
        kwargs.insert(
            "attributes".to_string(),
            Value::List(
                INTROSPECTION_ATTRIBUTES
                    .iter()
                    .map(|a| Value::from(*a))
                    .collect(),
            ),
        );
        kwargs.insert("context".to_string(), Value::Map(self.context()));
        let payload = self.execute(model, "fields_get", Vec::new(), kwargs)?;
        ModelSchema::from_value(model, &payload)
    }

    /// Invoke a remote method. The sole remote access point for everything
    /// built on this session; faults come back tagged with the attempted
    /// model and method.
    pub fn execute(
        &self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value> {
        tracing::trace!(model, method, args = args.len(), "remote call");
        self.transport
            .execute(
                &self.config.database,
                self.uid,
                &self.config.password,
                model,
                method,
                args,
                kwargs,
            )
            .map_err(|e| e.tag_remote(model, method))
    }

    /// Borrow the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

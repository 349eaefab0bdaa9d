//! The remote procedure-call seam.
//!
//! The remote service is reachable only through a generic `execute` entry
//! point keyed by model and method name. This module defines that contract;
//! the wire format behind it is deliberately out of scope.

use crate::error::Result;
use crate::value::Value;
use std::collections::BTreeMap;

/// Keyword options passed alongside positional arguments on every call.
pub type Kwargs = BTreeMap<String, Value>;

/// A blocking connection to the remote object-relational service.
///
/// Every operation is a synchronous round trip. Implementations surface any
/// remote fault as [`crate::RemoteFault`]; no retries and no timeouts happen
/// at this layer; a fault is terminal for the operation that issued it.
///
/// # Example
///
/// ```ignore
/// let uid = transport.authenticate("prod", "admin", "secret", &Kwargs::new())?;
/// let ids = transport.execute(
///     "prod", uid, "secret",
///     "partner", "search",
///     vec![Value::List(vec![])],
///     Kwargs::new(),
/// )?;
/// ```
pub trait Transport {
    /// Run the authentication handshake and return the session id.
    fn authenticate(
        &self,
        database: &str,
        login: &str,
        password: &str,
        options: &Kwargs,
    ) -> Result<i64>;

    /// Invoke `method` on `model` with positional `args` and keyword
    /// `kwargs`, returning the raw result value.
    fn execute(
        &self,
        database: &str,
        uid: i64,
        password: &str,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Kwargs,
    ) -> Result<Value>;
}

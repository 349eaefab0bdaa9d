//! Query construction and the relational-fetch engine for rpcmodel.
//!
//! `rpcmodel-query` is the **query layer**. It turns schema-validated path
//! navigation into accumulated filters, projections and orderings, then
//! executes them through a [`Session`](rpcmodel_core::Session):
//!
//! - **Navigation**: `ConditionBuilder` / `FieldPath` walk the discovered
//!   schema one field at a time, validating every step.
//! - **Accumulation**: `QueryBuilder` gathers conditions, projections,
//!   ordering, a row limit and a working id set.
//! - **Execution**: `get()` assembles nested record trees by recursive,
//!   batched fetch; `export()` returns the remote service's flattened rows
//!   reassembled into nested records; `create()` mutates.

pub mod condition;
mod export;
mod fetch;
pub mod path;
pub mod query;
pub mod record;

#[cfg(test)]
pub(crate) mod test_util;

pub use condition::{CompareOp, Condition, ConditionBuilder};
pub use path::FieldPath;
pub use query::{
    EXTERNAL_ID_REGISTRY, OrderDirection, Projection, QueryBuilder, SessionModelExt,
};
pub use record::{Record, ResultValue};

/// Begin a query over a model.
///
/// # Example
///
/// ```ignore
/// let partners = query!(session, "partner")?
///     .filter(|p| {
///         p.field("name")?.contains("smith");
///         Ok(())
///     })?
///     .get()?;
/// ```
#[macro_export]
macro_rules! query {
    ($session:expr, $model:expr) => {
        $crate::QueryBuilder::new(&$session, $model)
    };
}

//! rpcmodel: a typed query layer over remote object-relational services.
//!
//! The remote service exposes models with discoverable field schemas behind
//! a single generic procedure-call entry point. rpcmodel provides:
//!
//! - On-demand schema discovery with per-session caching
//! - Schema-validated path navigation with "did you mean" suggestions
//! - A fluent query builder recording filters, projections and orderings
//! - A recursive relational fetch that assembles nested record trees from
//!   the remote's flat one-level reads, batched by distinct id set
//! - A flattened export mode with identity-field remapping
//!
//! # Quick Start
//!
//! ```ignore
//! use rpcmodel::prelude::*;
//!
//! let session = Session::connect(transport, SessionConfig::new("prod", "admin", "secret"))?;
//!
//! let orders = session
//!     .model("order")?
//!     .filter(|o| {
//!         o.field("amount")?.gt(100);
//!         Ok(())
//!     })?
//!     .select(|o| Ok(vec![o.field("id")?, o.field("customer")?.field("name")?]))?
//!     .take(10)
//!     .get()?;
//!
//! for order in &orders {
//!     let customer = order.record("customer");
//!     println!("{:?} -> {:?}", order.id(), customer.and_then(|c| c.scalar("name")));
//! }
//! ```
//!
//! The transport behind the session is a trait; anything that can issue a
//! blocking `(model, method, args, kwargs)` call and return a dynamic
//! [`Value`] can drive the full query layer.

pub use rpcmodel_core::{
    // Errors
    Error,
    FieldNotFoundError,
    InvalidNavigationError,
    RemoteFault,
    RemoteFaultKind,
    Result,
    SchemaIntegrityError,
    UnknownField,
    UsageError,
    ValidationError,
    // Schema
    EXTERNAL_ID,
    FieldDescriptor,
    FieldKind,
    INTERNAL_ID,
    ModelSchema,
    is_pseudo_field,
    // Session and transport
    Kwargs,
    Session,
    SessionConfig,
    Transport,
    Value,
};

pub use rpcmodel_query::{
    CompareOp, Condition, ConditionBuilder, EXTERNAL_ID_REGISTRY, FieldPath, OrderDirection,
    Projection, QueryBuilder, Record, ResultValue, SessionModelExt,
};

pub use rpcmodel_query::query;

/// Common imports for working with rpcmodel.
pub mod prelude {
    pub use crate::{
        CompareOp, Condition, ConditionBuilder, Error, FieldDescriptor, FieldKind, FieldPath,
        Kwargs, ModelSchema, OrderDirection, QueryBuilder, Record, RemoteFault, RemoteFaultKind,
        Result, ResultValue, Session, SessionConfig, SessionModelExt, Transport, Value,
        // Macros
        query,
    };
}

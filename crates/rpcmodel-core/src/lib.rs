//! Core types and the transport seam for rpcmodel.
//!
//! This crate provides the foundational abstractions for the typed query
//! layer:
//!
//! - `Value` dynamic wire values
//! - `Error` taxonomy and `Result` alias
//! - `FieldDescriptor` / `ModelSchema` discovered field metadata
//! - `Transport` trait for the remote procedure-call seam
//! - `Session` owning authentication, the schema cache and default context

pub mod error;
pub mod schema;
pub mod session;
pub mod suggest;
pub mod transport;
pub mod value;

pub use error::{
    Error, FieldNotFoundError, InvalidNavigationError, RemoteFault, RemoteFaultKind, Result,
    SchemaIntegrityError, UnknownField, UsageError, ValidationError,
};
pub use schema::{
    EXTERNAL_ID, FieldDescriptor, FieldKind, INTERNAL_ID, INTROSPECTION_ATTRIBUTES, ModelSchema,
    is_pseudo_field,
};
pub use session::{Session, SessionConfig};
pub use suggest::closest_matches;
pub use transport::{Kwargs, Transport};
pub use value::Value;

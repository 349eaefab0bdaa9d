//! Filter conditions and the accumulator they are registered on.

use crate::path::FieldPath;
use rpcmodel_core::{
    Error, FieldNotFoundError, ModelSchema, Result, Session, Transport, Value, is_pseudo_field,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Comparison operators understood by the remote domain language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Set membership (in)
    In,
    /// Case-insensitive substring match (ilike)
    ILike,
}

impl CompareOp {
    /// The operator token used on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::ILike => "ilike",
        }
    }
}

/// One filter triple: field path, operator, comparison value.
///
/// Accumulated conditions are combined with logical AND, in registration
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub path: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Condition {
    /// Create a condition triple.
    pub fn new(path: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            op,
            value: value.into(),
        }
    }

    /// Serialize as the wire-level `(path, operator, value)` triple.
    pub fn to_value(&self) -> Value {
        Value::List(vec![
            Value::from(self.path.as_str()),
            Value::from(self.op.as_str()),
            self.value.clone(),
        ])
    }
}

/// Root of a navigation session over one model's schema.
///
/// Builder callbacks receive a fresh `ConditionBuilder`; comparison methods
/// on the [`FieldPath`]s it hands out register conditions here as a side
/// effect. Registration order is the AND-combined filter order.
#[derive(Debug)]
pub struct ConditionBuilder<'s, T: Transport> {
    session: &'s Session<T>,
    schema: Rc<ModelSchema>,
    conditions: RefCell<Vec<Condition>>,
}

impl<'s, T: Transport> ConditionBuilder<'s, T> {
    pub(crate) fn new(session: &'s Session<T>, schema: Rc<ModelSchema>) -> Self {
        Self {
            session,
            schema,
            conditions: RefCell::new(Vec::new()),
        }
    }

    /// Start a path at a top-level field of the model.
    ///
    /// The two pseudo-fields `id` and `external_id` are always valid, even
    /// when the discovered schema does not declare them.
    pub fn field(&self, name: &str) -> Result<FieldPath<'_, T>> {
        let descriptor = self.schema.get(name).cloned();
        if descriptor.is_none() && !is_pseudo_field(name) {
            return Err(Error::FieldNotFound(FieldNotFoundError {
                model: self.schema.model().to_string(),
                field: name.to_string(),
                suggestions: self.schema.suggestions_for(name),
            }));
        }
        Ok(FieldPath::root(
            self,
            name,
            descriptor,
            Rc::clone(&self.schema),
        ))
    }

    pub(crate) fn session(&self) -> &'s Session<T> {
        self.session
    }

    pub(crate) fn register(&self, condition: Condition) {
        self.conditions.borrow_mut().push(condition);
    }

    pub(crate) fn into_conditions(self) -> Vec<Condition> {
        self.conditions.into_inner()
    }
}

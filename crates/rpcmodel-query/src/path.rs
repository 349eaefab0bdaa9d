//! Schema-driven path navigation.

use crate::condition::{CompareOp, Condition, ConditionBuilder};
use rpcmodel_core::{
    Error, FieldDescriptor, FieldNotFoundError, InvalidNavigationError, ModelSchema, Result,
    SchemaIntegrityError, Transport, Value, is_pseudo_field,
};
use std::rc::Rc;

/// An immutable, lazily-extended path through a model's schema.
///
/// A path tracks two spellings at once: the dot-joined *internal* path used
/// for filters, ordering and nested fetch, and the slash-joined *export*
/// path used for flattened export. Each navigation step is validated
/// against the schema of the model reached so far; descending past a
/// relational field resolves (and caches) the related model's schema first.
///
/// Comparison methods do not return a boolean; they register a
/// [`Condition`] on the builder this path was created from. That is the
/// only way conditions are produced, so the evaluation order of a filter
/// callback determines the AND-combined filter list.
#[derive(Debug)]
pub struct FieldPath<'q, T: Transport> {
    builder: &'q ConditionBuilder<'q, T>,
    segments: Vec<String>,
    export_segments: Vec<String>,
    /// Descriptor of the tip field; `None` for the `id` / `external_id`
    /// pseudo-fields, which carry no schema entry.
    descriptor: Option<FieldDescriptor>,
    /// Schema of the model the tip field belongs to.
    fields: Rc<ModelSchema>,
    descended: bool,
}

impl<'q, T: Transport> FieldPath<'q, T> {
    pub(crate) fn root(
        builder: &'q ConditionBuilder<'q, T>,
        name: &str,
        descriptor: Option<FieldDescriptor>,
        fields: Rc<ModelSchema>,
    ) -> Self {
        Self {
            builder,
            segments: vec![name.to_string()],
            export_segments: vec![name.to_string()],
            descriptor,
            fields,
            descended: false,
        }
    }

    /// Extend the path one step into the related model.
    ///
    /// Fails with `FieldNotFound` when the tip has no descriptor or the
    /// related model does not declare `name`, with `InvalidNavigation` when
    /// the tip is not relational, and with `SchemaIntegrity` when the tip
    /// is relational but the remote schema declares no target model.
    pub fn field(&self, name: &str) -> Result<FieldPath<'q, T>> {
        let Some(descriptor) = &self.descriptor else {
            return Err(Error::FieldNotFound(FieldNotFoundError {
                model: self.fields.model().to_string(),
                field: self.name().to_string(),
                suggestions: self.fields.suggestions_for(self.name()),
            }));
        };

        if !descriptor.kind.is_relational() {
            return Err(Error::InvalidNavigation(InvalidNavigationError {
                field: self.name().to_string(),
                message: format!(
                    "field '{}' has no sub-fields; remove '.{name}'",
                    self.name()
                ),
            }));
        }

        let Some(related_model) = &descriptor.related_model else {
            return Err(Error::SchemaIntegrity(SchemaIntegrityError {
                model: self.fields.model().to_string(),
                field: self.name().to_string(),
                message: "relational field declares no related model; the remote schema is \
                          malformed"
                    .to_string(),
            }));
        };

        let related = self.builder.session().schema(related_model)?;
        if !related.contains(name) && !is_pseudo_field(name) {
            return Err(Error::FieldNotFound(FieldNotFoundError {
                model: related_model.clone(),
                field: name.to_string(),
                suggestions: related.suggestions_for(name),
            }));
        }

        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        let mut export_segments = self.export_segments.clone();
        export_segments.push(name.to_string());

        Ok(FieldPath {
            builder: self.builder,
            segments,
            export_segments,
            descriptor: related.get(name).cloned(),
            fields: related,
            descended: true,
        })
    }

    /// The tip field name.
    pub fn name(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Dot-joined internal path, used for filters, ordering and fetch.
    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    /// Slash-joined export path, used for flattened export.
    pub fn export_path(&self) -> String {
        self.export_segments.join("/")
    }

    /// Does the tip reference record(s) of another model?
    pub fn is_relational(&self) -> bool {
        self.descriptor
            .as_ref()
            .is_some_and(|d| d.kind.is_relational())
    }

    /// Did this path descend into a related model?
    pub fn descended(&self) -> bool {
        self.descended
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments
    }

    pub(crate) fn export_segments(&self) -> &[String] {
        &self.export_segments
    }

    fn register(&self, op: CompareOp, value: Value) {
        self.builder.register(Condition::new(self.path(), op, value));
    }

    /// Register `path = value`.
    pub fn eq(&self, value: impl Into<Value>) {
        self.register(CompareOp::Eq, value.into());
    }

    /// Register `path != value`.
    pub fn ne(&self, value: impl Into<Value>) {
        self.register(CompareOp::Ne, value.into());
    }

    /// Register `path < value`.
    pub fn lt(&self, value: impl Into<Value>) {
        self.register(CompareOp::Lt, value.into());
    }

    /// Register `path <= value`.
    pub fn le(&self, value: impl Into<Value>) {
        self.register(CompareOp::Le, value.into());
    }

    /// Register `path > value`.
    pub fn gt(&self, value: impl Into<Value>) {
        self.register(CompareOp::Gt, value.into());
    }

    /// Register `path >= value`.
    pub fn ge(&self, value: impl Into<Value>) {
        self.register(CompareOp::Ge, value.into());
    }

    /// Register a containment test.
    ///
    /// Text values become a case-insensitive substring match; anything else
    /// becomes set membership, with a lone scalar normalized to a
    /// one-element list.
    pub fn contains(&self, value: impl Into<Value>) {
        let value = value.into();
        match value {
            Value::Text(_) => self.register(CompareOp::ILike, value),
            Value::List(_) => self.register(CompareOp::In, value),
            other => self.register(CompareOp::In, Value::List(vec![other])),
        }
    }
}

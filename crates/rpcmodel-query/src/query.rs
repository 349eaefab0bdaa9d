//! Query accumulation and execution.

use crate::condition::{CompareOp, Condition, ConditionBuilder};
use crate::export::{map_export_path, set_nested, unmap_export_path};
use crate::fetch::{build_field_tree, fetch_tree};
use crate::path::FieldPath;
use crate::record::Record;
use rpcmodel_core::{
    Error, INTERNAL_ID, Kwargs, ModelSchema, RemoteFault, Result, Session, Transport, UnknownField,
    UsageError, ValidationError, Value,
};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Model holding the mapping from durable external identifiers to internal
/// record ids.
pub const EXTERNAL_ID_REGISTRY: &str = "ir.model.data";

/// Sort direction for an ordering entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    /// The token used in the serialized order expression.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderDirection::Asc => "asc",
            OrderDirection::Desc => "desc",
        }
    }
}

/// An owned projection snapshot taken from a [`FieldPath`].
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    segments: Vec<String>,
    export_segments: Vec<String>,
    relational_tip: bool,
}

impl Projection {
    fn of<T: Transport>(path: &FieldPath<'_, T>) -> Self {
        Self {
            segments: path.segments().to_vec(),
            export_segments: path.export_segments().to_vec(),
            relational_tip: path.is_relational(),
        }
    }

    /// Dot-joined internal path.
    pub fn path(&self) -> String {
        self.segments.join(".")
    }

    /// Slash-joined export path.
    pub fn export_path(&self) -> String {
        self.export_segments.join("/")
    }

    fn tip(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// Accumulates projections, filters, ordering, a row limit and a working
/// id set over one model, then executes through the session.
///
/// Two execution strategies are available: [`get`](QueryBuilder::get)
/// assembles a nested record tree by recursive fetch, and
/// [`export`](QueryBuilder::export) asks the remote service for flattened
/// rows. [`create`](QueryBuilder::create) mutates.
///
/// # Example
///
/// ```ignore
/// let orders = session
///     .model("order")?
///     .filter(|o| {
///         o.field("amount")?.gt(100);
///         Ok(())
///     })?
///     .select(|o| Ok(vec![o.field("id")?, o.field("customer")?.field("name")?]))?
///     .take(10)
///     .get()?;
/// ```
#[derive(Debug)]
pub struct QueryBuilder<'s, T: Transport> {
    session: &'s Session<T>,
    model: String,
    schema: Rc<ModelSchema>,
    projections: Vec<Projection>,
    filters: Vec<Condition>,
    order: Vec<(String, OrderDirection)>,
    limit: Option<u32>,
    ids: Vec<i64>,
    context: BTreeMap<String, Value>,
}

impl<'s, T: Transport> QueryBuilder<'s, T> {
    /// Begin a query over `model`, forcing schema discovery.
    ///
    /// The session's default context is snapshotted here; later
    /// `set_context` calls on the session do not affect this query.
    pub fn new(session: &'s Session<T>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let schema = session.schema(&model)?;
        let context = session.context();
        Ok(Self {
            session,
            model,
            schema,
            projections: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
            ids: Vec::new(),
            context,
        })
    }

    /// The model this query is bound to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ids resolved so far, through `by_external_ids` or `create`.
    pub fn resolved_ids(&self) -> &[i64] {
        &self.ids
    }

    /// Replace the projection list.
    ///
    /// The callback navigates a fresh [`ConditionBuilder`] and returns the
    /// paths to project. Duplicates (by export path) are dropped, keeping
    /// the first occurrence.
    pub fn select<F>(mut self, build: F) -> Result<Self>
    where
        F: for<'q> FnOnce(&'q ConditionBuilder<'q, T>) -> Result<Vec<FieldPath<'q, T>>>,
    {
        let builder = ConditionBuilder::new(self.session, Rc::clone(&self.schema));
        let paths = build(&builder)?;

        let mut seen = BTreeSet::new();
        let mut projections = Vec::new();
        for path in &paths {
            let projection = Projection::of(path);
            if seen.insert(projection.export_path()) {
                projections.push(projection);
            }
        }
        self.projections = projections;
        Ok(self)
    }

    /// Append filter conditions.
    ///
    /// The callback is invoked for its side effects only: every comparison
    /// performed on a path registers one condition, and all conditions are
    /// AND-combined in registration order.
    pub fn filter<F>(mut self, build: F) -> Result<Self>
    where
        F: for<'q> FnOnce(&'q ConditionBuilder<'q, T>) -> Result<()>,
    {
        let builder = ConditionBuilder::new(self.session, Rc::clone(&self.schema));
        build(&builder)?;
        self.filters.extend(builder.into_conditions());
        Ok(self)
    }

    /// Append ascending ordering entries.
    pub fn order_by<F>(self, build: F) -> Result<Self>
    where
        F: for<'q> FnOnce(&'q ConditionBuilder<'q, T>) -> Result<Vec<FieldPath<'q, T>>>,
    {
        self.order_with(build, OrderDirection::Asc)
    }

    /// Append descending ordering entries.
    pub fn order_by_desc<F>(self, build: F) -> Result<Self>
    where
        F: for<'q> FnOnce(&'q ConditionBuilder<'q, T>) -> Result<Vec<FieldPath<'q, T>>>,
    {
        self.order_with(build, OrderDirection::Desc)
    }

    fn order_with<F>(mut self, build: F, direction: OrderDirection) -> Result<Self>
    where
        F: for<'q> FnOnce(&'q ConditionBuilder<'q, T>) -> Result<Vec<FieldPath<'q, T>>>,
    {
        let builder = ConditionBuilder::new(self.session, Rc::clone(&self.schema));
        let paths = build(&builder)?;
        for path in &paths {
            self.order.push((path.path(), direction));
        }
        Ok(self)
    }

    /// Set the row limit.
    #[must_use]
    pub fn take(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Override one context entry for this query only.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Restrict the query to records named by durable external ids.
    ///
    /// Each id must look like `module.name`; the identifier registry is
    /// queried for the matching internal ids, which join the working id
    /// set (an implicit `id in [...]` condition at execution time).
    pub fn by_external_ids<I, S>(mut self, external_ids: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names = Vec::new();
        for external_id in external_ids {
            let external_id = external_id.as_ref();
            let Some((_, name)) = external_id.split_once('.') else {
                return Err(Error::Usage(UsageError {
                    message: format!("external id '{external_id}' must look like 'module.name'"),
                }));
            };
            names.push(Value::from(name));
        }

        let domain = Value::List(vec![
            Condition::new("name", CompareOp::In, Value::List(names)).to_value(),
        ]);
        let mut kwargs = Kwargs::new();
        kwargs.insert(
            "fields".to_string(),
            Value::List(vec![Value::from("res_id")]),
        );
        kwargs.insert("context".to_string(), Value::Map(self.context.clone()));

        let response =
            self.session
                .execute(EXTERNAL_ID_REGISTRY, "search_read", vec![domain], kwargs)?;
        let rows = response.into_list().ok_or_else(|| {
            Error::Remote(RemoteFault::execution(
                EXTERNAL_ID_REGISTRY,
                "search_read",
                "expected a list of records",
            ))
        })?;
        for row in &rows {
            if let Some(id) = row
                .as_map()
                .and_then(|m| m.get("res_id"))
                .and_then(Value::as_i64)
            {
                self.ids.push(id);
            }
        }
        Ok(self)
    }

    /// Create records, after validating every key against the schema.
    ///
    /// All unknown keys across all records are collected into one
    /// validation error (each with suggestions) before any remote call.
    /// On success a single remote `create` is issued with the full list
    /// and the returned id(s) join the working id set.
    pub fn create(mut self, records: &[BTreeMap<String, Value>]) -> Result<Self> {
        let mut flagged = BTreeSet::new();
        let mut unknown = Vec::new();
        for record in records {
            for key in record.keys() {
                if !self.schema.contains(key) && flagged.insert(key.clone()) {
                    unknown.push(UnknownField {
                        name: key.clone(),
                        suggestions: self.schema.suggestions_for(key),
                    });
                }
            }
        }
        if !unknown.is_empty() {
            return Err(Error::Validation(ValidationError {
                model: self.model.clone(),
                unknown_fields: unknown,
            }));
        }

        let payload = Value::List(records.iter().cloned().map(Value::Map).collect());
        let response =
            self.session
                .execute(&self.model, "create", vec![payload], Kwargs::new())?;
        match response {
            Value::Int(id) => self.ids.push(id),
            Value::List(items) => self.ids.extend(items.iter().filter_map(Value::as_i64)),
            other => {
                return Err(Error::Remote(RemoteFault::execution(
                    self.model.as_str(),
                    "create",
                    format!("expected id or id list, got {}", other.type_name()),
                )));
            }
        }
        Ok(self)
    }

    /// Execute with the nested-fetch strategy.
    ///
    /// One `search` resolves the matching ids in order, then the
    /// projection field tree is fetched recursively, one `read` per
    /// (model, branch), batched by distinct id set. The returned records
    /// follow the `search` order exactly, whatever order `read` answered
    /// in.
    #[tracing::instrument(level = "debug", skip(self), fields(model = %self.model))]
    pub fn get(self) -> Result<Vec<Record>> {
        let ids = self.search(true)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let tree = build_field_tree(self.projections.iter().map(Projection::segments));
        let mut records = fetch_tree(self.session, &self.model, &ids, &tree, &self.context)?;

        // A top-level id the remote refused to read degrades to an empty
        // record, same as a hidden related id.
        Ok(ids
            .iter()
            .map(|id| records.remove(id).unwrap_or_default())
            .collect())
    }

    /// Shorthand: limit to one row, fetch, and return the first record.
    pub fn first(self) -> Result<Option<Record>> {
        Ok(self.take(1).get()?.into_iter().next())
    }

    /// Execute with the flattened export strategy.
    ///
    /// Every relational projection must have been navigated at least one
    /// level deeper; identity segments are remapped on the way out and
    /// back (see the export module docs). Relation traversal is resolved
    /// remotely, no recursion happens here.
    #[tracing::instrument(level = "debug", skip(self), fields(model = %self.model))]
    pub fn export(self) -> Result<Vec<Record>> {
        for projection in &self.projections {
            if projection.relational_tip {
                return Err(Error::Usage(UsageError {
                    message: format!(
                        "cannot export relational field '{tip}' without a nested field; did \
                         you mean '{tip}.id'?",
                        tip = projection.tip()
                    ),
                }));
            }
        }

        let mut seen = BTreeSet::new();
        let mut mapped: Vec<String> = Vec::new();
        for projection in &self.projections {
            let field = map_export_path(&projection.export_path());
            if seen.insert(field.clone()) {
                mapped.push(field);
            }
        }

        let ids = self.search(false)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let args = vec![
            Value::from(ids),
            Value::List(mapped.iter().map(|f| Value::from(f.as_str())).collect()),
        ];
        let mut kwargs = Kwargs::new();
        kwargs.insert("context".to_string(), Value::Map(self.context.clone()));
        let response = self
            .session
            .execute(&self.model, "export_data", args, kwargs)?;

        let rows = response
            .into_map()
            .and_then(|mut m| m.remove("datas"))
            .and_then(Value::into_list)
            .unwrap_or_default();

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let cells = row.into_list().unwrap_or_default();
            let mut record = Record::new();
            for (field, value) in mapped.iter().zip(cells) {
                set_nested(&mut record, &unmap_export_path(field), value);
            }
            records.push(record);
        }
        Ok(records)
    }

    fn domain(&self) -> Value {
        let mut triples: Vec<Value> = self.filters.iter().map(Condition::to_value).collect();
        if !self.ids.is_empty() {
            triples.push(Condition::new(INTERNAL_ID, CompareOp::In, self.ids.clone()).to_value());
        }
        Value::List(triples)
    }

    fn order_expression(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        Some(
            self.order
                .iter()
                .map(|(path, direction)| format!("{path} {}", direction.as_str()))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    fn search_kwargs(&self, include_order: bool) -> Kwargs {
        let mut kwargs = Kwargs::new();
        if let Some(limit) = self.limit {
            kwargs.insert("limit".to_string(), Value::Int(i64::from(limit)));
        }
        if include_order {
            if let Some(order) = self.order_expression() {
                kwargs.insert("order".to_string(), Value::Text(order));
            }
        }
        kwargs.insert("context".to_string(), Value::Map(self.context.clone()));
        kwargs
    }

    fn search(&self, include_order: bool) -> Result<Vec<i64>> {
        let response = self.session.execute(
            &self.model,
            "search",
            vec![self.domain()],
            self.search_kwargs(include_order),
        )?;
        let items = response.into_list().ok_or_else(|| {
            Error::Remote(RemoteFault::execution(
                self.model.as_str(),
                "search",
                "expected a list of ids",
            ))
        })?;
        Ok(items.iter().filter_map(Value::as_i64).collect())
    }
}

/// Entry-point sugar: start a query directly from a session.
pub trait SessionModelExt<T: Transport> {
    /// Begin a query over `model`, forcing schema discovery.
    fn model(&self, name: &str) -> Result<QueryBuilder<'_, T>>;
}

impl<T: Transport> SessionModelExt<T> for Session<T> {
    fn model(&self, name: &str) -> Result<QueryBuilder<'_, T>> {
        QueryBuilder::new(self, name)
    }
}

//! Error types for query construction and remote execution.

use std::fmt;

/// The primary error type for all rpcmodel operations.
///
/// Schema and navigation errors are raised at build time, before any remote
/// call; remote faults surface only when a query is executed.
#[derive(Debug)]
pub enum Error {
    /// Unknown field name during navigation or projection/filter construction
    FieldNotFound(FieldNotFoundError),
    /// Navigation attempted past a field with no sub-structure
    InvalidNavigation(InvalidNavigationError),
    /// The remote schema itself is malformed
    SchemaIntegrity(SchemaIntegrityError),
    /// Record payload validation failed before a write
    Validation(ValidationError),
    /// The API was used in a way that cannot be executed
    Usage(UsageError),
    /// A failure surfaced by the remote interface
    Remote(RemoteFault),
}

/// A field name that does not exist in the discovered schema.
#[derive(Debug, Clone)]
pub struct FieldNotFoundError {
    /// Model whose schema was searched
    pub model: String,
    /// The offending field name
    pub field: String,
    /// Closest matches from the schema, best first; may be empty
    pub suggestions: Vec<String>,
}

/// Navigation past a non-relational field.
#[derive(Debug, Clone)]
pub struct InvalidNavigationError {
    /// The field that has no sub-fields
    pub field: String,
    pub message: String,
}

/// A relational field declared by the remote schema without a related-model
/// target. This is a defect in the remote data, not a caller mistake, and is
/// not recoverable locally.
#[derive(Debug, Clone)]
pub struct SchemaIntegrityError {
    pub model: String,
    pub field: String,
    pub message: String,
}

/// Validation failure for a record payload about to be written.
///
/// Collects every offending key across all records rather than failing on
/// the first, so a caller can fix the whole payload in one pass.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Model the records were destined for
    pub model: String,
    /// All keys absent from the model schema, each with suggestions
    pub unknown_fields: Vec<UnknownField>,
}

/// A single unknown key in a record payload.
#[derive(Debug, Clone)]
pub struct UnknownField {
    pub name: String,
    /// Closest matches from the schema, best first; may be empty
    pub suggestions: Vec<String>,
}

/// The API was asked to do something it cannot execute (for example,
/// exporting a bare relational field).
#[derive(Debug, Clone)]
pub struct UsageError {
    pub message: String,
}

/// Which remote operation class failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFaultKind {
    /// The authentication handshake was rejected; fatal for the session
    Authentication,
    /// A query/execution call failed (network, permission, business rule)
    Execution,
}

/// A failure surfaced by the remote interface itself.
///
/// Propagated unmodified apart from tagging with the attempted model and
/// method; never retried at this layer.
#[derive(Debug)]
pub struct RemoteFault {
    pub kind: RemoteFaultKind,
    /// Model addressed by the failing call, when known
    pub model: Option<String>,
    /// Method addressed by the failing call, when known
    pub method: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteFault {
    /// Create an execution fault for the given call site.
    pub fn execution(
        model: impl Into<String>,
        method: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: RemoteFaultKind::Execution,
            model: Some(model.into()),
            method: Some(method.into()),
            message: message.into(),
            source: None,
        }
    }

    /// Create an authentication fault.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self {
            kind: RemoteFaultKind::Authentication,
            model: None,
            method: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying transport error.
    #[must_use]
    pub fn with_source(mut self, source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }
}

impl Error {
    /// Is this a build-time error, knowable without any remote call?
    pub const fn is_build_error(&self) -> bool {
        matches!(
            self,
            Error::FieldNotFound(_)
                | Error::InvalidNavigation(_)
                | Error::Validation(_)
                | Error::Usage(_)
        )
    }

    /// Is this an authentication failure?
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Error::Remote(RemoteFault {
                kind: RemoteFaultKind::Authentication,
                ..
            })
        )
    }

    /// Tag a remote fault with the model/method it was attempting, when the
    /// transport did not already record them. Other errors pass unchanged.
    #[must_use]
    pub fn tag_remote(self, model: &str, method: &str) -> Self {
        match self {
            Error::Remote(mut fault) => {
                if fault.model.is_none() {
                    fault.model = Some(model.to_string());
                }
                if fault.method.is_none() {
                    fault.method = Some(method.to_string());
                }
                Error::Remote(fault)
            }
            other => other,
        }
    }

    /// Force a remote fault into the authentication class. Other errors pass
    /// unchanged.
    #[must_use]
    pub fn into_authentication(self) -> Self {
        match self {
            Error::Remote(mut fault) => {
                fault.kind = RemoteFaultKind::Authentication;
                Error::Remote(fault)
            }
            other => other,
        }
    }
}

fn write_suggestions(f: &mut fmt::Formatter<'_>, suggestions: &[String]) -> fmt::Result {
    if suggestions.is_empty() {
        return Ok(());
    }
    write!(f, ". Try one of the following: ")?;
    for (i, s) in suggestions.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "'{s}'")?;
    }
    Ok(())
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::FieldNotFound(e) => write!(f, "{e}"),
            Error::InvalidNavigation(e) => write!(f, "{e}"),
            Error::SchemaIntegrity(e) => write!(f, "Schema integrity error: {e}"),
            Error::Validation(e) => write!(f, "{e}"),
            Error::Usage(e) => write!(f, "{}", e.message),
            Error::Remote(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for FieldNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' not found in '{}'", self.field, self.model)?;
        write_suggestions(f, &self.suggestions)
    }
}

impl fmt::Display for InvalidNavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SchemaIntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}.{}': {}", self.model, self.field, self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "some fields have not been found on the model '{}':",
            self.model
        )?;
        for unknown in &self.unknown_fields {
            write!(f, "- '{}'", unknown.name)?;
            if !unknown.suggestions.is_empty() {
                write!(f, ". Perhaps you meant: ")?;
                for (i, s) in unknown.suggestions.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{s}'")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RemoteFaultKind::Authentication => write!(f, "authentication failed: {}", self.message),
            RemoteFaultKind::Execution => {
                write!(f, "remote fault")?;
                if let (Some(model), Some(method)) = (&self.model, &self.method) {
                    write!(f, " in {model}.{method}")?;
                }
                write!(f, ": {}", self.message)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Remote(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl From<FieldNotFoundError> for Error {
    fn from(err: FieldNotFoundError) -> Self {
        Error::FieldNotFound(err)
    }
}

impl From<InvalidNavigationError> for Error {
    fn from(err: InvalidNavigationError) -> Self {
        Error::InvalidNavigation(err)
    }
}

impl From<SchemaIntegrityError> for Error {
    fn from(err: SchemaIntegrityError) -> Self {
        Error::SchemaIntegrity(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

impl From<UsageError> for Error {
    fn from(err: UsageError) -> Self {
        Error::Usage(err)
    }
}

impl From<RemoteFault> for Error {
    fn from(err: RemoteFault) -> Self {
        Error::Remote(err)
    }
}

/// Result type alias for rpcmodel operations.
pub type Result<T> = std::result::Result<T, Error>;

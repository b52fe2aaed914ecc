use thiserror::Error;

/// Result type alias using CfgTreeError
pub type Result<T> = std::result::Result<T, CfgTreeError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing and CLI exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Declaration
    InvalidConfiguration,
    InvalidKey,
    DuplicateKey,
    NotASubsection,

    // Lookup
    NotFound,

    // Values / documents
    TypeMismatch,
    MalformedDocument,
    Decode,

    // Editor session
    EditorState,

    // Integration/IO
    InvalidInput,
    Io,
    Serialization,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidConfiguration => "ERR_INVALID_CONFIGURATION",
            ExErrorKind::InvalidKey => "ERR_INVALID_KEY",
            ExErrorKind::DuplicateKey => "ERR_DUPLICATE_KEY",
            ExErrorKind::NotASubsection => "ERR_NOT_A_SUBSECTION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::MalformedDocument => "ERR_MALFORMED_DOCUMENT",
            ExErrorKind::Decode => "ERR_DECODE",
            ExErrorKind::EditorState => "ERR_EDITOR_STATE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus optional
/// operation and node-path context for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    path: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            path: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add node path (or file path) context
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the path context, if any
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for cfgtree operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CfgTreeError {
    // ===== Declaration Errors =====
    /// An option outside the node kind's whitelist was supplied
    #[error("Invalid configuration: option '{option}' is not accepted by {kind} node '{key}'")]
    InvalidOption {
        key: String,
        kind: String,
        option: String,
    },

    /// An accepted option carried an unusable value
    #[error("Invalid configuration: option '{option}' of node '{key}': {reason}")]
    InvalidOptionValue {
        key: String,
        option: String,
        reason: String,
    },

    /// Node key is empty or contains the path separator
    #[error("Invalid node key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// A child with this key is already present under the parent
    #[error("Duplicate key '{key}' under '{parent}'")]
    DuplicateKey { parent: String, key: String },

    /// Children can only be attached to subsections
    #[error("Node '{key}' is not a subsection")]
    NotASubsection { key: String },

    // ===== Lookup Errors =====
    /// Path resolution failed
    #[error("Node not found: {path}")]
    NodeNotFound { path: String },

    /// Node id does not belong to this tree
    #[error("Unknown node id: {id}")]
    UnknownNode { id: usize },

    /// Control id does not belong to the open editor
    #[error("Unknown control id: {id}")]
    UnknownControl { id: usize },

    // ===== Value / Document Errors =====
    /// Value does not belong to the node's value class
    #[error("Type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// Persisted document does not have the shape of the tree
    #[error("Malformed document at '{path}': {reason}")]
    MalformedDocument { path: String, reason: String },

    /// Base64 payload could not be decoded
    #[error("Cannot decode base64 value at '{path}': {reason}")]
    Base64Decode { path: String, reason: String },

    /// Structured text (YAML) conversion failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    // ===== Editor Session Errors =====
    /// Operation requires an open editor session
    #[error("No editor session is open")]
    EditorNotOpen,

    /// An editor session is already open
    #[error("An editor session is already open")]
    EditorAlreadyOpen,
}

impl CfgTreeError {
    /// Map this error onto the canonical kind taxonomy
    pub fn kind(&self) -> ExErrorKind {
        match self {
            CfgTreeError::InvalidOption { .. } | CfgTreeError::InvalidOptionValue { .. } => {
                ExErrorKind::InvalidConfiguration
            }
            CfgTreeError::InvalidKey { .. } => ExErrorKind::InvalidKey,
            CfgTreeError::DuplicateKey { .. } => ExErrorKind::DuplicateKey,
            CfgTreeError::NotASubsection { .. } => ExErrorKind::NotASubsection,
            CfgTreeError::NodeNotFound { .. }
            | CfgTreeError::UnknownNode { .. }
            | CfgTreeError::UnknownControl { .. } => ExErrorKind::NotFound,
            CfgTreeError::TypeMismatch { .. } => ExErrorKind::TypeMismatch,
            CfgTreeError::MalformedDocument { .. } => ExErrorKind::MalformedDocument,
            CfgTreeError::Base64Decode { .. } => ExErrorKind::Decode,
            CfgTreeError::Serialization { .. } => ExErrorKind::Serialization,
            CfgTreeError::EditorNotOpen | CfgTreeError::EditorAlreadyOpen => {
                ExErrorKind::EditorState
            }
        }
    }

    /// True for errors caused by a persisted document rather than by the
    /// declaring program
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            CfgTreeError::TypeMismatch { .. }
                | CfgTreeError::MalformedDocument { .. }
                | CfgTreeError::Base64Decode { .. }
                | CfgTreeError::Serialization { .. }
        )
    }
}

impl From<CfgTreeError> for ExError {
    fn from(err: CfgTreeError) -> Self {
        let ex = ExError::new(err.kind()).with_message(err.to_string());
        match &err {
            CfgTreeError::NodeNotFound { path }
            | CfgTreeError::TypeMismatch { path, .. }
            | CfgTreeError::MalformedDocument { path, .. }
            | CfgTreeError::Base64Decode { path, .. } => ex.with_path(path.clone()),
            CfgTreeError::InvalidOption { key, .. }
            | CfgTreeError::InvalidOptionValue { key, .. }
            | CfgTreeError::InvalidKey { key, .. } => ex.with_path(key.clone()),
            _ => ex,
        }
    }
}

impl From<serde_yaml::Error> for CfgTreeError {
    fn from(err: serde_yaml::Error) -> Self {
        CfgTreeError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_option_maps_to_invalid_configuration() {
        let err = CfgTreeError::InvalidOption {
            key: "Name1".to_string(),
            kind: "input_box".to_string(),
            option: "items".to_string(),
        };
        assert_eq!(err.kind(), ExErrorKind::InvalidConfiguration);
        assert!(err.to_string().contains("items"));
        assert!(!err.is_document_error());
    }

    #[test]
    fn test_document_errors_are_flagged() {
        let err = CfgTreeError::MalformedDocument {
            path: "ss1".to_string(),
            reason: "expected a mapping".to_string(),
        };
        assert!(err.is_document_error());

        let ex: ExError = err.into();
        assert_eq!(ex.code(), "ERR_MALFORMED_DOCUMENT");
        assert_eq!(ex.path(), Some("ss1"));
    }

    #[test]
    fn test_ex_error_display() {
        let ex = ExError::new(ExErrorKind::Io)
            .with_op("save_file")
            .with_path("config.yaml")
            .with_message("permission denied");
        let text = ex.to_string();
        assert!(text.starts_with("[ERR_IO]"));
        assert!(text.contains("save_file"));
        assert!(text.contains("config.yaml"));
    }
}

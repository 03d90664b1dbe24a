use thiserror::Error;

/// A problem found by schema validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message} ({code})", display_path(.path))]
pub struct SchemaError {
    pub message: String,
    /// Path to the offending value (e.g. ["joe", "tasks", "[0]", "due"]).
    pub path: Vec<String>,
    /// Machine-readable error code.
    pub code: &'static str,
}

/// A problem found by reference validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}: {message} ({code})", display_path(.path))]
pub struct ValidationError {
    pub message: String,
    pub path: Vec<String>,
    pub code: &'static str,
}

impl SchemaError {
    pub(crate) fn new(code: &'static str, message: String, path: &[String]) -> Self {
        SchemaError {
            message,
            path: path.to_vec(),
            code,
        }
    }
}

impl ValidationError {
    pub fn unresolved_reference(name: &str, path: &[String]) -> Self {
        ValidationError {
            message: format!("Reference \"{}\" was never resolved", name),
            path: path.to_vec(),
            code: "unresolved-reference",
        }
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

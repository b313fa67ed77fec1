use thiserror::Error;

/// Errors surfaced on individual queries during a resolution run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Circular dependency detected: {path}. Queries cannot depend on each other in a cycle.")]
    CircularDependency { path: String },

    #[error("Failed to load plugin for query kind '{kind}': {reason}")]
    PluginLoad { kind: String, reason: String },

    #[error("Datasource not found for kind '{kind}'")]
    DatasourceNotFound { kind: String },

    #[error("Query execution failed: {0}")]
    Execution(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_dependency_message() {
        let err = QueryError::CircularDependency {
            path: "Query #1 -> Query #2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Circular dependency detected: Query #1 -> Query #2. \
             Queries cannot depend on each other in a cycle."
        );
    }
}

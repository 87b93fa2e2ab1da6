use thiserror::Error;

/// Unified error type for version resolution.
#[derive(Error, Debug)]
pub enum MonoverError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Conflicting version groups for project '{project}': {groups:?}")]
    GroupConflict { project: String, groups: Vec<String> },

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in monover.
pub type Result<T> = std::result::Result<T, MonoverError>;

impl MonoverError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        MonoverError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        MonoverError::Version(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        MonoverError::Tag(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        MonoverError::Branch(msg.into())
    }

    /// True when the error should abort the whole multi-project run rather
    /// than just the project that raised it.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            MonoverError::RepositoryNotFound(_) | MonoverError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonoverError::config("missing project table");
        assert_eq!(
            err.to_string(),
            "Configuration error: missing project table"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MonoverError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(MonoverError::version("x").to_string().contains("Version"));
        assert!(MonoverError::tag("x").to_string().contains("Tag"));
        assert!(MonoverError::branch("x").to_string().contains("Branch"));
    }

    #[test]
    fn test_group_conflict_message_names_groups() {
        let err = MonoverError::GroupConflict {
            project: "api".to_string(),
            groups: vec!["backend".to_string(), "services".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("api"));
        assert!(msg.contains("backend"));
        assert!(msg.contains("services"));
    }

    #[test]
    fn test_fatality_classification() {
        assert!(MonoverError::RepositoryNotFound("/tmp/x".into()).is_fatal_for_run());
        assert!(!MonoverError::config("x").is_fatal_for_run());
        assert!(!MonoverError::tag("x").is_fatal_for_run());
    }
}

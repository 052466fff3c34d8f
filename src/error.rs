//! Error types for the tree viewer core.
//!
//! Only configuration problems and rejected input surface as errors. Data
//! inconsistencies (unknown parent, duplicate id) are recovered during the
//! build and reported through `tracing` instead.

use crate::tree::NodeId;

pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("No container id configured")]
    MissingContainer,

    #[error("Container with ID \"{id}\" not found")]
    ContainerNotFound { id: String },

    #[error("Cyclic parent reference involving node {id}")]
    CyclicParent { id: NodeId },

    #[error("Invalid viewer options: {message}")]
    InvalidOptions { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = TreeError::ContainerNotFound {
            id: "tree".to_string(),
        };
        assert_eq!(err.to_string(), "Container with ID \"tree\" not found");

        let err = TreeError::CyclicParent { id: NodeId::Int(7) };
        assert_eq!(err.to_string(), "Cyclic parent reference involving node 7");
    }
}

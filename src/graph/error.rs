use thiserror::Error;

use super::model::NodeId;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph data must contain both a `nodes` list and a `links` key")]
    InvalidGraphShape,

    #[error("persisted graph state could not be parsed: {0}")]
    CorruptPersistedState(#[source] serde_json::Error),

    #[error("{field} is required")]
    InvalidNodeInput { field: &'static str },

    #[error("node entry {index} is not a JSON object")]
    MalformedNode { index: usize },

    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode graph: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;

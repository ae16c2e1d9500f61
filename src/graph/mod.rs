mod adapter;
mod edit;
mod error;
mod ids;
mod links;
mod model;
mod portals;
mod search;
pub mod store;

pub use edit::NodeInput;
pub use error::{GraphError, GraphResult};
pub use ids::{Reassigned, reassign_ids};
pub use links::derive_links;
pub use model::{GraphData, LayoutMode, Node, NodeId};
pub use portals::{PortalConnection, PortalIndex};
pub use search::{find_match, query_terms};

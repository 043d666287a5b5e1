//! Scene changes and nearest-neighbour lookups over them.

mod index;
mod types;

pub use index::SceneIndex;
pub use types::{FrameType, SceneChange, SearchResult};

pub mod codebook;
pub mod colors;
pub mod dialogs;
pub mod graph_layout;
pub mod persistent;
pub mod player;
pub mod refresh;
pub mod segments;
pub mod store;
pub mod task_timer;
pub mod transcript;
pub mod types;

pub use graph_layout::{build_layout, GraphLayout, GraphOptions};
pub use store::{CodebookStore, MemoryStore};
pub use types::{Category, Code, Segment};

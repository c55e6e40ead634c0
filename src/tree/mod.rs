pub mod index;
pub mod types;
pub mod walker;

pub use index::TreeIndex;
pub use types::{load_auspice, save_auspice, AuspiceJson, Mutation, TreeNode};

pub mod branches;
pub mod pairwise;
pub mod summary;
pub mod trajectory;

pub use branches::{BranchTable, SplitLabel};

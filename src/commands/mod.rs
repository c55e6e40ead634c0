pub mod alignment;
pub mod branches;
pub mod colors;
pub mod metadata;
pub mod package;
pub mod pairwise;
pub mod sample;
pub mod split;
pub mod trajectory;
pub mod trim;

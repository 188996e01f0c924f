//! Tree composition: node variants, version resolution, and the composer
//! implementing the lazy-tree contract.

pub mod composer;
pub mod node;
pub mod resolver;

pub use composer::{Root, TreeComposer};
pub use node::Node;
pub use resolver::{Strategy, VersionResolver};

//! Arena-backed HTML tree for block enhancement.
//!
//! This crate parses server-rendered HTML into a mutable tree, offers the small
//! query and mutation surface block decorators need, and serializes the result
//! back to markup.

pub mod escape;
pub mod node;
pub mod parse;
pub mod serialize;
pub mod tree;

pub use indextree::NodeId;
pub use node::{ElementData, NodeData};
pub use tree::{Document, DomError};

//! Data Models
//!
//! Records of the two owner-scoped path trees:
//!
//! - `Category` - free-form names joined by the category separator
//! - `LocationDefault` / `LocationFormat` / `LocationCode` - segments
//!   constrained per level by a character definition
//!
//! Both tree families implement [`PathTreeNode`], which is all the tree
//! engine and the storage boundary need to know about them.

mod category;
mod location;
mod scope;
mod tree_node;

pub use category::Category;
pub use location::{LocationCode, LocationDefault, LocationFormat, DEFAULT_LOCATION_SEPARATOR};
pub use scope::Scope;
pub use tree_node::{ParentFilter, PathTreeNode, TreeFilter};

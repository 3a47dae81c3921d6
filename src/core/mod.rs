//! Group entity model: ids, resources, group nodes and the owning arena.

pub mod forest;
pub mod group;
pub mod id;
pub mod resource;
pub mod tree;

pub use forest::Forest;
pub use group::Group;
pub use id::{GroupId, make_dynamic_group_id, make_group_id};
pub use resource::{ExistenceCheck, FsExistenceCheck, Resource, ResourceRecord};
pub use tree::GroupTree;

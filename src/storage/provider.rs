//! Storage provider capability.

use crate::core::{GroupId, GroupTree};
use crate::error::Result;

/// A persistence backend for groups.
///
/// The manager holds several of these at once and routes every group to the
/// provider it was loaded from or created in. Implementations persist whole
/// subtrees: `save_group` overwrites whatever was stored for the group and
/// its descendants, and `delete_group_id` drops the record together with the
/// nested children it persisted.
pub trait StorageProvider {
    /// Stable identifier, unique among the providers of one manager.
    fn id(&self) -> &str;

    /// Reconstruct the root groups this provider owns, subtrees attached.
    fn load_root_nodes(&mut self) -> Result<Vec<GroupTree>>;

    fn save_group(&mut self, group: &GroupTree) -> Result<()>;

    fn delete_group_id(&mut self, id: &GroupId) -> Result<()>;

    /// Clear everything this provider persisted.
    fn reset(&mut self) -> Result<()>;
}

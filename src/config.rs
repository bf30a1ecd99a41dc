use std::path::PathBuf;

use crate::archive::{DynFileArchive, RmfFileArchive, VolFileArchive};
use crate::explorer::ResourceExplorer;

/// An explorer with every built-in container format registered.
///
/// The order is VOL, DYN, RMF. Their magics are disjoint, so the order only
/// matters once third-party plugins are added after these.
pub fn default_resource_explorer(search_path: impl Into<PathBuf>) -> ResourceExplorer {
    let mut explorer = ResourceExplorer::new(search_path);
    explorer
        .add_plugin(VolFileArchive)
        .add_plugin(DynFileArchive)
        .add_plugin(RmfFileArchive);
    explorer
}

//! undotree-core: patch-based synchronization of an editor buffer with a
//! remote undo-tree authority.
//!
//! - **patch**: diff, apply and invert over [`Patch`].
//! - **graph**: client-side view of a file's edit-history tree.
//! - **tracker**: per-file state machine with debounced, coalesced pushes.
//! - **sync**: pull/apply/acknowledge cycle.
//! - **poller**: periodic driver for `sync` over every tracked file.

pub mod config;
pub mod editor;
pub mod error;
pub mod graph;
pub mod patch;
pub mod poller;
pub mod sync;
pub mod tracker;

pub use crate::config::Config;
pub use crate::editor::{EditorBuffer, NullEditor};
pub use crate::error::{Result, SyncError};
pub use crate::graph::{EditGraph, Node, ParentRef};
pub use crate::poller::{Poller, PollerHandle};
pub use crate::sync::{apply_change, ChangeOutcome, PullOutcome};
pub use crate::tracker::{FileSnapshot, FileTracker, TrackingPhase};

pub use undotree_http::{
    Change, ChangeMode, Delta, GraphClient, GraphRemote, Patch, Segment, ROOT_NODE_ID,
};

pub mod change;
pub mod delta;
pub mod node;
pub mod patch;

pub use change::{AckRequest, AckResponse, Change, ChangeMode, NavigateRequest, NavigateResponse};
pub use delta::Delta;
pub use node::{GraphView, NewNode, NodeCreated, NodeEntry};
pub use patch::{Patch, Segment};

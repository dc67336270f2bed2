//! Reference host runtime for lifecycle conformance testing.
//!
//! The host drives components through the documented lifecycle on a single
//! command loop, layers dialogs above them on a focus stack, and delivers
//! synthetic key events synchronously. Around it sit the queue-worker and
//! transfer managers plus the plain value types (snapshots, matrices,
//! packed dimensions) that conformance cases assert against.

pub mod component;
pub mod dialog;
pub mod geometry;
pub mod host;
pub mod input;
pub mod lifecycle;
pub mod snapshot;
pub mod transfer;
pub mod units;
pub mod worker;

pub use component::{Component, ComponentContext, ComponentId, StateBundle};
pub use dialog::Dialog;
pub use geometry::{Matrix, Point};
pub use host::{Host, HostConfig, HostError, HostResult};
pub use input::{KeyAction, KeyCode, KeyEvent};
pub use lifecycle::{Lifecycle, LifecycleError, LifecycleState, TransitionGraph};
pub use snapshot::{PixelFormat, SnapshotError, TaskSnapshot, Thumbnail};
pub use transfer::{
    CompletionWatcher, ContentStore, FailureReason, Query, TransferConfig, TransferError,
    TransferEvent, TransferId, TransferManager, TransferRequest, TransferRow, TransferStatus,
};
pub use units::{ComplexUnit, DisplayMetrics};
pub use worker::{Job, WorkerError, WorkerRunner, WorkerService};

pub mod prelude {
    pub use crate::component::*;
    pub use crate::dialog::*;
    pub use crate::geometry::*;
    pub use crate::host::*;
    pub use crate::input::*;
    pub use crate::lifecycle::*;
    pub use crate::snapshot::*;
    pub use crate::transfer::*;
    pub use crate::units::*;
    pub use crate::worker::*;
}

//! Editor-side state and operation coordination.
//!
//! The editor host is strictly single-threaded across its three
//! long-running operations (asset refresh, compilation, test execution).
//! This module owns everything on our side of that boundary:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    OperationCoordinator                  │
//! │   one execution slot, start-or-warn, caller timeouts     │
//! │        │                                    │            │
//! │        ▼ writes                             ▼ drives     │
//! │  ┌────────────┐                    ┌────────────────┐    │
//! │  │ StatusStore │◀── snapshots ──── │ EditorExecutor │    │
//! │  │ (1 writer)  │    (tools, HTTP)  │   (boundary)   │    │
//! │  └────────────┘                    └────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! [`ops`] is the shared vocabulary; [`bridge`] is the production
//! executor over the editor's HTTP control surface.

pub mod bridge;
pub mod coordinator;
pub mod executor;
pub mod ops;
pub mod status;

pub use bridge::UnityEditorBridge;
pub use coordinator::{CancelReply, OperationCoordinator, OperationReply};
pub use executor::EditorExecutor;
pub use ops::{OperationKind, TestMode, TestRunSpec};
pub use status::StatusStore;

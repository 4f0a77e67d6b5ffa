#![allow(clippy::missing_docs_in_private_items)]

pub mod cancellation;
pub mod progress;

pub use cancellation::{CancellationFlag, CancellationRegistry};
pub use progress::{EventKind, ProgressBus, ProgressEvent, DEFAULT_IDLE_TIMEOUT};

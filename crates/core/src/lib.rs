// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dh-core: identifiers, clocks, the structured error model, and the
//! progress subsystem shared by every other crate in the workspace.

pub mod macros;

pub mod clock;
pub mod error;
pub mod id;
pub mod ids;
pub mod progress;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ErrorKind, Severity, ToolError, ToolResult};
pub use id::{short, IdGen, SequentialIdGen, UuidIdGen};
pub use ids::{JobId, SagaId, SessionId, WorkspaceId};
pub use progress::{ProgressEvent, ProgressReceiver, ProgressSink, Stage};

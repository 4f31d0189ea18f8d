// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Opaque identifier types shared across the substrate.

crate::define_id! {
    /// Identifies a server-owned session: a workspace, a stage map, and a
    /// bag of accumulated non-fatal errors and client metadata.
    pub struct SessionId("ses-");
}

crate::define_id! {
    /// Identifies a sandboxed workspace directory owned by exactly one session.
    pub struct WorkspaceId("wks-");
}

crate::define_id! {
    /// Identifies an asynchronous job tracked by the Job Manager.
    pub struct JobId("job-");
}

crate::define_id! {
    /// Identifies one run of the workflow/saga engine.
    pub struct SagaId("wf-");
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;

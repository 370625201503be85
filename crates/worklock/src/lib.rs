//! worklock driver library.
//!
//! The binary is a thin shell over this crate:
//!
//! - [`project`] discovers the workspaces of a Yarn monorepo from its root
//!   `package.json` and loads the repository `yarn.lock` into an in-memory
//!   resolution graph.
//! - [`commands`] runs the per-workspace lockfile pipeline over a selection
//!   of workspaces, under a write-or-verify policy.
//! - [`cli`] defines the command-line surface.
//!
//! The closure computation itself lives in `worklock-lockfile`; everything
//! here is file I/O and orchestration around it.

pub mod berry;
pub mod cli;
pub mod commands;
pub mod project;

/// File name of the generated per-workspace lockfile.
pub const WORKSPACE_LOCKFILE_NAME: &str = "yarn.workspace.lock";

/// File name of the repository-wide lockfile consumed as input.
pub const REPO_LOCKFILE_NAME: &str = "yarn.lock";

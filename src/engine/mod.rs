//! The rules engine: preparing, committing and sequencing instructions.
//!
//! ## Key Components
//!
//! - [`Preparer`]: resolves an instruction against the current state
//! - [`Committer`]: applies concrete changes and logs them
//! - [`Game`]: owns the store, the log and the task queue; checkpoints,
//!   rollback and atomic blocks live here
//! - [`Session`]: the caller-facing task API, scoped to an actor and tier
//! - [`CustomFunction`]: named instructions translated at execution time
//!
//! Execution of a task goes prepare → commit → dispatch triggers. Automatic
//! effects run immediately, one level deeper; the others become new tasks.
//! Everything happens inside an atomic block, so a failure anywhere in a
//! cascade rolls the whole cascade back.

pub mod preparer;
pub mod committer;
pub mod custom;
pub mod game;
pub mod session;
mod executor;
mod lifecycle;
mod timeline;

pub use preparer::{Prepared, Preparer};
pub use committer::{Committer, Dependents};
pub use custom::{CustomFunction, CustomRegistry};
pub use game::Game;
pub use session::Session;

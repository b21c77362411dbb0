//! Tasks and the task queue.

pub mod task;
pub mod queue;

pub use task::{Task, TaskId};
pub use queue::TaskQueue;

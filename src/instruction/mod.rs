//! Instructions: what should happen, possibly with choices left open.
//!
//! - `Instruction`: the instruction tree and its normalizing constructors
//! - `Requirement` / `Metric`: count predicates and derived quantities
//! - `check_narrows`: the rules for replacing an instruction with a more specific one

pub mod ast;
pub mod requirement;
pub mod narrowing;

pub use ast::{Change, ChangeKind, Count, Instruction, Intensity};
pub use requirement::{Metric, Requirement};
pub use narrowing::check_narrows;

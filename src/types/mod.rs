//! Type expressions and the type-system seam.
//!
//! - `TypeExpr`: class name plus ordered arguments
//! - `TypeSystem`: everything the engine asks about types
//! - `ClassTable`: declaration-driven `TypeSystem` implementation

pub mod expr;
pub mod system;
pub mod table;

pub use expr::{ClassName, TypeExpr, ANYONE, OWNER, THIS};
pub use system::{CountLimit, TypeSystem};
pub use table::{ClassDefinition, ClassTable, LimitDecl, Param, COMPONENT};

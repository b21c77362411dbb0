//! Custom instructions.
//!
//! Games register named functions that turn `@name(args)` instructions into
//! ordinary instructions at execution time, based on the current state.

use rustc_hash::FxHashMap;

use crate::core::{EngineError, Result};
use crate::instruction::Instruction;
use crate::store::Reader;
use crate::types::TypeExpr;

/// A game-specific instruction translator.
pub trait CustomFunction {
    /// The name used in `Instruction::Custom`.
    fn name(&self) -> &str;

    /// Translate concrete arguments into an instruction.
    fn translate(&self, args: &[TypeExpr], reader: Reader<'_>) -> Result<Instruction>;
}

/// Registered custom functions, by name.
#[derive(Default)]
pub struct CustomRegistry {
    functions: FxHashMap<String, Box<dyn CustomFunction>>,
}

impl CustomRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function.
    ///
    /// Panics if a function with the same name already exists.
    pub fn register(&mut self, function: Box<dyn CustomFunction>) {
        let name = function.name().to_owned();
        if self.functions.contains_key(&name) {
            panic!("Custom function @{name} already registered");
        }
        self.functions.insert(name, function);
    }

    /// Check if a function is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Translate `@name(args)`.
    pub fn translate(&self, name: &str, args: &[TypeExpr], reader: Reader<'_>) -> Result<Instruction> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| EngineError::Custom(format!("no function @{name}")))?;
        if let Some(arg) = args.iter().find(|a| reader.types().is_abstract(a)) {
            return Err(EngineError::Abstract(format!("@{name} needs a concrete argument, got {arg}")));
        }
        function.translate(args, reader)
    }
}

impl std::fmt::Debug for CustomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("CustomRegistry").field("functions", &names).finish()
    }
}

//! Class table: the in-crate type system.
//!
//! Games describe their component classes with `ClassDefinition`s and
//! register them in a `ClassTable`. The table answers every
//! [`TypeSystem`] question from those declarations.
//!
//! ## Built-in classes
//!
//! - `Component`: abstract root, every class is a subclass of it
//! - `Anyone`: abstract supertype of all players
//! - `Owner`, `This`: abstract placeholders bound at use sites
//! - `Player1`..`PlayerN`: concrete player classes, see [`ClassTable::with_players`]

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{EngineError, PlayerId, Result};
use crate::triggers::Effect;

use super::expr::{ClassName, TypeExpr, ANYONE, OWNER, THIS};
use super::system::{CountLimit, TypeSystem};

/// Abstract root of the class hierarchy.
pub const COMPONENT: &str = "Component";

/// A type parameter of a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Arguments must be subclasses of this class.
    pub bound: ClassName,

    /// Used when the argument is omitted. Falls back to `bound`.
    pub default: Option<TypeExpr>,

    /// Whether the argument names a component that must exist.
    pub dependency: bool,
}

/// A count bound as declared, possibly mentioning `This`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitDecl {
    pub target: TypeExpr,
    pub min: u32,
    pub max: u32,
}

/// Static declaration of one component class.
///
/// ## Example
///
/// ```
/// use rust_rules::types::{ClassDefinition, ClassTable, TypeExpr, TypeSystem};
///
/// let mut table = ClassTable::with_players(2);
/// table.register(ClassDefinition::new("Resource").abstract_class().with_owner());
/// table.register(ClassDefinition::new("Plant").with_supertype("Resource").with_owner());
///
/// let plant: TypeExpr = "Plant<Player1>".parse().unwrap();
/// assert!(table.is_subtype_of(&plant, &TypeExpr::class("Resource")));
/// assert!(!table.is_abstract(&plant));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDefinition {
    pub name: ClassName,
    pub is_abstract: bool,
    pub supertypes: Vec<ClassName>,
    pub params: Vec<Param>,
    pub limits: Vec<LimitDecl>,
    pub effects: Vec<Effect>,
}

impl ClassDefinition {
    /// Create a new concrete class with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: ClassName::new(name),
            is_abstract: false,
            supertypes: Vec::new(),
            params: Vec::new(),
            limits: Vec::new(),
            effects: Vec::new(),
        }
    }

    /// Mark the class abstract (builder pattern).
    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a direct supertype (builder pattern).
    #[must_use]
    pub fn with_supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.push(ClassName::new(name));
        self
    }

    /// Add an owner parameter defaulting to `Owner` (builder pattern).
    #[must_use]
    pub fn with_owner(mut self) -> Self {
        self.params.push(Param {
            bound: ClassName::from(ANYONE),
            default: Some(TypeExpr::class(OWNER)),
            dependency: false,
        });
        self
    }

    /// Add a plain parameter (builder pattern).
    #[must_use]
    pub fn with_param(mut self, bound: impl Into<String>) -> Self {
        self.params.push(Param {
            bound: ClassName::new(bound),
            default: None,
            dependency: false,
        });
        self
    }

    /// Add a parameter naming a component that must exist (builder pattern).
    #[must_use]
    pub fn with_dependency(mut self, bound: impl Into<String>) -> Self {
        self.params.push(Param {
            bound: ClassName::new(bound),
            default: None,
            dependency: true,
        });
        self
    }

    /// Bound the count of this class to at most `max` (builder pattern).
    #[must_use]
    pub fn with_max(self, max: u32) -> Self {
        self.with_limit(TypeExpr::class(THIS), 0, max)
    }

    /// Bound the count of this class to at least `min` (builder pattern).
    #[must_use]
    pub fn with_min(self, min: u32) -> Self {
        self.with_limit(TypeExpr::class(THIS), min, u32::MAX)
    }

    /// Require exactly `count` components of this class (builder pattern).
    #[must_use]
    pub fn with_exactly(self, count: u32) -> Self {
        self.with_limit(TypeExpr::class(THIS), count, count)
    }

    /// Add a count bound on any type, which may mention `This` (builder pattern).
    #[must_use]
    pub fn with_limit(mut self, target: TypeExpr, min: u32, max: u32) -> Self {
        assert!(min <= max, "Limit minimum {min} exceeds maximum {max}");
        self.limits.push(LimitDecl { target, min, max });
        self
    }

    /// Declare an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Registry of class definitions implementing [`TypeSystem`].
#[derive(Clone, Debug)]
pub struct ClassTable {
    classes: FxHashMap<ClassName, ClassDefinition>,
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassTable {
    /// Create a table holding only the built-in classes.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            classes: FxHashMap::default(),
        };
        table.register(ClassDefinition::new(COMPONENT).abstract_class());
        table.register(ClassDefinition::new(ANYONE).abstract_class());
        table.register(ClassDefinition::new(OWNER).abstract_class().with_supertype(ANYONE));
        table.register(ClassDefinition::new(THIS).abstract_class());
        table
    }

    /// Create a table with the built-ins and `player_count` player classes.
    #[must_use]
    pub fn with_players(player_count: usize) -> Self {
        let mut table = Self::new();
        for player in PlayerId::all(player_count) {
            table.register(ClassDefinition::new(player.class_name()).with_supertype(ANYONE));
        }
        table
    }

    /// Register a class definition.
    ///
    /// Panics if a class with the same name already exists.
    pub fn register(&mut self, class: ClassDefinition) {
        if self.classes.contains_key(&class.name) {
            panic!("Class {} already registered", class.name);
        }
        self.classes.insert(class.name.clone(), class);
    }

    /// Get a class definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(&ClassName::from(name))
    }

    /// Check if a class exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of registered classes, built-ins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the table is empty (never true: built-ins are always present).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `class` followed by all of its transitive supertypes, nearest first.
    #[must_use]
    pub fn ancestors(&self, class: &ClassName) -> Vec<ClassName> {
        let mut seen = vec![class.clone()];
        let mut next = 0;
        while next < seen.len() {
            if let Some(def) = self.classes.get(&seen[next]) {
                for sup in &def.supertypes {
                    if !seen.contains(sup) {
                        seen.push(sup.clone());
                    }
                }
            }
            next += 1;
        }
        seen
    }

    /// Whether `sub` is `sup` or inherits from it.
    #[must_use]
    pub fn is_subclass(&self, sub: &ClassName, sup: &ClassName) -> bool {
        sub == sup || sup.as_str() == COMPONENT || self.ancestors(sub).contains(sup)
    }

    fn player_of(&self, class: &ClassName) -> Option<PlayerId> {
        PlayerId::from_class_name(class.as_str()).filter(|_| self.classes.contains_key(class))
    }
}

impl TypeSystem for ClassTable {
    fn resolve(&self, expr: &TypeExpr) -> Result<TypeExpr> {
        let def = self
            .classes
            .get(&expr.class)
            .ok_or_else(|| EngineError::Type(format!("unknown class {}", expr.class)))?;
        if expr.args.len() > def.params.len() {
            return Err(EngineError::Type(format!(
                "{} takes {} arguments, got {}",
                def.name,
                def.params.len(),
                expr.args.len()
            )));
        }

        let mut args = Vec::with_capacity(def.params.len());
        for (i, param) in def.params.iter().enumerate() {
            let arg = match (expr.args.get(i), &param.default) {
                (Some(arg), _) => self.resolve(arg)?,
                (None, Some(default)) => default.clone(),
                (None, None) => TypeExpr {
                    class: param.bound.clone(),
                    args: Vec::new(),
                },
            };
            if !arg.is_placeholder() && !self.is_subclass(&arg.class, &param.bound) {
                return Err(EngineError::Type(format!(
                    "{arg} is not a {} in {expr}",
                    param.bound
                )));
            }
            args.push(arg);
        }

        Ok(TypeExpr {
            class: expr.class.clone(),
            args,
        })
    }

    fn is_subtype_of(&self, sub: &TypeExpr, sup: &TypeExpr) -> bool {
        self.is_subclass(&sub.class, &sup.class)
            && sup
                .args
                .iter()
                .enumerate()
                .all(|(i, s)| sub.args.get(i).is_some_and(|a| self.is_subtype_of(a, s)))
    }

    fn is_abstract(&self, ty: &TypeExpr) -> bool {
        match self.classes.get(&ty.class) {
            None => true,
            Some(def) => {
                def.is_abstract
                    || ty.args.len() < def.params.len()
                    || ty.args.iter().any(|a| self.is_abstract(a))
            }
        }
    }

    fn single_concrete_subtype(&self, ty: &TypeExpr) -> Option<TypeExpr> {
        if !self.is_abstract(ty) {
            return Some(ty.clone());
        }
        let mut candidates = self
            .classes
            .values()
            .filter(|def| !def.is_abstract && self.is_subclass(&def.name, &ty.class));
        let only = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        let narrowed = TypeExpr {
            class: only.name.clone(),
            args: ty.args.clone(),
        };
        (!self.is_abstract(&narrowed)).then_some(narrowed)
    }

    fn limits_for(&self, ty: &TypeExpr) -> Vec<CountLimit> {
        let mut limits: Vec<CountLimit> = Vec::new();
        for class in self.ancestors(&ty.class) {
            let Some(def) = self.classes.get(&class) else {
                continue;
            };
            for decl in &def.limits {
                let bound = decl.target.replace_this(ty);
                let limit = CountLimit {
                    ty: bound,
                    min: decl.min,
                    max: decl.max,
                };
                if self.is_subtype_of(ty, &limit.ty) && !limits.contains(&limit) {
                    limits.push(limit);
                }
            }
        }
        limits
    }

    fn dependencies_of(&self, ty: &TypeExpr) -> SmallVec<[TypeExpr; 2]> {
        let Some(def) = self.classes.get(&ty.class) else {
            return SmallVec::new();
        };
        def.params
            .iter()
            .zip(&ty.args)
            .filter(|(param, arg)| {
                param.dependency && !arg.is_placeholder() && self.player_of(&arg.class).is_none()
            })
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    fn owner_of(&self, ty: &TypeExpr) -> Option<PlayerId> {
        self.player_of(&ty.class)
            .or_else(|| ty.args.iter().find_map(|a| self.player_of(&a.class)))
    }

    fn effects_of(&self, ty: &TypeExpr) -> Vec<Effect> {
        self.ancestors(&ty.class)
            .iter()
            .filter_map(|class| self.classes.get(class))
            .flat_map(|def| def.effects.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    fn sample_table() -> ClassTable {
        let mut table = ClassTable::with_players(2);
        table.register(ClassDefinition::new("Resource").abstract_class().with_owner().with_min(0));
        table.register(ClassDefinition::new("Plant").with_supertype("Resource").with_owner());
        table.register(ClassDefinition::new("Heat").with_supertype("Resource").with_owner());
        table.register(ClassDefinition::new("Step").abstract_class());
        table.register(ClassDefinition::new("OxygenStep").with_supertype("Step").with_max(14));
        table.register(ClassDefinition::new("City").with_owner());
        table.register(
            ClassDefinition::new("Road")
                .with_owner()
                .with_dependency("City"),
        );
        table
    }

    #[test]
    fn test_builtins_present() {
        let table = ClassTable::with_players(3);
        assert!(table.contains(COMPONENT));
        assert!(table.contains(ANYONE));
        assert!(table.contains("Player3"));
        assert!(!table.contains("Player4"));
        assert_eq!(table.len(), 7);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_class_panics() {
        let mut table = ClassTable::new();
        table.register(ClassDefinition::new("Plant"));
        table.register(ClassDefinition::new("Plant"));
    }

    #[test]
    fn test_resolve_fills_defaults() {
        let table = sample_table();
        assert_eq!(table.resolve(&ty("Plant")).unwrap(), ty("Plant<Owner>"));
        assert_eq!(table.resolve(&ty("Plant<Player2>")).unwrap(), ty("Plant<Player2>"));
        assert_eq!(table.resolve(&ty("Road<Player1>")).unwrap(), ty("Road<Player1, City>"));
    }

    #[test]
    fn test_resolve_rejects_bad_expressions() {
        let table = sample_table();
        assert!(matches!(table.resolve(&ty("Tree")), Err(EngineError::Type(_))));
        assert!(matches!(
            table.resolve(&ty("Plant<Player1, Player2>")),
            Err(EngineError::Type(_))
        ));
        assert!(matches!(table.resolve(&ty("Plant<Heat>")), Err(EngineError::Type(_))));
    }

    #[test]
    fn test_subtyping() {
        let table = sample_table();
        assert!(table.is_subtype_of(&ty("Plant<Player1>"), &ty("Resource")));
        assert!(table.is_subtype_of(&ty("Plant<Player1>"), &ty("Resource<Player1>")));
        assert!(table.is_subtype_of(&ty("Plant<Player1>"), &ty("Plant<Anyone>")));
        assert!(!table.is_subtype_of(&ty("Plant<Player1>"), &ty("Resource<Player2>")));
        assert!(!table.is_subtype_of(&ty("Plant"), &ty("Plant<Player1>")));
        assert!(table.is_subtype_of(&ty("Heat<Player2>"), &ty(COMPONENT)));
    }

    #[test]
    fn test_abstractness() {
        let table = sample_table();
        assert!(table.is_abstract(&ty("Resource<Player1>")));
        assert!(table.is_abstract(&ty("Plant")));
        assert!(table.is_abstract(&ty("Plant<Anyone>")));
        assert!(table.is_abstract(&ty("Plant<Owner>")));
        assert!(!table.is_abstract(&ty("Plant<Player1>")));
        assert!(table.is_abstract(&ty("Unknown")));
    }

    #[test]
    fn test_single_concrete_subtype() {
        let table = sample_table();
        assert_eq!(table.single_concrete_subtype(&ty("Step")), Some(ty("OxygenStep")));
        assert_eq!(table.single_concrete_subtype(&ty("Resource<Player1>")), None);
        assert_eq!(
            table.single_concrete_subtype(&ty("Plant<Player1>")),
            Some(ty("Plant<Player1>"))
        );
    }

    #[test]
    fn test_limits_bind_this() {
        let table = sample_table();
        let limits = table.limits_for(&ty("OxygenStep"));
        assert_eq!(limits, vec![CountLimit::max(ty("OxygenStep"), 14)]);

        let inherited = table.limits_for(&ty("Plant<Player1>"));
        assert_eq!(inherited, vec![CountLimit::min(ty("Plant<Player1>"), 0)]);
    }

    #[test]
    fn test_dependencies_and_owner() {
        let table = sample_table();
        let road = ty("Road<Player1, City<Player1>>");
        assert_eq!(table.dependencies_of(&road).to_vec(), vec![ty("City<Player1>")]);
        assert!(table.dependencies_of(&ty("Plant<Player1>")).is_empty());

        assert_eq!(table.owner_of(&road), Some(PlayerId(0)));
        assert_eq!(table.owner_of(&ty("Player2")), Some(PlayerId(1)));
        assert_eq!(table.owner_of(&ty("OxygenStep")), None);
    }
}

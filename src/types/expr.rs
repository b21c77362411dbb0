//! Type expressions.
//!
//! A `TypeExpr` is a class name with ordered type arguments, e.g.
//! `Plant<Player1>` or `Tile<Player2, Area<Mars>>`. The engine never
//! interprets class names itself; it asks a [`TypeSystem`](super::TypeSystem).
//!
//! Three class names are reserved placeholders that stand for something
//! bound later: [`THIS`], [`OWNER`] and [`ANYONE`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, PlayerId};

/// Placeholder for the component an effect or limit is declared on.
pub const THIS: &str = "This";

/// Placeholder for the owning player of the surrounding component.
pub const OWNER: &str = "Owner";

/// Abstract class covering every player.
pub const ANYONE: &str = "Anyone";

/// Name of a class in the type system.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassName(pub String);

impl ClassName {
    /// Create a new class name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The raw name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl From<PlayerId> for ClassName {
    fn from(player: PlayerId) -> Self {
        Self(player.class_name())
    }
}

impl std::fmt::Display for ClassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A class name applied to zero or more type arguments.
///
/// ## Example
///
/// ```
/// use rust_rules::types::TypeExpr;
///
/// let plant: TypeExpr = "Plant<Player1>".parse().unwrap();
/// assert_eq!(plant, TypeExpr::new("Plant", [TypeExpr::class("Player1")]));
/// assert_eq!(plant.to_string(), "Plant<Player1>");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeExpr {
    /// The class being referenced.
    pub class: ClassName,

    /// Type arguments, in parameter order.
    pub args: Vec<TypeExpr>,
}

impl TypeExpr {
    /// A bare class reference with no arguments.
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            class: ClassName::new(name),
            args: Vec::new(),
        }
    }

    /// A class applied to arguments.
    #[must_use]
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = TypeExpr>) -> Self {
        Self {
            class: ClassName::new(name),
            args: args.into_iter().collect(),
        }
    }

    /// The class expression of a player.
    #[must_use]
    pub fn player(player: PlayerId) -> Self {
        Self::class(player.class_name())
    }

    /// Append an argument (builder pattern).
    #[must_use]
    pub fn with_arg(mut self, arg: TypeExpr) -> Self {
        self.args.push(arg);
        self
    }

    /// Whether this expression is exactly a bare placeholder class.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.args.is_empty() && matches!(self.class.as_str(), THIS | OWNER)
    }

    /// Whether `name` appears anywhere in this expression.
    #[must_use]
    pub fn mentions(&self, name: &str) -> bool {
        self.class.as_str() == name || self.args.iter().any(|a| a.mentions(name))
    }

    /// Replace every bare occurrence of `name` with `replacement`.
    #[must_use]
    pub fn substitute(&self, name: &str, replacement: &TypeExpr) -> TypeExpr {
        if self.class.as_str() == name && self.args.is_empty() {
            return replacement.clone();
        }
        TypeExpr {
            class: self.class.clone(),
            args: self.args.iter().map(|a| a.substitute(name, replacement)).collect(),
        }
    }

    /// Bind the `This` placeholder.
    #[must_use]
    pub fn replace_this(&self, this: &TypeExpr) -> TypeExpr {
        self.substitute(THIS, this)
    }

    /// Bind the `Owner` placeholder to a player.
    #[must_use]
    pub fn replace_owner(&self, owner: PlayerId) -> TypeExpr {
        self.substitute(OWNER, &TypeExpr::player(owner))
    }
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeExpr {
    type Err = EngineError;

    /// Parse `Name` or `Name<Arg, Arg<...>>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = ExprParser { input: s, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_whitespace();
        if parser.pos != s.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(expr)
    }
}

struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl ExprParser<'_> {
    fn expr(&mut self) -> Result<TypeExpr, EngineError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = &self.input[start..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 || !rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(self.error("expected a class name"));
        }
        self.pos += len;
        let mut expr = TypeExpr::class(&self.input[start..start + len]);

        self.skip_whitespace();
        if self.eat('<') {
            loop {
                expr.args.push(self.expr()?);
                self.skip_whitespace();
                if self.eat(',') {
                    continue;
                }
                if self.eat('>') {
                    break;
                }
                return Err(self.error("expected ',' or '>'"));
            }
        }
        Ok(expr)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, what: &str) -> EngineError {
        EngineError::Type(format!("{what} at offset {} in `{}`", self.pos, self.input))
    }
}

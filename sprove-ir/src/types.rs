#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Type expressions as they appear on IR variables and binders.
///
/// Constraint witnesses (class dictionaries, equality evidence and tuples of
/// them) are distinguished from ordinary data types so that dictionary-passing
/// call sites can be recognised without guessing from names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Type {
    /// Nominal type constructor applied to zero or more arguments.
    Con {
        name: String,
        #[serde(default)]
        args: Vec<Type>,
    },
    Var(String),
    Fun(Box<Type>, Box<Type>),
    ForAll {
        var: String,
        body: Box<Type>,
    },
    /// Class dictionary, e.g. `Num Int`.
    Class {
        name: String,
        #[serde(default)]
        args: Vec<Type>,
    },
    /// Equality evidence `a ~ b`.
    Equality(Box<Type>, Box<Type>),
    Tuple(Vec<Type>),
}

impl Type {
    pub fn con(name: impl Into<String>) -> Self {
        Type::Con {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn con_app(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Con {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Type::Var(name.into())
    }

    pub fn fun(arg: Type, res: Type) -> Self {
        Type::Fun(Box::new(arg), Box::new(res))
    }

    /// `a -> b -> ... -> res`
    pub fn funs(args: impl IntoIterator<Item = Type>, res: Type) -> Self {
        let args: Vec<Type> = args.into_iter().collect();
        args.into_iter().rev().fold(res, |acc, a| Type::fun(a, acc))
    }

    pub fn class(name: impl Into<String>, args: Vec<Type>) -> Self {
        Type::Class {
            name: name.into(),
            args,
        }
    }

    pub fn equality(lhs: Type, rhs: Type) -> Self {
        Type::Equality(Box::new(lhs), Box::new(rhs))
    }

    pub fn for_all(var: impl Into<String>, body: Type) -> Self {
        Type::ForAll {
            var: var.into(),
            body: Box::new(body),
        }
    }
}

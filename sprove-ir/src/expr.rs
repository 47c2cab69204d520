#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::{SrcLoc, Type};

/// A variable occurrence or binder together with its type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Var {
    pub name: String,
    pub ty: Type,
}

impl Var {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i128),
    Char(char),
    String(String),
    Double(f64),
}

/// Evidence that one type may be viewed as another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coercion {
    pub from: Type,
    pub to: Type,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bind {
    NonRec(Var, Box<Expr>),
    Rec(Vec<(Var, Expr)>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltCon {
    Default,
    Lit(Literal),
    DataCon(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alt {
    pub con: AltCon,
    #[serde(default)]
    pub binders: Vec<Var>,
    pub rhs: Expr,
}

/// The typed functional IR.
///
/// Type application is `App(f, Type(t))`; everything else that carries no
/// value (bare types and coercions) also appears as an argument position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Var(Var),
    Lit(Literal),
    App(Box<Expr>, Box<Expr>),
    Lam(Var, Box<Expr>),
    Let {
        bind: Bind,
        body: Box<Expr>,
    },
    Case {
        scrutinee: Box<Expr>,
        binder: Var,
        ty: Type,
        alts: Vec<Alt>,
    },
    Cast(Box<Expr>, Coercion),
    /// Location marker around a subexpression.
    Tick(SrcLoc, Box<Expr>),
    Type(Type),
    Coercion(Coercion),
}

impl Expr {
    pub fn var(name: impl Into<String>, ty: Type) -> Self {
        Expr::Var(Var::new(name, ty))
    }

    pub fn app(fun: Expr, arg: Expr) -> Self {
        Expr::App(Box::new(fun), Box::new(arg))
    }

    pub fn apps(fun: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(fun, Expr::app)
    }

    pub fn ty_app(fun: Expr, ty: Type) -> Self {
        Expr::app(fun, Expr::Type(ty))
    }

    pub fn lam(binder: Var, body: Expr) -> Self {
        Expr::Lam(binder, Box::new(body))
    }

    pub fn tick(loc: SrcLoc, inner: Expr) -> Self {
        Expr::Tick(loc, Box::new(inner))
    }

    /// `op @ty dict`: a class method selected through its dictionary.
    pub fn method(op: Var, ty: Type, dict: Var) -> Self {
        Expr::app(Expr::ty_app(Expr::Var(op), ty), Expr::Var(dict))
    }
}

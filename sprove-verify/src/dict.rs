#![forbid(unsafe_code)]

//! Recognition of class-method calls made through dictionary passing.
//!
//! `op @t dict` is resolved to the operation pre-bound for `(op, kind(t))`
//! only when `dict` really is constraint evidence. Anything else is an
//! ordinary call and is evaluated normally.

use sprove_ir::{Expr, Type, Var};

use crate::env::Env;
use crate::kind::BaseTypeResolver;
use crate::value::SVal;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WitnessKind {
    Class,
    Equality,
    ConstraintTuple,
    None,
}

impl WitnessKind {
    pub fn is_witness(&self) -> bool {
        !matches!(self, WitnessKind::None)
    }
}

pub fn witness_kind(ty: &Type) -> WitnessKind {
    match ty {
        Type::Class { .. } => WitnessKind::Class,
        Type::Equality(..) => WitnessKind::Equality,
        Type::Tuple(items)
            if !items.is_empty() && items.iter().all(|t| witness_kind(t).is_witness()) =>
        {
            WitnessKind::ConstraintTuple
        }
        _ => WitnessKind::None,
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CallSite<'e> {
    Ordinary,
    Dictionary {
        op: &'e Var,
        ty_arg: &'e Type,
        witness: WitnessKind,
    },
}

/// Classify the application `fun arg`. Only a dictionary passed as a
/// variable is recognised; one built by applying dictionary functions
/// (`$fOrdList $fOrdInt`) is an ordinary argument.
pub fn classify_call<'e>(fun: &'e Expr, arg: &'e Expr) -> CallSite<'e> {
    let Expr::App(head, ty) = fun else {
        return CallSite::Ordinary;
    };
    let (Expr::Var(op), Expr::Type(ty_arg)) = (head.as_ref(), ty.as_ref()) else {
        return CallSite::Ordinary;
    };
    let Expr::Var(dict) = arg else {
        return CallSite::Ordinary;
    };
    match witness_kind(&dict.ty) {
        WitnessKind::None => CallSite::Ordinary,
        witness => CallSite::Dictionary {
            op,
            ty_arg,
            witness,
        },
    }
}

/// Resolve `fun arg` to a pre-bound operation, if it is a dictionary call
/// whose type argument has a base kind with an environment entry.
pub fn resolve_dictionary_call(
    fun: &Expr,
    arg: &Expr,
    types: &BaseTypeResolver,
    env: &Env<'_>,
) -> Option<SVal> {
    let CallSite::Dictionary { op, ty_arg, .. } = classify_call(fun, arg) else {
        return None;
    };
    let kind = types.resolve(ty_arg)?;
    env.lookup(&op.name, kind).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnvKey, Globals};
    use crate::kind::BaseKind;

    fn int() -> Type {
        Type::con("Int")
    }

    fn plus() -> Var {
        Var::new("+", Type::for_all("a", Type::var("a")))
    }

    fn env() -> Env<'static> {
        let mut g = Globals::new();
        g.insert(
            EnvKey::new("+", BaseKind::Signed(64)),
            SVal::func("+", |v| Ok(v)),
        );
        Env::root(g)
    }

    fn types() -> BaseTypeResolver {
        BaseTypeResolver::new().with("Int", BaseKind::Signed(64))
    }

    #[test]
    fn witness_kinds() {
        assert_eq!(witness_kind(&Type::class("Num", vec![int()])), WitnessKind::Class);
        assert_eq!(witness_kind(&Type::equality(Type::var("a"), int())), WitnessKind::Equality);
        assert_eq!(
            witness_kind(&Type::Tuple(vec![
                Type::class("Num", vec![int()]),
                Type::equality(Type::var("a"), int()),
            ])),
            WitnessKind::ConstraintTuple
        );
        // A data type that merely looks like a class is not evidence.
        assert_eq!(witness_kind(&Type::con_app("Num", vec![int()])), WitnessKind::None);
        assert_eq!(witness_kind(&Type::Tuple(vec![])), WitnessKind::None);
        assert_eq!(
            witness_kind(&Type::Tuple(vec![Type::class("Num", vec![int()]), int()])),
            WitnessKind::None
        );
    }

    #[test]
    fn resolves_real_dictionary_call() {
        let fun = Expr::ty_app(Expr::Var(plus()), int());
        let dict = Expr::var("$fNumInt", Type::class("Num", vec![int()]));
        assert!(matches!(
            classify_call(&fun, &dict),
            CallSite::Dictionary { witness: WitnessKind::Class, .. }
        ));
        let env = env();
        let resolved = resolve_dictionary_call(&fun, &dict, &types(), &env);
        assert!(matches!(resolved, Some(SVal::Func(_))));
    }

    #[test]
    fn ordinary_value_argument_is_not_a_dictionary() {
        let fun = Expr::ty_app(Expr::Var(plus()), int());
        let not_dict = Expr::var("n", Type::con_app("Num", vec![int()]));
        assert!(matches!(classify_call(&fun, &not_dict), CallSite::Ordinary));
        let env = env();
        assert!(resolve_dictionary_call(&fun, &not_dict, &types(), &env).is_none());
    }

    #[test]
    fn unresolved_kind_or_missing_entry_is_not_a_dictionary_call() {
        let env = env();
        let dict = Expr::var("$d", Type::class("Num", vec![Type::con("Double")]));
        let fun = Expr::ty_app(Expr::Var(plus()), Type::con("Double"));
        assert!(resolve_dictionary_call(&fun, &dict, &types(), &env).is_none());

        let minus = Var::new("-", Type::for_all("a", Type::var("a")));
        let fun = Expr::ty_app(Expr::Var(minus), int());
        let dict = Expr::var("$d", Type::class("Num", vec![int()]));
        assert!(resolve_dictionary_call(&fun, &dict, &types(), &env).is_none());
    }

    #[test]
    fn applied_dictionary_is_ordinary() {
        let fun = Expr::ty_app(Expr::Var(plus()), int());
        let list = Type::con_app("List", vec![int()]);
        let builder = Expr::var(
            "$fOrdList",
            Type::fun(Type::class("Ord", vec![int()]), Type::class("Ord", vec![list])),
        );
        let dict = Expr::app(builder, Expr::var("$fOrdInt", Type::class("Ord", vec![int()])));
        assert!(matches!(classify_call(&fun, &dict), CallSite::Ordinary));
    }
}

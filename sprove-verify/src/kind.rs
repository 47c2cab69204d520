#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fmt;

use sprove_ir::Type;

/// SMT sort assigned to a nominal, non-parametric IR type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseKind {
    Bool,
    /// Unbounded mathematical integer.
    Integer,
    /// Two's complement bit-vector of the given width.
    Signed(u32),
    Unsigned(u32),
}

impl BaseKind {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, BaseKind::Bool)
    }

    pub fn is_bitvector(&self) -> bool {
        matches!(self, BaseKind::Signed(_) | BaseKind::Unsigned(_))
    }

    pub fn width(&self) -> Option<u32> {
        match self {
            BaseKind::Signed(w) | BaseKind::Unsigned(w) => Some(*w),
            _ => None,
        }
    }

    pub fn smt_sort(&self) -> String {
        match self {
            BaseKind::Bool => "Bool".to_string(),
            BaseKind::Integer => "Int".to_string(),
            BaseKind::Signed(w) | BaseKind::Unsigned(w) => format!("(_ BitVec {w})"),
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseKind::Bool => f.write_str("Bool"),
            BaseKind::Integer => f.write_str("Integer"),
            BaseKind::Signed(w) => write!(f, "Int{w}"),
            BaseKind::Unsigned(w) => write!(f, "Word{w}"),
        }
    }
}

/// Nominal type name -> base kind.
///
/// Only a bare constructor with no type arguments resolves; applied,
/// functional, polymorphic and constraint types are always unknown.
#[derive(Clone, Debug, Default)]
pub struct BaseTypeResolver {
    table: HashMap<String, BaseKind>,
}

impl BaseTypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, kind: BaseKind) {
        self.table.insert(name.into(), kind);
    }

    pub fn with(mut self, name: impl Into<String>, kind: BaseKind) -> Self {
        self.register(name, kind);
        self
    }

    pub fn resolve(&self, ty: &Type) -> Option<BaseKind> {
        match ty {
            Type::Con { name, args } if args.is_empty() => self.table.get(name).copied(),
            _ => None,
        }
    }

    pub fn kinds(&self) -> impl Iterator<Item = BaseKind> + '_ {
        self.table.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> BaseTypeResolver {
        BaseTypeResolver::new()
            .with("Bool", BaseKind::Bool)
            .with("Int", BaseKind::Signed(64))
            .with("Maybe", BaseKind::Integer)
    }

    #[test]
    fn bare_registered_constructor_resolves() {
        let r = resolver();
        assert_eq!(r.resolve(&Type::con("Bool")), Some(BaseKind::Bool));
        assert_eq!(r.resolve(&Type::con("Int")), Some(BaseKind::Signed(64)));
    }

    #[test]
    fn compound_types_never_resolve() {
        let r = resolver();
        // registered head, but applied to an argument
        assert_eq!(r.resolve(&Type::con_app("Maybe", vec![Type::con("Int")])), None);
        assert_eq!(r.resolve(&Type::fun(Type::con("Int"), Type::con("Int"))), None);
        assert_eq!(r.resolve(&Type::var("a")), None);
        assert_eq!(r.resolve(&Type::class("Int", vec![])), None);
        assert_eq!(r.resolve(&Type::Tuple(vec![Type::con("Int")])), None);
        assert_eq!(r.resolve(&Type::con("Double")), None);
    }

    #[test]
    fn sorts_and_names() {
        assert_eq!(BaseKind::Unsigned(8).smt_sort(), "(_ BitVec 8)");
        assert_eq!(BaseKind::Integer.smt_sort(), "Int");
        assert_eq!(BaseKind::Signed(32).to_string(), "Int32");
        assert_eq!(BaseKind::Unsigned(16).to_string(), "Word16");
    }
}

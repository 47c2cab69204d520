#![forbid(unsafe_code)]

use std::collections::HashMap;

use sprove_ir::SrcLoc;

use crate::kind::BaseKind;
use crate::value::SVal;

/// Environment key: one source identifier may be specialised to several kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnvKey {
    pub name: String,
    pub kind: BaseKind,
}

impl EnvKey {
    pub fn new(name: impl Into<String>, kind: BaseKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

pub type Globals = HashMap<EnvKey, SVal>;

/// A scope in the symbolic environment.
///
/// Child scopes borrow their parent, so entering a binder never mutates
/// anything a sibling branch can observe; the child is dropped on return.
#[derive(Debug)]
pub struct Env<'a> {
    parent: Option<&'a Env<'a>>,
    bindings: Globals,
    loc: Option<SrcLoc>,
}

impl Env<'static> {
    pub fn root(globals: Globals) -> Self {
        Env {
            parent: None,
            bindings: globals,
            loc: None,
        }
    }
}

impl<'a> Env<'a> {
    pub fn extend(&'a self, name: impl Into<String>, kind: BaseKind, value: SVal) -> Env<'a> {
        let mut bindings = Globals::new();
        bindings.insert(EnvKey::new(name, kind), value);
        Env {
            parent: Some(self),
            bindings,
            loc: self.loc.clone(),
        }
    }

    pub fn extend_all(&'a self, globals: Globals) -> Env<'a> {
        Env {
            parent: Some(self),
            bindings: globals,
            loc: self.loc.clone(),
        }
    }

    /// Same bindings, new current location.
    pub fn at(&'a self, loc: SrcLoc) -> Env<'a> {
        Env {
            parent: Some(self),
            bindings: Globals::new(),
            loc: Some(loc),
        }
    }

    pub fn lookup(&self, name: &str, kind: BaseKind) -> Option<&SVal> {
        let key = EnvKey::new(name, kind);
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(v) = env.bindings.get(&key) {
                return Some(v);
            }
            scope = env.parent;
        }
        None
    }

    pub fn loc(&self) -> Option<&SrcLoc> {
        self.loc.as_ref()
    }
}

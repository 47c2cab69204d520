#![forbid(unsafe_code)]

//! Compact, Haskell-flavoured rendering of IR fragments for diagnostics.

use std::fmt;

use crate::{Alt, AltCon, Bind, Coercion, Expr, Literal, Type};

const TOP: u8 = 0;
const FUN: u8 = 1;
const ARG: u8 = 2;

pub fn format_type(ty: &Type) -> String {
    let mut out = String::new();
    write_type(&mut out, ty, TOP);
    out
}

pub fn format_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, TOP);
    out
}

fn write_type(out: &mut String, ty: &Type, prec: u8) {
    match ty {
        Type::Con { name, args } | Type::Class { name, args } => {
            if args.is_empty() {
                out.push_str(name);
                return;
            }
            let paren = prec >= ARG;
            if paren {
                out.push('(');
            }
            out.push_str(name);
            for a in args {
                out.push(' ');
                write_type(out, a, ARG);
            }
            if paren {
                out.push(')');
            }
        }
        Type::Var(v) => out.push_str(v),
        Type::Fun(a, r) => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            write_type(out, a, FUN);
            out.push_str(" -> ");
            write_type(out, r, TOP);
            if paren {
                out.push(')');
            }
        }
        Type::ForAll { var, body } => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            out.push_str("forall ");
            out.push_str(var);
            out.push_str(". ");
            write_type(out, body, TOP);
            if paren {
                out.push(')');
            }
        }
        Type::Equality(a, b) => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            write_type(out, a, ARG);
            out.push_str(" ~ ");
            write_type(out, b, ARG);
            if paren {
                out.push(')');
            }
        }
        Type::Tuple(items) => {
            out.push('(');
            for (i, t) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_type(out, t, TOP);
            }
            out.push(')');
        }
    }
}

fn write_literal(out: &mut String, lit: &Literal) {
    match lit {
        Literal::Int(n) => out.push_str(&n.to_string()),
        Literal::Char(c) => out.push_str(&format!("{c:?}")),
        Literal::String(s) => out.push_str(&format!("{s:?}")),
        Literal::Double(d) => out.push_str(&d.to_string()),
    }
}

fn write_coercion(out: &mut String, co: &Coercion) {
    write_type(out, &co.from, ARG);
    out.push_str(" ~> ");
    write_type(out, &co.to, ARG);
}

fn write_expr(out: &mut String, expr: &Expr, prec: u8) {
    match expr {
        Expr::Var(v) => out.push_str(&v.name),
        Expr::Lit(l) => write_literal(out, l),
        Expr::App(f, a) => {
            let paren = prec >= ARG;
            if paren {
                out.push('(');
            }
            write_expr(out, f, FUN);
            out.push(' ');
            if let Expr::Type(t) = a.as_ref() {
                out.push('@');
                write_type(out, t, ARG);
            } else {
                write_expr(out, a, ARG);
            }
            if paren {
                out.push(')');
            }
        }
        Expr::Lam(v, body) => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            out.push_str("\\(");
            out.push_str(&v.name);
            out.push_str(" :: ");
            write_type(out, &v.ty, TOP);
            out.push_str(") -> ");
            write_expr(out, body, TOP);
            if paren {
                out.push(')');
            }
        }
        Expr::Let { bind, body } => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            match bind {
                Bind::NonRec(v, rhs) => {
                    out.push_str("let ");
                    out.push_str(&v.name);
                    out.push_str(" = ");
                    write_expr(out, rhs, TOP);
                }
                Bind::Rec(binds) => {
                    out.push_str("letrec ");
                    for (i, (v, rhs)) in binds.iter().enumerate() {
                        if i > 0 {
                            out.push_str("; ");
                        }
                        out.push_str(&v.name);
                        out.push_str(" = ");
                        write_expr(out, rhs, TOP);
                    }
                }
            }
            out.push_str(" in ");
            write_expr(out, body, TOP);
            if paren {
                out.push(')');
            }
        }
        Expr::Case {
            scrutinee,
            binder,
            alts,
            ..
        } => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            out.push_str("case ");
            write_expr(out, scrutinee, TOP);
            out.push_str(" of ");
            out.push_str(&binder.name);
            out.push_str(" { ");
            for (i, alt) in alts.iter().enumerate() {
                if i > 0 {
                    out.push_str("; ");
                }
                write_alt(out, alt);
            }
            out.push_str(" }");
            if paren {
                out.push(')');
            }
        }
        Expr::Cast(e, co) => {
            let paren = prec >= FUN;
            if paren {
                out.push('(');
            }
            write_expr(out, e, FUN);
            out.push_str(" |> ");
            write_coercion(out, co);
            if paren {
                out.push(')');
            }
        }
        // Location markers never change meaning, so they are not shown.
        Expr::Tick(_, inner) => write_expr(out, inner, prec),
        Expr::Type(t) => {
            out.push('@');
            write_type(out, t, ARG);
        }
        Expr::Coercion(co) => {
            out.push_str("<co ");
            write_coercion(out, co);
            out.push('>');
        }
    }
}

fn write_alt(out: &mut String, alt: &Alt) {
    match &alt.con {
        AltCon::Default => out.push('_'),
        AltCon::Lit(l) => write_literal(out, l),
        AltCon::DataCon(c) => out.push_str(c),
    }
    for b in &alt.binders {
        out.push(' ');
        out.push_str(&b.name);
    }
    out.push_str(" -> ");
    write_expr(out, &alt.rhs, TOP);
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_type(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_expr(self))
    }
}

//! Deterministic text renderer for the calculus tree (§6 "Pretty-printers").
//! Plain `format!`-based, matching the teacher's diagnostics style rather
//! than pulling in a layout-engine crate (§11).

use std::fmt::Write;

use crate::expr::{BinaryOp, Expr, ExprKind, UnaryOp};
use crate::pattern::{Pattern, Qualifier};

#[must_use]
pub fn format_expr(e: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, e);
    out
}

fn write_pattern(out: &mut String, p: &Pattern) {
    match p {
        Pattern::Idn(s, _) => {
            let _ = write!(out, "{s}");
        }
        Pattern::Prod(items, _) => {
            let _ = write!(out, "(");
            for (i, it) in items.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                write_pattern(out, it);
            }
            let _ = write!(out, ")");
        }
    }
}

fn write_qualifier(out: &mut String, q: &Qualifier) {
    match q {
        Qualifier::Gen(Some(p), e) => {
            write_pattern(out, p);
            let _ = write!(out, " <- ");
            write_expr(out, e);
        }
        Qualifier::Gen(None, e) => {
            let _ = write!(out, "<- ");
            write_expr(out, e);
        }
        Qualifier::Bind(p, e) => {
            let _ = write!(out, "let ");
            write_pattern(out, p);
            let _ = write!(out, " = ");
            write_expr(out, e);
        }
        Qualifier::Exp(e) => write_expr(out, e),
    }
}

fn binop_str(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Eq => "=",
        BinaryOp::Neq => "<>",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
    }
}

fn write_expr(out: &mut String, e: &Expr) {
    match &e.kind {
        ExprKind::BoolConst(b) => {
            let _ = write!(out, "{b}");
        }
        ExprKind::IntConst(i) => {
            let _ = write!(out, "{i}");
        }
        ExprKind::FloatConst(f) => {
            let _ = write!(out, "{f}");
        }
        ExprKind::StringConst(s) => {
            let _ = write!(out, "{s:?}");
        }
        ExprKind::IdnExp(s) => {
            let _ = write!(out, "{s}");
        }
        ExprKind::RecordProj(e, f) => {
            write_expr(out, e);
            let _ = write!(out, ".{f}");
        }
        ExprKind::RecordCons(fields) => {
            let _ = write!(out, "(");
            for (i, f) in fields.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                let _ = write!(out, "{}: ", f.idn);
                write_expr(out, &f.value);
            }
            let _ = write!(out, ")");
        }
        ExprKind::IfThenElse(c, t, f) => {
            let _ = write!(out, "if ");
            write_expr(out, c);
            let _ = write!(out, " then ");
            write_expr(out, t);
            let _ = write!(out, " else ");
            write_expr(out, f);
        }
        ExprKind::BinaryExp(op, l, r) => {
            let _ = write!(out, "(");
            write_expr(out, l);
            let _ = write!(out, " {} ", binop_str(*op));
            write_expr(out, r);
            let _ = write!(out, ")");
        }
        ExprKind::UnaryExp(op, e) => {
            let prefix = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "not ",
                UnaryOp::ToBag => "to_bag ",
                UnaryOp::ToList => "to_list ",
            };
            let _ = write!(out, "{prefix}");
            write_expr(out, e);
        }
        ExprKind::MergeMonoid(m, l, r) => {
            write_expr(out, l);
            let _ = write!(out, " <{m}> ");
            write_expr(out, r);
        }
        ExprKind::ZeroCollectionMonoid(m) => {
            let _ = write!(out, "{{}}:{m}");
        }
        ExprKind::ConsCollectionMonoid(m, e) => {
            let _ = write!(out, "{m}(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::MultiCons(m, items) => {
            let _ = write!(out, "{m}(");
            for (i, it) in items.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                write_expr(out, it);
            }
            let _ = write!(out, ")");
        }
        ExprKind::Comp(m, qs, body) => {
            let _ = write!(out, "for (");
            for (i, q) in qs.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, "; ");
                }
                write_qualifier(out, q);
            }
            let _ = write!(out, ") yield {m} ");
            write_expr(out, body);
        }
        ExprKind::Select(s) => {
            let _ = write!(out, "select ");
            if s.distinct {
                let _ = write!(out, "distinct ");
            }
            write_expr(out, &s.proj);
            let _ = write!(out, " from ");
            for (i, q) in s.from.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                write_qualifier(out, q);
            }
            if let Some(w) = &s.where_ {
                let _ = write!(out, " where ");
                write_expr(out, w);
            }
            if let Some(g) = &s.group_by {
                let _ = write!(out, " group by ");
                write_expr(out, g);
            }
            if let Some(h) = &s.having {
                let _ = write!(out, " having ");
                write_expr(out, h);
            }
        }
        ExprKind::FunAbs(p, body) => {
            let _ = write!(out, "\\");
            write_pattern(out, p);
            let _ = write!(out, " -> ");
            write_expr(out, body);
        }
        ExprKind::FunApp(f, a) => {
            write_expr(out, f);
            let _ = write!(out, "(");
            write_expr(out, a);
            let _ = write!(out, ")");
        }
        ExprKind::ExpBlock(binds, e) => {
            let _ = write!(out, "{{ ");
            for (p, u) in binds {
                write_pattern(out, p);
                let _ = write!(out, " := ");
                write_expr(out, u);
                let _ = write!(out, "; ");
            }
            write_expr(out, e);
            let _ = write!(out, " }}");
        }
        ExprKind::Partition => {
            let _ = write!(out, "partition");
        }
        ExprKind::Star => {
            let _ = write!(out, "*");
        }
        ExprKind::Into(e1, e2) => {
            write_expr(out, e1);
            let _ = write!(out, " into ");
            write_expr(out, e2);
        }
        ExprKind::Sum(e) => {
            let _ = write!(out, "sum(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::Max(e) => {
            let _ = write!(out, "max(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::Min(e) => {
            let _ = write!(out, "min(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::Avg(e) => {
            let _ = write!(out, "avg(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::Count(e) => {
            let _ = write!(out, "count(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::Exists(e) => {
            let _ = write!(out, "exists(");
            write_expr(out, e);
            let _ = write!(out, ")");
        }
        ExprKind::InExp(e1, e2) => {
            write_expr(out, e1);
            let _ = write!(out, " in ");
            write_expr(out, e2);
        }
    }
}

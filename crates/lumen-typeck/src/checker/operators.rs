//! Unary and binary operators, pipelines and operator interfaces.
//!
//! Arithmetic follows the numeric promotion rules in [`crate::numeric`].
//! When an operand pair has no builtin meaning the operator falls back to
//! its interface (`Add`, `Sub`, `Neg`, ...) if the left operand implements
//! it.

use lumen_ast::{BinaryOp, Call, Expr, ExprKind, UnaryOp};

use super::calls::CallArg;
use super::{placeholders, Checker};
use crate::assignable::is_assignable;
use crate::error::{DiagnosticKind, Located};
use crate::numeric::{resolve_division_binary, resolve_integer_binary, resolve_numeric_binary};
use crate::ty::{IntegerType, Type};
use crate::unions;

/// Interface and method an operator dispatches to for non-builtin operands.
fn operator_interface(op: BinaryOp) -> Option<(&'static str, &'static str)> {
    Some(match op {
        BinaryOp::Add => ("Add", "add"),
        BinaryOp::Sub => ("Sub", "sub"),
        BinaryOp::Mul => ("Mul", "mul"),
        BinaryOp::Div => ("Div", "div"),
        BinaryOp::Mod => ("Rem", "rem"),
        BinaryOp::BitAnd => ("BitAnd", "bit_and"),
        BinaryOp::BitOr => ("BitOr", "bit_or"),
        BinaryOp::BitXor => ("BitXor", "bit_xor"),
        BinaryOp::Shl => ("Shl", "shl"),
        BinaryOp::Shr => ("Shr", "shr"),
        _ => return None,
    })
}

/// The operand a binary diagnostic points at: the rightmost leaf of the
/// left operand, so `a + b + "x"` reports next to the offending operator.
fn diagnostic_operand(left: &Expr) -> &Expr {
    let mut current = left;
    while let ExprKind::Binary { right, .. } = &current.kind {
        current = right;
    }
    current
}

/// An unsuffixed integer literal next to another integer adopts that
/// integer's width when it fits.
fn adapt_literal(ty: Type, other: &Type) -> Type {
    match (&ty, other) {
        (Type::Integer(lit), Type::Integer(target))
            if !lit.explicit && lit.suffix != target.suffix && (target.explicit || target.literal.is_none()) =>
        {
            match &lit.literal {
                Some(value) if value.fits(target.suffix) => Type::Integer(IntegerType::new(target.suffix)),
                _ => ty,
            }
        }
        _ => ty,
    }
}

impl Checker {
    pub(crate) fn check_unary(&mut self, expr: &Expr, op: UnaryOp, operand: &Expr) -> Type {
        let ty = self.check_expr(operand);
        match op {
            UnaryOp::Not => Type::bool(),
            _ if ty.is_unknown() => Type::Unknown,
            UnaryOp::Negate if ty.is_numeric() || ty.is_type_param() => negate_literal(ty),
            UnaryOp::BitNot if ty.is_integer() || ty.is_type_param() => unions::without_literal(ty),
            UnaryOp::Negate | UnaryOp::BitNot => {
                let (iface, method, wanted) = match op {
                    UnaryOp::Negate => ("Neg", "neg", "numeric"),
                    _ => ("Not", "not", "integer"),
                };
                if let Some(result) = self.unary_interface(&ty, iface, method) {
                    return result;
                }
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("unary '{op}' requires {wanted} operand (got {ty})"),
                    expr,
                );
                Type::Unknown
            }
        }
    }

    pub(crate) fn check_binary(&mut self, expr: &Expr, op: BinaryOp, left: &Expr, right: &Expr) -> Type {
        if op.is_pipe() {
            return self.check_pipe(expr, left, right);
        }
        let left_ty = self.check_expr(left);
        let right_ty = self.check_expr(right);

        if op == BinaryOp::Pow && (left_ty.is_ratio() || right_ty.is_ratio()) {
            self.report(DiagnosticKind::Mismatch, "'^' does not support Ratio operands", expr);
            return Type::Unknown;
        }
        let l = adapt_literal(left_ty.clone(), &right_ty);
        let r = adapt_literal(right_ty, &left_ty);
        self.binary_result(op, &l, &r, diagnostic_operand(left))
    }

    /// Result type of `l op r`, reporting at `at` when the operands do
    /// not support the operator. Shared with compound assignment.
    pub(crate) fn binary_result(&mut self, op: BinaryOp, l: &Type, r: &Type, at: &dyn Located) -> Type {
        let outcome = match op {
            BinaryOp::And | BinaryOp::Or => return unions::merge_branch_types(&[l.clone(), r.clone()]),
            BinaryOp::Eq | BinaryOp::NotEq => return Type::bool(),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                if l.is_unknown() || r.is_unknown() || (l.is_string() && r.is_string()) || is_char_pair(l, r) {
                    return Type::bool();
                }
                match resolve_numeric_binary(l, r) {
                    Ok(_) => return Type::bool(),
                    Err(_) if self.supports_comparison(l, r) => return Type::bool(),
                    Err(err) => {
                        self.report(DiagnosticKind::Mismatch, format!("'{op}' {err}"), at);
                        return Type::bool();
                    }
                }
            }
            BinaryOp::Add if l.is_string() && r.is_string() => return Type::string(),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Pow => resolve_numeric_binary(l, r),
            BinaryOp::Div => resolve_division_binary(l, r),
            BinaryOp::DivMod => resolve_integer_binary(l, r).map(|int| match self.env.lookup_global("DivMod") {
                Some(def @ Type::Struct(_)) => Type::applied(def.clone(), vec![int]),
                _ => Type::Unknown,
            }),
            BinaryOp::FloorDiv
            | BinaryOp::Mod
            | BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::Shl
            | BinaryOp::Shr => resolve_integer_binary(l, r),
            BinaryOp::Pipe | BinaryOp::PipeForward => Ok(Type::Unknown),
        };
        match outcome {
            Ok(ty) => ty,
            Err(err) => {
                if let Some((iface, method)) = operator_interface(op) {
                    if let Some(result) = self.binary_interface(l, r, iface, method) {
                        return result;
                    }
                }
                self.report(DiagnosticKind::Mismatch, format!("'{op}' {err}"), at);
                Type::Unknown
            }
        }
    }

    // ── Operator interfaces ────────────────────────────────────────────

    fn binary_interface(&self, left: &Type, right: &Type, iface: &str, method: &str) -> Option<Type> {
        if left.is_unknown() {
            return None;
        }
        let def = self.interface_def(iface)?;
        let args: Vec<Type> = [right.clone(), Type::Unknown]
            .into_iter()
            .take(def.type_params.len())
            .collect();
        self.type_implements(left, &def, &args).ok()?;
        let Ok(Some(Type::Function(sig))) = self.find_method(left, method, false) else {
            return Some(Type::Unknown);
        };
        if let Some(expected) = sig.params.first() {
            if !right.is_unknown() && !expected.is_unknown() && !is_assignable(right, expected) {
                return None;
            }
        }
        Some(sig.ret.clone())
    }

    fn unary_interface(&self, operand: &Type, iface: &str, method: &str) -> Option<Type> {
        let def = self.interface_def(iface)?;
        let args: Vec<Type> = std::iter::once(Type::Unknown).take(def.type_params.len()).collect();
        self.type_implements(operand, &def, &args).ok()?;
        match self.find_method(operand, method, false) {
            Ok(Some(Type::Function(sig))) => Some(sig.ret.clone()),
            _ => Some(Type::Unknown),
        }
    }

    /// `PartialOrd Rhs`, or `Ord` between mutually assignable operands.
    fn supports_comparison(&self, left: &Type, right: &Type) -> bool {
        if let Some(def) = self.interface_def("PartialOrd") {
            let args: Vec<Type> = std::iter::once(right.clone()).take(def.type_params.len()).collect();
            if self.type_implements(left, &def, &args).is_ok() {
                return true;
            }
        }
        match self.interface_def("Ord") {
            Some(def) => {
                self.type_implements(left, &def, &[]).is_ok() && is_assignable(left, right) && is_assignable(right, left)
            }
            None => false,
        }
    }

    // ── Pipelines ──────────────────────────────────────────────────────

    /// `left |> right` calls `right` with `left` as its first argument.
    /// A call on the right receives `left` ahead of its own arguments;
    /// a placeholder expression is checked as a one-argument lambda.
    fn check_pipe(&mut self, expr: &Expr, left: &Expr, right: &Expr) -> Type {
        let subject = self.check_expr(left);
        self.with_topic(subject.clone(), |c| {
            if placeholders::plan(right).is_some() {
                let expected = Type::function(vec![subject.clone()], Type::Unknown);
                let callee = c.check_expected(right, &expected);
                return c.apply_callee(expr, callee, vec![CallArg::Typed(subject)], None);
            }
            if let ExprKind::Call(Call {
                callee, args, type_args, ..
            }) = &right.kind
            {
                let mut all = vec![CallArg::Typed(subject)];
                all.extend(args.iter().map(CallArg::Expr));
                let ty = c.check_call_parts(right, callee, type_args, all, None);
                return c.record(right.id, ty);
            }
            c.check_call_parts(expr, right, &[], vec![CallArg::Typed(subject)], None)
        })
    }
}

/// `-5` keeps its literal value so bounds checks see the sign.
fn negate_literal(ty: Type) -> Type {
    match ty {
        Type::Integer(mut int) => {
            if let Some(lit) = &mut int.literal {
                lit.negative = !lit.negative && lit.magnitude != Some(0);
            }
            Type::Integer(int)
        }
        other => other,
    }
}

fn is_char_pair(left: &Type, right: &Type) -> bool {
    *left == Type::char() && *right == Type::char()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::IntLiteral;
    use crate::ty::IntegerSuffix;

    fn literal(value: i128) -> Type {
        Type::Integer(IntegerType {
            suffix: IntegerSuffix::I32,
            literal: Some(IntLiteral::from_i128(value)),
            explicit: false,
        })
    }

    #[test]
    fn literals_adopt_the_other_operand_width() {
        let byte = Type::int(IntegerSuffix::U8);
        assert_eq!(adapt_literal(literal(1), &byte), byte);
        assert_eq!(adapt_literal(literal(300), &byte), literal(300));
        let float = Type::f64();
        assert_eq!(adapt_literal(literal(1), &float), literal(1));
    }

    #[test]
    fn negation_flips_literal_sign() {
        let Type::Integer(int) = negate_literal(literal(128)) else {
            panic!("expected an integer");
        };
        let value = int.literal.unwrap();
        assert_eq!(value.to_string(), "-128");
        assert!(value.fits(IntegerSuffix::I8));
    }

    #[test]
    fn operators_map_to_interfaces() {
        assert_eq!(operator_interface(BinaryOp::Mod), Some(("Rem", "rem")));
        assert_eq!(operator_interface(BinaryOp::Shl), Some(("Shl", "shl")));
        assert_eq!(operator_interface(BinaryOp::FloorDiv), None);
    }
}

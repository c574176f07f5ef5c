//! Calls: argument checking, generic instantiation and partial
//! application.
//!
//! A generic callee is instantiated per call. Explicit type arguments bind
//! first, then each argument binds whatever parameters its declared type
//! mentions, then the expected result type fills what is left. The
//! instantiated signature's obligations join the module's pending list.

use lumen_ast::{Call, Expr, ExprKind, TypeExpr};

use super::Checker;
use crate::error::{DiagnosticKind, Located};
use crate::matching::match_type_argument;
use crate::specs::Site;
use crate::subst::{self, Bindings};
use crate::ty::{FunctionType, Type};
use crate::unions;

/// Builtins that only make sense inside a `proc` or `spawn` body.
const ASYNC_BUILTINS: &[&str] = &["proc_yield", "proc_cancelled"];

/// One call argument: a source expression, or a value whose type is
/// already known (the subject of a pipeline).
pub(crate) enum CallArg<'a> {
    Expr(&'a Expr),
    Typed(Type),
}

impl Checker {
    pub(crate) fn check_call(&mut self, expr: &Expr, call: &Call, expected: Option<&Type>) -> Type {
        let args: Vec<CallArg<'_>> = call.args.iter().map(CallArg::Expr).collect();
        self.check_call_parts(expr, &call.callee, &call.type_args, args, expected)
    }

    /// Check a call of `callee` with `args`, recording the callee's type.
    pub(crate) fn check_call_parts(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        type_args: &[TypeExpr],
        args: Vec<CallArg<'_>>,
        expected: Option<&Type>,
    ) -> Type {
        let callee_ty = match &callee.kind {
            ExprKind::Member { object, member, safe } => {
                let ty = self.check_member(callee, object, member, *safe, true);
                self.record(callee.id, ty)
            }
            _ => self.check_expr(callee),
        };
        self.check_builtin_context(expr, callee);
        self.apply(expr, callee, callee_ty, type_args, args, expected)
    }

    /// Apply an already-typed callee.
    pub(crate) fn apply_callee(
        &mut self,
        expr: &Expr,
        callee_ty: Type,
        args: Vec<CallArg<'_>>,
        expected: Option<&Type>,
    ) -> Type {
        self.apply(expr, expr, callee_ty, &[], args, expected)
    }

    fn check_builtin_context(&mut self, expr: &Expr, callee: &Expr) {
        let Some(name) = callee.as_identifier() else {
            return;
        };
        if !ASYNC_BUILTINS.contains(&name) || self.cx.async_depth > 0 {
            return;
        }
        // A local binding of the same name is an ordinary call.
        match (self.env.lookup(name), self.env.lookup_global(name)) {
            (Some(local), Some(global)) if std::ptr::eq(local, global) => {}
            _ => return,
        }
        self.report(
            DiagnosticKind::ControlFlow,
            format!("{name} must be called inside an asynchronous task"),
            expr,
        );
    }

    fn apply(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        callee_ty: Type,
        type_args: &[TypeExpr],
        args: Vec<CallArg<'_>>,
        expected: Option<&Type>,
    ) -> Type {
        match callee_ty {
            Type::Function(sig) => self.apply_function(expr, &sig, type_args, args, expected),
            Type::Unknown | Type::TypeParam(_) => {
                self.check_args_unhinted(&args);
                Type::Unknown
            }
            other => self.apply_value(expr, callee, &other, args),
        }
    }

    fn check_args_unhinted(&mut self, args: &[CallArg<'_>]) -> Vec<Type> {
        args.iter().map(|arg| self.arg_type(arg, None)).collect()
    }

    fn arg_type(&mut self, arg: &CallArg<'_>, hint: Option<&Type>) -> Type {
        match arg {
            CallArg::Expr(expr) => match hint {
                Some(hint) => self.check_expected(expr, hint),
                None => self.check_expr(expr),
            },
            CallArg::Typed(ty) => ty.clone(),
        }
    }

    // ── Functions ──────────────────────────────────────────────────────

    fn apply_function(
        &mut self,
        expr: &Expr,
        sig: &FunctionType,
        type_args: &[TypeExpr],
        args: Vec<CallArg<'_>>,
        expected: Option<&Type>,
    ) -> Type {
        if sig.is_unknown_signature() {
            self.check_args_unhinted(&args);
            return Type::Unknown;
        }
        let generics: Vec<&str> = sig
            .type_params
            .iter()
            .map(|param| param.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();

        let mut bindings = Bindings::default();
        if !type_args.is_empty() {
            if type_args.len() != generics.len() {
                self.report(
                    DiagnosticKind::Arity,
                    format!(
                        "function expects {} type arguments, got {}",
                        generics.len(),
                        type_args.len()
                    ),
                    expr,
                );
            }
            for (name, arg) in generics.iter().zip(type_args) {
                let ty = self.resolve_local_type(arg);
                bindings.insert((*name).to_string(), ty);
            }
        }

        let max = sig.params.len();
        let min = required_params(&sig.params);
        if args.len() > max {
            self.report(
                DiagnosticKind::Arity,
                format!("function expects {max} arguments, got {}", args.len()),
                expr,
            );
        }

        let mut actuals = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let Some(param) = sig.params.get(i) else {
                actuals.push(self.arg_type(arg, None));
                continue;
            };
            let hint = subst::substitute(param, &bindings);
            let actual = self.arg_type(arg, Some(&hint));
            if !generics.is_empty() {
                bind_from(&unions::without_literal(actual.clone()), param, &generics, &mut bindings);
            }
            actuals.push(actual);
        }
        if let Some(expected) = expected {
            if !generics.is_empty() {
                bind_from(expected, &sig.ret, &generics, &mut bindings);
            }
        }

        let instantiated = subst::substitute_function(sig, &bindings);
        for (i, (arg, actual)) in args.iter().zip(&actuals).enumerate() {
            let Some(param) = instantiated.params.get(i) else {
                break;
            };
            let at: &dyn Located = match arg {
                CallArg::Expr(arg) => *arg,
                CallArg::Typed(_) => expr,
            };
            self.check_assignable(actual, param, at, || {
                format!("argument {} has type {actual}, expected {param}", i + 1)
            });
        }

        let site = Site::of(expr);
        self.obligations.extend(
            instantiated
                .obligations
                .iter()
                .filter(|ob| !ob.subject.is_open() && ob.subject.type_params().is_empty())
                .cloned()
                .map(|mut ob| {
                    ob.site = site;
                    ob
                }),
        );

        if args.len() < min {
            let remaining = instantiated.params[args.len()..].to_vec();
            return Type::function(remaining, instantiated.ret);
        }
        instantiated.ret
    }

    // ── Callable values ────────────────────────────────────────────────

    /// A non-function callee is callable through `Apply`.
    fn apply_value(&mut self, expr: &Expr, callee: &Expr, callee_ty: &Type, args: Vec<CallArg<'_>>) -> Type {
        match self.find_method(callee_ty, "apply", false) {
            Ok(Some(Type::Function(sig))) => {
                if args.len() != sig.params.len() {
                    self.report(
                        DiagnosticKind::Arity,
                        format!("Apply.apply expects {} arguments, got {}", sig.params.len(), args.len()),
                        expr,
                    );
                }
                for (i, arg) in args.iter().enumerate() {
                    let hint = sig.params.get(i);
                    let actual = self.arg_type(arg, hint);
                    if let (Some(param), CallArg::Expr(at)) = (hint, arg) {
                        self.check_assignable(&actual, param, *at, || {
                            format!("argument {} has type {actual}, expected {param}", i + 1)
                        });
                    }
                }
                return sig.ret.clone();
            }
            Ok(Some(_)) => {
                self.check_args_unhinted(&args);
                return Type::Unknown;
            }
            Err(error) => {
                self.check_args_unhinted(&args);
                return self.report_member_error(error, callee);
            }
            Ok(None) => {}
        }

        if let Some((def, iface_args)) = callee_ty.as_interface() {
            if def.name == "Apply" {
                if args.len() != 1 {
                    self.report(
                        DiagnosticKind::Arity,
                        format!("Apply.apply expects 1 argument, got {}", args.len()),
                        expr,
                    );
                }
                let input = iface_args.first().cloned();
                for arg in &args {
                    self.arg_type(arg, input.as_ref());
                }
                return iface_args.get(1).cloned().unwrap_or(Type::Unknown);
            }
        }

        self.check_args_unhinted(&args);
        self.report(
            DiagnosticKind::Mismatch,
            format!("cannot call non-callable value {callee_ty} (missing Apply implementation)"),
            callee,
        );
        Type::Unknown
    }
}

/// Trailing nullable parameters may be omitted.
fn required_params(params: &[Type]) -> usize {
    params.len()
        - params
            .iter()
            .rev()
            .take_while(|param| matches!(param, Type::Nullable(_)))
            .count()
}

/// Extend `bindings` with what `actual` says about the callee's own
/// generic parameters mentioned in `pattern`. A conflicting match binds
/// nothing; the argument check reports it.
pub(super) fn bind_from(actual: &Type, pattern: &Type, generics: &[&str], bindings: &mut Bindings) {
    let mut trial = bindings.clone();
    if match_type_argument(actual, pattern, &mut trial).is_none() {
        return;
    }
    for (name, ty) in trial {
        if ty.is_unknown() || !generics.contains(&name.as_str()) {
            continue;
        }
        bindings.entry(name).or_insert(ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::IntegerSuffix;

    #[test]
    fn trailing_nullable_parameters_are_optional() {
        let params = vec![Type::i32(), Type::nullable(Type::string()), Type::nullable(Type::bool())];
        assert_eq!(required_params(&params), 1);
        assert_eq!(required_params(&[Type::nullable(Type::i32()), Type::i32()]), 2);
    }

    #[test]
    fn bindings_come_from_arguments() {
        let mut bindings = Bindings::default();
        let pattern = Type::array(Type::param("T"));
        bind_from(&Type::array(Type::int(IntegerSuffix::U8)), &pattern, &["T"], &mut bindings);
        assert_eq!(bindings.get("T"), Some(&Type::int(IntegerSuffix::U8)));

        // The first binding sticks.
        bind_from(&Type::array(Type::string()), &pattern, &["T"], &mut bindings);
        assert_eq!(bindings.get("T"), Some(&Type::int(IntegerSuffix::U8)));
    }

    #[test]
    fn only_callee_generics_are_bound() {
        let mut bindings = Bindings::default();
        let pattern = Type::function(vec![Type::param("T")], Type::param("U"));
        let actual = Type::function(vec![Type::i32()], Type::string());
        bind_from(&actual, &pattern, &["U"], &mut bindings);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.get("U"), Some(&Type::string()));
    }
}

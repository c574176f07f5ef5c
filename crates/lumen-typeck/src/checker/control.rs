//! Conditionals, loops, breakpoints, `break`/`continue` and iterator
//! literals.
//!
//! Branching constructs merge their branch types with
//! [`unions::merge_allow_union`], so `if c { 1 } else { "x" }` is
//! `i32 | string`. Loops merge their body type with every value a `break`
//! carries out of them.

use lumen_ast::{Block, Expr, Ident, MatchClause, OrClause, Pattern, PatternKind, Stmt, TypeExpr};

use super::patterns::Binding;
use super::Checker;
use crate::assignable::normalize_special;
use crate::error::{DiagnosticKind, Located};
use crate::ty::Type;
use crate::unions;

fn merge_all(types: impl IntoIterator<Item = Type>) -> Type {
    types
        .into_iter()
        .fold(Type::Unknown, |acc, ty| unions::merge_allow_union(&acc, &ty))
}

/// Element type a `for` loop binds for `ty`, if `ty` is iterable.
fn iterable_element(ty: &Type) -> Option<Type> {
    match normalize_special(ty) {
        Type::Unknown | Type::TypeParam(_) => Some(Type::Unknown),
        Type::Array(element) | Type::Range(element) | Type::Iterator(element) => Some(*element),
        Type::Map(key, _) => Some(*key),
        other if other.is_string() => Some(Type::char()),
        Type::Applied(base, args) if matches!(base.struct_name(), Some("Set" | "List" | "Deque")) => {
            Some(args.first().cloned().unwrap_or(Type::Unknown))
        }
        _ => None,
    }
}

impl Checker {
    /// Conditions of `if`, `while` and guards must be `bool`.
    pub(crate) fn check_condition(&mut self, condition: &Expr, what: &str) {
        let ty = self.check_expr(condition);
        if !ty.is_open() && !ty.is_bool() {
            self.report(
                DiagnosticKind::Mismatch,
                format!("{what} must be bool (got {ty})"),
                condition,
            );
        }
    }

    // ── Branching ──────────────────────────────────────────────────────

    pub(crate) fn check_if(&mut self, condition: &Expr, then: &Block, or_clauses: &[OrClause]) -> Type {
        self.check_condition(condition, "if condition");
        let mut branches = vec![self.check_block(then)];
        let mut exhaustive = false;
        for clause in or_clauses {
            match &clause.condition {
                Some(condition) => self.check_condition(condition, "if condition"),
                None => exhaustive = true,
            }
            branches.push(self.check_block(&clause.body));
        }
        if !exhaustive {
            branches.push(Type::nil());
        }
        merge_all(branches)
    }

    pub(crate) fn check_match(&mut self, subject: &Expr, clauses: &[MatchClause]) -> Type {
        let subject_ty = self.check_expr(subject);
        let mut arms = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let arm = self.in_scope(|c| {
                let reachable = c.pattern_can_match(&clause.pattern, &subject_ty);
                c.bind_pattern(&clause.pattern, &subject_ty, Binding::Match);
                if let Some(guard) = &clause.guard {
                    c.check_condition(guard, "match guard");
                }
                let body = c.check_expr(&clause.body);
                if reachable {
                    body
                } else {
                    Type::Unknown
                }
            });
            arms.push(arm);
        }
        merge_all(arms)
    }

    /// A typed pattern whose type has nothing in common with the subject
    /// can never match.
    pub(crate) fn pattern_can_match(&self, pattern: &Pattern, subject: &Type) -> bool {
        let PatternKind::Typed { ty, .. } = &pattern.kind else {
            return true;
        };
        if subject.is_open() {
            return true;
        }
        let tested = self.resolve_local_type(ty);
        if tested.is_open() {
            return true;
        }
        let overlaps = |candidate: &Type| self.accepts(&tested, candidate) || self.accepts(candidate, &tested);
        match normalize_special(subject) {
            Type::UnionLiteral(members) => members.iter().any(overlaps),
            Type::Union(def) => def.variants.is_empty() || def.variants.iter().any(overlaps),
            Type::Nullable(inner) => tested.is_nil() || overlaps(inner.as_ref()),
            other => overlaps(&other),
        }
    }

    // ── Loops ──────────────────────────────────────────────────────────

    pub(crate) fn check_while(&mut self, condition: &Expr, body: &Block) -> Type {
        self.check_condition(condition, "while condition");
        let (body_ty, breaks) = self.in_loop(|c| c.check_block(body));
        merge_all(std::iter::once(body_ty).chain(breaks))
    }

    pub(crate) fn check_for(&mut self, pattern: &Pattern, iterable: &Expr, body: &Block) -> Type {
        let iterable_ty = self.check_expr(iterable);
        let element = match iterable_element(&iterable_ty) {
            Some(element) => element,
            None => {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("for loop expects an iterable value (got {iterable_ty})"),
                    iterable,
                );
                Type::Unknown
            }
        };
        let (body_ty, breaks) = self.in_scope(|c| {
            c.bind_pattern(pattern, &element, Binding::Match);
            c.in_loop(|c| c.check_block(body))
        });
        merge_all(std::iter::once(body_ty).chain(breaks))
    }

    /// `loop { ... }` only ends through `break`, so its type is what the
    /// breaks carry.
    pub(crate) fn check_loop(&mut self, body: &Block) -> Type {
        let (_, breaks) = self.in_loop(|c| c.check_block(body));
        merge_all(breaks)
    }

    pub(crate) fn check_breakpoint(&mut self, label: &Ident, body: &Block) -> Type {
        let (body_ty, breaks) = self.in_breakpoint(&label.name, |c| c.check_block(body));
        merge_all(std::iter::once(body_ty).chain(breaks))
    }

    pub(crate) fn check_break(&mut self, stmt: &Stmt, label: Option<&Ident>, value: Option<&Expr>) {
        let value_ty = value.map(|value| unions::without_literal(self.check_expr(value)));
        match label {
            Some(label) => {
                let frame = self
                    .cx
                    .breakpoints
                    .iter_mut()
                    .rev()
                    .find(|frame| frame.label == label.name);
                match frame {
                    Some(frame) => frame.breaks.extend(value_ty),
                    None => self.report(
                        DiagnosticKind::ControlFlow,
                        format!("break label '{}' does not match an enclosing breakpoint", label.name),
                        stmt,
                    ),
                }
            }
            None => match self.cx.loops.last_mut() {
                Some(frame) => frame.breaks.extend(value_ty),
                None => self.report(
                    DiagnosticKind::ControlFlow,
                    "break statement must appear inside a loop",
                    stmt,
                ),
            },
        }
    }

    pub(crate) fn check_continue(&mut self, stmt: &Stmt, label: Option<&Ident>) {
        match label {
            Some(label) => {
                if !self.cx.breakpoints.iter().any(|frame| frame.label == label.name) {
                    self.report(
                        DiagnosticKind::ControlFlow,
                        format!("continue label '{}' does not match an enclosing breakpoint", label.name),
                        stmt,
                    );
                }
            }
            None if self.cx.loops.is_empty() => self.report(
                DiagnosticKind::ControlFlow,
                "continue statement must appear inside a loop",
                stmt,
            ),
            None => {}
        }
    }

    // ── Iterator literals ──────────────────────────────────────────────

    pub(crate) fn check_iterator_literal(
        &mut self,
        body: &[Stmt],
        binding: Option<&Ident>,
        element_type: Option<&TypeExpr>,
        expected: Option<&Type>,
    ) -> Type {
        let annotated = match element_type {
            Some(ty) => Some(self.resolve_local_type(ty)),
            None => expected.and_then(|ty| match normalize_special(ty) {
                Type::Iterator(element) if !element.is_open() => Some(*element),
                _ => None,
            }),
        };
        let element = self.in_function(Type::Unknown, |c| {
            let own = Type::iterator(annotated.clone().unwrap_or(Type::Unknown));
            if let Some(binding) = binding {
                c.env.define(binding.name.clone(), own);
            }
            c.env.define("gen", Type::Unknown);
            let (_, element) = c.in_iterator(annotated.clone(), |c| c.check_body(body));
            element
        });
        Type::iterator(annotated.unwrap_or(element))
    }

    pub(crate) fn check_yield(&mut self, stmt: &Stmt, value: Option<&Expr>) {
        let value_ty = match value {
            Some(value) => {
                let hint = self.cx.iterators.last().and_then(|frame| frame.expected.clone());
                match hint {
                    Some(hint) => self.check_expected(value, &hint),
                    None => self.check_expr(value),
                }
            }
            None => Type::nil(),
        };
        let Some(expected) = self.cx.iterators.last().map(|frame| frame.expected.clone()) else {
            self.report(
                DiagnosticKind::ControlFlow,
                "yield statement must appear inside an iterator",
                stmt,
            );
            return;
        };
        if let Some(expected) = &expected {
            let at: &dyn Located = match value {
                Some(value) => value,
                None => stmt,
            };
            self.check_assignable(&value_ty, expected, at, || {
                format!("iterator annotation expects elements of type {expected}, got {value_ty}")
            });
        }
        if let Some(frame) = self.cx.iterators.last_mut() {
            frame.element = unions::merge_allow_union(&frame.element, &value_ty);
        }
    }
}

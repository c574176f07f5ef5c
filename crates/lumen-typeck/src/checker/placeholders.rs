//! Placeholder lambdas: `add(@, 1)` and `@1 * @2` denote anonymous
//! functions whose parameters are the numbered placeholders.

use lumen_ast::{AssignTarget, Expr, ExprKind, MapElement, Stmt, StmtKind};

use super::Checker;
use crate::ty::Type;

#[derive(Default)]
struct Scan {
    found: bool,
    highest: u32,
}

impl Scan {
    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Placeholder(index) => {
                self.found = true;
                self.highest = self.highest.max(index.unwrap_or(1));
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Unary { operand, .. } => self.expr(operand),
            ExprKind::Cast { expr, .. } => self.expr(expr),
            ExprKind::Call(call) => {
                self.expr(&call.callee);
                call.args.iter().for_each(|arg| self.expr(arg));
            }
            ExprKind::Member { object, .. } => self.expr(object),
            ExprKind::Index { object, index } => {
                self.expr(object);
                self.expr(index);
            }
            ExprKind::Block(block) => block.body.iter().for_each(|stmt| self.stmt(stmt)),
            ExprKind::Assignment { target, value, .. } => {
                self.expr(value);
                if let AssignTarget::Expr(target) = target.as_ref() {
                    self.expr(target);
                }
            }
            ExprKind::Interpolation(parts) | ExprKind::Array(parts) => parts.iter().for_each(|part| self.expr(part)),
            ExprKind::Map(elements) => {
                for element in elements {
                    match element {
                        MapElement::Entry { key, value } => {
                            self.expr(key);
                            self.expr(value);
                        }
                        MapElement::Spread(source) => self.expr(source),
                    }
                }
            }
            ExprKind::StructLiteral(literal) => {
                literal.fields.iter().for_each(|field| self.expr(&field.value));
                literal.update_sources.iter().for_each(|source| self.expr(source));
            }
            ExprKind::Range { start, end, .. } => {
                self.expr(start);
                self.expr(end);
            }
            ExprKind::Match { subject, clauses } | ExprKind::Rescue {
                monitored: subject,
                clauses,
            } => {
                self.expr(subject);
                for clause in clauses {
                    if let Some(guard) = &clause.guard {
                        self.expr(guard);
                    }
                    self.expr(&clause.body);
                }
            }
            ExprKind::OrElse { expr, handler, .. } => {
                self.expr(expr);
                handler.body.iter().for_each(|stmt| self.stmt(stmt));
            }
            ExprKind::Ensure { expr, ensure } => {
                self.expr(expr);
                ensure.body.iter().for_each(|stmt| self.stmt(stmt));
            }
            ExprKind::If {
                condition,
                then,
                or_clauses,
            } => {
                self.expr(condition);
                then.body.iter().for_each(|stmt| self.stmt(stmt));
                for clause in or_clauses {
                    if let Some(condition) = &clause.condition {
                        self.expr(condition);
                    }
                    clause.body.body.iter().for_each(|stmt| self.stmt(stmt));
                }
            }
            ExprKind::While { condition, body } => {
                self.expr(condition);
                body.body.iter().for_each(|stmt| self.stmt(stmt));
            }
            ExprKind::For { iterable, body, .. } => {
                self.expr(iterable);
                body.body.iter().for_each(|stmt| self.stmt(stmt));
            }
            ExprKind::Loop { body } => body.body.iter().for_each(|stmt| self.stmt(stmt)),
            ExprKind::Propagate(inner) | ExprKind::Await(inner) => self.expr(inner),
            // Nested function-like bodies own their placeholders.
            ExprKind::Lambda(_)
            | ExprKind::Iterator { .. }
            | ExprKind::Proc(_)
            | ExprKind::Spawn(_)
            | ExprKind::ImplicitMember(_)
            | ExprKind::Breakpoint { .. }
            | ExprKind::Identifier(_)
            | ExprKind::Literal(_)
            | ExprKind::Topic => {}
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Expr(expr) | StmtKind::Raise(expr) => self.expr(expr),
            StmtKind::Return(Some(expr)) | StmtKind::Yield(Some(expr)) => self.expr(expr),
            StmtKind::Break { value: Some(expr), .. } => self.expr(expr),
            _ => {}
        }
    }
}

fn contains_placeholder(expr: &Expr) -> bool {
    let mut scan = Scan::default();
    scan.expr(expr);
    scan.found
}

/// Parameter count of the lambda `expr` denotes, or `None` when it is an
/// ordinary expression. Assignments and pipelines never become lambdas,
/// and neither does a call whose only placeholders are in its callee.
pub(crate) fn plan(expr: &Expr) -> Option<usize> {
    match &expr.kind {
        ExprKind::Assignment { .. } => return None,
        ExprKind::Binary { op, .. } if op.is_pipe() => return None,
        _ => {}
    }
    let mut scan = Scan::default();
    scan.expr(expr);
    if !scan.found {
        return None;
    }
    if let ExprKind::Call(call) = &expr.kind {
        if contains_placeholder(&call.callee) && !call.args.iter().any(contains_placeholder) {
            return None;
        }
    }
    Some(scan.highest.max(1) as usize)
}

impl Checker {
    /// Check `expr` as the body of a lambda with `count` parameters, typed
    /// from the expected function type when there is one.
    pub(crate) fn check_placeholder_lambda(&mut self, expr: &Expr, count: usize, expected: Option<&Type>) -> Type {
        let params: Vec<Type> = (0..count)
            .map(|i| match expected {
                Some(Type::Function(sig)) => sig.params.get(i).cloned().unwrap_or(Type::Unknown),
                _ => Type::Unknown,
            })
            .collect();
        self.cx.placeholder_depth += 1;
        self.cx.placeholders.push(params.clone());
        let body = self.check_expr_with(expr, None);
        self.cx.placeholders.pop();
        self.cx.placeholder_depth -= 1;
        Type::function(params, body)
    }

    /// `@` is `@1`.
    pub(crate) fn placeholder_type(&self, index: Option<u32>) -> Type {
        let slot = index.unwrap_or(1).max(1) as usize - 1;
        self.cx
            .placeholders
            .last()
            .and_then(|params| params.get(slot))
            .cloned()
            .unwrap_or(Type::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_ast::{BinaryOp, Builder};

    #[test]
    fn highest_index_sets_arity() {
        let b = Builder::new();
        let expr = b.binary(BinaryOp::Mul, b.placeholder(Some(1)), b.placeholder(Some(3)));
        assert_eq!(plan(&expr), Some(3));
        let bare = b.call(b.var("add"), vec![b.placeholder(None), b.int(1)]);
        assert_eq!(plan(&bare), Some(1));
    }

    #[test]
    fn ordinary_expressions_are_not_lambdas() {
        let b = Builder::new();
        assert_eq!(plan(&b.binary(BinaryOp::Add, b.var("a"), b.int(1))), None);
        let piped = b.binary(BinaryOp::Pipe, b.var("xs"), b.call(b.var("map"), vec![b.placeholder(None)]));
        assert_eq!(plan(&piped), None);
        let nested = b.lambda(vec![], None, b.placeholder(None));
        assert_eq!(plan(&nested), None);
    }
}

//! Struct literals.
//!
//! A literal of a generic struct infers its type arguments from the field
//! values when none are written: each parameter takes the first concrete
//! type a field binds it to. The result is a [`StructInstance`] carrying
//! the instantiated field types and the inferred arguments.

use std::rc::Rc;

use lumen_ast::{Expr, FieldInit, StructLiteral};
use rustc_hash::FxHashSet;

use super::calls::bind_from;
use super::Checker;
use crate::error::DiagnosticKind;
use crate::subst::{self, Bindings};
use crate::ty::{StructInstance, StructType, Type};
use crate::unions;

impl Checker {
    pub(crate) fn check_struct_literal(&mut self, expr: &Expr, literal: &StructLiteral) -> Type {
        let Some(name) = &literal.name else {
            return self.check_anonymous_literal(literal);
        };
        let Some(def) = self.literal_struct(&name.name) else {
            self.report(
                DiagnosticKind::UnknownName,
                format!("unknown struct '{}'", name.name),
                expr,
            );
            for field in &literal.fields {
                self.check_expr(&field.value);
            }
            return Type::Unknown;
        };

        let generics: Vec<&str> = def
            .type_params
            .iter()
            .map(|param| param.name.as_str())
            .filter(|name| !name.is_empty())
            .collect();
        let mut bindings = Bindings::default();
        if literal.type_args.len() > generics.len() {
            self.report(
                DiagnosticKind::Arity,
                format!(
                    "struct {} expects {} type argument(s), got {}",
                    def.name,
                    generics.len(),
                    literal.type_args.len()
                ),
                expr,
            );
        }
        for (param, arg) in generics.iter().zip(&literal.type_args) {
            let ty = self.resolve_local_type(arg);
            bindings.insert((*param).to_string(), ty);
        }

        let mut seen = FxHashSet::default();
        let mut values = Vec::with_capacity(literal.fields.len());
        for (i, field) in literal.fields.iter().enumerate() {
            let Some(declared_ty) = self.literal_field(&def, literal.positional, i, field, &mut seen) else {
                self.check_expr(&field.value);
                continue;
            };
            let hint = subst::substitute(&declared_ty, &bindings);
            let actual = self.check_expected(&field.value, &hint);
            bind_from(&unions::without_literal(actual.clone()), &declared_ty, &generics, &mut bindings);
            values.push((field, declared_ty, actual));
        }

        for (field, declared_ty, actual) in &values {
            let expected = subst::substitute(declared_ty, &bindings);
            let label = field_label(field, literal.positional);
            self.check_assignable(actual, &expected, &field.value, || {
                format!("{label} expects {expected}, got {actual}")
            });
        }

        let instance = self.struct_type_for(&def, &bindings);
        for source in &literal.update_sources {
            let ty = self.check_expr(source);
            if !ty.is_unknown() && ty.struct_name() != Some(def.name.as_str()) {
                self.report(
                    DiagnosticKind::Mismatch,
                    format!("struct update source must be {} (got {ty})", def.name),
                    source,
                );
            }
        }
        if literal.update_sources.is_empty() && !literal.positional {
            for (field, ty) in &def.fields {
                if !seen.contains(field.as_str()) && !ty.can_be_nil() {
                    self.report(
                        DiagnosticKind::Member,
                        format!("struct literal {} is missing field '{field}'", def.name),
                        expr,
                    );
                }
            }
        }
        if literal.positional && literal.fields.len() < def.positional.len() {
            self.report(
                DiagnosticKind::Arity,
                format!(
                    "struct {} expects {} positional value(s), got {}",
                    def.name,
                    def.positional.len(),
                    literal.fields.len()
                ),
                expr,
            );
        }
        instance
    }

    /// `Self` inside a method names the receiver's struct.
    fn literal_struct(&self, name: &str) -> Option<Rc<StructType>> {
        if name == "Self" {
            let receiver = self.cx.receivers.last()?;
            return self.struct_def(receiver.struct_name()?);
        }
        self.struct_def(name)
    }

    /// Declared type of the `i`th value of a literal of `def`, reporting
    /// unknown and repeated fields.
    fn literal_field<'a>(
        &mut self,
        def: &StructType,
        positional: bool,
        i: usize,
        field: &'a FieldInit,
        seen: &mut FxHashSet<&'a str>,
    ) -> Option<Type> {
        if positional {
            let ty = def.positional.get(i).cloned();
            if ty.is_none() {
                self.report(
                    DiagnosticKind::Arity,
                    format!(
                        "struct {} expects {} positional value(s), got {}",
                        def.name,
                        def.positional.len(),
                        i + 1
                    ),
                    &field.value,
                );
            }
            return ty;
        }
        let name = field.name.as_ref()?;
        if !seen.insert(name.name.as_str()) {
            self.report(
                DiagnosticKind::Member,
                format!("duplicate field '{}' in struct literal", name.name),
                field,
            );
            return None;
        }
        let ty = def.field(&name.name).cloned();
        if ty.is_none() {
            self.report(
                DiagnosticKind::Member,
                format!("struct {} has no field '{}'", def.name, name.name),
                field,
            );
        }
        ty
    }

    fn struct_type_for(&self, def: &Rc<StructType>, bindings: &Bindings) -> Type {
        if def.type_params.is_empty() {
            return Type::Struct(Rc::clone(def));
        }
        Type::StructInstance(Rc::new(StructInstance {
            name: def.name.clone(),
            fields: def
                .fields
                .iter()
                .map(|(name, ty)| (name.clone(), subst::substitute(ty, bindings)))
                .collect(),
            positional: def.positional.iter().map(|ty| subst::substitute(ty, bindings)).collect(),
            type_args: def
                .type_params
                .iter()
                .map(|param| bindings.get(&param.name).cloned().unwrap_or(Type::Unknown))
                .collect(),
        }))
    }

    /// `{ x: 1, y: 2 }` with no struct name: a structural instance.
    fn check_anonymous_literal(&mut self, literal: &StructLiteral) -> Type {
        let mut fields = Vec::new();
        let mut positional = Vec::new();
        for field in &literal.fields {
            let ty = unions::without_literal(self.check_expr(&field.value));
            if let Some(name) = &field.name {
                fields.push((name.name.clone(), ty.clone()));
            }
            positional.push(ty);
        }
        for source in &literal.update_sources {
            self.check_expr(source);
        }
        Type::StructInstance(Rc::new(StructInstance {
            name: String::new(),
            fields,
            positional,
            type_args: Vec::new(),
        }))
    }
}

fn field_label(field: &FieldInit, positional: bool) -> String {
    match (&field.name, positional) {
        (Some(name), false) => format!("field '{}'", name.name),
        _ => "positional value".to_string(),
    }
}

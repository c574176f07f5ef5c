//! Patterns used by bindings, `match`/`rescue` arms, `for` loops and parameters.

use lumen_common::Span;
use serde::{Deserialize, Serialize};

use crate::expr::Literal;
use crate::types::TypeExpr;
use crate::{Ident, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatternKind {
    /// `_`
    Wildcard,
    /// A binding name.
    Identifier(String),
    Literal(Literal),
    /// `Point { x, y: py }` / `Pair(a, b)` / `{ x }` when the struct is implied.
    Struct {
        name: Option<Ident>,
        fields: Vec<StructPatternField>,
        #[serde(default)]
        positional: bool,
    },
    /// `[first, second, ...rest]`
    Array {
        elements: Vec<Pattern>,
        rest: Option<Box<Pattern>>,
    },
    /// `value: T`
    Typed {
        pattern: Box<Pattern>,
        ty: TypeExpr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructPatternField {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    /// Field being matched; `None` for positional patterns.
    pub field: Option<Ident>,
    pub pattern: Pattern,
    /// `field: inner @ binding` style extra binding of the whole field.
    pub binding: Option<Ident>,
}

impl Pattern {
    /// Every name this pattern binds, in source order.
    pub fn binding_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.kind {
            PatternKind::Identifier(name) => out.push(name),
            PatternKind::Struct { fields, .. } => {
                for field in fields {
                    field.pattern.collect_names(out);
                    if let Some(binding) = &field.binding {
                        out.push(&binding.name);
                    }
                }
            }
            PatternKind::Array { elements, rest } => {
                for element in elements {
                    element.collect_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_names(out);
                }
            }
            PatternKind::Typed { pattern, .. } => pattern.collect_names(out),
            PatternKind::Wildcard | PatternKind::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(id: u32, kind: PatternKind) -> Pattern {
        Pattern {
            id: NodeId(id),
            span: Span::default(),
            kind,
        }
    }

    #[test]
    fn binding_names_walks_nested_patterns() {
        let rest = pat(3, PatternKind::Identifier("tail".into()));
        let array = pat(
            4,
            PatternKind::Array {
                elements: vec![
                    pat(1, PatternKind::Identifier("head".into())),
                    pat(2, PatternKind::Wildcard),
                ],
                rest: Some(Box::new(rest)),
            },
        );
        assert_eq!(array.binding_names(), vec!["head", "tail"]);
    }
}

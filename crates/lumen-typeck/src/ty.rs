//! Type representation for the Lumen checker.
//!
//! [`Type`] is a closed set of variants compared by structure. Named
//! definitions (structs, unions, interfaces, aliases) are shared behind `Rc`
//! and compare by name, so recursive definitions terminate at the name
//! instead of being inlined.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

pub use lumen_ast::{FloatSuffix, IntegerSuffix};

use crate::numeric::IntLiteral;
use crate::specs::{GenericParamSpec, ImplementationSpec, Obligation, WhereConstraintSpec};

/// Non-numeric builtin scalar kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    String,
    Nil,
}

/// A sized integer, optionally carrying the literal it was inferred from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntegerType {
    pub suffix: IntegerSuffix,
    /// Set for literal expressions so assignments can check bounds.
    pub literal: Option<IntLiteral>,
    /// Whether the suffix was written in source.
    pub explicit: bool,
}

impl IntegerType {
    pub fn new(suffix: IntegerSuffix) -> Self {
        IntegerType {
            suffix,
            literal: None,
            explicit: false,
        }
    }
}

/// A declared struct. Named fields keep declaration order.
#[derive(Clone, Debug, Default)]
pub struct StructType {
    pub name: String,
    pub type_params: Vec<GenericParamSpec>,
    pub fields: Vec<(String, Type)>,
    /// Every field in declaration order, named or not.
    pub positional: Vec<Type>,
    pub where_clause: Vec<WhereConstraintSpec>,
}

impl StructType {
    /// A nominal reference with no known definition.
    pub fn named(name: impl Into<String>) -> Self {
        StructType {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, ty)| ty)
    }

    pub fn is_positional(&self) -> bool {
        self.fields.is_empty() && !self.positional.is_empty()
    }
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The concrete shape produced by a struct literal.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StructInstance {
    pub name: String,
    pub fields: Vec<(String, Type)>,
    pub positional: Vec<Type>,
    pub type_args: Vec<Type>,
}

impl StructInstance {
    pub fn field(&self, name: &str) -> Option<&Type> {
        self.fields.iter().find(|(field, _)| field == name).map(|(_, ty)| ty)
    }
}

#[derive(Clone, Debug, Default)]
pub struct InterfaceType {
    pub name: String,
    pub type_params: Vec<GenericParamSpec>,
    pub methods: BTreeMap<String, FunctionType>,
    /// Methods that carry a default body.
    pub defaults: BTreeSet<String>,
    pub self_pattern: Option<lumen_ast::TypeExpr>,
    pub where_clause: Vec<WhereConstraintSpec>,
    pub base_interfaces: Vec<Type>,
}

impl InterfaceType {
    pub fn named(name: impl Into<String>) -> Self {
        InterfaceType {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl PartialEq for InterfaceType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug)]
pub struct AliasType {
    pub name: String,
    pub type_params: Vec<GenericParamSpec>,
    pub target: Type,
    pub where_clause: Vec<WhereConstraintSpec>,
}

impl PartialEq for AliasType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// A nominal sum type.
#[derive(Clone, Debug, Default)]
pub struct UnionType {
    pub name: String,
    pub type_params: Vec<GenericParamSpec>,
    pub variants: Vec<Type>,
    pub where_clause: Vec<WhereConstraintSpec>,
}

impl PartialEq for UnionType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub ret: Type,
    pub type_params: Vec<GenericParamSpec>,
    pub where_clause: Vec<WhereConstraintSpec>,
    pub obligations: Vec<Obligation>,
}

impl FunctionType {
    pub fn new(params: Vec<Type>, ret: Type) -> Self {
        FunctionType {
            params,
            ret,
            type_params: Vec::new(),
            where_clause: Vec::new(),
            obligations: Vec::new(),
        }
    }

    /// A signature nothing is known about, used for overloaded names.
    pub fn unknown() -> Self {
        FunctionType::new(Vec::new(), Type::Unknown)
    }

    pub fn is_unknown_signature(&self) -> bool {
        self.params.is_empty() && self.ret.is_unknown()
    }
}

/// An imported package viewed as a value.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PackageType {
    pub package: String,
    pub symbols: BTreeMap<String, Type>,
    pub private_symbols: BTreeSet<String>,
}

/// A Lumen type.
#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    /// Inference placeholder, assignable to and from anything.
    Unknown,
    Primitive(PrimitiveKind),
    Integer(IntegerType),
    Float(FloatSuffix),
    TypeParam(String),
    Struct(Rc<StructType>),
    StructInstance(Rc<StructInstance>),
    Interface(Rc<InterfaceType>),
    Alias(Rc<AliasType>),
    Union(Rc<UnionType>),
    /// Anonymous structural union; build through [`crate::unions::normalize`].
    UnionLiteral(Vec<Type>),
    Array(Box<Type>),
    Range(Box<Type>),
    Iterator(Box<Type>),
    Proc(Box<Type>),
    Future(Box<Type>),
    Nullable(Box<Type>),
    Map(Box<Type>, Box<Type>),
    Function(Box<FunctionType>),
    /// A generic base applied to arguments.
    Applied(Box<Type>, Vec<Type>),
    Package(Rc<PackageType>),
    ImplNamespace(Rc<ImplementationSpec>),
}

// ── Constructors ───────────────────────────────────────────────────────

impl Type {
    pub fn bool() -> Type {
        Type::Primitive(PrimitiveKind::Bool)
    }

    pub fn char() -> Type {
        Type::Primitive(PrimitiveKind::Char)
    }

    pub fn string() -> Type {
        Type::Primitive(PrimitiveKind::String)
    }

    pub fn nil() -> Type {
        Type::Primitive(PrimitiveKind::Nil)
    }

    pub fn int(suffix: IntegerSuffix) -> Type {
        Type::Integer(IntegerType::new(suffix))
    }

    pub fn i32() -> Type {
        Type::int(IntegerSuffix::I32)
    }

    pub fn f64() -> Type {
        Type::Float(FloatSuffix::F64)
    }

    pub fn param(name: impl Into<String>) -> Type {
        Type::TypeParam(name.into())
    }

    pub fn named_struct(name: impl Into<String>) -> Type {
        Type::Struct(Rc::new(StructType::named(name)))
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn range(element: Type) -> Type {
        Type::Range(Box::new(element))
    }

    pub fn iterator(element: Type) -> Type {
        Type::Iterator(Box::new(element))
    }

    pub fn proc(result: Type) -> Type {
        Type::Proc(Box::new(result))
    }

    pub fn future(result: Type) -> Type {
        Type::Future(Box::new(result))
    }

    pub fn nullable(inner: Type) -> Type {
        Type::Nullable(Box::new(inner))
    }

    pub fn map(key: Type, value: Type) -> Type {
        Type::Map(Box::new(key), Box::new(value))
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function(Box::new(FunctionType::new(params, ret)))
    }

    pub fn applied(base: Type, args: Vec<Type>) -> Type {
        Type::Applied(Box::new(base), args)
    }

    /// `Result T` in its struct-application form.
    pub fn result_of(success: Type) -> Type {
        Type::applied(Type::named_struct("Result"), vec![success])
    }
}

// ── Predicates ─────────────────────────────────────────────────────────

impl Type {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_type_param(&self) -> bool {
        matches!(self, Type::TypeParam(_))
    }

    /// Unknown or a type parameter: anything may flow through.
    pub fn is_open(&self) -> bool {
        self.is_unknown() || self.is_type_param()
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_ratio(&self) -> bool {
        match self {
            Type::Struct(def) => def.name == "Ratio",
            Type::StructInstance(inst) => inst.name == "Ratio",
            Type::Applied(base, _) => base.is_ratio(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float() || self.is_ratio()
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveKind::Bool))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveKind::String))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Type::Primitive(PrimitiveKind::Nil))
    }

    pub fn can_be_nil(&self) -> bool {
        match self {
            Type::Unknown | Type::Nullable(_) => true,
            Type::Primitive(kind) => *kind == PrimitiveKind::Nil,
            Type::UnionLiteral(members) => members.iter().any(Type::can_be_nil),
            _ => false,
        }
    }

    pub fn is_interface_like(&self) -> bool {
        match self {
            Type::Interface(_) => true,
            Type::Applied(base, _) => base.is_interface_like(),
            _ => false,
        }
    }

    /// The struct name of a struct, struct instance or an application of one.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(def) => Some(&def.name),
            Type::StructInstance(inst) => Some(&inst.name),
            Type::Applied(base, _) => base.struct_name(),
            _ => None,
        }
    }

    pub fn union_name(&self) -> Option<&str> {
        match self {
            Type::Union(def) => Some(&def.name),
            Type::Applied(base, _) => base.union_name(),
            _ => None,
        }
    }

    pub fn is_result(&self) -> bool {
        self.union_name() == Some("Result")
            || matches!(self, Type::Applied(base, _) if base.struct_name() == Some("Result"))
    }

    /// The success type of `Result T`, either struct-applied or as the
    /// first non-error variant of a `Result` union.
    pub fn result_success(&self) -> Option<Type> {
        if let Type::Applied(base, args) = self {
            if base.struct_name() == Some("Result") {
                return args.first().cloned();
            }
        }
        if let Type::Union(def) = self {
            if def.name == "Result" {
                return Some(
                    def.variants
                        .iter()
                        .find(|variant| !variant.is_error_variant())
                        .cloned()
                        .unwrap_or(Type::Unknown),
                );
            }
        }
        None
    }

    pub fn is_error_variant(&self) -> bool {
        match self {
            Type::Interface(def) => def.name == "Error",
            Type::Applied(base, _) => base.is_error_variant(),
            other => other.struct_name() == Some("Error"),
        }
    }

    /// Interface definition and arguments for `I` or `I args`.
    pub fn as_interface(&self) -> Option<(&Rc<InterfaceType>, &[Type])> {
        match self {
            Type::Interface(def) => Some((def, &[])),
            Type::Applied(base, args) => match base.as_ref() {
                Type::Interface(def) => Some((def, args.as_slice())),
                _ => None,
            },
            _ => None,
        }
    }

    /// Every type parameter name mentioned anywhere in this type.
    pub fn type_params(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_type_params(&mut names);
        names
    }

    fn collect_type_params(&self, out: &mut Vec<String>) {
        match self {
            Type::TypeParam(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Type::Array(inner)
            | Type::Range(inner)
            | Type::Iterator(inner)
            | Type::Proc(inner)
            | Type::Future(inner)
            | Type::Nullable(inner) => inner.collect_type_params(out),
            Type::Map(key, value) => {
                key.collect_type_params(out);
                value.collect_type_params(out);
            }
            Type::UnionLiteral(members) => {
                for member in members {
                    member.collect_type_params(out);
                }
            }
            Type::Applied(base, args) => {
                base.collect_type_params(out);
                for arg in args {
                    arg.collect_type_params(out);
                }
            }
            Type::Function(func) => {
                for param in &func.params {
                    param.collect_type_params(out);
                }
                func.ret.collect_type_params(out);
            }
            Type::StructInstance(inst) => {
                for arg in &inst.type_args {
                    arg.collect_type_params(out);
                }
            }
            _ => {}
        }
    }
}

// ── Formatting ─────────────────────────────────────────────────────────

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Type], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Char => "char",
            PrimitiveKind::String => "string",
            PrimitiveKind::Nil => "nil",
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => f.write_str("Unknown"),
            Type::Primitive(kind) => write!(f, "{kind}"),
            Type::Integer(int) => write!(f, "{}", int.suffix),
            Type::Float(suffix) => write!(f, "{suffix}"),
            Type::TypeParam(name) if name.is_empty() => f.write_str("Unknown"),
            Type::TypeParam(name) => f.write_str(name),
            Type::Struct(def) => f.write_str(&def.name),
            Type::StructInstance(inst) => f.write_str(&inst.name),
            Type::Interface(def) => f.write_str(&def.name),
            Type::Alias(def) => write!(f, "type alias -> {}", def.target),
            Type::Union(def) => f.write_str(&def.name),
            Type::UnionLiteral(members) if members.is_empty() => f.write_str("Union"),
            Type::UnionLiteral(members) => write_joined(f, members, " | "),
            Type::Array(elem) => write!(f, "Array {elem}"),
            Type::Range(elem) => write!(f, "Range {elem}"),
            Type::Iterator(elem) => write!(f, "Iterator {elem}"),
            Type::Proc(result) => write!(f, "Proc {result}"),
            Type::Future(result) => write!(f, "Future {result}"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Map(key, value) => write!(f, "Map {key} {value}"),
            Type::Function(func) => {
                f.write_str("fn(")?;
                write_joined(f, &func.params, ", ")?;
                write!(f, ") -> {}", func.ret)
            }
            Type::Applied(base, args) => {
                write!(f, "{base}")?;
                if !args.is_empty() {
                    f.write_str(" ")?;
                    write_joined(f, args, " ")?;
                }
                Ok(())
            }
            Type::Package(pkg) => write!(f, "package {}", pkg.package),
            Type::ImplNamespace(spec) => match &spec.impl_name {
                Some(name) => f.write_str(name),
                None => f.write_str("implementation"),
            },
        }
    }
}

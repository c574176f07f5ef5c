//! Integer widths, literal bounds and binary-operator numeric promotion.

use std::fmt;

use crate::ty::{FloatSuffix, IntegerSuffix, Type};

// ── Integer literals ───────────────────────────────────────────────────

/// An integer literal as sign and magnitude.
///
/// `magnitude` is `None` when the value does not fit in 128 bits; such a
/// literal fits no integer type but still formats as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntLiteral {
    pub negative: bool,
    pub magnitude: Option<u128>,
    digits: String,
}

impl IntLiteral {
    /// Parse decimal text with an optional leading `-` and `_` separators.
    pub fn parse(text: &str) -> Option<IntLiteral> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let digits: String = body.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let canonical = digits.trim_start_matches('0');
        let canonical = if canonical.is_empty() { "0" } else { canonical };
        let magnitude = canonical.parse::<u128>().ok();
        Some(IntLiteral {
            negative: negative && canonical != "0",
            magnitude,
            digits: canonical.to_string(),
        })
    }

    pub fn from_i128(value: i128) -> IntLiteral {
        IntLiteral {
            negative: value < 0,
            magnitude: Some(value.unsigned_abs()),
            digits: value.unsigned_abs().to_string(),
        }
    }

    /// Whether the value lies within the range of `suffix`.
    pub fn fits(&self, suffix: IntegerSuffix) -> bool {
        let Some(magnitude) = self.magnitude else {
            return false;
        };
        let bounds = bounds_of(suffix);
        if self.negative {
            bounds.signed && magnitude <= bounds.negative_limit()
        } else {
            magnitude <= bounds.positive_limit()
        }
    }
}

impl fmt::Display for IntLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.digits)
    }
}

// ── Widths ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntBounds {
    pub bits: u32,
    pub signed: bool,
}

impl IntBounds {
    /// Largest representable positive magnitude.
    pub fn positive_limit(self) -> u128 {
        let value_bits = if self.signed { self.bits - 1 } else { self.bits };
        if value_bits >= 128 {
            u128::MAX
        } else {
            (1u128 << value_bits) - 1
        }
    }

    /// Largest representable negative magnitude.
    pub fn negative_limit(self) -> u128 {
        if !self.signed {
            return 0;
        }
        1u128 << (self.bits - 1)
    }
}

/// `isize`/`usize` are treated as 64-bit.
pub fn bounds_of(suffix: IntegerSuffix) -> IntBounds {
    use IntegerSuffix::*;
    let (bits, signed) = match suffix {
        I8 => (8, true),
        I16 => (16, true),
        I32 => (32, true),
        I64 | Isize => (64, true),
        I128 => (128, true),
        U8 => (8, false),
        U16 => (16, false),
        U32 => (32, false),
        U64 | Usize => (64, false),
        U128 => (128, false),
    };
    IntBounds { bits, signed }
}

pub fn is_signed(suffix: IntegerSuffix) -> bool {
    bounds_of(suffix).signed
}

const SIGNED_ORDER: [IntegerSuffix; 5] = [
    IntegerSuffix::I8,
    IntegerSuffix::I16,
    IntegerSuffix::I32,
    IntegerSuffix::I64,
    IntegerSuffix::I128,
];

const UNSIGNED_ORDER: [IntegerSuffix; 5] = [
    IntegerSuffix::U8,
    IntegerSuffix::U16,
    IntegerSuffix::U32,
    IntegerSuffix::U64,
    IntegerSuffix::U128,
];

pub fn smallest_signed_for(bits: u32) -> Option<IntegerSuffix> {
    SIGNED_ORDER.into_iter().find(|s| bounds_of(*s).bits >= bits)
}

pub fn smallest_unsigned_for(bits: u32) -> Option<IntegerSuffix> {
    UNSIGNED_ORDER.into_iter().find(|s| bounds_of(*s).bits >= bits)
}

/// Whether every value of `from` is representable in `to`.
pub fn integer_range_within(from: IntegerSuffix, to: IntegerSuffix) -> bool {
    let (a, b) = (bounds_of(from), bounds_of(to));
    match (a.signed, b.signed) {
        (true, true) | (false, false) => a.bits <= b.bits,
        (false, true) => a.bits < b.bits,
        (true, false) => false,
    }
}

// ── Promotion ──────────────────────────────────────────────────────────

/// Result suffix for an integer operator applied to `left` and `right`.
///
/// Same signedness widens to the larger operand. Mixed signedness needs a
/// signed type one bit wider than the wider operand, falling back to an
/// unsigned operand that already covers both widths.
pub fn promote_integer_suffixes(left: IntegerSuffix, right: IntegerSuffix) -> Result<IntegerSuffix, String> {
    let (l, r) = (bounds_of(left), bounds_of(right));
    if l.signed == r.signed {
        let bits = l.bits.max(r.bits);
        let found = if l.signed {
            smallest_signed_for(bits)
        } else {
            smallest_unsigned_for(bits)
        };
        return found.ok_or_else(|| {
            format!("integer operands {left} and {right} require {bits} bits, exceeding available widths")
        });
    }
    let needed = (l.bits + 1).max(r.bits + 1);
    if let Some(suffix) = smallest_signed_for(needed) {
        return Ok(suffix);
    }
    let unsigned = if l.signed { (right, r) } else { (left, l) };
    if unsigned.1.bits >= l.bits.max(r.bits) {
        return Ok(unsigned.0);
    }
    Err(format!(
        "integer operands {left} and {right} require {needed} bits, exceeding available widths"
    ))
}

fn integer_suffix_of(ty: &Type) -> Option<IntegerSuffix> {
    match ty {
        Type::Integer(int) => Some(int.suffix),
        _ => None,
    }
}

fn numeric_operands_error(left: &Type, right: &Type) -> String {
    format!("requires numeric operands (got {left} and {right})")
}

/// `+ - * ^`: float if either side is a float, otherwise integer promotion.
pub fn resolve_numeric_binary(left: &Type, right: &Type) -> Result<Type, String> {
    if left.is_open() || right.is_open() {
        return Ok(Type::Unknown);
    }
    if left.is_ratio() || right.is_ratio() {
        if !left.is_numeric() || !right.is_numeric() {
            return Err(numeric_operands_error(left, right));
        }
        return Ok(Type::named_struct("Ratio"));
    }
    if left.is_float() || right.is_float() {
        if !left.is_numeric() || !right.is_numeric() {
            return Err(numeric_operands_error(left, right));
        }
        return Ok(resolve_float_binary(left, right));
    }
    if !left.is_numeric() || !right.is_numeric() {
        return Err(numeric_operands_error(left, right));
    }
    resolve_integer_binary(left, right)
}

/// `/` always leaves the integer domain: two integers divide to `f64`.
pub fn resolve_division_binary(left: &Type, right: &Type) -> Result<Type, String> {
    if left.is_open() || right.is_open() {
        return Ok(Type::Unknown);
    }
    if left.is_float() || right.is_float() || left.is_ratio() || right.is_ratio() {
        return resolve_numeric_binary(left, right);
    }
    if !left.is_numeric() || !right.is_numeric() {
        return Err(numeric_operands_error(left, right));
    }
    Ok(Type::f64())
}

pub fn resolve_float_binary(left: &Type, right: &Type) -> Type {
    let wide = [left, right]
        .iter()
        .any(|ty| matches!(ty, Type::Float(FloatSuffix::F64)));
    Type::Float(if wide { FloatSuffix::F64 } else { FloatSuffix::F32 })
}

/// `// % /% .& .| .^ .<< .>>`: integers only.
pub fn resolve_integer_binary(left: &Type, right: &Type) -> Result<Type, String> {
    if left.is_open() || right.is_open() {
        return Ok(Type::Unknown);
    }
    let (Some(l), Some(r)) = (integer_suffix_of(left), integer_suffix_of(right)) else {
        return Err(format!("requires integer operands (got {left} and {right})"));
    };
    promote_integer_suffixes(l, r).map(Type::int)
}

#[cfg(test)]
mod tests {
    use super::*;
    use IntegerSuffix::*;

    #[test]
    fn literal_bounds() {
        let lit = IntLiteral::parse("512").unwrap();
        assert!(!lit.fits(U8));
        assert!(lit.fits(U16));
        assert!(lit.fits(I16));

        let min = IntLiteral::parse("-128").unwrap();
        assert!(min.fits(I8));
        assert!(!min.fits(U8));
        assert!(!IntLiteral::parse("-129").unwrap().fits(I8));

        let max = IntLiteral::parse(&u128::MAX.to_string()).unwrap();
        assert!(max.fits(U128));
        assert!(!max.fits(I128));
    }

    #[test]
    fn oversized_literal_fits_nothing_but_prints() {
        let huge = IntLiteral::parse("1_000_000_000_000_000_000_000_000_000_000_000_000_000").unwrap();
        assert_eq!(huge.magnitude, None);
        assert!(IntegerSuffix::ALL.iter().all(|s| !huge.fits(*s)));
        assert_eq!(huge.to_string(), format!("1{}", "0".repeat(39)));
    }

    #[test]
    fn literal_parse_normalizes() {
        assert_eq!(IntLiteral::parse("007").unwrap().to_string(), "7");
        assert_eq!(IntLiteral::parse("-0").unwrap().to_string(), "0");
        assert!(IntLiteral::parse("12a").is_none());
        assert_eq!(IntLiteral::from_i128(-5).to_string(), "-5");
    }

    #[test]
    fn promotion_same_sign_widens() {
        assert_eq!(promote_integer_suffixes(I8, I32), Ok(I32));
        assert_eq!(promote_integer_suffixes(U16, U8), Ok(U16));
    }

    #[test]
    fn promotion_mixed_sign_adds_a_bit() {
        assert_eq!(promote_integer_suffixes(U8, I8), Ok(I16));
        assert_eq!(promote_integer_suffixes(I32, U32), Ok(I64));
        assert_eq!(promote_integer_suffixes(U128, I8), Ok(U128));
        assert_eq!(
            promote_integer_suffixes(I128, U64),
            Err("integer operands i128 and u64 require 129 bits, exceeding available widths".into())
        );
    }

    #[test]
    fn division_promotes_to_float() {
        assert_eq!(resolve_division_binary(&Type::i32(), &Type::i32()), Ok(Type::f64()));
        assert_eq!(
            resolve_numeric_binary(&Type::i32(), &Type::f64()),
            Ok(Type::f64())
        );
        assert_eq!(
            resolve_numeric_binary(&Type::Float(FloatSuffix::F32), &Type::int(U8)),
            Ok(Type::Float(FloatSuffix::F32))
        );
    }

    #[test]
    fn non_numeric_operands_are_rejected() {
        assert_eq!(
            resolve_numeric_binary(&Type::string(), &Type::i32()),
            Err("requires numeric operands (got string and i32)".into())
        );
        assert_eq!(
            resolve_integer_binary(&Type::f64(), &Type::i32()),
            Err("requires integer operands (got f64 and i32)".into())
        );
        assert_eq!(resolve_integer_binary(&Type::Unknown, &Type::bool()), Ok(Type::Unknown));
    }

    #[test]
    fn range_containment() {
        assert!(integer_range_within(U8, I16));
        assert!(!integer_range_within(U16, I16));
        assert!(!integer_range_within(I8, U64));
        assert!(integer_range_within(I32, I64));
    }
}

//! Arithmetic, string, bitwise and increment/decrement operations with the
//! weak-typing coercions applied to the operands first.

use super::cast::{self, Num};
use crate::error::PhpError;
use crate::value::Val;
use php_syntax::ast::{BinaryOp, IncDecOp, UnaryOp};

/// Binary operators that compute a value (comparisons live in `compare`).
/// Result type selection: `.` is string, bitwise and shifts are int, the
/// rest are int unless either operand is a float.
pub fn binary(op: BinaryOp, lhs: &Val, rhs: &Val) -> Result<Val, PhpError> {
    match op {
        BinaryOp::Concat => {
            let mut out = cast::str_of(lhs);
            out.extend_from_slice(&cast::str_of(rhs));
            Ok(Val::str(out))
        }
        BinaryOp::BitAnd => Ok(Val::Int(cast::int_of(lhs) & cast::int_of(rhs))),
        BinaryOp::BitOr => Ok(Val::Int(cast::int_of(lhs) | cast::int_of(rhs))),
        BinaryOp::BitXor => Ok(Val::Int(cast::int_of(lhs) ^ cast::int_of(rhs))),
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight => {
            let l = cast::int_of(lhs);
            let r = cast::int_of(rhs);
            if r < 0 {
                return Err(PhpError::fatal(
                    "Uncaught ArithmeticError: Bit shift by negative number",
                ));
            }
            let value = if op == BinaryOp::ShiftLeft {
                if r >= 64 {
                    0
                } else {
                    l.wrapping_shl(r as u32)
                }
            } else {
                // Arithmetic shift: large counts collapse to the sign.
                l >> r.min(63)
            };
            Ok(Val::Int(value))
        }
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Mod
        | BinaryOp::Pow => {
            if matches!(lhs, Val::Float(_)) || matches!(rhs, Val::Float(_)) {
                float_arith(op, cast::float_of(lhs), cast::float_of(rhs))
            } else {
                int_arith(op, cast::int_of(lhs), cast::int_of(rhs))
            }
        }
        _ => unreachable!("comparison operator routed to arithmetic: {:?}", op),
    }
}

/// Integer arithmetic wraps on overflow. Division and modulo by zero are
/// fatal.
fn int_arith(op: BinaryOp, l: i64, r: i64) -> Result<Val, PhpError> {
    let value = match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div => {
            if r == 0 {
                return Err(PhpError::fatal(
                    "Uncaught DivisionByZeroError: Division by zero",
                ));
            }
            l.wrapping_div(r)
        }
        BinaryOp::Mod => {
            if r == 0 {
                return Err(PhpError::fatal(
                    "Uncaught DivisionByZeroError: Modulo by zero",
                ));
            }
            l.wrapping_rem(r)
        }
        BinaryOp::Pow => (l as f64).powf(r as f64) as i64,
        _ => unreachable!(),
    };
    Ok(Val::Int(value))
}

/// Float arithmetic follows IEEE: division by zero yields an infinity.
/// `%` works on the int conversions of both sides.
fn float_arith(op: BinaryOp, l: f64, r: f64) -> Result<Val, PhpError> {
    let value = match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        BinaryOp::Pow => l.powf(r),
        BinaryOp::Mod => {
            return int_arith(op, cast::int_of(&Val::Float(l)), cast::int_of(&Val::Float(r)));
        }
        _ => unreachable!(),
    };
    Ok(Val::Float(value))
}

pub fn unary(op: UnaryOp, v: &Val) -> Result<Val, PhpError> {
    match op {
        UnaryOp::Plus | UnaryOp::Minus => {
            let negate = op == UnaryOp::Minus;
            match v {
                Val::Int(i) => Ok(Val::Int(if negate { i.wrapping_neg() } else { *i })),
                Val::Float(f) => Ok(Val::Float(if negate { -f } else { *f })),
                Val::Bool(b) => {
                    let i = *b as i64;
                    Ok(Val::Int(if negate { -i } else { i }))
                }
                Val::Null | Val::Void => Ok(Val::Int(0)),
                Val::Str(s) => match cast::parse_numeric_prefix(s) {
                    Some(Num::Int(i)) => Ok(Val::Int(if negate { i.wrapping_neg() } else { i })),
                    Some(Num::Float(f)) => Ok(Val::Float(if negate { -f } else { f })),
                    None => Ok(Val::Int(0)),
                },
                Val::Array(_) => Err(PhpError::fatal(format!(
                    "Uncaught TypeError: Unsupported operand types: {} {}",
                    v.decl_type_name(),
                    if negate { "-" } else { "+" },
                ))),
            }
        }
        UnaryOp::BitNot => match v {
            Val::Int(i) => Ok(Val::Int(!i)),
            Val::Float(f) => Ok(Val::Int(!cast::int_of(&Val::Float(*f)))),
            // Strings complement byte-wise.
            Val::Str(s) => Ok(Val::str(s.iter().map(|b| !b).collect::<Vec<u8>>())),
            _ => Err(PhpError::fatal(format!(
                "Uncaught TypeError: Cannot perform bitwise not on {}",
                v.decl_type_name()
            ))),
        },
    }
}

/// `++`/`--` value transitions. Booleans are untouched, null increments to
/// one but does not decrement, strings behave numerically when they look
/// numeric; other strings are returned unchanged.
pub fn inc_dec(op: IncDecOp, v: &Val) -> Val {
    let inc = op == IncDecOp::Inc;
    match v {
        Val::Bool(_) => v.clone(),
        Val::Null | Val::Void => {
            if inc {
                Val::Int(1)
            } else {
                Val::Null
            }
        }
        Val::Int(i) => Val::Int(if inc {
            i.wrapping_add(1)
        } else {
            i.wrapping_sub(1)
        }),
        Val::Float(f) => Val::Float(if inc { f + 1.0 } else { f - 1.0 }),
        Val::Str(s) => {
            if s.is_empty() {
                return if inc { Val::str("1") } else { Val::Int(-1) };
            }
            match cast::parse_numeric(s) {
                Some(Num::Int(i)) => Val::Int(if inc {
                    i.wrapping_add(1)
                } else {
                    i.wrapping_sub(1)
                }),
                Some(Num::Float(f)) => Val::Float(if inc { f + 1.0 } else { f - 1.0 }),
                None => v.clone(),
            }
        }
        Val::Array(_) => v.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Val {
        Val::Int(v)
    }

    #[test]
    fn int_plus_int() {
        assert_eq!(binary(BinaryOp::Add, &int(10), &int(32)).unwrap(), int(42));
    }

    #[test]
    fn float_contaminates() {
        assert_eq!(
            binary(BinaryOp::Add, &int(1), &Val::Float(0.5)).unwrap(),
            Val::Float(1.5)
        );
    }

    #[test]
    fn numeric_strings_coerce() {
        assert_eq!(
            binary(BinaryOp::Add, &Val::str("10"), &Val::str("32")).unwrap(),
            int(42)
        );
        assert_eq!(
            binary(BinaryOp::Add, &int(41), &Val::Bool(true)).unwrap(),
            int(42)
        );
        assert_eq!(binary(BinaryOp::Add, &int(42), &Val::Null).unwrap(), int(42));
    }

    #[test]
    fn division_by_integer_zero_is_fatal() {
        assert!(binary(BinaryOp::Div, &int(1), &int(0)).is_err());
        assert!(binary(BinaryOp::Mod, &int(1), &int(0)).is_err());
    }

    #[test]
    fn float_division_by_zero_is_inf() {
        match binary(BinaryOp::Div, &Val::Float(1.0), &Val::Float(0.0)).unwrap() {
            Val::Float(f) => assert!(f.is_infinite() && f > 0.0),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn concat_is_always_string() {
        assert_eq!(
            binary(BinaryOp::Concat, &int(1), &int(2)).unwrap(),
            Val::str("12")
        );
    }

    #[test]
    fn wrapping_overflow() {
        assert_eq!(
            binary(BinaryOp::Add, &int(i64::MAX), &int(1)).unwrap(),
            int(i64::MIN)
        );
        assert_eq!(unary(UnaryOp::Minus, &int(i64::MIN)).unwrap(), int(i64::MIN));
    }

    #[test]
    fn shifts() {
        assert_eq!(
            binary(BinaryOp::ShiftLeft, &int(1), &int(4)).unwrap(),
            int(16)
        );
        assert_eq!(
            binary(BinaryOp::ShiftRight, &int(-8), &int(1)).unwrap(),
            int(-4)
        );
        assert_eq!(
            binary(BinaryOp::ShiftLeft, &int(1), &int(64)).unwrap(),
            int(0)
        );
        assert!(binary(BinaryOp::ShiftLeft, &int(1), &int(-1)).is_err());
    }

    #[test]
    fn unary_on_scalars() {
        assert_eq!(unary(UnaryOp::Minus, &Val::Bool(true)).unwrap(), int(-1));
        assert_eq!(unary(UnaryOp::Plus, &Val::Null).unwrap(), int(0));
        assert_eq!(unary(UnaryOp::Minus, &Val::str("5")).unwrap(), int(-5));
        assert_eq!(unary(UnaryOp::BitNot, &int(0)).unwrap(), int(-1));
    }

    #[test]
    fn inc_dec_transitions() {
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::Null), int(1));
        assert_eq!(inc_dec(IncDecOp::Dec, &Val::Null), Val::Null);
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::Bool(false)), Val::Bool(false));
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::str("")), Val::str("1"));
        assert_eq!(inc_dec(IncDecOp::Dec, &Val::str("")), int(-1));
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::str("5")), int(6));
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::str("5.5")), Val::Float(6.5));
        // Non-numeric strings are left as they are.
        assert_eq!(inc_dec(IncDecOp::Inc, &Val::str("abc")), Val::str("abc"));
    }
}

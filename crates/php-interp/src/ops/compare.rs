//! Loose and strict comparison. Loose comparison follows a type-pair
//! matrix: null converts toward the other side, booleans force both sides
//! to bool, numbers compare numerically (a string against a number
//! converts to the number's type), two strings compare numerically only
//! when both are numeric, and arrays order by length first, then pairwise
//! by the left side's keys.

use super::cast;
use crate::value::{ArrayData, Val};
use std::cmp::Ordering;

/// Same type and same value; arrays must agree on length, key order and
/// every element strictly.
pub fn strict_eq(lhs: &Val, rhs: &Val) -> bool {
    match (lhs, rhs) {
        (Val::Null, Val::Null) | (Val::Void, Val::Void) => true,
        (Val::Bool(a), Val::Bool(b)) => a == b,
        (Val::Int(a), Val::Int(b)) => a == b,
        (Val::Float(a), Val::Float(b)) => a == b,
        (Val::Str(a), Val::Str(b)) => a == b,
        (Val::Array(a), Val::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b.iter())
                    .all(|((ka, va), (kb, vb))| ka == kb && strict_eq(va, vb))
        }
        _ => false,
    }
}

/// `None` means incomparable: arrays with mismatched keys, or NaN in play.
/// Relational operators treat that as false; `<=>` reports 1.
pub fn loose_cmp(lhs: &Val, rhs: &Val) -> Option<Ordering> {
    match (lhs, rhs) {
        (Val::Null | Val::Void, Val::Null | Val::Void) => Some(Ordering::Equal),

        // Booleans pull the other operand to bool.
        (Val::Bool(_), _) | (_, Val::Bool(_)) => {
            Some(cast::bool_of(lhs).cmp(&cast::bool_of(rhs)))
        }

        // Null converts to the other operand's type.
        (Val::Null | Val::Void, Val::Int(i)) => Some(0.cmp(i)),
        (Val::Int(i), Val::Null | Val::Void) => Some(i.cmp(&0)),
        (Val::Null | Val::Void, Val::Float(f)) => 0.0.partial_cmp(f),
        (Val::Float(f), Val::Null | Val::Void) => f.partial_cmp(&0.0),
        (Val::Null | Val::Void, Val::Str(s)) => Some(b"".as_slice().cmp(s)),
        (Val::Str(s), Val::Null | Val::Void) => Some(s.as_slice().cmp(b"")),
        (Val::Null | Val::Void, Val::Array(arr)) => array_cmp(&ArrayData::new(), arr),
        (Val::Array(arr), Val::Null | Val::Void) => array_cmp(arr, &ArrayData::new()),

        // Arrays outrank every scalar.
        (Val::Array(a), Val::Array(b)) => array_cmp(a, b),
        (Val::Array(_), _) => Some(Ordering::Greater),
        (_, Val::Array(_)) => Some(Ordering::Less),

        (Val::Int(a), Val::Int(b)) => Some(a.cmp(b)),
        (Val::Int(a), Val::Float(b)) => (*a as f64).partial_cmp(b),
        (Val::Float(a), Val::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Val::Float(a), Val::Float(b)) => a.partial_cmp(b),

        // A string against a number converts to the number's type.
        (Val::Int(a), Val::Str(_)) => Some(a.cmp(&cast::int_of(rhs))),
        (Val::Str(_), Val::Int(b)) => Some(cast::int_of(lhs).cmp(b)),
        (Val::Float(a), Val::Str(_)) => a.partial_cmp(&cast::float_of(rhs)),
        (Val::Str(_), Val::Float(b)) => cast::float_of(lhs).partial_cmp(b),

        (Val::Str(a), Val::Str(b)) => {
            match (cast::parse_numeric(a), cast::parse_numeric(b)) {
                (Some(na), Some(nb)) => na.as_f64().partial_cmp(&nb.as_f64()),
                _ => Some(a.as_slice().cmp(b.as_slice())),
            }
        }
    }
}

fn array_cmp(lhs: &ArrayData, rhs: &ArrayData) -> Option<Ordering> {
    let by_len = lhs.len().cmp(&rhs.len());
    if by_len != Ordering::Equal {
        return Some(by_len);
    }
    for (key, lv) in lhs.iter() {
        let rv = rhs.get(key)?;
        match loose_cmp(lv, rv)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }
    Some(Ordering::Equal)
}

pub fn loose_eq(lhs: &Val, rhs: &Val) -> bool {
    loose_cmp(lhs, rhs) == Some(Ordering::Equal)
}

/// `<=>`: -1, 0 or 1; incomparable operands report 1.
pub fn spaceship(lhs: &Val, rhs: &Val) -> i64 {
    match loose_cmp(lhs, rhs) {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) => 0,
        Some(Ordering::Greater) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ArrayKey;
    use std::rc::Rc;

    fn arr(pairs: &[(i64, i64)]) -> Val {
        let mut data = ArrayData::new();
        for (k, v) in pairs {
            data.insert(ArrayKey::Int(*k), Val::Int(*v));
        }
        Val::array(data)
    }

    #[test]
    fn strict_needs_same_type() {
        assert!(strict_eq(&Val::Int(1), &Val::Int(1)));
        assert!(!strict_eq(&Val::Int(1), &Val::Float(1.0)));
        assert!(!strict_eq(&Val::Int(0), &Val::Bool(false)));
        assert!(!strict_eq(&Val::str("1"), &Val::Int(1)));
    }

    #[test]
    fn strict_arrays_compare_key_order() {
        let mut a = ArrayData::new();
        a.insert(ArrayKey::Int(0), Val::Int(1));
        a.insert(ArrayKey::Int(1), Val::Int(2));
        let mut b = ArrayData::new();
        b.insert(ArrayKey::Int(1), Val::Int(2));
        b.insert(ArrayKey::Int(0), Val::Int(1));
        assert!(!strict_eq(&Val::array(a.clone()), &Val::array(b)));
        assert!(strict_eq(&Val::array(a.clone()), &Val::array(a)));
    }

    #[test]
    fn null_converts_toward_other_side() {
        assert!(loose_eq(&Val::Null, &Val::Bool(false)));
        assert!(loose_eq(&Val::Null, &Val::Int(0)));
        assert!(loose_eq(&Val::Null, &Val::str("")));
        assert!(loose_eq(&Val::Null, &Val::empty_array()));
        assert!(!loose_eq(&Val::Null, &Val::str("0")));
    }

    #[test]
    fn bool_pulls_both_sides() {
        assert!(loose_eq(&Val::Bool(true), &Val::Int(5)));
        assert!(loose_eq(&Val::Bool(false), &Val::str("0")));
        assert!(loose_eq(&Val::Bool(true), &Val::str("anything")));
    }

    #[test]
    fn numeric_strings_compare_numerically() {
        assert!(loose_eq(&Val::str("10"), &Val::str("1e1")));
        assert_eq!(
            loose_cmp(&Val::str("2"), &Val::str("10")),
            Some(Ordering::Less)
        );
        // Non-numeric strings fall back to byte order.
        assert_eq!(
            loose_cmp(&Val::str("2a"), &Val::str("10a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            loose_cmp(&Val::str("abc"), &Val::str("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(
            loose_cmp(&Val::str("ab"), &Val::str("abc")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn int_vs_string_uses_int() {
        assert!(loose_eq(&Val::Int(0), &Val::str("a")));
        assert!(loose_eq(&Val::Int(5), &Val::str("5 apples")));
    }

    #[test]
    fn arrays_order_by_length_then_elements() {
        assert_eq!(
            loose_cmp(&arr(&[(0, 1)]), &arr(&[(0, 1), (1, 2)])),
            Some(Ordering::Less)
        );
        assert_eq!(
            loose_cmp(&arr(&[(0, 1), (1, 2)]), &arr(&[(0, 1), (1, 3)])),
            Some(Ordering::Less)
        );
        assert!(loose_eq(&arr(&[(0, 1)]), &arr(&[(0, 1)])));
        // Same length, different keys: incomparable.
        assert_eq!(loose_cmp(&arr(&[(0, 1)]), &arr(&[(5, 1)])), None);
        assert!(!loose_eq(&arr(&[(0, 1)]), &arr(&[(5, 1)])));
    }

    #[test]
    fn arrays_outrank_scalars() {
        assert_eq!(
            loose_cmp(&Val::empty_array(), &Val::Int(i64::MAX)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            loose_cmp(&Val::str("zzz"), &Val::empty_array()),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn nan_is_incomparable() {
        assert_eq!(loose_cmp(&Val::Float(f64::NAN), &Val::Float(1.0)), None);
        assert!(!loose_eq(&Val::Float(f64::NAN), &Val::Float(f64::NAN)));
        assert_eq!(spaceship(&Val::Float(f64::NAN), &Val::Float(1.0)), 1);
    }

    #[test]
    fn spaceship_values() {
        assert_eq!(spaceship(&Val::Int(1), &Val::Int(2)), -1);
        assert_eq!(spaceship(&Val::Int(2), &Val::Int(2)), 0);
        assert_eq!(spaceship(&Val::Int(3), &Val::Int(2)), 1);
    }

    #[test]
    fn mixed_key_arrays() {
        let mut a = ArrayData::new();
        a.insert(ArrayKey::Str(Rc::new(b"k".to_vec())), Val::Int(1));
        let mut b = ArrayData::new();
        b.insert(ArrayKey::Str(Rc::new(b"k".to_vec())), Val::Int(1));
        assert!(loose_eq(&Val::array(a), &Val::array(b)));
    }
}

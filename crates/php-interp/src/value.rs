use indexmap::IndexMap;
use std::rc::Rc;

/// A runtime value. Strings are byte sequences (not guaranteed UTF-8) and
/// arrays are insertion-ordered maps behind `Rc`, mutated copy-on-write so
/// that assignment observably deep-copies.
#[derive(Debug, Clone)]
pub enum Val {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<Vec<u8>>),
    Array(Rc<ArrayData>),
    /// Internal "no value" sentinel: the result of statements and of
    /// functions that fall off the end.
    Void,
}

impl PartialEq for Val {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Val::Null, Val::Null) => true,
            (Val::Bool(a), Val::Bool(b)) => a == b,
            (Val::Int(a), Val::Int(b)) => a == b,
            (Val::Float(a), Val::Float(b)) => a == b,
            (Val::Str(a), Val::Str(b)) => a == b,
            (Val::Array(a), Val::Array(b)) => a == b,
            (Val::Void, Val::Void) => true,
            _ => false,
        }
    }
}

impl Val {
    pub fn str(bytes: impl Into<Vec<u8>>) -> Val {
        Val::Str(Rc::new(bytes.into()))
    }

    pub fn array(data: ArrayData) -> Val {
        Val::Array(Rc::new(data))
    }

    pub fn empty_array() -> Val {
        Val::Array(Rc::new(ArrayData::new()))
    }

    /// Type name as reported by `gettype`.
    pub fn gettype_name(&self) -> &'static str {
        match self {
            Val::Null => "NULL",
            Val::Bool(_) => "boolean",
            Val::Int(_) => "integer",
            Val::Float(_) => "double",
            Val::Str(_) => "string",
            Val::Array(_) => "array",
            Val::Void => "unknown type",
        }
    }

    /// Type name as used in declarations (`int $x`, return types).
    pub fn decl_type_name(&self) -> &'static str {
        match self {
            Val::Null => "null",
            Val::Bool(_) => "bool",
            Val::Int(_) => "int",
            Val::Float(_) => "float",
            Val::Str(_) => "string",
            Val::Array(_) => "array",
            Val::Void => "void",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Val::Null)
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Val::Bool(_) | Val::Int(_) | Val::Float(_) | Val::Str(_)
        )
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ArrayKey {
    Int(i64),
    Str(Rc<Vec<u8>>),
}

impl ArrayKey {
    /// Key coercion: floats, bools and null become int keys, and strings in
    /// decimal-literal form become the corresponding int key. Anything else
    /// keys as a string.
    pub fn from_val(val: &Val) -> Option<ArrayKey> {
        match val {
            Val::Int(i) => Some(ArrayKey::Int(*i)),
            Val::Float(f) => Some(ArrayKey::Int(*f as i64)),
            Val::Bool(b) => Some(ArrayKey::Int(*b as i64)),
            Val::Null => Some(ArrayKey::Int(0)),
            Val::Str(s) => match decimal_literal(s) {
                Some(i) => Some(ArrayKey::Int(i)),
                None => Some(ArrayKey::Str(s.clone())),
            },
            Val::Array(_) | Val::Void => None,
        }
    }
}

/// `"0"`, `"42"`, `"-7"` — exactly the strings whose decimal form
/// round-trips (no leading zeros, no `-0`, no whitespace).
fn decimal_literal(s: &[u8]) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let (digits, neg) = match s[0] {
        b'-' => (&s[1..], true),
        _ => (s, false),
    };
    if digits.is_empty() || !digits.iter().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return None;
    }
    if neg && digits == b"0" {
        return None;
    }
    let text = std::str::from_utf8(s).ok()?;
    text.parse().ok()
}

/// Insertion-ordered array storage. `next_key` tracks one past the highest
/// non-negative int key ever used, so implicit keys keep increasing even
/// after removals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayData {
    pub map: IndexMap<ArrayKey, Val>,
    next_key: i64,
}

impl ArrayData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &ArrayKey) -> Option<&Val> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &ArrayKey) -> Option<&mut Val> {
        self.map.get_mut(key)
    }

    pub fn contains_key(&self, key: &ArrayKey) -> bool {
        self.map.contains_key(key)
    }

    /// Re-inserting an existing key updates the value in place without
    /// changing its position.
    pub fn insert(&mut self, key: ArrayKey, value: Val) {
        if let ArrayKey::Int(i) = key {
            if i >= self.next_key {
                self.next_key = i.saturating_add(1);
            }
        }
        self.map.insert(key, value);
    }

    /// Append with the next implicit int key. `None` when the key space is
    /// exhausted; the element is not added.
    pub fn push(&mut self, value: Val) -> Option<ArrayKey> {
        if self.next_key == i64::MAX {
            return None;
        }
        let key = ArrayKey::Int(self.next_key);
        self.next_key += 1;
        self.map.insert(key.clone(), value);
        Some(key)
    }

    /// Removes preserve the order of the remaining elements.
    pub fn remove(&mut self, key: &ArrayKey) -> Option<Val> {
        self.map.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Val)> {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implicit_keys_count_up() {
        let mut arr = ArrayData::new();
        arr.push(Val::Int(10));
        arr.push(Val::Int(20));
        assert_eq!(arr.get(&ArrayKey::Int(0)), Some(&Val::Int(10)));
        assert_eq!(arr.get(&ArrayKey::Int(1)), Some(&Val::Int(20)));
    }

    #[test]
    fn next_key_skips_past_explicit_keys() {
        let mut arr = ArrayData::new();
        arr.insert(ArrayKey::Int(5), Val::Int(1));
        arr.push(Val::Int(2));
        assert_eq!(arr.get(&ArrayKey::Int(6)), Some(&Val::Int(2)));
    }

    #[test]
    fn next_key_survives_removal() {
        let mut arr = ArrayData::new();
        arr.push(Val::Int(1));
        arr.push(Val::Int(2));
        arr.remove(&ArrayKey::Int(1));
        arr.push(Val::Int(3));
        assert_eq!(arr.get(&ArrayKey::Int(2)), Some(&Val::Int(3)));
    }

    #[test]
    fn reinsert_keeps_position() {
        let mut arr = ArrayData::new();
        arr.insert(ArrayKey::Int(0), Val::Int(1));
        arr.insert(ArrayKey::Str(Rc::new(b"k".to_vec())), Val::Int(2));
        arr.insert(ArrayKey::Int(0), Val::Int(99));
        let keys: Vec<_> = arr.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys[0], ArrayKey::Int(0));
        assert_eq!(arr.get(&ArrayKey::Int(0)), Some(&Val::Int(99)));
    }

    #[test]
    fn string_keys_in_decimal_form_become_int() {
        assert_eq!(
            ArrayKey::from_val(&Val::str("42")),
            Some(ArrayKey::Int(42))
        );
        assert_eq!(
            ArrayKey::from_val(&Val::str("-3")),
            Some(ArrayKey::Int(-3))
        );
        assert_eq!(
            ArrayKey::from_val(&Val::str("042")),
            Some(ArrayKey::Str(Rc::new(b"042".to_vec())))
        );
        assert_eq!(
            ArrayKey::from_val(&Val::str("1.5")),
            Some(ArrayKey::Str(Rc::new(b"1.5".to_vec())))
        );
    }

    #[test]
    fn scalar_keys_coerce_to_int() {
        assert_eq!(ArrayKey::from_val(&Val::Bool(true)), Some(ArrayKey::Int(1)));
        assert_eq!(ArrayKey::from_val(&Val::Float(2.9)), Some(ArrayKey::Int(2)));
        assert_eq!(ArrayKey::from_val(&Val::Null), Some(ArrayKey::Int(0)));
    }

    #[test]
    fn copy_on_write_isolates_mutation() {
        let mut arr = ArrayData::new();
        arr.push(Val::Int(1));
        let original = Val::array(arr);
        let mut copy = original.clone();
        if let Val::Array(data) = &mut copy {
            Rc::make_mut(data).insert(ArrayKey::Int(0), Val::Int(99));
        }
        if let Val::Array(data) = &original {
            assert_eq!(data.get(&ArrayKey::Int(0)), Some(&Val::Int(1)));
        }
    }
}

//! Universal type conversions. All of them are deterministic and pure; the
//! evaluator layers diagnostics (array-to-string warnings and the like) on
//! top where required.

use crate::value::{ArrayData, ArrayKey, Val};

/// A parsed numeric string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    pub fn to_val(self) -> Val {
        match self {
            Num::Int(i) => Val::Int(i),
            Num::Float(f) => Val::Float(f),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

pub fn bool_of(v: &Val) -> bool {
    match v {
        Val::Null | Val::Void => false,
        Val::Bool(b) => *b,
        Val::Int(i) => *i != 0,
        Val::Float(f) => f.abs() != 0.0,
        Val::Str(s) => !s.is_empty() && s.as_slice() != b"0",
        Val::Array(arr) => !arr.is_empty(),
    }
}

pub fn int_of(v: &Val) -> i64 {
    match v {
        Val::Null | Val::Void => 0,
        Val::Bool(b) => *b as i64,
        Val::Int(i) => *i,
        Val::Float(f) => float_to_int(*f),
        Val::Str(s) => match parse_numeric_prefix(s) {
            Some(Num::Int(i)) => i,
            Some(Num::Float(f)) => float_to_int(f),
            None => 0,
        },
        Val::Array(arr) => {
            if arr.is_empty() {
                0
            } else {
                1
            }
        }
    }
}

/// Truncation toward zero; NaN and the infinities collapse to zero.
fn float_to_int(f: f64) -> i64 {
    if f.is_nan() || f.is_infinite() {
        0
    } else {
        f as i64
    }
}

pub fn float_of(v: &Val) -> f64 {
    match v {
        Val::Float(f) => *f,
        Val::Int(i) => *i as f64,
        Val::Str(s) => match parse_numeric_prefix(s) {
            Some(n) => n.as_f64(),
            None => 0.0,
        },
        other => int_of(other) as f64,
    }
}

pub fn str_of(v: &Val) -> Vec<u8> {
    match v {
        Val::Null | Val::Void => Vec::new(),
        Val::Bool(b) => {
            if *b {
                b"1".to_vec()
            } else {
                Vec::new()
            }
        }
        Val::Int(i) => i.to_string().into_bytes(),
        Val::Float(f) => fmt_float(*f).into_bytes(),
        Val::Str(s) => s.as_ref().clone(),
        // Invalid conversion; the caller emits the warning.
        Val::Array(_) => b"Array".to_vec(),
    }
}

pub fn array_of(v: &Val) -> Val {
    match v {
        Val::Array(_) => v.clone(),
        Val::Null | Val::Void => Val::empty_array(),
        scalar => {
            let mut data = ArrayData::new();
            data.insert(ArrayKey::Int(0), scalar.clone());
            Val::array(data)
        }
    }
}

/// Shortest round-trip decimal, with the IEEE specials spelled out.
pub fn fmt_float(f: f64) -> String {
    if f.is_nan() {
        "NAN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "INF".to_string()
        } else {
            "-INF".to_string()
        }
    } else {
        format!("{}", f)
    }
}

fn scan_number(s: &[u8], start: usize) -> Option<(usize, bool)> {
    let mut i = start;
    if i < s.len() && (s[i] == b'+' || s[i] == b'-') {
        i += 1;
    }

    let int_digits = {
        let from = i;
        while i < s.len() && s[i].is_ascii_digit() {
            i += 1;
        }
        i - from
    };

    let mut is_float = false;
    if i < s.len() && s[i] == b'.' {
        let from = i + 1;
        let mut j = from;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > from || int_digits > 0 {
            is_float = true;
            i = j;
        }
    }

    if int_digits == 0 && !is_float {
        return None;
    }

    if i < s.len() && (s[i] == b'e' || s[i] == b'E') {
        let mut j = i + 1;
        if j < s.len() && (s[j] == b'+' || s[j] == b'-') {
            j += 1;
        }
        let from = j;
        while j < s.len() && s[j].is_ascii_digit() {
            j += 1;
        }
        if j > from {
            is_float = true;
            i = j;
        }
    }

    Some((i, is_float))
}

fn make_num(text: &str, is_float: bool) -> Num {
    if is_float {
        Num::Float(text.parse().unwrap_or(0.0))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Num::Int(i),
            // Integer strings beyond the i64 range degrade to float.
            Err(_) => Num::Float(text.parse().unwrap_or(0.0)),
        }
    }
}

/// Leading-numeric parse: optional whitespace, then the longest numeric
/// prefix; trailing junk is ignored. `None` when no number leads.
pub fn parse_numeric_prefix(s: &[u8]) -> Option<Num> {
    let mut start = 0;
    while start < s.len() && s[start].is_ascii_whitespace() {
        start += 1;
    }
    let (end, is_float) = scan_number(s, start)?;
    let text = std::str::from_utf8(&s[start..end]).ok()?;
    Some(make_num(text, is_float))
}

/// Full numeric-string parse: the entire string (modulo surrounding
/// whitespace) must be one integer or floating literal.
pub fn parse_numeric(s: &[u8]) -> Option<Num> {
    let mut start = 0;
    while start < s.len() && s[start].is_ascii_whitespace() {
        start += 1;
    }
    let (end, is_float) = scan_number(s, start)?;
    let mut rest = end;
    while rest < s.len() && s[rest].is_ascii_whitespace() {
        rest += 1;
    }
    if rest != s.len() {
        return None;
    }
    let text = std::str::from_utf8(&s[start..end]).ok()?;
    Some(make_num(text, is_float))
}

pub fn is_numeric_str(s: &[u8]) -> bool {
    parse_numeric(s).is_some()
}

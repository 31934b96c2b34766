//! Variable handling: conversions, type predicates and var_dump.

use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::Exec;
use crate::interp::Interpreter;
use crate::ops::cast;
use crate::value::{ArrayKey, Val};

pub fn register(env: &mut Environment) {
    env.register_native("boolval", native_boolval);
    env.register_native("intval", native_intval);
    env.register_native("floatval", native_floatval);
    env.register_native("doubleval", native_floatval);
    env.register_native("strval", native_strval);
    env.register_native("gettype", native_gettype);
    env.register_native("is_bool", native_is_bool);
    env.register_native("is_int", native_is_int);
    env.register_native("is_integer", native_is_int);
    env.register_native("is_long", native_is_int);
    env.register_native("is_float", native_is_float);
    env.register_native("is_double", native_is_float);
    env.register_native("is_string", native_is_string);
    env.register_native("is_null", native_is_null);
    env.register_native("is_scalar", native_is_scalar);
    env.register_native("is_array", native_is_array);
    env.register_native("is_numeric", native_is_numeric);
    env.register_native("var_dump", native_var_dump);
}

fn native_boolval(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("boolval")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::Bool(cast::bool_of(&args[0])))
}

fn native_intval(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("intval")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::Int(cast::int_of(&args[0])))
}

fn native_floatval(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("floatval")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::Float(cast::float_of(&args[0])))
}

fn native_strval(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("strval")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::str(cast::str_of(&args[0])))
}

fn native_gettype(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("gettype")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::str(args[0].gettype_name()))
}

macro_rules! type_predicate {
    ($fn_name:ident, $php_name:literal, $pattern:pat) => {
        fn $fn_name(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
            let args = FuncParamValidator::new($php_name)
                .param("$value", &["mixed"])
                .validate(args)?;
            Ok(Val::Bool(matches!(&args[0], $pattern)))
        }
    };
}

type_predicate!(native_is_bool, "is_bool", Val::Bool(_));
type_predicate!(native_is_int, "is_int", Val::Int(_));
type_predicate!(native_is_float, "is_float", Val::Float(_));
type_predicate!(native_is_string, "is_string", Val::Str(_));
type_predicate!(native_is_null, "is_null", Val::Null);
type_predicate!(native_is_array, "is_array", Val::Array(_));

fn native_is_scalar(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("is_scalar")
        .param("$value", &["mixed"])
        .validate(args)?;
    Ok(Val::Bool(args[0].is_scalar()))
}

fn native_is_numeric(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("is_numeric")
        .param("$value", &["mixed"])
        .validate(args)?;
    let numeric = match &args[0] {
        Val::Int(_) | Val::Float(_) => true,
        Val::Str(s) => cast::is_numeric_str(s),
        _ => false,
    };
    Ok(Val::Bool(numeric))
}

fn native_var_dump(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("var_dump")
        .param("$value", &["mixed"])
        .variadic(&["mixed"])
        .validate(args)?;
    for arg in &args {
        dump(interp, arg, 2);
    }
    Ok(Val::Void)
}

fn dump(interp: &mut Interpreter, value: &Val, depth: usize) {
    match value {
        Val::Array(arr) => {
            interp.println(format!("array({}) {{", arr.len()).as_bytes());
            let arr = arr.clone();
            for (key, element) in arr.iter() {
                let key_text = match key {
                    ArrayKey::Int(i) => format!("[{}]=>", i),
                    ArrayKey::Str(s) => format!("[\"{}\"]=>", String::from_utf8_lossy(s)),
                };
                interp.print(" ".repeat(depth).as_bytes());
                interp.println(key_text.as_bytes());
                interp.print(" ".repeat(depth).as_bytes());
                dump(interp, element, depth + 2);
            }
            interp.print(" ".repeat(depth - 2).as_bytes());
            interp.println(b"}");
        }
        Val::Bool(b) => {
            interp.println(if *b { b"bool(true)" } else { b"bool(false)" });
        }
        Val::Int(i) => {
            interp.println(format!("int({})", i).as_bytes());
        }
        Val::Float(f) => {
            interp.println(format!("float({})", cast::fmt_float(*f)).as_bytes());
        }
        Val::Null | Val::Void => {
            interp.println(b"NULL");
        }
        Val::Str(s) => {
            let mut line = format!("string({}) \"", s.len()).into_bytes();
            line.extend_from_slice(s);
            line.push(b'"');
            interp.println(&line);
        }
    }
}

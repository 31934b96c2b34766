use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::{Exec, PhpError};
use crate::interp::Interpreter;
use crate::value::{ArrayKey, Val};

pub fn register(env: &mut Environment) {
    env.register_native("array_key_exists", native_array_key_exists);
    env.register_native("key_exists", native_array_key_exists);
    env.register_native("count", native_count);
    env.register_native("sizeof", native_count);
}

fn native_array_key_exists(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("array_key_exists")
        .param("$key", &["string", "int", "float", "bool", "null"])
        .param("$array", &["array"])
        .validate(args)?;
    let Val::Array(arr) = &args[1] else { unreachable!() };
    let exists = match ArrayKey::from_val(&args[0]) {
        Some(key) => arr.contains_key(&key),
        None => false,
    };
    Ok(Val::Bool(exists))
}

fn native_count(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("count")
        .param("$value", &["mixed"])
        .validate(args)?;
    match &args[0] {
        Val::Array(arr) => Ok(Val::Int(arr.len() as i64)),
        other => Err(PhpError::fatal(format!(
            "Uncaught TypeError: count(): Argument #1 ($value) must be of type array, {} given",
            other.decl_type_name()
        ))
        .into()),
    }
}

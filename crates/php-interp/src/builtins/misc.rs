use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::{Exec, PhpError, E_ALL};
use crate::ini::INI_USER;
use crate::interp::Interpreter;
use crate::ops::cast;
use crate::value::{ArrayKey, Val};
use std::rc::Rc;

pub fn register(env: &mut Environment) {
    env.register_native("constant", native_constant);
    env.register_native("defined", native_defined);
    env.register_native("define", native_define);
    env.register_native("error_reporting", native_error_reporting);
    env.register_native("ini_get", native_ini_get);
    env.register_native("ini_set", native_ini_set);
    env.register_native("getenv", native_getenv);
    env.register_native("function_exists", native_function_exists);
}

fn string_arg(value: &Val) -> String {
    String::from_utf8_lossy(&cast::str_of(value)).into_owned()
}

fn native_constant(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("constant")
        .param("$name", &["string"])
        .validate(args)?;
    let name = string_arg(&args[0]);
    match interp.env.lookup_constant(&name) {
        Some(value) => Ok(value.clone()),
        None => Err(PhpError::fatal(format!(
            "Uncaught Error: Undefined constant \"{}\"",
            name
        ))
        .into()),
    }
}

fn native_defined(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("defined")
        .param("$constant_name", &["string"])
        .validate(args)?;
    let name = string_arg(&args[0]);
    Ok(Val::Bool(interp.env.constant_defined(&name)))
}

fn native_define(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("define")
        .param("$constant_name", &["string"])
        .param("$value", &["mixed"])
        .validate(args)?;
    let name = string_arg(&args[0]);
    if !interp.env.declare_constant(&name, args[1].clone()) {
        interp.report(&PhpError::warning(format!(
            "Constant {} already defined",
            name
        )));
        return Ok(Val::Bool(false));
    }
    Ok(Val::Bool(true))
}

fn native_error_reporting(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("error_reporting")
        .optional("$error_level", &["int", "null"], Val::Null)
        .validate(args)?;

    let previous = interp.ini.get_int("error_reporting");
    if let Val::Int(level) = args[0] {
        let level = if level == -1 { E_ALL } else { level };
        interp
            .ini
            .set("error_reporting", &level.to_string(), INI_USER)
            .map_err(crate::error::Flow::from)?;
    }
    Ok(Val::Int(previous))
}

fn native_ini_get(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("ini_get")
        .param("$option", &["string"])
        .validate(args)?;
    let option = string_arg(&args[0]);
    match interp.ini.get(&option) {
        Some(value) => Ok(Val::str(value.to_string())),
        None => Ok(Val::Bool(false)),
    }
}

fn native_ini_set(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("ini_set")
        .param("$option", &["string"])
        .param("$value", &["string", "int", "float", "bool", "null"])
        .validate(args)?;
    let option = string_arg(&args[0]);
    let value = string_arg(&args[1]);

    let Some(previous) = interp.ini.get(&option).map(|v| v.to_string()) else {
        return Ok(Val::Bool(false));
    };
    // User scripts set from INI_USER scope; out-of-scope attempts fail.
    if interp.ini.set(&option, &value, INI_USER).is_err() {
        return Ok(Val::Bool(false));
    }
    Ok(Val::str(previous))
}

fn native_getenv(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("getenv")
        .optional("$name", &["string", "null"], Val::Null)
        .validate(args)?;

    let env_vars = interp
        .env
        .lookup_var("_ENV")
        .cloned()
        .unwrap_or_else(Val::empty_array);

    if args[0].is_null() {
        return Ok(env_vars);
    }

    let Val::Str(name) = &args[0] else { unreachable!() };
    let Val::Array(arr) = &env_vars else {
        return Ok(Val::Bool(false));
    };
    match arr.get(&ArrayKey::Str(Rc::new(name.as_ref().clone()))) {
        Some(value) => Ok(value.clone()),
        None => Ok(Val::Bool(false)),
    }
}

fn native_function_exists(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("function_exists")
        .param("$function", &["string"])
        .validate(args)?;
    let name = string_arg(&args[0]);
    Ok(Val::Bool(interp.env.function_exists(&name)))
}

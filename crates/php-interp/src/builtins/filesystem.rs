use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::Exec;
use crate::interp::Interpreter;
use crate::ops::cast;
use crate::value::Val;
use std::path::Path;

pub fn register(env: &mut Environment) {
    env.register_native("file_exists", native_file_exists);
}

fn native_file_exists(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("file_exists")
        .param("$filename", &["string"])
        .validate(args)?;
    let path = String::from_utf8_lossy(&cast::str_of(&args[0])).into_owned();
    Ok(Val::Bool(Path::new(&path).exists()))
}

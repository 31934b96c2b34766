use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::Exec;
use crate::interp::Interpreter;
use crate::value::Val;

pub fn register(env: &mut Environment) {
    env.register_native("strlen", native_strlen);
}

fn native_strlen(_: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    let args = FuncParamValidator::new("strlen")
        .param("$string", &["string"])
        .validate(args)?;
    let Val::Str(s) = &args[0] else { unreachable!() };
    Ok(Val::Int(s.len() as i64))
}

//! Output-control natives. A non-empty buffer stack captures all output;
//! these functions move, discard or hand back the captured bytes.

use super::FuncParamValidator;
use crate::environment::Environment;
use crate::error::{Exec, PhpError};
use crate::interp::Interpreter;
use crate::value::Val;

pub fn register(env: &mut Environment) {
    env.register_native("ob_start", native_ob_start);
    env.register_native("ob_flush", native_ob_flush);
    env.register_native("ob_clean", native_ob_clean);
    env.register_native("ob_end_flush", native_ob_end_flush);
    env.register_native("ob_end_clean", native_ob_end_clean);
    env.register_native("ob_get_flush", native_ob_get_flush);
    env.register_native("ob_get_clean", native_ob_get_clean);
    env.register_native("ob_get_contents", native_ob_get_contents);
    env.register_native("ob_get_level", native_ob_get_level);
}

fn no_buffer(interp: &mut Interpreter, func: &str, action: &str) -> Val {
    interp.report(&PhpError::notice(format!(
        "{}(): Failed to {} buffer. No buffer to {}",
        func, action, action
    )));
    Val::Bool(false)
}

fn native_ob_start(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_start").validate(args)?;
    interp.buffers.push();
    Ok(Val::Bool(true))
}

/// Move the active buffer's content one level down (or to the result when
/// it is the only buffer) and clear it.
fn flush_top(interp: &mut Interpreter) {
    let content = interp.buffers.take_top().unwrap_or_default();
    if interp.buffers.len() == 1 {
        interp.write_result(&content);
    } else {
        interp.buffers.write_below_top(&content);
    }
}

fn native_ob_flush(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_flush").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(no_buffer(interp, "ob_flush", "flush"));
    }
    flush_top(interp);
    Ok(Val::Bool(true))
}

fn native_ob_clean(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_clean").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(no_buffer(interp, "ob_clean", "delete"));
    }
    interp.buffers.clear_top();
    Ok(Val::Bool(true))
}

fn native_ob_end_flush(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_end_flush").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(no_buffer(interp, "ob_end_flush", "delete"));
    }
    flush_top(interp);
    interp.buffers.pop();
    Ok(Val::Bool(true))
}

fn native_ob_end_clean(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_end_clean").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(no_buffer(interp, "ob_end_clean", "delete"));
    }
    interp.buffers.pop();
    Ok(Val::Bool(true))
}

fn native_ob_get_flush(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_get_flush").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(no_buffer(interp, "ob_get_flush", "delete"));
    }
    let content = interp.buffers.top().unwrap_or_default().to_vec();
    flush_top(interp);
    interp.buffers.pop();
    Ok(Val::str(content))
}

fn native_ob_get_clean(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_get_clean").validate(args)?;
    if interp.buffers.is_empty() {
        return Ok(Val::Bool(false));
    }
    let content = interp.buffers.pop().unwrap_or_default();
    Ok(Val::str(content))
}

fn native_ob_get_contents(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_get_contents").validate(args)?;
    match interp.buffers.top() {
        Some(content) => Ok(Val::str(content.to_vec())),
        None => Ok(Val::Bool(false)),
    }
}

fn native_ob_get_level(interp: &mut Interpreter, args: Vec<Val>) -> Exec<Val> {
    FuncParamValidator::new("ob_get_level").validate(args)?;
    Ok(Val::Int(interp.buffers.len() as i64))
}

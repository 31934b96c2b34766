//! Native function registry. Every native validates its arguments through
//! `FuncParamValidator` before doing anything else.

mod array;
mod filesystem;
mod misc;
mod output;
mod string;
mod variable;

use crate::environment::Environment;
use crate::error::PhpError;
use crate::value::Val;

pub fn register_all(env: &mut Environment) {
    variable::register(env);
    string::register(env);
    array::register(env);
    output::register(env);
    misc::register(env);
    filesystem::register(env);
}

struct ParamDef {
    name: &'static str,
    types: &'static [&'static str],
    default: Option<Val>,
}

/// Explicit per-parameter validation: name, accepted type list, optional
/// default, optional variadic tail.
pub struct FuncParamValidator {
    func: &'static str,
    params: Vec<ParamDef>,
    variadic: Option<&'static [&'static str]>,
}

impl FuncParamValidator {
    pub fn new(func: &'static str) -> Self {
        Self {
            func,
            params: Vec::new(),
            variadic: None,
        }
    }

    pub fn param(mut self, name: &'static str, types: &'static [&'static str]) -> Self {
        self.params.push(ParamDef {
            name,
            types,
            default: None,
        });
        self
    }

    pub fn optional(
        mut self,
        name: &'static str,
        types: &'static [&'static str],
        default: Val,
    ) -> Self {
        self.params.push(ParamDef {
            name,
            types,
            default: Some(default),
        });
        self
    }

    pub fn variadic(mut self, types: &'static [&'static str]) -> Self {
        self.variadic = Some(types);
        self
    }

    pub fn validate(self, mut args: Vec<Val>) -> Result<Vec<Val>, PhpError> {
        let required = self.params.iter().filter(|p| p.default.is_none()).count();
        let exact = required == self.params.len() && self.variadic.is_none();

        if args.len() < required {
            return Err(self.arity_error(if exact { "exactly" } else { "at least" }, required, args.len()));
        }
        if args.len() > self.params.len() && self.variadic.is_none() {
            return Err(self.arity_error(
                if exact { "exactly" } else { "at most" },
                self.params.len(),
                args.len(),
            ));
        }

        // Fill omitted optional parameters with their defaults.
        while args.len() < self.params.len() {
            let default = self.params[args.len()]
                .default
                .clone()
                .expect("arity checked above");
            args.push(default);
        }

        for (i, arg) in args.iter().enumerate() {
            let (types, name) = if i < self.params.len() {
                (self.params[i].types, self.params[i].name)
            } else {
                (self.variadic.unwrap_or(&["mixed"]), "$values")
            };
            if !type_accepts(types, arg) {
                return Err(PhpError::fatal(format!(
                    "Uncaught TypeError: {}(): Argument #{} ({}) must be of type {}, {} given",
                    self.func,
                    i + 1,
                    name,
                    types.join("|"),
                    arg.decl_type_name()
                )));
            }
        }

        Ok(args)
    }

    fn arity_error(&self, bound: &str, expected: usize, given: usize) -> PhpError {
        PhpError::fatal(format!(
            "Uncaught ArgumentCountError: {}() expects {} {} {}, {} given",
            self.func,
            bound,
            expected,
            if expected == 1 { "argument" } else { "arguments" },
            given
        ))
    }
}

fn type_accepts(types: &[&str], value: &Val) -> bool {
    types
        .iter()
        .any(|t| *t == "mixed" || *t == value.decl_type_name())
}

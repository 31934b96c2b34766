use crate::error::{Exec, E_ALL, E_DEPRECATED, E_ERROR, E_NOTICE, E_PARSE, E_WARNING};
use crate::ini::{INI_ALL, INI_PERDIR, INI_SYSTEM, INI_USER};
use crate::interp::Interpreter;
use crate::request::Request;
use crate::value::{ArrayData, ArrayKey, Val};
use php_syntax::ast::{ClassDecl, FunctionDecl};
use php_syntax::SourceFile;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

pub type NativeFn = fn(&mut Interpreter, Vec<Val>) -> Exec<Val>;

/// A user function together with the source file that declared it, so
/// diagnostics inside the body point at the right file.
#[derive(Clone)]
pub struct UserFunction {
    pub decl: Rc<FunctionDecl>,
    pub source: Rc<SourceFile>,
}

/// One lexical scope. The root frame lives for the interpreter's lifetime;
/// a fresh frame is pushed per function call.
#[derive(Default)]
pub struct Frame {
    variables: HashMap<String, Val>,
    /// Names bound to the root frame via `global`.
    globals: HashSet<String>,
    pub current_function: Option<Rc<FunctionDecl>>,
}

impl Frame {
    pub fn for_function(decl: Rc<FunctionDecl>) -> Self {
        Frame {
            current_function: Some(decl),
            ..Default::default()
        }
    }
}

pub struct Environment {
    frames: Vec<Frame>,
    constants: HashMap<String, Val>,
    functions: HashMap<String, UserFunction>,
    natives: HashMap<String, NativeFn>,
    pub classes: HashMap<String, Rc<ClassDecl>>,
}

impl Environment {
    pub fn new() -> Self {
        let mut env = Self {
            frames: vec![Frame::default()],
            constants: HashMap::new(),
            functions: HashMap::new(),
            natives: HashMap::new(),
            classes: HashMap::new(),
        };
        env.register_predefined_constants();
        env
    }

    fn register_predefined_constants(&mut self) {
        let consts: &[(&str, Val)] = &[
            ("TRUE", Val::Bool(true)),
            ("FALSE", Val::Bool(false)),
            ("NULL", Val::Null),
            ("PHP_EOL", Val::str("\n")),
            ("PHP_INT_MAX", Val::Int(i64::MAX)),
            ("PHP_INT_MIN", Val::Int(i64::MIN)),
            ("PHP_INT_SIZE", Val::Int(8)),
            ("PHP_FLOAT_EPSILON", Val::Float(f64::EPSILON)),
            ("PHP_VERSION", Val::str("8.0.0")),
            (
                "PHP_OS",
                Val::str(if cfg!(windows) { "WINNT" } else { "Linux" }),
            ),
            ("E_ERROR", Val::Int(E_ERROR)),
            ("E_WARNING", Val::Int(E_WARNING)),
            ("E_PARSE", Val::Int(E_PARSE)),
            ("E_NOTICE", Val::Int(E_NOTICE)),
            ("E_DEPRECATED", Val::Int(E_DEPRECATED)),
            ("E_ALL", Val::Int(E_ALL)),
            ("INI_USER", Val::Int(INI_USER)),
            ("INI_PERDIR", Val::Int(INI_PERDIR)),
            ("INI_SYSTEM", Val::Int(INI_SYSTEM)),
            ("INI_ALL", Val::Int(INI_ALL)),
        ];
        for (name, value) in consts {
            self.constants.insert((*name).to_string(), value.clone());
        }
    }

    /// Build the `$_GET`-style superglobals in the root frame.
    pub fn seed_superglobals(&mut self, request: &Request) {
        let build = |pairs: &[(Vec<u8>, Vec<u8>)]| {
            let mut data = ArrayData::new();
            for (key, value) in pairs {
                data.insert(
                    ArrayKey::Str(Rc::new(key.clone())),
                    Val::str(value.clone()),
                );
            }
            Val::array(data)
        };

        let get = build(&request.get);
        let post = build(&request.post);
        let cookie = build(&request.cookie);

        // $_REQUEST merges GET, POST and COOKIE in that order.
        let mut request_data = ArrayData::new();
        for source in [&get, &post, &cookie] {
            if let Val::Array(arr) = source {
                for (k, v) in arr.iter() {
                    request_data.insert(k.clone(), v.clone());
                }
            }
        }

        let root = &mut self.frames[0];
        root.variables.insert("_GET".to_string(), get);
        root.variables.insert("_POST".to_string(), post);
        root.variables.insert("_COOKIE".to_string(), cookie);
        root.variables
            .insert("_SERVER".to_string(), build(&request.server));
        root.variables.insert("_ENV".to_string(), build(&request.env));
        root.variables
            .insert("_REQUEST".to_string(), Val::array(request_data));
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) {
        debug_assert!(self.frames.len() > 1, "cannot pop the root frame");
        self.frames.pop();
    }

    pub fn current_function(&self) -> Option<&Rc<FunctionDecl>> {
        self.frames.last().and_then(|f| f.current_function.as_ref())
    }

    fn frame_index_for(&self, name: &str) -> usize {
        let top = self.frames.len() - 1;
        if self.frames[top].globals.contains(name) {
            0
        } else {
            top
        }
    }

    pub fn lookup_var(&self, name: &str) -> Option<&Val> {
        self.frames[self.frame_index_for(name)].variables.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: Val) {
        let idx = self.frame_index_for(name);
        self.frames[idx].variables.insert(name.to_string(), value);
    }

    /// `unset` drops the local binding; a `global` import is severed, the
    /// root variable itself survives.
    pub fn unset_var(&mut self, name: &str) {
        let top = self.frames.len() - 1;
        if !self.frames[top].globals.remove(name) {
            self.frames[top].variables.remove(name);
        }
    }

    pub fn import_global(&mut self, name: &str) {
        let top = self.frames.len() - 1;
        if top == 0 {
            return; // `global` at the root scope is a no-op
        }
        self.frames[top].globals.insert(name.to_string());
    }

    pub fn lookup_constant(&self, name: &str) -> Option<&Val> {
        if let Some(value) = self.constants.get(name) {
            return Some(value);
        }
        // true/false/null match case-insensitively.
        for predefined in ["TRUE", "FALSE", "NULL"] {
            if name.eq_ignore_ascii_case(predefined) {
                return self.constants.get(predefined);
            }
        }
        None
    }

    pub fn constant_defined(&self, name: &str) -> bool {
        self.lookup_constant(name).is_some()
    }

    pub fn declare_constant(&mut self, name: &str, value: Val) -> bool {
        if self.constants.contains_key(name) {
            return false;
        }
        self.constants.insert(name.to_string(), value);
        true
    }

    pub fn declare_function(&mut self, decl: Rc<FunctionDecl>, source: Rc<SourceFile>) -> bool {
        let key = decl.name.to_ascii_lowercase();
        if let Some(existing) = self.functions.get(&key) {
            // Re-executing the same declaration node is fine.
            return Rc::ptr_eq(&existing.decl, &decl);
        }
        self.functions.insert(key, UserFunction { decl, source });
        true
    }

    pub fn lookup_function(&self, name: &str) -> Option<&UserFunction> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    pub fn register_native(&mut self, name: &str, f: NativeFn) {
        self.natives.insert(name.to_ascii_lowercase(), f);
    }

    pub fn lookup_native(&self, name: &str) -> Option<NativeFn> {
        self.natives.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn function_exists(&self, name: &str) -> bool {
        let key = name.to_ascii_lowercase();
        self.natives.contains_key(&key) || self.functions.contains_key(&key)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

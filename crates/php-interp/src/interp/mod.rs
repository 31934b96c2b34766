mod expr;
mod stmt;
mod strings;

use crate::builtins;
use crate::environment::Environment;
use crate::error::{ErrorKind, Exec, Flow, PhpError};
use crate::ini::Ini;
use crate::output_buffer::OutputBufferStack;
use crate::request::Request;
use crate::value::Val;
use php_syntax::ast::{NodeId, Program, Stmt, StmtKind};
use php_syntax::span::Span;
use php_syntax::{Parser, SourceFile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A single-run interpreter instance: owns the environment, the output
/// sink, the buffer stack and the include bookkeeping. Create a fresh one
/// per program execution.
pub struct Interpreter {
    pub ini: Ini,
    pub env: Environment,
    pub(crate) buffers: OutputBufferStack,
    included_files: Vec<String>,
    result: Vec<u8>,
    exit_code: i32,
    /// Diagnostic suppression depth (`@`, `isset`, the `??` left side).
    suppress: u32,
    next_node_id: NodeId,
    /// Memoized `const` initializer results, keyed by node id. Cleared on
    /// every variable write.
    pub(crate) cache: HashMap<NodeId, Val>,
    file_stack: Vec<Rc<SourceFile>>,
    main_filename: String,
}

impl Interpreter {
    pub fn new(ini: Ini, request: Request, filename: &str) -> Self {
        let mut env = Environment::new();
        env.seed_superglobals(&request);
        builtins::register_all(&mut env);

        Self {
            ini,
            env,
            buffers: OutputBufferStack::new(),
            included_files: Vec::new(),
            result: Vec::new(),
            exit_code: 0,
            suppress: 0,
            next_node_id: 0,
            cache: HashMap::new(),
            file_stack: Vec::new(),
            main_filename: filename.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub(crate) fn set_exit_code(&mut self, code: i32) {
        self.exit_code = code;
    }

    /// Run a program. Output produced so far is always returned; a fatal
    /// or parse error is appended to it (mask-filtered), sets exit code
    /// 255 and is also handed back for inspection.
    pub fn process(&mut self, source: &[u8]) -> (Vec<u8>, Option<PhpError>) {
        self.result.clear();
        let file = Rc::new(SourceFile::new(self.main_filename.clone(), source.to_vec()));

        let outcome = self.run_source(file);
        self.flush_all_buffers();

        let err = match outcome {
            Ok(_) | Err(Flow::Exit) | Err(Flow::Return(_)) => None,
            Err(Flow::Break(_)) | Err(Flow::Continue(_)) => Some(PhpError::fatal(
                "Uncaught Error: Cannot break/continue outside of a loop",
            )),
            Err(Flow::Err(err)) => Some(err),
        };

        if let Some(err) = &err {
            self.exit_code = 255;
            let text = self.error_to_string(err);
            if !text.is_empty() {
                self.result.push(b'\n');
                self.result.extend_from_slice(text.as_bytes());
                self.result.push(b'\n');
            }
        }

        (std::mem::take(&mut self.result), err)
    }

    /// Render an error subject to the error-reporting mask; empty when the
    /// mask filters it out.
    pub fn error_to_string(&self, err: &PhpError) -> String {
        if self.ini.get_int("error_reporting") & err.kind.mask_bit() == 0 {
            return String::new();
        }
        err.to_string()
    }

    // ----- output ---------------------------------------------------------

    /// Writes go to the active output buffer when one is open, otherwise
    /// straight to the result.
    pub fn print(&mut self, bytes: &[u8]) {
        if self.buffers.is_empty() {
            self.result.extend_from_slice(bytes);
        } else {
            self.buffers.write(bytes);
        }
    }

    pub fn println(&mut self, bytes: &[u8]) {
        self.print(bytes);
        self.print(b"\n");
    }

    pub(crate) fn write_result(&mut self, bytes: &[u8]) {
        self.result.extend_from_slice(bytes);
    }

    /// At termination every remaining buffer is flushed, top to bottom.
    fn flush_all_buffers(&mut self) {
        while !self.buffers.is_empty() {
            let content = self.buffers.take_top().unwrap_or_default();
            if self.buffers.len() == 1 {
                self.result.extend_from_slice(&content);
            } else {
                self.buffers.write_below_top(&content);
            }
            self.buffers.pop();
        }
    }

    // ----- diagnostics ----------------------------------------------------

    /// Print a non-fatal diagnostic, honoring suppression and the mask.
    pub fn report(&mut self, err: &PhpError) {
        debug_assert!(!err.kind.is_fatal(), "fatal errors propagate, not print");
        if self.suppress > 0 {
            return;
        }
        let text = self.error_to_string(err);
        if text.is_empty() {
            return;
        }
        self.print(b"\n");
        self.println(text.as_bytes());
    }

    pub(crate) fn warn(&mut self, span: Span, message: impl std::fmt::Display) {
        let err = PhpError {
            kind: ErrorKind::Warning,
            message: format!("{} in {}", message, self.pos(span)),
        };
        self.report(&err);
    }

    pub(crate) fn notice(&mut self, span: Span, message: impl std::fmt::Display) {
        let err = PhpError {
            kind: ErrorKind::Notice,
            message: format!("{} in {}", message, self.pos(span)),
        };
        self.report(&err);
    }

    pub(crate) fn fatal(&self, span: Span, message: impl std::fmt::Display) -> Flow {
        Flow::Err(PhpError::fatal(format!(
            "{} in {}",
            message,
            self.pos(span)
        )))
    }

    // ----- positions ------------------------------------------------------

    pub(crate) fn current_file(&self) -> Option<&Rc<SourceFile>> {
        self.file_stack.last()
    }

    pub(crate) fn push_source(&mut self, file: Rc<SourceFile>) {
        self.file_stack.push(file);
    }

    pub(crate) fn pop_source(&mut self) {
        self.file_stack.pop();
    }

    pub(crate) fn pos(&self, span: Span) -> String {
        match self.current_file() {
            Some(file) => file.pos_string(span),
            None => format!("{}:0:0", self.main_filename),
        }
    }

    pub(crate) fn line_of(&self, span: Span) -> u32 {
        self.current_file()
            .map(|f| f.line_col(span.start).0)
            .unwrap_or(0)
    }

    // ----- execution ------------------------------------------------------

    /// Parse a source file and execute it in the current scope. Node ids
    /// continue from the interpreter's watermark so they stay unique
    /// across includes and eval.
    pub(crate) fn run_source(&mut self, file: Rc<SourceFile>) -> Exec<Val> {
        let program = {
            let short_open_tag = self.ini.get_bool("short_open_tag");
            let mut parser = Parser::new(&file.src, short_open_tag, self.next_node_id);
            match parser.parse_program() {
                Ok(program) => program,
                Err(parse_err) => {
                    return Err(Flow::Err(PhpError::parse(parse_err.render(&file))));
                }
            }
        };
        self.next_node_id = program.next_id;

        self.file_stack.push(file);
        let result = self.run_program(&program);
        self.file_stack.pop();
        result
    }

    fn run_program(&mut self, program: &Program) -> Exec<Val> {
        self.hoist_declarations(&program.statements)?;
        self.run_stmts(&program.statements)
    }

    /// Function and class declarations at the top level (including inside
    /// bare blocks) are visible before their statement executes.
    fn hoist_declarations(&mut self, stmts: &[Stmt]) -> Exec<()> {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Block(inner) => self.hoist_declarations(inner)?,
                StmtKind::Function(decl) => self.declare_function(decl.clone(), stmt.span)?,
                StmtKind::Class(decl) => {
                    self.env
                        .classes
                        .insert(decl.name.to_ascii_lowercase(), decl.clone());
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn declare_function(
        &mut self,
        decl: Rc<php_syntax::ast::FunctionDecl>,
        span: Span,
    ) -> Exec<()> {
        let source = self
            .current_file()
            .cloned()
            .unwrap_or_else(|| Rc::new(SourceFile::new(self.main_filename.clone(), Vec::new())));
        if !self.env.declare_function(decl.clone(), source) {
            return Err(self.fatal(
                span,
                format!("Uncaught Error: Cannot redeclare {}()", decl.name),
            ));
        }
        Ok(())
    }

    pub(crate) fn run_stmts(&mut self, stmts: &[Stmt]) -> Exec<Val> {
        let mut value = Val::Void;
        for stmt in stmts {
            value = self.eval_stmt(stmt)?;
        }
        Ok(value)
    }

    // ----- includes and eval ---------------------------------------------

    pub(crate) fn include_file(
        &mut self,
        kind: php_syntax::ast::IncludeKind,
        path_expr: &php_syntax::ast::Expr,
        span: Span,
    ) -> Exec<Val> {
        let path_val = self.eval_expr(path_expr)?;
        if path_val.is_null() {
            return Err(self.fatal(span, "Uncaught ValueError: Path cannot be empty"));
        }
        let filename_bytes = self.str_value(&path_val, path_expr.span);
        let filename = String::from_utf8_lossy(&filename_bytes).into_owned();

        let including_dir = self
            .current_file()
            .and_then(|f| Path::new(&f.path).parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        let abs = if Path::new(&filename).is_absolute() {
            PathBuf::from(&filename)
        } else {
            including_dir.join(&filename)
        };
        let normalized = abs
            .canonicalize()
            .unwrap_or_else(|_| abs.clone())
            .to_string_lossy()
            .into_owned();

        // A file already pulled in via a *_once variant is not run again.
        if kind.is_once() && self.included_files.iter().any(|f| *f == normalized) {
            return Ok(Val::Bool(true));
        }

        let content = match std::fs::read(&abs) {
            Ok(content) => content,
            Err(_) => {
                self.warn(
                    span,
                    format!(
                        "{}({}): Failed to open stream: No such file or directory",
                        kind.function_name(),
                        filename
                    ),
                );
                if kind.is_require() {
                    return Err(self.fatal(
                        span,
                        format!(
                            "Uncaught Error: Failed opening required '{}' (include_path='{}')",
                            filename,
                            including_dir.display()
                        ),
                    ));
                }
                self.warn(
                    span,
                    format!(
                        "{}(): Failed opening '{}' for inclusion (include_path='{}')",
                        kind.function_name(),
                        filename,
                        including_dir.display()
                    ),
                );
                return Ok(Val::Bool(false));
            }
        };

        // Recorded before execution so re-entrant includes are detected.
        self.included_files.push(normalized.clone());

        let file = Rc::new(SourceFile::new(normalized, content));
        match self.run_source(file) {
            Ok(_) => Ok(Val::Int(1)),
            Err(Flow::Return(value)) => Ok(value),
            Err(flow) => Err(flow),
        }
    }

    pub(crate) fn eval_code(&mut self, code: &[u8], span: Span) -> Exec<Val> {
        let mut source = b"<?php ".to_vec();
        source.extend_from_slice(code);
        source.extend_from_slice(b" ?>");

        let name = match self.current_file() {
            Some(file) => format!(
                "{}({}) : eval()'d code",
                file.path,
                file.line_col(span.start).0
            ),
            None => "eval()'d code".to_string(),
        };

        let file = Rc::new(SourceFile::new(name, source));
        match self.run_source(file) {
            Ok(_) => Ok(Val::Null),
            Err(Flow::Return(value)) => Ok(value),
            Err(flow) => Err(flow),
        }
    }

    // ----- shared helpers -------------------------------------------------

    /// String conversion with the array-to-string warning attached.
    pub(crate) fn str_value(&mut self, value: &Val, span: Span) -> Vec<u8> {
        if matches!(value, Val::Array(_)) {
            self.warn(span, "Array to string conversion");
        }
        crate::ops::cast::str_of(value)
    }

    pub(crate) fn eval_suppressed(&mut self, expr: &php_syntax::ast::Expr) -> Exec<Val> {
        self.suppress += 1;
        let result = self.eval_expr(expr);
        self.suppress -= 1;
        result
    }

    pub(crate) fn invalidate_cache(&mut self) {
        // Conservative: any write clears every memoized sub-expression.
        if !self.cache.is_empty() {
            self.cache.clear();
        }
    }
}

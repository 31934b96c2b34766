use super::Interpreter;
use crate::error::{Exec, Flow};
use crate::ops::cast;
use crate::value::{ArrayKey, Val};
use php_syntax::ast::{Expr, Stmt, StmtKind};

/// What a loop body run means for the enclosing loop.
enum LoopCtl {
    Normal,
    Break,
}

impl Interpreter {
    pub(crate) fn eval_stmt(&mut self, stmt: &Stmt) -> Exec<Val> {
        match &stmt.kind {
            StmtKind::Nop => Ok(Val::Void),
            StmtKind::Block(stmts) => self.run_stmts(stmts),
            StmtKind::Expr(expr) => self.eval_expr(expr),
            StmtKind::Text(bytes) => {
                self.print(bytes);
                Ok(Val::Void)
            }
            StmtKind::Echo(exprs) => {
                for expr in exprs {
                    let value = self.eval_expr(expr)?;
                    let bytes = self.str_value(&value, expr.span);
                    self.print(&bytes);
                }
                Ok(Val::Void)
            }
            StmtKind::Const(consts) => {
                for (name, init) in consts {
                    let value = match self.cache.get(&init.id) {
                        Some(cached) => cached.clone(),
                        None => {
                            let value = self.eval_expr(init)?;
                            self.cache.insert(init.id, value.clone());
                            value
                        }
                    };
                    if !self.env.declare_constant(name, value) {
                        self.warn(stmt.span, format!("Constant {} already defined", name));
                    }
                }
                Ok(Val::Void)
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.truthy(cond)? {
                    self.run_stmts(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.run_stmts(else_branch)?;
                }
                Ok(Val::Void)
            }
            StmtKind::While { cond, body } => {
                while self.truthy(cond)? {
                    if let LoopCtl::Break = self.run_loop_body(body)? {
                        break;
                    }
                }
                Ok(Val::Void)
            }
            StmtKind::DoWhile { body, cond } => {
                loop {
                    if let LoopCtl::Break = self.run_loop_body(body)? {
                        break;
                    }
                    if !self.truthy(cond)? {
                        break;
                    }
                }
                Ok(Val::Void)
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                for expr in init {
                    self.eval_expr(expr)?;
                }
                loop {
                    // Every condition expression runs; the last one decides.
                    let mut keep_going = true;
                    for expr in cond {
                        keep_going = cast::bool_of(&self.eval_expr(expr)?);
                    }
                    if !keep_going {
                        break;
                    }
                    if let LoopCtl::Break = self.run_loop_body(body)? {
                        break;
                    }
                    for expr in step {
                        self.eval_expr(expr)?;
                    }
                }
                Ok(Val::Void)
            }
            StmtKind::Foreach {
                subject,
                key_var,
                value_var,
                body,
            } => {
                let subject_val = self.eval_expr(subject)?;
                let subject_type = subject_val.decl_type_name();
                let Val::Array(arr) = subject_val else {
                    self.warn(
                        subject.span,
                        format!(
                            "foreach() argument must be of type array, {} given",
                            subject_type
                        ),
                    );
                    return Ok(Val::Void);
                };

                // Iterate a snapshot; mutation inside the body sees the
                // copy-on-write clone, not the loop's view.
                for (key, value) in arr.iter() {
                    if let Some(key_var) = key_var {
                        let key_val = match key {
                            ArrayKey::Int(i) => Val::Int(*i),
                            ArrayKey::Str(s) => Val::Str(s.clone()),
                        };
                        self.write_target(key_var, key_val)?;
                    }
                    self.write_target(value_var, value.clone())?;

                    if let LoopCtl::Break = self.run_loop_body(body)? {
                        break;
                    }
                }
                Ok(Val::Void)
            }
            StmtKind::Break(level) => {
                let n = self.loop_level(level.as_ref(), stmt)?;
                Err(Flow::Break(n))
            }
            StmtKind::Continue(level) => {
                let n = self.loop_level(level.as_ref(), stmt)?;
                Err(Flow::Continue(n))
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Val::Void,
                };
                Err(Flow::Return(value))
            }
            StmtKind::Function(decl) => {
                self.declare_function(decl.clone(), stmt.span)?;
                Ok(Val::Void)
            }
            StmtKind::Global(names) => {
                for name in names {
                    self.env.import_global(name);
                }
                Ok(Val::Void)
            }
            StmtKind::Declare { directives, body } => {
                // Directives (strict_types and friends) are accepted and
                // have no effect on this evaluator.
                for (_, value) in directives {
                    self.eval_expr(value)?;
                }
                if let Some(body) = body {
                    self.run_stmts(body)?;
                }
                Ok(Val::Void)
            }
            StmtKind::Class(decl) => {
                self.env
                    .classes
                    .entry(decl.name.to_ascii_lowercase())
                    .or_insert_with(|| decl.clone());
                Ok(Val::Void)
            }
        }
    }

    pub(crate) fn truthy(&mut self, expr: &Expr) -> Exec<bool> {
        let value = self.eval_expr(expr)?;
        Ok(cast::bool_of(&value))
    }

    fn run_loop_body(&mut self, body: &[Stmt]) -> Exec<LoopCtl> {
        match self.run_stmts(body) {
            Ok(_) => Ok(LoopCtl::Normal),
            Err(Flow::Break(n)) => {
                if n <= 1 {
                    Ok(LoopCtl::Break)
                } else {
                    Err(Flow::Break(n - 1))
                }
            }
            Err(Flow::Continue(n)) => {
                if n <= 1 {
                    Ok(LoopCtl::Normal)
                } else {
                    Err(Flow::Continue(n - 1))
                }
            }
            Err(flow) => Err(flow),
        }
    }

    fn loop_level(&mut self, level: Option<&Expr>, stmt: &Stmt) -> Exec<i64> {
        let Some(expr) = level else {
            return Ok(1);
        };
        let value = self.eval_expr(expr)?;
        let n = cast::int_of(&value);
        if n < 1 {
            return Err(self.fatal(
                stmt.span,
                "Uncaught ValueError: break/continue operand must be a positive integer",
            ));
        }
        Ok(n)
    }
}

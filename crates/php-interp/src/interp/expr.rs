use super::Interpreter;
use crate::environment::Frame;
use crate::error::{Exec, Flow, PhpError};
use crate::ops::{arith, cast, compare};
use crate::value::{ArrayData, ArrayKey, Val};
use php_syntax::ast::{BinaryOp, CastKind, Expr, ExprKind, StringKind};
use php_syntax::span::Span;
use std::rc::Rc;

/// The right-hand side of an assignment: already computed, or still an
/// expression so subscript keys can be evaluated first (left to right).
enum ValueSource<'a> {
    Ready(Val),
    Thunk(&'a Expr),
}

impl Interpreter {
    pub(crate) fn eval_expr(&mut self, expr: &Expr) -> Exec<Val> {
        match &expr.kind {
            ExprKind::IntLit(i) => Ok(Val::Int(*i)),
            ExprKind::FloatLit(f) => Ok(Val::Float(*f)),
            ExprKind::StringLit { kind, value } => match kind {
                StringKind::SingleQuoted | StringKind::Nowdoc => Ok(Val::str(value.clone())),
                StringKind::DoubleQuoted | StringKind::Heredoc => {
                    let bytes = self.interpolate(value, expr.span)?;
                    Ok(Val::str(bytes))
                }
            },
            ExprKind::ArrayLit(items) => {
                let mut data = ArrayData::new();
                for item in items {
                    match &item.key {
                        Some(key_expr) => {
                            let key_val = self.eval_expr(key_expr)?;
                            let Some(key) = ArrayKey::from_val(&key_val) else {
                                return Err(self.fatal(
                                    key_expr.span,
                                    "Uncaught TypeError: Illegal offset type",
                                ));
                            };
                            let value = self.eval_expr(&item.value)?;
                            data.insert(key, value);
                        }
                        None => {
                            let value = self.eval_expr(&item.value)?;
                            data.push(value);
                        }
                    }
                }
                Ok(Val::array(data))
            }
            ExprKind::Variable(name) => Ok(self.read_var(name, expr.span)),
            ExprKind::VarVar(_) => {
                let name = self.var_name_of(expr)?;
                Ok(self.read_var(&name, expr.span))
            }
            ExprKind::Subscript { target, index } => {
                self.read_subscript(target, index.as_deref(), expr.span)
            }
            ExprKind::Member { .. } => Err(self.fatal(
                expr.span,
                "Uncaught Error: Object member access is not supported",
            )),
            ExprKind::ConstAccess(name) => self.const_access(name, expr.span),
            ExprKind::Call { callee, args } => self.eval_call(callee, args, expr.span),
            ExprKind::Empty(inner) => {
                let value = self.eval_suppressed(inner)?;
                Ok(Val::Bool(!cast::bool_of(&value)))
            }
            ExprKind::Isset(vars) => {
                for var in vars {
                    let value = self.eval_suppressed(var)?;
                    if matches!(value, Val::Null | Val::Void) {
                        return Ok(Val::Bool(false));
                    }
                }
                Ok(Val::Bool(true))
            }
            ExprKind::Unset(vars) => {
                for var in vars {
                    self.unset_target(var)?;
                }
                Ok(Val::Void)
            }
            ExprKind::Eval(inner) => {
                let value = self.eval_expr(inner)?;
                let code = self.str_value(&value, inner.span);
                self.eval_code(&code, expr.span)
            }
            ExprKind::Exit(arg) => {
                if let Some(arg) = arg {
                    let value = self.eval_expr(arg)?;
                    match value {
                        Val::Str(s) => self.print(&s),
                        Val::Int(code) if (0..255).contains(&code) => {
                            self.set_exit_code(code as i32);
                        }
                        _ => {}
                    }
                }
                Err(Flow::Exit)
            }
            ExprKind::Assign { target, value } => {
                self.assign_target(target, ValueSource::Thunk(value))
            }
            ExprKind::CompoundAssign { target, op, value } => {
                let current = self.eval_expr(target)?;
                let rhs = self.eval_expr(value)?;
                let new = arith::binary(*op, &current, &rhs)
                    .map_err(|e| self.locate(e, expr.span))?;
                self.assign_target(target, ValueSource::Ready(new))
            }
            ExprKind::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_val = self.eval_expr(cond)?;
                if cast::bool_of(&cond_val) {
                    match then_branch {
                        Some(then_branch) => self.eval_expr(then_branch),
                        // Elided middle: the condition's pre-conversion
                        // value is the result.
                        None => Ok(cond_val),
                    }
                } else {
                    self.eval_expr(else_branch)
                }
            }
            ExprKind::Coalesce { lhs, rhs } => {
                // Behaves like isset on the left side: no diagnostics leak.
                let value = self.eval_suppressed(lhs)?;
                if matches!(value, Val::Null | Val::Void) {
                    self.eval_expr(rhs)
                } else {
                    Ok(value)
                }
            }
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs, expr.span),
            ExprKind::LogicalNot(inner) => {
                let value = self.eval_expr(inner)?;
                Ok(Val::Bool(!cast::bool_of(&value)))
            }
            ExprKind::Unary { op, expr: inner } => {
                let value = self.eval_expr(inner)?;
                arith::unary(*op, &value).map_err(|e| self.locate(e, expr.span))
            }
            ExprKind::Cast { to, expr: inner } => {
                let value = self.eval_expr(inner)?;
                Ok(match to {
                    CastKind::Int => Val::Int(cast::int_of(&value)),
                    CastKind::Float => Val::Float(cast::float_of(&value)),
                    CastKind::Bool => Val::Bool(cast::bool_of(&value)),
                    CastKind::Str => Val::str(self.str_value(&value, inner.span)),
                    CastKind::Array => cast::array_of(&value),
                })
            }
            ExprKind::IncDec { op, prefix, target } => {
                let old = self.eval_expr(target)?;
                let new = arith::inc_dec(*op, &old);
                self.assign_target(target, ValueSource::Ready(new.clone()))?;
                Ok(if *prefix { new } else { old })
            }
            ExprKind::ErrorControl(inner) => self.eval_suppressed(inner),
            ExprKind::Include { kind, path } => self.include_file(*kind, path, expr.span),
            ExprKind::Paren(inner) => self.eval_expr(inner),
            ExprKind::Print(inner) => {
                let value = self.eval_expr(inner)?;
                let bytes = self.str_value(&value, inner.span);
                self.print(&bytes);
                Ok(Val::Int(1))
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr, span: Span) -> Exec<Val> {
        use std::cmp::Ordering;

        match op {
            BinaryOp::And => {
                if !self.truthy(lhs)? {
                    return Ok(Val::Bool(false));
                }
                Ok(Val::Bool(self.truthy(rhs)?))
            }
            BinaryOp::Or => {
                if self.truthy(lhs)? {
                    return Ok(Val::Bool(true));
                }
                Ok(Val::Bool(self.truthy(rhs)?))
            }
            BinaryOp::Xor => {
                let l = self.truthy(lhs)?;
                let r = self.truthy(rhs)?;
                Ok(Val::Bool(l != r))
            }
            BinaryOp::Identical
            | BinaryOp::NotIdentical
            | BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::LtEq
            | BinaryOp::Gt
            | BinaryOp::GtEq
            | BinaryOp::Spaceship => {
                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                let result = match op {
                    BinaryOp::Identical => Val::Bool(compare::strict_eq(&l, &r)),
                    BinaryOp::NotIdentical => Val::Bool(!compare::strict_eq(&l, &r)),
                    BinaryOp::Eq => Val::Bool(compare::loose_eq(&l, &r)),
                    BinaryOp::NotEq => Val::Bool(!compare::loose_eq(&l, &r)),
                    BinaryOp::Lt => {
                        Val::Bool(compare::loose_cmp(&l, &r) == Some(Ordering::Less))
                    }
                    BinaryOp::LtEq => Val::Bool(matches!(
                        compare::loose_cmp(&l, &r),
                        Some(Ordering::Less) | Some(Ordering::Equal)
                    )),
                    // The greater-than forms commute the operands.
                    BinaryOp::Gt => {
                        Val::Bool(compare::loose_cmp(&r, &l) == Some(Ordering::Less))
                    }
                    BinaryOp::GtEq => Val::Bool(matches!(
                        compare::loose_cmp(&r, &l),
                        Some(Ordering::Less) | Some(Ordering::Equal)
                    )),
                    BinaryOp::Spaceship => Val::Int(compare::spaceship(&l, &r)),
                    _ => unreachable!(),
                };
                Ok(result)
            }
            _ => {
                let l = self.eval_expr(lhs)?;
                let r = self.eval_expr(rhs)?;
                arith::binary(op, &l, &r).map_err(|e| self.locate(e, span))
            }
        }
    }

    /// Attach a position to an error produced by the context-free ops.
    pub(crate) fn locate(&self, err: PhpError, span: Span) -> Flow {
        Flow::Err(PhpError {
            kind: err.kind,
            message: format!("{} in {}", err.message, self.pos(span)),
        })
    }

    pub(crate) fn read_var(&mut self, name: &str, span: Span) -> Val {
        match self.env.lookup_var(name) {
            Some(value) => value.clone(),
            None => {
                self.warn(span, format!("Undefined variable ${}", name));
                Val::Null
            }
        }
    }

    /// Resolve an expression that designates a variable to its name:
    /// `$x` is `x`, `$$x` is the string value of `$x`, `${expr}` is the
    /// string value of the expression.
    pub(crate) fn var_name_of(&mut self, expr: &Expr) -> Exec<String> {
        match &expr.kind {
            ExprKind::Variable(name) => Ok(name.clone()),
            ExprKind::VarVar(inner) => {
                let value = match &inner.kind {
                    ExprKind::Variable(name) => self.read_var(name, inner.span),
                    _ => self.eval_expr(inner)?,
                };
                Ok(String::from_utf8_lossy(&cast::str_of(&value)).into_owned())
            }
            _ => Err(self.fatal(
                expr.span,
                "Cannot use this expression as a variable name",
            )),
        }
    }

    fn const_access(&mut self, name: &str, span: Span) -> Exec<Val> {
        match name {
            "__FILE__" => {
                let path = self
                    .current_file()
                    .map(|f| f.path.clone())
                    .unwrap_or_default();
                return Ok(Val::str(path));
            }
            "__DIR__" => {
                let dir = self
                    .current_file()
                    .and_then(|f| {
                        std::path::Path::new(&f.path)
                            .parent()
                            .map(|p| p.to_string_lossy().into_owned())
                    })
                    .unwrap_or_default();
                return Ok(Val::str(dir));
            }
            "__LINE__" => return Ok(Val::Int(self.line_of(span) as i64)),
            "__FUNCTION__" => {
                let name = self
                    .env
                    .current_function()
                    .map(|f| f.name.clone())
                    .unwrap_or_default();
                return Ok(Val::str(name));
            }
            _ => {}
        }

        match self.env.lookup_constant(name) {
            Some(value) => Ok(value.clone()),
            None => Err(self.fatal(
                span,
                format!("Uncaught Error: Undefined constant \"{}\"", name),
            )),
        }
    }

    // ----- assignment -----------------------------------------------------

    pub(crate) fn write_target(&mut self, target: &Expr, value: Val) -> Exec<Val> {
        self.assign_target(target, ValueSource::Ready(value))
    }

    fn assign_target(&mut self, target: &Expr, value: ValueSource<'_>) -> Exec<Val> {
        self.invalidate_cache();
        match &target.kind {
            ExprKind::Variable(_) | ExprKind::VarVar(_) => {
                let name = self.var_name_of(target)?;
                let value = self.resolve_value(value)?;
                self.env.set_var(&name, value.clone());
                Ok(value)
            }
            ExprKind::Subscript { .. } => self.assign_subscript(target, value),
            ExprKind::Member { .. } => Err(self.fatal(
                target.span,
                "Uncaught Error: Object member access is not supported",
            )),
            _ => Err(self.fatal(target.span, "Cannot assign to this expression")),
        }
    }

    fn resolve_value(&mut self, value: ValueSource<'_>) -> Exec<Val> {
        match value {
            ValueSource::Ready(v) => Ok(v),
            ValueSource::Thunk(expr) => self.eval_expr(expr),
        }
    }

    fn assign_subscript(&mut self, target: &Expr, value: ValueSource<'_>) -> Exec<Val> {
        // Unravel `$base[a][b]...` into the base and its index chain.
        let mut indices: Vec<Option<&Expr>> = Vec::new();
        let mut base = target;
        while let ExprKind::Subscript {
            target: inner,
            index,
        } = &base.kind
        {
            indices.push(index.as_deref());
            base = inner.as_ref();
        }
        indices.reverse();

        let name = self.var_name_of(base)?;
        let current = self.env.lookup_var(&name).cloned().unwrap_or(Val::Null);

        // Writing into a string replaces a single byte, padding with
        // spaces when the offset is past the end.
        if let Val::Str(s) = &current {
            if indices.len() != 1 {
                return Err(self.fatal(
                    target.span,
                    "Uncaught Error: Cannot use a string offset as an array",
                ));
            }
            let Some(index_expr) = indices[0] else {
                return Err(self.fatal(
                    target.span,
                    "[] operator not supported for strings",
                ));
            };
            let index_val = self.eval_expr(index_expr)?;
            let offset = self.string_offset(&index_val, index_expr.span)?;
            let value = self.resolve_value(value)?;

            let mut bytes = s.as_ref().clone();
            let pos = if offset < 0 {
                bytes.len() as i64 + offset
            } else {
                offset
            };
            if pos < 0 {
                return Err(self.fatal(
                    index_expr.span,
                    format!("Uncaught ValueError: Illegal string offset {}", offset),
                ));
            }
            let replacement = self.str_value(&value, target.span);
            if replacement.is_empty() {
                return Err(self.fatal(
                    target.span,
                    "Cannot assign an empty string to a string offset",
                ));
            }
            let pos = pos as usize;
            if bytes.len() < pos + 1 {
                bytes.resize(pos + 1, b' ');
            }
            bytes[pos] = replacement[0];
            self.env.set_var(&name, Val::str(bytes));
            return Ok(value);
        }

        // Keys evaluate before the assigned value, left to right.
        let mut keys = Vec::new();
        for index in &indices {
            keys.push(match index {
                Some(expr) => Some((self.eval_expr(expr)?, expr.span)),
                None => None,
            });
        }
        let value = self.resolve_value(value)?;

        let mut root = match current {
            Val::Null | Val::Void => Val::empty_array(),
            array @ Val::Array(_) => array,
            _ => {
                return Err(self.fatal(
                    target.span,
                    "Uncaught Error: Cannot use a scalar value as an array",
                ));
            }
        };
        self.set_path(&mut root, &keys, value.clone(), target.span)?;
        self.env.set_var(&name, root);
        Ok(value)
    }

    fn set_path(
        &self,
        container: &mut Val,
        keys: &[Option<(Val, Span)>],
        value: Val,
        span: Span,
    ) -> Exec<()> {
        match container {
            Val::Null | Val::Void => *container = Val::empty_array(),
            Val::Array(_) => {}
            _ => {
                return Err(self.fatal(
                    span,
                    "Uncaught Error: Cannot use a scalar value as an array",
                ));
            }
        }
        let Val::Array(rc) = container else {
            unreachable!();
        };
        let data = Rc::make_mut(rc);

        let (first, rest) = keys.split_first().expect("at least one key");
        let key = match first {
            Some((key_val, key_span)) => match ArrayKey::from_val(key_val) {
                Some(key) => key,
                None => {
                    return Err(self.fatal(*key_span, "Uncaught TypeError: Illegal offset type"));
                }
            },
            None => {
                if rest.is_empty() {
                    // Append; a full key space drops the element.
                    data.push(value);
                    return Ok(());
                }
                match data.push(Val::empty_array()) {
                    Some(key) => key,
                    None => return Ok(()),
                }
            }
        };

        if rest.is_empty() {
            data.insert(key, value);
            return Ok(());
        }

        if data.get(&key).is_none() {
            data.insert(key.clone(), Val::empty_array());
        }
        let entry = data.get_mut(&key).expect("just inserted");
        self.set_path(entry, rest, value, span)
    }

    fn unset_target(&mut self, target: &Expr) -> Exec<()> {
        self.invalidate_cache();
        match &target.kind {
            ExprKind::Variable(_) | ExprKind::VarVar(_) => {
                let name = self.var_name_of(target)?;
                self.env.unset_var(&name);
                Ok(())
            }
            ExprKind::Subscript { .. } => {
                let mut indices: Vec<Option<&Expr>> = Vec::new();
                let mut base = target;
                while let ExprKind::Subscript {
                    target: inner,
                    index,
                } = &base.kind
                {
                    indices.push(index.as_deref());
                    base = inner.as_ref();
                }
                indices.reverse();

                let name = self.var_name_of(base)?;
                let Some(current) = self.env.lookup_var(&name).cloned() else {
                    return Ok(()); // unsetting the non-existent is ignored
                };

                let mut keys = Vec::new();
                for index in &indices {
                    let Some(expr) = index else {
                        return Err(self.fatal(target.span, "Cannot use [] for unsetting"));
                    };
                    let key_val = self.eval_expr(expr)?;
                    let Some(key) = ArrayKey::from_val(&key_val) else {
                        return Err(
                            self.fatal(expr.span, "Uncaught TypeError: Illegal offset type")
                        );
                    };
                    keys.push(key);
                }

                let mut root = current;
                remove_path(&mut root, &keys);
                self.env.set_var(&name, root);
                Ok(())
            }
            _ => Err(self.fatal(target.span, "Cannot unset this expression")),
        }
    }

    // ----- subscript reads ------------------------------------------------

    fn read_subscript(
        &mut self,
        target: &Expr,
        index: Option<&Expr>,
        span: Span,
    ) -> Exec<Val> {
        let base = self.eval_expr(target)?;
        let Some(index_expr) = index else {
            return Err(self.fatal(span, "Cannot use [] for reading"));
        };
        let index_val = self.eval_expr(index_expr)?;

        match &base {
            Val::Str(s) => {
                let offset = self.string_offset(&index_val, index_expr.span)?;
                let len = s.len() as i64;
                let pos = if offset < 0 { len + offset } else { offset };
                if pos < 0 || pos >= len {
                    self.warn(
                        index_expr.span,
                        format!("Uninitialized string offset {}", offset),
                    );
                    return Ok(Val::str(""));
                }
                Ok(Val::str(vec![s[pos as usize]]))
            }
            Val::Array(arr) => {
                let Some(key) = ArrayKey::from_val(&index_val) else {
                    return Err(
                        self.fatal(index_expr.span, "Uncaught TypeError: Illegal offset type")
                    );
                };
                match arr.get(&key) {
                    Some(value) => Ok(value.clone()),
                    None => {
                        self.warn(
                            index_expr.span,
                            format!("Undefined array key {}", key_display(&key)),
                        );
                        Ok(Val::Null)
                    }
                }
            }
            other => {
                self.warn(
                    span,
                    format!(
                        "Trying to access array offset on value of type {}",
                        other.decl_type_name()
                    ),
                );
                Ok(Val::Null)
            }
        }
    }

    /// Integer coercion for string offsets; a non-numeric string index is
    /// a type error.
    fn string_offset(&self, value: &Val, span: Span) -> Exec<i64> {
        match value {
            Val::Int(i) => Ok(*i),
            Val::Bool(b) => Ok(*b as i64),
            Val::Float(f) => Ok(cast::int_of(&Val::Float(*f))),
            Val::Null | Val::Void => Ok(0),
            Val::Str(s) => match cast::parse_numeric(s) {
                Some(n) => Ok(cast::int_of(&n.to_val())),
                None => Err(self.fatal(
                    span,
                    "Uncaught TypeError: Cannot access offset of type string on string",
                )),
            },
            Val::Array(_) => Err(self.fatal(span, "Uncaught TypeError: Illegal offset type")),
        }
    }

    // ----- calls ----------------------------------------------------------

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> Exec<Val> {
        let name = match &callee.kind {
            ExprKind::ConstAccess(name) => name.clone(),
            _ => {
                let value = self.eval_expr(callee)?;
                String::from_utf8_lossy(&cast::str_of(&value)).into_owned()
            }
        };

        // Natives shadow user functions; arguments pass by value.
        if let Some(native) = self.env.lookup_native(&name) {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(self.eval_expr(arg)?);
            }
            return native(self, values);
        }

        let Some(user_fn) = self.env.lookup_function(&name).cloned() else {
            return Err(self.fatal(
                span,
                format!("Uncaught Error: Call to undefined function {}()", name),
            ));
        };
        let decl = user_fn.decl.clone();

        let required = decl.params.iter().filter(|p| p.default.is_none()).count();
        if args.len() < required || args.len() > decl.params.len() {
            let expectation = if required == decl.params.len() {
                format!("exactly {}", required)
            } else {
                format!("at least {}", required)
            };
            return Err(self.fatal(
                span,
                format!(
                    "Uncaught ArgumentCountError: {}() expects {} arguments, {} given",
                    decl.name,
                    expectation,
                    args.len()
                ),
            ));
        }

        // Arguments evaluate in the caller's scope, left to right, and are
        // checked against the declared union types.
        let mut bound = Vec::with_capacity(decl.params.len());
        for (i, param) in decl.params.iter().enumerate() {
            let value = if i < args.len() {
                self.eval_expr(&args[i])?
            } else {
                let default = param.default.as_ref().expect("arity checked above");
                self.eval_expr(default)?
            };
            if !type_matches(&value, &param.types) {
                return Err(self.fatal(
                    span,
                    format!(
                        "Uncaught TypeError: {}(): Argument #{} (${}) must be of type {}, {} given",
                        decl.name,
                        i + 1,
                        param.name,
                        param.types.join("|"),
                        value.decl_type_name()
                    ),
                ));
            }
            bound.push((param.name.clone(), value));
        }

        self.env.push_frame(Frame::for_function(decl.clone()));
        for (name, value) in bound {
            self.env.set_var(&name, value);
        }
        self.push_source(user_fn.source.clone());

        let outcome = self.run_stmts(&decl.body);

        self.pop_source();
        self.env.pop_frame();

        let result = match outcome {
            Ok(_) => Val::Void,
            Err(Flow::Return(value)) => value,
            Err(flow) => return Err(flow),
        };

        if !decl.return_types.is_empty() && !type_matches(&result, &decl.return_types) {
            return Err(self.fatal(
                span,
                format!(
                    "Uncaught TypeError: {}(): Return value must be of type {}, {} given",
                    decl.name,
                    decl.return_types.join("|"),
                    result.decl_type_name()
                ),
            ));
        }

        Ok(result)
    }
}

fn type_matches(value: &Val, types: &[String]) -> bool {
    if types.is_empty() {
        return true;
    }
    types
        .iter()
        .any(|t| t == "mixed" || t == value.decl_type_name())
}

fn key_display(key: &ArrayKey) -> String {
    match key {
        ArrayKey::Int(i) => i.to_string(),
        ArrayKey::Str(s) => format!("\"{}\"", String::from_utf8_lossy(s)),
    }
}

fn remove_path(container: &mut Val, keys: &[ArrayKey]) {
    let Val::Array(rc) = container else {
        return;
    };
    let (first, rest) = match keys.split_first() {
        Some(split) => split,
        None => return,
    };
    let data = Rc::make_mut(rc);
    if rest.is_empty() {
        data.remove(first);
        return;
    }
    if let Some(entry) = data.get_mut(first) {
        remove_path(entry, rest);
    }
}

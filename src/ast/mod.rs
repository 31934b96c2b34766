use crate::span::Span;
use std::rc::Rc;

/// Monotonically increasing within a parse; the interpreter threads a
/// watermark through nested parses (`include`, `eval`) so ids stay unique
/// per interpreter instance.
pub type NodeId = u32;

#[derive(Debug)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
    /// First id past this program's nodes.
    pub next_id: NodeId,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Expr(Expr),
    Echo(Vec<Expr>),
    /// Literal markup between code regions.
    Text(Vec<u8>),
    Const(Vec<(String, Expr)>),
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    DoWhile {
        body: Vec<Stmt>,
        cond: Expr,
    },
    For {
        init: Vec<Expr>,
        cond: Vec<Expr>,
        step: Vec<Expr>,
        body: Vec<Stmt>,
    },
    Foreach {
        subject: Expr,
        key_var: Option<Expr>,
        value_var: Expr,
        body: Vec<Stmt>,
    },
    Break(Option<Expr>),
    Continue(Option<Expr>),
    Return(Option<Expr>),
    Function(Rc<FunctionDecl>),
    Global(Vec<String>),
    Declare {
        directives: Vec<(String, Expr)>,
        body: Option<Vec<Stmt>>,
    },
    /// Classes, interfaces and traits are parsed and recorded but not
    /// instantiable.
    Class(Rc<ClassDecl>),
    Nop,
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    /// Escapes already decoded at parse time.
    SingleQuoted,
    /// Raw body; escapes and interpolation are evaluation-time.
    DoubleQuoted,
    Heredoc,
    Nowdoc,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    StringLit {
        kind: StringKind,
        value: Vec<u8>,
    },
    ArrayLit(Vec<ArrayItem>),
    /// `$name` (name stored without the sigil).
    Variable(String),
    /// `$$x` / `${expr}`: the inner expression yields the variable name.
    VarVar(Box<Expr>),
    Subscript {
        target: Box<Expr>,
        /// `None` for the append form `$a[]`.
        index: Option<Box<Expr>>,
    },
    /// `$obj->name` (reserved).
    Member {
        target: Box<Expr>,
        member: String,
    },
    ConstAccess(String),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Empty(Box<Expr>),
    Isset(Vec<Expr>),
    Unset(Vec<Expr>),
    Eval(Box<Expr>),
    Exit(Option<Box<Expr>>),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    CompoundAssign {
        target: Box<Expr>,
        op: BinaryOp,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        /// `None` for the elided middle (`$a ?: $b`).
        then_branch: Option<Box<Expr>>,
        else_branch: Box<Expr>,
    },
    Coalesce {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    LogicalNot(Box<Expr>),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Cast {
        to: CastKind,
        expr: Box<Expr>,
    },
    IncDec {
        op: IncDecOp,
        prefix: bool,
        target: Box<Expr>,
    },
    /// `@expr`: evaluate with diagnostics suppressed.
    ErrorControl(Box<Expr>),
    Include {
        kind: IncludeKind,
        path: Box<Expr>,
    },
    Paren(Box<Expr>),
    Print(Box<Expr>),
}

#[derive(Debug, Clone)]
pub struct ArrayItem {
    pub key: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Concat,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Spaceship,
    /// `&&` / `and`
    And,
    /// `||` / `or`
    Or,
    /// `xor`
    Xor,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Concat => ".",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Identical => "===",
            BinaryOp::NotIdentical => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Spaceship => "<=>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "xor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Int,
    Float,
    Bool,
    Str,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeKind {
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
}

impl IncludeKind {
    pub fn function_name(&self) -> &'static str {
        match self {
            IncludeKind::Include | IncludeKind::IncludeOnce => "include",
            IncludeKind::Require | IncludeKind::RequireOnce => "require",
        }
    }

    pub fn is_once(&self) -> bool {
        matches!(self, IncludeKind::IncludeOnce | IncludeKind::RequireOnce)
    }

    pub fn is_require(&self) -> bool {
        matches!(self, IncludeKind::Require | IncludeKind::RequireOnce)
    }
}

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<Param>,
    /// Declared return type union; empty when omitted.
    pub return_types: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    /// Declared type union; empty means untyped (mixed).
    pub types: Vec<String>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
}

#[derive(Debug)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: String,
    pub extends: Option<String>,
    pub implements: Vec<String>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug)]
pub enum ClassMember {
    Property {
        name: String,
        default: Option<Expr>,
    },
    Const {
        name: String,
        value: Expr,
    },
    Method(Rc<FunctionDecl>),
}

impl Expr {
    /// True for expressions that designate a writable location.
    pub fn is_lvalue(&self) -> bool {
        match &self.kind {
            ExprKind::Variable(_) | ExprKind::VarVar(_) | ExprKind::Member { .. } => true,
            ExprKind::Subscript { target, .. } => target.is_lvalue(),
            _ => false,
        }
    }
}

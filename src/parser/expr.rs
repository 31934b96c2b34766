use super::{ParseError, Parser, PResult};
use crate::ast::{
    ArrayItem, BinaryOp, CastKind, Expr, ExprKind, IncDecOp, IncludeKind, StringKind, UnaryOp,
};
use crate::lexer::token::TokenKind;
use crate::span::Span;

/// Binding powers for infix operators, higher binds tighter. Odd/even pairs
/// encode associativity: `**`, `??` and the conditional are right
/// associative, everything else is left associative.
fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
    use TokenKind::*;
    let bp = match kind {
        LogicalOr => (10, 11),
        LogicalXor => (20, 21),
        LogicalAnd => (30, 31),
        Coalesce => (51, 50),
        PipePipe => (60, 61),
        AmpersandAmpersand => (70, 71),
        Pipe => (80, 81),
        Caret => (90, 91),
        Ampersand => (100, 101),
        EqEq | BangEq | EqEqEq | BangEqEq => (110, 111),
        Lt | LtEq | Gt | GtEq | Spaceship => (120, 121),
        Sl | Sr => (130, 131),
        Plus | Minus | Dot => (140, 141),
        Asterisk | Slash | Percent => (150, 151),
        Pow => (191, 190),
        _ => return None,
    };
    Some(bp)
}

fn binary_op(kind: TokenKind) -> BinaryOp {
    use TokenKind::*;
    match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Asterisk => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        Dot => BinaryOp::Concat,
        Pow => BinaryOp::Pow,
        Sl => BinaryOp::ShiftLeft,
        Sr => BinaryOp::ShiftRight,
        Ampersand => BinaryOp::BitAnd,
        Pipe => BinaryOp::BitOr,
        Caret => BinaryOp::BitXor,
        EqEq => BinaryOp::Eq,
        BangEq => BinaryOp::NotEq,
        EqEqEq => BinaryOp::Identical,
        BangEqEq => BinaryOp::NotIdentical,
        Lt => BinaryOp::Lt,
        LtEq => BinaryOp::LtEq,
        Gt => BinaryOp::Gt,
        GtEq => BinaryOp::GtEq,
        Spaceship => BinaryOp::Spaceship,
        AmpersandAmpersand | LogicalAnd => BinaryOp::And,
        PipePipe | LogicalOr => BinaryOp::Or,
        LogicalXor => BinaryOp::Xor,
        _ => unreachable!("not a binary operator: {:?}", kind),
    }
}

fn compound_assign_op(kind: TokenKind) -> Option<BinaryOp> {
    use TokenKind::*;
    let op = match kind {
        PlusEq => BinaryOp::Add,
        MinusEq => BinaryOp::Sub,
        MulEq => BinaryOp::Mul,
        DivEq => BinaryOp::Div,
        ModEq => BinaryOp::Mod,
        PowEq => BinaryOp::Pow,
        ConcatEq => BinaryOp::Concat,
        SlEq => BinaryOp::ShiftLeft,
        SrEq => BinaryOp::ShiftRight,
        AndEq => BinaryOp::BitAnd,
        OrEq => BinaryOp::BitOr,
        XorEq => BinaryOp::BitXor,
        _ => return None,
    };
    Some(op)
}

/// Binding power for the operand of prefix operators; tight enough that
/// `-$a * 2` negates only `$a`, loose enough that `-2 ** 2` is `-(2 ** 2)`.
const UNARY_BP: u8 = 165;

impl<'src> Parser<'src> {
    pub(crate) fn mk_expr(&mut self, span: Span, kind: ExprKind) -> Expr {
        Expr {
            id: self.mk_id(),
            span,
            kind,
        }
    }

    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> PResult<Expr> {
        let mut left = self.parse_nud()?;

        loop {
            match self.current.kind {
                TokenKind::OpenBracket => {
                    if 210 < min_bp {
                        break;
                    }
                    self.bump();
                    let index = if self.current.kind == TokenKind::CloseBracket {
                        None
                    } else {
                        Some(Box::new(self.parse_expr(0)?))
                    };
                    let end = self.current.span;
                    self.expect(TokenKind::CloseBracket, "']'")?;
                    let span = left.span.to(end);
                    left = self.mk_expr(
                        span,
                        ExprKind::Subscript {
                            target: Box::new(left),
                            index,
                        },
                    );
                }
                TokenKind::Arrow => {
                    if 210 < min_bp {
                        break;
                    }
                    self.bump();
                    let member_token = self.current;
                    if member_token.kind != TokenKind::Identifier
                        && !member_token.kind.is_keyword()
                    {
                        return Err(self.unexpected("member name"));
                    }
                    let member = self.ident_of(member_token);
                    self.bump();
                    let span = left.span.to(member_token.span);
                    left = self.mk_expr(
                        span,
                        ExprKind::Member {
                            target: Box::new(left),
                            member,
                        },
                    );
                }
                TokenKind::DoubleColon => {
                    return Err(ParseError::new(
                        "'::' is not supported",
                        self.current.span,
                    ));
                }
                TokenKind::OpenParen => {
                    if 190 < min_bp {
                        break;
                    }
                    let (args, args_span) = self.parse_call_args()?;
                    let span = left.span.to(args_span);
                    left = self.mk_expr(
                        span,
                        ExprKind::Call {
                            callee: Box::new(left),
                            args,
                        },
                    );
                }
                TokenKind::Inc | TokenKind::Dec => {
                    if 180 < min_bp {
                        break;
                    }
                    let op = if self.current.kind == TokenKind::Inc {
                        IncDecOp::Inc
                    } else {
                        IncDecOp::Dec
                    };
                    let end = self.current.span;
                    if !left.is_lvalue() {
                        return Err(ParseError::new(
                            "cannot increment or decrement this expression",
                            left.span,
                        ));
                    }
                    self.bump();
                    let span = left.span.to(end);
                    left = self.mk_expr(
                        span,
                        ExprKind::IncDec {
                            op,
                            prefix: false,
                            target: Box::new(left),
                        },
                    );
                }
                TokenKind::Question => {
                    if 40 < min_bp {
                        break;
                    }
                    self.bump();
                    let then_branch = if self.current.kind == TokenKind::Colon {
                        None
                    } else {
                        Some(Box::new(self.parse_expr(0)?))
                    };
                    self.expect(TokenKind::Colon, "':'")?;
                    let else_branch = self.parse_expr(40)?;
                    let span = left.span.to(else_branch.span);
                    left = self.mk_expr(
                        span,
                        ExprKind::Ternary {
                            cond: Box::new(left),
                            then_branch,
                            else_branch: Box::new(else_branch),
                        },
                    );
                }
                TokenKind::Eq => {
                    if 35 < min_bp {
                        break;
                    }
                    if !left.is_lvalue() {
                        return Err(ParseError::new(
                            "assignments can only target variables",
                            left.span,
                        ));
                    }
                    self.bump();
                    let value = self.parse_expr(34)?;
                    let span = left.span.to(value.span);
                    left = self.mk_expr(
                        span,
                        ExprKind::Assign {
                            target: Box::new(left),
                            value: Box::new(value),
                        },
                    );
                }
                kind if compound_assign_op(kind).is_some() => {
                    if 35 < min_bp {
                        break;
                    }
                    let op = compound_assign_op(kind).unwrap();
                    if !left.is_lvalue() {
                        return Err(ParseError::new(
                            "assignments can only target variables",
                            left.span,
                        ));
                    }
                    self.bump();
                    let value = self.parse_expr(34)?;
                    let span = left.span.to(value.span);
                    left = self.mk_expr(
                        span,
                        ExprKind::CompoundAssign {
                            target: Box::new(left),
                            op,
                            value: Box::new(value),
                        },
                    );
                }
                kind => {
                    let Some((l_bp, r_bp)) = infix_binding_power(kind) else {
                        break;
                    };
                    if l_bp < min_bp {
                        break;
                    }
                    self.bump();
                    let right = self.parse_expr(r_bp)?;
                    let span = left.span.to(right.span);
                    left = if kind == TokenKind::Coalesce {
                        self.mk_expr(
                            span,
                            ExprKind::Coalesce {
                                lhs: Box::new(left),
                                rhs: Box::new(right),
                            },
                        )
                    } else {
                        self.mk_expr(
                            span,
                            ExprKind::Binary {
                                op: binary_op(kind),
                                lhs: Box::new(left),
                                rhs: Box::new(right),
                            },
                        )
                    };
                }
            }
        }

        Ok(left)
    }

    fn parse_nud(&mut self) -> PResult<Expr> {
        let token = self.current;
        let start = token.span;

        match token.kind {
            TokenKind::LNumber => {
                self.bump();
                self.int_literal(token)
            }
            TokenKind::DNumber => {
                self.bump();
                let text = String::from_utf8_lossy(self.text_of(token)).into_owned();
                let value: f64 = text.parse().map_err(|_| {
                    ParseError::new(format!("invalid float literal '{}'", text), start)
                })?;
                Ok(self.mk_expr(start, ExprKind::FloatLit(value)))
            }
            TokenKind::SingleQuoted => {
                self.bump();
                let inner = self.text_of(token);
                let value = decode_single_quoted(&inner[1..inner.len() - 1]);
                Ok(self.mk_expr(
                    start,
                    ExprKind::StringLit {
                        kind: StringKind::SingleQuoted,
                        value,
                    },
                ))
            }
            TokenKind::DoubleQuoted => {
                self.bump();
                let inner = self.text_of(token);
                let value = inner[1..inner.len() - 1].to_vec();
                Ok(self.mk_expr(
                    start,
                    ExprKind::StringLit {
                        kind: StringKind::DoubleQuoted,
                        value,
                    },
                ))
            }
            TokenKind::StartHeredoc => {
                self.bump();
                let is_nowdoc = self.text_of(token).contains(&b'\'');
                let mut value = Vec::new();
                if self.current.kind == TokenKind::HeredocBody {
                    value = self.text_of(self.current).to_vec();
                    // The newline before the closing label belongs to the
                    // delimiter, not the content.
                    if value.ends_with(b"\n") {
                        value.pop();
                        if value.ends_with(b"\r") {
                            value.pop();
                        }
                    }
                    self.bump();
                }
                let end = self.current.span;
                self.expect(TokenKind::EndHeredoc, "heredoc end label")?;
                let kind = if is_nowdoc {
                    StringKind::Nowdoc
                } else {
                    StringKind::Heredoc
                };
                Ok(self.mk_expr(start.to(end), ExprKind::StringLit { kind, value }))
            }
            TokenKind::Variable => {
                self.bump();
                let name = String::from_utf8_lossy(&self.text_of(token)[1..]).into_owned();
                Ok(self.mk_expr(start, ExprKind::Variable(name)))
            }
            TokenKind::Dollar => self.parse_variable_variable(),
            TokenKind::Identifier => {
                self.bump();
                let name = self.ident_of(token);
                Ok(self.mk_expr(start, ExprKind::ConstAccess(name)))
            }
            TokenKind::Array => {
                self.bump();
                self.expect(TokenKind::OpenParen, "'('")?;
                let items = self.parse_array_items(TokenKind::CloseParen)?;
                let end = self.current.span;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(self.mk_expr(start.to(end), ExprKind::ArrayLit(items)))
            }
            TokenKind::OpenBracket => {
                self.bump();
                let items = self.parse_array_items(TokenKind::CloseBracket)?;
                let end = self.current.span;
                self.expect(TokenKind::CloseBracket, "']'")?;
                Ok(self.mk_expr(start.to(end), ExprKind::ArrayLit(items)))
            }
            TokenKind::OpenParen => {
                self.bump();
                let inner = self.parse_expr(0)?;
                let end = self.current.span;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(self.mk_expr(start.to(end), ExprKind::Paren(Box::new(inner))))
            }
            TokenKind::IntCast
            | TokenKind::BoolCast
            | TokenKind::FloatCast
            | TokenKind::StringCast
            | TokenKind::ArrayCast => {
                let to = match token.kind {
                    TokenKind::IntCast => CastKind::Int,
                    TokenKind::BoolCast => CastKind::Bool,
                    TokenKind::FloatCast => CastKind::Float,
                    TokenKind::StringCast => CastKind::Str,
                    _ => CastKind::Array,
                };
                self.bump();
                let expr = self.parse_expr(UNARY_BP)?;
                let span = start.to(expr.span);
                Ok(self.mk_expr(
                    span,
                    ExprKind::Cast {
                        to,
                        expr: Box::new(expr),
                    },
                ))
            }
            TokenKind::UnsetCast => Err(ParseError::new(
                "the (unset) cast is no longer supported",
                start,
            )),
            TokenKind::Plus | TokenKind::Minus | TokenKind::BitNot => {
                let op = match token.kind {
                    TokenKind::Plus => UnaryOp::Plus,
                    TokenKind::Minus => UnaryOp::Minus,
                    _ => UnaryOp::BitNot,
                };
                self.bump();
                let expr = self.parse_expr(UNARY_BP)?;
                let span = start.to(expr.span);
                Ok(self.mk_expr(
                    span,
                    ExprKind::Unary {
                        op,
                        expr: Box::new(expr),
                    },
                ))
            }
            TokenKind::Bang => {
                self.bump();
                let expr = self.parse_expr(UNARY_BP)?;
                let span = start.to(expr.span);
                Ok(self.mk_expr(span, ExprKind::LogicalNot(Box::new(expr))))
            }
            TokenKind::Inc | TokenKind::Dec => {
                let op = if token.kind == TokenKind::Inc {
                    IncDecOp::Inc
                } else {
                    IncDecOp::Dec
                };
                self.bump();
                let target = self.parse_expr(UNARY_BP)?;
                if !target.is_lvalue() {
                    return Err(ParseError::new(
                        "cannot increment or decrement this expression",
                        target.span,
                    ));
                }
                let span = start.to(target.span);
                Ok(self.mk_expr(
                    span,
                    ExprKind::IncDec {
                        op,
                        prefix: true,
                        target: Box::new(target),
                    },
                ))
            }
            TokenKind::At => {
                self.bump();
                let expr = self.parse_expr(UNARY_BP)?;
                let span = start.to(expr.span);
                Ok(self.mk_expr(span, ExprKind::ErrorControl(Box::new(expr))))
            }
            TokenKind::Print => {
                self.bump();
                let expr = self.parse_expr(32)?;
                let span = start.to(expr.span);
                Ok(self.mk_expr(span, ExprKind::Print(Box::new(expr))))
            }
            TokenKind::Include
            | TokenKind::IncludeOnce
            | TokenKind::Require
            | TokenKind::RequireOnce => {
                let kind = match token.kind {
                    TokenKind::Include => IncludeKind::Include,
                    TokenKind::IncludeOnce => IncludeKind::IncludeOnce,
                    TokenKind::Require => IncludeKind::Require,
                    _ => IncludeKind::RequireOnce,
                };
                self.bump();
                let path = self.parse_expr(0)?;
                let span = start.to(path.span);
                Ok(self.mk_expr(
                    span,
                    ExprKind::Include {
                        kind,
                        path: Box::new(path),
                    },
                ))
            }
            TokenKind::Empty => {
                self.bump();
                self.expect(TokenKind::OpenParen, "'('")?;
                let inner = self.parse_expr(0)?;
                let end = self.current.span;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(self.mk_expr(start.to(end), ExprKind::Empty(Box::new(inner))))
            }
            TokenKind::Isset | TokenKind::Unset => {
                let is_isset = token.kind == TokenKind::Isset;
                self.bump();
                self.expect(TokenKind::OpenParen, "'('")?;
                let mut vars = Vec::new();
                loop {
                    vars.push(self.parse_expr(0)?);
                    if self.current.kind == TokenKind::Comma {
                        self.bump();
                        if self.current.kind == TokenKind::CloseParen {
                            break;
                        }
                    } else {
                        break;
                    }
                }
                let end = self.current.span;
                self.expect(TokenKind::CloseParen, "')'")?;
                let kind = if is_isset {
                    ExprKind::Isset(vars)
                } else {
                    ExprKind::Unset(vars)
                };
                Ok(self.mk_expr(start.to(end), kind))
            }
            TokenKind::Eval => {
                self.bump();
                self.expect(TokenKind::OpenParen, "'('")?;
                let inner = self.parse_expr(0)?;
                let end = self.current.span;
                self.expect(TokenKind::CloseParen, "')'")?;
                Ok(self.mk_expr(start.to(end), ExprKind::Eval(Box::new(inner))))
            }
            TokenKind::Exit => {
                self.bump();
                let mut end = start;
                let expr = if self.current.kind == TokenKind::OpenParen {
                    self.bump();
                    let inner = if self.current.kind == TokenKind::CloseParen {
                        None
                    } else {
                        Some(Box::new(self.parse_expr(0)?))
                    };
                    end = self.current.span;
                    self.expect(TokenKind::CloseParen, "')'")?;
                    inner
                } else {
                    None
                };
                Ok(self.mk_expr(start.to(end), ExprKind::Exit(expr)))
            }
            TokenKind::Eof => Err(ParseError::new(
                "syntax error, unexpected end of file",
                start,
            )),
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `$$name` chains and `${expr}` dynamic names; the lone `$` token has
    /// already been observed as `self.current`.
    fn parse_variable_variable(&mut self) -> PResult<Expr> {
        let start = self.current.span;
        self.bump(); // $

        let inner = match self.current.kind {
            TokenKind::Variable => {
                let token = self.current;
                self.bump();
                let name = String::from_utf8_lossy(&self.text_of(token)[1..]).into_owned();
                self.mk_expr(token.span, ExprKind::Variable(name))
            }
            TokenKind::Dollar => self.parse_variable_variable()?,
            TokenKind::OpenBrace => {
                self.bump();
                let expr = self.parse_expr(0)?;
                self.expect(TokenKind::CloseBrace, "'}'")?;
                expr
            }
            _ => return Err(self.unexpected("variable name")),
        };

        let span = start.to(inner.span);
        Ok(self.mk_expr(span, ExprKind::VarVar(Box::new(inner))))
    }

    fn parse_call_args(&mut self) -> PResult<(Vec<Expr>, Span)> {
        let open = self.expect(TokenKind::OpenParen, "'('")?;
        let mut args = Vec::new();
        while !matches!(self.current.kind, TokenKind::CloseParen | TokenKind::Eof) {
            args.push(self.parse_expr(0)?);
            if self.current.kind == TokenKind::Comma {
                self.bump(); // also accepts a trailing comma
            } else {
                break;
            }
        }
        let close = self.current.span;
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok((args, open.span.to(close)))
    }

    fn parse_array_items(&mut self, end: TokenKind) -> PResult<Vec<ArrayItem>> {
        let mut items = Vec::new();
        while self.current.kind != end && self.current.kind != TokenKind::Eof {
            let first = self.parse_expr(0)?;
            let item = if self.current.kind == TokenKind::DoubleArrow {
                self.bump();
                let value = self.parse_expr(0)?;
                ArrayItem {
                    key: Some(first),
                    value,
                }
            } else {
                ArrayItem {
                    key: None,
                    value: first,
                }
            };
            items.push(item);
            if self.current.kind == TokenKind::Comma {
                self.bump(); // also accepts a trailing comma
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn int_literal(&mut self, token: crate::lexer::token::Token) -> PResult<Expr> {
        let span = token.span;
        let text = self.text_of(token);
        let s = String::from_utf8_lossy(text).into_owned();

        let (digits, radix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            (rest.to_string(), 16)
        } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
            (rest.to_string(), 2)
        } else if s.len() > 1 && s.starts_with('0') {
            if s.bytes().any(|c| c > b'7') {
                return Err(ParseError::new(
                    format!("invalid octal literal '{}'", s),
                    span,
                ));
            }
            (s[1..].to_string(), 8)
        } else {
            (s.clone(), 10)
        };

        if digits.is_empty() {
            return Err(ParseError::new(
                format!("invalid numeric literal '{}'", s),
                span,
            ));
        }

        match i64::from_str_radix(&digits, radix) {
            Ok(value) => Ok(self.mk_expr(span, ExprKind::IntLit(value))),
            Err(_) => {
                // Out-of-range literals degrade to float.
                let value = match u128::from_str_radix(&digits, radix) {
                    Ok(wide) => wide as f64,
                    Err(_) => f64::INFINITY,
                };
                Ok(self.mk_expr(span, ExprKind::FloatLit(value)))
            }
        }
    }
}

/// Single-quoted strings know only `\\` and `\'`; everything else is
/// literal.
fn decode_single_quoted(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() && (raw[i + 1] == b'\\' || raw[i + 1] == b'\'') {
            out.push(raw[i + 1]);
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

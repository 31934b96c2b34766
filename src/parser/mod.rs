mod expr;

use crate::ast::{
    ClassDecl, ClassKind, ClassMember, Expr, FunctionDecl, NodeId, Param, Program, Stmt, StmtKind,
};
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::source::SourceFile;
use crate::span::Span;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// `{message} in {file}:{line}:{col}` — the caller prefixes the kind.
    pub fn render(&self, file: &SourceFile) -> String {
        format!("{} in {}", self.message, file.pos_string(self.span))
    }
}

pub type PResult<T> = Result<T, ParseError>;

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    next: Token,
    next_id: NodeId,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src [u8], short_open_tag: bool, start_id: NodeId) -> Self {
        let lexer = Lexer::new(source, short_open_tag);
        Self::from_lexer(lexer, start_id)
    }

    fn from_lexer(lexer: Lexer<'src>, start_id: NodeId) -> Self {
        let eof = Token {
            kind: TokenKind::Eof,
            span: Span::default(),
        };
        let mut parser = Self {
            lexer,
            current: eof,
            next: eof,
            next_id: start_id,
        };
        parser.bump();
        parser.bump();
        parser
    }

    /// Parse a bare expression fragment (no open tag), as used by string
    /// interpolation. The fragment must be a single expression.
    pub fn parse_expr_source(
        source: &'src [u8],
        start_id: NodeId,
    ) -> PResult<(Expr, NodeId)> {
        let lexer = Lexer::in_scripting(source);
        let mut parser = Self::from_lexer(lexer, start_id);
        let expr = parser.parse_expr(0)?;
        if parser.current.kind != TokenKind::Eof {
            return Err(parser.unexpected("end of expression"));
        }
        Ok((expr, parser.next_id))
    }

    fn bump(&mut self) {
        self.current = self.next;
        loop {
            let token = self.lexer.next().unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::default(),
            });
            if token.kind != TokenKind::Comment {
                self.next = token;
                break;
            }
        }
    }

    pub(crate) fn mk_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn mk_stmt(&mut self, span: Span, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.mk_id(),
            span,
            kind,
        }
    }

    pub(crate) fn text_of(&self, token: Token) -> &'src [u8] {
        self.lexer.slice(token.span)
    }

    pub(crate) fn ident_of(&self, token: Token) -> String {
        String::from_utf8_lossy(self.text_of(token)).into_owned()
    }

    pub(crate) fn unexpected(&self, what: &str) -> ParseError {
        let text = self.lexer.slice(self.current.span);
        let shown = if self.current.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            format!("'{}'", String::from_utf8_lossy(text))
        };
        ParseError::new(
            format!("syntax error, unexpected {}, expecting {}", shown, what),
            self.current.span,
        )
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.current.kind == kind {
            let token = self.current;
            self.bump();
            Ok(token)
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_semicolon(&mut self) -> PResult<()> {
        match self.current.kind {
            TokenKind::SemiColon => {
                self.bump();
                Ok(())
            }
            // Implicit semicolon at a close tag or EOF.
            TokenKind::CloseTag | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    pub fn parse_program(&mut self) -> PResult<Program> {
        let mut statements = Vec::new();
        while self.current.kind != TokenKind::Eof {
            statements.push(self.parse_stmt()?);
        }

        let span = match (statements.first(), statements.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => Span::default(),
        };

        Ok(Program {
            statements,
            span,
            next_id: self.next_id,
        })
    }

    fn parse_stmt(&mut self) -> PResult<Stmt> {
        match self.current.kind {
            TokenKind::OpenTag | TokenKind::CloseTag | TokenKind::SemiColon => {
                let span = self.current.span;
                self.bump();
                Ok(self.mk_stmt(span, StmtKind::Nop))
            }
            TokenKind::InlineHtml => {
                let span = self.current.span;
                let value = self.text_of(self.current).to_vec();
                self.bump();
                Ok(self.mk_stmt(span, StmtKind::Text(value)))
            }
            TokenKind::Echo | TokenKind::OpenTagEcho => self.parse_echo(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Do => self.parse_do_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Break | TokenKind::Continue => self.parse_break_continue(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Function => self.parse_function(),
            TokenKind::Const => self.parse_const(),
            TokenKind::Global => self.parse_global(),
            TokenKind::Declare => self.parse_declare(),
            TokenKind::Class | TokenKind::Interface | TokenKind::Trait => self.parse_class(),
            TokenKind::OpenBrace => {
                let start = self.current.span;
                let statements = self.parse_block()?;
                let end = self.current.span;
                Ok(self.mk_stmt(start.to(end), StmtKind::Block(statements)))
            }
            _ => {
                let start = self.current.span;
                let expr = self.parse_expr(0)?;
                self.expect_semicolon()?;
                let span = start.to(expr.span);
                Ok(self.mk_stmt(span, StmtKind::Expr(expr)))
            }
        }
    }

    /// `{ ... }` without the enclosing statement wrapper.
    fn parse_block(&mut self) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::OpenBrace, "'{'")?;
        let mut statements = Vec::new();
        while !matches!(self.current.kind, TokenKind::CloseBrace | TokenKind::Eof) {
            statements.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::CloseBrace, "'}'")?;
        Ok(statements)
    }

    /// A statement body: either a block (unwrapped) or a single statement.
    fn parse_body(&mut self) -> PResult<Vec<Stmt>> {
        if self.current.kind == TokenKind::OpenBrace {
            self.parse_block()
        } else {
            Ok(vec![self.parse_stmt()?])
        }
    }

    /// Alt-colon body: statements until one of the given end keywords.
    fn parse_alt_body(&mut self, ends: &[TokenKind]) -> PResult<Vec<Stmt>> {
        self.expect(TokenKind::Colon, "':'")?;
        let mut statements = Vec::new();
        while !ends.contains(&self.current.kind) && self.current.kind != TokenKind::Eof {
            statements.push(self.parse_stmt()?);
        }
        Ok(statements)
    }

    fn parse_echo(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // echo or <?=

        let mut exprs = vec![self.parse_expr(0)?];
        while self.current.kind == TokenKind::Comma {
            self.bump();
            exprs.push(self.parse_expr(0)?);
        }
        self.expect_semicolon()?;

        let span = start.to(exprs.last().unwrap().span);
        Ok(self.mk_stmt(span, StmtKind::Echo(exprs)))
    }

    fn parse_if(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // if
        self.parse_if_tail(start)
    }

    fn parse_if_tail(&mut self, start: Span) -> PResult<Stmt> {
        self.expect(TokenKind::OpenParen, "'('")?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::CloseParen, "')'")?;

        let is_alt = self.current.kind == TokenKind::Colon;
        let then_branch = if is_alt {
            self.parse_alt_body(&[TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf])?
        } else {
            self.parse_body()?
        };

        let mut consumed_endif = false;
        let else_branch = match self.current.kind {
            TokenKind::ElseIf => {
                let elseif_start = self.current.span;
                self.bump();
                // A nested elseif owns the endif of an alt-form chain.
                consumed_endif = true;
                Some(vec![self.parse_if_tail(elseif_start)?])
            }
            TokenKind::Else => {
                self.bump();
                if is_alt {
                    Some(self.parse_alt_body(&[TokenKind::EndIf])?)
                } else {
                    Some(self.parse_body()?)
                }
            }
            _ => None,
        };

        if is_alt && !consumed_endif {
            self.expect(TokenKind::EndIf, "'endif'")?;
            self.expect_semicolon()?;
        }

        let end = self.current.span;
        Ok(self.mk_stmt(
            start.to(end),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            },
        ))
    }

    fn parse_while(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // while

        self.expect(TokenKind::OpenParen, "'('")?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::CloseParen, "')'")?;

        let body = if self.current.kind == TokenKind::Colon {
            let body = self.parse_alt_body(&[TokenKind::EndWhile])?;
            self.expect(TokenKind::EndWhile, "'endwhile'")?;
            self.expect_semicolon()?;
            body
        } else {
            self.parse_body()?
        };

        let end = self.current.span;
        Ok(self.mk_stmt(start.to(end), StmtKind::While { cond, body }))
    }

    fn parse_do_while(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // do

        let body = self.parse_body()?;
        self.expect(TokenKind::While, "'while'")?;
        self.expect(TokenKind::OpenParen, "'('")?;
        let cond = self.parse_expr(0)?;
        self.expect(TokenKind::CloseParen, "')'")?;
        self.expect_semicolon()?;

        let end = self.current.span;
        Ok(self.mk_stmt(start.to(end), StmtKind::DoWhile { body, cond }))
    }

    fn parse_expr_list(&mut self, end: TokenKind) -> PResult<Vec<Expr>> {
        let mut exprs = Vec::new();
        if self.current.kind != end {
            exprs.push(self.parse_expr(0)?);
            while self.current.kind == TokenKind::Comma {
                self.bump();
                exprs.push(self.parse_expr(0)?);
            }
        }
        Ok(exprs)
    }

    fn parse_for(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // for

        self.expect(TokenKind::OpenParen, "'('")?;
        let init = self.parse_expr_list(TokenKind::SemiColon)?;
        self.expect(TokenKind::SemiColon, "';'")?;
        let cond = self.parse_expr_list(TokenKind::SemiColon)?;
        self.expect(TokenKind::SemiColon, "';'")?;
        let step = self.parse_expr_list(TokenKind::CloseParen)?;
        self.expect(TokenKind::CloseParen, "')'")?;

        let body = if self.current.kind == TokenKind::Colon {
            let body = self.parse_alt_body(&[TokenKind::EndFor])?;
            self.expect(TokenKind::EndFor, "'endfor'")?;
            self.expect_semicolon()?;
            body
        } else {
            self.parse_body()?
        };

        let end = self.current.span;
        Ok(self.mk_stmt(
            start.to(end),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
        ))
    }

    fn parse_foreach(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // foreach

        self.expect(TokenKind::OpenParen, "'('")?;
        let subject = self.parse_expr(0)?;
        self.expect(TokenKind::As, "'as'")?;

        let mut key_var = None;
        let mut value_var = self.parse_expr(0)?;
        if self.current.kind == TokenKind::DoubleArrow {
            self.bump();
            key_var = Some(value_var);
            value_var = self.parse_expr(0)?;
        }
        if !value_var.is_lvalue() {
            return Err(ParseError::new(
                "foreach target must be a variable",
                value_var.span,
            ));
        }
        self.expect(TokenKind::CloseParen, "')'")?;

        let body = if self.current.kind == TokenKind::Colon {
            let body = self.parse_alt_body(&[TokenKind::EndForeach])?;
            self.expect(TokenKind::EndForeach, "'endforeach'")?;
            self.expect_semicolon()?;
            body
        } else {
            self.parse_body()?
        };

        let end = self.current.span;
        Ok(self.mk_stmt(
            start.to(end),
            StmtKind::Foreach {
                subject,
                key_var,
                value_var,
                body,
            },
        ))
    }

    fn parse_break_continue(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        let is_break = self.current.kind == TokenKind::Break;
        self.bump();

        let level = if matches!(
            self.current.kind,
            TokenKind::SemiColon | TokenKind::CloseTag | TokenKind::Eof
        ) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        self.expect_semicolon()?;

        let kind = if is_break {
            StmtKind::Break(level)
        } else {
            StmtKind::Continue(level)
        };
        Ok(self.mk_stmt(start, kind))
    }

    fn parse_return(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // return

        let expr = if matches!(
            self.current.kind,
            TokenKind::SemiColon | TokenKind::CloseTag | TokenKind::Eof | TokenKind::CloseBrace
        ) {
            None
        } else {
            Some(self.parse_expr(0)?)
        };
        self.expect_semicolon()?;

        Ok(self.mk_stmt(start, StmtKind::Return(expr)))
    }

    /// A type union: `int|string`, a single name, or a leading `?` making
    /// null part of the union. Names are recorded lowercased.
    fn parse_type_union(&mut self) -> PResult<Vec<String>> {
        let mut types = Vec::new();
        if self.current.kind == TokenKind::Question {
            self.bump();
            types.push("null".to_string());
        }
        loop {
            match self.current.kind {
                TokenKind::Identifier => {
                    types.push(self.ident_of(self.current).to_ascii_lowercase());
                    self.bump();
                }
                TokenKind::Array => {
                    types.push("array".to_string());
                    self.bump();
                }
                _ => return Err(self.unexpected("type name")),
            }
            if self.current.kind == TokenKind::Pipe {
                self.bump();
            } else {
                break;
            }
        }
        Ok(types)
    }

    fn parse_params(&mut self) -> PResult<Vec<Param>> {
        self.expect(TokenKind::OpenParen, "'('")?;
        let mut params = Vec::new();
        while !matches!(self.current.kind, TokenKind::CloseParen | TokenKind::Eof) {
            let start = self.current.span;
            let types = if self.current.kind != TokenKind::Variable {
                self.parse_type_union()?
            } else {
                Vec::new()
            };
            let name_token = self.expect(TokenKind::Variable, "parameter variable")?;
            let name = String::from_utf8_lossy(&self.text_of(name_token)[1..]).into_owned();

            let default = if self.current.kind == TokenKind::Eq {
                self.bump();
                Some(self.parse_expr(0)?)
            } else {
                None
            };

            let end = self.current.span;
            params.push(Param {
                name,
                types,
                default,
                span: start.to(end),
            });

            if self.current.kind == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;
        Ok(params)
    }

    fn parse_function_decl(&mut self, start: Span, require_body: bool) -> PResult<Rc<FunctionDecl>> {
        let name_token = if self.current.kind == TokenKind::Identifier {
            self.current
        } else {
            return Err(self.unexpected("function name"));
        };
        let name = self.ident_of(name_token);
        self.bump();

        let params = self.parse_params()?;

        let return_types = if self.current.kind == TokenKind::Colon {
            self.bump();
            self.parse_type_union()?
        } else {
            Vec::new()
        };

        // Interface methods carry no body.
        let body = if require_body || self.current.kind == TokenKind::OpenBrace {
            self.parse_block()?
        } else {
            self.expect_semicolon()?;
            Vec::new()
        };
        let end = self.current.span;

        Ok(Rc::new(FunctionDecl {
            name,
            params,
            return_types,
            body,
            span: start.to(end),
        }))
    }

    fn parse_function(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // function
        let decl = self.parse_function_decl(start, true)?;
        let span = decl.span;
        Ok(self.mk_stmt(span, StmtKind::Function(decl)))
    }

    fn parse_const(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // const

        let mut consts = Vec::new();
        loop {
            let name_token = self.expect(TokenKind::Identifier, "constant name")?;
            let name = self.ident_of(name_token);
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.parse_expr(0)?;
            consts.push((name, value));

            if self.current.kind == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_semicolon()?;

        let end = self.current.span;
        Ok(self.mk_stmt(start.to(end), StmtKind::Const(consts)))
    }

    fn parse_global(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // global

        let mut names = Vec::new();
        loop {
            let token = self.expect(TokenKind::Variable, "variable")?;
            names.push(String::from_utf8_lossy(&self.text_of(token)[1..]).into_owned());
            if self.current.kind == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect_semicolon()?;

        Ok(self.mk_stmt(start, StmtKind::Global(names)))
    }

    fn parse_declare(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        self.bump(); // declare

        self.expect(TokenKind::OpenParen, "'('")?;
        let mut directives = Vec::new();
        loop {
            let name_token = self.expect(TokenKind::Identifier, "directive name")?;
            let name = self.ident_of(name_token);
            self.expect(TokenKind::Eq, "'='")?;
            let value = self.parse_expr(0)?;
            directives.push((name, value));
            if self.current.kind == TokenKind::Comma {
                self.bump();
            } else {
                break;
            }
        }
        self.expect(TokenKind::CloseParen, "')'")?;

        let body = match self.current.kind {
            TokenKind::OpenBrace => Some(self.parse_block()?),
            TokenKind::Colon => {
                let body = self.parse_alt_body(&[TokenKind::EndDeclare])?;
                self.expect(TokenKind::EndDeclare, "'enddeclare'")?;
                self.expect_semicolon()?;
                Some(body)
            }
            _ => {
                self.expect_semicolon()?;
                None
            }
        };

        let end = self.current.span;
        Ok(self.mk_stmt(start.to(end), StmtKind::Declare { directives, body }))
    }

    fn parse_name(&mut self) -> PResult<String> {
        let token = self.expect(TokenKind::Identifier, "name")?;
        Ok(self.ident_of(token))
    }

    fn parse_class(&mut self) -> PResult<Stmt> {
        let start = self.current.span;
        let kind = match self.current.kind {
            TokenKind::Class => ClassKind::Class,
            TokenKind::Interface => ClassKind::Interface,
            _ => ClassKind::Trait,
        };
        self.bump();

        let name = self.parse_name()?;

        let extends = if self.current.kind == TokenKind::Extends {
            self.bump();
            Some(self.parse_name()?)
        } else {
            None
        };

        let mut implements = Vec::new();
        if self.current.kind == TokenKind::Implements {
            self.bump();
            loop {
                implements.push(self.parse_name()?);
                if self.current.kind == TokenKind::Comma {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        self.expect(TokenKind::OpenBrace, "'{'")?;
        let mut members = Vec::new();
        while !matches!(self.current.kind, TokenKind::CloseBrace | TokenKind::Eof) {
            members.push(self.parse_class_member()?);
        }
        self.expect(TokenKind::CloseBrace, "'}'")?;

        let end = self.current.span;
        Ok(self.mk_stmt(
            start.to(end),
            StmtKind::Class(Rc::new(ClassDecl {
                kind,
                name,
                extends,
                implements,
                members,
                span: start.to(end),
            })),
        ))
    }

    fn parse_class_member(&mut self) -> PResult<ClassMember> {
        // Visibility and the like are accepted and discarded; this surface
        // is declaration-only.
        while self.current.kind == TokenKind::Identifier
            && matches!(
                self.text_of(self.current).to_ascii_lowercase().as_slice(),
                b"public" | b"protected" | b"private" | b"static" | b"abstract" | b"final" | b"var"
            )
        {
            self.bump();
        }

        match self.current.kind {
            TokenKind::Function => {
                let start = self.current.span;
                self.bump();
                let decl = self.parse_function_decl(start, false)?;
                Ok(ClassMember::Method(decl))
            }
            TokenKind::Const => {
                self.bump();
                let name = self.parse_name()?;
                self.expect(TokenKind::Eq, "'='")?;
                let value = self.parse_expr(0)?;
                self.expect_semicolon()?;
                Ok(ClassMember::Const { name, value })
            }
            TokenKind::Variable => {
                let token = self.current;
                self.bump();
                let name = String::from_utf8_lossy(&self.text_of(token)[1..]).into_owned();
                let default = if self.current.kind == TokenKind::Eq {
                    self.bump();
                    Some(self.parse_expr(0)?)
                } else {
                    None
                };
                self.expect_semicolon()?;
                Ok(ClassMember::Property { name, default })
            }
            _ => Err(self.unexpected("class member")),
        }
    }
}

//! Recursive-descent parser producing the mutable tree in [`crate::syntax::ast`].
//!
//! The grammar is the declaration and expression subset the rewriter
//! operates on. Comment groups ahead of the package clause and doc comments
//! directly above top-level declarations are preserved; other comments are
//! dropped.

use crate::syntax::ast::*;
use crate::syntax::lexer::{lex, unquote, Comment, Tok, Token};
use crate::syntax::ParseError;

pub fn parse_file(source: &str) -> Result<File, ParseError> {
    let out = lex(source)?;
    let mut parser = Parser {
        tokens: out.tokens,
        comments: out.comments,
        pos: 0,
        comment_cursor: 0,
    };
    parser.parse_file()
}

struct Parser {
    tokens: Vec<Token>,
    comments: Vec<Comment>,
    pos: usize,
    comment_cursor: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos].tok
    }

    fn line(&self) -> u32 {
        self.tokens[self.pos].line
    }

    fn at(&self, tok: &Tok) -> bool {
        self.peek() == tok
    }

    fn next(&mut self) -> Tok {
        let tok = self.tokens[self.pos].tok.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.at(tok) {
            self.next();
            return true;
        }
        false
    }

    fn expect(&mut self, tok: &Tok, what: &str) -> Result<(), ParseError> {
        if self.eat(tok) {
            return Ok(());
        }
        Err(self.error(format!("expected {what}, found {:?}", self.peek())))
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        match self.peek().clone() {
            Tok::Ident(name) => {
                self.next();
                Ok(name)
            }
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line(),
            message: message.into(),
        }
    }

    fn skip_semis(&mut self) {
        while self.at(&Tok::Semi) {
            self.next();
        }
    }

    // ---- comments ----

    /// Collect the comment groups that precede the package clause.
    fn take_header(&mut self, package_line: u32) -> Vec<CommentGroup> {
        let mut groups: Vec<CommentGroup> = Vec::new();
        let mut current: Vec<&Comment> = Vec::new();
        while self.comment_cursor < self.comments.len()
            && self.comments[self.comment_cursor].line < package_line
        {
            let c = &self.comments[self.comment_cursor];
            if let Some(prev) = current.last() {
                if c.line > prev.end_line + 1 {
                    groups.push(CommentGroup {
                        lines: current.iter().map(|c| c.text.clone()).collect(),
                        hard_break: true,
                    });
                    current.clear();
                }
            }
            current.push(c);
            self.comment_cursor += 1;
        }
        if !current.is_empty() {
            let hard_break = package_line > current.last().unwrap().end_line + 1;
            groups.push(CommentGroup {
                lines: current.iter().map(|c| c.text.clone()).collect(),
                hard_break,
            });
        }
        groups
    }

    /// Consume comments above a declaration; the group ending on the line
    /// directly above it becomes the doc comment.
    fn take_doc(&mut self, decl_line: u32) -> Option<CommentGroup> {
        let mut current: Vec<&Comment> = Vec::new();
        while self.comment_cursor < self.comments.len()
            && self.comments[self.comment_cursor].line < decl_line
        {
            let c = &self.comments[self.comment_cursor];
            if let Some(prev) = current.last() {
                if c.line > prev.end_line + 1 {
                    current.clear();
                }
            }
            current.push(c);
            self.comment_cursor += 1;
        }
        match current.last() {
            Some(last) if last.end_line + 1 == decl_line => Some(CommentGroup {
                lines: current.iter().map(|c| c.text.clone()).collect(),
                hard_break: false,
            }),
            _ => None,
        }
    }

    // ---- file structure ----

    fn parse_file(&mut self) -> Result<File, ParseError> {
        let package_line = self.line();
        let comments = self.take_header(package_line);
        self.expect(&Tok::Package, "`package`")?;
        let package_name = self.expect_ident("package name")?;
        self.skip_semis();

        let mut imports = Vec::new();
        while self.at(&Tok::Import) {
            self.next();
            if self.eat(&Tok::LParen) {
                loop {
                    self.skip_semis();
                    if self.eat(&Tok::RParen) {
                        break;
                    }
                    imports.push(self.parse_import_spec()?);
                }
            } else {
                imports.push(self.parse_import_spec()?);
            }
            self.skip_semis();
        }

        let mut decls = Vec::new();
        while !self.at(&Tok::Eof) {
            let decl_line = self.line();
            let doc = self.take_doc(decl_line);
            let decl = match self.peek() {
                Tok::Func => Decl::Func(self.parse_func_decl(doc)?),
                Tok::Var | Tok::Const => Decl::Value(ValueDecl {
                    doc,
                    spec: self.parse_value_spec()?,
                }),
                Tok::Type => Decl::Type(TypeDecl {
                    doc,
                    spec: self.parse_type_spec()?,
                }),
                other => {
                    return Err(self.error(format!("expected declaration, found {other:?}")))
                }
            };
            decls.push(decl);
            self.skip_semis();
        }

        Ok(File {
            comments,
            package_name,
            imports,
            decls,
        })
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let alias = match self.peek().clone() {
            Tok::Ident(name) => {
                self.next();
                Some(name)
            }
            _ => None,
        };
        match self.peek().clone() {
            Tok::Str(raw) => {
                self.next();
                Ok(ImportSpec {
                    alias,
                    path: unquote(&raw),
                })
            }
            other => Err(self.error(format!("expected import path, found {other:?}"))),
        }
    }

    // ---- declarations ----

    fn parse_func_decl(&mut self, doc: Option<CommentGroup>) -> Result<FuncDecl, ParseError> {
        self.expect(&Tok::Func, "`func`")?;
        let receiver = if self.at(&Tok::LParen) {
            self.next();
            let mut fields = self.parse_field_list(&Tok::RParen)?;
            self.expect(&Tok::RParen, "`)`")?;
            if fields.len() != 1 {
                return Err(self.error("expected a single receiver"));
            }
            Some(fields.remove(0))
        } else {
            None
        };
        let name = self.expect_ident("function name")?;
        let func_type = self.parse_signature()?;
        let body = if self.at(&Tok::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(FuncDecl {
            doc,
            receiver,
            name,
            func_type,
            body,
        })
    }

    fn parse_signature(&mut self) -> Result<FuncType, ParseError> {
        self.expect(&Tok::LParen, "`(`")?;
        let params = self.parse_field_list(&Tok::RParen)?;
        self.expect(&Tok::RParen, "`)`")?;
        let results = if self.eat(&Tok::LParen) {
            let fields = self.parse_field_list(&Tok::RParen)?;
            self.expect(&Tok::RParen, "`)`")?;
            fields
        } else if self.starts_type() {
            vec![Field {
                names: Vec::new(),
                ty: self.parse_type()?,
            }]
        } else {
            Vec::new()
        };
        Ok(FuncType { params, results })
    }

    fn starts_type(&self) -> bool {
        matches!(
            self.peek(),
            Tok::Ident(_)
                | Tok::Star
                | Tok::LBrack
                | Tok::Map
                | Tok::Chan
                | Tok::Arrow
                | Tok::Struct
                | Tok::Ellipsis
        )
    }

    /// Parse a comma-separated field list up to (not consuming) `closing`.
    /// Entries are first parsed as types; when a further type follows an
    /// entry, the accumulated entries are reinterpreted as names.
    fn parse_field_list(&mut self, closing: &Tok) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        let mut pending: Vec<Expr> = Vec::new();
        while !self.at(closing) {
            let entry = self.parse_type()?;
            if self.eat(&Tok::Comma) {
                pending.push(entry);
                continue;
            }
            if self.at(closing) {
                pending.push(entry);
                break;
            }
            let ty = self.parse_type()?;
            let mut names = Vec::with_capacity(pending.len() + 1);
            for expr in pending.drain(..).chain(std::iter::once(entry)) {
                match expr {
                    Expr::Ident(name) => names.push(name),
                    _ => return Err(self.error("expected parameter name")),
                }
            }
            fields.push(Field { names, ty });
            if !self.eat(&Tok::Comma) && !self.at(closing) {
                return Err(self.error(format!("expected `,` or end of field list, found {:?}", self.peek())));
            }
        }
        for ty in pending {
            fields.push(Field {
                names: Vec::new(),
                ty,
            });
        }
        Ok(fields)
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec, ParseError> {
        let kind = match self.next() {
            Tok::Var => ValueKind::Var,
            Tok::Const => ValueKind::Const,
            other => return Err(self.error(format!("expected `var` or `const`, found {other:?}"))),
        };
        let mut names = vec![self.expect_ident("name")?];
        while self.eat(&Tok::Comma) {
            names.push(self.expect_ident("name")?);
        }
        let ty = if !self.at(&Tok::Assign) && !self.at(&Tok::Semi) && !self.at(&Tok::RBrace) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.eat(&Tok::Assign) {
            self.parse_expr_list(false)?
        } else {
            Vec::new()
        };
        Ok(ValueSpec {
            kind,
            names,
            ty,
            values,
        })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        self.expect(&Tok::Type, "`type`")?;
        let name = self.expect_ident("type name")?;
        let ty = self.parse_type()?;
        Ok(TypeSpec { name, ty })
    }

    // ---- statements ----

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(&Tok::LBrace, "`{`")?;
        let mut stmts = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(&Tok::RBrace) {
                break;
            }
            stmts.push(self.parse_stmt()?);
            if !self.at(&Tok::RBrace) && !self.at(&Tok::Semi) {
                return Err(self.error(format!("expected end of statement, found {:?}", self.peek())));
            }
        }
        Ok(Block { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Tok::Var | Tok::Const => Ok(Stmt::Value(self.parse_value_spec()?)),
            Tok::Type => Ok(Stmt::Type(self.parse_type_spec()?)),
            Tok::Return => {
                self.next();
                let exprs = if self.at(&Tok::Semi) || self.at(&Tok::RBrace) {
                    Vec::new()
                } else {
                    self.parse_expr_list(false)?
                };
                Ok(Stmt::Return(exprs))
            }
            Tok::If => self.parse_if(),
            Tok::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => self.parse_simple_stmt(false),
        }
    }

    fn parse_simple_stmt(&mut self, no_composite: bool) -> Result<Stmt, ParseError> {
        let lhs = self.parse_expr_list(no_composite)?;
        let define = match self.peek() {
            Tok::Define => true,
            Tok::Assign => false,
            _ => {
                if lhs.len() != 1 {
                    return Err(self.error("expected assignment"));
                }
                let mut lhs = lhs;
                return Ok(Stmt::Expr(lhs.remove(0)));
            }
        };
        self.next();
        let rhs = self.parse_expr_list(no_composite)?;
        Ok(Stmt::Assign(AssignStmt { lhs, rhs, define }))
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.expect(&Tok::If, "`if`")?;
        let first = self.parse_simple_stmt(true)?;
        let (init, cond) = if self.eat(&Tok::Semi) {
            (Some(Box::new(first)), self.parse_expr(true)?)
        } else {
            match first {
                Stmt::Expr(cond) => (None, cond),
                _ => return Err(self.error("expected condition")),
            }
        };
        let then = self.parse_block()?;
        let els = if self.eat(&Tok::Else) {
            let stmt = if self.at(&Tok::If) {
                self.parse_if()?
            } else {
                Stmt::Block(self.parse_block()?)
            };
            Some(Box::new(stmt))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt {
            init,
            cond,
            then,
            els,
        }))
    }

    // ---- types & expressions ----

    fn parse_type(&mut self) -> Result<Expr, ParseError> {
        if self.eat(&Tok::Ellipsis) {
            return Ok(Expr::Ellipsis(Box::new(self.parse_type()?)));
        }
        self.parse_unary(true)
    }

    fn parse_expr_list(&mut self, no_composite: bool) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr(no_composite)?];
        while self.eat(&Tok::Comma) {
            exprs.push(self.parse_expr(no_composite)?);
        }
        Ok(exprs)
    }

    fn parse_expr(&mut self, no_composite: bool) -> Result<Expr, ParseError> {
        self.parse_binary(1, no_composite)
    }

    fn parse_binary(&mut self, min_prec: u8, no_composite: bool) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary(no_composite)?;
        loop {
            let op = match self.peek() {
                Tok::OrOr => BinaryOp::LOr,
                Tok::AndAnd => BinaryOp::LAnd,
                Tok::EqEq => BinaryOp::Eq,
                Tok::NotEq => BinaryOp::Ne,
                Tok::Lt => BinaryOp::Lt,
                Tok::Le => BinaryOp::Le,
                Tok::Gt => BinaryOp::Gt,
                Tok::Ge => BinaryOp::Ge,
                Tok::Plus => BinaryOp::Add,
                Tok::Minus => BinaryOp::Sub,
                Tok::Star => BinaryOp::Mul,
                Tok::Slash => BinaryOp::Div,
                Tok::Percent => BinaryOp::Rem,
                _ => break,
            };
            if op.precedence() < min_prec {
                break;
            }
            self.next();
            let right = self.parse_binary(op.precedence() + 1, no_composite)?;
            left = Expr::Binary {
                op,
                x: Box::new(left),
                y: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self, no_composite: bool) -> Result<Expr, ParseError> {
        match self.peek() {
            Tok::Star => {
                self.next();
                Ok(Expr::Star(Box::new(self.parse_unary(no_composite)?)))
            }
            Tok::Amp => {
                self.next();
                Ok(Expr::Unary {
                    op: UnaryOp::Amp,
                    x: Box::new(self.parse_unary(no_composite)?),
                })
            }
            Tok::Not => {
                self.next();
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    x: Box::new(self.parse_unary(no_composite)?),
                })
            }
            Tok::Minus => {
                self.next();
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    x: Box::new(self.parse_unary(no_composite)?),
                })
            }
            _ => self.parse_primary(no_composite),
        }
    }

    fn parse_primary(&mut self, no_composite: bool) -> Result<Expr, ParseError> {
        let mut expr = match self.peek().clone() {
            Tok::Ident(name) => {
                self.next();
                Expr::Ident(name)
            }
            Tok::Int(raw) | Tok::Str(raw) => {
                self.next();
                Expr::BasicLit(raw)
            }
            Tok::LParen => {
                self.next();
                let inner = self.parse_expr(false)?;
                self.expect(&Tok::RParen, "`)`")?;
                Expr::Paren(Box::new(inner))
            }
            Tok::LBrack => {
                self.next();
                let len = if self.at(&Tok::RBrack) {
                    None
                } else {
                    Some(Box::new(self.parse_expr(false)?))
                };
                self.expect(&Tok::RBrack, "`]`")?;
                Expr::ArrayType {
                    len,
                    elt: Box::new(self.parse_type()?),
                }
            }
            Tok::Map => {
                self.next();
                self.expect(&Tok::LBrack, "`[`")?;
                let key = self.parse_type()?;
                self.expect(&Tok::RBrack, "`]`")?;
                Expr::MapType {
                    key: Box::new(key),
                    value: Box::new(self.parse_type()?),
                }
            }
            Tok::Chan => {
                self.next();
                let dir = if self.eat(&Tok::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Expr::ChanType {
                    dir,
                    value: Box::new(self.parse_type()?),
                }
            }
            Tok::Arrow => {
                self.next();
                self.expect(&Tok::Chan, "`chan`")?;
                Expr::ChanType {
                    dir: ChanDir::Recv,
                    value: Box::new(self.parse_type()?),
                }
            }
            Tok::Struct => {
                self.next();
                Expr::StructType {
                    fields: self.parse_struct_fields()?,
                }
            }
            Tok::Func => {
                self.next();
                let func_type = self.parse_signature()?;
                let body = self.parse_block()?;
                Expr::FuncLit { func_type, body }
            }
            other => return Err(self.error(format!("expected expression, found {other:?}"))),
        };

        loop {
            match self.peek() {
                Tok::Dot => {
                    self.next();
                    let sel = self.expect_ident("selector")?;
                    expr = Expr::Selector {
                        x: Box::new(expr),
                        sel,
                    };
                }
                Tok::LParen => {
                    self.next();
                    let mut args = Vec::new();
                    while !self.at(&Tok::RParen) {
                        args.push(self.parse_expr(false)?);
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                    self.expect(&Tok::RParen, "`)`")?;
                    expr = Expr::Call {
                        fun: Box::new(expr),
                        args,
                    };
                }
                Tok::LBrace if !no_composite && composite_type(&expr) => {
                    self.next();
                    let mut elts = Vec::new();
                    loop {
                        self.skip_semis();
                        if self.eat(&Tok::RBrace) {
                            break;
                        }
                        let first = self.parse_expr(false)?;
                        let elt = if self.eat(&Tok::Colon) {
                            CompositeElt {
                                key: Some(first),
                                value: self.parse_expr(false)?,
                            }
                        } else {
                            CompositeElt {
                                key: None,
                                value: first,
                            }
                        };
                        elts.push(elt);
                        if !self.eat(&Tok::Comma) {
                            self.skip_semis();
                            self.expect(&Tok::RBrace, "`}`")?;
                            break;
                        }
                    }
                    expr = Expr::Composite {
                        ty: Some(Box::new(expr)),
                        elts,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_struct_fields(&mut self) -> Result<Vec<Field>, ParseError> {
        self.expect(&Tok::LBrace, "`{`")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(&Tok::RBrace) {
                break;
            }
            let mut entries = vec![self.parse_type()?];
            while self.eat(&Tok::Comma) {
                entries.push(self.parse_type()?);
            }
            if self.at(&Tok::Semi) || self.at(&Tok::RBrace) {
                if entries.len() != 1 {
                    return Err(self.error("embedded field cannot share a line"));
                }
                fields.push(Field {
                    names: Vec::new(),
                    ty: entries.remove(0),
                });
            } else {
                let ty = self.parse_type()?;
                let mut names = Vec::with_capacity(entries.len());
                for entry in entries {
                    match entry {
                        Expr::Ident(name) => names.push(name),
                        _ => return Err(self.error("expected field name")),
                    }
                }
                fields.push(Field { names, ty });
            }
        }
        Ok(fields)
    }
}

/// Whether an expression can serve as the type of a composite literal.
fn composite_type(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_) | Expr::Selector { .. } | Expr::ArrayType { .. } | Expr::MapType { .. }
    )
}

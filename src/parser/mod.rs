pub mod ast;
pub mod error;
pub mod operators;

use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::{
    analyzer::scope::{FuncInfo, ScopeInfo},
    lexer::{error::LexerError, tokens::Token, Lexer},
    source::{CodeArea, CodeSpan, EmberSource},
};

use self::{
    ast::{
        Block, CatchClause, DeclNode, ExprNode, ExprType, FuncNode, IdentNode, Module, StmtNode,
        StmtType, StructField, StructNode, ThisNode,
    },
    error::ParserError,
    operators::{unary_prec, IncrOp},
};

pub type ParseResult<T> = Result<T, ParserError>;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    src: Rc<EmberSource>,
    interner: &'a mut Rodeo,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a Rc<EmberSource>, interner: &'a mut Rodeo) -> Self {
        Self {
            lexer: Lexer::new(src.code()),
            src: src.clone(),
            interner,
        }
    }

    pub fn change_next_result(
        &self,
        v: Result<Option<Token>, LexerError>,
    ) -> Result<Token, ParserError> {
        v.map(|v| v.unwrap_or(Token::Eof))
            .map_err(|v| ParserError::LexingError {
                error: v,
                area: self.make_area(self.span()),
            })
    }

    pub fn next(&mut self) -> ParseResult<Token> {
        let next = self.lexer.next();
        self.change_next_result(next)
    }
    pub fn peek(&self) -> ParseResult<Token> {
        let mut peek = self.lexer.clone();
        self.change_next_result(peek.next())
    }
    fn peek_second(&self) -> ParseResult<Token> {
        let mut peek = self.lexer.clone();
        self.change_next_result(peek.next())?;
        self.change_next_result(peek.next())
    }
    /// Span of the token that would be read next.
    fn peek_span(&self) -> CodeSpan {
        let mut peek = self.lexer.clone();
        let _ = peek.next();
        peek.span()
    }
    pub fn span(&self) -> CodeSpan {
        self.lexer.span()
    }
    pub fn slice(&self) -> &'a str {
        self.lexer.slice()
    }

    pub fn make_area(&self, span: CodeSpan) -> CodeArea {
        CodeArea {
            span,
            src: self.src.clone(),
        }
    }

    pub fn next_is(&self, tok: Token) -> ParseResult<bool> {
        Ok(self.peek()? == tok)
    }
    pub fn skip_tok(&mut self, tok: Token) -> ParseResult<bool> {
        if self.next_is(tok)? {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }
    pub fn expect_tok_named(&mut self, tok: Token, expected: &'static str) -> ParseResult<()> {
        let next = self.next()?;
        if next != tok {
            return Err(ParserError::UnexpectedToken {
                expected,
                found: next,
                area: self.make_area(self.span()),
            });
        }
        Ok(())
    }
    pub fn expect_tok(&mut self, tok: Token) -> ParseResult<()> {
        self.expect_tok_named(tok, tok.to_str())
    }

    fn intern_slice(&mut self) -> Spur {
        let s = self.slice();
        self.interner.get_or_intern(s)
    }

    fn parse_decl(&mut self) -> ParseResult<DeclNode> {
        self.expect_tok(Token::Identifier)?;
        Ok(DeclNode::new(self.intern_slice(), self.span()))
    }

    /// `a, b, c` up to (not including) the terminating token.
    fn parse_decl_list(&mut self) -> ParseResult<Vec<DeclNode>> {
        let mut names = vec![self.parse_decl()?];
        while self.skip_tok(Token::Comma)? {
            names.push(self.parse_decl()?);
        }
        Ok(names)
    }

    fn parse_params(&mut self) -> ParseResult<Vec<DeclNode>> {
        self.expect_tok(Token::OpenParen)?;
        let mut params = vec![];
        while !self.next_is(Token::ClosedParen)? {
            params.push(self.parse_decl()?);
            if !self.skip_tok(Token::Comma)? {
                break;
            }
        }
        self.expect_tok(Token::ClosedParen)?;
        Ok(params)
    }

    fn parse_func(&mut self) -> ParseResult<FuncNode> {
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(FuncNode {
            params,
            body: body.stmts,
            info: FuncInfo::default(),
        })
    }

    pub fn parse_block(&mut self) -> ParseResult<Block> {
        self.expect_tok(Token::OpenBracket)?;
        let start = self.span();
        let mut stmts = vec![];
        while !self.next_is(Token::ClosedBracket)? {
            stmts.push(self.parse_stmt()?);
        }
        self.expect_tok(Token::ClosedBracket)?;
        Ok(Block {
            stmts,
            scope: ScopeInfo::default(),
            span: start.extended(self.span()),
        })
    }

    fn parse_struct(&mut self) -> ParseResult<StructNode> {
        self.expect_tok(Token::OpenBracket)?;
        let mut fields = vec![];
        while !self.next_is(Token::ClosedBracket)? {
            self.expect_tok_named(Token::Identifier, "field name")?;
            let (name, span) = (self.intern_slice(), self.span());
            self.expect_tok(Token::Colon)?;
            let value = self.parse_expr()?;
            fields.push(StructField { name, span, value });
            if !self.skip_tok(Token::Comma)? {
                break;
            }
        }
        self.expect_tok(Token::ClosedBracket)?;
        Ok(StructNode {
            fields,
            scope: ScopeInfo::default(),
        })
    }

    fn parse_list(&mut self, end: Token) -> ParseResult<Vec<ExprNode>> {
        let mut items = vec![];
        while !self.next_is(end)? {
            items.push(self.parse_expr()?);
            if !self.skip_tok(Token::Comma)? {
                break;
            }
        }
        self.expect_tok(end)?;
        Ok(items)
    }

    pub fn parse_unit(&mut self) -> ParseResult<ExprNode> {
        let t = self.next()?;
        let start = self.span();
        Ok(ExprNode {
            typ: match t {
                Token::Int => match self.slice().parse() {
                    Ok(v) => ExprType::Int(v),
                    Err(_) => {
                        return Err(ParserError::InvalidLiteral {
                            area: self.make_area(start),
                        })
                    }
                },
                Token::Float => match self.slice().parse() {
                    Ok(v) => ExprType::Float(v),
                    Err(_) => {
                        return Err(ParserError::InvalidLiteral {
                            area: self.make_area(start),
                        })
                    }
                },
                Token::True => ExprType::Bool(true),
                Token::False => ExprType::Bool(false),
                Token::Null => ExprType::Null,

                Token::String => {
                    let s = self.slice();
                    ExprType::String(self.interner.get_or_intern(&s[1..(s.len() - 1)]))
                }
                Token::Identifier => ExprType::Var(IdentNode::new(self.intern_slice())),
                Token::This => ExprType::This(ThisNode::default()),

                Token::OpenParen => {
                    let inner = self.parse_expr()?;
                    self.expect_tok(Token::ClosedParen)?;
                    inner.typ
                }
                Token::OpenSqBracket => ExprType::Array(self.parse_list(Token::ClosedSqBracket)?),
                Token::Fn => ExprType::Function(self.parse_func()?),
                Token::Struct => ExprType::Struct(self.parse_struct()?),

                unary_op if unary_prec(unary_op).is_some() => {
                    let val = match unary_prec(unary_op).and_then(operators::next_infix) {
                        Some(next_prec) => self.parse_op(next_prec)?,
                        None => self.parse_value()?,
                    };

                    match unary_op.to_unary_op() {
                        Some(op) => ExprType::Unary(op, Box::new(val)),
                        None => {
                            return Err(ParserError::UnexpectedToken {
                                expected: "expression",
                                found: unary_op,
                                area: self.make_area(start),
                            })
                        }
                    }
                }
                t => {
                    return Err(ParserError::UnexpectedToken {
                        expected: "expression",
                        found: t,
                        area: self.make_area(self.span()),
                    })
                }
            },
            span: start.extended(self.span()),
        })
    }

    pub fn parse_value(&mut self) -> ParseResult<ExprNode> {
        let mut value = self.parse_unit()?;

        loop {
            let typ = match self.peek()? {
                Token::OpenParen => {
                    self.next()?;
                    ExprType::Call {
                        base: Box::new(value),
                        args: self.parse_list(Token::ClosedParen)?,
                    }
                }
                Token::Period => {
                    self.next()?;
                    self.expect_tok_named(Token::Identifier, "field name")?;
                    ExprType::Member {
                        base: Box::new(value),
                        member: self.intern_slice(),
                    }
                }
                Token::OpenSqBracket => {
                    self.next()?;
                    let index = self.parse_expr()?;
                    self.expect_tok(Token::ClosedSqBracket)?;
                    ExprType::Index {
                        base: Box::new(value),
                        index: Box::new(index),
                    }
                }
                tok @ (Token::PlusPlus | Token::MinusMinus) => {
                    if !value.typ.is_assignable() {
                        return Err(ParserError::InvalidAssignTarget {
                            area: self.make_area(value.span),
                        });
                    }
                    self.next()?;
                    let op = if tok == Token::PlusPlus {
                        IncrOp::Incr
                    } else {
                        IncrOp::Decr
                    };
                    ExprType::Incr(Box::new(value), op)
                }
                _ => break,
            };
            let span = CodeSpan {
                start: match &typ {
                    ExprType::Call { base, .. }
                    | ExprType::Member { base, .. }
                    | ExprType::Index { base, .. } => base.span.start,
                    ExprType::Incr(base, _) => base.span.start,
                    _ => self.span().start,
                },
                end: self.span().end,
            };
            value = ExprNode { typ, span };
        }

        Ok(value)
    }

    pub fn parse_expr(&mut self) -> ParseResult<ExprNode> {
        let left = self.parse_op(0)?;

        let tok = self.peek()?;
        if !tok.is_assign_op() {
            return Ok(left);
        }
        if !left.typ.is_assignable() {
            return Err(ParserError::InvalidAssignTarget {
                area: self.make_area(left.span),
            });
        }
        self.next()?;
        let value = self.parse_expr()?;
        let span = left.span.extended(value.span);

        Ok(ExprNode {
            typ: ExprType::Assign {
                target: Box::new(left),
                op: tok.to_assign_op(),
                value: Box::new(value),
            },
            span,
        })
    }

    pub fn parse_op(&mut self, prec: usize) -> ParseResult<ExprNode> {
        let next_prec = operators::next_infix(prec);

        let mut left = match next_prec {
            Some(next_prec) => self.parse_op(next_prec)?,
            None => self.parse_value()?,
        };

        while operators::is_infix_prec(self.peek()?, prec) {
            let op = self.next()?;

            let right = if operators::prec_type(prec) == operators::OpType::Left {
                match next_prec {
                    Some(next_prec) => self.parse_op(next_prec)?,
                    None => self.parse_value()?,
                }
            } else {
                self.parse_op(prec)?
            };
            let Some(bin_op) = op.to_bin_op() else {
                return Err(ParserError::UnexpectedToken {
                    expected: "binary operator",
                    found: op,
                    area: self.make_area(left.span),
                });
            };
            let new_span = left.span.extended(right.span);
            left = ExprNode {
                typ: ExprType::Op(Box::new(left), bin_op, Box::new(right)),
                span: new_span,
            }
        }
        Ok(left)
    }

    fn parse_if(&mut self) -> ParseResult<StmtType> {
        let cond = self.parse_expr()?;
        let then = self.parse_block()?;
        let otherwise = if self.skip_tok(Token::Else)? {
            let start = self.peek_span();
            let typ = if self.skip_tok(Token::If)? {
                self.parse_if()?
            } else {
                StmtType::Block(self.parse_block()?)
            };
            Some(Box::new(StmtNode {
                typ,
                span: start.extended(self.span()),
            }))
        } else {
            None
        };
        Ok(StmtType::If {
            cond,
            then,
            otherwise,
        })
    }

    pub fn parse_stmt(&mut self) -> ParseResult<StmtNode> {
        let start = self.peek_span();

        let typ = match self.peek()? {
            tok @ (Token::Let | Token::Const) => {
                self.next()?;
                let name = self.parse_decl()?;
                self.expect_tok(Token::Assign)?;
                let value = self.parse_expr()?;
                self.expect_tok(Token::Semicolon)?;
                StmtType::Let {
                    is_const: tok == Token::Const,
                    name,
                    value,
                }
            }
            Token::Fn if self.peek_second()? == Token::Identifier => {
                self.next()?;
                let name = self.parse_decl()?;
                let func = self.parse_func()?;
                StmtType::Fn { name, func }
            }
            Token::If => {
                self.next()?;
                self.parse_if()?
            }
            Token::While => {
                self.next()?;
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtType::While {
                    cond,
                    body,
                    scope: ScopeInfo::default(),
                }
            }
            Token::For => {
                self.next()?;
                let names = self.parse_decl_list()?;
                self.expect_tok(Token::In)?;
                let iterable = self.parse_expr()?;
                let body = self.parse_block()?;
                StmtType::For {
                    names,
                    iterator: None,
                    iterable,
                    body,
                    scope: ScopeInfo::default(),
                }
            }
            Token::Try => {
                self.next()?;
                let body = self.parse_block()?;
                let catch = if self.skip_tok(Token::Catch)? {
                    let name = self.parse_decl()?;
                    let body = self.parse_block()?;
                    Some(CatchClause {
                        name,
                        body,
                        scope: ScopeInfo::default(),
                    })
                } else {
                    None
                };
                let finally = if self.skip_tok(Token::Finally)? {
                    Some(self.parse_block()?)
                } else {
                    None
                };
                StmtType::Try {
                    body,
                    catch,
                    finally,
                }
            }
            Token::Import => {
                self.next()?;
                let names = self.parse_decl_list()?;
                self.expect_tok(Token::From)?;
                self.expect_tok_named(Token::String, "module path")?;
                let s = self.slice();
                let path = self.interner.get_or_intern(&s[1..(s.len() - 1)]);
                self.expect_tok(Token::Semicolon)?;
                StmtType::Import { names, path }
            }
            Token::Break => {
                self.next()?;
                self.expect_tok(Token::Semicolon)?;
                StmtType::Break
            }
            Token::Continue => {
                self.next()?;
                self.expect_tok(Token::Semicolon)?;
                StmtType::Continue
            }
            Token::Return => {
                self.next()?;
                let value = if self.next_is(Token::Semicolon)? {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_tok(Token::Semicolon)?;
                StmtType::Return(value)
            }
            Token::Throw => {
                self.next()?;
                let value = self.parse_expr()?;
                self.expect_tok(Token::Semicolon)?;
                StmtType::Throw(value)
            }
            Token::OpenBracket => StmtType::Block(self.parse_block()?),
            _ => {
                let expr = self.parse_expr()?;
                self.expect_tok(Token::Semicolon)?;
                StmtType::Expr(expr)
            }
        };

        Ok(StmtNode {
            typ,
            span: start.extended(self.span()),
        })
    }

    pub fn parse(&mut self) -> ParseResult<Module> {
        let mut stmts = vec![];
        while !self.next_is(Token::Eof)? {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Module {
            stmts,
            info: FuncInfo::default(),
            src: self.src.clone(),
        })
    }
}

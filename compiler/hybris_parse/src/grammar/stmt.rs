//! Statement parsing.

use hybris_ir::{AssignOp, Literal, Node, NodeKind, NodeRef, Span, SwitchCase};
use hybris_lexer::Token;
use hybris_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

/// Type names usable in declaration statements such as `map m;`.
const DECLARABLE_TYPES: &[&str] = &["int", "float", "char", "string", "boolean", "vector", "map"];

impl Parser {
    /// Parse a single statement.
    pub(crate) fn statement(&mut self) -> Result<NodeRef, ParseError> {
        ensure_sufficient_stack(|| self.statement_inner())
    }

    fn statement_inner(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        let Some(token) = self.cursor.current().cloned() else {
            return Err(self.cursor.unexpected("statement"));
        };

        match token {
            Token::Function => self.function_decl(),
            Token::Struct => self.struct_decl(),
            Token::Class => self.class_decl(),
            Token::LBrace => self.block(),
            Token::If => self.if_stmt(),
            Token::Unless => {
                self.cursor.advance();
                let cond = self.paren_expr()?;
                let body = self.body()?;
                Ok(Node::new(NodeKind::Unless { cond, body }, self.cursor.span_from(start)))
            }
            Token::While => {
                self.cursor.advance();
                let cond = self.paren_expr()?;
                let body = self.body()?;
                Ok(Node::new(NodeKind::While { cond, body }, self.cursor.span_from(start)))
            }
            Token::Do => {
                self.cursor.advance();
                let body = self.body()?;
                self.cursor.expect(&Token::While)?;
                let cond = self.paren_expr()?;
                self.cursor.expect(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::DoWhile { body, cond }, self.cursor.span_from(start)))
            }
            Token::For => self.for_stmt(),
            Token::Foreach => self.foreach_stmt(),
            Token::Switch => self.switch_stmt(),
            Token::Try => self.try_stmt(),
            Token::Throw => {
                self.cursor.advance();
                let value = self.expression()?;
                self.cursor.expect(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Throw(value), self.cursor.span_from(start)))
            }
            Token::Return => {
                self.cursor.advance();
                let value = if self.cursor.check(&Token::Semicolon) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.cursor.expect(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Return(value), self.cursor.span_from(start)))
            }
            Token::Break => {
                self.cursor.advance();
                self.cursor.expect(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Break, self.cursor.span_from(start)))
            }
            Token::Next => {
                self.cursor.advance();
                self.cursor.expect(&Token::Semicolon)?;
                Ok(Node::new(NodeKind::Next, self.cursor.span_from(start)))
            }
            Token::Ident(type_name)
                if DECLARABLE_TYPES.contains(&type_name.as_str())
                    && matches!(self.cursor.peek(1), Some(Token::Ident(_))) =>
            {
                self.typed_declaration()
            }
            _ => {
                let expr = self.expression()?;
                self.cursor.expect(&Token::Semicolon)?;
                Ok(expr)
            }
        }
    }

    /// `{ stmt* }`
    pub(crate) fn block(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.cursor.check(&Token::RBrace) {
            if self.cursor.is_at_end() {
                return Err(self.cursor.unexpected("`}`"));
            }
            if self.cursor.eat(&Token::Semicolon) {
                continue;
            }
            statements.push(self.statement()?);
        }
        self.cursor.expect(&Token::RBrace)?;
        Ok(Node::new(NodeKind::Block(statements), self.cursor.span_from(start)))
    }

    /// Loop and conditional bodies: a block or a single statement.
    fn body(&mut self) -> Result<NodeRef, ParseError> {
        if self.cursor.check(&Token::LBrace) {
            self.block()
        } else {
            self.statement()
        }
    }

    /// `( expr )`
    fn paren_expr(&mut self) -> Result<NodeRef, ParseError> {
        self.cursor.expect(&Token::LParen)?;
        let expr = self.expression()?;
        self.cursor.expect(&Token::RParen)?;
        Ok(expr)
    }

    fn if_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::If)?;
        let cond = self.paren_expr()?;
        let then_branch = self.body()?;
        let else_branch = if self.cursor.eat(&Token::Else) {
            Some(self.body()?)
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            self.cursor.span_from(start),
        ))
    }

    /// `for ( init? ; cond? ; step? ) body`
    fn for_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::For)?;
        self.cursor.expect(&Token::LParen)?;
        let init = self.optional_expression(&Token::Semicolon)?;
        self.cursor.expect(&Token::Semicolon)?;
        let cond = self.optional_expression(&Token::Semicolon)?;
        self.cursor.expect(&Token::Semicolon)?;
        let step = self.optional_expression(&Token::RParen)?;
        self.cursor.expect(&Token::RParen)?;
        let body = self.body()?;
        Ok(Node::new(
            NodeKind::For {
                init,
                cond,
                step,
                body,
            },
            self.cursor.span_from(start),
        ))
    }

    fn optional_expression(&mut self, terminator: &Token) -> Result<Option<NodeRef>, ParseError> {
        if self.cursor.check(terminator) {
            Ok(None)
        } else {
            self.expression().map(Some)
        }
    }

    /// `foreach ( x of expr ) body` or `foreach ( k -> v of expr ) body`
    fn foreach_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Foreach)?;
        self.cursor.expect(&Token::LParen)?;
        let first = self.cursor.expect_ident()?;
        let second = if self.cursor.eat(&Token::Arrow) {
            Some(self.cursor.expect_ident()?)
        } else {
            None
        };
        self.cursor.expect(&Token::Of)?;
        let iterable = self.expression()?;
        self.cursor.expect(&Token::RParen)?;
        let body = self.body()?;

        let kind = match second {
            Some(value) => NodeKind::ForeachMapping {
                key: first,
                value,
                iterable,
                body,
            },
            None => NodeKind::Foreach {
                ident: first,
                iterable,
                body,
            },
        };
        Ok(Node::new(kind, self.cursor.span_from(start)))
    }

    /// `switch ( expr ) { case expr : stmt* ... default : stmt* }`
    fn switch_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Switch)?;
        let target = self.paren_expr()?;
        self.cursor.expect(&Token::LBrace)?;

        let mut cases = Vec::new();
        let mut default = None;
        loop {
            let arm_start = self.cursor.current_span();
            if self.cursor.eat(&Token::Case) {
                let value = self.expression()?;
                self.cursor.expect(&Token::Colon)?;
                let body = self.case_body(arm_start)?;
                cases.push(SwitchCase { value, body });
            } else if self.cursor.eat(&Token::Default) {
                if default.is_some() {
                    return Err(ParseError::invalid("duplicate default case in switch", arm_start));
                }
                self.cursor.expect(&Token::Colon)?;
                default = Some(self.case_body(arm_start)?);
            } else if self.cursor.eat(&Token::RBrace) {
                break;
            } else {
                return Err(self.cursor.unexpected("`case`, `default` or `}`"));
            }
        }

        Ok(Node::new(
            NodeKind::Switch {
                target,
                cases,
                default,
            },
            self.cursor.span_from(start),
        ))
    }

    /// Statements of one switch arm, up to the next arm or the closing brace.
    fn case_body(&mut self, start: Span) -> Result<NodeRef, ParseError> {
        let mut statements = Vec::new();
        while !matches!(
            self.cursor.current(),
            Some(Token::Case | Token::Default | Token::RBrace) | None
        ) {
            if self.cursor.eat(&Token::Semicolon) {
                continue;
            }
            statements.push(self.statement()?);
        }
        Ok(Node::new(NodeKind::Block(statements), self.cursor.span_from(start)))
    }

    /// `try block catch ( ID ) block (finally block)?`
    fn try_stmt(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Try)?;
        let body = self.block()?;
        self.cursor.expect(&Token::Catch)?;
        self.cursor.expect(&Token::LParen)?;
        let catch_ident = self.cursor.expect_ident()?;
        self.cursor.expect(&Token::RParen)?;
        let catch_body = self.block()?;
        let finally = if self.cursor.eat(&Token::Finally) {
            Some(self.block()?)
        } else {
            None
        };
        Ok(Node::new(
            NodeKind::Try {
                body,
                catch_ident,
                catch_body,
                finally,
            },
            self.cursor.span_from(start),
        ))
    }

    /// `map m;`, `int i = 3;`: sugar for assigning the type's default value
    /// (or the initializer) to each declared name.
    fn typed_declaration(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        let type_name = self.cursor.expect_ident()?;
        let mut assignments = Vec::new();
        loop {
            let name_span = self.cursor.current_span();
            let name = self.cursor.expect_ident()?;
            let value = if self.cursor.eat(&Token::Assign) {
                self.expression()?
            } else {
                default_value(&type_name, name_span)
            };
            let target = Node::new(NodeKind::Identifier(name), name_span);
            assignments.push(Node::new(
                NodeKind::Assign {
                    op: AssignOp::Plain,
                    target,
                    value,
                },
                self.cursor.span_from(name_span),
            ));
            if !self.cursor.eat(&Token::Comma) {
                break;
            }
        }
        self.cursor.expect(&Token::Semicolon)?;

        let span = self.cursor.span_from(start);
        if assignments.len() == 1 {
            Ok(assignments.remove(0))
        } else {
            Ok(Node::new(NodeKind::Block(assignments), span))
        }
    }
}

fn default_value(type_name: &str, span: Span) -> NodeRef {
    let kind = match type_name {
        "int" => NodeKind::Constant(Literal::Integer(0)),
        "float" => NodeKind::Constant(Literal::float(0.0)),
        "char" => NodeKind::Constant(Literal::Char('\0')),
        "string" => NodeKind::Constant(Literal::String(String::new())),
        "boolean" => NodeKind::Constant(Literal::Boolean(false)),
        "map" => NodeKind::Map(Vec::new()),
        _ => NodeKind::Vector(Vec::new()),
    };
    Node::new(kind, span)
}

//! Expression parsing.
//!
//! Precedence, lowest first: assignment, ternary, the binary operator table
//! of [`BinaryOp::precedence`], unary prefix, postfix, primary.

use hybris_ir::{AssignOp, BinaryOp, Literal, Node, NodeKind, NodeRef, UnaryOp};
use hybris_lexer::Token;
use hybris_stack::ensure_sufficient_stack;

use crate::{ParseError, Parser};

fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::OrOr => BinaryOp::Or,
        Token::AndAnd => BinaryOp::And,
        Token::Pipe => BinaryOp::BitOr,
        Token::Caret => BinaryOp::BitXor,
        Token::Amp => BinaryOp::BitAnd,
        Token::EqEq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::NotEq,
        Token::Lt => BinaryOp::Lt,
        Token::LtEq => BinaryOp::LtEq,
        Token::Gt => BinaryOp::Gt,
        Token::GtEq => BinaryOp::GtEq,
        Token::Shl => BinaryOp::Shl,
        Token::Shr => BinaryOp::Shr,
        Token::DotDot => BinaryOp::Range,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    let op = match token {
        Token::Assign => AssignOp::Plain,
        Token::PlusEq => AssignOp::Compound(BinaryOp::Add),
        Token::MinusEq => AssignOp::Compound(BinaryOp::Sub),
        Token::StarEq => AssignOp::Compound(BinaryOp::Mul),
        Token::SlashEq => AssignOp::Compound(BinaryOp::Div),
        Token::PercentEq => AssignOp::Compound(BinaryOp::Mod),
        Token::AmpEq => AssignOp::Compound(BinaryOp::BitAnd),
        Token::PipeEq => AssignOp::Compound(BinaryOp::BitOr),
        Token::CaretEq => AssignOp::Compound(BinaryOp::BitXor),
        Token::ShlEq => AssignOp::Compound(BinaryOp::Shl),
        Token::ShrEq => AssignOp::Compound(BinaryOp::Shr),
        _ => return None,
    };
    Some(op)
}

fn is_assignable(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Identifier(_) | NodeKind::Index { .. } | NodeKind::Member { .. }
    )
}

impl Parser {
    /// Parse a full expression (including assignment).
    pub(crate) fn expression(&mut self) -> Result<NodeRef, ParseError> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<NodeRef, ParseError> {
        let target = self.ternary()?;
        let Some(op) = self.cursor.current().and_then(assign_op) else {
            return Ok(target);
        };
        if !is_assignable(&target) {
            return Err(ParseError::invalid(
                format!("cannot assign to {}", target.label()),
                target.span,
            ));
        }
        self.cursor.advance();
        let value = self.assignment()?;
        let span = target.span.merge(value.span);
        Ok(Node::new(NodeKind::Assign { op, target, value }, span))
    }

    fn ternary(&mut self) -> Result<NodeRef, ParseError> {
        let cond = self.binary(0)?;
        if !self.cursor.eat(&Token::Question) {
            return Ok(cond);
        }
        let then_branch = self.expression()?;
        self.cursor.expect(&Token::Colon)?;
        let else_branch = self.ternary()?;
        let span = cond.span.merge(else_branch.span);
        Ok(Node::new(
            NodeKind::Ternary {
                cond,
                then_branch,
                else_branch,
            },
            span,
        ))
    }

    /// Precedence climbing over the binary operator table.
    fn binary(&mut self, min_prec: u8) -> Result<NodeRef, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.cursor.current().and_then(binary_op) {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.cursor.advance();
            let rhs = self.binary(prec + 1)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Node::new(NodeKind::Binary { op, lhs, rhs }, span);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<NodeRef, ParseError> {
        ensure_sufficient_stack(|| self.unary_inner())
    }

    fn unary_inner(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        let op = match self.cursor.current() {
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Tilde) => UnaryOp::BitNot,
            Some(Token::PlusPlus) => UnaryOp::Increment,
            Some(Token::MinusMinus) => UnaryOp::Decrement,
            Some(Token::Amp) => {
                self.cursor.advance();
                let operand = self.unary()?;
                return Ok(Node::new(
                    NodeKind::Reference(operand),
                    self.cursor.span_from(start),
                ));
            }
            _ => return self.postfix(),
        };
        self.cursor.advance();
        let operand = self.unary()?;
        let span = self.cursor.span_from(start);

        let kind = match (op, &operand.kind) {
            // Negative literals become constants.
            (UnaryOp::Neg, NodeKind::Constant(Literal::Integer(n))) => {
                NodeKind::Constant(Literal::Integer(n.wrapping_neg()))
            }
            (UnaryOp::Neg, NodeKind::Constant(lit @ Literal::Float(_))) => {
                NodeKind::Constant(Literal::float(-lit.as_f64().unwrap_or_default()))
            }
            (UnaryOp::Increment | UnaryOp::Decrement, _) => NodeKind::Step {
                op,
                target: operand,
                postfix: false,
            },
            _ => NodeKind::Unary { op, operand },
        };
        Ok(Node::new(kind, span))
    }

    fn postfix(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        let mut node = self.primary()?;
        loop {
            let kind = match self.cursor.current() {
                Some(Token::LBracket) => {
                    self.cursor.advance();
                    let index = self.expression()?;
                    self.cursor.expect(&Token::RBracket)?;
                    NodeKind::Index { owner: node, index }
                }
                Some(Token::Dot) => {
                    self.cursor.advance();
                    let name = self.cursor.expect_ident()?;
                    if self.cursor.check(&Token::LParen) {
                        let args = self.arguments()?;
                        NodeKind::MethodCall {
                            owner: node,
                            name,
                            args,
                        }
                    } else {
                        NodeKind::Member { owner: node, name }
                    }
                }
                Some(Token::LParen) => {
                    let args = self.arguments()?;
                    NodeKind::ExprCall { callee: node, args }
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let op = if self.cursor.check(&Token::PlusPlus) {
                        UnaryOp::Increment
                    } else {
                        UnaryOp::Decrement
                    };
                    self.cursor.advance();
                    NodeKind::Step {
                        op,
                        target: node,
                        postfix: true,
                    }
                }
                _ => break,
            };
            node = Node::new(kind, self.cursor.span_from(start));
        }
        Ok(node)
    }

    /// `( expr, ... )`
    fn arguments(&mut self) -> Result<Vec<NodeRef>, ParseError> {
        self.cursor.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if self.cursor.eat(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            if !self.cursor.eat(&Token::Comma) {
                break;
            }
        }
        self.cursor.expect(&Token::RParen)?;
        Ok(args)
    }

    fn primary(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        let Some(token) = self.cursor.current().cloned() else {
            return Err(self.cursor.unexpected("expression"));
        };

        let kind = match token {
            Token::Int(n) => NodeKind::Constant(Literal::Integer(n)),
            Token::Float(f) => NodeKind::Constant(Literal::float(f)),
            Token::Char(c) => NodeKind::Constant(Literal::Char(c)),
            Token::Str(s) => NodeKind::Constant(Literal::String(s)),
            Token::True => NodeKind::Constant(Literal::Boolean(true)),
            Token::False => NodeKind::Constant(Literal::Boolean(false)),
            Token::Ident(name) => {
                self.cursor.advance();
                let kind = if self.cursor.check(&Token::LParen) {
                    let args = self.arguments()?;
                    NodeKind::Call { name, args }
                } else {
                    NodeKind::Identifier(name)
                };
                return Ok(Node::new(kind, self.cursor.span_from(start)));
            }
            Token::LParen => {
                self.cursor.advance();
                let expr = self.expression()?;
                self.cursor.expect(&Token::RParen)?;
                return Ok(expr);
            }
            Token::LBracket => return self.collection_literal(),
            Token::New => {
                self.cursor.advance();
                let type_name = self.cursor.expect_ident()?;
                let args = if self.cursor.check(&Token::LParen) {
                    self.arguments()?
                } else {
                    Vec::new()
                };
                return Ok(Node::new(
                    NodeKind::New { type_name, args },
                    self.cursor.span_from(start),
                ));
            }
            _ => return Err(self.cursor.unexpected("expression")),
        };
        self.cursor.advance();
        Ok(Node::new(kind, start))
    }

    /// `[a, b]` vector, `[k : v, ...]` map, or `[:]` empty map.
    fn collection_literal(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::LBracket)?;

        if self.cursor.eat(&Token::Colon) {
            self.cursor.expect(&Token::RBracket)?;
            return Ok(Node::new(NodeKind::Map(Vec::new()), self.cursor.span_from(start)));
        }
        if self.cursor.eat(&Token::RBracket) {
            return Ok(Node::new(NodeKind::Vector(Vec::new()), self.cursor.span_from(start)));
        }

        let first = self.expression()?;
        if self.cursor.eat(&Token::Colon) {
            let value = self.expression()?;
            let mut pairs = vec![(first, value)];
            while self.cursor.eat(&Token::Comma) {
                let key = self.expression()?;
                self.cursor.expect(&Token::Colon)?;
                let value = self.expression()?;
                pairs.push((key, value));
            }
            self.cursor.expect(&Token::RBracket)?;
            return Ok(Node::new(NodeKind::Map(pairs), self.cursor.span_from(start)));
        }

        let mut items = vec![first];
        while self.cursor.eat(&Token::Comma) {
            items.push(self.expression()?);
        }
        self.cursor.expect(&Token::RBracket)?;
        Ok(Node::new(NodeKind::Vector(items), self.cursor.span_from(start)))
    }
}

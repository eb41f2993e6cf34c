//! Declarations: functions, structs and classes.

use std::sync::Arc;

use hybris_ir::{
    Access, ClassDecl, ClassMember, FunctionDecl, MethodDecl, Node, NodeKind, NodeRef, Params,
    StructDecl,
};
use hybris_lexer::Token;

use crate::{ParseError, Parser};

impl Parser {
    /// `function name ( params ) { body }`
    pub(crate) fn function_decl(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Function)?;
        let name = self.cursor.expect_ident()?;
        let params = self.params()?;
        let body = self.block()?;
        let span = self.cursor.span_from(start);
        let decl = FunctionDecl {
            name,
            params,
            body,
            span,
        };
        Ok(Node::new(NodeKind::FunctionDecl(Arc::new(decl)), span))
    }

    /// `( a, b, ... )`
    fn params(&mut self) -> Result<Params, ParseError> {
        self.cursor.expect(&Token::LParen)?;
        let mut params = Params::default();
        if self.cursor.eat(&Token::RParen) {
            return Ok(params);
        }
        loop {
            if self.cursor.eat(&Token::Ellipsis) {
                params.variadic = true;
                break;
            }
            params.names.push(self.cursor.expect_ident()?);
            if !self.cursor.eat(&Token::Comma) {
                break;
            }
        }
        self.cursor.expect(&Token::RParen)?;
        Ok(params)
    }

    /// `struct Name { a, b; c; }`
    pub(crate) fn struct_decl(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Struct)?;
        let name = self.cursor.expect_ident()?;
        self.cursor.expect(&Token::LBrace)?;

        let mut attributes: Vec<String> = Vec::new();
        while !self.cursor.eat(&Token::RBrace) {
            let attr_span = self.cursor.current_span();
            let attr = self.cursor.expect_ident()?;
            if attributes.contains(&attr) {
                return Err(ParseError::invalid(
                    format!("duplicate attribute `{attr}` in struct `{name}`"),
                    attr_span,
                ));
            }
            attributes.push(attr);
            if !self.cursor.eat(&Token::Comma) {
                self.cursor.expect(&Token::Semicolon)?;
            }
        }

        let span = self.cursor.span_from(start);
        let decl = StructDecl {
            name,
            attributes,
            span,
        };
        Ok(Node::new(NodeKind::StructDecl(Arc::new(decl)), span))
    }

    /// `class Name extends A, B { member* }`
    pub(crate) fn class_decl(&mut self) -> Result<NodeRef, ParseError> {
        let start = self.cursor.current_span();
        self.cursor.expect(&Token::Class)?;
        let name = self.cursor.expect_ident()?;

        let mut extends = Vec::new();
        if self.cursor.eat(&Token::Extends) {
            loop {
                extends.push(self.cursor.expect_ident()?);
                if !self.cursor.eat(&Token::Comma) {
                    break;
                }
            }
        }

        self.cursor.expect(&Token::LBrace)?;
        let mut members = Vec::new();
        while !self.cursor.eat(&Token::RBrace) {
            if self.cursor.is_at_end() {
                return Err(self.cursor.unexpected("`}`"));
            }
            self.class_member(&mut members)?;
        }

        let span = self.cursor.span_from(start);
        let decl = ClassDecl {
            name,
            extends,
            members,
            span,
        };
        Ok(Node::new(NodeKind::ClassDecl(Arc::new(decl)), span))
    }

    fn class_member(&mut self, members: &mut Vec<ClassMember>) -> Result<(), ParseError> {
        let start = self.cursor.current_span();
        let access = match self.cursor.current() {
            Some(Token::Public) => Some(Access::Public),
            Some(Token::Protected) => Some(Access::Protected),
            Some(Token::Private) => Some(Access::Private),
            _ => None,
        };
        if access.is_some() {
            self.cursor.advance();
        }
        let access = access.unwrap_or_default();
        let is_static = self.cursor.eat(&Token::Static);

        let method_name = if self.cursor.eat(&Token::Method) {
            Some(self.cursor.expect_ident()?)
        } else if self.cursor.eat(&Token::Operator) {
            Some(self.operator_name()?)
        } else {
            None
        };

        if let Some(name) = method_name {
            let params = self.params()?;
            let body = self.block()?;
            members.push(ClassMember::Method(Arc::new(MethodDecl {
                name,
                params,
                access,
                is_static,
                body,
                span: self.cursor.span_from(start),
            })));
            return Ok(());
        }

        // Attribute list: `a = 1, b;`
        loop {
            let name = self.cursor.expect_ident()?;
            let default = if self.cursor.eat(&Token::Assign) {
                Some(self.expression()?)
            } else {
                None
            };
            members.push(ClassMember::Attribute {
                name,
                access,
                is_static,
                default,
            });
            if !self.cursor.eat(&Token::Comma) {
                break;
            }
        }
        self.cursor.expect(&Token::Semicolon)
    }

    /// The operator token following `operator`, as the overload method name.
    fn operator_name(&mut self) -> Result<String, ParseError> {
        let name = match self.cursor.current() {
            Some(Token::LBracket) => {
                self.cursor.advance();
                self.cursor.expect(&Token::RBracket)?;
                return Ok(if self.cursor.eat(&Token::Assign) { "[]=" } else { "[]" }.to_string());
            }
            Some(
                token @ (Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Amp
                | Token::Pipe
                | Token::Caret
                | Token::Shl
                | Token::Shr
                | Token::EqEq
                | Token::NotEq
                | Token::Lt
                | Token::Gt
                | Token::LtEq
                | Token::GtEq
                | Token::AndAnd
                | Token::OrOr
                | Token::Bang
                | Token::Tilde
                | Token::PlusPlus
                | Token::MinusMinus
                | Token::DotDot),
            ) => token.to_string(),
            _ => return Err(self.cursor.unexpected("overloadable operator")),
        };
        self.cursor.advance();
        Ok(name)
    }
}

//! Token definitions.

use logos::{FilterResult, Lexer, Logos};
use std::fmt;

/// Resolve the escape sequences of a quoted literal body.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn lex_string(lex: &mut Lexer<'_, Token>) -> Option<String> {
    let s = lex.slice();
    unescape(&s[1..s.len() - 1])
}

fn lex_char(lex: &mut Lexer<'_, Token>) -> Option<char> {
    let s = lex.slice();
    let body = unescape(&s[1..s.len() - 1])?;
    let mut chars = body.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

fn lex_hex(lex: &mut Lexer<'_, Token>) -> Option<i64> {
    // Parse as u64 so 0xFFFFFFFFFFFFFFFF wraps to -1 like a C long.
    u64::from_str_radix(&lex.slice()[2..], 16)
        .ok()
        .map(|n| n as i64)
}

/// Skip a `/* ... */` comment; running off the end of input is an error.
fn block_comment(lex: &mut Lexer<'_, Token>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            FilterResult::Error(())
        }
    }
}

/// Hybris tokens.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // Comments
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    #[token("/*", block_comment)]
    Comment,

    // Keywords
    #[token("function")]
    Function,
    #[token("method")]
    Method,
    #[token("operator")]
    Operator,
    #[token("struct")]
    Struct,
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("static")]
    Static,
    #[token("new")]
    New,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("unless")]
    Unless,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("foreach")]
    Foreach,
    #[token("of")]
    Of,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("break")]
    Break,
    #[token("next")]
    Next,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("..")]
    DotDot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("->")]
    Arrow,

    // Operators
    #[token("=")]
    Assign,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    #[regex(r"0[xX][0-9a-fA-F]+", lex_hex)]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r"'([^'\\]|\\.)+'", lex_char)]
    Char(char),

    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    Str(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
}

impl Token {
    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Int(n) => format!("integer `{n}`"),
            Token::Float(f) => format!("float `{f}`"),
            Token::Char(c) => format!("char `{}`", c.escape_default()),
            Token::Str(s) => format!("string \"{}\"", s.escape_default()),
            Token::Ident(name) => format!("identifier `{name}`"),
            other => format!("`{other}`"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::Comment => "comment",
            Token::Function => "function",
            Token::Method => "method",
            Token::Operator => "operator",
            Token::Struct => "struct",
            Token::Class => "class",
            Token::Extends => "extends",
            Token::Public => "public",
            Token::Private => "private",
            Token::Protected => "protected",
            Token::Static => "static",
            Token::New => "new",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::Unless => "unless",
            Token::While => "while",
            Token::Do => "do",
            Token::For => "for",
            Token::Foreach => "foreach",
            Token::Of => "of",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Break => "break",
            Token::Next => "next",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::Throw => "throw",
            Token::True => "true",
            Token::False => "false",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semicolon => ";",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::DotDot => "..",
            Token::Ellipsis => "...",
            Token::Colon => ":",
            Token::Question => "?",
            Token::Arrow => "->",
            Token::Assign => "=",
            Token::EqEq => "==",
            Token::NotEq => "!=",
            Token::Lt => "<",
            Token::LtEq => "<=",
            Token::Gt => ">",
            Token::GtEq => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::Shl => "<<",
            Token::Shr => ">>",
            Token::AndAnd => "&&",
            Token::OrOr => "||",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::PlusEq => "+=",
            Token::MinusEq => "-=",
            Token::StarEq => "*=",
            Token::SlashEq => "/=",
            Token::PercentEq => "%=",
            Token::AmpEq => "&=",
            Token::PipeEq => "|=",
            Token::CaretEq => "^=",
            Token::ShlEq => "<<=",
            Token::ShrEq => ">>=",
            Token::Int(n) => return write!(f, "{n}"),
            Token::Float(x) => return write!(f, "{x}"),
            Token::Char(c) => return write!(f, "'{}'", c.escape_default()),
            Token::Str(s) => return write!(f, "\"{}\"", s.escape_default()),
            Token::Ident(name) => return f.write_str(name),
        };
        f.write_str(text)
    }
}

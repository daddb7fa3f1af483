use std::ops::Range;

use logos::Logos;

use crate::parser::SyntaxError;

#[derive(Logos, Debug, Copy, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    #[token("\n")]
    Newline,

    // Counts as a newline when it spans several lines.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("type")]
    Type,
    #[token("interface")]
    Interface,
    #[token("struct")]
    Struct,
    #[token("func")]
    Func,
    #[token("map")]
    Map,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("var")]
    Var,
    #[token("break")]
    #[token("continue")]
    #[token("fallthrough")]
    #[token("return")]
    Jump,
    #[token("case")]
    #[token("default")]
    #[token("defer")]
    #[token("else")]
    #[token("for")]
    #[token("go")]
    #[token("goto")]
    #[token("if")]
    #[token("range")]
    #[token("select")]
    #[token("switch")]
    Keyword,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Ident,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,
    #[regex(r"`[^`]*`")]
    RawString,
    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'")]
    Rune,
    #[regex(r"([0-9]|\.[0-9])([0-9a-zA-Z_.]|[eEpP][+-])*")]
    Number,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(";")]
    Semi,
    #[token("*")]
    Star,
    #[token("<-")]
    Arrow,
    #[token("=")]
    Assign,
    #[token("~")]
    Tilde,
    #[token("|")]
    Pipe,
    #[token(":")]
    Colon,
    #[token("++")]
    #[token("--")]
    IncDec,
    #[token("+")]
    #[token("-")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("^")]
    #[token("<")]
    #[token(">")]
    #[token("!")]
    #[token("==")]
    #[token("!=")]
    #[token("<=")]
    #[token(">=")]
    #[token("&&")]
    #[token("||")]
    #[token("<<")]
    #[token(">>")]
    #[token("&^")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&^=")]
    #[token(":=")]
    Op,
}

impl Token {
    /// Tokens after which a line break ends the statement.
    fn ends_statement(self) -> bool {
        matches!(
            self,
            Token::Ident
                | Token::String
                | Token::RawString
                | Token::Rune
                | Token::Number
                | Token::Jump
                | Token::IncDec
                | Token::RParen
                | Token::RBracket
                | Token::RBrace
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub span: Range<usize>,
}

/// Splits Go source into tokens, dropping comments and line breaks but
/// inserting the semicolons Go's grammar implies.
pub fn tokenize(src: &str) -> Result<Vec<Lexeme>, SyntaxError> {
    let mut lexer = Token::lexer(src);
    let mut out: Vec<Lexeme> = Vec::new();

    let insert_semi = |out: &mut Vec<Lexeme>, at: usize| {
        if out.last().map_or(false, |last| last.token.ends_statement()) {
            out.push(Lexeme {
                token: Token::Semi,
                span: at..at,
            });
        }
    };

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        match token {
            Ok(Token::Newline) => insert_semi(&mut out, span.start),
            Ok(Token::BlockComment) => {
                if lexer.slice().contains('\n') {
                    insert_semi(&mut out, span.start);
                }
            }
            Ok(token) => out.push(Lexeme { token, span }),
            Err(()) => {
                return Err(SyntaxError::new(
                    format!("unexpected character `{}`", lexer.slice()),
                    span,
                ))
            }
        }
    }
    insert_semi(&mut out, src.len());

    Ok(out)
}

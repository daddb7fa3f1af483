use std::ops::Range;

use gomoq_model::ChanDir;
use thiserror::Error;

use crate::ast::{Field, ImportSpec, InterfaceElem, Signature, SourceFile, TypeExpr, TypeSpec};
use crate::lexer::{self, Lexeme, Token};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Range<usize>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

type ParseResult<T> = Result<T, SyntaxError>;

/// Parses the package clause, imports and type declarations of a Go file.
pub fn parse_file(src: &str) -> ParseResult<SourceFile> {
    let tokens = lexer::tokenize(src)?;
    Parser::new(src, &tokens).parse_source_file()
}

enum ParamEntry {
    /// A lone identifier: a parameter name in a group or a type.
    Bare(String),
    Named(String, TypeExpr),
    Type(TypeExpr),
}

struct Parser<'a> {
    src: &'a str,
    tokens: &'a [Lexeme],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, tokens: &'a [Lexeme]) -> Self {
        Self {
            src,
            tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|lexeme| lexeme.token)
    }

    fn next(&mut self) -> Option<&'a Lexeme> {
        let tokens = self.tokens;
        let lexeme = tokens.get(self.pos);
        self.pos += 1;
        lexeme
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn text(&self, lexeme: &Lexeme) -> &'a str {
        &self.src[lexeme.span.clone()]
    }

    fn current_span(&self) -> Range<usize> {
        match self.tokens.get(self.pos) {
            Some(lexeme) => lexeme.span.clone(),
            None => self.src.len()..self.src.len(),
        }
    }

    fn error<T>(&self, expected: &str) -> ParseResult<T> {
        let found = match self.tokens.get(self.pos) {
            None => "end of file".to_string(),
            Some(lexeme) if lexeme.span.is_empty() => "newline".to_string(),
            Some(lexeme) => format!("`{}`", self.text(lexeme)),
        };
        Err(SyntaxError::new(
            format!("expected {expected}, found {found}"),
            self.current_span(),
        ))
    }

    fn expect(&mut self, token: Token, expected: &str) -> ParseResult<&'a Lexeme> {
        let tokens = self.tokens;
        match tokens.get(self.pos) {
            Some(lexeme) if lexeme.token == token => {
                self.pos += 1;
                Ok(lexeme)
            }
            _ => self.error(expected),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        let lexeme = self.expect(Token::Ident, "identifier")?;
        Ok(self.text(lexeme).to_string())
    }

    fn expect_semi(&mut self) -> ParseResult<()> {
        self.expect(Token::Semi, "`;` or newline").map(|_| ())
    }

    /// A `;` is optional right before the closing token of a group.
    fn expect_semi_or(&mut self, close: Token) -> ParseResult<()> {
        if self.peek() == Some(close) {
            Ok(())
        } else {
            self.expect_semi()
        }
    }

    fn skip_semis(&mut self) {
        while self.eat(Token::Semi) {}
    }

    /// Skips balanced tokens until one of `stop` or an unmatched closing
    /// bracket at the current nesting level. Neither is consumed.
    fn skip_until(&mut self, stop: &[Token]) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                token if depth == 0 && stop.contains(&token) => return,
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Skips a declaration this parser has no use for.
    fn skip_decl(&mut self) {
        self.skip_until(&[Token::Semi]);
        if !self.eat(Token::Semi) {
            // stray closing bracket
            self.pos += 1;
        }
    }

    fn parse_source_file(&mut self) -> ParseResult<SourceFile> {
        self.skip_semis();
        self.expect(Token::Package, "`package`")?;
        let package = self.expect_ident()?;
        self.expect_semi()?;

        let mut imports = Vec::new();
        loop {
            self.skip_semis();
            if !self.eat(Token::Import) {
                break;
            }
            self.parse_import_decl(&mut imports)?;
        }

        let mut decls = Vec::new();
        loop {
            self.skip_semis();
            match self.peek() {
                None => break,
                Some(Token::Type) => {
                    self.next();
                    self.parse_type_decl(&mut decls)?;
                }
                Some(_) => self.skip_decl(),
            }
        }

        Ok(SourceFile {
            package,
            imports,
            decls,
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<ImportSpec>) -> ParseResult<()> {
        if self.eat(Token::LParen) {
            loop {
                self.skip_semis();
                if self.eat(Token::RParen) {
                    break;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_semi_or(Token::RParen)?;
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_semi()
    }

    fn parse_import_spec(&mut self) -> ParseResult<ImportSpec> {
        let alias = match self.peek() {
            Some(Token::Ident) => Some(self.expect_ident()?),
            Some(Token::Dot) => {
                self.next();
                Some(".".to_string())
            }
            _ => None,
        };
        let path = match self.peek() {
            Some(Token::String | Token::RawString) => match self.next() {
                Some(lexeme) => unquote(self.text(lexeme)),
                None => return self.error("import path"),
            },
            _ => return self.error("import path"),
        };
        Ok(ImportSpec { alias, path })
    }

    fn parse_type_decl(&mut self, decls: &mut Vec<TypeSpec>) -> ParseResult<()> {
        if self.eat(Token::LParen) {
            loop {
                self.skip_semis();
                if self.eat(Token::RParen) {
                    break;
                }
                decls.push(self.parse_type_spec()?);
                self.expect_semi_or(Token::RParen)?;
            }
        } else {
            decls.push(self.parse_type_spec()?);
        }
        self.expect_semi()
    }

    fn parse_type_spec(&mut self) -> ParseResult<TypeSpec> {
        let start = self.current_span().start;
        let name = self.expect_ident()?;
        let type_params = if self.starts_type_params() {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let alias = self.eat(Token::Assign);

        let body = self.pos;
        let interface_like = self.peek() == Some(Token::Interface);
        let ty = match self.parse_type() {
            Ok(ty) => Ok(ty),
            Err(err) => {
                self.pos = body;
                self.skip_until(&[Token::Semi]);
                Err(err)
            }
        };
        let end = self.tokens[..self.pos.min(self.tokens.len())]
            .last()
            .map_or(start, |lexeme| lexeme.span.end);

        Ok(TypeSpec {
            name,
            type_params,
            alias,
            ty,
            interface_like,
            span: start..end,
        })
    }

    /// Tells `type L[T any] ...` apart from `type A [N]int`.
    fn starts_type_params(&self) -> bool {
        self.peek() == Some(Token::LBracket)
            && self.peek_nth(1) == Some(Token::Ident)
            && matches!(
                self.peek_nth(2),
                Some(
                    Token::Ident
                        | Token::Comma
                        | Token::Tilde
                        | Token::Interface
                        | Token::Func
                        | Token::Map
                        | Token::Chan
                        | Token::Struct
                        | Token::LBracket
                        | Token::Arrow
                )
            )
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<String>> {
        self.expect(Token::LBracket, "`[`")?;
        let mut names = Vec::new();
        loop {
            names.push(self.expect_ident()?);
            if !self.eat(Token::Comma) {
                // constraint of the names collected so far
                self.skip_until(&[Token::Comma]);
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            if self.peek() == Some(Token::RBracket) {
                break;
            }
        }
        self.expect(Token::RBracket, "`]`")?;
        Ok(names)
    }

    fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        match self.peek() {
            Some(Token::Ident) => self.parse_type_name(),
            Some(Token::LParen) => {
                self.next();
                let ty = self.parse_type()?;
                self.expect(Token::RParen, "`)`")?;
                Ok(ty)
            }
            Some(Token::Star) => {
                self.next();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Some(Token::LBracket) => self.parse_array_or_slice(),
            Some(Token::Map) => {
                self.next();
                self.expect(Token::LBracket, "`[`")?;
                let key = self.parse_type()?;
                self.expect(Token::RBracket, "`]`")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            Some(Token::Chan) => {
                self.next();
                let dir = if self.eat(Token::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan(dir, Box::new(self.parse_type()?)))
            }
            Some(Token::Arrow) => {
                self.next();
                self.expect(Token::Chan, "`chan`")?;
                Ok(TypeExpr::Chan(ChanDir::Recv, Box::new(self.parse_type()?)))
            }
            Some(Token::Func) => {
                self.next();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            Some(Token::Interface) => {
                self.next();
                self.parse_interface_body()
            }
            Some(Token::Struct) => {
                self.next();
                self.parse_struct_body()
            }
            _ => self.error("type"),
        }
    }

    fn parse_type_name(&mut self) -> ParseResult<TypeExpr> {
        let first = self.expect_ident()?;
        let (qualifier, name) = if self.eat(Token::Dot) {
            (Some(first), self.expect_ident()?)
        } else {
            (None, first)
        };

        let mut args = Vec::new();
        if self.eat(Token::LBracket) {
            loop {
                args.push(self.parse_type()?);
                if !self.eat(Token::Comma) || self.peek() == Some(Token::RBracket) {
                    break;
                }
            }
            self.expect(Token::RBracket, "`]`")?;
        }

        Ok(TypeExpr::Name {
            qualifier,
            name,
            args,
        })
    }

    fn parse_array_or_slice(&mut self) -> ParseResult<TypeExpr> {
        self.expect(Token::LBracket, "`[`")?;
        if self.eat(Token::RBracket) {
            return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
        }

        let start = self.current_span().start;
        self.skip_until(&[]);
        let end = self.current_span().start;
        let len = self.src[start..end].split_whitespace().collect::<String>();
        if len.is_empty() {
            return self.error("array length");
        }
        self.expect(Token::RBracket, "`]`")?;

        Ok(TypeExpr::Array(len, Box::new(self.parse_type()?)))
    }

    fn parse_signature(&mut self) -> ParseResult<Signature> {
        let params = self.parse_param_list()?;
        let results = match self.peek() {
            Some(Token::LParen) => self.parse_param_list()?,
            Some(token) if starts_type(token) => vec![Field {
                name: None,
                ty: self.parse_type()?,
            }],
            _ => Vec::new(),
        };
        Ok(Signature { params, results })
    }

    fn parse_param_list(&mut self) -> ParseResult<Vec<Field>> {
        self.expect(Token::LParen, "`(`")?;
        let mut entries = Vec::new();
        while self.peek() != Some(Token::RParen) {
            entries.push(self.parse_param_entry()?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        let close = self.current_span();
        self.expect(Token::RParen, "`)`")?;

        let any_named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        if !any_named {
            let fields = entries
                .into_iter()
                .map(|entry| match entry {
                    ParamEntry::Bare(name) => TypeExpr::name(name),
                    ParamEntry::Named(_, ty) | ParamEntry::Type(ty) => ty,
                })
                .map(|ty| Field { name: None, ty })
                .collect();
            return Ok(fields);
        }

        // `a, b int, c string`: bare names take the type of the next named entry.
        let mut fields = Vec::new();
        let mut pending = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Bare(name) => pending.push(name),
                ParamEntry::Named(name, ty) => {
                    for name in pending.drain(..) {
                        fields.push(Field {
                            name: Some(name),
                            ty: ty.clone(),
                        });
                    }
                    fields.push(Field {
                        name: Some(name),
                        ty,
                    });
                }
                ParamEntry::Type(_) => {
                    return Err(SyntaxError::new(
                        "mixed named and unnamed parameters",
                        close,
                    ))
                }
            }
        }
        if !pending.is_empty() {
            return Err(SyntaxError::new("missing parameter type", close));
        }
        Ok(fields)
    }

    fn parse_param_entry(&mut self) -> ParseResult<ParamEntry> {
        if self.peek() == Some(Token::Ident) {
            match self.peek_nth(1) {
                Some(Token::Comma | Token::RParen) => {
                    return Ok(ParamEntry::Bare(self.expect_ident()?));
                }
                Some(Token::Dot) => return Ok(ParamEntry::Type(self.parse_type()?)),
                Some(Token::LBracket) if self.is_generic_instance() => {
                    return Ok(ParamEntry::Type(self.parse_type()?));
                }
                Some(token) if token == Token::Ellipsis || starts_type(token) => {
                    let name = self.expect_ident()?;
                    let ty = self.parse_param_type()?;
                    return Ok(ParamEntry::Named(name, ty));
                }
                _ => {}
            }
        }
        Ok(ParamEntry::Type(self.parse_param_type()?))
    }

    fn parse_param_type(&mut self) -> ParseResult<TypeExpr> {
        if self.eat(Token::Ellipsis) {
            Ok(TypeExpr::Ellipsis(Box::new(self.parse_type()?)))
        } else {
            self.parse_type()
        }
    }

    /// `List[int]` is followed by `,` or `)` once its brackets close, while a
    /// named array parameter `a [4]int` continues with the element type.
    fn is_generic_instance(&self) -> bool {
        if self.peek_nth(2) == Some(Token::RBracket) {
            return false;
        }
        let mut depth = 0usize;
        let mut i = self.pos + 1;
        while let Some(lexeme) = self.tokens.get(i) {
            match lexeme.token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        matches!(
            self.tokens.get(i + 1).map(|lexeme| lexeme.token),
            Some(Token::Comma | Token::RParen)
        )
    }

    fn parse_interface_body(&mut self) -> ParseResult<TypeExpr> {
        self.expect(Token::LBrace, "`{`")?;
        let mut elems = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(Token::RBrace) {
                break;
            }
            elems.push(self.parse_interface_elem()?);
            self.expect_semi_or(Token::RBrace)?;
        }
        Ok(TypeExpr::Interface(elems))
    }

    fn parse_interface_elem(&mut self) -> ParseResult<InterfaceElem> {
        if self.peek() == Some(Token::Ident) && self.peek_nth(1) == Some(Token::LParen) {
            let name = self.expect_ident()?;
            let sig = self.parse_signature()?;
            return Ok(InterfaceElem::Method { name, sig });
        }

        let mut terms = Vec::new();
        let mut approx = false;
        loop {
            approx |= self.eat(Token::Tilde);
            terms.push(self.parse_type()?);
            if !self.eat(Token::Pipe) {
                break;
            }
        }
        match terms.pop() {
            Some(ty @ TypeExpr::Name { .. }) if terms.is_empty() && !approx => {
                Ok(InterfaceElem::Embed(ty))
            }
            Some(ty) => {
                terms.push(ty);
                Ok(InterfaceElem::TypeSet(terms))
            }
            None => self.error("interface element"),
        }
    }

    fn parse_struct_body(&mut self) -> ParseResult<TypeExpr> {
        self.expect(Token::LBrace, "`{`")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semis();
            if self.eat(Token::RBrace) {
                break;
            }
            self.parse_struct_fields(&mut fields)?;
            self.expect_semi_or(Token::RBrace)?;
        }
        Ok(TypeExpr::Struct(fields))
    }

    fn parse_struct_fields(&mut self, fields: &mut Vec<Field>) -> ParseResult<()> {
        let embedded = match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Star), _) => true,
            (
                Some(Token::Ident),
                Some(Token::Dot | Token::Semi | Token::RBrace | Token::String | Token::RawString),
            ) => true,
            _ => false,
        };

        if embedded {
            let ty = if self.eat(Token::Star) {
                TypeExpr::Pointer(Box::new(self.parse_type_name()?))
            } else {
                self.parse_type_name()?
            };
            fields.push(Field { name: None, ty });
        } else {
            let mut names = vec![self.expect_ident()?];
            while self.eat(Token::Comma) {
                names.push(self.expect_ident()?);
            }
            let ty = self.parse_type()?;
            fields.extend(names.into_iter().map(|name| Field {
                name: Some(name),
                ty: ty.clone(),
            }));
        }

        // tag
        if matches!(self.peek(), Some(Token::String | Token::RawString)) {
            self.next();
        }
        Ok(())
    }
}

fn starts_type(token: Token) -> bool {
    matches!(
        token,
        Token::Ident
            | Token::LParen
            | Token::Star
            | Token::LBracket
            | Token::Map
            | Token::Chan
            | Token::Arrow
            | Token::Func
            | Token::Interface
            | Token::Struct
    )
}

fn unquote(literal: &str) -> String {
    literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default()
        .to_string()
}

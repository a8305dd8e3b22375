use std::{iter::Peekable, str::CharIndices};

use super::token::{Keyword, Literal, Operator, Token, TokenKind};
use crate::error::{Error, ErrorKind, PResult};

/// Scans `src` into tokens terminated by a single [`TokenKind::Eof`].
///
/// Scanning never stops at the first bad character: every error in the input
/// is collected and returned together once the whole source has been read.
pub fn scan(src: &str) -> Result<Vec<Token<'_>>, Vec<Error>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = vec![];
    let mut errors = vec![];

    for result in lexer.by_ref() {
        match result {
            Ok(token) => tokens.push(token),
            Err(err) => errors.push(err),
        }
    }

    if !errors.is_empty() {
        log::debug!("scan failed with {} error(s)", errors.len());
        return Err(errors);
    }

    tokens.push(Token::eof(lexer.line));
    log::debug!("scanned {} tokens", tokens.len());
    Ok(tokens)
}

pub(crate) struct Lexer<'src> {
    src: &'src str,
    chars: Peekable<CharIndices<'src>>,
    line: usize,
}

impl<'src> Iterator for Lexer<'src> {
    type Item = PResult<Token<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (off, c) = self.chars.next()?;

            let kind = match c {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LCurly,
                '}' => TokenKind::RCurly,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                ';' => TokenKind::Semicolon,
                '+' => TokenKind::Op(Operator::Plus),
                '-' => TokenKind::Op(Operator::Minus),
                '*' => TokenKind::Op(Operator::Star),
                '!' => self.either('=', Operator::BangEqual, Operator::Bang),
                '=' => {
                    if self.eat_if('=') {
                        TokenKind::Op(Operator::EqualEqual)
                    } else {
                        TokenKind::Eq
                    }
                }
                '<' => self.either('=', Operator::LessEqual, Operator::Less),
                '>' => self.either('=', Operator::GreaterEqual, Operator::Greater),
                '/' => {
                    if self.eat_if('/') {
                        self.slice_until(off, |c| c == '\n');
                        continue;
                    }
                    TokenKind::Op(Operator::Slash)
                }
                '\n' => {
                    self.line += 1;
                    continue;
                }
                '"' => return Some(self.read_string(off)),
                c if c.is_whitespace() => continue,
                c if c.is_ascii_digit() => return Some(self.read_number(off)),
                c if Self::is_id_start(c) => return Some(Ok(self.read_id(off))),
                other => {
                    return Some(Err(Error::new(
                        ErrorKind::UnexpectedCharacter(other),
                        self.line,
                    )))
                }
            };

            let end = self.offset();
            return Some(Ok(Token::new(kind, &self.src[off..end], self.line)));
        }
    }
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
            line: 1,
        }
    }

    #[inline]
    fn bump(&mut self) {
        let _ = self.chars.next();
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.src.len(), |&(off, _)| off)
    }

    fn eat_if(&mut self, expected: char) -> bool {
        match self.chars.peek() {
            Some(&(_, c)) if c == expected => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn either(&mut self, second: char, long: Operator, short: Operator) -> TokenKind {
        if self.eat_if(second) {
            TokenKind::Op(long)
        } else {
            TokenKind::Op(short)
        }
    }

    /// Looks one character past the next one.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn slice_until<P>(&mut self, from_off: usize, predicate: P) -> &'src str
    where
        P: Fn(char) -> bool,
    {
        while let Some(&(off, c)) = self.chars.peek() {
            if predicate(c) {
                return &self.src[from_off..off];
            }
            self.bump();
        }
        &self.src[from_off..self.src.len()]
    }

    fn read_string(&mut self, from_off: usize) -> PResult<Token<'src>> {
        let start_line = self.line;

        loop {
            match self.chars.next() {
                None => return Err(Error::new(ErrorKind::UnterminatedString, start_line)),
                Some((_, '"')) => break,
                Some((_, '\n')) => self.line += 1,
                Some(_) => (),
            }
        }

        let end = self.offset();
        let lexeme = &self.src[from_off..end];
        let content = &lexeme[1..lexeme.len() - 1];
        Ok(Token::new(TokenKind::String, lexeme, start_line)
            .with_literal(Literal::String(content.to_string())))
    }

    fn read_number(&mut self, from_off: usize) -> PResult<Token<'src>> {
        let mut end = self.slice_until(from_off, |c| !c.is_ascii_digit()).len();

        // A trailing `.` only belongs to the number when a digit follows it.
        let has_fraction = matches!(self.chars.peek(), Some(&(_, '.')))
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if has_fraction {
            self.bump();
            let fraction = self.slice_until(from_off + end + 1, |c| !c.is_ascii_digit());
            end += 1 + fraction.len();
        }

        let lexeme = &self.src[from_off..from_off + end];
        let value = lexeme
            .parse::<f64>()
            .map_err(|_| Error::new(ErrorKind::InvalidNumber(lexeme.into()), self.line))?;
        Ok(Token::new(TokenKind::Number, lexeme, self.line).with_literal(Literal::Number(value)))
    }

    fn read_id(&mut self, from_off: usize) -> Token<'src> {
        let s = self.slice_until(from_off, |c| !Self::is_id_part(c));
        match Keyword::from_ident(s) {
            Some(kw) => Token::new(TokenKind::Kw(kw), s, self.line),
            None => Token::new(TokenKind::Identifier, s, self.line),
        }
    }

    fn is_id_start(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_id_part(c: char) -> bool {
        Self::is_id_start(c) || c.is_ascii_digit()
    }
}

#[cfg(test)]
mod test {
    use super::{
        super::token::{Keyword, Literal, Operator, TokenKind},
        scan,
    };
    use crate::error::ErrorKind;

    fn kinds(s: &str) -> Vec<TokenKind> {
        scan(s).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn read_number() {
        let tokens = scan("48 10.25 7.").unwrap();
        let literals: Vec<_> = tokens.iter().map(|t| t.literal.clone()).collect();

        assert_eq!(
            literals,
            vec![
                Some(Literal::Number(48.0)),
                Some(Literal::Number(10.25)),
                Some(Literal::Number(7.0)),
                None,
                None,
            ]
        );
        assert_eq!(tokens[2].lexeme, "7");
        assert_eq!(tokens[3].kind, TokenKind::Dot);
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn one_and_two_char_operators() {
        use Operator::*;
        use TokenKind::*;

        assert_eq!(
            kinds("! != = == < <= > >= / *"),
            vec![
                Op(Bang),
                Op(BangEqual),
                Eq,
                Op(EqualEqual),
                Op(Less),
                Op(LessEqual),
                Op(Greater),
                Op(GreaterEqual),
                Op(Slash),
                Op(Star),
                Eof,
            ]
        );
    }

    #[test]
    fn keywords_and_identifiers() {
        let tokens = scan("var _tmp1 = nil; classy class").unwrap();

        assert_eq!(tokens[0].kind, TokenKind::Kw(Keyword::Var));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "_tmp1");
        assert_eq!(tokens[3].kind, TokenKind::Kw(Keyword::Nil));
        assert_eq!(tokens[5].kind, TokenKind::Identifier);
        assert_eq!(tokens[6].kind, TokenKind::Kw(Keyword::Class));
    }

    #[test]
    fn comments_and_lines() {
        let tokens = scan("a // ignored ( )\nb\n\n c").unwrap();
        let lines: Vec<_> = tokens.iter().map(|t| (t.lexeme, t.line)).collect();

        assert_eq!(lines, vec![("a", 1), ("b", 2), ("c", 4), ("", 4)]);
    }

    #[test]
    fn string_literal() {
        let tokens = scan("\"hi\nthere\" x").unwrap();

        assert_eq!(tokens[0].lexeme, "\"hi\nthere\"");
        assert_eq!(
            tokens[0].literal,
            Some(Literal::String("hi\nthere".into()))
        );
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn collects_every_error() {
        let errors = scan("var a = $;\n#\n\"open").unwrap_err();
        let found: Vec<_> = errors.iter().map(|e| (e.kind.clone(), e.line)).collect();

        assert_eq!(
            found,
            vec![
                (ErrorKind::UnexpectedCharacter('$'), 1),
                (ErrorKind::UnexpectedCharacter('#'), 2),
                (ErrorKind::UnterminatedString, 3),
            ]
        );
    }
}

//! C lexer
//!
//! Turns source text into the token stream the parser pulls from.
//! Handles keywords, operators (maximal munch, including the three
//! character `...`), integer/character/string literals and comments.

pub mod token;

pub use token::{Token, TokenKind};

use qcc_common::{CompilerError, SourceLocation};
use std::collections::HashMap;

/// C lexer
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let keywords = HashMap::from([
            ("auto", TokenKind::Auto),
            ("break", TokenKind::Break),
            ("case", TokenKind::Case),
            ("char", TokenKind::Char),
            ("const", TokenKind::Const),
            ("continue", TokenKind::Continue),
            ("default", TokenKind::Default),
            ("do", TokenKind::Do),
            ("double", TokenKind::Double),
            ("else", TokenKind::Else),
            ("enum", TokenKind::Enum),
            ("extern", TokenKind::Extern),
            ("float", TokenKind::Float),
            ("for", TokenKind::For),
            ("goto", TokenKind::Goto),
            ("if", TokenKind::If),
            ("int", TokenKind::Int),
            ("long", TokenKind::Long),
            ("register", TokenKind::Register),
            ("return", TokenKind::Return),
            ("short", TokenKind::Short),
            ("signed", TokenKind::Signed),
            ("sizeof", TokenKind::Sizeof),
            ("static", TokenKind::Static),
            ("struct", TokenKind::Struct),
            ("switch", TokenKind::Switch),
            ("typedef", TokenKind::Typedef),
            ("union", TokenKind::Union),
            ("unsigned", TokenKind::Unsigned),
            ("void", TokenKind::Void),
            ("volatile", TokenKind::Volatile),
            ("while", TokenKind::While),
        ]);

        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current_char()?;
        self.position += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Skip whitespace and comments; they produce no tokens
    fn skip_trivia(&mut self) -> Result<(), CompilerError> {
        loop {
            match self.current_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char(1) == Some('/') => {
                    while let Some(ch) = self.current_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char(1) == Some('*') => {
                    let start = self.location();
                    self.advance();
                    self.advance();
                    loop {
                        match self.current_char() {
                            Some('*') if self.peek_char(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                            None => {
                                return Err(CompilerError::lex("unterminated comment", start));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        match self.keywords.get(name.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier(name),
        }
    }

    /// Scan a decimal, hexadecimal or octal integer constant.
    /// Standard suffixes (u, U, l, L) are accepted and discarded.
    fn scan_integer(&mut self) -> Result<TokenKind, CompilerError> {
        let start = self.location();
        let mut digits = String::new();
        let radix = if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('x' | 'X')) {
            self.advance();
            self.advance();
            16
        } else if self.current_char() == Some('0') && matches!(self.peek_char(1), Some('0'..='7')) {
            self.advance();
            8
        } else {
            10
        };

        while let Some(ch) = self.current_char() {
            if ch.is_digit(radix) {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        while matches!(self.current_char(), Some('u' | 'U' | 'l' | 'L')) {
            self.advance();
        }

        let value = i64::from_str_radix(&digits, radix)
            .map_err(|_| CompilerError::lex(format!("invalid integer constant '{digits}'"), start))?;
        Ok(TokenKind::IntConstant(value))
    }

    fn scan_escape(&mut self, start: SourceLocation) -> Result<char, CompilerError> {
        match self.advance() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('r') => Ok('\r'),
            Some('0') => Ok('\0'),
            Some('\\') => Ok('\\'),
            Some('\'') => Ok('\''),
            Some('"') => Ok('"'),
            Some(ch) => Err(CompilerError::lex(
                format!("unknown escape sequence '\\{ch}'"),
                start,
            )),
            None => Err(CompilerError::lex("unterminated escape sequence", start)),
        }
    }

    /// A character literal is an integer constant in C
    fn scan_char_literal(&mut self) -> Result<TokenKind, CompilerError> {
        let start = self.location();
        self.advance();
        let value = match self.current_char() {
            Some('\\') => {
                self.advance();
                self.scan_escape(start)?
            }
            Some('\'') | None => {
                return Err(CompilerError::lex("empty character constant", start));
            }
            Some(ch) => {
                self.advance();
                ch
            }
        };
        if self.advance() != Some('\'') {
            return Err(CompilerError::lex("unterminated character constant", start));
        }
        Ok(TokenKind::IntConstant(value as i64))
    }

    fn scan_string_literal(&mut self) -> Result<TokenKind, CompilerError> {
        let start = self.location();
        self.advance();
        let mut value = String::new();
        loop {
            match self.current_char() {
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::StringLiteral(value));
                }
                Some('\\') => {
                    self.advance();
                    value.push(self.scan_escape(start)?);
                }
                Some('\n') | None => {
                    return Err(CompilerError::lex("unterminated string literal", start));
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    /// Scan the next token
    pub fn next_token(&mut self) -> Result<Token, CompilerError> {
        self.skip_trivia()?;
        let location = self.location();

        let kind = match self.current_char() {
            None => TokenKind::EndOfFile,

            Some(ch) if ch.is_alphabetic() || ch == '_' => self.scan_identifier(),
            Some(ch) if ch.is_ascii_digit() => self.scan_integer()?,
            Some('\'') => self.scan_char_literal()?,
            Some('"') => self.scan_string_literal()?,

            Some('+') => {
                self.advance();
                match self.current_char() {
                    Some('+') => { self.advance(); TokenKind::PlusPlus }
                    Some('=') => { self.advance(); TokenKind::PlusEqual }
                    _ => TokenKind::Plus,
                }
            }
            Some('-') => {
                self.advance();
                match self.current_char() {
                    Some('-') => { self.advance(); TokenKind::MinusMinus }
                    Some('=') => { self.advance(); TokenKind::MinusEqual }
                    Some('>') => { self.advance(); TokenKind::Arrow }
                    _ => TokenKind::Minus,
                }
            }
            Some('*') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            Some('/') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            Some('%') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            Some('&') => {
                self.advance();
                match self.current_char() {
                    Some('&') => { self.advance(); TokenKind::AmpersandAmpersand }
                    Some('=') => { self.advance(); TokenKind::AmpersandEqual }
                    _ => TokenKind::Ampersand,
                }
            }
            Some('|') => {
                self.advance();
                match self.current_char() {
                    Some('|') => { self.advance(); TokenKind::PipePipe }
                    Some('=') => { self.advance(); TokenKind::PipeEqual }
                    _ => TokenKind::Pipe,
                }
            }
            Some('^') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::CaretEqual
                } else {
                    TokenKind::Caret
                }
            }
            Some('~') => { self.advance(); TokenKind::Tilde }
            Some('!') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                }
            }
            Some('=') => {
                self.advance();
                if self.current_char() == Some('=') {
                    self.advance();
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                }
            }
            Some('<') => {
                self.advance();
                match self.current_char() {
                    Some('<') => { self.advance(); TokenKind::LeftShift }
                    Some('=') => { self.advance(); TokenKind::LessEqual }
                    _ => TokenKind::Less,
                }
            }
            Some('>') => {
                self.advance();
                match self.current_char() {
                    Some('>') => { self.advance(); TokenKind::RightShift }
                    Some('=') => { self.advance(); TokenKind::GreaterEqual }
                    _ => TokenKind::Greater,
                }
            }
            Some('.') => {
                self.advance();
                if self.current_char() == Some('.') && self.peek_char(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Dot
                }
            }

            Some('?') => { self.advance(); TokenKind::Question }
            Some(':') => { self.advance(); TokenKind::Colon }
            Some('(') => { self.advance(); TokenKind::LeftParen }
            Some(')') => { self.advance(); TokenKind::RightParen }
            Some('{') => { self.advance(); TokenKind::LeftBrace }
            Some('}') => { self.advance(); TokenKind::RightBrace }
            Some('[') => { self.advance(); TokenKind::LeftBracket }
            Some(']') => { self.advance(); TokenKind::RightBracket }
            Some(';') => { self.advance(); TokenKind::Semicolon }
            Some(',') => { self.advance(); TokenKind::Comma }

            Some(ch) => {
                return Err(CompilerError::lex(
                    format!("unexpected character '{ch}'"),
                    location,
                ));
            }
        };

        Ok(Token::new(kind, location))
    }

    /// Tokenize the entire input, ending with an `EndOfFile` token
    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompilerError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = matches!(token.kind, TokenKind::EndOfFile);
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        let tokens = kinds("int main while forever");
        assert_eq!(tokens[0], TokenKind::Int);
        assert_eq!(tokens[1], TokenKind::Identifier("main".into()));
        assert_eq!(tokens[2], TokenKind::While);
        assert_eq!(tokens[3], TokenKind::Identifier("forever".into()));
        assert_eq!(tokens[4], TokenKind::EndOfFile);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("+ ++ += -> << <= ... . &&");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Plus,
                TokenKind::PlusPlus,
                TokenKind::PlusEqual,
                TokenKind::Arrow,
                TokenKind::LeftShift,
                TokenKind::LessEqual,
                TokenKind::Ellipsis,
                TokenKind::Dot,
                TokenKind::AmpersandAmpersand,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_integer_constants() {
        let tokens = kinds("42 0x2a 052 0 10L");
        assert_eq!(tokens[0], TokenKind::IntConstant(42));
        assert_eq!(tokens[1], TokenKind::IntConstant(42));
        assert_eq!(tokens[2], TokenKind::IntConstant(42));
        assert_eq!(tokens[3], TokenKind::IntConstant(0));
        assert_eq!(tokens[4], TokenKind::IntConstant(10));
    }

    #[test]
    fn test_char_literals_are_integers() {
        let tokens = kinds(r"'a' '\n' '\0'");
        assert_eq!(tokens[0], TokenKind::IntConstant('a' as i64));
        assert_eq!(tokens[1], TokenKind::IntConstant('\n' as i64));
        assert_eq!(tokens[2], TokenKind::IntConstant(0));
    }

    #[test]
    fn test_string_escapes() {
        let tokens = kinds(r#""hello\nworld""#);
        assert_eq!(tokens[0], TokenKind::StringLiteral("hello\nworld".into()));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("a // comment\n /* block\n comment */ b");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], TokenKind::Identifier("a".into()));
        assert_eq!(tokens[1], TokenKind::Identifier("b".into()));
    }

    #[test]
    fn test_locations() {
        let tokens = Lexer::new("int\n  x;").tokenize().unwrap();
        assert_eq!(tokens[0].location, SourceLocation::new(1, 1));
        assert_eq!(tokens[1].location, SourceLocation::new(2, 3));
        assert_eq!(tokens[2].location, SourceLocation::new(2, 4));
    }

    #[test]
    fn test_unterminated_string() {
        let result = Lexer::new("\"abc").tokenize();
        assert!(matches!(result, Err(CompilerError::Lex { .. })));
    }
}

use std::fmt;

use crate::error::{Error, Result};

/// Reserved words, matched case-insensitively and stored uppercased.
pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "INSERT", "INTO", "VALUES", "UPDATE", "SET", "DELETE", "CREATE",
    "DROP", "TABLE", "PRIMARY", "KEY", "INTEGER", "TEXT", "BOOLEAN", "TRUE", "FALSE", "AND", "OR",
    "INNER", "JOIN", "ON",
];

/// The class of a [Token].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A reserved word; the token text is the uppercased keyword.
    Keyword,
    /// A table or column name, kept in its original case.
    Identifier,
    /// An unsigned run of decimal digits.
    Number,
    /// The contents of a quoted literal, without the quotes.
    String,
    /// One of `=`, `!=`, `<`, `>`, `<=`, `>=`.
    Operator,
    Comma,
    LeftParen,
    RightParen,
    Semicolon,
    Asterisk,
    Dot,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Keyword => "KEYWORD",
            Self::Identifier => "IDENTIFIER",
            Self::Number => "NUMBER",
            Self::String => "STRING",
            Self::Operator => "OPERATOR",
            Self::Comma => "COMMA",
            Self::LeftParen => "LPAREN",
            Self::RightParen => "RPAREN",
            Self::Semicolon => "SEMICOLON",
            Self::Asterisk => "ASTERISK",
            Self::Dot => "DOT",
        };
        f.write_str(name)
    }
}

/// Represents the smallest meaningful unit (atom) of the SQL language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.kind, self.text)
    }
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens.
    ///
    /// # Errors
    /// Returns [Error::Syntax] if an unsupported character is encountered or
    /// a literal is malformed. No partial token list is returned.
    ///
    /// # Example
    /// ```
    /// # use minidb::tokenizer::{Tokenizer, TokenKind};
    /// let tokens = Tokenizer::new("SELECT *").tokenize().unwrap();
    /// assert_eq!(tokens[0].kind, TokenKind::Keyword);
    /// assert_eq!(tokens[0].text, "SELECT");
    /// ```
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> Result<Token> {
        let ch = self.current_char();

        match ch {
            '\'' | '"' => self.read_string(ch),
            c if c.is_ascii_digit() => self.read_number(),
            '!' | '<' | '>' | '=' => self.read_operator(),
            ',' => Ok(self.single(TokenKind::Comma)),
            '(' => Ok(self.single(TokenKind::LeftParen)),
            ')' => Ok(self.single(TokenKind::RightParen)),
            ';' => Ok(self.single(TokenKind::Semicolon)),
            '*' => Ok(self.single(TokenKind::Asterisk)),
            '.' => Ok(self.single(TokenKind::Dot)),
            c if c.is_ascii_alphabetic() || c == '_' => Ok(self.read_identifier()),
            _ => Err(Error::syntax(format!("unexpected character: {ch:?}"))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    /// Consumes the current character as a one-character token of `kind`.
    fn single(&mut self, kind: TokenKind) -> Token {
        let token = Token::new(kind, self.current_char());
        self.advance();
        token
    }

    // --- Extraction Logic ---

    /// Reads `[A-Za-z_][A-Za-z0-9_]*` and determines if it's a reserved SQL
    /// keyword or a user-defined identifier.
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_ascii_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        let upper = ident.to_ascii_uppercase();
        if KEYWORDS.contains(&upper.as_str()) {
            Token::new(TokenKind::Keyword, upper)
        } else {
            Token::new(TokenKind::Identifier, ident)
        }
    }

    /// Reads an unsigned integer literal. There is no sign and no decimal point.
    fn read_number(&mut self) -> Result<Token> {
        let mut number = String::new();

        while !self.is_at_end() && self.current_char().is_ascii_digit() {
            number.push(self.current_char());
            self.advance();
        }

        // Reject literals that do not fit the integer column type here rather
        // than in the parser.
        number
            .parse::<i64>()
            .map_err(|e| Error::syntax(format!("invalid integer literal {number}: {e}")))?;

        Ok(Token::new(TokenKind::Number, number))
    }

    /// Reads a comparison operator; two-character forms win over one-character ones.
    fn read_operator(&mut self) -> Result<Token> {
        let first = self.current_char();
        let two_char = match (first, self.peek_char()) {
            ('!', Some('=')) => Some("!="),
            ('<', Some('=')) => Some("<="),
            ('>', Some('=')) => Some(">="),
            _ => None,
        };

        if let Some(op) = two_char {
            self.advance();
            self.advance();
            return Ok(Token::new(TokenKind::Operator, op));
        }

        match first {
            '=' | '<' | '>' => Ok(self.single(TokenKind::Operator)),
            _ => Err(Error::syntax(format!("unexpected character: {first:?}"))),
        }
    }

    /// Reads a literal enclosed in `quote`. Escape sequences are not supported.
    fn read_string(&mut self, quote: char) -> Result<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        while !self.is_at_end() && self.current_char() != quote {
            string.push(self.current_char());
            self.advance();
        }

        if self.is_at_end() {
            return Err(Error::syntax("unterminated string literal"));
        }

        // Skip the closing quote
        self.advance();

        Ok(Token::new(TokenKind::String, string))
    }
}

/// Tokenizes `input` in one pass.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).tokenize()
}

use crate::lexer::tokens::{make_identifier_type, Token, TokenType};

// Submodules
pub mod tokens;

/// Struct that represents the scanner.
pub struct Lexer {
    /// A flat list of characters from the source.
    source: Vec<char>,
    /// The position in the flat source vector of the first
    /// character for the current token.
    token_start: usize,
    /// The index of the current character.
    current: usize,
    /// The current line number.
    line_num: usize,
}

impl Lexer {
    /// Creates a lexer over the given source string.
    ///
    /// ## Arguments
    /// * `src` – The source text to be tokenized.
    pub fn new(src: &str) -> Lexer {
        Self {
            source: src.chars().collect(),
            token_start: 0,
            current: 0,
            line_num: 1,
        }
    }

    /// Scans the next token out of the source. Once the source is
    /// exhausted, every subsequent call yields an `EOF` token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        self.token_start = self.current;

        if self.is_at_end() {
            return self.make_token(TokenType::EOF);
        }

        let c = self.advance();

        if c.is_ascii_alphabetic() || c == '_' {
            return self.make_identifier_token();
        }

        if c.is_ascii_digit() {
            return self.make_number_token();
        }

        match c {
            '(' => self.make_token(TokenType::L_PAREN),
            ')' => self.make_token(TokenType::R_PAREN),
            '{' => self.make_token(TokenType::L_CURLY),
            '}' => self.make_token(TokenType::R_CURLY),
            ';' => self.make_token(TokenType::SEMICOLON),
            ',' => self.make_token(TokenType::COMMA),
            '.' => self.make_token(TokenType::DOT),
            '-' => self.make_token(TokenType::MINUS),
            '+' => self.make_token(TokenType::PLUS),
            '/' => self.make_token(TokenType::SLASH),
            '*' => self.make_token(TokenType::STAR),
            '!' => {
                if self.matches('=') {
                    self.make_token(TokenType::LOGIC_NOT_EQ)
                } else {
                    self.make_token(TokenType::LOGIC_NOT)
                }
            }
            '=' => {
                if self.matches('=') {
                    self.make_token(TokenType::LOGIC_EQ)
                } else {
                    self.make_token(TokenType::EQUALS)
                }
            }
            '<' => {
                if self.matches('=') {
                    self.make_token(TokenType::LESS_THAN_EQ)
                } else {
                    self.make_token(TokenType::LESS_THAN)
                }
            }
            '>' => {
                if self.matches('=') {
                    self.make_token(TokenType::GREATER_THAN_EQ)
                } else {
                    self.make_token(TokenType::GREATER_THAN)
                }
            }
            '"' => self.make_string_token(),
            _ => self.make_error_token("Unexpected character."),
        }
    }

    /// Gets the current character without consuming it.
    fn get_current(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }

        self.source[self.current]
    }

    /// Returns the next character without consuming it.
    fn get_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            return '\0';
        }

        self.source[self.current + 1]
    }

    /// Checks if the scanner is at the end of the source.
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Matches the current character against a provided character,
    /// consuming it on a match.
    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.get_current() != expected {
            return false;
        }

        self.current += 1;
        true
    }

    /// Advances to the next char and returns the consumed char.
    fn advance(&mut self) -> char {
        let current = self.get_current();
        self.current += 1;
        current
    }

    /// Skips whitespace-like characters and single-line comments
    /// from the source code.
    fn skip_whitespace(&mut self) {
        loop {
            if self.is_at_end() {
                break;
            }

            let c = self.get_current();

            if c == ' ' || c == '\r' || c == '\t' {
                self.advance();
            } else if c == '\n' {
                self.line_num += 1;
                self.advance();
            } else if c == '/' && self.get_next() == '/' {
                // A comment goes until the end of the line.
                while !self.is_at_end() && self.get_current() != '\n' {
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    /// Generates an identifier (or keyword) token with the current
    /// state of the scanner.
    fn make_identifier_token(&mut self) -> Token {
        while !self.is_at_end() {
            let c = self.get_current();

            if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let id: String = self.source[self.token_start..self.current].iter().collect();
        self.make_token(make_identifier_type(id.as_str()))
    }

    /// Generates a number token. Lox numbers are base-10 doubles with
    /// an optional fractional part. There is no leading sign, no leading
    /// dot, and no exponent notation.
    fn make_number_token(&mut self) -> Token {
        while self.get_current().is_ascii_digit() {
            self.advance();
        }

        // Look for a fractional part.
        if self.get_current() == '.' && self.get_next().is_ascii_digit() {
            // Consume the '.'
            self.advance();

            while self.get_current().is_ascii_digit() {
                self.advance();
            }
        }

        self.make_token(TokenType::NUMBER)
    }

    /// Generates a string token. The lexeme keeps the surrounding
    /// quotes; the compiler strips them. There is no escape-sequence
    /// processing, and strings may span lines.
    fn make_string_token(&mut self) -> Token {
        while !self.is_at_end() && self.get_current() != '"' {
            if self.get_current() == '\n' {
                self.line_num += 1;
            }

            self.advance();
        }

        if self.is_at_end() {
            return self.make_error_token("Unterminated string.");
        }

        // The closing quote.
        self.advance();
        self.make_token(TokenType::STRING)
    }

    /// Generates a token with the current state of the scanner.
    fn make_token(&self, token_type: TokenType) -> Token {
        let lexeme = match token_type {
            TokenType::EOF => String::from(""),
            _ => self.source[self.token_start..self.current].iter().collect(),
        };

        Token {
            line_num: self.line_num,
            token_type,
            lexeme,
        }
    }

    /// Generates an error token with the provided message as its lexeme.
    ///
    /// ## Arguments
    /// * `message` – A message for the error token. This will be used
    /// as the token's lexeme.
    fn make_error_token(&self, message: &str) -> Token {
        Token {
            line_num: self.line_num,
            token_type: TokenType::ERROR,
            lexeme: String::from(message),
        }
    }
}

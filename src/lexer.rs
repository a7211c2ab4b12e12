use crate::token::{Token, TokenKind};

pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if let Some(c) = ch {
            self.pos += 1;
            match c {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                // A lone CR is a line break; CRLF is counted once, at the LF.
                '\r' if self.peek(0) != Some('\n') => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch == ' ' || ch == '\t' || ch == '\r' || ch == '\n' {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Skip a `// ...` or `/* ... */` comment; the caller has already seen
    /// the opening two characters.
    fn skip_comment(&mut self) {
        if self.peek(1) == Some('/') {
            while let Some(ch) = self.current() {
                if ch == '\n' {
                    break;
                }
                self.advance();
            }
        } else {
            self.advance();
            self.advance();
            while self.current().is_some() {
                if self.current() == Some('*') && self.peek(1) == Some('/') {
                    self.advance();
                    self.advance();
                    break;
                }
                self.advance();
            }
        }
    }

    /// Read a double-quoted string literal. Escape sequences are stored
    /// verbatim (backslash included); the parser resolves them.
    fn read_string(&mut self) -> Result<String, String> {
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // consume opening quote
        let mut value = String::new();

        while let Some(ch) = self.current() {
            if ch == '"' {
                self.advance(); // consume closing quote
                return Ok(value);
            } else if ch == '\\' {
                value.push(ch);
                self.advance();
                if let Some(escaped) = self.current() {
                    value.push(escaped);
                    self.advance();
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Err(format!(
            "Unterminated string starting at line {}, column {}",
            start_line, start_column
        ))
    }

    fn read_number(&mut self) -> Result<TokenKind, String> {
        let line = self.line;
        let column = self.column;
        let mut value = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else if ch == '.' && !is_float {
                // Only a digit after the dot makes this a float; otherwise
                // the dot is the concat operator ("1 . 2" vs "1.2").
                match self.peek(1) {
                    Some(next) if next.is_ascii_digit() => {
                        is_float = true;
                        value.push(ch);
                        self.advance();
                    }
                    _ => break,
                }
            } else {
                break;
            }
        }

        if is_float {
            value
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| format!("Invalid float literal at line {}, column {}", line, column))
        } else {
            value.parse().map(TokenKind::Integer).map_err(|_| {
                format!(
                    "Integer literal out of range at line {}, column {}",
                    line, column
                )
            })
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut value = String::new();
        while let Some(ch) = self.current() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        value
    }

    fn keyword_or_identifier(ident: String) -> TokenKind {
        match ident.as_str() {
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "foreach" => TokenKind::Foreach,
            "function" => TokenKind::Function,
            "return" => TokenKind::Return,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "var" => TokenKind::Var,
            "const" => TokenKind::Const,
            "echo" => TokenKind::Echo,
            "print" => TokenKind::Print,
            "sleep_ms" => TokenKind::SleepMs,
            "millis" => TokenKind::Millis,
            _ => TokenKind::Identifier(ident),
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();

            if self.current() == Some('/') && (self.peek(1) == Some('/') || self.peek(1) == Some('*')) {
                self.skip_comment();
                continue;
            }

            let ch = match self.current() {
                Some(ch) => ch,
                None => break,
            };

            let line = self.line;
            let column = self.column;

            let token_kind = match ch {
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                '(' => {
                    self.advance();
                    TokenKind::LeftParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RightParen
                }
                '{' => {
                    self.advance();
                    TokenKind::LeftBrace
                }
                '}' => {
                    self.advance();
                    TokenKind::RightBrace
                }
                '[' => {
                    self.advance();
                    TokenKind::LeftBracket
                }
                ']' => {
                    self.advance();
                    TokenKind::RightBracket
                }
                '?' => {
                    self.advance();
                    TokenKind::QuestionMark
                }
                ':' => {
                    self.advance();
                    TokenKind::Colon
                }
                '.' => {
                    self.advance();
                    TokenKind::Dot
                }

                '+' => {
                    self.advance();
                    if self.current() == Some('+') {
                        self.advance();
                        TokenKind::Increment
                    } else if self.current() == Some('=') {
                        self.advance();
                        TokenKind::PlusAssign
                    } else {
                        TokenKind::Plus
                    }
                }
                '-' => {
                    self.advance();
                    if self.current() == Some('-') {
                        self.advance();
                        TokenKind::Decrement
                    } else if self.current() == Some('=') {
                        self.advance();
                        TokenKind::MinusAssign
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::MulAssign
                    } else {
                        TokenKind::Mul
                    }
                }
                '/' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::DivAssign
                    } else {
                        TokenKind::Div
                    }
                }
                '%' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::ModAssign
                    } else {
                        TokenKind::Mod
                    }
                }
                '=' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::Equal
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::NotEqual
                    } else {
                        TokenKind::Not
                    }
                }
                '<' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::LessEqual
                    } else {
                        TokenKind::LessThan
                    }
                }
                '>' => {
                    self.advance();
                    if self.current() == Some('=') {
                        self.advance();
                        TokenKind::GreaterEqual
                    } else {
                        TokenKind::GreaterThan
                    }
                }
                '&' => {
                    self.advance();
                    if self.current() == Some('&') {
                        self.advance();
                        TokenKind::And
                    } else {
                        return Err(format!(
                            "Unexpected character '&' at line {}, column {}",
                            line, column
                        ));
                    }
                }
                '|' => {
                    self.advance();
                    if self.current() == Some('|') {
                        self.advance();
                        TokenKind::Or
                    } else {
                        return Err(format!(
                            "Unexpected character '|' at line {}, column {}",
                            line, column
                        ));
                    }
                }

                '"' => TokenKind::String(self.read_string()?),

                _ if ch.is_ascii_digit() => self.read_number()?,

                _ if ch.is_ascii_alphabetic() || ch == '_' => {
                    Self::keyword_or_identifier(self.read_identifier())
                }

                _ => {
                    return Err(format!(
                        "Unexpected character '{}' at line {}, column {}",
                        ch, line, column
                    ))
                }
            };

            tokens.push(Token::new(token_kind, line, column));
        }

        tokens.push(Token::new(TokenKind::Eof, self.line, self.column));
        Ok(tokens)
    }
}

use crate::prelude::*;

#[derive(Debug)]
pub struct Scanner {
    source_chars: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    after_line_feed: bool,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Self { source_chars: source.chars().collect(), start: 0, current: 0, line: 1, after_line_feed: false }
    }

    /// Scans until end of input, EOF token included.
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = vec![];
        loop {
            let token = self.next_token()?;
            let done = token.token_type == TokenType::EOF;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Produces exactly one token per call. Once the input is exhausted every
    /// further call returns EOF.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let token = self.scan_token()?;
            let line_feed = token.token_type == TokenType::LineFeed;
            // A comment between blank lines must not split the LF run
            if line_feed && self.after_line_feed {
                continue;
            }
            self.after_line_feed = line_feed;
            return Ok(token);
        }
    }

    fn scan_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.start = self.current;

        if self.is_at_end() {
            return Ok(self.make_token(TokenType::EOF));
        }

        let c = self.advance();
        match c {
            '\n' => {
                self.line += 1;
                // Blank lines and indentation collapse into the same LF
                while matches!(self.peek(), '\n' | ' ' | '\t' | '\r') {
                    if self.advance() == '\n' {
                        self.line += 1;
                    }
                }
                Ok(self.make_token(TokenType::LineFeed))
            }
            '#' => Ok(self.make_token(TokenType::Hash)),
            ':' => Ok(self.make_token(TokenType::Colon)),
            ',' => Ok(self.make_token(TokenType::Comma)),
            '.' => Ok(self.make_token(TokenType::Dot)),
            '(' => Ok(self.make_token(TokenType::LeftParen)),
            ')' => Ok(self.make_token(TokenType::RightParen)),
            '{' => Ok(self.make_token(TokenType::LeftBrace)),
            '}' => Ok(self.make_token(TokenType::RightBrace)),
            '~' => Ok(self.make_token(TokenType::Tilde)),
            '+' => Ok(self.make_token(TokenType::Plus)),
            '*' => Ok(self.make_token(TokenType::Star)),
            '%' => Ok(self.make_token(TokenType::Percent)),
            '-' => {
                let token_type = if self.match_next('>') { TokenType::Arrow } else { TokenType::Minus };
                Ok(self.make_token(token_type))
            }
            '!' => {
                let token_type =
                    if self.match_next('=') { TokenType::BangEqual } else { TokenType::Bang };
                Ok(self.make_token(token_type))
            }
            '=' => {
                let token_type =
                    if self.match_next('=') { TokenType::EqualEqual } else { TokenType::Equal };
                Ok(self.make_token(token_type))
            }
            '<' => {
                let token_type =
                    if self.match_next('=') { TokenType::LessEqual } else { TokenType::Less };
                Ok(self.make_token(token_type))
            }
            '>' => {
                let token_type =
                    if self.match_next('=') { TokenType::GreaterEqual } else { TokenType::Greater };
                Ok(self.make_token(token_type))
            }
            '&' => {
                if self.match_next('&') {
                    Ok(self.make_token(TokenType::AndAnd))
                } else {
                    Err(self.illegal_content(c))
                }
            }
            '|' => {
                if self.match_next('|') {
                    Ok(self.make_token(TokenType::OrOr))
                } else {
                    Err(self.illegal_content(c))
                }
            }
            '/' => {
                if self.match_next('/') {
                    // Go until end of the commented line, the LF itself is kept
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    self.scan_token()
                } else if self.match_next('*') {
                    self.block_comment();
                    self.scan_token()
                } else {
                    Ok(self.make_token(TokenType::Slash))
                }
            }
            '"' => self.string(),
            '0'..='9' => self.number(),
            c if c.is_ascii_alphabetic() => Ok(self.identifier()),
            c => Err(self.illegal_content(c)),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), ' ' | '\t' | '\r') {
            self.advance();
        }
    }

    // An unterminated block comment swallows the rest of the input
    fn block_comment(&mut self) {
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return;
            }
            if self.advance() == '\n' {
                self.line += 1;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source_chars.len()
    }

    fn advance(&mut self) -> char {
        let c = self.peek();
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        *self.source_chars.get(self.current).unwrap_or(&'\0')
    }

    fn peek_next(&self) -> char {
        *self.source_chars.get(self.current + 1).unwrap_or(&'\0')
    }

    fn match_next(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.peek() == expected {
            self.current += 1;
            return true;
        }

        false
    }

    fn source_substring(&self, start: usize, end: usize) -> String {
        self.source_chars[start..end.min(self.source_chars.len())].iter().collect()
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        self.make_token_with_literal(token_type, None)
    }

    fn make_token_with_literal(&self, token_type: TokenType, literal: Option<Literal>) -> Token {
        let text = self.source_substring(self.start, self.current);
        Token::new(token_type, &text, literal, self.line, self.start)
    }

    fn illegal_content(&self, content: char) -> LexError {
        LexError::IllegalContent { content, line: self.line, position: self.start }
    }

    fn string(&mut self) -> Result<Token, LexError> {
        while self.peek() != '"' {
            if self.is_at_end() {
                return Err(LexError::UnexpectedEof { line: self.line, position: self.current });
            }

            // The escaped character is kept verbatim, backslash included
            if self.advance() == '\\' && !self.is_at_end() {
                self.advance();
            }
            if self.source_chars[self.current - 1] == '\n' {
                self.line += 1;
            }
        }

        // The closing "
        self.advance();

        // Skip the quote marks
        let text = self.source_substring(self.start + 1, self.current - 1);
        Ok(self.make_token_with_literal(TokenType::StringLiteral, Some(Literal::String(text))))
    }

    fn number(&mut self) -> Result<Token, LexError> {
        let mut is_real = false;
        loop {
            let c = self.peek();
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !is_real {
                is_real = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = self.source_substring(self.start, self.current);
        let literal = if is_real {
            text.parse::<f64>().ok().map(Literal::Real)
        } else {
            text.parse::<i64>().ok().map(Literal::Integer)
        };

        match literal {
            Some(literal) => {
                let token_type = if is_real { TokenType::Real } else { TokenType::Integer };
                Ok(self.make_token_with_literal(token_type, Some(literal)))
            }
            None => Err(LexError::UnknownError { line: self.line, position: self.start }),
        }
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_ascii_alphanumeric() {
            self.advance();
        }

        let text = self.source_substring(self.start, self.current);
        match text.as_str() {
            "true" => self.make_token_with_literal(TokenType::Boolean, Some(Literal::Boolean(true))),
            "false" => {
                self.make_token_with_literal(TokenType::Boolean, Some(Literal::Boolean(false)))
            }
            _ => self.make_token(get_keyword(&text).unwrap_or(TokenType::Identifier)),
        }
    }
}

fn get_keyword(text: &str) -> Option<TokenType> {
    match text {
        "import" => Some(TokenType::Import),
        "if" => Some(TokenType::If),
        "else" => Some(TokenType::Else),
        "for" => Some(TokenType::For),
        "in" => Some(TokenType::In),
        "to" => Some(TokenType::To),
        "step" => Some(TokenType::Step),
        "while" => Some(TokenType::While),
        "break" => Some(TokenType::Break),
        "continue" => Some(TokenType::Continue),
        "func" => Some(TokenType::Func),
        "return" => Some(TokenType::Return),
        "var" => Some(TokenType::Var),
        "const" => Some(TokenType::Const),
        "class" => Some(TokenType::Class),
        "static" => Some(TokenType::Static),
        "super" => Some(TokenType::Super),
        "nil" => Some(TokenType::Nil),
        _ => None,
    }
}

use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Number(f64),
    Str(String),
    /// `<...>` prim or property path.
    PathRef(String),
    /// `@...@` asset path.
    AssetRef(String),
    Punct(char),
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

const PUNCTUATION: &[char] = &['{', '}', '(', ')', '[', ']', '=', ',', ':', ';'];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, SyntaxError> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<Spanned>,
}

impl Lexer<'_> {
    fn run(&mut self) -> Result<(), SyntaxError> {
        while let Some(&ch) = self.chars.peek() {
            match ch {
                '\n' => {
                    self.chars.next();
                    self.push(Token::Newline);
                    self.line += 1;
                }
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '#' => self.skip_comment(),
                '"' | '\'' => {
                    let start = self.line;
                    let text = self.string(ch)?;
                    self.push_at(Token::Str(text), start);
                }
                '<' => {
                    self.chars.next();
                    let text = self.delimited('>', "path reference")?;
                    self.push(Token::PathRef(text));
                }
                '@' => {
                    self.chars.next();
                    let text = self.delimited('@', "asset reference")?;
                    self.push(Token::AssetRef(text));
                }
                c if PUNCTUATION.contains(&c) => {
                    self.chars.next();
                    self.push(Token::Punct(c));
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                    let value = self.number()?;
                    self.push(Token::Number(value));
                }
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.ident();
                    let token = match ident.as_str() {
                        "inf" => Token::Number(f64::INFINITY),
                        "nan" => Token::Number(f64::NAN),
                        _ => Token::Ident(ident),
                    };
                    self.push(token);
                }
                other => {
                    return Err(SyntaxError::new(
                        self.line,
                        format!("unexpected character '{other}'"),
                    ))
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, token: Token) {
        self.push_at(token, self.line);
    }

    fn push_at(&mut self, token: Token, line: usize) {
        self.tokens.push(Spanned { token, line });
    }

    fn skip_comment(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || matches!(ch, '_' | ':' | '.') {
                ident.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        ident
    }

    fn number(&mut self) -> Result<f64, SyntaxError> {
        let mut text = String::new();
        if let Some(&sign) = self.chars.peek().filter(|c| matches!(c, '-' | '+')) {
            text.push(sign);
            self.chars.next();
            if self.chars.peek().is_some_and(|c| c.is_alphabetic()) {
                let word = self.ident();
                return match word.as_str() {
                    "inf" if sign == '-' => Ok(f64::NEG_INFINITY),
                    "inf" => Ok(f64::INFINITY),
                    "nan" => Ok(f64::NAN),
                    _ => Err(SyntaxError::new(
                        self.line,
                        format!("invalid number '{sign}{word}'"),
                    )),
                };
            }
        }
        while let Some(&ch) = self.chars.peek() {
            let exponent_sign = matches!(ch, '-' | '+') && text.ends_with(['e', 'E']);
            if ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E') || exponent_sign {
                text.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        text.parse::<f64>()
            .map_err(|_| SyntaxError::new(self.line, format!("invalid number '{text}'")))
    }

    fn string(&mut self, quote: char) -> Result<String, SyntaxError> {
        self.chars.next();
        let triple = self.chars.peek() == Some(&quote) && {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            lookahead.peek() == Some(&quote)
        };
        if triple {
            self.chars.next();
            self.chars.next();
        } else if self.chars.peek() == Some(&quote) {
            self.chars.next();
            return Ok(String::new());
        }

        let start = self.line;
        let mut text = String::new();
        loop {
            let Some(ch) = self.chars.next() else {
                return Err(SyntaxError::new(start, "unterminated string"));
            };
            match ch {
                '\\' => {
                    if let Some(escaped) = self.chars.next() {
                        if escaped == '\n' {
                            self.line += 1;
                        }
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                }
                '\n' if !triple => {
                    return Err(SyntaxError::new(start, "newline in single-line string"));
                }
                '\n' => {
                    self.line += 1;
                    text.push(ch);
                }
                c if c == quote && !triple => return Ok(text),
                c if c == quote && self.closes_triple(quote) => return Ok(text),
                c => text.push(c),
            }
        }
    }

    /// Consumes the remaining two quotes of a triple-quote terminator.
    fn closes_triple(&mut self, quote: char) -> bool {
        let mut lookahead = self.chars.clone();
        if lookahead.next() == Some(quote) && lookahead.next() == Some(quote) {
            self.chars.next();
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn delimited(&mut self, close: char, what: &str) -> Result<String, SyntaxError> {
        let start = self.line;
        let mut text = String::new();
        for ch in self.chars.by_ref() {
            if ch == close {
                return Ok(text);
            }
            if ch == '\n' {
                break;
            }
            text.push(ch);
        }
        Err(SyntaxError::new(start, format!("unterminated {what}")))
    }
}

use super::lexer::{Spanned, SyntaxError, Token};

const TIME_SAMPLES_SUFFIX: &str = ".timeSamples";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SampleValue {
    None,
    Scalar(f64),
    Tuple(Vec<f64>),
    /// Strings, arrays, nested tuples and anything else not needed here.
    Other,
}

/// Callbacks fired while walking a layer. Prim paths are absolute
/// (`/world/players`).
pub(crate) trait SceneVisitor {
    type Error: From<SyntaxError>;

    fn open_prim(&mut self, path: &str) -> Result<(), Self::Error>;

    fn time_samples(
        &mut self,
        prim_path: &str,
        attribute: &str,
        samples: Vec<(f64, SampleValue)>,
    ) -> Result<(), Self::Error>;

    /// A plain `type name = value` assignment. Values the walker does not
    /// model arrive as [`SampleValue::Other`].
    fn default_value(
        &mut self,
        prim_path: &str,
        attribute: &str,
        value: SampleValue,
    ) -> Result<(), Self::Error>;

    fn close_prim(&mut self, path: &str) -> Result<(), Self::Error>;
}

pub(crate) fn walk_layer<V: SceneVisitor>(
    tokens: &[Spanned],
    visitor: &mut V,
) -> Result<(), V::Error> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.skip_newlines();
    if parser.peek_punct('(') {
        parser.skip_balanced()?;
    }
    parser.statements("", visitor)?;
    match parser.peek() {
        None => Ok(()),
        Some(spanned) => {
            Err(SyntaxError::new(spanned.line, "unexpected '}' at layer level").into())
        }
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Spanned> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self, ch: char) -> bool {
        matches!(self.peek(), Some(Spanned { token: Token::Punct(c), .. }) if *c == ch)
    }

    fn next(&mut self) -> Option<&'a Spanned> {
        let spanned = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(spanned)
    }

    fn current_line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|spanned| spanned.line)
            .unwrap_or(1)
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Some(Spanned { token: Token::Newline, .. })) {
            self.pos += 1;
        }
    }

    fn expect_punct(&mut self, ch: char) -> Result<(), SyntaxError> {
        match self.next() {
            Some(Spanned {
                token: Token::Punct(c),
                ..
            }) if *c == ch => Ok(()),
            Some(spanned) => Err(SyntaxError::new(
                spanned.line,
                format!("expected '{ch}', found {:?}", spanned.token),
            )),
            None => Err(SyntaxError::new(
                self.current_line(),
                format!("expected '{ch}', found end of file"),
            )),
        }
    }

    /// Consumes an opening bracket and everything up to its matching close.
    fn skip_balanced(&mut self) -> Result<(), SyntaxError> {
        let start = self.current_line();
        let mut stack = Vec::<char>::new();
        while let Some(spanned) = self.next() {
            if let Token::Punct(c) = spanned.token {
                match c {
                    '(' => stack.push(')'),
                    '[' => stack.push(']'),
                    '{' => stack.push('}'),
                    ')' | ']' | '}' => {
                        if stack.pop() != Some(c) {
                            return Err(SyntaxError::new(
                                spanned.line,
                                format!("unbalanced '{c}'"),
                            ));
                        }
                    }
                    _ => {}
                }
            }
            if stack.is_empty() {
                return Ok(());
            }
        }
        Err(SyntaxError::new(start, "unclosed bracket"))
    }

    /// Parses statements until a closing `}` (left unconsumed) or end of input.
    fn statements<V: SceneVisitor>(
        &mut self,
        prim_path: &str,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        loop {
            let Some(spanned) = self.peek() else {
                return Ok(());
            };
            match &spanned.token {
                Token::Newline | Token::Punct(';') => self.pos += 1,
                Token::Punct('}') => return Ok(()),
                Token::Ident(word) if matches!(word.as_str(), "def" | "over" | "class") => {
                    self.prim(prim_path, visitor)?;
                }
                Token::Ident(word) if word == "variantSet" => self.skip_variant_set()?,
                _ => self.property(prim_path, visitor)?,
            }
        }
    }

    fn prim<V: SceneVisitor>(&mut self, parent: &str, visitor: &mut V) -> Result<(), V::Error> {
        let keyword_line = self.current_line();
        self.pos += 1;
        if matches!(self.peek(), Some(Spanned { token: Token::Ident(_), .. })) {
            self.pos += 1;
        }
        let name = match self.next() {
            Some(Spanned {
                token: Token::Str(name),
                ..
            }) => name.clone(),
            _ => {
                return Err(SyntaxError::new(keyword_line, "prim declaration without a name").into())
            }
        };
        let path = format!("{parent}/{name}");

        self.skip_newlines();
        if self.peek_punct('(') {
            self.skip_balanced()?;
            self.skip_newlines();
        }
        self.expect_punct('{')?;
        visitor.open_prim(&path)?;
        self.statements(&path, visitor)?;
        if self.peek().is_none() {
            let message = format!("prim {path} is never closed");
            return Err(SyntaxError::new(keyword_line, message).into());
        }
        self.expect_punct('}')?;
        visitor.close_prim(&path)
    }

    fn skip_variant_set(&mut self) -> Result<(), SyntaxError> {
        while let Some(spanned) = self.peek() {
            if matches!(spanned.token, Token::Punct('{')) {
                return self.skip_balanced();
            }
            self.pos += 1;
        }
        Err(SyntaxError::new(self.current_line(), "variantSet without a body"))
    }

    /// One property or metadata statement, up to the newline that ends it.
    fn property<V: SceneVisitor>(
        &mut self,
        prim_path: &str,
        visitor: &mut V,
    ) -> Result<(), V::Error> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(spanned) = self.peek() {
            match spanned.token {
                Token::Punct('(' | '[' | '{') => depth += 1,
                Token::Punct(')' | ']') => depth = depth.saturating_sub(1),
                Token::Punct('}') if depth == 0 => break,
                Token::Punct('}') => depth -= 1,
                Token::Newline if depth == 0 => break,
                _ => {}
            }
            self.pos += 1;
        }
        let statement = &self.tokens[start..self.pos];

        let Some(eq) = statement
            .iter()
            .position(|spanned| spanned.token == Token::Punct('='))
        else {
            return Ok(());
        };
        let name = statement[..eq].iter().rev().find_map(|spanned| match &spanned.token {
            Token::Ident(ident) => Some(ident.as_str()),
            _ => None,
        });
        let Some(name) = name else {
            return Ok(());
        };
        let value_tokens = &statement[eq + 1..];
        match name.strip_suffix(TIME_SAMPLES_SUFFIX) {
            Some(attribute) => {
                let samples = parse_time_samples(value_tokens, statement[eq].line)?;
                visitor.time_samples(prim_path, attribute, samples)
            }
            // `.connect`, `.spline` and other namespaced forms.
            None if name.contains('.') => Ok(()),
            None => {
                let mut value_parser = Parser {
                    tokens: value_tokens,
                    pos: 0,
                };
                let value = value_parser.sample_value().unwrap_or(SampleValue::Other);
                visitor.default_value(prim_path, name, value)
            }
        }
    }
}

fn parse_time_samples(
    tokens: &[Spanned],
    line: usize,
) -> Result<Vec<(f64, SampleValue)>, SyntaxError> {
    let mut parser = Parser { tokens, pos: 0 };
    parser.expect_punct('{')?;
    let mut samples = Vec::new();
    loop {
        while matches!(
            parser.peek(),
            Some(Spanned {
                token: Token::Newline | Token::Punct(','),
                ..
            })
        ) {
            parser.pos += 1;
        }
        let Some(spanned) = parser.next() else {
            return Err(SyntaxError::new(line, "unclosed timeSamples dictionary"));
        };
        let time = match spanned.token {
            Token::Punct('}') => return Ok(samples),
            Token::Number(time) => time,
            ref other => {
                return Err(SyntaxError::new(
                    spanned.line,
                    format!("expected a time code, found {other:?}"),
                ))
            }
        };
        parser.expect_punct(':')?;
        parser.skip_newlines();
        let value = parser.sample_value()?;
        samples.push((time, value));
    }
}

impl Parser<'_> {
    fn sample_value(&mut self) -> Result<SampleValue, SyntaxError> {
        let Some(spanned) = self.peek() else {
            return Err(SyntaxError::new(self.current_line(), "missing sample value"));
        };
        match &spanned.token {
            Token::Ident(word) if word == "None" => {
                self.pos += 1;
                Ok(SampleValue::None)
            }
            Token::Number(value) => {
                self.pos += 1;
                Ok(SampleValue::Scalar(*value))
            }
            Token::Punct('(') => {
                let start = self.pos;
                self.skip_balanced()?;
                Ok(flat_tuple(&self.tokens[start + 1..self.pos - 1])
                    .map_or(SampleValue::Other, SampleValue::Tuple))
            }
            Token::Punct('[' | '{') => {
                self.skip_balanced()?;
                Ok(SampleValue::Other)
            }
            Token::Str(_) | Token::Ident(_) | Token::PathRef(_) | Token::AssetRef(_) => {
                self.pos += 1;
                Ok(SampleValue::Other)
            }
            other => Err(SyntaxError::new(
                spanned.line,
                format!("unexpected {other:?} in sample value"),
            )),
        }
    }
}

/// `1, 2, 3` between the parentheses of a tuple; `None` if any element is
/// not a plain number.
fn flat_tuple(inner: &[Spanned]) -> Option<Vec<f64>> {
    let mut values = Vec::new();
    for spanned in inner {
        match spanned.token {
            Token::Number(value) => values.push(value),
            Token::Punct(',') | Token::Newline => {}
            _ => return None,
        }
    }
    Some(values)
}

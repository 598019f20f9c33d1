// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Source text to data.
//!
//! The reader knows nothing about special forms; it produces [`Datum`]
//! trees that the compiler then turns into expressions.

use crate::error::ScriptError;

/// Nesting beyond this is rejected so hostile input cannot exhaust the stack.
pub const MAX_NESTING: usize = 128;

/// One read form. Compound forms carry the line they open on.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    Keyword(String),
    Symbol(String),
    List(Vec<Datum>, usize),
    Vector(Vec<Datum>, usize),
    Map(Vec<Datum>, usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(char),
    Close(char),
    Str(String),
    Atom(String),
}

struct Lexer<'a> {
    chunk: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(chunk: &'a str, source: &'a str) -> Self {
        Self {
            chunk,
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            chunk: self.chunk.to_string(),
            line: self.line,
            message: message.into(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<(Token, usize)>, ScriptError> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                c if c.is_whitespace() || c == ',' => {
                    self.chars.next();
                }
                ';' => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                '(' | '[' | '{' => {
                    self.chars.next();
                    tokens.push((Token::Open(c), self.line));
                }
                ')' | ']' | '}' => {
                    self.chars.next();
                    tokens.push((Token::Close(c), self.line));
                }
                '"' => {
                    let line = self.line;
                    self.chars.next();
                    let s = self.string()?;
                    tokens.push((Token::Str(s), line));
                }
                _ => {
                    let mut atom = String::new();
                    while let Some(&c) = self.chars.peek() {
                        if c.is_whitespace() || "()[]{}\",;".contains(c) {
                            break;
                        }
                        atom.push(c);
                        self.chars.next();
                    }
                    tokens.push((Token::Atom(atom), self.line));
                }
            }
        }
        Ok(tokens)
    }

    fn string(&mut self) -> Result<String, ScriptError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some(other) => return Err(self.error(format!("unknown escape `\\{other}`"))),
                    None => return Err(self.error("unterminated string")),
                },
                Some('\n') => {
                    self.line += 1;
                    out.push('\n');
                }
                Some(c) => out.push(c),
            }
        }
    }
}

/// Read every top-level form in `source`.
pub fn read_all(chunk: &str, source: &str) -> Result<Vec<Datum>, ScriptError> {
    let tokens = Lexer::new(chunk, source).tokenize()?;
    let mut reader = Reader {
        chunk,
        tokens: tokens.into_iter().peekable(),
        last_line: 1,
    };
    let mut forms = Vec::new();
    while reader.tokens.peek().is_some() {
        forms.push(reader.form(0)?);
    }
    Ok(forms)
}

struct Reader<'a> {
    chunk: &'a str,
    tokens: std::iter::Peekable<std::vec::IntoIter<(Token, usize)>>,
    last_line: usize,
}

impl Reader<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ScriptError {
        ScriptError::Parse {
            chunk: self.chunk.to_string(),
            line,
            message: message.into(),
        }
    }

    fn form(&mut self, depth: usize) -> Result<Datum, ScriptError> {
        let Some((token, line)) = self.tokens.next() else {
            return Err(self.error(self.last_line, "unexpected end of input"));
        };
        self.last_line = line;
        match token {
            Token::Open(open) => {
                if depth >= MAX_NESTING {
                    return Err(self.error(line, "forms nested too deeply"));
                }
                let close = match open {
                    '(' => ')',
                    '[' => ']',
                    _ => '}',
                };
                let mut items = Vec::new();
                loop {
                    let next = self.tokens.peek().map(|(token, l)| match token {
                        Token::Close(c) => Some((*c, *l)),
                        _ => None,
                    });
                    match next {
                        None => {
                            return Err(self.error(line, format!("unclosed `{open}`")));
                        }
                        Some(Some((c, close_line))) => {
                            if c != close {
                                return Err(self.error(
                                    close_line,
                                    format!("expected `{close}`, found `{c}`"),
                                ));
                            }
                            self.tokens.next();
                            break;
                        }
                        Some(None) => items.push(self.form(depth + 1)?),
                    }
                }
                Ok(match open {
                    '(' => Datum::List(items, line),
                    '[' => Datum::Vector(items, line),
                    _ => Datum::Map(items, line),
                })
            }
            Token::Close(c) => Err(self.error(line, format!("unexpected `{c}`"))),
            Token::Str(s) => Ok(Datum::Str(s)),
            Token::Atom(atom) => self.atom(atom, line),
        }
    }

    fn atom(&self, atom: String, line: usize) -> Result<Datum, ScriptError> {
        match atom.as_str() {
            "nil" => return Ok(Datum::Nil),
            "true" => return Ok(Datum::Bool(true)),
            "false" => return Ok(Datum::Bool(false)),
            _ => {}
        }
        if let Some(name) = atom.strip_prefix(':') {
            if name.is_empty() {
                return Err(self.error(line, "empty keyword"));
            }
            return Ok(Datum::Keyword(name.to_string()));
        }
        let mut chars = atom.chars();
        let first = chars.next();
        let second = chars.next();
        let numeric = match (first, second) {
            (Some(c), _) if c.is_ascii_digit() => true,
            (Some('-' | '+' | '.'), Some(c)) if c.is_ascii_digit() => true,
            _ => false,
        };
        if numeric {
            return atom
                .parse::<f64>()
                .map(Datum::Number)
                .map_err(|_| self.error(line, format!("invalid number `{atom}`")));
        }
        Ok(Datum::Symbol(atom))
    }
}

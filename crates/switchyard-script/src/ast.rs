// SPDX-FileCopyrightText: 2026 Switchyard Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expression tree and the compiler that builds it from read data.
//!
//! Special forms are resolved here, once, so the interpreter only ever
//! dispatches on [`Expr`] variants.

use std::sync::Arc;

use crate::error::ScriptError;
use crate::reader::{read_all, Datum};
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Value),
    Symbol(String),
    Def(String, Box<Expr>),
    Fn(Arc<FnDef>),
    If(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    Let(Vec<(Pattern, Expr)>, Vec<Expr>),
    Do(Vec<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Cond(Vec<(Expr, Expr)>),
    Try {
        body: Vec<Expr>,
        binding: String,
        handler: Vec<Expr>,
    },
    Call(Box<Expr>, Vec<Expr>),
    Array(Vec<Expr>),
    Table(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone)]
pub struct FnDef {
    pub name: Option<String>,
    pub params: Vec<Pattern>,
    pub rest: Option<String>,
    pub body: Vec<Expr>,
}

/// Binding target in parameter lists and `let`.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Bind(String),
    Ignore,
    /// Positional destructuring of a sequence table.
    Seq(Vec<Pattern>),
}

/// A compiled chunk, ready to run on any interpreter.
#[derive(Debug, Clone)]
pub struct Program {
    pub name: String,
    pub forms: Vec<Expr>,
}

/// Read and compile `source`. `name` appears in error messages.
pub fn compile(name: &str, source: &str) -> Result<Program, ScriptError> {
    let data = read_all(name, source)?;
    let compiler = Compiler { chunk: name };
    let forms = data
        .iter()
        .map(|d| compiler.expr(d))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program {
        name: name.to_string(),
        forms,
    })
}

struct Compiler<'a> {
    chunk: &'a str,
}

impl Compiler<'_> {
    fn error(&self, line: usize, message: impl Into<String>) -> ScriptError {
        ScriptError::Compile {
            chunk: self.chunk.to_string(),
            line,
            message: message.into(),
        }
    }

    fn expr(&self, datum: &Datum) -> Result<Expr, ScriptError> {
        Ok(match datum {
            Datum::Nil => Expr::Literal(Value::Nil),
            Datum::Bool(b) => Expr::Literal(Value::Bool(*b)),
            Datum::Number(n) => Expr::Literal(Value::Number(*n)),
            Datum::Str(s) | Datum::Keyword(s) => Expr::Literal(Value::Str(s.clone())),
            Datum::Symbol(s) => Expr::Symbol(s.clone()),
            Datum::Vector(items, _) => Expr::Array(self.exprs(items)?),
            Datum::Map(items, line) => {
                if items.len() % 2 != 0 {
                    return Err(self.error(*line, "table literal needs an even number of forms"));
                }
                let pairs = items
                    .chunks(2)
                    .map(|kv| Ok((self.expr(&kv[0])?, self.expr(&kv[1])?)))
                    .collect::<Result<Vec<_>, ScriptError>>()?;
                Expr::Table(pairs)
            }
            Datum::List(items, line) => self.list(items, *line)?,
        })
    }

    fn exprs(&self, items: &[Datum]) -> Result<Vec<Expr>, ScriptError> {
        items.iter().map(|d| self.expr(d)).collect()
    }

    fn list(&self, items: &[Datum], line: usize) -> Result<Expr, ScriptError> {
        let Some((head, args)) = items.split_first() else {
            return Err(self.error(line, "empty call `()`"));
        };
        let special = match head {
            Datum::Symbol(s) => s.as_str(),
            _ => "",
        };
        match special {
            "def" => {
                let [Datum::Symbol(name), value] = args else {
                    return Err(self.error(line, "expected (def name value)"));
                };
                Ok(Expr::Def(name.clone(), Box::new(self.expr(value)?)))
            }
            "defn" => {
                let Some((Datum::Symbol(name), rest)) = args.split_first() else {
                    return Err(self.error(line, "expected (defn name [params] body...)"));
                };
                // Optional docstring.
                let rest = match rest {
                    [Datum::Str(_), tail @ ..] if tail.len() > 1 => tail,
                    _ => rest,
                };
                let def = self.function(Some(name.clone()), rest, line)?;
                Ok(Expr::Def(name.clone(), Box::new(Expr::Fn(Arc::new(def)))))
            }
            "fn" => {
                let (name, rest) = match args {
                    [Datum::Symbol(name), rest @ ..] => (Some(name.clone()), rest),
                    _ => (None, args),
                };
                Ok(Expr::Fn(Arc::new(self.function(name, rest, line)?)))
            }
            "let" => {
                let Some((Datum::Vector(bindings, _), body)) = args.split_first() else {
                    return Err(self.error(line, "expected (let [bindings...] body...)"));
                };
                if bindings.len() % 2 != 0 {
                    return Err(self.error(line, "let bindings need an even number of forms"));
                }
                let pairs = bindings
                    .chunks(2)
                    .map(|pair| Ok((self.pattern(&pair[0], line)?, self.expr(&pair[1])?)))
                    .collect::<Result<Vec<_>, ScriptError>>()?;
                Ok(Expr::Let(pairs, self.exprs(body)?))
            }
            "if" => match args {
                [cond, then] => Ok(Expr::If(
                    Box::new(self.expr(cond)?),
                    Box::new(self.expr(then)?),
                    None,
                )),
                [cond, then, otherwise] => Ok(Expr::If(
                    Box::new(self.expr(cond)?),
                    Box::new(self.expr(then)?),
                    Some(Box::new(self.expr(otherwise)?)),
                )),
                _ => Err(self.error(line, "expected (if test then else?)")),
            },
            "when" => {
                let Some((cond, body)) = args.split_first() else {
                    return Err(self.error(line, "expected (when test body...)"));
                };
                Ok(Expr::If(
                    Box::new(self.expr(cond)?),
                    Box::new(Expr::Do(self.exprs(body)?)),
                    None,
                ))
            }
            "cond" => {
                if args.len() % 2 != 0 {
                    return Err(self.error(line, "cond needs test/expression pairs"));
                }
                let clauses = args
                    .chunks(2)
                    .map(|pair| Ok((self.expr(&pair[0])?, self.expr(&pair[1])?)))
                    .collect::<Result<Vec<_>, ScriptError>>()?;
                Ok(Expr::Cond(clauses))
            }
            "do" => Ok(Expr::Do(self.exprs(args)?)),
            "and" => Ok(Expr::And(self.exprs(args)?)),
            "or" => Ok(Expr::Or(self.exprs(args)?)),
            "try" => self.try_form(args, line),
            _ => Ok(Expr::Call(
                Box::new(self.expr(head)?),
                self.exprs(args)?,
            )),
        }
    }

    fn try_form(&self, args: &[Datum], line: usize) -> Result<Expr, ScriptError> {
        let malformed = || self.error(line, "expected (try body... (catch name handler...))");
        let Some((Datum::List(catch, _), body)) = args.split_last() else {
            return Err(malformed());
        };
        let [Datum::Symbol(head), Datum::Symbol(binding), handler @ ..] = catch.as_slice() else {
            return Err(malformed());
        };
        if head != "catch" {
            return Err(malformed());
        }
        Ok(Expr::Try {
            body: self.exprs(body)?,
            binding: binding.clone(),
            handler: self.exprs(handler)?,
        })
    }

    fn function(
        &self,
        name: Option<String>,
        rest: &[Datum],
        line: usize,
    ) -> Result<FnDef, ScriptError> {
        let Some((Datum::Vector(params, _), body)) = rest.split_first() else {
            return Err(self.error(line, "function needs a parameter vector"));
        };
        let mut patterns = Vec::with_capacity(params.len());
        let mut rest_param = None;
        let mut iter = params.iter();
        while let Some(param) = iter.next() {
            if matches!(param, Datum::Symbol(s) if s == "&") {
                match (iter.next(), iter.next()) {
                    (Some(Datum::Symbol(r)), None) => rest_param = Some(r.clone()),
                    _ => return Err(self.error(line, "`&` must be followed by one name")),
                }
                break;
            }
            patterns.push(self.pattern(param, line)?);
        }
        Ok(FnDef {
            name,
            params: patterns,
            rest: rest_param,
            body: self.exprs(body)?,
        })
    }

    fn pattern(&self, datum: &Datum, line: usize) -> Result<Pattern, ScriptError> {
        match datum {
            Datum::Symbol(s) if s == "_" => Ok(Pattern::Ignore),
            Datum::Symbol(s) if s == "&" => Err(self.error(line, "unexpected `&`")),
            Datum::Symbol(s) => Ok(Pattern::Bind(s.clone())),
            Datum::Vector(items, inner) => Ok(Pattern::Seq(
                items
                    .iter()
                    .map(|d| self.pattern(d, *inner))
                    .collect::<Result<_, _>>()?,
            )),
            other => Err(self.error(line, format!("cannot bind to {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(src: &str) -> Expr {
        let mut program = compile("t", src).unwrap();
        assert_eq!(program.forms.len(), 1);
        program.forms.remove(0)
    }

    #[test]
    fn defn_compiles_to_def_of_fn() {
        let Expr::Def(name, body) = one("(defn add \"adds\" [a b] (+ a b))") else {
            panic!("expected def");
        };
        assert_eq!(name, "add");
        let Expr::Fn(def) = *body else {
            panic!("expected fn");
        };
        assert_eq!(def.name.as_deref(), Some("add"));
        assert_eq!(
            def.params,
            vec![Pattern::Bind("a".into()), Pattern::Bind("b".into())]
        );
        assert_eq!(def.body.len(), 1);
    }

    #[test]
    fn rest_params_and_destructuring() {
        let Expr::Fn(def) = one("(fn [[x _] & more] x)") else {
            panic!("expected fn");
        };
        assert_eq!(
            def.params,
            vec![Pattern::Seq(vec![Pattern::Bind("x".into()), Pattern::Ignore])]
        );
        assert_eq!(def.rest.as_deref(), Some("more"));
    }

    #[test]
    fn keywords_are_string_literals() {
        let Expr::Literal(Value::Str(s)) = one(":else") else {
            panic!("expected literal");
        };
        assert_eq!(s, "else");
    }

    #[test]
    fn malformed_forms_report_lines() {
        let err = compile("policy", "\n(let [a] a)").unwrap_err();
        assert_eq!(
            err,
            ScriptError::Compile {
                chunk: "policy".into(),
                line: 2,
                message: "let bindings need an even number of forms".into(),
            }
        );
        assert!(compile("t", "()").is_err());
        assert!(compile("t", "(if)").is_err());
        assert!(compile("t", "{:a}").is_err());
        assert!(compile("t", "(try (x))").is_err());
        assert!(compile("t", "(fn [a &] a)").is_err());
    }
}

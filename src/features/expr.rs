//! Sandboxed evaluator for catalog validation expressions.
//!
//! Catalog validations are written as small JavaScript-flavoured predicates over a
//! single free variable `value`, e.g. `value > 0` or `value.length > 0`. Only a
//! closed grammar is understood: literals, `value`, `.length`, the `Number.is*`
//! helpers, unary/binary arithmetic, comparisons and logical operators. Nothing
//! outside that grammar can be executed.

use std::cmp::Ordering;
use thiserror::Error;

use crate::format::format_number;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("{0} is not defined")]
    Reference(String),

    #[error("type error: {0}")]
    Type(String),
}

/// Runtime value of the evaluator, modelled on JavaScript primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<ExprValue>),
}

impl ExprValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            ExprValue::Undefined | ExprValue::Null => false,
            ExprValue::Bool(b) => *b,
            ExprValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ExprValue::Str(s) => !s.is_empty(),
            ExprValue::Array(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            ExprValue::Undefined => f64::NAN,
            ExprValue::Null => 0.0,
            ExprValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ExprValue::Number(n) => *n,
            ExprValue::Str(s) => string_to_number(s),
            ExprValue::Array(_) => string_to_number(&self.to_text()),
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            ExprValue::Undefined => "undefined".to_string(),
            ExprValue::Null => "null".to_string(),
            ExprValue::Bool(b) => b.to_string(),
            ExprValue::Number(n) => format_number(*n),
            ExprValue::Str(s) => s.clone(),
            ExprValue::Array(items) => items
                .iter()
                .map(|item| match item {
                    ExprValue::Undefined | ExprValue::Null => String::new(),
                    other => other.to_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn to_primitive(&self) -> ExprValue {
        match self {
            ExprValue::Array(_) => ExprValue::Str(self.to_text()),
            other => other.clone(),
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that JavaScript does not
        t if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        t => t.parse::<f64>().unwrap_or(f64::NAN),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

const PUNCTUATORS: [&str; 21] = [
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "<", ">", "!", "+", "-", "*", "/", "%",
    "(", ")", ".", ",", ";",
];

fn tokenize(source: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }

        if ch.is_ascii_digit() || (ch == '.' && chars.get(pos + 1).is_some_and(|c| c.is_ascii_digit())) {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
                pos += 1;
                if pos < chars.len() && (chars[pos] == '+' || chars[pos] == '-') {
                    pos += 1;
                }
                while pos < chars.len() && chars[pos].is_ascii_digit() {
                    pos += 1;
                }
            }
            let text: String = chars[start..pos].iter().collect();
            let number = text
                .parse::<f64>()
                .map_err(|_| ExprError::Parse(format!("invalid number literal '{}'", text)))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if ch == '\'' || ch == '"' {
            let quote = ch;
            pos += 1;
            let mut text = String::new();
            loop {
                match chars.get(pos) {
                    None => return Err(ExprError::UnterminatedString),
                    Some('\\') => {
                        if let Some(escaped) = chars.get(pos + 1) {
                            text.push(match escaped {
                                'n' => '\n',
                                't' => '\t',
                                other => *other,
                            });
                        }
                        pos += 2;
                    }
                    Some(c) if *c == quote => {
                        pos += 1;
                        break;
                    }
                    Some(c) => {
                        text.push(*c);
                        pos += 1;
                    }
                }
            }
            tokens.push(Token::Str(text));
            continue;
        }

        if ch.is_alphabetic() || ch == '_' || ch == '$' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '$') {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            continue;
        }

        let rest: String = chars[pos..chars.len().min(pos + 3)].iter().collect();
        match PUNCTUATORS.iter().find(|p| rest.starts_with(*p)) {
            Some(punct) => {
                tokens.push(Token::Punct(punct));
                pos += punct.chars().count();
            }
            None => return Err(ExprError::UnexpectedChar { ch, pos }),
        }
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    LooseEq,
    LooseNe,
    StrictEq,
    StrictNe,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(ExprValue),
    Ident(String),
    Member(Box<Expr>, String),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek_punct(&self, punct: &str) -> bool {
        matches!(self.tokens.get(self.pos), Some(Token::Punct(p)) if *p == punct)
    }

    fn eat_punct(&mut self, punct: &str) -> bool {
        if self.peek_punct(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<(), ExprError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(ExprError::Parse(format!("expected '{}'", punct)))
        }
    }

    fn parse_program(&mut self) -> Result<Expr, ExprError> {
        let expr = self.parse_or()?;
        while self.eat_punct(";") {}
        if self.pos < self.tokens.len() {
            return Err(ExprError::Parse(format!(
                "unexpected token {:?}",
                self.tokens[self.pos]
            )));
        }
        Ok(expr)
    }

    fn parse_binary_level(
        &mut self,
        operators: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, ExprError>,
    ) -> Result<Expr, ExprError> {
        let mut left = next(self)?;
        'outer: loop {
            for (punct, op) in operators {
                if self.eat_punct(punct) {
                    let right = next(self)?;
                    left = Expr::Binary(*op, Box::new(left), Box::new(right));
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(&[("||", BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(&[("&&", BinaryOp::And)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(
            &[
                ("===", BinaryOp::StrictEq),
                ("!==", BinaryOp::StrictNe),
                ("==", BinaryOp::LooseEq),
                ("!=", BinaryOp::LooseNe),
            ],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        self.parse_binary_level(
            &[("*", BinaryOp::Mul), ("/", BinaryOp::Div), ("%", BinaryOp::Rem)],
            Self::parse_unary,
        )
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.eat_punct("!") {
            UnaryOp::Not
        } else if self.eat_punct("-") {
            UnaryOp::Neg
        } else if self.eat_punct("+") {
            UnaryOp::Plus
        } else {
            return self.parse_postfix();
        };
        Ok(Expr::Unary(op, Box::new(self.parse_unary()?)))
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(".") {
                match self.tokens.get(self.pos).cloned() {
                    Some(Token::Ident(property)) => {
                        self.pos += 1;
                        expr = Expr::Member(Box::new(expr), property);
                    }
                    _ => return Err(ExprError::Parse("expected property name".into())),
                }
            } else if self.eat_punct("(") {
                let mut args = Vec::new();
                if !self.eat_punct(")") {
                    loop {
                        args.push(self.parse_or()?);
                        if self.eat_punct(")") {
                            break;
                        }
                        self.expect_punct(",")?;
                    }
                }
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ExprError::Parse("unexpected end of expression".into()))?;
        self.pos += 1;

        match token {
            Token::Number(n) => Ok(Expr::Literal(ExprValue::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(ExprValue::Str(s))),
            Token::Ident(ident) => Ok(match ident.as_str() {
                "true" => Expr::Literal(ExprValue::Bool(true)),
                "false" => Expr::Literal(ExprValue::Bool(false)),
                "null" => Expr::Literal(ExprValue::Null),
                "undefined" => Expr::Literal(ExprValue::Undefined),
                "NaN" => Expr::Literal(ExprValue::Number(f64::NAN)),
                "Infinity" => Expr::Literal(ExprValue::Number(f64::INFINITY)),
                _ => Expr::Ident(ident),
            }),
            Token::Punct("(") => {
                let inner = self.parse_or()?;
                self.expect_punct(")")?;
                Ok(inner)
            }
            Token::Punct(p) => Err(ExprError::Parse(format!("unexpected '{}'", p))),
        }
    }
}

/// A parsed validation expression, ready to be evaluated against candidate values.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Expr,
}

/// Name of the only variable an expression may reference.
pub const BOUND_VARIABLE: &str = "value";

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        Ok(Self {
            root: parser.parse_program()?,
        })
    }

    /// Evaluates the expression with `value` bound to `bound`.
    pub fn evaluate(&self, bound: &ExprValue) -> Result<ExprValue, ExprError> {
        eval(&self.root, bound)
    }
}

fn eval(expr: &Expr, bound: &ExprValue) -> Result<ExprValue, ExprError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Ident(name) if name == BOUND_VARIABLE => Ok(bound.clone()),
        Expr::Ident(name) => Err(ExprError::Reference(name.clone())),
        Expr::Member(object, property) => {
            let target = eval(object, bound)?;
            member(&target, property)
        }
        Expr::Call(callee, args) => {
            let name = callee_path(callee)
                .ok_or_else(|| ExprError::Type("expression is not callable".into()))?;
            let args = args
                .iter()
                .map(|arg| eval(arg, bound))
                .collect::<Result<Vec<_>, _>>()?;
            call(&name, &args)
        }
        Expr::Unary(op, operand) => {
            let v = eval(operand, bound)?;
            Ok(match op {
                UnaryOp::Not => ExprValue::Bool(!v.is_truthy()),
                UnaryOp::Neg => ExprValue::Number(-v.to_number()),
                UnaryOp::Plus => ExprValue::Number(v.to_number()),
            })
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let l = eval(left, bound)?;
            if l.is_truthy() {
                eval(right, bound)
            } else {
                Ok(l)
            }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let l = eval(left, bound)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval(right, bound)
            }
        }
        Expr::Binary(op, left, right) => {
            let l = eval(left, bound)?;
            let r = eval(right, bound)?;
            Ok(binary(*op, &l, &r))
        }
    }
}

fn callee_path(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(name) => Some(name.clone()),
        Expr::Member(object, property) => {
            callee_path(object).map(|path| format!("{}.{}", path, property))
        }
        _ => None,
    }
}

fn member(target: &ExprValue, property: &str) -> Result<ExprValue, ExprError> {
    match (target, property) {
        (ExprValue::Undefined | ExprValue::Null, _) => Err(ExprError::Type(format!(
            "cannot read property '{}' of {}",
            property,
            target.to_text()
        ))),
        (ExprValue::Str(s), "length") => Ok(ExprValue::Number(s.chars().count() as f64)),
        (ExprValue::Array(items), "length") => Ok(ExprValue::Number(items.len() as f64)),
        _ => Ok(ExprValue::Undefined),
    }
}

fn call(name: &str, args: &[ExprValue]) -> Result<ExprValue, ExprError> {
    let first = args.first().cloned().unwrap_or(ExprValue::Undefined);
    let result = match name {
        "Number.isNaN" => matches!(first, ExprValue::Number(n) if n.is_nan()),
        "Number.isFinite" => matches!(first, ExprValue::Number(n) if n.is_finite()),
        "Number.isInteger" => {
            matches!(first, ExprValue::Number(n) if n.is_finite() && n.fract() == 0.0)
        }
        "isNaN" => first.to_number().is_nan(),
        "isFinite" => first.to_number().is_finite(),
        "Number" => return Ok(ExprValue::Number(first.to_number())),
        "String" => return Ok(ExprValue::Str(first.to_text())),
        "Boolean" => first.is_truthy(),
        other => return Err(ExprError::Reference(other.to_string())),
    };
    Ok(ExprValue::Bool(result))
}

fn binary(op: BinaryOp, l: &ExprValue, r: &ExprValue) -> ExprValue {
    match op {
        BinaryOp::Add => {
            let (lp, rp) = (l.to_primitive(), r.to_primitive());
            if matches!(lp, ExprValue::Str(_)) || matches!(rp, ExprValue::Str(_)) {
                ExprValue::Str(format!("{}{}", lp.to_text(), rp.to_text()))
            } else {
                ExprValue::Number(lp.to_number() + rp.to_number())
            }
        }
        BinaryOp::Sub => ExprValue::Number(l.to_number() - r.to_number()),
        BinaryOp::Mul => ExprValue::Number(l.to_number() * r.to_number()),
        BinaryOp::Div => ExprValue::Number(l.to_number() / r.to_number()),
        BinaryOp::Rem => ExprValue::Number(l.to_number() % r.to_number()),
        BinaryOp::Lt => ExprValue::Bool(compare(l, r) == Some(Ordering::Less)),
        BinaryOp::Le => ExprValue::Bool(matches!(
            compare(l, r),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => ExprValue::Bool(compare(l, r) == Some(Ordering::Greater)),
        BinaryOp::Ge => ExprValue::Bool(matches!(
            compare(l, r),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::LooseEq => ExprValue::Bool(loose_equals(l, r)),
        BinaryOp::LooseNe => ExprValue::Bool(!loose_equals(l, r)),
        BinaryOp::StrictEq => ExprValue::Bool(strict_equals(l, r)),
        BinaryOp::StrictNe => ExprValue::Bool(!strict_equals(l, r)),
        BinaryOp::And | BinaryOp::Or => unreachable!("logical operators short-circuit in eval"),
    }
}

fn compare(l: &ExprValue, r: &ExprValue) -> Option<Ordering> {
    match (l.to_primitive(), r.to_primitive()) {
        (ExprValue::Str(a), ExprValue::Str(b)) => Some(a.cmp(&b)),
        (a, b) => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn strict_equals(l: &ExprValue, r: &ExprValue) -> bool {
    match (l, r) {
        (ExprValue::Number(a), ExprValue::Number(b)) => a == b,
        (ExprValue::Array(_), _) | (_, ExprValue::Array(_)) => false,
        (a, b) => a == b,
    }
}

fn loose_equals(l: &ExprValue, r: &ExprValue) -> bool {
    match (l, r) {
        (ExprValue::Undefined | ExprValue::Null, ExprValue::Undefined | ExprValue::Null) => true,
        (ExprValue::Undefined | ExprValue::Null, _) | (_, ExprValue::Undefined | ExprValue::Null) => {
            false
        }
        (ExprValue::Str(a), ExprValue::Str(b)) => a == b,
        (ExprValue::Array(_), ExprValue::Array(_)) => false,
        (a, b) => {
            let (ap, bp) = (a.to_primitive(), b.to_primitive());
            if let (ExprValue::Str(x), ExprValue::Str(y)) = (&ap, &bp) {
                return x == y;
            }
            ap.to_number() == bp.to_number()
        }
    }
}

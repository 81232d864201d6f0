// src/expression.rs
use std::fmt;

use serde_json::Value;

use crate::coerce::number_to_string;
use crate::errors::Result;
use crate::parser::{is_ident_start, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    StrictEq,
    StrictNe,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 2,
            BinaryOp::And => 3,
            BinaryOp::StrictEq | BinaryOp::StrictNe | BinaryOp::Eq | BinaryOp::Ne => 4,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 5,
            BinaryOp::Add | BinaryOp::Sub => 6,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 7,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNe => "!==",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

/// Parsed binding expression.
///
/// Python-flavoured forms (`x in y`, `a if c else b`, `not x`) parse into the
/// same nodes as their JavaScript equivalents.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Undefined,
    Array(Vec<Expr>),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Membership {
        negated: bool,
        needle: Box<Expr>,
        haystack: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

pub fn parse_expr(input: &str) -> Result<Expr> {
    let mut p = ExprParser::new(input);
    let node = p.parse_conditional()?;
    p.parser.skip_ws();
    if !p.parser.eof() {
        return Err(p.parser.error("trailing input"));
    }
    Ok(node)
}

/// Deepest bracket, call, branch or unary nesting accepted.
pub const MAX_NESTING: usize = 64;
/// Most operators (binary, membership, member, index, call) in one expression.
pub const MAX_OPERATORS: usize = 256;

struct ExprParser<'a> {
    parser: Parser<'a>,
    depth: usize,
    operators: usize,
}

impl<'a> ExprParser<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            parser: Parser::new(s),
            depth: 0,
            operators: 0,
        }
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.parser.error("expression nested too deeply"));
        }
        self.depth += 1;
        let out = parse(self);
        self.depth -= 1;
        out
    }

    // Operator chains build left-deep trees, so they bound recursion too.
    fn count_operator(&mut self) -> Result<()> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(self.parser.error("expression has too many operators"));
        }
        Ok(())
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let expr = self.parse_or()?;
        self.parser.skip_ws();
        if self.parser.consume_char('?') {
            let consequent = self.nested(Self::parse_conditional)?;
            self.parser.skip_ws();
            self.parser.expect(':')?;
            let alternate = self.nested(Self::parse_conditional)?;
            return Ok(Expr::Conditional {
                test: Box::new(expr),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        if self.parser.consume_keyword("if") {
            let test = self.parse_or()?;
            self.parser.skip_ws();
            if !self.parser.consume_keyword("else") {
                return Err(self.parser.error("expected 'else'"));
            }
            let alternate = self.nested(Self::parse_conditional)?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(expr),
                alternate: Box::new(alternate),
            });
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_str("||") || self.parser.consume_keyword("or") {
                let right = self.parse_and()?;
                self.count_operator()?;
                left = binary(BinaryOp::Or, left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_str("&&") || self.parser.consume_keyword("and") {
                let right = self.parse_not()?;
                self.count_operator()?;
                left = binary(BinaryOp::And, left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    // Python `not` binds looser than comparisons; `!` is handled in parse_unary.
    fn parse_not(&mut self) -> Result<Expr> {
        self.parser.skip_ws();
        if self.parser.consume_keyword("not") {
            let inner = self.nested(Self::parse_not)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                expr: Box::new(inner),
            });
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_str("===") {
                BinaryOp::StrictEq
            } else if self.parser.consume_str("!==") {
                BinaryOp::StrictNe
            } else if self.parser.consume_str("==") {
                BinaryOp::Eq
            } else if self.parser.consume_str("!=") {
                BinaryOp::Ne
            } else {
                break;
            };
            let right = self.parse_relational()?;
            self.count_operator()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_str("<=") {
                BinaryOp::Le
            } else if self.parser.consume_str(">=") {
                BinaryOp::Ge
            } else if self.parser.consume_char('<') {
                BinaryOp::Lt
            } else if self.parser.consume_char('>') {
                BinaryOp::Gt
            } else if self.parser.consume_keyword("in") {
                let haystack = self.parse_additive()?;
                self.count_operator()?;
                left = membership(false, left, haystack);
                continue;
            } else if self.consume_not_in() {
                let haystack = self.parse_additive()?;
                self.count_operator()?;
                left = membership(true, left, haystack);
                continue;
            } else {
                break;
            };
            let right = self.parse_additive()?;
            self.count_operator()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn consume_not_in(&mut self) -> bool {
        let start = self.parser.position();
        if self.parser.consume_keyword("not") {
            self.parser.skip_ws();
            if self.parser.consume_keyword("in") {
                return true;
            }
        }
        self.parser.rewind(start);
        false
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_char('+') {
                BinaryOp::Add
            } else if self.parser.consume_char('-') {
                BinaryOp::Sub
            } else {
                break;
            };
            let right = self.parse_multiplicative()?;
            self.count_operator()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            self.parser.skip_ws();
            let op = if self.parser.consume_char('*') {
                BinaryOp::Mul
            } else if self.parser.consume_char('/') {
                BinaryOp::Div
            } else if self.parser.consume_char('%') {
                BinaryOp::Rem
            } else {
                break;
            };
            let right = self.parse_unary()?;
            self.count_operator()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.parser.skip_ws();
        let op = if self.parser.consume_char('!') {
            UnaryOp::Not
        } else if self.parser.consume_char('-') {
            UnaryOp::Neg
        } else if self.parser.consume_char('+') {
            UnaryOp::Plus
        } else {
            return self.parse_postfix();
        };
        let inner = self.nested(Self::parse_unary)?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(inner),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut node = self.parse_primary()?;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char('.') {
                self.parser.skip_ws();
                let property = self.parser.parse_identifier()?;
                self.count_operator()?;
                node = Expr::Member {
                    object: Box::new(node),
                    property,
                };
            } else if self.parser.consume_char('[') {
                let index = self.nested(Self::parse_conditional)?;
                self.parser.skip_ws();
                self.parser.expect(']')?;
                self.count_operator()?;
                node = Expr::Index {
                    object: Box::new(node),
                    index: Box::new(index),
                };
            } else if self.parser.consume_char('(') {
                let args = self.nested(|p| p.parse_list(')'))?;
                self.count_operator()?;
                node = Expr::Call {
                    callee: Box::new(node),
                    args,
                };
            } else {
                break;
            }
        }
        Ok(node)
    }

    fn parse_list(&mut self, close: char) -> Result<Vec<Expr>> {
        let mut out = Vec::new();
        self.parser.skip_ws();
        if self.parser.consume_char(close) {
            return Ok(out);
        }
        loop {
            out.push(self.parse_conditional()?);
            self.parser.skip_ws();
            if self.parser.consume_char(',') {
                continue;
            }
            self.parser.expect(close)?;
            break;
        }
        Ok(out)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        self.parser.skip_ws();
        let c = match self.parser.peek_char() {
            Some(c) => c,
            None => return Err(self.parser.error("unexpected end of expression")),
        };
        if c == '\'' || c == '"' {
            return Ok(Expr::Literal(Value::String(
                self.parser.parse_quoted_string()?,
            )));
        }
        if c.is_ascii_digit() {
            return Ok(Expr::Literal(self.parser.parse_number_literal()?));
        }
        if self.parser.consume_char('(') {
            let inner = self.nested(Self::parse_conditional)?;
            self.parser.skip_ws();
            self.parser.expect(')')?;
            return Ok(inner);
        }
        if self.parser.consume_char('[') {
            return Ok(Expr::Array(self.nested(|p| p.parse_list(']'))?));
        }
        if is_ident_start(c) {
            let name = self.parser.parse_identifier()?;
            return match name.as_str() {
                "true" | "True" => Ok(Expr::Literal(Value::Bool(true))),
                "false" | "False" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "None" => Ok(Expr::Literal(Value::Null)),
                "undefined" => Ok(Expr::Undefined),
                "and" | "or" | "not" | "in" | "if" | "else" => {
                    Err(self.parser.error(&format!("unexpected keyword '{name}'")))
                }
                _ => Ok(Expr::Ident(name)),
            };
        }
        Err(self.parser.error(&format!("unexpected character '{c}'")))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn membership(negated: bool, needle: Expr, haystack: Expr) -> Expr {
    Expr::Membership {
        negated,
        needle: Box::new(needle),
        haystack: Box::new(haystack),
    }
}

const PREC_UNARY: u8 = 8;
const PREC_POSTFIX: u8 = 9;
const PREC_PRIMARY: u8 = 10;

impl Expr {
    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => op.precedence(),
            Expr::Unary { .. } => PREC_UNARY,
            Expr::Membership { negated: true, .. } => PREC_UNARY,
            Expr::Membership { negated: false, .. }
            | Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Call { .. } => PREC_POSTFIX,
            // conditionals are always printed inside parentheses
            Expr::Conditional { .. }
            | Expr::Literal(_)
            | Expr::Undefined
            | Expr::Array(_)
            | Expr::Ident(_) => PREC_PRIMARY,
        }
    }

    /// Writes the JavaScript-surface form, parenthesizing when `min_prec`
    /// is tighter than this node.
    fn write_js(&self, f: &mut fmt::Formatter<'_>, min_prec: u8) -> fmt::Result {
        let wrap = self.precedence() < min_prec;
        if wrap {
            f.write_str("(")?;
        }
        match self {
            Expr::Literal(Value::String(s)) => write_quoted(f, s)?,
            Expr::Literal(Value::Number(n)) => match n.as_f64() {
                Some(x) => f.write_str(&number_to_string(x))?,
                None => write!(f, "{n}")?,
            },
            Expr::Literal(other) => write!(f, "{other}")?,
            Expr::Undefined => f.write_str("undefined")?,
            Expr::Array(items) => {
                f.write_str("[")?;
                write_args(f, items)?;
                f.write_str("]")?;
            }
            Expr::Ident(name) => f.write_str(name)?,
            Expr::Member { object, property } => {
                object.write_js(f, PREC_POSTFIX)?;
                if property.chars().all(|c| c.is_ascii_digit()) {
                    write!(f, "[{property}]")?;
                } else {
                    write!(f, ".{property}")?;
                }
            }
            Expr::Index { object, index } => {
                object.write_js(f, PREC_POSTFIX)?;
                f.write_str("[")?;
                index.write_js(f, 0)?;
                f.write_str("]")?;
            }
            Expr::Call { callee, args } => match callee.as_ref() {
                Expr::Ident(name) if name == "len" && args.len() == 1 => {
                    f.write_str("(")?;
                    args[0].write_js(f, 0)?;
                    f.write_str(").length")?;
                }
                Expr::Ident(name) if name == "str" => {
                    f.write_str("String(")?;
                    write_args(f, args)?;
                    f.write_str(")")?;
                }
                _ => {
                    callee.write_js(f, PREC_POSTFIX)?;
                    f.write_str("(")?;
                    write_args(f, args)?;
                    f.write_str(")")?;
                }
            },
            Expr::Unary { op, expr } => {
                f.write_str(match op {
                    UnaryOp::Not => "!",
                    UnaryOp::Neg => "-",
                    UnaryOp::Plus => "+",
                })?;
                expr.write_js(f, PREC_UNARY)?;
            }
            Expr::Binary { op, left, right } => {
                let prec = op.precedence();
                left.write_js(f, prec)?;
                write!(f, " {} ", op.symbol())?;
                right.write_js(f, prec + 1)?;
            }
            Expr::Membership {
                negated,
                needle,
                haystack,
            } => {
                if *negated {
                    f.write_str("!")?;
                }
                f.write_str("(")?;
                haystack.write_js(f, 0)?;
                f.write_str(").includes(")?;
                needle.write_js(f, 0)?;
                f.write_str(")")?;
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                f.write_str("(")?;
                test.write_js(f, BinaryOp::Or.precedence())?;
                f.write_str(" ? ")?;
                consequent.write_js(f, 0)?;
                f.write_str(" : ")?;
                alternate.write_js(f, 0)?;
                f.write_str(")")?;
            }
        }
        if wrap {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_js(f, 0)
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        arg.write_js(f, 0)?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

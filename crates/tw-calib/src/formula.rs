//! Single-variable formula compiler for calibration values.
//!
//! Calibration rows store their value as a functional form of `x`, which is
//! the transverse momentum (or the tagger discriminant for reshaping rows),
//! for example `0.887973*((1.+(0.0523821*x))/(1.+(0.0460876*x)))`.
//!
//! Supports arithmetic (+, -, *, /), right-associative power (`^`), unary
//! minus and the functions abs, sqrt, log, log10, exp, pow, min, max, tanh.
//! Subtrees that do not depend on `x` are folded at compile time.

use tw_core::{Error, Result};

/// Deepest nesting of parentheses, calls and unary operators accepted.
const MAX_NESTING: usize = 256;

/// Longest formula accepted, in tokens; bounds the depth of operator chains.
const MAX_TOKENS: usize = 1024;

// ── AST ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    X,
    Neg(Box<Node>),
    Bin(Op, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Func {
    Abs,
    Sqrt,
    Log,
    Log10,
    Exp,
    Pow,
    Min,
    Max,
    Tanh,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        let f = match name {
            "abs" => Func::Abs,
            "sqrt" => Func::Sqrt,
            "log" => Func::Log,
            "log10" => Func::Log10,
            "exp" => Func::Exp,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            "tanh" => Func::Tanh,
            _ => return None,
        };
        Some(f)
    }

    fn arity(self) -> usize {
        match self {
            Func::Pow | Func::Min | Func::Max => 2,
            _ => 1,
        }
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Func::Abs => args[0].abs(),
            Func::Sqrt => args[0].sqrt(),
            Func::Log => args[0].ln(),
            Func::Log10 => args[0].log10(),
            Func::Exp => args[0].exp(),
            Func::Pow => args[0].powf(args[1]),
            Func::Min => args[0].min(args[1]),
            Func::Max => args[0].max(args[1]),
            Func::Tanh => args[0].tanh(),
        }
    }
}

impl Op {
    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Op::Add => lhs + rhs,
            Op::Sub => lhs - rhs,
            Op::Mul => lhs * rhs,
            Op::Div => lhs / rhs,
            Op::Pow => lhs.powf(rhs),
        }
    }
}

// ── Compiled formula ───────────────────────────────────────────

/// A compiled calibration formula in the single variable `x`.
#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    root: Node,
}

impl Formula {
    /// Parse and compile a formula.
    pub fn compile(text: &str) -> Result<Self> {
        let tokens = tokenize(text).map_err(|msg| parse_error(text, &msg))?;
        if tokens.is_empty() {
            return Err(parse_error(text, "empty formula"));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(parse_error(
                text,
                &format!("formula too long ({} tokens, limit {MAX_TOKENS})", tokens.len()),
            ));
        }
        let mut parser = Parser { tokens: &tokens, pos: 0, depth: 0 };
        let root = parser.parse_sum().map_err(|msg| parse_error(text, &msg))?;
        if let Some(t) = parser.peek() {
            return Err(parse_error(text, &format!("unexpected trailing token {t:?}")));
        }
        Ok(Formula { text: text.to_string(), root: fold(root) })
    }

    /// Formula with a fixed value.
    pub fn constant(value: f64) -> Self {
        Formula { text: value.to_string(), root: Node::Const(value) }
    }

    /// Evaluate at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        eval_node(&self.root, x)
    }

    /// Source text as given to [`Formula::compile`].
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when the value does not depend on `x`.
    pub fn is_constant(&self) -> bool {
        matches!(self.root, Node::Const(_))
    }
}

fn parse_error(text: &str, msg: &str) -> Error {
    Error::Parse(format!("formula '{text}': {msg}"))
}

// ── Evaluation ─────────────────────────────────────────────────

fn eval_node(node: &Node, x: f64) -> f64 {
    match node {
        Node::Const(v) => *v,
        Node::X => x,
        Node::Neg(a) => -eval_node(a, x),
        Node::Bin(op, a, b) => op.apply(eval_node(a, x), eval_node(b, x)),
        Node::Call(f, args) => match args.as_slice() {
            [a] => f.apply(&[eval_node(a, x)]),
            [a, b] => f.apply(&[eval_node(a, x), eval_node(b, x)]),
            _ => f64::NAN,
        },
    }
}

/// Collapse every subtree that does not reference `x`.
fn fold(node: Node) -> Node {
    match node {
        Node::Neg(a) => match fold(*a) {
            Node::Const(v) => Node::Const(-v),
            a => Node::Neg(Box::new(a)),
        },
        Node::Bin(op, a, b) => match (fold(*a), fold(*b)) {
            (Node::Const(l), Node::Const(r)) => Node::Const(op.apply(l, r)),
            (a, b) => Node::Bin(op, Box::new(a), Box::new(b)),
        },
        Node::Call(f, args) => {
            let args: Vec<Node> = args.into_iter().map(fold).collect();
            if args.iter().all(|a| matches!(a, Node::Const(_))) {
                Node::Const(eval_node(&Node::Call(f, args), 0.0))
            } else {
                Node::Call(f, args)
            }
        }
        other => other,
    }
}

// ── Tokenizer ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> std::result::Result<Vec<Token>, String> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let single = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(t) = single {
            tokens.push(t);
            i += 1;
            continue;
        }

        if c.is_ascii_whitespace() {
            i += 1;
        } else if c.is_ascii_digit() || c == '.' {
            let start = i;
            while i < bytes.len() {
                let d = bytes[i] as char;
                let exponent_sign =
                    (d == '+' || d == '-') && i > start && matches!(bytes[i - 1], b'e' | b'E');
                if d.is_ascii_digit() || d == '.' || d == 'e' || d == 'E' || exponent_sign {
                    i += 1;
                } else {
                    break;
                }
            }
            let s = &input[start..i];
            let n: f64 = s.parse().map_err(|_| format!("invalid number '{s}'"))?;
            tokens.push(Token::Num(n));
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token::Ident(input[start..i].to_string()));
        } else {
            return Err(format!("unexpected character '{c}'"));
        }
    }

    Ok(tokens)
}

// ── Parser (recursive descent) ─────────────────────────────────

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

type ParseResult = std::result::Result<Node, String>;

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, expected: Token) -> std::result::Result<(), String> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            other => Err(format!("expected {expected:?}, got {other:?}")),
        }
    }

    fn parse_sum(&mut self) -> ParseResult {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Op::Add,
                Some(Token::Minus) => Op::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_product()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> ParseResult {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Op::Mul,
                Some(Token::Slash) => Op::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Node::Bin(op, Box::new(lhs), Box::new(rhs));
        }
    }

    // Every nested subexpression passes through here.
    fn parse_unary(&mut self) -> ParseResult {
        if self.depth >= MAX_NESTING {
            return Err("formula nested too deeply".to_string());
        }
        self.depth += 1;
        let node = self.parse_signed();
        self.depth -= 1;
        node
    }

    // `-x^2` is `-(x^2)`; `2^-1` is allowed.
    fn parse_signed(&mut self) -> ParseResult {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.parse_unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> ParseResult {
        let base = self.parse_atom()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            let exponent = self.parse_unary()?;
            return Ok(Node::Bin(Op::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> ParseResult {
        match self.next() {
            Some(Token::Num(n)) => Ok(Node::Const(n)),
            Some(Token::LParen) => {
                let e = self.parse_sum()?;
                self.expect(Token::RParen)?;
                Ok(e)
            }
            Some(Token::Ident(name)) if name == "x" => Ok(Node::X),
            Some(Token::Ident(name)) => {
                let func = Func::lookup(&name).ok_or_else(|| format!("unknown identifier '{name}'"))?;
                self.expect(Token::LParen)?;
                let mut args = vec![self.parse_sum()?];
                while matches!(self.peek(), Some(Token::Comma)) {
                    self.pos += 1;
                    args.push(self.parse_sum()?);
                }
                self.expect(Token::RParen)?;
                if args.len() != func.arity() {
                    return Err(format!(
                        "{name} takes {} argument(s), got {}",
                        func.arity(),
                        args.len()
                    ));
                }
                Ok(Node::Call(func, args))
            }
            other => Err(format!("expected number, 'x', function or '(', got {other:?}")),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

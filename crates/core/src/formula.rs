//! Scalar formulas over the surface domain `u`, `v` plus named constants.
//!
//! Constants are folded into literals at parse time, so a parsed
//! [`Formula`] only needs `u` and `v` to evaluate.

#[derive(Debug, Clone)]
enum Expr {
    Literal(f32),
    U,
    V,
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        func: Func,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Func {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Abs,
    Floor,
    Ceil,
    Exp,
    Ln,
    Log10,
    Atan2,
    Pow,
    Min,
    Max,
    Clamp,
    Lerp,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        let func = match name.to_lowercase().as_str() {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "asin" => Func::Asin,
            "acos" => Func::Acos,
            "atan" => Func::Atan,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            "sqrt" => Func::Sqrt,
            "abs" => Func::Abs,
            "floor" => Func::Floor,
            "ceil" => Func::Ceil,
            "exp" => Func::Exp,
            "ln" | "log" => Func::Ln,
            "log10" => Func::Log10,
            "atan2" => Func::Atan2,
            "pow" => Func::Pow,
            "min" => Func::Min,
            "max" => Func::Max,
            "clamp" => Func::Clamp,
            "lerp" => Func::Lerp,
            _ => return None,
        };
        Some(func)
    }

    fn arity(self) -> usize {
        match self {
            Func::Atan2 | Func::Pow | Func::Min | Func::Max => 2,
            Func::Clamp | Func::Lerp => 3,
            _ => 1,
        }
    }

    fn apply(self, a: &[f32; 3]) -> f32 {
        match self {
            Func::Sin => a[0].sin(),
            Func::Cos => a[0].cos(),
            Func::Tan => a[0].tan(),
            Func::Asin => a[0].asin(),
            Func::Acos => a[0].acos(),
            Func::Atan => a[0].atan(),
            Func::Sinh => a[0].sinh(),
            Func::Cosh => a[0].cosh(),
            Func::Tanh => a[0].tanh(),
            Func::Sqrt => a[0].sqrt(),
            Func::Abs => a[0].abs(),
            Func::Floor => a[0].floor(),
            Func::Ceil => a[0].ceil(),
            Func::Exp => a[0].exp(),
            Func::Ln => a[0].ln(),
            Func::Log10 => a[0].log10(),
            Func::Atan2 => a[0].atan2(a[1]),
            Func::Pow => a[0].powf(a[1]),
            Func::Min => a[0].min(a[1]),
            Func::Max => a[0].max(a[1]),
            // Not f32::clamp, which panics on an inverted range.
            Func::Clamp => a[0].max(a[1]).min(a[2]),
            Func::Lerp => a[0] + (a[1] - a[0]) * a[2],
        }
    }
}

impl Expr {
    fn eval(&self, u: f32, v: f32) -> f32 {
        match self {
            Expr::Literal(value) => *value,
            Expr::U => u,
            Expr::V => v,
            Expr::Neg(expr) => -expr.eval(u, v),
            Expr::Binary { op, left, right } => {
                let a = left.eval(u, v);
                let b = right.eval(u, v);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call { func, args } => {
                let mut values = [0.0; 3];
                for (slot, arg) in values.iter_mut().zip(args) {
                    *slot = arg.eval(u, v);
                }
                func.apply(&values)
            }
        }
    }
}

/// Named values available to formulas.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Constants {
    values: Vec<(String, f32)>,
}

impl Constants {
    /// Parses `name = expr` assignments separated by `;` or newlines.
    /// An assignment may use the ones before it; `u` and `v` are reserved
    /// and skipped.
    pub(crate) fn parse(code: &str) -> Result<Constants, String> {
        let mut constants = Constants::default();
        let mut parser = Parser::new(tokenize(code)?);
        while !parser.is_end() {
            parser.consume_separators();
            if parser.is_end() {
                break;
            }
            let name = match parser.next() {
                Some(Token::Ident(name)) => name,
                other => return Err(format!("Expected a variable name, got {:?}", other)),
            };
            parser.expect(Token::Equal)?;
            let expr = parser.parse_expr(&constants, false)?;
            if !matches!(parser.peek(), None | Some(Token::Semicolon)) {
                return Err(format!("Unexpected token {:?} after '{}'", parser.peek(), name));
            }
            if name == "u" || name == "v" {
                tracing::warn!("expression variable '{}' shadows the domain and is ignored", name);
                continue;
            }
            constants.values.push((name, expr.eval(0.0, 0.0)));
        }
        Ok(constants)
    }

    pub(crate) fn get(&self, name: &str) -> Option<f32> {
        self.values
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| *value)
    }
}

/// One parsed scalar expression in `u` and `v`.
#[derive(Debug, Clone)]
pub(crate) struct Formula {
    expr: Expr,
}

impl Formula {
    pub(crate) fn parse(code: &str, constants: &Constants) -> Result<Formula, String> {
        let mut parser = Parser::new(tokenize(code)?);
        parser.consume_separators();
        if parser.is_end() {
            return Err("Empty formula".to_string());
        }
        let expr = parser.parse_expr(constants, true)?;
        parser.consume_separators();
        if let Some(token) = parser.peek() {
            return Err(format!("Unexpected token {:?}", token));
        }
        Ok(Formula { expr })
    }

    pub(crate) fn eval(&self, u: f32, v: f32) -> f32 {
        self.expr.eval(u, v)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f32),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Equal,
    Semicolon,
}

fn number_at(chars: &[char], i: &mut usize) -> Result<f32, String> {
    let start = *i;
    *i += 1;
    while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '.') {
        *i += 1;
    }
    chars[start..*i]
        .iter()
        .collect::<String>()
        .parse()
        .map_err(|_| "Invalid number literal".to_string())
}

fn tokenize(code: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = code.chars().collect();
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        let single = match c {
            ' ' | '\t' | '\r' => None,
            '\n' | ';' => Some(Token::Semicolon),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            '=' => Some(Token::Equal),
            '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' => Some(Token::Slash),
            '0'..='9' | '.' => {
                tokens.push(Token::Number(number_at(&chars, &mut i)?));
                continue;
            }
            '_' | 'a'..='z' | 'A'..='Z' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                continue;
            }
            _ => return Err(format!("Unexpected character '{}'", c)),
        };
        if let Some(token) = single {
            tokens.push(token);
        }
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn is_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn consume_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Semicolon)) {
            self.pos += 1;
        }
    }

    /// `domain` allows `u` and `v`; constants are evaluated without them.
    fn parse_expr(&mut self, constants: &Constants, domain: bool) -> Result<Expr, String> {
        let mut expr = self.parse_term(constants, domain)?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_term(constants, domain)?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self, constants: &Constants, domain: bool) -> Result<Expr, String> {
        let mut expr = self.parse_unary(constants, domain)?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_unary(constants, domain)?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self, constants: &Constants, domain: bool) -> Result<Expr, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary(constants, domain)
            }
            Some(Token::Minus) => {
                self.pos += 1;
                let expr = self.parse_unary(constants, domain)?;
                Ok(Expr::Neg(Box::new(expr)))
            }
            _ => self.parse_power(constants, domain),
        }
    }

    /// Right-associative, binds tighter than unary minus: `-2^2` is `-4`.
    fn parse_power(&mut self, constants: &Constants, domain: bool) -> Result<Expr, String> {
        let base = self.parse_primary(constants, domain)?;
        if !matches!(self.peek(), Some(Token::Caret)) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.parse_unary(constants, domain)?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_primary(&mut self, constants: &Constants, domain: bool) -> Result<Expr, String> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Expr::Literal(value)),
            Some(Token::Ident(name)) => {
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.pos += 1;
                    return self.parse_call(&name, constants, domain);
                }
                match name.as_str() {
                    "u" if domain => Ok(Expr::U),
                    "v" if domain => Ok(Expr::V),
                    "u" | "v" => Err(format!("'{}' is not available here", name)),
                    _ => match constants.get(&name) {
                        Some(value) => Ok(Expr::Literal(value)),
                        None if name.eq_ignore_ascii_case("pi") => {
                            Ok(Expr::Literal(std::f32::consts::PI))
                        }
                        None if name == "E" => Ok(Expr::Literal(std::f32::consts::E)),
                        None => Err(format!("Unknown identifier '{}'", name)),
                    },
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expr(constants, domain)?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            other => Err(format!("Unexpected token {:?}", other)),
        }
    }

    fn parse_call(&mut self, name: &str, constants: &Constants, domain: bool) -> Result<Expr, String> {
        let func = Func::from_name(name).ok_or_else(|| format!("Unknown function '{}'", name))?;
        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                args.push(self.parse_expr(constants, domain)?);
                match self.peek() {
                    Some(Token::Comma) => {
                        self.pos += 1;
                    }
                    Some(Token::RParen) => break,
                    _ => return Err("Expected ',' or ')' in function call".to_string()),
                }
            }
        }
        self.expect(Token::RParen)?;
        if args.len() != func.arity() {
            return Err(format!(
                "{}() takes {} arguments, got {}",
                name,
                func.arity(),
                args.len()
            ));
        }
        Ok(Expr::Call { func, args })
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            other => Err(format!("Expected {:?}, got {:?}", token, other)),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

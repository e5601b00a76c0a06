use graphcalc_lexer::Token;
use serde::{Deserialize, Serialize};

mod display;
mod functions;

pub use functions::{is_reserved, validate_variable, Constant, Function};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expr {
    Number(String),
    Const(Constant),
    Var(String),
    Call(Function, Vec<Expr>),
    Unary(UnOp, Box<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Minus,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum TreeKind {
    Expression(Expr),
    Equation { lhs: Expr, rhs: Expr },
}

/// A parsed formula together with the variable it was parsed against.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExpressionTree {
    pub variable: String,
    pub kind: TreeKind,
}

impl ExpressionTree {
    pub fn is_equation(&self) -> bool {
        matches!(self.kind, TreeKind::Equation { .. })
    }

    /// The left side of an equation, or the whole expression.
    pub fn lhs(&self) -> &Expr {
        match &self.kind {
            TreeKind::Expression(e) => e,
            TreeKind::Equation { lhs, .. } => lhs,
        }
    }

    pub fn rhs(&self) -> Option<&Expr> {
        match &self.kind {
            TreeKind::Expression(_) => None,
            TreeKind::Equation { rhs, .. } => Some(rhs),
        }
    }

    pub fn expression(&self) -> Option<&Expr> {
        match &self.kind {
            TreeKind::Expression(e) => Some(e),
            TreeKind::Equation { .. } => None,
        }
    }
}

impl Expr {
    /// Build a literal from a float. Negative values become a negated literal
    /// and NaN becomes `inf - inf` so the tree stays re-parseable.
    pub fn number(value: f64) -> Expr {
        if value.is_nan() {
            return Expr::Binary(
                Box::new(Expr::Const(Constant::Inf)),
                BinOp::Sub,
                Box::new(Expr::Const(Constant::Inf)),
            );
        }
        let magnitude = if value.is_infinite() {
            Expr::Const(Constant::Inf)
        } else {
            Expr::Number(format!("{}", value.abs()))
        };
        if value.is_sign_negative() && value != 0.0 {
            Expr::Unary(UnOp::Minus, Box::new(magnitude))
        } else {
            magnitude
        }
    }

    pub fn mentions_var(&self, name: &str) -> bool {
        match self {
            Expr::Var(v) => v == name,
            Expr::Number(_) | Expr::Const(_) => false,
            Expr::Call(_, args) => args.iter().any(|a| a.mentions_var(name)),
            Expr::Unary(_, e) => e.mentions_var(name),
            Expr::Binary(l, _, r) => l.mentions_var(name) || r.mentions_var(name),
        }
    }
}

#[derive(Clone)]
struct TokenInfo {
    token: Token,
    lexeme: String,
    position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
    pub found_token: Option<String>,
    pub expected: Option<String>,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at position {}: {}",
            self.position, self.message
        )?;
        if let Some(found) = &self.found_token {
            write!(f, " (found: '{found}')")?;
        }
        if let Some(expected) = &self.expected {
            write!(f, " (expected: {expected})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Parse `input` as a formula in `variable`.
///
/// A single `=` makes the result an equation; any other identifier must be
/// the variable, a whitelisted function applied with parentheses, or a named
/// constant.
pub fn parse(input: &str, variable: &str) -> Result<ExpressionTree, ParseError> {
    use graphcalc_lexer::tokenize_detailed;

    validate_variable(variable)?;

    let toks = tokenize_detailed(input);
    let mut tokens = Vec::with_capacity(toks.len());
    for t in toks {
        if matches!(t.token, Token::Error) {
            return Err(ParseError {
                message: format!("Invalid token: '{}'", t.lexeme),
                position: t.start,
                found_token: Some(t.lexeme),
                expected: None,
            });
        }
        tokens.push(TokenInfo {
            token: t.token,
            lexeme: t.lexeme,
            position: t.start,
        });
    }

    if tokens.is_empty() {
        return Err(ParseError {
            message: "empty expression".to_string(),
            position: 0,
            found_token: None,
            expected: Some("an expression".to_string()),
        });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        input_len: input.len(),
        variable,
    };
    let kind = parser.parse_tree()?;
    Ok(ExpressionTree {
        variable: variable.to_string(),
        kind,
    })
}

struct Parser<'a> {
    tokens: Vec<TokenInfo>,
    pos: usize,
    input_len: usize,
    variable: &'a str,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> ParseError {
        let (position, found_token) = if let Some(token_info) = self.tokens.get(self.pos) {
            (token_info.position, Some(token_info.lexeme.clone()))
        } else {
            (self.input_len, None)
        };

        ParseError {
            message: message.to_string(),
            position,
            found_token,
            expected: None,
        }
    }

    fn error_with_expected(&self, message: &str, expected: &str) -> ParseError {
        let mut err = self.error(message);
        err.expected = Some(expected.to_string());
        err
    }

    fn parse_tree(&mut self) -> Result<TreeKind, ParseError> {
        let lhs = self.parse_expr()?;
        if !self.consume(&Token::Assign) {
            self.expect_end()?;
            return Ok(TreeKind::Expression(lhs));
        }
        if self.peek_token().is_none() {
            return Err(self.error_with_expected(
                "dangling '=' with nothing on its right side",
                "an expression",
            ));
        }
        let rhs = self.parse_expr()?;
        if self.peek_token() == Some(&Token::Assign) {
            return Err(self.error("an equation may contain only one '='"));
        }
        self.expect_end()?;
        Ok(TreeKind::Equation { lhs, rhs })
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek_token() {
            None => Ok(()),
            Some(Token::RParen) => Err(self.error("unbalanced ')' with no matching '('")),
            Some(_) => Err(self.error("unexpected token after end of expression")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.parse_mul_div()?;
        loop {
            let op = if self.consume(&Token::Plus) {
                BinOp::Add
            } else if self.consume(&Token::Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.parse_mul_div()?;
            node = Expr::Binary(Box::new(node), op, Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_mul_div(&mut self) -> Result<Expr, ParseError> {
        let mut node = self.parse_unary()?;
        loop {
            match self.peek_token() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    node = Expr::Binary(Box::new(node), BinOp::Mul, Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    node = Expr::Binary(Box::new(node), BinOp::Div, Box::new(rhs));
                }
                // Juxtaposition: `2x`, `2(x+1)`, `x pi`. The implicit operand
                // cannot start with a sign, so `x -1` stays a subtraction.
                Some(t) if t.starts_operand() => {
                    let rhs = self.parse_pow()?;
                    node = Expr::Binary(Box::new(node), BinOp::Mul, Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if self.consume(&Token::Plus) {
            Ok(Expr::Unary(UnOp::Plus, Box::new(self.parse_unary()?)))
        } else if self.consume(&Token::Minus) {
            Ok(Expr::Unary(UnOp::Minus, Box::new(self.parse_unary()?)))
        } else {
            self.parse_pow()
        }
    }

    fn parse_pow(&mut self) -> Result<Expr, ParseError> {
        let node = self.parse_primary()?;
        if matches!(self.peek_token(), Some(Token::Caret | Token::StarStar)) {
            self.pos += 1;
            // right associative, and `2^-x` is allowed
            let rhs = self.parse_unary()?;
            Ok(Expr::Binary(Box::new(node), BinOp::Pow, Box::new(rhs)))
        } else {
            Ok(node)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let Some(info) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error_with_expected("unexpected end of input", "an expression"));
        };
        match info.token {
            Token::Integer | Token::Float => {
                self.pos += 1;
                Ok(Expr::Number(info.lexeme))
            }
            Token::Ident => self.parse_identifier(info),
            Token::LParen => {
                self.pos += 1;
                let expr = self.parse_expr()?;
                if !self.consume(&Token::RParen) {
                    return Err(self.error_with_expected("unbalanced '('", "')'"));
                }
                Ok(expr)
            }
            _ => {
                let desc = match info.token {
                    Token::RParen => "closing parenthesis ')' with no matching '('",
                    Token::Comma => "comma ',' outside a function call",
                    Token::Assign => "'=' where an expression was expected",
                    Token::Star | Token::StarStar | Token::Slash | Token::Caret => {
                        "operator with no left operand"
                    }
                    _ => "token",
                };
                Err(self.error(&format!("unexpected {desc}")))
            }
        }
    }

    fn parse_identifier(&mut self, info: TokenInfo) -> Result<Expr, ParseError> {
        let name = info.lexeme.as_str();
        if let Some(func) = Function::from_name(name) {
            self.pos += 1;
            if !self.consume(&Token::LParen) {
                return Err(self.error_with_expected(
                    &format!("function '{name}' must be called with parentheses"),
                    "'('",
                ));
            }
            let args = self.parse_args()?;
            return Ok(Expr::Call(func, args));
        }
        if let Some(constant) = Constant::from_name(name) {
            self.pos += 1;
            return Ok(Expr::Const(constant));
        }
        if name == self.variable {
            self.pos += 1;
            return Ok(Expr::Var(info.lexeme));
        }
        Err(self.error(&format!("unknown identifier '{name}'")))
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.consume(&Token::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if self.consume(&Token::Comma) {
                continue;
            }
            if self.consume(&Token::RParen) {
                break;
            }
            return Err(self.error_with_expected(
                "unbalanced '(' in function call",
                "',' or ')'",
            ));
        }
        Ok(args)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn consume(&mut self, t: &Token) -> bool {
        if self.peek_token() == Some(t) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

use logos::Logos;

#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Identifiers and literals
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
    #[regex(r"\d+\.\d*([eE][+-]?\d+)?")]
    #[regex(r"\.\d+([eE][+-]?\d+)?")]
    Float,
    #[regex(r"\d+([eE][+-]?\d+)?")]
    Integer,

    // `**` must win over two `*` tokens
    #[token("**")]
    StarStar,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("=")]
    Assign,
    #[token(",")]
    Comma,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    Error,
}

impl Token {
    /// Whether this token can begin an operand, which is what makes
    /// juxtaposition (`2x`, `(x+1)(x-1)`) an implicit product.
    pub fn starts_operand(&self) -> bool {
        matches!(
            self,
            Token::Ident | Token::Float | Token::Integer | Token::LParen
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub lexeme: String,
    pub start: usize,
    pub end: usize,
}

pub fn tokenize(input: &str) -> Vec<Token> {
    tokenize_detailed(input)
        .into_iter()
        .map(|t| t.token)
        .collect()
}

pub fn tokenize_detailed(input: &str) -> Vec<SpannedToken> {
    let mut lex = Token::lexer(input);
    let mut out: Vec<SpannedToken> = Vec::new();
    while let Some(res) = lex.next() {
        let span = lex.span();
        let lexeme = lex.slice().to_string();
        match res {
            Ok(token) => out.push(SpannedToken {
                token,
                lexeme,
                start: span.start,
                end: span.end,
            }),
            Err(_) => {
                // Keep the offending text so the parser can quote it back verbatim.
                out.push(SpannedToken {
                    token: Token::Error,
                    lexeme,
                    start: span.start,
                    end: span.end,
                });
            }
        }
    }
    out
}

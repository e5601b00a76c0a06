use graphcalc_lexer::{tokenize, Token};

#[test]
fn arithmetic_operators() {
    assert_eq!(
        tokenize("a + b - c * d / e ^ f"),
        vec![
            Token::Ident,
            Token::Plus,
            Token::Ident,
            Token::Minus,
            Token::Ident,
            Token::Star,
            Token::Ident,
            Token::Slash,
            Token::Ident,
            Token::Caret,
            Token::Ident
        ]
    );
}

#[test]
fn double_star_is_one_token() {
    assert_eq!(
        tokenize("x**2"),
        vec![Token::Ident, Token::StarStar, Token::Integer]
    );
    assert_eq!(
        tokenize("x * *2"),
        vec![Token::Ident, Token::Star, Token::Star, Token::Integer]
    );
}

#[test]
fn equation_and_call_punctuation() {
    assert_eq!(
        tokenize("log(x, 2) = 3"),
        vec![
            Token::Ident,
            Token::LParen,
            Token::Ident,
            Token::Comma,
            Token::Integer,
            Token::RParen,
            Token::Assign,
            Token::Integer
        ]
    );
}

#[test]
fn unsupported_characters_become_error_tokens() {
    let toks = graphcalc_lexer::tokenize_detailed("x % 2");
    assert_eq!(toks[1].token, Token::Error);
    assert_eq!(toks[1].lexeme, "%");
    assert_eq!(toks[1].start, 2);
}

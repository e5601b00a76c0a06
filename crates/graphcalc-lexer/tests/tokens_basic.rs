use graphcalc_lexer::{tokenize, tokenize_detailed, Token};

#[test]
fn numbers_and_identifiers() {
    assert_eq!(
        tokenize("3 4.5 .25 1e3 2.5E-2 x_1"),
        vec![
            Token::Integer,
            Token::Float,
            Token::Float,
            Token::Integer,
            Token::Float,
            Token::Ident
        ]
    );
}

#[test]
fn implicit_product_is_two_tokens() {
    assert_eq!(tokenize("2x"), vec![Token::Integer, Token::Ident]);
    assert_eq!(
        tokenize("(x+1)(x-1)"),
        vec![
            Token::LParen,
            Token::Ident,
            Token::Plus,
            Token::Integer,
            Token::RParen,
            Token::LParen,
            Token::Ident,
            Token::Minus,
            Token::Integer,
            Token::RParen
        ]
    );
}

#[test]
fn whitespace_is_skipped_and_spans_are_byte_offsets() {
    let toks = tokenize_detailed("  sin( x )\n");
    let spans: Vec<(usize, usize)> = toks.iter().map(|t| (t.start, t.end)).collect();
    assert_eq!(spans, vec![(2, 5), (5, 6), (7, 8), (9, 10)]);
    assert_eq!(toks[0].lexeme, "sin");
}

#[test]
fn empty_input_has_no_tokens() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   \t").is_empty());
}

#[test]
fn operand_starters() {
    assert!(Token::Ident.starts_operand());
    assert!(Token::LParen.starts_operand());
    assert!(!Token::Minus.starts_operand());
    assert!(!Token::RParen.starts_operand());
}

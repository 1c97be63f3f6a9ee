use crate::lexer::tokens::TokenType;
use crate::lexer::Lexer;

/// Collects the token types of an entire source string, up to and
/// including the first EOF.
fn token_types(src: &str) -> Vec<TokenType> {
    let mut lexer = Lexer::new(src);
    let mut types = vec![];

    loop {
        let token = lexer.next_token();
        let token_type = token.token_type;
        types.push(token_type);

        if token_type == TokenType::EOF {
            return types;
        }
    }
}

#[test]
fn scans_punctuation_and_operators() {
    let types = token_types("( ) { } , . ; - + / * ! != = == < <= > >=");

    assert_eq!(
        types,
        vec![
            TokenType::L_PAREN,
            TokenType::R_PAREN,
            TokenType::L_CURLY,
            TokenType::R_CURLY,
            TokenType::COMMA,
            TokenType::DOT,
            TokenType::SEMICOLON,
            TokenType::MINUS,
            TokenType::PLUS,
            TokenType::SLASH,
            TokenType::STAR,
            TokenType::LOGIC_NOT,
            TokenType::LOGIC_NOT_EQ,
            TokenType::EQUALS,
            TokenType::LOGIC_EQ,
            TokenType::LESS_THAN,
            TokenType::LESS_THAN_EQ,
            TokenType::GREATER_THAN,
            TokenType::GREATER_THAN_EQ,
            TokenType::EOF,
        ]
    );
}

#[test]
fn scans_keywords_and_identifiers() {
    let types = token_types("and class else false for fun if nil or print return super this true var while andy");

    assert_eq!(
        types,
        vec![
            TokenType::LOGIC_AND,
            TokenType::CLASS_KW,
            TokenType::ELSE_KW,
            TokenType::FALSE,
            TokenType::FOR_KW,
            TokenType::FUN_KW,
            TokenType::IF_KW,
            TokenType::NIL,
            TokenType::LOGIC_OR,
            TokenType::PRINT_KW,
            TokenType::RETURN_KW,
            TokenType::SUPER_KW,
            TokenType::THIS_KW,
            TokenType::TRUE,
            TokenType::VAR_KW,
            TokenType::WHILE_KW,
            TokenType::IDENTIFIER,
            TokenType::EOF,
        ]
    );
}

#[test]
fn scans_number_literals() {
    let mut lexer = Lexer::new("123 4.5 6.");

    let a = lexer.next_token();
    assert_eq!(a.token_type, TokenType::NUMBER);
    assert_eq!(a.lexeme, "123");

    let b = lexer.next_token();
    assert_eq!(b.token_type, TokenType::NUMBER);
    assert_eq!(b.lexeme, "4.5");

    // A trailing dot is not part of the number.
    let c = lexer.next_token();
    assert_eq!(c.token_type, TokenType::NUMBER);
    assert_eq!(c.lexeme, "6");
    assert_eq!(lexer.next_token().token_type, TokenType::DOT);
}

#[test]
fn scans_string_literals_with_quotes_in_lexeme() {
    let mut lexer = Lexer::new("\"hello world\"");

    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::STRING);
    assert_eq!(token.lexeme, "\"hello world\"");
}

#[test]
fn strings_may_span_lines() {
    let mut lexer = Lexer::new("\"a\nb\" x");

    let string = lexer.next_token();
    assert_eq!(string.token_type, TokenType::STRING);
    assert_eq!(string.line_num, 2);

    let ident = lexer.next_token();
    assert_eq!(ident.line_num, 2);
}

#[test]
fn reports_unterminated_string() {
    let mut lexer = Lexer::new("\"oops");

    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::ERROR);
    assert_eq!(token.lexeme, "Unterminated string.");
}

#[test]
fn reports_unexpected_character() {
    let mut lexer = Lexer::new("@");

    let token = lexer.next_token();
    assert_eq!(token.token_type, TokenType::ERROR);
    assert_eq!(token.lexeme, "Unexpected character.");
}

#[test]
fn skips_comments_and_tracks_lines() {
    let mut lexer = Lexer::new("// first line\nvar x; // trailing\nprint x;");

    let var_kw = lexer.next_token();
    assert_eq!(var_kw.token_type, TokenType::VAR_KW);
    assert_eq!(var_kw.line_num, 2);

    lexer.next_token(); // x
    lexer.next_token(); // ;

    let print_kw = lexer.next_token();
    assert_eq!(print_kw.token_type, TokenType::PRINT_KW);
    assert_eq!(print_kw.line_num, 3);
}

#[test]
fn eof_repeats_once_exhausted() {
    let mut lexer = Lexer::new(";");

    assert_eq!(lexer.next_token().token_type, TokenType::SEMICOLON);
    assert_eq!(lexer.next_token().token_type, TokenType::EOF);
    assert_eq!(lexer.next_token().token_type, TokenType::EOF);
    assert_eq!(lexer.next_token().token_type, TokenType::EOF);
}

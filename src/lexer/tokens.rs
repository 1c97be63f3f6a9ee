/// A token that represents a single unit of Lox code.
#[derive(Clone)]
pub struct Token {
    /// The token's line number
    pub line_num: usize,
    /// The token's type
    pub token_type: TokenType,
    /// The token's lexeme. For `ERROR` tokens, this is
    /// the error message instead.
    pub lexeme: String,
}

impl Token {
    /// Generates the synthetic token used to initialize the compiler
    /// before the first call to `advance()`.
    pub fn initial() -> Token {
        Token {
            line_num: 0,
            token_type: TokenType::__INIT_COMPILER__,
            lexeme: String::from(""),
        }
    }
}

/// The types of tokens in a Lox program.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TokenType {
    CLASS_KW,
    COMMA,
    DOT,
    ELSE_KW,
    EOF,
    EQUALS,
    ERROR,
    FALSE,
    FOR_KW,
    FUN_KW,
    GREATER_THAN,
    GREATER_THAN_EQ,
    IDENTIFIER,
    IF_KW,
    LESS_THAN,
    LESS_THAN_EQ,
    LOGIC_AND,
    LOGIC_EQ,
    LOGIC_NOT,
    LOGIC_NOT_EQ,
    LOGIC_OR,
    L_CURLY,
    L_PAREN,
    MINUS,
    NIL,
    NUMBER,
    PLUS,
    PRINT_KW,
    RETURN_KW,
    R_CURLY,
    R_PAREN,
    SEMICOLON,
    SLASH,
    STAR,
    STRING,
    SUPER_KW,
    THIS_KW,
    TRUE,
    VAR_KW,
    WHILE_KW,

    // This one is only used to initialize the compiler
    __INIT_COMPILER__,
}

/// Maps a keyword string to a token type.
///
/// ## Arguments
/// * `id` – The identifier's string name.
///
/// ## Returns
/// `TokenType` – The type of token matched for the given identifier name.
pub fn make_identifier_type(id: &str) -> TokenType {
    match id {
        "and" => TokenType::LOGIC_AND,
        "class" => TokenType::CLASS_KW,
        "else" => TokenType::ELSE_KW,
        "false" => TokenType::FALSE,
        "for" => TokenType::FOR_KW,
        "fun" => TokenType::FUN_KW,
        "if" => TokenType::IF_KW,
        "nil" => TokenType::NIL,
        "or" => TokenType::LOGIC_OR,
        "print" => TokenType::PRINT_KW,
        "return" => TokenType::RETURN_KW,
        "super" => TokenType::SUPER_KW,
        "this" => TokenType::THIS_KW,
        "true" => TokenType::TRUE,
        "var" => TokenType::VAR_KW,
        "while" => TokenType::WHILE_KW,
        _ => TokenType::IDENTIFIER,
    }
}

use crate::lexer::tokens::TokenType;

/// Represents the precedence of different expressions in ascending order.
/// For example, `PREC_EQUALITY` has lower precedence than `PREC_UNARY`
/// because `PREC_EQUALITY` appears earlier in the enum, and `PREC_UNARY`
/// appears after.
#[allow(non_camel_case_types)]
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy)]
#[repr(u8)]
pub enum Precedence {
    PREC_NONE,
    PREC_ASSIGNMENT, // =
    PREC_OR,         // or
    PREC_AND,        // and
    PREC_EQUALITY,   // == !=
    PREC_COMPARISON, // < > <= >=
    PREC_TERM,       // + -
    PREC_FACTOR,     // * /
    PREC_UNARY,      // ! -
    PREC_CALL,       // ()
    PREC_PRIMARY,
}

impl Precedence {
    /// Gets the Precedence variant associated with a given numeric value.
    ///
    /// ## Arguments
    /// * `val` – The numeric value of the expected variant.
    ///
    /// ## Returns
    /// `Precedence` – The Precedence variant associated with the
    /// provided numeric value.
    pub fn get_by_val(val: u8) -> Precedence {
        match val {
            0 => Precedence::PREC_NONE,
            1 => Precedence::PREC_ASSIGNMENT,
            2 => Precedence::PREC_OR,
            3 => Precedence::PREC_AND,
            4 => Precedence::PREC_EQUALITY,
            5 => Precedence::PREC_COMPARISON,
            6 => Precedence::PREC_TERM,
            7 => Precedence::PREC_FACTOR,
            8 => Precedence::PREC_UNARY,
            9 => Precedence::PREC_CALL,
            10 => Precedence::PREC_PRIMARY,
            _ => Precedence::PREC_NONE, // Should never be reached
        }
    }

    /// Gets the next-higher precedence level. Used by left-associative
    /// infix operators to parse their right operand.
    pub fn one_higher(&self) -> Precedence {
        Precedence::get_by_val(*self as u8 + 1)
    }
}

/// The set of compiling functions that can be associated
/// with a given token.
#[derive(Clone, Copy)]
pub enum ParseFn {
    CompileBinaryExpr,
    CompileFuncCall,
    CompileGrouping,
    CompileLiteral,
    CompileLogicAnd,
    CompileLogicOr,
    CompileNumeric,
    CompileString,
    CompileUnary,
    CompileVariable,
    NONE, // Do not call a parsing function
}

/// Wraps the parsing properties of a token so that they
/// can be easily accessed throughout the compiler.
pub struct ParserRule {
    pub prefix: ParseFn,
    pub infix: ParseFn,
    pub precedence: Precedence,
}

/// Gets the parsing rule associated with a token type.
pub fn get_rule(tok_type: TokenType) -> ParserRule {
    match tok_type {
        TokenType::FALSE => ParserRule {
            prefix: ParseFn::CompileLiteral,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::GREATER_THAN => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_COMPARISON,
        },

        TokenType::GREATER_THAN_EQ => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_COMPARISON,
        },

        TokenType::IDENTIFIER => ParserRule {
            prefix: ParseFn::CompileVariable,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::LESS_THAN => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_COMPARISON,
        },

        TokenType::LESS_THAN_EQ => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_COMPARISON,
        },

        TokenType::LOGIC_AND => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileLogicAnd,
            precedence: Precedence::PREC_AND,
        },

        TokenType::LOGIC_EQ => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_EQUALITY,
        },

        TokenType::LOGIC_NOT => ParserRule {
            prefix: ParseFn::CompileUnary,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::LOGIC_NOT_EQ => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_EQUALITY,
        },

        TokenType::LOGIC_OR => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileLogicOr,
            precedence: Precedence::PREC_OR,
        },

        TokenType::L_PAREN => ParserRule {
            prefix: ParseFn::CompileGrouping,
            infix: ParseFn::CompileFuncCall,
            precedence: Precedence::PREC_CALL,
        },

        TokenType::MINUS => ParserRule {
            prefix: ParseFn::CompileUnary,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_TERM,
        },

        TokenType::NIL => ParserRule {
            prefix: ParseFn::CompileLiteral,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::NUMBER => ParserRule {
            prefix: ParseFn::CompileNumeric,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::PLUS => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_TERM,
        },

        TokenType::SLASH => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_FACTOR,
        },

        TokenType::STAR => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::CompileBinaryExpr,
            precedence: Precedence::PREC_FACTOR,
        },

        TokenType::STRING => ParserRule {
            prefix: ParseFn::CompileString,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        TokenType::TRUE => ParserRule {
            prefix: ParseFn::CompileLiteral,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },

        // The rest of the tokens do not have a parse rule
        _ => ParserRule {
            prefix: ParseFn::NONE,
            infix: ParseFn::NONE,
            precedence: Precedence::PREC_NONE,
        },
    }
}

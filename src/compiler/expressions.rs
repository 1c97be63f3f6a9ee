use crate::chunk::op_codes::OpCode;
use crate::compiler::precedence::{get_rule, ParseFn, Precedence};
use crate::compiler::Compiler;
use crate::lexer::tokens::TokenType;
use crate::objects::Object;
use std::rc::Rc;

impl Compiler {
    /// Compiles a single expression.
    pub(super) fn expression(&mut self) {
        self.parse_precedence(Precedence::PREC_ASSIGNMENT);
    }

    /// The core of the Pratt parser. Compiles the prefix expression that
    /// starts at the current token, then keeps folding infix operators
    /// into it for as long as their precedence is at least the one
    /// requested by the caller.
    ///
    /// ## Arguments
    /// * `precedence` – The lowest operator precedence this call is
    /// willing to consume.
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();

        // Only the outermost expression of an assignment target may
        // consume an `=` sign.
        let can_assign = precedence <= Precedence::PREC_ASSIGNMENT;

        match get_rule(self.previous.token_type).prefix {
            ParseFn::NONE => {
                self.error_at_previous("Expect expression.");
                return;
            }
            prefix => self.exec_parse_fn(prefix, can_assign),
        }

        while precedence <= get_rule(self.current.token_type).precedence {
            self.advance();
            let infix = get_rule(self.previous.token_type).infix;
            self.exec_parse_fn(infix, can_assign);
        }

        // If the `=` sign is still sitting in the token stream at this
        // point, no assignment target consumed it.
        if can_assign && self.matches(TokenType::EQUALS) {
            self.error_at_previous("Invalid assignment target.");
        }
    }

    /// Executes the compiling function associated with a parse rule.
    fn exec_parse_fn(&mut self, func: ParseFn, can_assign: bool) {
        match func {
            ParseFn::CompileBinaryExpr => self.compile_binary_expr(),
            ParseFn::CompileFuncCall => self.compile_func_call_expr(),
            ParseFn::CompileGrouping => self.compile_grouping_expr(),
            ParseFn::CompileLiteral => self.compile_literal_expr(),
            ParseFn::CompileLogicAnd => self.compile_logic_and_expr(),
            ParseFn::CompileLogicOr => self.compile_logic_or_expr(),
            ParseFn::CompileNumeric => self.compile_numeric_expr(),
            ParseFn::CompileString => self.compile_string_expr(),
            ParseFn::CompileUnary => self.compile_unary_expr(),
            ParseFn::CompileVariable => self.compile_variable_expr(can_assign),
            ParseFn::NONE => unreachable!("Tokens without a parse rule are rejected before this."),
        }
    }

    /// Compiles a parenthesized expression.
    fn compile_grouping_expr(&mut self) {
        self.expression();
        self.consume(TokenType::R_PAREN, "Expect ')' after expression.");
    }

    /// Compiles a number literal.
    fn compile_numeric_expr(&mut self) {
        let line = self.previous.line_num;

        let value = match self.previous.lexeme.parse::<f64>() {
            Ok(x) => x,
            Err(_) => unreachable!("The lexer only emits NUMBER tokens for valid float lexemes."),
        };

        self.emit_constant(Object::Number(value), line);
    }

    /// Compiles a string literal. The surrounding quotes are stripped;
    /// the payload is taken verbatim.
    fn compile_string_expr(&mut self) {
        let line = self.previous.line_num;

        let lexeme = &self.previous.lexeme;
        let chars = &lexeme[1..(lexeme.len() - 1)];
        let value = Object::String(Rc::from(chars));

        self.emit_constant(value, line);
    }

    /// Compiles a `true`, `false`, or `nil` literal.
    fn compile_literal_expr(&mut self) {
        let line = self.previous.line_num;

        match self.previous.token_type {
            TokenType::FALSE => self.emit_op_code(OpCode::LoadImmFalse, line),
            TokenType::NIL => self.emit_op_code(OpCode::LoadImmNil, line),
            TokenType::TRUE => self.emit_op_code(OpCode::LoadImmTrue, line),
            _ => unreachable!("Only literal tokens carry the CompileLiteral rule."),
        }
    }

    /// Compiles a unary expression: the operand first, then the operator.
    fn compile_unary_expr(&mut self) {
        let opr_type = self.previous.token_type;
        let line = self.previous.line_num;

        self.parse_precedence(Precedence::PREC_UNARY);

        match opr_type {
            TokenType::MINUS => self.emit_op_code(OpCode::Negate, line),
            TokenType::LOGIC_NOT => self.emit_op_code(OpCode::LogicNot, line),
            _ => unreachable!("Only '-' and '!' carry the CompileUnary rule."),
        }
    }

    /// Compiles a binary expression. The left operand has already been
    /// compiled; this compiles the right operand with one precedence
    /// level above the operator's (left associativity), then emits the
    /// operator's instruction.
    fn compile_binary_expr(&mut self) {
        let opr_type = self.previous.token_type;
        let line = self.previous.line_num;

        let rule = get_rule(opr_type);
        self.parse_precedence(rule.precedence.one_higher());

        match opr_type {
            TokenType::PLUS => self.emit_op_code(OpCode::Add, line),
            TokenType::MINUS => self.emit_op_code(OpCode::Subtract, line),
            TokenType::STAR => self.emit_op_code(OpCode::Multiply, line),
            TokenType::SLASH => self.emit_op_code(OpCode::Divide, line),
            TokenType::LOGIC_EQ => self.emit_op_code(OpCode::Equals, line),
            TokenType::LOGIC_NOT_EQ => {
                // a != b  lowers to  !(a == b)
                self.emit_op_code(OpCode::Equals, line);
                self.emit_op_code(OpCode::LogicNot, line);
            }
            TokenType::GREATER_THAN => self.emit_op_code(OpCode::GreaterThan, line),
            TokenType::GREATER_THAN_EQ => {
                // a >= b  lowers to  !(a < b)
                self.emit_op_code(OpCode::LessThan, line);
                self.emit_op_code(OpCode::LogicNot, line);
            }
            TokenType::LESS_THAN => self.emit_op_code(OpCode::LessThan, line),
            TokenType::LESS_THAN_EQ => {
                // a <= b  lowers to  !(a > b)
                self.emit_op_code(OpCode::GreaterThan, line);
                self.emit_op_code(OpCode::LogicNot, line);
            }
            _ => unreachable!("Only binary operators carry the CompileBinaryExpr rule."),
        }
    }

    /// Compiles a logical `and` expression. If the lhs is falsey, the
    /// whole expression must be falsey, so the rhs is jumped over and
    /// the lhs value remains on the stack as the result.
    fn compile_logic_and_expr(&mut self) {
        let line = self.previous.line_num;

        let end_jump = self.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op_code(OpCode::PopStackTop, line);
        self.parse_precedence(Precedence::PREC_AND);
        self.patch_jump(end_jump);
    }

    /// Compiles a logical `or` expression. If the lhs is truthy, the
    /// rhs is jumped over and the lhs value remains on the stack as
    /// the result.
    fn compile_logic_or_expr(&mut self) {
        let line = self.previous.line_num;

        let else_jump = self.emit_jump(OpCode::JumpIfFalse, line);
        let end_jump = self.emit_jump(OpCode::JumpForward, line);

        self.patch_jump(else_jump);
        self.emit_op_code(OpCode::PopStackTop, line);

        self.parse_precedence(Precedence::PREC_OR);
        self.patch_jump(end_jump);
    }

    /// Compiles a variable access or assignment expression.
    fn compile_variable_expr(&mut self, can_assign: bool) {
        let name = self.previous.clone();
        self.named_variable(&name, can_assign);
    }

    /// Compiles a function call expression. The callee has already been
    /// compiled; this compiles the arguments and emits the call.
    fn compile_func_call_expr(&mut self) {
        let line = self.previous.line_num;
        let arg_count = self.compile_argument_list();
        self.emit_op_code_with_byte(OpCode::FuncCall, arg_count, line);
    }

    /// Compiles the argument list of a call expression, leaving each
    /// argument value on the stack.
    ///
    /// ## Returns
    /// `u8` – The number of arguments compiled.
    fn compile_argument_list(&mut self) -> u8 {
        let mut arg_count: usize = 0;

        if !self.check(TokenType::R_PAREN) {
            loop {
                self.expression();

                if arg_count == 255 {
                    self.error_at_previous("Can't have more than 255 arguments.");
                } else {
                    arg_count += 1;
                }

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::R_PAREN, "Expect ')' after arguments.");
        arg_count as u8
    }
}

use crate::chunk::op_codes::OpCode;
use crate::compiler::Compiler;
use crate::lexer::tokens::TokenType;

impl Compiler {
    /// Compiles a single declaration: a function or variable declaration,
    /// or any other statement. After an error, skips tokens up to the
    /// next statement boundary so that one mistake does not cascade.
    pub(super) fn declaration(&mut self) {
        if self.matches(TokenType::FUN_KW) {
            self.fun_declaration();
        } else if self.matches(TokenType::VAR_KW) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.is_in_panic {
            self.synchronize();
        }
    }

    /// Compiles a single statement.
    fn statement(&mut self) {
        if self.matches(TokenType::PRINT_KW) {
            self.print_statement();
        } else if self.matches(TokenType::FOR_KW) {
            self.for_statement();
        } else if self.matches(TokenType::IF_KW) {
            self.if_statement();
        } else if self.matches(TokenType::RETURN_KW) {
            self.return_statement();
        } else if self.matches(TokenType::WHILE_KW) {
            self.while_statement();
        } else if self.matches(TokenType::L_CURLY) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    /// Compiles a block: declarations up to the closing brace. Scope
    /// handling is left to the caller, since function bodies reuse the
    /// scope their parameters were declared in.
    pub(super) fn block(&mut self) {
        while !self.check(TokenType::R_CURLY) && !self.check(TokenType::EOF) {
            self.declaration();
        }

        self.consume(TokenType::R_CURLY, "Expect '}' after block.");
    }

    /// Compiles a variable declaration. Without an initializer the
    /// variable starts out as `nil`.
    pub(super) fn var_declaration(&mut self) {
        let global = self.parse_variable("Expect variable name.");
        let line = self.previous.line_num;

        if self.matches(TokenType::EQUALS) {
            self.expression();
        } else {
            self.emit_op_code(OpCode::LoadImmNil, line);
        }

        self.consume(TokenType::SEMICOLON, "Expect ';' after variable declaration.");
        self.define_variable(global, line);
    }

    /// Compiles a print statement.
    fn print_statement(&mut self) {
        let line = self.previous.line_num;

        self.expression();
        self.consume(TokenType::SEMICOLON, "Expect ';' after value.");
        self.emit_op_code(OpCode::Print, line);
    }

    /// Compiles an expression statement: the expression is evaluated for
    /// its side effects and its value is discarded.
    pub(super) fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.");

        let line = self.previous.line_num;
        self.emit_op_code(OpCode::PopStackTop, line);
    }

    /// Compiles an if statement, with an optional else branch.
    fn if_statement(&mut self) {
        self.consume(TokenType::L_PAREN, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenType::R_PAREN, "Expect ')' after condition.");

        let line = self.previous.line_num;

        // Jump over the then-branch when the condition is falsey. The
        // condition value itself is popped on both paths.
        let then_jump = self.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op_code(OpCode::PopStackTop, line);
        self.statement();

        let else_jump = self.emit_jump(OpCode::JumpForward, line);

        self.patch_jump(then_jump);
        self.emit_op_code(OpCode::PopStackTop, line);

        if self.matches(TokenType::ELSE_KW) {
            self.statement();
        }

        self.patch_jump(else_jump);
    }

    /// Compiles a while statement.
    fn while_statement(&mut self) {
        let loop_start = self.current_chunk_mut().len();

        self.consume(TokenType::L_PAREN, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenType::R_PAREN, "Expect ')' after condition.");

        let line = self.previous.line_num;

        let exit_jump = self.emit_jump(OpCode::JumpIfFalse, line);
        self.emit_op_code(OpCode::PopStackTop, line);

        self.statement();
        self.emit_loop(loop_start, line);

        self.patch_jump(exit_jump);
        self.emit_op_code(OpCode::PopStackTop, line);
    }

    /// Compiles a C-style for statement by desugaring it into a block
    /// scope (for the loop variable) around a while-shaped loop. An
    /// absent condition is vacuously true; an absent increment is a
    /// no-op. The increment, when present, executes after the body, so
    /// the body jumps over the increment code on the way in and the
    /// increment loops back to the condition.
    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenType::L_PAREN, "Expect '(' after 'for'.");

        // Initializer clause.
        if self.matches(TokenType::SEMICOLON) {
            // No initializer.
        } else if self.matches(TokenType::VAR_KW) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.current_chunk_mut().len();

        // Condition clause.
        let mut exit_jump: Option<usize> = None;
        if !self.matches(TokenType::SEMICOLON) {
            self.expression();
            self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.");

            let line = self.previous.line_num;
            exit_jump = Some(self.emit_jump(OpCode::JumpIfFalse, line));
            self.emit_op_code(OpCode::PopStackTop, line);
        }

        // Increment clause.
        if !self.matches(TokenType::R_PAREN) {
            let line = self.previous.line_num;
            let body_jump = self.emit_jump(OpCode::JumpForward, line);
            let increment_start = self.current_chunk_mut().len();

            self.expression();
            let line = self.previous.line_num;
            self.emit_op_code(OpCode::PopStackTop, line);
            self.consume(TokenType::R_PAREN, "Expect ')' after for clauses.");

            self.emit_loop(loop_start, line);
            loop_start = increment_start;
            self.patch_jump(body_jump);
        }

        self.statement();

        let line = self.previous.line_num;
        self.emit_loop(loop_start, line);

        if let Some(exit) = exit_jump {
            self.patch_jump(exit);
            self.emit_op_code(OpCode::PopStackTop, line);
        }

        self.end_scope();
    }
}

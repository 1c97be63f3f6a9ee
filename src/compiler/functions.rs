use crate::chunk::op_codes::OpCode;
use crate::compiler::{Compiler, FunctionScope, FunctionType};
use crate::lexer::tokens::TokenType;
use crate::objects::Object;
use std::rc::Rc;

impl Compiler {
    /// Compiles a function declaration statement.
    pub(super) fn fun_declaration(&mut self) {
        let global = self.parse_variable("Expect function name.");
        let line = self.previous.line_num;

        // A function may refer to itself; its name is usable as soon
        // as it is known.
        self.mark_initialized();

        self.compile_function(FunctionType::Function);
        self.define_variable(global, line);
    }

    /// Compiles a function body into its own function object, then emits
    /// a `MakeClosure` instruction so that the function is paired with
    /// its captured variables at runtime. Expects the function's name to
    /// be the previous token.
    fn compile_function(&mut self, function_type: FunctionType) {
        let name = self.previous.lexeme.clone();
        let line = self.previous.line_num;

        self.functions.push(FunctionScope::new(Some(name), function_type));
        self.begin_scope();

        // Parameters are the first locals of the function body's scope.
        self.consume(TokenType::L_PAREN, "Expect '(' after function name.");
        if !self.check(TokenType::R_PAREN) {
            loop {
                if self.current_func_scope().function.arity == 255 {
                    self.error_at_current("Can't have more than 255 parameters.");
                } else {
                    self.current_func_scope_mut().function.arity += 1;
                }

                let param = self.parse_variable("Expect parameter name.");
                let param_line = self.previous.line_num;
                self.define_variable(param, param_line);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }
        self.consume(TokenType::R_PAREN, "Expect ')' after parameters.");

        self.consume(TokenType::L_CURLY, "Expect '{' before function body.");
        self.block();

        // The implicit tail of every function returns `nil`. There is no
        // matching `end_scope()`: unwinding the call frame discards the
        // function's locals wholesale.
        self.emit_return();

        let scope = match self.functions.pop() {
            Some(scope) => scope,
            None => unreachable!("A function scope was pushed at the top of this method."),
        };

        let mut function = scope.function;
        function.up_val_count = scope.up_values.len();

        #[cfg(feature = "show_bytecode")]
        crate::chunk::disassembler::disassemble_chunk(
            &function.chunk,
            function.name.as_deref().unwrap_or("<script>"),
        );

        // Loads the function object and composes its closure at runtime.
        let idx = self.make_constant(Object::Function(Rc::new(function)));
        self.emit_op_code_with_byte(OpCode::MakeClosure, idx, line);

        // Each captured variable is encoded as a pair of bytes telling
        // the runtime whether to capture an enclosing local or to share
        // one of the enclosing closure's up_values.
        for up in scope.up_values.iter() {
            self.current_chunk_mut().push_byte(u8::from(up.is_local), line);
            self.current_chunk_mut().push_byte(up.index, line);
        }
    }

    /// Compiles a return statement. The top-level script cannot return;
    /// a bare `return;` yields `nil`.
    pub(super) fn return_statement(&mut self) {
        let line = self.previous.line_num;

        if self.current_func_scope().function_type == FunctionType::Script {
            self.error_at_previous("Can't return from top-level code.");
        }

        if self.matches(TokenType::SEMICOLON) {
            self.emit_return();
        } else {
            self.expression();
            self.consume(TokenType::SEMICOLON, "Expect ';' after return value.");
            self.emit_op_code(OpCode::Return, line);
        }
    }
}

mod expressions;
mod functions;
mod precedence;
mod resolver;
mod statements;

use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::lexer::tokens::{Token, TokenType};
use crate::lexer::Lexer;
use crate::objects::{FuncObject, Object};

/// The maximum number of local variables in a single function scope.
/// Local slots are one-byte operands.
pub const MAX_LOCALS: usize = 256;
/// The maximum number of captured variables in a single function scope.
pub const MAX_UP_VALUES: usize = 256;

/// The kind of function the compiler is currently compiling.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FunctionType {
    Function,
    Script,
}

/// A local variable known to the compiler, together with the scope
/// depth it was declared at.
pub struct Local {
    pub name: Token,
    pub depth: usize,
    /// A local becomes initialized once its initializer has compiled.
    /// Reading it before that is an error.
    pub is_initialized: bool,
    /// Whether some nested function closes over this local.
    pub is_captured: bool,
}

/// A compile-time descriptor for a variable captured by a closure.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct UpValue {
    /// The local slot (when `is_local`) or the enclosing function's
    /// up_value index (when not) being captured.
    pub index: u8,
    pub is_local: bool,
}

/// The per-function state of the compiler. The compiler keeps one of
/// these on a stack for every function declaration it is inside of,
/// with the bottom entry belonging to the top-level script.
pub struct FunctionScope {
    pub function: FuncObject,
    pub function_type: FunctionType,
    pub locals: Vec<Local>,
    pub scope_depth: usize,
    pub up_values: Vec<UpValue>,
}

impl FunctionScope {
    /// Creates the scope for a function about to be compiled. Slot zero
    /// of every call frame holds the function being executed, so the
    /// matching local slot is reserved with an empty name.
    fn new(name: Option<String>, function_type: FunctionType) -> Self {
        Self {
            function: FuncObject {
                name,
                ..Default::default()
            },
            function_type,
            locals: vec![Local {
                name: Token {
                    line_num: 0,
                    token_type: TokenType::IDENTIFIER,
                    lexeme: String::from(""),
                },
                depth: 0,
                is_initialized: true,
                is_captured: false,
            }],
            scope_depth: 0,
            up_values: vec![],
        }
    }
}

/// Represents a compiler and its internal state.
pub struct Compiler {
    lexer: Lexer,
    previous: Token,
    current: Token,
    had_error: bool,
    is_in_panic: bool,
    functions: Vec<FunctionScope>,
}

impl Compiler {
    /// Compiles a given source string into the bytecode of its
    /// top-level function.
    ///
    /// ## Arguments
    /// * `src` – The string to be compiled.
    ///
    /// ## Returns
    /// `Result<FuncObject, ()>` – A function object containing the
    /// global scope of the program if no compile errors were generated.
    /// An error result otherwise.
    pub fn compile(src: &str) -> Result<FuncObject, ()> {
        // Initialize the compiler
        let mut s = Self {
            lexer: Lexer::new(src),
            previous: Token::initial(),
            current: Token::initial(),
            had_error: false,
            is_in_panic: false,
            functions: vec![FunctionScope::new(None, FunctionType::Script)],
        };

        // Start compiling the chunk
        s.advance();
        while !s.matches(TokenType::EOF) {
            s.declaration();
        }

        // The epilogue of every function, the script included, returns
        // `nil` implicitly.
        s.emit_return();

        let scope = match s.functions.pop() {
            Some(scope) => scope,
            None => unreachable!("The script scope is never popped before this point."),
        };

        #[cfg(feature = "show_bytecode")]
        crate::chunk::disassembler::disassemble_chunk(&scope.function.chunk, "<script>");

        if !s.had_error {
            Ok(scope.function)
        } else {
            Err(())
        }
    }

    /// Checks that the current token matches the tokenType provided.
    ///
    /// ## Arguments
    /// * `tok_type` – The tokenType we expect to match with the current token.
    pub(super) fn check(&self, tok_type: TokenType) -> bool {
        self.current.token_type == tok_type
    }

    /// Checks that the current token matches the tokenType provided.
    /// If the tokens match, the current token gets consumed and the
    /// function returns true. Otherwise, the token is not consumed,
    /// and the function returns false.
    pub(super) fn matches(&mut self, tok_type: TokenType) -> bool {
        if self.check(tok_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances the compiler to the next token, reporting any error
    /// tokens produced by the lexer along the way.
    pub(super) fn advance(&mut self) {
        self.previous = self.current.clone();

        loop {
            self.current = self.lexer.next_token();

            match self.current.token_type {
                TokenType::ERROR => {
                    let message = self.current.lexeme.clone();
                    self.error_at_current(&message);
                }
                _ => break,
            }
        }
    }

    /// Consumes the current token only if it is of a given type.
    /// If the token does not match the type, emits a compiler error.
    ///
    /// ## Arguments
    /// * `tok_type` – The expected type of the token to consume.
    /// * `message` – The error message to be displayed if the current
    /// token does not match the provided type.
    pub(super) fn consume(&mut self, tok_type: TokenType, message: &str) {
        if self.check(tok_type) {
            self.advance();
            return;
        }

        self.error_at_current(message);
    }

    /// Emits a compiler error at the current token.
    pub(super) fn error_at_current(&mut self, message: &str) {
        let token = self.current.clone();
        self.error_at_token(&token, message);
    }

    /// Emits a compiler error at the previous token.
    pub(super) fn error_at_previous(&mut self, message: &str) {
        let token = self.previous.clone();
        self.error_at_token(&token, message);
    }

    /// Emits a compiler error at the given token. While the compiler is
    /// in panic mode, further reports are silenced until `synchronize()`
    /// reaches a statement boundary.
    ///
    /// ## Arguments
    /// * `token` – The token that caused the error.
    /// * `message` – The error message to display.
    pub(super) fn error_at_token(&mut self, token: &Token, message: &str) {
        if self.is_in_panic {
            return;
        }
        self.is_in_panic = true;
        self.had_error = true;

        eprint!("[line {}] Error", token.line_num);

        match token.token_type {
            TokenType::EOF => eprint!(" at end"),
            // The lexeme of an error token is its message; there is no
            // source text to point at.
            TokenType::ERROR => {}
            _ => eprint!(" at '{}'", token.lexeme),
        }

        eprintln!(": {}", message);
    }

    /// Synchronizes the compiler when it has found an error.
    /// This method helps minimize the number of cascading errors the
    /// compiler emits when it finds a parsing error. Once it reaches a
    /// synchronization point – like a keyword for a statement – it stops
    /// skipping tokens.
    pub(super) fn synchronize(&mut self) {
        self.is_in_panic = false;

        while self.current.token_type != TokenType::EOF {
            if self.previous.token_type == TokenType::SEMICOLON {
                return;
            }

            match self.current.token_type {
                TokenType::CLASS_KW
                | TokenType::FUN_KW
                | TokenType::VAR_KW
                | TokenType::FOR_KW
                | TokenType::IF_KW
                | TokenType::WHILE_KW
                | TokenType::PRINT_KW
                | TokenType::RETURN_KW => {
                    return;
                }

                _ => {}
            }

            self.advance();
        }
    }

    /// Gets an immutable reference to the function scope currently
    /// being compiled.
    pub(super) fn current_func_scope(&self) -> &FunctionScope {
        let len = self.functions.len();
        &self.functions[len - 1]
    }

    /// Gets a mutable reference to the function scope currently
    /// being compiled.
    pub(super) fn current_func_scope_mut(&mut self) -> &mut FunctionScope {
        let len = self.functions.len();
        &mut self.functions[len - 1]
    }

    /// Gets a mutable reference to the chunk of the function currently
    /// being compiled.
    pub(super) fn current_chunk_mut(&mut self) -> &mut Chunk {
        &mut self.current_func_scope_mut().function.chunk
    }

    /// Emits an instruction from an OpCode into the chunk's
    /// instruction list.
    ///
    /// ## Arguments
    /// * `instr` – The OpCode instruction to be added to the chunk.
    /// * `line` – The source line that generated the instruction.
    pub(super) fn emit_op_code(&mut self, instr: OpCode, line: usize) {
        self.current_chunk_mut().push_op_code(instr, line);
    }

    /// Emits an instruction followed by its one-byte operand.
    pub(super) fn emit_op_code_with_byte(&mut self, instr: OpCode, byte: u8, line: usize) {
        self.emit_op_code(instr, line);
        self.current_chunk_mut().push_byte(byte, line);
    }

    /// Emits a jump instruction with a dummy jump offset. This offset
    /// should later be replaced by calling `patch_jump(...)`.
    ///
    /// ## Arguments
    /// * `instr` – The jump instruction to emit to the chunk.
    /// * `line` – The source line that generated the instruction.
    ///
    /// ## Returns
    /// `usize` – The position of the first byte of the jump offset.
    /// This value should be passed to `patch_jump(...)` once the jump
    /// target is known.
    pub(super) fn emit_jump(&mut self, instr: OpCode, line: usize) -> usize {
        self.emit_op_code(instr, line);
        // We emit a temporary short representing the jump that will be
        // made by the vm during runtime.
        self.current_chunk_mut().push_short(0xffff, line);

        self.current_chunk_mut().len() - 2
    }

    /// Patches the offset of a jump instruction so that it lands on the
    /// instruction about to be emitted.
    ///
    /// ## Arguments
    /// * `offset` – The position in the chunk of the jump offset to be
    /// patched, as returned by `emit_jump(...)`.
    pub(super) fn patch_jump(&mut self, offset: usize) {
        // -2 to adjust for the two bytes of the jump offset itself.
        let jump = match u16::try_from(self.current_chunk_mut().len() - offset - 2) {
            Ok(x) => x,
            Err(_) => {
                return self.error_at_previous("Too much code to jump over.");
            }
        };

        let j = jump.to_be_bytes();
        self.current_chunk_mut().modify_byte(offset, j[0]);
        self.current_chunk_mut().modify_byte(offset + 1, j[1]);
    }

    /// Emits a `LoopJump` instruction back to the given chunk position.
    ///
    /// ## Arguments
    /// * `loop_start` – The chunk position of the first instruction of
    /// the loop body (or condition) to jump back to.
    /// * `line` – The source line that generated the instruction.
    pub(super) fn emit_loop(&mut self, loop_start: usize, line: usize) {
        // +3 to adjust for the `LoopJump` instruction and its operand,
        // which the ip has advanced past by the time the jump executes.
        let offset = self.current_chunk_mut().len() - loop_start + 3;

        let offset = match u16::try_from(offset) {
            Ok(x) => x,
            Err(_) => {
                return self.error_at_previous("Loop body too large.");
            }
        };

        self.emit_op_code(OpCode::LoopJump, line);
        self.current_chunk_mut().push_short(offset, line);
    }

    /// Adds an object to the constant pool for use as a one-byte operand
    /// (global names and closure function objects). Indexes past 255
    /// cannot be encoded and are reported as a compile error.
    ///
    /// ## Arguments
    /// * `obj` – The object to be added to the pool.
    ///
    /// ## Returns
    /// `u8` – The position of the object in the pool, or `0` after an
    /// overflow error was reported.
    pub(super) fn make_constant(&mut self, obj: Object) -> u8 {
        let idx = self.current_chunk_mut().add_constant(obj);

        if idx > 255 {
            self.error_at_previous("Too many constants in one chunk.");
            return 0;
        }

        idx as u8
    }

    /// Emits the instructions to load a constant object onto the stack
    /// at runtime. Constants indexed past 255 are loaded through the
    /// three-byte `LoadConstantLong` instruction.
    ///
    /// ## Arguments
    /// * `obj` – The object to be added to the pool and loaded.
    /// * `line` – The source line that generated the constant.
    pub(super) fn emit_constant(&mut self, obj: Object, line: usize) {
        let idx = self.current_chunk_mut().add_constant(obj);

        if idx <= 255 {
            self.emit_op_code_with_byte(OpCode::LoadConstant, idx as u8, line);
        } else if idx < (1 << 24) {
            self.emit_op_code(OpCode::LoadConstantLong, line);
            self.current_chunk_mut().push_u24(idx, line);
        } else {
            self.error_at_previous("Too many constants in one chunk.");
        }
    }

    /// Emits the implicit epilogue of a function: return `nil` to
    /// the caller.
    pub(super) fn emit_return(&mut self) {
        let line = self.previous.line_num;
        self.emit_op_code(OpCode::LoadImmNil, line);
        self.emit_op_code(OpCode::Return, line);
    }
}

use crate::chunk::op_codes::OpCode;
use crate::compiler::{Compiler, Local, UpValue, MAX_LOCALS, MAX_UP_VALUES};
use crate::lexer::tokens::{Token, TokenType};
use crate::objects::Object;
use std::rc::Rc;

impl Compiler {
    /// Opens a new block scope in the current function.
    pub(super) fn begin_scope(&mut self) {
        self.current_func_scope_mut().scope_depth += 1;
    }

    /// Closes the innermost block scope of the current function, popping
    /// every local declared inside it. A captured local is closed (its
    /// value moves into the heap cell shared with the capturing closures)
    /// instead of plainly popped.
    pub(super) fn end_scope(&mut self) {
        let line = self.previous.line_num;
        self.current_func_scope_mut().scope_depth -= 1;

        loop {
            let scope = self.current_func_scope();

            let is_captured = match scope.locals.last() {
                Some(local) if local.depth > scope.scope_depth => local.is_captured,
                _ => break,
            };

            self.current_func_scope_mut().locals.pop();

            if is_captured {
                self.emit_op_code(OpCode::CloseUpValue, line);
            } else {
                self.emit_op_code(OpCode::PopStackTop, line);
            }
        }
    }

    /// Consumes a variable name and declares it in the current scope.
    ///
    /// ## Arguments
    /// * `message` – The error message for a missing identifier.
    ///
    /// ## Returns
    /// `u8` – The constant-pool index of the variable's name when the
    /// declaration is global; `0` for locals, whose names live in the
    /// compiler alone.
    pub(super) fn parse_variable(&mut self, message: &str) -> u8 {
        self.consume(TokenType::IDENTIFIER, message);

        self.declare_variable();
        if self.current_func_scope().scope_depth > 0 {
            return 0;
        }

        let name = self.previous.lexeme.clone();
        self.make_constant(Object::String(Rc::from(name)))
    }

    /// Declares a local variable in the current scope. Globals are late
    /// bound, so at depth zero there is nothing to track. Redeclaring a
    /// name inside the same scope is an error; shadowing an outer scope
    /// is fine.
    fn declare_variable(&mut self) {
        if self.current_func_scope().scope_depth == 0 {
            return;
        }

        let name = self.previous.clone();
        let depth = self.current_func_scope().scope_depth;

        let mut duplicate = false;
        for local in self.current_func_scope().locals.iter().rev() {
            // Locals are pushed in declaration order, so the first local
            // of an enclosing scope ends the search.
            if local.depth < depth {
                break;
            }

            if local.name.lexeme == name.lexeme {
                duplicate = true;
                break;
            }
        }

        if duplicate {
            self.error_at_token(&name, "Already a variable with this name in this scope.");
            return;
        }

        self.add_local(name);
    }

    /// Appends a local variable to the current function scope. The local
    /// starts out uninitialized until its initializer has compiled.
    fn add_local(&mut self, name: Token) {
        if self.current_func_scope().locals.len() >= MAX_LOCALS {
            self.error_at_token(&name, "Too many local variables in function.");
            return;
        }

        let depth = self.current_func_scope().scope_depth;

        self.current_func_scope_mut().locals.push(Local {
            name,
            depth,
            is_initialized: false,
            is_captured: false,
        });
    }

    /// Marks the most recent local declaration as initialized. Does
    /// nothing at global scope.
    pub(super) fn mark_initialized(&mut self) {
        let scope = self.current_func_scope_mut();

        if scope.scope_depth == 0 {
            return;
        }

        if let Some(local) = scope.locals.last_mut() {
            local.is_initialized = true;
        }
    }

    /// Defines the variable declared by a preceding `parse_variable(...)`.
    /// A local becomes usable; a global is stored into the globals table
    /// at runtime under its interned name.
    pub(super) fn define_variable(&mut self, global: u8, line: usize) {
        if self.current_func_scope().scope_depth > 0 {
            self.mark_initialized();
            return;
        }

        self.emit_op_code_with_byte(OpCode::DefineGlobal, global, line);
    }

    /// Emits the appropriate instruction to either get or set a variable,
    /// resolving the name as a local, a captured variable, or a global,
    /// in that order.
    ///
    /// ## Arguments
    /// * `name` – The token naming the variable.
    /// * `can_assign` – Whether an `=` sign following the name denotes
    /// an assignment to it.
    pub(super) fn named_variable(&mut self, name: &Token, can_assign: bool) {
        let line = name.line_num;
        let func_idx = self.functions.len() - 1;

        let (get_op, set_op, idx) = if let Some(slot) = self.resolve_local(func_idx, name) {
            (OpCode::GetLocal, OpCode::SetLocal, slot)
        } else if let Some(slot) = self.resolve_up_value(func_idx, name) {
            (OpCode::GetUpVal, OpCode::SetUpVal, slot)
        } else {
            let lexeme = name.lexeme.clone();
            let idx = self.make_constant(Object::String(Rc::from(lexeme)));
            (OpCode::GetGlobal, OpCode::SetGlobal, idx)
        };

        if can_assign && self.matches(TokenType::EQUALS) {
            self.expression();
            self.emit_op_code_with_byte(set_op, idx, line);
        } else {
            self.emit_op_code_with_byte(get_op, idx, line);
        }
    }

    /// Looks for a local variable with the given name in the provided
    /// function scope, searching innermost declarations first.
    ///
    /// ## Returns
    /// `Option<u8>` – The local's stack slot, which doubles as its index
    /// in the compiler's locals list.
    fn resolve_local(&mut self, func_idx: usize, name: &Token) -> Option<u8> {
        let mut resolution = None;

        for (index, local) in self.functions[func_idx].locals.iter().enumerate().rev() {
            if local.name.lexeme == name.lexeme {
                resolution = Some((index, local.is_initialized));
                break;
            }
        }

        let (index, is_initialized) = resolution?;

        if !is_initialized {
            self.error_at_token(name, "Can't read local variable in its own initializer.");
        }

        Some(index as u8)
    }

    /// Looks for a captured variable with the given name, recursively
    /// searching the locals of enclosing function scopes. On a hit, the
    /// captured local is marked as such, and every function scope along
    /// the chain gets an up_value entry so that the capture can be
    /// threaded through nested closures at runtime.
    fn resolve_up_value(&mut self, func_idx: usize, name: &Token) -> Option<u8> {
        // The script scope has no enclosing function to capture from.
        if func_idx == 0 {
            return None;
        }

        if let Some(local_idx) = self.resolve_local(func_idx - 1, name) {
            self.functions[func_idx - 1].locals[local_idx as usize].is_captured = true;
            return self.add_up_value(func_idx, local_idx, true);
        }

        if let Some(up_idx) = self.resolve_up_value(func_idx - 1, name) {
            return self.add_up_value(func_idx, up_idx, false);
        }

        None
    }

    /// Adds an up_value descriptor to the given function scope,
    /// deduplicating captures of the same variable.
    ///
    /// ## Returns
    /// `Option<u8>` – The index of the up_value in the function's
    /// up_value list.
    fn add_up_value(&mut self, func_idx: usize, index: u8, is_local: bool) -> Option<u8> {
        let new_up_value = UpValue { index, is_local };

        // Prevent creating repeated up_values
        if let Some(pos) = self.functions[func_idx]
            .up_values
            .iter()
            .position(|up| *up == new_up_value)
        {
            return Some(pos as u8);
        }

        if self.functions[func_idx].up_values.len() >= MAX_UP_VALUES {
            self.error_at_previous("Too many closure variables in function.");
            return Some(0);
        }

        self.functions[func_idx].up_values.push(new_up_value);
        Some((self.functions[func_idx].up_values.len() - 1) as u8)
    }
}

use crate::chunk::op_codes::OpCode;
use crate::objects::{ClosureObject, Object, UpValRef};
use crate::virtual_machine::{RuntimeResult, Vm};
use std::cell::RefCell;
use std::rc::Rc;

impl Vm {
    /// Executes the instructions of the current call frame until the
    /// outermost frame returns or a runtime error occurs.
    pub(crate) fn run(&mut self) -> RuntimeResult {
        loop {
            let instruction = self.get_next_op_code();

            let exec = match instruction {
                OpCode::PopStackTop => {
                    self.pop_stack();
                    RuntimeResult::Continue
                }

                // Object loaders
                OpCode::LoadConstant => self.op_load_constant(),
                OpCode::LoadConstantLong => self.op_load_constant_long(),
                OpCode::LoadImmFalse => self.push_stack(Object::Bool(false)),
                OpCode::LoadImmNil => self.push_stack(Object::Nil),
                OpCode::LoadImmTrue => self.push_stack(Object::Bool(true)),

                // Global declarations
                OpCode::DefineGlobal => self.op_define_global(),
                OpCode::GetGlobal => self.op_get_global(),
                OpCode::SetGlobal => self.op_set_global(),

                // Local declarations
                OpCode::GetLocal => self.op_get_local(),
                OpCode::SetLocal => self.op_set_local(),

                // Operators
                OpCode::Add => self.op_add(),
                OpCode::Divide => self.binary_numeric_operation(OpCode::Divide),
                OpCode::Equals => self.op_equals(),
                OpCode::GreaterThan => self.binary_numeric_operation(OpCode::GreaterThan),
                OpCode::LessThan => self.binary_numeric_operation(OpCode::LessThan),
                OpCode::LogicNot => self.op_logic_not(),
                OpCode::Multiply => self.binary_numeric_operation(OpCode::Multiply),
                OpCode::Negate => self.op_negate(),
                OpCode::Subtract => self.binary_numeric_operation(OpCode::Subtract),

                // Jumps
                OpCode::JumpForward => self.op_jump_forward(),
                OpCode::JumpIfFalse => self.op_jump_if_false(),
                OpCode::LoopJump => self.op_loop_jump(),

                // Functions and Closures
                OpCode::CloseUpValue => self.op_close_up_value(),
                OpCode::FuncCall => self.op_func_call(),
                OpCode::GetUpVal => self.op_get_up_value(),
                OpCode::MakeClosure => self.op_make_closure(),
                OpCode::Return => self.op_function_return(),
                OpCode::SetUpVal => self.op_set_up_value(),

                // Side effects
                OpCode::Print => self.op_print(),
            };

            match exec {
                RuntimeResult::Continue => continue,
                _ => return exec,
            }
        }
    }

    /// Executes the instruction to load a constant from the current call
    /// frame's constant pool onto the stack. String constants are routed
    /// through the intern set, so every string value on the stack shares
    /// the canonical allocation for its content.
    fn op_load_constant(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;
        let val = self.read_constant(pos);

        match val {
            Object::String(s) => {
                let interned = self.intern(s);
                self.push_stack(Object::String(interned))
            }
            val => self.push_stack(val),
        }
    }

    /// Executes the instruction to load a constant indexed by a 24-bit
    /// operand, for pools that have outgrown one-byte indexes.
    fn op_load_constant_long(&mut self) -> RuntimeResult {
        let pos = self.get_next_u24();
        let val = self.read_constant(pos);

        match val {
            Object::String(s) => {
                let interned = self.intern(s);
                self.push_stack(Object::String(interned))
            }
            val => self.push_stack(val),
        }
    }

    /// Executes the instruction to define a global variable with the
    /// object at the top of the stack.
    fn op_define_global(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        // Gets the name from the pool and assigns the value to the global
        if let Object::String(name) = self.read_constant(pos) {
            let name = self.intern(name);
            let val = self.pop_stack();
            self.globals.insert(name, val);
            RuntimeResult::Continue
        } else {
            unreachable!("Expected a string for global declaration name.");
        }
    }

    /// Executes the instruction to get the value of a global variable.
    /// Reading a name that was never defined is a runtime error.
    fn op_get_global(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        if let Object::String(name) = self.read_constant(pos) {
            match self.globals.get(&*name) {
                Some(val) => {
                    let val = val.clone();
                    self.push_stack(val)
                }
                None => RuntimeResult::Error {
                    message: format!("Undefined variable '{}'.", name),
                },
            }
        } else {
            unreachable!("Expected a string as global declaration name.");
        }
    }

    /// Executes the instruction to modify the value of a global variable.
    /// Assignment is an expression, so the value stays on the stack.
    fn op_set_global(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        if let Object::String(name) = self.read_constant(pos) {
            if !self.globals.contains_key(&*name) {
                return RuntimeResult::Error {
                    message: format!("Undefined variable '{}'.", name),
                };
            }

            let name = self.intern(name);
            let val = self.peek_stack(0).clone();
            self.globals.insert(name, val);
            RuntimeResult::Continue
        } else {
            unreachable!("Expected a string as global declaration name.");
        }
    }

    /// Executes the instruction to get the value of a local variable.
    fn op_get_local(&mut self) -> RuntimeResult {
        // The position of the local variable's value in the stack,
        // relative to the frame's base pointer.
        let pos = self.get_next_byte() as usize;

        let idx = self.current_frame().base_pointer + pos;
        let value = self.stack[idx].clone();
        self.push_stack(value)
    }

    /// Executes the instruction to modify the value of a local variable.
    /// Assignment is an expression, so the value stays on the stack.
    fn op_set_local(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        let value = self.peek_stack(0).clone();
        let idx = self.current_frame().base_pointer + pos;

        self.stack[idx] = value;
        RuntimeResult::Continue
    }

    /// Executes the instruction to compare the two objects at the top of
    /// the stack for equality.
    fn op_equals(&mut self) -> RuntimeResult {
        let right = self.pop_stack();
        let left = self.pop_stack();

        self.push_stack(Object::Bool(left.equals(&right)))
    }

    /// Executes the instruction to logically negate the object at the
    /// top of the stack.
    fn op_logic_not(&mut self) -> RuntimeResult {
        let val = self.pop_stack();
        self.push_stack(Object::Bool(val.is_falsey()))
    }

    /// Executes the instruction to arithmetically negate the number at
    /// the top of the stack.
    fn op_negate(&mut self) -> RuntimeResult {
        match self.pop_stack() {
            Object::Number(val) => self.push_stack(Object::Number(-val)),
            _ => RuntimeResult::Error {
                message: String::from("Operand must be a number."),
            },
        }
    }

    /// Executes the `Add` instruction, which is polymorphic: two numbers
    /// add, two strings concatenate (the result is interned), and any
    /// other pairing is a runtime error.
    fn op_add(&mut self) -> RuntimeResult {
        let right = self.pop_stack();
        let left = self.pop_stack();

        match (left, right) {
            (Object::Number(a), Object::Number(b)) => self.push_stack(Object::Number(a + b)),
            (Object::String(a), Object::String(b)) => {
                let concatenated: Rc<str> = Rc::from(format!("{}{}", a, b));
                let interned = self.intern(concatenated);
                self.push_stack(Object::String(interned))
            }
            _ => RuntimeResult::Error {
                message: String::from("Operands must be two numbers or two strings."),
            },
        }
    }

    /// Executes a strictly numeric binary instruction with the two
    /// objects at the top of the stack.
    fn binary_numeric_operation(&mut self, operator: OpCode) -> RuntimeResult {
        let right = self.pop_stack();
        let left = self.pop_stack();

        let (a, b) = match (&left, &right) {
            (Object::Number(a), Object::Number(b)) => (*a, *b),
            _ => {
                return RuntimeResult::Error {
                    message: String::from("Operands must be numbers."),
                }
            }
        };

        let result = match operator {
            OpCode::Divide => Object::Number(a / b),
            OpCode::GreaterThan => Object::Bool(a > b),
            OpCode::LessThan => Object::Bool(a < b),
            OpCode::Multiply => Object::Number(a * b),
            OpCode::Subtract => Object::Number(a - b),
            _ => unreachable!("The other binary operations have special instruction methods."),
        };

        self.push_stack(result)
    }

    /// Executes the instruction to print the object at the top of the
    /// stack to stdout, followed by a newline.
    fn op_print(&mut self) -> RuntimeResult {
        let val = self.pop_stack();
        println!("{}", val);
        RuntimeResult::Continue
    }

    /// Executes the instruction to jump forward by the given offset.
    fn op_jump_forward(&mut self) -> RuntimeResult {
        // The JumpForward instruction always has a short as its operand.
        let offset = self.get_next_short() as usize;
        self.current_frame_mut().ip += offset;
        RuntimeResult::Continue
    }

    /// Executes the instruction to jump forward by the given offset if
    /// the object at the top of the stack is falsey. The object is left
    /// on the stack either way; the compiler emits the pops.
    fn op_jump_if_false(&mut self) -> RuntimeResult {
        let offset = self.get_next_short() as usize;

        if self.peek_stack(0).is_falsey() {
            self.current_frame_mut().ip += offset;
        }

        RuntimeResult::Continue
    }

    /// Executes the instruction to jump (loop) back by the given offset.
    fn op_loop_jump(&mut self) -> RuntimeResult {
        let offset = self.get_next_short() as usize;
        self.current_frame_mut().ip -= offset;
        RuntimeResult::Continue
    }

    /// Executes the instruction to call the object sitting below the
    /// call's arguments on the stack.
    fn op_func_call(&mut self) -> RuntimeResult {
        // Calls can only have 255 arguments at most.
        let arg_count = self.get_next_byte();

        let maybe_function = self.peek_stack(arg_count as usize).clone();
        self.call_value(maybe_function, arg_count)
    }

    /// Executes the instruction to make a closure object from a function
    /// object in the constant pool. The byte immediately following the
    /// instruction encodes the position of the function object; each
    /// captured variable follows as an `(is_local, index)` byte pair.
    fn op_make_closure(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        let function = match self.read_constant(pos) {
            Object::Function(obj) => obj,
            _ => unreachable!("Expected a function object for closure."),
        };

        let up_val_count = function.up_val_count;
        let mut up_values: Vec<Rc<RefCell<UpValRef>>> = Vec::with_capacity(up_val_count);

        for _ in 0..up_val_count {
            let is_local = self.get_next_byte() == 1u8;
            let index = self.get_next_byte() as usize;

            let up = if is_local {
                let location = self.current_frame().base_pointer + index;
                self.capture_up_value(location)
            } else {
                self.get_up_val(index)
            };

            up_values.push(up);
        }

        self.push_stack(Object::Closure(Rc::new(ClosureObject {
            function,
            up_values,
        })))
    }

    /// Executes the instruction to get an UpValue from the current call
    /// frame's closure.
    fn op_get_up_value(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;

        let val = match &*self.get_up_val(pos).borrow() {
            UpValRef::Open(slot) => self.stack[*slot].clone(),
            UpValRef::Closed(obj) => obj.clone(),
        };

        self.push_stack(val)
    }

    /// Executes the instruction to modify an UpValue in the current call
    /// frame's closure. Assignment is an expression, so the value stays
    /// on the stack.
    fn op_set_up_value(&mut self) -> RuntimeResult {
        let pos = self.get_next_byte() as usize;
        let new_val = self.peek_stack(0).clone();

        match &mut *self.get_up_val(pos).borrow_mut() {
            UpValRef::Open(slot) => self.stack[*slot] = new_val,
            UpValRef::Closed(obj) => *obj = new_val,
        }

        RuntimeResult::Continue
    }

    /// Executes the instruction to close the UpValue referring to the
    /// topmost stack cell (if one exists) and pop the cell.
    fn op_close_up_value(&mut self) -> RuntimeResult {
        let top = self.stack.len() - 1;
        self.close_up_values(top);
        self.pop_stack();

        RuntimeResult::Continue
    }

    /// Executes the instruction to return out of a function call. The
    /// frame's captured locals are closed before the stack unwinds to
    /// the frame's base; the return value is pushed for the caller. When
    /// the outermost frame returns, execution ends.
    fn op_function_return(&mut self) -> RuntimeResult {
        let result = self.pop_stack();
        let base_pointer = self.current_frame().base_pointer;

        self.close_up_values(base_pointer);

        self.frames.pop();
        self.stack.truncate(base_pointer);

        if self.frames.is_empty() {
            return RuntimeResult::EndOk;
        }

        self.push_stack(result)
    }
}

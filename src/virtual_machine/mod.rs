use crate::built_in::{self, NativeFn};
use crate::chunk::op_codes::OpCode;
use crate::compiler::Compiler;
use crate::errors::report_runtime_error;
use crate::objects::{ClosureObject, NativeFuncObj, Object, UpValRef};
use hashbrown::{HashMap, HashSet};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

// Submodules
mod run;

/// The maximum depth of the call-frame stack.
pub const FRAMES_MAX: usize = 64;
/// The capacity of the value stack. Local slots are one-byte operands,
/// so each call frame addresses at most 256 slots.
pub const STACK_MAX: usize = FRAMES_MAX * 256;

/// The types of results the interpreter can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    CompileError,
    Ok,
    RuntimeError,
}

/// Represents the internal state of the virtual machine after
/// executing a single instruction.
pub enum RuntimeResult {
    Continue,
    EndOk,
    Error { message: String },
}

/// Represents a single ongoing function call.
pub struct CallFrame {
    pub closure: Rc<ClosureObject>,
    pub ip: usize,
    /// The stack slot of the callee itself. The frame's locals live at
    /// `base_pointer + slot`, with the arguments in slots `1..=arity`.
    pub base_pointer: usize,
}

impl CallFrame {
    fn get_next_op_code(&mut self) -> OpCode {
        let code = self.closure.function.chunk.get_op_code(self.ip);
        self.ip += 1;
        code
    }

    fn get_next_byte(&mut self) -> u8 {
        let byte = self.closure.function.chunk.get_byte(self.ip);
        self.ip += 1;
        byte
    }

    fn get_next_short(&mut self) -> u16 {
        let short = self.closure.function.chunk.get_short(self.ip);
        self.ip += 2;
        short
    }

    fn get_next_u24(&mut self) -> usize {
        let value = self.closure.function.chunk.get_u24(self.ip);
        self.ip += 3;
        value
    }

    fn get_constant(&self, idx: usize) -> Object {
        self.closure.function.chunk.get_constant(idx).clone()
    }
}

/// Represents a virtual machine.
pub struct Vm {
    pub(crate) frames: Vec<CallFrame>,
    pub(crate) stack: Vec<Object>,
    pub(crate) globals: HashMap<Rc<str>, Object>,
    /// The string intern set. Every string that reaches the stack goes
    /// through here first, so equal-content strings share one allocation.
    strings: HashSet<Rc<str>>,
    /// The UpValues still referring to live stack slots, sorted by
    /// descending slot.
    open_up_values: Vec<Rc<RefCell<UpValRef>>>,
    /// The instant the machine was created; the `clock` native reports
    /// seconds elapsed since then.
    pub(crate) start_time: Instant,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// Creates a virtual machine with the native functions already
    /// registered in its globals table.
    pub fn new() -> Self {
        let mut vm = Self {
            frames: Vec::with_capacity(FRAMES_MAX),
            stack: Vec::with_capacity(STACK_MAX),
            globals: Default::default(),
            strings: Default::default(),
            open_up_values: vec![],
            start_time: Instant::now(),
        };

        built_in::define_natives(&mut vm);
        vm
    }

    /// Interprets a source string on this machine.
    ///
    /// ## Arguments
    /// * `source` – The Lox source text to compile and execute.
    ///
    /// ## Returns
    /// `InterpretResult` – The result of the source interpretation.
    pub fn interpret(&mut self, source: &str) -> InterpretResult {
        let function = match Compiler::compile(source) {
            Ok(f) => Rc::new(f),
            Err(_) => return InterpretResult::CompileError,
        };

        // The top-level script behaves like a zero-argument function
        // call: the callee sits in slot zero of its own call frame,
        // wrapped in a (capture-free) closure.
        self.stack.push(Object::Function(Rc::clone(&function)));
        let closure = Rc::new(ClosureObject {
            function,
            up_values: vec![],
        });
        self.stack.pop();
        self.stack.push(Object::Closure(Rc::clone(&closure)));

        let call = self.call_closure(closure, 0);
        let result = match call {
            RuntimeResult::Continue => self.run(),
            _ => call,
        };

        match result {
            RuntimeResult::EndOk => InterpretResult::Ok,
            RuntimeResult::Error { message } => {
                report_runtime_error(self, &message);
                self.reset();
                InterpretResult::RuntimeError
            }
            RuntimeResult::Continue => {
                unreachable!("The dispatch loop only returns terminal results.")
            }
        }
    }

    /// Interns a string, returning the canonical shared allocation for
    /// its content.
    pub(crate) fn intern(&mut self, string: Rc<str>) -> Rc<str> {
        match self.strings.get(&*string) {
            Some(existing) => Rc::clone(existing),
            None => {
                self.strings.insert(Rc::clone(&string));
                string
            }
        }
    }

    /// Registers a native function under the given name in the
    /// globals table.
    pub(crate) fn define_native(&mut self, name: &str, body: NativeFn) {
        let name = self.intern(Rc::from(name));
        let native = NativeFuncObj {
            name: String::from(&*name),
            body,
        };

        self.globals.insert(name, Object::Native(Rc::new(native)));
    }

    /// Clears the value stack, the call frames, and the open UpValues
    /// after a runtime error.
    fn reset(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.open_up_values.clear();
    }

    pub(crate) fn current_frame(&self) -> &CallFrame {
        match self.frames.last() {
            Some(frame) => frame,
            None => unreachable!("The dispatch loop only runs with at least one frame."),
        }
    }

    fn current_frame_mut(&mut self) -> &mut CallFrame {
        let frames_len = self.frames.len();
        &mut self.frames[frames_len - 1]
    }

    fn get_next_op_code(&mut self) -> OpCode {
        self.current_frame_mut().get_next_op_code()
    }

    fn get_next_byte(&mut self) -> u8 {
        self.current_frame_mut().get_next_byte()
    }

    fn get_next_short(&mut self) -> u16 {
        self.current_frame_mut().get_next_short()
    }

    fn get_next_u24(&mut self) -> usize {
        self.current_frame_mut().get_next_u24()
    }

    fn read_constant(&self, idx: usize) -> Object {
        self.current_frame().get_constant(idx)
    }

    fn pop_stack(&mut self) -> Object {
        match self.stack.pop() {
            Some(obj) => obj,
            None => panic!("Stack is empty!"),
        }
    }

    fn push_stack(&mut self, new_val: Object) -> RuntimeResult {
        self.stack.push(new_val);
        RuntimeResult::Continue
    }

    /// Peeks at the value `distance` slots down from the top of
    /// the stack.
    fn peek_stack(&self, distance: usize) -> &Object {
        &self.stack[self.stack.len() - 1 - distance]
    }

    /// Gets the UpValue at the given index in the current call
    /// frame's closure.
    fn get_up_val(&self, idx: usize) -> Rc<RefCell<UpValRef>> {
        Rc::clone(&self.current_frame().closure.up_values[idx])
    }

    /// Dispatches a call to the given callee. Only closures and native
    /// functions are callable.
    fn call_value(&mut self, callee: Object, arg_count: u8) -> RuntimeResult {
        match callee {
            Object::Closure(obj) => self.call_closure(obj, arg_count),
            Object::Native(obj) => {
                let mut args: Vec<Object> = vec![];
                for _ in 0..arg_count {
                    let val = self.pop_stack();
                    args.push(val);
                }
                args.reverse();

                // Pop the native function itself off the stack, then
                // place the result of the call on top. Natives do not
                // push a call frame.
                self.pop_stack();
                let result = (obj.body)(self, args);
                self.push_stack(result)
            }
            _ => RuntimeResult::Error {
                message: String::from("Can only call functions and classes."),
            },
        }
    }

    /// Pushes the call frame for a closure call after verifying the
    /// argument count and the call-stack depth.
    fn call_closure(&mut self, closure: Rc<ClosureObject>, arg_count: u8) -> RuntimeResult {
        let arity = closure.function.arity;

        if arg_count != arity {
            return RuntimeResult::Error {
                message: format!("Expected {} arguments, but got {}.", arity, arg_count),
            };
        }

        if self.frames.len() >= FRAMES_MAX {
            return RuntimeResult::Error {
                message: String::from("Stack overflow."),
            };
        }

        self.frames.push(CallFrame {
            closure,
            ip: 0,
            base_pointer: self.stack.len() - (arg_count as usize) - 1,
        });

        RuntimeResult::Continue
    }

    /// Captures the stack slot at the given absolute location into an
    /// UpValue. Each live slot is represented by exactly one UpValue:
    /// if an open UpValue for the location already exists it is reused,
    /// otherwise a new one is linked into the open list at the position
    /// that keeps the list sorted by descending slot.
    fn capture_up_value(&mut self, location: usize) -> Rc<RefCell<UpValRef>> {
        let mut insert_at = self.open_up_values.len();

        for (i, up) in self.open_up_values.iter().enumerate() {
            match &*up.borrow() {
                UpValRef::Open(slot) if *slot == location => return Rc::clone(up),
                UpValRef::Open(slot) if *slot < location => {
                    insert_at = i;
                    break;
                }
                UpValRef::Open(_) => {}
                UpValRef::Closed(_) => {
                    unreachable!("Closed UpValues are unlinked from the open list.")
                }
            }
        }

        let new_up_value = Rc::new(RefCell::new(UpValRef::Open(location)));
        self.open_up_values.insert(insert_at, Rc::clone(&new_up_value));
        new_up_value
    }

    /// Closes every open UpValue whose slot is at or above the given
    /// stack boundary: the slot's value moves into the UpValue itself,
    /// and the UpValue leaves the open list. Reads and writes through a
    /// closed UpValue keep seeing the same cell.
    fn close_up_values(&mut self, boundary: usize) {
        loop {
            // The list is sorted by descending slot, so the UpValues to
            // close form a prefix.
            let up = match self.open_up_values.first() {
                Some(up) => Rc::clone(up),
                None => break,
            };

            let location = match &*up.borrow() {
                UpValRef::Open(slot) => *slot,
                UpValRef::Closed(_) => {
                    unreachable!("Closed UpValues are unlinked from the open list.")
                }
            };

            if location < boundary {
                break;
            }

            let value = self.stack[location].clone();
            up.replace(UpValRef::Closed(value));
            self.open_up_values.remove(0);
        }
    }
}

use crate::chunk::op_codes::OpCode;
use crate::objects::Object;
use num_traits::FromPrimitive;

// Submodules
pub mod disassembler;
pub mod op_codes;

/// Contains all the necessary information about
/// the instructions to be executed.
#[derive(Clone, Default)]
pub struct Chunk {
    /// The raw instruction bytes.
    code: Vec<u8>,
    /// The source line of each byte in `code`. Grows in
    /// lockstep with `code`.
    lines: Vec<usize>,
    /// The literal constant values found in this chunk of code.
    constants: Vec<Object>,
}

impl Chunk {
    /// Creates a new chunk.
    pub fn new() -> Self {
        Self {
            code: vec![],
            lines: vec![],
            constants: vec![],
        }
    }

    /// Adds a constant to this chunk's constants pool.
    ///
    /// ## Arguments
    /// * `obj` – The object to be added to the pool.
    ///
    /// ## Returns
    /// `usize` – The position of the object in the pool. The pool is
    /// append-only, so the returned index is stable.
    pub fn add_constant(&mut self, obj: Object) -> usize {
        self.constants.push(obj);
        self.constants.len() - 1
    }

    /// Retrieves a constant from this chunk's constants pool.
    pub fn get_constant(&self, idx: usize) -> &Object {
        &self.constants[idx]
    }

    /// Gets the OpCode associated with a byte instruction in the code list.
    pub fn get_op_code(&self, idx: usize) -> OpCode {
        FromPrimitive::from_u8(self.code[idx]).unwrap()
    }

    /// Adds a raw byte instruction from a given OpCode into the code list.
    pub fn push_op_code(&mut self, val: OpCode, line: usize) {
        self.push_byte(val as u8, line);
    }

    /// Gets a raw byte from the code list.
    pub fn get_byte(&self, idx: usize) -> u8 {
        self.code[idx]
    }

    /// Adds a raw byte into the code list.
    pub fn push_byte(&mut self, val: u8, line: usize) {
        self.code.push(val);
        self.lines.push(line);
    }

    /// Retrieves the current and next bytes at the given code index, then
    /// converts those two bytes into an u16 short.
    pub fn get_short(&self, idx: usize) -> u16 {
        let b1 = self.code[idx];
        let b2 = self.code[idx + 1];

        u16::from_be_bytes([b1, b2])
    }

    /// Splits a 16-bit integer into two bytes, and adds each individual
    /// byte in sequence into the code list.
    pub fn push_short(&mut self, val: u16, line: usize) {
        let short = val.to_be_bytes();

        self.push_byte(short[0], line);
        self.push_byte(short[1], line);
    }

    /// Retrieves three bytes starting at the given code index as a 24-bit
    /// big-endian unsigned integer.
    pub fn get_u24(&self, idx: usize) -> usize {
        let b1 = self.code[idx] as usize;
        let b2 = self.code[idx + 1] as usize;
        let b3 = self.code[idx + 2] as usize;

        (b1 << 16) | (b2 << 8) | b3
    }

    /// Splits a 24-bit integer into three bytes, and adds each individual
    /// byte in sequence into the code list.
    pub fn push_u24(&mut self, val: usize, line: usize) {
        self.push_byte(((val >> 16) & 0xff) as u8, line);
        self.push_byte(((val >> 8) & 0xff) as u8, line);
        self.push_byte((val & 0xff) as u8, line);
    }

    /// Modifies the byte value at the specified chunk index.
    pub fn modify_byte(&mut self, idx: usize, new_byte: u8) {
        self.code[idx] = new_byte;
    }

    /// Gets the source line associated with the byte at the given
    /// instruction index.
    pub fn get_line(&self, idx: usize) -> usize {
        self.lines[idx]
    }

    /// Gets the size of the code list.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Checks whether the code list is empty.
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Gets the size of the line list. Always equal to `len()`.
    pub fn lines_len(&self) -> usize {
        self.lines.len()
    }

    /// Gets the size of the constants pool list.
    pub fn get_pool_size(&self) -> usize {
        self.constants.len()
    }
}

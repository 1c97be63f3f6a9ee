use num_derive::FromPrimitive;

/// The set of instructions supported by the virtual machine.
///
/// **NOTE:** Changing the order in which members are declared creates
/// incompatibilities between different versions of the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[derive(FromPrimitive)]
pub enum OpCode {
    // Instructions with zero chunk operands.
    // Although these instructions do not have any bytecode operands, some
    // of them do have object operands from the stack.
    Add,
    CloseUpValue,
    Divide,
    Equals,
    GreaterThan,
    LessThan,
    LoadImmFalse,
    LoadImmNil,
    LoadImmTrue,
    LogicNot,
    Multiply,
    Negate,
    PopStackTop,
    Print,
    Return,
    Subtract,

    // Instructions with one chunk operand.
    // These instructions use the next byte from the chunk as their operand.
    DefineGlobal,
    FuncCall,
    GetGlobal,
    GetLocal,
    GetUpVal,
    LoadConstant,
    SetGlobal,
    SetLocal,
    SetUpVal,

    // Instructions with two chunk operands.
    // These instructions use the next two bytes (a short) as their operand.
    JumpForward,
    JumpIfFalse,
    LoopJump,

    // Instructions with three chunk operands.
    // `LoadConstantLong` uses the next three bytes as a 24-bit
    // big-endian constant-pool index.
    LoadConstantLong,

    // Instructions with a variable number of operands.
    MakeClosure,
    // Byte #1 is the position of the function object in the pool.
    // --- UpValue Encoding (2 bytes per up_value) ---
    // One byte for whether the up_value captures a local
    // One byte for the position of the captured variable
}

impl OpCode {
    /// The number of bytecode operand bytes that follow this instruction.
    /// `MakeClosure` additionally carries two bytes per captured variable,
    /// which only the function object in the pool knows about.
    pub fn operand_count(&self) -> usize {
        match self {
            OpCode::Add
            | OpCode::CloseUpValue
            | OpCode::Divide
            | OpCode::Equals
            | OpCode::GreaterThan
            | OpCode::LessThan
            | OpCode::LoadImmFalse
            | OpCode::LoadImmNil
            | OpCode::LoadImmTrue
            | OpCode::LogicNot
            | OpCode::Multiply
            | OpCode::Negate
            | OpCode::PopStackTop
            | OpCode::Print
            | OpCode::Return
            | OpCode::Subtract => 0,

            OpCode::DefineGlobal
            | OpCode::FuncCall
            | OpCode::GetGlobal
            | OpCode::GetLocal
            | OpCode::GetUpVal
            | OpCode::LoadConstant
            | OpCode::MakeClosure
            | OpCode::SetGlobal
            | OpCode::SetLocal
            | OpCode::SetUpVal => 1,

            OpCode::JumpForward | OpCode::JumpIfFalse | OpCode::LoopJump => 2,

            OpCode::LoadConstantLong => 3,
        }
    }
}

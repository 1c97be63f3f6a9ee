use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::objects::Object;

/// Disassembles the chunk, printing each instruction and its
/// related information.
///
/// ## Arguments
/// * `chunk` – The chunk to be disassembled.
/// * `name` – The name to print for the current chunk.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) {
    // prints this chunk's name
    println!("==== {} ====", name);

    let mut idx = 0;
    let mut current_line = 0;

    while idx < chunk.len() {
        // Prints a line number or a vertical bar indicating that the
        // current instruction is in the same line as the previous one.
        let line = chunk.get_line(idx);
        if line != current_line {
            print!("{:>05}\t", line);
            current_line = line;
        } else {
            print!("  |\t")
        }

        idx = disassemble_instruction(chunk, idx);
    }

    println!();
}

/// Disassembles a single instruction, printing the instruction index, its
/// name, and its operand.
///
/// ## Arguments
/// * `chunk` – The chunk the instruction lives in.
/// * `idx` – The index of the instruction's opcode byte.
///
/// ## Returns
/// `usize` – The index of the next instruction's opcode byte.
pub fn disassemble_instruction(chunk: &Chunk, idx: usize) -> usize {
    // Prints the index of the current instruction
    print!("{:>05} ", idx);

    let instr = chunk.get_op_code(idx);
    let mut operand_val = String::from("");

    match instr {
        OpCode::LoadConstant => {
            let pos = chunk.get_byte(idx + 1) as usize;
            operand_val = format!("{} -> ({})", pos, chunk.get_constant(pos));
        }
        OpCode::LoadConstantLong => {
            let pos = chunk.get_u24(idx + 1);
            operand_val = format!("{} -> ({})", pos, chunk.get_constant(pos));
        }
        OpCode::DefineGlobal | OpCode::GetGlobal | OpCode::SetGlobal => {
            let pos = chunk.get_byte(idx + 1) as usize;
            operand_val = format!("{} -> '{}'", pos, chunk.get_constant(pos));
        }
        OpCode::FuncCall
        | OpCode::GetLocal
        | OpCode::GetUpVal
        | OpCode::SetLocal
        | OpCode::SetUpVal => {
            operand_val = format!("{}", chunk.get_byte(idx + 1));
        }
        OpCode::JumpForward | OpCode::JumpIfFalse => {
            let offset = chunk.get_short(idx + 1) as usize;
            // `idx + 3` because at runtime, the IP points past the operand
            operand_val = format!("{} (add {} to IP)", idx + 3 + offset, offset);
        }
        OpCode::LoopJump => {
            let offset = chunk.get_short(idx + 1) as usize;
            operand_val = format!("{} (sub {} from IP)", (idx + 3) - offset, offset);
        }
        OpCode::MakeClosure => {
            let pos = chunk.get_byte(idx + 1) as usize;
            operand_val = format!("{} -> '{}'", pos, chunk.get_constant(pos));
        }
        // The remaining instructions have no bytecode operand.
        _ => {}
    }

    // Prints the instruction code and instruction name
    println!("{:#04X} – {:<18} {}", instr as u8, op_code_name(instr), operand_val);

    let mut next = idx + 1 + instr.operand_count();

    // A closure additionally encodes two bytes per captured variable,
    // sized by the function object in the pool.
    if let OpCode::MakeClosure = instr {
        let pos = chunk.get_byte(idx + 1) as usize;

        let up_val_count = match chunk.get_constant(pos) {
            Object::Function(f) => f.up_val_count,
            _ => unreachable!("Expected a function object for closure."),
        };

        for _ in 0..up_val_count {
            let is_local = chunk.get_byte(next) == 1u8;
            let index = chunk.get_byte(next + 1);
            let up_val_type = if is_local { "Local" } else { "UpVal" };
            println!("  |\t{:>05}      | {} idx={}", next, up_val_type, index);

            next += 2;
        }
    }

    next
}

/// Gets the display name of an instruction.
fn op_code_name(instr: OpCode) -> &'static str {
    match instr {
        OpCode::Add => "ADD",
        OpCode::CloseUpValue => "CLOSE_UP_VALUE",
        OpCode::DefineGlobal => "DEFINE_GLOBAL",
        OpCode::Divide => "DIVIDE",
        OpCode::Equals => "EQUALS",
        OpCode::FuncCall => "FUNC_CALL",
        OpCode::GetGlobal => "GET_GLOBAL",
        OpCode::GetLocal => "GET_LOCAL",
        OpCode::GetUpVal => "GET_UP_VAL",
        OpCode::GreaterThan => "GREATER_THAN",
        OpCode::JumpForward => "JUMP_FORWARD",
        OpCode::JumpIfFalse => "JUMP_IF_FALSE",
        OpCode::LessThan => "LESS_THAN",
        OpCode::LoadConstant => "LOAD_CONSTANT",
        OpCode::LoadConstantLong => "LOAD_CONSTANT_LONG",
        OpCode::LoadImmFalse => "LOAD_IMM_FALSE",
        OpCode::LoadImmNil => "LOAD_IMM_NIL",
        OpCode::LoadImmTrue => "LOAD_IMM_TRUE",
        OpCode::LogicNot => "LOGIC_NOT",
        OpCode::LoopJump => "LOOP_JUMP",
        OpCode::MakeClosure => "MAKE_CLOSURE",
        OpCode::Multiply => "MULTIPLY",
        OpCode::Negate => "NEGATE",
        OpCode::PopStackTop => "POP_STACK_TOP",
        OpCode::Print => "PRINT",
        OpCode::Return => "RETURN",
        OpCode::SetGlobal => "SET_GLOBAL",
        OpCode::SetLocal => "SET_LOCAL",
        OpCode::SetUpVal => "SET_UP_VAL",
        OpCode::Subtract => "SUBTRACT",
    }
}

use crate::chunk::disassembler::disassemble_instruction;
use crate::chunk::op_codes::OpCode;
use crate::chunk::Chunk;
use crate::compiler::Compiler;
use crate::objects::Object;

/// Walks a chunk one instruction at a time, collecting the opcodes at
/// instruction boundaries.
fn collect_op_codes(chunk: &Chunk) -> Vec<OpCode> {
    let mut ops = vec![];
    let mut idx = 0;

    while idx < chunk.len() {
        let op = chunk.get_op_code(idx);
        ops.push(op);

        idx += 1 + op.operand_count();

        // A closure instruction additionally carries two bytes per
        // captured variable.
        if let OpCode::MakeClosure = op {
            let pos = chunk.get_byte(idx - 1) as usize;

            match chunk.get_constant(pos) {
                Object::Function(f) => idx += 2 * f.up_val_count,
                _ => panic!("MakeClosure must refer to a function constant."),
            }
        }
    }

    ops
}

/// Drives the disassembler over a whole chunk, asserting that its cursor
/// advances instruction by instruction and lands exactly on the chunk's
/// end.
fn assert_clean_walk(chunk: &Chunk) {
    let mut idx = 0;

    while idx < chunk.len() {
        let next = disassemble_instruction(chunk, idx);
        assert!(next > idx, "the disassembler must make progress");
        assert!(next <= chunk.len(), "the disassembler overshot the chunk");
        idx = next;
    }

    assert_eq!(idx, chunk.len());
}

#[test]
fn script_function_is_nameless_with_no_arity() {
    let function = match Compiler::compile("") {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    assert!(function.name.is_none());
    assert_eq!(function.arity, 0);
    assert_eq!(function.up_val_count, 0);
}

#[test]
fn empty_script_compiles_to_nil_return() {
    let function = match Compiler::compile("") {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    assert_eq!(
        collect_op_codes(&function.chunk),
        vec![OpCode::LoadImmNil, OpCode::Return]
    );
}

#[test]
fn arithmetic_precedence_orders_the_emission() {
    let function = match Compiler::compile("print 1 + 2 * 3;") {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    // The multiplication binds tighter, so it executes before the
    // addition even though `+` appears first in the source.
    assert_eq!(
        collect_op_codes(&function.chunk),
        vec![
            OpCode::LoadConstant,
            OpCode::LoadConstant,
            OpCode::LoadConstant,
            OpCode::Multiply,
            OpCode::Add,
            OpCode::Print,
            OpCode::LoadImmNil,
            OpCode::Return,
        ]
    );
}

#[test]
fn code_and_lines_grow_in_lockstep() {
    let src = "var a = 1;\nvar b = 2;\n{ var c = a + b; print c; }\nif (a < b) print a; else print b;\nwhile (a < 0) a = a - 1;\n";

    let function = match Compiler::compile(src) {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    assert_eq!(function.chunk.len(), function.chunk.lines_len());
}

#[test]
fn constant_pool_is_append_only() {
    // The same literal twice still takes two pool slots: indexes already
    // handed out must stay stable, so nothing is deduplicated.
    let function = match Compiler::compile("8.9; 8.9;") {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    assert_eq!(function.chunk.get_pool_size(), 2);
}

#[test]
fn large_constant_pools_use_the_long_instruction() {
    // One global name plus 300 distinct number literals pushes the pool
    // past the one-byte range.
    let mut src = String::from("var total = 0.5");
    for i in 1..300 {
        src += &format!(" + {}.5", i);
    }
    src += ";";

    let function = match Compiler::compile(&src) {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    let ops = collect_op_codes(&function.chunk);
    assert!(ops.contains(&OpCode::LoadConstant));
    assert!(ops.contains(&OpCode::LoadConstantLong));

    assert_clean_walk(&function.chunk);
}

#[test]
fn disassembler_walks_every_instruction_boundary() {
    let src = "\
var g = 1;
fun outer(x) {
    var a = x;
    fun inner() {
        a = a + 1;
        return a;
    }
    inner();
    return inner;
}
var h = outer(5);
while (g < 3) {
    g = g + 1;
}
if (g == 3) print \"y\"; else print \"n\";
print -g;
print !true;
print 1 - 2;
print 2 * 3;
print 4 / 2;
print 1 > 2;
print 1 <= 2;
print nil or g;
print nil and g;
";

    let function = match Compiler::compile(src) {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    // Walk the script chunk, then every nested function chunk reachable
    // from its constant pool.
    let mut chunks = vec![function.chunk];
    let mut idx = 0;

    while idx < chunks.len() {
        let mut nested = vec![];

        for pos in 0..chunks[idx].get_pool_size() {
            if let Object::Function(f) = chunks[idx].get_constant(pos) {
                nested.push(f.chunk.clone());
            }
        }

        chunks.extend(nested);
        idx += 1;
    }

    // The program declares two functions.
    assert_eq!(chunks.len(), 3);

    for chunk in chunks.iter() {
        assert_clean_walk(chunk);
        assert_eq!(chunk.len(), chunk.lines_len());
    }
}

#[test]
fn nested_function_captures_are_encoded_in_up_val_count() {
    let src = "\
fun make(x) {
    fun get() {
        return x;
    }
    return get;
}
";

    let function = match Compiler::compile(src) {
        Ok(f) => f,
        Err(_) => panic!("Compiler Had Errors."),
    };

    let make = (0..function.chunk.get_pool_size())
        .find_map(|pos| match function.chunk.get_constant(pos) {
            Object::Function(f) => Some(f.clone()),
            _ => None,
        })
        .expect("the script pool holds the `make` function");

    assert_eq!(make.arity, 1);
    assert_eq!(make.up_val_count, 0);

    let get = (0..make.chunk.get_pool_size())
        .find_map(|pos| match make.chunk.get_constant(pos) {
            Object::Function(f) => Some(f.clone()),
            _ => None,
        })
        .expect("the `make` pool holds the `get` function");

    assert_eq!(get.up_val_count, 1);
}

#[test]
fn reports_missing_expression() {
    assert!(Compiler::compile("1 +;").is_err());
    assert!(Compiler::compile("print ;").is_err());
}

#[test]
fn reports_invalid_assignment_target() {
    assert!(Compiler::compile("1 = 2;").is_err());
    assert!(Compiler::compile("a + b = 1;").is_err());
}

#[test]
fn reports_local_read_in_its_own_initializer() {
    assert!(Compiler::compile("{ var a = a; }").is_err());
}

#[test]
fn reports_duplicate_local_in_same_scope() {
    assert!(Compiler::compile("{ var a = 1; var a = 2; }").is_err());

    // Shadowing an enclosing scope is allowed.
    assert!(Compiler::compile("{ var a = 1; { var a = 2; } }").is_ok());
}

#[test]
fn reports_return_at_top_level() {
    assert!(Compiler::compile("return 1;").is_err());
}

#[test]
fn reports_jump_distance_overflow() {
    // A then-branch bigger than a 16-bit offset cannot be jumped over.
    let mut src = String::from("if (true) {\n");
    for _ in 0..22_000 {
        src += "print 1;\n";
    }
    src += "}\n";

    assert!(Compiler::compile(&src).is_err());
}

#[test]
fn reports_too_many_global_name_constants() {
    // Global name operands are a single byte; past 255 pool entries the
    // compiler must refuse instead of silently truncating the index.
    let mut src = String::new();
    for i in 0..300 {
        src += &format!("var g{} = {};\n", i, i);
    }

    assert!(Compiler::compile(&src).is_err());
}

#[test]
fn recovers_at_statement_boundaries() {
    // Both statements are bad; panic-mode recovery lets the compiler
    // reach the second one, and the result is still an error.
    assert!(Compiler::compile("var 1;\nvar 2;\n").is_err());

    // An error followed by healthy statements still fails the compile.
    assert!(Compiler::compile("var 1;\nvar ok = 1;\n").is_err());
}

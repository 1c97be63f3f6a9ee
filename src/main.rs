#![allow(dead_code)]

use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::process;

// Declaring crate-level Modules
mod built_in;
mod chunk;
mod compiler;
mod errors;
mod lexer;
mod objects;
mod virtual_machine;

#[cfg(test)]
mod tests;

use virtual_machine::{InterpretResult, Vm};

/// The main function
fn main() {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => repl(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: lox [path]");
            process::exit(64);
        }
    }
}

/// Runs an interactive session. Every line is interpreted in the same
/// virtual machine, so globals persist between lines. End-of-file ends
/// the session.
fn repl() {
    let mut vm = Vm::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => {
                println!();
                break;
            }
            Ok(_) => {
                vm.interpret(&line);
            }
        }
    }
}

/// Interprets a source file and exits the process with the appropriate
/// status code.
fn run_file(path: &str) {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(_) => {
            eprintln!("Could not open file \"{}\".", path);
            process::exit(74);
        }
    };

    // Creates a virtual machine and interprets the source contents in it
    let mut vm = Vm::new();
    let result = vm.interpret(&contents);

    // Exit the interpreter with the appropriate code
    match result {
        InterpretResult::CompileError => process::exit(65),
        InterpretResult::RuntimeError => process::exit(70),
        InterpretResult::Ok => (),
    }
}

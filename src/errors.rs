use crate::virtual_machine::Vm;

/// Reports a runtime error to stderr: the error message, followed by a
/// stack trace with one frame per line, innermost call first. The line
/// of each frame is the source line of the instruction it is currently
/// executing, recovered from the chunk's line table.
///
/// ## Arguments
/// * `vm` – A reference to the virtual machine.
/// * `message` – The error message to be displayed.
pub fn report_runtime_error(vm: &Vm, message: &str) {
    eprintln!("{}", message);

    for frame in vm.frames.iter().rev() {
        let function = &frame.closure.function;
        // The ip has already advanced past the failing instruction.
        let line = function.chunk.get_line(frame.ip - 1);

        match &function.name {
            Some(name) => eprintln!("[line {}] in {}()", line, name),
            None => eprintln!("[line {}] in script", line),
        }
    }
}

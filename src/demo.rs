//! The bundled demo: a greeting followed by a countdown.

use assembler::{AsmError, CodeBuilder};
use console::Console;
use engine::{Machine, Opcode, VmError, VmStatus, Word};

pub const GREETING: &str = "Hello from tapevm!\n";
pub const FAREWELL: &str = "Liftoff!\n";

/// Where the farewell text is placed, away from the code.
pub const FAREWELL_ADDRESS: usize = 1024;

/// Builds a program that greets, prints `from` down to 1, then says goodbye.
pub fn countdown_program(from: Word) -> Result<Vec<u8>, AsmError> {
    let mut b = CodeBuilder::new();
    b.op_label(Opcode::Push, "greeting")
        .op_word(Opcode::Push, GREETING.len() as Word)
        .op(Opcode::PrintString)
        .op_word(Opcode::Const, from)
        .label("loop")
        .op(Opcode::Dup)
        .op(Opcode::Test)
        .op_label(Opcode::Jz, "done")
        .op(Opcode::Dup)
        .op(Opcode::PrintInt)
        .op_word(Opcode::Push, 1)
        .op(Opcode::Sub)
        .op_label(Opcode::Jmp, "loop")
        .label("done")
        .op(Opcode::Pop)
        .op_word(Opcode::Push, FAREWELL_ADDRESS as Word)
        .op_word(Opcode::Push, FAREWELL.len() as Word)
        .op(Opcode::PrintString)
        .op(Opcode::Halt)
        .label("greeting")
        .string(GREETING)
        .place_string(FAREWELL_ADDRESS, FAREWELL);
    b.finish()
}

/// Runs `image` for at most `fuel` instructions.
///
/// Returns the final status; `Running` means the budget ran out.
pub fn run_with_fuel<C: Console + ?Sized>(
    image: &[u8],
    console: &mut C,
    mut fuel: u64,
) -> Result<VmStatus, VmError> {
    let mut vm = Machine::with_program(image)?;
    while fuel > 0 && vm.step(console) == &VmStatus::Running {
        fuel -= 1;
    }
    Ok(vm.status().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use console::ScriptedConsole;

    #[test]
    fn countdown_prints_greeting_numbers_and_farewell() {
        let image = countdown_program(3).unwrap();
        let mut console = ScriptedConsole::new();
        let status = run_with_fuel(&image, &mut console, 1_000).unwrap();
        assert_eq!(status, VmStatus::Halted);
        assert_eq!(console.output(), "Hello from tapevm!\n321Liftoff!\n");
    }

    #[test]
    fn zero_skips_the_loop() {
        let image = countdown_program(0).unwrap();
        let mut console = ScriptedConsole::new();
        run_with_fuel(&image, &mut console, 1_000).unwrap();
        assert_eq!(console.output(), format!("{}{}", GREETING, FAREWELL));
    }

    #[test]
    fn fuel_runs_out_on_long_countdowns() {
        let image = countdown_program(1_000_000).unwrap();
        let mut console = ScriptedConsole::new();
        let status = run_with_fuel(&image, &mut console, 50).unwrap();
        assert_eq!(status, VmStatus::Running);
    }
}

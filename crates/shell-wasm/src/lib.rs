use wasm_bindgen::prelude::*;

use assembler::assemble;
use console::ScriptedConsole;
use engine::{Machine, VmStatus};

/// Instructions a browser run may execute before it is cut off.
pub const STEP_BUDGET: u32 = 100_000;

#[wasm_bindgen]
pub fn init_shell() -> String {
    "tapevm: WASM shell online. Call run_source(source, input).".to_string()
}

/// Assembles and runs `source`, feeding it `input` one line per read.
///
/// Returns everything the program printed. An assembly error, a fault or an
/// exhausted budget is reported on a final `[tapevm] ...` line.
#[wasm_bindgen]
pub fn run_source(source: &str, input: &str) -> String {
    let image = match assemble(source) {
        Ok(image) => image,
        Err(err) => return format!("[tapevm] assembly error: {}", err),
    };
    let mut vm = match Machine::with_program(&image) {
        Ok(vm) => vm,
        Err(err) => return format!("[tapevm] {}", err),
    };

    let mut console = ScriptedConsole::with_input(input.lines());
    let mut fuel = STEP_BUDGET;
    while fuel > 0 && vm.step(&mut console) == &VmStatus::Running {
        fuel -= 1;
    }

    let mut out = console.output();
    match vm.status() {
        VmStatus::Halted => {}
        VmStatus::Faulted(err) => {
            out.push_str(&format!("\n[tapevm] fault at {}: {}", vm.ip(), err));
        }
        VmStatus::Running => {
            out.push_str(&format!("\n[tapevm] stopped after {} steps", STEP_BUDGET));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_to_halt() {
        assert_eq!(run_source("READ_INT\nPUSH 2\nMUL\nPRINT_INT\nHALT", "21\n"), "42");
    }

    #[test]
    fn reports_assembly_errors() {
        assert_eq!(
            run_source("PUSH", ""),
            "[tapevm] assembly error: line 1: PUSH needs an operand"
        );
    }

    #[test]
    fn reports_faults_after_output() {
        let out = run_source("PUSH 1\nPRINT_INT\nPOP\nHALT", "");
        assert!(out.starts_with("1\n[tapevm] fault at 6:"), "{}", out);
    }

    #[test]
    fn cuts_off_endless_loops() {
        let out = run_source("top: JMP top", "");
        assert_eq!(out, format!("\n[tapevm] stopped after {} steps", STEP_BUDGET));
    }
}

use colored::*;

use assembler::assemble;
use console::ScriptedConsole;
use engine::word;
use engine::{ErrorKind, Machine, MachineConfig, Opcode, VmStatus};

const BANNER: &str = r#"
================================================================================
TAPEVM // CONFORMANCE RUN
================================================================================
Byte-coded stack machine: 4-byte LE words, flat tape, operand stack, flags.
Every check below assembles a small program, runs it against a scripted
console and inspects the final machine.
================================================================================
"#;

const FUEL: u32 = 10_000;

fn main() {
    println!("{}", BANNER);
    let mut passed = 0;
    let mut failed = 0;

    run_test("OPCODE_TABLE", test_opcode_table, &mut passed, &mut failed);
    run_test("WORD_ROUND_TRIP", test_word_round_trip, &mut passed, &mut failed);
    run_test("ADD_AND_PRINT", test_add_and_print, &mut passed, &mut failed);
    run_test("CMP_EQUAL_TAKES_JE", test_cmp_equal_takes_je, &mut passed, &mut failed);
    run_test("POP_EMPTY_UNDERFLOWS", test_pop_empty_underflows, &mut passed, &mut failed);
    run_test("PUSH_POP_RESTORES_STACK", test_push_pop_restores, &mut passed, &mut failed);
    run_test("ADD_WRAPS_AROUND", test_add_wraps, &mut passed, &mut failed);
    run_test("DIV_BY_ZERO_TRAPS", test_div_by_zero, &mut passed, &mut failed);
    run_test("CALL_OUT_OF_BOUNDS", test_call_out_of_bounds, &mut passed, &mut failed);
    run_test("CALL_RET_RESUMES", test_call_ret_resumes, &mut passed, &mut failed);

    println!("\n--------------------------------------------------------------------------------");
    println!("{} passed, {} failed", passed, failed);
    if failed == 0 {
        println!("{}", "ALL CHECKS PASSED.".green().bold());
    } else {
        std::process::exit(1);
    }
}

// --- HARNESS ---

fn run_test<F>(name: &str, test_fn: F, passed: &mut i32, failed: &mut i32)
where
    F: Fn() -> Result<(), String>,
{
    print!("CHECK: {:<30} ... ", name);
    match test_fn() {
        Ok(()) => {
            println!("{}", "PASS".green());
            *passed += 1;
        }
        Err(e) => {
            println!("{}", "FAIL".red());
            println!("  -> {}", e);
            *failed += 1;
        }
    }
}

fn execute(source: &str, config: &MachineConfig) -> Result<(Machine, ScriptedConsole), String> {
    let image = assemble(source).map_err(|e| e.to_string())?;
    let mut vm = Machine::new(config);
    vm.load(&image).map_err(|e| e.to_string())?;
    let mut console = ScriptedConsole::new();
    let mut fuel = FUEL;
    while fuel > 0 && vm.step(&mut console) == &VmStatus::Running {
        fuel -= 1;
    }
    if vm.is_running() {
        return Err(format!("still running after {} steps", FUEL));
    }
    Ok((vm, console))
}

fn run(source: &str) -> Result<(Machine, ScriptedConsole), String> {
    execute(source, &MachineConfig::default())
}

fn expect_fault(vm: &Machine, kind: ErrorKind) -> Result<(), String> {
    match vm.status() {
        VmStatus::Faulted(err) if err.kind() == kind => Ok(()),
        other => Err(format!("expected {:?} fault, got {:?}", kind, other)),
    }
}

// --- CHECKS ---

fn test_opcode_table() -> Result<(), String> {
    let expected = [
        (Opcode::Nop, 0x00),
        (Opcode::Push, 0x01),
        (Opcode::Const, 0x03),
        (Opcode::Cmp, 0x0f),
        (Opcode::Jmp, 0x10),
        (Opcode::ReadString, 0x18),
        (Opcode::Test, 0x19),
        (Opcode::Jl, 0xf0),
        (Opcode::Jae, 0xf5),
        (Opcode::Halt, 0xff),
    ];
    for (op, byte) in expected {
        if op.byte() != byte {
            return Err(format!("{} is 0x{:02x}, expected 0x{:02x}", op, op.byte(), byte));
        }
    }
    if Opcode::decode(0x42).is_some() {
        return Err("0x42 decodes".into());
    }
    Ok(())
}

fn test_word_round_trip() -> Result<(), String> {
    for v in [0, 1, -1, 255, 256, i32::MAX, i32::MIN, 0x1234_5678] {
        if word::decode(&word::encode(v)) != Some(v) {
            return Err(format!("{} did not survive", v));
        }
    }
    Ok(())
}

fn test_add_and_print() -> Result<(), String> {
    let (vm, console) = run("PUSH 3\nPUSH 4\nADD\nPRINT_INT\nHALT")?;
    if vm.status() != &VmStatus::Halted {
        return Err(format!("status {:?}", vm.status()));
    }
    if console.output() != "7" {
        return Err(format!("printed {:?}", console.output()));
    }
    Ok(())
}

fn test_cmp_equal_takes_je() -> Result<(), String> {
    let source = "
            PUSH 5
            PUSH 5
            CMP
            JE hit
            PUSH 0
            PRINT_INT
            HALT
    hit:    PUSH 1
            PRINT_INT
            HALT
    ";
    let (vm, console) = run(source)?;
    if console.output() != "1" {
        return Err("JE not taken".into());
    }
    let flags = vm.flags();
    if !flags.equal() || flags.above() || flags.below() {
        return Err(format!("flags {:?}", flags));
    }
    Ok(())
}

fn test_pop_empty_underflows() -> Result<(), String> {
    let (vm, console) = run("POP\nHALT")?;
    expect_fault(&vm, ErrorKind::StackUnderflow)?;
    if !console.events().is_empty() {
        return Err("produced output".into());
    }
    Ok(())
}

fn test_push_pop_restores() -> Result<(), String> {
    let (vm, _) = run("PUSH 1\nPUSH 2\nPUSH 99\nPOP\nHALT")?;
    if vm.stack().as_slice() != [1, 2] {
        return Err(format!("stack {:?}", vm.stack().as_slice()));
    }
    Ok(())
}

fn test_add_wraps() -> Result<(), String> {
    let (_, console) = run("PUSH 2147483647\nPUSH 1\nADD\nPRINT_INT\nHALT")?;
    if console.output() != i32::MIN.to_string() {
        return Err(format!("printed {:?}", console.output()));
    }
    Ok(())
}

fn test_div_by_zero() -> Result<(), String> {
    let (vm, _) = run("PUSH 9\nPUSH 0\nDIV\nHALT")?;
    expect_fault(&vm, ErrorKind::Arithmetic)
}

fn test_call_out_of_bounds() -> Result<(), String> {
    let config = MachineConfig::default().with_tape_capacity(64);
    let (vm, _) = execute("PUSH 1000\nCALL\nHALT", &config)?;
    expect_fault(&vm, ErrorKind::Bounds)?;
    if vm.stack().as_slice() != [1000] {
        return Err(format!("stack mutated: {:?}", vm.stack().as_slice()));
    }
    Ok(())
}

fn test_call_ret_resumes() -> Result<(), String> {
    let source = "
            PUSH sub
            CALL
            PUSH 2
            PRINT_INT
            HALT
    sub:    PUSH 1
            PRINT_INT
            RET
    ";
    let (vm, console) = run(source)?;
    if vm.status() != &VmStatus::Halted || console.output() != "12" {
        return Err(format!("printed {:?}, status {:?}", console.output(), vm.status()));
    }
    Ok(())
}

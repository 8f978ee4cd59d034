use assembler::{AsmError, CodeBuilder, Listing, assemble, disassemble};
use console::{Output, ScriptedConsole};
use engine::{ErrorKind, Machine, Opcode, VmStatus};

fn run_source(source: &str, input: &[&str]) -> (Machine, ScriptedConsole) {
    let image = assemble(source).expect("assembles");
    let mut vm = Machine::with_program(&image).expect("fits the tape");
    let mut console = ScriptedConsole::with_input(input.iter().copied());
    let mut fuel = 10_000;
    while fuel > 0 && vm.step(&mut console) == &VmStatus::Running {
        fuel -= 1;
    }
    assert!(fuel > 0, "program did not stop");
    (vm, console)
}

#[test]
fn adds_and_prints() {
    let (vm, console) = run_source("PUSH 3\nPUSH 4\nADD\nPRINT_INT\nHALT", &[]);
    assert_eq!(vm.status(), &VmStatus::Halted);
    assert_eq!(console.output(), "7");
}

#[test]
fn equal_compare_takes_je() {
    let source = "
                PUSH 5
                PUSH 5
                CMP
                JE same
                PUSH 0
                PRINT_INT
                HALT
        same:   PUSH 1
                PRINT_INT
                HALT
    ";
    let (vm, console) = run_source(source, &[]);
    assert_eq!(console.output(), "1");
    assert!(vm.flags().equal());
    assert!(!vm.flags().above() && !vm.flags().below());
}

#[test]
fn pop_on_empty_stack_faults_silently() {
    let (vm, console) = run_source("POP\nHALT", &[]);
    match vm.status() {
        VmStatus::Faulted(err) => assert_eq!(err.kind(), ErrorKind::StackUnderflow),
        other => panic!("expected a fault, got {:?}", other),
    }
    assert!(console.events().is_empty());
}

#[test]
fn hello_world_from_data_label() {
    let source = r#"
                PUSH msg
                PUSH 6
                PRINT_STRING
                HALT
        msg:    .string "hello\n"
    "#;
    let (_, console) = run_source(source, &[]);
    assert_eq!(console.output(), "hello\n");
}

#[test]
fn countdown_loop() {
    let source = "
                READ_INT
        loop:   DUP
                TEST
                JZ done
                DUP
                PRINT_INT
                PUSH 1
                SUB
                JMP loop
        done:   POP
                HALT
    ";
    let (vm, console) = run_source(source, &["3"]);
    assert_eq!(
        console.events(),
        &[Output::Number(3), Output::Number(2), Output::Number(1)]
    );
    assert!(vm.stack().is_empty());
}

#[test]
fn subroutine_squares_its_argument() {
    let source = "
                READ_INT
                PUSH square
                CALL
                PRINT_INT
                HALT
        square: SWAP        ; [ret, n]
                DUP
                MUL
                SWAP        ; [n*n, ret]
                RET
    ";
    let (vm, console) = run_source(source, &["12"]);
    assert_eq!(vm.status(), &VmStatus::Halted);
    assert_eq!(console.output(), "144");
}

#[test]
fn echoes_a_line_through_a_buffer() {
    let source = "
                PUSH buf
                PUSH 16
                READ_STRING
                PUSH buf
                SWAP
                PRINT_STRING
                HALT
        buf:
    ";
    let (_, console) = run_source(source, &["hello"]);
    assert_eq!(console.output(), "hello");
}

#[test]
fn malformed_number_input_faults() {
    let (vm, _) = run_source("READ_INT\nHALT", &["twelve"]);
    match vm.status() {
        VmStatus::Faulted(err) => assert_eq!(err.kind(), ErrorKind::IoFormat),
        other => panic!("expected a fault, got {:?}", other),
    }
}

#[test]
fn builder_and_text_agree() {
    let text = assemble("top: PUSH 'A'\nPRINT_INT\nJMP top").unwrap();
    let mut b = CodeBuilder::new();
    b.label("top")
        .op_word(Opcode::Push, 'A' as i32)
        .op(Opcode::PrintInt)
        .op_label(Opcode::Jmp, "top");
    assert_eq!(b.finish().unwrap(), text);
}

#[test]
fn listing_reflects_assembled_source() {
    let image = assemble("PUSH 10\nloop: DUP\nJNZ loop\nHALT").unwrap();
    let listing = disassemble(&image, 0..image.len());
    let rendered: Vec<String> = listing.iter().map(|line| line.to_string()).collect();
    assert_eq!(
        rendered,
        vec!["     0  PUSH 10", "     5  DUP", "     6  JNZ 5", "    11  HALT"]
    );

    let json = serde_json::to_string(&listing[2]).unwrap();
    let back: Listing = serde_json::from_str(&json).unwrap();
    assert_eq!(back, listing[2]);
    assert!(json.contains("\"Jnz\""));
}

#[test]
fn assembly_errors_point_at_the_line() {
    let err = assemble("PUSH 1\n\nJMP nowhere\n").unwrap_err();
    assert_eq!(err.line(), Some(3));
    assert!(matches!(err, AsmError::Syntax { .. }));
    assert_eq!(err.to_string(), "line 3: undefined label `nowhere`");
}

//! Fetch-decode-execute engine.
//!
//! One [`Machine`] owns a tape, an operand stack and a flags register and runs
//! the image loaded at address 0 until HALT, until IP runs off the end of the
//! tape, or until an instruction faults. There is no instruction budget:
//! callers that need one drive [`Machine::step`] themselves.
//!
//! Every instruction checks its preconditions (operand bytes on the tape,
//! stack depth, addresses and jump targets) before it mutates anything, so a
//! faulted machine shows the stack and tape exactly as they were before the
//! failing instruction.

use console::Console;
use serde::Serialize;

use crate::config::{MAX_TAPE_CAPACITY, MachineConfig};
use crate::error::VmError;
use crate::flags::{Condition, Flags};
use crate::isa::{ArithOp, Opcode};
use crate::stack::OperandStack;
use crate::tape::Tape;
use crate::word::{WORD_SIZE, Word};
use crate::{debug, error, info};

/// Value pushed by READ_STRING when the line read does not fit the buffer.
pub const READ_STRING_OVERFLOW: Word = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmStatus {
    Running,
    Halted,
    Faulted(VmError),
}

impl VmStatus {
    pub fn name(&self) -> &'static str {
        match self {
            VmStatus::Running => "running",
            VmStatus::Halted => "halted",
            VmStatus::Faulted(_) => "faulted",
        }
    }
}

/// What to do with IP once an instruction has executed.
enum Flow {
    /// Move past the instruction and its immediate.
    Next,
    /// IP was already set to a validated target.
    Jump,
    Halt,
}

/// Post-mortem view of a machine.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub status: &'static str,
    pub fault: Option<String>,
    pub ip: usize,
    pub steps: u64,
    pub stack: Vec<Word>,
    pub flags: Flags,
}

pub struct Machine {
    tape: Tape,
    stack: OperandStack,
    flags: Flags,
    ip: usize,
    status: VmStatus,
    steps: u64,
}

impl Machine {
    /// Creates a machine with a zeroed tape. It is `Running` with IP at 0.
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            tape: Tape::new(config.tape_capacity.min(MAX_TAPE_CAPACITY)),
            stack: OperandStack::new(config.max_stack_depth),
            flags: Flags::default(),
            ip: 0,
            status: VmStatus::Running,
            steps: 0,
        }
    }

    /// Default-sized machine with `image` already loaded.
    pub fn with_program(image: &[u8]) -> Result<Self, VmError> {
        let mut vm = Self::new(&MachineConfig::default());
        vm.load(image)?;
        Ok(vm)
    }

    /// Places `image` at address 0 and resets IP, stack, flags and status.
    ///
    /// An oversized image is rejected and leaves the machine untouched.
    pub fn load(&mut self, image: &[u8]) -> Result<(), VmError> {
        self.tape.load(image)?;
        self.stack.clear();
        self.flags = Flags::default();
        self.ip = 0;
        self.steps = 0;
        self.status = VmStatus::Running;
        info!(
            "loaded {} byte image into {} byte tape",
            image.len(),
            self.tape.capacity()
        );
        Ok(())
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn status(&self) -> &VmStatus {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == VmStatus::Running
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Instructions dispatched since the last load, the faulting one included.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            status: self.status.name(),
            fault: match &self.status {
                VmStatus::Faulted(err) => Some(err.to_string()),
                _ => None,
            },
            ip: self.ip,
            steps: self.steps,
            stack: self.stack.as_slice().to_vec(),
            flags: self.flags,
        }
    }

    /// Runs until the machine halts or faults.
    pub fn run<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<(), VmError> {
        loop {
            match self.step(console) {
                VmStatus::Running => {}
                VmStatus::Halted => return Ok(()),
                VmStatus::Faulted(err) => return Err(err.clone()),
            }
        }
    }

    /// Executes one instruction. Does nothing once the machine has stopped.
    pub fn step<C: Console + ?Sized>(&mut self, console: &mut C) -> &VmStatus {
        if self.status != VmStatus::Running {
            return &self.status;
        }
        match self.cycle(console) {
            Ok(Flow::Halt) => {
                info!("halted at {} after {} steps", self.ip, self.steps);
                self.status = VmStatus::Halted;
            }
            Ok(Flow::Next | Flow::Jump) => {}
            Err(err) => {
                error!("fault at {} after {} steps: {}", self.ip, self.steps, err);
                self.status = VmStatus::Faulted(err);
            }
        }
        &self.status
    }

    fn cycle<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<Flow, VmError> {
        // Falling off the end of the tape is a clean stop.
        if self.ip == self.tape.capacity() {
            return Ok(Flow::Halt);
        }
        let address = self.ip;
        let byte = self.tape.read_byte(address)?;
        let op = Opcode::decode(byte).ok_or(VmError::UnknownOpcode {
            opcode: byte,
            address,
        })?;
        debug!(
            "{:05} {:<12} depth={}",
            address,
            op.mnemonic(),
            self.stack.len()
        );
        self.steps += 1;

        let flow = self.execute(op, console)?;
        if let Flow::Next = flow {
            self.ip += op.size();
        }
        Ok(flow)
    }

    fn execute<C: Console + ?Sized>(
        &mut self,
        op: Opcode,
        console: &mut C,
    ) -> Result<Flow, VmError> {
        let name = op.mnemonic();
        match op {
            Opcode::Nop => {}
            Opcode::Push | Opcode::Const => {
                let value = self.immediate()?;
                self.stack.push(value)?;
            }
            Opcode::Pop => {
                self.stack.pop(name)?;
            }
            Opcode::Load => self.op_load()?,
            Opcode::Store => self.op_store()?,
            Opcode::Add => self.op_arith(ArithOp::Add)?,
            Opcode::Sub => self.op_arith(ArithOp::Sub)?,
            Opcode::Mul => self.op_arith(ArithOp::Mul)?,
            Opcode::Div => self.op_arith(ArithOp::Div)?,
            Opcode::Mod => self.op_arith(ArithOp::Mod)?,
            Opcode::Call => return self.op_call(),
            Opcode::Ret => {
                self.ip = self.target(self.stack.peek(name)?)?;
                self.stack.pop(name)?;
                return Ok(Flow::Jump);
            }
            Opcode::Dup => {
                let top = self.stack.peek(name)?;
                self.stack.push(top)?;
            }
            Opcode::Swap => {
                self.stack.require(2, name)?;
                let b = self.stack.pop(name)?;
                let a = self.stack.pop(name)?;
                self.stack.push(b)?;
                self.stack.push(a)?;
            }
            Opcode::Cmp => {
                self.stack.require(2, name)?;
                let b = self.stack.pop(name)?;
                let a = self.stack.pop(name)?;
                self.flags.compare(a, b);
            }
            Opcode::Test => {
                let a = self.stack.pop(name)?;
                self.flags.test(a);
            }
            Opcode::Jmp => {
                self.ip = self.target(self.immediate()?)?;
                return Ok(Flow::Jump);
            }
            Opcode::Jz => return self.op_jump_if(Condition::Zero),
            Opcode::Jnz => return self.op_jump_if(Condition::NotZero),
            Opcode::Jbz => return self.op_jump_if(Condition::BelowZero),
            Opcode::Jaz => return self.op_jump_if(Condition::AboveZero),
            Opcode::Jl => return self.op_jump_if(Condition::Below),
            Opcode::Jle => return self.op_jump_if(Condition::BelowOrEqual),
            Opcode::Je => return self.op_jump_if(Condition::Equal),
            Opcode::Jne => return self.op_jump_if(Condition::NotEqual),
            Opcode::Ja => return self.op_jump_if(Condition::Above),
            Opcode::Jae => return self.op_jump_if(Condition::AboveOrEqual),
            Opcode::PrintInt => {
                let value = self.stack.peek(name)?;
                console.write_number(value)?;
                self.stack.pop(name)?;
            }
            Opcode::PrintString => self.op_print_string(console)?,
            Opcode::ReadInt => {
                self.stack.reserve(1)?;
                let value = console.read_number()?;
                self.stack.push(value)?;
            }
            Opcode::ReadString => self.op_read_string(console)?,
            Opcode::Halt => return Ok(Flow::Halt),
        }
        Ok(Flow::Next)
    }

    /// The word following the opcode at IP.
    fn immediate(&self) -> Result<Word, VmError> {
        self.tape.read_word(self.ip + 1)
    }

    /// Validates a control-transfer destination.
    fn target(&self, destination: Word) -> Result<usize, VmError> {
        self.tape.address(destination, 1)
    }

    /// Validates the byte region `[address, address + len)` given as two words.
    fn region(&self, address: Word, len: Word) -> Result<std::ops::Range<usize>, VmError> {
        let len = usize::try_from(len)
            .map_err(|_| self.tape.out_of_bounds(address as i64 + len as i64, 0))?;
        let start = self.tape.address(address, len)?;
        Ok(start..start + len)
    }

    fn op_load(&mut self) -> Result<(), VmError> {
        let address = self.tape.address(self.stack.peek("LOAD")?, WORD_SIZE)?;
        let value = self.tape.read_word(address)?;
        self.stack.pop("LOAD")?;
        self.stack.push(value)
    }

    fn op_store(&mut self) -> Result<(), VmError> {
        self.stack.require(2, "STORE")?;
        let value = self.stack.peek_at(0, "STORE")?;
        let address = self.tape.address(self.stack.peek_at(1, "STORE")?, WORD_SIZE)?;
        self.tape.write_word(address, value)?;
        self.stack.pop("STORE")?;
        self.stack.pop("STORE")?;
        Ok(())
    }

    fn op_arith(&mut self, arith: ArithOp) -> Result<(), VmError> {
        let name = arith.mnemonic();
        self.stack.require(2, name)?;
        let b = self.stack.peek_at(0, name)?;
        let a = self.stack.peek_at(1, name)?;
        let result = arith.apply(a, b)?;
        self.stack.pop(name)?;
        self.stack.pop(name)?;
        self.stack.push(result)
    }

    fn op_call(&mut self) -> Result<Flow, VmError> {
        let target = self.target(self.stack.peek("CALL")?)?;
        // ip + 1 <= capacity <= i32::MAX
        let return_address = (self.ip + Opcode::Call.size()) as Word;
        self.stack.pop("CALL")?;
        self.stack.push(return_address)?;
        self.ip = target;
        Ok(Flow::Jump)
    }

    /// Reads the destination even when not taken; only a taken jump validates it.
    fn op_jump_if(&mut self, condition: Condition) -> Result<Flow, VmError> {
        let destination = self.immediate()?;
        if !self.flags.holds(condition) {
            return Ok(Flow::Next);
        }
        self.ip = self.target(destination)?;
        Ok(Flow::Jump)
    }

    fn op_print_string<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<(), VmError> {
        self.stack.require(2, "PRINT_STRING")?;
        let len = self.stack.peek_at(0, "PRINT_STRING")?;
        let address = self.stack.peek_at(1, "PRINT_STRING")?;
        let range = self.region(address, len)?;
        let bytes = self.tape.read_slice(range.start, range.len())?;
        console.write_text(&String::from_utf8_lossy(bytes))?;
        self.stack.pop("PRINT_STRING")?;
        self.stack.pop("PRINT_STRING")?;
        Ok(())
    }

    fn op_read_string<C: Console + ?Sized>(&mut self, console: &mut C) -> Result<(), VmError> {
        self.stack.require(2, "READ_STRING")?;
        let capacity = self.stack.peek_at(0, "READ_STRING")?;
        let address = self.stack.peek_at(1, "READ_STRING")?;
        let buffer = self.region(address, capacity)?;

        let text = console.read_text()?;
        let bytes = text.as_bytes();
        self.stack.pop("READ_STRING")?;
        self.stack.pop("READ_STRING")?;
        if bytes.len() > buffer.len() {
            return self.stack.push(READ_STRING_OVERFLOW);
        }
        self.tape.write_slice(buffer.start, bytes)?;
        // bytes.len() <= capacity, which came from a word
        self.stack.push(bytes.len() as Word)
    }
}

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser};

use assembler::{assemble, disassemble};
use console::StdConsole;
use engine::log::{self, Level};
use engine::{Machine, MachineConfig, VmStatus, stack, tape};
use engine::{info, warn};

const EXIT_HALTED: i32 = 0;
const EXIT_USAGE: i32 = 1;
const EXIT_FAULT: i32 = 2;
const EXIT_BUDGET: i32 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "tapevm",
    version,
    about = "Run a tape machine program from assembly source or a raw image",
    long_about = "Runs PROGRAM on a byte-addressed tape machine wired to stdin/stdout.\n\
Files ending in .asm are assembled first; anything else is loaded as a raw image at address 0.\n\
Exit status: 0 halted, 1 usage or assembly error, 2 fault, 3 step budget exhausted.\n\
The log threshold can also be set with TAPEVM_LOG=debug|info|warn|error."
)]
struct Cli {
    #[arg(value_name = "PROGRAM")]
    program: PathBuf,
    #[arg(
        long = "tape",
        value_name = "BYTES",
        default_value_t = tape::DEFAULT_CAPACITY,
        long_help = "Tape capacity in bytes. The image must fit."
    )]
    tape: usize,
    #[arg(
        long = "max-stack",
        value_name = "N",
        default_value_t = stack::DEFAULT_MAX_DEPTH,
        long_help = "Operand stack depth at which PUSH faults."
    )]
    max_stack: usize,
    #[arg(
        long = "max-steps",
        value_name = "N",
        long_help = "Stop after N instructions. Unlimited when omitted."
    )]
    max_steps: Option<u64>,
    #[arg(
        long = "dump-state",
        action = ArgAction::SetTrue,
        long_help = "Print the final machine state as JSON on stderr."
    )]
    dump_state: bool,
    #[arg(
        long = "disasm",
        action = ArgAction::SetTrue,
        long_help = "Print a listing of the image instead of running it."
    )]
    disasm: bool,
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, conflicts_with = "trace")]
    verbose: bool,
    #[arg(
        long = "trace",
        action = ArgAction::SetTrue,
        long_help = "Log every executed instruction to stderr."
    )]
    trace: bool,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version also land here, on stdout
            let code = if err.use_stderr() { EXIT_USAGE } else { EXIT_HALTED };
            let _ = err.print();
            process::exit(code);
        }
    };

    log::init_from_env("TAPEVM_LOG");
    if cli.trace {
        log::set_level(Level::Debug);
    } else if cli.verbose {
        log::set_level(Level::Info);
    }

    process::exit(run(&cli));
}

fn run(cli: &Cli) -> i32 {
    let image = match load_image(&cli.program) {
        Ok(image) => image,
        Err(message) => {
            eprintln!("tapevm: {}", message);
            return EXIT_USAGE;
        }
    };

    if cli.disasm {
        for line in disassemble(&image, 0..image.len()) {
            println!("{}", line);
        }
        return EXIT_HALTED;
    }

    let config = MachineConfig::default()
        .with_tape_capacity(cli.tape)
        .with_max_stack_depth(cli.max_stack);
    let mut vm = Machine::new(&config);
    if let Err(err) = vm.load(&image) {
        eprintln!("tapevm: {}: {}", cli.program.display(), err);
        return EXIT_USAGE;
    }

    let mut console = StdConsole::new();
    let mut fuel = cli.max_steps.unwrap_or(u64::MAX);
    while fuel > 0 && vm.step(&mut console) == &VmStatus::Running {
        fuel -= 1;
    }

    let code = match vm.status() {
        VmStatus::Halted => EXIT_HALTED,
        VmStatus::Faulted(err) => {
            eprintln!("tapevm: fault at address {}: {}", vm.ip(), err);
            EXIT_FAULT
        }
        VmStatus::Running => {
            warn!("step budget of {} exhausted at address {}", vm.steps(), vm.ip());
            EXIT_BUDGET
        }
    };

    if cli.dump_state {
        match serde_json::to_string_pretty(&vm.snapshot()) {
            Ok(json) => eprintln!("{}", json),
            Err(err) => eprintln!("tapevm: cannot encode state: {}", err),
        }
    }
    code
}

fn load_image(path: &Path) -> Result<Vec<u8>, String> {
    let is_source = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("asm"));

    if is_source {
        let source = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
        let image = assemble(&source).map_err(|e| format!("{}: {}", path.display(), e))?;
        info!("assembled {} into {} bytes", path.display(), image.len());
        Ok(image)
    } else {
        fs::read(path).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

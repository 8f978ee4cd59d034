use console::StdConsole;
use engine::VmStatus;
use tapevm::demo;

fn main() {
    engine::log::init_from_env("TAPEVM_LOG");

    let image = match demo::countdown_program(5) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("demo: {}", err);
            std::process::exit(1);
        }
    };

    let mut console = StdConsole::new();
    match demo::run_with_fuel(&image, &mut console, 10_000) {
        Ok(VmStatus::Halted) => {}
        Ok(status) => {
            eprintln!("demo: stopped while {}", status.name());
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("demo: {}", err);
            std::process::exit(2);
        }
    }
}

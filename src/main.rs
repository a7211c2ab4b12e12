use std::env;
use std::fs;
use std::process;

use microphp::{compile_source, Vm};

fn print_usage(program: &str) {
    eprintln!("micro-PHP VM v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} <file.mbc>           Run a compiled bytecode module", program);
    eprintln!("  {} <file.php>           Compile and run a source file", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -h, --help              Show this help message");
}

fn run_bytecode(bytes: &[u8]) -> Result<(), String> {
    let mut vm = Vm::new(std::io::stdout());
    vm.load_bytecode(bytes).map_err(|e| e.to_string())?;
    vm.run().map_err(|e| e.to_string())?;
    Ok(())
}

fn run_source(source: &str) -> Result<(), String> {
    let module = compile_source(source)?;
    run_bytecode(&module.to_bytes())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "-h" | "--help" => {
            print_usage(&args[0]);
            Ok(())
        }
        filename => {
            if filename.ends_with(".mbc") {
                match fs::read(filename) {
                    Ok(bytes) => run_bytecode(&bytes),
                    Err(e) => Err(format!("Cannot read '{}': {}", filename, e)),
                }
            } else {
                match fs::read_to_string(filename) {
                    Ok(source) => run_source(&source),
                    Err(e) => Err(format!("Cannot read '{}': {}", filename, e)),
                }
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

use std::env;
use std::fs;
use std::process;

use microphp::compiler::Compiler;
use microphp::lexer::Lexer;
use microphp::parser::Parser;

fn print_usage(program: &str) {
    println!("micro-PHP Compiler (microphpc) v{}", env!("CARGO_PKG_VERSION"));
    println!("Usage: {} [options] <input_file> -o <output_file>", program);
    println!();
    println!("Options:");
    println!("  -o <file>     Output bytecode file (required)");
    println!("  -v            Verbose output");
    println!("  -h, --help    Show this help message");
    println!();
    println!("Examples:");
    println!("  {} script.php -o script.mbc", program);
    println!("  {} -v main.php -o main.mbc", program);
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut input_file: Option<&str> = None;
    let mut output_file: Option<&str> = None;
    let mut verbose = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage(&args[0]);
                return;
            }
            "-v" => verbose = true,
            "-o" => {
                i += 1;
                match args.get(i) {
                    Some(path) => output_file = Some(path.as_str()),
                    None => {
                        eprintln!("Error: Missing output file after -o");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", arg);
                print_usage(&args[0]);
                process::exit(1);
            }
            arg => {
                if input_file.is_some() {
                    eprintln!("Error: Multiple input files specified");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                input_file = Some(arg);
            }
        }
        i += 1;
    }

    let input_file = match input_file {
        Some(path) => path,
        None => {
            eprintln!("Error: No input file specified");
            print_usage(&args[0]);
            process::exit(1);
        }
    };
    let output_file = match output_file {
        Some(path) => path,
        None => {
            eprintln!("Error: No output file specified (-o)");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    if verbose {
        println!("micro-PHP Compiler v{}", env!("CARGO_PKG_VERSION"));
        println!("Input file: {}", input_file);
        println!("Output file: {}", output_file);
        println!();
    }

    let source = match fs::read_to_string(input_file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Cannot open input file '{}': {}", input_file, e);
            process::exit(1);
        }
    };

    if verbose {
        println!("Source file size: {} bytes", source.len());
        println!();
        println!("Compiling...");
        println!("Phase 1: Lexical analysis...");
    }

    let tokens = match Lexer::new(&source).tokenize() {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("Error: Lexical analysis failed: {}", e);
            process::exit(1);
        }
    };

    if verbose {
        println!("  Generated {} tokens", tokens.len());
        println!("Phase 2: Parsing...");
    }

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Error: Parsing failed: {}", e);
            process::exit(1);
        }
    };

    if verbose {
        println!("  AST created successfully");
        println!("Phase 3: Code generation...");
    }

    let module = match Compiler::new().compile_program(&program) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Error: Code generation failed: {}", e);
            process::exit(1);
        }
    };

    let bytecode = module.to_bytes();

    if verbose {
        println!(
            "  Generated {} bytes of bytecode ({} constants, {} functions)",
            bytecode.len(),
            module.constants.len(),
            module.functions.len()
        );
        println!("Phase 4: Writing output...");
    }

    if let Err(e) = fs::write(output_file, &bytecode) {
        eprintln!("Error: Cannot write output file '{}': {}", output_file, e);
        process::exit(1);
    }

    if verbose {
        println!("  Output written successfully");
        println!();
        println!("Compilation completed successfully!");
        println!("Output: {} ({} bytes)", output_file, bytecode.len());
    }
}

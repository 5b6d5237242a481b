//! Assembly to program image CLI.
//!
//! Reads LS-8 assembly and writes a program image the emulator can load.
//!
//! # Usage
//! ```text
//! ls8asm <input.asm> [OPTIONS]
//! ```
//!
//! # Options
//! - `-o, --output <file>`: Output file path (defaults to `<input>.ls8`)

use ls8::virtual_machine::assembler::{assemble_source, render_image};
use ls8::{error, info};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--output" | "-o") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                output_path = Some(args[i].clone());
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let source = match fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let output_path = output_path.unwrap_or_else(|| {
        Path::new(input_path)
            .with_extension("ls8")
            .to_string_lossy()
            .into_owned()
    });

    let bytes = match assemble_source(&source) {
        Ok(b) => b,
        Err(e) => {
            error!("{input_path}: {e}");
            process::exit(1);
        }
    };

    let mut image = format!("# assembled from {input_path}\n");
    image.push_str(&render_image(&bytes));
    if let Err(e) = fs::write(&output_path, image) {
        error!("Failed to write output file: {}", e);
        process::exit(1);
    }

    info!(
        "Assembled {} -> {} ({} bytes)",
        input_path,
        output_path,
        bytes.len()
    );
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <input.asm> [OPTIONS]\n\n\
         Options:\n  \
         -o, --output <file>   Output file (defaults to <input>.ls8)\n  \
         -h, --help            Show this message",
        program
    );
}

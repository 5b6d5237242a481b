//! LS-8 emulator.
//!
//! Loads a program image and runs it until `HLT`.
//!
//! # Usage
//! ```text
//! ls8 <program.ls8> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program.ls8`: Program image, one binary literal per line
//!
//! # Options
//! - `--trace`: Log PC, the bytes at PC and all registers before each instruction
//! - `--max-steps <n>`: Abort programs that run more than `n` instructions
//!
//! Trace mode can also be turned on with the `LS8_TRACE` environment variable.

use ls8::utils::log;
use ls8::virtual_machine::loader::load_file;
use ls8::virtual_machine::vm::{RunConfig, VM, trace_line};
use ls8::{error, info, trace, warn};
use std::env;
use std::io::{self, Write};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let program_path = &args[1];
    let mut config = RunConfig {
        trace: trace_from_env(),
        ..RunConfig::default()
    };

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--trace" => {
                config.trace = true;
                i += 1;
            }
            "--max-steps" => {
                i += 1;
                if i >= args.len() {
                    error!("--max-steps requires an argument");
                    process::exit(1);
                }
                config.step_limit = match args[i].parse::<u64>() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        error!("Invalid step limit: '{}' is not a positive number", args[i]);
                        process::exit(1);
                    }
                };
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    log::set_verbose(config.trace);

    let image = match load_file(program_path) {
        Ok(image) => image,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };
    if !image.skipped.is_empty() {
        warn!(
            "{}: skipped {} malformed line(s)",
            program_path,
            image.skipped.len()
        );
    }

    let state = match image.into_machine() {
        Ok(state) => state,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let mut vm = VM::with_config(state, config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = vm.run(&mut out);
    let _ = out.flush();

    match result {
        Ok(summary) => trace!("halted after {} instructions", summary.steps),
        Err(e) => {
            error!("{e}");
            info!("{}", trace_line(vm.state()));
            process::exit(1);
        }
    }
}

/// `LS8_TRACE` set to anything but empty or `0`.
fn trace_from_env() -> bool {
    env::var("LS8_TRACE").is_ok_and(|v| !v.is_empty() && v != "0")
}

fn print_usage(program: &str) {
    eprintln!(
        "Usage: {} <program.ls8> [OPTIONS]\n\n\
         Options:\n  \
         --trace            Log machine state before each instruction\n  \
         --max-steps <n>    Stop programs that run more than n instructions\n  \
         -h, --help         Show this message\n\n\
         Environment:\n  \
         LS8_TRACE=1        Same as --trace",
        program
    );
}

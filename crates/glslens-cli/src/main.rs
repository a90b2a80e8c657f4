//! `glslens` reads a shader description from standard input and prints its
//! uniforms.
//!
//! Input protocol:
//!
//! ```text
//! 450            <- GLSL version used when the source has no #version
//! 4              <- stage (glslang enum value or identifier such as `frag`)
//! #version 450   <- everything after the second line is shader source
//! ...
//! ```
//!
//! Failures are reported as `Error: <message>` on stderr with exit status 1.

mod cli;
mod config;
mod input;
mod paths;
mod run;

use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = cli::parse();
    run::initialise_tracing();

    match run::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

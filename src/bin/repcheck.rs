//! Check rep files: parse each input and report the first error, if any.
//!
//! Usage:
//!   repcheck [OPTIONS] [FILE.rep ...]
//!   repcheck < file.rep
//!
//! Options:
//!   --dump, -d   Print the canonical form of every file that parses
//!   --human, -H  Human-readable output
//!
//! If no files are given, reads from stdin. Exit code 1 if any input fails.

use repidl::dump::to_source;
use repidl::{parse, ParseError};
use std::io::{self, Read};
use std::path::Path;

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

fn print_error(path: &str, e: &ParseError, style: OutputStyle) {
    match style {
        OutputStyle::Compact => {
            println!(
                "{}:{}:{}: error: {} [{}]",
                path, e.line, e.column, e.message, e.kind
            );
        }
        OutputStyle::Human => {
            println!("  {} {}:{}: {}", path, e.line, e.column, e.message);
            println!("    kind: {}", e.kind);
        }
    }
}

/// Parse one source; returns false if it failed.
fn check(path: &str, src: &str, style: OutputStyle, dump: bool) -> bool {
    match parse(src) {
        Ok(ast) => {
            if dump {
                print!("{}", to_source(&ast));
            }
            true
        }
        Err(e) => {
            print_error(path, &e, style);
            false
        }
    }
}

fn take_flag(args: &mut Vec<String>, long: &str, short: &str) -> bool {
    if let Some(pos) = args.iter().position(|a| a == long || a == short) {
        args.remove(pos);
        true
    } else {
        false
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let dump = take_flag(&mut args, "--dump", "-d");
    let style = if take_flag(&mut args, "--human", "-H") {
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };

    let mut total = 0usize;
    let mut failed = 0usize;

    if args.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        total += 1;
        if !check("<stdin>", &src, style, dump) {
            failed += 1;
        }
    } else {
        for path in &args {
            let path = Path::new(path);
            total += 1;
            let src = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    failed += 1;
                    continue;
                }
            };
            if !check(&path.display().to_string(), &src, style, dump) {
                failed += 1;
            }
        }
    }

    if failed > 0 {
        eprintln!("repcheck: {} of {} input(s) failed", failed, total);
        std::process::exit(1);
    }
    Ok(())
}

//! Parser fuzz target: feed arbitrary bytes to the rep parser.
//! The parser must not panic; it returns Ok(Ast) or Err(ParseError).
//! Any document that parses must survive a canonical dump and reparse unchanged.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(ast) = repidl::parse(s) {
        let again = repidl::parse(&repidl::dump::to_source(&ast));
        assert_eq!(again.as_ref(), Ok(&ast));
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}

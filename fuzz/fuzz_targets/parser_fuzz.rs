//! Message parser fuzz target: feed arbitrary bytes to `parse`. The
//! parser must not panic; it returns `Ok(Message)` or `Err(ParseError)`.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let _ = iso8583_codec::parse(data, iso8583_codec::Version::V1987, None);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}

//! Stack dumps for debuggers and the `DEBUG` opcode.

use std::fmt::Write as _;

use crate::state::CpuState;

/// Text emitted for an empty data stack.
pub const EMPTY_STACK: &str = "<stack empty>";
/// Text emitted when `dp` has dropped below `bottom_dp`.
pub const UNDERFLOWED_STACK: &str = "<stack underflow>";

/// Renders the data stack bottom first, one `addr:\t0xword` line per entry.
///
/// Addresses are printed in decimal and words in hex.
#[must_use]
pub fn format_stack(cpu: &CpuState) -> String {
    match cpu.data_stack_entries() {
        Ok(entries) if entries.is_empty() => EMPTY_STACK.to_owned(),
        Ok(entries) => render(entries),
        Err(_) => UNDERFLOWED_STACK.to_owned(),
    }
}

/// Renders the call stack oldest first, in the same format.
#[must_use]
pub fn format_return_stack(cpu: &CpuState) -> String {
    let words = match cpu.return_stack() {
        Ok(words) if words.is_empty() => return EMPTY_STACK.to_owned(),
        Ok(words) => words,
        Err(_) => return UNDERFLOWED_STACK.to_owned(),
    };

    let top_sp = cpu.regs.top_sp();
    let entries = words
        .into_iter()
        .zip(1u32..)
        .map(|(word, n)| (top_sp.wrapping_sub(n * 3), word));
    render(entries)
}

fn render(entries: impl IntoIterator<Item = (u32, u32)>) -> String {
    let mut out = String::new();
    for (addr, word) in entries {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "{addr}:\t{word:#x}");
    }
    out
}

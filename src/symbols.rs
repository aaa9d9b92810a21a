//! Naming and address conventions shared by the generated assembly.

/// First word of the data stack.
pub const STACK_BASE: u16 = 256;
/// `temp 0` lives in `R5`; the segment is eight words wide.
pub const TEMP_BASE: u16 = 5;
pub const TEMP_SIZE: u16 = 8;
/// Largest value an A-instruction can load.
pub const MAX_CONSTANT: u16 = 0x7FFF;
/// Saved words in a frame: return address plus LCL, ARG, THIS, THAT.
pub const FRAME_WORDS: u16 = 5;

/// Scratch cell holding a computed pop address, and FRAME during `return`.
pub const SCRATCH_ADDR: &str = "R13";
/// Scratch cell holding RET during `return`.
pub const SCRATCH_RET: &str = "R14";

/// Function the bootstrap calls when no other entry point is configured.
pub const DEFAULT_ENTRY_POINT: &str = "Sys.init";

/// Saved segment pointers, in the order `call` pushes them.
pub const SAVED_POINTERS: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];

pub fn static_symbol(unit: &str, index: u16) -> String {
    format!("{}.{}", unit, index)
}

pub fn temp_symbol(index: u16) -> String {
    format!("R{}", TEMP_BASE + index)
}

/// Pointer segment cells: index 0 is THIS, index 1 is THAT.
pub fn pointer_symbol(index: u16) -> Option<&'static str> {
    match index {
        0 => Some("THIS"),
        1 => Some("THAT"),
        _ => None,
    }
}

/// User labels are namespaced by the function that declares them.
pub fn scoped_label(function: &str, label: &str) -> String {
    format!("{}${}", function, label)
}

pub fn return_label(callee: &str, call_site: usize) -> String {
    format!("{}$ret.{}", callee, call_site)
}

/// The (true, end) label pair for one comparison.
pub fn comparison_labels(id: usize) -> (String, String) {
    (format!("CMP$TRUE.{}", id), format!("CMP$END.{}", id))
}

fn counter(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit())
}

/// True when `symbol` has the shape of a return or comparison label, so a
/// user declaration of it could clash with generated code.
pub fn is_generated(symbol: &str) -> bool {
    let is_return = symbol
        .rsplit_once("$ret.")
        .map_or(false, |(_, site)| counter(site));
    let is_comparison = ["CMP$TRUE.", "CMP$END."]
        .iter()
        .filter_map(|prefix| symbol.strip_prefix(*prefix))
        .any(counter);
    is_return || is_comparison
}

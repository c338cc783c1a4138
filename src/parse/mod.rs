/// Variational parameters definition file.
/// # Format
/// Csv with a header line and two columns: a 1-based parameter identifier and
/// its value. Identifiers must cover $1..n$ exactly once, in any order.
pub mod vparams;

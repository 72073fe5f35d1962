//! Crown procedure detection.
//!
//! Slips are only produced for crown restorations. Detection is an exact
//! match against a fixed CDT vocabulary after uppercasing, never fuzzy.

use crate::models::ProcedureData;

/// CDT codes that count as crown work.
pub const CROWN_CODES: [&str; 8] = [
    "D2740", // Crown - porcelain/ceramic
    "D2750", // Crown - porcelain fused to high noble metal
    "D2751", // Crown - porcelain fused to predominantly base metal
    "D2752", // Crown - porcelain fused to noble metal
    "D2780", // Crown - 3/4 cast high noble metal
    "D2781", // Crown - 3/4 cast predominantly base metal
    "D2782", // Crown - 3/4 cast noble metal
    "D2783", // Crown - 3/4 porcelain/ceramic
];

/// Check a CDT code against the crown vocabulary.
///
/// Comparison is case-insensitive; anything outside the fixed set,
/// including the empty string, is not a crown.
pub fn is_crown_code(code: &str) -> bool {
    let upper = code.to_uppercase();
    CROWN_CODES.contains(&upper.as_str())
}

/// Filter submissions down to crown procedures.
///
/// Pure and order-preserving: matching records come back cloned in their
/// original order, inputs untouched.
pub fn detect_crown_procedures(procedures: &[ProcedureData]) -> Vec<ProcedureData> {
    procedures.iter().filter(|p| p.is_crown()).cloned().collect()
}

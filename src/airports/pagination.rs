//! Legacy starting-page offsets.
//!
//! The upstream API pages backwards from "now"; busier airports need to
//! start further back to cover the whole day. Offsets depend on the airport's
//! position in its region list.

/// Starting page for the airport at `index` (zero-based) in `region`'s list.
///
/// Unknown regions start at -1.
///
/// ```
/// use flight_ingest::airports::page_for_index;
///
/// assert_eq!(page_for_index("jp", 0), -14);
/// assert_eq!(page_for_index("ZZ", 0), -1);
/// ```
pub fn page_for_index(region: &str, index: usize) -> i32 {
    match region.trim().to_ascii_uppercase().as_str() {
        "US" => match index {
            0..=10 => -15,
            11..=24 => -9,
            25..=60 => -4,
            _ => -2,
        },
        "JP" => match index {
            0..=3 => -14,
            4..=5 => -9,
            _ => -4,
        },
        "CN" => match index {
            0..=10 => -15,
            11..=20 => -9,
            21..=40 => -4,
            _ => -3,
        },
        "CA" => match index {
            0..=3 => -14,
            4..=7 => -5,
            _ => -2,
        },
        "EA" => match index {
            0..=5 => -9,
            _ => -5,
        },
        "TW" => match index {
            0..=1 => -9,
            _ => -2,
        },
        _ => -1,
    }
}

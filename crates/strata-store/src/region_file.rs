//! Region keys and the fixed-width region file naming scheme.
//!
//! A region file is named `R<±XXXXXXXXXX><±ZZZZZZZZZZ>.dat`: each component
//! is an explicit sign followed by the magnitude zero-padded to the decimal
//! width of the maximum 32-bit magnitude. One strict shape both generates
//! and recognizes region files; anything else in a model directory is
//! ignored.

use std::fmt;

use strata_model::REGION_LEN_BLOCKS;

// Region indices reachable from an i32 block coordinate. Both divisions are
// exact floors here (i32::MIN divides evenly, i32::MAX truncates downward),
// matching region_index at the extremes.
const MIN_REGION_INDEX: i32 = i32::MIN / REGION_LEN_BLOCKS;
const MAX_REGION_INDEX: i32 = i32::MAX / REGION_LEN_BLOCKS;

/// Identifies one region: the pair of region indices derived from global
/// block coordinates. Used as the cache key and embedded in the file name.
///
/// The derived ordering (x first, then z) is the order full-model
/// iteration visits regions in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionKey {
    pub x: i32,
    pub z: i32,
}

impl RegionKey {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Decimal digits in the largest 32-bit magnitude (2_147_483_648).
const MAGNITUDE_DIGITS: usize = 10;

const PREFIX: &str = "R";
const SUFFIX: &str = ".dat";

/// Total length of a well-formed region file name.
const FILE_NAME_LEN: usize = PREFIX.len() + 2 * (1 + MAGNITUDE_DIGITS) + SUFFIX.len();

fn push_fixed_width(out: &mut String, value: i32) {
    out.push(if value < 0 { '-' } else { '+' });
    let magnitude = value.unsigned_abs().to_string();
    for _ in magnitude.len()..MAGNITUDE_DIGITS {
        out.push('0');
    }
    out.push_str(&magnitude);
}

/// File name for a region key, e.g. (-3, 42) → `R-0000000003+0000000042.dat`.
pub fn region_file_name(key: RegionKey) -> String {
    let mut name = String::with_capacity(FILE_NAME_LEN);
    name.push_str(PREFIX);
    push_fixed_width(&mut name, key.x);
    push_fixed_width(&mut name, key.z);
    name.push_str(SUFFIX);
    name
}

fn parse_fixed_width(component: &str) -> Option<i32> {
    let (sign, digits) = component.split_at(1);
    if digits.len() != MAGNITUDE_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    let value = match sign {
        "+" => magnitude,
        "-" => -magnitude,
        _ => return None,
    };
    let value = i32::try_from(value).ok()?;
    (MIN_REGION_INDEX..=MAX_REGION_INDEX)
        .contains(&value)
        .then_some(value)
}

/// Parses a directory entry name back into a region key.
///
/// Strict: accepts exactly the shape [`region_file_name`] produces, with
/// both indices inside the region range addressable by `i32` block
/// coordinates, and returns `None` for everything else. A well-formed name
/// beyond that range names a region no block position can map to, so it is
/// treated as foreign.
pub fn parse_region_file_name(name: &str) -> Option<RegionKey> {
    if name.len() != FILE_NAME_LEN || !name.is_ascii() {
        return None;
    }
    let body = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    let (x_part, z_part) = body.split_at(1 + MAGNITUDE_DIGITS);
    Some(RegionKey::new(
        parse_fixed_width(x_part)?,
        parse_fixed_width(z_part)?,
    ))
}

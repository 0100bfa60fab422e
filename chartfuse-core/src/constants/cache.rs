//! Delta Cache Constants

/// Side length of the downsampled luma grid used for the fingerprint.
///
/// 8 × 8 cells produce a 64-bit average hash.
pub const FINGERPRINT_SIDE: usize = 8;

/// Default maximum Hamming distance for a frame to count as unchanged.
///
/// More than 5 differing bits out of 64 is a material change.
pub const DEFAULT_CHANGE_THRESHOLD_BITS: u32 = 5;

/// Largest meaningful change threshold (every bit may differ).
pub const MAX_CHANGE_THRESHOLD_BITS: u32 = 64;

// ===== BT.601 INTEGER LUMA =====

/// Red weight of the integer luma approximation (sums to 256).
pub const LUMA_RED_WEIGHT: u32 = 77;

/// Green weight of the integer luma approximation.
pub const LUMA_GREEN_WEIGHT: u32 = 150;

/// Blue weight of the integer luma approximation.
pub const LUMA_BLUE_WEIGHT: u32 = 29;

//! # radeon_surface
//! radeon_surface computes the physical memory layout of texture surfaces for
//! AMD GCN GPUs: per mip level byte offsets, row pitches, total size,
//! alignment, the selected tiling mode, and the sizes of the auxiliary
//! compression metadata buffers (DCC, HTILE, CMASK, FMASK).
//!
//! Two structurally different hardware eras are supported.
//! GFX6-GFX8 chips select tiling from a fixed register table of bank and pipe
//! configurations and compute each mip level separately.
//! GFX9 and newer chips pick a computed "swizzle mode" and lay out the entire
//! mip chain in a single query.
//!
//! The bit-exact tile and swizzle address math itself lives in the vendor
//! address library and is consumed here through the [AddressService] trait.
//! This crate encodes everything above that seam: tiling mode selection,
//! per level geometry, compression eligibility rules, mip tail handling, and
//! the degenerate case fallbacks that must match the hardware's address
//! generation logic exactly.
//!
//! # Getting Started
//! Describe the surface with a [SurfaceConfig], pick the device's
//! [HardwareProfile], and call [compute_surface] with an [AddressService]
//! implementation backed by the address library for that chip.
/*!
```rust
use radeon_surface::{SurfaceConfig, SurfaceFlags};

let config = SurfaceConfig {
    width: 1024,
    height: 1024,
    bytes_per_element: 4,
    num_channels: 4,
    levels: 1,
    flags: SurfaceFlags::COLOR,
    ..SurfaceConfig::default()
};
assert!(config.validate().is_ok());
```
*/
//! The resulting [SurfaceLayout] is immutable and safe to cache keyed by the
//! config and profile. Computation is pure except for the optional
//! [SwizzleCounters], two process wide atomic counters that seed the per
//! surface address swizzle.
mod addr;
mod config;
mod hardware;
mod layout;
mod legacy;
mod modern;
mod surface;

#[cfg(test)]
mod testutil;

pub use addr::*;
pub use config::*;
pub use hardware::*;
pub use layout::*;
pub use surface::*;

use thiserror::Error;

/// Errors that can occur while computing a surface layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface config failed validation. Caller fixable.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The address library rejected a request. Fatal for this computation,
    /// no partial layout is returned.
    #[error(transparent)]
    AddressService(#[from] AddrError),

    /// The requested combination is not supported by the driver.
    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),

    /// Allocation of the DCC retile map failed. The caller can retry
    /// without the displayable DCC optimization.
    #[error("out of memory while building the DCC retile map")]
    OutOfMemory,
}

/// Calculates the division of `x` by `d` but rounds up rather than truncating.
/// # Examples
/**
```rust
# use radeon_surface::div_round_up;
assert_eq!(2, div_round_up(8, 4));
assert_eq!(3, div_round_up(10, 4));
```
 */
#[inline]
pub const fn div_round_up(x: u64, d: u64) -> u64 {
    (x + d - 1) / d
}

/// Rounds `x` up to the next multiple of `n`. `n` must be nonzero.
/// # Examples
/**
```rust
# use radeon_surface::align_up;
assert_eq!(256, align_up(1, 256));
assert_eq!(512, align_up(257, 256));
assert_eq!(0, align_up(0, 65536));
```
 */
#[inline]
pub const fn align_up(x: u64, n: u64) -> u64 {
    ((x + n - 1) / n) * n
}

/// Halves `x` once per mip level, flooring at 1.
#[inline]
pub(crate) const fn minify(x: u32, level: u32) -> u32 {
    let v = x >> level;
    if v == 0 {
        1
    } else {
        v
    }
}

//! Surface configs and their validation.
//!
//! A [SurfaceConfig] is the immutable logical description of an image:
//! dimensions, mip levels, sample counts, pixel block shape, and usage flags.
//! [SurfaceConfig::validate] rejects malformed configs before any layout math
//! runs, so the planners can assume a well formed request.
use bitflags::bitflags;
use thiserror::Error;

use crate::addr::MacroTileParams;
use crate::addr::SwizzleMode;

bitflags! {
    /// Usage flags describing how a surface will be accessed.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SurfaceFlags: u32 {
        /// Render target or sampled color surface.
        const COLOR = 1 << 0;
        /// Depth buffer.
        const ZBUFFER = 1 << 1;
        /// Stencil buffer. Usually combined with [Self::ZBUFFER].
        const SBUFFER = 1 << 2;
        /// The surface may be scanned out by the display engine.
        const SCANOUT = 1 << 3;
        /// Never allocate DCC for this surface.
        const DISABLE_DCC = 1 << 4;
        /// Request HTILE that the texture units can read directly.
        const TC_COMPATIBLE_HTILE = 1 << 5;
        /// The surface is shared across processes. Shared surfaces must have
        /// deterministic addressing, so tile swizzle is skipped.
        const SHAREABLE = 1 << 6;
        /// Prefer a smaller layout over faster rendering.
        const OPTIMIZE_FOR_SPACE = 1 << 7;
        /// The surface is sampled but never rendered to.
        const NO_RENDER_TARGET = 1 << 8;
    }
}

impl SurfaceFlags {
    /// True if the surface holds depth, stencil, or both.
    pub fn z_or_sbuffer(self) -> bool {
        self.intersects(Self::ZBUFFER | Self::SBUFFER)
    }
}

/// A logical image description. Input to [crate::compute_surface].
///
/// Dimensions are in pixels, not format blocks. For block compressed formats
/// set `block_width`/`block_height` to the pixel block shape (4x4 for BCn)
/// and `bytes_per_element` to the size of one block.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub array_size: u32,
    /// Number of mip levels, including the base level.
    pub levels: u32,
    pub samples: u32,
    /// Color sample storage count. Can be lower than `samples` when the
    /// hardware stores fewer color fragments than coverage samples.
    pub storage_samples: u32,
    /// Channels in the pixel format, used for display eligibility.
    pub num_channels: u32,
    /// Pixel block width. 1 for uncompressed formats.
    pub block_width: u32,
    /// Pixel block height. 1 for uncompressed formats.
    pub block_height: u32,
    /// Bytes per element, where an element is one pixel block.
    pub bytes_per_element: u32,
    pub is_1d: bool,
    pub is_3d: bool,
    pub is_cube: bool,
    pub flags: SurfaceFlags,
    /// Macrotile parameters carried over from an imported GFX6-GFX8 surface.
    /// When set, the planner feeds them back into the address library instead
    /// of letting it pick new ones.
    pub preferred_macro_tile: Option<MacroTileParams>,
    /// Swizzle mode carried over from an imported GFX9+ surface.
    pub forced_swizzle_mode: Option<SwizzleMode>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 1,
            height: 1,
            depth: 1,
            array_size: 1,
            levels: 1,
            samples: 1,
            storage_samples: 1,
            num_channels: 1,
            block_width: 1,
            block_height: 1,
            bytes_per_element: 1,
            is_1d: false,
            is_3d: false,
            is_cube: false,
            flags: SurfaceFlags::empty(),
            preferred_macro_tile: None,
            forced_swizzle_mode: None,
        }
    }
}

/// Errors returned by [SurfaceConfig::validate].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Dimensions, array size, level count, and element size must all be at
    /// least 1.
    #[error("surface dimensions, counts, and element size must all be at least 1")]
    InvalidDimension,
    /// The sample count is not supported for this surface kind.
    #[error("unsupported sample count {0}")]
    InvalidSampleCount(u32),
    /// The storage sample count is not supported for color surfaces.
    #[error("unsupported storage sample count {0}")]
    InvalidStorageSampleCount(u32),
    /// 3D surfaces can't be arrayed and cube surfaces can't have depth.
    #[error("conflicting surface shape")]
    ConflictingShape,
}

impl SurfaceConfig {
    /// Checks the config against the constraints shared by all generations.
    ///
    /// This is a pure function with no side effects. It runs before any
    /// address library call, so a malformed config never reaches the
    /// layout math.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0
            || self.height == 0
            || self.depth == 0
            || self.array_size == 0
            || self.levels == 0
            || self.block_width == 0
            || self.block_height == 0
            || self.bytes_per_element == 0
        {
            return Err(ConfigError::InvalidDimension);
        }

        match self.samples {
            1 | 2 | 4 | 8 => {}
            // The depth path can't multisample at 16x.
            16 if !self.flags.z_or_sbuffer() => {}
            other => return Err(ConfigError::InvalidSampleCount(other)),
        }

        if !self.flags.z_or_sbuffer() {
            match self.storage_samples {
                1 | 2 | 4 | 8 => {}
                other => return Err(ConfigError::InvalidStorageSampleCount(other)),
            }
        }

        if self.is_3d && self.array_size > 1 {
            return Err(ConfigError::ConflictingShape);
        }
        if self.is_cube && self.depth > 1 {
            return Err(ConfigError::ConflictingShape);
        }

        Ok(())
    }

    /// True for block compressed formats like BCn.
    pub(crate) fn is_block_compressed(&self) -> bool {
        self.block_width == 4 && self.block_height == 4
    }

    /// Slice count for one mip level: depth extent for 3D, the six faces of
    /// a cube, or the array size.
    pub(crate) fn num_slices(&self, level: u32) -> u32 {
        if self.is_3d {
            crate::minify(self.depth, level)
        } else if self.is_cube {
            6
        } else {
            self.array_size
        }
    }

    /// Whether the display engine can scan this surface out directly.
    ///
    /// Subsampled formats and a short whitelist of bpe/channel combinations
    /// (RGBA8 and RGBA16F, R5G6B5 class, C8 palette) qualify.
    pub(crate) fn display_flag(&self) -> bool {
        if self.flags.z_or_sbuffer()
            || !self.flags.contains(SurfaceFlags::SCANOUT)
            || self.samples > 1
            || self.block_width > 2
            || self.block_height != 1
        {
            return false;
        }

        // Subsampled.
        if self.block_width == 2 {
            return true;
        }

        let bpe = self.bytes_per_element;
        (bpe >= 4 && bpe <= 8 && self.num_channels == 4)
            || (bpe == 2 && self.num_channels >= 3)
            || (bpe == 1 && self.num_channels == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_config() -> SurfaceConfig {
        SurfaceConfig {
            width: 64,
            height: 64,
            bytes_per_element: 4,
            num_channels: 4,
            flags: SurfaceFlags::COLOR,
            ..SurfaceConfig::default()
        }
    }

    #[test]
    fn validate_simple_2d() {
        assert_eq!(Ok(()), color_config().validate());
    }

    #[test]
    fn validate_zero_dimension() {
        for f in [
            |c: &mut SurfaceConfig| c.width = 0,
            |c: &mut SurfaceConfig| c.height = 0,
            |c: &mut SurfaceConfig| c.depth = 0,
            |c: &mut SurfaceConfig| c.array_size = 0,
            |c: &mut SurfaceConfig| c.levels = 0,
        ] {
            let mut config = color_config();
            f(&mut config);
            assert_eq!(Err(ConfigError::InvalidDimension), config.validate());
        }
    }

    #[test]
    fn validate_sample_counts() {
        for samples in [1, 2, 4, 8, 16] {
            let config = SurfaceConfig {
                samples,
                ..color_config()
            };
            assert_eq!(Ok(()), config.validate());
        }

        let config = SurfaceConfig {
            samples: 3,
            ..color_config()
        };
        assert_eq!(Err(ConfigError::InvalidSampleCount(3)), config.validate());
    }

    #[test]
    fn validate_16x_depth_fails() {
        let config = SurfaceConfig {
            samples: 16,
            flags: SurfaceFlags::ZBUFFER | SurfaceFlags::SBUFFER,
            ..color_config()
        };
        assert_eq!(Err(ConfigError::InvalidSampleCount(16)), config.validate());
    }

    #[test]
    fn validate_storage_samples_color_only() {
        let config = SurfaceConfig {
            storage_samples: 16,
            ..color_config()
        };
        assert_eq!(
            Err(ConfigError::InvalidStorageSampleCount(16)),
            config.validate()
        );

        // Storage samples are ignored for depth.
        let config = SurfaceConfig {
            storage_samples: 16,
            flags: SurfaceFlags::ZBUFFER,
            ..color_config()
        };
        assert_eq!(Ok(()), config.validate());
    }

    #[test]
    fn validate_conflicting_shapes() {
        let config = SurfaceConfig {
            is_3d: true,
            array_size: 6,
            ..color_config()
        };
        assert_eq!(Err(ConfigError::ConflictingShape), config.validate());

        let config = SurfaceConfig {
            is_cube: true,
            depth: 2,
            ..color_config()
        };
        assert_eq!(Err(ConfigError::ConflictingShape), config.validate());
    }

    #[test]
    fn validate_degenerate_single_level() {
        // The smallest valid request is never a shape conflict.
        let config = SurfaceConfig {
            width: 1,
            height: 1,
            ..color_config()
        };
        assert_eq!(Ok(()), config.validate());
    }

    #[test]
    fn display_flag_whitelist() {
        let scanout = SurfaceConfig {
            flags: SurfaceFlags::COLOR | SurfaceFlags::SCANOUT,
            ..color_config()
        };
        assert!(scanout.display_flag());

        // RGBA8 without scanout is not display eligible.
        assert!(!color_config().display_flag());

        // 64 bpe is not scannable.
        let wide = SurfaceConfig {
            bytes_per_element: 16,
            ..scanout.clone()
        };
        assert!(!wide.display_flag());

        // MSAA is not scannable.
        let msaa = SurfaceConfig {
            samples: 4,
            ..scanout
        };
        assert!(!msaa.display_flag());
    }

    #[test]
    fn slice_counts() {
        let cube = SurfaceConfig {
            is_cube: true,
            ..color_config()
        };
        assert_eq!(6, cube.num_slices(0));

        let volume = SurfaceConfig {
            is_3d: true,
            depth: 32,
            ..color_config()
        };
        assert_eq!(32, volume.num_slices(0));
        assert_eq!(8, volume.num_slices(2));
        assert_eq!(1, volume.num_slices(6));

        let array = SurfaceConfig {
            array_size: 10,
            ..color_config()
        };
        assert_eq!(10, array.num_slices(3));
    }
}

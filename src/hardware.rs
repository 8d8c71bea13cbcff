//! Per generation hardware parameters.
use crate::addr::MicroTileMode;

/// Number of entries in the GFX6-GFX8 tile mode register table.
pub const TILE_MODE_TABLE_LEN: usize = 32;

/// Hardware generation identifier.
///
/// GFX6 through GFX8 share the table driven tiling scheme, GFX9 and GFX10 the
/// computed swizzle modes. Generations are ordered, so feature gates can use
/// comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum Generation {
    Gfx6,
    Gfx7,
    Gfx8,
    Gfx9,
    Gfx10,
}

impl Generation {
    /// True for the GFX9+ era that computes swizzle modes instead of looking
    /// up tile configurations in a register table.
    pub fn uses_swizzle_modes(self) -> bool {
        self >= Generation::Gfx9
    }
}

/// Read only description of one GPU, constructed at device init time.
///
/// A profile is referenced by every surface computation but owned by the
/// device, never by a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareProfile {
    pub generation: Generation,
    /// False on compute only chips, which have no CB/DB and therefore no
    /// color or depth compression hardware.
    pub has_graphics: bool,
    /// Bytes of contiguous memory mapped to one pipe before interleaving.
    pub pipe_interleave_bytes: u32,
    /// Number of tiling pipes. Determines the CMASK cache line granularity
    /// on GFX6-GFX8.
    pub num_tile_pipes: u32,
    /// Number of render backends.
    pub num_render_backends: u32,
    /// Raw GB_TILE_MODE register values. Only meaningful on GFX6-GFX8.
    pub tile_mode_table: [u32; TILE_MODE_TABLE_LEN],
    /// Allow scanout of DCC compressed surfaces by dropping the pipe and RB
    /// alignment of the metadata (newer GFX9+ display engines).
    pub use_display_dcc_unaligned: bool,
    /// Allow scanout of DCC compressed surfaces by retiling the metadata
    /// into a second displayable buffer.
    pub use_display_dcc_with_retile_blit: bool,
}

impl HardwareProfile {
    /// Decodes the micro tile mode of one tile mode table entry.
    ///
    /// GFX6 stores the field in bits 0..2 of GB_TILE_MODE, GFX7 and newer
    /// moved it to bits 22..25.
    pub fn micro_tile_mode(&self, tiling_index: i32) -> Option<MicroTileMode> {
        let entry = *self.tile_mode_table.get(usize::try_from(tiling_index).ok()?)?;
        let raw = if self.generation >= Generation::Gfx7 {
            (entry >> 22) & 0x7
        } else {
            entry & 0x3
        };
        Some(MicroTileMode::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(generation: Generation) -> HardwareProfile {
        HardwareProfile {
            generation,
            has_graphics: true,
            pipe_interleave_bytes: 256,
            num_tile_pipes: 4,
            num_render_backends: 4,
            tile_mode_table: [0; TILE_MODE_TABLE_LEN],
            use_display_dcc_unaligned: false,
            use_display_dcc_with_retile_blit: false,
        }
    }

    #[test]
    fn micro_tile_mode_old_encoding() {
        let mut p = profile(Generation::Gfx6);
        p.tile_mode_table[5] = 0x2;
        assert_eq!(Some(MicroTileMode::Depth), p.micro_tile_mode(5));
        assert_eq!(Some(MicroTileMode::Display), p.micro_tile_mode(0));
    }

    #[test]
    fn micro_tile_mode_new_encoding() {
        let mut p = profile(Generation::Gfx8);
        p.tile_mode_table[14] = 1 << 22;
        p.tile_mode_table[10] = 0;
        p.tile_mode_table[7] = 3 << 22;
        assert_eq!(Some(MicroTileMode::Thin), p.micro_tile_mode(14));
        assert_eq!(Some(MicroTileMode::Display), p.micro_tile_mode(10));
        assert_eq!(Some(MicroTileMode::Rotated), p.micro_tile_mode(7));
    }

    #[test]
    fn micro_tile_mode_out_of_range() {
        let p = profile(Generation::Gfx8);
        assert_eq!(None, p.micro_tile_mode(-1));
        assert_eq!(None, p.micro_tile_mode(32));
    }

    #[test]
    fn generation_ordering() {
        assert!(Generation::Gfx7 >= Generation::Gfx7);
        assert!(Generation::Gfx9 > Generation::Gfx8);
        assert!(!Generation::Gfx8.uses_swizzle_modes());
        assert!(Generation::Gfx10.uses_swizzle_modes());
    }
}

//! Computed surface layouts.
//!
//! A [SurfaceLayout] is produced once per [crate::compute_surface] call and
//! never mutated afterwards. It owns one [LevelLayout] per mip level and
//! plane, plus up to four optional compression metadata records.
use crate::addr::{MicroTileMode, ResourceType, SwizzleMode, TileMode};

/// One mip level of one plane.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLayout {
    /// Byte offset from the surface base.
    pub offset: u64,
    /// Row pitch in elements.
    pub pitch: u32,
    /// Padded row count.
    pub rows: u32,
    pub slice_size: u64,
    /// The tile mode the address library chose for this level. Smaller
    /// levels can degrade from the surface's mode.
    pub mode: TileMode,
    /// GFX6-GFX8 tile mode table index.
    pub tile_index: i32,
}

/// Per level DCC bookkeeping (GFX6-GFX8 chain).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DccLevel {
    /// Offset inside the DCC buffer.
    pub offset: u64,
    /// Bytes to clear for a whole level fast clear. Zero when the level is
    /// compressible but not fast clearable.
    pub fast_clear_size: u64,
    /// Fast clear size of a single slice, for arrays.
    pub slice_fast_clear_size: u64,
}

/// Displayable DCC sub buffer with its retile map (GFX9+).
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayDcc {
    pub size: u64,
    pub alignment: u64,
    pub pitch_max: u32,
    /// Pairs of (aligned offset, display offset), one per compression block,
    /// consumed by the retile pass.
    pub retile_map: Vec<u32>,
    /// True when every entry fits in 16 bits.
    pub retile_use_uint16: bool,
}

/// Fast clear color compression metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DccLayout {
    pub size: u64,
    pub alignment: u64,
    /// Size of one slice's metadata. DCC memory is linear, so every slice is
    /// the same size.
    pub slice_size: u64,
    /// Number of leading mip levels that are actually compressed. Levels past
    /// this count read through the buffer but are stored uncompressed.
    pub usable_levels: u32,
    /// Per level chain, populated by the GFX6-GFX8 planner.
    pub levels: Vec<DccLevel>,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
    pub display: Option<DisplayDcc>,
}

/// Hierarchical depth metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HtileLayout {
    pub size: u64,
    pub slice_size: u64,
    pub alignment: u64,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
}

/// Multisample color compression mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CmaskLayout {
    pub size: u64,
    pub slice_size: u64,
    pub alignment: u64,
    /// Packed tile count register value.
    pub slice_tile_max: u32,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
}

/// Sample location indirection buffer for MSAA color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmaskLayout {
    pub size: u64,
    pub alignment: u64,
    pub pitch: u32,
    pub slice_size: u64,
    pub slice_tile_max: u32,
    pub bank_height: u32,
    pub tile_index: i32,
    /// FMASK has its own tile swizzle, seeded from a separate counter.
    pub tile_swizzle: u8,
    /// GFX9+ mode and effective pitch.
    pub swizzle_mode: SwizzleMode,
    pub epitch: u32,
}

/// Layout details specific to the GFX6-GFX8 table driven era.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyDetail {
    pub levels: Vec<LevelLayout>,
    /// Parallel stencil plane, empty for non stencil surfaces.
    pub stencil_levels: Vec<LevelLayout>,
    pub pipe_config: u32,
    pub bank_width: u32,
    pub bank_height: u32,
    pub macro_aspect_ratio: u32,
    pub tile_split_bytes: u32,
    pub num_banks: u32,
    pub macro_tile_index: i32,
    /// Stencil can use a different tile split than depth.
    pub stencil_tile_split_bytes: u32,
    /// True when the stencil pitch had to diverge from the depth pitch.
    pub stencil_adjusted: bool,
}

impl LegacyDetail {
    pub(crate) fn new() -> Self {
        Self {
            levels: Vec::new(),
            stencil_levels: Vec::new(),
            pipe_config: 0,
            bank_width: 0,
            bank_height: 0,
            macro_aspect_ratio: 0,
            tile_split_bytes: 0,
            num_banks: 0,
            macro_tile_index: 0,
            stencil_tile_split_bytes: 0,
            stencil_adjusted: false,
        }
    }
}

/// Layout details specific to the GFX9+ swizzle mode era.
#[derive(Debug, Clone, PartialEq)]
pub struct ModernDetail {
    pub resource: ResourceType,
    pub swizzle_mode: SwizzleMode,
    /// Effective pitch register value for the mip chain.
    pub epitch: u32,
    pub surf_pitch: u32,
    pub surf_height: u32,
    pub slice_size: u64,
    /// Per level byte offsets for linear surfaces. Empty for tiled chains.
    pub mip_offsets: Vec<u64>,
    /// Stencil is an independent sub surface placed after the depth plane.
    pub stencil_swizzle_mode: Option<SwizzleMode>,
    pub stencil_epitch: u32,
    pub stencil_offset: u64,
    /// FMASK companion mode, used by CMASK fast clears even without FMASK.
    pub fmask_swizzle_mode: SwizzleMode,
    pub fmask_epitch: u32,
}

/// Per era layout details.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceDetail {
    Legacy(LegacyDetail),
    Modern(ModernDetail),
}

impl SurfaceDetail {
    /// Convenience accessor for tests and callers that know the era.
    pub fn as_legacy(&self) -> Option<&LegacyDetail> {
        match self {
            SurfaceDetail::Legacy(detail) => Some(detail),
            SurfaceDetail::Modern(_) => None,
        }
    }

    pub fn as_modern(&self) -> Option<&ModernDetail> {
        match self {
            SurfaceDetail::Modern(detail) => Some(detail),
            SurfaceDetail::Legacy(_) => None,
        }
    }
}

/// The computed physical layout of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLayout {
    /// Total byte size of the color or depth+stencil data, excluding the
    /// metadata buffers.
    pub total_size: u64,
    pub base_alignment: u64,
    pub micro_tile_mode: MicroTileMode,
    /// Pseudo random bits xored into computed addresses, unique per surface.
    /// Zero for shareable, displayable, and depth surfaces.
    pub tile_swizzle: u8,
    pub is_linear: bool,
    /// Whether the display engine can scan the surface out as laid out.
    pub is_displayable: bool,
    pub has_stencil: bool,
    pub detail: SurfaceDetail,
    pub dcc: Option<DccLayout>,
    pub htile: Option<HtileLayout>,
    pub cmask: Option<CmaskLayout>,
    pub fmask: Option<FmaskLayout>,
}

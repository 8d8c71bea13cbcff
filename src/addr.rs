//! The seam to the vendor address library.
//!
//! The address library performs the actual tile and swizzle math for a given
//! tiling mode. This crate treats it as an opaque, stateless, reentrant
//! service behind the [AddressService] trait: given tiling parameters it
//! returns computed sizes, pitches, and alignments. The planners never
//! inspect how those numbers were produced, they only have to feed the
//! service the exact parameters the hardware's address generation expects.
use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use thiserror::Error;

/// An opaque failure status from the address library.
///
/// Treated as fatal for the current surface computation and propagated
/// unchanged. No retries happen inside this crate.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("address library failed with status {code}")]
pub struct AddrError {
    pub code: u32,
}

/// GFX6-GFX8 tile modes. Ordered from least to most tiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum TileMode {
    /// Row major with padded pitch.
    LinearAligned,
    /// Micro tiled only.
    Thin1d,
    /// Micro and macro tiled.
    Thin2d,
}

/// Micro tile sample ordering requested from the address library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    Displayable,
    NonDisplayable,
    DepthSampleOrder,
}

/// Micro tile mode decoded from a tile mode table entry or swizzle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroTileMode {
    Display,
    Thin,
    Depth,
    Rotated,
}

impl MicroTileMode {
    pub(crate) fn from_raw(raw: u32) -> Self {
        match raw {
            0 => MicroTileMode::Display,
            2 => MicroTileMode::Depth,
            3 => MicroTileMode::Rotated,
            _ => MicroTileMode::Thin,
        }
    }
}

/// Tile block size of a GFX9+ swizzle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum SwizzleBlock {
    /// 256 byte micro blocks.
    Micro256B,
    Kib4,
    Kib64,
    /// Variable sized blocks.
    Var,
}

/// Micro ordering within a GFX9+ swizzle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum SwizzleKind {
    /// S: standard.
    Standard,
    /// D: display.
    Display,
    /// R: rotated on GFX9, render target on GFX10.
    Render,
    /// Z: depth.
    Depth,
}

/// Address xor variant of a GFX9+ swizzle mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum SwizzleXor {
    None,
    /// T: xor pattern shared with the texture units.
    Tc,
    /// X: full pipe and bank xor.
    PipeBank,
}

/// A GFX9+ swizzle mode: linear, or a tiled mode described by block size,
/// micro ordering, and xor variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub enum SwizzleMode {
    Linear,
    Tiled {
        block: SwizzleBlock,
        kind: SwizzleKind,
        xor: SwizzleXor,
    },
}

impl SwizzleMode {
    pub fn is_linear(self) -> bool {
        self == SwizzleMode::Linear
    }

    /// The micro tile mode implied by this swizzle mode.
    pub fn micro_tile_mode(self) -> MicroTileMode {
        match self {
            SwizzleMode::Linear => MicroTileMode::Display,
            SwizzleMode::Tiled { kind, .. } => match kind {
                SwizzleKind::Standard => MicroTileMode::Thin,
                SwizzleKind::Display => MicroTileMode::Display,
                SwizzleKind::Render => MicroTileMode::Rotated,
                SwizzleKind::Depth => MicroTileMode::Depth,
            },
        }
    }

    /// True for the modes that can carry a pipe bank xor tile swizzle,
    /// i.e. all T and X variants.
    pub fn supports_tile_swizzle(self) -> bool {
        matches!(
            self,
            SwizzleMode::Tiled {
                xor: SwizzleXor::Tc | SwizzleXor::PipeBank,
                ..
            }
        )
    }

    /// Whether DCC can compress surfaces in this mode.
    ///
    /// GFX10 restricts DCC to the 64K Z_X and R_X modes. GFX9 allows any
    /// non linear mode.
    pub fn dcc_capable(self, generation: crate::Generation) -> bool {
        if generation >= crate::Generation::Gfx10 {
            matches!(
                self,
                SwizzleMode::Tiled {
                    block: SwizzleBlock::Kib64,
                    kind: SwizzleKind::Depth | SwizzleKind::Render,
                    xor: SwizzleXor::PipeBank,
                }
            )
        } else {
            !self.is_linear()
        }
    }

    /// The FMASK companion of a color mode. FMASK only supports the Z micro
    /// ordering, with the block size and xor variant of the color surface.
    pub fn as_fmask(self) -> SwizzleMode {
        match self {
            SwizzleMode::Linear => SwizzleMode::Linear,
            SwizzleMode::Tiled { block, xor, .. } => SwizzleMode::Tiled {
                block,
                kind: SwizzleKind::Depth,
                xor,
            },
        }
    }
}

/// GFX9+ resource dimensionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Tex1d,
    Tex2d,
    Tex3d,
}

bitflags! {
    /// Request flags forwarded to the address library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LevelFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
        const CUBE = 1 << 3;
        const DISPLAY = 1 << 4;
        /// Pad mip dimensions to powers of two.
        const POW2_PAD = 1 << 5;
        const TC_COMPATIBLE = 1 << 6;
        const OPT4_SPACE = 1 << 7;
        const DCC_COMPATIBLE = 1 << 8;
        const NO_STENCIL = 1 << 9;
        const COMPRESS_Z = 1 << 10;
        /// Pick a depth tile config that has a matching stencil config.
        const MATCH_STENCIL_TILE_CFG = 1 << 11;
        /// GFX9+: the surface is sampled (or TC compatible HTILE was asked for).
        const TEXTURE = 1 << 12;
        /// GFX9+: drop pipe alignment of the compression metadata.
        const META_PIPE_UNALIGNED = 1 << 13;
        /// GFX9+: drop render backend alignment of the compression metadata.
        const META_RB_UNALIGNED = 1 << 14;
        const FMASK = 1 << 15;
    }
}

/// GFX6-GFX8 macrotile parameters, one register table entry's worth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacroTileParams {
    pub pipe_config: u32,
    pub banks: u32,
    pub bank_width: u32,
    pub bank_height: u32,
    pub macro_aspect_ratio: u32,
    pub tile_split_bytes: u32,
}

/// One mip level's geometry request (GFX6-GFX8).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRequest {
    pub level: u32,
    /// Width in pixels, already minified and padded by the planner.
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub samples: u32,
    pub fragments: u32,
    /// Bytes per element. 1 for the stencil plane.
    pub bpe: u32,
    pub compressed: bool,
    /// Level 0 pitch in pixels, required for pitch compatible mip levels.
    /// Zero for the base level.
    pub base_pitch: u32,
    pub tile_mode: TileMode,
    pub tile_type: TileType,
    /// Forced tile mode table index, if known.
    pub tile_index: Option<i32>,
    /// Preferred macrotile parameters for shared resources.
    pub macro_tile: Option<MacroTileParams>,
    pub flags: LevelFlags,
}

/// One mip level's computed geometry (GFX6-GFX8).
#[derive(Debug, Clone, PartialEq)]
pub struct LevelInfo {
    /// Row pitch in elements.
    pub pitch: u32,
    /// Padded row count.
    pub height: u32,
    pub depth: u32,
    pub slice_size: u64,
    pub surf_size: u64,
    pub base_align: u64,
    /// The mode actually chosen. The library may degrade the requested mode.
    pub tile_mode: TileMode,
    pub tile_index: i32,
    pub macro_mode_index: i32,
    /// Stencil table index compatible with this depth config, or -1.
    pub stencil_tile_index: i32,
    pub tc_compatible: bool,
    pub tile_info: MacroTileParams,
}

/// DCC sizing request (GFX6-GFX8 per level, GFX9+ whole chain).
#[derive(Debug, Clone, PartialEq)]
pub struct DccRequest {
    pub bpe: u32,
    pub fragments: u32,
    /// Size of the color data the metadata covers. One level, one slice, or
    /// the whole chain depending on the caller.
    pub surf_size: u64,
    pub tiling: Tiling,
    pub tile_info: MacroTileParams,
    pub tile_index: i32,
    pub macro_mode_index: i32,
    /// GFX9+ fields.
    pub resource: ResourceType,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub num_levels: u32,
    pub first_mip_in_tail: u32,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
}

/// DCC sizing reply.
#[derive(Debug, Clone, PartialEq)]
pub struct DccInfo {
    pub size: u64,
    pub alignment: u64,
    pub fast_clear_size: u64,
    /// True if the metadata of this subresource is contiguous, which is what
    /// makes whole level fast clears possible.
    pub size_aligned: bool,
    /// True if the next smaller mip level can still be compressed.
    pub sub_level_compressible: bool,
    /// GFX9+: metadata pitch in elements.
    pub pitch: u32,
    /// GFX9+: dimensions of one compression block in pixels.
    pub compress_block_width: u32,
    pub compress_block_height: u32,
    /// GFX9+: whether each level sits inside the mip tail.
    pub level_in_mip_tail: Vec<bool>,
}

/// Either era's tiling selection, so metadata requests can carry one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tiling {
    Legacy(TileMode),
    Modern(SwizzleMode),
}

/// HTILE sizing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HtileRequest {
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub tc_compatible: bool,
    pub tiling: Tiling,
    pub tile_info: MacroTileParams,
    pub tile_index: i32,
    pub macro_mode_index: i32,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
    pub num_levels: u32,
    pub first_mip_in_tail: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HtileInfo {
    pub size: u64,
    pub slice_size: u64,
    pub alignment: u64,
}

/// FMASK sizing request.
#[derive(Debug, Clone, PartialEq)]
pub struct FmaskRequest {
    pub tiling: Tiling,
    pub pitch: u32,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub samples: u32,
    pub fragments: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FmaskInfo {
    pub size: u64,
    pub alignment: u64,
    pub pitch: u32,
    pub height: u32,
    pub slice_size: u64,
    pub tile_index: i32,
    pub macro_mode_index: i32,
    pub bank_height: u32,
}

/// CMASK sizing request (GFX9+ only, the legacy planner sizes CMASK itself).
#[derive(Debug, Clone, PartialEq)]
pub struct CmaskRequest {
    pub swizzle_mode: SwizzleMode,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CmaskInfo {
    pub size: u64,
    pub alignment: u64,
}

/// Whole mip chain request (GFX9+).
#[derive(Debug, Clone, PartialEq)]
pub struct MiptreeRequest {
    pub swizzle_mode: SwizzleMode,
    pub resource: ResourceType,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub num_levels: u32,
    pub samples: u32,
    pub fragments: u32,
    pub bpe: u32,
    pub flags: LevelFlags,
}

/// Whole mip chain reply (GFX9+).
#[derive(Debug, Clone, PartialEq)]
pub struct MiptreeInfo {
    pub surf_size: u64,
    pub base_align: u64,
    pub pitch: u32,
    pub height: u32,
    pub slice_size: u64,
    /// True when the effective pitch register should hold the mip chain
    /// height instead of the pitch.
    pub epitch_is_height: bool,
    pub mip_chain_pitch: u32,
    pub mip_chain_height: u32,
    /// True when even the base level lives in the mip tail.
    pub mip_chain_in_tail: bool,
    pub first_mip_in_tail: u32,
    /// Per level byte offsets. Only populated for linear surfaces; tiled
    /// chains are addressed through the swizzle equations instead.
    pub mip_offsets: Vec<u64>,
}

/// Preferred swizzle mode query (GFX9+).
#[derive(Debug, Clone, PartialEq)]
pub struct PreferredModeRequest {
    pub resource: ResourceType,
    pub width: u32,
    pub height: u32,
    pub num_slices: u32,
    pub num_levels: u32,
    pub samples: u32,
    pub fragments: u32,
    pub bpe: u32,
    pub flags: LevelFlags,
    /// Never allow the 256 byte micro modes.
    pub forbid_micro: bool,
    /// Never allow the variable sized modes.
    pub forbid_var: bool,
}

/// Base swizzle request (GFX6-GFX8).
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSwizzleRequest {
    pub tile_mode: TileMode,
    pub tile_index: i32,
    pub macro_mode_index: i32,
    pub tile_info: MacroTileParams,
}

/// Pipe bank xor request (GFX9+).
#[derive(Debug, Clone, PartialEq)]
pub struct PipeBankXorRequest {
    pub swizzle_mode: SwizzleMode,
    pub resource: ResourceType,
    pub bpe: u32,
    pub samples: u32,
    pub fragments: u32,
    pub flags: LevelFlags,
}

/// DCC element address request, used to build the displayable DCC retile map.
#[derive(Debug, Clone, PartialEq)]
pub struct DccAddressRequest {
    pub swizzle_mode: SwizzleMode,
    pub resource: ResourceType,
    pub bpe: u32,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
    pub pipe_aligned: bool,
    pub rb_aligned: bool,
}

/// The opaque hardware address generation library.
///
/// Implementations are expected to be pure functions of their inputs: the
/// same request must always produce the same reply, and calls may happen
/// concurrently from multiple threads.
pub trait AddressService {
    /// Computes one mip level's physical layout (GFX6-GFX8).
    fn compute_level_info(&self, req: &LevelRequest) -> Result<LevelInfo, AddrError>;

    /// Computes a whole mip chain's layout in one call (GFX9+).
    fn compute_miptree_info(&self, req: &MiptreeRequest) -> Result<MiptreeInfo, AddrError>;

    /// Sizes the DCC metadata for one level, slice, or chain.
    fn compute_dcc_info(&self, req: &DccRequest) -> Result<DccInfo, AddrError>;

    /// Sizes the HTILE metadata.
    fn compute_htile_info(&self, req: &HtileRequest) -> Result<HtileInfo, AddrError>;

    /// Sizes the FMASK sample indirection buffer.
    fn compute_fmask_info(&self, req: &FmaskRequest) -> Result<FmaskInfo, AddrError>;

    /// Sizes the CMASK color compression mask (GFX9+).
    fn compute_cmask_info(&self, req: &CmaskRequest) -> Result<CmaskInfo, AddrError>;

    /// Computes the base address swizzle for a surface index (GFX6-GFX8).
    fn compute_base_swizzle(
        &self,
        req: &BaseSwizzleRequest,
        surf_index: u32,
    ) -> Result<u32, AddrError>;

    /// Computes the pipe bank xor for a surface index (GFX9+).
    fn compute_pipe_bank_xor(
        &self,
        req: &PipeBankXorRequest,
        surf_index: u32,
    ) -> Result<u32, AddrError>;

    /// Picks the best fitting swizzle mode for a resource (GFX9+).
    fn preferred_swizzle_mode(&self, req: &PreferredModeRequest)
        -> Result<SwizzleMode, AddrError>;

    /// Computes the byte address of one DCC element (GFX9+).
    fn compute_dcc_address(&self, req: &DccAddressRequest) -> Result<u64, AddrError>;

    /// Whether the display engine accepts this swizzle mode at this element
    /// size (GFX9+).
    fn is_valid_display_swizzle(&self, mode: SwizzleMode, bpe: u32) -> Result<bool, AddrError>;
}

/// Process wide counters seeding the per surface address swizzle.
///
/// Each computed surface consumes a unique index so that independently
/// allocated same shaped surfaces don't alias the same memory banks. The
/// counters are the only shared mutable state in this crate; owning them is
/// the device's job, typically one instance per process. Passing `None` to
/// [crate::compute_surface] disables tile swizzle entirely.
#[derive(Debug, Default)]
pub struct SwizzleCounters {
    surface: AtomicU32,
    fmask: AtomicU32,
}

impl SwizzleCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next color/depth surface index, starting from 0.
    pub(crate) fn next_surface_index(&self) -> u32 {
        self.surface.fetch_add(1, Ordering::Relaxed)
    }

    /// Next FMASK surface index. This counter starts from 1 instead of 0.
    pub(crate) fn next_fmask_index(&self) -> u32 {
        self.fmask.fetch_add(1, Ordering::Relaxed) + 1
    }
}

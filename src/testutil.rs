//! A deterministic in process stand in for the vendor address library.
//!
//! The sizing rules here are simplified but shape preserving: pitches are
//! padded, alignments depend on the tiling, metadata shrinks by the real
//! ratios. That keeps the planner tests meaningful without linking the
//! actual library.
use std::cell::Cell;

use crate::addr::*;
use crate::hardware::{Generation, HardwareProfile, TILE_MODE_TABLE_LEN};
use crate::{align_up, minify};

const MICRO_THIN: u32 = 1 << 22;
const MICRO_DEPTH: u32 = 2 << 22;

pub(crate) fn gfx8_profile() -> HardwareProfile {
    let mut table = [0u32; TILE_MODE_TABLE_LEN];
    table[0] = MICRO_DEPTH; // 2D depth
    table[13] = MICRO_THIN; // 1D thin
    table[14] = MICRO_THIN; // 2D thin
    table[15] = MICRO_THIN;
    table[16] = MICRO_THIN;
    table[17] = MICRO_THIN;
    // 8 (linear) and 10 (2D display) decode as display.

    HardwareProfile {
        generation: Generation::Gfx8,
        has_graphics: true,
        pipe_interleave_bytes: 256,
        num_tile_pipes: 4,
        num_render_backends: 4,
        tile_mode_table: table,
        use_display_dcc_unaligned: false,
        use_display_dcc_with_retile_blit: false,
    }
}

pub(crate) fn gfx9_profile() -> HardwareProfile {
    HardwareProfile {
        generation: Generation::Gfx9,
        ..gfx8_profile()
    }
}

pub(crate) fn gfx10_profile() -> HardwareProfile {
    HardwareProfile {
        generation: Generation::Gfx10,
        ..gfx8_profile()
    }
}

/// Deterministic [AddressService] double with call counters.
pub(crate) struct StubService {
    /// Swizzle mode handed out for color resources.
    pub color_mode: SwizzleMode,
    pub level_calls: Cell<usize>,
    pub miptree_calls: Cell<usize>,
    /// Fragment count seen by the last preferred mode query.
    pub preferred_fragments: Cell<u32>,
    /// pipe_config seen by the last base swizzle request.
    pub swizzle_pipe_config: Cell<u32>,
}

impl StubService {
    pub fn new() -> Self {
        Self::with_color_mode(SwizzleMode::Tiled {
            block: SwizzleBlock::Kib64,
            kind: SwizzleKind::Standard,
            xor: SwizzleXor::PipeBank,
        })
    }

    pub fn with_color_mode(color_mode: SwizzleMode) -> Self {
        Self {
            color_mode,
            level_calls: Cell::new(0),
            miptree_calls: Cell::new(0),
            preferred_fragments: Cell::new(0),
            swizzle_pipe_config: Cell::new(0),
        }
    }
}

fn block_base_align(block: SwizzleBlock) -> u64 {
    match block {
        SwizzleBlock::Micro256B => 256,
        SwizzleBlock::Kib4 => 4096,
        SwizzleBlock::Kib64 | SwizzleBlock::Var => 65536,
    }
}

impl AddressService for StubService {
    fn compute_level_info(&self, req: &LevelRequest) -> Result<LevelInfo, AddrError> {
        self.level_calls.set(self.level_calls.get() + 1);

        let pitch = (align_up(req.width.max(1) as u64, 8) as u32).max(req.base_pitch);
        let rows = align_up(req.height.max(1) as u64, 8) as u32;
        let slice_size = pitch as u64 * rows as u64 * req.bpe as u64 * req.samples as u64;
        let surf_size = slice_size * req.num_slices as u64;

        let (base_align, default_index) = match req.tile_mode {
            TileMode::LinearAligned => (256, 8),
            TileMode::Thin1d => (512, 13),
            TileMode::Thin2d => (
                65536,
                match req.tile_type {
                    TileType::Displayable => 10,
                    TileType::DepthSampleOrder => 0,
                    TileType::NonDisplayable => 14,
                },
            ),
        };
        let tile_index = req.tile_index.unwrap_or(default_index);

        let tile_info = if req.tile_mode == TileMode::Thin2d {
            req.macro_tile.unwrap_or(MacroTileParams {
                pipe_config: 2,
                banks: 8,
                bank_width: 1,
                bank_height: 2,
                macro_aspect_ratio: 2,
                tile_split_bytes: 1024,
            })
        } else {
            MacroTileParams::default()
        };

        Ok(LevelInfo {
            pitch,
            height: rows,
            depth: req.num_slices,
            slice_size,
            surf_size,
            base_align,
            tile_mode: req.tile_mode,
            tile_index,
            macro_mode_index: if req.tile_mode == TileMode::Thin2d { 2 } else { -1 },
            stencil_tile_index: tile_index,
            tc_compatible: req.flags.contains(LevelFlags::TC_COMPATIBLE)
                && req.tile_mode == TileMode::Thin2d,
            tile_info,
        })
    }

    fn compute_miptree_info(&self, req: &MiptreeRequest) -> Result<MiptreeInfo, AddrError> {
        self.miptree_calls.set(self.miptree_calls.get() + 1);

        match req.swizzle_mode {
            SwizzleMode::Linear => {
                let row_align = (256 / req.bpe).max(1) as u64;
                let pitch = align_up(req.width as u64, row_align) as u32;
                let mut mip_offsets = Vec::new();
                let mut slice_size = 0u64;
                for level in 0..req.num_levels {
                    mip_offsets.push(slice_size);
                    let w = align_up(minify(req.width, level) as u64, row_align);
                    let h = minify(req.height, level) as u64;
                    slice_size += w * h * req.bpe as u64;
                }
                Ok(MiptreeInfo {
                    surf_size: slice_size * req.num_slices as u64,
                    base_align: 256,
                    pitch,
                    height: req.height,
                    slice_size,
                    epitch_is_height: false,
                    mip_chain_pitch: pitch,
                    mip_chain_height: req.height,
                    mip_chain_in_tail: false,
                    first_mip_in_tail: req.num_levels,
                    mip_offsets,
                })
            }
            SwizzleMode::Tiled { block, .. } => {
                let mut slice_size = 0u64;
                let mut first_mip_in_tail = req.num_levels;
                for level in 0..req.num_levels {
                    let w = minify(req.width, level);
                    let h = minify(req.height, level);
                    if w.max(h) <= 32 && first_mip_in_tail == req.num_levels {
                        first_mip_in_tail = level;
                    }
                    slice_size += align_up(w as u64, 64)
                        * align_up(h as u64, 64)
                        * req.bpe as u64
                        * req.samples as u64;
                }
                let pitch = align_up(req.width as u64, 64) as u32;
                let height = align_up(req.height as u64, 64) as u32;
                Ok(MiptreeInfo {
                    surf_size: slice_size * req.num_slices as u64,
                    base_align: block_base_align(block),
                    pitch,
                    height,
                    slice_size,
                    epitch_is_height: false,
                    mip_chain_pitch: pitch,
                    mip_chain_height: height,
                    mip_chain_in_tail: first_mip_in_tail == 0,
                    first_mip_in_tail,
                    mip_offsets: Vec::new(),
                })
            }
        }
    }

    fn compute_dcc_info(&self, req: &DccRequest) -> Result<DccInfo, AddrError> {
        let raw = req.surf_size >> 8;
        match req.tiling {
            Tiling::Legacy(_) => Ok(DccInfo {
                size: align_up(raw, 2048),
                alignment: 2048,
                fast_clear_size: align_up(raw, 2048),
                size_aligned: raw % 2048 == 0,
                // Small miptrees stop compressing early.
                sub_level_compressible: req.surf_size >= 65536,
                pitch: 0,
                compress_block_width: 0,
                compress_block_height: 0,
                level_in_mip_tail: Vec::new(),
            }),
            Tiling::Modern(_) => {
                let (size, alignment) = if req.pipe_aligned || req.rb_aligned {
                    (align_up(raw, 4096), 4096)
                } else {
                    (align_up(raw, 1024), 1024)
                };
                Ok(DccInfo {
                    size,
                    alignment,
                    fast_clear_size: size,
                    size_aligned: true,
                    sub_level_compressible: true,
                    pitch: align_up(req.width as u64, 128) as u32,
                    compress_block_width: 128,
                    compress_block_height: 128,
                    level_in_mip_tail: (0..req.num_levels)
                        .map(|level| level >= req.first_mip_in_tail)
                        .collect(),
                })
            }
        }
    }

    fn compute_htile_info(&self, req: &HtileRequest) -> Result<HtileInfo, AddrError> {
        let blocks_x = align_up(req.width as u64, 8) / 8;
        let blocks_y = align_up(req.height as u64, 8) / 8;
        let slice_size = align_up(blocks_x * blocks_y * 4, 256);
        Ok(HtileInfo {
            size: slice_size * req.num_slices as u64,
            slice_size,
            alignment: 2048,
        })
    }

    fn compute_fmask_info(&self, req: &FmaskRequest) -> Result<FmaskInfo, AddrError> {
        let pitch = align_up(req.width as u64, 64) as u32;
        let height = align_up(req.height as u64, 64) as u32;
        let slice_size = pitch as u64 * height as u64;
        Ok(FmaskInfo {
            size: slice_size * req.num_slices as u64,
            alignment: 65536,
            pitch,
            height,
            slice_size,
            tile_index: 17,
            macro_mode_index: 3,
            bank_height: 2,
        })
    }

    fn compute_cmask_info(&self, req: &CmaskRequest) -> Result<CmaskInfo, AddrError> {
        let slice = align_up(req.width as u64, 64) * align_up(req.height as u64, 64) / 128;
        Ok(CmaskInfo {
            size: align_up(slice * req.num_slices as u64, 4096),
            alignment: 4096,
        })
    }

    fn compute_base_swizzle(
        &self,
        req: &BaseSwizzleRequest,
        surf_index: u32,
    ) -> Result<u32, AddrError> {
        self.swizzle_pipe_config.set(req.tile_info.pipe_config);
        Ok((surf_index % 8) * 16)
    }

    fn compute_pipe_bank_xor(
        &self,
        _req: &PipeBankXorRequest,
        surf_index: u32,
    ) -> Result<u32, AddrError> {
        Ok(surf_index & 0xff)
    }

    fn preferred_swizzle_mode(
        &self,
        req: &PreferredModeRequest,
    ) -> Result<SwizzleMode, AddrError> {
        self.preferred_fragments.set(req.fragments);
        if req.flags.intersects(LevelFlags::DEPTH | LevelFlags::STENCIL | LevelFlags::FMASK) {
            Ok(SwizzleMode::Tiled {
                block: SwizzleBlock::Kib64,
                kind: SwizzleKind::Depth,
                xor: SwizzleXor::PipeBank,
            })
        } else {
            Ok(self.color_mode)
        }
    }

    fn compute_dcc_address(&self, req: &DccAddressRequest) -> Result<u64, AddrError> {
        // Small distinct values per compression block, offset by alignment
        // so the aligned and unaligned maps differ.
        let block = (req.y / 128) as u64 * 32 + (req.x / 128) as u64;
        Ok(block * 64 + if req.pipe_aligned { 32 } else { 0 })
    }

    fn is_valid_display_swizzle(&self, mode: SwizzleMode, _bpe: u32) -> Result<bool, AddrError> {
        Ok(matches!(
            mode,
            SwizzleMode::Linear
                | SwizzleMode::Tiled {
                    kind: SwizzleKind::Display | SwizzleKind::Render,
                    ..
                }
        ))
    }
}

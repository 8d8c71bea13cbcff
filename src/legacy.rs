//! Surface planning for the GFX6-GFX8 table driven tiling era.
//!
//! These chips select tiling from a fixed table of bank and pipe
//! configurations, looked up by index. Each mip level is computed separately
//! and the surface wide parameters are copied out of the level 0 reply. The
//! DCC chain, HTILE, CMASK, and FMASK all hang off the per level geometry.
use log::debug;

use crate::addr::*;
use crate::config::{SurfaceConfig, SurfaceFlags};
use crate::hardware::{Generation, HardwareProfile};
use crate::layout::*;
use crate::{align_up, minify, SurfaceError};

/// The DCC state of the most recently computed mip level.
///
/// The chain starts in `Pending` when the surface is eligible at all and
/// advances level by level. Once a level stops being compressible the chain
/// never restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DccChainState {
    Ineligible,
    Pending,
    Clearable,
    NotClearable,
}

/// Running DCC accumulation threaded through the level fold.
#[derive(Debug)]
struct DccChain {
    state: DccChainState,
    /// Whether the previous level's reply allows compressing the next one.
    sub_level_compressible: bool,
    size: u64,
    alignment: u64,
    slice_size: u64,
    usable_levels: u32,
    levels: Vec<DccLevel>,
}

impl DccChain {
    fn new(eligible: bool) -> Self {
        Self {
            state: if eligible {
                DccChainState::Pending
            } else {
                DccChainState::Ineligible
            },
            sub_level_compressible: false,
            size: 0,
            alignment: 1,
            slice_size: 0,
            usable_levels: 0,
            levels: Vec::new(),
        }
    }
}

/// State accumulated while folding over mip levels.
#[derive(Debug)]
struct LegacyState {
    detail: LegacyDetail,
    surf_size: u64,
    base_alignment: u64,
    micro_tile_mode: MicroTileMode,
    tile_swizzle: u8,
    /// Level 0 macrotile parameters in the address library's encoding. The
    /// register encoding stored in the detail is off by one on pipe_config.
    tile_info: MacroTileParams,
    dcc: DccChain,
    htile: Option<HtileLayout>,
    /// Macro mode index forced alongside a forced tile index. The address
    /// library doesn't fill this in when the index is preset.
    forced_macro_mode_index: Option<i32>,
}

/// Size shift and alignment multiplier for the whole miptree DCC post pass.
/// "dcc_alignment * 4" was determined by trial and error on real hardware.
const DCC_MIPTREE_SIZE_SHIFT: u32 = 8;
const DCC_MIPTREE_ALIGN_MULTIPLIER: u64 = 4;

/// HTILE covers one 8x8 pixel block with one 4 byte element.
const HTILE_BLOCK_PIXELS: u64 = 8 * 8;
const HTILE_ELEMENT_BYTES: u64 = 4;

pub(crate) fn plan_surface(
    profile: &HardwareProfile,
    service: &dyn AddressService,
    counters: Option<&SwizzleCounters>,
    config: &SurfaceConfig,
    mut mode: TileMode,
) -> Result<SurfaceLayout, SurfaceError> {
    let compressed = config.is_block_compressed();
    let z_or_s = config.flags.z_or_sbuffer();
    let display = config.display_flag();

    // MSAA requires 2D tiling.
    if config.samples > 1 {
        mode = TileMode::Thin2d;
    }

    // The DB doesn't support linear layouts.
    if z_or_s && mode < TileMode::Thin1d {
        mode = TileMode::Thin1d;
    }

    let tile_type = if config.flags.contains(SurfaceFlags::SCANOUT) {
        TileType::Displayable
    } else if z_or_s {
        TileType::DepthSampleOrder
    } else {
        TileType::NonDisplayable
    };

    let tc_compatible_requested = config.flags.contains(SurfaceFlags::TC_COMPATIBLE_HTILE);

    // DCC notes:
    // - CB can't decompress 8bpp with samples >= 4, keep that in mind for
    //   MSAA support.
    // - Mipmapped array textures compress poorly.
    let dcc_eligible = profile.generation >= Generation::Gfx8
        && profile.has_graphics
        && !z_or_s
        && !config.flags.contains(SurfaceFlags::DISABLE_DCC)
        && !compressed
        && ((config.array_size == 1 && config.depth == 1) || config.levels == 1);

    let mut flags = LevelFlags::empty();
    flags.set(LevelFlags::COLOR, !z_or_s);
    flags.set(LevelFlags::DEPTH, config.flags.contains(SurfaceFlags::ZBUFFER));
    flags.set(LevelFlags::CUBE, config.is_cube);
    flags.set(LevelFlags::DISPLAY, display);
    flags.set(LevelFlags::POW2_PAD, config.levels > 1);
    flags.set(LevelFlags::TC_COMPATIBLE, tc_compatible_requested);
    // Degrading the tile mode for space would break TC-compatible HTILE,
    // which requires 2D tiling.
    flags.set(
        LevelFlags::OPT4_SPACE,
        !tc_compatible_requested
            && config.samples <= 1
            && config.flags.contains(SurfaceFlags::OPTIMIZE_FOR_SPACE),
    );
    flags.set(LevelFlags::DCC_COMPATIBLE, dcc_eligible);
    flags.set(
        LevelFlags::NO_STENCIL,
        !config.flags.contains(SurfaceFlags::SBUFFER),
    );
    flags.set(LevelFlags::COMPRESS_Z, z_or_s);

    // The DB uses the same pitch and tile mode for Z and stencil, which
    // breaks mipmapped depth+stencil unless the depth tile config is chosen
    // to have a matching stencil config. Keeping the depth mip tail
    // texture compatible requires dropping the stencil aspect here.
    let match_stencil =
        flags.contains(LevelFlags::DEPTH) && !flags.contains(LevelFlags::NO_STENCIL) && config.levels > 1;
    if match_stencil {
        flags.insert(LevelFlags::MATCH_STENCIL_TILE_CFG);
        flags.insert(LevelFlags::NO_STENCIL);
    }

    let mut req = LevelRequest {
        level: 0,
        width: 0,
        height: 0,
        num_slices: 0,
        samples: config.samples.max(1),
        fragments: if z_or_s {
            config.samples.max(1)
        } else {
            config.storage_samples.max(1)
        },
        bpe: config.bytes_per_element,
        compressed,
        base_pitch: 0,
        tile_mode: mode,
        tile_type,
        tile_index: None,
        macro_tile: None,
        flags,
    };

    let mut state = LegacyState {
        detail: LegacyDetail::new(),
        surf_size: 0,
        base_alignment: 1,
        micro_tile_mode: MicroTileMode::Display,
        tile_swizzle: 0,
        tile_info: MacroTileParams::default(),
        dcc: DccChain::new(dcc_eligible),
        htile: None,
        forced_macro_mode_index: None,
    };

    // Feed back the macrotile parameters of an imported surface. The address
    // library skips parameter selection when the tile index is preset, so the
    // index (and on GFX7+ the macro mode index) must be derived here.
    if req.tile_mode == TileMode::Thin2d {
        if let Some(macro_tile) = config.preferred_macro_tile {
            if z_or_s {
                return Err(SurfaceError::Unsupported(
                    "imported macrotile parameters apply to color surfaces only",
                ));
            }
            req.flags.remove(LevelFlags::OPT4_SPACE);
            req.macro_tile = Some(macro_tile);

            if profile.generation == Generation::Gfx6 {
                req.tile_index = Some(if tile_type == TileType::Displayable {
                    if config.bytes_per_element == 2 {
                        11
                    } else {
                        12
                    }
                } else {
                    match config.bytes_per_element {
                        1 => 14,
                        2 => 15,
                        4 => 16,
                        _ => 17,
                    }
                });
            } else {
                req.tile_index = Some(if tile_type == TileType::Displayable {
                    10
                } else {
                    14
                });
                state.forced_macro_mode_index = Some(macro_tile_index_from_split(
                    config.bytes_per_element,
                    macro_tile.tile_split_bytes,
                ));
            }
        }
    }

    let only_stencil = config.flags.contains(SurfaceFlags::SBUFFER)
        && !config.flags.contains(SurfaceFlags::ZBUFFER);

    let mut tc_compatible = tc_compatible_requested;
    let mut stencil_tile_index: Option<i32> = None;

    // Primary plane.
    if !only_stencil {
        for level in 0..config.levels {
            let out = compute_level(service, config, &mut state, false, level, &mut req)?;

            if level > 0 {
                continue;
            }

            debug_assert!(
                out.tc_compatible
                    || !req.flags.contains(LevelFlags::TC_COMPATIBLE)
                    || req.flags.contains(LevelFlags::MATCH_STENCIL_TILE_CFG)
            );

            if req.flags.contains(LevelFlags::MATCH_STENCIL_TILE_CFG) {
                if !out.tc_compatible {
                    req.flags.remove(LevelFlags::TC_COMPATIBLE);
                    tc_compatible = false;
                }

                req.flags.remove(LevelFlags::MATCH_STENCIL_TILE_CFG);
                req.tile_index = Some(out.tile_index);

                if out.stencil_tile_index < 0 {
                    return Err(SurfaceError::Unsupported(
                        "no stencil tile config matches the depth tile config",
                    ));
                }
                stencil_tile_index = Some(out.stencil_tile_index);
            }

            surface_settings(profile, service, counters, config, &out, display, &mut state)?;
        }
    }

    // Stencil plane. Tracked separately because stencil shares the depth
    // pitch but can use a different tile split.
    if config.flags.contains(SurfaceFlags::SBUFFER) {
        req.tile_index = stencil_tile_index;
        req.bpe = 1;
        req.flags.remove(LevelFlags::DEPTH);
        req.flags.insert(LevelFlags::STENCIL);
        req.flags.remove(LevelFlags::TC_COMPATIBLE);

        for level in 0..config.levels {
            let out = compute_level(service, config, &mut state, true, level, &mut req)?;

            let idx = level as usize;
            if !only_stencil {
                if state.detail.stencil_levels[idx].pitch != state.detail.levels[idx].pitch {
                    state.detail.stencil_adjusted = true;
                }
            } else {
                // A stencil only surface has no depth plane, so the shared
                // pitch comes from the stencil plane.
                let mirrored = state.detail.stencil_levels[idx].clone();
                state.detail.levels.push(mirrored);
            }

            if level == 0 {
                if only_stencil {
                    surface_settings(profile, service, counters, config, &out, display, &mut state)?;
                }

                if out.tile_mode == TileMode::Thin2d {
                    state.detail.stencil_tile_split_bytes = out.tile_info.tile_split_bytes;
                }
            }
        }
    }

    // FMASK is allocated together with the color surface.
    let mut fmask = None;
    if config.samples >= 2 && req.flags.contains(LevelFlags::COLOR) {
        let base = &state.detail.levels[0];
        let fin = FmaskRequest {
            tiling: Tiling::Legacy(base.mode),
            pitch: base.pitch,
            width: config.width,
            height: config.height,
            num_slices: config.num_slices(0),
            samples: req.samples,
            fragments: req.fragments,
        };
        let fout = service.compute_fmask_info(&fin)?;

        let mut slice_tile_max = (fout.pitch as u64 * fout.height as u64 / 64) as u32;
        if slice_tile_max > 0 {
            slice_tile_max -= 1;
        }

        let mut fmask_swizzle = 0u8;
        if let Some(counters) = counters {
            if !config.flags.contains(SurfaceFlags::SHAREABLE) {
                let xin = BaseSwizzleRequest {
                    tile_mode: base.mode,
                    tile_index: fout.tile_index,
                    macro_mode_index: fout.macro_mode_index,
                    tile_info: MacroTileParams {
                        bank_height: fout.bank_height,
                        ..state.tile_info
                    },
                };
                let swizzle = service.compute_base_swizzle(&xin, counters.next_fmask_index())?;
                fmask_swizzle = u8::try_from(swizzle).map_err(|_| {
                    SurfaceError::Unsupported("FMASK tile swizzle exceeds its 8 bit field")
                })?;
            }
        }

        fmask = Some(FmaskLayout {
            size: fout.size,
            alignment: fout.alignment,
            pitch: fout.pitch,
            slice_size: fout.slice_size,
            slice_tile_max,
            bank_height: fout.bank_height,
            tile_index: fout.tile_index,
            tile_swizzle: fmask_swizzle,
            swizzle_mode: SwizzleMode::Linear,
            epitch: 0,
        });
    }

    // Recalculate the whole DCC miptree size including disabled levels.
    // The smallest mip levels never compressed by DCC still read the DCC
    // buffer via TC when the base level uses it, and the buffer needs extra
    // slack when the miptree uses a nonzero tile swizzle or the GPU page
    // faults.
    if state.dcc.size > 0 && config.levels > 1 {
        state.dcc.size = align_up(
            state.surf_size >> DCC_MIPTREE_SIZE_SHIFT,
            state.dcc.alignment * DCC_MIPTREE_ALIGN_MULTIPLIER,
        );
        debug!("expanded DCC to cover the whole miptree: {} bytes", state.dcc.size);
    }

    // Make sure HTILE covers the whole miptree, because the shader reads
    // TC-compatible HTILE even for levels where the DB disabled it.
    if config.levels > 1 && tc_compatible {
        if let Some(htile) = &mut state.htile {
            if htile.size > 0 {
                // MSAA can't occur with levels > 1, so the sample count is 1.
                let total_pixels = state.surf_size / config.bytes_per_element as u64;
                htile.size = align_up(
                    total_pixels / HTILE_BLOCK_PIXELS * HTILE_ELEMENT_BYTES,
                    htile.alignment,
                );
            }
        }
    }

    let is_linear = state.detail.levels[0].mode == TileMode::LinearAligned;
    let is_displayable = is_linear
        || state.micro_tile_mode == MicroTileMode::Display
        || state.micro_tile_mode == MicroTileMode::Rotated;

    // Rotated micro tiling doesn't work when CMASK and RB+ are used at the
    // same time. Nothing selects it on purpose, so reject it everywhere to
    // keep the behavior uniform across chips.
    if state.micro_tile_mode == MicroTileMode::Rotated {
        return Err(SurfaceError::Unsupported("rotated micro tile mode"));
    }

    let cmask = compute_cmask(profile, config, &state)?;

    let dcc = (state.dcc.size > 0).then(|| DccLayout {
        size: state.dcc.size,
        alignment: state.dcc.alignment,
        slice_size: state.dcc.slice_size,
        usable_levels: state.dcc.usable_levels,
        levels: state.dcc.levels,
        pipe_aligned: true,
        rb_aligned: true,
        display: None,
    });

    Ok(SurfaceLayout {
        total_size: state.surf_size,
        base_alignment: state.base_alignment,
        micro_tile_mode: state.micro_tile_mode,
        tile_swizzle: state.tile_swizzle,
        is_linear,
        is_displayable,
        has_stencil: config.flags.contains(SurfaceFlags::SBUFFER),
        detail: SurfaceDetail::Legacy(state.detail),
        dcc,
        htile: state.htile,
        cmask,
        fmask,
    })
}

/// One step of the level fold: computes the geometry of `level`, appends the
/// resulting [LevelLayout], and advances the DCC chain and HTILE state.
fn compute_level(
    service: &dyn AddressService,
    config: &SurfaceConfig,
    state: &mut LegacyState,
    is_stencil: bool,
    level: u32,
    req: &mut LevelRequest,
) -> Result<LevelInfo, SurfaceError> {
    req.level = level;
    req.width = minify(config.width, level);
    req.height = minify(config.height, level);

    // Pad single mip linear surfaces so GFX9, which requires 256 byte row
    // alignment, can reinterpret the same buffer without a copy.
    if config.levels == 1
        && req.tile_mode == TileMode::LinearAligned
        && req.bpe > 0
        && req.bpe.is_power_of_two()
    {
        let alignment = 256 / req.bpe;
        req.width = align_up(req.width as u64, alignment as u64) as u32;
    }

    req.num_slices = config.num_slices(level);

    if level > 0 {
        // Non zero levels must stay pitch compatible with the base level.
        let base = if is_stencil {
            state.detail.stencil_levels[0].pitch
        } else {
            state.detail.levels[0].pitch
        };
        req.base_pitch = if req.compressed {
            base * config.block_width
        } else {
            base
        };
    }

    let mut out = service.compute_level_info(req)?;
    if let Some(index) = state.forced_macro_mode_index {
        out.macro_mode_index = index;
    }

    let offset = align_up(state.surf_size, out.base_align);
    let layout = LevelLayout {
        offset,
        pitch: out.pitch,
        rows: out.height,
        slice_size: out.slice_size,
        mode: out.tile_mode,
        tile_index: out.tile_index,
    };
    state.surf_size = offset + out.surf_size;

    if is_stencil {
        state.detail.stencil_levels.push(layout);
    } else {
        state.detail.levels.push(layout);
    }

    // The previous level's reply tells us if DCC can continue here.
    if req.flags.contains(LevelFlags::DCC_COMPATIBLE)
        && (level == 0 || state.dcc.sub_level_compressible)
    {
        let prev_level_clearable = level == 0 || state.dcc.state == DccChainState::Clearable;
        advance_dcc_chain(service, config, state, level, req, &out, prev_level_clearable);
    }

    // TC-compatible HTILE, level 0 of the depth plane only. Higher levels
    // aren't covered by the DB anyway.
    if !is_stencil
        && req.flags.contains(LevelFlags::DEPTH)
        && out.tile_mode == TileMode::Thin2d
        && level == 0
    {
        let hin = HtileRequest {
            width: out.pitch,
            height: out.height,
            num_slices: out.depth,
            tc_compatible: req.flags.contains(LevelFlags::TC_COMPATIBLE),
            tiling: Tiling::Legacy(out.tile_mode),
            tile_info: out.tile_info,
            tile_index: out.tile_index,
            macro_mode_index: out.macro_mode_index,
            pipe_aligned: true,
            rb_aligned: true,
            num_levels: 1,
            first_mip_in_tail: 0,
        };
        if let Ok(hout) = service.compute_htile_info(&hin) {
            state.htile = Some(HtileLayout {
                size: hout.size,
                slice_size: hout.slice_size,
                alignment: hout.alignment,
                pipe_aligned: true,
                rb_aligned: true,
            });
        }
    }

    Ok(out)
}

/// Attempts DCC for one level and records the chain transition.
///
/// A sizing failure is not fatal: the level simply stays uncompressed, like
/// every level after it.
fn advance_dcc_chain(
    service: &dyn AddressService,
    config: &SurfaceConfig,
    state: &mut LegacyState,
    level: u32,
    req: &LevelRequest,
    out: &LevelInfo,
    prev_level_clearable: bool,
) {
    let din = DccRequest {
        bpe: req.bpe,
        fragments: req.fragments,
        surf_size: out.surf_size,
        tiling: Tiling::Legacy(out.tile_mode),
        tile_info: out.tile_info,
        tile_index: out.tile_index,
        macro_mode_index: out.macro_mode_index,
        resource: ResourceType::Tex2d,
        width: req.width,
        height: req.height,
        num_slices: req.num_slices,
        num_levels: 1,
        first_mip_in_tail: 0,
        pipe_aligned: true,
        rb_aligned: true,
    };

    let dout = match service.compute_dcc_info(&din) {
        Ok(dout) => dout,
        Err(_) => return,
    };

    let level_offset = state.dcc.size;
    state.dcc.usable_levels = level + 1;
    state.dcc.size = level_offset + dout.size;
    state.dcc.alignment = state.dcc.alignment.max(dout.alignment);

    // If the DCC of a subresource is not aligned, its memory layout is not
    // contiguous and a whole level fast clear would stomp neighboring
    // levels. The last level is the exception: it can be non contiguous and
    // still clearable because it's interleaved with a level that doesn't
    // exist.
    let fast_clear_size = if dout.size_aligned || (prev_level_clearable && level == config.levels - 1)
    {
        dout.fast_clear_size
    } else {
        0
    };

    // DCC memory is linear, so every slice is the same size. The address
    // library doesn't report this directly.
    state.dcc.slice_size = dout.size / config.array_size as u64;

    // For arrays the combined reply conflates per slice alignment with total
    // size alignment, so the per slice fast clear size needs its own query
    // over a single slice.
    let slice_fast_clear_size = if config.array_size > 1 {
        let slice_din = DccRequest {
            surf_size: out.slice_size,
            ..din
        };
        match service.compute_dcc_info(&slice_din) {
            Ok(s) if s.size_aligned => s.fast_clear_size,
            _ => 0,
        }
    } else {
        fast_clear_size
    };

    state.dcc.levels.push(DccLevel {
        offset: level_offset,
        fast_clear_size,
        slice_fast_clear_size,
    });

    state.dcc.state = if dout.size_aligned {
        DccChainState::Clearable
    } else {
        DccChainState::NotClearable
    };
    state.dcc.sub_level_compressible = dout.sub_level_compressible;
}

/// Copies surface global settings out of the level 0 reply and computes the
/// tile swizzle. Must run after the first level of the plane that owns the
/// shared pitch.
fn surface_settings(
    profile: &HardwareProfile,
    service: &dyn AddressService,
    counters: Option<&SwizzleCounters>,
    config: &SurfaceConfig,
    out: &LevelInfo,
    display: bool,
    state: &mut LegacyState,
) -> Result<(), SurfaceError> {
    state.base_alignment = out.base_align;
    state.tile_info = out.tile_info;
    // pipe_config is stored off by one from the register encoding.
    state.detail.pipe_config = out.tile_info.pipe_config.saturating_sub(1);

    state.micro_tile_mode = profile
        .micro_tile_mode(out.tile_index)
        .ok_or(SurfaceError::Unsupported("tile mode table index out of range"))?;

    // The macrotile parameters only exist for 2D modes.
    if out.tile_mode == TileMode::Thin2d {
        state.detail.bank_width = out.tile_info.bank_width;
        state.detail.bank_height = out.tile_info.bank_height;
        state.detail.macro_aspect_ratio = out.tile_info.macro_aspect_ratio;
        state.detail.tile_split_bytes = out.tile_info.tile_split_bytes;
        state.detail.num_banks = out.tile_info.banks;
        state.detail.macro_tile_index = out.macro_mode_index;
    } else {
        state.detail.macro_tile_index = 0;
    }

    // Tile swizzle. Displayable and shareable surfaces need deterministic
    // addressing for external consumers, and GFX6 can't swizzle mipmapped
    // surfaces.
    if let Some(counters) = counters {
        if (profile.generation >= Generation::Gfx7 || config.levels == 1)
            && out.tile_mode == TileMode::Thin2d
            && !config.flags.z_or_sbuffer()
            && !config.flags.contains(SurfaceFlags::SHAREABLE)
            && !display
        {
            let xin = BaseSwizzleRequest {
                tile_mode: out.tile_mode,
                tile_index: out.tile_index,
                macro_mode_index: out.macro_mode_index,
                tile_info: out.tile_info,
            };
            let swizzle = service.compute_base_swizzle(&xin, counters.next_surface_index())?;
            state.tile_swizzle = u8::try_from(swizzle).map_err(|_| {
                SurfaceError::Unsupported("tile swizzle exceeds its 8 bit field")
            })?;
            debug!("tile swizzle {:#x}", state.tile_swizzle);
        }
    }

    Ok(())
}

/// CMASK is sized locally on this era: the cache line shape depends only on
/// the pipe count, and the element granularity is fixed by the hardware.
/// Also used for non MSAA fast clear bookkeeping, so it's computed even at
/// one sample.
fn compute_cmask(
    profile: &HardwareProfile,
    config: &SurfaceConfig,
    state: &LegacyState,
) -> Result<Option<CmaskLayout>, SurfaceError> {
    if config.flags.z_or_sbuffer() {
        return Ok(None);
    }

    let (cl_width, cl_height) = match profile.num_tile_pipes {
        2 => (32u64, 16u64),
        4 => (32, 32),
        8 => (64, 32),
        16 => (64, 64),
        _ => return Err(SurfaceError::Unsupported("tile pipe count")),
    };

    let base_align = profile.num_tile_pipes as u64 * profile.pipe_interleave_bytes as u64;

    let base = &state.detail.levels[0];
    let width = align_up(base.pitch as u64, cl_width * 8);
    let height = align_up(base.rows as u64, cl_height * 8);

    // Each 8x8 tile is summarized by one nibble.
    let slice_elements = (width * height) / (8 * 8);
    let slice_bytes = slice_elements / 2;

    let mut slice_tile_max = ((width * height) / (128 * 128)) as u32;
    if slice_tile_max > 0 {
        slice_tile_max -= 1;
    }

    let slice_size = align_up(slice_bytes, base_align);
    Ok(Some(CmaskLayout {
        size: slice_size * config.num_slices(0) as u64,
        slice_size,
        alignment: base_align.max(256),
        slice_tile_max,
        pipe_aligned: true,
        rb_aligned: true,
    }))
}

/// Derives the macro mode index from the tile split, for surfaces whose tile
/// index is preset and therefore skipped by the address library.
fn macro_tile_index_from_split(bpe: u32, tile_split_bytes: u32) -> i32 {
    let mut tileb = (8 * 8 * bpe).min(tile_split_bytes);
    let mut index = 0;
    while tileb > 64 {
        index += 1;
        tileb >>= 1;
    }
    debug_assert!(index < 16);
    index
}

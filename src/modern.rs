//! Surface planning for the GFX9+ swizzle mode era.
//!
//! These chips replace the tile mode table with computed swizzle modes and
//! size the whole mip chain in a single address library call. Depth and
//! stencil are fully independent sub surfaces here, each with its own
//! swizzle mode, packed into one allocation.
use log::debug;

use crate::addr::*;
use crate::config::{SurfaceConfig, SurfaceFlags};
use crate::hardware::{Generation, HardwareProfile};
use crate::layout::*;
use crate::{align_up, div_round_up, SurfaceError};

/// Planner state shared between the main plane and the stencil plane.
struct ModernState {
    detail: ModernDetail,
    surf_size: u64,
    base_alignment: u64,
    tile_swizzle: u8,
    first_mip_in_tail: u32,
    mip_chain_in_tail: bool,
}

pub(crate) fn plan_surface(
    profile: &HardwareProfile,
    service: &dyn AddressService,
    counters: Option<&SwizzleCounters>,
    config: &SurfaceConfig,
    mode: TileMode,
) -> Result<SurfaceLayout, SurfaceError> {
    match config.bytes_per_element {
        1 | 2 | 4 | 8 | 12 | 16 => {}
        _ => return Err(SurfaceError::Unsupported("element size")),
    }

    let compressed = config.is_block_compressed();
    let z_or_s = config.flags.z_or_sbuffer();
    let display = config.display_flag();
    let is_color = !z_or_s && !config.flags.contains(SurfaceFlags::NO_RENDER_TARGET);
    // Depth and stencil store every coverage sample; only color can collapse
    // to fewer stored fragments.
    let fragments = if z_or_s {
        config.samples.max(1)
    } else {
        config.storage_samples.max(1)
    };

    let mut flags = LevelFlags::empty();
    flags.set(LevelFlags::COLOR, is_color);
    flags.set(LevelFlags::DEPTH, config.flags.contains(SurfaceFlags::ZBUFFER));
    flags.set(LevelFlags::CUBE, config.is_cube);
    flags.set(LevelFlags::DISPLAY, display);
    flags.set(LevelFlags::POW2_PAD, config.levels > 1);
    flags.set(
        LevelFlags::TEXTURE,
        is_color || config.flags.contains(SurfaceFlags::TC_COMPATIBLE_HTILE),
    );
    flags.set(
        LevelFlags::OPT4_SPACE,
        config.flags.contains(SurfaceFlags::OPTIMIZE_FOR_SPACE),
    );
    // The display engine scans compression metadata without pipe and RB
    // alignment, so displayable DCC must drop that alignment.
    if profile.use_display_dcc_unaligned && is_color && display {
        flags.insert(LevelFlags::META_PIPE_UNALIGNED);
        flags.insert(LevelFlags::META_RB_UNALIGNED);
    }

    let resource = if config.is_3d {
        ResourceType::Tex3d
    } else if config.is_1d && profile.generation != Generation::Gfx9 {
        // GFX9 has a bug addressing 1D resources, so they stay 2D there.
        ResourceType::Tex1d
    } else {
        ResourceType::Tex2d
    };

    // Element (block) sized dimensions.
    let width = div_round_up(config.width as u64, config.block_width as u64) as u32;
    let height = div_round_up(config.height as u64, config.block_height as u64) as u32;

    let swizzle_mode = if let Some(forced) = config.forced_swizzle_mode {
        forced
    } else if mode == TileMode::LinearAligned {
        if config.samples > 1 {
            return Err(SurfaceError::Unsupported("multisampled surfaces can't be linear"));
        }
        if z_or_s {
            return Err(SurfaceError::Unsupported("depth surfaces can't be linear"));
        }
        SwizzleMode::Linear
    } else {
        service.preferred_swizzle_mode(&PreferredModeRequest {
            resource,
            width,
            height,
            num_slices: config.num_slices(0),
            num_levels: config.levels,
            samples: config.samples.max(1),
            fragments,
            bpe: config.bytes_per_element,
            flags,
            forbid_micro: true,
            forbid_var: true,
        })?
    };
    debug!("selected swizzle mode {:?}", swizzle_mode);

    let micro_tile_mode = swizzle_mode.micro_tile_mode();
    // The R modes mean rotated micro tiling before GFX10, which nothing
    // supports scanning out or sampling reliably.
    if micro_tile_mode == MicroTileMode::Rotated && profile.generation < Generation::Gfx10 {
        return Err(SurfaceError::Unsupported("rotated micro tile mode"));
    }

    let mut state = ModernState {
        detail: ModernDetail {
            resource,
            swizzle_mode,
            epitch: 0,
            surf_pitch: 0,
            surf_height: 0,
            slice_size: 0,
            mip_offsets: Vec::new(),
            stencil_swizzle_mode: None,
            stencil_epitch: 0,
            stencil_offset: 0,
            fmask_swizzle_mode: SwizzleMode::Linear,
            fmask_epitch: 0,
        },
        surf_size: 0,
        base_alignment: 1,
        tile_swizzle: 0,
        first_mip_in_tail: config.levels,
        mip_chain_in_tail: false,
    };

    let out = compute_plane(service, config, &mut state, resource, width, height, flags, swizzle_mode, false)?;

    // Pipe bank xor. Only the T and X modes carry one, surfaces whose whole
    // chain lives in the mip tail can't use it, and depth surfaces never get
    // one: the DB addresses them without the xor.
    if let Some(counters) = counters {
        if swizzle_mode.supports_tile_swizzle()
            && !out.mip_chain_in_tail
            && !z_or_s
            && !config.flags.contains(SurfaceFlags::SHAREABLE)
            && !display
        {
            let xin = PipeBankXorRequest {
                swizzle_mode,
                resource,
                bpe: config.bytes_per_element,
                samples: config.samples.max(1),
                fragments,
                flags,
            };
            let xor = service.compute_pipe_bank_xor(&xin, counters.next_surface_index())?;
            state.tile_swizzle = u8::try_from(xor).map_err(|_| {
                SurfaceError::Unsupported("pipe bank xor exceeds its 8 bit field")
            })?;
        }
    }

    // DCC rides on the color plane when the swizzle mode allows compression.
    let mut dcc = None;
    if profile.has_graphics
        && is_color
        && !config.flags.contains(SurfaceFlags::DISABLE_DCC)
        && !compressed
        && swizzle_mode.dcc_capable(profile.generation)
    {
        dcc = compute_dcc(profile, service, config, &state, resource, width, height, flags, swizzle_mode)?;
    }

    // HTILE covers the depth plane only. Stencil reads it through the depth
    // sub surface.
    let mut htile = None;
    if config.flags.contains(SurfaceFlags::ZBUFFER) && !swizzle_mode.is_linear() {
        let pipe_aligned = !flags.contains(LevelFlags::META_PIPE_UNALIGNED);
        let rb_aligned = !flags.contains(LevelFlags::META_RB_UNALIGNED);
        let hout = service.compute_htile_info(&HtileRequest {
            width,
            height,
            num_slices: config.num_slices(0),
            tc_compatible: config.flags.contains(SurfaceFlags::TC_COMPATIBLE_HTILE),
            tiling: Tiling::Modern(swizzle_mode),
            tile_info: MacroTileParams::default(),
            tile_index: -1,
            macro_mode_index: -1,
            pipe_aligned,
            rb_aligned,
            num_levels: config.levels,
            first_mip_in_tail: out.first_mip_in_tail,
        })?;
        htile = Some(HtileLayout {
            size: hout.size,
            slice_size: hout.slice_size,
            alignment: hout.alignment,
            pipe_aligned,
            rb_aligned,
        });
    }

    // Stencil is an independent sub surface with its own swizzle mode,
    // appended after the depth data.
    if config.flags.contains(SurfaceFlags::SBUFFER) {
        let mut sflags = flags;
        sflags.remove(LevelFlags::DEPTH);
        sflags.insert(LevelFlags::STENCIL);

        let stencil_mode = service.preferred_swizzle_mode(&PreferredModeRequest {
            resource,
            width,
            height,
            num_slices: config.num_slices(0),
            num_levels: config.levels,
            samples: config.samples.max(1),
            fragments: config.samples.max(1),
            bpe: 1,
            flags: sflags,
            forbid_micro: true,
            forbid_var: true,
        })?;
        state.detail.stencil_swizzle_mode = Some(stencil_mode);

        compute_plane(service, config, &mut state, resource, width, height, sflags, stencil_mode, true)?;
    }

    // FMASK pairs with MSAA color and always uses the Z micro ordering.
    let mut fmask = None;
    if config.samples > 1 && is_color {
        fmask = Some(compute_fmask(
            service, counters, config, &mut state, resource, width, height, flags,
        )?);
    }

    // CMASK: fast clear bookkeeping on GFX9, FMASK compression with MSAA on
    // both. GFX10 dropped the non MSAA use.
    let mut cmask = None;
    if !swizzle_mode.is_linear()
        && is_color
        && (profile.generation <= Generation::Gfx9 || config.samples > 1)
    {
        let cmask_mode = if config.samples > 1 {
            state.detail.fmask_swizzle_mode
        } else {
            swizzle_mode
        };
        let pipe_aligned = config.samples > 1 || !flags.contains(LevelFlags::META_PIPE_UNALIGNED);
        let rb_aligned = config.samples > 1 || !flags.contains(LevelFlags::META_RB_UNALIGNED);
        let cout = service.compute_cmask_info(&CmaskRequest {
            swizzle_mode: cmask_mode,
            width,
            height,
            num_slices: config.num_slices(0),
            pipe_aligned,
            rb_aligned,
        })?;
        cmask = Some(CmaskLayout {
            size: cout.size,
            slice_size: cout.size / config.num_slices(0) as u64,
            alignment: cout.alignment,
            slice_tile_max: 0,
            pipe_aligned,
            rb_aligned,
        });
    }

    // Display eligibility is decided by the display engine's swizzle
    // whitelist, and displayable DCC additionally has to be unaligned.
    let mut is_displayable = false;
    if !config.is_3d && !config.is_cube {
        is_displayable = service
            .is_valid_display_swizzle(swizzle_mode, config.bytes_per_element)?;
        if profile.use_display_dcc_unaligned {
            if let Some(dcc) = &dcc {
                if dcc.pipe_aligned || dcc.rb_aligned {
                    is_displayable = false;
                }
            }
        }
    }

    Ok(SurfaceLayout {
        total_size: state.surf_size,
        base_alignment: state.base_alignment,
        micro_tile_mode,
        tile_swizzle: state.tile_swizzle,
        is_linear: swizzle_mode.is_linear(),
        is_displayable,
        has_stencil: config.flags.contains(SurfaceFlags::SBUFFER),
        detail: SurfaceDetail::Modern(state.detail),
        dcc,
        htile,
        cmask,
        fmask,
    })
}

/// Sizes one whole mip chain and appends it to the allocation.
#[allow(clippy::too_many_arguments)]
fn compute_plane(
    service: &dyn AddressService,
    config: &SurfaceConfig,
    state: &mut ModernState,
    resource: ResourceType,
    width: u32,
    height: u32,
    flags: LevelFlags,
    swizzle_mode: SwizzleMode,
    is_stencil: bool,
) -> Result<MiptreeInfo, SurfaceError> {
    let out = service.compute_miptree_info(&MiptreeRequest {
        swizzle_mode,
        resource,
        width,
        height,
        num_slices: config.num_slices(0),
        num_levels: config.levels,
        samples: config.samples.max(1),
        fragments: if is_stencil || config.flags.z_or_sbuffer() {
            config.samples.max(1)
        } else {
            config.storage_samples.max(1)
        },
        bpe: if is_stencil { 1 } else { config.bytes_per_element },
        flags,
    })?;

    let epitch = if out.epitch_is_height {
        out.mip_chain_height - 1
    } else {
        out.mip_chain_pitch - 1
    };

    let offset = align_up(state.surf_size, out.base_align);
    if is_stencil {
        state.detail.stencil_offset = offset;
        state.detail.stencil_epitch = epitch;
    } else {
        state.detail.surf_pitch = out.pitch;
        state.detail.surf_height = out.height;
        state.detail.slice_size = out.slice_size;
        state.detail.epitch = epitch;
        state.detail.mip_offsets = out.mip_offsets.clone();
        state.first_mip_in_tail = out.first_mip_in_tail;
        state.mip_chain_in_tail = out.mip_chain_in_tail;
        // CMASK fast clears read the FMASK companion fields even when no
        // FMASK is allocated. MSAA overwrites them with the real FMASK mode.
        if flags.contains(LevelFlags::COLOR) {
            state.detail.fmask_swizzle_mode = swizzle_mode.as_fmask();
            state.detail.fmask_epitch = epitch;
        }
    }
    state.surf_size = offset + out.surf_size;
    state.base_alignment = state.base_alignment.max(out.base_align);

    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn compute_dcc(
    profile: &HardwareProfile,
    service: &dyn AddressService,
    config: &SurfaceConfig,
    state: &ModernState,
    resource: ResourceType,
    width: u32,
    height: u32,
    flags: LevelFlags,
    swizzle_mode: SwizzleMode,
) -> Result<Option<DccLayout>, SurfaceError> {
    let pipe_aligned = !flags.contains(LevelFlags::META_PIPE_UNALIGNED);
    let rb_aligned = !flags.contains(LevelFlags::META_RB_UNALIGNED);

    let din = DccRequest {
        bpe: config.bytes_per_element,
        fragments: config.storage_samples.max(1),
        surf_size: state.surf_size,
        tiling: Tiling::Modern(swizzle_mode),
        tile_info: MacroTileParams::default(),
        tile_index: -1,
        macro_mode_index: -1,
        resource,
        width,
        height,
        num_slices: config.num_slices(0),
        num_levels: config.levels,
        first_mip_in_tail: state.first_mip_in_tail,
        pipe_aligned,
        rb_aligned,
    };
    let dout = service.compute_dcc_info(&din)?;

    // Levels inside the mip tail share metadata with their neighbors and
    // can't be compressed independently.
    let mut usable_levels = config.levels;
    for (level, in_tail) in dout.level_in_mip_tail.iter().enumerate() {
        if *in_tail {
            usable_levels = level as u32;
            break;
        }
    }
    if usable_levels == 0 {
        return Ok(None);
    }

    let mut layout = DccLayout {
        size: dout.size,
        alignment: dout.alignment,
        slice_size: dout.size / config.num_slices(0) as u64,
        usable_levels,
        levels: Vec::new(),
        pipe_aligned,
        rb_aligned,
        display: None,
    };

    // Displayable DCC keeps a second, unaligned copy of the metadata for the
    // display engine, plus a retile map translating between the two.
    if flags.contains(LevelFlags::DISPLAY) && profile.use_display_dcc_with_retile_blit {
        layout.display = compute_display_dcc(service, config, &din, &dout, swizzle_mode)?;
    }

    Ok(Some(layout))
}

/// Builds the unaligned display DCC mirror and its retile map.
///
/// The map holds pairs of (aligned, unaligned) element addresses, one pair
/// per compression block, padded to a multiple of four addresses.
fn compute_display_dcc(
    service: &dyn AddressService,
    config: &SurfaceConfig,
    din: &DccRequest,
    aligned: &DccInfo,
    swizzle_mode: SwizzleMode,
) -> Result<Option<DisplayDcc>, SurfaceError> {
    let unaligned = service.compute_dcc_info(&DccRequest {
        pipe_aligned: false,
        rb_aligned: false,
        ..din.clone()
    })?;

    // Same layout both ways: the display engine can read the aligned
    // metadata directly and no mirror is needed.
    if unaligned.size == aligned.size && unaligned.alignment == aligned.alignment {
        return Ok(None);
    }

    let blocks_x = div_round_up(din.width as u64, aligned.compress_block_width as u64) as u32;
    let blocks_y = div_round_up(din.height as u64, aligned.compress_block_height as u64) as u32;
    let num_elements = align_up(blocks_x as u64 * blocks_y as u64 * 2, 4) as usize;

    let retile_use_uint16 =
        aligned.size <= u16::MAX as u64 && unaligned.size <= u16::MAX as u64;

    let mut retile_map = Vec::new();
    retile_map
        .try_reserve_exact(num_elements)
        .map_err(|_| SurfaceError::OutOfMemory)?;

    for block in 0..(blocks_x * blocks_y) {
        let x = (block % blocks_x) * aligned.compress_block_width;
        let y = (block / blocks_x) * aligned.compress_block_height;

        let mut addr_req = DccAddressRequest {
            swizzle_mode,
            resource: din.resource,
            bpe: config.bytes_per_element,
            width: din.width,
            height: din.height,
            x,
            y,
            pipe_aligned: din.pipe_aligned,
            rb_aligned: din.rb_aligned,
        };
        let aligned_addr = service.compute_dcc_address(&addr_req)?;
        addr_req.pipe_aligned = false;
        addr_req.rb_aligned = false;
        let unaligned_addr = service.compute_dcc_address(&addr_req)?;

        retile_map.push(aligned_addr as u32);
        retile_map.push(unaligned_addr as u32);
    }

    // Pad with the last pair so the blit never reads garbage addresses.
    while retile_map.len() < num_elements {
        let pair = (
            retile_map[retile_map.len() - 2],
            retile_map[retile_map.len() - 1],
        );
        retile_map.push(pair.0);
        retile_map.push(pair.1);
    }

    Ok(Some(DisplayDcc {
        size: unaligned.size,
        alignment: unaligned.alignment,
        pitch_max: unaligned.pitch.saturating_sub(1),
        retile_map,
        retile_use_uint16,
    }))
}

#[allow(clippy::too_many_arguments)]
fn compute_fmask(
    service: &dyn AddressService,
    counters: Option<&SwizzleCounters>,
    config: &SurfaceConfig,
    state: &mut ModernState,
    resource: ResourceType,
    width: u32,
    height: u32,
    flags: LevelFlags,
) -> Result<FmaskLayout, SurfaceError> {
    let mut fflags = flags;
    fflags.insert(LevelFlags::FMASK);

    let fmask_mode = service.preferred_swizzle_mode(&PreferredModeRequest {
        resource,
        width,
        height,
        num_slices: config.num_slices(0),
        num_levels: 1,
        samples: config.samples.max(1),
        fragments: config.storage_samples.max(1),
        bpe: 4,
        flags: fflags,
        forbid_micro: true,
        forbid_var: true,
    })?;
    state.detail.fmask_swizzle_mode = fmask_mode;

    let fout = service.compute_fmask_info(&FmaskRequest {
        tiling: Tiling::Modern(fmask_mode),
        pitch: 0,
        width,
        height,
        num_slices: config.num_slices(0),
        samples: config.samples.max(1),
        fragments: config.storage_samples.max(1),
    })?;
    state.detail.fmask_epitch = fout.pitch.saturating_sub(1);

    let mut tile_swizzle = 0u8;
    if let Some(counters) = counters {
        if fmask_mode.supports_tile_swizzle() && !config.flags.contains(SurfaceFlags::SHAREABLE) {
            let xor = service.compute_pipe_bank_xor(
                &PipeBankXorRequest {
                    swizzle_mode: fmask_mode,
                    resource,
                    bpe: 4,
                    samples: config.samples.max(1),
                    fragments: config.storage_samples.max(1),
                    flags: fflags,
                },
                counters.next_fmask_index(),
            )?;
            tile_swizzle = u8::try_from(xor).map_err(|_| {
                SurfaceError::Unsupported("FMASK pipe bank xor exceeds its 8 bit field")
            })?;
        }
    }

    Ok(FmaskLayout {
        size: fout.size,
        alignment: fout.alignment,
        pitch: fout.pitch,
        slice_size: fout.slice_size,
        slice_tile_max: 0,
        bank_height: 0,
        tile_index: -1,
        tile_swizzle,
        swizzle_mode: fmask_mode,
        epitch: fout.pitch.saturating_sub(1),
    })
}

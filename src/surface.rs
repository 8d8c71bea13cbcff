//! The top level entry point.
use log::trace;

use crate::addr::{AddressService, SwizzleCounters, TileMode};
use crate::config::SurfaceConfig;
use crate::hardware::HardwareProfile;
use crate::layout::SurfaceLayout;
use crate::{legacy, modern, SurfaceError};

/// Computes the full physical layout of a surface.
///
/// The config is validated before any address library call, then the request
/// is routed to the planner for the profile's hardware era. `mode` is a
/// preference: planners upgrade it when the hardware requires tiling (MSAA,
/// depth) and the address library may degrade it.
///
/// Pass `counters` to give each surface a unique address swizzle, or `None`
/// for deterministic layouts.
pub fn compute_surface(
    profile: &HardwareProfile,
    service: &dyn AddressService,
    counters: Option<&SwizzleCounters>,
    config: &SurfaceConfig,
    mode: TileMode,
) -> Result<SurfaceLayout, SurfaceError> {
    config.validate()?;

    trace!(
        "computing {}x{}x{} layout on {:?}",
        config.width,
        config.height,
        config.depth,
        profile.generation
    );

    if profile.generation.uses_swizzle_modes() {
        modern::plan_surface(profile, service, counters, config, mode)
    } else {
        legacy::plan_surface(profile, service, counters, config, mode)
    }
}

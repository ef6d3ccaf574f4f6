//! The three tree interactions of a block action. Each returns the report the
//! step machine expects; surface errors count as a miss for that step.

use blocker_core::{LocatorMiss, NodeHandle, StepReport};
use blocker_logging::{blocker_debug, blocker_warn};

use crate::locate::LocatorChain;
use crate::profile::CompiledProfile;
use crate::surface::Surface;

/// Opens the "more actions" menu of the post at `node`.
pub fn open_menu<S: Surface + ?Sized>(
    surface: &mut S,
    profile: &CompiledProfile,
    node: NodeHandle,
) -> StepReport {
    if !surface.is_attached(node) {
        return StepReport::Stale;
    }
    trigger(
        surface,
        &profile.more_actions,
        Some(node),
        LocatorMiss::Affordance,
        StepReport::MenuOpened,
    )
}

/// Picks the block item of the open menu.
pub fn select_block_option<S: Surface + ?Sized>(
    surface: &mut S,
    profile: &CompiledProfile,
) -> StepReport {
    trigger(
        surface,
        &profile.block_option,
        None,
        LocatorMiss::BlockOption,
        StepReport::OptionSelected,
    )
}

/// Presses the confirm button of the confirmation surface.
pub fn confirm_block<S: Surface + ?Sized>(surface: &mut S, profile: &CompiledProfile) -> StepReport {
    trigger(
        surface,
        &profile.confirm_control,
        None,
        LocatorMiss::ConfirmControl,
        StepReport::Confirmed,
    )
}

fn trigger<S: Surface + ?Sized>(
    surface: &mut S,
    chain: &LocatorChain,
    scope: Option<NodeHandle>,
    miss: LocatorMiss,
    success: StepReport,
) -> StepReport {
    let Some(target) = chain.locate(&*surface, scope) else {
        return StepReport::Missed(miss);
    };
    match surface.click(target) {
        Ok(()) => {
            blocker_debug!("Clicked {:?} for {:?}", target, success);
            success
        }
        Err(err) => {
            blocker_warn!("Click on {:?} failed: {}", target, err);
            StepReport::Missed(miss)
        }
    }
}

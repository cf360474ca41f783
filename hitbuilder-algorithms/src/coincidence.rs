//! Per-event correction, addback and suppression passes.
//!
//! The event builder runs them in a fixed order when an event closes:
//!
//! 1. cross-talk correction (if enabled)
//! 2. suppression
//! 3. addback
//!
//! Suppression therefore judges single-channel energies, and only hits that
//! survive it are summed.
//!
//! Each pass preserves the insertion order of the hits it keeps.
#![allow(clippy::cast_precision_loss)]

use hitbuilder_core::{ChannelAddress, ChannelMap, DetectorHit};

/// Stores cross-talk corrected energies in the hits' transients.
///
/// Hits on channels missing from `channels` keep their energy.
pub fn correct_cross_talk(hits: &mut [DetectorHit], channels: &ChannelMap) {
    for hit in hits {
        if let Some(info) = channels.get(hit.channel()) {
            hit.transients_mut().corrected_energy = Some(hit.raw_energy() * info.cross_talk_factor);
        }
    }
}

struct AddbackGroup {
    hit: DetectorHit,
    members: Vec<ChannelAddress>,
}

/// Sums neighbouring hits that fall within `window` of each other.
///
/// Hits are taken in order. A hit joins the first group that holds a
/// neighbouring address and whose earliest timestamp is within `window`;
/// otherwise it starts a new group. Hits without an address are passed
/// through unmerged. The result never has more hits than the input.
pub fn addback<F>(hits: Vec<DetectorHit>, window: u64, are_neighbours: F) -> Vec<DetectorHit>
where
    F: Fn(ChannelAddress, ChannelAddress) -> bool,
{
    let mut groups: Vec<AddbackGroup> = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(address) = hit.address() else {
            groups.push(AddbackGroup {
                hit,
                members: Vec::new(),
            });
            continue;
        };

        let target = groups.iter_mut().find(|g| {
            g.hit.address().is_some()
                && g.hit.timestamp().abs_diff(hit.timestamp()) <= window
                && g.members.iter().any(|&m| are_neighbours(m, address))
        });

        match target {
            Some(group) => {
                group.hit.absorb(&hit);
                group.members.push(address);
            }
            None => groups.push(AddbackGroup {
                hit,
                members: vec![address],
            }),
        }
    }

    groups.into_iter().map(|g| g.hit).collect()
}

/// Drops low-energy hits that coincide with a veto on the same detector.
///
/// A hit is removed only when its energy is below `energy_threshold` and a
/// veto on its detector lies within `window`. Returns the kept hits and the
/// number removed.
pub fn suppress(
    hits: Vec<DetectorHit>,
    vetoes: &[DetectorHit],
    window: f64,
    energy_threshold: f64,
) -> (Vec<DetectorHit>, usize) {
    let before = hits.len();
    let kept: Vec<DetectorHit> = hits
        .into_iter()
        .filter(|hit| !(hit.energy() < energy_threshold && is_vetoed(hit, vetoes, window)))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

fn is_vetoed(hit: &DetectorHit, vetoes: &[DetectorHit], window: f64) -> bool {
    let Some(address) = hit.address() else {
        return false;
    };
    vetoes.iter().any(|veto| {
        veto.address()
            .is_some_and(|v| v.detector == address.detector)
            && (veto.timestamp().abs_diff(hit.timestamp()) as f64) <= window
    })
}

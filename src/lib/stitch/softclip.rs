//! Soft-clip redistribution.
//!
//! Where one mate has more terminal soft-clipped units than the other at its
//! leading or trailing edge, the excess clip units are walked outward over the
//! bins so that they line up with the other mate's operations instead of piling
//! up in a single prefix run. A clip unit laid over the other mate's aligned
//! base is later resolved in favour of that base by the site reconciler.

use noodles::sam::alignment::record::cigar::op::Kind;

use super::bins::BinArena;
use crate::errors::Result;

/// Outcome of offering a clip unit to a mate's empty mapped site.
enum Slot {
    /// The unit was placed
    Filled,
    /// A synthetic deletion was placed. It takes no read base, so the clip unit
    /// stays pending for the next site instead of being converted.
    Deletion,
    /// The walk stops here
    Stop,
}

fn offer_mapped(mapped: &mut [Option<Kind>; 2], mate: usize, allow_deletions: bool) -> Slot {
    let other = 1 - mate;
    match (mapped[mate], mapped[other]) {
        (None, Some(Kind::Deletion)) if allow_deletions => {
            mapped[mate] = Some(Kind::Deletion);
            Slot::Deletion
        }
        (None, Some(Kind::Deletion)) => Slot::Stop,
        (None, Some(_)) => {
            mapped[mate] = Some(Kind::SoftClip);
            Slot::Filled
        }
        _ => Slot::Stop,
    }
}

fn leading_clips(run: &[Kind]) -> usize {
    run.iter().take_while(|&&k| k == Kind::SoftClip).count()
}

fn trailing_clips(run: &[Kind]) -> usize {
    run.iter().rev().take_while(|&&k| k == Kind::SoftClip).count()
}

/// Redistributes excess terminal soft clips of both mates.
///
/// # Errors
///
/// Returns [`crate::errors::StitchError::CapacityExceeded`] if trailing clips run
/// past the last available bin.
pub fn redistribute(arena: &mut BinArena, allow_deletions: bool) -> Result<()> {
    for mate in 0..2 {
        redistribute_leading(arena, mate, allow_deletions);
        redistribute_trailing(arena, mate, allow_deletions)?;
    }
    Ok(())
}

fn redistribute_leading(arena: &mut BinArena, mate: usize, allow_deletions: bool) {
    let other = 1 - mate;
    let bins = arena.bins_mut();
    let Some(first) = bins.iter().position(|bin| bin.mapped[mate].is_some()) else {
        return;
    };

    let run = &bins[first].prefix[mate];
    let theirs = bins[first].prefix[other].len();
    if run.len() <= theirs {
        return;
    }
    let mut pending = leading_clips(run).min(run.len() - theirs);
    if pending == 0 {
        return;
    }
    bins[first].prefix[mate].drain(..pending);

    // Slot where leftover units land: the front of this bin's prefix run.
    let mut landing = first;
    for bin in (0..first).rev() {
        match offer_mapped(&mut bins[bin].mapped, mate, allow_deletions) {
            Slot::Filled => pending -= 1,
            Slot::Deletion => {}
            Slot::Stop => break,
        }
        landing = bin;
        if pending == 0 {
            break;
        }

        let theirs = bins[bin].prefix[other].len();
        let ours = bins[bin].prefix[mate].len();
        let top_up = theirs.saturating_sub(ours).min(pending);
        if top_up > 0 {
            bins[bin].prefix[mate].splice(0..0, std::iter::repeat_n(Kind::SoftClip, top_up));
            pending -= top_up;
        }
        if pending == 0 {
            break;
        }
    }

    if pending > 0 {
        bins[landing].prefix[mate].splice(0..0, std::iter::repeat_n(Kind::SoftClip, pending));
    }
}

fn redistribute_trailing(arena: &mut BinArena, mate: usize, allow_deletions: bool) -> Result<()> {
    let other = 1 - mate;
    let Some(last) = arena.bins().iter().rposition(|bin| bin.mapped[mate].is_some()) else {
        return Ok(());
    };
    let tail = last + 1;
    if tail >= arena.len() {
        return Ok(());
    }

    let bins = arena.bins_mut();
    let run = &bins[tail].prefix[mate];
    let theirs = bins[tail].prefix[other].len();
    if run.len() <= theirs {
        return Ok(());
    }
    let mut pending = trailing_clips(run).min(run.len() - theirs);
    if pending == 0 {
        return Ok(());
    }
    let keep = run.len() - pending;
    bins[tail].prefix[mate].truncate(keep);

    let mut bin = tail;
    loop {
        if bin >= arena.len() {
            arena.claim(bin)?.prefix[mate].extend(std::iter::repeat_n(Kind::SoftClip, pending));
            return Ok(());
        }

        let bins = arena.bins_mut();
        match offer_mapped(&mut bins[bin].mapped, mate, allow_deletions) {
            Slot::Filled => pending -= 1,
            Slot::Deletion => {}
            Slot::Stop => {
                bins[bin].prefix[mate].extend(std::iter::repeat_n(Kind::SoftClip, pending));
                return Ok(());
            }
        }
        if pending == 0 {
            return Ok(());
        }

        bin += 1;
        if let Some(next) = bins.get_mut(bin) {
            let top_up = next.prefix[other].len().saturating_sub(next.prefix[mate].len()).min(pending);
            next.prefix[mate].extend(std::iter::repeat_n(Kind::SoftClip, top_up));
            pending -= top_up;
            if pending == 0 {
                return Ok(());
            }
        }
    }
}

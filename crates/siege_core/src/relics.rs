//! Relic offers.
//!
//! Clearing a wave opens an offer of up to [`RELIC_OFFER_SIZE`] relics the
//! run does not own yet. The player takes one with a `ChooseRelic` event or
//! spends a reroll to replace the whole offer.

use tracing::{debug, info};

use crate::data::{self, RELICS};
use crate::events::RejectReason;
use crate::state::{GameState, RelicOffer};

/// Relics per offer.
pub const RELIC_OFFER_SIZE: usize = 3;

/// Draw up to [`RELIC_OFFER_SIZE`] unowned relics without replacement.
///
/// Candidates are taken in table order and each draw removes its pick, so
/// the result depends only on the owned set and the RNG.
pub fn roll_relic_options(state: &mut GameState) -> Vec<String> {
    let mut pool: Vec<&'static str> = RELICS
        .iter()
        .map(|relic| relic.id)
        .filter(|id| !state.relics.iter().any(|owned| owned == id))
        .collect();
    let mut options = Vec::with_capacity(RELIC_OFFER_SIZE);
    while options.len() < RELIC_OFFER_SIZE && !pool.is_empty() {
        let index = state.rng.next_index(pool.len());
        options.push(pool.remove(index).to_string());
    }
    options
}

/// Open an offer for the cleared `wave`. Any unanswered offer is replaced.
/// Returns the options, or `None` when every relic is owned.
pub fn open_relic_offer(state: &mut GameState, wave: u32) -> Option<Vec<String>> {
    let options = roll_relic_options(state);
    if options.is_empty() {
        state.relic_offer = None;
        return None;
    }
    debug!(tick = state.tick, wave, ?options, "Relic offer opened");
    state.relic_offer = Some(RelicOffer {
        wave,
        options: options.clone(),
    });
    Some(options)
}

/// Take option `option_index` from the open offer and close it.
///
/// # Errors
///
/// Returns the [`RejectReason`] when no offer is open or the index is out
/// of range. The state is untouched in that case.
pub fn choose_relic(state: &mut GameState, option_index: u8) -> Result<String, RejectReason> {
    let offer = state.relic_offer.as_ref().ok_or(RejectReason::NoRelicOffer)?;
    let id = offer
        .options
        .get(usize::from(option_index))
        .ok_or(RejectReason::OptionOutOfRange)?
        .clone();
    let relic = data::relic(&id).ok_or(RejectReason::OptionOutOfRange)?;
    state.relic_offer = None;
    state.collect_relic(relic);
    info!(tick = state.tick, relic = relic.id, "Relic collected");
    Ok(id)
}

/// Replace the open offer with a fresh roll, spending one reroll.
///
/// # Errors
///
/// Returns the [`RejectReason`] when no offer is open or no rerolls are
/// left.
pub fn reroll_relics(state: &mut GameState) -> Result<Vec<String>, RejectReason> {
    let wave = state
        .relic_offer
        .as_ref()
        .map(|offer| offer.wave)
        .ok_or(RejectReason::NoRelicOffer)?;
    if state.relic_rerolls_remaining == 0 {
        return Err(RejectReason::NoRerollsLeft);
    }
    state.relic_rerolls_remaining -= 1;
    let options = roll_relic_options(state);
    state.relic_offer = Some(RelicOffer {
        wave,
        options: options.clone(),
    });
    Ok(options)
}

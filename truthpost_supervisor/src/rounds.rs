//! Round creation and round index lookups.

use tracing::{debug, warn};
use truthpost_core::{
    round_id, total_to_be_raised, Amount, DisputeId, PerRuling, Round, RulingOption, RULING_SLOTS,
};

use crate::adapter::{EntityStore, StoreError, StoreExt};
use crate::error::MapperError;
use crate::reads::ReadModel;
use crate::supervisor::Ctx;

/// Highest round index stored for a dispute, found by checking `{dispute}-0`,
/// `{dispute}-1`, ... until the first gap. `None` when no round exists.
///
/// Handlers use `Dispute::round_count`; this is the counter-free view of the
/// same numbering and must always agree with it.
pub fn scan_last_round_index<S: EntityStore + ?Sized>(
    store: &S,
    dispute: DisputeId,
) -> Result<Option<u32>, StoreError> {
    let mut next = 0u32;
    while store.exists::<Round>(&round_id(dispute, next))? {
        next += 1;
    }
    Ok(next.checked_sub(1))
}

/// Ruling leading the dispute on the arbitrable; out-of-range codes count as tied.
pub(crate) fn leading_ruling(
    reads: &dyn ReadModel,
    arbitrable: &str,
    dispute: DisputeId,
) -> Result<RulingOption, MapperError> {
    let code = reads.last_round_winner(arbitrable, dispute)?;
    Ok(RulingOption::from_code(code).unwrap_or_else(|| {
        warn!(dispute, code, "leading ruling out of range, treating as tied");
        RulingOption::Tied
    }))
}

/// Crowdfunding target per ruling option at the current fee and multipliers.
pub(crate) fn appeal_totals(
    reads: &dyn ReadModel,
    arbitrable: &str,
    dispute: DisputeId,
    leading: RulingOption,
) -> Result<PerRuling<Amount>, MapperError> {
    let fee = reads.appeal_fee(arbitrable, dispute)?;
    let costs = reads.stake_multipliers(arbitrable)?.appeal_costs(fee)?;
    Ok(total_to_be_raised(leading, costs))
}

/// End of the appeal window of every non-tied ruling option.
pub(crate) fn appeal_deadlines(
    reads: &dyn ReadModel,
    arbitrable: &str,
    dispute: DisputeId,
) -> Result<PerRuling<u64>, MapperError> {
    let mut deadlines = [0; RULING_SLOTS];
    for option in RulingOption::ALL {
        if option.is_tied() {
            continue;
        }
        deadlines[option.index()] = reads.appeal_period(arbitrable, dispute, option)?.end;
    }
    Ok(deadlines)
}

/// Open round `index` of a dispute and store it.
///
/// The caller bumps `Dispute::round_count` in the same event.
pub(crate) fn create_round(
    cx: &mut Ctx<'_>,
    dispute: DisputeId,
    index: u32,
    jury_size: u64,
    arbitrable: &str,
) -> Result<Round, MapperError> {
    let mut round = Round::new(dispute, index, jury_size);

    let leading = leading_ruling(cx.reads, arbitrable, dispute)?;
    round.total_to_be_raised = appeal_totals(cx.reads, arbitrable, dispute, leading)?;

    // before a ruling exists there is no meaningful appeal window
    if !leading.is_tied() {
        round.appeal_deadline = appeal_deadlines(cx.reads, arbitrable, dispute)?;
    }

    cx.store.upsert(&round)?;
    debug!(dispute, round = index, jury_size, ?leading, "round opened");
    Ok(round)
}

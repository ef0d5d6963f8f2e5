use crate::error::ValidationError;

/// Splits a total iteration count across channels as evenly as possible.
///
/// Every channel receives `total / channels` iterations; the remainder is
/// handed out one-by-one to the odd-numbered positions (1, 3, 5, ...) so the
/// extra load interleaves across agents instead of piling up at one end.
/// When the remainder exceeds the odd positions, the spill fills the
/// untouched positions starting from the last channel and moving backward.
/// Channel ordering matters to callers - it decides which agent carries the
/// extra work - so the placement is fixed, not merely "any fair split".
///
/// Pure and deterministic; safe to call from any thread.
///
/// # Errors
///
/// Returns [`ValidationError::ZeroChannels`] when `channel_count` is zero.
pub fn even_load(total_iterations: u64, channel_count: usize) -> Result<Vec<u64>, ValidationError> {
    if channel_count == 0 {
        return Err(ValidationError::ZeroChannels);
    }
    let channels = u64::try_from(channel_count).unwrap_or(u64::MAX);
    let base = total_iterations.checked_div(channels).unwrap_or(0);
    let mut surplus = total_iterations.checked_rem(channels).unwrap_or(0);

    let mut shares = vec![base; channel_count];
    for (index, share) in shares.iter_mut().enumerate() {
        if surplus == 0 {
            break;
        }
        if index.checked_rem(2) == Some(1) {
            *share = share.saturating_add(1);
            surplus = surplus.saturating_sub(1);
        }
    }
    for (index, share) in shares.iter_mut().enumerate().rev() {
        if surplus == 0 {
            break;
        }
        if index.checked_rem(2) == Some(1) {
            continue;
        }
        *share = share.saturating_add(1);
        surplus = surplus.saturating_sub(1);
    }

    Ok(shares)
}

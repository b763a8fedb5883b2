/// Human-readable time remaining for a chunked upload.
///
/// Linear extrapolation from the time spent on `current` of `total` chunks.
pub fn estimate_remaining(elapsed_ms: u64, current: usize, total: usize) -> String {
    if total > 0 && current >= total {
        return "done".to_string();
    }
    // An unknown total has nothing to extrapolate towards.
    if total == 0 || current == 0 || elapsed_ms == 0 {
        return "calculating...".to_string();
    }

    let remaining_chunks = total.saturating_sub(current) as u128;
    let remaining_ms = u128::from(elapsed_ms) * remaining_chunks / current as u128;
    let secs = remaining_ms.div_ceil(1000);
    if secs < 60 {
        format!("~{secs}s remaining")
    } else {
        format!("~{}m {}s remaining", secs / 60, secs % 60)
    }
}

//! Run-length segmentation
//!
//! Two views of the same idea: lengths of maximal `true` runs in a flag
//! sequence, and the maximal contiguous runs within a sorted index list.

/// Lengths of all maximal runs of `true`, in order of occurrence.
///
/// Returns `[0]` when the input is empty or contains no `true`, so that taking
/// the maximum of the result always yields a length.
///
/// ```
/// use ifeel::runs::run_lengths;
///
/// let flags = [0, 1, 0, 0, 1, 1, 1, 0, 0, 1, 0, 1, 1].map(|v| v == 1);
/// assert_eq!(run_lengths(flags), vec![1, 3, 1, 2]);
/// ```
pub fn run_lengths<I>(flags: I) -> Vec<usize>
where
    I: IntoIterator<Item = bool>,
{
    let mut lengths = Vec::new();
    let mut current = 0usize;

    for flag in flags {
        if flag {
            current += 1;
        } else if current > 0 {
            lengths.push(current);
            current = 0;
        }
    }
    if current > 0 {
        lengths.push(current);
    }

    if lengths.is_empty() {
        lengths.push(0);
    }
    lengths
}

/// Longest `true` run; 0 when there is none.
pub fn longest_run<I>(flags: I) -> usize
where
    I: IntoIterator<Item = bool>,
{
    run_lengths(flags).into_iter().max().unwrap_or(0)
}

/// Split a sorted index list into maximal contiguous runs.
///
/// A new run starts wherever the gap to the previous index is not exactly 1.
pub fn segment_runs(indices: &[usize]) -> Vec<&[usize]> {
    let mut runs = Vec::new();
    let mut start = 0usize;

    for i in 1..indices.len() {
        if indices[i].checked_sub(indices[i - 1]) != Some(1) {
            runs.push(&indices[start..i]);
            start = i;
        }
    }
    if start < indices.len() {
        runs.push(&indices[start..]);
    }
    runs
}

use std::ops::Range;

use tracing::warn;

use crate::store::TimeSeries;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    pub center: usize,
    pub members: Range<usize>,
}

/// Build one window per keyed element of `keys`.
///
/// Members of the window around `i` are the neighbours reachable from `i`
/// without crossing an element that is missing its key or lies further than
/// `width / 2` from `keys[i]`. Non-decreasing runs take a linear two-pointer
/// sweep; any other run is expanded outward from each center.
pub fn sliding_windows(keys: &[Option<f64>], width: f64) -> Vec<Window> {
    let half = width / 2.0;
    let keyed = |i: usize| keys[i].filter(|v| v.is_finite());

    let mut out = Vec::with_capacity(keys.len());
    let mut start = 0;
    while start < keys.len() {
        if keyed(start).is_none() {
            start += 1;
            continue;
        }
        let mut end = start;
        while end < keys.len() && keyed(end).is_some() {
            end += 1;
        }

        let run: Vec<f64> = (start..end).filter_map(keyed).collect();
        let spans = if run.windows(2).all(|w| w[0] <= w[1]) {
            sweep(&run, half)
        } else {
            expand(&run, half)
        };
        out.extend(spans.into_iter().enumerate().map(|(i, span)| Window {
            center: start + i,
            members: start + span.start..start + span.end,
        }));
        start = end;
    }
    out
}

fn sweep(run: &[f64], half: f64) -> Vec<Range<usize>> {
    let mut spans = Vec::with_capacity(run.len());
    let mut left = 0;
    let mut right = 0;
    for (i, &center) in run.iter().enumerate() {
        right = right.max(i);
        while left < i && (center - run[left]).abs() > half {
            left += 1;
        }
        while right + 1 < run.len() && (run[right + 1] - center).abs() <= half {
            right += 1;
        }
        spans.push(left..right + 1);
    }
    spans
}

fn expand(run: &[f64], half: f64) -> Vec<Range<usize>> {
    run.iter()
        .enumerate()
        .map(|(i, &center)| {
            let mut left = i;
            while left > 0 && (center - run[left - 1]).abs() <= half {
                left -= 1;
            }
            let mut right = i + 1;
            while right < run.len() && (run[right] - center).abs() <= half {
                right += 1;
            }
            left..right
        })
        .collect()
}

pub fn windows_by_field(series: &TimeSeries, field: &str, width: f64) -> Vec<Window> {
    let keys: Vec<Option<f64>> = series.records().map(|r| r.get_f64(field)).collect();
    let missing = keys.iter().filter(|k| k.is_none()).count();
    if missing > 0 {
        warn!(
            "{} record(s) without {} field in sliding window calculation. Skipping.",
            missing, field
        );
    }
    sliding_windows(&keys, width)
}

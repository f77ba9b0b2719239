//! Partitioning sort with a configuration value threaded through comparisons.
//!
//! The comparator receives an extra `config` argument on every call, so one
//! comparison function can be parameterised, for example by the list of key
//! columns rows are ordered on.
//!
//! Segments are handled as follows:
//!
//! - fewer than 4 elements: pairwise exchange
//! - already non-decreasing: left alone after one linear scan
//! - a sorted prefix followed by a single element: binary search plus one
//!   block shift
//! - otherwise partitioned around a pivot (`<= pivot` left, `> pivot` right);
//!   above 18 elements the pivot comes from a sorted sample of 3 to 31 values
//!
//! Pending segments live on an explicit stack of at most 128 entries. When it
//! is full the remaining segments are sorted by direct recursion.

use std::cmp::Ordering;

/// Maximum depth of the explicit segment stack.
pub const STACK_DEPTH: usize = 128;

/// Segments shorter than this are sorted by pairwise exchange.
const SMALL_SEGMENT: usize = 4;

/// Segments longer than this choose their pivot from a sample.
const SAMPLE_THRESHOLD: usize = 18;

/// Sort `items` with a comparator that also receives `config`.
pub fn sort_by_config<T, C, F>(items: &mut [T], config: &C, mut compare: F)
where
    T: Clone,
    C: ?Sized,
    F: FnMut(&T, &T, &C) -> Ordering,
{
    sort_segments(items, config, &mut compare, STACK_DEPTH);
}

/// Sort `items` with a plain comparator.
pub fn sort_by<T, F>(items: &mut [T], mut compare: F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    sort_by_config(items, &(), |a, b, _| compare(a, b));
}

fn sort_segments<T, C, F>(items: &mut [T], config: &C, compare: &mut F, depth: usize)
where
    T: Clone,
    C: ?Sized,
    F: FnMut(&T, &T, &C) -> Ordering,
{
    let mut stack: Vec<(usize, usize)> = Vec::with_capacity(depth);
    stack.push((0, items.len()));

    while let Some((base, count)) = stack.pop() {
        let segment = &mut items[base..base + count];
        let Some(split) = partition(segment, config, compare) else {
            continue;
        };
        if stack.len() + 2 > depth {
            let (left, right) = segment.split_at_mut(split);
            sort_segments(left, config, compare, depth);
            sort_segments(right, config, compare, depth);
        } else {
            stack.push((base, split));
            stack.push((base + split, count - split));
        }
    }
}

/// Order one segment as far as a single pass allows.
///
/// Returns the split point when the segment was partitioned and both halves
/// still need sorting, or `None` when the segment is already in order.
fn partition<T, C, F>(segment: &mut [T], config: &C, compare: &mut F) -> Option<usize>
where
    T: Clone,
    C: ?Sized,
    F: FnMut(&T, &T, &C) -> Ordering,
{
    let count = segment.len();
    if count < 2 {
        return None;
    }
    let top = count - 1;
    if count < SMALL_SEGMENT {
        for low in 0..top {
            for high in (low + 1..=top).rev() {
                if compare(&segment[low], &segment[high], config) == Ordering::Greater {
                    segment.swap(low, high);
                }
            }
        }
        return None;
    }

    // Length of the sorted prefix; `last_sorted` ends it.
    let mut last_sorted = 0;
    while last_sorted < top
        && compare(&segment[last_sorted], &segment[last_sorted + 1], config) != Ordering::Greater
    {
        last_sorted += 1;
    }
    if last_sorted == top {
        return None;
    }
    let first_out = last_sorted + 1;

    if first_out == top {
        let (sorted, tail) = segment.split_at(top);
        let value = &tail[0];
        let position =
            sorted.partition_point(|probe| compare(probe, value, config) != Ordering::Greater);
        segment[position..].rotate_right(1);
        return None;
    }

    let mut start = 0;
    let pivot = if count > SAMPLE_THRESHOLD {
        let samples = sample_size(count);
        let midpoint = last_sorted >> 1;
        if last_sorted >= samples
            && compare(&segment[midpoint], &segment[last_sorted], config) == Ordering::Less
        {
            segment[midpoint].clone()
        } else {
            let pivot = sample_pivot(segment, first_out, samples, config, compare);
            if compare(&segment[last_sorted], &pivot, config) != Ordering::Greater {
                start = last_sorted + 2;
            }
            pivot
        }
    } else {
        segment[first_out].clone()
    };

    let mut low = start;
    let mut high = top;
    while low < high {
        while low < high && compare(&segment[low], &pivot, config) != Ordering::Greater {
            low += 1;
        }
        if low >= high {
            break;
        }
        while low < high && compare(&segment[high], &pivot, config) == Ordering::Greater {
            high -= 1;
        }
        if low >= high {
            break;
        }
        segment.swap(low, high);
        low += 1;
        high -= 1;
    }
    if low == high && compare(&segment[low], &pivot, config) != Ordering::Greater {
        low += 1;
    }
    Some(low)
}

/// Pick a pivot from a sorted sample, never the largest sampled value unless
/// every sample is equal.
///
/// The first sample is the first out-of-order value, which is smaller than
/// its predecessor, so the segment always holds something above the pivot.
fn sample_pivot<T, C, F>(
    segment: &[T],
    first_out: usize,
    samples: usize,
    config: &C,
    compare: &mut F,
) -> T
where
    T: Clone,
    C: ?Sized,
    F: FnMut(&T, &T, &C) -> Ordering,
{
    let stride = segment.len() / samples;
    let mut sample = Vec::with_capacity(samples);
    sample.push(segment[first_out].clone());
    let mut index = segment.len() - 1;
    for _ in 1..samples {
        sample.push(segment[index].clone());
        index = index.saturating_sub(stride);
    }
    sort_segments(&mut sample, config, compare, STACK_DEPTH);

    let last = samples - 1;
    let mut chosen = samples >> 1;
    while chosen > 0 && compare(&sample[chosen], &sample[last], config) == Ordering::Equal {
        chosen -= 1;
    }
    sample.swap_remove(chosen)
}

fn sample_size(count: usize) -> usize {
    match count {
        0..=63 => 3,
        64..=255 => 5,
        256..=1023 => 7,
        1024..=4095 => 11,
        4096..=65535 => 19,
        _ => 31,
    }
}

/// Reorder `items` so that position `i` receives the element previously at
/// `order[i]`. `order` must be a permutation of `0..items.len()`.
pub fn apply_permutation<T>(items: &mut [T], mut order: Vec<usize>) {
    for start in 0..items.len() {
        let mut current = start;
        loop {
            let source = order[current];
            order[current] = current;
            if source == start || source == current {
                break;
            }
            items.swap(current, source);
            current = source;
        }
    }
}

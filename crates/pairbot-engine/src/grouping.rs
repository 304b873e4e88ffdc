//! Partitioning candidates into pairs and at most one triple.

use rand::seq::SliceRandom;

/// Split `items` into consecutive groups: all pairs when the count is even,
/// one leading triple followed by pairs when it is odd.
///
/// Fewer than two items yields no groups.
pub fn partition<T>(items: Vec<T>) -> Vec<Vec<T>> {
    if items.len() < 2 {
        return Vec::new();
    }
    let mut groups = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    let first = if iter.len() % 2 == 1 { 3 } else { 2 };
    groups.push(iter.by_ref().take(first).collect());
    loop {
        let pair: Vec<T> = iter.by_ref().take(2).collect();
        if pair.is_empty() {
            break;
        }
        groups.push(pair);
    }
    groups
}

/// Shuffle uniformly with a fresh thread-local RNG, then [`partition`].
pub fn shuffle_and_partition<T>(mut items: Vec<T>) -> Vec<Vec<T>> {
    items.shuffle(&mut rand::thread_rng());
    partition(items)
}

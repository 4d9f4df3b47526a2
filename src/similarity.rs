//! Character sequence similarity used for fuzzy synonym matching.
//!
//! Implements the Ratcliff/Obershelp "gestalt" ratio: find the longest common
//! block, recurse on both sides of it, and score `2 * matched / total_len`.

/// Similarity of `a` and `b` in `[0, 1]`, computed over Unicode scalar values.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matched_len(&a, &b) as f64 / total as f64
}

/// Total length of all matching blocks between `a` and `b`.
fn matched_len(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest block `a[i..i+k] == b[j..j+k]` inside the given windows.
///
/// Among equally long blocks the one starting earliest in `a` wins, then the
/// one starting earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    // run[j] = length of the common suffix ending at a[i - 1], b[blo + j - 1]
    let mut prev = vec![0usize; width + 1];
    let mut run = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            run[slot] = if a[i] == b[j] { prev[slot - 1] + 1 } else { 0 };
            let k = run[slot];
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        std::mem::swap(&mut prev, &mut run);
    }

    best
}

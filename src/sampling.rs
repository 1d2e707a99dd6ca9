//! Selection of representative items from large per-lane result sets.
//!
//! Charts of expression levels show a fixed number of genes chosen from the top genes of every
//! lane. Two selectors are provided: a deterministic round-robin over the lanes and a randomised
//! selection seeded from the lane identifiers, so repeated requests give identical charts.

use clap::ValueEnum;
use hashbrown::HashSet;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Number of genes shown in expression level charts.
pub const EXPRESSION_TARGET: usize = 100;

/// Number of data points above which expression profiles are thinned out.
pub const PROFILE_SAMPLING_THRESHOLD: usize = 4000;

/// Candidates of one lane, best first
#[derive(Clone, Debug, PartialEq)]
pub struct LaneCandidates {
    pub lane: String,
    pub items: Vec<String>,
}

impl LaneCandidates {
    pub fn new(lane: impl Into<String>, items: Vec<String>) -> Self {
        LaneCandidates {
            lane: lane.into(),
            items,
        }
    }
}

/// Strategy for choosing items across lanes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Selector {
    /// Pick lanes in turn
    RoundRobin,
    /// Pick lanes at random, seeded from the lane identifiers
    #[default]
    Random,
}

impl Selector {
    /// Select up to `target` distinct items.
    pub fn select(self, lanes: Vec<LaneCandidates>, target: usize) -> Vec<String> {
        match self {
            Selector::RoundRobin => round_robin_select(lanes, target),
            Selector::Random => random_select(lanes, target),
        }
    }
}

/// Stable 64-bit FNV-1a hash of a sequence of keys.
fn fnv1a<'a, I: IntoIterator<Item = &'a str>>(keys: I) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for key in keys {
        // Separator so that ["ab", "c"] and ["a", "bc"] differ.
        for byte in key.bytes().chain(std::iter::once(0)) {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(PRIME);
        }
    }
    hash
}

/// Return a random number generator seeded from the sorted keys.
///
/// The same set of keys always gives the same sequence, whatever order they are passed in.
pub fn seeded_rng<'a, I: IntoIterator<Item = &'a str>>(keys: I) -> ChaCha8Rng {
    let mut keys: Vec<&str> = keys.into_iter().collect();
    keys.sort_unstable();
    ChaCha8Rng::seed_from_u64(fnv1a(keys))
}

/// Select up to `target` distinct items, taking each lane's next best item in turn.
///
/// Each lane gets `target` turns; lanes that run out of items are skipped.
pub fn round_robin_select(lanes: Vec<LaneCandidates>, target: usize) -> Vec<String> {
    let mut lists: Vec<VecDeque<String>> = lanes
        .into_iter()
        .map(|lane| lane.items.into_iter().collect())
        .collect();
    let mut turns: VecDeque<usize> = (0..target)
        .flat_map(|_| 0..lists.len())
        .collect();
    let mut seen = HashSet::new();
    let mut selected = vec![];
    while selected.len() < target {
        let Some(lane) = turns.pop_front() else {
            break;
        };
        if let Some(item) = lists[lane].pop_front() {
            if seen.insert(item.clone()) {
                selected.push(item);
            }
        }
    }
    selected
}

/// Select up to `target` distinct items, taking the next best item of a randomly chosen lane.
///
/// The random number generator is seeded from the lane identifiers. Lanes leave the draw once
/// they run out of items, so at most the total number of candidates is examined.
pub fn random_select(mut lanes: Vec<LaneCandidates>, target: usize) -> Vec<String> {
    let mut rng = seeded_rng(lanes.iter().map(|lane| lane.lane.as_str()));
    lanes.sort_by(|a, b| a.lane.cmp(&b.lane));
    let mut lists: Vec<VecDeque<String>> = lanes
        .into_iter()
        .map(|lane| lane.items.into_iter().collect())
        .filter(|items: &VecDeque<String>| !items.is_empty())
        .collect();
    let mut seen = HashSet::new();
    let mut selected = vec![];
    while selected.len() < target && !lists.is_empty() {
        let lane = rng.gen_range(0..lists.len());
        if let Some(item) = lists[lane].pop_front() {
            if seen.insert(item.clone()) {
                selected.push(item);
            }
        }
        if lists[lane].is_empty() {
            lists.remove(lane);
        }
    }
    selected
}

/// Thin out groups of points sharing the same value.
///
/// Each group of `n > 1` points is replaced by a random sample of `floor(n / ln n)` points.
/// Groups are visited in the order given.
pub fn log_sample<T: Clone, R: Rng>(groups: Vec<Vec<T>>, rng: &mut R) -> Vec<Vec<T>> {
    groups
        .into_iter()
        .map(|group| {
            let n = group.len();
            if n <= 1 {
                return group;
            }
            let size = (n as f64 / (n as f64).ln()).floor() as usize;
            group.choose_multiple(rng, size).cloned().collect()
        })
        .collect()
}

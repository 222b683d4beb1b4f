//! Selection, recombination and mutation on slot-assignment genomes.

use rand::seq::SliceRandom;
use rand::Rng;
use types::{CrossoverKind, SelectionKind, SlotRef};

/// Picks `fitness.len()` parent indices according to `kind`.
pub fn select<R: Rng>(fitness: &[f64], kind: SelectionKind, rng: &mut R) -> Vec<usize> {
    let n = fitness.len();
    if n == 0 {
        return Vec::new();
    }
    match kind {
        SelectionKind::Roulette => roulette(fitness, n, rng),
        SelectionKind::StochasticUniversal => stochastic_universal(fitness, n, rng),
        SelectionKind::Rank { pressure } => {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
            let weights = linear_ranking(n, pressure);
            roulette(&weights, n, rng)
                .into_iter()
                .map(|rank| order[rank])
                .collect()
        }
    }
}

fn roulette<R: Rng>(weights: &[f64], draws: usize, rng: &mut R) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    (0..draws)
        .map(|_| {
            let mut r = rng.gen::<f64>() * total;
            for (i, w) in weights.iter().enumerate() {
                if r < *w {
                    return i;
                }
                r -= w;
            }
            weights
                .iter()
                .rposition(|w| *w > 0.0)
                .unwrap_or(weights.len() - 1)
        })
        .collect()
}

fn stochastic_universal<R: Rng>(weights: &[f64], draws: usize, rng: &mut R) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    let step = total / draws as f64;
    let start = rng.gen::<f64>() * step;

    let mut out = Vec::with_capacity(draws);
    let mut i = 0;
    let mut cumulative = weights[0];
    for k in 0..draws {
        let pointer = start + k as f64 * step;
        while pointer >= cumulative && i + 1 < weights.len() {
            i += 1;
            cumulative += weights[i];
        }
        out.push(i);
    }
    out
}

/// Selection probabilities by rank (0 = best) for linear ranking with
/// selective pressure in `[1, 2]`.
pub fn linear_ranking(n: usize, pressure: f64) -> Vec<f64> {
    let sp = if pressure.is_nan() {
        1.0
    } else {
        pressure.clamp(1.0, 2.0)
    };
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| (sp - (2.0 * sp - 2.0) * i as f64 / (n - 1) as f64) / n as f64)
        .collect()
}

pub fn crossover<R: Rng>(
    a: &[SlotRef],
    b: &[SlotRef],
    kind: CrossoverKind,
    rng: &mut R,
) -> (Vec<SlotRef>, Vec<SlotRef>) {
    let mut c1 = a.to_vec();
    let mut c2 = b.to_vec();
    match kind {
        CrossoverKind::OnePoint => {
            if a.len() >= 2 {
                let cut = rng.gen_range(1..a.len());
                c1[cut..].copy_from_slice(&b[cut..]);
                c2[cut..].copy_from_slice(&a[cut..]);
            }
        }
        CrossoverKind::Uniform => {
            for i in 0..a.len() {
                if rng.gen_bool(0.5) {
                    c1[i] = b[i];
                    c2[i] = a[i];
                }
            }
        }
    }
    (c1, c2)
}

/// `p` clamped to `[0, 1]`; NaN counts as 0.
fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Per-gene mutation probability such that a genome of `genes` genes is
/// mutated somewhere with probability `target`.
pub fn mutation_probability(target: f64, genes: usize) -> f64 {
    if genes == 0 {
        return 0.0;
    }
    let target = probability(target);
    1.0 - (1.0 - target).powf(1.0 / genes as f64)
}

/// Moves each gene with probability `p` to a different slot of its domain.
/// Returns the number of genes changed.
pub fn mutate<R: Rng>(
    genes: &mut [SlotRef],
    domains: &[Vec<SlotRef>],
    p: f64,
    rng: &mut R,
) -> usize {
    let p = probability(p);
    let mut changed = 0;
    for (gene, domain) in genes.iter_mut().zip(domains) {
        if domain.len() < 2 || !rng.gen_bool(p) {
            continue;
        }
        let current = *gene;
        let others: Vec<&SlotRef> = domain.iter().filter(|s| **s != current).collect();
        if let Some(&&slot) = others.choose(rng) {
            *gene = slot;
            changed += 1;
        }
    }
    changed
}

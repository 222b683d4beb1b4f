pub mod operators;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sched_core::scoring::fitness;
use sched_core::{ConflictIndex, PlanningError, Scheduler};
use tracing::{debug, info, instrument, warn};
use types::{ExamGroup, GaParams, PenaltyWeights, Plan, PlanEntry, PlannerConfig, SlotRef};

use operators::{crossover, mutate, mutation_probability, select};

/// Genetic search for a slot per exam group, restarted `runs` times.
pub struct GeneticScheduler {
    params: GaParams,
    weights: PenaltyWeights,
}

impl GeneticScheduler {
    pub fn new(params: GaParams, weights: PenaltyWeights) -> Self {
        Self { params, weights }
    }

    pub fn from_config(cfg: &PlannerConfig) -> Self {
        Self::new(cfg.ga.clone(), cfg.penalties.clone())
    }

    /// One full run from a fresh random population.
    pub fn run<R: Rng>(&self, index: &ConflictIndex, rng: &mut R) -> RunOutcome {
        let size = self.params.population.max(2);
        let pm = mutation_probability(self.params.target_mutation, index.len());

        let mut population: Vec<Candidate> = (0..size)
            .map(|_| Candidate::random(index, rng).evaluated(index, &self.weights))
            .collect();
        let mut best = fittest(&population).clone();
        let mut stale = 0usize;
        let mut generations = 0usize;

        while stale < self.params.no_improvement {
            let fit: Vec<f64> = population.iter().map(|c| c.fitness).collect();
            let mut pool = select(&fit, self.params.selection, rng);
            pool.shuffle(rng);

            let mut next: Vec<Candidate> = Vec::with_capacity(size);
            for pair in pool.chunks(2) {
                match *pair {
                    [a, b] => {
                        let (c1, c2) = crossover(
                            &population[a].genes,
                            &population[b].genes,
                            self.params.crossover,
                            rng,
                        );
                        next.push(Candidate::new(c1));
                        next.push(Candidate::new(c2));
                    }
                    [a] => next.push(Candidate::new(population[a].genes.clone())),
                    _ => {}
                }
            }
            for c in &mut next {
                mutate(&mut c.genes, &index.domains, pm, rng);
                c.evaluate(index, &self.weights);
            }
            population = next;
            generations += 1;

            let gen_best = fittest(&population);
            if gen_best.fitness > best.fitness {
                best = gen_best.clone();
                stale = 0;
            } else {
                stale += 1;
            }
        }

        RunOutcome { best, generations }
    }

    fn run_seeded(&self, index: &ConflictIndex, run: usize) -> RunOutcome {
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        rng.set_stream(run as u64);
        let out = self.run(index, &mut rng);
        debug!(
            run,
            generations = out.generations,
            penalty = out.best.penalty,
            "run finished"
        );
        out
    }

    /// Best plan over all runs, without the feasibility check.
    pub fn best_plan(&self, groups: &[ExamGroup]) -> (Plan, ConflictIndex) {
        let index = ConflictIndex::new(groups);
        let runs = self.params.runs.max(1);

        let outcomes: Vec<RunOutcome> = if self.params.parallel {
            (0..runs)
                .into_par_iter()
                .map(|run| self.run_seeded(&index, run))
                .collect()
        } else {
            (0..runs).map(|run| self.run_seeded(&index, run)).collect()
        };

        let mut chosen = 0;
        for (run, out) in outcomes.iter().enumerate() {
            if out.best.fitness > outcomes[chosen].best.fitness {
                chosen = run;
            }
        }
        let best = &outcomes[chosen];
        let plan = Plan {
            entries: index
                .codes
                .iter()
                .zip(&best.best.genes)
                .map(|(&group, &slot)| PlanEntry { group, slot })
                .collect(),
            penalty: best.best.penalty,
            fitness: best.best.fitness,
            run: chosen,
            generations: best.generations,
        };
        (plan, index)
    }
}

impl Scheduler for GeneticScheduler {
    #[instrument(skip_all, fields(groups = groups.len(), runs = self.params.runs))]
    fn schedule(&self, groups: &[ExamGroup]) -> Result<Plan, PlanningError> {
        let (plan, index) = self.best_plan(groups);
        let violations = index.hard_conflicts(&plan_genes(&plan));
        if !violations.is_empty() {
            warn!(
                violations = violations.len(),
                penalty = plan.penalty,
                "best plan still has hard conflicts"
            );
            return Err(PlanningError::NoValidPlan { violations });
        }
        info!(
            penalty = plan.penalty,
            fitness = plan.fitness,
            run = plan.run,
            generations = plan.generations,
            "plan found"
        );
        Ok(plan)
    }
}

fn plan_genes(plan: &Plan) -> Vec<SlotRef> {
    plan.entries.iter().map(|e| e.slot).collect()
}

#[derive(Clone, Debug)]
pub struct RunOutcome {
    pub best: Candidate,
    pub generations: usize,
}

#[derive(Clone, Debug)]
pub struct Candidate {
    pub genes: Vec<SlotRef>,
    pub penalty: f64,
    pub fitness: f64,
}

impl Candidate {
    fn new(genes: Vec<SlotRef>) -> Self {
        Self {
            genes,
            penalty: f64::INFINITY,
            fitness: 0.0,
        }
    }

    fn random<R: Rng>(index: &ConflictIndex, rng: &mut R) -> Self {
        let genes = index
            .domains
            .iter()
            .map(|d| d.choose(rng).copied().unwrap_or(SlotRef::new(0, 0)))
            .collect();
        Self::new(genes)
    }

    fn evaluate(&mut self, index: &ConflictIndex, weights: &PenaltyWeights) {
        self.penalty = index.penalty(&self.genes, weights);
        self.fitness = fitness(self.penalty);
    }

    fn evaluated(mut self, index: &ConflictIndex, weights: &PenaltyWeights) -> Self {
        self.evaluate(index, weights);
        self
    }
}

fn fittest(population: &[Candidate]) -> &Candidate {
    let mut best = &population[0];
    for c in &population[1..] {
        if c.fitness > best.fitness {
            best = c;
        }
    }
    best
}

use std::collections::HashMap;
use types::{ExamGroup, ExamGroupCode, HardConflict, PenaltyWeights, Plan, SlotRef};

/// Dense, index-based view of the placeable exam groups and their
/// conflicts, used for fast penalty evaluation.
#[derive(Clone, Debug)]
pub struct ConflictIndex {
    pub codes: Vec<ExamGroupCode>,
    pub domains: Vec<Vec<SlotRef>>,
    pub external: Vec<bool>,
    /// `edges[i]` lists `(j, students)`; every edge is stored in both directions.
    pub edges: Vec<Vec<(usize, u32)>>,
}

impl ConflictIndex {
    pub fn new(groups: &[ExamGroup]) -> Self {
        let placeable: Vec<&ExamGroup> = groups.iter().filter(|g| g.is_placeable()).collect();
        let pos: HashMap<ExamGroupCode, usize> = placeable
            .iter()
            .enumerate()
            .map(|(i, g)| (g.code, i))
            .collect();

        let edges = placeable
            .iter()
            .map(|g| {
                g.conflicts
                    .iter()
                    .filter(|c| c.students > 0)
                    .filter_map(|c| pos.get(&c.group).map(|&j| (j, c.students)))
                    .collect()
            })
            .collect();

        Self {
            codes: placeable.iter().map(|g| g.code).collect(),
            domains: placeable.iter().map(|g| g.allowed_slots.clone()).collect(),
            external: placeable.iter().map(|g| g.is_externally_managed()).collect(),
            edges,
        }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Weighted conflict penalty of an assignment (one slot per gene).
    pub fn penalty(&self, assignment: &[SlotRef], weights: &PenaltyWeights) -> f64 {
        let mut total = 0.0;
        for (i, edges) in self.edges.iter().enumerate() {
            for &(j, students) in edges {
                total += multiplier(assignment[i], assignment[j], weights) * students as f64;
            }
        }
        total / 2.0
    }

    /// Conflicting pairs placed on the same day in the same or neighbouring
    /// slots, where neither side is externally managed.
    pub fn hard_conflicts(&self, assignment: &[SlotRef]) -> Vec<HardConflict> {
        let mut out = Vec::new();
        for (i, edges) in self.edges.iter().enumerate() {
            for &(j, students) in edges {
                if j <= i || self.external[i] || self.external[j] {
                    continue;
                }
                if too_close(assignment[i], assignment[j]) {
                    out.push(HardConflict {
                        first: self.codes[i],
                        second: self.codes[j],
                        students,
                    });
                }
            }
        }
        out
    }

    /// Assignment in gene order taken from a plan; `None` when the plan
    /// misses a placeable group.
    pub fn assignment_of(&self, plan: &Plan) -> Option<Vec<SlotRef>> {
        let slots: HashMap<ExamGroupCode, SlotRef> =
            plan.entries.iter().map(|e| (e.group, e.slot)).collect();
        self.codes.iter().map(|c| slots.get(c).copied()).collect()
    }
}

pub fn too_close(a: SlotRef, b: SlotRef) -> bool {
    a.day == b.day && a.slot.abs_diff(b.slot) <= 1
}

pub fn multiplier(a: SlotRef, b: SlotRef, weights: &PenaltyWeights) -> f64 {
    if too_close(a, b) {
        weights.same_or_adjacent_slot
    } else if a.day == b.day {
        weights.same_day
    } else if a.day.abs_diff(b.day) == 1 {
        weights.adjacent_days
    } else {
        0.0
    }
}

pub fn fitness(penalty: f64) -> f64 {
    1.0 / (1.0 + penalty)
}

//! Student conflicts between exams and the grouping of exams that have to
//! share a slot.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};
use types::{
    Ancode, Exam, ExamGroup, ExamGroupCode, GroupConflict, GroupState, PlanEntry, SlotRef,
    StudentId,
};

use crate::calendar::Calendar;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnschedulableGroup {
    pub group: ExamGroupCode,
    pub exams: Vec<Ancode>,
}

impl fmt::Display for UnschedulableGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exams: Vec<String> = self.exams.iter().map(|a| a.to_string()).collect();
        write!(f, "group {} [{}]", self.group, exams.join(" "))
    }
}

#[derive(Clone, Debug, Default)]
pub struct Grouping {
    pub groups: Vec<ExamGroup>,
    pub unschedulable: Vec<UnschedulableGroup>,
    pub group_of: HashMap<Ancode, ExamGroupCode>,
}

/// Disjoint sets over exam indices.
struct Partition {
    parent: Vec<usize>,
}

impl Partition {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Number of students registered for both exams, keyed by `(lower, higher)`
/// ancode. Pairs without shared students are absent.
pub fn exam_conflicts(exams: &[Exam]) -> BTreeMap<(Ancode, Ancode), u32> {
    let mut by_student: HashMap<&StudentId, Vec<Ancode>> = HashMap::new();
    for e in exams {
        let unique: HashSet<&StudentId> = e.students().collect();
        for s in unique {
            by_student.entry(s).or_default().push(e.ancode);
        }
    }

    let mut conflicts: BTreeMap<(Ancode, Ancode), u32> = BTreeMap::new();
    for (_student, mut ancodes) in by_student {
        ancodes.sort_unstable();
        ancodes.dedup();
        for i in 0..ancodes.len() {
            for j in (i + 1)..ancodes.len() {
                *conflicts.entry((ancodes[i], ancodes[j])).or_default() += 1;
            }
        }
    }
    conflicts
}

/// Builds exam groups from same-slot links, their allowed slots and the
/// group-level conflict weights. Committed plan entries lock their group.
pub fn build_groups(exams: &[Exam], calendar: &Calendar<'_>, committed: &[PlanEntry]) -> Grouping {
    let index: HashMap<Ancode, usize> = exams
        .iter()
        .enumerate()
        .map(|(i, e)| (e.ancode, i))
        .collect();

    let mut partition = Partition::new(exams.len());
    for (i, e) in exams.iter().enumerate() {
        for other in &e.constraints.same_slot {
            match index.get(other) {
                Some(&j) => partition.union(i, j),
                None => warn!(
                    ancode = %e.ancode,
                    linked = %other,
                    "same-slot link to unknown exam ignored"
                ),
            }
        }
    }

    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for i in 0..exams.len() {
        let root = partition.find(i);
        members.entry(root).or_default().push(i);
    }

    let committed: HashMap<ExamGroupCode, SlotRef> =
        committed.iter().map(|c| (c.group, c.slot)).collect();

    let mut grouping = Grouping::default();
    for (_root, idxs) in members {
        let mut ancodes: Vec<Ancode> = idxs.iter().map(|&i| exams[i].ancode).collect();
        ancodes.sort_unstable();
        let code = ExamGroupCode(ancodes[0].0);

        let mut allowed: Option<Vec<SlotRef>> = None;
        for &i in &idxs {
            let own = calendar.allowed_slots(&exams[i]);
            allowed = Some(match allowed {
                None => own,
                Some(acc) => acc.into_iter().filter(|s| own.contains(s)).collect(),
            });
        }
        let mut allowed = allowed.unwrap_or_default();

        let external = idxs
            .iter()
            .all(|&i| exams[i].constraints.not_planned_by_me);
        let state = match (external, committed.get(&code)) {
            (true, Some(&slot)) => GroupState::ExternallyManaged { slot: Some(slot) },
            (true, None) => GroupState::ExternallyManaged {
                slot: (allowed.len() == 1).then(|| allowed[0]),
            },
            (false, Some(&slot)) => GroupState::Locked { slot },
            (false, None) => GroupState::Scheduled,
        };

        match state {
            GroupState::Locked { slot }
            | GroupState::ExternallyManaged {
                slot: Some(slot), ..
            } => {
                if !allowed.contains(&slot) {
                    warn!(group = %code, %slot, "committed slot violates exam constraints, keeping it");
                }
                allowed = vec![slot];
            }
            GroupState::ExternallyManaged { slot: None } => {
                debug!(group = %code, "externally managed group without a fixed slot");
            }
            GroupState::Scheduled => {
                if allowed.is_empty() {
                    grouping.unschedulable.push(UnschedulableGroup {
                        group: code,
                        exams: ancodes.clone(),
                    });
                }
            }
        }

        for a in &ancodes {
            grouping.group_of.insert(*a, code);
        }
        grouping.groups.push(ExamGroup {
            code,
            exams: ancodes,
            student_count: idxs.iter().map(|&i| exams[i].student_count() as u32).sum(),
            max_duration: idxs.iter().map(|&i| exams[i].duration).max().unwrap_or(0),
            allowed_slots: allowed,
            conflicts: Vec::new(),
            state,
        });
    }
    grouping.groups.sort_by_key(|g| g.code);

    let mut weights: BTreeMap<(ExamGroupCode, ExamGroupCode), u32> = BTreeMap::new();
    for ((a, b), n) in exam_conflicts(exams) {
        let (Some(&ga), Some(&gb)) = (grouping.group_of.get(&a), grouping.group_of.get(&b)) else {
            continue;
        };
        if ga == gb {
            continue;
        }
        *weights.entry((ga, gb)).or_default() += n;
        *weights.entry((gb, ga)).or_default() += n;
    }
    let position: HashMap<ExamGroupCode, usize> = grouping
        .groups
        .iter()
        .enumerate()
        .map(|(i, g)| (g.code, i))
        .collect();
    for ((from, to), students) in weights {
        if let Some(&i) = position.get(&from) {
            grouping.groups[i].conflicts.push(GroupConflict {
                group: to,
                students,
            });
        }
    }

    grouping
}

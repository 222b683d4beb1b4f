use std::collections::{HashMap, HashSet};
use types::{Exam, Nta, StudentId};

/// `ceil(base * (100 + delta) / 100)`
pub fn scaled_duration(base: u32, delta_percent: u32) -> u32 {
    let scaled = (base as u64 * (100 + delta_percent as u64)).div_ceil(100);
    scaled.min(u32::MAX as u64) as u32
}

/// Registrants of one exam in one slot, split by how they have to be seated.
#[derive(Clone, Debug)]
pub struct Demand<'a> {
    pub exam: &'a Exam,
    pub normal: Vec<StudentId>,
    /// Accommodated students sitting in a normal room, with their duration.
    pub extended: Vec<(StudentId, u32)>,
    /// Accommodated students needing a room of their own, with their duration.
    pub alone: Vec<(StudentId, u32)>,
    pub normal_total: usize,
}

impl<'a> Demand<'a> {
    pub fn new(exam: &'a Exam, ntas: &HashMap<&StudentId, &Nta>) -> Self {
        let mut seen: HashSet<&StudentId> = HashSet::new();
        let mut normal = Vec::new();
        let mut extended = Vec::new();
        let mut alone = Vec::new();

        for s in exam.students() {
            if !seen.insert(s) {
                continue;
            }
            match ntas.get(s) {
                Some(nta) if nta.needs_room_alone => alone.push((
                    s.clone(),
                    scaled_duration(exam.duration, nta.delta_duration_percent),
                )),
                Some(nta) if nta.delta_duration_percent > 0 => extended.push((
                    s.clone(),
                    scaled_duration(exam.duration, nta.delta_duration_percent),
                )),
                _ => normal.push(s.clone()),
            }
        }

        Self {
            exam,
            normal_total: normal.len(),
            normal,
            extended,
            alone,
        }
    }

    pub fn accommodated(&self) -> usize {
        self.extended.len() + self.alone.len()
    }

    /// Takes up to `n` normal students, first registered first.
    pub fn take_normal(&mut self, n: usize) -> Vec<StudentId> {
        let n = n.min(self.normal.len());
        self.normal.drain(..n).collect()
    }

    /// Drops students already seated elsewhere (pinned rooms).
    pub fn remove(&mut self, seated: &[StudentId]) {
        let seated: HashSet<&StudentId> = seated.iter().collect();
        self.normal.retain(|s| !seated.contains(s));
        self.extended.retain(|(s, _)| !seated.contains(s));
        self.alone.retain(|(s, _)| !seated.contains(s));
    }
}

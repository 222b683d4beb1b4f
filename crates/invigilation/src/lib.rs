//! Proctor assignment balanced against each invigilator's required minutes.

mod duties;

pub use duties::{duties, rooms_per_exam, Duty};

use chrono::NaiveDate;
use sched_core::Calendar;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{info, instrument, warn};
use types::{
    Ancode, BalanceReport, Exam, Invigilation, InvigilationParams, Invigilator,
    InvigilatorBalance, PlannedRoom, PlannerConfig, RoomName, SlotRef, StaffId,
};

/// Minutes an invigilator still owes: their `factor` share of all duty and
/// other-contribution minutes, minus what they already contribute elsewhere.
pub fn required_minutes(
    total_duty: u32,
    all_other: u32,
    all_factors: f64,
    inv: &Invigilator,
) -> u32 {
    if all_factors <= 0.0 {
        return 0;
    }
    let share = ((total_duty as f64 + all_other as f64) / all_factors * inv.factor).round();
    (share as i64 - inv.other_contributions as i64).max(0) as u32
}

/// An invigilator with config overrides folded in.
#[derive(Clone, Debug)]
struct Eligible {
    inv: Invigilator,
    excluded_days: HashSet<NaiveDate>,
    excluded_slots: HashSet<SlotRef>,
}

impl Eligible {
    fn available(&self, slot: SlotRef, date: Option<NaiveDate>) -> bool {
        !self.excluded_slots.contains(&slot)
            && date.map_or(true, |d| !self.excluded_days.contains(&d))
    }
}

pub struct InvigilationBalancer {
    pool: Vec<Eligible>,
    params: InvigilationParams,
}

impl InvigilationBalancer {
    /// Invigilators marked `excluded` in the config take no duties and are
    /// left out of the balance.
    pub fn new(invigilators: &[Invigilator], cfg: &PlannerConfig) -> Self {
        let mut pool: Vec<Eligible> = Vec::new();
        for inv in invigilators {
            let o = cfg.invigilator_overrides.get(&inv.id);
            if o.is_some_and(|o| o.excluded) {
                continue;
            }
            let mut excluded_days: HashSet<NaiveDate> = inv.excluded_days.iter().copied().collect();
            let mut excluded_slots: HashSet<SlotRef> = inv.excluded_slots.iter().copied().collect();
            if let Some(o) = o {
                excluded_days.extend(o.excluded_days.iter().copied());
                excluded_slots.extend(o.excluded_slots.iter().copied());
            }
            pool.push(Eligible {
                inv: inv.clone(),
                excluded_days,
                excluded_slots,
            });
        }
        pool.sort_by(|a, b| a.inv.id.cmp(&b.inv.id));

        for id in cfg.invigilator_overrides.keys() {
            if !invigilators.iter().any(|i| &i.id == id) {
                warn!(invigilator = %id, "override for unknown invigilator ignored");
            }
        }

        Self {
            pool,
            params: cfg.invigilation.clone(),
        }
    }

    /// Staffs every duty derived from `rooms`. `scheduled` holds all exams
    /// sitting in each slot, including those without a room: their examiners
    /// are never assigned elsewhere in that slot.
    #[instrument(skip_all, fields(rooms = rooms.len(), invigilators = self.pool.len()))]
    pub fn balance(
        &self,
        rooms: &[PlannedRoom],
        scheduled: &BTreeMap<SlotRef, Vec<&Exam>>,
        calendar: &Calendar<'_>,
    ) -> BalanceReport {
        let slots = duties(rooms, self.params.reserve_min_rooms);
        let examiner: HashMap<_, &StaffId> = scheduled
            .values()
            .flatten()
            .map(|e| (e.ancode, &e.main_examiner))
            .collect();
        let exam_rooms = rooms_per_exam(rooms);

        let total: u32 = slots.values().flatten().map(|d| d.duration).sum();
        let all_other: u32 = self.pool.iter().map(|e| e.inv.other_contributions).sum();
        let all_factors: f64 = self.pool.iter().map(|e| e.inv.factor).sum();
        let required: Vec<u32> = self
            .pool
            .iter()
            .map(|e| required_minutes(total, all_other, all_factors, &e.inv))
            .collect();
        let mut assigned: Vec<u32> = vec![0; self.pool.len()];

        let mut invigilations: Vec<Invigilation> = Vec::new();
        let mut unassigned = Vec::new();

        for (&slot, list) in &slots {
            let date = calendar.date_of(slot);
            let mut busy: HashSet<usize> = HashSet::new();

            // examiners with an exam of their own in this slot
            let own_exam: HashSet<&StaffId> = scheduled
                .get(&slot)
                .into_iter()
                .flatten()
                .map(|e| &e.main_examiner)
                .collect();

            let mut open: Vec<&Duty> = Vec::new();
            for duty in list {
                match self.self_invigilator(duty, &examiner, &exam_rooms, &busy, date) {
                    Some(i) => {
                        busy.insert(i);
                        assigned[i] += duty.duration;
                        invigilations.push(Invigilation {
                            slot,
                            room: duty.room.clone(),
                            invigilator: self.pool[i].inv.id.clone(),
                            duration: duty.duration,
                            self_invigilation: true,
                        });
                    }
                    None => open.push(duty),
                }
            }

            for duty in open {
                let pick = self
                    .pool
                    .iter()
                    .enumerate()
                    .filter(|(i, e)| {
                        !busy.contains(i)
                            && !own_exam.contains(&e.inv.id)
                            && e.available(slot, date)
                    })
                    .max_by(|(i, a), (j, b)| {
                        let di = required[*i] as i64 - assigned[*i] as i64;
                        let dj = required[*j] as i64 - assigned[*j] as i64;
                        di.cmp(&dj).then_with(|| b.inv.id.cmp(&a.inv.id))
                    })
                    .map(|(i, _)| i);

                match pick {
                    Some(i) => {
                        busy.insert(i);
                        assigned[i] += duty.duration;
                        invigilations.push(Invigilation {
                            slot,
                            room: duty.room.clone(),
                            invigilator: self.pool[i].inv.id.clone(),
                            duration: duty.duration,
                            self_invigilation: false,
                        });
                    }
                    None => {
                        warn!(%slot, room = ?duty.room, "no invigilator available");
                        unassigned.push((slot, duty.room.clone()));
                    }
                }
            }
        }

        let balances: Vec<InvigilatorBalance> = self
            .pool
            .iter()
            .enumerate()
            .map(|(i, e)| InvigilatorBalance {
                invigilator: e.inv.id.clone(),
                required: required[i],
                assigned: assigned[i],
                deviation: assigned[i] as i64 - required[i] as i64,
            })
            .collect();
        let max_deviation = balances.iter().map(|b| b.deviation).max().unwrap_or(0);
        let min_deviation = balances.iter().map(|b| b.deviation).min().unwrap_or(0);

        info!(
            duties = invigilations.len() + unassigned.len(),
            unassigned = unassigned.len(),
            max_deviation,
            min_deviation,
            "invigilation balanced"
        );

        BalanceReport {
            invigilations,
            balances,
            max_deviation,
            min_deviation,
            unassigned,
        }
    }

    /// The examiner of an exam held in exactly this one room proctors it
    /// when they are an available invigilator.
    fn self_invigilator(
        &self,
        duty: &Duty,
        examiner: &HashMap<Ancode, &StaffId>,
        exam_rooms: &HashMap<(SlotRef, Ancode), BTreeSet<&RoomName>>,
        busy: &HashSet<usize>,
        date: Option<NaiveDate>,
    ) -> Option<usize> {
        duty.room.as_ref()?;
        duty.exams.iter().find_map(|ancode| {
            let single = exam_rooms
                .get(&(duty.slot, *ancode))
                .is_some_and(|rs| rs.len() == 1);
            if !single {
                return None;
            }
            let id = examiner.get(ancode)?;
            let i = self.pool.iter().position(|e| &e.inv.id == *id)?;
            (!busy.contains(&i) && self.pool[i].available(duty.slot, date)).then_some(i)
        })
    }
}

pub mod calendar;
pub mod conflicts;
pub mod scoring;

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::{debug, info};

pub use calendar::Calendar;
pub use conflicts::{build_groups, exam_conflicts, Grouping, UnschedulableGroup};
pub use scoring::ConflictIndex;
pub use types::{
    Ancode, Exam, ExamGroup, ExamGroupCode, GroupState, HardConflict, Plan, PlanEntry,
    PlannedRoom, PlannerConfig, PlanningInput, Room, SelectionKind, SlotRef,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid input: {0}")]
    Msg(String),
}

#[derive(Debug, Error)]
pub enum PlanningError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{} exam group(s) have no allowed slot: {}", .groups.len(), describe(.groups))]
    Unschedulable { groups: Vec<UnschedulableGroup> },
    #[error("room inventory is empty")]
    MissingRooms,
    #[error("no valid plan found: {} hard conflict(s) remain", .violations.len())]
    NoValidPlan { violations: Vec<HardConflict> },
}

fn describe(groups: &[UnschedulableGroup]) -> String {
    groups
        .iter()
        .map(|g| g.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn validate(input: &PlanningInput) -> Result<(), ValidationError> {
    use std::collections::HashSet;

    let mut errors: Vec<String> = Vec::new();

    if input.calendar.slots.is_empty() {
        errors.push("calendar has no slots".into());
    }

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name}: {s}"));
            }
        }
    }
    chk_unique(
        "slot",
        input.calendar.slots.iter().map(|s| s.slot_ref()),
        &mut errors,
    );
    chk_unique("ancode", input.exams.iter().map(|e| e.ancode), &mut errors);
    chk_unique("room", input.rooms.iter().map(|r| &r.name), &mut errors);
    chk_unique(
        "invigilator",
        input.invigilators.iter().map(|i| &i.id),
        &mut errors,
    );

    let slots: HashSet<SlotRef> = input.calendar.slots.iter().map(|s| s.slot_ref()).collect();
    for s in &input.calendar.slots {
        if s.day == 0 || s.slot == 0 {
            errors.push(format!("slot {} is not 1-based", s.slot_ref()));
        }
    }
    for g in &input.calendar.go_slots {
        if !slots.contains(g) {
            errors.push(format!("GO slot {g} is not part of the calendar"));
        }
    }

    let ancodes: HashSet<Ancode> = input.exams.iter().map(|e| e.ancode).collect();
    for e in &input.exams {
        if e.duration == 0 {
            errors.push(format!("exam {} has duration 0", e.ancode));
        }
        for linked in e.constraints.same_slot.iter().filter(|a| !ancodes.contains(a)) {
            errors.push(format!(
                "exam {} has a same-slot link to unknown exam {linked}",
                e.ancode
            ));
        }
    }
    for r in &input.rooms {
        if r.seats == 0 {
            errors.push(format!("room {} has no seats", r.name));
        }
    }
    for i in &input.invigilators {
        if !i.factor.is_finite() || i.factor < 0.0 {
            errors.push(format!("invigilator {} has invalid factor {}", i.id, i.factor));
        }
    }

    for c in &input.committed {
        if !slots.contains(&c.slot) {
            errors.push(format!(
                "committed group {} references unknown slot {}",
                c.group, c.slot
            ));
        }
    }
    for p in &input.pinned_rooms {
        if !slots.contains(&p.slot) {
            errors.push(format!(
                "pinned room {} for exam {} references unknown slot {}",
                p.room, p.ancode, p.slot
            ));
        }
        if !ancodes.contains(&p.ancode) {
            errors.push(format!(
                "pinned room {} references unknown exam {}",
                p.room, p.ancode
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Search parameters the genetic operators cannot work with.
pub fn validate_config(cfg: &PlannerConfig) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();
    let ga = &cfg.ga;
    if !(0.0..=1.0).contains(&ga.target_mutation) {
        errors.push(format!(
            "target mutation {} is not a probability",
            ga.target_mutation
        ));
    }
    if let SelectionKind::Rank { pressure } = ga.selection {
        if !pressure.is_finite() {
            errors.push(format!("rank selection pressure {pressure} is not finite"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

/// Exams that need a physical room: planned here and not online.
pub fn needs_room(exam: &Exam) -> bool {
    !exam.constraints.not_planned_by_me && !exam.constraints.rooms.online
}

/// Every exam of a planned group, online and externally managed ones
/// included, keyed by the slot its group was planned into.
pub fn scheduled_exams<'e>(
    plan: &Plan,
    groups: &[ExamGroup],
    exams: &'e [Exam],
) -> BTreeMap<SlotRef, Vec<&'e Exam>> {
    let by_code: HashMap<Ancode, &Exam> = exams.iter().map(|e| (e.ancode, e)).collect();
    let mut out: BTreeMap<SlotRef, Vec<&Exam>> = BTreeMap::new();
    for g in groups {
        let Some(slot) = plan.slot_of(g.code) else {
            continue;
        };
        for a in &g.exams {
            if let Some(&e) = by_code.get(a) {
                out.entry(slot).or_default().push(e);
            }
        }
    }
    for list in out.values_mut() {
        list.sort_by_key(|e| e.ancode);
    }
    out
}

/// Runs every check that has to pass before optimization starts and
/// returns the exam groups to schedule.
pub fn prepare(input: &PlanningInput, cfg: &PlannerConfig) -> Result<Vec<ExamGroup>, PlanningError> {
    validate(input)?;
    validate_config(cfg)?;

    if input.rooms.is_empty() && input.exams.iter().any(needs_room) {
        return Err(PlanningError::MissingRooms);
    }

    let calendar = Calendar::new(&input.calendar, cfg.go_slots_exclusive);
    let grouping = build_groups(&input.exams, &calendar, &input.committed);
    if !grouping.unschedulable.is_empty() {
        return Err(PlanningError::Unschedulable {
            groups: grouping.unschedulable,
        });
    }
    debug!(groups = grouping.groups.len(), "exam groups built");
    info!(
        "prepared {} exams in {} groups over {} slots",
        input.exams.len(),
        grouping.groups.len(),
        input.calendar.slots.len()
    );
    Ok(grouping.groups)
}

/// Places exam groups into slots.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, groups: &[ExamGroup]) -> Result<Plan, PlanningError>;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};
    use types::{
        Ancode, Exam, ExamConstraints, Registrations, Slot, SlotCalendar, StaffId, StudentId,
    };

    pub fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, day)
            .and_then(|d| d.and_hms_opt(hour, 30, 0))
            .unwrap()
    }

    /// `days` x `per_day` slots, day n on July n, slot k at 8:30 + 2h(k-1).
    pub fn calendar(days: u32, per_day: u32) -> SlotCalendar {
        let mut slots = Vec::new();
        for d in 1..=days {
            for s in 1..=per_day {
                slots.push(Slot {
                    day: d,
                    slot: s,
                    starts_at: at(d, 8 + 2 * (s - 1)),
                });
            }
        }
        SlotCalendar {
            slots,
            go_slots: vec![],
        }
    }

    pub fn exam(ancode: u32, students: &[&str]) -> Exam {
        Exam {
            ancode: Ancode(ancode),
            module: format!("module {ancode}"),
            main_examiner: StaffId::from("examiner"),
            duration: 90,
            category: Default::default(),
            registrations: vec![Registrations {
                program: "IF".into(),
                students: students.iter().map(|s| StudentId::from(*s)).collect(),
            }],
            constraints: ExamConstraints::default(),
        }
    }
}

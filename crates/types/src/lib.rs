use chrono::{NaiveDate, NaiveDateTime};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(StaffId);
id_newtype!(StudentId);
id_newtype!(RoomName);

macro_rules! code_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            Serialize,
            Deserialize,
            JsonSchema,
            Eq,
            PartialEq,
            Hash,
            Ord,
            PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
code_newtype!(Ancode);
code_newtype!(ExamGroupCode);

/// Name used for the placeholder room handed out when no real room fits.
pub const PLACEHOLDER_ROOM: &str = "No Room";

/// A (day, slot) pair. Both numbers are 1-based.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash, Ord, PartialOrd,
)]
pub struct SlotRef {
    pub day: u32,
    pub slot: u32,
}

impl SlotRef {
    pub fn new(day: u32, slot: u32) -> Self {
        Self { day, slot }
    }

    /// The slot directly after this one on the same day.
    pub fn next_on_day(self) -> Self {
        Self {
            day: self.day,
            slot: self.slot + 1,
        }
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.day, self.slot)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub day: u32,
    pub slot: u32,
    pub starts_at: NaiveDateTime,
}

impl Slot {
    pub fn slot_ref(&self) -> SlotRef {
        SlotRef::new(self.day, self.slot)
    }

    pub fn date(&self) -> NaiveDate {
        self.starts_at.date()
    }
}

/// The ordered slots of one exam period plus the subset reserved for GO exams.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotCalendar {
    pub slots: Vec<Slot>,
    #[serde(default)]
    pub go_slots: Vec<SlotRef>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Default, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExamCategory {
    #[default]
    Regular,
    Go,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Registrations {
    pub program: String,
    #[serde(default)]
    pub students: Vec<StudentId>,
}

/// Capabilities an exam requires of the rooms it is placed in.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequirements {
    #[serde(default)]
    pub lab: bool,
    #[serde(default)]
    pub restricted_software: bool,
    #[serde(default)]
    pub sockets: bool,
    #[serde(default)]
    pub online: bool,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamConstraints {
    #[serde(default)]
    pub not_planned_by_me: bool,
    #[serde(default)]
    pub exclude_days: Vec<NaiveDate>,
    #[serde(default)]
    pub possible_days: Vec<NaiveDate>,
    #[serde(default)]
    pub fixed_day: Option<NaiveDate>,
    #[serde(default)]
    pub fixed_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub same_slot: Vec<Ancode>,
    #[serde(default)]
    pub rooms: RoomRequirements,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub ancode: Ancode,
    #[serde(default)]
    pub module: String,
    pub main_examiner: StaffId,
    pub duration: u32,
    #[serde(default)]
    pub category: ExamCategory,
    #[serde(default)]
    pub registrations: Vec<Registrations>,
    #[serde(default)]
    pub constraints: ExamConstraints,
}

impl Exam {
    /// All registered students across programs, in registration order.
    pub fn students(&self) -> impl Iterator<Item = &StudentId> {
        self.registrations.iter().flat_map(|r| r.students.iter())
    }

    pub fn student_count(&self) -> usize {
        self.registrations.iter().map(|r| r.students.len()).sum()
    }
}

/// Accommodation record for one student, applied to all of their exams.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Nta {
    pub student: StudentId,
    #[serde(default)]
    pub delta_duration_percent: u32,
    #[serde(default)]
    pub needs_room_alone: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub name: RoomName,
    pub seats: u32,
    #[serde(default)]
    pub lab: bool,
    #[serde(default)]
    pub restricted_software: bool,
    #[serde(default)]
    pub sockets: bool,
    #[serde(default)]
    pub accessible: bool,
}

impl Room {
    pub fn is_special(&self) -> bool {
        self.lab || self.restricted_software || self.accessible
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRoom {
    pub slot: SlotRef,
    pub room: RoomName,
    pub ancode: Ancode,
    pub duration: u32,
    #[serde(default)]
    pub students: Vec<StudentId>,
    #[serde(default)]
    pub nta: bool,
    #[serde(default)]
    pub reserve: bool,
}

impl PlannedRoom {
    pub fn is_placeholder(&self) -> bool {
        self.room.0 == PLACEHOLDER_ROOM
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invigilator {
    pub id: StaffId,
    #[serde(default = "one")]
    pub factor: f64,
    #[serde(default)]
    pub other_contributions: u32,
    #[serde(default)]
    pub excluded_days: Vec<NaiveDate>,
    #[serde(default)]
    pub excluded_slots: Vec<SlotRef>,
}

fn one() -> f64 {
    1.0
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq, Hash)]
pub struct PlanEntry {
    pub group: ExamGroupCode,
    pub slot: SlotRef,
}

/// Scheduling state of an exam group.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GroupState {
    /// Placed by the optimizer.
    Scheduled,
    /// Committed by an earlier run; keeps its slot.
    Locked { slot: SlotRef },
    /// Planned by someone else; only counted for conflicts.
    ExternallyManaged { slot: Option<SlotRef> },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
pub struct GroupConflict {
    pub group: ExamGroupCode,
    pub students: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamGroup {
    pub code: ExamGroupCode,
    pub exams: Vec<Ancode>,
    pub student_count: u32,
    pub max_duration: u32,
    pub allowed_slots: Vec<SlotRef>,
    pub conflicts: Vec<GroupConflict>,
    pub state: GroupState,
}

impl ExamGroup {
    pub fn is_externally_managed(&self) -> bool {
        matches!(self.state, GroupState::ExternallyManaged { .. })
    }

    /// Whether the optimizer has to place this group at all.
    pub fn is_placeable(&self) -> bool {
        match self.state {
            GroupState::ExternallyManaged { slot } => slot.is_some(),
            _ => true,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardConflict {
    pub first: ExamGroupCode,
    pub second: ExamGroupCode,
    pub students: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
    pub penalty: f64,
    pub fitness: f64,
    pub run: usize,
    pub generations: usize,
}

impl Plan {
    pub fn slot_of(&self, group: ExamGroupCode) -> Option<SlotRef> {
        self.entries
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.slot)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomShortfall {
    pub slot: SlotRef,
    pub ancode: Ancode,
    pub students: u32,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct RoomPlan {
    pub rooms: Vec<PlannedRoom>,
    pub shortfalls: Vec<RoomShortfall>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Invigilation {
    pub slot: SlotRef,
    /// `None` for a reserve invigilation.
    pub room: Option<RoomName>,
    pub invigilator: StaffId,
    pub duration: u32,
    #[serde(default)]
    pub self_invigilation: bool,
}

impl Invigilation {
    pub fn is_reserve(&self) -> bool {
        self.room.is_none()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvigilatorBalance {
    pub invigilator: StaffId,
    pub required: u32,
    pub assigned: u32,
    pub deviation: i64,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub invigilations: Vec<Invigilation>,
    pub balances: Vec<InvigilatorBalance>,
    pub max_deviation: i64,
    pub min_deviation: i64,
    /// Duties no eligible invigilator could take.
    #[serde(default)]
    pub unassigned: Vec<(SlotRef, Option<RoomName>)>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanningInput {
    pub calendar: SlotCalendar,
    pub exams: Vec<Exam>,
    #[serde(default)]
    pub ntas: Vec<Nta>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub invigilators: Vec<Invigilator>,
    #[serde(default)]
    pub committed: Vec<PlanEntry>,
    #[serde(default)]
    pub pinned_rooms: Vec<PlannedRoom>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanningOutcome {
    pub groups: Vec<ExamGroup>,
    pub plan: Plan,
    pub rooms: RoomPlan,
    pub invigilation: BalanceReport,
}

// ---------------------------------------------------------------------------
// Configuration

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionKind {
    Roulette,
    StochasticUniversal,
    Rank { pressure: f64 },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    OnePoint,
    Uniform,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct GaParams {
    pub population: usize,
    pub runs: usize,
    pub no_improvement: usize,
    /// Probability that a plan is mutated at all; spread over its genes.
    pub target_mutation: f64,
    pub selection: SelectionKind,
    pub crossover: CrossoverKind,
    pub seed: u64,
    pub parallel: bool,
}

impl Default for GaParams {
    fn default() -> Self {
        Self {
            population: 100,
            runs: 100,
            no_improvement: 100,
            target_mutation: 0.9,
            selection: SelectionKind::Rank { pressure: 1.5 },
            crossover: CrossoverKind::Uniform,
            seed: 0,
            parallel: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PenaltyWeights {
    pub same_or_adjacent_slot: f64,
    pub same_day: f64,
    pub adjacent_days: f64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            same_or_adjacent_slot: 100.0,
            same_day: 10.0,
            adjacent_days: 1.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomParams {
    pub small_residual: u32,
    pub long_duration_threshold: u32,
    /// 0 disables reserve rooms.
    pub reserve_min_students: u32,
}

impl Default for RoomParams {
    fn default() -> Self {
        Self {
            small_residual: 10,
            long_duration_threshold: 100,
            reserve_min_students: 0,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomOverride {
    pub seats: Option<u32>,
    pub unavailable_slots: Vec<SlotRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct InvigilationParams {
    /// Slots with at least this many invigilated rooms get a reserve; 0 disables.
    pub reserve_min_rooms: usize,
}

impl Default for InvigilationParams {
    fn default() -> Self {
        Self {
            reserve_min_rooms: 1,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct InvigilatorOverride {
    pub excluded: bool,
    pub excluded_days: Vec<NaiveDate>,
    pub excluded_slots: Vec<SlotRef>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerConfig {
    pub ga: GaParams,
    pub penalties: PenaltyWeights,
    pub go_slots_exclusive: bool,
    pub rooms: RoomParams,
    pub room_overrides: HashMap<RoomName, RoomOverride>,
    pub invigilation: InvigilationParams,
    pub invigilator_overrides: HashMap<StaffId, InvigilatorOverride>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let cfg: PlannerConfig =
            serde_json::from_str(r#"{"ga":{"runs":3},"rooms":{"smallResidual":5}}"#).unwrap();
        assert_eq!(cfg.ga.runs, 3);
        assert_eq!(cfg.ga.population, 100);
        assert_eq!(cfg.rooms.small_residual, 5);
        assert_eq!(cfg.rooms.long_duration_threshold, 100);
        assert_eq!(cfg.penalties, PenaltyWeights::default());
    }

    #[test]
    fn selection_kind_is_tagged() {
        let s: SelectionKind =
            serde_json::from_str(r#"{"kind":"rank","pressure":1.8}"#).unwrap();
        assert_eq!(s, SelectionKind::Rank { pressure: 1.8 });
    }

    #[test]
    fn group_state_placeability() {
        let mut g = ExamGroup {
            code: ExamGroupCode(1),
            exams: vec![Ancode(1)],
            student_count: 0,
            max_duration: 90,
            allowed_slots: vec![],
            conflicts: vec![],
            state: GroupState::ExternallyManaged { slot: None },
        };
        assert!(!g.is_placeable());
        g.state = GroupState::ExternallyManaged {
            slot: Some(SlotRef::new(1, 1)),
        };
        assert!(g.is_placeable());
        assert!(g.is_externally_managed());
    }

    #[test]
    fn invigilator_factor_defaults_to_one() {
        let inv: Invigilator = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(inv.factor, 1.0);
        assert_eq!(inv.id, StaffId::from("abc"));
    }
}

//! Slot-by-slot room allocation for a finished plan.
//!
//! Rooms are handed out per slot in chronological order. Long accommodated
//! sittings make their room unusable for the following slot of the same day,
//! so the allocator carries that state from one slot to the next.

mod demand;
mod pool;

pub use demand::{scaled_duration, Demand};
pub use pool::{satisfies, Needs};

use pool::SlotPool;
use sched_core::{needs_room, scheduled_exams};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, error, info, instrument, warn};
use types::{
    Ancode, Exam, ExamGroup, Nta, Plan, PlannedRoom, PlannerConfig, Room, RoomName, RoomParams,
    RoomPlan, RoomShortfall, SlotRef, StudentId, PLACEHOLDER_ROOM,
};

pub struct RoomAllocator {
    /// Seats descending, then name.
    rooms: Vec<Room>,
    unavailable: HashSet<(usize, SlotRef)>,
    params: RoomParams,
}

impl RoomAllocator {
    /// Applies the configured room overrides once, up front.
    pub fn new(rooms: &[Room], cfg: &PlannerConfig) -> Self {
        let mut rooms: Vec<Room> = rooms.to_vec();
        for r in &mut rooms {
            if let Some(seats) = cfg.room_overrides.get(&r.name).and_then(|o| o.seats) {
                r.seats = seats;
            }
        }
        rooms.sort_by(|a, b| b.seats.cmp(&a.seats).then_with(|| a.name.cmp(&b.name)));

        let mut unavailable = HashSet::new();
        for (name, o) in &cfg.room_overrides {
            match rooms.iter().position(|r| &r.name == name) {
                Some(idx) => unavailable.extend(o.unavailable_slots.iter().map(|&s| (idx, s))),
                None => warn!(room = %name, "override for unknown room ignored"),
            }
        }

        Self {
            rooms,
            unavailable,
            params: cfg.rooms.clone(),
        }
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Seats every registrant of every exam in `slots`. Exams that cannot be
    /// seated get the placeholder room and a shortfall entry; allocation
    /// always runs to the end.
    #[instrument(skip_all, fields(slots = slots.len(), rooms = self.rooms.len()))]
    pub fn allocate(
        &self,
        slots: &BTreeMap<SlotRef, Vec<&Exam>>,
        ntas: &[Nta],
        pinned: &[PlannedRoom],
    ) -> RoomPlan {
        let ntas: HashMap<&StudentId, &Nta> = ntas.iter().map(|n| (&n.student, n)).collect();
        let mut blocked: HashSet<(usize, SlotRef)> = HashSet::new();
        let mut plan = RoomPlan::default();

        for (&slot, exams) in slots {
            let pinned_here: Vec<&PlannedRoom> = pinned.iter().filter(|p| p.slot == slot).collect();
            self.allocate_slot(slot, exams, &ntas, &pinned_here, &mut blocked, &mut plan);
        }

        if plan.shortfalls.is_empty() {
            info!(planned = plan.rooms.len(), "rooms allocated");
        } else {
            warn!(
                planned = plan.rooms.len(),
                shortfalls = plan.shortfalls.len(),
                "rooms allocated with shortfalls"
            );
        }
        plan
    }

    fn allocate_slot(
        &self,
        slot: SlotRef,
        exams: &[&Exam],
        ntas: &HashMap<&StudentId, &Nta>,
        pinned: &[&PlannedRoom],
        blocked: &mut HashSet<(usize, SlotRef)>,
        plan: &mut RoomPlan,
    ) {
        let mut pool = SlotPool::new(&self.rooms, |i| {
            !self.unavailable.contains(&(i, slot)) && !blocked.contains(&(i, slot))
        });
        let mut demands: Vec<Demand> = exams.iter().map(|e| Demand::new(e, ntas)).collect();
        let mut out = SlotRooms {
            slot,
            plan,
            blocked,
            threshold: self.params.long_duration_threshold,
        };

        for p in pinned {
            let Some(d) = demands.iter_mut().find(|d| d.exam.ancode == p.ancode) else {
                warn!(%slot, ancode = %p.ancode, "pinned room for an exam not in this slot");
                continue;
            };
            let Some(idx) = pool.claim(&p.room) else {
                warn!(%slot, room = %p.room, "pinned room is unknown or unavailable");
                continue;
            };
            if p.reserve {
                pool.seal(idx);
                out.plan.rooms.push((*p).clone());
                continue;
            }
            let seats = pool.seats_left(idx) as usize;
            let students = if p.students.is_empty() && !p.nta {
                d.take_normal(seats)
            } else {
                if p.students.len() > seats {
                    warn!(
                        %slot,
                        room = %p.room,
                        pinned = p.students.len(),
                        seats,
                        "pinned room too small, remaining students are reseated"
                    );
                }
                let kept = &p.students[..p.students.len().min(seats)];
                d.remove(kept);
                kept.to_vec()
            };
            pool.occupy(idx, p.ancode, p.duration, students.len() as u32);
            out.seat(&pool, idx, p.ancode, p.duration, students, p.nta);
        }

        // largest remaining first
        while let Some(i) = demands
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.normal.is_empty())
            .max_by(|(_, a), (_, b)| {
                a.normal
                    .len()
                    .cmp(&b.normal.len())
                    .then(a.accommodated().cmp(&b.accommodated()))
                    .then(b.exam.ancode.cmp(&a.exam.ancode))
            })
            .map(|(i, _)| i)
        {
            let d = &mut demands[i];
            let (ancode, duration) = (d.exam.ancode, d.exam.duration);
            let needs = Needs::of(d.exam);
            let want = d.normal.len() as u32;

            let shared = if want < self.params.small_residual {
                pool.shareable(&needs, duration, want)
            } else {
                None
            };
            match shared.or_else(|| pool.fresh(&needs)) {
                Some(idx) => {
                    let n = pool.seats_left(idx).min(want);
                    let students = d.take_normal(n as usize);
                    pool.occupy(idx, ancode, duration, n);
                    out.seat(&pool, idx, ancode, duration, students, false);
                }
                None => {
                    let students = d.take_normal(want as usize);
                    out.shortfall(ancode, duration, students, "no compatible room left");
                }
            }
        }

        for d in &mut demands {
            let ancode = d.exam.ancode;
            let needs = Needs::of(d.exam);

            for (student, duration) in std::mem::take(&mut d.extended) {
                let room = pool
                    .with_space_for(ancode, &needs)
                    .or_else(|| pool.fresh_smallest(&needs));
                match room {
                    Some(idx) => {
                        pool.occupy(idx, ancode, duration, 1);
                        out.seat(&pool, idx, ancode, duration, vec![student], true);
                    }
                    None => out.shortfall(
                        ancode,
                        duration,
                        vec![student],
                        "no seat left for an extended-time student",
                    ),
                }
            }

            let alone_needs = needs.with_accessible();
            for (student, duration) in std::mem::take(&mut d.alone) {
                match pool.take_smallest(&alone_needs) {
                    Some(idx) => out.seat(&pool, idx, ancode, duration, vec![student], true),
                    None => out.shortfall(
                        ancode,
                        duration,
                        vec![student],
                        "no accessible room for a student sitting alone",
                    ),
                }
            }
        }

        if self.params.reserve_min_students > 0 {
            for d in &demands {
                if (d.normal_total as u32) < self.params.reserve_min_students {
                    continue;
                }
                match pool.take_smallest(&Needs::of(d.exam)) {
                    Some(idx) => out.plan.rooms.push(PlannedRoom {
                        slot,
                        room: pool.name(idx),
                        ancode: d.exam.ancode,
                        duration: d.exam.duration,
                        students: Vec::new(),
                        nta: false,
                        reserve: true,
                    }),
                    None => warn!(%slot, ancode = %d.exam.ancode, "no reserve room left"),
                }
            }
        }

        debug!(%slot, exams = exams.len(), "slot allocated");
    }
}

/// Output side of one slot's allocation.
struct SlotRooms<'p> {
    slot: SlotRef,
    plan: &'p mut RoomPlan,
    blocked: &'p mut HashSet<(usize, SlotRef)>,
    threshold: u32,
}

impl SlotRooms<'_> {
    fn seat(
        &mut self,
        pool: &SlotPool<'_>,
        idx: usize,
        ancode: Ancode,
        duration: u32,
        students: Vec<StudentId>,
        nta: bool,
    ) {
        if nta && duration > self.threshold {
            self.blocked.insert((idx, self.slot.next_on_day()));
        }
        push_merged(
            &mut self.plan.rooms,
            PlannedRoom {
                slot: self.slot,
                room: pool.name(idx),
                ancode,
                duration,
                students,
                nta,
                reserve: false,
            },
        );
    }

    fn shortfall(&mut self, ancode: Ancode, duration: u32, students: Vec<StudentId>, reason: &str) {
        error!(slot = %self.slot, %ancode, students = students.len(), reason, "room shortfall");
        self.plan.shortfalls.push(RoomShortfall {
            slot: self.slot,
            ancode,
            students: students.len() as u32,
            reason: reason.to_string(),
        });
        push_merged(
            &mut self.plan.rooms,
            PlannedRoom {
                slot: self.slot,
                room: RoomName::from(PLACEHOLDER_ROOM),
                ancode,
                duration,
                students,
                nta: false,
                reserve: false,
            },
        );
    }
}

/// Seats in a room already holding the same exam sitting are appended to it.
fn push_merged(rooms: &mut Vec<PlannedRoom>, entry: PlannedRoom) {
    let existing = rooms.iter_mut().find(|r| {
        r.slot == entry.slot
            && r.room == entry.room
            && r.ancode == entry.ancode
            && r.duration == entry.duration
            && r.nta == entry.nta
            && !r.reserve
    });
    match existing {
        Some(r) => r.students.extend(entry.students),
        None => rooms.push(entry),
    }
}

/// Exams needing a room, grouped by the slot their group was planned into.
pub fn exams_by_slot<'e>(
    plan: &Plan,
    groups: &[ExamGroup],
    exams: &'e [Exam],
) -> BTreeMap<SlotRef, Vec<&'e Exam>> {
    let mut out = scheduled_exams(plan, groups, exams);
    for list in out.values_mut() {
        list.retain(|e| needs_room(e));
    }
    out.retain(|_, list| !list.is_empty());
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use types::{
        ExamConstraints, ExamGroupCode, GroupState, PlanEntry, Registrations, RoomOverride,
        StaffId,
    };

    pub fn exam(ancode: u32, duration: u32, students: &[&str]) -> Exam {
        Exam {
            ancode: Ancode(ancode),
            module: format!("M{ancode}"),
            main_examiner: StaffId::from("examiner"),
            duration,
            category: Default::default(),
            registrations: vec![Registrations {
                program: "IF".into(),
                students: students.iter().map(|s| StudentId::from(*s)).collect(),
            }],
            constraints: ExamConstraints::default(),
        }
    }

    pub fn nta(student: &str, delta: u32, alone: bool) -> Nta {
        Nta {
            student: StudentId::from(student),
            delta_duration_percent: delta,
            needs_room_alone: alone,
        }
    }

    pub fn room(name: &str, seats: u32) -> Room {
        Room {
            name: RoomName::from(name),
            seats,
            lab: false,
            restricted_software: false,
            sockets: false,
            accessible: false,
        }
    }

    fn students(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn exam_n(ancode: u32, duration: u32, names: &[String]) -> Exam {
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        exam(ancode, duration, &refs)
    }

    fn one_slot<'e>(slot: SlotRef, exams: &[&'e Exam]) -> BTreeMap<SlotRef, Vec<&'e Exam>> {
        BTreeMap::from([(slot, exams.to_vec())])
    }

    fn in_room<'p>(plan: &'p RoomPlan, ancode: u32) -> Vec<&'p PlannedRoom> {
        plan.rooms
            .iter()
            .filter(|r| r.ancode == Ancode(ancode))
            .collect()
    }

    #[test]
    fn student_sitting_alone_gets_a_separate_smallest_room() {
        let mut a2 = room("A2", 2);
        a2.accessible = true;
        let rooms = vec![room("R10", 10), a2, {
            let mut big = room("A30", 30);
            big.accessible = true;
            big
        }];
        let names = students("s", 10);
        let e = exam_n(1, 90, &names);
        let ntas = vec![nta("s9", 50, true)];
        let slot = SlotRef::new(1, 1);

        let alloc = RoomAllocator::new(&rooms, &PlannerConfig::default());
        let plan = alloc.allocate(&one_slot(slot, &[&e]), &ntas, &[]);

        assert!(plan.shortfalls.is_empty());
        let normal = plan.rooms.iter().find(|r| !r.nta).unwrap();
        assert_eq!(normal.room, RoomName::from("R10"));
        assert_eq!(normal.students.len(), 9);
        assert_eq!(normal.duration, 90);
        let alone = plan.rooms.iter().find(|r| r.nta).unwrap();
        assert_eq!(alone.room, RoomName::from("A2"));
        assert_eq!(alone.students, vec![StudentId::from("s9")]);
        assert_eq!(alone.duration, 135);
    }

    #[test]
    fn exam_gets_the_first_compatible_room_by_seats() {
        let rooms = vec![room("R100", 100), room("R20", 20), room("R40", 40)];
        let e = exam_n(1, 90, &students("s", 30));
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(SlotRef::new(1, 1), &[&e]),
            &[],
            &[],
        );
        assert_eq!(plan.rooms.len(), 1);
        assert_eq!(plan.rooms[0].room, RoomName::from("R100"));
    }

    #[test]
    fn large_exam_is_split_largest_room_first() {
        let rooms = vec![room("R100", 100), room("R20", 20), room("R40", 40)];
        let e = exam_n(1, 90, &students("s", 130));
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(SlotRef::new(1, 1), &[&e]),
            &[],
            &[],
        );
        let names: Vec<&str> = plan.rooms.iter().map(|r| r.room.0.as_str()).collect();
        assert_eq!(names, vec!["R100", "R40"]);
        assert_eq!(plan.rooms[0].students.len(), 100);
        assert_eq!(plan.rooms[1].students.len(), 30);
    }

    #[test]
    fn small_residual_shares_a_room_of_equal_duration() {
        let rooms = vec![room("R30", 30), room("R20", 20)];
        let a = exam_n(1, 90, &students("a", 25));
        let b = exam_n(2, 90, &students("b", 4));
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(SlotRef::new(1, 1), &[&a, &b]),
            &[],
            &[],
        );
        assert_eq!(in_room(&plan, 1)[0].room, RoomName::from("R30"));
        assert_eq!(in_room(&plan, 2)[0].room, RoomName::from("R30"));

        let c = exam_n(3, 60, &students("c", 4));
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(SlotRef::new(1, 1), &[&a, &c]),
            &[],
            &[],
        );
        assert_eq!(in_room(&plan, 3)[0].room, RoomName::from("R20"));
    }

    #[test]
    fn special_rooms_are_never_filler() {
        let mut lab = room("LAB", 40);
        lab.lab = true;
        let plain = exam_n(1, 90, &students("p", 5));
        let mut needs_lab = exam_n(2, 90, &students("l", 5));
        needs_lab.constraints.rooms.lab = true;

        let alloc = RoomAllocator::new(&[lab], &PlannerConfig::default());
        let plan = alloc.allocate(
            &one_slot(SlotRef::new(1, 1), &[&plain, &needs_lab]),
            &[],
            &[],
        );
        assert_eq!(in_room(&plan, 2)[0].room, RoomName::from("LAB"));
        let placeholder = in_room(&plan, 1)[0];
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.students.len(), 5);
        assert_eq!(plan.shortfalls.len(), 1);
        assert_eq!(plan.shortfalls[0].ancode, Ancode(1));
        assert_eq!(plan.shortfalls[0].students, 5);
    }

    #[test]
    fn long_extended_sitting_blocks_the_next_slot() {
        let rooms = vec![room("R50", 50), room("R40", 40)];
        let first = exam_n(1, 90, &students("x", 30));
        let second = exam_n(2, 90, &students("y", 35));
        let ntas = vec![nta("x0", 50, false)];
        let slots = BTreeMap::from([
            (SlotRef::new(1, 1), vec![&first]),
            (SlotRef::new(1, 2), vec![&second]),
        ]);

        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(&slots, &ntas, &[]);

        let first_rooms = in_room(&plan, 1);
        assert_eq!(first_rooms.len(), 2);
        assert!(first_rooms.iter().all(|r| r.room == RoomName::from("R50")));
        let extended = first_rooms.iter().find(|r| r.nta).unwrap();
        assert_eq!(extended.duration, 135);
        assert_eq!(extended.students, vec![StudentId::from("x0")]);
        assert_eq!(in_room(&plan, 2)[0].room, RoomName::from("R40"));
    }

    #[test]
    fn short_extension_does_not_block() {
        let rooms = vec![room("R50", 50), room("R40", 40)];
        let first = exam_n(1, 60, &students("x", 30));
        let second = exam_n(2, 90, &students("y", 35));
        let ntas = vec![nta("x0", 50, false)];
        let slots = BTreeMap::from([
            (SlotRef::new(1, 1), vec![&first]),
            (SlotRef::new(1, 2), vec![&second]),
        ]);
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(&slots, &ntas, &[]);
        assert_eq!(in_room(&plan, 2)[0].room, RoomName::from("R50"));
    }

    #[test]
    fn pinned_rooms_are_applied_first() {
        let rooms = vec![room("R40", 40), room("R20", 20)];
        let e = exam(1, 90, &["s1", "s2", "s3", "s4", "s5"]);
        let slot = SlotRef::new(2, 1);
        let pinned = vec![PlannedRoom {
            slot,
            room: RoomName::from("R20"),
            ancode: Ancode(1),
            duration: 90,
            students: vec![StudentId::from("s1"), StudentId::from("s2")],
            nta: false,
            reserve: false,
        }];
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(slot, &[&e]),
            &[],
            &pinned,
        );
        assert_eq!(plan.rooms.len(), 1);
        assert_eq!(plan.rooms[0].room, RoomName::from("R20"));
        assert_eq!(plan.rooms[0].students.len(), 5);
        assert_eq!(&plan.rooms[0].students[..2], &pinned[0].students[..]);
    }

    #[test]
    fn pinned_room_without_students_is_filled() {
        let rooms = vec![room("R40", 40), room("R3", 3)];
        let e = exam(1, 90, &["s1", "s2", "s3", "s4", "s5"]);
        let slot = SlotRef::new(1, 1);
        let pinned = vec![PlannedRoom {
            slot,
            room: RoomName::from("R3"),
            ancode: Ancode(1),
            duration: 90,
            students: vec![],
            nta: false,
            reserve: false,
        }];
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(
            &one_slot(slot, &[&e]),
            &[],
            &pinned,
        );
        let r3 = plan.rooms.iter().find(|r| r.room == RoomName::from("R3")).unwrap();
        assert_eq!(r3.students.len(), 3);
        let r40 = plan.rooms.iter().find(|r| r.room == RoomName::from("R40")).unwrap();
        assert_eq!(r40.students.len(), 2);
    }

    #[test]
    fn overfull_pinned_room_is_capped_at_its_seats() {
        let rooms = vec![room("R40", 40), room("R10", 10)];
        let mut cfg = PlannerConfig::default();
        cfg.room_overrides.insert(
            RoomName::from("R10"),
            RoomOverride {
                seats: Some(3),
                unavailable_slots: vec![],
            },
        );
        let e = exam(1, 90, &["s1", "s2", "s3", "s4", "s5"]);
        let slot = SlotRef::new(1, 1);
        let pinned = vec![PlannedRoom {
            slot,
            room: RoomName::from("R10"),
            ancode: Ancode(1),
            duration: 90,
            students: e.students().cloned().collect(),
            nta: false,
            reserve: false,
        }];

        let plan = RoomAllocator::new(&rooms, &cfg).allocate(&one_slot(slot, &[&e]), &[], &pinned);

        assert!(plan.shortfalls.is_empty());
        let r10 = plan.rooms.iter().find(|r| r.room == RoomName::from("R10")).unwrap();
        assert_eq!(r10.students.len(), 3);
        assert_eq!(&r10.students[..], &pinned[0].students[..3]);
        let r40 = plan.rooms.iter().find(|r| r.room == RoomName::from("R40")).unwrap();
        assert_eq!(
            r40.students,
            vec![StudentId::from("s4"), StudentId::from("s5")]
        );
    }

    #[test]
    fn overrides_change_seats_and_availability() {
        let rooms = vec![room("R40", 40), room("R20", 20), room("R30", 30)];
        let slot = SlotRef::new(1, 1);
        let mut cfg = PlannerConfig::default();
        cfg.room_overrides.insert(
            RoomName::from("R20"),
            RoomOverride {
                seats: Some(60),
                unavailable_slots: vec![slot],
            },
        );
        cfg.room_overrides
            .insert(RoomName::from("GONE"), RoomOverride::default());

        let alloc = RoomAllocator::new(&rooms, &cfg);
        assert_eq!(alloc.rooms()[0].name, RoomName::from("R20"));
        assert_eq!(alloc.rooms()[0].seats, 60);

        let e = exam_n(1, 90, &students("s", 25));
        let plan = alloc.allocate(&one_slot(slot, &[&e]), &[], &[]);
        assert_eq!(plan.rooms[0].room, RoomName::from("R40"));
        let plan = alloc.allocate(&one_slot(SlotRef::new(1, 2), &[&e]), &[], &[]);
        assert_eq!(plan.rooms[0].room, RoomName::from("R20"));
    }

    #[test]
    fn reserve_room_for_large_exams() {
        let rooms = vec![room("R10", 10), room("R8", 8), room("R6", 6)];
        let mut cfg = PlannerConfig::default();
        cfg.rooms.reserve_min_students = 5;
        let big = exam_n(1, 90, &students("b", 5));
        let small = exam_n(2, 90, &students("s", 2));
        let plan = RoomAllocator::new(&rooms, &cfg).allocate(
            &one_slot(SlotRef::new(1, 1), &[&big, &small]),
            &[],
            &[],
        );
        let reserves: Vec<&PlannedRoom> = plan.rooms.iter().filter(|r| r.reserve).collect();
        assert_eq!(reserves.len(), 1);
        assert_eq!(reserves[0].ancode, Ancode(1));
        assert!(reserves[0].students.is_empty());
        assert_ne!(reserves[0].room, in_room(&plan, 1)[0].room);
    }

    #[test]
    fn placeholder_does_not_stop_later_exams() {
        let rooms = vec![room("R10", 10)];
        let a = exam_n(1, 90, &students("a", 10));
        let b = exam_n(2, 90, &students("b", 10));
        let c = exam_n(3, 90, &students("c", 10));
        let slots = BTreeMap::from([
            (SlotRef::new(1, 1), vec![&a, &b]),
            (SlotRef::new(2, 1), vec![&c]),
        ]);
        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default()).allocate(&slots, &[], &[]);
        assert_eq!(in_room(&plan, 1)[0].room, RoomName::from("R10"));
        assert!(in_room(&plan, 2)[0].is_placeholder());
        assert_eq!(in_room(&plan, 3)[0].room, RoomName::from("R10"));
        assert_eq!(plan.shortfalls.len(), 1);
    }

    #[test]
    fn exams_are_grouped_by_planned_slot() {
        let a = exam(1, 90, &["x"]);
        let b = exam(2, 90, &["y"]);
        let mut online = exam(3, 90, &["z"]);
        online.constraints.rooms.online = true;
        let group = |code: u32, exams: Vec<u32>| ExamGroup {
            code: ExamGroupCode(code),
            exams: exams.into_iter().map(Ancode).collect(),
            student_count: 1,
            max_duration: 90,
            allowed_slots: vec![],
            conflicts: vec![],
            state: GroupState::Scheduled,
        };
        let groups = vec![group(1, vec![1, 3]), group(2, vec![2])];
        let plan = Plan {
            entries: vec![
                PlanEntry {
                    group: ExamGroupCode(1),
                    slot: SlotRef::new(1, 2),
                },
                PlanEntry {
                    group: ExamGroupCode(2),
                    slot: SlotRef::new(1, 1),
                },
            ],
            ..Plan::default()
        };
        let exams = vec![a, b, online];
        let by_slot = exams_by_slot(&plan, &groups, &exams);
        let codes: Vec<(SlotRef, Vec<Ancode>)> = by_slot
            .iter()
            .map(|(s, es)| (*s, es.iter().map(|e| e.ancode).collect()))
            .collect();
        assert_eq!(
            codes,
            vec![
                (SlotRef::new(1, 1), vec![Ancode(2)]),
                (SlotRef::new(1, 2), vec![Ancode(1)]),
            ]
        );
    }
}

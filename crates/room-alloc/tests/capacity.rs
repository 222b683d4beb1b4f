use proptest::prelude::*;
use room_alloc::RoomAllocator;
use std::collections::{BTreeMap, HashMap, HashSet};
use types::{
    Ancode, Exam, ExamConstraints, Nta, PlannerConfig, Registrations, Room, RoomName, SlotRef,
    StaffId, StudentId,
};

fn room(i: usize, seats: u32, lab: bool) -> Room {
    Room {
        name: RoomName(format!("R{i}")),
        seats,
        lab,
        restricted_software: false,
        sockets: false,
        accessible: i % 3 == 0,
    }
}

fn exam(ancode: u32, duration: u32, students: usize, lab: bool) -> Exam {
    let mut constraints = ExamConstraints::default();
    constraints.rooms.lab = lab;
    Exam {
        ancode: Ancode(ancode),
        module: String::new(),
        main_examiner: StaffId::from("prof"),
        duration,
        category: Default::default(),
        registrations: vec![Registrations {
            program: "WD".into(),
            students: (0..students)
                .map(|s| StudentId(format!("{ancode}-{s}")))
                .collect(),
        }],
        constraints,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn seats_are_never_overbooked_and_everyone_is_seated(
        seats in proptest::collection::vec((1u32..60, any::<bool>()), 1..8),
        exams in proptest::collection::vec(
            (0u32..3, prop_oneof![Just(60u32), Just(90), Just(120)], 1usize..80, any::<bool>()),
            1..8,
        ),
        nta_every in 2usize..9,
    ) {
        let rooms: Vec<Room> = seats
            .iter()
            .enumerate()
            .map(|(i, &(s, lab))| room(i, s, lab))
            .collect();
        let exams: Vec<(SlotRef, Exam)> = exams
            .iter()
            .enumerate()
            .map(|(i, &(slot, duration, n, lab))| {
                (SlotRef::new(1, slot + 1), exam(i as u32 + 1, duration, n, lab))
            })
            .collect();

        let mut ntas = Vec::new();
        for (_, e) in &exams {
            for (k, s) in e.students().enumerate() {
                if k % nta_every == 1 {
                    ntas.push(Nta {
                        student: s.clone(),
                        delta_duration_percent: 25,
                        needs_room_alone: k % (2 * nta_every) == 1,
                    });
                }
            }
        }

        let mut by_slot: BTreeMap<SlotRef, Vec<&Exam>> = BTreeMap::new();
        for (slot, e) in &exams {
            by_slot.entry(*slot).or_default().push(e);
        }

        let plan = RoomAllocator::new(&rooms, &PlannerConfig::default())
            .allocate(&by_slot, &ntas, &[]);

        let capacity: HashMap<&RoomName, u32> = rooms.iter().map(|r| (&r.name, r.seats)).collect();
        let mut used: HashMap<(SlotRef, &RoomName), u32> = HashMap::new();
        for r in plan.rooms.iter().filter(|r| !r.is_placeholder()) {
            *used.entry((r.slot, &r.room)).or_default() += r.students.len() as u32;
        }
        for ((slot, name), n) in &used {
            prop_assert!(*n <= capacity[name], "{} overbooked in {}: {}", name, slot, n);
        }

        for (slot, e) in &exams {
            let expected: HashSet<&StudentId> = e.students().collect();
            let mut seated: Vec<&StudentId> = plan
                .rooms
                .iter()
                .filter(|r| r.slot == *slot && r.ancode == e.ancode)
                .flat_map(|r| r.students.iter())
                .collect();
            prop_assert_eq!(seated.len(), expected.len());
            seated.sort();
            seated.dedup();
            prop_assert_eq!(seated.len(), expected.len());
            prop_assert!(seated.iter().all(|s| expected.contains(s)));
        }
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};
use types::{Ancode, PlannedRoom, RoomName, SlotRef};

/// One proctoring duty: a room in a slot, or the slot's reserve (`room == None`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Duty {
    pub slot: SlotRef,
    pub room: Option<RoomName>,
    pub duration: u32,
    pub exams: BTreeSet<Ancode>,
}

/// Duties per slot derived from the room plan. Placeholder and reserve rooms
/// are not invigilated; each real room needs one proctor for its longest
/// sitting. Slots with at least `reserve_min_rooms` rooms also get a reserve
/// duty as long as their longest sitting (`0` disables reserves).
pub fn duties(rooms: &[PlannedRoom], reserve_min_rooms: usize) -> BTreeMap<SlotRef, Vec<Duty>> {
    let mut by_room: BTreeMap<(SlotRef, &RoomName), Duty> = BTreeMap::new();
    for r in rooms.iter().filter(|r| !r.is_placeholder() && !r.reserve) {
        let duty = by_room.entry((r.slot, &r.room)).or_insert_with(|| Duty {
            slot: r.slot,
            room: Some(r.room.clone()),
            duration: 0,
            exams: BTreeSet::new(),
        });
        duty.duration = duty.duration.max(r.duration);
        duty.exams.insert(r.ancode);
    }

    let mut out: BTreeMap<SlotRef, Vec<Duty>> = BTreeMap::new();
    for ((slot, _), duty) in by_room {
        out.entry(slot).or_default().push(duty);
    }

    for (slot, list) in out.iter_mut() {
        if reserve_min_rooms > 0 && list.len() >= reserve_min_rooms {
            let duration = list.iter().map(|d| d.duration).max().unwrap_or(0);
            list.push(Duty {
                slot: *slot,
                room: None,
                duration,
                exams: BTreeSet::new(),
            });
        }
        list.sort_by(|a, b| {
            b.duration
                .cmp(&a.duration)
                .then_with(|| a.room.is_none().cmp(&b.room.is_none()))
                .then_with(|| a.room.cmp(&b.room))
        });
    }
    out
}

/// Distinct real rooms each exam sits in, per slot.
pub fn rooms_per_exam(rooms: &[PlannedRoom]) -> HashMap<(SlotRef, Ancode), BTreeSet<&RoomName>> {
    let mut out: HashMap<(SlotRef, Ancode), BTreeSet<&RoomName>> = HashMap::new();
    for r in rooms.iter().filter(|r| !r.is_placeholder() && !r.reserve) {
        out.entry((r.slot, r.ancode)).or_default().insert(&r.room);
    }
    out
}

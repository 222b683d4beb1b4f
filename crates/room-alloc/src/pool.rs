use types::{Ancode, Exam, Room, RoomName};

/// Capabilities a room has to offer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Needs {
    pub lab: bool,
    pub restricted_software: bool,
    pub sockets: bool,
    pub accessible: bool,
}

impl Needs {
    pub fn of(exam: &Exam) -> Self {
        let r = &exam.constraints.rooms;
        Self {
            lab: r.lab,
            restricted_software: r.restricted_software,
            sockets: r.sockets,
            accessible: false,
        }
    }

    pub fn with_accessible(self) -> Self {
        Self {
            accessible: true,
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.lab || self.restricted_software || self.sockets || self.accessible)
    }
}

/// Every required flag must be present; special rooms are never handed to
/// exams without requirements.
pub fn satisfies(room: &Room, needs: &Needs) -> bool {
    if needs.is_empty() {
        return !room.is_special();
    }
    (!needs.lab || room.lab)
        && (!needs.restricted_software || room.restricted_software)
        && (!needs.sockets || room.sockets)
        && (!needs.accessible || room.accessible)
}

/// A room taken in the current slot that may still have free seats.
#[derive(Clone, Debug)]
pub struct UsedRoom {
    pub room: usize,
    pub seats_left: u32,
    pub exams: Vec<(Ancode, u32)>,
}

/// Room availability for one slot. Indices point into the allocator's
/// room list, which is ordered by seats descending.
#[derive(Debug)]
pub struct SlotPool<'r> {
    rooms: &'r [Room],
    free: Vec<usize>,
    used: Vec<UsedRoom>,
}

impl<'r> SlotPool<'r> {
    pub fn new(rooms: &'r [Room], available: impl Fn(usize) -> bool) -> Self {
        Self {
            rooms,
            free: (0..rooms.len()).filter(|&i| available(i)).collect(),
            used: Vec::new(),
        }
    }

    pub fn name(&self, idx: usize) -> RoomName {
        self.rooms[idx].name.clone()
    }

    pub fn seats_left(&self, idx: usize) -> u32 {
        self.used
            .iter()
            .find(|u| u.room == idx)
            .map(|u| u.seats_left)
            .unwrap_or(0)
    }

    /// Claims a room by name for a pinned assignment. A room already in use
    /// in this slot is returned as is.
    pub fn claim(&mut self, name: &RoomName) -> Option<usize> {
        let idx = self.rooms.iter().position(|r| &r.name == name)?;
        if self.used.iter().any(|u| u.room == idx) {
            return Some(idx);
        }
        self.free.contains(&idx).then(|| self.open(idx))
    }

    /// First compatible fresh room in the seats-descending list, opened
    /// for sharing.
    pub fn fresh(&mut self, needs: &Needs) -> Option<usize> {
        let pick = self
            .free
            .iter()
            .copied()
            .find(|&i| self.compatible(i, needs))?;
        Some(self.open(pick))
    }

    /// Smallest compatible fresh room, opened for sharing.
    pub fn fresh_smallest(&mut self, needs: &Needs) -> Option<usize> {
        let pick = self.smallest_free(needs)?;
        Some(self.open(pick))
    }

    /// Smallest compatible fresh room, taken whole (not open for sharing).
    pub fn take_smallest(&mut self, needs: &Needs) -> Option<usize> {
        let pick = self.smallest_free(needs)?;
        self.take_free(pick);
        Some(pick)
    }

    /// A room already used by exams of exactly `duration` minutes with room
    /// for `students` more; the tightest fit wins.
    pub fn shareable(&self, needs: &Needs, duration: u32, students: u32) -> Option<usize> {
        self.used
            .iter()
            .filter(|u| !u.exams.is_empty() && u.seats_left >= students)
            .filter(|u| u.exams.iter().all(|&(_, d)| d == duration))
            .filter(|u| satisfies(&self.rooms[u.room], needs))
            .min_by_key(|u| (u.seats_left, u.room))
            .map(|u| u.room)
    }

    /// A used room with a free seat, preferring rooms the exam already sits in.
    pub fn with_space_for(&self, ancode: Ancode, needs: &Needs) -> Option<usize> {
        let open = || {
            self.used
                .iter()
                .filter(|u| u.seats_left > 0 && satisfies(&self.rooms[u.room], needs))
        };
        open()
            .find(|u| u.exams.iter().any(|&(a, _)| a == ancode))
            .or_else(|| open().find(|u| !u.exams.is_empty()))
            .map(|u| u.room)
    }

    pub fn occupy(&mut self, idx: usize, ancode: Ancode, duration: u32, students: u32) {
        if let Some(u) = self.used.iter_mut().find(|u| u.room == idx) {
            u.seats_left = u.seats_left.saturating_sub(students);
            if !u.exams.contains(&(ancode, duration)) {
                u.exams.push((ancode, duration));
            }
        }
    }

    /// Closes a used room for any further seating.
    pub fn seal(&mut self, idx: usize) {
        if let Some(u) = self.used.iter_mut().find(|u| u.room == idx) {
            u.seats_left = 0;
        }
    }

    fn compatible(&self, idx: usize, needs: &Needs) -> bool {
        self.rooms[idx].seats > 0 && satisfies(&self.rooms[idx], needs)
    }

    fn smallest_free(&self, needs: &Needs) -> Option<usize> {
        self.free
            .iter()
            .rev()
            .copied()
            .find(|&i| self.compatible(i, needs))
    }

    fn open(&mut self, idx: usize) -> usize {
        self.take_free(idx);
        self.used.push(UsedRoom {
            room: idx,
            seats_left: self.rooms[idx].seats,
            exams: Vec::new(),
        });
        idx
    }

    fn take_free(&mut self, idx: usize) {
        self.free.retain(|&i| i != idx);
    }
}

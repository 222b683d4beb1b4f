use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use types::{Exam, ExamCategory, Slot, SlotCalendar, SlotRef};

/// Read-only view over a [`SlotCalendar`] that answers slot filter queries.
#[derive(Clone, Debug)]
pub struct Calendar<'a> {
    slots: Vec<&'a Slot>,
    by_ref: HashMap<SlotRef, &'a Slot>,
    go: HashSet<SlotRef>,
    go_exclusive: bool,
}

impl<'a> Calendar<'a> {
    pub fn new(calendar: &'a SlotCalendar, go_exclusive: bool) -> Self {
        let mut slots: Vec<&Slot> = calendar.slots.iter().collect();
        slots.sort_by_key(|s| s.slot_ref());
        let by_ref = slots.iter().map(|s| (s.slot_ref(), *s)).collect();
        Self {
            slots,
            by_ref,
            go: calendar.go_slots.iter().copied().collect(),
            go_exclusive,
        }
    }

    /// Slots in chronological (day, slot) order.
    pub fn slots(&self) -> impl Iterator<Item = &'a Slot> + '_ {
        self.slots.iter().copied()
    }

    pub fn refs(&self) -> Vec<SlotRef> {
        self.slots.iter().map(|s| s.slot_ref()).collect()
    }

    pub fn get(&self, r: SlotRef) -> Option<&'a Slot> {
        self.by_ref.get(&r).copied()
    }

    pub fn date_of(&self, r: SlotRef) -> Option<NaiveDate> {
        self.get(r).map(|s| s.date())
    }

    pub fn is_go(&self, r: SlotRef) -> bool {
        self.go.contains(&r)
    }

    /// Slots an exam may be placed in after applying its category and
    /// day/time filters. Order follows the calendar.
    pub fn allowed_slots(&self, exam: &Exam) -> Vec<SlotRef> {
        let c = &exam.constraints;
        self.slots
            .iter()
            .filter(|s| match exam.category {
                ExamCategory::Go => self.is_go(s.slot_ref()),
                ExamCategory::Regular => !(self.go_exclusive && self.is_go(s.slot_ref())),
            })
            .filter(|s| !c.exclude_days.contains(&s.date()))
            .filter(|s| c.possible_days.is_empty() || c.possible_days.contains(&s.date()))
            .filter(|s| c.fixed_day.map_or(true, |d| s.date() == d))
            .filter(|s| c.fixed_time.map_or(true, |t| s.starts_at == t))
            .map(|s| s.slot_ref())
            .collect()
    }
}

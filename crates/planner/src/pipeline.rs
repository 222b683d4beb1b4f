//! Grouping, slot search, room allocation and invigilation in one pass.

use invigilation::InvigilationBalancer;
use room_alloc::{exams_by_slot, RoomAllocator};
use sched_core::{prepare, scheduled_exams, Calendar, PlanningError, Scheduler};
use solver_ga::GeneticScheduler;
use tracing::{info, instrument};
use types::{PlannerConfig, PlanningInput, PlanningOutcome};

/// Full pipeline with the genetic scheduler configured from `cfg`.
pub fn run(input: &PlanningInput, cfg: &PlannerConfig) -> Result<PlanningOutcome, PlanningError> {
    run_with(&GeneticScheduler::from_config(cfg), input, cfg)
}

/// Full pipeline with any slot scheduler. Configuration errors and an
/// infeasible plan stop the run; room and invigilation shortfalls are
/// reported inside the outcome.
#[instrument(skip_all, fields(exams = input.exams.len(), rooms = input.rooms.len()))]
pub fn run_with<S: Scheduler + ?Sized>(
    scheduler: &S,
    input: &PlanningInput,
    cfg: &PlannerConfig,
) -> Result<PlanningOutcome, PlanningError> {
    let groups = prepare(input, cfg)?;
    let plan = scheduler.schedule(&groups)?;

    let by_slot = exams_by_slot(&plan, &groups, &input.exams);
    let rooms = RoomAllocator::new(&input.rooms, cfg).allocate(
        &by_slot,
        &input.ntas,
        &input.pinned_rooms,
    );

    let calendar = Calendar::new(&input.calendar, cfg.go_slots_exclusive);
    let invigilation = InvigilationBalancer::new(&input.invigilators, cfg).balance(
        &rooms.rooms,
        &scheduled_exams(&plan, &groups, &input.exams),
        &calendar,
    );

    info!(
        groups = groups.len(),
        planned_rooms = rooms.rooms.len(),
        shortfalls = rooms.shortfalls.len(),
        invigilations = invigilation.invigilations.len(),
        "planning finished"
    );

    Ok(PlanningOutcome {
        groups,
        plan,
        rooms,
        invigilation,
    })
}

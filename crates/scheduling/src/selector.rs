//! Eligible-machine selection and load balancing.

use forgeplan_core::{DomainError, DomainResult, MachineId};
use forgeplan_production::{Machine, Process};

/// Machines able to run `process`, in registration order.
pub fn eligible_machines(machines: &[Machine], process: Process) -> DomainResult<Vec<&Machine>> {
    let eligible: Vec<&Machine> = machines.iter().filter(|m| m.supports(process)).collect();
    if eligible.is_empty() {
        return Err(DomainError::capacity_unavailable(format!(
            "no machine is configured for process {process}"
        )));
    }
    Ok(eligible)
}

/// The candidate with the lowest load; the earliest registered wins ties.
pub fn least_loaded<'a>(
    candidates: &[&'a Machine],
    load_minutes: impl Fn(MachineId) -> i64,
) -> Option<&'a Machine> {
    let mut best: Option<(&'a Machine, i64)> = None;
    for machine in candidates {
        let load = load_minutes(machine.id());
        match best {
            Some((_, best_load)) if best_load <= load => {}
            _ => best = Some((machine, load)),
        }
    }
    best.map(|(machine, _)| machine)
}

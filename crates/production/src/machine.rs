use serde::{Deserialize, Serialize};

use forgeplan_core::units::hours_to_minutes;
use forgeplan_core::{CalendarId, DomainError, DomainResult, MachineId};

use crate::process::Process;

/// A machine resource that can execute one or more processes.
///
/// Master data: the scheduler reads machines but never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MachineRecord")]
pub struct Machine {
    id: MachineId,
    name: String,
    processes: Vec<Process>,
    capacity_hours_per_week: f64,
    calendar_id: Option<CalendarId>,
    location: Option<String>,
}

#[derive(Deserialize)]
struct MachineRecord {
    id: MachineId,
    name: String,
    processes: Vec<Process>,
    capacity_hours_per_week: f64,
    #[serde(default)]
    calendar_id: Option<CalendarId>,
    #[serde(default)]
    location: Option<String>,
}

impl TryFrom<MachineRecord> for Machine {
    type Error = DomainError;

    fn try_from(record: MachineRecord) -> Result<Self, Self::Error> {
        let mut machine = Machine::new(
            record.id,
            record.name,
            record.processes,
            record.capacity_hours_per_week,
        )?;
        machine.calendar_id = record.calendar_id;
        machine.location = record.location;
        Ok(machine)
    }
}

impl Machine {
    /// Processes are deduplicated (first occurrence wins); at least one is required.
    pub fn new(
        id: MachineId,
        name: impl Into<String>,
        processes: impl IntoIterator<Item = Process>,
        capacity_hours_per_week: f64,
    ) -> DomainResult<Self> {
        let name = name.into();
        let mut unique: Vec<Process> = Vec::new();
        for process in processes {
            if !unique.contains(&process) {
                unique.push(process);
            }
        }
        if unique.is_empty() {
            return Err(DomainError::validation(format!(
                "machine '{name}' must support at least one manufacturing process"
            )));
        }
        if !(capacity_hours_per_week.is_finite() && capacity_hours_per_week >= 0.0) {
            return Err(DomainError::validation(format!(
                "machine '{name}' needs a non-negative weekly capacity"
            )));
        }
        Ok(Self {
            id,
            name,
            processes: unique,
            capacity_hours_per_week,
            calendar_id: None,
            location: None,
        })
    }

    pub fn with_calendar(mut self, calendar_id: CalendarId) -> Self {
        self.calendar_id = Some(calendar_id);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn supports(&self, process: Process) -> bool {
        self.processes.contains(&process)
    }

    pub fn capacity_hours_per_week(&self) -> f64 {
        self.capacity_hours_per_week
    }

    pub fn capacity_minutes(&self) -> i64 {
        hours_to_minutes(self.capacity_hours_per_week)
    }

    pub fn calendar_id(&self) -> Option<CalendarId> {
        self.calendar_id
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn assign_calendar(&mut self, calendar_id: Option<CalendarId>) {
        self.calendar_id = calendar_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processes_are_deduplicated_in_order() {
        let machine = Machine::new(
            MachineId::new(),
            "DMG CTX",
            [Process::Turning, Process::Milling, Process::Turning],
            40.0,
        )
        .unwrap();
        assert_eq!(machine.processes(), &[Process::Turning, Process::Milling]);
        assert!(machine.supports(Process::Milling));
        assert!(!machine.supports(Process::Welding));
        assert_eq!(machine.capacity_minutes(), 2400);
    }

    #[test]
    fn machine_without_processes_is_rejected() {
        let err = Machine::new(MachineId::new(), "idle", [], 40.0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn negative_capacity_is_rejected() {
        let err = Machine::new(MachineId::new(), "saw", [Process::Sawing], -1.0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let id = MachineId::new();
        let idle = format!(r#"{{"id":"{id}","name":"idle","processes":[],"capacity_hours_per_week":40.0}}"#);
        assert!(serde_json::from_str::<Machine>(&idle).is_err());

        let lathe = Machine::new(id, "lathe", [Process::Turning, Process::Turning], 40.0)
            .unwrap()
            .with_location("Hall 1");
        let json = serde_json::to_string(&lathe).unwrap();
        assert_eq!(serde_json::from_str::<Machine>(&json).unwrap(), lathe);
    }
}

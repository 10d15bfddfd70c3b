use serde::{Deserialize, Serialize};

use forgeplan_core::units::hours_to_minutes;
use forgeplan_core::{DomainError, DomainResult, ItemId, OperationId};

use crate::process::Process;

/// Material consumed by an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub item_id: ItemId,
    pub quantity: f64,
}

/// An individual manufacturing step of a production order.
///
/// Immutable once part of an order; scheduling results live in the
/// order's `OperationPlan`, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    pub process: Process,
    pub duration_hours: f64,
    pub setup_time_hours: f64,
    pub description: String,
    pub materials: Vec<MaterialRequirement>,
}

impl Operation {
    pub fn new(
        id: OperationId,
        name: impl Into<String>,
        process: Process,
        duration_hours: f64,
        setup_time_hours: f64,
    ) -> DomainResult<Self> {
        let operation = Self {
            id,
            name: name.into(),
            process,
            duration_hours,
            setup_time_hours,
            description: String::new(),
            materials: Vec::new(),
        };
        operation.validate()?;
        Ok(operation)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_material(mut self, item_id: ItemId, quantity: f64) -> Self {
        self.materials.push(MaterialRequirement { item_id, quantity });
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !(self.duration_hours.is_finite() && self.duration_hours > 0.0) {
            return Err(DomainError::validation(format!(
                "operation '{}' must have a positive duration",
                self.name
            )));
        }
        if !(self.setup_time_hours.is_finite() && self.setup_time_hours >= 0.0) {
            return Err(DomainError::validation(format!(
                "operation '{}' must not have a negative setup time",
                self.name
            )));
        }
        if let Some(m) = self
            .materials
            .iter()
            .find(|m| !(m.quantity.is_finite() && m.quantity > 0.0))
        {
            return Err(DomainError::validation(format!(
                "operation '{}' requires a positive quantity of item {}",
                self.name, m.item_id
            )));
        }
        Ok(())
    }

    /// Machine time in minutes: run time plus setup time scaled by `setup_time_factor`.
    ///
    /// Rounded to the nearest minute; any positive run time books at least one.
    pub fn effective_minutes(&self, setup_time_factor: f64) -> i64 {
        let setup_hours = (self.setup_time_hours * setup_time_factor).max(0.0);
        let minutes = hours_to_minutes(self.duration_hours + setup_hours);
        if self.duration_hours > 0.0 { minutes.max(1) } else { minutes }
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use forgeplan_core::{Aggregate, AggregateRoot, DomainError, EvaluationId, ItemId, SupplierId};
use forgeplan_events::Event;
use forgeplan_production::Process;

use crate::evaluation::overall_score;

/// Contact information for a supplier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Aggregate root: Supplier.
///
/// Carries a running rating: the mean overall score of every evaluation
/// recorded so far (0.0 until the first evaluation).
#[derive(Debug, Clone, PartialEq)]
pub struct Supplier {
    id: SupplierId,
    name: String,
    contact: ContactInfo,
    rating: f64,
    rating_count: u32,
    processes: Vec<Process>,
    material_item_ids: Vec<ItemId>,
    version: u64,
    created: bool,
}

impl Supplier {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SupplierId) -> Self {
        Self {
            id,
            name: String::new(),
            contact: ContactInfo::default(),
            rating: 0.0,
            rating_count: 0,
            processes: Vec::new(),
            material_item_ids: Vec::new(),
            version: 0,
            created: false,
        }
    }

    /// Run `RegisterSupplier` against a fresh aggregate.
    pub fn register(cmd: RegisterSupplier) -> Result<Self, DomainError> {
        let mut supplier = Self::empty(cmd.supplier_id);
        supplier.execute(&SupplierCommand::RegisterSupplier(cmd))?;
        Ok(supplier)
    }

    pub fn id_typed(&self) -> SupplierId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn rating_count(&self) -> u32 {
        self.rating_count
    }

    pub fn processes(&self) -> &[Process] {
        &self.processes
    }

    pub fn material_item_ids(&self) -> &[ItemId] {
        &self.material_item_ids
    }

    pub fn supplies(&self, item_id: ItemId) -> bool {
        self.material_item_ids.contains(&item_id)
    }
}

impl AggregateRoot for Supplier {
    type Id = SupplierId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterSupplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSupplier {
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub processes: Vec<Process>,
    pub material_item_ids: Vec<ItemId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LinkMaterial (idempotent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkMaterial {
    pub supplier_id: SupplierId,
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordEvaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvaluation {
    pub supplier_id: SupplierId,
    pub evaluation_id: EvaluationId,
    pub quality_score: f64,
    pub delivery_reliability_score: f64,
    pub communication_score: f64,
    pub evaluated_on: NaiveDate,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SupplierCommand {
    RegisterSupplier(RegisterSupplier),
    LinkMaterial(LinkMaterial),
    RecordEvaluation(RecordEvaluation),
}

/// Event: SupplierRegistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRegistered {
    pub supplier_id: SupplierId,
    pub name: String,
    pub contact: ContactInfo,
    pub processes: Vec<Process>,
    pub material_item_ids: Vec<ItemId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MaterialLinked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLinked {
    pub supplier_id: SupplierId,
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SupplierEvaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierEvaluated {
    pub supplier_id: SupplierId,
    pub evaluation_id: EvaluationId,
    pub quality_score: f64,
    pub delivery_reliability_score: f64,
    pub communication_score: f64,
    pub overall_score: f64,
    pub evaluated_on: NaiveDate,
    pub notes: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SupplierEvent {
    SupplierRegistered(SupplierRegistered),
    MaterialLinked(MaterialLinked),
    SupplierEvaluated(SupplierEvaluated),
}

impl Event for SupplierEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SupplierEvent::SupplierRegistered(_) => "suppliers.supplier.registered",
            SupplierEvent::MaterialLinked(_) => "suppliers.supplier.material_linked",
            SupplierEvent::SupplierEvaluated(_) => "suppliers.supplier.evaluated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SupplierEvent::SupplierRegistered(e) => e.occurred_at,
            SupplierEvent::MaterialLinked(e) => e.occurred_at,
            SupplierEvent::SupplierEvaluated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Supplier {
    type Command = SupplierCommand;
    type Event = SupplierEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SupplierEvent::SupplierRegistered(e) => {
                self.id = e.supplier_id;
                self.name = e.name.clone();
                self.contact = e.contact.clone();
                self.processes = e.processes.clone();
                self.material_item_ids = e.material_item_ids.clone();
                self.rating = 0.0;
                self.rating_count = 0;
                self.created = true;
            }
            SupplierEvent::MaterialLinked(e) => {
                if !self.material_item_ids.contains(&e.item_id) {
                    self.material_item_ids.push(e.item_id);
                }
            }
            SupplierEvent::SupplierEvaluated(e) => {
                let total = self.rating * f64::from(self.rating_count) + e.overall_score;
                self.rating_count += 1;
                self.rating = total / f64::from(self.rating_count);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SupplierCommand::RegisterSupplier(cmd) => self.handle_register(cmd),
            SupplierCommand::LinkMaterial(cmd) => self.handle_link(cmd),
            SupplierCommand::RecordEvaluation(cmd) => self.handle_evaluation(cmd),
        }
    }
}

fn dedup<T: PartialEq + Copy>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(*v);
        }
    }
    out
}

impl Supplier {
    fn ensure_supplier_id(&self, supplier_id: SupplierId) -> Result<(), DomainError> {
        if self.id != supplier_id {
            return Err(DomainError::invariant("supplier_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterSupplier) -> Result<Vec<SupplierEvent>, DomainError> {
        if self.created {
            return Err(DomainError::duplicate(format!(
                "supplier {} already exists",
                cmd.supplier_id
            )));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![SupplierEvent::SupplierRegistered(SupplierRegistered {
            supplier_id: cmd.supplier_id,
            name: cmd.name.clone(),
            contact: cmd.contact.clone().unwrap_or_default(),
            processes: dedup(&cmd.processes),
            material_item_ids: dedup(&cmd.material_item_ids),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_link(&self, cmd: &LinkMaterial) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("supplier {}", cmd.supplier_id)));
        }
        self.ensure_supplier_id(cmd.supplier_id)?;

        if self.supplies(cmd.item_id) {
            return Ok(vec![]);
        }

        Ok(vec![SupplierEvent::MaterialLinked(MaterialLinked {
            supplier_id: cmd.supplier_id,
            item_id: cmd.item_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_evaluation(&self, cmd: &RecordEvaluation) -> Result<Vec<SupplierEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("supplier {}", cmd.supplier_id)));
        }
        self.ensure_supplier_id(cmd.supplier_id)?;

        let scores = [
            cmd.quality_score,
            cmd.delivery_reliability_score,
            cmd.communication_score,
        ];
        if scores.iter().any(|s| !(s.is_finite() && *s >= 0.0)) {
            return Err(DomainError::validation(
                "evaluation scores must be non-negative numbers",
            ));
        }

        Ok(vec![SupplierEvent::SupplierEvaluated(SupplierEvaluated {
            supplier_id: cmd.supplier_id,
            evaluation_id: cmd.evaluation_id,
            quality_score: cmd.quality_score,
            delivery_reliability_score: cmd.delivery_reliability_score,
            communication_score: cmd.communication_score,
            overall_score: overall_score(
                cmd.quality_score,
                cmd.delivery_reliability_score,
                cmd.communication_score,
            ),
            evaluated_on: cmd.evaluated_on,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeplan_core::{Aggregate, AggregateRoot, DomainError, ItemId};
use forgeplan_events::Event;

/// Replenishment parameters of a material.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPolicy {
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub lead_time_days: u32,
}

impl Default for StockPolicy {
    fn default() -> Self {
        Self {
            safety_stock: 0.0,
            reorder_point: 0.0,
            lead_time_days: 0,
        }
    }
}

/// Aggregate root: InventoryItem (material master + on-hand quantity).
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    unit_of_measure: String,
    on_hand: f64,
    policy: StockPolicy,
    version: u64,
    created: bool,
}

impl InventoryItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            name: String::new(),
            unit_of_measure: String::new(),
            on_hand: 0.0,
            policy: StockPolicy::default(),
            version: 0,
            created: false,
        }
    }

    /// Run `RegisterItem` against a fresh aggregate.
    pub fn register(cmd: RegisterItem) -> Result<Self, DomainError> {
        let mut item = Self::empty(cmd.item_id);
        item.execute(&InventoryCommand::RegisterItem(cmd))?;
        Ok(item)
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_of_measure(&self) -> &str {
        &self.unit_of_measure
    }

    pub fn on_hand(&self) -> f64 {
        self.on_hand
    }

    pub fn safety_stock(&self) -> f64 {
        self.policy.safety_stock
    }

    pub fn reorder_point(&self) -> f64 {
        self.policy.reorder_point
    }

    pub fn lead_time_days(&self) -> u32 {
        self.policy.lead_time_days
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }
}

impl AggregateRoot for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub item_id: ItemId,
    pub name: String,
    pub unit_of_measure: String,
    pub on_hand: f64,
    pub policy: StockPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock (positive = receipt, negative = consumption).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub item_id: ItemId,
    pub delta: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryCommand {
    RegisterItem(RegisterItem),
    AdjustStock(AdjustStock),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub item_id: ItemId,
    pub name: String,
    pub unit_of_measure: String,
    pub on_hand: f64,
    pub policy: StockPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub item_id: ItemId,
    pub delta: f64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemRegistered(ItemRegistered),
    StockAdjusted(StockAdjusted),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemRegistered(_) => "inventory.item.registered",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemRegistered(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.name = e.name.clone();
                self.unit_of_measure = e.unit_of_measure.clone();
                self.on_hand = e.on_hand;
                self.policy = e.policy;
                self.created = true;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.on_hand += e.delta;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RegisterItem(cmd) => self.handle_register(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
        }
    }
}

fn non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

impl InventoryItem {
    fn ensure_item_id(&self, item_id: ItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::duplicate(format!("item {} already exists", cmd.item_id)));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if !non_negative(cmd.on_hand) {
            return Err(DomainError::validation("quantity on hand cannot be negative"));
        }
        if !non_negative(cmd.policy.safety_stock) || !non_negative(cmd.policy.reorder_point) {
            return Err(DomainError::validation(
                "safety stock and reorder point cannot be negative",
            ));
        }
        Ok(vec![InventoryEvent::ItemRegistered(ItemRegistered {
            item_id: cmd.item_id,
            name: cmd.name.clone(),
            unit_of_measure: cmd.unit_of_measure.clone(),
            on_hand: cmd.on_hand,
            policy: cmd.policy,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("item {}", cmd.item_id)));
        }
        self.ensure_item_id(cmd.item_id)?;

        if !cmd.delta.is_finite() || cmd.delta == 0.0 {
            return Err(DomainError::validation("delta must be a non-zero number"));
        }

        let new_stock = self.on_hand + cmd.delta;
        if new_stock < 0.0 {
            return Err(DomainError::invariant(format!(
                "stock of {} cannot go negative ({} {} on hand, {} requested)",
                self.name, self.on_hand, self.unit_of_measure, -cmd.delta
            )));
        }

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            item_id: cmd.item_id,
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }
}

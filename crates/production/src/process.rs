use core::str::FromStr;

use serde::{Deserialize, Serialize};

use forgeplan_core::DomainError;

/// Manufacturing process kinds performed in the shop.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Process {
    Turning,
    Milling,
    LaserCutting,
    Bending,
    Welding,
    Grinding,
    Sawing,
}

impl Process {
    pub const ALL: [Process; 7] = [
        Process::Turning,
        Process::Milling,
        Process::LaserCutting,
        Process::Bending,
        Process::Welding,
        Process::Grinding,
        Process::Sawing,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Process::Turning => "Turning",
            Process::Milling => "Milling",
            Process::LaserCutting => "Laser Cutting",
            Process::Bending => "Bending",
            Process::Welding => "Welding",
            Process::Grinding => "Grinding",
            Process::Sawing => "Sawing",
        }
    }
}

impl core::fmt::Display for Process {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Process {
    type Err = DomainError;

    /// Accepts the display label ("Laser Cutting") or the snake-case key ("laser_cutting").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(' ', "_");
        Process::ALL
            .into_iter()
            .find(|p| p.label().to_lowercase().replace(' ', "_") == wanted)
            .ok_or_else(|| DomainError::validation(format!("unknown process '{s}'")))
    }
}

/// Production order priority. Ordering is total: Low < Normal < High < Critical.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderPriority {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl OrderPriority {
    /// Numeric rank used by the backlog prioritizer.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// High and Critical orders bypass the planning horizon and get expedited purchasing.
    pub fn is_urgent(self) -> bool {
        self >= OrderPriority::High
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderPriority::Low => "Low",
            OrderPriority::Normal => "Normal",
            OrderPriority::High => "High",
            OrderPriority::Critical => "Critical",
        }
    }
}

impl core::fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Production order lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Planned,
    Released,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Planned => "Planned",
            OrderStatus::Released => "Released",
            OrderStatus::InProgress => "In Progress",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Completed and cancelled orders leave the backlog for good.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Forward-only lifecycle; any open order may be cancelled.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Planned, Released) | (Released, InProgress) | (InProgress, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

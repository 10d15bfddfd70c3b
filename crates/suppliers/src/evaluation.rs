use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use forgeplan_core::{EvaluationId, SupplierId};

use crate::supplier::SupplierEvaluated;

/// Overall score of one evaluation: the plain mean of its three criteria.
pub fn overall_score(quality: f64, delivery_reliability: f64, communication: f64) -> f64 {
    (quality + delivery_reliability + communication) / 3.0
}

/// Immutable record of one supplier scoring event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierEvaluation {
    pub id: EvaluationId,
    pub supplier_id: SupplierId,
    pub evaluated_on: NaiveDate,
    pub quality_score: f64,
    pub delivery_reliability_score: f64,
    pub communication_score: f64,
    pub overall_score: f64,
    pub notes: String,
}

impl From<&SupplierEvaluated> for SupplierEvaluation {
    fn from(e: &SupplierEvaluated) -> Self {
        Self {
            id: e.evaluation_id,
            supplier_id: e.supplier_id,
            evaluated_on: e.evaluated_on,
            quality_score: e.quality_score,
            delivery_reliability_score: e.delivery_reliability_score,
            communication_score: e.communication_score,
            overall_score: e.overall_score,
            notes: e.notes.clone(),
        }
    }
}

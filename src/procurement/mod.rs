//! Procurement planning on top of the twelve-month forecast.

pub mod plan;
pub mod recommendation;

pub use plan::{
    plan, plan_with_config, round_to, AnchoredPlanRow, CostRounding, PlanConfig, PlanRow,
    ProcurementPlan,
};
pub use recommendation::{recommend, Recommendation, RecommendationConfig};

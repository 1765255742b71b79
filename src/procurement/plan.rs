//! Buffer stock, order quantities and cost for a forecast horizon.

use crate::core::{add_months, ForecastTable, FORECAST_HORIZON};
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Round `value` to `decimals` decimal places, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// How a fractional cost becomes whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CostRounding {
    /// Drop the fraction, toward zero.
    #[default]
    Truncate,
    /// Round to the nearest unit, half away from zero.
    Nearest,
}

impl CostRounding {
    fn apply(self, amount: f64) -> i64 {
        // Floating-point noise such as 28.999999999999996 must not lose a unit.
        let amount = round_to(amount, 6);
        match self {
            Self::Truncate => amount.trunc() as i64,
            Self::Nearest => amount.round() as i64,
        }
    }
}

/// Procurement parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanConfig {
    /// Buffer as a fraction of the forecast, in `[0, 1]`.
    pub buffer_rate: f64,
    /// Price per unit, non-negative.
    pub unit_price: f64,
    pub cost_rounding: CostRounding,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            buffer_rate: 0.10,
            unit_price: 5000.0,
            cost_rounding: CostRounding::Truncate,
        }
    }
}

impl PlanConfig {
    pub fn new(buffer_rate: f64, unit_price: f64) -> Self {
        Self {
            buffer_rate,
            unit_price,
            ..Default::default()
        }
    }

    /// Set the buffer from a percentage, e.g. `10.0` for 10%.
    pub fn with_buffer_percent(mut self, percent: f64) -> Self {
        self.buffer_rate = percent / 100.0;
        self
    }

    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = unit_price;
        self
    }

    pub fn with_cost_rounding(mut self, rounding: CostRounding) -> Self {
        self.cost_rounding = rounding;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.buffer_rate.is_finite() && (0.0..=1.0).contains(&self.buffer_rate)) {
            return Err(ForecastError::InvalidParameter(format!(
                "buffer_rate must be in [0, 1], got {}",
                self.buffer_rate
            )));
        }
        if !(self.unit_price.is_finite() && self.unit_price >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "unit_price must be non-negative, got {}",
                self.unit_price
            )));
        }
        Ok(())
    }
}

/// One month of the procurement plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanRow {
    pub step: usize,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
    /// `round2(predicted × buffer_rate)`
    pub buffer: f64,
    /// `round2(predicted + buffer)`
    pub order_quantity: f64,
    /// Order quantity times unit price, in whole currency units.
    pub cost: i64,
}

/// A plan row placed on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnchoredPlanRow {
    pub month: NaiveDate,
    #[serde(flatten)]
    pub row: PlanRow,
}

/// Procurement recommendation over the forecast horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementPlan {
    rows: Vec<PlanRow>,
    buffer_rate: f64,
    unit_price: f64,
    total_order_quantity: f64,
    total_cost: i64,
}

impl ProcurementPlan {
    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn buffer_rate(&self) -> f64 {
        self.buffer_rate
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    /// Sum of the monthly order quantities.
    pub fn total_order_quantity(&self) -> f64 {
        self.total_order_quantity
    }

    /// Sum of the monthly costs.
    pub fn total_cost(&self) -> i64 {
        self.total_cost
    }

    /// Total order quantity spread over twelve months.
    pub fn average_order_quantity(&self) -> f64 {
        self.total_order_quantity / FORECAST_HORIZON as f64
    }

    /// Total cost spread over twelve months.
    pub fn average_cost(&self) -> f64 {
        self.total_cost as f64 / FORECAST_HORIZON as f64
    }

    /// Assign calendar months, starting the month after `last_observed`.
    pub fn anchored(&self, last_observed: NaiveDate) -> Result<Vec<AnchoredPlanRow>> {
        self.rows
            .iter()
            .map(|row| {
                let month = u32::try_from(row.step)
                    .ok()
                    .and_then(|k| add_months(last_observed, k))
                    .ok_or_else(|| {
                        ForecastError::TimestampError(format!(
                            "cannot place step {} after {last_observed}",
                            row.step
                        ))
                    })?;
                Ok(AnchoredPlanRow { month, row: *row })
            })
            .collect()
    }
}

/// Build a procurement plan with truncated costs.
///
/// # Example
/// ```
/// use supply_forecast::core::ForecastTable;
/// use supply_forecast::procurement::plan;
///
/// let table = ForecastTable::from_vectors(vec![100.0; 12], vec![90.0; 12], vec![110.0; 12], 0.95)
///     .unwrap();
/// let plan = plan(&table, 0.10, 5000.0).unwrap();
///
/// assert_eq!(plan.rows()[0].buffer, 10.0);
/// assert_eq!(plan.rows()[0].order_quantity, 110.0);
/// assert_eq!(plan.rows()[0].cost, 550_000);
/// assert_eq!(plan.total_cost(), 6_600_000);
/// ```
pub fn plan(forecast: &ForecastTable, buffer_rate: f64, unit_price: f64) -> Result<ProcurementPlan> {
    plan_with_config(forecast, &PlanConfig::new(buffer_rate, unit_price))
}

/// Build a procurement plan with explicit settings.
pub fn plan_with_config(forecast: &ForecastTable, config: &PlanConfig) -> Result<ProcurementPlan> {
    config.validate()?;

    let rows: Vec<PlanRow> = forecast
        .rows()
        .iter()
        .map(|r| {
            let buffer = round_to(r.predicted * config.buffer_rate, 2);
            let order_quantity = round_to(r.predicted + buffer, 2);
            PlanRow {
                step: r.step,
                predicted: r.predicted,
                lower: r.lower,
                upper: r.upper,
                buffer,
                order_quantity,
                cost: config.cost_rounding.apply(order_quantity * config.unit_price),
            }
        })
        .collect();

    let total_order_quantity = round_to(rows.iter().map(|r| r.order_quantity).sum(), 2);
    let total_cost = rows.iter().map(|r| r.cost).sum();

    Ok(ProcurementPlan {
        rows,
        buffer_rate: config.buffer_rate,
        unit_price: config.unit_price,
        total_order_quantity,
        total_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_table(value: f64) -> ForecastTable {
        ForecastTable::from_vectors(
            vec![value; 12],
            vec![value - 1.0; 12],
            vec![value + 1.0; 12],
            0.95,
        )
        .unwrap()
    }

    #[test]
    fn buffer_order_and_cost_example() {
        let plan = plan(&flat_table(100.0), 0.10, 5000.0).unwrap();
        let row = plan.rows()[0];
        assert_relative_eq!(row.buffer, 10.0);
        assert_relative_eq!(row.order_quantity, 110.0);
        assert_eq!(row.cost, 550_000);
        assert_eq!(row.lower, 99.0);
        assert_eq!(row.upper, 101.0);
    }

    #[test]
    fn aggregates_over_twelve_months() {
        let plan = plan(&flat_table(100.0), 0.10, 5000.0).unwrap();
        assert_relative_eq!(plan.total_order_quantity(), 1320.0);
        assert_relative_eq!(plan.average_order_quantity(), 110.0);
        assert_eq!(plan.total_cost(), 6_600_000);
        assert_relative_eq!(plan.average_cost(), 550_000.0);
    }

    #[test]
    fn quantities_round_to_two_decimals() {
        let plan = plan(&flat_table(33.333), 0.2, 1.0).unwrap();
        let row = plan.rows()[0];
        assert_relative_eq!(row.buffer, 6.67);
        assert_relative_eq!(row.order_quantity, 40.0);
        assert_eq!(row.cost, 40);
    }

    #[test]
    fn cost_rounding_modes() {
        let table = flat_table(10.0);
        let truncated = plan_with_config(&table, &PlanConfig::new(0.0, 0.99)).unwrap();
        assert_eq!(truncated.rows()[0].cost, 9);

        let nearest = plan_with_config(
            &table,
            &PlanConfig::new(0.0, 0.99).with_cost_rounding(CostRounding::Nearest),
        )
        .unwrap();
        assert_eq!(nearest.rows()[0].cost, 10);
    }

    #[test]
    fn truncation_ignores_representation_noise() {
        // 0.29 * 100 is 28.999999999999996 in binary floating point.
        let plan = plan(&flat_table(0.29), 0.0, 100.0).unwrap();
        assert_eq!(plan.rows()[0].cost, 29);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let table = flat_table(100.0);
        let cases = [
            (-0.1, 5000.0),
            (1.5, 5000.0),
            (0.1, -1.0),
            (f64::NAN, 1.0),
            (0.1, f64::INFINITY),
        ];
        for (rate, price) in cases {
            assert!(matches!(
                plan(&table, rate, price),
                Err(ForecastError::InvalidParameter(_))
            ));
        }
        assert!(plan(&table, 0.0, 0.0).is_ok());
        assert!(plan(&table, 1.0, 0.0).is_ok());
    }

    #[test]
    fn buffer_percent_builder() {
        let config = PlanConfig::default().with_buffer_percent(25.0).with_unit_price(12.5);
        assert_relative_eq!(config.buffer_rate, 0.25);
        assert_relative_eq!(config.unit_price, 12.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn anchored_rows_follow_last_month() {
        let plan = plan(&flat_table(100.0), 0.10, 5000.0).unwrap();
        let last = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let anchored = plan.anchored(last).unwrap();
        assert_eq!(anchored[0].month, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(anchored[11].month, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(anchored[5].row.cost, 550_000);
    }

    #[test]
    fn anchored_row_serializes_flat() {
        let plan = plan(&flat_table(100.0), 0.10, 5000.0).unwrap();
        let last = NaiveDate::from_ymd_opt(2023, 12, 1).unwrap();
        let anchored = plan.anchored(last).unwrap();

        let json = serde_json::to_value(anchored[0]).unwrap();
        assert_eq!(json["month"], "2024-01-01");
        assert_eq!(json["step"], 1);
        assert_eq!(json["order_quantity"], 110.0);
        assert_eq!(json["cost"], 550_000);
    }
}

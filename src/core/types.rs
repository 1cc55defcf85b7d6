use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SavingMode {
    Flat,
    Stepped,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReturnMode {
    Average,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingStep {
    pub age: u32,
    pub monthly_saving: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub name: String,
    pub weight: f64,
    pub expected_return: f64,
    pub volatility: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurrenderEntry {
    pub age: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurrenderTerms {
    Single { age: u32, value: f64 },
    Table(Vec<SurrenderEntry>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PensionTier {
    pub start_age: u32,
    pub end_age: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PensionSchedule {
    Flat {
        amount: f64,
        percent_of_sum_assured: f64,
        start_age: u32,
        end_age: u32,
    },
    Tiered(Vec<PensionTier>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyBenefit {
    WholeLife,
    TermLife,
    Endowment {
        maturity_amount: f64,
        cash_back_amount: f64,
        cash_back_frequency: u32,
    },
    Annuity {
        schedule: PensionSchedule,
    },
    UnitLinked,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsurancePlan {
    pub active: bool,
    pub coverage_age: u32,
    pub sum_assured: f64,
    pub assumed_return: f64,
    pub surrender: Option<SurrenderTerms>,
    pub benefit: PolicyBenefit,
}

#[derive(Debug, Clone)]
pub struct RetirementInputs {
    pub current_age: u32,
    pub retire_age: u32,
    pub life_expectancy: u32,
    pub current_savings: f64,
    pub monthly_saving: f64,
    pub expected_return: f64,
    pub inflation: f64,
    pub saving_mode: SavingMode,
    pub saving_steps: Vec<SavingStep>,
    pub retire_fund_other: f64,
    pub retire_monthly_income: f64,
    pub retire_extra_expense: f64,
    pub retire_return_after: f64,
    pub retire_spend_trend_percent: f64,
    pub retire_special_annual: f64,
    pub legacy_fund: f64,
    pub return_mode: ReturnMode,
    pub allocations: Vec<Allocation>,
    pub insurance_plans: Vec<InsurancePlan>,
}

impl RetirementInputs {
    pub fn years_to_retire(&self) -> u32 {
        self.retire_age.saturating_sub(self.current_age)
    }

    pub fn years_in_retirement(&self) -> u32 {
        self.life_expectancy.saturating_sub(self.retire_age)
    }

    /// Pre-retirement return in percent. In custom mode this is the
    /// weight-normalized average over the allocations; weights need not
    /// sum to 100, and a zero total weight falls back to the flat figure.
    pub fn effective_expected_return(&self) -> f64 {
        match self.return_mode {
            ReturnMode::Average => self.expected_return,
            ReturnMode::Custom => {
                let total_weight: f64 = self.allocations.iter().map(|a| a.weight).sum();
                if total_weight > 0.0 {
                    self.allocations
                        .iter()
                        .map(|a| a.weight * a.expected_return)
                        .sum::<f64>()
                        / total_weight
                } else {
                    self.expected_return
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpenseRow {
    pub age: u32,
    pub monthly: f64,
    pub yearly: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Enough,
    Short,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub target_fund: f64,
    pub projected_fund: f64,
    pub gap: f64,
    pub years_to_retire: u32,
    pub years_in_retirement: u32,
    pub monthly_needed: f64,
    pub expense_schedule: Vec<ExpenseRow>,
    pub total_lifetime_expense: f64,
    pub fv_expense_monthly: f64,
    pub success_probability: f64,
    pub status: PlanStatus,
    pub money_out_age: u32,
    pub insurance_cash_inflow: f64,
    pub fv_lump_sum: f64,
    pub fv_annuity: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalBalance {
    pub balance: f64,
    pub pass: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonteCarloResult {
    pub probability: f64,
    pub p5: f64,
    pub p50: f64,
    pub p95: f64,
    pub p5_series: Vec<f64>,
    pub p50_series: Vec<f64>,
    pub p95_series: Vec<f64>,
    pub final_balances: Vec<FinalBalance>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionSeries {
    pub labels: Vec<u32>,
    pub actual: Vec<f64>,
    pub required: Vec<Option<f64>>,
    pub actual_history: Vec<Option<f64>>,
    pub insurance_inflows: Vec<f64>,
    pub sum_assured: Vec<f64>,
}

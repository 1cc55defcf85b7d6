mod form;
mod insurance;
mod montecarlo;
mod projector;
mod series;
mod types;

pub use form::{
    AllocationForm, InsurancePlanForm, PensionTierForm, PlanForm, PolicyKindForm,
    SurrenderEntryForm, SurrenderModeForm, build_inputs, parse_number, simulation_config,
};
pub use insurance::{annual_inflow, covered_sum_assured, inflow_future_value};
pub use montecarlo::{
    DEFAULT_SEED, DEFAULT_SIMULATIONS, DEFAULT_VOLATILITY, SimulationConfig, run_monte_carlo,
};
pub use projector::run_projection;
pub use series::build_projection_series;
pub use types::{
    Allocation, CalculationResult, ExpenseRow, FinalBalance, InsurancePlan, MonteCarloResult,
    PensionSchedule, PensionTier, PlanStatus, PolicyBenefit, ProjectionSeries, RetirementInputs,
    ReturnMode, SavingMode, SavingStep, SurrenderEntry, SurrenderTerms,
};

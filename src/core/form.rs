use serde::Deserialize;

use super::montecarlo::{DEFAULT_SIMULATIONS, SimulationConfig};
use super::types::{
    Allocation, InsurancePlan, PensionSchedule, PensionTier, PolicyBenefit, RetirementInputs,
    ReturnMode, SavingMode, SavingStep, SurrenderEntry, SurrenderTerms,
};

/// Raw plan form as the input screens submit it: every numeric field is a
/// string, possibly with thousands separators. Missing fields fall back to
/// the stock starter plan.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlanForm {
    pub current_age: String,
    pub retire_age: String,
    pub life_expectancy: String,
    pub current_savings: String,
    pub monthly_saving: String,
    pub expected_return: String,
    pub inflation: String,
    pub saving_at35: String,
    pub saving_at40: String,
    pub saving_at45: String,
    pub saving_at50: String,
    pub saving_at55: String,
    pub retire_fund_other: String,
    pub retire_pension: String,
    pub retire_return_after: String,
    pub retire_extra_expense: String,
    pub retire_spending_trend: String,
    pub retire_special_annual: String,
    pub legacy_fund: String,
    pub monte_carlo_volatility: String,
    pub monte_carlo_simulations: String,
    pub insurance_plans: Vec<InsurancePlanForm>,
    pub allocations: Vec<AllocationForm>,
}

impl Default for PlanForm {
    fn default() -> Self {
        Self {
            current_age: "30".to_string(),
            retire_age: "60".to_string(),
            life_expectancy: "85".to_string(),
            current_savings: "200,000".to_string(),
            monthly_saving: "10,000".to_string(),
            expected_return: "7".to_string(),
            inflation: "3".to_string(),
            saving_at35: "0".to_string(),
            saving_at40: "0".to_string(),
            saving_at45: "0".to_string(),
            saving_at50: "0".to_string(),
            saving_at55: "0".to_string(),
            retire_fund_other: "0".to_string(),
            retire_pension: "6,000".to_string(),
            retire_return_after: "0".to_string(),
            retire_extra_expense: "12,000".to_string(),
            retire_spending_trend: "0".to_string(),
            retire_special_annual: "18,400".to_string(),
            legacy_fund: "0".to_string(),
            monte_carlo_volatility: "6".to_string(),
            monte_carlo_simulations: "1,500".to_string(),
            insurance_plans: Vec::new(),
            allocations: Vec::new(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PolicyKindForm {
    #[default]
    #[serde(alias = "whole-life", alias = "whole_life")]
    WholeLife,
    #[serde(alias = "term-life", alias = "term_life")]
    TermLife,
    Endowment,
    Annuity,
    #[serde(alias = "unit-linked", alias = "unit_linked")]
    UnitLinked,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurrenderModeForm {
    #[default]
    Single,
    Table,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurrenderEntryForm {
    pub age: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PensionTierForm {
    pub start_age: String,
    pub end_age: String,
    pub amount: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InsurancePlanForm {
    pub active: bool,
    #[serde(rename = "type")]
    pub kind: PolicyKindForm,
    pub coverage_age: String,
    pub sum_assured: String,
    pub use_surrender: bool,
    pub surrender_age: String,
    pub surrender_value: String,
    pub surrender_mode: SurrenderModeForm,
    #[serde(alias = "surrenderTableData")]
    pub surrender_table: Vec<SurrenderEntryForm>,
    pub maturity_amount: String,
    pub cash_back_amount: String,
    pub cash_back_frequency: String,
    pub pension_amount: String,
    pub pension_start_age: String,
    pub pension_end_age: String,
    pub pension_percent: String,
    pub unequal_pension: bool,
    pub pension_tiers: Vec<PensionTierForm>,
    pub assumed_return: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AllocationForm {
    pub name: String,
    pub weight: String,
    pub expected_return: String,
    pub volatility: String,
}

/// Strip thousands separators and parse. Anything unparsable is 0; bad
/// numeric input is a normalization policy, never an error.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return 0.0;
    }
    cleaned.parse::<f64>().unwrap_or(0.0)
}

pub fn parse_age(raw: &str) -> u32 {
    let value = parse_number(raw);
    if value <= 0.0 { 0 } else { value as u32 }
}

pub fn build_inputs(
    form: &PlanForm,
    saving_mode: SavingMode,
    return_mode: ReturnMode,
) -> Result<RetirementInputs, String> {
    let current_age = parse_age(&form.current_age);
    let retire_age = parse_age(&form.retire_age);
    if retire_age < current_age {
        return Err("retireAge must be >= currentAge".to_string());
    }

    let saving_steps = match saving_mode {
        SavingMode::Flat => Vec::new(),
        SavingMode::Stepped => [
            (35_u32, &form.saving_at35),
            (40, &form.saving_at40),
            (45, &form.saving_at45),
            (50, &form.saving_at50),
            (55, &form.saving_at55),
        ]
        .into_iter()
        .map(|(age, raw)| SavingStep {
            age,
            monthly_saving: parse_number(raw),
        })
        .filter(|step| step.monthly_saving > 0.0)
        .collect(),
    };

    let allocations = match return_mode {
        ReturnMode::Average => Vec::new(),
        ReturnMode::Custom => form
            .allocations
            .iter()
            .map(|a| Allocation {
                name: a.name.clone(),
                weight: parse_number(&a.weight),
                expected_return: parse_number(&a.expected_return),
                volatility: parse_number(&a.volatility),
            })
            .collect(),
    };

    Ok(RetirementInputs {
        current_age,
        retire_age,
        life_expectancy: parse_age(&form.life_expectancy),
        current_savings: parse_number(&form.current_savings),
        monthly_saving: parse_number(&form.monthly_saving),
        expected_return: parse_number(&form.expected_return),
        inflation: parse_number(&form.inflation),
        saving_mode,
        saving_steps,
        retire_fund_other: parse_number(&form.retire_fund_other),
        retire_monthly_income: parse_number(&form.retire_pension),
        retire_extra_expense: parse_number(&form.retire_extra_expense),
        retire_return_after: parse_number(&form.retire_return_after),
        retire_spend_trend_percent: parse_number(&form.retire_spending_trend),
        retire_special_annual: parse_number(&form.retire_special_annual),
        legacy_fund: parse_number(&form.legacy_fund),
        return_mode,
        allocations,
        insurance_plans: form.insurance_plans.iter().map(build_plan).collect(),
    })
}

fn build_plan(form: &InsurancePlanForm) -> InsurancePlan {
    // Term cover has no cash value, so surrender is forced off for it.
    let surrender = if form.kind == PolicyKindForm::TermLife || !form.use_surrender {
        None
    } else {
        Some(match form.surrender_mode {
            SurrenderModeForm::Single => SurrenderTerms::Single {
                age: parse_age(&form.surrender_age),
                value: parse_number(&form.surrender_value),
            },
            SurrenderModeForm::Table => SurrenderTerms::Table(
                form.surrender_table
                    .iter()
                    .map(|entry| SurrenderEntry {
                        age: parse_age(&entry.age),
                        amount: parse_number(&entry.amount),
                    })
                    .collect(),
            ),
        })
    };

    let benefit = match form.kind {
        PolicyKindForm::WholeLife => PolicyBenefit::WholeLife,
        PolicyKindForm::TermLife => PolicyBenefit::TermLife,
        PolicyKindForm::UnitLinked => PolicyBenefit::UnitLinked,
        PolicyKindForm::Endowment => PolicyBenefit::Endowment {
            maturity_amount: parse_number(&form.maturity_amount),
            cash_back_amount: parse_number(&form.cash_back_amount),
            cash_back_frequency: parse_age(&form.cash_back_frequency).max(1),
        },
        PolicyKindForm::Annuity => {
            let tiers: Vec<PensionTier> = form
                .pension_tiers
                .iter()
                .map(|tier| PensionTier {
                    start_age: parse_age(&tier.start_age),
                    end_age: parse_age(&tier.end_age),
                    amount: parse_number(&tier.amount),
                })
                .collect();
            let schedule = if form.unequal_pension && !tiers.is_empty() {
                PensionSchedule::Tiered(tiers)
            } else {
                PensionSchedule::Flat {
                    amount: parse_number(&form.pension_amount),
                    percent_of_sum_assured: parse_number(&form.pension_percent),
                    start_age: parse_age(&form.pension_start_age),
                    end_age: parse_age(&form.pension_end_age),
                }
            };
            PolicyBenefit::Annuity { schedule }
        }
    };

    InsurancePlan {
        active: form.active,
        coverage_age: parse_age(&form.coverage_age),
        sum_assured: parse_number(&form.sum_assured),
        assumed_return: if form.kind == PolicyKindForm::UnitLinked {
            0.0
        } else {
            parse_number(&form.assumed_return)
        },
        surrender,
        benefit,
    }
}

/// Monte Carlo settings from the same form. A simulation count that parses
/// to 0 falls back to the stock 1500 trials; volatility is a percent field.
pub fn simulation_config(form: &PlanForm, seed: u64) -> SimulationConfig {
    let simulations = parse_number(&form.monte_carlo_simulations) as u32;
    SimulationConfig {
        simulations: if simulations == 0 {
            DEFAULT_SIMULATIONS
        } else {
            simulations
        },
        volatility: parse_number(&form.monte_carlo_volatility) / 100.0,
        seed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(form: &PlanForm) -> RetirementInputs {
        build_inputs(form, SavingMode::Flat, ReturnMode::Average).expect("valid form")
    }

    #[test]
    fn parse_number_strips_thousands_separators() {
        assert_eq!(parse_number("1,234,567.89"), 1_234_567.89);
        assert_eq!(parse_number(" 42 "), 42.0);
        assert_eq!(parse_number("-5"), -5.0);
    }

    #[test]
    fn parse_number_defaults_unparsable_input_to_zero() {
        assert_eq!(parse_number(""), 0.0);
        assert_eq!(parse_number("abc"), 0.0);
        assert_eq!(parse_number("12x"), 0.0);
        assert_eq!(parse_age("-3"), 0);
    }

    #[test]
    fn normalized_strings_round_trip_exactly() {
        let mut form = PlanForm::default();
        form.current_age = "31".to_string();
        form.retire_age = "62".to_string();
        form.life_expectancy = "88".to_string();
        form.current_savings = "123456.78".to_string();
        form.monthly_saving = "1500".to_string();
        form.expected_return = "6.5".to_string();
        form.inflation = "2.25".to_string();
        form.retire_extra_expense = "9000".to_string();
        form.retire_pension = "1200".to_string();
        form.legacy_fund = "50000".to_string();

        let inputs = flat(&form);
        assert_eq!(inputs.current_age, 31);
        assert_eq!(inputs.retire_age, 62);
        assert_eq!(inputs.life_expectancy, 88);
        assert_eq!(inputs.current_savings, 123_456.78);
        assert_eq!(inputs.monthly_saving, 1_500.0);
        assert_eq!(inputs.expected_return, 6.5);
        assert_eq!(inputs.inflation, 2.25);
        assert_eq!(inputs.retire_extra_expense, 9_000.0);
        assert_eq!(inputs.retire_monthly_income, 1_200.0);
        assert_eq!(inputs.legacy_fund, 50_000.0);
    }

    #[test]
    fn default_form_is_the_stock_starter_plan() {
        let inputs = flat(&PlanForm::default());
        assert_eq!(inputs.current_age, 30);
        assert_eq!(inputs.retire_age, 60);
        assert_eq!(inputs.life_expectancy, 85);
        assert_eq!(inputs.current_savings, 200_000.0);
        assert_eq!(inputs.monthly_saving, 10_000.0);
        assert_eq!(inputs.retire_monthly_income, 6_000.0);
    }

    #[test]
    fn rejects_retirement_before_current_age() {
        let mut form = PlanForm::default();
        form.current_age = "65".to_string();
        form.retire_age = "60".to_string();
        let err = build_inputs(&form, SavingMode::Flat, ReturnMode::Average)
            .expect_err("must reject inverted ages");
        assert!(err.contains("retireAge"));
    }

    #[test]
    fn stepped_mode_keeps_only_positive_overrides() {
        let mut form = PlanForm::default();
        form.saving_at35 = "12,000".to_string();
        form.saving_at45 = "garbage".to_string();
        form.saving_at55 = "20,000".to_string();

        let inputs =
            build_inputs(&form, SavingMode::Stepped, ReturnMode::Average).expect("valid form");
        assert_eq!(
            inputs.saving_steps,
            vec![
                SavingStep {
                    age: 35,
                    monthly_saving: 12_000.0
                },
                SavingStep {
                    age: 55,
                    monthly_saving: 20_000.0
                },
            ]
        );

        let flat_inputs = flat(&form);
        assert!(flat_inputs.saving_steps.is_empty());
    }

    #[test]
    fn allocations_apply_only_in_custom_mode() {
        let mut form = PlanForm::default();
        form.allocations = vec![AllocationForm {
            name: "equity".to_string(),
            weight: "60".to_string(),
            expected_return: "8".to_string(),
            volatility: "15".to_string(),
        }];

        assert!(flat(&form).allocations.is_empty());

        let custom =
            build_inputs(&form, SavingMode::Flat, ReturnMode::Custom).expect("valid form");
        assert_eq!(custom.allocations.len(), 1);
        assert_eq!(custom.allocations[0].weight, 60.0);
        assert_eq!(custom.allocations[0].expected_return, 8.0);
    }

    fn annuity_plan_form() -> InsurancePlanForm {
        InsurancePlanForm {
            active: true,
            kind: PolicyKindForm::Annuity,
            coverage_age: "99".to_string(),
            sum_assured: "500,000".to_string(),
            pension_amount: "60,000".to_string(),
            pension_start_age: "60".to_string(),
            pension_end_age: "80".to_string(),
            ..InsurancePlanForm::default()
        }
    }

    #[test]
    fn term_life_surrender_is_forced_off() {
        let mut form = PlanForm::default();
        form.insurance_plans = vec![InsurancePlanForm {
            active: true,
            kind: PolicyKindForm::TermLife,
            use_surrender: true,
            surrender_age: "55".to_string(),
            surrender_value: "100,000".to_string(),
            ..InsurancePlanForm::default()
        }];

        let inputs = flat(&form);
        assert_eq!(inputs.insurance_plans[0].surrender, None);
        assert_eq!(inputs.insurance_plans[0].benefit, PolicyBenefit::TermLife);
    }

    #[test]
    fn unit_linked_assumed_return_is_forced_to_zero() {
        let mut form = PlanForm::default();
        form.insurance_plans = vec![InsurancePlanForm {
            active: true,
            kind: PolicyKindForm::UnitLinked,
            assumed_return: "5".to_string(),
            ..InsurancePlanForm::default()
        }];

        let inputs = flat(&form);
        assert_eq!(inputs.insurance_plans[0].assumed_return, 0.0);
    }

    #[test]
    fn cash_back_frequency_is_at_least_one_year() {
        let mut form = PlanForm::default();
        form.insurance_plans = vec![InsurancePlanForm {
            active: true,
            kind: PolicyKindForm::Endowment,
            coverage_age: "60".to_string(),
            maturity_amount: "1,000,000".to_string(),
            cash_back_amount: "50,000".to_string(),
            cash_back_frequency: "0".to_string(),
            ..InsurancePlanForm::default()
        }];

        let inputs = flat(&form);
        assert_eq!(
            inputs.insurance_plans[0].benefit,
            PolicyBenefit::Endowment {
                maturity_amount: 1_000_000.0,
                cash_back_amount: 50_000.0,
                cash_back_frequency: 1,
            }
        );
    }

    #[test]
    fn annuity_prefers_tiers_only_when_marked_unequal() {
        let mut tiered = annuity_plan_form();
        tiered.unequal_pension = true;
        tiered.pension_tiers = vec![PensionTierForm {
            start_age: "60".to_string(),
            end_age: "70".to_string(),
            amount: "40,000".to_string(),
        }];

        let mut form = PlanForm::default();
        form.insurance_plans = vec![tiered, annuity_plan_form()];
        let inputs = flat(&form);

        assert_eq!(
            inputs.insurance_plans[0].benefit,
            PolicyBenefit::Annuity {
                schedule: PensionSchedule::Tiered(vec![PensionTier {
                    start_age: 60,
                    end_age: 70,
                    amount: 40_000.0,
                }]),
            }
        );
        assert_eq!(
            inputs.insurance_plans[1].benefit,
            PolicyBenefit::Annuity {
                schedule: PensionSchedule::Flat {
                    amount: 60_000.0,
                    percent_of_sum_assured: 0.0,
                    start_age: 60,
                    end_age: 80,
                },
            }
        );
    }

    #[test]
    fn surrender_table_entries_parse_with_separators() {
        let mut form = PlanForm::default();
        form.insurance_plans = vec![InsurancePlanForm {
            active: true,
            use_surrender: true,
            surrender_mode: SurrenderModeForm::Table,
            surrender_table: vec![
                SurrenderEntryForm {
                    age: "50".to_string(),
                    amount: "120,000".to_string(),
                },
                SurrenderEntryForm {
                    age: "55".to_string(),
                    amount: "180,000".to_string(),
                },
            ],
            ..InsurancePlanForm::default()
        }];

        let inputs = flat(&form);
        assert_eq!(
            inputs.insurance_plans[0].surrender,
            Some(SurrenderTerms::Table(vec![
                SurrenderEntry {
                    age: 50,
                    amount: 120_000.0
                },
                SurrenderEntry {
                    age: 55,
                    amount: 180_000.0
                },
            ]))
        );
    }

    #[test]
    fn simulation_settings_come_from_the_form() {
        let mut form = PlanForm::default();
        let config = simulation_config(&form, 9);
        assert_eq!(config.simulations, 1_500);
        assert_eq!(config.volatility, 0.06);
        assert_eq!(config.seed, 9);

        form.monte_carlo_simulations = "oops".to_string();
        form.monte_carlo_volatility = "12".to_string();
        let config = simulation_config(&form, 9);
        assert_eq!(config.simulations, DEFAULT_SIMULATIONS);
        assert_eq!(config.volatility, 0.12);
    }
}

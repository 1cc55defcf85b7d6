use super::types::{InsurancePlan, PensionSchedule, PolicyBenefit, SurrenderTerms};

/// Total cash paid out by every active policy at `age`. Cash-back timing is
/// anchored on `policy_start_age` (the year the plan entered the household's
/// books, which all callers take to be the holder's current age).
///
/// Every projection context (forward accumulation, the retirement-year pass,
/// the backward target recurrence, the money-out walk, Monte Carlo trials,
/// and the chart series) must route through this one function.
pub fn annual_inflow(age: u32, policy_start_age: u32, plans: &[InsurancePlan]) -> f64 {
    plans
        .iter()
        .filter(|plan| plan.active)
        .map(|plan| plan_inflow(age, policy_start_age, plan))
        .sum()
}

fn plan_inflow(age: u32, policy_start_age: u32, plan: &InsurancePlan) -> f64 {
    let mut total = surrender_inflow(age, plan);

    match &plan.benefit {
        PolicyBenefit::WholeLife | PolicyBenefit::TermLife | PolicyBenefit::UnitLinked => {}
        PolicyBenefit::Endowment {
            maturity_amount,
            cash_back_amount,
            cash_back_frequency,
        } => {
            if age == plan.coverage_age {
                total += maturity_amount;
            }
            if *cash_back_amount > 0.0 && age > policy_start_age && age <= plan.coverage_age {
                let policy_year = age - policy_start_age;
                let frequency = (*cash_back_frequency).max(1);
                if policy_year % frequency == 0 {
                    total += cash_back_amount;
                }
            }
        }
        PolicyBenefit::Annuity { schedule } => match schedule {
            PensionSchedule::Flat {
                amount,
                percent_of_sum_assured,
                start_age,
                end_age,
            } => {
                let payout = if *percent_of_sum_assured > 0.0 {
                    plan.sum_assured * percent_of_sum_assured / 100.0
                } else {
                    *amount
                };
                if (*start_age..=*end_age).contains(&age) {
                    total += payout;
                }
            }
            PensionSchedule::Tiered(tiers) => {
                // Overlapping tiers all pay.
                for tier in tiers {
                    if (tier.start_age..=tier.end_age).contains(&age) {
                        total += tier.amount;
                    }
                }
            }
        },
    }

    total
}

fn surrender_inflow(age: u32, plan: &InsurancePlan) -> f64 {
    match &plan.surrender {
        None => 0.0,
        Some(SurrenderTerms::Single {
            age: surrender_age,
            value,
        }) => {
            if age == *surrender_age {
                *value
            } else {
                0.0
            }
        }
        Some(SurrenderTerms::Table(entries)) => entries
            .iter()
            .find(|entry| entry.age == age)
            .map_or(0.0, |entry| entry.amount),
    }
}

/// Value at retirement of every inflow landing before `retire_age`, each
/// compounded forward at `annual_rate` (a fraction, not a percent).
pub fn inflow_future_value(
    plans: &[InsurancePlan],
    current_age: u32,
    retire_age: u32,
    annual_rate: f64,
) -> f64 {
    let mut total = 0.0;
    for age in current_age..retire_age {
        let inflow = annual_inflow(age, current_age, plans);
        if inflow > 0.0 {
            let years_to_grow = (retire_age - age) as i32;
            total += inflow * (1.0 + annual_rate).powi(years_to_grow);
        }
    }
    total
}

/// Aggregate death benefit still in force at `age`: active policies within
/// their coverage age that have not passed their surrender point. A
/// table-mode policy counts as surrendered once the last table age is past.
pub fn covered_sum_assured(age: u32, plans: &[InsurancePlan]) -> f64 {
    plans
        .iter()
        .filter(|plan| plan.active && age <= plan.coverage_age && !surrendered_by(age, plan))
        .map(|plan| plan.sum_assured)
        .sum()
}

fn surrendered_by(age: u32, plan: &InsurancePlan) -> bool {
    match &plan.surrender {
        None => false,
        Some(SurrenderTerms::Single {
            age: surrender_age, ..
        }) => age > *surrender_age,
        Some(SurrenderTerms::Table(entries)) => entries
            .iter()
            .map(|entry| entry.age)
            .max()
            .is_some_and(|last| age > last),
    }
}

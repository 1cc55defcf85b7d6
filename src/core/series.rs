use super::insurance;
use super::projector;
use super::types::{CalculationResult, ProjectionSeries, RetirementInputs, SavingMode};

/// Chart-facing view of the plan: one value per age from the current age to
/// life expectancy. The wealth line repeats the projector's accumulation and
/// spend-down arithmetic so the two can never disagree; the displayed balance
/// is floored at zero once the fund is exhausted.
pub fn build_projection_series(
    inputs: &RetirementInputs,
    result: &CalculationResult,
) -> ProjectionSeries {
    let start_age = inputs.current_age;
    let end_age = inputs.life_expectancy.max(start_age);
    let r_pre = inputs.effective_expected_return() / 100.0;
    let r_post = inputs.retire_return_after / 100.0;
    let yearly_income = inputs.retire_monthly_income * 12.0;
    let plans = &inputs.insurance_plans;
    let len = (end_age - start_age) as usize + 1;

    let mut labels = Vec::with_capacity(len);
    let mut actual = Vec::with_capacity(len);
    let mut required = Vec::with_capacity(len);
    let mut insurance_inflows = Vec::with_capacity(len);
    let mut sum_assured = Vec::with_capacity(len);
    let mut actual_history = vec![None; len];

    if inputs.saving_mode == SavingMode::Stepped {
        for step in &inputs.saving_steps {
            if (start_age..=end_age).contains(&step.age) {
                actual_history[(step.age - start_age) as usize] = Some(step.monthly_saving);
            }
        }
    }

    let mut balance = inputs.current_savings;
    if inputs.years_to_retire() == 0 {
        // Already at (or past) retirement: the first point is the projected
        // fund, retirement-year payouts and the lump sum included.
        balance += insurance::annual_inflow(inputs.retire_age, start_age, plans);
        balance += inputs.retire_fund_other;
    }

    labels.push(start_age);
    actual.push(balance);
    required.push(required_at(start_age, inputs, result));
    insurance_inflows.push(insurance::annual_inflow(start_age, start_age, plans));
    sum_assured.push(insurance::covered_sum_assured(start_age, plans));

    for age in start_age..end_age {
        if age < inputs.retire_age {
            balance = balance * (1.0 + r_pre)
                + projector::annual_saving(inputs, age)
                + insurance::annual_inflow(age, start_age, plans);
            if age + 1 == inputs.retire_age {
                // Retirement-year payouts and the lump sum land with the
                // transition, so the point at the retirement age equals the
                // projected fund.
                balance += insurance::annual_inflow(inputs.retire_age, start_age, plans);
                balance += inputs.retire_fund_other;
            }
        } else {
            // The retirement-year inflow was counted at the transition.
            let inflow = if age == inputs.retire_age {
                0.0
            } else {
                insurance::annual_inflow(age, start_age, plans)
            };
            let net_outflow = expense_for(result, age) - yearly_income - inflow;
            balance = balance * (1.0 + r_post) - net_outflow;
        }

        balance = if balance.is_finite() {
            balance.max(0.0)
        } else {
            0.0
        };

        let next_age = age + 1;
        labels.push(next_age);
        actual.push(balance);
        required.push(required_at(next_age, inputs, result));
        insurance_inflows.push(insurance::annual_inflow(next_age, start_age, plans));
        sum_assured.push(insurance::covered_sum_assured(next_age, plans));
    }

    ProjectionSeries {
        labels,
        actual,
        required,
        actual_history,
        insurance_inflows,
        sum_assured,
    }
}

fn required_at(age: u32, inputs: &RetirementInputs, result: &CalculationResult) -> Option<f64> {
    if age < inputs.retire_age {
        Some(result.target_fund)
    } else {
        None
    }
}

fn expense_for(result: &CalculationResult, age: u32) -> f64 {
    result
        .expense_schedule
        .iter()
        .find(|row| row.age == age)
        .map_or(0.0, |row| row.yearly)
}

use super::insurance;
use super::types::{CalculationResult, ExpenseRow, PlanStatus, RetirementInputs, SavingMode};

/// Below this magnitude a return rate is treated as zero and the linear
/// saving formula replaces the annuity factor.
const ZERO_RATE_EPS: f64 = 1e-9;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Annual saving for one accumulation year. Steps only ratchet upward: any
/// step at or below the current age with a positive override replaces the
/// running value, later steps replace it again.
pub(crate) fn annual_saving(inputs: &RetirementInputs, age: u32) -> f64 {
    let mut monthly = inputs.monthly_saving;
    if inputs.saving_mode == SavingMode::Stepped {
        for step in &inputs.saving_steps {
            if age >= step.age && step.monthly_saving > 0.0 {
                monthly = step.monthly_saving;
            }
        }
    }
    monthly * 12.0
}

pub fn run_projection(inputs: &RetirementInputs) -> CalculationResult {
    let years_to_retire = inputs.years_to_retire();
    let years_in_retirement = inputs.years_in_retirement();

    let r_inf = inputs.inflation / 100.0;
    let r_pre = inputs.effective_expected_return() / 100.0;
    let r_post = inputs.retire_return_after / 100.0;

    let plans = &inputs.insurance_plans;
    let policy_start_age = inputs.current_age;
    let mut insurance_cash_inflow = 0.0;

    // Forward accumulation up to the year before retirement.
    let mut wealth = inputs.current_savings;
    for age in inputs.current_age..inputs.retire_age {
        let saving = annual_saving(inputs, age);
        let inflow = insurance::annual_inflow(age, policy_start_age, plans);
        if inflow > 0.0 {
            insurance_cash_inflow += inflow;
        }
        wealth = wealth * (1.0 + r_pre) + saving + inflow;
    }

    // Payouts landing in the retirement year itself, then the one-off lump sum.
    let retire_year_inflow = insurance::annual_inflow(inputs.retire_age, policy_start_age, plans);
    if retire_year_inflow > 0.0 {
        wealth += retire_year_inflow;
        insurance_cash_inflow += retire_year_inflow;
    }
    wealth += inputs.retire_fund_other;
    let projected_fund = wealth;

    let fv_lump_sum = inputs.current_savings * (1.0 + r_pre).powi(years_to_retire as i32);
    let annual_pmt = inputs.monthly_saving * 12.0;
    let fv_annuity = if r_pre.abs() < ZERO_RATE_EPS {
        annual_pmt * years_to_retire as f64
    } else {
        annual_pmt * (((1.0 + r_pre).powi(years_to_retire as i32) - 1.0) / r_pre)
    };

    // Expense schedule. Each figure is rounded to 2 decimals and the rounded
    // value seeds the next year's growth, the way a yearly statement would
    // print it. The small compounding drift that causes is intentional.
    let mut running_monthly =
        round2(inputs.retire_extra_expense * (1.0 + r_inf).powi(years_to_retire as i32));
    let mut expense_schedule = Vec::with_capacity(years_in_retirement as usize + 1);
    for i in 0..=years_in_retirement {
        let yearly = round2(running_monthly * 12.0);
        expense_schedule.push(ExpenseRow {
            age: inputs.retire_age + i,
            monthly: running_monthly,
            yearly,
        });
        running_monthly = round2(running_monthly * (1.0 + r_inf));
    }

    let total_lifetime_expense: f64 = expense_schedule.iter().map(|row| row.yearly).sum();
    let yearly_income = inputs.retire_monthly_income * 12.0;

    // Backward recurrence: capital needed at retirement to fund every later
    // net outflow plus the bequest, discounted at the post-retirement return.
    let mut needed_capital = inputs.legacy_fund;
    for row in expense_schedule.iter().rev() {
        let inflow = insurance::annual_inflow(row.age, policy_start_age, plans);
        if inflow > 0.0 {
            insurance_cash_inflow += inflow;
        }
        let net_flow = row.yearly - yearly_income - inflow;
        needed_capital = (needed_capital + net_flow) / (1.0 + r_post);
    }
    let target_fund = needed_capital;

    // Flat saving that closes the gap between the target and what current
    // assets plus pre-retirement policy payouts grow into by retirement.
    let mut monthly_needed = 0.0;
    if years_to_retire > 0 {
        let n = years_to_retire as f64;
        let covered = fv_lump_sum
            + insurance::inflow_future_value(plans, inputs.current_age, inputs.retire_age, r_pre);
        let shortfall = target_fund - covered;
        monthly_needed = if r_pre.abs() < ZERO_RATE_EPS {
            shortfall / (n * 12.0)
        } else {
            let annuity_factor = ((1.0 + r_pre).powi(years_to_retire as i32) - 1.0) / r_pre;
            shortfall / annuity_factor / 12.0
        };
        monthly_needed = monthly_needed.max(0.0);
    }

    let gap = projected_fund - target_fund;
    let status = if gap >= -1.0 {
        PlanStatus::Enough
    } else {
        PlanStatus::Short
    };
    let success_probability = if target_fund > 0.0 {
        (projected_fund / target_fund * 100.0).min(100.0)
    } else {
        100.0
    };
    let fv_expense_monthly = expense_schedule.first().map_or(0.0, |row| row.monthly);

    // Spend-down walk over the same schedule to find the first age at which
    // the fund goes negative.
    let mut money_out_age = inputs.life_expectancy;
    let mut ran_out = false;
    let mut current_wealth = projected_fund;
    for row in &expense_schedule {
        let inflow = insurance::annual_inflow(row.age, policy_start_age, plans);
        let net_outflow = row.yearly - yearly_income - inflow;
        current_wealth = current_wealth * (1.0 + r_post) - net_outflow;
        if current_wealth < 0.0 && !ran_out {
            money_out_age = row.age;
            ran_out = true;
        }
    }

    CalculationResult {
        target_fund,
        projected_fund,
        gap,
        years_to_retire,
        years_in_retirement,
        monthly_needed,
        expense_schedule,
        total_lifetime_expense,
        fv_expense_monthly,
        success_probability,
        status,
        money_out_age,
        insurance_cash_inflow,
        fv_lump_sum,
        fv_annuity,
    }
}

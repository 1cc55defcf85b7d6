use std::f64::consts::PI;

use super::insurance;
use super::types::{FinalBalance, MonteCarloResult, RetirementInputs};

pub const DEFAULT_SIMULATIONS: u32 = 1500;
pub const DEFAULT_VOLATILITY: f64 = 0.06;
pub const DEFAULT_SEED: u64 = 42;

/// Knobs for the stochastic run. The same volatility is applied to the
/// pre- and post-retirement draws even though their means differ.
#[derive(Debug, Clone, Copy)]
pub struct SimulationConfig {
    pub simulations: u32,
    pub volatility: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            volatility: DEFAULT_VOLATILITY,
            seed: DEFAULT_SEED,
        }
    }
}

pub fn run_monte_carlo(inputs: &RetirementInputs, config: &SimulationConfig) -> MonteCarloResult {
    let simulations = config.simulations.max(1);
    let volatility = config.volatility;

    let years_to_retire = inputs.years_to_retire();
    let total_years = inputs.life_expectancy.saturating_sub(inputs.current_age) as usize;
    let r_inf = inputs.inflation / 100.0;
    let r_pre = inputs.effective_expected_return() / 100.0;
    let r_post = inputs.retire_return_after / 100.0;
    let yearly_income = inputs.retire_monthly_income * 12.0;
    let base_annual_expense = inputs.retire_extra_expense * 12.0;
    let plans = &inputs.insurance_plans;
    let policy_start_age = inputs.current_age;

    let mut trials: Vec<Vec<f64>> = Vec::with_capacity(simulations as usize);
    let mut final_balances = Vec::with_capacity(simulations as usize);
    let mut passed_count = 0_u32;

    for trial in 0..simulations {
        let mut rng = Rng::new(derive_seed(config.seed, trial));
        let mut balance = inputs.current_savings;
        let mut series = Vec::with_capacity(total_years + 1);

        // Start-of-year balances; the entry for the terminal age is pushed
        // before any further update would apply.
        for year in 0..=total_years {
            let age = inputs.current_age + year as u32;
            series.push(balance);
            if year == total_years {
                break;
            }

            let inflow = insurance::annual_inflow(age, policy_start_age, plans);
            if age < inputs.retire_age {
                let annual_return = rng.normal(r_pre, volatility);
                balance = balance * (1.0 + annual_return) + inputs.monthly_saving * 12.0 + inflow;
                if age + 1 == inputs.retire_age {
                    balance += inputs.retire_fund_other;
                }
            } else {
                let annual_return = rng.normal(r_post, volatility);
                let years_retired = (age - inputs.retire_age) as i32;
                let expense_this_year = base_annual_expense
                    * (1.0 + r_inf).powi(years_to_retire as i32 + years_retired);
                let withdrawal = (expense_this_year - yearly_income).max(0.0);
                balance = balance * (1.0 + annual_return) + inflow - withdrawal;
            }

            // One absurd draw must not poison the rest of the trial.
            if !balance.is_finite() {
                balance = 0.0;
            }
        }

        let broke_in_retirement = series.iter().enumerate().any(|(year, value)| {
            inputs.current_age + year as u32 >= inputs.retire_age && *value <= 0.0
        });
        let final_balance = series.last().copied().unwrap_or(0.0);
        let pass = !broke_in_retirement && final_balance >= inputs.legacy_fund;
        if pass {
            passed_count += 1;
        }
        trials.push(series);
        final_balances.push(FinalBalance {
            balance: final_balance,
            pass,
        });
    }

    let mut p5_series = Vec::with_capacity(total_years + 1);
    let mut p50_series = Vec::with_capacity(total_years + 1);
    let mut p95_series = Vec::with_capacity(total_years + 1);
    let mut column = Vec::with_capacity(trials.len());
    for year in 0..=total_years {
        column.clear();
        column.extend(trials.iter().map(|series| series[year].max(0.0)));
        column.sort_by(|a, b| a.total_cmp(b));
        p5_series.push(column[percentile_index(column.len(), 0.05)]);
        p50_series.push(column[percentile_index(column.len(), 0.50)]);
        p95_series.push(column[percentile_index(column.len(), 0.95)]);
    }

    MonteCarloResult {
        probability: passed_count as f64 / simulations as f64,
        p5: p5_series.last().copied().unwrap_or(0.0),
        p50: p50_series.last().copied().unwrap_or(0.0),
        p95: p95_series.last().copied().unwrap_or(0.0),
        p5_series,
        p50_series,
        p95_series,
        final_balances,
    }
}

fn percentile_index(count: usize, p: f64) -> usize {
    ((count - 1) as f64 * p).floor() as usize
}

fn derive_seed(base_seed: u64, trial: u32) -> u64 {
    splitmix64(base_seed ^ ((trial as u64) << 32) ^ trial as u64)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

pub(crate) struct Rng {
    state: u64,
    cached_normal: Option<f64>,
}

impl Rng {
    pub(crate) fn new(seed: u64) -> Self {
        let state = if seed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            seed
        };
        Self {
            state,
            cached_normal: None,
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn next_f64(&mut self) -> f64 {
        const DENOM: f64 = (1_u64 << 53) as f64;
        let v = self.next_u64() >> 11;
        ((v as f64) + 0.5) / DENOM
    }

    fn standard_normal(&mut self) -> f64 {
        if let Some(z) = self.cached_normal.take() {
            return z;
        }

        // Box-Muller: two uniforms give a pair of independent normals, the
        // second is cached for the next call.
        let u1 = self.next_f64().max(1e-12);
        let u2 = self.next_f64();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * PI * u2;

        let z0 = r * theta.cos();
        let z1 = r * theta.sin();
        self.cached_normal = Some(z1);
        z0
    }

    pub(crate) fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        mean + std_dev * self.standard_normal()
    }
}

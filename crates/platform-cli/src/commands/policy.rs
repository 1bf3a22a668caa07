use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::config;
use crate::errors::prelude::Result;
use crate::output::CliResponse;

#[derive(Args, Debug)]
pub struct PolicyArgs {
    /// Write the config's plan table to this path instead of only printing it
    #[arg(long, value_name = "PATH")]
    pub write_to: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct PlanRow {
    pub plan: String,
    pub capacity: f64,
    pub rate: f64,
    pub is_default: bool,
}

#[derive(Debug, Serialize)]
pub struct PolicyReport {
    pub default_plan: String,
    pub plans: Vec<PlanRow>,
}

pub fn run(args: &PolicyArgs, config_path: Option<&str>) -> Result<CliResponse<PolicyReport>> {
    let limiter_config = config::load(config_path)?;

    if let Some(path) = &args.write_to {
        config::save(&limiter_config, path)?;
    }

    let mut plans: Vec<PlanRow> = limiter_config
        .plans
        .plans
        .iter()
        .map(|(name, limit)| PlanRow {
            plan: name.clone(),
            capacity: limit.capacity,
            rate: limit.rate,
            is_default: *name == limiter_config.plans.default_plan,
        })
        .collect();
    plans.sort_by(|a, b| a.plan.cmp(&b.plan));

    let report = PolicyReport {
        default_plan: limiter_config.plans.default_plan.clone(),
        plans,
    };
    Ok(CliResponse::success("policy", report))
}

/// Render a [`PolicyReport`]'s rows as a `tabled` table, used by the
/// `table` output format.
pub fn render_table(report: &PolicyReport) -> String {
    tabled::Table::new(&report.plans).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_lists_three_plans() {
        let args = PolicyArgs { write_to: None };
        let response = run(&args, None).unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.plans.len(), 3);
        assert_eq!(data.default_plan, "free");
    }

    #[test]
    fn render_table_includes_plan_names() {
        let args = PolicyArgs { write_to: None };
        let report = run(&args, None).unwrap().data.unwrap();
        let table = render_table(&report);
        assert!(table.contains("free"));
        assert!(table.contains("enterprise"));
    }
}

pub mod config;
pub mod plan;
pub mod run;

use intervalrun_core::{Config, SessionInputs};

/// Duration flags shared by `run` and `plan`. Missing values fall back to config.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DurationArgs {
    /// Total session length in minutes
    #[arg(long, allow_hyphen_values = true)]
    pub total: Option<String>,
    /// Run segment length in minutes
    #[arg(long, allow_hyphen_values = true)]
    pub run: Option<String>,
    /// Walk segment length in minutes
    #[arg(long, allow_hyphen_values = true)]
    pub walk: Option<String>,
}

impl DurationArgs {
    pub fn resolve(&self, config: &Config) -> Result<SessionInputs, intervalrun_core::PlanError> {
        let defaults = &config.session;
        SessionInputs::parse(
            &self.total.clone().unwrap_or_else(|| defaults.total_min.to_string()),
            &self.run.clone().unwrap_or_else(|| defaults.run_min.to_string()),
            &self.walk.clone().unwrap_or_else(|| defaults.walk_min.to_string()),
        )
    }
}

/// `m:ss`, as shown on the timer face.
pub fn clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

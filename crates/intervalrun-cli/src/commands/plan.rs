use intervalrun_core::{Config, Plan};

use super::{clock, DurationArgs};

#[derive(clap::Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub durations: DurationArgs,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let inputs = args.durations.resolve(&config)?;
    let plan = Plan::build(&inputs)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{:>3}  {:<5} {:>8} {:>9}", "#", "kind", "duration", "starts at");
    for (i, segment) in plan.iter().enumerate() {
        println!(
            "{:>3}  {:<5} {:>8} {:>9}",
            i + 1,
            segment.kind.label(),
            clock(segment.duration_secs),
            clock(plan.cumulative_secs(i)),
        );
    }
    println!("total {} ({} segments)", clock(plan.total_secs()), plan.len());
    Ok(())
}

use super::Context;
use colored::Colorize;
use stackflow_core::PlanRequest;

pub async fn handle(
    ctx: &Context,
    group: String,
    stack_template_id: String,
    json: bool,
) -> anyhow::Result<()> {
    let mut stack = ctx.base_stack("plan");

    let req = PlanRequest {
        stack_template_id,
        group_name: group,
    };
    let response = stack.handle_plan(&req).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!(
        "{}",
        format!("Machines to create ({}):", response.machines.len()).bold()
    );
    if response.machines.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for machine in &response.machines {
        let region = if machine.region.is_empty() {
            "-".to_string()
        } else {
            machine.region.clone()
        };
        println!(
            "  • {} [{} / {}]",
            machine.label.cyan(),
            machine.provider,
            region
        );
        for (key, value) in &machine.attributes {
            println!("      {}: {}", key.dimmed(), value);
        }
    }
    Ok(())
}

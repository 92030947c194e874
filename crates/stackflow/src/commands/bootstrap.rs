use super::Context;
use colored::Colorize;
use stackflow_core::BootstrapRequest;

pub async fn handle(
    ctx: &Context,
    group: String,
    identifiers: Vec<String>,
    destroy: bool,
) -> anyhow::Result<()> {
    if destroy {
        println!("{}", "Destroying bootstrap resources...".yellow());
    } else {
        println!("{}", "Creating bootstrap resources...".yellow());
    }
    println!("Group: {}", group.cyan());
    println!("Executor: {}", ctx.endpoint.cyan());
    for identifier in &identifiers {
        println!("  • {}", identifier.cyan());
    }

    let mut stack = ctx.base_stack("bootstrap");
    println!("Trace: {}", stack.context().trace_id.dimmed());

    let req = BootstrapRequest {
        group_name: group,
        identifiers,
        destroy,
    };
    stack.handle_bootstrap(&req).await?;

    println!();
    if destroy {
        println!("{}", "✓ Bootstrap resources destroyed".green().bold());
    } else {
        println!("{}", "✓ Bootstrap resources created".green().bold());
    }
    Ok(())
}

use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::database::seed as seeding;

pub async fn migrate(ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    let pending = ctx.db.pending_migrations().await?;
    if pending.is_empty() {
        return output_success(&output_format, "Database is up to date", Some(json!({ "applied": [] })));
    }

    ctx.db.migrate().await?;

    if let OutputFormat::Text = output_format {
        for name in &pending {
            println!("  applied {}", name);
        }
    }
    output_success(
        &output_format,
        &format!("Applied {} migration(s)", pending.len()),
        Some(json!({ "applied": pending })),
    )
}

pub async fn seed(ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    ctx.db.migrate().await?;
    let report = seeding::seed(&ctx.db, &ctx.users).await?;

    output_success(
        &output_format,
        &format!(
            "Seeded {} role(s), {} user(s), {} list(s)",
            report.roles_created, report.users_created, report.lists_created
        ),
        Some(json!({
            "roles_created": report.roles_created,
            "users_created": report.users_created,
            "lists_created": report.lists_created,
        })),
    )
}

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{CliContext, OutputFormat};
use crate::database::roles;
use crate::identity::UserManager;
use crate::types::Role;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "List user accounts")]
    List,

    #[command(about = "Create a user account")]
    Create {
        #[arg(help = "Email address, also the user name")]
        email: String,

        #[arg(long, help = "Password; omit for an account that signs in externally")]
        password: Option<String>,

        #[arg(long, help = "Role to grant, e.g. Administrator")]
        role: Option<String>,

        #[arg(long, help = "Mark the email address as already confirmed")]
        confirmed: bool,
    },

    #[command(about = "Grant a role to an existing user")]
    AddRole {
        #[arg(help = "Email address of the user")]
        email: String,

        #[arg(help = "Role name, e.g. Administrator")]
        role: String,
    },
}

pub async fn handle(cmd: UserCommands, ctx: &CliContext, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::List => {
            let users = ctx.users.list().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }

            let mut rows = Vec::with_capacity(users.len());
            for user in &users {
                let logins: Vec<String> = ctx
                    .users
                    .logins(user)
                    .await?
                    .into_iter()
                    .map(|login| login.login_provider)
                    .collect();
                rows.push((user, ctx.users.roles(user).await?, logins));
            }

            match output_format {
                OutputFormat::Json => {
                    let users: Vec<_> = rows
                        .iter()
                        .map(|(user, roles, logins)| {
                            json!({
                                "id": user.id,
                                "email": user.email,
                                "email_confirmed": user.email_confirmed,
                                "two_factor_enabled": user.two_factor_enabled,
                                "external_provider": user.external_provider().map(|p| p.scheme()),
                                "locked_out": user.is_locked_out(chrono::Utc::now()),
                                "roles": roles,
                                "logins": logins,
                                "created_at": user.created_at,
                            })
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<32} {:<10} {:<5} {}", "ID", "EMAIL", "CONFIRMED", "2FA", "ROLES");
                    println!("{}", "-".repeat(100));

                    for (user, roles, _) in &rows {
                        println!(
                            "{:<38} {:<32} {:<10} {:<5} {}",
                            user.id,
                            user.email.as_deref().unwrap_or("-"),
                            if user.email_confirmed { "yes" } else { "no" },
                            if user.two_factor_enabled { "on" } else { "off" },
                            roles.join(", ")
                        );
                    }
                }
            }

            Ok(())
        }
        UserCommands::Create { email, password, role, confirmed } => {
            let role = role.map(|name| parse_role(&name)).transpose()?;

            let mut user = UserManager::new_user(&email);
            user.email_confirmed = confirmed;
            let user = ctx.users.create(user, password.as_deref()).await?;

            if let Some(role) = role {
                roles::ensure(ctx.db.pool(), role.as_str()).await?;
                ctx.users.add_to_role(&user, role.as_str()).await?;
            }

            output_success(
                &output_format,
                &format!("User '{}' created", email),
                Some(json!({ "id": user.id, "email": user.email, "role": role.map(|r| r.as_str()) })),
            )
        }
        UserCommands::AddRole { email, role } => {
            let role = parse_role(&role)?;
            let user = ctx
                .users
                .find_by_email(&email)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", email))?;

            roles::ensure(ctx.db.pool(), role.as_str()).await?;
            ctx.users.add_to_role(&user, role.as_str()).await?;

            output_success(
                &output_format,
                &format!("Granted {} to '{}'", role, email),
                Some(json!({ "id": user.id, "role": role.as_str() })),
            )
        }
    }
}

fn parse_role(name: &str) -> anyhow::Result<Role> {
    Role::parse(name).ok_or_else(|| {
        let known: Vec<_> = Role::ALL.iter().map(|r| r.as_str()).collect();
        anyhow::anyhow!("Unknown role '{}' (known roles: {})", name, known.join(", "))
    })
}

use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::AuditStamp;
use crate::database::{roles, todo_items, todo_lists};
use crate::identity::{IdentityError, UserManager};
use crate::types::{Colour, Role};

pub const ADMINISTRATOR_EMAIL: &str = "administrator@localhost";
pub const ADMINISTRATOR_PASSWORD: &str = "Administrator1!";

const DEMO_LIST_TITLE: &str = "Todo List";
const DEMO_ITEMS: [&str; 4] = [
    "Make a todo list 📃",
    "Check off the first item ✅",
    "Realise you've already done two things on the list! 🤯",
    "Reward yourself with a nice, long nap 🏆",
];

/// What a seeding run actually created
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub roles_created: usize,
    pub users_created: usize,
    pub lists_created: usize,
}

/// Migrate and seed as the configuration asks
pub async fn initialise(
    db: &DatabaseManager,
    users: &UserManager,
    config: &DatabaseConfig,
) -> Result<(), IdentityError> {
    if config.auto_migrate {
        db.migrate().await?;
    }
    if config.seed_demo_data {
        seed(db, users).await?;
    }
    Ok(())
}

/// Default roles, the administrator account and the demo list. Safe to run repeatedly.
pub async fn seed(db: &DatabaseManager, users: &UserManager) -> Result<SeedReport, IdentityError> {
    let pool = db.pool();
    let mut report = SeedReport::default();

    let (administrator_role, created) = roles::ensure(pool, Role::Administrator.as_str()).await?;
    if created {
        report.roles_created += 1;
    }

    if users.find_by_name(ADMINISTRATOR_EMAIL).await?.is_none() {
        let administrator = users
            .create(UserManager::new_user(ADMINISTRATOR_EMAIL), Some(ADMINISTRATOR_PASSWORD))
            .await?;
        users.add_to_role(&administrator, &administrator_role.name).await?;
        report.users_created += 1;
    }

    if todo_lists::count(pool).await? == 0 {
        seed_demo_list(db).await?;
        report.lists_created += 1;
    }

    info!(
        "Seeding complete: {} roles, {} users, {} lists created",
        report.roles_created, report.users_created, report.lists_created
    );
    Ok(report)
}

async fn seed_demo_list(db: &DatabaseManager) -> Result<(), DatabaseError> {
    let audit = AuditStamp::now(None);
    let list_id = todo_lists::insert(db.pool(), DEMO_LIST_TITLE, Colour::default(), &audit).await?;
    for title in DEMO_ITEMS {
        todo_items::insert(db.pool(), list_id, title, &audit).await?;
    }
    Ok(())
}

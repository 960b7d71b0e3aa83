use colored::*;
use futures::FutureExt;
use sea_orm_migration::prelude::*;
use std::io::{self, Write};
use std::time::Instant;

const STATUS_COLUMN: usize = 72;

/// Applies every migration in order, printing one aligned status line each.
/// Exits the process on the first failure.
pub async fn run_all_migrations(url: &str) {
    let db = sea_orm::Database::connect(url)
        .await
        .expect("DB connection failed");

    println!("Running migrations...");
    let schema_manager = SchemaManager::new(&db);

    for migration in <migration::Migrator as MigratorTrait>::migrations() {
        apply(&schema_manager, migration).await;
    }
}

async fn apply(schema_manager: &SchemaManager<'_>, migration: Box<dyn MigrationTrait>) {
    let label = format!("Applying {}", migration.name().bold());
    let dots = ".".repeat(STATUS_COLUMN.saturating_sub(label.len()));
    print!("{}{} ", label, dots);
    let _ = io::stdout().flush();

    let start = Instant::now();
    let result = std::panic::AssertUnwindSafe(migration.up(schema_manager))
        .catch_unwind()
        .await;

    match result {
        Ok(Ok(())) => {
            let time_str = format!("({:.2?})", start.elapsed()).dimmed();
            println!("{} {}", "done".green(), time_str);
        }
        Ok(Err(err)) => {
            println!("{} {}", "failed".red(), err);
            std::process::exit(1);
        }
        Err(_) => {
            println!("{}", "panicked".red());
            std::process::exit(1);
        }
    }
}

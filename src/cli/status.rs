//! Migrate and status commands

use anyhow::Result;

use crate::store::CampaignStore;

/// Reports what the convergence run at open time changed.
pub fn migrate(store: &CampaignStore) -> Result<()> {
    let report = store.convergence_report();

    if report.is_noop() {
        println!("Schema is up to date.");
        return Ok(());
    }

    if !report.columns_added.is_empty() {
        println!(
            "Added {} character columns: {}",
            report.columns_added.len(),
            report.columns_added.join(", ")
        );
    }
    if let Some(rows) = report.legacy_characters_copied {
        println!("Migrated {} legacy NPCs into characters", rows);
    }
    if let Some(rows) = report.magic_items_rebuilt {
        println!("Rebuilt magic_items without adventure ownership ({} rows)", rows);
    }
    if report.duplicate_assignments_removed > 0 {
        println!(
            "Removed {} duplicate magic item assignments",
            report.duplicate_assignments_removed
        );
    }
    if report.adventures_seeded > 0 {
        println!("Seeded {} adventures", report.adventures_seeded);
    }

    println!("✅ Migration complete!");
    Ok(())
}

pub fn run(store: &CampaignStore) -> Result<()> {
    let status = store.status()?;

    println!("{:<24} {:>8}", "Table", "Rows");
    println!("{}", "-".repeat(33));
    for (table, count) in &status.table_counts {
        println!("{:<24} {:>8}", table, count);
    }

    println!("\nApplied migrations:");
    if status.migrations.is_empty() {
        println!("  (none)");
    }
    for m in &status.migrations {
        println!("  {:>3}  {:<32} {}", m.version, m.name, m.applied_at);
    }

    Ok(())
}

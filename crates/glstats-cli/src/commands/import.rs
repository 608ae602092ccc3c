/// Legacy JSON import command handler
use anyhow::Result;
use glstats_storage::{legacy_json_path, Database};
use std::path::PathBuf;

use super::AppContext;

pub fn handle_import_command(ctx: &AppContext, file: Option<PathBuf>) -> Result<()> {
    if ctx.json_store.is_some() {
        anyhow::bail!("Importing a legacy database needs the SQLite database");
    }
    let file = file.unwrap_or_else(|| legacy_json_path(&ctx.db_path));

    // Plain open: the explicit import must not also trigger the implicit one
    let db = Database::new(Some(ctx.db_path.clone()))?;
    let imported = db.import_legacy_json(&file)?;

    println!(
        "Imported {imported} snapshots from {} into {}",
        file.display(),
        ctx.db_path.display()
    );
    Ok(())
}

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::database::json_store::JsonStore;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, UserId};
use crate::database::repository::InventoryRepository;
use crate::database::sql_store::SqlStore;

/// Outcome of copying a JSON data directory into another repository.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ImportReport {
    pub users_imported: usize,
    pub users_skipped: Vec<String>,
    pub items_imported: usize,
    pub items_skipped: Vec<String>,
    pub orphans_assigned: usize,
    pub orphans_skipped: usize,
}

/// Copy users and items from `source` into `target`.
///
/// Users keep their password hashes. Existing usernames in `target` are
/// reused rather than duplicated, so running the import twice is harmless.
/// Ownerless legacy items go to `orphan_owner` when given. Everything runs
/// in one transaction: a failure leaves `target` untouched.
pub async fn import_json(
    source: &JsonStore,
    target: &SqlStore,
    orphan_owner: Option<&str>,
) -> Result<ImportReport, DatabaseError> {
    let mut report = ImportReport::default();
    let mut tx = target.begin().await?;

    // Resolve the orphan owner first so a typo fails before anything is written.
    if let Some(username) = orphan_owner {
        let in_target = tx.find_user_by_username(username).await?.is_some();
        let in_source = source.find_user_by_username(username).await?.is_some();
        if !in_target && !in_source {
            return Err(DatabaseError::NotFound(format!("user {}", username)));
        }
    }

    let mut id_map: HashMap<UserId, UserId> = HashMap::new();
    for user in source.list_users().await? {
        let target_id = match tx
            .insert_user(NewUser {
                username: user.username.clone(),
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
            })
            .await
        {
            Ok(created) => {
                report.users_imported += 1;
                created.id
            }
            Err(DatabaseError::DuplicateUsername(name)) => {
                report.users_skipped.push(name);
                tx.find_user_by_username(&user.username)
                    .await?
                    .ok_or_else(|| DatabaseError::NotFound(format!("user {}", user.username)))?
                    .id
            }
            Err(e) => return Err(e),
        };
        id_map.insert(user.id, target_id);
    }

    for (source_id, target_id) in &id_map {
        for mut item in source.list_items(*source_id).await? {
            item.owner_id = *target_id;
            let label = format!("{} (owner {})", item.sku, target_id);
            match tx.insert_item(item).await {
                Ok(_) => report.items_imported += 1,
                Err(DatabaseError::DuplicateSku(_)) => report.items_skipped.push(label),
                Err(e) => return Err(e),
            }
        }
    }

    let orphans = source.orphaned_items().await;
    match orphan_owner {
        Some(username) => {
            let owner = tx
                .find_user_by_username(username)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("user {}", username)))?;
            for orphan in orphans {
                let label = format!("{} (owner {})", orphan.sku, owner.id);
                match tx.insert_item(orphan.into_item(owner.id)).await {
                    Ok(_) => report.orphans_assigned += 1,
                    Err(DatabaseError::DuplicateSku(_)) => report.items_skipped.push(label),
                    Err(e) => return Err(e),
                }
            }
        }
        None => {
            if !orphans.is_empty() {
                warn!("Skipping {} items without an owner; pass an owner to keep them", orphans.len());
            }
            report.orphans_skipped = orphans.len();
        }
    }

    tx.commit().await?;
    info!(
        "Import finished: {} users, {} items, {} orphans assigned",
        report.users_imported, report.items_imported, report.orphans_assigned
    );
    Ok(report)
}

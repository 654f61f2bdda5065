use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::AdminRole;
use crate::repositories;

/// Make sure the configured super admin exists and can log in. Safe to run
/// on every startup.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping super admin creation");
        return Ok(());
    }

    let email = &admin.first_superuser_email;
    let existing = repositories::admins::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(account) = existing {
        let password_ok =
            security::verify_password(&admin.first_superuser_password, &account.hashed_password)
                .unwrap_or(false);

        if password_ok && account.role == AdminRole::SuperAdmin {
            tracing::info!("Default super admin already up to date");
            return Ok(());
        }

        let hashed_password = if password_ok {
            account.hashed_password.clone()
        } else {
            security::hash_password(&admin.first_superuser_password)?
        };

        sqlx::query(
            "UPDATE admins
             SET hashed_password = $1, role = $2, department = NULL, updated_at = $3
             WHERE id = $4",
        )
        .bind(hashed_password)
        .bind(AdminRole::SuperAdmin)
        .bind(now)
        .bind(&account.id)
        .execute(state.db())
        .await?;

        tracing::info!("Updated default super admin {email}");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;

    repositories::admins::create(
        state.db(),
        repositories::admins::CreateAdmin {
            id: &Uuid::new_v4().to_string(),
            full_name: "Super Admin",
            email,
            hashed_password,
            role: AdminRole::SuperAdmin,
            department: None,
            is_first_login: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await?;

    tracing::info!("Created default super admin {email}");
    Ok(())
}

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Creates the configured superuser, or repairs its password and admin flag.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let email = admin.first_superuser_email.trim().to_ascii_lowercase();
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_email(state.db(), &email).await? {
        let verified =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        if verified && user.is_admin && user.is_active {
            tracing::info!(user_id = user.id, "Default superuser already up to date");
            return Ok(());
        }

        let hashed_password = if verified {
            None
        } else {
            Some(security::hash_password(&admin.first_superuser_password)?)
        };

        repositories::users::update(
            state.db(),
            user.id,
            repositories::users::UpdateUser {
                hashed_password,
                is_admin: Some(true),
                is_active: Some(true),
                ..Default::default()
            },
            now,
        )
        .await?;

        tracing::info!(user_id = user.id, "Updated default superuser");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            email: &email,
            hashed_password,
            full_name: "Super Admin",
            is_admin: true,
            is_educator: false,
            is_active: true,
            created_at: now,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "Created default superuser");
    Ok(())
}

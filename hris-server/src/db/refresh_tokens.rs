//! Refresh token storage
//!
//! Rows are keyed by the token's `jti`; rotation revokes the used row before
//! a new pair is issued.

use async_trait::async_trait;
use shared::util::now_millis;

use super::{PgRepository, RefreshTokenRepo};
use crate::error::ServiceResult;

#[async_trait]
impl RefreshTokenRepo for PgRepository {
    async fn store_refresh_token(
        &self,
        jti: &str,
        user_id: &str,
        expires_at: i64,
    ) -> ServiceResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, expires_at, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> ServiceResult<bool> {
        // Single conditional UPDATE so two concurrent refreshes cannot both win
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE
             WHERE id = $1 AND NOT revoked AND expires_at > $2",
        )
        .bind(jti)
        .bind(now_millis())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// 認証済みユーザーを要求するエクストラクタ
///
/// `Authorization: Bearer <token>` ヘッダーのセッショントークンを検証し、
/// 主体のユーザーIDを取り出す。ヘッダー不在・検証失敗はすべて401。
#[derive(Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::Authentication("トークン未提示".to_string()))?;

        let user_id = state.session_service.verify(token).map_err(|e| {
            // 失敗分類（形式不正/署名不正/期限切れ）はログで区別し、応答は同一
            AppError::Authentication(format!("セッション検証失敗: {}", e))
        })?;

        Ok(AuthUser { user_id })
    }
}

/// Authorization ヘッダーから Bearer トークンを取り出す
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::User;
use crate::services::auth::hash_password;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
    #[serde(default)]
    pub door_number: Option<String>,
    #[serde(default)]
    pub building_name: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

/// ユーザー登録ハンドラー
///
/// POST /api/auth/register
///
/// 登録成功と同時にセッショントークンを発行する。
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    // バリデーション
    validate_register_request(&request)?;

    // パスワードハッシュ化
    let password_hash = hash_password(&request.password)?;

    // ユーザー作成
    let user = state
        .user_repo
        .create_user(
            request.full_name.trim(),
            request.email.trim(),
            request.phone.as_deref(),
            &password_hash,
            request.door_number.as_deref(),
            request.building_name.as_deref(),
            request.street.as_deref(),
            request.city.as_deref(),
            request.state.as_deref(),
            request.pincode.as_deref(),
        )
        .await
        .map_err(|e| {
            // UNIQUE制約違反チェック
            if let sqlx::Error::Database(db_err) = &e
                && db_err.constraint() == Some("users_email_key")
            {
                return AppError::EmailAlreadyExists;
            }
            AppError::Database(e)
        })?;

    // セッショントークン発行
    let token = state.session_service.issue(user.id)?;

    tracing::info!(email = %user.email, "ユーザー登録成功");

    Ok(Json(RegisterResponse {
        success: true,
        token,
        user,
    }))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    // full_name: 必須
    if request.full_name.trim().is_empty() {
        return Err(AppError::Validation("氏名は必須です".to_string()));
    }
    // email: 必須、メール形式
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("メールアドレスは必須です".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    // password: 8文字以上
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    // pincode: 指定時は6桁の数字
    if let Some(pincode) = &request.pincode
        && !pincode.trim().is_empty()
        && !(pincode.len() == 6 && pincode.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(AppError::Validation(
            "郵便番号（pincode）は6桁の数字で入力してください".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> RegisterRequest {
        RegisterRequest {
            full_name: "山田太郎".to_string(),
            email: "test@example.com".to_string(),
            phone: None,
            password: "password123".to_string(),
            door_number: None,
            building_name: None,
            street: None,
            city: None,
            state: None,
            pincode: None,
        }
    }

    #[test]
    fn test_validate_empty_full_name() {
        let request = RegisterRequest {
            full_name: "  ".to_string(),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_err());
    }

    #[test]
    fn test_validate_empty_email() {
        let request = RegisterRequest {
            email: "".to_string(),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        let request = RegisterRequest {
            email: "invalid-email".to_string(),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let request = RegisterRequest {
            password: "short".to_string(),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_err());
    }

    #[test]
    fn test_validate_bad_pincode() {
        let request = RegisterRequest {
            pincode: Some("12ab56".to_string()),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let request = RegisterRequest {
            pincode: Some("600001".to_string()),
            ..base_request()
        };
        assert!(validate_register_request(&request).is_ok());
    }
}

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::PasswordResetService;
use crate::state::AppState;

fn reset_service(state: &AppState) -> PasswordResetService {
    PasswordResetService::new(
        state.user_repo.clone(),
        state.email_service.clone(),
        state.config.clone(),
    )
}

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/auth/forgot-password
///
/// # Security
/// アカウントの存在有無にかかわらず常に同一形状の200を返す
/// （存在しない場合はトークン生成・メール送信をスキップするだけ）
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    // バリデーション（形式不正のみ400、存在有無は漏らさない）
    validate_email(&request.email)?;

    reset_service(&state).request_reset(&request.email).await?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: "パスワードリセット手順をメールで送信しました".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/auth/reset-password
///
/// トークンの検証と消費は単一の条件付きUPDATEで行われる（単一使用保証）。
///
/// # Security
/// - token, password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, AppError> {
    // バリデーション
    validate_reset_password_request(&request)?;

    reset_service(&state)
        .consume_reset(&request.email, &request.token, &request.password)
        .await?;

    Ok(Json(ResetPasswordResponse {
        success: true,
        message: "パスワードが更新されました".to_string(),
    }))
}

// === トークン事前検証 ===

#[derive(Debug, Deserialize)]
pub struct VerifyResetTokenRequest {
    pub token: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResetTokenResponse {
    pub success: bool,
    pub message: String,
}

/// POST /api/auth/verify-reset-token
///
/// リセットフォーム表示前の事前チェック。読み取り専用でトークンは消費しない。
pub async fn verify_reset_token(
    State(state): State<AppState>,
    Json(request): Json<VerifyResetTokenRequest>,
) -> Result<Json<VerifyResetTokenResponse>, AppError> {
    validate_verify_request(&request)?;

    reset_service(&state)
        .verify_token(&request.email, &request.token)
        .await?;

    Ok(Json(VerifyResetTokenResponse {
        success: true,
        message: "トークンは有効です".to_string(),
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "有効なメールアドレスを入力してください".to_string(),
        ));
    }
    Ok(())
}

/// リセットパスワードリクエストのバリデーション
fn validate_reset_password_request(request: &ResetPasswordRequest) -> Result<(), AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("トークンは必須です".to_string()));
    }
    validate_email(&request.email)?;
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "パスワードは8文字以上で入力してください".to_string(),
        ));
    }
    Ok(())
}

/// トークン事前検証リクエストのバリデーション
fn validate_verify_request(request: &VerifyResetTokenRequest) -> Result<(), AppError> {
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("トークンは必須です".to_string()));
    }
    validate_email(&request.email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_email() {
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_invalid_email() {
        assert!(validate_email("invalid-email").is_err());
    }

    #[test]
    fn test_validate_valid_email() {
        assert!(validate_email("test@example.com").is_ok());
    }

    #[test]
    fn test_validate_empty_token() {
        let request = ResetPasswordRequest {
            token: "".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_password() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            email: "test@example.com".to_string(),
            password: "short".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_err());
    }

    #[test]
    fn test_validate_valid_reset_request() {
        let request = ResetPasswordRequest {
            token: "valid-token".to_string(),
            email: "test@example.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(validate_reset_password_request(&request).is_ok());
    }

    #[test]
    fn test_validate_verify_request_requires_token_and_email() {
        let request = VerifyResetTokenRequest {
            token: "t".to_string(),
            email: "test@example.com".to_string(),
        };
        assert!(validate_verify_request(&request).is_ok());

        let request = VerifyResetTokenRequest {
            token: " ".to_string(),
            email: "test@example.com".to_string(),
        };
        assert!(validate_verify_request(&request).is_err());
    }
}

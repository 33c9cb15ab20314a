use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// セッショントークン不在・不正・期限切れ（詳細は内部ログのみ）
    #[error("認証エラー: {0}")]
    Authentication(String),

    /// ログイン時のメールアドレス・パスワード不一致
    #[error("メールアドレスまたはパスワードが正しくありません")]
    InvalidCredentials,

    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("このメールアドレスは既に登録されています")]
    EmailAlreadyExists,

    /// リセットトークン不一致・期限切れ・対象アカウント不在
    /// どのケースかはクライアントに区別させない
    #[error("無効または期限切れのリンクです")]
    InvalidResetToken,

    #[error("リソースが見つかりません")]
    NotFound,

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Authentication(detail) => {
                tracing::warn!(detail = %detail, "認証失敗");
                (
                    StatusCode::UNAUTHORIZED,
                    "認証情報が無効または期限切れです".to_string(),
                )
            }
            Self::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "メールアドレスまたはパスワードが正しくありません".to_string(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::EmailAlreadyExists => (
                StatusCode::BAD_REQUEST,
                "このメールアドレスは既に登録されています".to_string(),
            ),
            Self::InvalidResetToken => (
                StatusCode::BAD_REQUEST,
                "無効または期限切れのリンクです".to_string(),
            ),
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                "リソースが見つかりません".to_string(),
            ),
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "内部エラーが発生しました".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        (
            status,
            Json(ErrorResponse {
                success: false,
                message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_maps_to_401() {
        let (status, _) = AppError::Authentication("no token".to_string()).status_and_message();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_credentials_maps_to_400() {
        let (status, _) = AppError::InvalidCredentials.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_reset_token_maps_to_400_with_generic_message() {
        let (status, message) = AppError::InvalidResetToken.status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        // 不一致・期限切れ・アカウント不在のいずれでも同一メッセージ
        assert_eq!(message, "無効または期限切れのリンクです");
    }

    #[test]
    fn test_database_error_hides_detail() {
        let (status, message) = AppError::Database(sqlx::Error::PoolClosed).status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("pool"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, _) = AppError::NotFound.status_and_message();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

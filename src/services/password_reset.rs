use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::UserRepository;
use crate::services::{EmailService, auth::hash_password};

/// パスワードリセットサービス
///
/// アカウントごとの状態遷移:
/// リセットなし →（リクエスト）→ 保留中{token_hash, expires_at}
/// →（期限内消費 / 失効 / 新規リクエストによる上書き）→ リセットなし
#[derive(Clone)]
pub struct PasswordResetService {
    user_repo: UserRepository,
    email_service: EmailService,
    config: Arc<Config>,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(user_repo: UserRepository, email_service: EmailService, config: Arc<Config>) -> Self {
        Self {
            user_repo,
            email_service,
            config,
        }
    }

    /// パスワードリセットをリクエスト
    ///
    /// # Security
    /// - ユーザーが存在しない場合も常に成功を返す（アカウント存在の漏洩防止）
    /// - トークン保存成功後のメール送信失敗もエラーにしない
    ///   （送信失敗を返すとアカウント存在が漏れるため、ログのみ）
    /// - トークン（平文）はログに出力しない
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        let user = match self.user_repo.find_by_email(email).await? {
            Some(u) => u,
            None => {
                tracing::info!(email = %email, "パスワードリセット: ユーザー不在（成功レスポンス返却）");
                return Ok(());
            }
        };

        // 32バイトランダムトークン生成 → SHA256ハッシュのみ保存
        let token = generate_token();
        let token_hash = hash_token(&token);

        let expires_at = OffsetDateTime::now_utc()
            + Duration::seconds(self.config.password_reset_token_ttl_secs);

        // 既存の保留中トークンは上書きで無効化される
        self.user_repo
            .set_reset_token(user.id, &token_hash, expires_at)
            .await?;

        let reset_url = self.build_reset_url(&token, email);

        // トークンは保存済みなので、送信失敗でもリクエスト自体は成功扱い
        if let Err(e) = self
            .email_service
            .send_password_reset_email(email, &user.full_name, &reset_url)
            .await
        {
            tracing::warn!(email = %email, error = %e, "リセットメール送信に失敗（成功レスポンス返却）");
        } else {
            tracing::info!(email = %email, "パスワードリセットメール送信完了");
        }

        Ok(())
    }

    /// リセットトークンの事前検証（読み取り専用）
    ///
    /// リセットフォーム表示前のチェック用。トークンは消費しない。
    pub async fn verify_token(&self, email: &str, token: &str) -> Result<(), AppError> {
        let token_hash = hash_token(token);

        self.user_repo
            .find_id_with_valid_reset(email, &token_hash)
            .await?
            .ok_or(AppError::InvalidResetToken)?;

        Ok(())
    }

    /// パスワードをリセット（トークンを消費）
    ///
    /// 検証とクリアは単一の条件付きUPDATEで行うため、
    /// 同一トークンの同時消費は必ず1回だけ成功する。
    ///
    /// # Security
    /// - token, new_password はログに出力しない
    pub async fn consume_reset(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let token_hash = hash_token(token);
        let password_hash = hash_password(new_password)?;

        let rows = self
            .user_repo
            .update_password_and_clear_reset(email, &password_hash, &token_hash)
            .await?;

        if rows == 0 {
            // 不一致・期限切れ・アカウント不在・消費済みを区別しない
            tracing::warn!(email = %email, "パスワードリセット失敗: 無効または期限切れトークン");
            return Err(AppError::InvalidResetToken);
        }

        tracing::info!(email = %email, "パスワードリセット完了");

        Ok(())
    }

    /// リセットURLを構築
    fn build_reset_url(&self, token: &str, email: &str) -> String {
        format!(
            "{}/reset-password?token={}&email={}",
            self.config.frontend_url,
            token,
            urlencoding::encode(email)
        )
    }
}

/// 32バイト（256ビット）のランダムトークンを生成
pub(crate) fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// トークンをSHA256でハッシュ化（hex表記）
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_url_safe_and_256_bits() {
        let token = generate_token();
        // 32バイトのURL-safe base64（パディングなし）は43文字
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn test_generate_token_is_not_repeated() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn test_hash_token_is_deterministic_hex_sha256() {
        let a = hash_token("some-token");
        let b = hash_token("some-token");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hash_token_differs_per_token() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }
}

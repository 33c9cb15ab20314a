use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// メール送信サービス
///
/// `email` feature 有効時はSMTP（lettre）で送信する。
/// 無効時・SMTP未設定時はログ出力のみ（開発モード）。
#[derive(Clone)]
pub struct EmailService {
    config: Arc<Config>,
}

impl EmailService {
    /// 新しい EmailService を作成
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// パスワードリセットメールを送信
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        recipient_name: &str,
        reset_url: &str,
    ) -> Result<(), AppError> {
        #[cfg(feature = "email")]
        {
            if let (Some(host), Some(username), Some(password), Some(from)) = (
                &self.config.smtp_host,
                &self.config.smtp_username,
                &self.config.smtp_password,
                &self.config.smtp_from_address,
            ) {
                return self
                    .send_via_smtp(to, recipient_name, reset_url, host, username, password, from)
                    .await;
            }

            tracing::warn!("SMTP未設定のためメール送信をスキップ（ログ出力のみ）");
        }

        // 開発モード: メール送信せずログ出力のみ
        tracing::info!(
            to = %to,
            recipient = %recipient_name,
            "パスワードリセットメール送信（開発モード）"
        );
        // リセットURL（平文トークンを含む）は debug レベルに限定
        tracing::debug!(reset_url = %reset_url, "リセットURL（開発モードのみ出力）");

        Ok(())
    }

    #[cfg(feature = "email")]
    #[allow(clippy::too_many_arguments)]
    async fn send_via_smtp(
        &self,
        to: &str,
        recipient_name: &str,
        reset_url: &str,
        host: &str,
        username: &secrecy::SecretBox<String>,
        password: &secrecy::SecretBox<String>,
        from: &str,
    ) -> Result<(), AppError> {
        use lettre::{
            AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
            message::header::ContentType, transport::smtp::authentication::Credentials,
        };
        use secrecy::ExposeSecret;

        let message = Message::builder()
            .from(from.parse().map_err(|e| {
                AppError::Internal(anyhow::anyhow!("差出人アドレスが不正: {}", e))
            })?)
            .to(to.parse().map_err(|e| {
                AppError::Internal(anyhow::anyhow!("宛先アドレスが不正: {}", e))
            })?)
            .subject("【ハコブ便】パスワード再設定のご案内")
            .header(ContentType::TEXT_HTML)
            .body(reset_mail_body(recipient_name, reset_url))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("メール構築エラー: {}", e)))?;

        let credentials = Credentials::new(
            username.expose_secret().clone(),
            password.expose_secret().clone(),
        );

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("SMTP接続エラー: {}", e)))?
                .port(self.config.smtp_port)
                .credentials(credentials)
                .build();

        mailer
            .send(message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("メール送信エラー: {}", e)))?;

        tracing::info!(to = %to, "パスワードリセットメール送信完了（SMTP）");

        Ok(())
    }
}

/// パスワードリセットメールの本文（HTML）
#[cfg_attr(not(feature = "email"), allow(dead_code))]
fn reset_mail_body(recipient_name: &str, reset_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body style="font-family: sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>パスワード再設定のご案内</h2>
    <p>{recipient_name} 様</p>
    <p>パスワード再設定のリクエストを受け付けました。
    下のボタンから新しいパスワードを設定してください。</p>
    <p style="text-align: center;">
      <a href="{reset_url}"
         style="background: #dc2626; color: white; padding: 12px 24px;
                text-decoration: none; border-radius: 6px; display: inline-block;">
        パスワードを再設定する
      </a>
    </p>
    <p><strong>このリンクの有効期限は1時間です。</strong></p>
    <p>このリクエストに心当たりがない場合は、本メールを破棄してください。
    パスワードは変更されません。</p>
  </div>
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_body_contains_reset_url_and_name() {
        let body = reset_mail_body("山田太郎", "https://example.com/reset-password?token=abc");
        assert!(body.contains("https://example.com/reset-password?token=abc"));
        assert!(body.contains("山田太郎"));
    }
}

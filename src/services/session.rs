use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

/// セッショントークンのクレーム
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// ユーザーID
    pub sub: String,
    /// 発行時刻（UNIX秒）
    pub iat: i64,
    /// 有効期限（UNIX秒）
    pub exp: i64,
}

/// セッション検証の失敗分類
///
/// クライアントへの応答はいずれも同一（401 + 汎用メッセージ）だが、
/// サーバーログ上は区別する。
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("malformed")]
    Malformed,
    #[error("signature_invalid")]
    SignatureInvalid,
    #[error("expired")]
    Expired,
}

/// セッショントークンの発行・検証サービス
///
/// HS256署名のステートレスJWT。サーバー側にセッションを保持しないため、
/// 有効期限前の失効（パスワードリセット時を含む）は行わない設計。
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl SessionService {
    /// 新しい SessionService を作成
    ///
    /// シークレットは起動時設定から注入される（Config::jwt_secret は必須項目）。
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 時刻ずれの許容はゼロ（exp ちょうどで失効）
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    /// ユーザーIDを主体とするセッショントークンを発行
    pub fn issue(&self, user_id: Uuid) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = ?e, "セッショントークンの発行に失敗");
            AppError::Internal(anyhow::anyhow!("session token encode error"))
        })
    }

    /// トークンを検証し、主体のユーザーIDを返す
    ///
    /// 失敗は3分類: 形式不正 / 署名不正 / 期限切れ。
    pub fn verify(&self, token: &str) -> Result<Uuid, SessionError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                ErrorKind::InvalidSignature => SessionError::SignatureInvalid,
                _ => SessionError::Malformed,
            }
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| SessionError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-which-is-long-enough";

    #[test]
    fn test_issue_then_verify_returns_user_id() {
        let service = SessionService::new(SECRET, 3600);
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        let verified = service.verify(&token).unwrap();

        assert_eq!(verified, user_id);
    }

    #[test]
    fn test_expired_token_is_classified_as_expired() {
        // TTLを負にして発行時点で失効済みのトークンを作る
        let service = SessionService::new(SECRET, -3600);
        let token = service.issue(Uuid::new_v4()).unwrap();

        let err = service.verify(&token).unwrap_err();
        assert!(matches!(err, SessionError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_classified_as_signature_invalid() {
        let issuer = SessionService::new(SECRET, 3600);
        let verifier = SessionService::new("another-secret-entirely", 3600);

        let token = issuer.issue(Uuid::new_v4()).unwrap();
        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(err, SessionError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let service = SessionService::new(SECRET, 3600);
        let token = service.issue(Uuid::new_v4()).unwrap();

        // ペイロード部の1文字を差し替え
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let payload = parts[1].clone();
        let flipped = if payload.starts_with('A') { "B" } else { "A" };
        parts[1] = format!("{}{}", flipped, &payload[1..]);
        let tampered = parts.join(".");

        assert!(service.verify(&tampered).is_err());
    }

    #[test]
    fn test_garbage_token_is_classified_as_malformed() {
        let service = SessionService::new(SECRET, 3600);

        let err = service.verify("not-a-jwt").unwrap_err();
        assert!(matches!(err, SessionError::Malformed));
    }

    #[test]
    fn test_token_is_valid_immediately_before_expiry() {
        // 十分短いが未失効のTTL
        let service = SessionService::new(SECRET, 2);
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id).unwrap();
        assert_eq!(service.verify(&token).unwrap(), user_id);
    }
}

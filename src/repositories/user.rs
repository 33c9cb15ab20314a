use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::User;

const USER_COLUMNS: &str = "id, full_name, email, phone, password_hash, \
     door_number, building_name, street, city, state, pincode, \
     reset_token_hash, reset_token_expires_at, created_at, updated_at";

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// メールアドレスでユーザーを検索
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// ユーザーIDでユーザーを検索
    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// 新しいユーザーを作成
    ///
    /// # Errors
    /// - UNIQUE制約違反時: `sqlx::Error::Database` (constraint = "users_email_key")
    ///   呼び出し側で `AppError::EmailAlreadyExists` に変換すること
    #[allow(clippy::too_many_arguments)]
    pub async fn create_user(
        &self,
        full_name: &str,
        email: &str,
        phone: Option<&str>,
        password_hash: &str,
        door_number: Option<&str>,
        building_name: Option<&str>,
        street: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        pincode: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users \
                 (full_name, email, phone, password_hash, \
                  door_number, building_name, street, city, state, pincode) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(full_name)
        .bind(email)
        .bind(phone)
        .bind(password_hash)
        .bind(door_number)
        .bind(building_name)
        .bind(street)
        .bind(city)
        .bind(state)
        .bind(pincode)
        .fetch_one(&self.pool)
        .await
    }

    /// プロフィール項目を更新（full_name / email は更新対象外）
    #[allow(clippy::too_many_arguments)]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        phone: Option<&str>,
        door_number: Option<&str>,
        building_name: Option<&str>,
        street: Option<&str>,
        city: Option<&str>,
        state: Option<&str>,
        pincode: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET phone = $2, door_number = $3, building_name = $4, \
                 street = $5, city = $6, state = $7, pincode = $8, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(phone)
        .bind(door_number)
        .bind(building_name)
        .bind(street)
        .bind(city)
        .bind(state)
        .bind(pincode)
        .fetch_optional(&self.pool)
        .await
    }

    /// リセットトークンを設定
    ///
    /// 既存の未消費トークンがあれば上書きされ、旧トークンは即座に無効化される
    /// （アカウントあたり未消費トークンは常に最大1件）。
    ///
    /// # Note
    /// token_hash は平文トークンのSHA256。平文はここに到達しない。
    pub async fn set_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token_hash = $2, reset_token_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 有効なリセットトークンを持つユーザーIDを検索（読み取り専用の事前チェック用）
    ///
    /// 有効期限は DB 時刻に対して排他的（expires_at ちょうどは無効）。
    pub async fn find_id_with_valid_reset(
        &self,
        email: &str,
        token_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT id
            FROM users
            WHERE email = $1
              AND reset_token_hash = $2
              AND reset_token_expires_at > NOW()
            "#,
        )
        .bind(email)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id,)| id))
    }

    /// パスワード更新とリセットトークン消費を単一の条件付きUPDATEで実行
    ///
    /// トークン検証（ハッシュ一致 + 未失効）とクリアを同一文で行うため、
    /// 同一トークンによる同時消費は必ず片方だけが成功する（単一使用保証）。
    /// この保証はPostgresの行単位更新の原子性に依存する。
    ///
    /// TODO: sqlxのテストDBハーネス導入時に、同時消費で成功が1回だけに
    /// なることの統合テストを追加する。
    ///
    /// # Returns
    /// 影響行数。0 の場合はトークン不一致・期限切れ・アカウント不在のいずれか。
    pub async fn update_password_and_clear_reset(
        &self,
        email: &str,
        new_password_hash: &str,
        expected_token_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE email = $1
              AND reset_token_hash = $3
              AND reset_token_expires_at > NOW()
            "#,
        )
        .bind(email)
        .bind(new_password_hash)
        .bind(expected_token_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AuthUser;
use crate::models::User;
use crate::state::AppState;

/// プロフィール更新リクエスト
///
/// 未指定の項目は現在値を維持する。full_name / email は変更不可。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub phone: Option<String>,
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
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: User,
}

/// プロフィール更新ハンドラー
///
/// PUT /api/profile（要認証）
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>, AppError> {
    validate_update_profile_request(&request)?;

    // 現在値を取得し、指定された項目だけ差し替える
    let current = state
        .user_repo
        .find_by_id(auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let phone = merge_field(&request.phone, &current.phone);
    let door_number = merge_field(&request.door_number, &current.door_number);
    let building_name = merge_field(&request.building_name, &current.building_name);
    let street = merge_field(&request.street, &current.street);
    let city = merge_field(&request.city, &current.city);
    let state_field = merge_field(&request.state, &current.state);
    let pincode = merge_field(&request.pincode, &current.pincode);

    let user = state
        .user_repo
        .update_profile(
            auth.user_id,
            phone.as_deref(),
            door_number.as_deref(),
            building_name.as_deref(),
            street.as_deref(),
            city.as_deref(),
            state_field.as_deref(),
            pincode.as_deref(),
        )
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(user_id = %auth.user_id, "プロフィール更新");

    Ok(Json(UpdateProfileResponse {
        success: true,
        user,
    }))
}

/// 更新項目のマージ（空文字・空白のみは未指定と同じ扱いで現在値を維持）
fn merge_field(new: &Option<String>, current: &Option<String>) -> Option<String> {
    match new.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Some(s.to_string()),
        _ => current.clone(),
    }
}

/// プロフィール更新リクエストのバリデーション
fn validate_update_profile_request(request: &UpdateProfileRequest) -> Result<(), AppError> {
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

    fn empty_request() -> UpdateProfileRequest {
        UpdateProfileRequest {
            phone: None,
            door_number: None,
            building_name: None,
            street: None,
            city: None,
            state: None,
            pincode: None,
        }
    }

    #[test]
    fn test_validate_empty_request_is_ok() {
        assert!(validate_update_profile_request(&empty_request()).is_ok());
    }

    #[test]
    fn test_validate_bad_pincode() {
        let request = UpdateProfileRequest {
            pincode: Some("12345".to_string()),
            ..empty_request()
        };
        assert!(validate_update_profile_request(&request).is_err());
    }

    #[test]
    fn test_merge_keeps_current_when_absent() {
        let current = Some("09012345678".to_string());
        assert_eq!(merge_field(&None, &current), current);
    }

    #[test]
    fn test_merge_keeps_current_when_blank() {
        // 空文字・空白のみで現在値を消してはならない
        let current = Some("09012345678".to_string());
        assert_eq!(merge_field(&Some("".to_string()), &current), current);
        assert_eq!(merge_field(&Some("  ".to_string()), &current), current);
    }

    #[test]
    fn test_merge_replaces_with_new_value() {
        let current = Some("09012345678".to_string());
        assert_eq!(
            merge_field(&Some(" 08011112222 ".to_string()), &current),
            Some("08011112222".to_string())
        );
        assert_eq!(
            merge_field(&Some("Chennai".to_string()), &None),
            Some("Chennai".to_string())
        );
    }

    #[test]
    fn test_validate_good_pincode() {
        let request = UpdateProfileRequest {
            pincode: Some("600001".to_string()),
            ..empty_request()
        };
        assert!(validate_update_profile_request(&request).is_ok());
    }
}

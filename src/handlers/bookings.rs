use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AuthUser;
use crate::models::{Booking, NewBooking};
use crate::state::AppState;

/// 予約作成リクエスト
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_phone: Option<String>,
    #[serde(default)]
    pub pickup_door_number: Option<String>,
    #[serde(default)]
    pub pickup_building_name: Option<String>,
    #[serde(default)]
    pub pickup_street: Option<String>,
    #[serde(default)]
    pub pickup_city: Option<String>,
    #[serde(default)]
    pub pickup_state: Option<String>,
    #[serde(default)]
    pub pickup_pincode: Option<String>,

    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_phone: Option<String>,
    #[serde(default)]
    pub delivery_door_number: Option<String>,
    #[serde(default)]
    pub delivery_building_name: Option<String>,
    #[serde(default)]
    pub delivery_street: Option<String>,
    #[serde(default)]
    pub delivery_city: Option<String>,
    #[serde(default)]
    pub delivery_state: Option<String>,
    #[serde(default)]
    pub delivery_pincode: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub package_type: Option<String>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub pickup_date: Option<Date>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub success: bool,
    pub booking: Booking,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub success: bool,
    pub bookings: Vec<Booking>,
}

/// 予約作成ハンドラー
///
/// POST /api/bookings（要認証）
///
/// 初期ステータスは "Pending"。追跡コードはサーバー側で採番する。
pub async fn create_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    // バリデーション（不足項目を列挙して返す）
    let missing = missing_required_fields(&request);
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "必須項目が不足しています: {}",
            missing.join(", ")
        )));
    }

    let new_booking = NewBooking {
        user_id: auth.user_id,
        tracking_code: make_tracking_code(),
        status: "Pending".to_string(),

        pickup_name: nn(request.sender_name),
        pickup_phone: nn(request.sender_phone),
        pickup_door_number: nn(request.pickup_door_number),
        pickup_building_name: nn(request.pickup_building_name),
        pickup_street: nn(request.pickup_street),
        pickup_city: nn(request.pickup_city),
        pickup_state: nn(request.pickup_state),
        pickup_pincode: nn(request.pickup_pincode),

        dropoff_name: nn(request.receiver_name),
        dropoff_phone: nn(request.receiver_phone),
        dropoff_door_number: nn(request.delivery_door_number),
        dropoff_building_name: nn(request.delivery_building_name),
        dropoff_street: nn(request.delivery_street),
        dropoff_city: nn(request.delivery_city),
        dropoff_state: nn(request.delivery_state),
        dropoff_pincode: nn(request.delivery_pincode),

        package_contents: nn(request.description),
        package_type: nn(request.package_type),
        vehicle_type: nn(request.vehicle_type),
        service_type: nn(request.service_type),
        pickup_date: request.pickup_date,
    };

    let booking = state.booking_repo.create(&new_booking).await?;

    tracing::info!(
        user_id = %auth.user_id,
        tracking_code = %booking.tracking_code,
        "予約作成"
    );

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

/// 予約一覧ハンドラー
///
/// GET /api/bookings（要認証）
pub async fn list_bookings(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<BookingListResponse>, AppError> {
    let bookings = state.booking_repo.list_for_user(auth.user_id).await?;

    Ok(Json(BookingListResponse {
        success: true,
        bookings,
    }))
}

/// 予約詳細ハンドラー
///
/// GET /api/bookings/{id}（要認証、自分の予約のみ）
pub async fn get_booking(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = state
        .booking_repo
        .find_for_user(id, auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(BookingResponse {
        success: true,
        booking,
    }))
}

/// 不足している必須項目名を列挙（フロントエンドのフィールド名で返す）
fn missing_required_fields(request: &CreateBookingRequest) -> Vec<&'static str> {
    let mut missing = Vec::new();

    let checks: [(&'static str, &Option<String>); 16] = [
        ("senderName", &request.sender_name),
        ("senderPhone", &request.sender_phone),
        ("pickupDoorNumber", &request.pickup_door_number),
        ("pickupStreet", &request.pickup_street),
        ("pickupCity", &request.pickup_city),
        ("pickupState", &request.pickup_state),
        ("pickupPincode", &request.pickup_pincode),
        ("receiverName", &request.receiver_name),
        ("receiverPhone", &request.receiver_phone),
        ("deliveryDoorNumber", &request.delivery_door_number),
        ("deliveryStreet", &request.delivery_street),
        ("deliveryCity", &request.delivery_city),
        ("deliveryState", &request.delivery_state),
        ("deliveryPincode", &request.delivery_pincode),
        ("vehicleType", &request.vehicle_type),
        ("packageType", &request.package_type),
    ];

    for (name, value) in checks {
        if is_blank(value) {
            missing.push(name);
        }
    }

    if request.pickup_date.is_none() {
        missing.push("pickupDate");
    }

    missing
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// 空文字をNULLに正規化
fn nn(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// 追跡コードを採番
///
/// 形式: "HK" + 現在時刻ミリ秒のbase36 + 乱数4桁ぶんのbase36（5桁ゼロ詰め）
fn make_tracking_code() -> String {
    use rand::Rng;

    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let rand_part: u32 = rand::thread_rng().gen_range(0..36u32.pow(4));

    format!(
        "HK{}{:0>5}",
        to_base36(millis as u128),
        to_base36(rand_part as u128)
    )
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    fn full_request() -> CreateBookingRequest {
        CreateBookingRequest {
            sender_name: Some("山田太郎".to_string()),
            sender_phone: Some("09012345678".to_string()),
            pickup_door_number: Some("12".to_string()),
            pickup_building_name: None,
            pickup_street: Some("Main St".to_string()),
            pickup_city: Some("Chennai".to_string()),
            pickup_state: Some("TN".to_string()),
            pickup_pincode: Some("600001".to_string()),
            receiver_name: Some("佐藤花子".to_string()),
            receiver_phone: Some("08012345678".to_string()),
            delivery_door_number: Some("34".to_string()),
            delivery_building_name: Some("".to_string()),
            delivery_street: Some("2nd Ave".to_string()),
            delivery_city: Some("Mumbai".to_string()),
            delivery_state: Some("MH".to_string()),
            delivery_pincode: Some("400001".to_string()),
            description: None,
            package_type: Some("Documents".to_string()),
            vehicle_type: Some("Bike".to_string()),
            service_type: None,
            pickup_date: Date::from_calendar_date(2026, Month::September, 1).ok(),
        }
    }

    #[test]
    fn test_full_request_has_no_missing_fields() {
        assert!(missing_required_fields(&full_request()).is_empty());
    }

    #[test]
    fn test_missing_fields_are_listed_by_frontend_name() {
        let request = CreateBookingRequest {
            sender_name: None,
            vehicle_type: Some("  ".to_string()),
            pickup_date: None,
            ..full_request()
        };
        let missing = missing_required_fields(&request);
        assert!(missing.contains(&"senderName"));
        assert!(missing.contains(&"vehicleType"));
        assert!(missing.contains(&"pickupDate"));
    }

    #[test]
    fn test_nn_normalizes_blank_to_none() {
        assert_eq!(nn(Some("  ".to_string())), None);
        assert_eq!(nn(Some("".to_string())), None);
        assert_eq!(nn(None), None);
        assert_eq!(nn(Some(" x ".to_string())), Some("x".to_string()));
    }

    #[test]
    fn test_tracking_code_shape() {
        let code = make_tracking_code();
        assert!(code.starts_with("HK"));
        assert!(code.len() > 10);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }
}

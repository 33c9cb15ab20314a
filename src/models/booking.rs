use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// 配送予約
///
/// 住所・荷物の各項目はAPI層のバリデーションで必須化し、
/// DB上は NULL 許容（空文字は保存前に NULL へ正規化される）。
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tracking_code: String,
    pub status: String,

    pub pickup_name: Option<String>,
    pub pickup_phone: Option<String>,
    pub pickup_door_number: Option<String>,
    pub pickup_building_name: Option<String>,
    pub pickup_street: Option<String>,
    pub pickup_city: Option<String>,
    pub pickup_state: Option<String>,
    pub pickup_pincode: Option<String>,

    pub dropoff_name: Option<String>,
    pub dropoff_phone: Option<String>,
    pub dropoff_door_number: Option<String>,
    pub dropoff_building_name: Option<String>,
    pub dropoff_street: Option<String>,
    pub dropoff_city: Option<String>,
    pub dropoff_state: Option<String>,
    pub dropoff_pincode: Option<String>,

    pub package_contents: Option<String>,
    pub package_type: Option<String>,
    pub vehicle_type: Option<String>,
    pub service_type: Option<String>,
    pub pickup_date: Option<Date>,

    pub created_at: OffsetDateTime,
}

/// 予約作成の入力（ハンドラーでバリデーション・正規化済み）
#[derive(Debug)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub tracking_code: String,
    pub status: String,

    pub pickup_name: Option<String>,
    pub pickup_phone: Option<String>,
    pub pickup_door_number: Option<String>,
    pub pickup_building_name: Option<String>,
    pub pickup_street: Option<String>,
    pub pickup_city: Option<String>,
    pub pickup_state: Option<String>,
    pub pickup_pincode: Option<String>,

    pub dropoff_name: Option<String>,
    pub dropoff_phone: Option<String>,
    pub dropoff_door_number: Option<String>,
    pub dropoff_building_name: Option<String>,
    pub dropoff_street: Option<String>,
    pub dropoff_city: Option<String>,
    pub dropoff_state: Option<String>,
    pub dropoff_pincode: Option<String>,

    pub package_contents: Option<String>,
    pub package_type: Option<String>,
    pub vehicle_type: Option<String>,
    pub service_type: Option<String>,
    pub pickup_date: Option<Date>,
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Booking, NewBooking};

const BOOKING_COLUMNS: &str = "id, user_id, tracking_code, status, \
     pickup_name, pickup_phone, pickup_door_number, pickup_building_name, \
     pickup_street, pickup_city, pickup_state, pickup_pincode, \
     dropoff_name, dropoff_phone, dropoff_door_number, dropoff_building_name, \
     dropoff_street, dropoff_city, dropoff_state, dropoff_pincode, \
     package_contents, package_type, vehicle_type, service_type, pickup_date, \
     created_at";

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 新しい予約を作成
    pub async fn create(&self, booking: &NewBooking) -> Result<Booking, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "INSERT INTO bookings \
                 (user_id, tracking_code, status, \
                  pickup_name, pickup_phone, pickup_door_number, pickup_building_name, \
                  pickup_street, pickup_city, pickup_state, pickup_pincode, \
                  dropoff_name, dropoff_phone, dropoff_door_number, dropoff_building_name, \
                  dropoff_street, dropoff_city, dropoff_state, dropoff_pincode, \
                  package_contents, package_type, vehicle_type, service_type, pickup_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16, $17, $18, $19, $20, $21, $22, $23, $24) \
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(booking.user_id)
        .bind(&booking.tracking_code)
        .bind(&booking.status)
        .bind(&booking.pickup_name)
        .bind(&booking.pickup_phone)
        .bind(&booking.pickup_door_number)
        .bind(&booking.pickup_building_name)
        .bind(&booking.pickup_street)
        .bind(&booking.pickup_city)
        .bind(&booking.pickup_state)
        .bind(&booking.pickup_pincode)
        .bind(&booking.dropoff_name)
        .bind(&booking.dropoff_phone)
        .bind(&booking.dropoff_door_number)
        .bind(&booking.dropoff_building_name)
        .bind(&booking.dropoff_street)
        .bind(&booking.dropoff_city)
        .bind(&booking.dropoff_state)
        .bind(&booking.dropoff_pincode)
        .bind(&booking.package_contents)
        .bind(&booking.package_type)
        .bind(&booking.vehicle_type)
        .bind(&booking.service_type)
        .bind(booking.pickup_date)
        .fetch_one(&self.pool)
        .await
    }

    /// ユーザーの予約一覧を新しい順に取得
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    /// ユーザー自身の予約を1件取得（他ユーザーの予約は見えない）
    pub async fn find_for_user(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 AND user_id = $2"
        ))
        .bind(booking_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

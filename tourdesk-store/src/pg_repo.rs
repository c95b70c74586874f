use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use tourdesk_core::lifecycle::{
    booking_transition, check_confirmation, ensure_active, seat_transition, BookingTransition,
    SeatTransition,
};
use tourdesk_core::repository::{
    BookingRepository, NewReservation, NewTour, NewUser, TourLayout, TourRepository,
    UserRepository,
};
use tourdesk_core::{CoreError, CoreResult};
use tourdesk_shared::{
    Booking, Client, Highlight, Masked, Notification, Seat, Tour, TourStatus, User, UserRole,
    UserStatus, Vehicle,
};
use tracing::debug;

use crate::database::db_err;
use crate::pg_queue::insert_job;

/// Postgres implementation of the tour, user and booking repositories.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    role: String,
    status: String,
}

impl UserRow {
    fn into_model(self) -> CoreResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            role: self.role.parse()?,
            status: self.status.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HighlightRow {
    id: i64,
    title: String,
}

#[derive(sqlx::FromRow)]
struct TourRow {
    id: i64,
    user_id: i64,
    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    language: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TourRow {
    fn into_model(self) -> CoreResult<Tour> {
        Ok(Tour {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            language: self.language,
            status: self.status.parse()?,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    tour_id: i64,
    vehicle_type: Option<String>,
    status: String,
}

impl VehicleRow {
    fn into_model(self) -> CoreResult<Vehicle> {
        Ok(Vehicle {
            id: self.id,
            tour_id: self.tour_id,
            vehicle_type: self.vehicle_type,
            status: self.status.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: i64,
    vehicle_id: i64,
    seat_number: i32,
    status: String,
}

impl SeatRow {
    fn into_model(self) -> CoreResult<Seat> {
        Ok(Seat {
            id: self.id,
            vehicle_id: self.vehicle_id,
            seat_number: self.seat_number,
            status: self.status.parse()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: i64,
    user_id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<NaiveDate>,
    nationality: String,
    language: String,
}

impl ClientRow {
    fn into_model(self) -> Client {
        Client {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            email: self.email.map(Masked),
            phone: self.phone.map(Masked),
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            nationality: self.nationality,
            language: self.language,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    client_id: i64,
    seat_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    payment_receipt: Option<String>,
    reservation_due_date: Option<NaiveDate>,
    reserved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_model(self) -> CoreResult<Booking> {
        Ok(Booking {
            id: self.id,
            client_id: self.client_id,
            seat_id: self.seat_id,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status.parse()?,
            payment_receipt: self.payment_receipt,
            reservation_due_date: self.reservation_due_date,
            reserved_at: self.reserved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const USER_COLUMNS: &str = "id, name, email, phone, role, status";
const TOUR_COLUMNS: &str = "id, user_id, title, start_date, end_date, language, status, created_at";
const VEHICLE_COLUMNS: &str = "id, tour_id, vehicle_type, status";
const SEAT_COLUMNS: &str = "id, vehicle_id, seat_number, status";
const CLIENT_COLUMNS: &str =
    "id, user_id, name, email, phone, gender, date_of_birth, nationality, language";
const BOOKING_COLUMNS: &str = "id, client_id, seat_id, start_date, end_date, status, \
     payment_receipt, reservation_due_date, reserved_at, created_at, updated_at";

async fn fetch_seat<'e, E: PgExecutor<'e>>(exec: E, id: i64, lock: bool) -> CoreResult<Seat> {
    let sql = format!(
        "SELECT {} FROM tour_vehicle_seats WHERE id = $1{}",
        SEAT_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );
    sqlx::query_as::<_, SeatRow>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::not_found("seat", id))?
        .into_model()
}

/// Locks the booking row for the rest of the transaction.
async fn lock_booking(conn: &mut PgConnection, id: i64) -> CoreResult<Booking> {
    let sql = format!("SELECT {} FROM bookings WHERE id = $1 FOR UPDATE", BOOKING_COLUMNS);
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::not_found("booking", id))?
        .into_model()
}

/// Conditional seat update. Zero affected rows means the guard did not hold at
/// write time; the caller's transaction is then dropped and rolled back.
async fn transition_seat(
    conn: &mut PgConnection,
    seat_id: i64,
    transition: SeatTransition,
) -> CoreResult<()> {
    let affected = sqlx::query(
        "UPDATE tour_vehicle_seats SET status = $2 WHERE id = $1 AND status = $3",
    )
    .bind(seat_id)
    .bind(transition.to_status().as_str())
    .bind(transition.from_status().as_str())
    .execute(&mut *conn)
    .await
    .map_err(db_err)?
    .rows_affected();

    if affected == 0 {
        let seat = fetch_seat(&mut *conn, seat_id, false).await?;
        seat_transition(&seat, transition)?;
        return Err(CoreError::PreconditionError(format!(
            "seat {} changed while being updated",
            seat_id
        )));
    }
    debug!(seat_id, status = %transition.to_status(), "Seat status updated");
    Ok(())
}

async fn insert_vehicle(
    conn: &mut PgConnection,
    tour_id: i64,
    seat_count: u32,
) -> CoreResult<(Vehicle, Vec<Seat>)> {
    let sql = format!(
        "INSERT INTO tour_vehicles (tour_id) VALUES ($1) RETURNING {}",
        VEHICLE_COLUMNS
    );
    let vehicle = sqlx::query_as::<_, VehicleRow>(&sql)
        .bind(tour_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(db_err)?
        .into_model()?;

    let sql = format!(
        "INSERT INTO tour_vehicle_seats (vehicle_id, seat_number) \
         SELECT $1, n FROM generate_series(1, $2) AS n RETURNING {}",
        SEAT_COLUMNS
    );
    let mut seats = sqlx::query_as::<_, SeatRow>(&sql)
        .bind(vehicle.id)
        .bind(seat_count as i32)
        .fetch_all(&mut *conn)
        .await
        .map_err(db_err)?
        .into_iter()
        .map(SeatRow::into_model)
        .collect::<CoreResult<Vec<_>>>()?;
    seats.sort_by_key(|s| s.seat_number);

    Ok((vehicle, seats))
}

#[async_trait]
impl TourRepository for PgStore {
    async fn create_tour(&self, new: &NewTour) -> CoreResult<TourLayout> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let sql = format!(
            "INSERT INTO tours (user_id, title, start_date, end_date, language) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TOUR_COLUMNS
        );
        let tour = sqlx::query_as::<_, TourRow>(&sql)
            .bind(new.user_id)
            .bind(&new.title)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(&new.language)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .into_model()?;

        sqlx::query(
            "INSERT INTO tour_highlights (tour_id, highlight_id) SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(tour.id)
        .bind(&new.highlight_ids)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let (vehicle, seats) = insert_vehicle(&mut tx, tour.id, new.seats_per_vehicle).await?;
        tx.commit().await.map_err(db_err)?;

        Ok(TourLayout {
            tour,
            vehicle,
            seats,
        })
    }

    async fn get_tour(&self, id: i64) -> CoreResult<Option<Tour>> {
        let sql = format!("SELECT {} FROM tours WHERE id = $1", TOUR_COLUMNS);
        sqlx::query_as::<_, TourRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(TourRow::into_model)
            .transpose()
    }

    async fn list_tours(&self, status: Option<TourStatus>) -> CoreResult<Vec<Tour>> {
        let sql = format!(
            "SELECT {} FROM tours WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC",
            TOUR_COLUMNS
        );
        sqlx::query_as::<_, TourRow>(&sql)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(TourRow::into_model)
            .collect()
    }

    async fn find_highlights(&self, ids: &[i64]) -> CoreResult<Vec<Highlight>> {
        let rows = sqlx::query_as::<_, HighlightRow>(
            "SELECT id, title FROM highlights WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(rows
            .into_iter()
            .map(|r| Highlight {
                id: r.id,
                title: r.title,
            })
            .collect())
    }

    async fn add_vehicle(&self, tour_id: i64, seat_count: u32) -> CoreResult<(Vehicle, Vec<Seat>)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM tours WHERE id = $1")
            .bind(tour_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(CoreError::not_found("tour", tour_id));
        }
        let created = insert_vehicle(&mut tx, tour_id, seat_count).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn get_vehicle(&self, id: i64) -> CoreResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM tour_vehicles WHERE id = $1", VEHICLE_COLUMNS);
        sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(VehicleRow::into_model)
            .transpose()
    }

    async fn list_vehicles(&self, tour_id: i64) -> CoreResult<Vec<Vehicle>> {
        let sql = format!(
            "SELECT {} FROM tour_vehicles WHERE tour_id = $1 ORDER BY id",
            VEHICLE_COLUMNS
        );
        sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(tour_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(VehicleRow::into_model)
            .collect()
    }

    async fn delete_vehicle(&self, id: i64) -> CoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM tour_vehicles WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
        if exists.is_none() {
            return Err(CoreError::not_found("vehicle", id));
        }

        // Lock every seat so no reservation can land between the check and the delete.
        let sql = format!(
            "SELECT {} FROM tour_vehicle_seats WHERE vehicle_id = $1 ORDER BY seat_number FOR UPDATE",
            SEAT_COLUMNS
        );
        let seats = sqlx::query_as::<_, SeatRow>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await
            .map_err(db_err)?;
        for row in seats {
            let seat = row.into_model()?;
            if seat.status.is_occupied() {
                return Err(CoreError::PreconditionError(format!(
                    "vehicle {} still has seat {} {}",
                    id, seat.seat_number, seat.status
                )));
            }
        }

        sqlx::query("DELETE FROM tour_vehicles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        tx.commit().await.map_err(db_err)
    }

    async fn get_seat(&self, id: i64) -> CoreResult<Option<Seat>> {
        match fetch_seat(&self.pool, id, false).await {
            Ok(seat) => Ok(Some(seat)),
            Err(CoreError::NotFoundError { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_seats(&self, vehicle_id: i64) -> CoreResult<Vec<Seat>> {
        let sql = format!(
            "SELECT {} FROM tour_vehicle_seats WHERE vehicle_id = $1 ORDER BY seat_number",
            SEAT_COLUMNS
        );
        sqlx::query_as::<_, SeatRow>(&sql)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(SeatRow::into_model)
            .collect()
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create_user(&self, new: &NewUser) -> CoreResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, phone, role, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.phone)
            .bind(new.role.as_str())
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?
            .into_model()
    }

    async fn get_user(&self, id: i64) -> CoreResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(UserRow::into_model)
            .transpose()
    }

    async fn list_users(&self, role: UserRole) -> CoreResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users WHERE role = $1 ORDER BY id", USER_COLUMNS);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(UserRow::into_model)
            .collect()
    }

    async fn set_user_status(&self, id: i64, status: UserStatus) -> CoreResult<User> {
        let sql = format!(
            "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or_else(|| CoreError::not_found("user", id))?
            .into_model()
    }
}

#[async_trait]
impl BookingRepository for PgStore {
    async fn reserve_seat(
        &self,
        reservation: &NewReservation,
        now: DateTime<Utc>,
    ) -> CoreResult<(Client, Booking)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        transition_seat(&mut tx, reservation.seat_id, SeatTransition::Reserve).await?;

        let details = &reservation.client;
        let sql = format!(
            "INSERT INTO clients (user_id, name, email, phone, gender, date_of_birth, nationality, language) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            CLIENT_COLUMNS
        );
        let client = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(details.user_id)
            .bind(&details.name)
            .bind(&details.email)
            .bind(&details.phone)
            .bind(&details.gender)
            .bind(details.date_of_birth)
            .bind(&details.nationality)
            .bind(&details.language)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .into_model();

        let sql = format!(
            "INSERT INTO bookings (client_id, seat_id, start_date, end_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) RETURNING {}",
            BOOKING_COLUMNS
        );
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(client.id)
            .bind(reservation.seat_id)
            .bind(reservation.start_date)
            .bind(reservation.end_date)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .into_model()?;

        tx.commit().await.map_err(db_err)?;
        Ok((client, booking))
    }

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>> {
        let sql = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(BookingRow::into_model)
            .transpose()
    }

    async fn get_client(&self, id: i64) -> CoreResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = $1", CLIENT_COLUMNS);
        Ok(sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(ClientRow::into_model))
    }

    async fn bookings_for_seat(&self, seat_id: i64) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings WHERE seat_id = $1 ORDER BY id",
            BOOKING_COLUMNS
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(seat_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(BookingRow::into_model)
            .collect()
    }

    async fn attach_receipt(
        &self,
        booking_id: i64,
        receipt: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        ensure_active(&lock_booking(&mut tx, booking_id).await?)?;

        let sql = format!(
            "UPDATE bookings SET payment_receipt = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        );
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .bind(receipt)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .into_model()?;
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn confirm_booking(
        &self,
        booking_id: i64,
        seat_id: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let booking = lock_booking(&mut tx, booking_id).await?;
        let seat = fetch_seat(&mut *tx, booking.seat_id, true).await?;
        check_confirmation(&booking, &seat, seat_id)?;

        transition_seat(&mut tx, seat_id, SeatTransition::Book).await?;
        let booking = set_booking_status(&mut tx, booking_id, BookingTransition::Confirm, now).await?;
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn set_due_date(
        &self,
        booking_id: i64,
        due_date: NaiveDate,
        reserved_at: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        ensure_active(&lock_booking(&mut tx, booking_id).await?)?;

        let sql = format!(
            "UPDATE bookings SET reservation_due_date = $2, reserved_at = $3, updated_at = $3 \
             WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        );
        let booking = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(booking_id)
            .bind(due_date)
            .bind(reserved_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err)?
            .into_model()?;
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn cancel_booking(
        &self,
        booking_id: i64,
        notices: &[Notification],
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let booking = lock_booking(&mut tx, booking_id).await?;
        booking_transition(&booking, BookingTransition::Cancel)?;

        transition_seat(&mut tx, booking.seat_id, SeatTransition::Release).await?;
        let booking = set_booking_status(&mut tx, booking_id, BookingTransition::Cancel, now).await?;
        for notice in notices {
            let job_id = insert_job(&mut *tx, notice).await?;
            debug!(booking_id, job_id, template = %notice.template, "Notice queued with cancellation");
        }
        tx.commit().await.map_err(db_err)?;
        Ok(booking)
    }

    async fn due_bookings(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {} FROM bookings \
             WHERE status = 'active' AND reservation_due_date BETWEEN $1 AND $2 \
             ORDER BY id",
            BOOKING_COLUMNS
        );
        sqlx::query_as::<_, BookingRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(BookingRow::into_model)
            .collect()
    }
}

/// Moves an `active` booking to its terminal status; the row must already be
/// locked by the caller.
async fn set_booking_status(
    conn: &mut PgConnection,
    booking_id: i64,
    transition: BookingTransition,
    now: DateTime<Utc>,
) -> CoreResult<Booking> {
    let sql = format!(
        "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1 AND status = 'active' RETURNING {}",
        BOOKING_COLUMNS
    );
    sqlx::query_as::<_, BookingRow>(&sql)
        .bind(booking_id)
        .bind(transition.to_status().as_str())
        .bind(now)
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| {
            CoreError::PreconditionError(format!("booking {} is no longer active", booking_id))
        })?
        .into_model()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tourdesk_shared::SeatStatus;

    #[test]
    fn test_rows_with_unknown_status_are_rejected() {
        let row = SeatRow {
            id: 1,
            vehicle_id: 1,
            seat_number: 1,
            status: "held".to_string(),
        };
        let err = row.into_model().unwrap_err();
        assert!(err.to_string().contains("held"));

        let row = SeatRow {
            id: 1,
            vehicle_id: 1,
            seat_number: 4,
            status: "reserved".to_string(),
        };
        assert_eq!(row.into_model().unwrap().status, SeatStatus::Reserved);
    }
}

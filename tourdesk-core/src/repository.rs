use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tourdesk_shared::{
    Booking, Client, Highlight, JobStatus, Notification, NotificationJob, Seat, Tour, TourStatus,
    User, UserRole, UserStatus, Vehicle,
};

use crate::CoreResult;

#[derive(Debug, Clone)]
pub struct NewTour {
    pub user_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub language: String,
    pub highlight_ids: Vec<i64>,
    pub seats_per_vehicle: u32,
}

/// A freshly created tour with its first vehicle and seats.
#[derive(Debug, Clone)]
pub struct TourLayout {
    pub tour: Tour,
    pub vehicle: Vehicle,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub user_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct NewReservation {
    pub client: NewClient,
    pub seat_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub password_hash: String,
}

/// Tours, their vehicles and seats.
#[async_trait]
pub trait TourRepository: Send + Sync {
    /// Creates the tour, its highlight links, one vehicle and its seats in one unit.
    async fn create_tour(&self, tour: &NewTour) -> CoreResult<TourLayout>;

    async fn get_tour(&self, id: i64) -> CoreResult<Option<Tour>>;

    async fn list_tours(&self, status: Option<TourStatus>) -> CoreResult<Vec<Tour>>;

    async fn find_highlights(&self, ids: &[i64]) -> CoreResult<Vec<Highlight>>;

    async fn add_vehicle(&self, tour_id: i64, seat_count: u32) -> CoreResult<(Vehicle, Vec<Seat>)>;

    async fn get_vehicle(&self, id: i64) -> CoreResult<Option<Vehicle>>;

    async fn list_vehicles(&self, tour_id: i64) -> CoreResult<Vec<Vehicle>>;

    /// Deletes the vehicle and its seats; fails with a precondition error, and
    /// deletes nothing, if any seat is reserved or booked.
    async fn delete_vehicle(&self, id: i64) -> CoreResult<()>;

    async fn get_seat(&self, id: i64) -> CoreResult<Option<Seat>>;

    async fn list_seats(&self, vehicle_id: i64) -> CoreResult<Vec<Seat>>;
}

/// Admin and agent accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with a validation error when the email is already registered.
    async fn create_user(&self, user: &NewUser) -> CoreResult<User>;

    async fn get_user(&self, id: i64) -> CoreResult<Option<User>>;

    async fn list_users(&self, role: UserRole) -> CoreResult<Vec<User>>;

    async fn set_user_status(&self, id: i64, status: UserStatus) -> CoreResult<User>;
}

/// Clients and bookings. Every mutating method is a single atomic unit that
/// re-checks its state guard at write time and changes nothing on failure.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Flips the seat `available -> reserved` and inserts the client and an
    /// active booking.
    async fn reserve_seat(
        &self,
        reservation: &NewReservation,
        now: DateTime<Utc>,
    ) -> CoreResult<(Client, Booking)>;

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>>;

    async fn get_client(&self, id: i64) -> CoreResult<Option<Client>>;

    async fn bookings_for_seat(&self, seat_id: i64) -> CoreResult<Vec<Booking>>;

    /// Stores the receipt reference on an active booking.
    async fn attach_receipt(
        &self,
        booking_id: i64,
        receipt: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking>;

    /// Booking `active -> confirmed_payment` and seat `reserved -> booked`.
    async fn confirm_booking(
        &self,
        booking_id: i64,
        seat_id: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking>;

    async fn set_due_date(
        &self,
        booking_id: i64,
        due_date: NaiveDate,
        reserved_at: DateTime<Utc>,
    ) -> CoreResult<Booking>;

    /// Booking `active -> cancelled` and seat `reserved -> available`. The
    /// `notices` are queued in the same write, so a cancellation is never
    /// committed without them.
    async fn cancel_booking(
        &self,
        booking_id: i64,
        notices: &[Notification],
        now: DateTime<Utc>,
    ) -> CoreResult<Booking>;

    /// Active bookings whose reservation due date lies in `[from, to]`.
    async fn due_bookings(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<Vec<Booking>>;
}

/// Everything the workflow, the sweep and the admin services read and write.
pub trait Store: TourRepository + UserRepository + BookingRepository {}

impl<T> Store for T where T: TourRepository + UserRepository + BookingRepository {}

/// Durable outbox drained by the queue worker.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn enqueue(&self, notification: &Notification) -> CoreResult<i64>;

    /// Moves up to `limit` jobs to `processing`, stamps them with `now` and
    /// returns them. Claimable jobs are `pending` ones and `processing` ones
    /// claimed before `reclaim_before`, whose worker never reported back.
    async fn claim_pending(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        reclaim_before: DateTime<Utc>,
    ) -> CoreResult<Vec<NotificationJob>>;

    async fn mark_sent(&self, job_id: i64) -> CoreResult<()>;

    /// Records a failed delivery. The job returns to `pending` until it has
    /// been attempted `max_attempts` times, then it is parked as `failed`.
    async fn mark_failed(&self, job_id: i64, error: &str, max_attempts: i32)
        -> CoreResult<JobStatus>;
}

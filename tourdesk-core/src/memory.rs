use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tourdesk_shared::{
    Booking, BookingStatus, Client, Highlight, JobStatus, Masked, Notification, NotificationJob,
    Seat, SeatStatus, Tour, TourStatus, User, UserRole, UserStatus, Vehicle, VehicleStatus,
};

use crate::lifecycle::{
    booking_transition, check_confirmation, ensure_active, seat_transition, BookingTransition,
    SeatTransition,
};
use crate::repository::{
    BookingRepository, NewReservation, NewTour, NewUser, NotificationQueue, TourLayout,
    TourRepository, UserRepository,
};
use crate::{CoreError, CoreResult};

#[derive(Default)]
struct State {
    last_id: i64,
    users: BTreeMap<i64, User>,
    password_hashes: BTreeMap<i64, String>,
    highlights: BTreeMap<i64, Highlight>,
    tours: BTreeMap<i64, Tour>,
    tour_highlights: Vec<(i64, i64)>,
    vehicles: BTreeMap<i64, Vehicle>,
    seats: BTreeMap<i64, Seat>,
    clients: BTreeMap<i64, Client>,
    bookings: BTreeMap<i64, Booking>,
    jobs: BTreeMap<i64, NotificationJob>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn insert_vehicle(&mut self, tour_id: i64, seat_count: u32) -> (Vehicle, Vec<Seat>) {
        let vehicle = Vehicle {
            id: self.next_id(),
            tour_id,
            vehicle_type: None,
            status: VehicleStatus::Active,
        };
        self.vehicles.insert(vehicle.id, vehicle.clone());

        let mut seats = Vec::with_capacity(seat_count as usize);
        for number in 1..=seat_count {
            let seat = Seat {
                id: self.next_id(),
                vehicle_id: vehicle.id,
                seat_number: number as i32,
                status: SeatStatus::Available,
            };
            self.seats.insert(seat.id, seat.clone());
            seats.push(seat);
        }
        (vehicle, seats)
    }

    fn booking(&self, id: i64) -> CoreResult<&Booking> {
        self.bookings
            .get(&id)
            .ok_or_else(|| CoreError::not_found("booking", id))
    }

    fn seat(&self, id: i64) -> CoreResult<&Seat> {
        self.seats
            .get(&id)
            .ok_or_else(|| CoreError::not_found("seat", id))
    }

    fn set_seat_status(&mut self, id: i64, status: SeatStatus) {
        if let Some(seat) = self.seats.get_mut(&id) {
            seat.status = status;
        }
    }

    fn push_job(&mut self, notification: &Notification, now: DateTime<Utc>) -> i64 {
        let job = NotificationJob {
            id: self.next_id(),
            notification: notification.clone(),
            status: JobStatus::Pending,
            attempts: 0,
            last_error: None,
            claimed_at: None,
            created_at: now,
        };
        let id = job.id;
        self.jobs.insert(id, job);
        id
    }

    fn update_booking(&mut self, id: i64, apply: impl FnOnce(&mut Booking)) -> CoreResult<Booking> {
        let booking = self
            .bookings
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("booking", id))?;
        apply(booking);
        Ok(booking.clone())
    }
}

/// Process-local implementation of every repository trait and the
/// notification queue. Each operation runs under one lock, so the guard check
/// and the write it protects are a single step.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_highlight(&self, title: &str) -> Highlight {
        let mut state = self.state.lock().await;
        let highlight = Highlight {
            id: state.next_id(),
            title: title.to_string(),
        };
        state.highlights.insert(highlight.id, highlight.clone());
        highlight
    }

    pub async fn insert_user(&self, name: &str, email: &str, role: UserRole) -> User {
        let mut state = self.state.lock().await;
        let user = User {
            id: state.next_id(),
            name: name.to_string(),
            email: email.to_string(),
            phone: None,
            role,
            status: UserStatus::Active,
        };
        state.users.insert(user.id, user.clone());
        user
    }

    /// Drops a tour record without touching its vehicles, leaving dangling
    /// references behind. Used to exercise error isolation.
    pub async fn remove_tour(&self, id: i64) -> Option<Tour> {
        self.state.lock().await.tours.remove(&id)
    }

    pub async fn password_hash(&self, user_id: i64) -> Option<String> {
        self.state.lock().await.password_hashes.get(&user_id).cloned()
    }

    pub async fn highlight_links(&self, tour_id: i64) -> Vec<i64> {
        self.state
            .lock()
            .await
            .tour_highlights
            .iter()
            .filter(|(t, _)| *t == tour_id)
            .map(|(_, h)| *h)
            .collect()
    }

    pub async fn all_bookings(&self) -> Vec<Booking> {
        self.state.lock().await.bookings.values().cloned().collect()
    }

    pub async fn jobs(&self) -> Vec<NotificationJob> {
        self.state.lock().await.jobs.values().cloned().collect()
    }

    /// Queued notifications in enqueue order, regardless of delivery status.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.jobs().await.into_iter().map(|j| j.notification).collect()
    }
}

#[async_trait]
impl TourRepository for InMemoryStore {
    async fn create_tour(&self, new: &NewTour) -> CoreResult<TourLayout> {
        let mut state = self.state.lock().await;
        let tour = Tour {
            id: state.next_id(),
            user_id: new.user_id,
            title: new.title.clone(),
            start_date: new.start_date,
            end_date: new.end_date,
            language: new.language.clone(),
            status: TourStatus::Active,
            created_at: Utc::now(),
        };
        state.tours.insert(tour.id, tour.clone());
        for highlight_id in &new.highlight_ids {
            state.tour_highlights.push((tour.id, *highlight_id));
        }
        let (vehicle, seats) = state.insert_vehicle(tour.id, new.seats_per_vehicle);
        Ok(TourLayout {
            tour,
            vehicle,
            seats,
        })
    }

    async fn get_tour(&self, id: i64) -> CoreResult<Option<Tour>> {
        Ok(self.state.lock().await.tours.get(&id).cloned())
    }

    async fn list_tours(&self, status: Option<TourStatus>) -> CoreResult<Vec<Tour>> {
        let state = self.state.lock().await;
        let mut tours: Vec<Tour> = state
            .tours
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        tours.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tours)
    }

    async fn find_highlights(&self, ids: &[i64]) -> CoreResult<Vec<Highlight>> {
        let state = self.state.lock().await;
        Ok(state
            .highlights
            .values()
            .filter(|h| ids.contains(&h.id))
            .cloned()
            .collect())
    }

    async fn add_vehicle(&self, tour_id: i64, seat_count: u32) -> CoreResult<(Vehicle, Vec<Seat>)> {
        let mut state = self.state.lock().await;
        if !state.tours.contains_key(&tour_id) {
            return Err(CoreError::not_found("tour", tour_id));
        }
        Ok(state.insert_vehicle(tour_id, seat_count))
    }

    async fn get_vehicle(&self, id: i64) -> CoreResult<Option<Vehicle>> {
        Ok(self.state.lock().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self, tour_id: i64) -> CoreResult<Vec<Vehicle>> {
        let state = self.state.lock().await;
        Ok(state
            .vehicles
            .values()
            .filter(|v| v.tour_id == tour_id)
            .cloned()
            .collect())
    }

    async fn delete_vehicle(&self, id: i64) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        if !state.vehicles.contains_key(&id) {
            return Err(CoreError::not_found("vehicle", id));
        }
        if let Some(seat) = state
            .seats
            .values()
            .find(|s| s.vehicle_id == id && s.status.is_occupied())
        {
            return Err(CoreError::PreconditionError(format!(
                "vehicle {} still has seat {} {}",
                id, seat.seat_number, seat.status
            )));
        }
        state.seats.retain(|_, s| s.vehicle_id != id);
        state.vehicles.remove(&id);
        Ok(())
    }

    async fn get_seat(&self, id: i64) -> CoreResult<Option<Seat>> {
        Ok(self.state.lock().await.seats.get(&id).cloned())
    }

    async fn list_seats(&self, vehicle_id: i64) -> CoreResult<Vec<Seat>> {
        let state = self.state.lock().await;
        let mut seats: Vec<Seat> = state
            .seats
            .values()
            .filter(|s| s.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        seats.sort_by_key(|s| s.seat_number);
        Ok(seats)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(&self, new: &NewUser) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(CoreError::ValidationError(format!(
                "email {} is already registered",
                new.email
            )));
        }
        let user = User {
            id: state.next_id(),
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            role: new.role,
            status: UserStatus::Active,
        };
        state.users.insert(user.id, user.clone());
        state
            .password_hashes
            .insert(user.id, new.password_hash.clone());
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> CoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn list_users(&self, role: UserRole) -> CoreResult<Vec<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect())
    }

    async fn set_user_status(&self, id: i64, status: UserStatus) -> CoreResult<User> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| CoreError::not_found("user", id))?;
        user.status = status;
        Ok(user.clone())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn reserve_seat(
        &self,
        reservation: &NewReservation,
        now: DateTime<Utc>,
    ) -> CoreResult<(Client, Booking)> {
        let mut state = self.state.lock().await;
        let target = seat_transition(state.seat(reservation.seat_id)?, SeatTransition::Reserve)?;

        let details = &reservation.client;
        let client = Client {
            id: state.next_id(),
            user_id: details.user_id,
            name: details.name.clone(),
            email: details.email.clone().map(Masked),
            phone: details.phone.clone().map(Masked),
            gender: details.gender.clone(),
            date_of_birth: details.date_of_birth,
            nationality: details.nationality.clone(),
            language: details.language.clone(),
        };
        state.clients.insert(client.id, client.clone());

        let booking = Booking {
            id: state.next_id(),
            client_id: client.id,
            seat_id: reservation.seat_id,
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            status: BookingStatus::Active,
            payment_receipt: None,
            reservation_due_date: None,
            reserved_at: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());
        state.set_seat_status(reservation.seat_id, target);

        Ok((client, booking))
    }

    async fn get_booking(&self, id: i64) -> CoreResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn get_client(&self, id: i64) -> CoreResult<Option<Client>> {
        Ok(self.state.lock().await.clients.get(&id).cloned())
    }

    async fn bookings_for_seat(&self, seat_id: i64) -> CoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.seat_id == seat_id)
            .cloned()
            .collect())
    }

    async fn attach_receipt(
        &self,
        booking_id: i64,
        receipt: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        ensure_active(state.booking(booking_id)?)?;
        state.update_booking(booking_id, |b| {
            b.payment_receipt = Some(receipt.to_string());
            b.updated_at = now;
        })
    }

    async fn confirm_booking(
        &self,
        booking_id: i64,
        seat_id: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        let booking = state.booking(booking_id)?;
        let seat = state.seat(booking.seat_id)?;
        check_confirmation(booking, seat, seat_id)?;

        state.set_seat_status(seat_id, SeatStatus::Booked);
        state.update_booking(booking_id, |b| {
            b.status = BookingStatus::ConfirmedPayment;
            b.updated_at = now;
        })
    }

    async fn set_due_date(
        &self,
        booking_id: i64,
        due_date: NaiveDate,
        reserved_at: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        ensure_active(state.booking(booking_id)?)?;
        state.update_booking(booking_id, |b| {
            b.reservation_due_date = Some(due_date);
            b.reserved_at = Some(reserved_at);
            b.updated_at = reserved_at;
        })
    }

    async fn cancel_booking(
        &self,
        booking_id: i64,
        notices: &[Notification],
        now: DateTime<Utc>,
    ) -> CoreResult<Booking> {
        let mut state = self.state.lock().await;
        let booking = state.booking(booking_id)?;
        let status = booking_transition(booking, BookingTransition::Cancel)?;
        let seat_id = booking.seat_id;
        let seat_status = seat_transition(state.seat(seat_id)?, SeatTransition::Release)?;

        state.set_seat_status(seat_id, seat_status);
        for notice in notices {
            state.push_job(notice, now);
        }
        state.update_booking(booking_id, |b| {
            b.status = status;
            b.updated_at = now;
        })
    }

    async fn due_bookings(&self, from: NaiveDate, to: NaiveDate) -> CoreResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Active)
            .filter(|b| {
                b.reservation_due_date
                    .is_some_and(|due| due >= from && due <= to)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationQueue for InMemoryStore {
    async fn enqueue(&self, notification: &Notification) -> CoreResult<i64> {
        Ok(self.state.lock().await.push_job(notification, Utc::now()))
    }

    async fn claim_pending(
        &self,
        limit: i64,
        now: DateTime<Utc>,
        reclaim_before: DateTime<Utc>,
    ) -> CoreResult<Vec<NotificationJob>> {
        let mut state = self.state.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        let claimed: Vec<NotificationJob> = state
            .jobs
            .values_mut()
            .filter(|j| match j.status {
                JobStatus::Pending => true,
                JobStatus::Processing => j.claimed_at.map_or(true, |at| at < reclaim_before),
                _ => false,
            })
            .take(limit)
            .map(|j| {
                j.status = JobStatus::Processing;
                j.attempts += 1;
                j.claimed_at = Some(now);
                j.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn mark_sent(&self, job_id: i64) -> CoreResult<()> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("notification job", job_id))?;
        job.status = JobStatus::Sent;
        job.last_error = None;
        Ok(())
    }

    async fn mark_failed(
        &self,
        job_id: i64,
        error: &str,
        max_attempts: i32,
    ) -> CoreResult<JobStatus> {
        let mut state = self.state.lock().await;
        let job = state
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| CoreError::not_found("notification job", job_id))?;
        job.status = if job.attempts >= max_attempts {
            JobStatus::Failed
        } else {
            JobStatus::Pending
        };
        job.last_error = Some(error.to_string());
        Ok(job.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::NewClient;
    use crate::ErrorKind;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    async fn tour_with_seats(store: &InMemoryStore) -> TourLayout {
        store
            .create_tour(&NewTour {
                user_id: 1,
                title: "61 SEH".to_string(),
                start_date: day(20),
                end_date: day(27),
                language: "ENGLISH".to_string(),
                highlight_ids: vec![],
                seats_per_vehicle: 6,
            })
            .await
            .unwrap()
    }

    fn reservation(seat_id: i64) -> NewReservation {
        NewReservation {
            client: NewClient {
                user_id: 2,
                name: "John Doe".to_string(),
                email: Some("john@example.com".to_string()),
                phone: None,
                gender: None,
                date_of_birth: None,
                nationality: "TZ".to_string(),
                language: "ENGLISH".to_string(),
            },
            seat_id,
            start_date: day(20),
            end_date: day(27),
        }
    }

    #[tokio::test]
    async fn test_tour_layout_numbers_seats_from_one() {
        let store = InMemoryStore::new();
        let layout = tour_with_seats(&store).await;
        let numbers: Vec<i32> = layout.seats.iter().map(|s| s.seat_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert!(layout.seats.iter().all(|s| s.status == SeatStatus::Available));
    }

    #[tokio::test]
    async fn test_concurrent_reservations_of_one_seat_admit_exactly_one() {
        let store = Arc::new(InMemoryStore::new());
        let seat_id = tour_with_seats(&store).await.seats[0].id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.reserve_seat(&reservation(seat_id), Utc::now()).await
            }));
        }

        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::Precondition),
            }
        }
        assert_eq!(won, 1);
        assert_eq!(store.bookings_for_seat(seat_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_releases_seat_and_blocks_reuse_of_booking() {
        let store = InMemoryStore::new();
        let seat_id = tour_with_seats(&store).await.seats[2].id;
        let (_, booking) = store.reserve_seat(&reservation(seat_id), Utc::now()).await.unwrap();

        let notice = notification(2, "grace@example.com");
        let cancelled = store
            .cancel_booking(booking.id, &[notice.clone()], Utc::now())
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(
            store.get_seat(seat_id).await.unwrap().unwrap().status,
            SeatStatus::Available
        );
        assert_eq!(store.notifications().await, vec![notice.clone()]);

        // a refused cancellation queues nothing
        let err = store
            .cancel_booking(booking.id, &[notice], Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(store.jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_vehicle_with_reserved_seat_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let layout = tour_with_seats(&store).await;
        store
            .reserve_seat(&reservation(layout.seats[0].id), Utc::now())
            .await
            .unwrap();

        let err = store.delete_vehicle(layout.vehicle.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(store.list_seats(layout.vehicle.id).await.unwrap().len(), 6);
    }

    fn notification(user_id: i64, email: &str) -> Notification {
        Notification {
            recipient: tourdesk_shared::Recipient {
                user_id: Some(user_id),
                name: "Ada".to_string(),
                email: email.to_string(),
            },
            template: tourdesk_shared::TemplateKind::ReceiptUploaded,
            payload: tourdesk_shared::NotificationPayload::Booking(tourdesk_shared::BookingNotice {
                package_title: "61 SEH".to_string(),
                seat_number: 1,
                client_name: "John Doe".to_string(),
                agent_name: None,
                admin_name: Some("Ada".to_string()),
                is_due_date: None,
                days_left: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_failed_job_is_retried_until_attempts_run_out() {
        let store = InMemoryStore::new();
        let user = store.insert_user("Ada", "ada@example.com", UserRole::Admin).await;
        let id = store.enqueue(&notification(user.id, &user.email)).await.unwrap();
        let now = Utc::now();
        let before = now - chrono::Duration::minutes(5);

        let claimed = store.claim_pending(10, now, before).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].claimed_at, Some(now));
        assert!(store.claim_pending(10, now, before).await.unwrap().is_empty());
        assert_eq!(
            store.mark_failed(id, "smtp down", 2).await.unwrap(),
            JobStatus::Pending
        );

        store.claim_pending(10, now, before).await.unwrap();
        assert_eq!(
            store.mark_failed(id, "smtp down", 2).await.unwrap(),
            JobStatus::Failed
        );
        assert!(store.claim_pending(10, now, before).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unacknowledged_claim_is_reclaimed_after_timeout() {
        let store = InMemoryStore::new();
        let id = store
            .enqueue(&notification(1, "ada@example.com"))
            .await
            .unwrap();
        let claimed_at = Utc::now();
        let timeout = chrono::Duration::minutes(5);

        // worker claims the job and never reports back
        let first = store
            .claim_pending(10, claimed_at, claimed_at - timeout)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);

        let soon = claimed_at + chrono::Duration::minutes(1);
        assert!(store.claim_pending(10, soon, soon - timeout).await.unwrap().is_empty());

        let later = claimed_at + chrono::Duration::minutes(6);
        let again = store.claim_pending(10, later, later - timeout).await.unwrap();
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].id, id);
        assert_eq!(again[0].attempts, 2);
        assert_eq!(again[0].claimed_at, Some(later));

        store.mark_sent(id).await.unwrap();
        let much_later = later + chrono::Duration::hours(1);
        assert!(store
            .claim_pending(10, much_later, much_later - timeout)
            .await
            .unwrap()
            .is_empty());
    }
}

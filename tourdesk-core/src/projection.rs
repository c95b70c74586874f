//! Read-only traversals from a booking to the records around it.
//!
//! Entities reference each other by id only; these helpers resolve the
//! `Booking -> Seat -> Vehicle -> Tour` and `Booking -> Client -> Agent` paths
//! through the repositories and name the first missing link.

use tourdesk_shared::{Booking, Client, Seat, Tour, User, Vehicle};

use crate::repository::Store;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone)]
pub struct BookingContext {
    pub booking: Booking,
    pub client: Client,
    /// The agent who created the client.
    pub agent: User,
    pub seat: Seat,
    pub vehicle: Vehicle,
    pub tour: Tour,
}

impl BookingContext {
    pub fn package_title(&self) -> &str {
        &self.tour.title
    }
}

/// Seat, vehicle and tour for a seat id.
pub async fn load_seat_path(store: &dyn Store, seat_id: i64) -> CoreResult<(Seat, Vehicle, Tour)> {
    let seat = store
        .get_seat(seat_id)
        .await?
        .ok_or_else(|| CoreError::not_found("seat", seat_id))?;
    let vehicle = store
        .get_vehicle(seat.vehicle_id)
        .await?
        .ok_or_else(|| CoreError::not_found("vehicle", seat.vehicle_id))?;
    let tour = store
        .get_tour(vehicle.tour_id)
        .await?
        .ok_or_else(|| CoreError::not_found("tour", vehicle.tour_id))?;
    Ok((seat, vehicle, tour))
}

pub async fn load_booking_context(store: &dyn Store, booking: Booking) -> CoreResult<BookingContext> {
    let client = store
        .get_client(booking.client_id)
        .await?
        .ok_or_else(|| CoreError::not_found("client", booking.client_id))?;
    let agent = store
        .get_user(client.user_id)
        .await?
        .ok_or_else(|| CoreError::not_found("user", client.user_id))?;
    let (seat, vehicle, tour) = load_seat_path(store, booking.seat_id).await?;

    Ok(BookingContext {
        booking,
        client,
        agent,
        seat,
        vehicle,
        tour,
    })
}

pub async fn load_booking(store: &dyn Store, booking_id: i64) -> CoreResult<BookingContext> {
    let booking = store
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| CoreError::not_found("booking", booking_id))?;
    load_booking_context(store, booking).await
}

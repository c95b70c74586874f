//! Guards for the seat and booking state machines.
//!
//! Every function here is pure: it inspects the current record and either
//! returns the target status or the unmet condition. Stores call these before
//! writing and re-check the same condition inside their atomic update, so a
//! failed guard never leaves a partial change behind.

use tourdesk_shared::{Booking, BookingStatus, Seat, SeatStatus};

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatTransition {
    /// `available -> reserved`, on booking creation.
    Reserve,
    /// `reserved -> booked`, on payment confirmation.
    Book,
    /// `reserved -> available`, on cancellation or due-date expiry.
    Release,
}

impl SeatTransition {
    pub fn from_status(&self) -> SeatStatus {
        match self {
            SeatTransition::Reserve => SeatStatus::Available,
            SeatTransition::Book | SeatTransition::Release => SeatStatus::Reserved,
        }
    }

    pub fn to_status(&self) -> SeatStatus {
        match self {
            SeatTransition::Reserve => SeatStatus::Reserved,
            SeatTransition::Book => SeatStatus::Booked,
            SeatTransition::Release => SeatStatus::Available,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            SeatTransition::Reserve => "reserve",
            SeatTransition::Book => "book",
            SeatTransition::Release => "release",
        }
    }
}

pub fn seat_transition(seat: &Seat, transition: SeatTransition) -> CoreResult<SeatStatus> {
    if seat.status != transition.from_status() {
        return Err(CoreError::PreconditionError(format!(
            "seat {} (number {}) must be {} to {}, but is {}",
            seat.id,
            seat.seat_number,
            transition.from_status(),
            transition.verb(),
            seat.status
        )));
    }
    Ok(transition.to_status())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingTransition {
    Confirm,
    Cancel,
}

impl BookingTransition {
    pub fn to_status(&self) -> BookingStatus {
        match self {
            BookingTransition::Confirm => BookingStatus::ConfirmedPayment,
            BookingTransition::Cancel => BookingStatus::Cancelled,
        }
    }
}

pub fn booking_transition(
    booking: &Booking,
    transition: BookingTransition,
) -> CoreResult<BookingStatus> {
    ensure_active(booking)?;
    Ok(transition.to_status())
}

/// Only `active` bookings accept receipts, due dates or status changes.
pub fn ensure_active(booking: &Booking) -> CoreResult<()> {
    if booking.status != BookingStatus::Active {
        return Err(CoreError::PreconditionError(format!(
            "booking {} is {}, expected active",
            booking.id, booking.status
        )));
    }
    Ok(())
}

/// Confirmation preconditions, checked in a fixed order so callers always see
/// the first unmet one.
pub fn check_confirmation(booking: &Booking, seat: &Seat, seat_id: i64) -> CoreResult<()> {
    if booking.seat_id != seat_id || seat.id != seat_id {
        return Err(CoreError::ValidationError(format!(
            "seat {} does not belong to booking {}",
            seat_id, booking.id
        )));
    }
    if !booking.has_receipt() {
        return Err(CoreError::PreconditionError(format!(
            "booking {} has no payment receipt",
            booking.id
        )));
    }
    ensure_active(booking)?;
    seat_transition(seat, SeatTransition::Book)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::{NaiveDate, Utc};

    fn seat(status: SeatStatus) -> Seat {
        Seat {
            id: 10,
            vehicle_id: 1,
            seat_number: 3,
            status,
        }
    }

    fn booking(status: BookingStatus, receipt: Option<&str>) -> Booking {
        let day = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        Booking {
            id: 5,
            client_id: 1,
            seat_id: 10,
            start_date: day,
            end_date: day,
            status,
            payment_receipt: receipt.map(str::to_string),
            reservation_due_date: None,
            reserved_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_seat_walks_forward_only_from_expected_state() {
        assert_eq!(
            seat_transition(&seat(SeatStatus::Available), SeatTransition::Reserve).unwrap(),
            SeatStatus::Reserved
        );
        assert_eq!(
            seat_transition(&seat(SeatStatus::Reserved), SeatTransition::Book).unwrap(),
            SeatStatus::Booked
        );
        assert_eq!(
            seat_transition(&seat(SeatStatus::Reserved), SeatTransition::Release).unwrap(),
            SeatStatus::Available
        );

        let err = seat_transition(&seat(SeatStatus::Booked), SeatTransition::Release).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("must be reserved to release"));

        assert!(seat_transition(&seat(SeatStatus::Reserved), SeatTransition::Reserve).is_err());
    }

    #[test]
    fn test_cancelled_booking_is_terminal() {
        let b = booking(BookingStatus::Cancelled, Some("r.pdf"));
        assert!(booking_transition(&b, BookingTransition::Confirm).is_err());
        assert!(booking_transition(&b, BookingTransition::Cancel).is_err());
    }

    #[test]
    fn test_confirmation_checks_run_in_order() {
        let reserved = seat(SeatStatus::Reserved);

        let err = check_confirmation(&booking(BookingStatus::Active, None), &reserved, 99)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = check_confirmation(&booking(BookingStatus::Cancelled, None), &reserved, 10)
            .unwrap_err();
        assert!(err.to_string().contains("no payment receipt"));

        let err = check_confirmation(
            &booking(BookingStatus::Cancelled, Some("r.pdf")),
            &reserved,
            10,
        )
        .unwrap_err();
        assert!(err.to_string().contains("expected active"));

        let err = check_confirmation(
            &booking(BookingStatus::Active, Some("r.pdf")),
            &seat(SeatStatus::Available),
            10,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("must be reserved to book"));

        assert!(check_confirmation(&booking(BookingStatus::Active, Some("r.pdf")), &reserved, 10).is_ok());
    }
}

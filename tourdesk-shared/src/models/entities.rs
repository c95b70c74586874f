use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::pii::Masked;
use crate::UnknownStatus;

/// Declares a status enum persisted as a snake_case string column.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownStatus;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownStatus {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

status_enum!(
    /// Whether a tour is offered to agents.
    TourStatus, "tour" {
        Active => "active",
        Inactive => "inactive",
    }
);

status_enum!(VehicleStatus, "vehicle" {
    Active => "active",
    Inactive => "inactive",
});

status_enum!(
    /// Availability of a single seat.
    ///
    /// `Available -> Reserved -> Booked`, with `Reserved -> Available` when the
    /// reservation is cancelled or expires. `Booked` is never released.
    SeatStatus, "seat" {
        Available => "available",
        Reserved => "reserved",
        Booked => "booked",
    }
);

status_enum!(
    /// Progress of a booking. `ConfirmedPayment` and `Cancelled` are terminal.
    BookingStatus, "booking" {
        Active => "active",
        ConfirmedPayment => "confirmed_payment",
        Cancelled => "cancelled",
    }
);

status_enum!(UserRole, "user role" {
    Admin => "admin",
    Agent => "agent",
});

status_enum!(UserStatus, "user" {
    Active => "active",
    Inactive => "inactive",
});

impl SeatStatus {
    /// A seat is occupied while a live booking references it.
    pub fn is_occupied(&self) -> bool {
        matches!(self, SeatStatus::Reserved | SeatStatus::Booked)
    }
}

impl BookingStatus {
    /// Live bookings hold their seat.
    pub fn is_live(&self) -> bool {
        matches!(self, BookingStatus::Active | BookingStatus::ConfirmedPayment)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::ConfirmedPayment | BookingStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Highlight {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub language: String,
    pub status: TourStatus,
    pub created_at: DateTime<Utc>,
}

impl Tour {
    /// Number of calendar days covered, both ends inclusive.
    pub fn number_of_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub tour_id: i64,
    pub vehicle_type: Option<String>,
    pub status: VehicleStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub vehicle_id: i64,
    pub seat_number: i32,
    pub status: SeatStatus,
}

/// The traveller a booking is made for. `user_id` is the agent who created it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub client_id: i64,
    pub seat_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub payment_receipt: Option<String>,
    pub reservation_due_date: Option<NaiveDate>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn has_receipt(&self) -> bool {
        self.payment_receipt
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
    }
}

/// Back-office account: either an admin or a travel agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

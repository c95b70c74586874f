use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tourdesk_core::dates::DateNormalization;
use tourdesk_core::identity::Actor;
use tourdesk_core::repository::{NewTour, Store, TourLayout};
use tourdesk_core::{CoreError, CoreResult};
use tourdesk_shared::{Seat, SeatStatus, Tour, TourStatus, Vehicle};
use tracing::info;

use crate::title::generate_title;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourRequest {
    pub highlights: Vec<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub language: String,
}

/// Seat occupancy for one tour, as shown on the tour details screen.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TourStats {
    pub total_vehicles: usize,
    pub total_seats: usize,
    pub reserved_seats: usize,
    pub booked_seats: usize,
    pub available_seats: usize,
}

impl TourStats {
    fn count(&mut self, seat: &Seat) {
        self.total_seats += 1;
        match seat.status {
            SeatStatus::Available => self.available_seats += 1,
            SeatStatus::Reserved => self.reserved_seats += 1,
            SeatStatus::Booked => self.booked_seats += 1,
        }
    }
}

/// Admin-side management of tours and their vehicles.
pub struct TourAdmin {
    store: Arc<dyn Store>,
    dates: DateNormalization,
    seats_per_vehicle: u32,
}

impl TourAdmin {
    pub fn new(store: Arc<dyn Store>, dates: DateNormalization, seats_per_vehicle: u32) -> Self {
        Self {
            store,
            dates,
            seats_per_vehicle,
        }
    }

    pub async fn create_tour(&self, actor: &Actor, req: CreateTourRequest) -> CoreResult<TourLayout> {
        actor.require_admin()?;

        let ids: BTreeSet<i64> = req.highlights.iter().copied().collect();
        if ids.is_empty() {
            return Err(CoreError::ValidationError(
                "highlights: at least one highlight is required".to_string(),
            ));
        }
        if req.language.trim().is_empty() {
            return Err(CoreError::ValidationError("language is required".to_string()));
        }

        let start_date = self.dates.normalize(req.start_date);
        let end_date = self.dates.normalize(req.end_date);
        if start_date > end_date {
            return Err(CoreError::ValidationError(
                "endDate: the end date must be after the start date".to_string(),
            ));
        }

        let ids: Vec<i64> = ids.into_iter().collect();
        let highlights = self.store.find_highlights(&ids).await?;
        if highlights.len() != ids.len() {
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !highlights.iter().any(|h| h.id == **id))
                .map(i64::to_string)
                .collect();
            return Err(CoreError::ValidationError(format!(
                "highlights: unknown highlight ids {}",
                missing.join(", ")
            )));
        }

        let layout = self
            .store
            .create_tour(&NewTour {
                user_id: actor.user_id,
                title: generate_title(&highlights, start_date),
                start_date,
                end_date,
                language: req.language,
                highlight_ids: ids,
                seats_per_vehicle: self.seats_per_vehicle,
            })
            .await?;

        info!(
            tour_id = layout.tour.id,
            title = %layout.tour.title,
            seats = layout.seats.len(),
            "Tour created"
        );
        Ok(layout)
    }

    pub async fn add_vehicle(&self, actor: &Actor, tour_id: i64) -> CoreResult<(Vehicle, Vec<Seat>)> {
        actor.require_admin()?;
        let (vehicle, seats) = self
            .store
            .add_vehicle(tour_id, self.seats_per_vehicle)
            .await?;
        info!(tour_id, vehicle_id = vehicle.id, "Vehicle added");
        Ok((vehicle, seats))
    }

    /// Removes a vehicle and its seats; refused while any seat is reserved or booked.
    pub async fn delete_vehicle(&self, actor: &Actor, vehicle_id: i64) -> CoreResult<()> {
        actor.require_admin()?;
        self.store.delete_vehicle(vehicle_id).await?;
        info!(vehicle_id, "Vehicle deleted");
        Ok(())
    }

    /// Admins see every tour; agents only the active ones.
    pub async fn list_tours(&self, actor: &Actor) -> CoreResult<Vec<Tour>> {
        actor.require_active()?;
        let filter = if actor.is_admin() {
            None
        } else {
            Some(TourStatus::Active)
        };
        self.store.list_tours(filter).await
    }

    pub async fn tour_stats(&self, tour_id: i64) -> CoreResult<TourStats> {
        self.store
            .get_tour(tour_id)
            .await?
            .ok_or_else(|| CoreError::not_found("tour", tour_id))?;

        let vehicles = self.store.list_vehicles(tour_id).await?;
        let mut stats = TourStats {
            total_vehicles: vehicles.len(),
            ..TourStats::default()
        };
        for vehicle in &vehicles {
            for seat in self.store.list_seats(vehicle.id).await? {
                stats.count(&seat);
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tourdesk_core::memory::InMemoryStore;
    use tourdesk_core::repository::{BookingRepository, NewClient, NewReservation};
    use tourdesk_core::ErrorKind;
    use tourdesk_shared::UserRole;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    async fn setup(offset: i64) -> (Arc<InMemoryStore>, TourAdmin, Actor, Vec<i64>) {
        let store = Arc::new(InMemoryStore::new());
        let admin = store.insert_user("Ada", "ada@example.com", UserRole::Admin).await;
        let tz = store.insert_highlight("Tanzania").await;
        let ke = store.insert_highlight("Kenya").await;
        let service = TourAdmin::new(store.clone(), DateNormalization::new(offset), 6);
        (store, service, Actor::from(&admin), vec![tz.id, ke.id])
    }

    fn request(highlights: Vec<i64>, start: NaiveDate, end: NaiveDate) -> CreateTourRequest {
        CreateTourRequest {
            highlights,
            start_date: start,
            end_date: end,
            language: "ENGLISH".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_tour_builds_vehicle_and_six_seats() {
        let (store, service, admin, highlights) = setup(0).await;
        let layout = service
            .create_tour(&admin, request(highlights.clone(), day(1, 18), day(1, 25)))
            .await
            .unwrap();

        assert_eq!(layout.tour.title, "118 TKH");
        assert_eq!(layout.tour.status, TourStatus::Active);
        assert_eq!(layout.seats.len(), 6);
        assert_eq!(store.highlight_links(layout.tour.id).await, highlights);
    }

    #[tokio::test]
    async fn test_date_offset_applies_to_stored_dates_and_title() {
        let (_, service, admin, highlights) = setup(1).await;
        let layout = service
            .create_tour(&admin, request(highlights, day(1, 17), day(1, 24)))
            .await
            .unwrap();
        assert_eq!(layout.tour.start_date, day(1, 18));
        assert_eq!(layout.tour.title, "118 TKH");
    }

    #[tokio::test]
    async fn test_create_tour_rejects_bad_input() {
        let (_, service, admin, highlights) = setup(0).await;

        let err = service
            .create_tour(&admin, request(highlights.clone(), day(2, 10), day(2, 1)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("endDate"));

        let err = service
            .create_tour(&admin, request(vec![], day(2, 1), day(2, 10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = service
            .create_tour(&admin, request(vec![highlights[0], 999], day(2, 1), day(2, 10)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("999"));

        let err = service
            .create_tour(&Actor::agent(50), request(highlights, day(2, 1), day(2, 10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_stats_and_vehicle_deletion_follow_seat_occupancy() {
        let (store, service, admin, highlights) = setup(0).await;
        let layout = service
            .create_tour(&admin, request(highlights, day(3, 1), day(3, 8)))
            .await
            .unwrap();
        let (spare, _) = service.add_vehicle(&admin, layout.tour.id).await.unwrap();

        store
            .reserve_seat(
                &NewReservation {
                    client: NewClient {
                        user_id: 9,
                        name: "John Doe".to_string(),
                        email: None,
                        phone: None,
                        gender: None,
                        date_of_birth: None,
                        nationality: "KE".to_string(),
                        language: "ENGLISH".to_string(),
                    },
                    seat_id: layout.seats[0].id,
                    start_date: day(3, 1),
                    end_date: day(3, 8),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let stats = service.tour_stats(layout.tour.id).await.unwrap();
        assert_eq!(
            stats,
            TourStats {
                total_vehicles: 2,
                total_seats: 12,
                reserved_seats: 1,
                booked_seats: 0,
                available_seats: 11,
            }
        );

        let err = service
            .delete_vehicle(&admin, layout.vehicle.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);

        service.delete_vehicle(&admin, spare.id).await.unwrap();
        assert_eq!(service.tour_stats(layout.tour.id).await.unwrap().total_seats, 6);
    }

    #[tokio::test]
    async fn test_agents_only_see_active_tours() {
        let (_, service, admin, highlights) = setup(0).await;
        service
            .create_tour(&admin, request(highlights, day(4, 1), day(4, 3)))
            .await
            .unwrap();
        assert_eq!(service.list_tours(&Actor::agent(77)).await.unwrap().len(), 1);
        assert_eq!(service.list_tours(&admin).await.unwrap().len(), 1);
    }
}

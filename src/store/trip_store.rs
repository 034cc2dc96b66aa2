//! Trip State Store
//!
//! Single authoritative in-memory holder of the active trip. Every
//! mutation is synchronous and best-effort: out-of-range indices, missing
//! ids, or an absent trip leave the state unchanged instead of erroring,
//! so a botched edit can never take the UI down with it.
//!
//! Itinerary edits snapshot into an arena of `Arc`-shared versions with a
//! cursor; undo/redo just moves the cursor, and a new edit truncates the
//! redo tail before appending (linear undo model).

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use log::debug;
use uuid::Uuid;

use crate::models::bookings::{
    BusBooking, CabBooking, CabDirection, CarRental, FlightBooking, HotelBooking, TrainBooking,
};
use crate::models::itinerary::{GeneratedItinerary, ItineraryItem};
use crate::models::trip::{Expense, Participant, Trip, TripDetailsUpdate, TripSource};

const DEFAULT_TRIP_LENGTH_DAYS: i64 = 7;
const ANONYMOUS_USER_ID: &str = "anonymous";

type Snapshot = Option<Arc<GeneratedItinerary>>;

#[derive(Default)]
pub struct TripStore {
    current: Option<Trip>,
    history: Vec<Snapshot>,
    cursor: usize,
}

impl TripStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_trip(&self) -> Option<&Trip> {
        self.current.as_ref()
    }

    /// Replace the trip wholesale and reset the itinerary history to a
    /// single snapshot of the new trip's itinerary.
    pub fn set_current_trip(&mut self, trip: Option<Trip>) {
        match trip {
            Some(trip) => {
                self.history = vec![trip.itinerary.clone().map(Arc::new)];
                self.cursor = 0;
                self.current = Some(trip);
            }
            None => {
                self.current = None;
                self.history.clear();
                self.cursor = 0;
            }
        }
    }

    /// Merge partial trip fields, normalizing the date range.
    ///
    /// Starts a fresh trip object when none exists yet or when the update
    /// itself carries a standalone source; standalone bookings are
    /// independent of any accumulated full-trip state. An update that
    /// omits the source always merges into the current trip.
    pub fn update_trip_details(&mut self, update: TripDetailsUpdate) {
        let source = update
            .source
            .or_else(|| self.current.as_ref().map(|t| t.source))
            .unwrap_or(TripSource::Form);

        if self.current.is_none() || update.source.is_some_and(|s| s.is_standalone()) {
            let mut trip = Trip::new(source);
            trip.user_id = update.user_id.clone();
            self.history = vec![None];
            self.cursor = 0;
            self.current = Some(trip);
        }

        let today = Utc::now().date_naive();
        let trip = self.current.as_mut().unwrap();
        trip.source = source;

        if let Some(user_id) = &update.user_id {
            trip.user_id = Some(user_id.clone());
        }
        if let Some(origin) = update.origin {
            trip.origin = Some(origin);
        }
        if let Some(destinations) = update.destinations {
            trip.destinations = destinations;
        }
        if let Some(travelers) = update.travelers {
            trip.travelers = travelers;
        }
        if let Some(tier) = update.tier {
            trip.tier = tier;
        }
        if let Some(notes) = update.notes {
            trip.notes = Some(notes);
        }

        // Date normalization: the start never precedes today and the end
        // never precedes the start.
        let supplied_start = update
            .start_date
            .as_deref()
            .and_then(parse_iso_date)
            .or_else(|| trip.date_span().map(|(s, _)| s));
        let supplied_end = update
            .end_date
            .as_deref()
            .and_then(parse_iso_date)
            .or_else(|| trip.date_span().and_then(|(_, e)| e));

        trip.date_range = Some(match supplied_start {
            None => {
                if source.is_standalone() {
                    format_single(today)
                } else {
                    format_range(today, today + Duration::days(DEFAULT_TRIP_LENGTH_DAYS))
                }
            }
            Some(start) => {
                let start = start.max(today);
                match supplied_end {
                    end if source.is_standalone() && (end.is_none() || end == Some(start)) => {
                        format_single(start)
                    }
                    Some(end) if end >= start => format_range(start, end),
                    _ => format_range(start, start + Duration::days(DEFAULT_TRIP_LENGTH_DAYS)),
                }
            }
        });

        self.ensure_current_user_participant(update.user_id, update.user_name);
    }

    fn ensure_current_user_participant(&mut self, user_id: Option<String>, name: Option<String>) {
        let trip = match self.current.as_mut() {
            Some(trip) => trip,
            None => return,
        };
        if trip.participants.iter().any(|p| p.is_current_user) {
            return;
        }
        trip.participants.insert(
            0,
            Participant {
                id: user_id
                    .or_else(|| trip.user_id.clone())
                    .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string()),
                name: name.unwrap_or_else(|| "You".to_string()),
                is_current_user: true,
            },
        );
    }

    // ---- itinerary history ----

    /// Wholesale itinerary replace; history resets to this one snapshot.
    pub fn set_itinerary(&mut self, itinerary: GeneratedItinerary) {
        if self.current.is_none() {
            self.current = Some(Trip::new(TripSource::Form));
        }
        let trip = self.current.as_mut().unwrap();
        trip.itinerary = Some(itinerary.clone());
        self.history = vec![Some(Arc::new(itinerary))];
        self.cursor = 0;
    }

    /// Apply one itinerary edit: deep-clone the current version, mutate
    /// the clone, and commit it as a new snapshot. The edit closure
    /// returns false to signal an invalid operation, which leaves both
    /// the trip and the history untouched.
    fn edit_itinerary(&mut self, edit: impl FnOnce(&mut GeneratedItinerary) -> bool) {
        let trip = match self.current.as_mut() {
            Some(trip) => trip,
            None => return,
        };
        let mut next = match &trip.itinerary {
            Some(itinerary) => itinerary.clone(),
            None => return,
        };
        if !edit(&mut next) {
            debug!("itinerary edit rejected, state unchanged");
            return;
        }
        trip.itinerary = Some(next.clone());
        self.history.truncate(self.cursor + 1);
        self.history.push(Some(Arc::new(next)));
        self.cursor = self.history.len() - 1;
    }

    pub fn add_itinerary_event(&mut self, day_index: usize, event: ItineraryItem) {
        self.edit_itinerary(|itinerary| {
            match itinerary.daily_breakdown.get_mut(day_index) {
                Some(day) => {
                    day.events.push(event);
                    true
                }
                None => false,
            }
        });
    }

    /// Replace the event with a matching id in the given day.
    pub fn update_itinerary_event(&mut self, day_index: usize, event: ItineraryItem) {
        self.edit_itinerary(|itinerary| {
            let day = match itinerary.daily_breakdown.get_mut(day_index) {
                Some(day) => day,
                None => return false,
            };
            match day.events.iter_mut().find(|e| e.id == event.id) {
                Some(existing) => {
                    *existing = event;
                    true
                }
                None => false,
            }
        });
    }

    pub fn delete_itinerary_event(&mut self, day_index: usize, event_id: &str) {
        self.edit_itinerary(|itinerary| {
            let day = match itinerary.daily_breakdown.get_mut(day_index) {
                Some(day) => day,
                None => return false,
            };
            let before = day.events.len();
            day.events.retain(|e| e.id != event_id);
            day.events.len() != before
        });
    }

    /// Move the event at `from` to position `to` within one day, then
    /// clear travel times on all but the new last event, which gets an
    /// explicit "N/A".
    pub fn reorder_itinerary_events(&mut self, day_index: usize, from: usize, to: usize) {
        self.edit_itinerary(|itinerary| {
            let day = match itinerary.daily_breakdown.get_mut(day_index) {
                Some(day) => day,
                None => return false,
            };
            if from >= day.events.len() || to >= day.events.len() {
                return false;
            }
            let event = day.events.remove(from);
            day.events.insert(to, event);
            let last = day.events.len().saturating_sub(1);
            for (i, event) in day.events.iter_mut().enumerate() {
                event.travel_time_to_next = if i == last {
                    Some("N/A".to_string())
                } else {
                    None
                };
            }
            true
        });
    }

    pub fn can_undo_itinerary(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo_itinerary(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Step the history cursor back one snapshot; no-op at the boundary.
    pub fn undo_itinerary_change(&mut self) {
        if !self.can_undo_itinerary() {
            return;
        }
        self.cursor -= 1;
        self.restore_snapshot();
    }

    /// Step the history cursor forward one snapshot; no-op at the boundary.
    pub fn redo_itinerary_change(&mut self) {
        if !self.can_redo_itinerary() {
            return;
        }
        self.cursor += 1;
        self.restore_snapshot();
    }

    fn restore_snapshot(&mut self) {
        if let Some(trip) = self.current.as_mut() {
            trip.itinerary = self.history[self.cursor]
                .as_ref()
                .map(|snapshot| (**snapshot).clone());
        }
    }

    // ---- bookings ----

    fn ensure_trip(&mut self) -> &mut Trip {
        if self.current.is_none() {
            self.current = Some(Trip::new(TripSource::Form));
            self.history = vec![None];
            self.cursor = 0;
        }
        self.current.as_mut().unwrap()
    }

    /// Add a flight option; an existing option for the same leg is
    /// replaced rather than accumulated.
    pub fn add_flight_booking(&mut self, flight: FlightBooking) {
        let trip = self.ensure_trip();
        trip.flights.retain(|f| f.leg_id != flight.leg_id);
        trip.flights.push(flight);
    }

    pub fn update_flight_booking(&mut self, flight: FlightBooking) {
        if let Some(trip) = self.current.as_mut() {
            if let Some(existing) = trip.flights.iter_mut().find(|f| f.id == flight.id) {
                *existing = flight;
            }
        }
    }

    /// Add a hotel option; one hotel per destination city.
    pub fn add_hotel_booking(&mut self, hotel: HotelBooking) {
        let trip = self.ensure_trip();
        trip.hotels
            .retain(|h| h.destination_city != hotel.destination_city);
        trip.hotels.push(hotel);
    }

    pub fn update_hotel_booking(&mut self, hotel: HotelBooking) {
        if let Some(trip) = self.current.as_mut() {
            if let Some(existing) = trip.hotels.iter_mut().find(|h| h.id == hotel.id) {
                *existing = hotel;
            }
        }
    }

    pub fn add_train_booking(&mut self, train: TrainBooking) {
        self.ensure_trip().trains.push(train);
    }

    pub fn update_train_booking(&mut self, train: TrainBooking) {
        if let Some(trip) = self.current.as_mut() {
            if let Some(existing) = trip.trains.iter_mut().find(|t| t.id == train.id) {
                *existing = train;
            }
        }
    }

    pub fn add_bus_booking(&mut self, bus: BusBooking) {
        self.ensure_trip().buses.push(bus);
    }

    pub fn update_bus_booking(&mut self, bus: BusBooking) {
        if let Some(trip) = self.current.as_mut() {
            if let Some(existing) = trip.buses.iter_mut().find(|b| b.id == bus.id) {
                *existing = bus;
            }
        }
    }

    /// The car rental is a singleton; adding replaces any previous one.
    pub fn add_car_rental(&mut self, car: CarRental) {
        self.ensure_trip().car_rental = Some(car);
    }

    pub fn update_car_rental(&mut self, car: CarRental) {
        if let Some(trip) = self.current.as_mut() {
            match &trip.car_rental {
                Some(existing) if existing.id == car.id => trip.car_rental = Some(car),
                _ => {}
            }
        }
    }

    /// One cab per direction; adding replaces the slot for that direction.
    pub fn add_cab_booking(&mut self, cab: CabBooking) {
        let trip = self.ensure_trip();
        match cab.direction {
            CabDirection::Departure => trip.departure_cab = Some(cab),
            CabDirection::Arrival => trip.arrival_cab = Some(cab),
        }
    }

    pub fn update_cab_booking(&mut self, cab: CabBooking) {
        if let Some(trip) = self.current.as_mut() {
            let slot = match cab.direction {
                CabDirection::Departure => &mut trip.departure_cab,
                CabDirection::Arrival => &mut trip.arrival_cab,
            };
            match slot {
                Some(existing) if existing.id == cab.id => *slot = Some(cab),
                _ => {}
            }
        }
    }

    // ---- budget and expenses ----

    pub fn set_budget(&mut self, budget: f64) {
        self.ensure_trip().budget = Some(budget);
    }

    /// Record an expense. The payer defaults to the current participant
    /// and the split to all participants; the list stays sorted by date,
    /// newest first.
    pub fn add_expense(
        &mut self,
        description: String,
        amount: f64,
        date: String,
        paid_by: Option<String>,
        split_with: Option<Vec<String>>,
    ) {
        let trip = self.ensure_trip();
        let current_user = trip
            .participants
            .iter()
            .find(|p| p.is_current_user)
            .map(|p| p.id.clone())
            .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());
        let split = split_with.filter(|s| !s.is_empty()).unwrap_or_else(|| {
            if trip.participants.is_empty() {
                vec![current_user.clone()]
            } else {
                trip.participants.iter().map(|p| p.id.clone()).collect()
            }
        });
        trip.expenses.push(Expense {
            id: Uuid::new_v4().to_string(),
            description,
            amount,
            date,
            paid_by: paid_by.unwrap_or(current_user),
            split_with: split,
        });
        trip.expenses.sort_by(|a, b| b.date.cmp(&a.date));
    }

    pub fn update_expense(&mut self, expense: Expense) {
        if let Some(trip) = self.current.as_mut() {
            if let Some(existing) = trip.expenses.iter_mut().find(|e| e.id == expense.id) {
                *existing = expense;
                trip.expenses.sort_by(|a, b| b.date.cmp(&a.date));
            }
        }
    }

    pub fn delete_expense(&mut self, expense_id: &str) {
        if let Some(trip) = self.current.as_mut() {
            trip.expenses.retain(|e| e.id != expense_id);
        }
    }

    // ---- participants ----

    pub fn add_participant(&mut self, name: String) {
        self.ensure_trip().participants.push(Participant {
            id: Uuid::new_v4().to_string(),
            name,
            is_current_user: false,
        });
    }

    /// Remove a participant. Refuses to remove the current user. Expenses
    /// paid by the removed participant are reassigned to the current
    /// user; expenses whose split would become empty are dropped.
    pub fn remove_participant(&mut self, participant_id: &str) {
        let trip = match self.current.as_mut() {
            Some(trip) => trip,
            None => return,
        };
        let Some(removed) = trip.participants.iter().find(|p| p.id == participant_id) else {
            return;
        };
        if removed.is_current_user {
            debug!("refusing to remove the current-user participant");
            return;
        }
        trip.participants.retain(|p| p.id != participant_id);

        let current_user = trip
            .participants
            .iter()
            .find(|p| p.is_current_user)
            .map(|p| p.id.clone())
            .unwrap_or_else(|| ANONYMOUS_USER_ID.to_string());
        for expense in trip.expenses.iter_mut() {
            if expense.paid_by == participant_id {
                expense.paid_by = current_user.clone();
            }
            expense.split_with.retain(|id| id != participant_id);
        }
        trip.expenses.retain(|e| !e.split_with.is_empty());
    }
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn format_single(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn format_range(start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{} to {}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::itinerary::{DailyItinerary, EventSource};

    fn seeded_store() -> TripStore {
        let mut store = TripStore::new();
        store.update_trip_details(TripDetailsUpdate {
            source: Some(TripSource::Form),
            user_id: Some("user-1".to_string()),
            user_name: Some("Ada".to_string()),
            destinations: Some(vec!["Paris".to_string()]),
            ..Default::default()
        });
        store
    }

    fn event(id: &str) -> ItineraryItem {
        ItineraryItem::new(id.to_string(), format!("Activity {}", id), EventSource::User)
    }

    fn one_day_itinerary(ids: &[&str]) -> GeneratedItinerary {
        GeneratedItinerary {
            title: "Test".to_string(),
            destinations: vec!["Paris".to_string()],
            duration: "1 Day".to_string(),
            daily_breakdown: vec![DailyItinerary {
                day: "Day 1".to_string(),
                date: None,
                events: ids.iter().map(|id| event(id)).collect(),
            }],
            estimated_total_cost: None,
        }
    }

    #[test]
    fn update_creates_trip_and_current_user_participant() {
        let store = seeded_store();
        let trip = store.current_trip().unwrap();
        assert_eq!(trip.participants.len(), 1);
        assert!(trip.participants[0].is_current_user);
        assert_eq!(trip.participants[0].id, "user-1");
        assert_eq!(trip.participants[0].name, "Ada");
    }

    #[test]
    fn missing_dates_default_to_week_long_range() {
        let store = seeded_store();
        let (start, end) = store.current_trip().unwrap().date_span().unwrap();
        let today = Utc::now().date_naive();
        assert_eq!(start, today);
        assert_eq!(end, Some(today + Duration::days(7)));
    }

    #[test]
    fn standalone_update_starts_fresh_trip_with_single_day() {
        let mut store = seeded_store();
        let first_id = store.current_trip().unwrap().id;
        store.update_trip_details(TripDetailsUpdate {
            source: Some(TripSource::StandaloneFlight),
            ..Default::default()
        });
        let trip = store.current_trip().unwrap();
        assert_ne!(trip.id, first_id);
        let (start, end) = trip.date_span().unwrap();
        assert_eq!(start, Utc::now().date_naive());
        assert!(end.is_none());
    }

    #[test]
    fn invalid_edit_leaves_history_untouched() {
        let mut store = seeded_store();
        store.set_itinerary(one_day_itinerary(&["a", "b"]));
        store.add_itinerary_event(5, event("x"));
        store.update_itinerary_event(0, event("missing"));
        store.reorder_itinerary_events(0, 0, 9);
        assert!(!store.can_undo_itinerary());
        let day = &store.current_trip().unwrap().itinerary.as_ref().unwrap().daily_breakdown[0];
        assert_eq!(day.events.len(), 2);
    }

    #[test]
    fn new_edit_truncates_redo_tail() {
        let mut store = seeded_store();
        store.set_itinerary(one_day_itinerary(&["a"]));
        store.add_itinerary_event(0, event("b"));
        store.add_itinerary_event(0, event("c"));
        store.undo_itinerary_change();
        assert!(store.can_redo_itinerary());
        store.add_itinerary_event(0, event("d"));
        assert!(!store.can_redo_itinerary());
        let ids: Vec<_> = store.current_trip().unwrap().itinerary.as_ref().unwrap().daily_breakdown
            [0]
        .events
        .iter()
        .map(|e| e.id.as_str())
        .collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn undo_past_boundary_is_noop() {
        let mut store = seeded_store();
        store.set_itinerary(one_day_itinerary(&["a"]));
        store.undo_itinerary_change();
        store.undo_itinerary_change();
        assert!(store.current_trip().unwrap().itinerary.is_some());
    }

    #[test]
    fn expense_defaults_and_sorting() {
        let mut store = seeded_store();
        store.add_participant("Grace".to_string());
        store.add_expense("Museum".to_string(), 40.0, "2024-05-02".to_string(), None, None);
        store.add_expense("Dinner".to_string(), 80.0, "2024-05-03".to_string(), None, None);
        let trip = store.current_trip().unwrap();
        assert_eq!(trip.expenses[0].description, "Dinner");
        assert_eq!(trip.expenses[1].paid_by, "user-1");
        assert_eq!(trip.expenses[1].split_with.len(), 2);
    }

    #[test]
    fn removing_participant_reassigns_and_drops_expenses() {
        let mut store = seeded_store();
        store.add_participant("Grace".to_string());
        let grace_id = store
            .current_trip()
            .unwrap()
            .participants
            .iter()
            .find(|p| !p.is_current_user)
            .unwrap()
            .id
            .clone();
        store.add_expense(
            "Taxi".to_string(),
            25.0,
            "2024-05-01".to_string(),
            Some(grace_id.clone()),
            Some(vec![grace_id.clone(), "user-1".to_string()]),
        );
        store.add_expense(
            "Solo snack".to_string(),
            5.0,
            "2024-05-01".to_string(),
            Some("user-1".to_string()),
            Some(vec![grace_id.clone()]),
        );
        store.remove_participant(&grace_id);
        let trip = store.current_trip().unwrap();
        assert_eq!(trip.expenses.len(), 1);
        assert_eq!(trip.expenses[0].description, "Taxi");
        assert_eq!(trip.expenses[0].paid_by, "user-1");
        assert_eq!(trip.expenses[0].split_with, vec!["user-1".to_string()]);
    }

    #[test]
    fn cab_bookings_fill_direction_slots() {
        let mut store = seeded_store();
        let cab = CabBooking {
            id: "cab-1".to_string(),
            provider: "CityCab".to_string(),
            direction: CabDirection::Departure,
            pickup: "Home".to_string(),
            dropoff: "Airport".to_string(),
            pickup_time: "06:00".to_string(),
            price: 30.0,
            booked: true,
            payment_completed: false,
            booking_source: crate::models::bookings::BookingSource::SystemBooked,
        };
        store.add_cab_booking(cab.clone());
        let mut arrival = cab.clone();
        arrival.id = "cab-2".to_string();
        arrival.direction = CabDirection::Arrival;
        store.add_cab_booking(arrival);
        let trip = store.current_trip().unwrap();
        assert_eq!(trip.departure_cab.as_ref().unwrap().id, "cab-1");
        assert_eq!(trip.arrival_cab.as_ref().unwrap().id, "cab-2");
    }
}

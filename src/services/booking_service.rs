//! Mock booking search services
//!
//! Pure request/response collaborators simulating a booking network:
//! a fixed latency, randomly priced option lists, everything returned
//! unbooked with `system_booked` provenance. Prices scale with the
//! trip's travel tier.

use rand::Rng;
use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::models::bookings::{
    BookingSource, BusBooking, CabBooking, CabDirection, CarRental, FlightBooking, HotelBooking,
    TrainBooking,
};
use crate::models::trip::TravelTier;

const SEARCH_LATENCY_MS: u64 = 450;
const OPTIONS_PER_SEARCH: usize = 4;

const AIRLINES: [&str; 4] = ["Aerly", "Skyhop", "Transora", "Cloudline"];
const HOTEL_BRANDS: [&str; 4] = ["The Meridian", "Casa Verde", "Hotel Lumen", "The Atrium"];
const CAR_COMPANIES: [&str; 3] = ["RoadRunner Rentals", "Velora Cars", "DriveNow"];
const TRAIN_OPERATORS: [&str; 3] = ["InterCity Rail", "Velocita", "Northline"];
const BUS_OPERATORS: [&str; 3] = ["GreenCoach", "MetroBus Express", "Translink"];
const CAB_PROVIDERS: [&str; 3] = ["CityCab", "SwiftRide", "Hailo Go"];

#[derive(Debug, Clone)]
pub struct SearchCriteria {
    pub from_city: String,
    pub to_city: String,
    pub date: String,
    pub travelers: u32,
    pub tier: TravelTier,
}

fn priced(base_low: f64, base_high: f64, tier: TravelTier) -> f64 {
    let base = rand::thread_rng().gen_range(base_low..base_high);
    (base * tier.price_multiplier()).round()
}

fn depart_time(slot: usize) -> String {
    format!("{:02}:{:02}", (6 + slot * 4) % 24, (15 * slot) % 60)
}

/// Search flight options for one leg. The leg id is the natural key the
/// trip store dedups on.
pub async fn search_flights(criteria: &SearchCriteria) -> Vec<FlightBooking> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    let leg_id = format!("{}-{}-{}", criteria.from_city, criteria.to_city, criteria.date);
    (0..OPTIONS_PER_SEARCH)
        .map(|slot| FlightBooking {
            id: Uuid::new_v4().to_string(),
            leg_id: leg_id.clone(),
            airline: AIRLINES[slot % AIRLINES.len()].to_string(),
            flight_number: format!("{}{}", &AIRLINES[slot % AIRLINES.len()][..2].to_uppercase(), 100 + slot * 37),
            from_city: criteria.from_city.clone(),
            to_city: criteria.to_city.clone(),
            departure_time: depart_time(slot),
            arrival_time: depart_time(slot + 1),
            price: priced(120.0, 340.0, criteria.tier),
            booked: false,
            payment_completed: false,
            booking_source: BookingSource::SystemBooked,
        })
        .collect()
}

pub async fn search_hotels(criteria: &SearchCriteria, nights: u32) -> Vec<HotelBooking> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    (0..OPTIONS_PER_SEARCH)
        .map(|slot| {
            let per_night = priced(60.0, 220.0, criteria.tier);
            HotelBooking {
                id: Uuid::new_v4().to_string(),
                name: HOTEL_BRANDS[slot % HOTEL_BRANDS.len()].to_string(),
                destination_city: criteria.to_city.clone(),
                check_in: criteria.date.clone(),
                check_out: criteria.date.clone(),
                nights: nights.max(1),
                price_per_night: per_night,
                price: per_night * nights.max(1) as f64,
                rating: 3.5 + (slot as f32) * 0.4,
                booked: false,
                payment_completed: false,
                booking_source: BookingSource::SystemBooked,
            }
        })
        .collect()
}

pub async fn search_cars(criteria: &SearchCriteria, days: u32) -> Vec<CarRental> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    (0..OPTIONS_PER_SEARCH.min(CAR_COMPANIES.len()))
        .map(|slot| {
            let per_day = priced(35.0, 110.0, criteria.tier);
            CarRental {
                id: Uuid::new_v4().to_string(),
                company: CAR_COMPANIES[slot].to_string(),
                vehicle: ["Compact", "Sedan", "SUV"][slot % 3].to_string(),
                pickup_city: criteria.to_city.clone(),
                pickup_date: criteria.date.clone(),
                dropoff_date: criteria.date.clone(),
                price_per_day: per_day,
                price: per_day * days.max(1) as f64,
                booked: false,
                payment_completed: false,
                booking_source: BookingSource::SystemBooked,
            }
        })
        .collect()
}

pub async fn search_trains(criteria: &SearchCriteria) -> Vec<TrainBooking> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    (0..OPTIONS_PER_SEARCH)
        .map(|slot| TrainBooking {
            id: Uuid::new_v4().to_string(),
            operator: TRAIN_OPERATORS[slot % TRAIN_OPERATORS.len()].to_string(),
            train_number: format!("T{}", 400 + slot * 21),
            from_city: criteria.from_city.clone(),
            to_city: criteria.to_city.clone(),
            departure_time: depart_time(slot),
            arrival_time: depart_time(slot + 1),
            class: if slot == 0 { "First" } else { "Standard" }.to_string(),
            price: priced(25.0, 95.0, criteria.tier),
            booked: false,
            payment_completed: false,
            booking_source: BookingSource::SystemBooked,
        })
        .collect()
}

pub async fn search_buses(criteria: &SearchCriteria) -> Vec<BusBooking> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    (0..OPTIONS_PER_SEARCH)
        .map(|slot| BusBooking {
            id: Uuid::new_v4().to_string(),
            operator: BUS_OPERATORS[slot % BUS_OPERATORS.len()].to_string(),
            from_city: criteria.from_city.clone(),
            to_city: criteria.to_city.clone(),
            departure_time: depart_time(slot),
            arrival_time: depart_time(slot + 1),
            price: priced(12.0, 45.0, criteria.tier),
            booked: false,
            payment_completed: false,
            booking_source: BookingSource::SystemBooked,
        })
        .collect()
}

pub async fn search_cabs(criteria: &SearchCriteria, direction: CabDirection) -> Vec<CabBooking> {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    let (pickup, dropoff) = match direction {
        CabDirection::Departure => (criteria.from_city.clone(), format!("{} Airport", criteria.from_city)),
        CabDirection::Arrival => (format!("{} Airport", criteria.to_city), criteria.to_city.clone()),
    };
    (0..OPTIONS_PER_SEARCH.min(CAB_PROVIDERS.len()))
        .map(|slot| CabBooking {
            id: Uuid::new_v4().to_string(),
            provider: CAB_PROVIDERS[slot].to_string(),
            direction,
            pickup: pickup.clone(),
            dropoff: dropoff.clone(),
            pickup_time: depart_time(slot),
            price: priced(15.0, 55.0, criteria.tier),
            booked: false,
            payment_completed: false,
            booking_source: BookingSource::SystemBooked,
        })
        .collect()
}

/// Ground connections between two cities: trains and buses searched in
/// parallel.
pub async fn search_connections(
    criteria: &SearchCriteria,
) -> (Vec<TrainBooking>, Vec<BusBooking>) {
    futures::join!(search_trains(criteria), search_buses(criteria))
}

/// Mock live flight-status lookup.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FlightStatus {
    pub flight_number: String,
    pub status: String,
    pub gate: String,
    pub delay_minutes: u32,
}

pub async fn flight_status(flight_number: &str) -> FlightStatus {
    sleep(Duration::from_millis(SEARCH_LATENCY_MS)).await;
    // Derived from the flight number so repeated lookups agree.
    let seed: u32 = flight_number.bytes().map(u32::from).sum();
    let statuses = ["On Time", "Boarding", "Delayed"];
    FlightStatus {
        flight_number: flight_number.to_string(),
        status: statuses[seed as usize % statuses.len()].to_string(),
        gate: format!("{}{}", (b'A' + (seed % 4) as u8) as char, seed % 30 + 1),
        delay_minutes: if seed % 3 == 2 { seed % 45 } else { 0 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria(tier: TravelTier) -> SearchCriteria {
        SearchCriteria {
            from_city: "London".to_string(),
            to_city: "Paris".to_string(),
            date: "2024-06-01".to_string(),
            travelers: 2,
            tier,
        }
    }

    #[tokio::test]
    async fn flight_search_shares_a_leg_id_across_options() {
        let flights = search_flights(&criteria(TravelTier::ComfortSeeker)).await;
        assert_eq!(flights.len(), OPTIONS_PER_SEARCH);
        assert!(flights.iter().all(|f| f.leg_id == "London-Paris-2024-06-01"));
        assert!(flights.iter().all(|f| !f.booked && !f.payment_completed));
    }

    #[tokio::test]
    async fn luxury_tier_prices_above_budget_tier_range() {
        let budget = search_hotels(&criteria(TravelTier::BudgetExplorer), 2).await;
        let luxury = search_hotels(&criteria(TravelTier::LuxuryIndulgence), 2).await;
        let budget_max = 220.0 * TravelTier::BudgetExplorer.price_multiplier() + 1.0;
        let luxury_min = 60.0 * TravelTier::LuxuryIndulgence.price_multiplier() - 1.0;
        assert!(budget.iter().all(|h| h.price_per_night <= budget_max));
        assert!(luxury.iter().all(|h| h.price_per_night >= luxury_min));
    }

    #[tokio::test]
    async fn flight_status_is_stable_per_flight() {
        let a = flight_status("AE100").await;
        let b = flight_status("AE100").await;
        assert_eq!(a.status, b.status);
        assert_eq!(a.gate, b.gate);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    SystemBooked,
    AiSuggested,
    UserEntered,
}

/// Discriminates booking collections for payment settlement.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Flight,
    Hotel,
    Car,
    Train,
    Bus,
    Cab,
}

impl BookingKind {
    pub fn as_str(&self) -> &str {
        match self {
            BookingKind::Flight => "flight",
            BookingKind::Hotel => "hotel",
            BookingKind::Car => "car",
            BookingKind::Train => "train",
            BookingKind::Bus => "bus",
            BookingKind::Cab => "cab",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FlightBooking {
    pub id: String,
    /// Natural key for the leg this flight covers; selecting a new option
    /// for the same leg replaces the previous one.
    pub leg_id: String,
    pub airline: String,
    pub flight_number: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HotelBooking {
    pub id: String,
    pub name: String,
    /// Natural key; one hotel per destination city.
    pub destination_city: String,
    pub check_in: String,
    pub check_out: String,
    pub nights: u32,
    pub price_per_night: f64,
    pub price: f64,
    pub rating: f32,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CarRental {
    pub id: String,
    pub company: String,
    pub vehicle: String,
    pub pickup_city: String,
    pub pickup_date: String,
    pub dropoff_date: String,
    pub price_per_day: f64,
    pub price: f64,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrainBooking {
    pub id: String,
    pub operator: String,
    pub train_number: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub class: String,
    pub price: f64,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BusBooking {
    pub id: String,
    pub operator: String,
    pub from_city: String,
    pub to_city: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub price: f64,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CabDirection {
    /// Home to departure terminal at the start of the trip.
    Departure,
    /// Arrival terminal to lodging at the destination.
    Arrival,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CabBooking {
    pub id: String,
    pub provider: String,
    pub direction: CabDirection,
    pub pickup: String,
    pub dropoff: String,
    pub pickup_time: String,
    pub price: f64,
    pub booked: bool,
    pub payment_completed: bool,
    pub booking_source: BookingSource,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bookings::{
    BusBooking, CabBooking, CarRental, FlightBooking, HotelBooking, TrainBooking,
};
use super::itinerary::GeneratedItinerary;

/// Which flow created the trip. Standalone kinds start a fresh trip object
/// per booking flow rather than accumulating onto a prior one.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TripSource {
    Form,
    Chat,
    StandaloneFlight,
    StandaloneHotel,
    StandaloneCar,
    StandaloneTrain,
    StandaloneBus,
    StandaloneCab,
}

impl TripSource {
    pub fn is_standalone(&self) -> bool {
        !matches!(self, TripSource::Form | TripSource::Chat)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TravelTier {
    BudgetExplorer,
    ComfortSeeker,
    LuxuryIndulgence,
}

impl TravelTier {
    /// Multiplier applied to base mock prices for this tier.
    pub fn price_multiplier(&self) -> f64 {
        match self {
            TravelTier::BudgetExplorer => 0.7,
            TravelTier::ComfortSeeker => 1.0,
            TravelTier::LuxuryIndulgence => 2.2,
        }
    }

    /// Guidance phrase injected into the generation prompt.
    pub fn prompt_guidance(&self) -> &str {
        match self {
            TravelTier::BudgetExplorer => {
                "budget-friendly options, street food, free attractions, hostels"
            }
            TravelTier::ComfortSeeker => {
                "mid-range comfort, popular restaurants, well-rated 3-4 star stays"
            }
            TravelTier::LuxuryIndulgence => {
                "premium experiences, fine dining, 5-star hotels, private transfers"
            }
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub is_current_user: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    /// ISO date the expense occurred on.
    pub date: String,
    /// Participant id that paid.
    pub paid_by: String,
    /// Participant ids the expense is split across.
    pub split_with: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct UserPreferences {
    pub home_city: Option<String>,
    pub preferred_tier: Option<TravelTier>,
    pub currency: Option<String>,
}

/// Root aggregate for one planned journey.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Trip {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub source: TripSource,
    pub origin: Option<String>,
    pub destinations: Vec<String>,
    /// "YYYY-MM-DD to YYYY-MM-DD", or a single "YYYY-MM-DD" for one-day
    /// standalone bookings.
    pub date_range: Option<String>,
    pub travelers: u32,
    pub tier: TravelTier,
    pub itinerary: Option<GeneratedItinerary>,
    #[serde(default)]
    pub flights: Vec<FlightBooking>,
    #[serde(default)]
    pub hotels: Vec<HotelBooking>,
    #[serde(default)]
    pub trains: Vec<TrainBooking>,
    #[serde(default)]
    pub buses: Vec<BusBooking>,
    pub car_rental: Option<CarRental>,
    pub departure_cab: Option<CabBooking>,
    pub arrival_cab: Option<CabBooking>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    pub budget: Option<f64>,
    #[serde(default)]
    pub packing_list: Vec<String>,
    pub notes: Option<String>,
}

impl Trip {
    pub fn new(source: TripSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id: None,
            source,
            origin: None,
            destinations: Vec::new(),
            date_range: None,
            travelers: 1,
            tier: TravelTier::ComfortSeeker,
            itinerary: None,
            flights: Vec::new(),
            hotels: Vec::new(),
            trains: Vec::new(),
            buses: Vec::new(),
            car_rental: None,
            departure_cab: None,
            arrival_cab: None,
            participants: Vec::new(),
            expenses: Vec::new(),
            budget: None,
            packing_list: Vec::new(),
            notes: None,
        }
    }

    /// Parse the stored date range back into start and optional end date.
    pub fn date_span(&self) -> Option<(NaiveDate, Option<NaiveDate>)> {
        let range = self.date_range.as_deref()?;
        let mut parts = range.splitn(2, " to ");
        let start = NaiveDate::parse_from_str(parts.next()?.trim(), "%Y-%m-%d").ok()?;
        let end = parts
            .next()
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok());
        Some((start, end))
    }
}

/// Partial update applied by the trip store; `None` fields are left alone.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TripDetailsUpdate {
    pub source: Option<TripSource>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub origin: Option<String>,
    pub destinations: Option<Vec<String>>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travelers: Option<u32>,
    pub tier: Option<TravelTier>,
    pub notes: Option<String>,
}

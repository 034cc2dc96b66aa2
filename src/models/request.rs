use serde::{Deserialize, Serialize};

use super::trip::TravelTier;

/// Input collected by the trip-planning form, also used as the cache key
/// and the fallback for fields the model response leaves out.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ItineraryRequest {
    pub destinations: Vec<String>,
    pub origin: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travelers: u32,
    pub tier: TravelTier,
    pub occasion: Option<String>,
    pub trip_type: Option<String>,
}

impl ItineraryRequest {
    /// "N Days" computed from the form dates, else "Flexible".
    pub fn duration_label(&self) -> String {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => {
                match crate::services::itinerary_parser_service::inclusive_day_count(start, end) {
                    Some(1) => "1 Day".to_string(),
                    Some(n) => format!("{} Days", n),
                    None => "Flexible".to_string(),
                }
            }
            _ => "Flexible".to_string(),
        }
    }

    /// Number of days the plan should cover, defaulting to 3.
    pub fn day_count(&self) -> u32 {
        match (self.start_date.as_deref(), self.end_date.as_deref()) {
            (Some(start), Some(end)) => {
                crate::services::itinerary_parser_service::inclusive_day_count(start, end)
                    .map(|n| n as u32)
                    .unwrap_or(3)
            }
            _ => 3,
        }
    }
}

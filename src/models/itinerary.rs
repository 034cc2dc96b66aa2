use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Ai,
    User,
}

/// A single scheduled activity, meal, or travel leg within a day.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ItineraryItem {
    pub id: String,
    /// Display time for the event; "Flexible" when no time token was found.
    pub time: String,
    pub activity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time_to_next: Option<String>,
    pub source: EventSource,
    /// User ids that liked this event on a shared chat plan.
    #[serde(default)]
    pub likes: Vec<String>,
}

impl ItineraryItem {
    pub fn new(id: String, activity: String, source: EventSource) -> Self {
        Self {
            id,
            time: "Flexible".to_string(),
            activity,
            description: None,
            location: None,
            cost: None,
            image_url: None,
            travel_time_to_next: None,
            source,
            likes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DailyItinerary {
    /// Day label, e.g. "Day 2".
    pub day: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub events: Vec<ItineraryItem>,
}

/// The generated day-by-day travel plan for one trip.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GeneratedItinerary {
    pub title: String,
    pub destinations: Vec<String>,
    pub duration: String,
    pub daily_breakdown: Vec<DailyItinerary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_total_cost: Option<String>,
}

impl GeneratedItinerary {
    pub fn empty() -> Self {
        Self {
            title: String::new(),
            destinations: Vec::new(),
            duration: String::new(),
            daily_breakdown: Vec::new(),
            estimated_total_cost: None,
        }
    }
}

//! Generative-AI itinerary service
//!
//! Sends a natural-language prompt to the generative-language API and
//! parses the free-text response with the itinerary parsers. When
//! `GENAI_API_KEY` is not set the service transparently substitutes
//! deterministic mock text in the same line grammar, so everything
//! downstream is provider-agnostic.

use std::{env, time::Duration};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::itinerary::GeneratedItinerary;
use crate::models::request::ItineraryRequest;
use crate::services::chat_parser_service::ChatItineraryParser;
use crate::services::itinerary_parser_service::ItineraryParser;
use crate::storage::local_store::LocalStore;

const GENERATION_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

pub struct GenerationService {
    api_key: Option<String>,
    http_client: reqwest::Client,
    model: String,
}

impl GenerationService {
    /// Build the service, falling back to mock generation when no API
    /// key is configured.
    pub fn new() -> Self {
        let api_key = match env::var("GENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => {
                println!("GenerationService initialized with generative-language API");
                Some(key)
            }
            _ => {
                println!(
                    "GenerationService: GENAI_API_KEY not set. Using deterministic mock itineraries."
                );
                None
            }
        };

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key,
            http_client,
            model: env::var("GENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    /// Form-flow generation: cache lookup, prompt, parse, cache write.
    pub async fn generate_itinerary(
        &self,
        request: &ItineraryRequest,
        storage: Option<&LocalStore>,
    ) -> Result<GeneratedItinerary, Box<dyn std::error::Error>> {
        let cache_key = LocalStore::itinerary_cache_key(request);
        if let Some(store) = storage {
            if let Some(cached) = store.get_cached_itinerary(&cache_key) {
                return Ok(cached);
            }
        }

        let text = match &self.api_key {
            Some(_) => self.generate_text(&build_form_prompt(request)).await?,
            None => mock_itinerary_text(request),
        };
        let itinerary = ItineraryParser::parse_form_response(&text, request);

        if let Some(store) = storage {
            if let Err(e) = store.cache_itinerary(&cache_key, &itinerary) {
                warn!("failed to cache itinerary: {}", e);
            }
        }
        Ok(itinerary)
    }

    /// Chat-flow generation from an open-ended user message.
    pub async fn generate_chat_itinerary(
        &self,
        message: &str,
    ) -> Result<GeneratedItinerary, Box<dyn std::error::Error>> {
        let text = match &self.api_key {
            Some(_) => self.generate_text(&build_chat_prompt(message)).await?,
            None => mock_chat_text(message),
        };
        Ok(ChatItineraryParser::parse_chat_response(&text))
    }

    /// Packing-list suggestions for the trip.
    pub async fn generate_packing_list(
        &self,
        request: &ItineraryRequest,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let text = match &self.api_key {
            Some(_) => {
                self.generate_text(&format!(
                    "List 10 essential packing items for a {} trip to {}. One item per line, no numbering.",
                    request.duration_label(),
                    request.destinations.join(" and "),
                ))
                .await?
            }
            None => mock_packing_list_text(request),
        };
        Ok(text
            .lines()
            .map(|line| line.trim_start_matches("- ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    /// Short list of tourist spots for a city, mock path included.
    pub async fn generate_tourist_spots(
        &self,
        city: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let text = match &self.api_key {
            Some(_) => {
                self.generate_text(&format!(
                    "List 5 must-see tourist spots in {}. One per line, no numbering.",
                    city
                ))
                .await?
            }
            None => mock_tourist_spots_text(city),
        };
        Ok(text
            .lines()
            .map(|line| line.trim_start_matches("- ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
        let api_key = self.api_key.as_ref().ok_or("GENAI_API_KEY not configured")?;
        let url = format!(
            "{}/{}:generateContent?key={}",
            GENERATION_ENDPOINT, self.model, api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self.http_client.post(&url).json(&body).send().await?;
        if response.status() == reqwest::StatusCode::BAD_REQUEST
            || response.status() == reqwest::StatusCode::FORBIDDEN
        {
            return Err("Generative API rejected the request; check GENAI_API_KEY".into());
        }
        if !response.status().is_success() {
            return Err(format!("Generative API error: {}", response.status()).into());
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(feedback) = &parsed.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(format!("Content blocked by the provider: {}", reason).into());
            }
        }
        let text = parsed
            .candidates
            .and_then(|mut c| c.drain(..).next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|mut p| p.drain(..).next())
            .and_then(|p| p.text)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err("Empty response from the generative model".into());
        }
        Ok(text)
    }
}

impl Default for GenerationService {
    fn default() -> Self {
        Self::new()
    }
}

/// Prompt for the form flow; the response contract is the line grammar
/// the itinerary parser understands.
fn build_form_prompt(request: &ItineraryRequest) -> String {
    let mut prompt = format!(
        "Create a day-by-day travel itinerary for {} traveler(s) visiting {}",
        request.travelers,
        request.destinations.join(", "),
    );
    if let (Some(start), Some(end)) = (&request.start_date, &request.end_date) {
        prompt.push_str(&format!(" from {} to {}", start, end));
    }
    if let Some(occasion) = &request.occasion {
        prompt.push_str(&format!(" for a {}", occasion));
    }
    prompt.push_str(&format!(
        ". Favor {}.\n\n\
         Respond in exactly this format:\n\
         Overall Trip Title: <title>\n\
         Day <N> (<YYYY-MM-DD>):\n\
         - <time>: <activity> (<short description>) Location: <place> (Approx. <cost> USD)\n\
         Direct Image URL: <url or NO_IMAGE_URL>\n\
         Estimated Travel Time to Next Activity: <duration or N/A>\n",
        request.tier.prompt_guidance(),
    ));
    prompt
}

fn build_chat_prompt(message: &str) -> String {
    format!(
        "You are a travel-planning assistant. Based on this request:\n\n{}\n\n\
         Summarize a plan in exactly this format:\n\
         Trip Title: <title>\n\
         Destinations: <comma-separated cities>\n\
         Duration: <label>\n\
         Day <N>:\n\
         - HH:MM: <activity> at <place> - (<description>). Location: <place>. Cost: <amount>.\n\
         Overall Estimated Cost: <amount>\n",
        message
    )
}

/// Deterministic mock response in the form-flow grammar. One entry per
/// requested day, rotating through the destination list.
fn mock_itinerary_text(request: &ItineraryRequest) -> String {
    let days = request.day_count();
    let fallback = "Your Destination".to_string();
    let mut text = format!(
        "Overall Trip Title: {} Discovery\n",
        request.destinations.first().unwrap_or(&fallback)
    );
    let start = request
        .start_date
        .as_deref()
        .and_then(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    for day in 1..=days {
        let city = request
            .destinations
            .get((day as usize - 1) % request.destinations.len().max(1))
            .unwrap_or(&fallback);
        match start.and_then(|s| s.checked_add_days(chrono::Days::new(day as u64 - 1))) {
            Some(date) => text.push_str(&format!("Day {} ({}):\n", day, date.format("%Y-%m-%d"))),
            None => text.push_str(&format!("Day {}:\n", day)),
        }
        text.push_str(&format!(
            "- 9:00 AM: Guided walking tour of {city} (Historic center highlights) Location: {city} Old Town (Approx. 25 USD)\n\
             Direct Image URL: NO_IMAGE_URL\n\
             Estimated Travel Time to Next Activity: 15 minutes\n\
             - 1:00 PM: Lunch at a local favorite (Regional specialties) Location: Central {city} (Approx. $20-30)\n\
             Estimated Travel Time to Next Activity: 20 minutes\n\
             - 3:00 PM: Visit the city museum (Signature collections) Location: Museum District, {city} (Approx. 18)\n\
             Estimated Travel Time to Next Activity: N/A\n",
        ));
    }
    text
}

fn mock_chat_text(message: &str) -> String {
    // The mock ignores the message content beyond echoing a city guess:
    // the last capitalized word, so a sentence-initial capital does not
    // pass for a place name.
    let city = message
        .split_whitespace()
        .filter(|w| w.chars().next().is_some_and(|c| c.is_uppercase()))
        .last()
        .map(|w| w.trim_end_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .unwrap_or("Lisbon");
    format!(
        "Trip Title: A Weekend in {city}\n\
         Destinations: {city}\n\
         Duration: 2 days\n\
         Day 1:\n\
         - 09:00: Old town walk at {city} center - (cobbled lanes and viewpoints). Location: {city} Old Town. Cost: Free.\n\
         - 13:00: Lunch at a market hall. Location: Central Market. Cost: $20.\n\
         Day 2:\n\
         - 10:00: Museum morning. Location: City Museum. Cost: $15.\n\
         Overall Estimated Cost: $35\n",
    )
}

fn mock_packing_list_text(request: &ItineraryRequest) -> String {
    let mut items = vec![
        "Passport and travel documents",
        "Universal power adapter",
        "Comfortable walking shoes",
        "Weather-appropriate layers",
        "Reusable water bottle",
        "Phone charger and power bank",
        "Basic first-aid kit",
        "Daypack",
    ];
    if request.travelers > 2 {
        items.push("Snacks for the group");
    }
    items.join("\n")
}

fn mock_tourist_spots_text(city: &str) -> String {
    format!(
        "{city} Old Town\n{city} Cathedral\nCity Museum of {city}\n{city} Central Market\nRiverside promenade",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::TravelTier;

    fn request() -> ItineraryRequest {
        ItineraryRequest {
            destinations: vec!["Paris".to_string()],
            origin: None,
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-03".to_string()),
            travelers: 2,
            tier: TravelTier::BudgetExplorer,
            occasion: None,
            trip_type: None,
        }
    }

    #[test]
    fn mock_text_covers_every_day_with_dates() {
        let text = mock_itinerary_text(&request());
        assert!(text.contains("Day 1 (2024-01-01):"));
        assert!(text.contains("Day 2 (2024-01-02):"));
        assert!(text.contains("Day 3 (2024-01-03):"));
    }

    #[test]
    fn chat_mock_guesses_the_last_capitalized_word_as_the_city() {
        let text = mock_chat_text("Plan a weekend in Lisbon.");
        assert!(text.contains("A Weekend in Lisbon\n"));

        let text = mock_chat_text("somewhere warm and walkable");
        assert!(text.contains("A Weekend in Lisbon\n"));
    }

    #[test]
    fn form_prompt_carries_tier_guidance() {
        let prompt = build_form_prompt(&request());
        assert!(prompt.contains("budget-friendly"));
        assert!(prompt.contains("Overall Trip Title:"));
    }
}

//! Itinerary Text Parser (form flow)
//!
//! The generation service asks the model for a loosely line-oriented format:
//!
//! ```text
//! Overall Trip Title: <title>
//! Day <N> (<date>):
//! - <HH:MM AM>: <activity> (<description>) Location: <place> (Approx. <cost>)
//! Direct Image URL: <url>
//! Estimated Travel Time to Next Activity: <value>
//! ```
//!
//! Each line is classified into a `LineToken` and fed through a small
//! state machine holding the current-day accumulator. Lines that match
//! nothing are skipped and logged at debug level; the parser never fails,
//! a degenerate input just yields an empty breakdown.

use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use log::debug;
use regex::Regex;

use crate::models::itinerary::{DailyItinerary, EventSource, GeneratedItinerary, ItineraryItem};
use crate::models::request::ItineraryRequest;

fn day_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:\*\*)?Day\s+(\d+)\s*(?:\(([^)]*)\))?\s*:").unwrap())
}

fn trip_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:\*\*)?Overall Trip Title\s*:\s*(.+)$").unwrap())
}

fn image_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*Direct Image URL\s*:\s*(\S+)").unwrap())
}

fn travel_time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*Estimated Travel Time to Next Activity\s*:\s*(.+)$").unwrap()
    })
}

fn time_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*(?:-\s*)?(\d{1,2}:\d{2}\s*(?:[APap]\.?[Mm]\.?)?)\s*:?\s*").unwrap()
    })
}

fn cost_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(Approx\.\s*([^)]+)\)").unwrap())
}

fn location_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Location\s*:\s*(.+?)(?:\s*\(Approx\.|$)").unwrap())
}

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]+)\)").unwrap())
}

/// One classified line of model output.
#[derive(Debug)]
enum LineToken<'a> {
    DayHeader { number: u32, date: Option<&'a str> },
    TripTitle(&'a str),
    Event(&'a str),
    ImageUrl(&'a str),
    TravelTime(&'a str),
    Blank,
    Other(&'a str),
}

fn classify(line: &str) -> LineToken<'_> {
    if line.trim().is_empty() {
        return LineToken::Blank;
    }
    if let Some(caps) = day_header_re().captures(line) {
        let number = caps[1].parse().unwrap_or(0);
        let date = caps.get(2).map(|m| m.as_str().trim()).filter(|d| !d.is_empty());
        return LineToken::DayHeader { number, date };
    }
    if let Some(caps) = trip_title_re().captures(line) {
        return LineToken::TripTitle(caps.get(1).unwrap().as_str());
    }
    if let Some(caps) = image_url_re().captures(line) {
        return LineToken::ImageUrl(caps.get(1).unwrap().as_str());
    }
    if let Some(caps) = travel_time_re().captures(line) {
        return LineToken::TravelTime(caps.get(1).unwrap().as_str());
    }
    let trimmed = line.trim_start();
    if trimmed.starts_with("- ") || time_token_re().is_match(trimmed) {
        return LineToken::Event(trimmed);
    }
    LineToken::Other(line)
}

/// Issues event ids unique within one parse call: millisecond timestamp
/// plus an incrementing counter.
pub(crate) struct EventIdGenerator {
    base_millis: i64,
    counter: u32,
}

impl EventIdGenerator {
    pub(crate) fn new() -> Self {
        Self {
            base_millis: Utc::now().timestamp_millis(),
            counter: 0,
        }
    }

    pub(crate) fn next_id(&mut self) -> String {
        let id = format!("evt-{}-{}", self.base_millis, self.counter);
        self.counter += 1;
        id
    }
}

/// Normalize a raw cost clause captured from `(Approx. ...)`.
///
/// Strips a trailing "USD", maps the canonical labels, and prefixes `$`
/// onto bare numeric amounts.
pub(crate) fn normalize_cost(raw: &str) -> Option<String> {
    let mut cost = raw.trim().to_string();
    if cost
        .get(cost.len().saturating_sub(3)..)
        .is_some_and(|tail| tail.eq_ignore_ascii_case("usd"))
    {
        cost.truncate(cost.len() - 3);
        cost = cost.trim_end().to_string();
    }
    if cost.is_empty() {
        return None;
    }
    match cost.to_lowercase().as_str() {
        "free" => return Some("Free".to_string()),
        "included" => return Some("Included".to_string()),
        "varies" => return Some("Varies".to_string()),
        "n/a" | "na" => return Some("N/A".to_string()),
        _ => {}
    }
    if cost.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        cost = format!("${}", cost);
    }
    Some(cost)
}

/// Strip stray punctuation and bracket characters left over from clause
/// extraction.
pub(crate) fn tidy_fragment(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| matches!(c, '-' | '.' | ',' | ';' | ':' | '(' | ')' | '[' | ']' | '*'))
        .trim()
        .to_string()
}

pub struct ItineraryParser;

impl ItineraryParser {
    /// Parse the form-flow model response into a structured itinerary.
    ///
    /// Never fails: unparsable lines are skipped, events without a
    /// resolvable activity name are dropped. Destinations and duration
    /// fall back to the original form data.
    pub fn parse_form_response(text: &str, request: &ItineraryRequest) -> GeneratedItinerary {
        let mut ids = EventIdGenerator::new();
        let mut title: Option<String> = None;
        let mut days: Vec<DailyItinerary> = Vec::new();
        let mut current: Option<DailyItinerary> = None;

        for line in text.lines() {
            match classify(line) {
                LineToken::DayHeader { number, date } => {
                    if let Some(day) = current.take() {
                        days.push(day);
                    }
                    current = Some(DailyItinerary {
                        day: format!("Day {}", number),
                        date: date.map(|d| d.to_string()),
                        events: Vec::new(),
                    });
                }
                LineToken::TripTitle(t) => {
                    // Last occurrence wins when the model repeats the line.
                    title = Some(tidy_fragment(t));
                }
                LineToken::Event(body) => match current.as_mut() {
                    Some(day) => {
                        if let Some(event) = parse_event_line(body, &mut ids) {
                            day.events.push(event);
                        }
                    }
                    None => debug!("event line outside any day, skipping: {}", body),
                },
                LineToken::ImageUrl(url) => {
                    if let Some(event) = last_event_mut(&mut current) {
                        if url != "NO_IMAGE_URL" && url.starts_with("http") {
                            event.image_url = Some(url.to_string());
                        }
                    }
                }
                LineToken::TravelTime(value) => {
                    if let Some(event) = last_event_mut(&mut current) {
                        let value = value.trim();
                        if !value.eq_ignore_ascii_case("n/a") {
                            event.travel_time_to_next = Some(value.to_string());
                        }
                    }
                }
                LineToken::Blank => {}
                LineToken::Other(l) => debug!("unmatched itinerary line, skipping: {}", l),
            }
        }
        if let Some(day) = current.take() {
            days.push(day);
        }

        GeneratedItinerary {
            title: title.unwrap_or_else(|| default_title(&request.destinations)),
            destinations: request.destinations.clone(),
            duration: request.duration_label(),
            daily_breakdown: days,
            estimated_total_cost: None,
        }
    }
}

fn last_event_mut(current: &mut Option<DailyItinerary>) -> Option<&mut ItineraryItem> {
    current.as_mut().and_then(|day| day.events.last_mut())
}

fn default_title(destinations: &[String]) -> String {
    if destinations.is_empty() {
        "Your Trip".to_string()
    } else {
        format!("Trip to {}", destinations.join(" & "))
    }
}

/// Extract one event from an event line via the best-effort clause scan.
fn parse_event_line(line: &str, ids: &mut EventIdGenerator) -> Option<ItineraryItem> {
    let mut body = line.trim_start_matches("- ").trim().to_string();

    // Leading time token, else the event stays "Flexible".
    let mut time = "Flexible".to_string();
    if let Some(caps) = time_token_re().captures(&body) {
        time = caps[1].trim().to_string();
        body = body[caps.get(0).unwrap().end()..].to_string();
    }

    let cost = cost_clause_re()
        .captures(&body)
        .and_then(|caps| normalize_cost(&caps[1]));

    let location = location_clause_re()
        .captures(&body)
        .map(|caps| tidy_fragment(&caps[1]))
        .filter(|l| !l.is_empty());

    // Remove the extracted clauses, then whatever leads the remainder is
    // the activity; its first parenthetical is the description.
    let mut remainder = cost_clause_re().replace_all(&body, "").to_string();
    if let Some(pos) = remainder.to_lowercase().find("location:") {
        remainder.truncate(pos);
    }

    let mut description = None;
    let activity = match parenthetical_re().captures(&remainder) {
        Some(caps) => {
            description = Some(tidy_fragment(&caps[1]));
            tidy_fragment(&remainder[..caps.get(0).unwrap().start()])
        }
        None => tidy_fragment(&remainder),
    };

    // Fall back to any parenthetical in the full line that is neither the
    // cost nor the location text.
    if description.as_deref().map_or(true, |d| d.is_empty()) {
        description = parenthetical_re()
            .captures_iter(&body)
            .map(|caps| tidy_fragment(&caps[1]))
            .find(|candidate| {
                !candidate.is_empty()
                    && !candidate.starts_with("Approx.")
                    && Some(candidate.as_str()) != location.as_deref()
                    && Some(candidate.as_str()) != cost.as_deref()
            });
    }

    // Drop descriptions redundant with an already-extracted field.
    if let Some(desc) = &description {
        let redundant = location
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(desc))
            || cost.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(desc));
        if redundant || desc.is_empty() {
            description = None;
        }
    }

    if activity.is_empty() {
        debug!("event with no resolvable activity, dropping: {}", line);
        return None;
    }

    let mut event = ItineraryItem::new(ids.next_id(), activity, EventSource::Ai);
    event.time = time;
    event.description = description;
    event.location = location;
    event.cost = cost;
    Some(event)
}

/// Inclusive day count between two ISO dates, used for duration fallbacks.
pub(crate) fn inclusive_day_count(start: &str, end: &str) -> Option<i64> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").ok()?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").ok()?;
    let days = (end - start).num_days() + 1;
    (days > 0).then_some(days)
}

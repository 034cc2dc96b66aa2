//! Itinerary Text Parser (chat flow)
//!
//! The open-ended chat flow asks the model to summarize the plan with one
//! event per line:
//!
//! ```text
//! Trip Title: <title>
//! Destinations: <A, B and C>
//! Duration: <label>
//! Day <N>:
//! - HH:MM: <activity> at <place> - (<description>). Location: <X>. Cost: <Y>.
//! Overall Estimated Cost: <amount>
//! ```
//!
//! Shares the day-header grammar, cost normalizer, and event-id scheme
//! with the form-flow parser. The overall cost prefers an explicit line
//! and otherwise sums whatever per-event costs parse as numbers.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::models::itinerary::{DailyItinerary, EventSource, GeneratedItinerary, ItineraryItem};
use crate::services::itinerary_parser_service::{normalize_cost, tidy_fragment, EventIdGenerator};

fn chat_event_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?ix)^-\s*
              (\d{1,2}:\d{2})\s*:\s*            # time
              (.+?)                             # activity
              (?:\s+at\s+(.+?))?                # optional place
              (?:\s*-\s*\(([^)]*)\))?           # optional description
              \.\s*Location\s*:\s*([^.]+)\.     # location clause
              \s*Cost\s*:\s*([^.]+)\.?\s*$      # cost clause
            ",
        )
        .unwrap()
    })
}

fn day_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:\*\*)?Day\s+(\d+)\s*(?:\(([^)]*)\))?\s*:").unwrap())
}

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*(?:Trip\s+)?Title\s*:\s*(.+)$").unwrap())
}

fn destinations_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*Destinations?\s*:\s*(.+)$").unwrap())
}

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*Duration\s*:\s*(.+)$").unwrap())
}

fn overall_cost_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*Overall Estimated Cost\s*:\s*(.+)$").unwrap())
}

fn leading_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$?\s*(\d+(?:\.\d+)?)").unwrap())
}

/// Split a destination list on commas and the word "and".
pub(crate) fn split_destinations(raw: &str) -> Vec<String> {
    raw.split(',')
        .flat_map(|part| part.split(" and "))
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// First numeric amount in a cost string, if any. "Free" and friends
/// contribute nothing to the total.
fn parse_amount(cost: &str) -> Option<f64> {
    leading_amount_re()
        .captures(cost)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

pub struct ChatItineraryParser;

impl ChatItineraryParser {
    /// Parse a free-text chat summary into a partial itinerary.
    pub fn parse_chat_response(text: &str) -> GeneratedItinerary {
        let mut ids = EventIdGenerator::new();
        let mut itinerary = GeneratedItinerary::empty();
        let mut explicit_cost: Option<String> = None;
        let mut days: Vec<DailyItinerary> = Vec::new();
        let mut current: Option<DailyItinerary> = None;

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(caps) = day_header_re().captures(line) {
                if let Some(day) = current.take() {
                    days.push(day);
                }
                current = Some(DailyItinerary {
                    day: format!("Day {}", &caps[1]),
                    date: caps.get(2).map(|m| m.as_str().trim().to_string()),
                    events: Vec::new(),
                });
                continue;
            }
            if let Some(caps) = chat_event_re().captures(line.trim()) {
                if let Some(event) = build_chat_event(&caps, &mut ids) {
                    match current.as_mut() {
                        Some(day) => day.events.push(event),
                        None => debug!("chat event outside any day, skipping: {}", line),
                    }
                }
                continue;
            }
            if let Some(caps) = overall_cost_re().captures(line) {
                explicit_cost = normalize_cost(&caps[1]);
                continue;
            }
            if let Some(caps) = destinations_re().captures(line) {
                itinerary.destinations = split_destinations(&caps[1]);
                continue;
            }
            if let Some(caps) = duration_re().captures(line) {
                itinerary.duration = tidy_fragment(&caps[1]);
                continue;
            }
            if let Some(caps) = title_re().captures(line) {
                itinerary.title = tidy_fragment(&caps[1]);
                continue;
            }
            debug!("unmatched chat line, skipping: {}", line);
        }
        if let Some(day) = current.take() {
            days.push(day);
        }

        itinerary.estimated_total_cost = explicit_cost.or_else(|| summed_cost(&days));
        itinerary.daily_breakdown = days;
        itinerary
    }
}

fn build_chat_event(caps: &regex::Captures, ids: &mut EventIdGenerator) -> Option<ItineraryItem> {
    let mut activity = tidy_fragment(&caps[2]);
    if let Some(place) = caps.get(3).map(|m| tidy_fragment(m.as_str())) {
        if !place.is_empty() {
            activity = format!("{} at {}", activity, place);
        }
    }
    if activity.is_empty() {
        return None;
    }
    let mut event = ItineraryItem::new(ids.next_id(), activity, EventSource::Ai);
    event.time = caps[1].to_string();
    event.description = caps
        .get(4)
        .map(|m| tidy_fragment(m.as_str()))
        .filter(|d| !d.is_empty());
    event.location = Some(tidy_fragment(&caps[5])).filter(|l| !l.is_empty());
    event.cost = normalize_cost(&caps[6]);
    Some(event)
}

/// Sum the parseable per-event costs; None when nothing parses.
fn summed_cost(days: &[DailyItinerary]) -> Option<String> {
    let total: f64 = days
        .iter()
        .flat_map(|day| &day.events)
        .filter_map(|event| event.cost.as_deref().and_then(parse_amount))
        .sum();
    (total > 0.0).then(|| format!("${:.0}", total))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Trip Title: Highlights of Italy
Destinations: Rome, Florence and Venice
Duration: 3 days
Day 1:
- 09:00: Guided walk at the Colosseum - (skip-the-line tour). Location: Piazza del Colosseo. Cost: $25.
- 13:00: Lunch at Trastevere. Location: Trastevere. Cost: $18.
Day 2:
- 10:00: Uffizi visit. Location: Florence. Cost: Free.
";

    #[test]
    fn chat_summary_parses_days_and_fields() {
        let itinerary = ChatItineraryParser::parse_chat_response(SAMPLE);
        assert_eq!(itinerary.title, "Highlights of Italy");
        assert_eq!(itinerary.destinations, vec!["Rome", "Florence", "Venice"]);
        assert_eq!(itinerary.duration, "3 days");
        assert_eq!(itinerary.daily_breakdown.len(), 2);

        let first = &itinerary.daily_breakdown[0].events[0];
        assert_eq!(first.time, "09:00");
        assert_eq!(first.activity, "Guided walk at the Colosseum");
        assert_eq!(first.description.as_deref(), Some("skip-the-line tour"));
        assert_eq!(first.location.as_deref(), Some("Piazza del Colosseo"));
        assert_eq!(first.cost.as_deref(), Some("$25"));
    }

    #[test]
    fn overall_cost_sums_event_costs_when_not_explicit() {
        let itinerary = ChatItineraryParser::parse_chat_response(SAMPLE);
        // $25 + $18; the Free event contributes nothing.
        assert_eq!(itinerary.estimated_total_cost.as_deref(), Some("$43"));
    }

    #[test]
    fn explicit_overall_cost_wins() {
        let text = format!("{}\nOverall Estimated Cost: 999 USD\n", SAMPLE);
        let itinerary = ChatItineraryParser::parse_chat_response(&text);
        assert_eq!(itinerary.estimated_total_cost.as_deref(), Some("$999"));
    }

    #[test]
    fn destination_splitting() {
        assert_eq!(
            split_destinations("Paris, Lyon and Nice"),
            vec!["Paris", "Lyon", "Nice"]
        );
        assert_eq!(split_destinations("Tokyo"), vec!["Tokyo"]);
    }

    #[test]
    fn event_ids_unique_across_days() {
        let itinerary = ChatItineraryParser::parse_chat_response(SAMPLE);
        let mut ids: Vec<_> = itinerary
            .daily_breakdown
            .iter()
            .flat_map(|d| d.events.iter().map(|e| e.id.clone()))
            .collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }
}

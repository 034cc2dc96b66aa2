//! Local key-value persistence
//!
//! File-backed storage for user preferences, cached itineraries, and
//! saved trips. The rest of the system treats it as an opaque
//! collaborator; missing or corrupt entries degrade to `None` with a
//! warning rather than failing the caller.

use std::{env, fs, path::PathBuf};

use log::warn;

use crate::models::itinerary::GeneratedItinerary;
use crate::models::request::ItineraryRequest;
use crate::models::trip::{Trip, UserPreferences};

/// Bumped whenever the cached-itinerary shape changes, so stale cache
/// entries from an older schema never deserialize into the new one.
const ITINERARY_CACHE_VERSION: u32 = 2;
const DEFAULT_DATA_DIR: &str = ".tripcraft";

pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open the store under `TRIPCRAFT_DATA_DIR`, or `./.tripcraft`.
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let root = env::var("TRIPCRAFT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));
        Self::at(root)
    }

    pub fn at(root: impl Into<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        let root = root.into();
        fs::create_dir_all(root.join("cache"))?;
        fs::create_dir_all(root.join("trips"))?;
        Ok(Self { root })
    }

    /// Composite cache key for one generation request, with the schema
    /// version suffixed.
    pub fn itinerary_cache_key(request: &ItineraryRequest) -> String {
        format!(
            "{}|{}|{}|{}|{}|{:?}|{}::v{}",
            request.destinations.join("+"),
            request.start_date.as_deref().unwrap_or("-"),
            request.end_date.as_deref().unwrap_or("-"),
            request.trip_type.as_deref().unwrap_or("-"),
            request.travelers,
            request.tier,
            request.occasion.as_deref().unwrap_or("-"),
            ITINERARY_CACHE_VERSION,
        )
    }

    pub fn save_user_preferences(
        &self,
        prefs: &UserPreferences,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(prefs)?;
        fs::write(self.root.join("preferences.json"), json)?;
        Ok(())
    }

    pub fn get_user_preferences(&self) -> Option<UserPreferences> {
        self.read_json(self.root.join("preferences.json"))
    }

    pub fn cache_itinerary(
        &self,
        key: &str,
        itinerary: &GeneratedItinerary,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string(itinerary)?;
        fs::write(self.cache_path(key), json)?;
        Ok(())
    }

    pub fn get_cached_itinerary(&self, key: &str) -> Option<GeneratedItinerary> {
        self.read_json(self.cache_path(key))
    }

    pub fn save_trip(&self, trip: &Trip) -> Result<(), Box<dyn std::error::Error>> {
        let user_dir = self.root.join("trips").join(sanitize(
            trip.user_id.as_deref().unwrap_or("anonymous"),
        ));
        fs::create_dir_all(&user_dir)?;
        let json = serde_json::to_string_pretty(trip)?;
        fs::write(user_dir.join(format!("{}.json", trip.id)), json)?;
        Ok(())
    }

    pub fn get_trip_by_id(&self, user_id: &str, trip_id: &str) -> Option<Trip> {
        self.read_json(
            self.root
                .join("trips")
                .join(sanitize(user_id))
                .join(format!("{}.json", sanitize(trip_id))),
        )
    }

    /// All saved trips for one user, newest first.
    pub fn get_saved_trips(&self, user_id: &str) -> Vec<Trip> {
        let dir = self.root.join("trips").join(sanitize(user_id));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };
        let mut trips: Vec<Trip> = entries
            .flatten()
            .filter_map(|entry| self.read_json(entry.path()))
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        trips
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.root.join("cache").join(format!("{}.json", sanitize(key)))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, path: PathBuf) -> Option<T> {
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("corrupt entry at {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// File-name-safe, injective encoding of a key: alphanumerics and `-`
/// pass through, everything else (including `_`) becomes `_xx` hex
/// escapes, so distinct keys never share a file.
fn sanitize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("_{:02x}", byte));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trip::{TravelTier, TripSource};
    use tempfile::tempdir;

    fn request() -> ItineraryRequest {
        ItineraryRequest {
            destinations: vec!["Paris".to_string(), "Lyon".to_string()],
            origin: None,
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-03".to_string()),
            travelers: 2,
            tier: TravelTier::ComfortSeeker,
            occasion: Some("honeymoon".to_string()),
            trip_type: None,
        }
    }

    #[test]
    fn cache_key_includes_all_fields_and_version() {
        let key = LocalStore::itinerary_cache_key(&request());
        assert!(key.starts_with("Paris+Lyon|2024-01-01|2024-01-03|"));
        assert!(key.contains("honeymoon"));
        assert!(key.ends_with("::v2"));
    }

    #[test]
    fn itinerary_cache_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalStore::at(dir.path()).unwrap();
        let itinerary = GeneratedItinerary {
            title: "Cached".to_string(),
            destinations: vec!["Paris".to_string()],
            duration: "3 Days".to_string(),
            daily_breakdown: Vec::new(),
            estimated_total_cost: None,
        };
        let key = LocalStore::itinerary_cache_key(&request());
        assert!(store.get_cached_itinerary(&key).is_none());
        store.cache_itinerary(&key, &itinerary).unwrap();
        assert_eq!(store.get_cached_itinerary(&key).unwrap().title, "Cached");
    }

    #[test]
    fn trips_saved_per_user() {
        let dir = tempdir().unwrap();
        let store = LocalStore::at(dir.path()).unwrap();
        let mut trip = Trip::new(TripSource::Form);
        trip.user_id = Some("user-1".to_string());
        store.save_trip(&trip).unwrap();
        assert_eq!(store.get_saved_trips("user-1").len(), 1);
        assert!(store.get_saved_trips("someone-else").is_empty());
        assert!(store
            .get_trip_by_id("user-1", &trip.id.to_string())
            .is_some());
    }

    #[test]
    fn keys_differing_only_in_separators_get_distinct_cache_files() {
        let dir = tempdir().unwrap();
        let store = LocalStore::at(dir.path()).unwrap();
        let mut itinerary = GeneratedItinerary {
            title: "Pipe".to_string(),
            destinations: vec!["Paris".to_string()],
            duration: "3 Days".to_string(),
            daily_breakdown: Vec::new(),
            estimated_total_cost: None,
        };
        store.cache_itinerary("Paris|Lyon", &itinerary).unwrap();
        itinerary.title = "Plus".to_string();
        store.cache_itinerary("Paris+Lyon", &itinerary).unwrap();

        assert_eq!(store.get_cached_itinerary("Paris|Lyon").unwrap().title, "Pipe");
        assert_eq!(store.get_cached_itinerary("Paris+Lyon").unwrap().title, "Plus");
    }

    #[test]
    fn corrupt_entry_degrades_to_none() {
        let dir = tempdir().unwrap();
        let store = LocalStore::at(dir.path()).unwrap();
        std::fs::write(dir.path().join("preferences.json"), "{not json").unwrap();
        assert!(store.get_user_preferences().is_none());
    }
}

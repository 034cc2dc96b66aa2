use std::sync::atomic::{AtomicUsize, Ordering};

use serial_test::serial;
use tempfile::tempdir;

use tripcraft::models::bookings::BookingKind;
use tripcraft::models::request::ItineraryRequest;
use tripcraft::models::trip::{TravelTier, TripDetailsUpdate, TripSource};
use tripcraft::services::booking_service::{self, SearchCriteria};
use tripcraft::services::generation_service::GenerationService;
use tripcraft::services::payment_service::{
    self, MockPaymentProvider, PaymentError, PaymentOutcome, PaymentProvider,
};
use tripcraft::storage::LocalStore;
use tripcraft::store::TripStore;

fn paris_request() -> ItineraryRequest {
    ItineraryRequest {
        destinations: vec!["Paris".to_string()],
        origin: Some("London".to_string()),
        start_date: Some("2024-01-01".to_string()),
        end_date: Some("2024-01-03".to_string()),
        travelers: 2,
        tier: TravelTier::ComfortSeeker,
        occasion: None,
        trip_type: None,
    }
}

fn mock_service() -> GenerationService {
    std::env::remove_var("GENAI_API_KEY");
    GenerationService::new()
}

#[tokio::test]
#[serial]
async fn mock_path_yields_a_full_three_day_itinerary() {
    let service = mock_service();
    let itinerary = service
        .generate_itinerary(&paris_request(), None)
        .await
        .expect("mock generation should not fail");

    assert_eq!(itinerary.daily_breakdown.len(), 3);
    let first_event = &itinerary.daily_breakdown[0].events[0];
    assert!(!first_event.activity.is_empty());
    let cost = first_event.cost.as_deref().expect("first event has a cost");
    assert!(cost.starts_with('$'));
}

#[tokio::test]
#[serial]
async fn repeated_generation_hits_the_cache() {
    let dir = tempdir().unwrap();
    let storage = LocalStore::at(dir.path()).unwrap();
    let service = mock_service();
    let request = paris_request();

    let first = service
        .generate_itinerary(&request, Some(&storage))
        .await
        .unwrap();
    let second = service
        .generate_itinerary(&request, Some(&storage))
        .await
        .unwrap();

    // The cached copy comes back verbatim, event ids included.
    assert_eq!(first, second);
}

#[tokio::test]
#[serial]
async fn chat_flow_produces_partial_itinerary_with_total() {
    let service = mock_service();
    let itinerary = service
        .generate_chat_itinerary("a relaxed weekend somewhere walkable")
        .await
        .unwrap();
    assert!(!itinerary.daily_breakdown.is_empty());
    assert!(itinerary.estimated_total_cost.is_some());
}

#[tokio::test]
#[serial]
async fn packing_list_is_non_empty_on_the_mock_path() {
    let service = mock_service();
    let list = service.generate_packing_list(&paris_request()).await.unwrap();
    assert!(list.len() >= 5);
    assert!(list.iter().all(|item| !item.is_empty()));
}

async fn booked_store() -> TripStore {
    let mut store = TripStore::new();
    store.update_trip_details(TripDetailsUpdate {
        source: Some(TripSource::Form),
        user_id: Some("user-1".to_string()),
        destinations: Some(vec!["Paris".to_string()]),
        start_date: Some("2099-06-01".to_string()),
        end_date: Some("2099-06-03".to_string()),
        ..Default::default()
    });
    let criteria = SearchCriteria {
        from_city: "London".to_string(),
        to_city: "Paris".to_string(),
        date: "2099-06-01".to_string(),
        travelers: 2,
        tier: TravelTier::ComfortSeeker,
    };
    let mut flight = booking_service::search_flights(&criteria).await.remove(0);
    flight.booked = true;
    store.add_flight_booking(flight);
    let mut hotel = booking_service::search_hotels(&criteria, 2).await.remove(0);
    hotel.booked = true;
    store.add_hotel_booking(hotel);
    store
}

#[tokio::test]
async fn settle_trip_pays_every_booked_item() {
    let mut store = booked_store().await;
    let paid = payment_service::settle_trip(&mut store, &MockPaymentProvider)
        .await
        .unwrap();
    assert_eq!(paid, 2);
    let trip = store.current_trip().unwrap();
    assert!(trip.flights.iter().all(|f| f.payment_completed));
    assert!(trip.hotels.iter().all(|h| h.payment_completed));
}

#[tokio::test]
async fn settle_trip_is_idempotent_once_paid() {
    let mut store = booked_store().await;
    payment_service::settle_trip(&mut store, &MockPaymentProvider)
        .await
        .unwrap();
    let paid_again = payment_service::settle_trip(&mut store, &MockPaymentProvider)
        .await
        .unwrap();
    assert_eq!(paid_again, 0);
}

/// Succeeds a fixed number of times, then fails.
struct FlakyProvider {
    calls: AtomicUsize,
    allow: usize,
}

impl PaymentProvider for FlakyProvider {
    async fn complete_payment(
        &self,
        kind: BookingKind,
        booking_id: &str,
    ) -> Result<PaymentOutcome, PaymentError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.allow {
            return Err(PaymentError::Declined(format!(
                "{} {}",
                kind.as_str(),
                booking_id
            )));
        }
        Ok(PaymentOutcome {
            success: true,
            reference: "test-ref".to_string(),
        })
    }
}

#[tokio::test]
async fn settle_trip_aborts_on_first_failure() {
    let mut store = booked_store().await;
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
        allow: 1,
    };
    let result = payment_service::settle_trip(&mut store, &provider).await;
    assert!(result.is_err());

    // The first item (the flight) was paid before the abort; the hotel
    // was not.
    let trip = store.current_trip().unwrap();
    assert!(trip.flights.iter().all(|f| f.payment_completed));
    assert!(trip.hotels.iter().all(|h| !h.payment_completed));
}

use env_logger::Env;

use tripcraft::models::bookings::CabDirection;
use tripcraft::models::request::ItineraryRequest;
use tripcraft::models::trip::{TravelTier, TripDetailsUpdate, TripSource};
use tripcraft::services::{booking_service, generation_service::GenerationService, payment_service};
use tripcraft::storage::LocalStore;
use tripcraft::store::TripStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let storage = LocalStore::new()?;
    let generator = GenerationService::new();
    let mut store = TripStore::new();

    // Run the planning funnel once, end to end, on whatever path the
    // environment selects (real API key or mock).
    let request = ItineraryRequest {
        destinations: vec!["Paris".to_string()],
        origin: Some("London".to_string()),
        start_date: Some("2026-09-01".to_string()),
        end_date: Some("2026-09-03".to_string()),
        travelers: 2,
        tier: TravelTier::ComfortSeeker,
        occasion: None,
        trip_type: None,
    };

    store.update_trip_details(TripDetailsUpdate {
        source: Some(TripSource::Form),
        user_id: Some("demo-user".to_string()),
        user_name: Some("Demo".to_string()),
        origin: request.origin.clone(),
        destinations: Some(request.destinations.clone()),
        start_date: request.start_date.clone(),
        end_date: request.end_date.clone(),
        travelers: Some(request.travelers),
        tier: Some(request.tier),
        ..Default::default()
    });

    println!("Generating itinerary...");
    let itinerary = generator.generate_itinerary(&request, Some(&storage)).await?;
    println!(
        "Generated \"{}\" with {} day(s)",
        itinerary.title,
        itinerary.daily_breakdown.len()
    );
    store.set_itinerary(itinerary);

    let criteria = booking_service::SearchCriteria {
        from_city: "London".to_string(),
        to_city: "Paris".to_string(),
        date: "2026-09-01".to_string(),
        travelers: request.travelers,
        tier: request.tier,
    };

    println!("Searching bookings...");
    let flights = booking_service::search_flights(&criteria).await;
    let hotels = booking_service::search_hotels(&criteria, 2).await;
    let cabs = booking_service::search_cabs(&criteria, CabDirection::Arrival).await;

    // Select the cheapest option from each list, the way the booking
    // pages would on a click.
    if let Some(mut flight) = flights
        .into_iter()
        .min_by(|a, b| a.price.total_cmp(&b.price))
    {
        flight.booked = true;
        println!("Selected flight {} at ${}", flight.flight_number, flight.price);
        store.add_flight_booking(flight);
    }
    if let Some(mut hotel) = hotels.into_iter().min_by(|a, b| a.price.total_cmp(&b.price)) {
        hotel.booked = true;
        println!("Selected hotel {} at ${}", hotel.name, hotel.price);
        store.add_hotel_booking(hotel);
    }
    if let Some(mut cab) = cabs.into_iter().min_by(|a, b| a.price.total_cmp(&b.price)) {
        cab.booked = true;
        store.add_cab_booking(cab);
    }

    println!("Settling payment...");
    let paid = payment_service::settle_trip(&mut store, &payment_service::MockPaymentProvider).await?;
    println!("Paid {} booking(s)", paid);

    if let Some(trip) = store.current_trip() {
        storage.save_trip(trip)?;
        println!("Trip {} saved", trip.id);
    }

    Ok(())
}

pub mod bookings;
pub mod itinerary;
pub mod request;
pub mod trip;

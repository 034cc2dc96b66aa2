pub mod booking_service;
pub mod chat_parser_service;
pub mod generation_service;
pub mod itinerary_parser_service;
pub mod payment_service;

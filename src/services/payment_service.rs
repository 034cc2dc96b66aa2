//! Simulated payment settlement
//!
//! The provider trait mirrors a real gateway's surface so the mock can
//! be swapped for a fallible implementation without touching the
//! settlement loop: items are paid one at a time and the loop aborts on
//! the first failure, leaving earlier items marked as paid.

use tokio::time::{sleep, Duration};
use uuid::Uuid;

use crate::models::bookings::BookingKind;
use crate::store::TripStore;

const PAYMENT_LATENCY_MS: u64 = 600;

#[derive(Debug)]
pub enum PaymentError {
    Declined(String),
    Provider(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::Declined(reason) => write!(f, "payment declined: {}", reason),
            PaymentError::Provider(reason) => write!(f, "payment provider error: {}", reason),
        }
    }
}

impl std::error::Error for PaymentError {}

#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub success: bool,
    pub reference: String,
}

pub trait PaymentProvider {
    async fn complete_payment(
        &self,
        kind: BookingKind,
        booking_id: &str,
    ) -> Result<PaymentOutcome, PaymentError>;
}

/// Always succeeds after a fixed delay.
pub struct MockPaymentProvider;

impl PaymentProvider for MockPaymentProvider {
    async fn complete_payment(
        &self,
        kind: BookingKind,
        booking_id: &str,
    ) -> Result<PaymentOutcome, PaymentError> {
        sleep(Duration::from_millis(PAYMENT_LATENCY_MS)).await;
        Ok(PaymentOutcome {
            success: true,
            reference: format!("pay-{}-{}", kind.as_str(), Uuid::new_v4()),
        })
    }
}

/// Everything selected (booked) but not yet paid on the current trip.
fn pending_items(store: &TripStore) -> Vec<(BookingKind, String)> {
    let Some(trip) = store.current_trip() else {
        return Vec::new();
    };
    let mut items = Vec::new();
    items.extend(
        trip.flights
            .iter()
            .filter(|f| f.booked && !f.payment_completed)
            .map(|f| (BookingKind::Flight, f.id.clone())),
    );
    items.extend(
        trip.hotels
            .iter()
            .filter(|h| h.booked && !h.payment_completed)
            .map(|h| (BookingKind::Hotel, h.id.clone())),
    );
    items.extend(
        trip.trains
            .iter()
            .filter(|t| t.booked && !t.payment_completed)
            .map(|t| (BookingKind::Train, t.id.clone())),
    );
    items.extend(
        trip.buses
            .iter()
            .filter(|b| b.booked && !b.payment_completed)
            .map(|b| (BookingKind::Bus, b.id.clone())),
    );
    if let Some(car) = trip.car_rental.as_ref().filter(|c| c.booked && !c.payment_completed) {
        items.push((BookingKind::Car, car.id.clone()));
    }
    for cab in [trip.departure_cab.as_ref(), trip.arrival_cab.as_ref()]
        .into_iter()
        .flatten()
        .filter(|c| c.booked && !c.payment_completed)
    {
        items.push((BookingKind::Cab, cab.id.clone()));
    }
    items
}

fn mark_paid(store: &mut TripStore, kind: BookingKind, booking_id: &str) {
    let Some(trip) = store.current_trip() else {
        return;
    };
    match kind {
        BookingKind::Flight => {
            if let Some(mut f) = trip.flights.iter().find(|f| f.id == booking_id).cloned() {
                f.payment_completed = true;
                store.update_flight_booking(f);
            }
        }
        BookingKind::Hotel => {
            if let Some(mut h) = trip.hotels.iter().find(|h| h.id == booking_id).cloned() {
                h.payment_completed = true;
                store.update_hotel_booking(h);
            }
        }
        BookingKind::Train => {
            if let Some(mut t) = trip.trains.iter().find(|t| t.id == booking_id).cloned() {
                t.payment_completed = true;
                store.update_train_booking(t);
            }
        }
        BookingKind::Bus => {
            if let Some(mut b) = trip.buses.iter().find(|b| b.id == booking_id).cloned() {
                b.payment_completed = true;
                store.update_bus_booking(b);
            }
        }
        BookingKind::Car => {
            if let Some(mut c) = trip.car_rental.clone().filter(|c| c.id == booking_id) {
                c.payment_completed = true;
                store.update_car_rental(c);
            }
        }
        BookingKind::Cab => {
            let cab = [trip.departure_cab.as_ref(), trip.arrival_cab.as_ref()]
                .into_iter()
                .flatten()
                .find(|c| c.id == booking_id)
                .cloned();
            if let Some(mut c) = cab {
                c.payment_completed = true;
                store.update_cab_booking(c);
            }
        }
    }
}

/// Pay every booked, unpaid item on the current trip sequentially.
///
/// Returns the number of items paid. The first failure aborts the run;
/// items paid before it stay marked `payment_completed`.
pub async fn settle_trip(
    store: &mut TripStore,
    provider: &impl PaymentProvider,
) -> Result<usize, PaymentError> {
    let items = pending_items(store);
    let mut paid = 0;
    for (kind, booking_id) in items {
        let outcome = provider.complete_payment(kind, &booking_id).await?;
        if !outcome.success {
            return Err(PaymentError::Declined(format!(
                "{} booking {}",
                kind.as_str(),
                booking_id
            )));
        }
        mark_paid(store, kind, &booking_id);
        paid += 1;
    }
    Ok(paid)
}

//! Text rendering of controller state and mutation notifications.

use std::fmt::Write as _;

use client_core::{CartApiClient, CartNotification, ControllerState};
use shared::domain::CartSession;

/// `images` resolves each entry's image location; the image itself is not fetched.
pub fn render_state(state: &ControllerState, images: &CartApiClient) -> String {
    match state {
        ControllerState::Uninitialized | ControllerState::Loading => "Loading...".to_string(),
        ControllerState::Empty => "No items in cart".to_string(),
        ControllerState::Populated(session) => render_session(session, images),
    }
}

fn render_session(session: &CartSession, images: &CartApiClient) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Cart {}", session.cart_id);
    if session.entries.is_empty() {
        let _ = writeln!(out, "  (no entries)");
    }
    for entry in &session.entries {
        let _ = writeln!(
            out,
            "  [{}] {:<24} x{:<4} {} each, line total {}",
            entry.product,
            entry.product_name,
            entry.quantity,
            entry.unit_price,
            entry.line_total()
        );
        if let Ok(url) = images.product_image_url(&entry.product) {
            let _ = writeln!(out, "      image: {url}");
        }
    }
    let _ = write!(out, "Total: {}", session.total_price);
    out
}

pub fn notification_message(notification: &CartNotification) -> String {
    match notification {
        CartNotification::QuantityChanged { .. } => "Cart updated successfully.".to_string(),
        CartNotification::QuantityChangeFailed { reason, .. } => {
            format!("An unexpected error occurred: {reason}")
        }
    }
}

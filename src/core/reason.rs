use crate::models::ServiceOffer;

/// Score assigned to every structurally compatible candidate
///
/// Compatibility is binary in this design: a candidate either passed the
/// domain filter or it did not, so all survivors score the same. The
/// score field stays in the interface so richer ranking can land without
/// breaking callers.
pub const FULL_COMPATIBILITY: u8 = 100;

/// Assemble the human-readable reason string from reputation signals
///
/// Concatenates whichever of rating, completed-service count and the
/// verified flag are present; falls back to a generic phrase when the
/// provider has no track record yet.
pub fn build_reason(offer: &ServiceOffer) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(rating) = offer.average_rating {
        if rating >= 0.0 {
            parts.push(format!("rated {:.1}/5", rating));
        }
    }

    if offer.times_completed > 0 {
        parts.push(format!("{} services completed", offer.times_completed));
    }

    if offer.owner_verified {
        parts.push("verified identity".to_string());
    }

    if parts.is_empty() {
        "Available provider".to_string()
    } else {
        parts.join(", ")
    }
}

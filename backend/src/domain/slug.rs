//! Ticket slug construction.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, and hyphens. A ticket slug ends with its lowercased
//! tracking number, so it is unique whenever the tracking number is.

use crate::domain::TrackingNumber;

/// Longest issue-derived prefix kept in a ticket slug.
pub const SLUG_PREFIX_MAX: usize = 48;

/// Build the slug for a ticket from its issue and tracking number.
///
/// # Examples
/// ```
/// use helpdesk::domain::{TicketType, TrackingNumber, ticket_slug};
///
/// let tracking = TrackingNumber::allocate(TicketType::InShop, 12).expect("in range");
/// assert_eq!(ticket_slug("Printer won't start!", &tracking), "printer-won-t-start-tkt0000012");
/// ```
pub fn ticket_slug(issue: &str, tracking_number: &TrackingNumber) -> String {
    let suffix = tracking_number.as_str().to_ascii_lowercase();
    let prefix = slugify(issue, SLUG_PREFIX_MAX);
    if prefix.is_empty() {
        suffix
    } else {
        format!("{prefix}-{suffix}")
    }
}

/// Collapse `value` into lowercase ASCII words joined by single hyphens,
/// truncated to at most `max` characters without a trailing hyphen.
pub(crate) fn slugify(value: &str, max: usize) -> String {
    let mut slug = String::with_capacity(value.len().min(max));
    let mut pending_hyphen = false;
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= max {
            break;
        }
    }
    slug.truncate(max);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

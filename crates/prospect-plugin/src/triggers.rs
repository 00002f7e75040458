//! Phrases that suggest the user is asking for prospects.

/// Matched case-insensitively anywhere in the message.
pub const TRIGGER_PHRASES: &[&str] = &[
    "find prospects",
    "search for companies",
    "businesses in",
    "companies in",
    "find businesses",
    "prospect",
    "leads",
];

/// Whether `message` looks like a prospect search request.
pub fn is_prospect_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRIGGER_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

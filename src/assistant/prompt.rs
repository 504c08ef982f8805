pub const WELCOME_MESSAGE: &str = "Welcome to our Home Services website! How can I assist you today?";

/// Translation input is kept well below the translator's 5000 character limit.
pub const MAX_TRANSLATION_CHARS: usize = 4500;

pub const SERVICE_CATEGORIES: [&str; 12] = [
    "Electrical",
    "Painting",
    "Plumbing",
    "Carpentry",
    "Cleaning",
    "Appliance Repair",
    "Pest Control",
    "AC Services",
    "CCTV",
    "Interior Design",
    "Gardening",
    "Home Automation",
];

/// The single instruction sent to the model, ending with the question verbatim.
pub fn build_prompt(question: &str) -> String {
    format!(
        "You are a help assistant for a home services website. \
         Give clear, short (2-3 lines), and simple answers in plain English. \
         Support services include {}.\n\nUser question: {}",
        SERVICE_CATEGORIES.join(", "),
        question
    )
}

/// Cut `text` to at most `max` characters, never splitting a UTF-8 sequence.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Keyword and heuristic intent classification for free text.
//!
//! Keyword sets are checked in [`PRIORITY`] order and the first set with a
//! match wins. A keyword matches as a whole word or phrase, never as a raw
//! substring, so "cartoon" is not a cart request and "hint" is not a greeting.

use serde::Serialize;
use strum_macros::{Display, EnumIter, EnumString};

/// Coarse category of a free-text message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    Reset,
    Cancel,
    Checkout,
    Cart,
    Menu,
    Help,
    Greeting,
    Search,
    Yes,
    No,
    FoodSearch,
    Quantity,
    Address,
    Unknown,
}

/// How a keyword set is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matching {
    /// Anywhere in the message, on word boundaries.
    Contains,
    /// Only when the whole message is the keyword.
    Whole,
}

struct KeywordSet {
    intent: Intent,
    matching: Matching,
    keywords: &'static [&'static str],
}

/// Keyword sets in priority order.
const PRIORITY: &[KeywordSet] = &[
    KeywordSet {
        intent: Intent::Reset,
        matching: Matching::Contains,
        keywords: &["reset", "start over", "restart", "clear all"],
    },
    KeywordSet {
        intent: Intent::Cancel,
        matching: Matching::Contains,
        keywords: &["cancel", "stop", "abort", "nevermind", "never mind"],
    },
    KeywordSet {
        intent: Intent::Checkout,
        matching: Matching::Contains,
        keywords: &["checkout", "check out", "place order", "pay now", "proceed"],
    },
    KeywordSet {
        intent: Intent::Cart,
        matching: Matching::Contains,
        keywords: &["cart", "my cart", "view cart", "basket"],
    },
    KeywordSet {
        intent: Intent::Menu,
        matching: Matching::Contains,
        keywords: &["menu", "browse", "browse menu", "categories", "category"],
    },
    KeywordSet {
        intent: Intent::Help,
        matching: Matching::Contains,
        keywords: &["help", "support", "commands"],
    },
    // Greetings and yes/no are whole-message answers; "hi, I want rice" is a search.
    KeywordSet {
        intent: Intent::Greeting,
        matching: Matching::Whole,
        keywords: &[
            "hi",
            "hello",
            "hey",
            "good morning",
            "good afternoon",
            "good evening",
            "start",
        ],
    },
    KeywordSet {
        intent: Intent::Search,
        matching: Matching::Contains,
        keywords: &["search", "find", "look for", "looking for"],
    },
    KeywordSet {
        intent: Intent::Yes,
        matching: Matching::Whole,
        keywords: &["yes", "yeah", "yep", "sure", "ok", "okay"],
    },
    KeywordSet {
        intent: Intent::No,
        matching: Matching::Whole,
        keywords: &["no", "nope", "nah"],
    },
];

const FOOD_TERMS: &[&str] = &[
    "rice", "jollof", "pizza", "burger", "chicken", "pasta", "spaghetti", "suya", "amala",
    "egusi", "soup", "shawarma", "beans", "plantain", "dodo", "fish", "beef", "goat", "yam",
    "noodles", "salad", "chips", "fries", "sandwich", "meat", "moi moi", "eba", "fufu",
    "pepper soup", "ofada", "drink", "juice", "smoothie", "cake", "snack",
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "you", "are", "what", "how", "who", "why", "when", "where", "please",
    "thanks", "thank you", "there", "this", "that", "with", "can", "want", "need", "food",
];

/// Phrases that report a payment, matched anywhere on word boundaries.
const PAYMENT_PHRASES: &[&str] = &["paid", "confirm payment"];

const MAX_QUANTITY_HINT: u32 = 10;
const ADDRESS_MIN_CHARS: usize = 16;
const SEARCH_MIN_CHARS: usize = 3;

/// Lowercases, turns punctuation into spaces and collapses whitespace.
fn tokenize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whole-word containment: `" {keyword} "` inside `" {text} "`.
fn contains_phrase(padded: &str, keyword: &str) -> bool {
    padded.contains(&format!(" {keyword} "))
}

fn keyword_intent(tokens: &str, strict: bool) -> Option<Intent> {
    let padded = format!(" {tokens} ");
    PRIORITY
        .iter()
        .find(|set| {
            set.keywords.iter().any(|keyword| {
                if strict || set.matching == Matching::Whole {
                    tokens == *keyword
                } else {
                    contains_phrase(&padded, keyword)
                }
            })
        })
        .map(|set| set.intent)
}

fn heuristic_intent(raw: &str, tokens: &str) -> Intent {
    let padded = format!(" {tokens} ");
    if FOOD_TERMS.iter().any(|term| contains_phrase(&padded, term)) {
        return Intent::FoodSearch;
    }

    if !tokens.is_empty() && tokens.chars().all(|c| c.is_ascii_digit()) {
        return match tokens.parse::<u32>() {
            Ok(n) if (1..=MAX_QUANTITY_HINT).contains(&n) => Intent::Quantity,
            _ => Intent::Unknown,
        };
    }

    let raw = raw.trim();
    if raw.chars().count() >= ADDRESS_MIN_CHARS
        && raw.contains(' ')
        && raw.chars().any(|c| c.is_ascii_digit() || c == ',')
    {
        return Intent::Address;
    }

    if tokens.chars().count() >= SEARCH_MIN_CHARS && !STOPWORDS.contains(&tokens) {
        return Intent::FoodSearch;
    }

    Intent::Unknown
}

/// Classifies free text. Keywords match on word boundaries anywhere in the text.
pub fn classify(text: &str) -> Intent {
    let tokens = tokenize(text);
    keyword_intent(&tokens, false).unwrap_or_else(|| heuristic_intent(text, &tokens))
}

/// Classifies text typed where free-form input is expected (a delivery
/// address): keywords only count when they are the whole message.
pub fn classify_strict(text: &str) -> Intent {
    let tokens = tokenize(text);
    keyword_intent(&tokens, true).unwrap_or_else(|| heuristic_intent(text, &tokens))
}

/// True when the message says the customer paid or asks to confirm the
/// payment: "I have paid now", "please confirm payment".
pub fn mentions_payment(text: &str) -> bool {
    let padded = format!(" {} ", tokenize(text));
    PAYMENT_PHRASES
        .iter()
        .any(|phrase| contains_phrase(&padded, phrase))
}

/// The search terms in a message, without a leading "search"/"find" verb.
///
/// `"find jollof rice"` → `"jollof rice"`. Returns the trimmed text when no
/// verb leads it.
pub fn search_terms(text: &str) -> String {
    let tokens = tokenize(text);
    let verbs = PRIORITY
        .iter()
        .find(|set| set.intent == Intent::Search)
        .map(|set| set.keywords)
        .unwrap_or(&[]);

    for verb in verbs {
        if let Some(rest) = tokens.strip_prefix(verb) {
            if rest.is_empty() || rest.starts_with(' ') {
                return rest.trim().to_string();
            }
        }
    }
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_sets() {
        assert_eq!(classify("Reset"), Intent::Reset);
        assert_eq!(classify("please start over"), Intent::Reset);
        assert_eq!(classify("cancel"), Intent::Cancel);
        assert_eq!(classify("I want to checkout"), Intent::Checkout);
        assert_eq!(classify("view cart"), Intent::Cart);
        assert_eq!(classify("show me the menu"), Intent::Menu);
        assert_eq!(classify("help!"), Intent::Help);
        assert_eq!(classify("Good morning"), Intent::Greeting);
        assert_eq!(classify("yes"), Intent::Yes);
        assert_eq!(classify("nope"), Intent::No);
    }

    #[test]
    fn test_priority_is_explicit() {
        // "cancel" beats "checkout", "reset" beats everything
        assert_eq!(classify("cancel checkout"), Intent::Cancel);
        assert_eq!(classify("reset my cart"), Intent::Reset);
        assert_eq!(classify("checkout my cart"), Intent::Checkout);
    }

    #[test]
    fn test_whole_word_matching() {
        assert_ne!(classify("cartoon cake"), Intent::Cart);
        assert_ne!(classify("this is a hint"), Intent::Greeting);
        assert_eq!(classify("stopwatch"), Intent::FoodSearch);
    }

    #[test]
    fn test_greeting_needs_whole_message() {
        assert_eq!(classify("hi"), Intent::Greeting);
        assert_eq!(classify("hi, I want jollof rice"), Intent::FoodSearch);
    }

    #[test]
    fn test_heuristics() {
        assert_eq!(classify("jollof rice"), Intent::FoodSearch);
        assert_eq!(classify("3"), Intent::Quantity);
        assert_eq!(classify("10"), Intent::Quantity);
        assert_eq!(classify("11"), Intent::Unknown);
        assert_eq!(classify("0"), Intent::Unknown);
        assert_eq!(classify("12 Allen Avenue, Ikeja"), Intent::Address);
        assert_eq!(classify("amala"), Intent::FoodSearch);
        assert_eq!(classify("xyz"), Intent::FoodSearch);
        assert_eq!(classify("ab"), Intent::Unknown);
        assert_eq!(classify("thanks"), Intent::Unknown);
    }

    #[test]
    fn test_strict_mode_ignores_embedded_keywords() {
        assert_eq!(classify("12 Cart Road, Lekki"), Intent::Cart);
        assert_eq!(classify_strict("12 Cart Road, Lekki"), Intent::Address);
        assert_eq!(classify_strict("cancel"), Intent::Cancel);
        assert_eq!(classify_strict("Cancel."), Intent::Cancel);
    }

    #[test]
    fn test_payment_mentions() {
        assert!(mentions_payment("I have paid now"));
        assert!(mentions_payment("Paid!"));
        assert!(mentions_payment("i've paid, thanks"));
        assert!(mentions_payment("Please CONFIRM PAYMENT"));
        assert!(!mentions_payment("unpaid"));
        assert!(!mentions_payment("payment link please"));
        assert!(!mentions_payment("confirm"));
    }

    #[test]
    fn test_search_terms_strip_leading_verb() {
        assert_eq!(search_terms("find jollof rice"), "jollof rice");
        assert_eq!(search_terms("looking for suya"), "suya");
        assert_eq!(search_terms("search"), "");
        assert_eq!(search_terms("  Fried Rice "), "Fried Rice");
        assert_eq!(search_terms("findings"), "findings");
    }
}

//! Fixed word tables used by the atomizer.

/// Tokens dropped before keyword extraction.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "can't", "cannot", "could", "couldn't", "did", "didn't", "do",
    "does", "doesn't", "doing", "don't", "down", "during", "each", "even", "ever", "every", "few",
    "for", "from", "further", "get", "got", "had", "hadn't", "has", "hasn't", "have", "haven't",
    "having", "he", "he'd", "he'll", "he's", "her", "here", "here's", "hers", "herself", "him",
    "himself", "his", "how", "how's", "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into", "is",
    "isn't", "it", "it's", "its", "itself", "just", "let's", "like", "me", "more", "most",
    "mustn't", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "really", "same", "shan't",
    "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such", "than", "that",
    "that's", "the", "their", "theirs", "them", "themselves", "then", "there", "there's", "these",
    "they", "they'd", "they'll", "they're", "they've", "this", "those", "through", "to", "too",
    "today", "under", "until", "up", "us", "very", "was", "wasn't", "we", "we'd", "we'll",
    "we're", "we've", "were", "weren't", "what", "what's", "when", "when's", "where", "where's",
    "which", "while", "who", "who's", "whom", "why", "why's", "will", "with", "won't", "would",
    "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours", "yourself",
    "yourselves", "went", "feel", "felt", "feeling", "lot", "much", "still", "yet",
];

/// Capitalized words that are never treated as names.
pub const ENTITY_EXCLUSIONS: &[&str] = &[
    // weekdays
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    // months
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
    // sentence starters and pronouns that sneak in after quotes or colons
    "i", "i'm", "i've", "i'd", "i'll", "the", "a", "an", "and", "but", "so", "then", "today",
    "tomorrow", "yesterday", "tonight", "this", "that", "it", "we", "my", "our", "he", "she",
    "they", "maybe", "also", "still", "just", "after", "before", "when", "while", "what", "why",
    "how", "hey", "ok", "okay", "god", "christmas", "easter",
    // brands
    "google", "apple", "amazon", "netflix", "spotify", "facebook", "instagram", "twitter",
    "youtube", "tiktok", "uber", "starbucks", "microsoft", "iphone", "whatsapp", "zoom",
    "slack", "linkedin",
];

/// Words that precede a place name.
pub const LOCATION_CUES: &[&str] = &["in", "to", "from", "visited", "near"];

/// Capitalized tokens that turn the preceding name into an organization.
pub const ORGANIZATION_SUFFIXES: &[&str] = &[
    "inc", "corp", "ltd", "llc", "university", "college", "company",
];

/// Per-token polarity weights summed into the lexicon score.
pub const SENTIMENT_LEXICON: &[(&str, f64)] = &[
    ("amazing", 3.0),
    ("awesome", 3.0),
    ("excited", 3.0),
    ("thrilled", 3.0),
    ("love", 3.0),
    ("loved", 3.0),
    ("wonderful", 3.0),
    ("fantastic", 3.0),
    ("joy", 3.0),
    ("happy", 2.0),
    ("great", 2.0),
    ("grateful", 2.0),
    ("proud", 2.0),
    ("fun", 2.0),
    ("beautiful", 2.0),
    ("glad", 2.0),
    ("delighted", 2.0),
    ("good", 1.0),
    ("nice", 1.0),
    ("calm", 1.0),
    ("relaxed", 1.0),
    ("peaceful", 1.0),
    ("hopeful", 1.0),
    ("enjoyed", 1.0),
    ("productive", 1.0),
    ("okay", 0.5),
    ("fine", 0.5),
    ("bored", -1.0),
    ("meh", -1.0),
    ("sleepy", -1.0),
    ("tired", -2.0),
    ("stress", -2.0),
    ("stressed", -2.0),
    ("anxious", -2.0),
    ("worried", -2.0),
    ("bad", -2.0),
    ("drained", -2.0),
    ("exhausted", -3.0),
    ("sad", -3.0),
    ("lonely", -3.0),
    ("upset", -3.0),
    ("hurt", -3.0),
    ("cry", -3.0),
    ("cried", -3.0),
    ("awful", -3.0),
    ("terrible", -3.0),
    ("frustrated", -3.0),
    ("depressed", -4.0),
    ("miserable", -4.0),
    ("angry", -4.0),
    ("hate", -4.0),
    ("hated", -4.0),
    ("furious", -5.0),
    ("rage", -5.0),
];

/// Divisor that maps the summed lexicon score onto `[-1, 1]` before clamping.
pub const SENTIMENT_NORMALIZER: f64 = 5.0;

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

pub fn is_entity_exclusion(lower: &str) -> bool {
    ENTITY_EXCLUSIONS.contains(&lower)
}

pub fn polarity(token: &str) -> f64 {
    SENTIMENT_LEXICON
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, weight)| *weight)
        .unwrap_or(0.0)
}

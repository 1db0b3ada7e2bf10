//! Text normalization shared by indexing, scoring and highlighting.
//!
//! [`words`] lowercases, splits on non-word characters and drops short
//! tokens and stop words. [`tokenize`] additionally applies a suffix
//! stemmer so that "learning" and "learned" meet at "learn".

/// Tokens at or below this many characters are discarded.
const MIN_TOKEN_CHARS: usize = 3;

/// A stem must keep at least this many characters after stripping.
const MIN_STEM_CHARS: usize = 3;

/// English and Portuguese function words.
const STOP_WORDS: &[&str] = &[
    // English
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can",
    "had", "her", "was", "one", "our", "out", "has", "have", "his", "how",
    "its", "may", "new", "now", "see", "who", "did", "get", "him", "she",
    "too", "use", "that", "with", "this", "from", "they", "been", "were",
    "will", "would", "there", "their", "what", "which", "when", "where",
    "into", "than", "then", "them", "these", "those", "about", "also",
    "some", "such", "only", "over", "very", "just", "your", "more", "most",
    "other", "should", "could", "each", "being", "does", "doing",
    // Portuguese
    "que", "com", "uma", "para", "por", "mais", "como", "mas", "foi",
    "ele", "ela", "das", "dos", "nas", "nos", "seu", "sua", "seus",
    "suas", "isso", "este", "esta", "esse", "essa", "aos", "pelo",
    "pela", "quando", "muito", "sem", "entre", "depois", "ser", "tem",
    "são", "está", "também", "até", "onde", "mesmo", "qual", "sobre",
];

/// Suffixes removed by the stemmer, longest first so the most specific
/// rule wins.
const SUFFIXES: &[&str] = &[
    "mente", "ções", "ness", "ment", "tion", "sion", "ção", "são", "ing",
    "ed", "ly",
];

/// Lowercase `text` and split it on non-word characters, keeping every
/// non-empty piece.
pub fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// [`split_words`] without short tokens and stop words. Order and
/// duplicates are preserved.
pub fn words(text: &str) -> Vec<String> {
    split_words(text)
        .into_iter()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !is_stop_word(token))
        .collect()
}

/// Normalize `text` into index terms: [`words`] followed by [`stem`].
///
/// # Examples
///
/// ```
/// use notesearch::tokenizer::tokenize;
///
/// assert_eq!(
///     tokenize("The Machine is Learning!"),
///     vec!["machine".to_string(), "learn".to_string()]
/// );
/// assert!(tokenize("").is_empty());
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    words(text).into_iter().map(|w| stem(&w)).collect()
}

/// Strip the first known suffix, provided a usable stem remains.
pub fn stem(word: &str) -> String {
    for suffix in SUFFIXES {
        if let Some(base) = word.strip_suffix(suffix)
            && base.chars().count() >= MIN_STEM_CHARS
        {
            return base.to_string();
        }
    }
    word.to_string()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

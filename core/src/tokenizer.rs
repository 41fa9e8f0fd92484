use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use deunicode::deunicode;
use std::collections::HashSet;

/// Turns free text into the normalized terms the index is keyed by.
///
/// Implementations must be deterministic and must not depend on per-call
/// external state.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Splits text that was normalized ahead of time (the `*_clean` catalog fields).
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Query-side normalization matching how the catalog text was prepared:
/// ASCII folding, lowercase, URL and digit removal, stopwords, English stemming.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl Tokenizer for TextNormalizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        normalize_tokens(text)
    }
}

lazy_static! {
    static ref URL_RE: Regex = Regex::new(r"https?://\S+").expect("valid regex");
    static ref WORD_RE: Regex = Regex::new(r"[a-z]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","ain","all","am","an","and","any","are","aren","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","couldn","couldn't",
            "d","did","didn","didn't","do","does","doesn","doesn't","doing","don","don't","down","during",
            "each","few","for","from","further",
            "had","hadn","hadn't","has","hasn","hasn't","have","haven","haven't","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","isn","isn't","it","it's","its","itself",
            "just","ll","m","ma","me","mightn","mightn't","more","most","mustn","mustn't","my","myself",
            "needn","needn't","no","nor","not","now",
            "o","of","off","on","once","only","or","other","our","ours","ourselves","out","over","own",
            "re","s","same","shan","shan't","she","she's","should","should've","shouldn","shouldn't","so","some","such",
            "t","than","that","that'll","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","ve","very",
            "was","wasn","wasn't","we","were","weren","weren't","what","when","where","which","while","who","whom","why","will","with","won","won't","wouldn","wouldn't",
            "y","you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Fold to lowercase ASCII letters: lowercase, transliterate to ASCII
/// (`ß` -> `ss`, `æ` -> `ae`), strip URLs, then keep only `a-z` runs.
/// Separators, digits and punctuation all become word boundaries.
pub fn fold_text(text: &str) -> String {
    let transliterated = deunicode(&text.to_lowercase());
    let folded = URL_RE.replace_all(&transliterated, " ");
    WORD_RE
        .find_iter(&folded)
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenize free text into stemmed terms with stopwords removed.
pub fn normalize_tokens(text: &str) -> Vec<String> {
    let folded = fold_text(text);
    folded
        .split(' ')
        .filter(|t| !t.is_empty() && !is_stopword(t))
        .map(|t| STEMMER.stem(t).to_string())
        .collect()
}

use shopsearch_core::tokenizer::{normalize_tokens, TextNormalizer, Tokenizer};

#[test]
fn it_normalizes_and_stems() {
    let words = normalize_tokens("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // Accent folding: café -> cafe
    assert!(words.contains(&"cafe".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = normalize_tokens("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"fox".to_string()));
}

#[test]
fn it_drops_digits_and_urls() {
    let words = normalize_tokens("Pack of 3 socks https://shop.example/item?id=42");
    assert_eq!(words, vec!["pack".to_string(), "sock".to_string()]);
}

#[test]
fn it_is_empty_for_noise() {
    assert!(TextNormalizer.tokenize("  123 -- !!  the ").is_empty());
}

#[test]
fn it_is_deterministic() {
    let text = "Women's Solid Slim-Fit Denim Jeans";
    assert_eq!(normalize_tokens(text), normalize_tokens(text));
}

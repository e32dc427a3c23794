// ============================================================
// Layer 4 — Corpus Normaliser
// ============================================================
// Turns raw scraped tokens into clean vocabulary tokens.
//
// Rules, applied to every raw token:
//   1. Put a space on both sides of . , ) ( ? !
//   2. Lowercase
//   3. Re-split on whitespace and drop empty pieces
//
// So "Hi." becomes "hi ." and then the two tokens ["hi", "."].
// Order is preserved and nothing but whitespace is discarded.
// Running the normaliser on its own output changes nothing.

use crate::domain::post::Post;

/// Punctuation that always becomes a token of its own.
const SPLIT_CHARS: [char; 6] = ['.', ',', ')', '(', '?', '!'];

pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalise a sequence of raw tokens into clean tokens.
    pub fn normalize<S: AsRef<str>>(&self, raw_tokens: &[S]) -> Vec<String> {
        let mut spaced = String::new();

        for raw in raw_tokens {
            for c in raw.as_ref().chars() {
                if SPLIT_CHARS.contains(&c) {
                    spaced.push(' ');
                    spaced.push(c);
                    spaced.push(' ');
                } else {
                    spaced.extend(c.to_lowercase());
                }
            }
            // Raw tokens never merge with their neighbours
            spaced.push(' ');
        }

        spaced.split_whitespace().map(str::to_string).collect()
    }

    /// Normalise free text such as a seed query.
    pub fn normalize_text(&self, text: &str) -> Vec<String> {
        let raw: Vec<&str> = text.split_whitespace().collect();
        self.normalize(&raw)
    }

    /// Normalise both the title and the body of a post. The id is kept.
    pub fn normalize_post(&self, post: &Post) -> Post {
        Post::new(post.id, self.normalize(&post.title), self.normalize(&post.body))
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

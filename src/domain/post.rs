// ============================================================
// Layer 3 — Post Domain Type
// ============================================================
// A Post is one scraped social-media post split into tokens.
// Posts are produced once (by the scraper or the normaliser)
// and never mutated afterwards.

use serde::{Deserialize, Serialize};

/// One post: an id plus its title and body as token sequences.
///
/// Field order matters for the binary corpus file, which stores
/// records as `(id, title_tokens, body_tokens)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id:    u64,
    pub title: Vec<String>,
    pub body:  Vec<String>,
}

impl Post {
    pub fn new(id: u64, title: Vec<String>, body: Vec<String>) -> Self {
        Self { id, title, body }
    }

    /// Build a post from untokenised text the way the scraper does:
    /// newlines are removed and the text is split on single spaces.
    /// Empty pieces are kept here; the normaliser drops them later.
    pub fn from_raw(id: u64, raw: &RawPost) -> Self {
        Self {
            id,
            title: split_raw(&raw.title),
            body:  split_raw(&raw.body),
        }
    }
}

fn split_raw(text: &str) -> Vec<String> {
    text.replace('\n', "")
        .split(' ')
        .map(str::to_string)
        .collect()
}

/// Scraper output before tokenisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPost {
    pub title: String,
    pub body:  String,
}

/// The full set of posts a run trains on, in file order.
pub type Corpus = Vec<Post>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_strips_newlines_and_splits_on_spaces() {
        let raw = RawPost {
            title: "hello\nworld".to_string(),
            body:  "a  b".to_string(),
        };
        let post = Post::from_raw(7, &raw);
        assert_eq!(post.id, 7);
        assert_eq!(post.title, vec!["helloworld"]);
        // Double space yields an empty piece, left for the normaliser
        assert_eq!(post.body, vec!["a", "", "b"]);
    }
}

// ============================================================
// Layer 4 — Vocabulary Indexer
// ============================================================
// Builds the bijection token <-> id from a normalised corpus,
// and flattens the corpus into one stream of ids.
//
// Both are pure builders: they take the corpus by reference and
// return new immutable values. The vocabulary is frozen once built,
// and its size V fixes the width of the model's embedding table
// and output projection.
//
// Ids are dense in 0..V. They come from enumerating the token set
// in sorted order, so rebuilding from the same corpus gives the
// same ids. Nothing outside this module should rely on that.

use std::collections::{BTreeSet, HashMap};

use crate::domain::error::LmError;
use crate::domain::post::Post;

#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    token_to_id: HashMap<String, usize>,
    id_to_token: Vec<String>,
}

impl Vocabulary {
    /// Build the vocabulary from every title and body token in `corpus`.
    pub fn build(corpus: &[Post]) -> Self {
        let unique: BTreeSet<&str> = corpus
            .iter()
            .flat_map(|p| p.title.iter().chain(p.body.iter()))
            .map(String::as_str)
            .collect();

        let id_to_token: Vec<String> = unique.into_iter().map(str::to_string).collect();
        let token_to_id = index_tokens(&id_to_token);

        tracing::debug!("Built vocabulary of {} tokens", id_to_token.len());
        Self { token_to_id, id_to_token }
    }

    /// Rebuild a vocabulary from its id-ordered token list.
    /// Returns `None` if a token appears twice.
    pub fn from_tokens(id_to_token: Vec<String>) -> Option<Self> {
        let token_to_id = index_tokens(&id_to_token);
        (token_to_id.len() == id_to_token.len()).then_some(Self { token_to_id, id_to_token })
    }

    /// Tokens ordered by id.
    pub fn tokens(&self) -> &[String] {
        &self.id_to_token
    }

    /// Vocabulary size V.
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    pub fn id(&self, token: &str) -> Result<usize, LmError> {
        self.token_to_id
            .get(token)
            .copied()
            .ok_or_else(|| LmError::UnknownToken(token.to_string()))
    }

    pub fn token(&self, id: usize) -> Result<&str, LmError> {
        self.id_to_token
            .get(id)
            .map(String::as_str)
            .ok_or(LmError::IndexOutOfBounds { index: id, len: self.len() })
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>, LmError> {
        tokens.iter().map(|t| self.id(t.as_ref())).collect()
    }

    #[cfg(test)]
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<String>, LmError> {
        ids.iter().map(|&i| self.token(i).map(str::to_string)).collect()
    }
}

fn index_tokens(id_to_token: &[String]) -> HashMap<String, usize> {
    id_to_token
        .iter()
        .enumerate()
        .map(|(id, token)| (token.clone(), id))
        .collect()
}

/// Which parts of each post feed the training stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamSource {
    /// Bodies only, concatenated in corpus order.
    #[default]
    Body,
    /// Each post's title followed by its body.
    TitleAndBody,
}

/// The whole corpus flattened into one ordered sequence of ids.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedStream {
    ids: Vec<usize>,
}

impl IndexedStream {
    pub fn build(
        corpus: &[Post],
        vocab:  &Vocabulary,
        source: StreamSource,
    ) -> Result<Self, LmError> {
        let mut ids = Vec::new();

        for post in corpus {
            if source == StreamSource::TitleAndBody {
                ids.extend(vocab.encode(&post.title)?);
            }
            ids.extend(vocab.encode(&post.body)?);
        }

        Ok(Self { ids })
    }

    #[cfg(test)]
    pub fn from_ids(ids: Vec<usize>) -> Self {
        Self { ids }
    }

    pub fn ids(&self) -> &[usize] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, title: &[&str], body: &[&str]) -> Post {
        Post::new(
            id,
            title.iter().map(|s| s.to_string()).collect(),
            body.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn two_posts() -> Vec<Post> {
        vec![post(0, &[], &["hi", "there"]), post(1, &[], &["hi", "friend"])]
    }

    #[test]
    fn test_vocabulary_of_two_posts() {
        let vocab = Vocabulary::build(&two_posts());
        assert_eq!(vocab.len(), 3);
        for w in ["hi", "there", "friend"] {
            assert!(vocab.id(w).is_ok());
        }
    }

    #[test]
    fn test_vocabulary_is_a_bijection() {
        let corpus = vec![
            post(0, &["a", "title"], &["some", "body", "a"]),
            post(1, &["other"], &["body", "words", "?"]),
        ];
        let vocab = Vocabulary::build(&corpus);

        assert_eq!(vocab.token_to_id.len(), vocab.len());
        for w in vocab.tokens() {
            let id = vocab.id(w).unwrap();
            assert!(id < vocab.len());
            assert_eq!(vocab.token(id).unwrap(), w);
        }
    }

    #[test]
    fn test_titles_contribute_to_vocabulary() {
        let vocab = Vocabulary::build(&[post(0, &["only_in_title"], &["x"])]);
        assert!(vocab.id("only_in_title").is_ok());
    }

    #[test]
    fn test_unknown_token() {
        let vocab = Vocabulary::build(&two_posts());
        assert_eq!(vocab.id("nope"), Err(LmError::UnknownToken("nope".to_string())));
    }

    #[test]
    fn test_decode_out_of_range() {
        let vocab = Vocabulary::build(&two_posts());
        assert_eq!(
            vocab.decode(&[0, 3]),
            Err(LmError::IndexOutOfBounds { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_rebuild_is_identical() {
        assert_eq!(Vocabulary::build(&two_posts()), Vocabulary::build(&two_posts()));
    }

    #[test]
    fn test_from_tokens_round_trip_and_rejects_duplicates() {
        let vocab   = Vocabulary::build(&two_posts());
        let rebuilt = Vocabulary::from_tokens(vocab.tokens().to_vec()).unwrap();
        assert_eq!(rebuilt, vocab);

        let dup = vec!["a".to_string(), "a".to_string()];
        assert!(Vocabulary::from_tokens(dup).is_none());
    }

    #[test]
    fn test_stream_length_is_sum_of_bodies() {
        let corpus = vec![
            post(0, &["t1", "t2"], &["a", "b", "c"]),
            post(1, &["t3"], &[]),
            post(2, &[], &["c", "a"]),
        ];
        let vocab  = Vocabulary::build(&corpus);
        let stream = IndexedStream::build(&corpus, &vocab, StreamSource::Body).unwrap();
        let expected: usize = corpus.iter().map(|p| p.body.len()).sum();
        assert_eq!(stream.len(), expected);
    }

    #[test]
    fn test_stream_of_two_posts() {
        let corpus = two_posts();
        let vocab  = Vocabulary::build(&corpus);
        let stream = IndexedStream::build(&corpus, &vocab, StreamSource::Body).unwrap();
        assert_eq!(
            vocab.decode(stream.ids()).unwrap(),
            vec!["hi", "there", "hi", "friend"]
        );
    }

    #[test]
    fn test_stream_with_titles_puts_title_first() {
        let corpus = vec![post(0, &["head"], &["body"]), post(1, &["top"], &["tail"])];
        let vocab  = Vocabulary::build(&corpus);
        let stream = IndexedStream::build(&corpus, &vocab, StreamSource::TitleAndBody).unwrap();
        assert_eq!(
            vocab.decode(stream.ids()).unwrap(),
            vec!["head", "body", "top", "tail"]
        );
    }
}

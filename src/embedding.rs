//! Semantic search over stored capabilities
//!
//! The embedding itself is an external concern: anything that can turn a
//! description string into a vector works. The registry only ranks stored
//! records by cosine similarity against the embedded query. When no
//! provider is configured, search degrades to fuzzy matching on id, name,
//! and description so the CLI stays usable offline.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::error::Result;
use crate::store::CapabilityRecord;

/// Black-box text → vector function
pub trait EmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Cosine similarity of two vectors. Mismatched dimensions or a zero norm
/// yield `0.0` rather than an error; a record with a stale embedding simply
/// ranks last.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        dot / denominator
    }
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub score: f32,
}

/// Rank records against a query, best first.
///
/// With a provider, records lacking an embedding are skipped. Without one,
/// the fuzzy fallback matches the query against id, name, and description
/// and keeps the best of the three scores.
pub fn search(
    records: &[CapabilityRecord],
    query: &str,
    provider: Option<&dyn EmbeddingProvider>,
    limit: usize,
) -> Result<Vec<SearchHit>> {
    let mut hits = match provider {
        Some(provider) => {
            let query_vector = provider.embed(query)?;
            records
                .iter()
                .filter_map(|record| {
                    let embedding = record.embedding.as_ref()?;
                    Some(hit(record, cosine_similarity(&query_vector, embedding)))
                })
                .collect::<Vec<_>>()
        }
        None => {
            let matcher = SkimMatcherV2::default();
            records
                .iter()
                .filter_map(|record| {
                    let score = [&record.id, &record.name, &record.description]
                        .iter()
                        .filter_map(|field| matcher.fuzzy_match(field, query))
                        .max()?;
                    Some(hit(record, score as f32))
                })
                .collect()
        }
    };

    hits.sort_by(|a, b| b.score.total_cmp(&a.score));
    hits.truncate(limit);
    Ok(hits)
}

fn hit(record: &CapabilityRecord, score: f32) -> SearchHit {
    SearchHit {
        id: record.id.clone(),
        name: record.name.clone(),
        description: record.description.clone(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability;
    use crate::store::{CapabilityStore, MemoryStore};
    use crate::version::FormatVersion;
    use serde_json::json;

    /// Deterministic stand-in provider: projects text onto letter buckets
    struct StubProvider;

    impl EmbeddingProvider for StubProvider {
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut v = vec![0.0f32; 8];
            for (i, b) in text.bytes().enumerate() {
                v[i % 8] += (b as f32) / 255.0;
            }
            Ok(v)
        }
    }

    fn record(id: &str, description: &str, embedding: Option<Vec<f32>>) -> CapabilityRecord {
        let raw = json!({"id": id, "description": description});
        let wrapper = capability::normalize(&raw, None).unwrap();
        let mut store = MemoryStore::new();
        store
            .store(&wrapper, &raw.to_string(), &FormatVersion::baseline(), embedding)
            .unwrap();
        store.get_record(id).unwrap().unwrap()
    }

    #[test]
    fn test_cosine_similarity_basics() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        // dimension mismatch and zero vectors are not errors
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_embedding_search_ranks_identical_text_first() {
        let provider = StubProvider;
        let records = vec![
            record("a", "resize images", Some(provider.embed("resize images").unwrap())),
            record("b", "send email", Some(provider.embed("send email").unwrap())),
            record("c", "no embedding", None),
        ];
        let hits = search(&records, "resize images", Some(&provider), 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_fuzzy_fallback_without_provider() {
        let records = vec![
            record("image-resize", "resize images to a target size", None),
            record("send-email", "deliver email", None),
        ];
        let hits = search(&records, "resize", None, 10).unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].id, "image-resize");
    }

    #[test]
    fn test_limit_truncates() {
        let records: Vec<_> = (0..5)
            .map(|i| record(&format!("cap-{i}"), "capability", None))
            .collect();
        let hits = search(&records, "cap", None, 2).unwrap();
        assert_eq!(hits.len(), 2);
    }
}

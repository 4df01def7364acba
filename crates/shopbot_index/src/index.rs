use crate::corpus::PromptEntry;
use crate::error::IndexError;

pub type Embedding = Vec<f32>;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry: PromptEntry,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
    /// Position of the entry in the corpus.
    pub position: usize,
}

/// Read-only exact-search index over corpus embeddings.
///
/// Vectors are L2-normalised on construction so a dot product is the cosine
/// similarity. Nothing can be added or removed after [`VectorIndex::new`].
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<PromptEntry>,
    vectors: Vec<Embedding>,
    dimensions: usize,
}

impl VectorIndex {
    pub fn new(entries: Vec<PromptEntry>, vectors: Vec<Embedding>) -> Result<Self, IndexError> {
        if entries.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }
        if vectors.len() != entries.len() {
            return Err(IndexError::CountMismatch {
                expected: entries.len(),
                actual: vectors.len(),
            });
        }
        let dimensions = vectors[0].len();
        if dimensions == 0 {
            return Err(IndexError::EmptyEmbedding);
        }
        let mut normalized = Vec::with_capacity(vectors.len());
        for mut vector in vectors {
            if vector.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    actual: vector.len(),
                });
            }
            normalize(&mut vector);
            normalized.push(vector);
        }
        tracing::info!(entries = entries.len(), dimensions, "built vector index");
        Ok(Self {
            entries,
            vectors: normalized,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PromptEntry] {
        &self.entries
    }

    /// Return at most `k` entries, highest similarity first. Equal scores keep
    /// corpus order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredEntry>, IndexError> {
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }
        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, dot(&query, v)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(position, score)| ScoredEntry {
                entry: self.entries[position].clone(),
                score,
                position,
            })
            .collect())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

// Zero vectors are left as-is and score 0 against everything.
fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

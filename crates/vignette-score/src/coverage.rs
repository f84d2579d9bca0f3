//! Set-coverage scoring
//!
//! Rows are extracted sentences, columns are ground-truth facts. A fact is
//! covered when its best row similarity exceeds the threshold; the score is
//! the covered fraction. Extra rows never lower the score and one row may
//! cover several columns.

use crate::embed::{normalize, Embedder};
use crate::error::EmbedError;

/// Pairwise cosine similarities, row-major, clamped to `[-1, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Build from unit vectors
    ///
    /// # Errors
    /// `EmbedError::Dimension` when vectors differ in length.
    pub fn from_unit_vectors(rows: &[Vec<f32>], cols: &[Vec<f32>]) -> Result<Self, EmbedError> {
        let dim = rows.first().or_else(|| cols.first()).map_or(0, Vec::len);
        if let Some(bad) = rows.iter().chain(cols).find(|v| v.len() != dim) {
            return Err(EmbedError::Dimension {
                expected: dim,
                got: bad.len(),
            });
        }
        let mut values = Vec::with_capacity(rows.len() * cols.len());
        for row in rows {
            for col in cols {
                let dot: f32 = row.iter().zip(col).map(|(a, b)| a * b).sum();
                values.push(dot.clamp(-1.0, 1.0));
            }
        }
        Ok(Self {
            rows: rows.len(),
            cols: cols.len(),
            values,
        })
    }

    /// Build directly from similarity values, row-major
    ///
    /// Values are clamped; returns `None` when the length is not `rows * cols`.
    #[must_use]
    pub fn from_values(rows: usize, cols: usize, values: Vec<f32>) -> Option<Self> {
        if values.len() != rows * cols {
            return None;
        }
        Some(Self {
            rows,
            cols,
            values: values.into_iter().map(|v| v.clamp(-1.0, 1.0)).collect(),
        })
    }

    /// Similarity of row `r` to column `c`
    #[must_use]
    pub fn get(&self, r: usize, c: usize) -> Option<f32> {
        (r < self.rows && c < self.cols).then(|| self.values[r * self.cols + c])
    }

    /// Best similarity per column; `None` for every column when there are no rows
    #[must_use]
    pub fn column_max(&self) -> Vec<Option<f32>> {
        (0..self.cols)
            .map(|c| {
                (0..self.rows)
                    .map(|r| self.values[r * self.cols + c])
                    .fold(None, |best: Option<f32>, v| Some(best.map_or(v, |b| b.max(v))))
            })
            .collect()
    }

    /// Fraction of columns whose best similarity is strictly above `threshold`
    ///
    /// Zero columns score 0.0.
    #[must_use]
    pub fn coverage(&self, threshold: f32) -> f32 {
        if self.cols == 0 {
            return 0.0;
        }
        let covered = self
            .column_max()
            .into_iter()
            .filter(|best| best.is_some_and(|v| v > threshold))
            .count();
        covered as f32 / self.cols as f32
    }
}

/// Coverage scorer over an embedding backend
pub struct CoverageScorer<'a> {
    embedder: &'a dyn Embedder,
    threshold: f32,
}

impl std::fmt::Debug for CoverageScorer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoverageScorer")
            .field("embedder", &self.embedder.name())
            .field("threshold", &self.threshold)
            .finish()
    }
}

impl<'a> CoverageScorer<'a> {
    /// Create scorer
    #[must_use]
    pub fn new(embedder: &'a dyn Embedder, threshold: f32) -> Self {
        Self {
            embedder,
            threshold,
        }
    }

    /// Similarity threshold
    #[inline]
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Similarity matrix between outputs (rows) and truths (columns)
    ///
    /// Both sets are embedded in one batch and normalised.
    ///
    /// # Errors
    /// Backend failures or inconsistent dimensions.
    pub fn matrix(&self, outputs: &[String], truths: &[String]) -> Result<SimilarityMatrix, EmbedError> {
        if outputs.is_empty() || truths.is_empty() {
            return Ok(SimilarityMatrix {
                rows: outputs.len(),
                cols: truths.len(),
                values: Vec::new(),
            });
        }
        let texts: Vec<String> = outputs.iter().chain(truths).cloned().collect();
        let mut vectors = self.embedder.embed_batch(&texts)?;
        if vectors.len() != texts.len() {
            return Err(EmbedError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        for v in &mut vectors {
            normalize(v);
        }
        let cols = vectors.split_off(outputs.len());
        SimilarityMatrix::from_unit_vectors(&vectors, &cols)
    }

    /// Covered fraction of `truths`
    ///
    /// Empty `outputs` or empty `truths` score 0.0 without calling the backend.
    ///
    /// # Errors
    /// Backend failures or inconsistent dimensions.
    pub fn score(&self, outputs: &[String], truths: &[String]) -> Result<f32, EmbedError> {
        if outputs.is_empty() || truths.is_empty() {
            return Ok(0.0);
        }
        Ok(self.matrix(outputs, truths)?.coverage(self.threshold))
    }
}

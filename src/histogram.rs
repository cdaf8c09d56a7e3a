//! Label frequency histogram over persisted result rows.
//!
//! Rows are re-tokenized on the comma separator. By default every token is
//! counted, including the single empty token a zero-label row produces, so
//! that the counts always sum to the number of tokens seen.

use std::collections::BTreeMap;

use crate::types::ResultRow;

/// Tokenization options for [`build_histogram_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramOptions {
    /// Drop empty tokens (zero-label rows, stray separators).
    pub skip_empty_tokens: bool,
}

/// Label → number of occurrences across the corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelHistogram {
    counts: BTreeMap<String, usize>,
}

impl LabelHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `label`.
    pub fn add(&mut self, label: &str) {
        match self.counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(label.to_string(), 1);
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts.get(label).copied()
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Labels in lexical order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// The `n` most frequent labels, ties broken by label.
    pub fn most_common(&self, n: usize) -> Vec<(&str, usize)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|(la, ca), (lb, cb)| cb.cmp(ca).then_with(|| la.cmp(lb)));
        entries.truncate(n);
        entries
    }
}

/// Build a histogram counting every token of every row.
pub fn build_histogram(rows: &[ResultRow]) -> LabelHistogram {
    build_histogram_with(rows, HistogramOptions::default())
}

/// Build a histogram with explicit tokenization options.
pub fn build_histogram_with(rows: &[ResultRow], options: HistogramOptions) -> LabelHistogram {
    let mut histogram = LabelHistogram::new();
    for row in rows {
        for token in row.tokens() {
            if options.skip_empty_tokens && token.is_empty() {
                continue;
            }
            histogram.add(token);
        }
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_common_orders_by_count_then_label() {
        let rows = vec![
            ResultRow::new("a.jpg", "sky,tree,cloud"),
            ResultRow::new("b.jpg", "tree,sky"),
            ResultRow::new("c.jpg", "tree"),
        ];
        let histogram = build_histogram(&rows);
        assert_eq!(histogram.most_common(2), vec![("tree", 3), ("sky", 2)]);
        assert_eq!(histogram.most_common(10).len(), 3);
    }

    #[test]
    fn skip_empty_tokens_drops_zero_label_rows() {
        let rows = vec![ResultRow::new("x.jpg", ""), ResultRow::new("y.jpg", "art")];
        let histogram = build_histogram_with(
            &rows,
            HistogramOptions {
                skip_empty_tokens: true,
            },
        );
        assert_eq!(histogram.get(""), None);
        assert_eq!(histogram.total(), 1);
    }
}

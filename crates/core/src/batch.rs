//! Outcome of a concurrent batch delete

use http::HeaderMap;

use crate::error::{Error, Result};

/// Result of deleting one path of a batch
#[derive(Debug)]
pub struct BatchItem {
    pub path: String,
    pub outcome: Result<HeaderMap>,
}

impl BatchItem {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-path outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchDelete {
    items: Vec<BatchItem>,
}

impl BatchDelete {
    pub(crate) fn new(items: Vec<BatchItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    /// Whether every path was deleted
    pub fn is_complete(&self) -> bool {
        self.failed() == 0
    }

    /// Paths whose delete failed, with their error
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.items.iter().filter_map(|item| match &item.outcome {
            Ok(_) => None,
            Err(e) => Some((item.path.as_str(), e)),
        })
    }

    /// Aggregate view: `PartialFailure` when any path failed
    pub fn into_result(self) -> Result<Vec<BatchItem>> {
        let failed = self.failed();
        if failed > 0 {
            return Err(Error::PartialFailure {
                failed,
                total: self.len(),
            });
        }
        Ok(self.items)
    }

    pub fn into_items(self) -> Vec<BatchItem> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: &str, ok: bool) -> BatchItem {
        BatchItem {
            path: path.to_string(),
            outcome: if ok {
                Ok(HeaderMap::new())
            } else {
                Err(Error::NotFound(path.to_string()))
            },
        }
    }

    #[test]
    fn test_batch_counts() {
        let batch = BatchDelete::new(vec![item("c/a", true), item("c/b", false), item("c/c", true)]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.succeeded(), 2);
        assert_eq!(batch.failed(), 1);
        assert!(!batch.is_complete());

        let failures: Vec<_> = batch.failures().map(|(path, _)| path).collect();
        assert_eq!(failures, vec!["c/b"]);
    }

    #[test]
    fn test_into_result_aggregates() {
        let batch = BatchDelete::new(vec![item("c/a", true), item("c/b", false)]);
        assert!(matches!(
            batch.into_result(),
            Err(Error::PartialFailure { failed: 1, total: 2 })
        ));

        let batch = BatchDelete::new(vec![item("c/a", true)]);
        assert_eq!(batch.into_result().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let batch = BatchDelete::default();
        assert!(batch.is_empty());
        assert!(batch.is_complete());
    }
}

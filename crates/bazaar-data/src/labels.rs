// LabelCodec — category name <-> dense class id mapping

use std::collections::HashMap;

use crate::error::{DataError, Result};

/// Bijection between category names and contiguous class ids.
///
/// Built exactly once, from every label in the manifest. Distinct labels are
/// sorted before ids are assigned, so the mapping is stable across runs and
/// independent of manifest row order.
#[derive(Debug, Clone)]
pub struct LabelCodec {
    classes: Vec<String>,
    ids: HashMap<String, usize>,
}

impl LabelCodec {
    /// Build the codec from raw labels; repetitions are allowed.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> =
            labels.into_iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        let ids = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        LabelCodec { classes, ids }
    }

    /// Dense id for `label`.
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.ids
            .get(label)
            .copied()
            .ok_or_else(|| DataError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Label name for `id`.
    pub fn decode(&self, id: usize) -> Result<&str> {
        self.classes
            .get(id)
            .map(String::as_str)
            .ok_or(DataError::UnknownClassId {
                id,
                num_classes: self.classes.len(),
            })
    }

    /// Number of distinct classes.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// All class names, in id order.
    pub fn class_names(&self) -> &[String] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_labels() {
        let codec = LabelCodec::from_labels(["shoes", "bags", "shoes", "watches", "bags"]);
        assert_eq!(codec.num_classes(), 3);
        for name in ["bags", "shoes", "watches"] {
            let id = codec.encode(name).unwrap();
            assert_eq!(codec.decode(id).unwrap(), name);
        }
    }

    #[test]
    fn test_ids_are_dense_and_sorted() {
        let codec = LabelCodec::from_labels(["watches", "bags", "shoes"]);
        assert_eq!(codec.class_names(), &["bags", "shoes", "watches"]);
        assert_eq!(codec.encode("bags").unwrap(), 0);
        assert_eq!(codec.encode("shoes").unwrap(), 1);
        assert_eq!(codec.encode("watches").unwrap(), 2);
    }

    #[test]
    fn test_order_independent_of_rows() {
        let a = LabelCodec::from_labels(["b", "a", "c", "a"]);
        let b = LabelCodec::from_labels(["c", "c", "a", "b"]);
        assert_eq!(a.class_names(), b.class_names());
    }

    #[test]
    fn test_unknown_label_errors() {
        let codec = LabelCodec::from_labels(["a", "b"]);
        let err = codec.encode("Z").unwrap_err();
        assert!(matches!(err, DataError::UnknownLabel { ref label } if label == "Z"));
    }

    #[test]
    fn test_unknown_id_errors() {
        let codec = LabelCodec::from_labels(["a", "b"]);
        let err = codec.decode(2).unwrap_err();
        assert!(matches!(
            err,
            DataError::UnknownClassId {
                id: 2,
                num_classes: 2
            }
        ));
    }
}

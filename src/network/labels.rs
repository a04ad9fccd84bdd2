use serde::{Deserialize, Serialize};

/// Ordered mapping between label text and class index.
///
/// Labels not in the map are "unlabeled": training and testing skip them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        LabelMap {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn class_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label.trim())
    }

    pub fn label_of(&self, class: usize) -> Option<&str> {
        self.labels.get(class).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_both_ways() {
        let map = LabelMap::new(["AD", "CN", "MCI"]);
        assert_eq!(map.class_of("CN"), Some(1));
        assert_eq!(map.class_of(" MCI "), Some(2));
        assert_eq!(map.class_of("EMCI"), None);
        assert_eq!(map.label_of(0), Some("AD"));
        assert_eq!(map.label_of(3), None);
    }

    #[test]
    fn serialises_as_a_plain_list() {
        let map = LabelMap::new(["cat", "dog"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"["cat","dog"]"#);
    }
}

use std::path::Path;

use tracing::warn;

use crate::error::Result;

/// Name suffix marking slices that are excluded from every run.
pub const DEFAULT_SKIP_SUFFIX: &str = "-1";

/// One `name,label` row of a dataset manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub name: String,
    pub label: String,
}

impl Example {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Example {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// Parses comma-separated `name,label` rows.
///
/// Blank lines are ignored. Rows without exactly two cells are logged and
/// dropped, as are names ending in `skip_suffix` (an empty suffix skips
/// nothing).
pub fn parse_manifest(text: &str, skip_suffix: &str) -> Vec<Example> {
    let mut examples = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells: Vec<&str> = line.split(',').map(str::trim).collect();
        let [name, label] = cells.as_slice() else {
            warn!(line = line_no + 1, cells = cells.len(), "Dropping malformed manifest row");
            continue;
        };

        if !skip_suffix.is_empty() && name.ends_with(skip_suffix) {
            continue;
        }
        examples.push(Example::new(*name, *label));
    }

    examples
}

pub fn load_manifest(path: &Path, skip_suffix: &str) -> Result<Vec<Example>> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_manifest(&text, skip_suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_two_cell_rows() {
        let text = "scan_001-0,AD\nscan_001-1,AD\n\nscan_002-2, CN \nbroken\na,b,c\n";
        let examples = parse_manifest(text, DEFAULT_SKIP_SUFFIX);
        assert_eq!(
            examples,
            vec![Example::new("scan_001-0", "AD"), Example::new("scan_002-2", "CN")]
        );
    }

    #[test]
    fn empty_suffix_skips_nothing() {
        let examples = parse_manifest("x-1,A\ny-2,B", "");
        assert_eq!(examples.len(), 2);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trainingImages.csv");
        std::fs::write(&path, "a-0,MCI\n").unwrap();
        assert_eq!(load_manifest(&path, DEFAULT_SKIP_SUFFIX).unwrap()[0].label, "MCI");
        assert!(load_manifest(&dir.path().join("none.csv"), DEFAULT_SKIP_SUFFIX).is_err());
    }
}

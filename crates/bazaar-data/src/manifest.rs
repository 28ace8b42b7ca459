// Manifest — the labeled product listing driving dataset construction
//
// A lightweight delimited-text parser that doesn't require an external CSV
// crate. Only two columns matter here: the product id and the category
// label. Image files are resolved as `<id><suffix>` under a configured
// directory.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DataError, Result};

/// How to read the manifest file.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Whether the first row names the columns. Without a header the first
    /// two columns are taken as id and label.
    pub has_header: bool,
    /// Header name of the product id column.
    pub id_column: String,
    /// Header name of the category label column.
    pub label_column: String,
    /// Suffix appended to the id to form the image filename.
    pub filename_suffix: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        ManifestConfig {
            delimiter: b',',
            has_header: true,
            id_column: "id".to_string(),
            label_column: "category".to_string(),
            filename_suffix: "_resized.jpg".to_string(),
        }
    }
}

impl ManifestConfig {
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn id_column(mut self, name: impl Into<String>) -> Self {
        self.id_column = name.into();
        self
    }

    pub fn label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    pub fn filename_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.filename_suffix = suffix.into();
        self
    }
}

/// One manifest row: a product id, its label, and the backing image path.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
    pub id: String,
    pub label: String,
    pub image_path: PathBuf,
}

/// The authoritative list of labeled product images. Immutable after load.
#[derive(Debug, Clone)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read and parse `path`, resolving image files under `image_dir`.
    pub fn from_csv_path(
        path: impl AsRef<Path>,
        image_dir: impl AsRef<Path>,
        config: ManifestConfig,
    ) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_csv_str(&text, image_dir, config)
    }

    /// Parse manifest text, resolving image files under `image_dir`.
    pub fn from_csv_str(
        text: &str,
        image_dir: impl AsRef<Path>,
        config: ManifestConfig,
    ) -> Result<Self> {
        let image_dir = image_dir.as_ref();
        let delim = config.delimiter as char;
        let mut rows = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (id_col, label_col) = if config.has_header {
            let (line_no, header) = rows.next().ok_or(DataError::Manifest {
                line: 0,
                detail: "empty manifest".to_string(),
            })?;
            let names: Vec<&str> = header.split(delim).map(str::trim).collect();
            let find = |name: &str| {
                names
                    .iter()
                    .position(|n| *n == name)
                    .ok_or_else(|| DataError::Manifest {
                        line: line_no + 1,
                        detail: format!("missing column {name:?} in header"),
                    })
            };
            (find(&config.id_column)?, find(&config.label_column)?)
        } else {
            (0, 1)
        };

        let mut entries = Vec::new();
        for (line_no, line) in rows {
            let fields: Vec<&str> = line.split(delim).map(str::trim).collect();
            let field = |col: usize, what: &str| {
                fields
                    .get(col)
                    .copied()
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| DataError::Manifest {
                        line: line_no + 1,
                        detail: format!("missing {what} in column {col}"),
                    })
            };
            let id = field(id_col, "id")?;
            let label = field(label_col, "label")?;
            entries.push(ManifestEntry {
                id: id.to_string(),
                label: label.to_string(),
                image_path: image_dir.join(format!("{id}{}", config.filename_suffix)),
            });
        }
        if entries.is_empty() {
            return Err(DataError::Manifest {
                line: 0,
                detail: "manifest has no data rows".to_string(),
            });
        }
        Ok(Manifest { entries })
    }

    /// Build a manifest directly from entries (synthetic data, tests).
    pub fn from_entries(entries: Vec<ManifestEntry>) -> Self {
        Manifest { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// The label column, in row order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }
}

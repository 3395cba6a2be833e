//! Versioned persistence for case documents.
//!
//! Documents are saved as YAML with a `_version` attribute on the top
//! level: the on-disk representation is a tagged enum with one variant
//! per format version, converted to and from the in-memory
//! [`Document`]. Loading never partially applies: a document is either
//! fully parsed or an error is returned and nothing is produced.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::document::{Document, NodeId, Value};

/// Errors that can occur when loading a case document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source could not be read.
    #[error("failed to read case document")]
    Io(#[from] io::Error),
    /// The document text is malformed.
    #[error("malformed case document")]
    Parse(#[from] serde_yaml::Error),
    /// The document does not declare a format version.
    #[error("case document has no '_version' attribute")]
    MissingVersion,
    /// The document declares a format version this build cannot read.
    #[error("unsupported case document version '{found}'")]
    UnsupportedVersion {
        /// The version attribute found on the document.
        found: String,
    },
}

/// Errors that can occur when saving a case document.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The destination could not be written.
    #[error("failed to write case document")]
    Io(#[from] io::Error),
    /// The document could not be serialized.
    #[error("failed to serialize case document")]
    Serialize(#[from] serde_yaml::Error),
}

/// A node in the serialized representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NodeRepr {
    name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<NodeRepr>,
}

/// The serialized versions of the case document.
///
/// This allows future changes to the document format without breaking
/// compatibility: older versions are upgraded in the conversion to
/// [`Document`], and unknown versions are rejected up front.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum DocumentFile {
    #[serde(rename = "1")]
    V1 { case: NodeRepr },
}

/// Reads a versioned case document.
///
/// # Errors
///
/// Returns [`LoadError::Parse`] on malformed YAML,
/// [`LoadError::MissingVersion`] if the `_version` attribute is absent,
/// and [`LoadError::UnsupportedVersion`] if the declared version is not
/// one this build can read.
pub fn read<R: io::Read>(reader: R) -> Result<Document, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_reader(reader)?;

    let version = version_of(&value).ok_or(LoadError::MissingVersion)?;
    if version != "1" {
        return Err(LoadError::UnsupportedVersion { found: version });
    }

    let file: DocumentFile = serde_yaml::from_value(value)?;
    let DocumentFile::V1 { case } = file;
    Ok(from_repr(case))
}

/// Writes a document in the current format version.
///
/// This is a pure serialization of the in-memory tree; the document is
/// not validated or modified.
///
/// # Errors
///
/// Returns an error if serialization fails or the destination cannot be
/// written.
pub fn write<W: Write>(mut writer: W, document: &Document) -> Result<(), SaveError> {
    let file = DocumentFile::V1 {
        case: to_repr(document, document.root()),
    };
    let text = serde_yaml::to_string(&file)?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Loads a case document from a file path.
///
/// # Errors
///
/// See [`read`]; additionally fails if the file cannot be opened.
#[instrument]
pub fn load_path(path: &Path) -> Result<Document, LoadError> {
    let file = File::open(path)?;
    read(BufReader::new(file))
}

/// Saves a case document to a file path, creating parent directories if
/// needed.
///
/// # Errors
///
/// See [`write`]; additionally fails if the file cannot be created.
#[instrument(skip(document))]
pub fn save_path(path: &Path, document: &Document) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    write(BufWriter::new(file), document)
}

/// Extracts the `_version` attribute as a string.
///
/// A bare integer version (`_version: 1`) is tolerated on load even
/// though saves always quote it.
fn version_of(value: &serde_yaml::Value) -> Option<String> {
    match value.get("_version")? {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_repr(document: &Document, id: NodeId) -> NodeRepr {
    NodeRepr {
        name: document.name(id).to_string(),
        attrs: document
            .attrs(id)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
        children: document
            .children(id)
            .map(|child| to_repr(document, child))
            .collect(),
    }
}

fn from_repr(repr: NodeRepr) -> Document {
    let mut document = Document::with_root(&repr.name);
    let root = document.root();
    apply_repr(&mut document, root, repr);
    document
}

fn apply_repr(document: &mut Document, node: NodeId, repr: NodeRepr) {
    for (name, value) in repr.attrs {
        document.set_attr(node, &name, value);
    }
    for child in repr.children {
        let id = document.append_child(node, &child.name);
        apply_repr(document, id, child);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::document::NodePath;

    fn path(s: &str) -> NodePath {
        s.parse().unwrap()
    }

    fn sample_document() -> Document {
        let mut document = Document::new();
        let fields = document.ensure_path(&path("fields"));
        for id in ["water", "steam", "oil"] {
            let field = document.append_child(fields, "field");
            document.set_attr(field, "id", id);
        }
        let boundary = document.ensure_path(&path("boundary_conditions/boundary"));
        document.set_attr(boundary, "label", "inlet_1");
        document.set_attr(boundary, "velocity", 1.5);
        document
    }

    #[test]
    fn round_trip_preserves_structure_and_order() {
        let document = sample_document();

        let mut bytes = Vec::new();
        write(&mut bytes, &document).unwrap();
        let loaded = read(Cursor::new(&bytes)).unwrap();

        assert_eq!(loaded, document);

        // Child order is authoritative and must survive serialization.
        let fields = loaded.peek_path(&path("fields")).unwrap();
        let ids: Vec<_> = loaded
            .children_named(fields, "field")
            .filter_map(|field| loaded.peek_var::<String>(field, "id"))
            .collect();
        assert_eq!(ids, vec!["water", "steam", "oil"]);
    }

    #[test]
    fn written_documents_declare_version_one() {
        let mut bytes = Vec::new();
        write(&mut bytes, &Document::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("_version: '1'"), "{text}");
    }

    #[test]
    fn unknown_version_is_rejected() {
        let text = "_version: '99'\ncase:\n  name: case\n";
        let error = read(Cursor::new(text)).unwrap_err();
        assert!(
            matches!(error, LoadError::UnsupportedVersion { ref found } if found == "99"),
            "{error:?}"
        );
    }

    #[test]
    fn unquoted_version_is_tolerated() {
        let text = "_version: 1\ncase:\n  name: case\n";
        let document = read(Cursor::new(text)).unwrap();
        assert_eq!(document.name(document.root()), "case");
    }

    #[test]
    fn missing_version_is_rejected() {
        let text = "case:\n  name: case\n";
        let error = read(Cursor::new(text)).unwrap_err();
        assert!(matches!(error, LoadError::MissingVersion), "{error:?}");
    }

    #[test]
    fn malformed_text_is_a_parse_error() {
        let text = ": not yaml : at all :";
        let error = read(Cursor::new(text)).unwrap_err();
        assert!(matches!(error, LoadError::Parse(_)), "{error:?}");
    }

    #[test]
    fn save_and_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("setup").join("case.yml");

        let document = sample_document();
        save_path(&file, &document).unwrap();
        let loaded = load_path(&file).unwrap();
        assert_eq!(loaded, document);
    }

    #[test]
    fn loading_a_missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_path(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(error, LoadError::Io(_)), "{error:?}");
    }

    #[test]
    fn empty_attributes_and_children_are_omitted() {
        let mut bytes = Vec::new();
        write(&mut bytes, &Document::new()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("attrs"), "{text}");
        assert!(!text.contains("children"), "{text}");
    }
}

//! Reading and writing wizard drafts and field lists on disk.
//!
//! Files ending in `.json` are JSON; everything else is read as YAML, which also
//! accepts JSON documents.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use rescat_types::RawField;
use serde::{Serialize, de::DeserializeOwned};

use crate::session::WizardDraft;

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
}

/// Loads a document with format detection by extension.
pub fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if is_json(path) {
        serde_json::from_str(&content).with_context(|| format!("Failed to parse JSON document {}", path.display()))
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse YAML document {}", path.display()))
    }
}

/// Writes a document in the format implied by the extension.
pub fn save_document<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    let content = if is_json(path) {
        serde_json::to_string_pretty(value).context("Failed to serialize document as JSON")?
    } else {
        serde_yaml::to_string(value).context("Failed to serialize document as YAML")?
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_draft(path: impl AsRef<Path>) -> Result<WizardDraft> {
    load_document(path)
}

pub fn save_draft(path: impl AsRef<Path>, draft: &WizardDraft) -> Result<()> {
    save_document(path, draft)
}

/// Loads a raw field list, either a bare array or `{ "entries": [...] }` as the backend returns it.
pub fn load_raw_fields(path: impl AsRef<Path>) -> Result<Vec<RawField>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum FieldList {
        Bare(Vec<RawField>),
        Wrapped { entries: Vec<RawField> },
    }

    Ok(match load_document::<FieldList>(path)? {
        FieldList::Bare(fields) => fields,
        FieldList::Wrapped { entries } => entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rescat_types::{BackingResource, InformationItem, ResourceType, RowId};

    #[test]
    fn yaml_and_json_drafts_load_the_same() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let mut item = InformationItem::new(RowId::Draft(3));
        item.business_name = "姓名".into();
        let draft = WizardDraft {
            mount_resources: vec![BackingResource::new("v1", ResourceType::DataView, "人口视图")],
            items: vec![item],
            ..WizardDraft::default()
        };

        let json_path = temp_dir.path().join("draft.json");
        let yaml_path = temp_dir.path().join("nested/draft.yaml");
        save_draft(&json_path, &draft).expect("save json");
        save_draft(&yaml_path, &draft).expect("save yaml");

        assert_eq!(load_draft(&json_path).expect("load json"), draft);
        assert_eq!(load_draft(&yaml_path).expect("load yaml"), draft);
        let raw = fs::read_to_string(&json_path).expect("read json");
        assert!(raw.contains("\"a-3\""));
    }

    #[test]
    fn field_lists_accept_backend_envelopes() {
        let temp_dir = tempfile::tempdir().expect("tempdir");
        let path = temp_dir.path().join("fields.yaml");
        fs::write(
            &path,
            r#"
entries:
  - id: f1
    resource_id: v1
    business_name: 姓名
    technical_name: name
    data_type: char
    data_length: 32
"#,
        )
        .expect("write fields");
        let fields = load_raw_fields(&path).expect("load fields");
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].technical_name, "name");
    }

    #[test]
    fn missing_files_report_their_path() {
        let error = load_draft("/definitely/not/here.yaml").unwrap_err();
        assert!(error.to_string().contains("/definitely/not/here.yaml"));
    }
}

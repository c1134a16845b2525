//! Document loading and normalization.
//!
//! Checklist files in the wild carry several competing spellings for the
//! same concepts (sections vs. groups, challenge vs. text, required vs.
//! mandatory). Everything is collapsed into the canonical model in one
//! normalization step here, so the rest of the crate only ever sees
//! `core::models` shapes.

use std::{
    fs,
    path::PathBuf,
};

use log::warn;
use serde::Deserialize;

use crate::core::{
    Checklist,
    Item,
    ItemKind,
    KneeboardError,
    Section,
    SectionKind,
    TaskList,
};

pub trait DocumentLoader: Send + Sync {
    fn load(&self, identifier: &str) -> Result<Checklist, KneeboardError>;
}

/// Loads `<root>/<identifier>.json` checklist files.
pub struct FileDocumentLoader {
    root: PathBuf,
}

impl FileDocumentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{}.json", identifier))
    }
}

impl DocumentLoader for FileDocumentLoader {
    fn load(&self, identifier: &str) -> Result<Checklist, KneeboardError> {
        let path = self.document_path(identifier);
        if !path.exists() {
            return Err(KneeboardError::ChecklistNotFound(identifier.to_string()));
        }

        let content = fs::read_to_string(&path)?;
        let raw: RawChecklist = serde_json::from_str(&content)?;
        normalize(raw, identifier)
    }
}

#[derive(Debug, Deserialize)]
struct RawChecklist {
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default, alias = "groups")]
    sections: Vec<RawSection>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default, alias = "checklists")]
    lists: Vec<RawList>,
}

#[derive(Debug, Deserialize)]
struct RawList {
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default, alias = "entries")]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default, rename = "challengeText", alias = "challenge", alias = "text")]
    challenge: String,
    #[serde(default, rename = "responseText", alias = "response", alias = "action")]
    response: Option<String>,
    #[serde(default, alias = "required")]
    mandatory: Option<bool>,
}

/// Collapses the lenient raw shapes into the canonical model.
///
/// Defaults: a section with no type is a regular checklist section; an item
/// with no type is a task; a task with no mandatory flag is mandatory.
/// Non-task items are never mandatory, whatever the file says.
fn normalize(raw: RawChecklist, identifier: &str) -> Result<Checklist, KneeboardError> {
    if raw.sections.is_empty() {
        return Err(KneeboardError::EmptyChecklist(identifier.to_string()));
    }

    let sections = raw
        .sections
        .into_iter()
        .map(|section| Section {
            kind: normalize_section_kind(section.kind.as_deref(), identifier),
            title: section.title,
            lists: section
                .lists
                .into_iter()
                .map(|list| TaskList {
                    title: list.title,
                    items: list
                        .items
                        .into_iter()
                        .map(|item| normalize_item(item, identifier))
                        .collect(),
                })
                .collect(),
        })
        .collect();

    Ok(Checklist { title: raw.title, sections })
}

fn normalize_section_kind(raw: Option<&str>, identifier: &str) -> SectionKind {
    match raw {
        None | Some("checklist") => SectionKind::Checklist,
        Some("emergency") => SectionKind::Emergency,
        Some("reference") => SectionKind::Reference,
        Some(other) => {
            warn!("Unknown section type '{}' in '{}', treating as checklist", other, identifier);
            SectionKind::Checklist
        }
    }
}

fn normalize_item(raw: RawItem, identifier: &str) -> Item {
    let kind = match raw.kind.as_deref() {
        None | Some("task") => ItemKind::Task,
        Some("note") => ItemKind::Note,
        Some("label") => ItemKind::Label,
        Some("caution") => ItemKind::Caution,
        Some("warning") => ItemKind::Warning,
        Some(other) => {
            warn!("Unknown item type '{}' in '{}', treating as note", other, identifier);
            ItemKind::Note
        }
    };

    let mandatory = if kind == ItemKind::Task { raw.mandatory.unwrap_or(true) } else { false };

    Item { kind, challenge: raw.challenge, response: raw.response, mandatory }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn loads_and_normalizes_a_document() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("c172.json"),
            r#"{
                "title": "C172 Normal Procedures",
                "sections": [
                    {
                        "type": "checklist",
                        "title": "Preflight",
                        "lists": [
                            {
                                "title": "Cabin",
                                "items": [
                                    { "type": "label", "challengeText": "CABIN" },
                                    { "challengeText": "Control Lock", "responseText": "Remove" },
                                    { "type": "task", "challengeText": "Avionics", "responseText": "Off", "mandatory": false },
                                    { "type": "spacer", "challengeText": "" }
                                ]
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let loader = FileDocumentLoader::new(dir.path());
        let doc = loader.load("c172").unwrap();

        assert_eq!(doc.title, "C172 Normal Procedures");
        let items = &doc.list(0, 0).unwrap().items;
        assert_eq!(items[0].kind, ItemKind::Label);
        assert!(!items[0].mandatory);
        // Missing type means task, missing mandatory means required.
        assert_eq!(items[1].kind, ItemKind::Task);
        assert!(items[1].mandatory);
        assert_eq!(items[2].kind, ItemKind::Task);
        assert!(!items[2].mandatory);
        // Unknown type degrades to a note.
        assert_eq!(items[3].kind, ItemKind::Note);
    }

    #[test]
    fn accepts_alias_field_spellings() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("aliased.json"),
            r#"{
                "name": "Aliased",
                "groups": [
                    {
                        "name": "Start",
                        "checklists": [
                            {
                                "name": "Engine",
                                "entries": [
                                    { "challenge": "Mixture", "action": "Rich", "required": true }
                                ]
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap();

        let loader = FileDocumentLoader::new(dir.path());
        let doc = loader.load("aliased").unwrap();

        assert_eq!(doc.title, "Aliased");
        assert_eq!(doc.sections[0].title, "Start");
        let item = doc.item(0, 0, 0).unwrap();
        assert_eq!(item.challenge, "Mixture");
        assert_eq!(item.response.as_deref(), Some("Rich"));
        assert!(item.mandatory);
    }

    #[test]
    fn missing_file_is_checklist_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileDocumentLoader::new(dir.path());

        match loader.load("nope") {
            Err(KneeboardError::ChecklistNotFound(id)) => assert_eq!(id, "nope"),
            other => panic!("expected ChecklistNotFound, got {:?}", other.map(|d| d.title)),
        }
    }

    #[test]
    fn zero_sections_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.json"), r#"{ "title": "Empty", "sections": [] }"#)
            .unwrap();

        let loader = FileDocumentLoader::new(dir.path());
        assert!(matches!(loader.load("empty"), Err(KneeboardError::EmptyChecklist(_))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let loader = FileDocumentLoader::new(dir.path());
        assert!(matches!(loader.load("bad"), Err(KneeboardError::Json(_))));
    }
}

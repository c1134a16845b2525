use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Checklist,
    Emergency,
    Reference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Note,
    Label,
    Caution,
    Warning,
}

/// A single checklist line. Only `Task` items participate in completion
/// tracking; the other kinds are informational reading positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub challenge: String,
    pub response: Option<String>,
    pub mandatory: bool,
}

impl Item {
    pub fn is_task(&self) -> bool {
        self.kind == ItemKind::Task
    }

    /// Identity used by the persistence codec: the challenge text, falling
    /// back to the item's index as a string when the challenge is empty.
    pub fn identifier(&self, index: usize) -> String {
        if self.challenge.is_empty() {
            index.to_string()
        } else {
            self.challenge.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub title: String,
    pub items: Vec<Item>,
}

impl TaskList {
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn task_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_task()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub title: String,
    pub lists: Vec<TaskList>,
}

/// The immutable document tree supplied by the loader. Sessions share it
/// behind an `Arc` and never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Checklist {
    pub fn section(&self, section: usize) -> Option<&Section> {
        self.sections.get(section)
    }

    pub fn list(&self, section: usize, list: usize) -> Option<&TaskList> {
        self.section(section).and_then(|s| s.lists.get(list))
    }

    pub fn item(&self, section: usize, list: usize, item: usize) -> Option<&Item> {
        self.list(section, list).and_then(|l| l.item(item))
    }

    pub fn task_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|section| section.lists.iter())
            .map(|list| list.task_count())
            .sum()
    }

    /// Re-validates a position against this document, level by level: an
    /// out-of-range section resets to 0, then the list is checked within
    /// that section, then the item within that list. Used both by the
    /// structural-change guard and by snapshot restore.
    pub fn clamp_position(&self, position: Position) -> Position {
        let section = if position.section < self.sections.len() { position.section } else { 0 };
        let list = match self.section(section) {
            Some(s) if position.list < s.lists.len() => position.list,
            _ => 0,
        };
        let item = match self.list(section, list) {
            Some(l) if position.item < l.items.len() => position.item,
            _ => 0,
        };
        Position { section, list, item }
    }
}

/// Current reading position: indices into sections, the active section's
/// lists, and the active list's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub section: usize,
    pub list: usize,
    pub item: usize,
}

impl Position {
    pub fn new(section: usize, list: usize, item: usize) -> Self {
        Self { section, list, item }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_section_doc() -> Checklist {
        let item = Item {
            kind: ItemKind::Task,
            challenge: "Flaps".to_string(),
            response: Some("Set".to_string()),
            mandatory: true,
        };
        Checklist {
            title: "Test".to_string(),
            sections: vec![
                Section {
                    kind: SectionKind::Checklist,
                    title: "Preflight".to_string(),
                    lists: vec![TaskList {
                        title: "Before Start".to_string(),
                        items: vec![item.clone(), item.clone()],
                    }],
                },
                Section {
                    kind: SectionKind::Emergency,
                    title: "Emergency".to_string(),
                    lists: vec![TaskList { title: "Engine Fire".to_string(), items: vec![item] }],
                },
            ],
        }
    }

    #[test]
    fn clamp_resets_out_of_range_section_to_zero() {
        let doc = two_section_doc();
        let clamped = doc.clamp_position(Position::new(99, 0, 0));
        assert_eq!(clamped, Position::new(0, 0, 0));
    }

    #[test]
    fn clamp_checks_each_level_against_the_one_above() {
        let doc = two_section_doc();
        // Item 1 exists in section 0's list but not in section 1's.
        assert_eq!(doc.clamp_position(Position::new(0, 0, 1)), Position::new(0, 0, 1));
        assert_eq!(doc.clamp_position(Position::new(1, 0, 1)), Position::new(1, 0, 0));
        assert_eq!(doc.clamp_position(Position::new(1, 5, 0)), Position::new(1, 0, 0));
    }

    #[test]
    fn identifier_falls_back_to_index_for_empty_challenge() {
        let item = Item {
            kind: ItemKind::Task,
            challenge: String::new(),
            response: None,
            mandatory: false,
        };
        assert_eq!(item.identifier(3), "3");
    }
}

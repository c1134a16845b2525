pub mod errors;
pub mod models;

pub use errors::KneeboardError;
pub use models::{ Checklist, Item, ItemKind, Position, Section, SectionKind, TaskList };

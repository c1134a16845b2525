pub mod core;
pub mod document;
pub mod persistence;
pub mod session;

pub use crate::{
    core::{
        Checklist,
        Item,
        ItemKind,
        KneeboardError,
        Position,
        Section,
        SectionKind,
        TaskList,
    },
    document::{
        DocumentLoader,
        FileDocumentLoader,
    },
    persistence::{
        FileStore,
        MemoryStore,
        ProgressStore,
        SaveScheduler,
        SavedChecklistState,
        StateStore,
    },
    session::{
        ChecklistSession,
        CompletionTracker,
        NavigationState,
        Progress,
        SessionPhase,
        SessionView,
    },
};

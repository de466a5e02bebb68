/// What a navigation signal reported. Only folder changes exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    FolderChanged,
}

/// A navigation signal recognised in the bus monitor output.
///
/// Carries no destination path: only the occurrence matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationEvent {
    /// Whether the signal came from the monitored application.
    pub application_matched: bool,
    pub kind: EventKind,
}

impl NavigationEvent {
    pub fn folder_changed() -> Self {
        Self {
            application_matched: true,
            kind: EventKind::FolderChanged,
        }
    }
}

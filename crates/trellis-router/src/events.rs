/// Progress of a navigation, published on [`Router::events`](crate::Router::events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    Start { id: u64, instruction: String },
    End { id: u64, instruction: String, url: String },
    /// The navigation was superseded, vetoed or redirected.
    Cancel { id: u64, instruction: String, reason: String },
    Error { id: u64, instruction: String, error: String },
}

impl NavigationEvent {
    pub fn id(&self) -> u64 {
        match self {
            NavigationEvent::Start { id, .. }
            | NavigationEvent::End { id, .. }
            | NavigationEvent::Cancel { id, .. }
            | NavigationEvent::Error { id, .. } => *id,
        }
    }

    pub fn instruction(&self) -> &str {
        match self {
            NavigationEvent::Start { instruction, .. }
            | NavigationEvent::End { instruction, .. }
            | NavigationEvent::Cancel { instruction, .. }
            | NavigationEvent::Error { instruction, .. } => instruction,
        }
    }
}

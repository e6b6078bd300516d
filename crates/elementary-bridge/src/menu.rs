use elementary_core::{Envelope, ops};

/// Application menu entries the host forwards to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Open,
    New,
    ImportImage,
}

impl MenuEvent {
    /// Event name on the wire.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => ops::MENU_OPEN,
            Self::New => ops::MENU_NEW,
            Self::ImportImage => ops::MENU_IMAGE,
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ops::MENU_OPEN => Some(Self::Open),
            ops::MENU_NEW => Some(Self::New),
            ops::MENU_IMAGE => Some(Self::ImportImage),
            _ => None,
        }
    }

    /// Recognize a host event envelope.
    #[must_use]
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        Self::from_name(&envelope.name)
    }
}

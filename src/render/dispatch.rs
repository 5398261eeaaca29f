use crate::block::InteractionKind;
use serde::{Deserialize, Serialize};

/// Receives the interaction of an activated node.
pub trait Dispatcher {
    fn dispatch(&mut self, action: InteractionKind, target: Option<&str>);
}

/// A request that leaves the widget: the host opens a URL, hands an address
/// to the mail or phone handler, or submits the composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum Outbound {
    OpenUrl { url: String },
    ComposeEmail { uri: String },
    DialPhone { uri: String },
    SendMessage,
}

impl Outbound {
    /// The URI handed to the platform opener, if the request has one.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Self::OpenUrl { url } => Some(url),
            Self::ComposeEmail { uri } | Self::DialPhone { uri } => Some(uri),
            Self::SendMessage => None,
        }
    }

    pub fn to_log_line(&self) -> String {
        match self {
            Self::OpenUrl { url } => format!("open_url url={url}"),
            Self::ComposeEmail { uri } => format!("compose_email uri={uri}"),
            Self::DialPhone { uri } => format!("dial_phone uri={uri}"),
            Self::SendMessage => "send_message".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    open: bool,
}

impl OverlayState {
    pub fn new(open: bool) -> Self {
        Self { open }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Applies an interaction. Overlay actions flip local state; everything
    /// else resolves to an outbound request. Actions that need a target are
    /// dropped when it is missing or blank.
    pub fn apply(&mut self, action: InteractionKind, target: Option<&str>) -> Option<Outbound> {
        let target = target.map(str::trim).filter(|target| !target.is_empty());
        match action {
            InteractionKind::ToggleOverlay => {
                self.open = !self.open;
                None
            }
            InteractionKind::OpenOverlay => {
                self.open = true;
                None
            }
            InteractionKind::CloseOverlay => {
                self.open = false;
                None
            }
            InteractionKind::SendMessage => Some(Outbound::SendMessage),
            InteractionKind::OpenLink | InteractionKind::OpenUrl => target.map(|url| Outbound::OpenUrl {
                url: url.to_string(),
            }),
            InteractionKind::ComposeEmail => target.map(|address| Outbound::ComposeEmail {
                uri: with_scheme("mailto:", address),
            }),
            InteractionKind::DialPhone => target.map(|number| Outbound::DialPhone {
                uri: with_scheme(
                    "tel:",
                    &number.chars().filter(|c| !c.is_whitespace()).collect::<String>(),
                ),
            }),
        }
    }
}

fn with_scheme(scheme: &str, value: &str) -> String {
    if value
        .get(..scheme.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    {
        value.to_string()
    } else {
        format!("{scheme}{value}")
    }
}

/// Overlay state plus the queue of outbound requests waiting for the host.
#[derive(Debug, Default, Clone)]
pub struct WidgetRuntime {
    overlay: OverlayState,
    outbox: Vec<Outbound>,
}

impl WidgetRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overlay_open(&self) -> bool {
        self.overlay.is_open()
    }

    pub fn set_overlay_open(&mut self, open: bool) {
        self.overlay = OverlayState::new(open);
    }

    pub fn pending(&self) -> &[Outbound] {
        &self.outbox
    }

    pub fn drain(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }
}

impl Dispatcher for WidgetRuntime {
    fn dispatch(&mut self, action: InteractionKind, target: Option<&str>) {
        match self.overlay.apply(action, target) {
            Some(request) => {
                tracing::debug!(request = %request.to_log_line(), "queued outbound request");
                self.outbox.push(request);
            }
            None if action.requires_target() && target.is_none() => {
                tracing::warn!(action = %action, "interaction without target ignored");
            }
            None => {}
        }
    }
}

// ABOUTME: View mode tagged union derived from the URL path suffix of a resource screen.
// ABOUTME: One pure parse per navigation replaces incremental mode/slug effect juggling.

/// Which form a resource screen shows. Derived from the `/:mode/:slug` route
/// segments; `Closed` is the bare list view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Closed,
    Creating,
    Viewing(String),
    Editing(String),
}

impl ViewMode {
    /// Parse the path suffix after a resource's base path. Unknown modes and
    /// a `view`/`edit` segment without a slug fall back to `Closed`.
    pub fn parse(suffix: &str) -> Self {
        let mut parts = suffix.split('/').filter(|s| !s.is_empty());
        match (parts.next(), parts.next()) {
            (None, _) => ViewMode::Closed,
            (Some("create"), _) => ViewMode::Creating,
            (Some("view"), Some(slug)) => ViewMode::Viewing(slug.to_string()),
            (Some("edit"), Some(slug)) => ViewMode::Editing(slug.to_string()),
            _ => ViewMode::Closed,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match self {
            ViewMode::Viewing(slug) | ViewMode::Editing(slug) => Some(slug),
            _ => None,
        }
    }

    /// True when a dialog/form is showing (anything but the bare list).
    pub fn is_open(&self) -> bool {
        !matches!(self, ViewMode::Closed)
    }
}

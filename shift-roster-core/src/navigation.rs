use serde::Serialize;

/// Selected tab of a page, kept in sync with the url fragment (`#shifts`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabState {
    tabs: Vec<String>,
    selected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub href: String,
}

/// `"Shift Groups"` -> `"shift-groups"`
#[must_use]
pub fn slugify(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

impl TabState {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            tabs: labels.iter().map(|label| label.as_ref().to_owned()).collect(),
            selected: 0,
        }
    }

    /// Unknown or empty fragments select the first tab.
    #[must_use]
    pub fn from_hash<S: AsRef<str>>(labels: &[S], hash: &str) -> Self {
        let mut this = Self::new(labels);
        let wanted = hash.trim_start_matches('#');
        this.selected = this
            .tabs
            .iter()
            .position(|label| slugify(label) == wanted)
            .unwrap_or(0);
        this
    }

    /// Out of range indices select the last tab. Returns the new fragment.
    pub fn select(&mut self, index: usize) -> String {
        self.selected = index.min(self.tabs.len().saturating_sub(1));
        self.hash()
    }

    #[must_use]
    pub fn hash(&self) -> String {
        self.tabs
            .get(self.selected)
            .map_or_else(String::new, |label| format!("#{}", slugify(label)))
    }

    #[must_use]
    pub const fn selected(&self) -> usize {
        self.selected
    }

    #[must_use]
    pub fn selected_label(&self) -> Option<&str> {
        self.tabs.get(self.selected).map(String::as_str)
    }

    /// `parents` are `(label, href)` from the root down, the selected tab is appended last.
    #[must_use]
    pub fn breadcrumbs(&self, parents: &[(&str, &str)]) -> Vec<Breadcrumb> {
        let base = parents.last().map_or("", |(_, href)| *href);
        parents
            .iter()
            .map(|(label, href)| Breadcrumb {
                label: (*label).to_owned(),
                href: (*href).to_owned(),
            })
            .chain(self.selected_label().map(|label| Breadcrumb {
                label: label.to_owned(),
                href: format!("{base}{}", self.hash()),
            }))
            .collect()
    }
}

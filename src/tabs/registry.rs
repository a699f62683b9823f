use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Title shown until the page reports its own.
pub const NEW_TAB_TITLE: &str = "New Tab";

/// URL of a tab opened without one.
pub const BLANK_URL: &str = "about:blank";

/// Identifier of a tab, unique for the lifetime of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TabId {
    type Err = TabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(TabId)
            .map_err(|_| TabError::InvalidId(s.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Invalid tab id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
    pub title: String,
    pub favicon: String,
}

/// Open tabs in display order plus the active tab.
///
/// The registry is the single owner of tab state; callers go through its
/// methods instead of holding references into it.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    next_id: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new tab for `url` and makes it active.
    pub fn open(&mut self, url: impl Into<String>) -> TabId {
        self.next_id += 1;
        let id = TabId(self.next_id);
        self.tabs.push(Tab {
            id,
            url: url.into(),
            title: NEW_TAB_TITLE.to_string(),
            favicon: String::new(),
        });
        self.active = Some(id);
        id
    }

    pub fn activate(&mut self, id: TabId) -> Result<&Tab, TabError> {
        let index = self.position(id)?;
        self.active = Some(id);
        Ok(&self.tabs[index])
    }

    /// Removes a tab and activates the last remaining one. Closing the only
    /// tab replaces it with a blank tab.
    pub fn close(&mut self, id: TabId) -> Result<Tab, TabError> {
        let index = self.position(id)?;
        let tab = self.tabs.remove(index);
        match self.tabs.last() {
            Some(last) => self.active = Some(last.id),
            None => {
                self.open(BLANK_URL);
            }
        }
        Ok(tab)
    }

    pub fn navigate(&mut self, id: TabId, url: impl Into<String>) -> Result<&Tab, TabError> {
        let tab = self.get_mut(id)?;
        tab.url = url.into();
        Ok(tab)
    }

    pub fn set_title(&mut self, id: TabId, title: impl Into<String>) -> Result<&Tab, TabError> {
        let tab = self.get_mut(id)?;
        tab.title = title.into();
        Ok(tab)
    }

    pub fn set_favicon(&mut self, id: TabId, favicon: impl Into<String>) -> Result<&Tab, TabError> {
        let tab = self.get_mut(id)?;
        tab.favicon = favicon.into();
        Ok(tab)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn position(&self, id: TabId) -> Result<usize, TabError> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(TabError::NotFound(id))
    }

    fn get_mut(&mut self, id: TabId) -> Result<&mut Tab, TabError> {
        self.tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TabError::NotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_activates_new_tab() {
        let mut registry = TabRegistry::new();
        let first = registry.open("https://example.com/");
        let second = registry.open("https://example.org/");

        assert_ne!(first, second);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_id(), Some(second));

        let tab = registry.get(first).unwrap();
        assert_eq!(tab.title, NEW_TAB_TITLE);
        assert_eq!(tab.favicon, "");
    }

    #[test]
    fn test_close_active_selects_last_tab() {
        let mut registry = TabRegistry::new();
        let a = registry.open("https://a.example/");
        registry.open("https://b.example/");
        let c = registry.open("https://c.example/");

        registry.activate(a).unwrap();
        let closed = registry.close(a).unwrap();
        assert_eq!(closed.url, "https://a.example/");
        assert_eq!(registry.active_id(), Some(c));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_close_inactive_tab_selects_last_tab() {
        let mut registry = TabRegistry::new();
        let a = registry.open("https://a.example/");
        let b = registry.open("https://b.example/");
        let c = registry.open("https://c.example/");

        registry.activate(a).unwrap();
        registry.close(b).unwrap();
        assert_eq!(registry.active_id(), Some(c));
    }

    #[test]
    fn test_close_only_tab_opens_blank_tab() {
        let mut registry = TabRegistry::new();
        let only = registry.open("https://example.com/");
        registry.close(only).unwrap();

        assert_eq!(registry.len(), 1);
        let tab = registry.active().unwrap();
        assert_ne!(tab.id, only);
        assert_eq!(tab.url, BLANK_URL);
        assert_eq!(tab.title, NEW_TAB_TITLE);
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut registry = TabRegistry::new();
        let first = registry.open("a");
        registry.close(first).unwrap();
        let second = registry.open("b");
        assert_ne!(first, second);
    }

    #[test]
    fn test_updates() {
        let mut registry = TabRegistry::new();
        let id = registry.open("https://example.com/");

        registry.navigate(id, "https://example.com/next").unwrap();
        registry.set_title(id, "Next").unwrap();
        registry.set_favicon(id, "https://example.com/favicon.ico").unwrap();

        let tab = registry.active().unwrap();
        assert_eq!(tab.url, "https://example.com/next");
        assert_eq!(tab.title, "Next");
        assert_eq!(tab.favicon, "https://example.com/favicon.ico");
    }

    #[test]
    fn test_unknown_tab() {
        let mut registry = TabRegistry::new();
        let id = registry.open("x");
        registry.close(id).unwrap();

        assert_eq!(registry.activate(id).unwrap_err(), TabError::NotFound(id));
        assert_eq!(registry.close(id).unwrap_err(), TabError::NotFound(id));
        assert!(registry.set_title(id, "t").is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!("7".parse::<TabId>().unwrap(), TabId(7));
        assert_eq!(
            "seven".parse::<TabId>().unwrap_err(),
            TabError::InvalidId("seven".into())
        );
    }
}

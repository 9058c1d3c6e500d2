//! Local UI chrome state (launcher, sidebar, file drawer).
//!
//! DESIGN
//! ======
//! Keeps transient presentation concerns out of the registry so the engine
//! stays free of rendering details.

#[cfg(test)]
#[path = "ui_test.rs"]
mod ui_test;

/// Sections of the left drawer inside the panel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawerTab {
    #[default]
    Chats,
    Projects,
    Files,
}

/// Presentation toggles for the floating chat panel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChatUiState {
    /// Panel visible; when false only the launcher button renders.
    pub open: bool,
    pub drawer_open: bool,
    pub drawer_tab: DrawerTab,
    /// Name typed into the new-project field.
    pub project_draft: String,
}

impl ChatUiState {
    pub fn toggle_open(&mut self) {
        self.open = !self.open;
    }

    /// Show `tab`, or close the drawer when `tab` is already showing.
    pub fn select_tab(&mut self, tab: DrawerTab) {
        if self.drawer_open && self.drawer_tab == tab {
            self.drawer_open = false;
        } else {
            self.drawer_open = true;
            self.drawer_tab = tab;
        }
    }
}

//! Menu cursor and option lists

use super::state::{DebugView, State};
use super::view::Page;
use crate::config::Config;
use crate::modes::Mode;

/// Highlighted option, shared by all menus and reset on entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Menu {
    cursor: usize,
}

impl Menu {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move to the next option, wrapping
    pub fn advance(&mut self, count: usize) {
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

/// Menu label for a run limit
pub fn run_limit_label(limit: u32) -> String {
    if limit == 0 {
        "Unlimited".to_string()
    } else {
        format!("{} runs", limit)
    }
}

/// Title and options for a menu state
pub fn options(state: State, config: &Config) -> Option<(&'static str, Vec<String>)> {
    match state {
        State::SelectMenu => Some((
            "Select Mode",
            Mode::ALL.iter().map(|m| m.label().to_string()).collect(),
        )),
        State::SelectRunLimit(_) => Some((
            "Run Limit",
            config
                .session
                .run_limits
                .iter()
                .map(|&l| run_limit_label(l))
                .collect(),
        )),
        State::SelectDebugMenu => Some((
            "Debug",
            DebugView::ALL.iter().map(|v| v.label().to_string()).collect(),
        )),
        _ => None,
    }
}

pub fn option_count(state: State, config: &Config) -> usize {
    match state {
        State::SelectMenu => Mode::ALL.len(),
        State::SelectRunLimit(_) => config.session.run_limits.len(),
        State::SelectDebugMenu => DebugView::ALL.len(),
        _ => 0,
    }
}

/// Menu page for a menu state
pub fn page(state: State, config: &Config, menu: &Menu) -> Option<Page> {
    let (title, options) = options(state, config)?;
    Some(Page::Menu {
        title,
        options,
        cursor: menu.cursor(),
    })
}

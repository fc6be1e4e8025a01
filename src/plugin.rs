// src/plugin.rs
use std::collections::BTreeMap;

use anyhow::{bail, Result};

use crate::VERSION;

/// Top-level menu the plugin's actions live under.
pub const MENU: &str = "&GIPE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionId {
    OpenViProcessing,
    About,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub id: ActionId,
    pub text: &'static str,
}

impl Action {
    pub fn new(id: ActionId) -> Self {
        let text = match id {
            ActionId::OpenViProcessing => "Open VI Processing",
            ActionId::About => "About...",
        };
        Self { id, text }
    }
}

/// Menu registration offered by the host application.
pub trait MenuHost {
    /// Add `action` under `menu`, creating the menu if needed.
    fn add_plugin_to_menu(&mut self, menu: &str, action: &Action);
    /// Remove `action` from `menu`, dropping the menu once it is empty.
    fn remove_plugin_menu(&mut self, menu: &str, action: &Action);
}

/// Menu host for the command line: keeps the menus in memory.
#[derive(Debug, Default)]
pub struct CliMenu {
    menus: BTreeMap<String, Vec<Action>>,
}

impl CliMenu {
    pub fn entries(&self, menu: &str) -> &[Action] {
        self.menus.get(menu).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn menu_names(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(String::as_str)
    }
}

impl MenuHost for CliMenu {
    fn add_plugin_to_menu(&mut self, menu: &str, action: &Action) {
        self.menus.entry(menu.to_string()).or_default().push(action.clone());
    }

    fn remove_plugin_menu(&mut self, menu: &str, action: &Action) {
        if let Some(actions) = self.menus.get_mut(menu) {
            actions.retain(|a| a.id != action.id);
            if actions.is_empty() {
                self.menus.remove(menu);
            }
        }
    }
}

pub struct GipePlugin<H: MenuHost> {
    host: H,
    actions: Vec<Action>,
}

impl<H: MenuHost> GipePlugin<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            actions: Vec::new(),
        }
    }

    pub fn init_gui(&mut self) {
        for id in [ActionId::OpenViProcessing, ActionId::About] {
            let action = Action::new(id);
            self.host.add_plugin_to_menu(MENU, &action);
            self.actions.push(action);
        }
    }

    pub fn unload(&mut self) {
        for action in self.actions.drain(..) {
            self.host.remove_plugin_menu(MENU, &action);
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Look up a registered action; fails once the plugin is unloaded.
    pub fn trigger(&self, id: ActionId) -> Result<&Action> {
        match self.actions.iter().find(|a| a.id == id) {
            Some(action) => Ok(action),
            None => bail!("action {id:?} is not registered"),
        }
    }
}

pub fn about_text() -> String {
    format!("GIPE Plugin\nVersion {VERSION}\n\nDeveloped by Yann\nContact: dr.yann.chemin@gmail.com")
}

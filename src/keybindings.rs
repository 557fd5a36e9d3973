use std::fmt;

use crate::drivers::keysym::{
    CONTROL_MASK, Keysym, MOD1_MASK, SHIFT_MASK, XK_0, XK_1, XK_9, XK_H, XK_L, XK_Q, XK_RETURN,
    XK_T, XK_TAB,
};
use crate::theme::SPAWN_COMMAND;

const MODKEY: u16 = CONTROL_MASK;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Select the n-th tab (1-based).
    SelectIndex(usize),
    /// `+1` next, `-1` previous, `0` back to the previous selection.
    Rotate(i32),
    /// Run a program whose stdout announces window ids. With `focus` unset
    /// the window it announces does not take the selection.
    Spawn { argv: Vec<String>, focus: bool },
    CloseSelected,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SelectIndex(n) => write!(f, "Select tab {n}"),
            Action::Rotate(0) => write!(f, "Toggle previous tab"),
            Action::Rotate(d) if *d > 0 => write!(f, "Next tab"),
            Action::Rotate(_) => write!(f, "Previous tab"),
            Action::Spawn { argv, focus: true } => write!(f, "Open {}", argv.join(" ")),
            Action::Spawn { argv, focus: false } => {
                write!(f, "Open {} in background", argv.join(" "))
            }
            Action::CloseSelected => write!(f, "Close tab"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub keysym: Keysym,
    pub mods: u16,
}

impl KeyCombo {
    pub fn new(keysym: Keysym, mods: u16) -> Self {
        Self { keysym, mods }
    }

    /// `mods` must already have lock modifiers stripped.
    pub fn matches(&self, keysym: Keysym, mods: u16) -> bool {
        self.keysym == keysym && self.mods == mods
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods & CONTROL_MASK != 0 {
            parts.push("Ctrl".to_string());
        }
        if self.mods & SHIFT_MASK != 0 {
            parts.push("Shift".to_string());
        }
        if self.mods & MOD1_MASK != 0 {
            parts.push("Alt".to_string());
        }
        let key = match self.keysym {
            XK_RETURN => "Return".to_string(),
            XK_TAB => "Tab".to_string(),
            sym @ 0x20..=0x7e => char::from(sym as u8).to_ascii_uppercase().to_string(),
            sym => format!("0x{sym:x}"),
        };
        parts.push(key);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Ordered key table; the first matching entry wins.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    entries: Vec<(KeyCombo, Action)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let spawn = split_command(SPAWN_COMMAND);
        let mut kb = Self::new();
        kb.add(
            KeyCombo::new(XK_RETURN, MODKEY | SHIFT_MASK),
            Action::Spawn {
                argv: spawn.clone(),
                focus: true,
            },
        );
        kb.add(
            KeyCombo::new(XK_T, MODKEY),
            Action::Spawn {
                argv: spawn.clone(),
                focus: true,
            },
        );
        kb.add(
            KeyCombo::new(XK_T, MODKEY | SHIFT_MASK),
            Action::Spawn {
                argv: spawn,
                focus: false,
            },
        );
        kb.add(KeyCombo::new(XK_L, MODKEY | SHIFT_MASK), Action::Rotate(1));
        kb.add(KeyCombo::new(XK_H, MODKEY | SHIFT_MASK), Action::Rotate(-1));
        kb.add(KeyCombo::new(XK_TAB, MODKEY), Action::Rotate(0));
        for (n, keysym) in (XK_1..=XK_9).enumerate() {
            kb.add(KeyCombo::new(keysym, MODKEY), Action::SelectIndex(n + 1));
        }
        kb.add(KeyCombo::new(XK_0, MODKEY), Action::SelectIndex(10));
        kb.add(KeyCombo::new(XK_Q, MODKEY), Action::CloseSelected);
        kb
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, combo: KeyCombo, action: Action) {
        self.entries.push((combo, action));
    }

    pub fn action_for(&self, keysym: Keysym, mods: u16) -> Option<&Action> {
        self.entries
            .iter()
            .find(|(combo, _)| combo.matches(keysym, mods))
            .map(|(_, action)| action)
    }

    /// Distinct combos, in table order, for installing key grabs.
    pub fn combos(&self) -> Vec<KeyCombo> {
        let mut combos: Vec<KeyCombo> = Vec::with_capacity(self.entries.len());
        for (combo, _) in &self.entries {
            if !combos.contains(combo) {
                combos.push(*combo);
            }
        }
        combos
    }

    pub fn help_entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(combo, action)| (combo.display(), action.to_string()))
            .collect()
    }
}

/// Split a shell-like command line into argv. Unbalanced quoting falls back
/// to whitespace splitting.
pub fn split_command(command: &str) -> Vec<String> {
    shell_words::split(command)
        .unwrap_or_else(|_| command.split_whitespace().map(str::to_string).collect())
}

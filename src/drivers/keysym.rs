//! The handful of X keysyms and modifier bits the key table refers to.

pub type Keysym = u32;

pub const XK_TAB: Keysym = 0xff09;
pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_NUM_LOCK: Keysym = 0xff7f;
pub const XK_0: Keysym = 0x0030;
pub const XK_1: Keysym = 0x0031;
pub const XK_9: Keysym = 0x0039;
pub const XK_H: Keysym = 0x0068;
pub const XK_L: Keysym = 0x006c;
pub const XK_Q: Keysym = 0x0071;
pub const XK_T: Keysym = 0x0074;

pub const SHIFT_MASK: u16 = 1 << 0;
pub const LOCK_MASK: u16 = 1 << 1;
pub const CONTROL_MASK: u16 = 1 << 2;
pub const MOD1_MASK: u16 = 1 << 3;
pub const MOD5_MASK: u16 = 1 << 7;

/// Every modifier bit that can take part in a binding.
const RELEVANT_MODS: u16 = SHIFT_MASK | CONTROL_MASK | 0b1111_1000;

/// Strip lock modifiers (and button state) from a key event state.
pub fn clean_mask(state: u16, numlock: u16) -> u16 {
    state & !(numlock | LOCK_MASK) & RELEVANT_MODS
}

/// Lock combinations a grab must cover so bindings work with Caps Lock and
/// Num Lock in any state.
pub fn lock_variants(numlock: u16) -> [u16; 4] {
    [0, LOCK_MASK, numlock, numlock | LOCK_MASK]
}

/// Bit of the modifier that carries `keycode`, given the server's modifier
/// map (`keycodes_per_modifier` entries for each of the eight modifiers).
pub fn modifier_bit_for(keycodes: &[u8], keycodes_per_modifier: usize, keycode: u8) -> u16 {
    if keycodes_per_modifier == 0 {
        return 0;
    }
    keycodes
        .chunks(keycodes_per_modifier)
        .take(8)
        .enumerate()
        .filter(|(_, chunk)| chunk.contains(&keycode))
        .map(|(idx, _)| 1u16 << idx)
        .last()
        .unwrap_or(0)
}

/// Snapshot of the server's keycode to keysym table.
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyMap {
    pub fn new(min_keycode: u8, per_keycode: usize, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            per_keycode,
            keysyms,
        }
    }

    /// Unshifted keysym of `keycode`, or 0 when unmapped.
    pub fn keysym(&self, keycode: u8) -> Keysym {
        if self.per_keycode == 0 || keycode < self.min_keycode {
            return 0;
        }
        let idx = usize::from(keycode - self.min_keycode) * self.per_keycode;
        self.keysyms.get(idx).copied().unwrap_or(0)
    }

    /// Every keycode producing `keysym` in any column.
    pub fn keycodes_for(&self, keysym: Keysym) -> Vec<u8> {
        if self.per_keycode == 0 || keysym == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.contains(&keysym))
            .filter_map(|(idx, _)| u8::try_from(usize::from(self.min_keycode) + idx).ok())
            .collect()
    }
}

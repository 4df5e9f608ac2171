use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::dom::InputTarget;

/// Remembers which compose inputs already carry the shortcut listener.
#[derive(Debug, Default)]
pub struct InputBinder {
    bound: HashSet<String>,
    current: Option<InputTarget>,
}

impl InputBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `target` unless it was bound before. Returns true on a fresh bind.
    pub fn bind(&mut self, target: InputTarget) -> bool {
        let fresh = self.bound.insert(target.fingerprint.clone());
        self.current = Some(target);
        fresh
    }

    /// The most recently located input.
    pub fn current(&self) -> Option<&InputTarget> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }
}

/// A key press on the compose input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: char,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn plain(key: char) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
            shift: false,
            alt: false,
        }
    }

    /// Ctrl/Cmd+M or Ctrl/Cmd+R.
    pub fn is_manual_retrieval(&self) -> bool {
        matches!(self.key.to_ascii_lowercase(), 'm' | 'r') && (self.ctrl || self.meta)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChordParseError {
    #[error("unknown modifier {0:?}")]
    UnknownModifier(String),
    #[error("chord must end with a single key, got {0:?}")]
    BadKey(String),
}

impl FromStr for KeyChord {
    type Err = ChordParseError;

    /// Parses `ctrl+m`, `cmd+shift+r`, `m`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let key_part = parts.pop().unwrap_or_default();
        let mut chars = key_part.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(key), None) => key,
            _ => return Err(ChordParseError::BadKey(key_part.to_string())),
        };

        let mut chord = KeyChord::plain(key);
        for modifier in parts {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "cmd" | "meta" | "super" => chord.meta = true,
                "shift" => chord.shift = true,
                "alt" | "option" => chord.alt = true,
                other => return Err(ChordParseError::UnknownModifier(other.to_string())),
            }
        }
        Ok(chord)
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (on, name) in [
            (self.ctrl, "ctrl+"),
            (self.meta, "cmd+"),
            (self.alt, "alt+"),
            (self.shift, "shift+"),
        ] {
            if on {
                f.write_str(name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}

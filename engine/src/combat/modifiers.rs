use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MeleeError, MeleeResult};
use crate::payload::Payload;

/// Situational flags a player can switch on a melee card before rolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Outnumbered,
    Surprised,
    Advantage,
    Disadvantage,
    AutoSuccess,
}

impl Modifier {
    pub const ALL: [Modifier; 5] = [
        Modifier::Outnumbered,
        Modifier::Surprised,
        Modifier::Advantage,
        Modifier::Disadvantage,
        Modifier::AutoSuccess,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Outnumbered => "outnumbered",
            Self::Surprised => "surprised",
            Self::Advantage => "advantage",
            Self::Disadvantage => "disadvantage",
            Self::AutoSuccess => "auto_success",
        }
    }

    /// Only meaningful for the attacking side.
    pub fn initiator_only(self) -> bool {
        matches!(self, Self::Outnumbered | Self::Surprised | Self::AutoSuccess)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Modifier {
    type Err = MeleeError;

    /// Accepts `auto-success`, `autoSuccess` and `auto_success` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "outnumbered" => Ok(Self::Outnumbered),
            "surprised" => Ok(Self::Surprised),
            "advantage" => Ok(Self::Advantage),
            "disadvantage" => Ok(Self::Disadvantage),
            "autosuccess" => Ok(Self::AutoSuccess),
            _ => Err(MeleeError::UnknownModifier(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub outnumbered: bool,
    pub surprised: bool,
    pub advantage: bool,
    pub disadvantage: bool,
    pub auto_success: bool,
}

impl Modifiers {
    pub fn is_set(&self, m: Modifier) -> bool {
        match m {
            Modifier::Outnumbered => self.outnumbered,
            Modifier::Surprised => self.surprised,
            Modifier::Advantage => self.advantage,
            Modifier::Disadvantage => self.disadvantage,
            Modifier::AutoSuccess => self.auto_success,
        }
    }

    fn slot(&mut self, m: Modifier) -> &mut bool {
        match m {
            Modifier::Outnumbered => &mut self.outnumbered,
            Modifier::Surprised => &mut self.surprised,
            Modifier::Advantage => &mut self.advantage,
            Modifier::Disadvantage => &mut self.disadvantage,
            Modifier::AutoSuccess => &mut self.auto_success,
        }
    }

    /// Flip `m`, returning its new state.
    pub fn toggle(&mut self, m: Modifier) -> bool {
        let slot = self.slot(m);
        *slot = !*slot;
        *slot
    }

    pub fn set(&mut self, m: Modifier, on: bool) {
        *self.slot(m) = on;
    }

    /// Bonus (+) or penalty (-) dice for the attacking side.
    pub fn attack_dice(&self) -> i32 {
        let mut dice = 0;
        if self.outnumbered {
            dice += 1;
        }
        if self.surprised {
            dice += 1;
        }
        if self.disadvantage {
            dice -= 1;
        }
        if self.advantage {
            dice += 1;
        }
        dice
    }

    /// Bonus (+) or penalty (-) dice for the defending side.
    pub fn defence_dice(&self) -> i32 {
        i32::from(self.advantage) - i32::from(self.disadvantage)
    }

    pub(crate) fn write_to(&self, p: &mut Payload) {
        for m in Modifier::ALL {
            p.set_bool(m.key(), self.is_set(m));
        }
    }

    pub(crate) fn read_from(p: &Payload) -> MeleeResult<Self> {
        let mut mods = Self::default();
        for m in Modifier::ALL {
            mods.set(m, p.bool_or(m.key(), false)?);
        }
        Ok(mods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_flag_spellings() {
        for s in ["auto-success", "autoSuccess", "auto_success", "AUTO-SUCCESS"] {
            assert_eq!(s.parse::<Modifier>().unwrap(), Modifier::AutoSuccess);
        }
        assert!(matches!(
            "flanked".parse::<Modifier>(),
            Err(MeleeError::UnknownModifier(_))
        ));
    }

    #[test]
    fn attack_dice_add_up_in_any_order() {
        let mut mods = Modifiers::default();
        mods.toggle(Modifier::Outnumbered);
        mods.toggle(Modifier::Surprised);
        mods.toggle(Modifier::Disadvantage);
        assert_eq!(mods.attack_dice(), 1);
        mods.toggle(Modifier::Advantage);
        assert_eq!(mods.attack_dice(), 2);
        assert_eq!(mods.defence_dice(), 0);
    }

    #[test]
    fn toggling_twice_restores() {
        let mut mods = Modifiers::default();
        assert!(mods.toggle(Modifier::Advantage));
        assert!(!mods.toggle(Modifier::Advantage));
        assert_eq!(mods, Modifiers::default());
    }
}

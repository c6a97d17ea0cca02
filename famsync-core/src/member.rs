//! Household members and their colors.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FamSyncError;

pub type MemberId = String;

/// Name shown for member ids that no longer resolve.
pub const UNKNOWN_MEMBER: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Rose,
    Blue,
    Green,
    Purple,
    Orange,
    Teal,
    Indigo,
    Pink,
    Gray,
}

/// Fixed palette, in assignment order.
pub const PALETTE: [Color; 9] = [
    Color::Rose,
    Color::Blue,
    Color::Green,
    Color::Purple,
    Color::Orange,
    Color::Teal,
    Color::Indigo,
    Color::Pink,
    Color::Gray,
];

impl Color {
    pub fn key(self) -> &'static str {
        match self {
            Color::Rose => "rose",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Purple => "purple",
            Color::Orange => "orange",
            Color::Teal => "teal",
            Color::Indigo => "indigo",
            Color::Pink => "pink",
            Color::Gray => "gray",
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Color::Rose => "#fb7185",
            Color::Blue => "#60a5fa",
            Color::Green => "#4ade80",
            Color::Purple => "#c084fc",
            Color::Orange => "#fb923c",
            Color::Teal => "#2dd4bf",
            Color::Indigo => "#818cf8",
            Color::Pink => "#f472b6",
            Color::Gray => "#9ca3af",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Color {
    type Err = FamSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        PALETTE
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| FamSyncError::Validation(format!("Unknown color '{s}'")))
    }
}

/// A household member. The id never changes once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub color: Color,
}

impl Member {
    /// Create a member with a fresh id.
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Member {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            color,
        }
    }

    pub fn hex(&self) -> &'static str {
        self.color.hex()
    }

    /// Avatar image seeded by the display name.
    pub fn avatar_url(&self) -> String {
        let seed: String = self
            .name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect();
        format!("https://api.dicebear.com/7.x/avataaars/svg?seed={seed}")
    }

    /// Up to two uppercase initials for compact rendering.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Pick a color for a new member.
///
/// An explicit preference wins. Otherwise the first palette color no existing
/// member uses; if every color is taken, a random palette color.
pub fn pick_color(existing: &[Member], preferred: Option<Color>) -> Color {
    pick_color_with(existing, preferred, &mut rand::thread_rng())
}

pub fn pick_color_with<R: Rng + ?Sized>(
    existing: &[Member],
    preferred: Option<Color>,
    rng: &mut R,
) -> Color {
    if let Some(color) = preferred {
        return color;
    }

    PALETTE
        .into_iter()
        .find(|c| !existing.iter().any(|m| m.color == *c))
        .or_else(|| PALETTE.choose(rng).copied())
        .unwrap_or(Color::Gray)
}

/// Display name for a member id, or [`UNKNOWN_MEMBER`] if it dangles.
pub fn member_name<'a>(members: &'a [Member], id: &str) -> &'a str {
    members
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name.as_str())
        .unwrap_or(UNKNOWN_MEMBER)
}

pub fn member_names(members: &[Member], ids: &[MemberId]) -> Vec<String> {
    ids.iter()
        .map(|id| member_name(members, id).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn seeded_rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(7)
    }

    fn member(name: &str, color: Color) -> Member {
        Member {
            id: format!("m-{name}"),
            name: name.to_string(),
            color,
        }
    }

    #[test]
    fn first_unused_palette_color() {
        let existing = vec![member("Mom", Color::Rose), member("Dad", Color::Blue)];
        assert_eq!(pick_color_with(&existing, None, &mut seeded_rng()), Color::Green);
    }

    #[test]
    fn preference_wins_even_if_used() {
        let existing = vec![member("Mom", Color::Rose)];
        assert_eq!(
            pick_color_with(&existing, Some(Color::Rose), &mut seeded_rng()),
            Color::Rose
        );
    }

    #[test]
    fn exhausted_palette_falls_back_to_any_palette_color() {
        let existing: Vec<_> = PALETTE
            .iter()
            .enumerate()
            .map(|(i, c)| member(&format!("kid{i}"), *c))
            .collect();
        let color = pick_color_with(&existing, None, &mut seeded_rng());
        assert!(PALETTE.contains(&color));
    }

    #[test]
    fn dangling_ids_render_unknown() {
        let members = vec![member("Mom", Color::Rose)];
        let names = member_names(&members, &["m-Mom".into(), "gone".into()]);
        assert_eq!(names, vec!["Mom".to_string(), UNKNOWN_MEMBER.to_string()]);
    }

    #[test]
    fn color_parsing_and_hex() {
        assert_eq!("Teal".parse::<Color>().unwrap(), Color::Teal);
        assert_eq!(Color::Rose.hex(), "#fb7185");
        assert!("mauve".parse::<Color>().is_err());
    }

    #[test]
    fn initials_and_avatar() {
        let m = member("Mary Ann", Color::Pink);
        assert_eq!(m.initials(), "MA");
        assert!(m.avatar_url().ends_with("seed=Mary-Ann"));
    }
}

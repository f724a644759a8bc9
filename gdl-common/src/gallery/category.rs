//! Content categories used by gallery indexes
//! # Gallery Category
//! Every gallery listed by the index belongs to exactly one category. The index shows it as a
//! colored label next to the title, and the search form can exclude categories through a bitmask.
//!

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Misc,
    Doujinshi,
    Manga,
    ArtistCg,
    GameCg,
    ImageSet,
    Cosplay,
    AsianPorn,
    NonH,
    Western,
}

impl Category {
    pub const ALL: [Self; 10] = [
        Self::Misc,
        Self::Doujinshi,
        Self::Manga,
        Self::ArtistCg,
        Self::GameCg,
        Self::ImageSet,
        Self::Cosplay,
        Self::AsianPorn,
        Self::NonH,
        Self::Western,
    ];

    /// Bit used by the search form to exclude this category.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u16 {
        match self {
            Self::Misc => 1,
            Self::Doujinshi => 1 << 1,
            Self::Manga => 1 << 2,
            Self::ArtistCg => 1 << 3,
            Self::GameCg => 1 << 4,
            Self::ImageSet => 1 << 5,
            Self::Cosplay => 1 << 6,
            Self::AsianPorn => 1 << 7,
            Self::NonH => 1 << 8,
            Self::Western => 1 << 9,
        }
    }

    /// Guess the variant from the label shown in the index, ignoring case and separators.
    pub fn from_label(s: &str) -> Option<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "misc" => Some(Self::Misc),
            "doujinshi" => Some(Self::Doujinshi),
            "manga" => Some(Self::Manga),
            "artistcg" => Some(Self::ArtistCg),
            "gamecg" => Some(Self::GameCg),
            "imageset" => Some(Self::ImageSet),
            "cosplay" => Some(Self::Cosplay),
            "asianporn" => Some(Self::AsianPorn),
            "nonh" => Some(Self::NonH),
            "western" => Some(Self::Western),
            _ => None,
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Misc => write!(f, "Misc"),
            Self::Doujinshi => write!(f, "Doujinshi"),
            Self::Manga => write!(f, "Manga"),
            Self::ArtistCg => write!(f, "Artist CG"),
            Self::GameCg => write!(f, "Game CG"),
            Self::ImageSet => write!(f, "Image Set"),
            Self::Cosplay => write!(f, "Cosplay"),
            Self::AsianPorn => write!(f, "Asian Porn"),
            Self::NonH => write!(f, "Non-H"),
            Self::Western => write!(f, "Western"),
        }
    }
}

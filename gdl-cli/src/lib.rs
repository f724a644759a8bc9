use std::ops::Deref;

use clap::ValueEnum;
use gdl_common::gallery::Category;

pub mod cli;
pub mod error;

#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
pub struct CategoryArg(pub Category);

impl ValueEnum for CategoryArg {
    fn value_variants<'a>() -> &'a [Self] {
        &[
            Self(Category::Misc),
            Self(Category::Doujinshi),
            Self(Category::Manga),
            Self(Category::ArtistCg),
            Self(Category::GameCg),
            Self(Category::ImageSet),
            Self(Category::Cosplay),
            Self(Category::AsianPorn),
            Self(Category::NonH),
            Self(Category::Western),
        ]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        let name = match self.0 {
            Category::Misc => "misc",
            Category::Doujinshi => "doujinshi",
            Category::Manga => "manga",
            Category::ArtistCg => "artist-cg",
            Category::GameCg => "game-cg",
            Category::ImageSet => "image-set",
            Category::Cosplay => "cosplay",
            Category::AsianPorn => "asian-porn",
            Category::NonH => "non-h",
            Category::Western => "western",
        };
        Some(clap::builder::PossibleValue::new(name))
    }
}

impl Deref for CategoryArg {
    type Target = Category;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

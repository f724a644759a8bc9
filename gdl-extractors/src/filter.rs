//! Search filters and their stable fingerprints.
//!
//! A [`SearchFilter`] is everything that defines one logical search. Its [`Fingerprint`] is what
//! the cursor store keys pagination state on, so two filters that only differ in tag order, case
//! or duplicated entries must end up with the same fingerprint.
use bitflags::bitflags;
use gdl_common::gallery::Category;
use log::debug;
use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Separates fields inside the fingerprint input so `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEP: &str = "\u{1f}";
/// Separates items of a list field.
const ITEM_SEP: &str = "\u{1e}";

bitflags! {
    /// Categories to hide from the results, in the same bit layout the search form uses.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CategoryMask: u16 {
        const MISC = 0b00_0000_0001;
        const DOUJINSHI = 0b00_0000_0010;
        const MANGA = 0b00_0000_0100;
        const ARTIST_CG = 0b00_0000_1000;
        const GAME_CG = 0b00_0001_0000;
        const IMAGE_SET = 0b00_0010_0000;
        const COSPLAY = 0b00_0100_0000;
        const ASIAN_PORN = 0b00_1000_0000;
        const NON_H = 0b01_0000_0000;
        const WESTERN = 0b10_0000_0000;
    }
}

impl From<Category> for CategoryMask {
    fn from(value: Category) -> Self {
        Self::from_bits_truncate(value.bit())
    }
}

/// A tag with an optional namespace, written as `namespace:name` on input.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespacedTag {
    pub namespace: Option<String>,
    pub name: String,
}

impl NamespacedTag {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        Self {
            namespace: namespace.map(ToString::to_string),
            name: name.to_string(),
        }
    }

    fn normalized(&self) -> Self {
        Self {
            namespace: self
                .namespace
                .as_deref()
                .map(normalize_word)
                .filter(|ns| !ns.is_empty()),
            name: normalize_word(&self.name),
        }
    }

    /// Serializes the tag as an exact-match search clause.
    ///
    /// The value is quoted and terminated by `$` so `"glasses$"` can't match `sunglasses`.
    pub fn clause(&self, exclude: bool) -> String {
        let prefix = if exclude { "-" } else { "" };
        self.namespace.as_ref().map_or_else(
            || format!("{prefix}\"{}$\"", self.name),
            |ns| format!("{prefix}{ns}:\"{}$\"", self.name),
        )
    }
}

impl FromStr for NamespacedTag {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.split_once(':') {
            Some((ns, name)) if !ns.trim().is_empty() => Self::new(Some(ns.trim()), name.trim()),
            Some((_, name)) => Self::new(None, name.trim()),
            None => Self::new(None, s),
        })
    }
}

impl Display for NamespacedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{ns}:{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Stable identifier of one logical search, independent of the page being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

/// Full set of search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Free-text search term
    pub term: Option<String>,
    pub include_tags: Vec<NamespacedTag>,
    pub exclude_tags: Vec<NamespacedTag>,
    pub language: Option<String>,
    pub author: Option<String>,
    /// Categories to leave out of the results
    pub excluded_categories: CategoryMask,
}

impl SearchFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn term(mut self, term: &str) -> Self {
        self.term = Some(term.to_string());
        self
    }

    #[must_use]
    pub fn include(mut self, tag: NamespacedTag) -> Self {
        self.include_tags.push(tag);
        self
    }

    #[must_use]
    pub fn exclude(mut self, tag: NamespacedTag) -> Self {
        self.exclude_tags.push(tag);
        self
    }

    #[must_use]
    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    #[must_use]
    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    #[must_use]
    pub fn exclude_category(mut self, category: Category) -> Self {
        self.excluded_categories |= CategoryMask::from(category);
        self
    }

    /// Returns a copy with every field in canonical form.
    ///
    /// Whitespace is collapsed, tags, language and author are lower-cased, tag lists are sorted
    /// and deduplicated, and empty optional fields become `None`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let normalize_list = |tags: &[NamespacedTag]| {
            let mut list: Vec<NamespacedTag> = tags
                .iter()
                .map(NamespacedTag::normalized)
                .filter(|t| !t.name.is_empty())
                .collect();
            list.sort();
            list.dedup();
            list
        };

        Self {
            term: self
                .term
                .as_deref()
                .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|t| !t.is_empty()),
            include_tags: normalize_list(&self.include_tags),
            exclude_tags: normalize_list(&self.exclude_tags),
            language: self
                .language
                .as_deref()
                .map(normalize_word)
                .filter(|l| !l.is_empty()),
            author: self
                .author
                .as_deref()
                .map(normalize_word)
                .filter(|a| !a.is_empty()),
            excluded_categories: self.excluded_categories,
        }
    }

    /// Hashes the normalized filter.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        let norm = self.normalized();

        let join_tags = |tags: &[NamespacedTag]| {
            tags.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(ITEM_SEP)
        };

        let fields = [
            norm.term.unwrap_or_default(),
            join_tags(&norm.include_tags),
            join_tags(&norm.exclude_tags),
            norm.language.unwrap_or_default(),
            norm.author.unwrap_or_default(),
            norm.excluded_categories.bits().to_string(),
        ];

        let digest = md5::compute(fields.join(FIELD_SEP));
        let fp = Fingerprint(digest.0);
        debug!("Search fingerprint: {fp}");
        fp
    }

    /// Builds the free-text query sent to the index: the term followed by one anchored clause
    /// per tag, language and author, separated by spaces.
    #[must_use]
    pub fn search_query(&self) -> String {
        let norm = self.normalized();
        let mut parts = Vec::with_capacity(norm.include_tags.len() + norm.exclude_tags.len() + 3);

        if let Some(term) = norm.term {
            parts.push(term);
        }

        parts.extend(norm.include_tags.iter().map(|t| t.clause(false)));
        parts.extend(norm.exclude_tags.iter().map(|t| t.clause(true)));

        if let Some(lang) = norm.language {
            parts.push(NamespacedTag::new(Some("language"), &lang).clause(false));
        }

        if let Some(author) = norm.author {
            parts.push(NamespacedTag::new(Some("artist"), &author).clause(false));
        }

        parts.join(" ")
    }
}

fn normalize_word(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('"', "")
        .to_lowercase()
}

use clap::Args;
use gdl_common::gallery::GalleryEntry;
use gdl_extractors::error::ExtractorError;
use gdl_extractors::extractor::DefaultExtractor;
use gdl_extractors::filter::{NamespacedTag, SearchFilter};
use log::{debug, warn};
use owo_colors::OwoColorize;

use crate::{
    CategoryArg,
    cli::{Cli, extra::session_jar},
    error::CliError,
};

#[derive(Debug, Args)]
pub struct GallerySearch {
    /// Free-text search term
    #[clap(value_parser)]
    pub term: Option<String>,

    /// Only show galleries with this tag. Use `namespace:name` to pin the namespace
    #[clap(short, long = "tag", value_parser, help_heading = "FILTER")]
    pub tags: Vec<String>,

    /// Hide galleries with this tag
    #[clap(short, long, value_parser, help_heading = "FILTER")]
    pub exclude: Vec<String>,

    /// Only show galleries in this language
    #[clap(long, value_parser, help_heading = "FILTER")]
    pub language: Option<String>,

    /// Only show galleries by this artist
    #[clap(long, value_parser, help_heading = "FILTER")]
    pub artist: Option<String>,

    /// Hide galleries of this category. Can be used multiple times
    #[clap(long, value_parser, help_heading = "FILTER")]
    pub exclude_category: Vec<CategoryArg>,

    /// Number of pages to fetch, starting from the first
    ///
    /// [max: 1000]
    #[clap(short, long, value_parser(clap::value_parser!(u32).range(1..=1000)), default_value_t = 1, help_heading = "GENERAL")]
    pub pages: u32,

    /// Sleep through temporary bans instead of stopping
    #[clap(long, value_parser, default_value_t = false, help_heading = "GENERAL")]
    pub wait_on_ban: bool,
}

impl GallerySearch {
    pub fn filter(&self) -> SearchFilter {
        let parse_tag = |s: &String| {
            let Ok(tag) = s.parse::<NamespacedTag>();
            tag
        };

        let filter = SearchFilter {
            term: self.term.clone(),
            include_tags: self.tags.iter().map(parse_tag).collect(),
            exclude_tags: self.exclude.iter().map(parse_tag).collect(),
            language: self.language.clone(),
            author: self.artist.clone(),
            ..SearchFilter::default()
        };

        self.exclude_category
            .iter()
            .fold(filter, |filter, cat| filter.exclude_category(**cat))
    }

    pub async fn run(&self, args: &Cli) -> Result<(), CliError> {
        let jar = session_jar(&args.source).await?;
        let extractor = DefaultExtractor::from_config_with_jar(&args.source, jar)?;

        let filter = self.filter();
        let fingerprint = filter.fingerprint();
        debug!("Searching {} for {:?}", args.source, filter.search_query());

        let mut page = 0;
        let mut total = 0;

        while page < self.pages {
            let entries = match extractor.fetch_page(fingerprint, page, &filter).await {
                Ok(entries) => entries,
                Err(ExtractorError::RateLimited { retry_after, .. }) if self.wait_on_ban => {
                    warn!(
                        "Banned, waiting {}s before retrying page {page}",
                        retry_after.as_secs()
                    );
                    tokio::time::sleep(retry_after).await;
                    continue;
                }
                Err(ExtractorError::RateLimited { retry_after, .. }) => {
                    return Err(CliError::Banned { retry_after });
                }
                Err(e) => return Err(e.into()),
            };

            print_page(page, &entries);
            total += entries.len();

            if !extractor.has_next_page(fingerprint, page) {
                break;
            }
            page += 1;
        }

        println!(
            "{} {}",
            total.to_string().bold().blue(),
            "galleries found".bold()
        );
        Ok(())
    }
}

fn print_page(page: u32, entries: &[GalleryEntry]) {
    println!("{}", format!("Page {}", page + 1).underline().bold().blue());

    for entry in entries {
        let category = entry
            .category
            .map_or_else(String::new, |c| format!("[{c}] "));

        println!(
            "{:<10} {}{}\n           {}",
            entry.gid.bold().yellow(),
            category.purple(),
            entry.title.bold(),
            entry.url.underline()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::Parser;
    use gdl_common::gallery::Category;

    #[derive(Parser)]
    struct Wrapper {
        #[clap(flatten)]
        search: GallerySearch,
    }

    fn parse(args: &[&str]) -> GallerySearch {
        Wrapper::try_parse_from(std::iter::once("gdl").chain(args.iter().copied()))
            .unwrap()
            .search
    }

    #[test]
    fn builds_filter_from_flags() {
        let search = parse(&[
            "cute cats",
            "-t",
            "female:glasses",
            "-e",
            "male:beard",
            "--language",
            "English",
            "--artist",
            "Someone",
            "--exclude-category",
            "western",
            "--exclude-category",
            "non-h",
        ]);

        let expected = SearchFilter::new()
            .term("cute cats")
            .include(NamespacedTag::new(Some("female"), "glasses"))
            .exclude(NamespacedTag::new(Some("male"), "beard"))
            .language("English")
            .author("Someone")
            .exclude_category(Category::Western)
            .exclude_category(Category::NonH);

        let filter = search.filter();
        assert_eq!(filter, expected);
        assert_eq!(filter.fingerprint(), expected.fingerprint());
        assert_eq!(search.pages, 1);
        assert!(!search.wait_on_ban);
    }

    #[test]
    fn rejects_out_of_range_pages() {
        assert!(Wrapper::try_parse_from(["gdl", "-p", "0"]).is_err());
        assert_eq!(parse(&["-p", "5", "--wait-on-ban"]).pages, 5);
    }
}

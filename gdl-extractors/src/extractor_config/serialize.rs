use gdl_common::{
    log::debug,
    serde::{self, Deserialize},
};
use std::{collections::HashMap, fs::read_to_string, io::Write};
use std::{fs::File, path::Path};

use super::{ConfigError, MarkerCookie, RefreshParam, SourceConfig, DEFAULT_UA};
use crate::interceptor::ratelimit::DEFAULT_BAN_BODY_THRESHOLD;

const SAMPLE_SOURCE_TOML: &str = include_str!("sample.toml");

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct Config {
    #[serde(default)]
    sources: HashMap<String, Source>,
}

#[derive(Debug, Deserialize)]
#[serde(crate = "self::serde")]
struct Source {
    pretty_name: String,
    public_url: String,
    authenticated_url: String,
    user_agent: Option<String>,
    session_cookies: Vec<String>,
    marker_cookie: Option<MarkerCookie>,
    ban_body_threshold: Option<usize>,
    refresh_param: Option<RefreshParam>,
    cursor_capacity: Option<usize>,
}

/// Merges the sources declared in `path` into `smap`, creating the file from the bundled sample
/// first if it doesn't exist.
pub fn read_source_cfg_file(
    path: &Path,
    smap: &mut HashMap<String, SourceConfig>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        let mut sample_toml = File::create(path)?;
        sample_toml.write_all(SAMPLE_SOURCE_TOML.as_bytes())?;
        debug!("Wrote sample source config to {}", path.display());
    }

    let contents = read_to_string(path)?;
    parse_sources(&contents, smap)?;

    debug!("Configured sources: {:?}", smap.keys());
    Ok(())
}

fn parse_sources(contents: &str, smap: &mut HashMap<String, SourceConfig>) -> Result<(), ConfigError> {
    let config: Config = toml::from_str(contents)?;

    for (id, data) in config.sources {
        let config = SourceConfig {
            name: id.clone(),
            pretty_name: data.pretty_name,
            public_url: data.public_url,
            authenticated_url: data.authenticated_url,
            user_agent: data.user_agent.unwrap_or_else(|| DEFAULT_UA.to_string()),
            session_cookies: data.session_cookies,
            marker_cookie: data.marker_cookie,
            ban_body_threshold: data.ban_body_threshold.unwrap_or(DEFAULT_BAN_BODY_THRESHOLD),
            refresh_param: data.refresh_param.unwrap_or_default(),
            cursor_capacity: data.cursor_capacity,
        };

        // Fail early on bad hosts instead of at the first request
        config.public_url()?;
        config.authenticated_url()?;

        smap.insert(id, config);
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sample_parses_into_builtin() {
        let mut smap = HashMap::new();
        parse_sources(SAMPLE_SOURCE_TOML, &mut smap).unwrap();

        let source = smap.get("e-hentai").unwrap();
        let builtin = SourceConfig::default();

        assert_eq!(source.public_url, builtin.public_url);
        assert_eq!(source.authenticated_url, builtin.authenticated_url);
        assert_eq!(source.session_cookies, builtin.session_cookies);
        assert_eq!(source.marker_cookie, builtin.marker_cookie);
        assert_eq!(source.refresh_param, builtin.refresh_param);
        assert_eq!(source.cursor_capacity, None);
    }

    #[test]
    fn optional_fields_fall_back() {
        let toml = r#"
            [sources.mirror]
            pretty_name = "Mirror"
            public_url = "https://mirror.example/"
            authenticated_url = "https://members.mirror.example/"
            session_cookies = ["sid"]
            cursor_capacity = 16
        "#;

        let mut smap = HashMap::new();
        parse_sources(toml, &mut smap).unwrap();

        let source = smap.get("mirror").unwrap();
        assert_eq!(source.name, "mirror");
        assert_eq!(source.user_agent, DEFAULT_UA);
        assert_eq!(source.ban_body_threshold, DEFAULT_BAN_BODY_THRESHOLD);
        assert_eq!(source.refresh_param, RefreshParam::default());
        assert_eq!(source.marker_cookie, None);
        assert_eq!(source.cursor_capacity, Some(16));
    }

    #[test]
    fn bad_input_is_an_error() {
        let mut smap = HashMap::new();
        assert!(matches!(
            parse_sources("sources = 3", &mut smap),
            Err(ConfigError::Parse { .. })
        ));

        let toml = r#"
            [sources.broken]
            pretty_name = "Broken"
            public_url = "nope"
            authenticated_url = "https://ok.example/"
            session_cookies = []
        "#;
        assert!(matches!(
            parse_sources(toml, &mut smap),
            Err(ConfigError::InvalidUrl { field: "public_url", .. })
        ));
    }

    #[test]
    fn missing_file_is_created_from_sample() {
        let path = std::env::temp_dir().join(format!("gdl-sources-{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut smap = HashMap::new();
        read_source_cfg_file(&path, &mut smap).unwrap();

        assert!(path.exists());
        assert!(smap.contains_key("e-hentai"));
        std::fs::remove_file(&path).unwrap();
    }
}

#[macro_export]
macro_rules! source_config {
    ($name:expr, $pretty_name:expr, $public_url:expr, $authenticated_url:expr, $ua:expr, [$($cookie:expr),* $(,)?], $marker:expr, $ban_threshold:expr, $refresh:expr, $cursor_capacity:expr) => {
        SourceConfig {
            name: String::from($name),
            pretty_name: String::from($pretty_name),
            public_url: String::from($public_url),
            authenticated_url: String::from($authenticated_url),
            user_agent: String::from($ua),
            session_cookies: vec![$(String::from($cookie)),*],
            marker_cookie: $marker,
            ban_body_threshold: $ban_threshold,
            refresh_param: $refresh,
            cursor_capacity: $cursor_capacity,
        }
    };
}

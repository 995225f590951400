//! Endpoint paths, relative to the configured base URL.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, PercentEncode, utf8_percent_encode};

/// Everything except RFC 3986 unreserved characters is escaped inside a
/// path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn segment(raw: &str) -> PercentEncode<'_> {
    utf8_percent_encode(raw, PATH_SEGMENT)
}

pub const GUEST_LOGIN: &str = "/auth/guest";
pub const STEAM_LOGIN: &str = "/auth/steam";

pub const SESSION_START: &str = "/session/start";
pub const SESSION_HEARTBEAT: &str = "/session/heartbeat";
pub const SESSION_STOP: &str = "/session/stop";

pub const METADATA: &str = "/metadata";

/// `GET` one page of a leaderboard.
pub fn leaderboard_page(leaderboard_id: &str, page: u32) -> String {
    format!("/leaderboard/{}?page={page}", segment(leaderboard_id))
}

/// `POST` a score to a leaderboard.
pub fn leaderboard_submit(leaderboard_id: &str) -> String {
    format!("/leaderboard/{}", segment(leaderboard_id))
}

/// `GET` another player's metadata by their sequential id.
pub fn metadata_by_sequential_id(sequential_id: i64) -> String {
    format!("{METADATA}/{sequential_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_paths() {
        assert_eq!(leaderboard_page("weekly", 2), "/leaderboard/weekly?page=2");
        assert_eq!(leaderboard_submit("weekly"), "/leaderboard/weekly");
    }

    #[test]
    fn test_leaderboard_id_is_percent_encoded() {
        assert_eq!(
            leaderboard_page("a b/c?d#e", 1),
            "/leaderboard/a%20b%2Fc%3Fd%23e?page=1"
        );
        assert_eq!(leaderboard_submit("top-10_v2.~x"), "/leaderboard/top-10_v2.~x");
        assert_eq!(leaderboard_submit("été"), "/leaderboard/%C3%A9t%C3%A9");
    }

    #[test]
    fn test_metadata_by_sequential_id() {
        assert_eq!(metadata_by_sequential_id(7), "/metadata/7");
    }
}

//! Built-in knowledge about supported services
//!
//! Three tables keyed by lower-case service key:
//!
//! - primary-domain overrides, for services whose zone is not `<service>.com`
//! - curated hostname lists, a broad set gathered from public domain lists
//! - fallback hostnames, the minimum a service needs to work through the proxy

const PRIMARY_DOMAIN_OVERRIDES: &[(&str, &str)] = &[
    ("gemini", "gemini.google.com"),
    ("youtube", "youtube.com"),
];

pub(crate) const CURATED_LISTS: &[(&str, &[&str])] = &[
    (
        "spotify",
        &[
            "spotify.com",
            "api.spotify.com",
            "spclient.wg.spotify.com",
            "audio-fa.scdn.co",
            "spotifycdn.com",
            "scdn.co",
            "to.spotify.com",
            "open.spotify.com",
            "i.scdn.co",
            "ap-http-lb.spotify.com",
            "audio-ak-spotify-com.akamaized.net",
            "guc-spclient.spotify.com",
        ],
    ),
    (
        "gemini",
        &[
            "gemini.google.com",
            "lti.gemini.google.com",
            "client.gemini.google.com",
            "generativelanguage.googleapis.com",
            "accounts.google.com",
            "gstatic.com",
        ],
    ),
];

pub(crate) const FALLBACK_DOMAINS: &[(&str, &[&str])] = &[
    ("spotify", &["spotify.com", "scdn.co", "spotifycdn.com"]),
    ("gemini", &["gemini.google.com", "gstatic.com"]),
];

pub(crate) fn primary_domain_override(service_key: &str) -> Option<&'static str> {
    PRIMARY_DOMAIN_OVERRIDES
        .iter()
        .find(|(key, _)| *key == service_key)
        .map(|(_, domain)| *domain)
}

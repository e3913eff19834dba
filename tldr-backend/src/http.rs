use once_cell::sync::Lazy;

static SHARED_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("tldr-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            log::warn!("Failed to build configured HTTP client, using defaults: {}", e);
            reqwest::Client::new()
        })
});

/// Process-wide HTTP client (connection pool shared by Mastodon and Gemini)
pub fn shared_client() -> &'static reqwest::Client {
    &SHARED_CLIENT
}

//! Browser session management on top of the Playwright crate.
//!
//! A session owns one browser, one context and one page; each test flow
//! drives exactly one session, so no locking discipline is needed beyond
//! the page mutex Playwright itself requires.

use anyhow::{Context, Result};
use playwright::api::{Browser, BrowserContext, Page, Viewport};
use playwright::Playwright;
use regex::Regex;

/// Env vars controlling session construction.
pub const HEADLESS_VAR: &str = "BOOKWRIGHT_HEADLESS";
pub const GRID_VAR: &str = "BOOKWRIGHT_GRID";
pub const GRID_USER_VAR: &str = "BOOKWRIGHT_GRID_USER";
pub const GRID_KEY_VAR: &str = "BOOKWRIGHT_GRID_KEY";
pub const GRID_URL_VAR: &str = "BOOKWRIGHT_GRID_URL";

const DEFAULT_GRID_URL: &str = "wss://cdp.lambdatest.com/playwright";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BrowserKind {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl BrowserKind {
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "firefox" => BrowserKind::Firefox,
            "webkit" => BrowserKind::Webkit,
            _ => BrowserKind::Chromium,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrowserKind::Chromium => "chromium",
            BrowserKind::Firefox => "firefox",
            BrowserKind::Webkit => "webkit",
        }
    }
}

/// Cloud-grid connection parameters; presence of this config switches the
/// session from a local launch to a CDP connection.
#[derive(Debug, Clone)]
pub struct GridConfig {
    pub user: String,
    pub key: String,
    pub endpoint: String,
    pub build_name: String,
}

impl GridConfig {
    /// Read the grid flag and credential pair from the environment.
    /// Returns None when the flag is unset or credentials are incomplete.
    pub fn from_env() -> Option<Self> {
        let enabled = std::env::var(GRID_VAR)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        if !enabled {
            return None;
        }

        let user = std::env::var(GRID_USER_VAR).ok()?;
        let key = std::env::var(GRID_KEY_VAR).ok()?;
        let endpoint =
            std::env::var(GRID_URL_VAR).unwrap_or_else(|_| DEFAULT_GRID_URL.to_string());

        Some(Self {
            user,
            key,
            endpoint,
            build_name: build_name_from_ci(),
        })
    }

    fn connect_url(&self, browser: BrowserKind) -> String {
        let capabilities = serde_json::json!({
            "browserName": browser.name(),
            "user": self.user,
            "accessKey": self.key,
            "build": self.build_name,
        });
        format!(
            "{}?capabilities={}",
            self.endpoint,
            percent_encode(&capabilities.to_string())
        )
    }
}

/// Build name assembled from CI variables when present.
pub fn build_name_from_ci() -> String {
    let branch = std::env::var("GIT_BRANCH").unwrap_or_else(|_| "local".to_string());
    let commit = std::env::var("GIT_COMMIT").unwrap_or_default();
    let run_id = std::env::var("CI_RUN_ID").unwrap_or_default();

    let mut parts = vec![format!("bookwright-{}", branch)];
    if !commit.is_empty() {
        parts.push(commit.chars().take(8).collect());
    }
    if !run_id.is_empty() {
        parts.push(run_id);
    }
    sanitize_name(&parts.join("-"))
}

fn sanitize_name(name: &str) -> String {
    // Grid build names reject most punctuation.
    let re = Regex::new(r"[^A-Za-z0-9._-]+").expect("static regex");
    re.replace_all(name, "-").trim_matches('-').to_string()
}

fn percent_encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() * 3);
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub browser: BrowserKind,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub grid: Option<GridConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let headless = std::env::var(HEADLESS_VAR)
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Self {
            browser: BrowserKind::Chromium,
            headless,
            viewport_width: 1280,
            viewport_height: 720,
            grid: GridConfig::from_env(),
        }
    }
}

/// One live browser session: playwright handle, browser, context, page.
pub struct BrowserSession {
    #[allow(dead_code)]
    playwright: Playwright,
    #[allow(dead_code)]
    browser: Browser,
    #[allow(dead_code)]
    context: BrowserContext,
    page: Page,
    config: SessionConfig,
}

impl BrowserSession {
    /// Launch a local browser or connect to the cloud grid, then open a
    /// fresh page with the configured viewport.
    pub async fn launch(config: SessionConfig) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let browser = if let Some(ref grid) = config.grid {
            // Grid execution rides the Chromium CDP bridge regardless of
            // the requested browser; the grid maps capabilities itself.
            let url = grid.connect_url(config.browser);
            log::info!("connecting to grid build '{}'", grid.build_name);
            playwright
                .chromium()
                .connect_over_cdp_builder(&url)
                .connect_over_cdp()
                .await
                .context("Failed to connect to cloud grid")?
        } else {
            match config.browser {
                BrowserKind::Chromium => {
                    playwright
                        .chromium()
                        .launcher()
                        .headless(config.headless)
                        .launch()
                        .await?
                }
                BrowserKind::Firefox => {
                    playwright
                        .firefox()
                        .launcher()
                        .headless(config.headless)
                        .launch()
                        .await?
                }
                BrowserKind::Webkit => {
                    playwright
                        .webkit()
                        .launcher()
                        .headless(config.headless)
                        .launch()
                        .await?
                }
            }
        };

        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;
        page.set_viewport_size(Viewport {
            width: config.viewport_width as i32,
            height: config.viewport_height as i32,
        })
        .await?;

        Ok(Self {
            playwright,
            browser,
            context,
            page,
            config,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn browser_name(&self) -> &'static str {
        self.config.browser.name()
    }

    pub fn is_grid(&self) -> bool {
        self.config.grid.is_some()
    }

    /// Park the page before teardown; the browser itself is dropped with
    /// the session.
    pub async fn shutdown(&self) {
        let _ = self.page.goto_builder("about:blank").goto().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_name_is_sanitized() {
        assert_eq!(sanitize_name("feature/login tests!"), "feature-login-tests");
        assert_eq!(sanitize_name("release-1.2.3"), "release-1.2.3");
    }

    #[test]
    fn connect_url_embeds_capabilities() {
        let grid = GridConfig {
            user: "alice".to_string(),
            key: "secret".to_string(),
            endpoint: "wss://grid.example/playwright".to_string(),
            build_name: "bookwright-main".to_string(),
        };
        let url = grid.connect_url(BrowserKind::Chromium);
        assert!(url.starts_with("wss://grid.example/playwright?capabilities="));
        assert!(url.contains("alice"));
        // JSON punctuation is escaped.
        assert!(!url.contains('{'));
    }

    #[test]
    fn percent_encode_covers_reserved_chars() {
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("{\"k\":1}"), "%7B%22k%22%3A1%7D");
    }

    #[test]
    fn browser_kind_parse_defaults_to_chromium() {
        assert_eq!(BrowserKind::parse("Firefox"), BrowserKind::Firefox);
        assert_eq!(BrowserKind::parse("edge"), BrowserKind::Chromium);
    }
}

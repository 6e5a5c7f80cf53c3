//! Google Scholar search: fetch a results page and pull out direct PDF links.

use crate::config::AnalysisConfig;
use crate::error::InsightError;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

/// The "[PDF]" side links on a Scholar results page.
static PDF_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".gs_or_ggsm a").unwrap());

pub(crate) const USER_AGENT: &str = "Mozilla/5.0";

/// Search `config.scholar_base_url` for `query` and return up to
/// `num_results` PDF links, in page order.
pub async fn search_scholar(
    query: &str,
    num_results: usize,
    config: &AnalysisConfig,
) -> Result<Vec<String>, InsightError> {
    let search_failed = |reason: String| InsightError::SearchFailed {
        query: query.to_string(),
        reason,
    };

    let client = http_client(config.download_timeout_secs).map_err(|e| search_failed(e.to_string()))?;
    let url = format!("{}/scholar", config.scholar_base_url);
    info!("Searching scholar for '{}'", query);

    let response = client
        .get(&url)
        .query(&[("q", query)])
        .send()
        .await
        .map_err(|e| search_failed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(search_failed(format!("HTTP {}", response.status())));
    }

    let html = response
        .text()
        .await
        .map_err(|e| search_failed(e.to_string()))?;

    let links = parse_pdf_links(&html, num_results);
    debug!("Found {} PDF link(s) for '{}'", links.len(), query);
    Ok(links)
}

/// Every `.gs_or_ggsm a` whose `href` ends in `.pdf`, at most `limit`.
pub fn parse_pdf_links(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&PDF_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.ends_with(".pdf"))
        .take(limit)
        .map(String::from)
        .collect()
}

pub(crate) fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="gs_r">
            <div class="gs_or_ggsm"><a href="https://a.example/one.pdf">[PDF]</a></div>
            <h3><a href="https://a.example/landing">Paper one</a></h3>
          </div>
          <div class="gs_r">
            <div class="gs_or_ggsm"><a href="https://b.example/view?id=2">[HTML]</a></div>
          </div>
          <div class="gs_r">
            <div class="gs_or_ggsm"><a href="https://c.example/three.pdf">[PDF]</a></div>
          </div>
          <a href="https://d.example/outside.pdf">not a side link</a>
        </body></html>
    "#;

    #[test]
    fn keeps_only_pdf_side_links_in_order() {
        assert_eq!(
            parse_pdf_links(PAGE, 10),
            vec!["https://a.example/one.pdf", "https://c.example/three.pdf"]
        );
    }

    #[test]
    fn respects_limit() {
        assert_eq!(parse_pdf_links(PAGE, 1), vec!["https://a.example/one.pdf"]);
        assert!(parse_pdf_links(PAGE, 0).is_empty());
    }

    #[test]
    fn empty_page_has_no_links() {
        assert!(parse_pdf_links("", 5).is_empty());
    }
}

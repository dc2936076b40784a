//! Download link discovery on the publisher's landing page

use chrono::NaiveDate;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::error::{IngestError, IngestResult};
use crate::sheet::mapper::parse_dotted_date;

/// `(dd.mm.yyyy)` as printed in the link text
static PUBLISH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d{2}\.\d{2}\.\d{4})\)").expect("valid publish date pattern"));

/// Link to the current workbook, as found on the landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    /// `href` of the link, usually relative to the publisher host
    pub path: String,
    /// Publish date printed in the link text
    pub publish_date: NaiveDate,
}

/// Finds the workbook link by its visible text
#[derive(Debug, Clone)]
pub struct LinkResolver {
    marker: String,
}

impl LinkResolver {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Extract the download path and publish date from `html`.
    ///
    /// A link dated after `today` is rejected: it means the anchor matched
    /// is not the one we are looking for.
    pub fn resolve(&self, html: &str, today: NaiveDate) -> IngestResult<ResolvedLink> {
        let document = Html::parse_document(html);
        let selector = Selector::parse("a")
            .map_err(|e| IngestError::LinkNotFound(format!("invalid selector: {}", e)))?;

        let (element, text) = document
            .select(&selector)
            .map(|element| (element, visible_text(element.text())))
            .find(|(_, text)| text.contains(&self.marker))
            .ok_or_else(|| {
                IngestError::LinkNotFound(format!("no link with text containing {:?}", self.marker))
            })?;

        let path = element
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or_else(|| IngestError::LinkNotFound(format!("link {:?} has no href", text)))?
            .to_string();

        let publish_date = PUBLISH_DATE
            .captures(&text)
            .and_then(|caps| parse_dotted_date(&caps[1]))
            .ok_or_else(|| IngestError::DateNotFound(text.clone()))?;

        if publish_date > today {
            return Err(IngestError::LinkNotFound(format!(
                "future-dated source: link dated {} is after {}",
                publish_date, today
            )));
        }

        tracing::debug!(%path, %publish_date, "Resolved download link");
        Ok(ResolvedLink { path, publish_date })
    }
}

/// Concatenate text nodes and collapse whitespace
fn visible_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

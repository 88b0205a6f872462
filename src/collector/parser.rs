//! HTML extractor for case pages
//!
//! This module turns a fetched case page into a `CaseRecord`:
//! - Title from the configured title selector
//! - Header fields from two-or-more-cell rows (label, value)
//! - Docket entries from table rows (number, date, office, summary)

use crate::case::{CaseRecord, DocketEntry};
use crate::collector::prober::{CaseDocument, ExtractionError, Extractor};
use crate::config::ExtractorConfig;
use scraper::{ElementRef, Html, Selector};

/// Selector-driven extractor for case pages
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    title: Selector,
    header_rows: Selector,
    docket_rows: Selector,
    header_cells: Selector,
    docket_cells: Selector,
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector)
        .map_err(|e| ExtractionError::Selector(format!("'{}': {:?}", selector, e)))
}

impl HtmlExtractor {
    /// Builds an extractor from configured CSS selectors
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            title: parse_selector(&config.title_selector)?,
            header_rows: parse_selector(&config.header_row_selector)?,
            docket_rows: parse_selector(&config.docket_row_selector)?,
            header_cells: parse_selector("th, td")?,
            docket_cells: parse_selector("td")?,
        })
    }
}

/// Collapses all runs of whitespace in an element's text
fn clean_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, document: &CaseDocument) -> Result<CaseRecord, ExtractionError> {
        let html = Html::parse_document(&document.body);

        let title = html
            .select(&self.title)
            .next()
            .map(|element| clean_text(&element))
            .filter(|s| !s.is_empty());

        let mut fields = Vec::new();
        for row in html.select(&self.header_rows) {
            let cells: Vec<String> = row
                .select(&self.header_cells)
                .map(|cell| clean_text(&cell))
                .collect();
            if cells.len() < 2 {
                continue;
            }

            let label = cells[0].trim_end_matches(':').trim().to_string();
            let value = cells[1..].join(" ").trim().to_string();
            if !label.is_empty() {
                fields.push((label, value));
            }
        }

        if fields.is_empty() {
            return Err(ExtractionError::Malformed {
                id: document.id.to_string(),
                message: "no header fields found".to_string(),
            });
        }

        let mut docket = Vec::new();
        for row in html.select(&self.docket_rows) {
            let cells: Vec<String> = row
                .select(&self.docket_cells)
                .map(|cell| clean_text(&cell))
                .collect();

            // Header rows use <th> only
            if cells.is_empty() {
                continue;
            }

            let entry = if cells.len() >= 4 {
                DocketEntry {
                    number: cells[0].parse().ok(),
                    date: non_empty(&cells[1]),
                    office: non_empty(&cells[2]),
                    summary: cells[3..].join(" "),
                }
            } else {
                DocketEntry {
                    number: None,
                    date: None,
                    office: None,
                    summary: cells.join(" "),
                }
            };
            docket.push(entry);
        }

        Ok(CaseRecord {
            id: document.id.clone(),
            title,
            fields,
            docket,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CaseId;

    const CASE_PAGE: &str = r#"
        <html><body>
        <h2 class="style-of-cause">  JOHN DOE
            v. THE MINISTER  </h2>
        <table class="case-header">
            <tr><th>Court Number:</th><td>IMM-45-23</td></tr>
            <tr><th>Type:</th><td>Immigration Matters</td></tr>
            <tr><th>Nature of Proceeding:</th><td>Imm - Appl. for leave &amp; judicial review</td></tr>
            <tr><td colspan="2">decorative row</td></tr>
        </table>
        <table class="docket">
            <thead><tr><th>ID</th><th>Date Filed</th><th>Office</th><th>Recorded Entry Summary</th></tr></thead>
            <tbody>
            <tr><td>2</td><td>2023-01-06</td><td>Toronto</td><td>Acknowledgment of receipt</td></tr>
            <tr><td>1</td><td>2023-01-04</td><td>Toronto</td><td>Application for leave filed</td></tr>
            </tbody>
        </table>
        </body></html>
    "#;

    fn config() -> ExtractorConfig {
        ExtractorConfig {
            title_selector: "h2.style-of-cause".to_string(),
            header_row_selector: "table.case-header tr".to_string(),
            docket_row_selector: "table.docket tr".to_string(),
        }
    }

    fn document(body: &str) -> CaseDocument {
        CaseDocument {
            id: CaseId::new("IMM", 45, 23).unwrap(),
            url: "https://court.example/cases/IMM-45-23".to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_extract_case_page() {
        let extractor = HtmlExtractor::new(&config()).unwrap();
        let record = extractor.extract(&document(CASE_PAGE)).unwrap();

        assert_eq!(record.title.as_deref(), Some("JOHN DOE v. THE MINISTER"));
        assert_eq!(record.fields.len(), 3);
        assert_eq!(record.field("Court Number"), Some("IMM-45-23"));
        assert_eq!(
            record.field("Nature of Proceeding"),
            Some("Imm - Appl. for leave & judicial review")
        );

        assert_eq!(record.docket.len(), 2);
        assert_eq!(record.docket[0].number, Some(2));
        assert_eq!(record.docket[0].office.as_deref(), Some("Toronto"));
        assert_eq!(record.docket[1].summary, "Application for leave filed");
    }

    #[test]
    fn test_missing_header_is_malformed() {
        let extractor = HtmlExtractor::new(&config()).unwrap();
        let result = extractor.extract(&document("<html><body><p>Maintenance</p></body></html>"));
        assert!(matches!(result, Err(ExtractionError::Malformed { .. })));
    }

    #[test]
    fn test_short_docket_rows_keep_text() {
        let extractor = HtmlExtractor::new(&config()).unwrap();
        let body = r#"
            <table class="case-header"><tr><th>Type</th><td>Appeal</td></tr></table>
            <table class="docket"><tr><td>Sealed</td><td>entry</td></tr></table>
        "#;
        let record = extractor.extract(&document(body)).unwrap();
        assert_eq!(record.title, None);
        assert_eq!(record.docket.len(), 1);
        assert_eq!(record.docket[0].summary, "Sealed entry");
        assert_eq!(record.docket[0].number, None);
    }

    #[test]
    fn test_invalid_selector() {
        let mut bad = config();
        bad.title_selector = "h2[".to_string();
        assert!(matches!(
            HtmlExtractor::new(&bad),
            Err(ExtractionError::Selector(_))
        ));
    }
}

use crate::case::CaseId;

/// Structured data extracted from one case page
#[derive(Debug, Clone, PartialEq)]
pub struct CaseRecord {
    /// The id this page was fetched for
    pub id: CaseId,

    /// Style of cause or page heading, if present
    pub title: Option<String>,

    /// Header fields as (label, value) pairs, in page order
    pub fields: Vec<(String, String)>,

    /// Recorded docket entries, in page order
    pub docket: Vec<DocketEntry>,
}

impl CaseRecord {
    /// Looks up a header field by label (case-insensitive)
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, value)| value.as_str())
    }
}

/// One row of a case's docket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocketEntry {
    pub number: Option<u32>,
    pub date: Option<String>,
    pub office: Option<String>,
    pub summary: String,
}

/// Case id value object
///
/// Ids look like `IMM-45-23`: a court prefix, a sequence number and a
/// two-digit year. The sequence number space is scoped per year.
use crate::CaseIdError;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Identifies one case on the origin service
///
/// Equality, hashing and ordering only look at `(year, number)`; the prefix
/// is carried for display and URL building.
#[derive(Debug, Clone)]
pub struct CaseId {
    prefix: String,
    number: u32,
    year: u8,
}

impl CaseId {
    /// Creates a case id, validating the prefix and the two-digit year
    pub fn new(prefix: impl Into<String>, number: u32, year: u8) -> Result<Self, CaseIdError> {
        let prefix = prefix.into();
        if prefix.trim().is_empty() {
            return Err(CaseIdError::EmptyPrefix);
        }
        if year > 99 {
            return Err(CaseIdError::InvalidYear(year as u32));
        }
        Ok(Self {
            prefix,
            number,
            year,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn year(&self) -> u8 {
        self.year
    }

    /// Returns the id with the same prefix and year but another number
    pub fn with_number(&self, number: u32) -> Self {
        Self {
            prefix: self.prefix.clone(),
            number,
            year: self.year,
        }
    }
}

impl PartialEq for CaseId {
    fn eq(&self, other: &Self) -> bool {
        self.year == other.year && self.number == other.number
    }
}

impl Eq for CaseId {}

impl Hash for CaseId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.year.hash(state);
        self.number.hash(state);
    }
}

impl Ord for CaseId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.year
            .cmp(&other.year)
            .then_with(|| self.number.cmp(&other.number))
    }
}

impl PartialOrd for CaseId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{:02}", self.prefix, self.number, self.year)
    }
}

impl FromStr for CaseId {
    type Err = CaseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Prefixes may contain hyphens themselves, so split from the right
        let mut parts = s.trim().rsplitn(3, '-');
        let (Some(year), Some(number), Some(prefix)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CaseIdError::Malformed(s.to_string()));
        };

        let number: u32 = number
            .parse()
            .map_err(|_| CaseIdError::Malformed(s.to_string()))?;

        if year.len() != 2 {
            return Err(CaseIdError::Malformed(s.to_string()));
        }
        let year: u8 = year
            .parse()
            .map_err(|_| CaseIdError::Malformed(s.to_string()))?;

        CaseId::new(prefix, number, year)
    }
}

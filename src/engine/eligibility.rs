use crate::error::AppError;
use crate::models::booking::ServiceCategory;
use crate::models::driver::{Driver, Respondent};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityQuery {
    pub category: ServiceCategory,
    pub region: Option<String>,
}

impl EligibilityQuery {
    pub fn new(category: ServiceCategory) -> Self {
        Self {
            category,
            region: None,
        }
    }

    pub fn in_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }
}

/// A single predicate a driver must satisfy to receive a booking.
pub trait EligibilityRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn admits(&self, driver: &Driver, query: &EligibilityQuery) -> bool;
}

/// Subscribed package matches the category, or is the catch-all tier.
pub struct PackageCoverage;

impl EligibilityRule for PackageCoverage {
    fn name(&self) -> &'static str {
        "package_coverage"
    }

    fn admits(&self, driver: &Driver, query: &EligibilityQuery) -> bool {
        driver
            .package
            .is_some_and(|package| package.covers(query.category))
    }
}

pub struct Online;

impl EligibilityRule for Online {
    fn name(&self) -> &'static str {
        "online"
    }

    fn admits(&self, driver: &Driver, _query: &EligibilityQuery) -> bool {
        driver.online
    }
}

/// Exact, case-insensitive region match. Queries without a region admit everyone.
pub struct SameRegion;

impl EligibilityRule for SameRegion {
    fn name(&self) -> &'static str {
        "same_region"
    }

    fn admits(&self, driver: &Driver, query: &EligibilityQuery) -> bool {
        match (&query.region, &driver.region) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
            (Some(_), None) => false,
        }
    }
}

pub struct EligibilityFilter {
    rules: Vec<Box<dyn EligibilityRule>>,
}

impl EligibilityFilter {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl EligibilityRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn admits(&self, driver: &Driver, query: &EligibilityQuery) -> bool {
        self.rules.iter().all(|rule| rule.admits(driver, query))
    }
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self::empty()
            .with_rule(PackageCoverage)
            .with_rule(Online)
            .with_rule(SameRegion)
    }
}

/// Snapshot of respondents eligible right now, ordered by id. Never persisted.
pub fn eligible_respondents(state: &AppState, query: &EligibilityQuery) -> Vec<Respondent> {
    let mut respondents: Vec<Respondent> = state
        .drivers
        .iter()
        .filter(|entry| state.eligibility.admits(entry.value(), query))
        .map(|entry| entry.value().respondent())
        .collect();

    respondents.sort_by_key(|respondent| respondent.id);
    respondents
}

pub fn find_eligible_drivers(
    state: &AppState,
    category: &str,
    region: Option<&str>,
) -> Result<Vec<Respondent>, AppError> {
    let category = category.parse::<ServiceCategory>()?;
    let query = EligibilityQuery::new(category).in_region(region.map(str::to_string));

    Ok(eligible_respondents(state, &query))
}

//! Search-and-results view
//!
//! Holds the address being edited, the in-flight flag, the current results
//! and the error notice, and turns them into what a front end should show.
//! Front ends (the TUI and the one-shot `search` command) drive it through
//! [`FinderView::submit`] and [`FinderView::complete`].

use std::fmt::Display;
use tracing::{info, warn};

use crate::client::EligibilitySource;
use crate::models::{AddressRequest, CcaResult};

pub const TITLE: &str = "CCA Finder";
pub const ADDRESS_PLACEHOLDER: &str = "Enter address, city, or zip";
pub const SUBMIT_LABEL: &str = "Search";
pub const SUBMIT_LABEL_PENDING: &str = "Searching...";
pub const RESULTS_HEADING: &str = "Eligible CCAs";
pub const FAILURE_NOTICE: &str = "Failed to fetch results.";
pub const EMPTY_NOTICE: &str = "No eligible CCAs found.";
pub const NO_LINK_PLACEHOLDER: &str = "No signup link available";

#[derive(Debug, Default)]
pub struct FinderView {
    address: String,
    results: Vec<CcaResult>,
    loading: bool,
    error: Option<String>,
}

/// What the results area shows
#[derive(Debug, PartialEq, Eq)]
pub enum ResultsPanel<'a> {
    /// A request is in flight
    Hidden,
    /// No results to show
    Empty(&'static str),
    Entries(Vec<EntryView<'a>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryLink<'a> {
    Signup(&'a str),
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView<'a> {
    pub name: &'a str,
    pub link: EntryLink<'a>,
}

impl<'a> From<&'a CcaResult> for EntryView<'a> {
    fn from(result: &'a CcaResult) -> Self {
        Self {
            name: &result.cca_name,
            link: match result.link() {
                Some(link) => EntryLink::Signup(link),
                None => EntryLink::Missing(NO_LINK_PLACEHOLDER),
            },
        }
    }
}

/// Everything a front end needs to draw the view
#[derive(Debug, PartialEq, Eq)]
pub struct FinderDisplay<'a> {
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub error: Option<&'a str>,
    pub results: ResultsPanel<'a>,
}

impl FinderView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn results(&self) -> &[CcaResult] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Start a search. Returns the request to send, or `None` when the
    /// address is empty or a search is already running.
    pub fn submit(&mut self) -> Option<AddressRequest> {
        if self.loading || self.address.is_empty() {
            return None;
        }

        self.loading = true;
        self.error = None;
        self.results.clear();
        Some(AddressRequest {
            address: self.address.clone(),
        })
    }

    pub fn finish_with_results(&mut self, results: Vec<CcaResult>) {
        self.loading = false;
        self.error = None;
        self.results = results;
    }

    /// Record a failed search. The reason is logged; users only ever see
    /// the generic notice.
    pub fn finish_with_failure(&mut self, reason: impl Display) {
        warn!("Search failed: {}", reason);
        self.loading = false;
        self.results.clear();
        self.error = Some(FAILURE_NOTICE.to_string());
    }

    pub fn complete<E: Display>(&mut self, outcome: Result<Vec<CcaResult>, E>) {
        match outcome {
            Ok(results) => self.finish_with_results(results),
            Err(e) => self.finish_with_failure(e),
        }
    }

    /// Submit and wait for the answer. Returns `false` if nothing was sent.
    pub async fn search<S: EligibilitySource + ?Sized>(&mut self, source: &S) -> bool {
        let Some(request) = self.submit() else {
            return false;
        };

        info!("Searching eligible CCAs for '{}'", request.address);
        let outcome = source.eligible_ccas(&request.address).await;
        self.complete(outcome);
        true
    }

    pub fn display(&self) -> FinderDisplay<'_> {
        let results = if self.loading {
            ResultsPanel::Hidden
        } else if !self.results.is_empty() {
            ResultsPanel::Entries(self.results.iter().map(EntryView::from).collect())
        } else {
            ResultsPanel::Empty(EMPTY_NOTICE)
        };

        FinderDisplay {
            submit_label: if self.loading { SUBMIT_LABEL_PENDING } else { SUBMIT_LABEL },
            submit_enabled: !self.loading,
            error: if self.loading { None } else { self.error.as_deref() },
            results,
        }
    }
}

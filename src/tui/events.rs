//! Event handling for the CCA Finder TUI

use crate::models::CcaResult;

/// Events delivered to the main loop from background tasks
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Search completed with results
    SearchComplete(Vec<CcaResult>),
    /// Search failed
    SearchFailed(String),
}

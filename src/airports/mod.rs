//! Airport lists and per-airport starting pages.

mod codes;
mod pagination;

use std::path::PathBuf;

use crate::error_handling::AirportListError;

pub use codes::{available_regions, load_airport_codes};
pub use pagination::page_for_index;

/// Where the runner gets a region's airports and their starting pages.
pub trait AirportDirectory: Send + Sync {
    /// Ordered, deduplicated airport codes for `region`.
    fn load_codes(&self, region: &str) -> Result<Vec<String>, AirportListError>;

    /// Starting page for the airport at `index` in the region's list.
    fn start_page(&self, region: &str, index: usize) -> i32 {
        page_for_index(region, index)
    }
}

/// File-backed directory reading `airport_<REGION>.txt` from `data_dir`.
#[derive(Debug, Clone)]
pub struct AirportFiles {
    data_dir: PathBuf,
}

impl AirportFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn regions(&self) -> Vec<String> {
        available_regions(&self.data_dir)
    }
}

impl AirportDirectory for AirportFiles {
    fn load_codes(&self, region: &str) -> Result<Vec<String>, AirportListError> {
        load_airport_codes(&self.data_dir, region)
    }
}

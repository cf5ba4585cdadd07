//! Task enumeration: (airport, page) pairs for a region.

use crate::airports::AirportDirectory;
use crate::config::PAGE_SEQUENCE_END;

/// One unit of fetch + transform + persist work.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Task {
    pub airport_code: String,
    pub page: i32,
}

/// Pages from `start_page` up to, but excluding, page 2, skipping page 0,
/// truncated to `max_pages` when set.
///
/// ```
/// use flight_ingest::jobs::page_sequence;
///
/// assert_eq!(page_sequence(-3, None), vec![-3, -2, -1, 1]);
/// assert_eq!(page_sequence(-3, Some(2)), vec![-3, -2]);
/// ```
pub fn page_sequence(start_page: i32, max_pages: Option<usize>) -> Vec<i32> {
    let pages = (start_page..PAGE_SEQUENCE_END).filter(|&page| page != 0);
    match max_pages {
        Some(max) => pages.take(max).collect(),
        None => pages.collect(),
    }
}

/// Flattens a region's airports into tasks, airport by airport in list order.
pub fn build_task_list(
    directory: &dyn AirportDirectory,
    region: &str,
    airports: &[String],
    max_pages: Option<usize>,
) -> Vec<Task> {
    airports
        .iter()
        .enumerate()
        .flat_map(|(index, airport)| {
            page_sequence(directory.start_page(region, index), max_pages)
                .into_iter()
                .map(move |page| Task {
                    airport_code: airport.clone(),
                    page,
                })
        })
        .collect()
}

//! Skip/take paging over the job listing
//!
//! The listing endpoint is paged manually: each call returns at most `take`
//! jobs starting at `skip`. [`collect_jobs`] walks the pages until one comes
//! back short, with an iteration cap against runaway loops.
//!
//! A page that fails after its retry contributes no rows. When the server
//! total is known paging moves on past it; otherwise paging ends there and
//! whatever was collected so far is still returned.

use tracing::{debug, warn};

use super::jobs::{JobFilter, JobQuery};
use super::{FetcherError, FetcherResult, Token, WellDataSource};
use crate::Job;

/// Maximum number of pages fetched in one listing
pub const MAX_PAGES: usize = 10_000;

/// Jobs gathered across pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobListing {
    /// Total reported by the server on the first page, when requested
    pub total: Option<u64>,
    /// Jobs that passed the filter, in server order
    pub jobs: Vec<Job>,
    /// Pages fetched successfully
    pub pages: usize,
    /// Jobs returned before filtering
    pub unfiltered: usize,
    /// Whether a page failed and its rows are missing
    pub truncated: bool,
}

/// Fetch one page and apply `filter`
pub async fn list_filtered_page(
    source: &dyn WellDataSource,
    token: &Token,
    query: &JobQuery,
    filter: &JobFilter,
) -> FetcherResult<(Option<u64>, Vec<Job>, usize)> {
    let page = source.list_jobs(token, query).await?;
    let returned = page.jobs.len();
    Ok((page.total, filter.apply(page.jobs), returned))
}

/// Walk every page starting at `first`
///
/// # Errors
/// Only [`FetcherError::PaginationLimit`]; page failures are absorbed.
pub async fn collect_jobs(
    source: &dyn WellDataSource,
    token: &Token,
    first: JobQuery,
    filter: &JobFilter,
    max_pages: usize,
) -> FetcherResult<JobListing> {
    let mut listing = JobListing::default();
    let mut query = first;
    let mut attempted = 0;

    loop {
        if attempted >= max_pages {
            return Err(FetcherError::PaginationLimit(max_pages));
        }
        attempted += 1;

        debug!(
            "Fetching jobs page {} (skip={}, take={})",
            attempted, query.skip, query.take
        );

        let (total, jobs, returned) = match list_filtered_page(source, token, &query, filter).await {
            Ok(page) => page,
            Err(e) => {
                listing.truncated = true;
                let next = query.next_page();
                match listing.total {
                    Some(total) if query.take > 0 && u64::from(next.skip) < total => {
                        warn!("Jobs page at skip={} failed, moving on to skip={}: {}", query.skip, next.skip, e);
                        query = next;
                        continue;
                    }
                    _ => {
                        warn!(
                            "Jobs page at skip={} failed, continuing with {} jobs: {}",
                            query.skip,
                            listing.jobs.len(),
                            e
                        );
                        break;
                    }
                }
            }
        };

        if listing.total.is_none() {
            listing.total = total;
        }
        listing.pages += 1;
        listing.unfiltered += returned;
        listing.jobs.extend(jobs);

        if returned < query.take as usize || query.take == 0 {
            debug!(
                "Paging complete after {} pages: {} jobs kept of {}",
                listing.pages,
                listing.jobs.len(),
                listing.unfiltered
            );
            break;
        }

        query = query.next_page();
    }

    Ok(listing)
}

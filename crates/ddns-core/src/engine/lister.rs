//! Lazy, cursor-driven record listing
//!
//! [`list_records`] turns [`DnsProvider::list_records_page`] into a single
//! stream of records. Pages are fetched on demand: the first poll fetches
//! the first page, and the next page is only requested once every record of
//! the current one has been yielded. Dropping the stream early therefore
//! never fetches the remaining pages.

use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsRecord, PageCursor};
use futures_util::stream;
use std::collections::VecDeque;
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::debug;

/// Stream of records borrowed from a provider
pub type RecordStream<'a> = Pin<Box<dyn Stream<Item = Result<DnsRecord>> + Send + 'a>>;

struct ListState<'a> {
    provider: &'a dyn DnsProvider,
    domain: &'a str,
    /// Cursor for the next fetch; `None` requests the first page
    cursor: Option<PageCursor>,
    buffered: VecDeque<DnsRecord>,
    exhausted: bool,
}

/// List every record of `domain`, one page at a time
///
/// The stream ends after the page whose `pagination.next` is absent. Each
/// call starts again from the first page; a failed page fetch ends the
/// stream with that error.
pub fn list_records<'a>(provider: &'a dyn DnsProvider, domain: &'a str) -> RecordStream<'a> {
    let state = ListState {
        provider,
        domain,
        cursor: None,
        buffered: VecDeque::new(),
        exhausted: false,
    };

    Box::pin(stream::try_unfold(state, |mut state| async move {
        loop {
            if let Some(record) = state.buffered.pop_front() {
                return Ok(Some((record, state)));
            }
            if state.exhausted {
                return Ok(None);
            }

            let since = state.cursor;
            let page = state.provider.list_records_page(state.domain, since).await?;
            debug!(
                provider = state.provider.provider_name(),
                domain = state.domain,
                since = ?since,
                records = page.records.len(),
                next = ?page.pagination.next,
                "Fetched record page"
            );

            match page.pagination.next {
                Some(next) if since == Some(next) => {
                    return Err(Error::dns_provider(format!(
                        "{} pagination for {} did not advance past cursor {}",
                        state.provider.provider_name(),
                        state.domain,
                        next
                    )));
                }
                Some(next) => state.cursor = Some(next),
                None => state.exhausted = true,
            }

            state.buffered.extend(page.records);
        }
    }))
}

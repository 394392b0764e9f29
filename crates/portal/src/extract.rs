use std::{
    collections::{hash_map::DefaultHasher, HashSet},
    hash::{Hash, Hasher},
    vec,
};

use log::{debug, info, warn};

use crate::{
    config::PortalConfig,
    locator::{self, Locator},
    page::{Page, RawTable},
};

/// Rows collected across all result pages. Consumed once.
pub struct RawRows(vec::IntoIter<Vec<String>>);

impl Iterator for RawRows {
    type Item = Vec<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for RawRows {}

pub struct Extracted {
    /// Header of the first page, empty if the table had none.
    pub header: Vec<String>,
    pub rows: RawRows,
    pub pages: usize,
}

pub struct TableExtractor<'a> {
    config: &'a PortalConfig,
}

impl<'a> TableExtractor<'a> {
    pub fn new(config: &'a PortalConfig) -> Self {
        TableExtractor { config }
    }

    pub async fn extract<P: Page>(&self, page: &mut P) -> Extracted {
        let mut header = None;
        let mut rows = Vec::new();
        let mut pages = 0;
        let mut seen = HashSet::new();

        loop {
            let Some(table) = self.locate(page).await else {
                if pages == 0 {
                    warn!("No results table found");
                } else {
                    warn!("Results table disappeared after page {}", pages);
                }
                break;
            };

            if !seen.insert(fingerprint(&table)) {
                warn!("Page {} repeats an earlier page, stopping", pages + 1);
                break;
            }
            pages += 1;

            let before = rows.len();
            if header.is_none() {
                header = Some(table.header);
            }
            for row in table.rows {
                match row {
                    Ok(cells) => {
                        let populated = cells.iter().filter(|c| !c.trim().is_empty()).count();
                        if populated >= self.config.min_populated_cells {
                            rows.push(cells);
                        } else {
                            debug!("Skipping row with {} populated cells", populated);
                        }
                    }
                    Err(err) => warn!("Skipping unreadable row: {}", err),
                }
            }
            info!("Page {}: {} rows", pages, rows.len() - before);

            if pages >= self.config.max_pages {
                warn!("Stopping at the {} page limit", self.config.max_pages);
                break;
            }
            if !self.next_page(page).await {
                break;
            }
        }

        Extracted {
            header: header.unwrap_or_default(),
            rows: RawRows(rows.into_iter()),
            pages,
        }
    }

    async fn locate<P: Page>(&self, page: &mut P) -> Option<RawTable> {
        for candidate in locator::result_tables() {
            if !page.wait_visible(&candidate, self.config.timeouts.table).await {
                continue;
            }
            if let Some(table) = page.read_table(&candidate).await {
                debug!("Results table found via {}", candidate);
                return Some(table);
            }
        }
        None
    }

    /// Moves to the next page. False when there is none.
    async fn next_page<P: Page>(&self, page: &mut P) -> bool {
        let Some(control) = self.next_control(page).await else {
            debug!("No next page control");
            return false;
        };
        if !page.is_enabled(&control).await {
            debug!("Next page control {} is disabled", control);
            return false;
        }
        if let Err(err) = page.click(&control, self.config.timeouts.field).await {
            warn!("Failed to open next page: {}", err);
            return false;
        }
        page.settle(self.config.timeouts.page_settle).await;
        true
    }

    async fn next_control<P: Page>(&self, page: &P) -> Option<Locator> {
        for candidate in locator::next_page_controls() {
            if page.count(&candidate).await > 0 {
                return Some(candidate);
            }
        }
        None
    }
}

fn fingerprint(table: &RawTable) -> u64 {
    let mut hasher = DefaultHasher::new();
    for row in table.rows.iter().flatten() {
        row.hash(&mut hasher);
    }
    hasher.finish()
}

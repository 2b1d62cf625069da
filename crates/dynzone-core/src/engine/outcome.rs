//! Per-scope outcomes and the run summary
//!
//! Each scope of a run (account, domain, record) reports what happened as a
//! value. The engine matches on these to decide whether to continue, and
//! folds them into a [`RunSummary`].

/// What happened to one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Remote content was rewritten
    Updated,
    /// Dry run: an update would have been issued
    WouldUpdate,
    /// Remote content already equals the current IP
    UpToDate,
    /// No remote record with this FQDN exists in the zone
    NotFound,
    /// The update request failed
    Failed,
}

impl RecordOutcome {
    /// Counts toward "updates made" for the cache save decision
    pub fn is_update(self) -> bool {
        matches!(self, Self::Updated | Self::WouldUpdate)
    }
}

/// What happened to one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainOutcome {
    /// The zone's records were fetched and each record was evaluated
    Processed(Vec<RecordOutcome>),
    /// The zone name is not among the account's zones
    ZoneNotFound,
    /// Listing the zone's records failed
    RecordsUnavailable,
}

/// What happened to one credential scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Zones were listed and each domain was evaluated
    Processed(Vec<DomainOutcome>),
    /// Listing zones failed
    ZonesUnavailable,
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub updated: usize,
    pub would_update: usize,
    pub up_to_date: usize,
    pub records_not_found: usize,
    pub records_failed: usize,
    pub zones_not_found: usize,
    pub domains_unavailable: usize,
    pub accounts_unavailable: usize,
    pub first_run: bool,
    pub ip_changed: bool,
    pub cache_saved: bool,
}

impl RunSummary {
    /// Fold an account outcome into the summary
    pub fn add_account(&mut self, outcome: &AccountOutcome) {
        match outcome {
            AccountOutcome::Processed(domains) => {
                for domain in domains {
                    self.add_domain(domain);
                }
            }
            AccountOutcome::ZonesUnavailable => self.accounts_unavailable += 1,
        }
    }

    fn add_domain(&mut self, outcome: &DomainOutcome) {
        match outcome {
            DomainOutcome::Processed(records) => {
                for record in records {
                    self.add_record(*record);
                }
            }
            DomainOutcome::ZoneNotFound => self.zones_not_found += 1,
            DomainOutcome::RecordsUnavailable => self.domains_unavailable += 1,
        }
    }

    fn add_record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::WouldUpdate => self.would_update += 1,
            RecordOutcome::UpToDate => self.up_to_date += 1,
            RecordOutcome::NotFound => self.records_not_found += 1,
            RecordOutcome::Failed => self.records_failed += 1,
        }
    }

    /// Whether any record was updated (or would be, in dry-run)
    pub fn updates_made(&self) -> bool {
        self.updated + self.would_update > 0
    }

    /// Whether any item was skipped because of a failure or a mismatch
    pub fn has_failures(&self) -> bool {
        self.records_not_found
            + self.records_failed
            + self.zones_not_found
            + self.domains_unavailable
            + self.accounts_unavailable
            > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_folds_nested_outcomes() {
        let mut summary = RunSummary::default();
        summary.add_account(&AccountOutcome::Processed(vec![
            DomainOutcome::Processed(vec![
                RecordOutcome::Updated,
                RecordOutcome::UpToDate,
                RecordOutcome::NotFound,
            ]),
            DomainOutcome::ZoneNotFound,
            DomainOutcome::RecordsUnavailable,
        ]));
        summary.add_account(&AccountOutcome::ZonesUnavailable);

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(summary.records_not_found, 1);
        assert_eq!(summary.zones_not_found, 1);
        assert_eq!(summary.domains_unavailable, 1);
        assert_eq!(summary.accounts_unavailable, 1);
        assert!(summary.updates_made());
        assert!(summary.has_failures());
    }

    #[test]
    fn dry_run_counts_as_update() {
        assert!(RecordOutcome::WouldUpdate.is_update());
        assert!(!RecordOutcome::UpToDate.is_update());

        let mut summary = RunSummary::default();
        summary.add_account(&AccountOutcome::Processed(vec![DomainOutcome::Processed(
            vec![RecordOutcome::WouldUpdate],
        )]));
        assert!(summary.updates_made());
        assert!(!summary.has_failures());
    }
}

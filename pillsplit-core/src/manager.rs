//! Ties the ledger, the custody calendar, and the planner together.
//!
//! Every call reads a fresh ledger snapshot and custody snapshot; nothing is
//! cached between calls.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PillConfig;
use crate::custody::{CalendarDirSource, CustodyScheduler, IntervalSource, ParentDays, PillSplit};
use crate::date_window::DateWindow;
use crate::error::{PillError, PillResult};
use crate::ledger::{Distribution, Fill, LedgerStore, NewReminderRecord, SqliteLedger};
use crate::planner::{DistributionPlan, DistributionPlanner};
use crate::reminders::{
    CreatedReminder, FailedReminder, ReminderEvent, ReminderReport, ReminderSink,
};
use crate::status::{ActiveStatus, Status, current_status};

/// When the other parent's current supply runs out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOut {
    /// Counted over the other parent's custody days
    CustodyAware { date: NaiveDate },
    /// One pill a day from the handoff; used when the custody calendar is unreadable
    Approximate { date: NaiveDate, reason: String },
}

impl RunOut {
    pub fn date(&self) -> NaiveDate {
        match self {
            RunOut::CustodyAware { date } | RunOut::Approximate { date, .. } => *date,
        }
    }

    pub fn is_approximate(&self) -> bool {
        matches!(self, RunOut::Approximate { .. })
    }
}

/// A plan together with the custody numbers behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDistribution {
    pub plan: DistributionPlan,
    /// Period whose other-parent days set the quantity
    pub period: DateWindow,
    pub split: PillSplit,
    /// First other-parent day the handed-over pills are for
    pub coverage_start: NaiveDate,
    /// Last other-parent day the handed-over pills cover
    pub coverage_end: NaiveDate,
}

impl PlannedDistribution {
    /// Suggested note for recording the handoff.
    pub fn suggested_notes(&self) -> String {
        format!(
            "Distribution for {} - {} period",
            self.coverage_start.format("%b %d"),
            self.coverage_end.format("%b %d, %Y")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NextDistribution {
    NoData,
    AwaitingFirstDistribution,
    Planned(PlannedDistribution),
    /// The custody calendar could not be read
    Unavailable { reason: String },
}

/// Everything the front ends show on their main screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    pub today: NaiveDate,
    pub status: Status,
    pub run_out: Option<RunOut>,
    pub next: NextDistribution,
}

/// Recent ledger entries, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct History {
    pub fills: Vec<Fill>,
    pub distributions: Vec<Distribution>,
}

pub struct PillManager<L, S> {
    ledger: L,
    scheduler: CustodyScheduler<S>,
    planner: DistributionPlanner,
    planning_period_days: i64,
    reminder_tag: String,
}

impl PillManager<SqliteLedger, CalendarDirSource> {
    /// Open the configured ledger and custody calendar.
    pub fn from_config(config: &PillConfig) -> PillResult<Self> {
        let ledger = SqliteLedger::open(config.database_path()?)?;
        let source = CalendarDirSource::from_config(config)?;

        Ok(PillManager::new(ledger, source, config))
    }
}

impl<L: LedgerStore, S: IntervalSource> PillManager<L, S> {
    pub fn new(ledger: L, source: S, config: &PillConfig) -> Self {
        PillManager {
            ledger,
            scheduler: CustodyScheduler::new(source, config.horizon_days),
            planner: config.planner(),
            planning_period_days: config.planning_period_days,
            reminder_tag: config.reminder_tag.clone(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn planner(&self) -> &DistributionPlanner {
        &self.planner
    }

    pub fn status(&self, today: NaiveDate) -> PillResult<Status> {
        let latest_fill = self.ledger.latest_fill()?;
        let distributions = self.ledger.all_distributions()?;

        Ok(current_status(latest_fill.as_ref(), &distributions, today, &self.planner))
    }

    pub fn parent_days(&self, window: DateWindow) -> PillResult<ParentDays> {
        self.scheduler.parent_days(window)
    }

    pub fn pill_split(&self, window: DateWindow) -> PillResult<PillSplit> {
        self.scheduler.pill_split(window)
    }

    pub fn next_other_parent_day(&self, after: NaiveDate) -> PillResult<NaiveDate> {
        self.scheduler.next_other_parent_day(after)
    }

    pub fn history(&self, limit: u32) -> PillResult<History> {
        Ok(History {
            fills: self.ledger.fill_history(limit)?,
            distributions: self.ledger.distribution_history(limit)?,
        })
    }

    /// Run-out date for a handoff, falling back to simple arithmetic only
    /// when the custody calendar cannot be read.
    pub fn run_out(&self, distribution_date: NaiveDate, quantity: u32) -> PillResult<RunOut> {
        match self.scheduler.custody_run_out_date(distribution_date, quantity) {
            Ok(date) => Ok(RunOut::CustodyAware { date }),
            Err(PillError::UpstreamFetch(reason)) => {
                let date = DistributionPlanner::other_parent_run_out_date(distribution_date, quantity);
                warn!(
                    %distribution_date,
                    quantity,
                    %date,
                    %reason,
                    "custody calendar unavailable, using approximate run-out date"
                );
                Ok(RunOut::Approximate { date, reason })
            }
            Err(e) => Err(e),
        }
    }

    pub fn overview(&self, today: NaiveDate) -> PillResult<Overview> {
        let status = self.status(today)?;

        let Some(active) = status.active() else {
            return Ok(Overview {
                today,
                status,
                run_out: None,
                next: NextDistribution::NoData,
            });
        };

        let Some(latest) = &active.distribution else {
            return Ok(Overview {
                today,
                status,
                run_out: None,
                next: NextDistribution::AwaitingFirstDistribution,
            });
        };

        let run_out = self.run_out(latest.date, latest.quantity)?;

        let next = match self.plan(active, run_out.date(), today) {
            Ok(planned) => NextDistribution::Planned(planned),
            Err(PillError::UpstreamFetch(reason)) => NextDistribution::Unavailable { reason },
            Err(e) => return Err(e),
        };

        Ok(Overview {
            today,
            status,
            run_out: Some(run_out),
            next,
        })
    }

    /// Plan the handoff that follows a supply running out on `out_date`.
    fn plan(&self, active: &ActiveStatus, out_date: NaiveDate, today: NaiveDate) -> PillResult<PlannedDistribution> {
        let next_other_day = self.scheduler.next_other_parent_day(out_date)?;
        let refill_date = active.refill.eligible_date;

        // Pills still on hand come from the current fill; otherwise from the refill
        let period_start = if active.pills_with_tracked_parent > 0 {
            active.fill.date
        } else {
            refill_date
        };
        let period = DateWindow::starting_at(period_start, self.planning_period_days);
        let split = self.scheduler.pill_split(period)?;

        let plan = self.planner.plan_next_distribution(
            out_date,
            refill_date,
            next_other_day,
            split.other_pills,
            today,
        );

        let coverage_start = next_other_day;
        let coverage_end = if plan.pills_to_give > 0 {
            self.scheduler
                .nth_other_parent_day(plan.distribution_date, plan.pills_to_give)?
        } else {
            coverage_start
        };

        Ok(PlannedDistribution {
            plan,
            period,
            split,
            coverage_start,
            coverage_end,
        })
    }

    /// Write the three reminders for the current plan, skipping any that
    /// were already written.
    pub fn sync_reminders(&self, sink: &impl ReminderSink, today: NaiveDate) -> PillResult<ReminderReport> {
        let overview = self.overview(today)?;

        let planned = match &overview.next {
            NextDistribution::Planned(planned) => planned,
            NextDistribution::Unavailable { reason } => {
                return Err(PillError::UpstreamFetch(reason.clone()));
            }
            NextDistribution::NoData | NextDistribution::AwaitingFirstDistribution => {
                return Err(PillError::Validation(
                    "No distribution recorded yet; nothing to remind about".into(),
                ));
            }
        };
        let (Some(active), Some(run_out)) = (overview.status.active(), &overview.run_out) else {
            return Err(PillError::Validation("No distribution recorded yet".into()));
        };

        let fill_id = Some(active.fill.id);
        let distribution_id = active.distribution.as_ref().map(|d| d.id);

        let events = [
            (ReminderEvent::other_parent_out(&self.reminder_tag, run_out.date()), distribution_id),
            (
                ReminderEvent::refill_eligible(
                    &self.reminder_tag,
                    active.refill.eligible_date,
                    self.planner.refill_threshold_percent(),
                ),
                None,
            ),
            (
                ReminderEvent::distribution_due(
                    &self.reminder_tag,
                    planned.plan.distribution_date,
                    planned.plan.pills_to_give,
                    planned.coverage_start,
                    planned.coverage_end,
                ),
                distribution_id,
            ),
        ];

        let recorded = self.ledger.reminder_records(None)?;
        let (first, last) = events.iter().fold((NaiveDate::MAX, NaiveDate::MIN), |(lo, hi), (e, _)| {
            (lo.min(e.date), hi.max(e.date))
        });
        let existing = sink.find_tagged(&DateWindow::new(first, last)?)?;

        let mut report = ReminderReport::default();

        for (event, related_distribution) in events {
            let already_recorded = recorded.iter().any(|r| r.kind == event.kind && r.date == event.date);
            let already_in_sink = existing
                .iter()
                .any(|t| t.kind == Some(event.kind) && t.date == event.date);

            if already_recorded || already_in_sink {
                report.skipped.push(event.kind);
                continue;
            }

            match sink.create_event(&event) {
                Ok(event_id) => {
                    self.ledger.add_reminder_record(&NewReminderRecord {
                        kind: event.kind,
                        date: event.date,
                        event_id: Some(event_id.clone()),
                        fill_id,
                        distribution_id: related_distribution,
                    })?;
                    report.created.push(CreatedReminder {
                        kind: event.kind,
                        date: event.date,
                        event_id,
                        title: event.title,
                    });
                }
                Err(e) => {
                    warn!(kind = %event.kind, date = %event.date, error = %e, "could not create reminder");
                    report.failed.push(FailedReminder {
                        kind: event.kind,
                        date: event.date,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            created = report.created.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "synced reminders"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::CustodyInterval;
    use crate::ledger::{NewDistribution, NewFill};
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Tracked parent: Sunday 5pm to Wednesday 5pm each week from Sep 28.
    fn weekly_blocks() -> Vec<CustodyInterval> {
        (0..16)
            .map(|week| {
                let start = date(2025, 9, 28) + Duration::weeks(week);
                CustodyInterval::new(
                    start.and_hms_opt(17, 0, 0).unwrap(),
                    (start + Duration::days(3)).and_hms_opt(17, 0, 0).unwrap(),
                )
                .unwrap()
            })
            .collect()
    }

    struct Unreachable;

    impl IntervalSource for Unreachable {
        fn fetch_intervals(&self, _window: &DateWindow) -> PillResult<Vec<CustodyInterval>> {
            Err(PillError::UpstreamFetch("calendar offline".into()))
        }
    }

    fn manager<S: IntervalSource>(source: S) -> PillManager<SqliteLedger, S> {
        PillManager::new(SqliteLedger::open_in_memory().unwrap(), source, &PillConfig::default())
    }

    fn seed(ledger: &SqliteLedger) {
        let fill = ledger.add_fill(&NewFill::new(date(2025, 10, 8), 30)).unwrap();
        ledger
            .add_distribution(&NewDistribution::new(date(2025, 10, 13), 16, Some(fill.id)))
            .unwrap();
    }

    #[test]
    fn test_empty_ledger_is_no_data() {
        let overview = manager(weekly_blocks()).overview(date(2025, 10, 20)).unwrap();

        assert!(matches!(overview.status, Status::NoData { .. }));
        assert_eq!(overview.next, NextDistribution::NoData);
        assert!(overview.run_out.is_none());
    }

    #[test]
    fn test_fill_without_distribution_awaits_first() {
        let manager = manager(weekly_blocks());
        manager.ledger().add_fill(&NewFill::new(date(2025, 10, 8), 30)).unwrap();

        let overview = manager.overview(date(2025, 10, 20)).unwrap();
        assert_eq!(overview.next, NextDistribution::AwaitingFirstDistribution);
    }

    #[test]
    fn test_run_out_counts_custody_days() {
        let manager = manager(weekly_blocks());
        // Other parent days in a week: Thu, Fri, Sat, Sun. 16 pills from Mon Oct 13
        // cover Oct 16-19, 23-26, 30-Nov 2, Nov 6-9; out on Thu Nov 13.
        let run_out = manager.run_out(date(2025, 10, 13), 16).unwrap();
        assert_eq!(run_out, RunOut::CustodyAware { date: date(2025, 11, 13) });
    }

    #[test]
    fn test_unreachable_calendar_falls_back_to_approximate() {
        let manager = manager(Unreachable);
        seed(manager.ledger());

        let overview = manager.overview(date(2025, 10, 20)).unwrap();
        let run_out = overview.run_out.unwrap();

        assert!(run_out.is_approximate());
        assert_eq!(run_out.date(), date(2025, 10, 29));
        assert!(matches!(overview.next, NextDistribution::Unavailable { .. }));
    }

    #[test]
    fn test_custody_gap_is_not_approximated() {
        // Tracked parent holds every day from Oct 1 to Dec 31
        let gap_free = vec![
            CustodyInterval::new(
                date(2025, 10, 1).and_hms_opt(17, 0, 0).unwrap(),
                date(2025, 12, 31).and_hms_opt(17, 0, 0).unwrap(),
            )
            .unwrap(),
        ];
        let manager = manager(gap_free);
        let fill = manager.ledger().add_fill(&NewFill::new(date(2025, 10, 8), 30)).unwrap();
        manager
            .ledger()
            .add_distribution(&NewDistribution::new(date(2025, 10, 13), 2, Some(fill.id)))
            .unwrap();

        assert!(matches!(
            manager.run_out(date(2025, 10, 13), 2),
            Err(PillError::DataIntegrity(_))
        ));

        match manager.overview(date(2025, 10, 20)) {
            Err(PillError::DataIntegrity(_)) => {}
            other => panic!("expected a data integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_overview_plans_next_handoff() {
        let manager = manager(weekly_blocks());
        seed(manager.ledger());

        let overview = manager.overview(date(2025, 10, 20)).unwrap();
        let NextDistribution::Planned(planned) = overview.next else {
            panic!("expected a plan, got {:?}", overview.next);
        };

        // Out Thu Nov 13, which is itself an other-parent day; next one is Fri Nov 14
        assert_eq!(planned.plan.other_parent_out_date, date(2025, 11, 13));
        assert_eq!(planned.plan.distribution_date, date(2025, 11, 13));
        assert_eq!(planned.coverage_start, date(2025, 11, 14));
        // 14 pills remain, so the period starts at the fill date
        assert_eq!(planned.period.start(), date(2025, 10, 8));
        assert_eq!(planned.plan.pills_to_give, planned.split.other_pills);
        assert!(!planned.plan.needs_refill_first);
    }

    #[test]
    fn test_sync_creates_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let sink = crate::reminders::CalendarDirSink::new(dir.path(), "[PILLS]");
        let manager = manager(weekly_blocks());
        seed(manager.ledger());

        let first = manager.sync_reminders(&sink, date(2025, 10, 20)).unwrap();
        assert_eq!(first.created.len(), 3);
        assert!(first.failed.is_empty());

        let second = manager.sync_reminders(&sink, date(2025, 10, 20)).unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), 3);
        assert_eq!(manager.ledger().reminder_records(None).unwrap().len(), 3);
    }

    #[test]
    fn test_sync_without_distribution_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let sink = crate::reminders::CalendarDirSink::new(dir.path(), "[PILLS]");
        let manager = manager(weekly_blocks());

        assert!(manager.sync_reminders(&sink, date(2025, 10, 20)).is_err());
    }
}

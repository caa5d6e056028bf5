use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use super::deployments::Deployment;
use crate::config::MAX_DAYS_BACK;
use crate::insights::DeploymentFrequency;

const DAYS_PER_WEEK: usize = 7;

/// Calendar buckets for a window ending today and spanning `days` days.
struct Calendar {
    start: NaiveDate,
    days: usize,
    months: Vec<(i32, u32)>,
}

impl Calendar {
    fn new(today: NaiveDate, days: usize) -> Self {
        let start = u64::try_from(days.saturating_sub(1))
            .ok()
            .and_then(|back| today.checked_sub_days(Days::new(back)))
            .unwrap_or(NaiveDate::MIN);

        let mut months = Vec::new();
        let (mut year, mut month) = (start.year(), start.month());
        loop {
            months.push((year, month));
            if (year, month) == (today.year(), today.month()) {
                break;
            }
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }

        Self {
            start,
            days,
            months,
        }
    }

    fn weeks(&self) -> usize {
        self.days.div_ceil(DAYS_PER_WEEK)
    }

    fn day_index(&self, date: NaiveDate) -> Option<usize> {
        let offset = usize::try_from((date - self.start).num_days()).ok()?;
        (offset < self.days).then_some(offset)
    }

    fn month_index(&self, date: NaiveDate) -> Option<usize> {
        self.months
            .iter()
            .position(|&(year, month)| year == date.year() && month == date.month())
    }

    fn month_labels(&self) -> Vec<String> {
        self.months
            .iter()
            .map(|(year, month)| format!("{year:04}-{month:02}"))
            .collect()
    }
}

#[allow(clippy::cast_precision_loss)]
fn rate(total: usize, buckets: usize) -> String {
    if buckets == 0 {
        return "0.000".to_string();
    }
    format!("{:.3}", total as f64 / buckets as f64)
}

fn status(total: usize) -> String {
    match total {
        0 => "No deployments found in analysis period",
        1 => "Single deployment in analysis period",
        _ => "Multiple deployments in analysis period",
    }
    .to_string()
}

/// Deployment counts per day, per 7-day bucket and per calendar month for
/// the window `[today - days_back + 1, today]`.
pub fn deployment_frequency(
    deployments: &[Deployment],
    days_back: u32,
    now: DateTime<Utc>,
) -> DeploymentFrequency {
    let days_back = days_back.min(MAX_DAYS_BACK);
    let days = usize::try_from(days_back.max(1)).unwrap_or(1);
    let calendar = Calendar::new(now.date_naive(), days);

    let mut per_day = vec![0; calendar.days];
    let mut per_week = vec![0; calendar.weeks()];
    let mut per_month = vec![0; calendar.months.len()];

    for deployment in deployments {
        let date = deployment.date.date_naive();
        let Some(day) = calendar.day_index(date) else {
            continue;
        };
        per_day[day] += 1;
        per_week[day / DAYS_PER_WEEK] += 1;
        if let Some(month) = calendar.month_index(date) {
            per_month[month] += 1;
        }
    }

    let total = deployments.len();

    DeploymentFrequency {
        total_deployments: total,
        analysis_period_days: days_back,
        frequency_per_day: rate(total, calendar.days),
        frequency_per_week: rate(total, per_week.len()),
        frequency_per_month: rate(total, per_month.len()),
        months: calendar.month_labels(),
        per_day,
        per_week,
        per_month,
        status: status(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dora::deployments::DeploymentKind;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn deployment_on(date: DateTime<Utc>) -> Deployment {
        Deployment {
            kind: DeploymentKind::Release,
            date,
            version: "v1".to_string(),
            label: "v1".to_string(),
        }
    }

    #[test]
    fn test_no_deployments() {
        let frequency = deployment_frequency(&[], 30, now());

        assert_eq!(frequency.total_deployments, 0);
        assert_eq!(frequency.status, "No deployments found in analysis period");
        assert_eq!(frequency.frequency_per_day, "0.000");
        assert_eq!(frequency.per_day.len(), 30);
        assert!(frequency.per_day.iter().all(|&c| c == 0));
    }

    #[test]
    fn test_single_deployment_rate_is_one_over_days_back() {
        let deployment = deployment_on(now() - Duration::days(2));

        let frequency = deployment_frequency(&[deployment], 30, now());

        assert_eq!(frequency.status, "Single deployment in analysis period");
        assert_eq!(frequency.frequency_per_day, format!("{:.3}", 1.0 / 30.0));
        assert_eq!(frequency.frequency_per_day, "0.033");
    }

    #[test]
    fn test_seven_day_window_buckets() {
        let deployments = vec![
            deployment_on(now()),
            deployment_on(now() - Duration::days(6)),
            deployment_on(now() - Duration::days(6)),
        ];

        let frequency = deployment_frequency(&deployments, 7, now());

        assert_eq!(frequency.status, "Multiple deployments in analysis period");
        assert_eq!(frequency.per_day, vec![2, 0, 0, 0, 0, 0, 1]);
        assert_eq!(frequency.per_week, vec![3]);
        assert_eq!(frequency.months, vec!["2024-03".to_string()]);
        assert_eq!(frequency.per_month, vec![3]);
        assert_eq!(frequency.frequency_per_day, "0.429");
        assert_eq!(frequency.frequency_per_week, "3.000");
    }

    #[test]
    fn test_month_buckets_follow_the_calendar() {
        // 30 days ending 2024-03-15 start on 2024-02-15
        let deployments = vec![
            deployment_on(Utc.with_ymd_and_hms(2024, 2, 20, 9, 0, 0).unwrap()),
            deployment_on(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()),
            deployment_on(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap()),
        ];

        let frequency = deployment_frequency(&deployments, 30, now());

        assert_eq!(frequency.months, vec!["2024-02", "2024-03"]);
        assert_eq!(frequency.per_month, vec![1, 2]);
        assert_eq!(frequency.per_week.len(), 5);
        assert_eq!(frequency.per_week.iter().sum::<usize>(), 3);
        assert_eq!(frequency.frequency_per_month, "1.500");
    }

    #[test]
    fn test_ninety_day_window_spans_year_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap();

        let frequency = deployment_frequency(&[], 90, now);

        assert_eq!(frequency.months, vec!["2023-10", "2023-11", "2023-12", "2024-01"]);
        assert_eq!(frequency.per_week.len(), 13);
    }

    #[test]
    fn test_huge_window_is_clamped() {
        let frequency = deployment_frequency(&[deployment_on(now())], u32::MAX, now());

        assert_eq!(frequency.analysis_period_days, MAX_DAYS_BACK);
        assert_eq!(frequency.per_day.len(), MAX_DAYS_BACK as usize);
        assert_eq!(frequency.per_day.iter().sum::<usize>(), 1);
    }

    #[test]
    fn test_deployments_outside_window_are_not_bucketed() {
        let deployments = vec![deployment_on(now() - Duration::days(40))];

        let frequency = deployment_frequency(&deployments, 7, now());

        assert_eq!(frequency.per_day.iter().sum::<usize>(), 0);
        assert_eq!(frequency.total_deployments, 1);
    }
}

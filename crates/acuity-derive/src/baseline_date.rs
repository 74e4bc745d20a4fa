//! Baseline-date selection.

use chrono::NaiveDateTime;

/// Pick the baseline among `candidates`: the latest date on or before
/// `first_treatment`, else the earliest date after it.
///
/// Without a first-treatment date there is no baseline.
pub fn select_baseline_date<I>(
    candidates: I,
    first_treatment: Option<NaiveDateTime>,
) -> Option<NaiveDateTime>
where
    I: IntoIterator<Item = NaiveDateTime>,
{
    let first_treatment = first_treatment?;
    let mut latest_before: Option<NaiveDateTime> = None;
    let mut earliest_after: Option<NaiveDateTime> = None;
    for date in candidates {
        if date <= first_treatment {
            if latest_before.is_none_or(|current| date > current) {
                latest_before = Some(date);
            }
        } else if earliest_after.is_none_or(|current| date < current) {
            earliest_after = Some(date);
        }
    }
    latest_before.or(earliest_after)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 3, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn prefers_latest_on_or_before_first_treatment() {
        let picked = select_baseline_date([day(1), day(5), day(10), day(20)], Some(day(10)));
        assert_eq!(picked, Some(day(10)));
    }

    #[test]
    fn falls_back_to_earliest_after() {
        let picked = select_baseline_date([day(25), day(12), day(18)], Some(day(10)));
        assert_eq!(picked, Some(day(12)));
    }

    #[test]
    fn no_first_treatment_means_no_baseline() {
        assert_eq!(select_baseline_date([day(1)], None), None);
        assert_eq!(select_baseline_date(Vec::new(), Some(day(1))), None);
    }
}

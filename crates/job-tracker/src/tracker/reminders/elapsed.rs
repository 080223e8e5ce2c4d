use chrono::NaiveDate;

/// Whole calendar days from `date` to `today`; negative when `date` is later.
pub fn days_since(date: NaiveDate, today: NaiveDate) -> i64 {
    (today - date).num_days()
}

/// Whole calendar days from `today` to `date`; negative once `date` has passed.
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Elapsed days for an optional date. `None` means the count is undefined.
pub fn elapsed_days(date: Option<NaiveDate>, today: NaiveDate) -> Option<i64> {
    date.map(|date| days_since(date, today))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    #[test]
    fn counts_whole_days_across_month_boundaries() {
        let submitted = NaiveDate::from_ymd_opt(2025, 2, 20).expect("valid date");
        assert_eq!(days_since(submitted, today()), 9);
        assert_eq!(days_until(submitted, today()), -9);
    }

    #[test]
    fn future_dates_are_negative() {
        let later = today() + Duration::days(4);
        assert_eq!(days_since(later, today()), -4);
        assert_eq!(elapsed_days(Some(later), today()), Some(-4));
    }

    #[test]
    fn missing_date_is_undefined() {
        assert_eq!(elapsed_days(None, today()), None);
        assert_eq!(elapsed_days(Some(today()), today()), Some(0));
    }
}

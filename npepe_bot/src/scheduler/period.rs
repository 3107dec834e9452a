use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};

/// When a job runs. Every period is an hour long window that repeats
/// either every day or every week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily { hour: u32 },
    Weekly { weekday: Weekday, hour: u32 },
}

impl Period {
    /// If `now` is inside this period's window, returns a marker naming this
    /// particular occurrence: `YYYY-MM-DD` for daily ones, and the ISO week
    /// like `YYYY-Www` for weekly ones.
    #[must_use]
    pub fn marker(&self, now: DateTime<Utc>) -> Option<String> {
        match *self {
            Period::Daily { hour } => {
                (now.hour() == hour).then(|| now.format("%Y-%m-%d").to_string())
            }
            Period::Weekly { weekday, hour } => {
                if now.weekday() != weekday || now.hour() != hour {
                    return None;
                }
                let week = now.iso_week();
                Some(format!("{}-W{:02}", week.year(), week.week()))
            }
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        month => (date.year(), month + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|x| x.pred_opt())
        .map_or(28, |x| x.day())
}

/// If `today` is a monthly anniversary of `joined` that the member hasn't
/// been thanked for yet, returns how many months it has been.
///
/// Members who joined on a day the current month doesn't have, like the
/// 31st, celebrate on its last day instead.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn anniversary_months(
    joined: DateTime<Utc>,
    today: NaiveDate,
    last_thanked: u32,
) -> Option<u32> {
    let joined = joined.date_naive();

    let anniversary_day = joined.day().min(last_day_of_month(today));
    if today.day() != anniversary_day {
        return None;
    }

    let months = (today.year() - joined.year()) * 12 + today.month() as i32 - joined.month() as i32;
    let months = u32::try_from(months).ok().filter(|&x| x > 0)?;

    (months > last_thanked).then_some(months)
}

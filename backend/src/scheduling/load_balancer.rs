use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Lessons grouped by the day they were assigned to.
pub type Distribution<T> = BTreeMap<NaiveDate, Vec<T>>;

/// Spread `lessons` over `dates`, preserving lesson order.
///
/// With at least as many lessons as dates every date gets `N / M` lessons and
/// the first `N % M` dates one extra. With fewer lessons than dates they are
/// spaced out at a stride of `M / N`. Dates that receive nothing are absent
/// from the result; either input being empty yields an empty map.
pub fn distribute<T>(lessons: Vec<T>, dates: &[NaiveDate]) -> Distribution<T> {
    let mut out: Distribution<T> = BTreeMap::new();
    let n = lessons.len();
    let m = dates.len();
    if n == 0 || m == 0 {
        return out;
    }

    if n >= m {
        let per_day = n / m;
        let extra = n % m;
        let mut lessons = lessons.into_iter();
        for (idx, date) in dates.iter().enumerate() {
            let take = if idx < extra { per_day + 1 } else { per_day };
            let bucket: Vec<T> = lessons.by_ref().take(take).collect();
            if !bucket.is_empty() {
                out.entry(*date).or_default().extend(bucket);
            }
        }
    } else {
        let step = m as f64 / n as f64;
        for (i, lesson) in lessons.into_iter().enumerate() {
            let idx = ((i as f64 * step).floor() as usize).min(m - 1);
            out.entry(dates[idx]).or_default().push(lesson);
        }
    }

    out
}

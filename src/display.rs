use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;

/// Humanized age of a buildbot timestamp (seconds since the epoch).
pub fn since_string(epoch_seconds: f64) -> String {
    since_string_at(epoch_seconds, Utc::now())
}

/// Like [`since_string`], relative to an explicit `now`.
pub fn since_string_at(epoch_seconds: f64, now: DateTime<Utc>) -> String {
    // Buildbot reports seconds; chrono wants milliseconds for sub-second precision.
    let millis = (epoch_seconds * 1000.0).round() as i64;
    let Some(then) = DateTime::<Utc>::from_timestamp_millis(millis) else {
        return String::new();
    };
    HumanTime::from(then - now).to_string()
}

/// Values a table cell should render as blank.
pub trait Falsy {
    fn is_falsy(&self) -> bool;
}

impl Falsy for str {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

impl Falsy for String {
    fn is_falsy(&self) -> bool {
        self.is_empty()
    }
}

impl Falsy for bool {
    fn is_falsy(&self) -> bool {
        !*self
    }
}

impl Falsy for f64 {
    fn is_falsy(&self) -> bool {
        *self == 0.0 || self.is_nan()
    }
}

macro_rules! impl_falsy_for_int {
    ($($ty:ty),*) => {
        $(impl Falsy for $ty {
            fn is_falsy(&self) -> bool {
                *self == 0
            }
        })*
    };
}

impl_falsy_for_int!(i32, i64, u32, u64, usize);

impl<T: Falsy + ?Sized> Falsy for &T {
    fn is_falsy(&self) -> bool {
        (**self).is_falsy()
    }
}

impl<T: Falsy> Falsy for Option<T> {
    fn is_falsy(&self) -> bool {
        self.as_ref().map_or(true, Falsy::is_falsy)
    }
}

/// Renders `value`, or `""` when it is absent, empty, zero or false.
pub fn falsy_to_empty<T: Falsy + ToString>(value: Option<T>) -> String {
    value
        .filter(|v| !v.is_falsy())
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Collapses numbers into sorted, comma-separated runs: `1-3, 5, 9`.
///
/// Duplicates are dropped first, so `[4, 4, 5]` renders as `4-5`.
pub fn compact_ranges(numbers: &[u64]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<String> = Vec::new();
    let mut iter = sorted.into_iter().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = end.checked_add(1).filter(|n| iter.peek() == Some(n)) {
            end = next;
            iter.next();
        }
        if start == end {
            ranges.push(start.to_string());
        } else {
            ranges.push(format!("{start}-{end}"));
        }
    }

    ranges.join(", ")
}

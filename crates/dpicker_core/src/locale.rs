//! Locale data consumed by the format engine and the view builder

/// Month and weekday labels plus the first day of the week.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Locale {
    /// Full month names, January first (12 entries)
    pub months: Vec<String>,
    /// Abbreviated month names, January first (12 entries)
    pub months_short: Vec<String>,
    /// Abbreviated weekday names, Sunday first (7 entries)
    pub weekdays_short: Vec<String>,
    /// First day of the week, 0 = Sunday
    pub first_day_of_week: u8,
}

impl Locale {
    /// English labels, weeks starting on Sunday
    pub fn english() -> Self {
        Self {
            months: to_owned(&[
                "January",
                "February",
                "March",
                "April",
                "May",
                "June",
                "July",
                "August",
                "September",
                "October",
                "November",
                "December",
            ]),
            months_short: to_owned(&[
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ]),
            weekdays_short: to_owned(&["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]),
            first_day_of_week: 0,
        }
    }

    /// Override the first day of the week (taken modulo 7).
    pub fn with_first_day_of_week(mut self, day: u8) -> Self {
        self.first_day_of_week = day % 7;
        self
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::english()
    }
}

fn to_owned(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

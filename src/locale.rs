//! Month and weekday names used when reading dates.
//!
//! A `Locale` is passed explicitly to the datetime normalizer; nothing here
//! touches process-wide locale state, so workers with different locales can
//! run side by side.

use regex::Regex;

/// Names and conventions of one language for the datetime normalizer.
#[derive(Debug, Clone)]
pub struct Locale {
    /// Full month names, January first, as `%B` reads them.
    pub months: [String; 12],

    /// Abbreviated month names, January first, as `%b` reads them.
    pub months_abbr: [String; 12],

    /// Full weekday names, Monday first, as `%A` reads them.
    pub weekdays: [String; 7],

    /// Abbreviated weekday names, Monday first, as `%a` reads them.
    pub weekdays_abbr: [String; 7],

    /// Morning and afternoon markers for `%p`.
    pub meridiem: [String; 2],

    /// Expansion of `%x`.
    pub date_format: String,

    /// Expansion of `%X`.
    pub time_format: String,

    /// Word replacements applied to raw text before parsing, e.g. nominative
    /// month names rewritten to the form `%B` reads.
    replacements: Vec<(Regex, String)>,
}

impl Locale {
    /// Czech names. Full month names are genitive ("1. ledna 2023"); the
    /// nominative forms sites also print ("leden 2023") are rewritten first.
    #[must_use]
    pub fn czech() -> Self {
        Self::new(
            [
                "ledna", "února", "března", "dubna", "května", "června", "července", "srpna", "září", "října",
                "listopadu", "prosince",
            ],
            [
                "led", "úno", "bře", "dub", "kvě", "čvn", "čvc", "srp", "zář", "říj", "lis", "pro",
            ],
            ["pondělí", "úterý", "středa", "čtvrtek", "pátek", "sobota", "neděle"],
            ["po", "út", "st", "čt", "pá", "so", "ne"],
            ["dop.", "odp."],
        )
        .with_formats("%d.%m.%Y", "%H:%M:%S")
        .with_replacements(&[
            ("leden", "ledna"),
            ("únor", "února"),
            ("březen", "března"),
            ("duben", "dubna"),
            ("květen", "května"),
            ("červen", "června"),
            ("červenec", "července"),
            ("srpen", "srpna"),
            ("říjen", "října"),
            ("listopad", "listopadu"),
            ("prosinec", "prosince"),
        ])
    }

    /// English names, for sites that publish in English.
    #[must_use]
    pub fn english() -> Self {
        Self::new(
            [
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
            ],
            [
                "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
            ],
            [
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
                "Friday",
                "Saturday",
                "Sunday",
            ],
            ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
            ["AM", "PM"],
        )
        .with_formats("%m/%d/%Y", "%H:%M:%S")
    }

    fn new(
        months: [&str; 12],
        months_abbr: [&str; 12],
        weekdays: [&str; 7],
        weekdays_abbr: [&str; 7],
        meridiem: [&str; 2],
    ) -> Self {
        Self {
            months: months.map(String::from),
            months_abbr: months_abbr.map(String::from),
            weekdays: weekdays.map(String::from),
            weekdays_abbr: weekdays_abbr.map(String::from),
            meridiem: meridiem.map(String::from),
            date_format: String::new(),
            time_format: String::new(),
            replacements: Vec::new(),
        }
    }

    /// Set the `%x` and `%X` expansions.
    #[must_use]
    pub fn with_formats(mut self, date_format: &str, time_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self.time_format = time_format.to_string();
        self
    }

    /// Add whole-word replacements applied before parsing.
    ///
    /// Words are matched up to a word boundary, so a replacement for
    /// "červen" leaves "červenec" alone.
    #[must_use]
    pub fn with_replacements(mut self, pairs: &[(&str, &str)]) -> Self {
        for (word, replacement) in pairs {
            match Regex::new(&format!(r"(?i){}\b", regex::escape(word))) {
                Ok(re) => self.replacements.push((re, (*replacement).to_string())),
                Err(err) => tracing::warn!(word, %err, "skipping locale replacement"),
            }
        }
        self
    }

    /// Apply the locale's word replacements.
    ///
    /// # Example
    ///
    /// ```rust
    /// use calendar_extract::Locale;
    ///
    /// let czech = Locale::czech();
    /// assert_eq!(czech.replace_words("1. červen a 2. červenec"), "1. června a 2. července");
    /// ```
    #[must_use]
    pub fn replace_words(&self, text: &str) -> String {
        let mut text = text.to_string();
        for (re, replacement) in &self.replacements {
            if re.is_match(&text) {
                text = re.replace_all(&text, regex::NoExpand(replacement)).into_owned();
            }
        }
        text
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::czech()
    }
}

//! Sync buckets: the logical groupings that each map to one playlist.

use provider_airtable::formula;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Tracks released in one year
    Year(i32),
    /// Tracks released in `[start, start + span)`
    Decade { start: i32, span: i32 },
    Liked,
    Loved,
}

impl Bucket {
    /// Every bucket of a run, in processing order: years, decades, liked, loved.
    ///
    /// Years run from `epoch` through `current_year` inclusive. Decades start
    /// at `epoch` and step by `decade_years` while the start is below
    /// `current_year + decade_years`, so the running decade is included.
    pub fn all(epoch: i32, current_year: i32, decade_years: i32) -> Vec<Bucket> {
        let span = decade_years.max(1);
        let mut buckets: Vec<Bucket> = (epoch..=current_year).map(Bucket::Year).collect();

        let mut start = epoch;
        while start < current_year + span {
            buckets.push(Bucket::Decade { start, span });
            start += span;
        }

        buckets.push(Bucket::Liked);
        buckets.push(Bucket::Loved);
        buckets
    }

    /// Playlist name under `prefix`, e.g. `st-year-1999` or `st-decade-1990s`.
    pub fn playlist_name(&self, prefix: &str) -> String {
        match self {
            Bucket::Year(year) => format!("{}-year-{}", prefix, year),
            Bucket::Decade { start, .. } => format!("{}-decade-{}s", prefix, start),
            Bucket::Liked => format!("{}-liked", prefix),
            Bucket::Loved => format!("{}-loved", prefix),
        }
    }

    /// Record store filter selecting this bucket's tracks.
    pub fn filter(&self) -> String {
        match self {
            Bucket::Year(year) => formula::year_equals(*year),
            Bucket::Decade { start, span } => formula::year_range(*start, start + span),
            Bucket::Liked => formula::flag_set("Like"),
            Bucket::Loved => formula::flag_set("Love"),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bucket::Year(year) => write!(f, "year {}", year),
            Bucket::Decade { start, .. } => write!(f, "decade {}s", start),
            Bucket::Liked => f.write_str("liked"),
            Bucket::Loved => f.write_str("loved"),
        }
    }
}

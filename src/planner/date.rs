//! Date range filter
//!
//! Two ways of locating the date field have been used historically and both
//! are kept, selected by [`DateFieldLocator`]:
//!
//! - `section_walk`: the first path segment names a section, the following
//!   ones walk field names inside it (matched case-insensitively against the
//!   template). A walk that does not reach a known field falls back to the
//!   segments joined as given.
//! - `section_relative`: the segments are relative to the configuration's
//!   section path.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;
use crate::config::DateRangeFilter;
use crate::pipeline::{Literal, Predicate, Stage};
use crate::template::FieldTypeMap;
use super::layout::join_path;

/// How `pathSegments` of a date range filter name the date field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFieldLocator {
    #[default]
    SectionWalk,
    SectionRelative,
}

impl DateFieldLocator {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFieldLocator::SectionWalk => "section_walk",
            DateFieldLocator::SectionRelative => "section_relative",
        }
    }
}

impl fmt::Display for DateFieldLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFieldLocator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "section_walk" => Ok(DateFieldLocator::SectionWalk),
            "section_relative" => Ok(DateFieldLocator::SectionRelative),
            other => Err(format!(
                "unknown date field locator '{}', expected section_walk or section_relative",
                other
            )),
        }
    }
}

impl<'de> Deserialize<'de> for DateFieldLocator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for DateFieldLocator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Document path of the date field named by `range`
pub fn locate_date_field(
    range: &DateRangeFilter,
    section_path: &[String],
    field_types: &FieldTypeMap,
    locator: DateFieldLocator,
) -> String {
    match locator {
        DateFieldLocator::SectionRelative => {
            join_path(&section_path.join("."), &range.path_segments.join("."))
        }
        DateFieldLocator::SectionWalk => walk_sections(&range.path_segments, field_types)
            .unwrap_or_else(|| {
                let verbatim = range.path_segments.join(".");
                warn!(path = %verbatim, "date field not found in template, using the path as given");
                verbatim
            }),
    }
}

fn walk_sections(segments: &[String], field_types: &FieldTypeMap) -> Option<String> {
    let (first, rest) = segments.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let section = field_types
        .section_names()
        .into_iter()
        .find(|name| name.eq_ignore_ascii_case(first))?;

    let mut path = String::new();
    for segment in rest {
        let wanted = join_path(&path, segment);
        let found = field_types
            .paths(section)
            .into_iter()
            .find(|p| p.eq_ignore_ascii_case(&wanted))?;
        path = found.to_string();
    }

    Some(join_path(section, &path))
}

/// Filter keeping documents whose date field lies in `[start, end]`
pub fn build_date_filter(
    range: &DateRangeFilter,
    section_path: &[String],
    field_types: &FieldTypeMap,
    locator: DateFieldLocator,
) -> Stage {
    Stage::filter(Predicate::Between {
        path: locate_date_field(range, section_path, field_types, locator),
        start: Literal::Timestamp(range.start),
        end: Literal::Timestamp(range.end),
    })
}

//! Shape-tolerant decoding of catalog responses.
//!
//! The content backend has answered with several layouts over time. Each
//! layout gets a matcher; matchers are tried in order and the first hit is
//! normalised into the strictly typed `Series`/`Lesson` model.

use serde_json::{Map, Value};

use tutor_core::model::{Lesson, Series, SeriesId};

/// Lessons located in a response, plus the object carrying series metadata if any.
struct Located<'a> {
    meta: Option<&'a Map<String, Value>>,
    lessons: &'a [Value],
}

type ShapeMatcher = for<'a> fn(&'a Value) -> Option<Located<'a>>;

const SHAPES: [(&str, ShapeMatcher); 4] = [
    ("top-level array", top_level_array),
    ("lessons field", lessons_field),
    ("data field", data_field),
    ("items field", items_field),
];

fn top_level_array(value: &Value) -> Option<Located<'_>> {
    value.as_array().map(|lessons| Located {
        meta: None,
        lessons,
    })
}

fn lessons_field(value: &Value) -> Option<Located<'_>> {
    array_field(value, "lessons")
}

fn data_field(value: &Value) -> Option<Located<'_>> {
    array_field(value, "data")
}

fn items_field(value: &Value) -> Option<Located<'_>> {
    array_field(value, "items")
}

fn array_field<'a>(value: &'a Value, field: &str) -> Option<Located<'a>> {
    let obj = value.as_object()?;
    let lessons = obj.get(field)?.as_array()?;
    Some(Located {
        meta: Some(obj),
        lessons,
    })
}

/// Decode a catalog body into a `Series`.
///
/// Returns `None` when no known shape matches or the lesson list is empty.
/// Missing paragraph data inside a lesson degrades to a placeholder paragraph.
#[must_use]
pub fn parse_series(requested: SeriesId, body: &Value) -> Option<Series> {
    let (shape, located) = SHAPES
        .iter()
        .find_map(|(name, matcher)| matcher(body).map(|found| (*name, found)))?;
    tracing::debug!(shape, lessons = located.lessons.len(), "matched catalog shape");
    if located.lessons.is_empty() {
        return None;
    }

    let meta = located.meta;
    // the series is cached under the requested id, so that id is kept
    let series_id = requested;
    if let Some(claimed) = meta
        .and_then(|m| first_text(m, &["series", "id"]))
        .and_then(|raw| raw.parse::<SeriesId>().ok())
        .filter(|claimed| *claimed != requested)
    {
        tracing::warn!(%requested, %claimed, "catalog response names another series");
    }
    let title = meta
        .and_then(|m| first_text(m, &["title"]))
        .unwrap_or_else(|| series_id.info().title.to_string());
    let description = meta
        .and_then(|m| first_text(m, &["description"]))
        .unwrap_or_default();

    let lessons = located
        .lessons
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_lesson(series_id, index, raw))
        .collect();

    Some(Series::new(series_id, title, description, lessons))
}

fn parse_lesson(series: SeriesId, index: usize, raw: &Value) -> Lesson {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);

    let lesson_id = first_text(obj, &["id", "lesson_id"])
        .unwrap_or_else(|| format!("{}{}", series.lesson_prefix(), index + 1));
    let title =
        first_text(obj, &["title", "name"]).unwrap_or_else(|| "Untitled Lesson".to_string());
    let description = first_text(obj, &["description"]);

    Lesson::new(series, lesson_id, title, description, paragraphs(obj))
}

/// Paragraph sources in priority order; the first non-empty one wins.
fn paragraphs(obj: &Map<String, Value>) -> Vec<String> {
    if let Some(chunks) = non_empty_array(obj, "chunks") {
        return collect(chunks, |c| match c {
            Value::Object(o) => first_text(o, &["text", "content", "body"]),
            other => scalar_text(other),
        });
    }
    if let Some(content) = non_empty_array(obj, "content") {
        return collect(content, |c| match c {
            Value::Object(o) => first_text(o, &["text"]),
            other => scalar_text(other),
        });
    }
    if let Some(paragraphs) = non_empty_array(obj, "paragraphs") {
        return collect(paragraphs, scalar_text);
    }
    first_text(obj, &["body", "text"])
        .map(|text| {
            text.split("\n\n")
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn collect(values: &[Value], extract: impl Fn(&Value) -> Option<String>) -> Vec<String> {
    values.iter().filter_map(extract).collect()
}

fn non_empty_array<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a [Value]> {
    obj.get(field)
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .map(Vec::as_slice)
}

/// First field among `fields` holding a non-empty string or a number.
fn first_text(obj: &Map<String, Value>, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|field| obj.get(*field).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! Renders a [`Filter`] as a MongoDB query document.

use super::SearchMode;
use ll_core::{ColumnMapping, Filter, LevelValue, Predicate};
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};

pub fn render(filter: &Filter, columns: &ColumnMapping, search: SearchMode) -> Document {
    if filter.matches_all() {
        return Document::new();
    }
    let clauses: Vec<Document> = filter
        .predicates()
        .iter()
        .map(|predicate| clause(predicate, columns, search))
        .collect();
    doc! { "$and": clauses }
}

/// Sort on the timestamp field, most recent first.
pub fn newest_first(columns: &ColumnMapping) -> Document {
    field(columns.timestamp(), -1)
}

fn clause(predicate: &Predicate, columns: &ColumnMapping, search: SearchMode) -> Document {
    match predicate {
        Predicate::LevelEquals(LevelValue::Name(name)) => field(columns.level(), *name),
        Predicate::LevelEquals(LevelValue::Code(code)) => field(columns.level(), *code),
        Predicate::TextContains(text) => match search {
            SearchMode::Text => doc! { "$text": { "$search": text.as_str() } },
            SearchMode::Pattern => {
                let pattern = doc! { "$regex": regex::escape(text), "$options": "i" };
                doc! {
                    "$or": [
                        field(columns.message(), pattern.clone()),
                        field(columns.exception(), pattern),
                    ]
                }
            }
        },
        Predicate::TimestampAtOrAfter(ts) => field(
            columns.timestamp(),
            doc! { "$gte": BsonDateTime::from_millis(ts.timestamp_millis()) },
        ),
        Predicate::TimestampBefore(ts) => field(
            columns.timestamp(),
            doc! { "$lt": BsonDateTime::from_millis(ts.timestamp_millis()) },
        ),
        Predicate::Never => doc! { "_id": { "$exists": false } },
    }
}

fn field(name: &str, value: impl Into<Bson>) -> Document {
    let mut document = Document::new();
    document.insert(name, value);
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ll_core::{filter, LevelFormat, QueryParameters};
    use pretty_assertions::assert_eq;

    fn rendered(params: QueryParameters, search: SearchMode) -> Document {
        let filter = filter::build(&params, LevelFormat::Name);
        render(&filter, &ColumnMapping::mongodb(), search)
    }

    #[test]
    fn test_no_criteria_is_empty_document() {
        let params = QueryParameters::builder().build().unwrap();
        assert_eq!(rendered(params, SearchMode::Text), Document::new());
    }

    #[test]
    fn test_level_and_range() {
        let start = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap();
        let params = QueryParameters::builder()
            .level("warn")
            .start_date(start)
            .end_date(end)
            .build()
            .unwrap();

        assert_eq!(
            rendered(params, SearchMode::Text),
            doc! {
                "$and": [
                    { "Level": "Warning" },
                    { "Timestamp": { "$gte": BsonDateTime::from_millis(start.timestamp_millis()) } },
                    { "Timestamp": { "$lt": BsonDateTime::from_millis(end.timestamp_millis()) } },
                ]
            }
        );
    }

    #[test]
    fn test_text_search_uses_text_index() {
        let params = QueryParameters::builder().search_text("disk full").build().unwrap();
        assert_eq!(
            rendered(params, SearchMode::Text),
            doc! { "$and": [ { "$text": { "$search": "disk full" } } ] }
        );
    }

    #[test]
    fn test_pattern_search_escapes_regex() {
        let params = QueryParameters::builder().search_text("a.b*").build().unwrap();
        assert_eq!(
            rendered(params, SearchMode::Pattern),
            doc! {
                "$and": [{
                    "$or": [
                        { "RenderedMessage": { "$regex": "a\\.b\\*", "$options": "i" } },
                        { "Exception": { "$regex": "a\\.b\\*", "$options": "i" } },
                    ]
                }]
            }
        );
    }

    #[test]
    fn test_unrecognized_level_matches_nothing() {
        let params = QueryParameters::builder().level("Loud").build().unwrap();
        assert_eq!(
            rendered(params, SearchMode::Text),
            doc! { "$and": [ { "_id": { "$exists": false } } ] }
        );
    }
}

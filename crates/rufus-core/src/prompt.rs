//! Renders catalog records into the textual context block given to the model.

use serde_json::Value;

/// What the model sees when the catalog holds no products.
pub const EMPTY_CATALOG_TEXT: &str = "No product information available.";

const MISSING_FIELD: &str = "N/A";

/// Formats catalog records as one summary line per product.
///
/// `sample_size` truncates earliest-first; `None` includes everything.
/// The output is order-preserving, joined with single newlines and has no
/// trailing newline. Missing id/name/description fields render as `N/A`,
/// missing tags as an empty join.
pub fn format_products(records: &[Value], sample_size: Option<usize>) -> String {
    if records.is_empty() {
        return EMPTY_CATALOG_TEXT.to_string();
    }

    let take = sample_size.unwrap_or(records.len());
    records
        .iter()
        .take(take)
        .map(product_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn product_line(record: &Value) -> String {
    format!(
        "ID: {}, Name: {}, Description: {}, Tags: {}",
        text_field(record, "id"),
        text_field(record, "name"),
        text_field(record, "description"),
        tags_field(record)
    )
}

fn text_field<'a>(record: &'a Value, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or(MISSING_FIELD)
}

fn tags_field(record: &Value) -> String {
    record
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_catalog_literal() {
        assert_eq!(format_products(&[], None), "No product information available.");
    }

    #[test]
    fn test_one_line_per_product_in_order() {
        let records = vec![
            json!({"id": "p1", "name": "Red Shirt", "description": "Cotton", "tags": ["red", "shirt"]}),
            json!({"id": "p2", "name": "Mug", "description": "Ceramic", "tags": []}),
        ];

        let rendered = format_products(&records, None);
        assert_eq!(
            rendered,
            "ID: p1, Name: Red Shirt, Description: Cotton, Tags: red, shirt\n\
             ID: p2, Name: Mug, Description: Ceramic, Tags: "
        );
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_missing_fields_render_as_placeholder() {
        let records = vec![json!({"id": "p1"})];

        assert_eq!(
            format_products(&records, None),
            "ID: p1, Name: N/A, Description: N/A, Tags: "
        );
    }

    #[test]
    fn test_sample_size_truncates_earliest_first() {
        let records = vec![
            json!({"id": "a"}),
            json!({"id": "b"}),
            json!({"id": "c"}),
        ];

        let rendered = format_products(&records, Some(2));
        assert!(rendered.contains("ID: a"));
        assert!(rendered.contains("ID: b"));
        assert!(!rendered.contains("ID: c"));
    }

    #[test]
    fn test_sample_size_larger_than_catalog_is_harmless() {
        let records = vec![json!({"id": "a"})];

        assert_eq!(
            format_products(&records, Some(10)),
            "ID: a, Name: N/A, Description: N/A, Tags: "
        );
    }
}

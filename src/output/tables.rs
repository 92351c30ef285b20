use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};
use rgwadmin::BucketInfo;
use serde_json::Value;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_quota_cell(percent: Option<f64>) -> Cell {
    let Some(percent) = percent else {
        return Cell::new("-");
    };
    let text = format!("{percent:.1}%");
    if percent >= 90.0 {
        Cell::new(text).fg(TableColor::Red)
    } else if percent >= 75.0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Green)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) if items.iter().all(|v| !v.is_object() && !v.is_array()) => items
            .iter()
            .map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Renders an arbitrary admin response as a table.
///
/// - list of strings: one `Name` column
/// - list of objects: one column per key of the first object
/// - object: `Field`/`Value` rows
/// - anything else: a single cell
pub fn value_table(value: &Value) -> Table {
    let mut table = create_table();

    match value {
        Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
            let columns: Vec<String> = items[0]
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default();
            let labels: Vec<&str> = columns.iter().map(String::as_str).collect();
            table.set_header(cyan_header(&labels));
            for item in items {
                table.add_row(
                    columns
                        .iter()
                        .map(|c| Cell::new(scalar_text(item.get(c).unwrap_or(&Value::Null))))
                        .collect::<Vec<_>>(),
                );
            }
        }
        Value::Array(items) => {
            table.set_header(cyan_header(&["Name"]));
            for item in items {
                table.add_row(vec![Cell::new(scalar_text(item))]);
            }
        }
        Value::Object(fields) => {
            table.set_header(cyan_header(&["Field", "Value"]));
            for (key, field) in fields {
                table.add_row(vec![Cell::new(key), Cell::new(scalar_text(field))]);
            }
        }
        other => {
            table.add_row(vec![Cell::new(scalar_text(other))]);
        }
    }

    table
}

pub fn bucket_stats_table(buckets: &[BucketInfo]) -> Table {
    let mut table = create_table();
    table.set_header(cyan_header(&["Bucket", "Owner", "Objects", "Size (KB)", "Quota used"]));

    for bucket in buckets {
        let usage = bucket.total_usage();
        table.add_row(vec![
            Cell::new(&bucket.bucket),
            Cell::new(&bucket.owner),
            Cell::new(usage.num_objects),
            Cell::new(usage.size_kb),
            color_coded_quota_cell(bucket.quota_used_percent()),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_list_table() {
        let rendered = value_table(&json!(["photos", "backups"])).to_string();
        assert!(rendered.contains("Name"));
        assert!(rendered.contains("photos"));
        assert!(rendered.contains("backups"));
    }

    #[test]
    fn test_object_list_uses_first_object_keys() {
        let rendered = value_table(&json!([
            {"user": "alice", "access_key": "AK1"},
            {"user": "bob", "access_key": "AK2"}
        ]))
        .to_string();
        assert!(rendered.contains("access_key"));
        assert!(rendered.contains("AK2"));
    }

    #[test]
    fn test_object_table_flattens_nested_values() {
        let rendered = value_table(&json!({
            "user_id": "alice",
            "placement_tags": ["fast", "ssd"],
            "user_quota": {"enabled": true}
        }))
        .to_string();
        assert!(rendered.contains("Field"));
        assert!(rendered.contains("fast, ssd"));
        assert!(rendered.contains("\"enabled\":true"));
    }

    #[test]
    fn test_quota_cell_without_quota() {
        assert_eq!(color_coded_quota_cell(None).content(), "-");
        assert_eq!(color_coded_quota_cell(Some(12.34)).content(), "12.3%");
    }

    #[test]
    fn test_bucket_stats_table() {
        let bucket: BucketInfo = serde_json::from_value(json!({
            "bucket": "photos",
            "owner": "alice",
            "usage": {"rgw.main": {"size_kb": 2048, "num_objects": 7}}
        }))
        .unwrap();
        let rendered = bucket_stats_table(&[bucket]).to_string();
        assert!(rendered.contains("photos"));
        assert!(rendered.contains("2048"));
        assert!(rendered.contains("Quota used"));
    }
}

use std::fs;
use std::path::Path;

use harvester_engine::{
    open_sink, DatasetSink, DelimitedSink, Delimiter, JsonLinesSink, NormalizedRecord, SinkFormat,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn record(id: u64, title: &str) -> NormalizedRecord {
    NormalizedRecord {
        id: Some(id),
        title: Some(title.to_string()),
        genres: Some("Drama, Comedy".to_string()),
        ..NormalizedRecord::default()
    }
}

#[test]
fn json_lines_writes_one_object_per_record() {
    let mut sink = JsonLinesSink::new(Vec::new());
    sink.append(record(1, "One")).unwrap();
    sink.append(record(2, "Two")).unwrap();
    sink.finish().unwrap();
    assert_eq!(sink.written(), 2);

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["id"], 2);
    assert_eq!(second["title"], "Two");
    assert!(second["certification"].is_null());
}

#[test]
fn tsv_has_header_and_empty_null_cells() {
    let mut sink = DelimitedSink::new(Vec::new(), Delimiter::Tab);
    sink.append(record(7, "Seven")).unwrap();
    sink.finish().unwrap();

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), NormalizedRecord::COLUMNS.join("\t"));
    let cells: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(cells.len(), 24);
    assert_eq!(cells[0], "7");
    assert_eq!(cells[1], "Seven");
    assert_eq!(cells[2], "");
    assert_eq!(cells[13], "Drama, Comedy");
    assert!(lines.next().is_none());
}

#[test]
fn csv_quotes_cells_containing_the_separator() {
    let mut sink = DelimitedSink::new(Vec::new(), Delimiter::Comma);
    sink.append(record(3, "Say \"when\"")).unwrap();
    sink.finish().unwrap();

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let row = text.lines().nth(1).unwrap();
    assert!(row.starts_with("3,\"Say \"\"when\"\"\","));
    assert!(row.contains(",\"Drama, Comedy\","));
}

#[test]
fn empty_delimited_output_still_has_a_header() {
    let mut sink = DelimitedSink::new(Vec::new(), Delimiter::Comma);
    sink.finish().unwrap();
    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert_eq!(text, format!("{}\n", NormalizedRecord::COLUMNS.join(",")));
}

#[test]
fn format_is_guessed_from_extension() {
    assert_eq!(SinkFormat::from_path(Path::new("a/b.tsv")), SinkFormat::Tsv);
    assert_eq!(SinkFormat::from_path(Path::new("b.CSV")), SinkFormat::Csv);
    assert_eq!(SinkFormat::from_path(Path::new("b.jsonl")), SinkFormat::JsonLines);
    assert_eq!(SinkFormat::from_path(Path::new("b")), SinkFormat::JsonLines);
}

#[test]
fn file_sink_creates_parent_directories_and_streams_rows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("data").join("movies.jsonl");

    let mut sink = open_sink(&path, SinkFormat::JsonLines).unwrap();
    sink.append(record(1, "One")).unwrap();
    sink.append(record(5, "Five")).unwrap();
    sink.finish().unwrap();
    assert_eq!(sink.written(), 2);
    drop(sink);

    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
}

use std::io::Write;

use pretty_assertions::assert_eq;

use shopbot_index::{load_prompts, parse_prompts, IndexError, PromptEntry};

fn corpus_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn blank_lines_are_dropped_and_order_kept() {
    let entries = parse_prompts("first\n\n   \nsecond\n\t\nthird\n");
    assert_eq!(
        entries,
        vec![
            PromptEntry::new("first"),
            PromptEntry::new("second"),
            PromptEntry::new("third"),
        ]
    );
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    let entries = parse_prompts("  Our return policy allows 30 days.  \r\n");
    assert_eq!(
        entries,
        vec![PromptEntry::new("Our return policy allows 30 days.")]
    );
}

#[test]
fn load_reads_file_from_disk() {
    let contents = "Our return policy allows 30 days.\n\nShipping takes 3-5 business days.\n";
    let file = corpus_file(contents);
    let entries = load_prompts(file.path()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].text(), "Shipping takes 3-5 business days.");
}

#[test]
fn loading_twice_yields_identical_sequences() {
    let file = corpus_file("a\nb\n\nc\n");
    let first = load_prompts(file.path()).unwrap();
    let second = load_prompts(file.path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_file_is_not_found() {
    let err = load_prompts("/nonexistent/path").unwrap_err();
    assert!(matches!(err, IndexError::NotFound(_)), "got {err:?}");
    assert_eq!(err.to_string(), "/nonexistent/path does not exist.");
}

#[test]
fn blank_only_file_loads_empty() {
    let file = corpus_file("\n  \n\n");
    assert!(load_prompts(file.path()).unwrap().is_empty());
}

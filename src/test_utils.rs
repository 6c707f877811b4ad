use serde_json::Value;
use std::fs;

pub fn do_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Loads the expected delta for a Markdown fixture.
pub fn load_output(file: &str) -> Value {
    let filename = format!("tests/markdown/{file}.json");
    let data = fs::read_to_string(&filename)
        .unwrap_or_else(|_| panic!("could not load test data from {filename}"));
    serde_json::from_str(&data).unwrap_or_else(|err| panic!("invalid JSON in {filename}: {err}"))
}

use std::fs;

#[macro_export]
macro_rules! parse_assert_eq {
    ($left:expr , $right:expr) => {
        assert_eq!(parse(&$left), $right);
    };
}

#[macro_export]
macro_rules! header_tests {
    () => {
        seq_macro::seq!(N in 1..=6 {
            #[test]
            fn it_converts_header_~N() {
                let header = "#".repeat(N as usize);
                let text = format!("{header} Some Text");
                let expected = serde_json::json!({"ops": [
                    {"insert": "Some Text", "attributes": {"header": N}},
                    {"insert": "\n", "attributes": {"header": N}}
                ]});
                parse_assert_eq!(text, expected);
            }
        });
    };
}

pub fn load_markdown(file: &str) -> String {
    let file = format!("tests/markdown/{file}.md");
    read_to_string(&file)
}

fn read_to_string(file: &str) -> String {
    fs::read_to_string(file).unwrap_or_else(|_| panic!("could not find test file: {file}"))
}

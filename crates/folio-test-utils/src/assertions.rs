//! Assertion helpers with readable failure output.

/// Assert that two strings are equal, with a line diff on failure.
pub fn assert_strings_equal(actual: &str, expected: &str) {
    if actual != expected {
        panic!(
            "Strings are not equal.\nDiff:\n{}",
            line_diff(expected, actual)
        );
    }
}

fn line_diff(expected: &str, actual: &str) -> String {
    let diff = similar::TextDiff::from_lines(expected, actual);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            similar::ChangeTag::Delete => "-",
            similar::ChangeTag::Insert => "+",
            similar::ChangeTag::Equal => " ",
        };
        output.push_str(&format!("{}{}", sign, change));
    }
    output
}

/// Assert that a result is Err and extract the error.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(value) => panic!("Expected Err, got Ok: {:?}", value),
            Err(e) => e,
        }
    };
}

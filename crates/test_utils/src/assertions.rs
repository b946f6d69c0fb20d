//! Custom Test Assertions
//!
//! Assertion helpers that give more meaningful failure messages than
//! substring checks on raw XML.

/// Asserts that each element appears in `xml`, in the given order
///
/// # Panics
///
/// Panics naming the first element that is missing or out of order
pub fn assert_elements_in_order(xml: &str, elements: &[&str]) {
    let mut cursor = 0;
    for element in elements {
        let tag = format!("<{}>", element);
        match xml[cursor..].find(&tag) {
            Some(offset) => cursor += offset + tag.len(),
            None => panic!(
                "Expected <{}> after position {} in:\n{}",
                element, cursor, xml
            ),
        }
    }
}

/// Asserts that `<name>value</name>` appears in `xml`
pub fn assert_element_text(xml: &str, name: &str, value: &str) {
    let expected = format!("<{0}>{1}</{0}>", name, value);
    assert!(
        xml.contains(&expected),
        "Expected {} in:\n{}",
        expected,
        xml
    );
}

use spider_sanitizer::{sanitize, Error, Policy, PolicyBuilder, PolicyTable};

const TABLE: &str = r#"
# element   attribute   scheme
p
a
img
a           href
img         src
*           title
*           *           https
img         -           -
"#;

#[test]
fn test_table_drives_policy() {
    let table: PolicyTable = TABLE.parse().unwrap();

    let mut builder = PolicyBuilder::new();
    builder.apply_table(&table);
    let policy = builder.build();

    assert_eq!(
        sanitize(
            r#"<p title="t"><a href="https://spider.cloud" target="_top">a</a><a href="http://spider.cloud">b</a><img src="data:x"></p>"#,
            &policy
        )
        .unwrap(),
        r#"<p title="t"><a href="https://spider.cloud">a</a><a>b</a><img></p>"#
    );
}

#[test]
fn test_table_round_trips_presets() {
    let table = Policy::ugc().to_table();
    let text = table.to_string();
    let parsed: PolicyTable = text.parse().unwrap();
    assert_eq!(parsed, table);

    let mut builder = PolicyBuilder::new();
    builder.apply_table(&parsed);
    let rebuilt = builder.build();

    for element in ["a", "table", "img", "blockquote"] {
        assert!(rebuilt.is_element_allowed(element));
    }
    assert!(rebuilt.is_scheme_allowed("href", "mailto"));
    assert!(!rebuilt.is_scheme_allowed("src", "mailto"));
}

#[test]
fn test_table_errors() {
    let bad = format!("{TABLE}img         src         https\n");

    match bad.parse::<PolicyTable>() {
        Err(Error::InvalidPolicyTable { line, .. }) => assert_eq!(line, 11),
        other => panic!("expected an invalid row, got {:?}", other),
    }
}

#[cfg(feature = "serde")]
#[test]
fn test_table_serde() {
    let table = PolicyTable::parse("a href -\n* * https").unwrap();
    let json = serde_json::to_string(&table).unwrap();

    assert_eq!(
        json,
        r#"[{"element":"a","attribute":"href","scheme":null},{"element":null,"attribute":null,"scheme":"https"}]"#
    );
    assert_eq!(serde_json::from_str::<PolicyTable>(&json).unwrap(), table);
}

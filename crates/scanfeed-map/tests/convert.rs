use proptest::prelude::*;

use scanfeed_map::apply;
use scanfeed_model::{Conversion, Row, RowConverter, UrlColumns, ValueConverter};

fn all_conversions() -> Vec<Conversion> {
    let mut conversions: Vec<Conversion> = ValueConverter::ALL
        .iter()
        .copied()
        .map(Conversion::Value)
        .collect();
    conversions.push(Conversion::Row(RowConverter::HttpHostAndUrl(UrlColumns::default())));
    conversions.push(Conversion::Row(RowConverter::CategoryOrDetail));
    conversions
}

#[test]
fn sinkhole_url_is_rebuilt() {
    let row = Row::from_pairs([
        ("timestamp", "2020-01-01 00:00:00"),
        ("http_host", "evil.example"),
        ("url", "POST /gate.php HTTP/1.0"),
        ("application", "http"),
    ]);
    let conversion = Conversion::Row(RowConverter::HttpHostAndUrl(UrlColumns::default()));
    let value = apply(&conversion, "POST /gate.php HTTP/1.0", &row).unwrap();
    assert_eq!(
        value.and_then(|v| v.as_text().map(str::to_string)).as_deref(),
        Some("http://evil.example/gate.php")
    );
}

proptest! {
    #[test]
    fn conversions_are_pure(
        value in "[ -~]{0,24}",
        host in "[a-z.]{0,12}",
        path in "[ -~]{0,16}",
    ) {
        let row = Row::from_pairs([
            ("http_host", host.as_str()),
            ("url", path.as_str()),
            ("category", ""),
            ("detail", value.as_str()),
        ]);
        let before = row.clone();

        for conversion in all_conversions() {
            let first = apply(&conversion, &value, &row);
            let second = apply(&conversion, &value, &row);
            // Debug form keeps NaN comparable.
            prop_assert_eq!(format!("{first:?}"), format!("{second:?}"), "{}", conversion.name());
        }
        prop_assert_eq!(row, before);
    }
}

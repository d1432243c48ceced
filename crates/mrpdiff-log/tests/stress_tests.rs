use mrpdiff_log::DocumentBuilder;

#[test]
fn test_char_by_char_streaming() {
    let input = include_str!("fixtures/run_b.log");
    let whole = DocumentBuilder::new("run_b.log").parse(input);

    let mut builder = DocumentBuilder::new("run_b.log");
    let mut streamed = Vec::new();
    for c in input.chars() {
        let mut buf = [0; 4];
        streamed.extend(builder.update(c.encode_utf8(&mut buf)));
    }
    let doc = builder.finish();

    assert_eq!(doc, whole);
    assert_eq!(streamed, whole.entries);
}

#[test]
fn test_large_log() {
    let mut input = String::new();
    for i in 0..20_000 {
        input.push_str(&format!("01:00:00 Job: J{} Part: P{} Qty: {}\n", i, i % 97, i));
        if i % 10 == 0 {
            input.push('\n');
        }
    }
    let doc = DocumentBuilder::new("big").parse(&input);
    assert_eq!(doc.entries.len(), 20_000);
    assert!(doc.entries.windows(2).all(|w| w[0].line_number < w[1].line_number));
}

#[test]
fn test_non_ascii_lines() {
    let doc = DocumentBuilder::new("x").parse("Teil: Größe ÄÖÜ\nJob: 42 — Überstunden\n");
    assert_eq!(doc.entries.len(), 2);
    assert_eq!(doc.entries[1].job_number.as_deref(), Some("42"));
}

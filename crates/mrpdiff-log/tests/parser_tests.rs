use chrono::NaiveDate;
use mrpdiff_log::DocumentBuilder;
use mrpdiff_log::ir::{EntryType, RunType};

#[test]
fn test_run_a_metadata() {
    let input = include_str!("fixtures/run_a.log");
    let doc = DocumentBuilder::new("run_a.log").parse(input);

    assert_eq!(doc.source_id, "run_a.log");
    assert_eq!(doc.site.as_deref(), Some("MfgSys"));
    assert_eq!(doc.run_type, RunType::Regeneration);
    assert_eq!(
        doc.start_time,
        NaiveDate::from_ymd_opt(2024, 10, 15).and_then(|d| d.and_hms_opt(1, 0, 0))
    );
    assert_eq!(doc.duration().map(|d| d.num_minutes()), Some(30));
    assert!(doc.parsing_errors.is_empty());
}

#[test]
fn test_run_a_entries() {
    let input = include_str!("fixtures/run_a.log");
    let doc = DocumentBuilder::new("run_a.log").parse(input);

    let non_blank = input.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(doc.entries.len(), non_blank);

    let demand = doc
        .entries
        .iter()
        .find(|e| e.entry_type == EntryType::Demand)
        .expect("demand entry");
    assert_eq!(demand.demand_source.as_deref(), Some("S: 100516/1/1"));

    let supply = doc
        .entries
        .iter()
        .find(|e| e.entry_type == EntryType::Supply)
        .expect("supply entry");
    assert_eq!(supply.supply_source.as_deref(), Some("J: F340394/0/0"));

    let error = doc.entries.iter().find(|e| e.is_error()).expect("error entry");
    assert_eq!(error.job_number.as_deref(), Some("14567"));
    assert_eq!(error.line_number, 14);
    assert_eq!(
        error.error_message.as_deref(),
        Some("01:10:23 ERROR: Job 14567 abandoned due to timeout")
    );
}

#[test]
fn test_job_line_scalars() {
    let doc = DocumentBuilder::new("run_a.log").parse(include_str!("fixtures/run_a.log"));
    let job = doc.entry_at(8).expect("line 8");
    assert_eq!(job.job_number.as_deref(), Some("14567"));
    assert_eq!(job.part_number.as_deref(), Some("ABC123"));
    assert_eq!(job.quantity, Some(50.0));
    assert_eq!(job.date, NaiveDate::from_ymd_opt(2024, 10, 20));
}

#[test]
fn test_processing_markers() {
    let doc = DocumentBuilder::new("run_b.log").parse(include_str!("fixtures/run_b.log"));
    assert!(doc.entries.iter().any(|e| e.entry_type == EntryType::ProcessingStart));
    assert!(doc.entries.iter().any(|e| e.entry_type == EntryType::ProcessingEnd));
    assert_eq!(doc.error_count(), 1);
}

#[test]
fn test_json_round_trip_shape() {
    let doc = DocumentBuilder::new("run_a.log").parse(include_str!("fixtures/run_a.log"));
    let json = serde_json::to_value(&doc).expect("serialize");
    assert_eq!(json["site"], "MfgSys");
    assert_eq!(json["run_type"], "Regeneration");
    assert_eq!(json["entries"][0]["entry_type"], "Info");
    // Unset optionals are omitted.
    assert!(json["entries"][0].get("job_number").is_none());
}

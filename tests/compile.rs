use chrono::NaiveDate;
use es_spec::config::{Config, RenderOptions};
use es_spec::render::Destinations;
use es_spec::model::ReadMapValue;
use es_spec::spec::{Extract, FieldType, Load, MERGED_FILE};
use es_spec::SpecError;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
}

fn deal_load() -> Load {
    Load::parse(&json!([
        {"entity": "Deal", "file": "deal.csv", "fields": [{"name": "Id", "type": "recordid"}]}
    ]))
    .unwrap()
}

#[test]
fn deal_snapshot_end_to_end() {
    let load = deal_load();
    let extract = Extract::parse_relative(
        &json!({"entities": [{"entity": "Deal", "fields": ["Id", "snapshot"]}]}),
        &load,
        today(),
    )
    .unwrap();

    let deal = extract.get_entity("Deal").unwrap();
    assert_eq!(deal.fields().len(), 2);
    assert_eq!(deal.fields()[0].field_type(), FieldType::RecordId);
    assert_eq!(deal.fields()[1].name(), "snapshot");
    assert_eq!(deal.identifying_field().unwrap().name(), "Id");

    let docs = extract.render_fragment("proj", &RenderOptions::default()).unwrap();
    let rendered: Value = serde_json::to_value(&docs).unwrap();
    assert_eq!(
        rendered,
        json!([{
            "readTask": {
                "entity": "Deal",
                "timezone": "UTC",
                "readMap": [{
                    "file": "/out_proj_Deal/deal.csv",
                    "populates": "Id",
                    "columns": [
                        {
                            "name": "Id",
                            "preferred": "Id",
                            "definition": {"type": "value", "ops": [{"type": "recordid", "data": "Id"}]}
                        },
                        {
                            "name": "snapshot",
                            "preferred": "snapshot",
                            "definition": {"type": "snapshot", "data": "date"}
                        }
                    ]
                }],
                "computedStreams": "[{\"type\":\"computed\",\"ops\":[]}]",
                "timeFrames": [{
                    "endDate": "2024-06-02",
                    "startDate": "2024-06-01",
                    "intervalUnit": "day",
                    "dayWithinPeriod": "LAST",
                    "interval": 1
                }]
            }
        }])
    );
}

#[test]
fn merged_fragments_feed_extract_and_upload() {
    let load = Load::parse(&json!([
        {
            "entity": "Opportunity",
            "file": "data/opportunity.csv",
            "fields": [
                {"name": "Id", "type": "recordid"},
                {"name": "Amount", "type": "fact"},
                {"name": "CloseDate", "type": "date"}
            ]
        },
        {
            "entity": "Opportunity",
            "file": "data/opportunity_history.csv",
            "fields": [
                {"name": "Id", "type": "recordid"},
                {"name": "StageName", "type": "attribute"},
                {"name": "Timestamp", "type": "timestamp"}
            ]
        }
    ]))
    .unwrap();

    let merged = load.get_merged_entity_for("Opportunity").unwrap();
    assert_eq!(merged.file(), MERGED_FILE);
    assert_eq!(merged.fields().len(), 6);

    let upload = serde_json::to_value(load.render_upload_tasks("proj", &[]).unwrap()).unwrap();
    assert_eq!(
        upload,
        json!([
            {"uploadTask": {
                "entity": "Opportunity",
                "file": "/uploads/proj/opportunity.csv",
                "attributes": [
                    {"name": "Id", "type": "recordid"},
                    {"name": "Amount", "type": "fact"},
                    {"name": "CloseDate", "type": "timeAttribute"}
                ]
            }},
            {"uploadTask": {
                "entity": "Opportunity",
                "file": "/uploads/proj/opportunity_history.csv",
                "attributes": [
                    {"name": "Id", "type": "recordid"},
                    {"name": "StageName", "type": "attribute"},
                    {"name": "Timestamp", "type": "timestamp"}
                ]
            }}
        ])
    );

    let extract = Extract::parse_relative(
        &json!({
            "timezone": "America/New_York",
            "timeframes": {"to": "2024-05-31", "from": "", "interval_unit": "week", "interval": 2},
            "entities": [{
                "entity": "Opportunity",
                "fields": [
                    "Amount",
                    "StageName",
                    "DeletedAt",
                    "duration",
                    {"hid": {"from_entity": "Account", "from_fields": ["Name"]}}
                ]
            }]
        }),
        &load,
        today(),
    )
    .unwrap();

    let opportunity = &extract.entities()[0];
    assert_eq!(opportunity.identifying_field().unwrap().name(), "hid-Account");
    assert_eq!(opportunity.get_field("DeletedAt").unwrap().field_type(), FieldType::Time);

    let docs = extract.render_fragment("proj", &RenderOptions::default()).unwrap();
    let task = &docs[0].read_task;
    assert_eq!(task.timezone, "America/New_York");
    assert_eq!(task.time_frames[0].start_date, "2024-05-30");
    assert_eq!(task.time_frames[0].interval_unit, "week");
    assert_eq!(task.time_frames[0].interval, 2);

    let ReadMapValue::Structured(maps) = &task.read_map else {
        panic!("expected structured readMap");
    };
    assert_eq!(maps[0].populates, "hid-Account");
    let names: Vec<&str> = maps[0].columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Amount", "StageName", "DeletedAt", "StageDuration", "hid-Account"]
    );
}

#[test]
fn unresolved_field_fails_whole_extract() {
    let err = Extract::parse_relative(
        &json!({"entities": [
            {"entity": "Deal", "fields": ["Id"]},
            {"entity": "Deal", "fields": ["Id", "Bogus"]}
        ]}),
        &deal_load(),
        today(),
    )
    .unwrap_err();
    assert!(matches!(err, SpecError::InsufficientSpecification(_)));
}

#[test]
fn extract_without_identifying_field_fails_at_render() {
    let load = Load::parse(&json!([
        {
            "entity": "Deal",
            "file": "deal.csv",
            "fields": [{"name": "Id", "type": "recordid"}, {"name": "Name", "type": "attribute"}]
        }
    ]))
    .unwrap();
    let extract = Extract::parse_relative(
        &json!({"entities": [{"entity": "Deal", "fields": ["Name"]}]}),
        &load,
        today(),
    )
    .unwrap();
    assert_eq!(
        extract
            .render_fragment("proj", &RenderOptions::default())
            .unwrap_err(),
        SpecError::MissingIdentifyingField("Deal".into())
    );
}

#[test]
fn autoincrement_keys_entities_without_record_id() {
    let load = Load::parse(&json!([
        {"entity": "Event", "file": "events.csv", "fields": [{"name": "Kind", "type": "attribute"}]}
    ]))
    .unwrap();
    let extract = Extract::parse_relative(
        &json!({"entities": [{"entity": "Event", "fields": ["Kind", "autoincrement"]}]}),
        &load,
        today(),
    )
    .unwrap();
    let docs = extract.render_fragment("p", &RenderOptions::default()).unwrap();
    let ReadMapValue::Structured(maps) = &docs[0].read_task.read_map else {
        panic!("expected structured readMap");
    };
    assert_eq!(maps[0].populates, "generate");
}

#[test]
fn load_config_round_trip_preserves_names_files_and_types() {
    let load = Load::parse(&json!([
        {
            "entity": "Deal",
            "file": "deal.csv",
            "fields": [{"name": "Id", "type": "recordid"}, {"name": "Stage", "type": "attribute"}]
        },
        {"entity": "Deal", "file": "deal_more.csv", "fields": [{"name": "Amount", "type": "fact"}]},
        {"entity": "Account", "file": "account.csv", "fields": [{"name": "Id", "type": "recordid"}]}
    ]))
    .unwrap();

    let config = serde_json::to_value(load.render_config()).unwrap();
    let again = Load::parse(&config).unwrap();

    assert_eq!(again.entities().len(), 3);
    for (a, b) in load.entities().iter().zip(again.entities()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.file(), b.file());
        let pairs = |e: &es_spec::Entity| {
            e.fields()
                .iter()
                .map(|f| (f.name().to_string(), f.field_type()))
                .collect::<Vec<_>>()
        };
        assert_eq!(pairs(a), pairs(b));
    }
}

#[test]
fn read_tasks_ignore_local_naming_options() {
    let extract = Extract::parse_relative(
        &json!({"entities": [{"entity": "Deal", "fields": ["Id", "snapshot"]}]}),
        &deal_load(),
        today(),
    )
    .unwrap();
    let config = Config {
        destinations: Destinations {
            with_date: true,
            deleted: true,
        },
        ..Config::default()
    };

    let plain = extract.render_fragment("proj", &RenderOptions::default()).unwrap();
    let flagged = extract.render_fragment("proj", &config.render_options()).unwrap();
    assert_eq!(plain, flagged);

    let ReadMapValue::Structured(maps) = &flagged[0].read_task.read_map else {
        panic!("expected structured readMap");
    };
    assert_eq!(maps[0].file, "/out_proj_Deal/deal.csv");
}

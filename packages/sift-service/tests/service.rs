use std::{collections::BTreeSet, sync::Arc};

use serde_json::{Value, json};

use sift_domain::{ArgValue, ArgsMap, BuildContext, ErrorKind, WidgetState, WidgetValue};
use sift_service::{Error, SiftService};
use sift_testkit::{RecordingStore, ScriptedTransport, ok_response, sample_config, test_backends};

fn service_with(store: Arc<RecordingStore>) -> SiftService {
	let cfg = sample_config().expect("Sample config must parse.");
	let backends = test_backends(store, Arc::new(ScriptedTransport::new()));

	SiftService::with_backends(&cfg, backends).expect("Sample table must validate.")
}

fn service() -> SiftService {
	service_with(Arc::new(RecordingStore::new()))
}

fn state(value: Value) -> WidgetState {
	serde_json::from_value(value).expect("Widget state JSON must parse.")
}

fn args(value: Value) -> ArgsMap {
	serde_json::from_value(value).expect("Args JSON must parse.")
}

fn build_error(service: &SiftService, value: Value) -> sift_domain::Error {
	match service.build(&state(value), Some("default")) {
		Err(Error::Build(err)) => err,
		other => panic!("Expected build error, got {other:?}."),
	}
}

#[test]
fn full_selection_round_trips_through_describe() {
	let service = service();
	let built = service
		.build(
			&state(json!({
				"level_min": "60",
				"level_max": "109",
				"price_min": "1000",
				"zhuan_min": "2",
				"zhuan_max": "3",
				"school": ["1", "3"],
				"prior_school": ["-1", "2"],
				"equip_effect": ["11"],
				"equip_effect_match_all": true,
				"expt_gongji": "20",
				"expt_fangyu": "15",
				"skill_shensu": "7",
				"skill_match_all": true,
				"sum_exp": "2000",
				"summon_combat": { "gongji": "800" },
				"summon_speed": { "sudu": "300" },
			})),
			None,
		)
		.expect("Build must succeed.");

	assert_eq!(
		built,
		args(json!({
			"level_min": 60,
			"level_max": 109,
			"price_min": 1000,
			"zhuan_min": 2,
			"zhuan_max": 3,
			"school": "1,3",
			"prior_school": "0,2",
			"equip_effect": "11",
			"equip_effect_match_all": 1,
			"expt_gongji": 20,
			"expt_fangyu": 15,
			"skill_shensu": 7,
			"skill_match_all": 1,
			"sum_exp": 2000,
			"summon_attrs": r#"{"gongji":800,"sudu":300}"#,
		}))
	);

	let description = service.describe(&built);
	let rebuilt = service.build(&description.widget_state, None).expect("Rebuild must succeed.");

	assert_eq!(rebuilt, built);
	assert_eq!(description.texts["cultivation"], "Cultivation: attack ≥ 20, defence ≥ 15");
	assert_eq!(description.texts["school"], "School: Datang, Nuer");
	assert_eq!(description.texts["price"], "Price: ≥ 1000");
	assert_eq!(description.texts["summon_speed"], "Summon speed: speed ≥ 300");
}

#[test]
fn zero_and_blank_inputs_are_omitted() {
	let built = service()
		.build(
			&state(json!({
				"level_min": "0",
				"price_min": "",
				"expt_gongji": "000",
				"school": ["2", " "],
			})),
			None,
		)
		.expect("Build must succeed.");

	assert_eq!(built, args(json!({ "school": "2" })));
}

#[test]
fn sentinel_round_trips_without_mixing() {
	let service = service();
	let built = service
		.build(&state(json!({ "prior_school": ["-1"] })), None)
		.expect("Build must succeed.");

	assert_eq!(built.get("prior_school"), Some(&ArgValue::from("0")));

	let description = service.describe(&built);

	assert_eq!(
		description.widget_state.tags("prior_school"),
		Some(&BTreeSet::from(["-1".to_string()]))
	);
	assert_eq!(description.texts["prior_school"], "Previous school: None");
}

#[test]
fn inverted_level_pair_fails_without_saving() {
	let store = Arc::new(RecordingStore::new());
	let service = service_with(store.clone());
	let err = build_error(&service, json!({ "level_min": "10", "level_max": "5" }));

	assert_eq!(err.kind(), ErrorKind::Ordering);
	assert_eq!(
		err.to_string(),
		"Minimum character level: range is invalid, the lower value exceeds the upper value."
	);
	assert!(store.saves().is_empty());
}

#[test]
fn ordering_is_checked_for_larger_values_too() {
	let err = build_error(&service(), json!({ "level_min": "50", "level_max": "10" }));

	assert_eq!(err, sift_domain::Error::Ordering { label: "Minimum character level".to_string() });
}

#[test]
fn inverted_range_names_the_range() {
	let err = build_error(&service(), json!({ "price_min": "500", "price_max": "100" }));

	assert_eq!(err, sift_domain::Error::Ordering { label: "Price".to_string() });
}

#[test]
fn orphan_match_flag_is_dropped() {
	let built = service()
		.build(
			&state(json!({
				"level_min": "60",
				"equip_effect": [],
				"equip_effect_match_all": true,
				"skill_match_all": true,
			})),
			None,
		)
		.expect("Build must succeed.");

	assert_eq!(built, args(json!({ "level_min": 60 })));
}

#[test]
fn default_state_is_an_empty_filter() {
	let err = build_error(&service(), json!({}));

	assert_eq!(err, sift_domain::Error::EmptyFilter);
	assert_eq!(err.to_string(), "Too few filter criteria: set at least one filter.");
}

#[test]
fn zero_skill_threshold_is_dropped() {
	let built = service()
		.build(&state(json!({ "skill_qiang_shen": "0", "skill_shensu": "7" })), None)
		.expect("Build must succeed.");

	assert_eq!(built, args(json!({ "skill_shensu": 7 })));
}

#[test]
fn full_span_range_is_omitted() {
	let service = service();
	let full = service
		.build(&state(json!({ "zhuan_min": "1", "zhuan_max": "4", "school": ["1"] })), None)
		.expect("Build must succeed.");
	let partial = service
		.build(&state(json!({ "zhuan_min": "1", "zhuan_max": "3" })), None)
		.expect("Build must succeed.");

	assert_eq!(full, args(json!({ "school": "1" })));
	assert_eq!(partial, args(json!({ "zhuan_min": 1, "zhuan_max": 3 })));
}

#[test]
fn nested_groups_merge_into_one_slot() {
	let built = service()
		.build(
			&state(json!({
				"summon_combat": { "gongji": "800", "fangyu": "500" },
				"summon_speed": { "sudu": "300", "lingli": "0" },
			})),
			None,
		)
		.expect("Build must succeed.");

	assert_eq!(built, args(json!({ "summon_attrs": r#"{"fangyu":500,"gongji":800,"sudu":300}"# })));
}

#[test]
fn corrupted_nested_value_describes_as_unset() {
	let description =
		service().describe(&args(json!({ "level_min": 60, "summon_attrs": "{broken" })));

	assert_eq!(description.texts.len(), 1);
	assert_eq!(description.texts["level_min"], "Minimum character level: 60");
	assert!(description.widget_state.get("summon_combat").is_none());
}

#[test]
fn unreadable_numbers_are_ignored_on_describe() {
	let description =
		service().describe(&args(json!({ "level_min": "sixty", "expt_gongji": 12 })));

	assert!(description.widget_state.get("level_min").is_none());
	assert_eq!(
		description.widget_state.get("expt_gongji"),
		Some(&WidgetValue::Text("12".to_string()))
	);
}

#[test]
fn foreign_primitives_are_skipped_on_describe() {
	let description = service().describe(&args(json!({ "level_min": -5, "expt_gongji": 12 })));

	assert!(description.widget_state.get("level_min").is_none());
	assert!(!description.texts.contains_key("level_min"));
	assert_eq!(
		description.widget_state.get("expt_gongji"),
		Some(&WidgetValue::Text("12".to_string()))
	);
	assert_eq!(description.texts["cultivation"], "Cultivation: attack ≥ 12");
}

#[test]
fn format_errors_stop_at_the_first_field() {
	let err = build_error(&service(), json!({ "level_min": "abc", "price_min": "1.5" }));

	assert_eq!(err.kind(), ErrorKind::Format);
	assert_eq!(
		err.to_string(),
		"Minimum character level: enter a whole number of at most 10 digits and try again."
	);
}

#[test]
fn group_bounds_name_group_and_member() {
	let err = build_error(&service(), json!({ "expt_gongji": "30" }));

	assert_eq!(err.to_string(), "Cultivation attack must be at most 25.");
}

#[test]
fn level_cap_comes_from_limits_and_context() {
	let mut cfg = sample_config().expect("Sample config must parse.");

	cfg.limits.insert("server_level_cap".to_string(), 150);

	let store = Arc::new(RecordingStore::new());
	let backends = test_backends(store, Arc::new(ScriptedTransport::new()));
	let service = SiftService::with_backends(&cfg, backends).expect("Sample table must validate.");
	let capped = state(json!({ "level_max": "170" }));

	assert_eq!(service.context().ceiling("server_level_cap"), Some(150));

	match service.build(&capped, None) {
		Err(Error::Build(err)) => {
			assert_eq!(err.kind(), ErrorKind::Range);
			assert_eq!(err.to_string(), "Maximum character level must be at most 150.");
		},
		other => panic!("Expected build error, got {other:?}."),
	}

	let raised = service.with_context(BuildContext::new().with_ceiling("server_level_cap", 175));

	assert_eq!(
		raised.build(&capped, None).expect("Build must succeed."),
		args(json!({ "level_max": 170 }))
	);
}

#[test]
fn successful_build_is_saved_and_listed() {
	let store = Arc::new(RecordingStore::new());
	let service = service_with(store.clone());
	let built = service
		.build(&state(json!({ "level_min": "60", "school": ["1"] })), Some("pvp"))
		.expect("Build must succeed.");

	assert_eq!(store.saves(), vec![("pvp".to_string(), built.clone())]);

	let recent = service.recent().expect("Listing must succeed.");

	assert_eq!(recent.len(), 1);
	assert_eq!(recent[0].profile, "pvp");
	assert_eq!(recent[0].summary, "Minimum character level: 60; School: Datang");

	let restored = service.restore("pvp").expect("Restore must succeed.").expect("Profile exists.");

	assert_eq!(service.build(&restored.widget_state, None).expect("Rebuild must succeed."), built);
}

#[test]
fn failed_save_does_not_fail_the_build() {
	let store = Arc::new(RecordingStore::failing());
	let service = service_with(store.clone());
	let built = service.build(&state(json!({ "level_min": "60" })), Some("default"));

	assert_eq!(built.expect("Build must succeed."), args(json!({ "level_min": 60 })));
	assert_eq!(store.saves().len(), 1);
	assert!(service.restore("default").expect("Restore must succeed.").is_none());
}

#[tokio::test]
async fn search_builds_then_submits_page_one() {
	let cfg = sample_config().expect("Sample config must parse.");
	let transport = Arc::new(ScriptedTransport::new());
	let backends = test_backends(Arc::new(RecordingStore::new()), transport.clone());
	let service = SiftService::with_backends(&cfg, backends).expect("Sample table must validate.");

	transport.push_reply(Ok(ok_response(vec![json!({ "id": 7 })])));

	let (built, response) = service
		.search(&state(json!({ "level_min": "60" })), None)
		.await
		.expect("Search must succeed.");

	assert_eq!(built, args(json!({ "level_min": 60 })));
	assert_eq!(response.items, vec![json!({ "id": 7 })]);
	assert_eq!(transport.calls(), vec![json!({ "level_min": 60, "page": 1 })]);
}

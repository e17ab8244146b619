use ocrd_validators::serialize::to_json;
use ocrd_validators::{Issue, ProcessingServerConfigValidator, Report};
use proptest::prelude::*;
use serde_json::json;

fn arb_issue() -> impl Strategy<Value = Issue> {
    (any::<bool>(), "[a-z]{1,8}(-[a-z]{1,8})?", "[ -~]{0,30}", prop::option::of("(/[a-z0-9]{1,5}){1,3}"))
        .prop_map(|(error, category, message, pointer)| {
            let issue = if error {
                Issue::error(category, message)
            } else {
                Issue::warning(category, message)
            };
            match pointer {
                Some(p) => issue.at_pointer(p),
                None => issue,
            }
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn merge_is_concatenation(
        a in prop::collection::vec(arb_issue(), 0..5),
        b in prop::collection::vec(arb_issue(), 0..5),
    ) {
        let merged = Report::from_issues(a.clone()).merge(Report::from_issues(b.clone()));
        let expected: Vec<Issue> = a.into_iter().chain(b).collect();
        prop_assert_eq!(merged.issues(), expected.as_slice());
    }

    #[test]
    fn valid_means_no_errors(issues in prop::collection::vec(arb_issue(), 0..8)) {
        let report = Report::from_issues(issues.clone());
        prop_assert_eq!(report.is_valid(), issues.iter().all(|i| !i.is_error()));
    }

    #[test]
    fn json_round_trips(issues in prop::collection::vec(arb_issue(), 0..8)) {
        let report = Report::from_issues(issues);
        let back: Report = serde_json::from_str(&to_json(&report).unwrap()).unwrap();
        prop_assert_eq!(back, report);
    }

    #[test]
    fn validation_is_deterministic(port in -10i64..70_000, queue in "[a-z]{1,6}") {
        let config = json!({
            "process_queue": {"address": "localhost", "port": port, "queues": ["q"]},
            "database": {"address": "localhost", "port": 27017},
            "hosts": [{"address": "localhost", "workers": [{"name": queue}]}]
        });
        let validator = ProcessingServerConfigValidator::builtin().unwrap();
        let first = validator.validate(&config);
        let second = validator.validate(&config);
        prop_assert_eq!(first, second);
    }
}

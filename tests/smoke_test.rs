//! Smoke test to verify basic functionality

use rulepipe::{transform, Rule, RuleSet, TransformOptions};
use serde_json::json;

#[test]
fn smoke_test_basic_transform() {
    let rules = vec![Rule {
        pattern: "^https?://[^/]+/s/[^/]+/([^/?#]+)(?:\\?.*)?$".into(),
        replacement: "/$1".into(),
        ..Rule::default()
    }];

    let out = transform(
        "https://h/s/SFRADemo/mens-pant/44736828M.html?lang=en_US",
        &rules,
        &TransformOptions::default(),
    )
    .expect("transform succeeds");

    assert_eq!(out, "/mens-pant/44736828M.html");
}

#[test]
fn smoke_test_config_to_output() {
    // The whole path a host walks: config value -> rule set -> transform
    let config = json!({
        "plp": [
            {
                "inputFieldPath": "product.data[0].slugUrl",
                "id": "rule_1",
                "description": "Strip host + site, keep path/id",
                "pattern": "^(?:https?://)?[^/]+/s/[^/]+/([^?#]+)(?:\\?[^#]*)?$",
                "flags": "i",
                "replacement": "/$1"
            },
            {
                "input": "$rule_1",
                "id": "rule_2",
                "pattern": "(mens)",
                "flags": "i",
                "replacement": "womans"
            }
        ]
    });
    let set = RuleSet::from_config(&config, Some("plp"));
    assert_eq!(set.rules.len(), 2);

    let entry = json!({
        "product": {
            "data": [{
                "slugUrl": "https://zybx-009.dx.commercecloud.salesforce.com/s/RefArch/mens-cotton-stretch-pant/44736828M.html?lang=en_US"
            }]
        }
    });
    let options = TransformOptions {
        context: entry,
        ..TransformOptions::default()
    };

    let seed = set.first_input_field_path().expect("seed path");
    assert_eq!(seed, "product.data[0].slugUrl");

    let out = transform("", &set.rules, &options).expect("transform succeeds");
    assert_eq!(out, "/womans-cotton-stretch-pant/44736828M.html");
}

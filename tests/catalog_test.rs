use serde_json::json;

use kairosdb_datasource::features::{legacy_features, parse_catalog, Feature};
use kairosdb_datasource::templating::VariableExpander;

const CATALOG: &str = r#"[
    {
        "name": "aggregators",
        "label": "Aggregators",
        "properties": [
            {
                "name": "percentile",
                "label": "Percentile",
                "description": "Computes a percentile over each sampling window",
                "properties": [
                    {
                        "name": "percentile",
                        "label": "Percentile",
                        "type": "double",
                        "defaultValue": "0.1",
                        "validations": [
                            {"expression": "value > 0 && value <= 1", "message": "Percentile must be in ]0, 1]", "type": "js"}
                        ]
                    },
                    {"name": "color", "label": "Color", "type": "rgb"},
                    {
                        "name": "sampling",
                        "label": "Sampling",
                        "type": "object",
                        "properties": [
                            {"name": "value", "label": "Value", "type": "long", "defaultValue": "1"},
                            {"name": "unit", "label": "Unit", "type": "enum", "options": ["MINUTES", "HOURS"], "defaultValue": "minutes"}
                        ]
                    }
                ]
            }
        ]
    }
]"#;

#[test]
fn test_unknown_parameter_type_is_dropped() {
    let features = parse_catalog(CATALOG).unwrap();
    let component = features[0].component("percentile").unwrap();

    let names: Vec<&str> = component.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["percentile", "sampling"]);
}

#[test]
fn test_extracted_component_serializes_into_feature() {
    let features = parse_catalog(CATALOG).unwrap();
    let component = features[0].component("percentile").unwrap().extract();

    let mut feature = Feature::new(&features[0].name);
    feature.insert_component(0, component);

    let expander = VariableExpander::noop();
    assert_eq!(
        serde_json::Value::Object(feature.serialize(&expander)),
        json!({
            "aggregators": [{
                "name": "percentile",
                "percentile": 0.1,
                "sampling": {"value": 1, "unit": "MINUTES"}
            }]
        })
    );
}

#[test]
fn test_validation_messages() {
    let mut features = parse_catalog(CATALOG).unwrap();
    let component = &mut features[0].components[0];
    let expander = VariableExpander::noop();
    assert_eq!(component.validate(&expander), None);

    let percentile = component.parameter_mut("percentile").unwrap();
    percentile.set_value(&json!("2"));
    assert_eq!(component.validate(&expander).as_deref(), Some("Percentile must be in ]0, 1]"));

    component.parameter_mut("percentile").unwrap().set_value(&json!("abc"));
    assert_eq!(component.validate(&expander).as_deref(), Some("Value must be a number"));
}

#[test]
fn test_nested_parameter_labels() {
    let features = parse_catalog(CATALOG).unwrap();
    let component = features[0].component("percentile").unwrap();
    let sampling = component.parameters.iter().find(|p| p.name == "sampling").unwrap();
    assert_eq!(sampling.label(), "Sampling");

    let sampling = legacy_features()
        .into_iter()
        .find(|f| f.name == "aggregators")
        .and_then(|f| f.component("avg").cloned())
        .unwrap();
    assert!(!sampling.parameters.is_empty());
}

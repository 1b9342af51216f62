//! Resource dependency graph of a template.
//!
//! CloudFormation orders creation by the references it finds in resource
//! properties plus any explicit `DependsOn`. References made by name rather
//! than through `Ref`/`Fn::GetAtt` are invisible to it.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use shared::{Error, Result};

use crate::template::Template;

impl Template {
    /// Resources referenced through `Ref` or `Fn::GetAtt` in a resource's properties.
    ///
    /// Pseudo parameters and template parameters are not resources and are skipped.
    pub fn implicit_dependencies(&self, logical_id: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        if let Some(resource) = self.resources.get(logical_id) {
            collect_references(&resource.properties, &mut found);
        }
        found.retain(|id| !id.starts_with("AWS::") && !self.parameters.contains_key(id));
        found
    }

    /// Implicit references plus explicit `DependsOn` entries.
    pub fn dependencies(&self, logical_id: &str) -> BTreeSet<String> {
        let mut deps = self.implicit_dependencies(logical_id);
        if let Some(resource) = self.resources.get(logical_id) {
            deps.extend(resource.depends_on.iter().cloned());
        }
        deps
    }

    /// Order in which CloudFormation may create the resources.
    ///
    /// Ties are broken by logical ID so the order is deterministic.
    pub fn creation_order(&self) -> Result<Vec<String>> {
        let mut pending: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        for id in self.resources.keys() {
            let deps = self.dependencies(id);
            if let Some(missing) = deps.iter().find(|dep| !self.resources.contains_key(*dep)) {
                return Err(Error::UnknownResource {
                    from: id.clone(),
                    to: missing.clone(),
                });
            }
            pending.insert(id.as_str(), deps);
        }

        let mut order = Vec::with_capacity(pending.len());
        let mut ready: BTreeSet<&str> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| *id)
            .collect();

        while let Some(id) = ready.pop_first() {
            pending.remove(id);
            for (other, deps) in pending.iter_mut() {
                if deps.remove(id) && deps.is_empty() {
                    ready.insert(*other);
                }
            }
            order.push(id.to_string());
        }

        if !pending.is_empty() {
            return Err(Error::DependencyCycle(
                pending.keys().map(|id| id.to_string()).collect(),
            ));
        }

        Ok(order)
    }
}

fn collect_references(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::String(id)) = map.get("Ref") {
                    found.insert(id.clone());
                    return;
                }
                if let Some(Value::Array(args)) = map.get("Fn::GetAtt") {
                    if let Some(Value::String(id)) = args.first() {
                        found.insert(id.clone());
                    }
                    return;
                }
            }
            for nested in map.values() {
                collect_references(nested, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, found);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Parameter, Resource};
    use serde_json::json;

    fn resource(properties: Value, depends_on: &[&str]) -> Resource {
        Resource {
            resource_type: "AWS::CloudFormation::WaitConditionHandle".to_string(),
            properties,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_references_are_collected_from_nested_values() {
        let mut template = Template::new("test");
        template.add_parameter("Key", Parameter::string("key")).unwrap();
        template.add_resource("A", resource(json!({}), &[])).unwrap();
        template.add_resource("B", resource(json!({}), &[])).unwrap();
        template
            .add_resource(
                "C",
                resource(
                    json!({
                        "Nested": { "List": [{ "Fn::GetAtt": ["A", "Arn"] }] },
                        "Region": { "Ref": "AWS::Region" },
                        "Key": { "Ref": "Key" },
                        "Name": "B"
                    }),
                    &["B"],
                ),
            )
            .unwrap();

        assert_eq!(
            template.implicit_dependencies("C"),
            BTreeSet::from(["A".to_string()])
        );
        assert_eq!(
            template.dependencies("C"),
            BTreeSet::from(["A".to_string(), "B".to_string()])
        );
        assert_eq!(template.creation_order().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_order_follows_dependencies_not_names() {
        let mut template = Template::new("test");
        template
            .add_resource("A", resource(json!({ "X": { "Ref": "Z" } }), &[]))
            .unwrap();
        template.add_resource("Z", resource(json!({}), &[])).unwrap();
        assert_eq!(template.creation_order().unwrap(), vec!["Z", "A"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut template = Template::new("test");
        template
            .add_resource("A", resource(json!({ "X": { "Ref": "B" } }), &[]))
            .unwrap();
        template.add_resource("B", resource(json!({}), &["A"])).unwrap();
        template.add_resource("C", resource(json!({}), &[])).unwrap();

        match template.creation_order().unwrap_err() {
            Error::DependencyCycle(ids) => assert_eq!(ids, vec!["A", "B"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_reference_is_reported() {
        let mut template = Template::new("test");
        template.add_resource("A", resource(json!({}), &["Ghost"])).unwrap();
        assert!(matches!(
            template.creation_order().unwrap_err(),
            Error::UnknownResource { ref from, ref to } if from == "A" && to == "Ghost"
        ));
    }
}

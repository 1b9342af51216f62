//! CloudFormation template model.
//!
//! Values that are only known at deployment time (resource IDs, attributes,
//! the region) are carried as [`Expr`] and serialized as intrinsic functions.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use shared::{Error, Result};

pub const FORMAT_VERSION: &str = "2010-09-09";

/// AWS pseudo parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pseudo {
    AccountId,
    Partition,
    Region,
    StackName,
    UrlSuffix,
}

impl Pseudo {
    pub fn name(self) -> &'static str {
        match self {
            Pseudo::AccountId => "AWS::AccountId",
            Pseudo::Partition => "AWS::Partition",
            Pseudo::Region => "AWS::Region",
            Pseudo::StackName => "AWS::StackName",
            Pseudo::UrlSuffix => "AWS::URLSuffix",
        }
    }
}

/// A template value: a literal or a deploy-time expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    /// `Ref` to a resource or a template parameter.
    Ref(String),
    /// `Fn::GetAtt` of a resource attribute.
    GetAtt(String, String),
    /// `Fn::Join` with a separator.
    Join(String, Vec<Expr>),
    Pseudo(Pseudo),
}

impl Expr {
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Expr::Ref(logical_id.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Expr::GetAtt(logical_id.into(), attribute.into())
    }

    pub fn region() -> Self {
        Expr::Pseudo(Pseudo::Region)
    }

    /// Concatenate parts with `Fn::Join ""`, merging adjacent literals and
    /// inlining nested concatenations.
    ///
    /// A concatenation of literals only collapses to a single literal.
    pub fn concat<I>(parts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Expr>,
    {
        let mut merged: Vec<Expr> = Vec::new();
        for part in parts.into_iter().map(Into::into) {
            match part {
                Expr::Join(separator, nested) if separator.is_empty() => {
                    for nested_part in nested {
                        push_merged(&mut merged, nested_part);
                    }
                }
                part => push_merged(&mut merged, part),
            }
        }

        match merged.len() {
            0 => Expr::Literal(String::new()),
            1 if matches!(merged[0], Expr::Literal(_)) => merged.remove(0),
            _ => Expr::Join(String::new(), merged),
        }
    }

    /// Evaluate the expression against deployed values.
    pub fn resolve(&self, bindings: &Bindings) -> Result<String> {
        match self {
            Expr::Literal(s) => Ok(s.clone()),
            Expr::Ref(id) => bindings
                .refs
                .get(id)
                .cloned()
                .ok_or_else(|| Error::Unresolved(format!("Ref {}", id))),
            Expr::GetAtt(id, attribute) => bindings
                .attributes
                .get(&(id.clone(), attribute.clone()))
                .cloned()
                .ok_or_else(|| Error::Unresolved(format!("{}.{}", id, attribute))),
            Expr::Join(separator, parts) => Ok(parts
                .iter()
                .map(|part| part.resolve(bindings))
                .collect::<Result<Vec<_>>>()?
                .join(separator)),
            Expr::Pseudo(pseudo) => bindings
                .pseudo
                .get(pseudo)
                .cloned()
                .ok_or_else(|| Error::Unresolved(pseudo.name().to_string())),
        }
    }
}

fn push_merged(merged: &mut Vec<Expr>, part: Expr) {
    if let Expr::Literal(s) = &part {
        if s.is_empty() {
            return;
        }
        if let Some(Expr::Literal(prev)) = merged.last_mut() {
            prev.push_str(s);
            return;
        }
    }
    merged.push(part);
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(value.to_string())
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(value)
    }
}

impl From<Pseudo> for Expr {
    fn from(value: Pseudo) -> Self {
        Expr::Pseudo(value)
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Expr::Literal(s) => serializer.serialize_str(s),
            Expr::Ref(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", id)?;
                map.end()
            }
            Expr::GetAtt(id, attribute) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::GetAtt", &[id, attribute])?;
                map.end()
            }
            Expr::Join(separator, parts) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Fn::Join", &(separator, parts))?;
                map.end()
            }
            Expr::Pseudo(pseudo) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("Ref", pseudo.name())?;
                map.end()
            }
        }
    }
}

/// Secrets Manager dynamic reference, resolved by CloudFormation at deployment.
///
/// Only the reference is written to the template, never the secret value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub secret_name: String,
    pub json_key: String,
}

impl SecretReference {
    pub fn json_field(secret_name: impl Into<String>, json_key: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            json_key: json_key.into(),
        }
    }
}

impl fmt::Display for SecretReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{{resolve:secretsmanager:{}:SecretString:{}}}}}",
            self.secret_name, self.json_key
        )
    }
}

/// Deployed values used to evaluate expressions offline.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    pseudo: HashMap<Pseudo, String>,
    refs: HashMap<String, String>,
    attributes: HashMap<(String, String), String>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pseudo(mut self, pseudo: Pseudo, value: impl Into<String>) -> Self {
        self.pseudo.insert(pseudo, value.into());
        self
    }

    pub fn with_region(self, region: impl Into<String>) -> Self {
        self.with_pseudo(Pseudo::Region, region)
    }

    /// Bind the value `Ref` returns for a resource or parameter.
    pub fn with_ref(mut self, logical_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.refs.insert(logical_id.into(), value.into());
        self
    }

    pub fn with_attribute(
        mut self,
        logical_id: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.attributes
            .insert((logical_id.into(), attribute.into()), value.into());
        self
    }
}

/// Typed resource properties for one CloudFormation resource type.
pub trait ResourceProperties: Serialize {
    const TYPE: &'static str;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new<P: ResourceProperties>(properties: &P) -> Result<Self> {
        Ok(Self {
            resource_type: P::TYPE.to_string(),
            properties: serde_json::to_value(properties)?,
            depends_on: Vec::new(),
        })
    }

    /// Declare an explicit creation-order dependency.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        let logical_id = logical_id.into();
        if !self.depends_on.contains(&logical_id) {
            self.depends_on.push(logical_id);
        }
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub parameter_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Parameter {
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            parameter_type: "String".to_string(),
            description: Some(description.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub value: Expr,
}

/// A CloudFormation template. Maps are ordered so synthesis is deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Parameters", skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: Some(description.into()),
            parameters: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_parameter(&mut self, name: &str, parameter: Parameter) -> Result<()> {
        self.check_unused(name)?;
        self.parameters.insert(name.to_string(), parameter);
        Ok(())
    }

    pub fn add_resource(&mut self, logical_id: &str, resource: Resource) -> Result<()> {
        self.check_unused(logical_id)?;
        self.resources.insert(logical_id.to_string(), resource);
        Ok(())
    }

    pub fn add_output(&mut self, name: &str, description: &str, value: Expr) -> Result<()> {
        if self.outputs.contains_key(name) {
            return Err(Error::Config(format!("Duplicate output {}", name)));
        }
        self.outputs.insert(
            name.to_string(),
            Output {
                description: Some(description.to_string()),
                value,
            },
        );
        Ok(())
    }

    // Parameters and resources share one namespace for `Ref`.
    fn check_unused(&self, logical_id: &str) -> Result<()> {
        if self.parameters.contains_key(logical_id) || self.resources.contains_key(logical_id) {
            return Err(Error::Config(format!("Duplicate logical ID {}", logical_id)));
        }
        Ok(())
    }

    /// Evaluate a named output against deployed values.
    pub fn resolve_output(&self, name: &str, bindings: &Bindings) -> Result<String> {
        self.outputs
            .get(name)
            .ok_or_else(|| Error::Unresolved(format!("output {}", name)))?
            .value
            .resolve(bindings)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intrinsics_serialize() {
        let expr = Expr::concat([
            Expr::from("arn:"),
            Expr::Pseudo(Pseudo::Partition),
            Expr::from(":lambda:"),
            Expr::get_att("Fn", "Arn"),
            Expr::reference("Pool"),
        ]);
        assert_eq!(
            serde_json::to_value(&expr).unwrap(),
            json!({
                "Fn::Join": ["", [
                    "arn:",
                    { "Ref": "AWS::Partition" },
                    ":lambda:",
                    { "Fn::GetAtt": ["Fn", "Arn"] },
                    { "Ref": "Pool" }
                ]]
            })
        );
    }

    #[test]
    fn test_concat_merges_literals() {
        assert_eq!(
            Expr::concat(["a", "", "b", "c"]),
            Expr::Literal("abc".to_string())
        );
        assert_eq!(
            Expr::concat([Expr::from("x."), Expr::region(), Expr::from(".y"), Expr::from("z")]),
            Expr::Join(
                String::new(),
                vec![Expr::from("x."), Expr::region(), Expr::from(".yz")]
            )
        );
        assert_eq!(Expr::concat(Vec::<Expr>::new()), Expr::from(""));

        let inner = Expr::concat([Expr::from("a."), Expr::region()]);
        assert_eq!(
            Expr::concat([Expr::from("<"), inner, Expr::from(">")]),
            Expr::Join(
                String::new(),
                vec![Expr::from("<a."), Expr::region(), Expr::from(">")]
            )
        );
    }

    #[test]
    fn test_resolve() {
        let bindings = Bindings::new()
            .with_region("eu-west-1")
            .with_ref("Pool", "eu-west-1_xyz")
            .with_attribute("Pool", "Arn", "arn:aws:cognito-idp:eu-west-1:1:userpool/eu-west-1_xyz");

        let expr = Expr::Join(
            "|".to_string(),
            vec![Expr::region(), Expr::reference("Pool"), Expr::get_att("Pool", "Arn")],
        );
        assert_eq!(
            expr.resolve(&bindings).unwrap(),
            "eu-west-1|eu-west-1_xyz|arn:aws:cognito-idp:eu-west-1:1:userpool/eu-west-1_xyz"
        );
    }

    #[test]
    fn test_resolve_unbound_fails() {
        let err = Expr::reference("Missing").resolve(&Bindings::new()).unwrap_err();
        assert!(matches!(err, Error::Unresolved(ref what) if what == "Ref Missing"));

        let err = Expr::region().resolve(&Bindings::new()).unwrap_err();
        assert!(matches!(err, Error::Unresolved(ref what) if what == "AWS::Region"));
    }

    #[test]
    fn test_secret_reference() {
        let reference = SecretReference::json_field("google-oauth", "client_id");
        assert_eq!(
            reference.to_string(),
            "{{resolve:secretsmanager:google-oauth:SecretString:client_id}}"
        );
    }

    #[test]
    fn test_duplicate_logical_id_rejected() {
        let mut template = Template::new("test");
        template
            .add_parameter("Bucket", Parameter::string("bucket"))
            .unwrap();
        let resource = Resource {
            resource_type: "AWS::S3::Bucket".to_string(),
            properties: json!({}),
            depends_on: Vec::new(),
        };
        assert!(template.add_resource("Bucket", resource).is_err());
    }

    #[test]
    fn test_template_skips_empty_sections() {
        let value = serde_json::to_value(Template::new("empty")).unwrap();
        assert_eq!(
            value,
            json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Description": "empty",
                "Resources": {}
            })
        );
    }
}

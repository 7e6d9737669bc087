//! Resource - Typed resource descriptors and CloudFormation values

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Queue,
    Topic,
    Alarm,
    Role,
    InstanceProfile,
    SecurityGroup,
    LaunchConfig,
    AutoScalingGroup,
    Vpc,
    Subnet,
}

impl ResourceKind {
    /// CloudFormation resource type (e.g., "AWS::SQS::Queue")
    pub fn cfn_type(&self) -> &'static str {
        match self {
            ResourceKind::Queue => "AWS::SQS::Queue",
            ResourceKind::Topic => "AWS::SNS::Topic",
            ResourceKind::Alarm => "AWS::CloudWatch::Alarm",
            ResourceKind::Role => "AWS::IAM::Role",
            ResourceKind::InstanceProfile => "AWS::IAM::InstanceProfile",
            ResourceKind::SecurityGroup => "AWS::EC2::SecurityGroup",
            ResourceKind::LaunchConfig => "AWS::AutoScaling::LaunchConfiguration",
            ResourceKind::AutoScalingGroup => "AWS::AutoScaling::AutoScalingGroup",
            ResourceKind::Vpc => "AWS::EC2::VPC",
            ResourceKind::Subnet => "AWS::EC2::Subnet",
        }
    }

    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Queue,
            ResourceKind::Topic,
            ResourceKind::Alarm,
            ResourceKind::Role,
            ResourceKind::InstanceProfile,
            ResourceKind::SecurityGroup,
            ResourceKind::LaunchConfig,
            ResourceKind::AutoScalingGroup,
            ResourceKind::Vpc,
            ResourceKind::Subnet,
        ]
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cfn_type())
    }
}

/// Unique identifier for a resource within a template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub kind: ResourceKind,
    /// Logical ID (alphanumeric key under `Resources`)
    pub logical_id: String,
}

impl ResourceId {
    pub fn new(kind: ResourceKind, logical_id: impl Into<String>) -> Self {
        Self {
            kind,
            logical_id: logical_id.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.logical_id, self.kind)
    }
}

/// Property value of a resource
///
/// Besides plain data, a value may be one of the CloudFormation intrinsic
/// functions. Intrinsics are resolved by CloudFormation at deploy time, so
/// they serialize to their `{"Ref": ...}` / `{"Fn::...": ...}` forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// `Ref` to a resource, parameter, or pseudo parameter
    Ref(String),
    /// `Fn::GetAtt` (logical_id, attribute_name)
    GetAtt(String, String),
    /// `Fn::FindInMap` lookup
    FindInMap {
        map: String,
        top_key: Box<Value>,
        second_key: Box<Value>,
    },
    /// `Fn::Base64` encoding of the inner value
    Base64(Box<Value>),
}

/// A name another value points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// Target of `Ref` or `Fn::GetAtt`
    Entity(&'a str),
    /// Map name of `Fn::FindInMap`
    Mapping(&'a str),
}

impl Value {
    pub fn reference(name: impl Into<String>) -> Self {
        Value::Ref(name.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::GetAtt(logical_id.into(), attribute.into())
    }

    pub fn find_in_map(map: impl Into<String>, top_key: Value, second_key: Value) -> Self {
        Value::FindInMap {
            map: map.into(),
            top_key: Box::new(top_key),
            second_key: Box::new(second_key),
        }
    }

    pub fn base64(inner: impl Into<Value>) -> Self {
        Value::Base64(Box::new(inner.into()))
    }

    /// Build an ordered map value from key/value pairs
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns true for values CloudFormation resolves at deploy time
    pub fn is_intrinsic(&self) -> bool {
        matches!(
            self,
            Value::Ref(_) | Value::GetAtt(_, _) | Value::FindInMap { .. } | Value::Base64(_)
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key of a map value
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Collect every name this value (recursively) refers to
    pub fn collect_references<'a>(&'a self, out: &mut Vec<Reference<'a>>) {
        match self {
            Value::Ref(name) => out.push(Reference::Entity(name)),
            Value::GetAtt(logical_id, _) => out.push(Reference::Entity(logical_id)),
            Value::FindInMap {
                map,
                top_key,
                second_key,
            } => {
                out.push(Reference::Mapping(map));
                top_key.collect_references(out);
                second_key.collect_references(out);
            }
            Value::Base64(inner) => inner.collect_references(out),
            Value::List(items) => items.iter().for_each(|v| v.collect_references(out)),
            Value::Map(map) => map.values().for_each(|v| v.collect_references(out)),
            Value::Null | Value::String(_) | Value::Int(_) | Value::Bool(_) => {}
        }
    }

    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::Null => "Null".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::Ref(name) => format!("Ref({})", name),
            Value::GetAtt(id, attr) => format!("GetAtt({}.{})", id, attr),
            Value::FindInMap { map, .. } => format!("FindInMap({})", map),
            Value::Base64(_) => "Base64".to_string(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

/// Converts a parsed JSON document (e.g. a rendered IAM policy)
///
/// Non-integral numbers keep their textual form.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::String(n.to_string()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Ref(name) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Ref", name)?;
                m.end()
            }
            Value::GetAtt(logical_id, attribute) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Fn::GetAtt", &[logical_id, attribute])?;
                m.end()
            }
            Value::FindInMap {
                map,
                top_key,
                second_key,
            } => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Fn::FindInMap", &(map, top_key, second_key))?;
                m.end()
            }
            Value::Base64(inner) => {
                let mut m = serializer.serialize_map(Some(1))?;
                m.serialize_entry("Fn::Base64", inner)?;
                m.end()
            }
        }
    }
}

/// Resource descriptor declared into a template
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub properties: IndexMap<String, Value>,
    /// Logical IDs this resource must be created after
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(kind: ResourceKind, logical_id: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(kind, logical_id),
            properties: IndexMap::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.id.kind
    }

    pub fn logical_id(&self) -> &str {
        &self.id.logical_id
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// All names referenced from this resource's properties
    pub fn references(&self) -> Vec<Reference<'_>> {
        let mut out = Vec::new();
        for value in self.properties.values() {
            value.collect_references(&mut out);
        }
        out
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut m = serializer.serialize_map(None)?;
        m.serialize_entry("Type", self.id.kind.cfn_type())?;
        match self.depends_on.as_slice() {
            [] => {}
            [single] => m.serialize_entry("DependsOn", single)?,
            many => m.serialize_entry("DependsOn", many)?,
        }
        if !self.properties.is_empty() {
            m.serialize_entry("Properties", &self.properties)?;
        }
        m.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intrinsics_serialize_to_cfn_functions() {
        assert_eq!(
            serde_json::to_value(Value::reference("Topic")).unwrap(),
            json!({"Ref": "Topic"})
        );
        assert_eq!(
            serde_json::to_value(Value::get_att("Queue", "QueueName")).unwrap(),
            json!({"Fn::GetAtt": ["Queue", "QueueName"]})
        );
        assert_eq!(
            serde_json::to_value(Value::find_in_map(
                "RegionMap",
                Value::reference("AWS::Region"),
                "ebs".into()
            ))
            .unwrap(),
            json!({"Fn::FindInMap": ["RegionMap", {"Ref": "AWS::Region"}, "ebs"]})
        );
        assert_eq!(
            serde_json::to_value(Value::base64("#!/bin/bash")).unwrap(),
            json!({"Fn::Base64": "#!/bin/bash"})
        );
    }

    #[test]
    fn map_preserves_insertion_order() {
        let value = Value::map([("Zeta", 1i64), ("Alpha", 2i64)]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"Zeta":1,"Alpha":2}"#
        );
    }

    #[test]
    fn json_document_converts_to_value() {
        let value = Value::from(json!({
            "Version": "2012-10-17",
            "Statement": [{"Effect": "Allow", "Action": ["sqs:*"], "Weight": 1.5}]
        }));
        let statement = &value.get("Statement").unwrap().as_list().unwrap()[0];
        assert_eq!(statement.get("Effect").unwrap().as_str(), Some("Allow"));
        assert_eq!(statement.get("Weight").unwrap().as_str(), Some("1.5"));
    }

    #[test]
    fn collects_nested_references() {
        let resource = Resource::new(ResourceKind::LaunchConfig, "Lc")
            .with_property("SecurityGroups", vec![Value::reference("Sg")])
            .with_property(
                "ImageId",
                Value::find_in_map("RegionMap", Value::reference("AWS::Region"), "ebs".into()),
            )
            .with_property("Alarm", Value::get_att("Queue", "Arn"));

        let refs = resource.references();
        assert_eq!(
            refs,
            vec![
                Reference::Entity("Sg"),
                Reference::Mapping("RegionMap"),
                Reference::Entity("AWS::Region"),
                Reference::Entity("Queue"),
            ]
        );
    }

    #[test]
    fn resource_serializes_single_and_multiple_depends_on() {
        let single = Resource::new(ResourceKind::Topic, "Topic").depends_on("Queue");
        assert_eq!(
            serde_json::to_value(&single).unwrap(),
            json!({"Type": "AWS::SNS::Topic", "DependsOn": "Queue"})
        );

        let many = Resource::new(ResourceKind::LaunchConfig, "Lc")
            .depends_on("Profile")
            .depends_on("Sg")
            .with_property("KeyName", Value::reference("KeyName"));
        assert_eq!(
            serde_json::to_value(&many).unwrap(),
            json!({
                "Type": "AWS::AutoScaling::LaunchConfiguration",
                "DependsOn": ["Profile", "Sg"],
                "Properties": {"KeyName": {"Ref": "KeyName"}}
            })
        );
    }
}

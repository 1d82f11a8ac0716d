use super::error::{Error, Result};
use super::geojson::{Feature, FeatureCollection, Properties};
use serde_json::Value;

#[derive(PartialEq, Debug, Clone)]
pub enum Condition {
    Name(String),
    Sovereign(String),
    Either(String),
    /// Any other property, compared by its scalar text.
    Property(String, String),
}

impl Condition {
    pub fn new(key: Option<&str>, value: &str) -> Self {
        match key {
            None => Condition::Either(value.into()),
            Some("name") => Condition::Name(value.into()),
            Some("sovereignt") => Condition::Sovereign(value.into()),
            Some(key) => Condition::Property(key.into(), value.into()),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct Group {
    pub conditions: Vec<Condition>,
}

fn parse_condition(condition_str: &str) -> Condition {
    let condition_str = condition_str.trim();
    let split_str: Vec<&str> = condition_str.splitn(2, '~').collect();
    if split_str.len() < 2 {
        Condition::Either(condition_str.into())
    } else {
        let key = split_str[0].trim();
        let value = split_str[1].trim();
        Condition::new(Some(key), value)
    }
}

fn parse_group(group_str: &str) -> Group {
    let condition_strs: Vec<&str> = group_str.split('+').collect();
    let conditions = condition_strs.into_iter().map(parse_condition).collect();
    Group { conditions }
}

/// Parse an expression into filter groups
///
/// A bare country name (`France`) picks every feature whose display name or
/// sovereign state equals that name. The property can be pinned using a `~`
/// field separator (`name~Greenland`, `sovereignt~Denmark`). Conditions that
/// must all hold for the same feature are combined using `+`
/// (`sovereignt~Denmark+name~Greenland`). Any other key compares against
/// that property (`iso_a2~IE`, `scalerank~1`) and never falls back to the
/// names, so a misspelled key matches nothing. Groups are concatenated with `,`
/// and a feature matching any group is selected.
///
/// # Example
///
/// ```
/// use visited_countries::filter::parse;
///
/// let groups = parse("sovereignt~Denmark+name~Greenland,Ireland");
/// assert_eq!(groups.len(), 2);
/// let group = &groups[0];
/// assert_eq!(group.conditions.len(), 2);
/// ```
pub fn parse(selector_str: &str) -> Vec<Group> {
    selector_str
        .split(',')
        .filter(|group_str| !group_str.trim().is_empty())
        .map(parse_group)
        .collect()
}

fn check_property(properties: &Properties, key: &str, value: &str) -> bool {
    match properties.get(key) {
        Some(Value::String(s)) => s == value,
        Some(Value::Number(n)) => n.to_string() == value,
        Some(Value::Bool(b)) => b.to_string() == value,
        _ => false,
    }
}

fn check_condition(feature: &Feature, condition: &Condition) -> bool {
    let properties = &feature.properties;
    let name = properties.name();
    let sovereign = properties.sovereignt();
    match condition {
        Condition::Name(value) => name == Some(value.as_str()),
        Condition::Sovereign(value) => sovereign == Some(value.as_str()),
        Condition::Either(value) => {
            name == Some(value.as_str()) || sovereign == Some(value.as_str())
        }
        Condition::Property(key, value) => check_property(properties, key, value),
    }
}

fn check_group(feature: &Feature, group: &Group) -> bool {
    group.conditions.iter().all(|c| check_condition(feature, c))
}

pub trait Filter {
    fn filter(&self, groups: &[Group]) -> bool;
}

impl Filter for Feature {
    fn filter(&self, groups: &[Group]) -> bool {
        groups.iter().any(|g| check_group(self, g))
    }
}

#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    Found(Vec<&'a Feature>),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn features(self) -> Vec<&'a Feature> {
        match self {
            Lookup::Found(features) => features,
            Lookup::NotFound => vec![],
        }
    }
}

/// Features whose display name or sovereign state equals `name`.
pub fn find<'a>(collection: &'a FeatureCollection, name: &str) -> Lookup<'a> {
    let groups = [Group {
        conditions: vec![Condition::Either(name.into())],
    }];
    let features: Vec<&Feature> = collection
        .features
        .iter()
        .filter(|feature| feature.filter(&groups))
        .collect();
    if features.is_empty() {
        Lookup::NotFound
    } else {
        Lookup::Found(features)
    }
}

#[derive(Debug)]
pub struct Selection {
    pub collection: FeatureCollection,
    pub missing: Vec<String>,
}

impl Selection {
    pub fn into_strict(self) -> Result<FeatureCollection> {
        if self.missing.is_empty() {
            Ok(self.collection)
        } else {
            Err(Error::NotFound(self.missing))
        }
    }
}

/// Merge the features of all given country names into a new collection.
///
/// Features keep the order of the source collection and appear once, even
/// if several names match them.
pub fn select(collection: &FeatureCollection, names: &[String]) -> Selection {
    let mut selection = select_groups(collection, &name_groups(names));
    selection.missing = missing(collection, names);
    selection
}

/// One group per name, matching display or sovereign name.
pub fn name_groups(names: &[String]) -> Vec<Group> {
    names
        .iter()
        .map(|name| Group {
            conditions: vec![Condition::Either(name.clone())],
        })
        .collect()
}

/// Names without a single matching feature.
pub fn missing(collection: &FeatureCollection, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|name| find(collection, name) == Lookup::NotFound)
        .cloned()
        .collect()
}

pub fn select_groups(collection: &FeatureCollection, groups: &[Group]) -> Selection {
    let features = collection
        .features
        .iter()
        .filter(|feature| feature.filter(groups))
        .cloned()
        .collect();
    Selection {
        collection: FeatureCollection::new(features),
        missing: vec![],
    }
}

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

use crate::{Comment, GraphDefinition, ModelError};

/// A user's saved graphs, in insertion order, keyed by name.
///
/// Serializes as a JSON array. A name-keyed object (the older layout) is
/// accepted on load; its entries come back sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphLibrary {
    graphs: Vec<GraphDefinition>,
}

impl GraphLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&GraphDefinition> {
        self.graphs.iter().find(|g| g.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut GraphDefinition> {
        self.graphs.iter_mut().find(|g| g.name == name)
    }

    /// Save `graph`, replacing an existing graph of the same name in place.
    /// Returns the graph it replaced.
    pub fn upsert(&mut self, graph: GraphDefinition) -> Option<GraphDefinition> {
        match self.graphs.iter().position(|g| g.name == graph.name) {
            Some(at) => Some(std::mem::replace(&mut self.graphs[at], graph)),
            None => {
                self.graphs.push(graph);
                None
            }
        }
    }

    pub fn append_comment(&mut self, name: &str, comment: Comment) -> Result<(), ModelError> {
        let graph = self
            .get_mut(name)
            .ok_or_else(|| ModelError::GraphNotFound(name.to_string()))?;
        graph.push_comment(comment);
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.graphs.iter().map(|g| g.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GraphDefinition> {
        self.graphs.iter()
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<'a> IntoIterator for &'a GraphLibrary {
    type Item = &'a GraphDefinition;
    type IntoIter = std::slice::Iter<'a, GraphDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.graphs.iter()
    }
}

impl FromIterator<GraphDefinition> for GraphLibrary {
    fn from_iter<I: IntoIterator<Item = GraphDefinition>>(iter: I) -> Self {
        let mut library = GraphLibrary::new();
        for graph in iter {
            library.upsert(graph);
        }
        library
    }
}

impl Serialize for GraphLibrary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.graphs.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredLibrary {
    List(Vec<GraphDefinition>),
    ByName(BTreeMap<String, GraphDefinition>),
}

impl<'de> Deserialize<'de> for GraphLibrary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match StoredLibrary::deserialize(deserializer)? {
            StoredLibrary::List(graphs) => graphs.into_iter().collect(),
            StoredLibrary::ByName(map) => map
                .into_iter()
                .map(|(name, mut graph)| {
                    graph.name = name;
                    graph
                })
                .collect(),
        })
    }
}

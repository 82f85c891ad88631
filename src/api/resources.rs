//! Dashboard resource kinds and list parameters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collections managed from the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Companies,
    Products,
    Tools,
    Resources,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Companies,
        ResourceKind::Products,
        ResourceKind::Tools,
        ResourceKind::Resources,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Companies => "companies",
            ResourceKind::Products => "products",
            ResourceKind::Tools => "tools",
            ResourceKind::Resources => "resources",
        }
    }

    /// Collection path, e.g. `/companies`
    pub fn path(&self) -> String {
        format!("/{}", self.as_str())
    }

    /// Path of a single record, e.g. `/companies/42`
    pub fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.as_str(), id)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "companies" | "company" => Ok(ResourceKind::Companies),
            "products" | "product" => Ok(ResourceKind::Products),
            "tools" | "tool" => Ok(ResourceKind::Tools),
            "resources" | "resource" => Ok(ResourceKind::Resources),
            other => {
                let expected: Vec<&str> =
                    ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
                Err(format!(
                    "unknown resource '{}', expected one of: {}",
                    other,
                    expected.join(", ")
                ))
            }
        }
    }
}

/// Pagination and search for list calls. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub search: Option<String>,
}

impl ListParams {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size".to_string(), size.to_string()));
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            query.push(("search".to_string(), search.clone()));
        }
        query
    }
}

/// Rows of a list response: a bare array, or an object wrapping the rows in
/// `content`, `data` or `items`.
pub fn records(value: &serde_json::Value) -> Vec<&serde_json::Value> {
    if let Some(rows) = value.as_array() {
        return rows.iter().collect();
    }
    ["content", "data", "items"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_array()))
        .map(|rows| rows.iter().collect())
        .unwrap_or_default()
}

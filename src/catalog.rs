use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One buildable tool type and what it yields once placed on a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub id: String,
    pub label: String,
    pub cost: i64,
    #[serde(default)]
    pub income_yield: i64,
    #[serde(default)]
    pub population_yield: u64,
}

impl ToolDefinition {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        cost: i64,
        income_yield: i64,
        population_yield: u64,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            cost,
            income_yield,
            population_yield,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("catalog must define at least one tool")]
    EmptyCatalog,
    #[error("tool id '{0}' defined more than once")]
    DuplicateTool(String),
    #[error("tool ids must not be blank")]
    BlankToolId,
    #[error("tool '{id}' has negative cost {cost}")]
    NegativeCost { id: String, cost: i64 },
}

/// Fixed table of tool types, kept in declaration order for the palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    tools: Vec<ToolDefinition>,
}

impl Catalog {
    pub fn new(tools: Vec<ToolDefinition>) -> Result<Self, CatalogError> {
        if tools.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        let mut known: Vec<&str> = Vec::with_capacity(tools.len());
        for tool in &tools {
            if tool.id.trim().is_empty() {
                return Err(CatalogError::BlankToolId);
            }
            if known.contains(&tool.id.as_str()) {
                return Err(CatalogError::DuplicateTool(tool.id.clone()));
            }
            if tool.cost < 0 {
                return Err(CatalogError::NegativeCost {
                    id: tool.id.clone(),
                    cost: tool.cost,
                });
            }
            known.push(tool.id.as_str());
        }

        Ok(Self { tools })
    }

    /// Road, house, park and market.
    pub fn standard() -> Self {
        Self {
            tools: vec![
                ToolDefinition::new("road", "Road", 10, 0, 0),
                ToolDefinition::new("house", "House", 50, 5, 4),
                ToolDefinition::new("park", "Park", 30, 1, 1),
                ToolDefinition::new("market", "Market", 70, 12, 2),
            ],
        }
    }

    pub fn lookup(&self, id: &str) -> Result<&ToolDefinition, CatalogError> {
        self.tools
            .iter()
            .find(|tool| tool.id == id)
            .ok_or_else(|| CatalogError::UnknownTool(id.to_string()))
    }

    pub fn list_all(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

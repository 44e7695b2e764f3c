//! Presentation-side wrapper around [`CityState`].
//!
//! A session turns user intents into city operations, remembers a status
//! line describing the last outcome and renders a [`View`] for the client.

use serde::Serialize;
use tracing::info;

use crate::{
    catalog::ToolDefinition,
    city::{BuildOutcome, CityError, CityState},
};

pub const IDLE_STATUS: &str = "Select a tool to begin building.";
pub const CLEARED_STATUS: &str = "City cleared. Select a tool to rebuild.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaletteEntry {
    pub id: String,
    pub label: String,
    pub cost: i64,
    pub income_yield: i64,
    pub population_yield: u64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileView {
    pub index: usize,
    pub built: Option<String>,
    pub aria_label: String,
    /// Tool shown while hovering, if this tile can take the armed tool.
    pub preview: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub status: String,
    pub wallet: i64,
    pub population: u64,
    pub income: i64,
    pub money_label: String,
    pub population_label: String,
    pub income_label: String,
    pub selected_tool: Option<String>,
    pub columns: usize,
    pub palette: Vec<PaletteEntry>,
    pub tiles: Vec<TileView>,
}

#[derive(Debug, Clone)]
pub struct Session {
    city: CityState,
    status: String,
}

impl Session {
    pub fn new(city: CityState) -> Self {
        Self {
            city,
            status: IDLE_STATUS.to_string(),
        }
    }

    pub fn city(&self) -> &CityState {
        &self.city
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Arms `tool`, or disarms when `None`.
    pub fn select_tool(&mut self, tool: Option<&str>) -> Result<(), CityError> {
        let Some(id) = tool else {
            self.city.deselect_tool();
            self.status = IDLE_STATUS.to_string();
            return Ok(());
        };
        match self.city.select_tool(id) {
            Ok(tool) => {
                self.status = format!(
                    "{} selected (${}). Click a tile to build.",
                    tool.label, tool.cost
                );
                Ok(())
            }
            Err(err) => {
                self.status = describe_error(&err);
                Err(err)
            }
        }
    }

    pub fn build_at(&mut self, index: usize) -> Result<BuildOutcome, CityError> {
        match self.city.build_at(index) {
            Ok(outcome) => {
                let label = self
                    .city
                    .catalog()
                    .lookup(outcome.tile.built.as_deref().unwrap_or_default())
                    .map(|tool| tool.label.as_str())
                    .unwrap_or("building");
                self.status = format!("Built a {label} on tile {}.", index + 1);
                Ok(outcome)
            }
            Err(err) => {
                self.status = describe_error(&err);
                Err(err)
            }
        }
    }

    pub fn clear_grid(&mut self) {
        self.city.clear_grid();
        self.status = CLEARED_STATUS.to_string();
    }

    pub fn end_turn(&mut self) -> i64 {
        let earned = self.city.end_turn();
        self.status = format!("Turn ended. You earned ${earned}.");
        info!(earned, wallet = self.city.wallet(), "turn ended");
        earned
    }

    /// Tool to preview while hovering `index`: only empty tiles with a tool
    /// armed get one.
    pub fn preview(&self, index: usize) -> Option<&str> {
        let tool = self.city.selected_tool()?;
        let tile = self.city.tile(index)?;
        tile.is_empty().then_some(tool.id.as_str())
    }

    pub fn palette(&self) -> Vec<PaletteEntry> {
        let active = self.city.selected_tool().map(|tool| tool.id.as_str());
        self.city
            .catalog()
            .list_all()
            .iter()
            .map(|tool| palette_entry(tool, active == Some(tool.id.as_str())))
            .collect()
    }

    pub fn view(&self) -> View {
        let snapshot = self.city.snapshot();
        let catalog = self.city.catalog();
        let tiles = snapshot
            .tiles
            .iter()
            .map(|tile| {
                let aria_label = match tile
                    .built
                    .as_deref()
                    .and_then(|id| catalog.lookup(id).ok())
                {
                    Some(tool) => format!("{} tile {}", tool.label, tile.index + 1),
                    None => format!("Empty city tile {}", tile.index + 1),
                };
                TileView {
                    index: tile.index,
                    built: tile.built.clone(),
                    aria_label,
                    preview: self.preview(tile.index).map(str::to_string),
                }
            })
            .collect();

        View {
            status: self.status.clone(),
            wallet: snapshot.wallet,
            population: snapshot.population,
            income: snapshot.income,
            money_label: format!("${}", snapshot.wallet),
            population_label: snapshot.population.to_string(),
            income_label: format!("${} / turn", snapshot.income),
            selected_tool: snapshot.selected_tool.map(str::to_string),
            columns: self.city.columns(),
            palette: self.palette(),
            tiles,
        }
    }
}

fn palette_entry(tool: &ToolDefinition, active: bool) -> PaletteEntry {
    PaletteEntry {
        id: tool.id.clone(),
        label: tool.label.clone(),
        cost: tool.cost,
        income_yield: tool.income_yield,
        population_yield: tool.population_yield,
        active,
    }
}

/// Human readable status line for a failed operation.
pub fn describe_error(err: &CityError) -> String {
    match err {
        CityError::UnknownTool(id) => format!("Unknown tool \"{id}\"."),
        CityError::InvalidSize(size) => format!("A city needs at least one tile, not {size}."),
        CityError::NoToolSelected => "Pick a tool before building.".to_string(),
        CityError::IndexOutOfRange { index, .. } => {
            format!("There is no tile {} on this map.", index.saturating_add(1))
        }
        CityError::TileOccupied(_) => "That tile is already occupied.".to_string(),
        CityError::InsufficientFunds { .. } => "Not enough money to build there.".to_string(),
    }
}

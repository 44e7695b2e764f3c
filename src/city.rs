use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::catalog::{Catalog, ToolDefinition};

pub const DEFAULT_GRID_SIZE: usize = 100;
pub const DEFAULT_STARTING_WALLET: i64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CityError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("grid size must be positive, got {0}")]
    InvalidSize(usize),
    #[error("no tool selected")]
    NoToolSelected,
    #[error("tile {index} is outside a grid of {size} tiles")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("tile {0} is already occupied")]
    TileOccupied(usize),
    #[error("building costs {cost} but the wallet holds {wallet}")]
    InsufficientFunds { cost: i64, wallet: i64 },
}

/// A single grid cell. `population` and `income` are cached from the tool
/// that was built here and are zero while the tile is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    pub index: usize,
    pub built: Option<String>,
    pub population: u64,
    pub income: i64,
}

impl Tile {
    fn empty(index: usize) -> Self {
        Self {
            index,
            built: None,
            population: 0,
            income: 0,
        }
    }

    fn apply(&mut self, tool: &ToolDefinition) {
        self.built = Some(tool.id.clone());
        self.population = tool.population_yield;
        self.income = tool.income_yield;
    }

    fn reset(&mut self) {
        *self = Self::empty(self.index);
    }

    pub fn is_empty(&self) -> bool {
        self.built.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub wallet: i64,
    pub population: u64,
    pub income: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub tile: Tile,
    pub totals: Totals,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CitySnapshot<'a> {
    pub wallet: i64,
    pub population: u64,
    pub income: i64,
    pub selected_tool: Option<&'a str>,
    pub tiles: &'a [Tile],
}

/// Owner of the grid, the wallet and the derived totals.
#[derive(Debug, Clone)]
pub struct CityState {
    catalog: Catalog,
    wallet: i64,
    selected_tool: Option<String>,
    tiles: Vec<Tile>,
    population: u64,
    income: i64,
}

impl CityState {
    pub fn initialize(
        catalog: Catalog,
        grid_size: usize,
        starting_wallet: i64,
    ) -> Result<Self, CityError> {
        if grid_size == 0 {
            return Err(CityError::InvalidSize(grid_size));
        }
        let tiles = (0..grid_size).map(Tile::empty).collect();
        debug!(grid_size, starting_wallet, "city initialized");
        Ok(Self {
            catalog,
            wallet: starting_wallet,
            selected_tool: None,
            tiles,
            population: 0,
            income: 0,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn select_tool(&mut self, id: &str) -> Result<&ToolDefinition, CityError> {
        let tool = lookup(&self.catalog, id)?;
        self.selected_tool = Some(tool.id.clone());
        debug!(tool = %tool.id, "tool selected");
        Ok(tool)
    }

    pub fn deselect_tool(&mut self) {
        self.selected_tool = None;
    }

    pub fn selected_tool(&self) -> Option<&ToolDefinition> {
        self.selected_tool
            .as_deref()
            .and_then(|id| self.catalog.lookup(id).ok())
    }

    /// Builds the armed tool on `index`. Checks run in a fixed order and the
    /// first failing one is reported; nothing changes on failure.
    pub fn build_at(&mut self, index: usize) -> Result<BuildOutcome, CityError> {
        let tool = match self.selected_tool.as_deref() {
            Some(id) => lookup(&self.catalog, id)?,
            None => return Err(CityError::NoToolSelected),
        };
        let size = self.tiles.len();
        let tile = self
            .tiles
            .get_mut(index)
            .ok_or(CityError::IndexOutOfRange { index, size })?;
        if !tile.is_empty() {
            return Err(CityError::TileOccupied(index));
        }
        if self.wallet < tool.cost {
            return Err(CityError::InsufficientFunds {
                cost: tool.cost,
                wallet: self.wallet,
            });
        }

        self.wallet -= tool.cost;
        tile.apply(tool);
        debug!(index, tool = %tool.id, wallet = self.wallet, "tile built");
        let tile = tile.clone();
        self.rebuild_totals();

        Ok(BuildOutcome {
            tile,
            totals: self.totals(),
        })
    }

    pub fn clear_grid(&mut self) {
        for tile in &mut self.tiles {
            tile.reset();
        }
        self.rebuild_totals();
        debug!("grid cleared");
    }

    /// Credits the current income and returns the amount earned. The wallet
    /// saturates at the `i64` bounds.
    pub fn end_turn(&mut self) -> i64 {
        let earned = self.income;
        self.wallet = self.wallet.saturating_add(earned);
        debug!(earned, wallet = self.wallet, "turn ended");
        earned
    }

    pub fn snapshot(&self) -> CitySnapshot<'_> {
        CitySnapshot {
            wallet: self.wallet,
            population: self.population,
            income: self.income,
            selected_tool: self.selected_tool.as_deref(),
            tiles: &self.tiles,
        }
    }

    pub fn totals(&self) -> Totals {
        Totals {
            wallet: self.wallet,
            population: self.population,
            income: self.income,
        }
    }

    pub fn wallet(&self) -> i64 {
        self.wallet
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn income(&self) -> i64 {
        self.income
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn grid_size(&self) -> usize {
        self.tiles.len()
    }

    /// Columns of the square layout used for rendering.
    pub fn columns(&self) -> usize {
        let size = self.tiles.len();
        let mut columns = (size as f64).sqrt() as usize;
        while columns * columns < size {
            columns += 1;
        }
        columns.max(1)
    }

    // Full re-sum keeps the totals tied to the tiles.
    fn rebuild_totals(&mut self) {
        self.population = self
            .tiles
            .iter()
            .fold(0_u64, |total, tile| total.saturating_add(tile.population));
        self.income = self
            .tiles
            .iter()
            .fold(0_i64, |total, tile| total.saturating_add(tile.income));
    }
}

fn lookup<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a ToolDefinition, CityError> {
    catalog
        .lookup(id)
        .map_err(|_| CityError::UnknownTool(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(wallet: i64) -> CityState {
        CityState::initialize(Catalog::standard(), DEFAULT_GRID_SIZE, wallet).unwrap()
    }

    #[test]
    fn initialize_creates_empty_grid() {
        let city = city(500);
        assert_eq!(city.grid_size(), 100);
        assert_eq!(city.wallet(), 500);
        assert!(city.tiles().iter().all(Tile::is_empty));
        assert_eq!(city.population(), 0);
        assert_eq!(city.income(), 0);
        assert!(city.selected_tool().is_none());
    }

    #[test]
    fn initialize_rejects_zero_size() {
        let err = CityState::initialize(Catalog::standard(), 0, 500).unwrap_err();
        assert_eq!(err, CityError::InvalidSize(0));
    }

    #[test]
    fn build_house_updates_wallet_and_totals() {
        let mut city = city(500);
        city.select_tool("house").unwrap();
        let outcome = city.build_at(0).unwrap();
        assert_eq!(outcome.tile.built.as_deref(), Some("house"));
        assert_eq!(
            outcome.totals,
            Totals {
                wallet: 450,
                population: 4,
                income: 5
            }
        );

        let before = city.totals();
        assert_eq!(city.build_at(0), Err(CityError::TileOccupied(0)));
        assert_eq!(city.totals(), before);
    }

    #[test]
    fn precondition_order_reports_first_failure() {
        let mut city = city(0);
        assert_eq!(city.build_at(500), Err(CityError::NoToolSelected));
        city.select_tool("market").unwrap();
        assert_eq!(
            city.build_at(500),
            Err(CityError::IndexOutOfRange {
                index: 500,
                size: 100
            })
        );
        assert_eq!(
            city.build_at(3),
            Err(CityError::InsufficientFunds { cost: 70, wallet: 0 })
        );
    }

    #[test]
    fn select_unknown_tool_keeps_previous_selection() {
        let mut city = city(500);
        city.select_tool("park").unwrap();
        assert_eq!(
            city.select_tool("castle").unwrap_err(),
            CityError::UnknownTool("castle".into())
        );
        assert_eq!(city.selected_tool().map(|t| t.id.as_str()), Some("park"));
        city.deselect_tool();
        assert!(city.selected_tool().is_none());
    }

    #[test]
    fn end_turn_credits_income_only() {
        let mut city = city(500);
        city.select_tool("house").unwrap();
        city.build_at(0).unwrap();
        assert_eq!(city.end_turn(), 5);
        assert_eq!(city.wallet(), 455);
        assert_eq!(city.population(), 4);
        assert_eq!(city.income(), 5);
    }

    #[test]
    fn clear_grid_keeps_wallet_and_selection() {
        let mut city = city(500);
        city.select_tool("market").unwrap();
        city.build_at(7).unwrap();
        city.clear_grid();
        assert_eq!(city.wallet(), 430);
        assert_eq!(city.tile(7), Some(&Tile::empty(7)));
        assert_eq!(city.population(), 0);
        assert_eq!(city.income(), 0);
        assert_eq!(city.selected_tool().map(|t| t.id.as_str()), Some("market"));
    }

    #[test]
    fn columns_cover_the_grid() {
        assert_eq!(city(0).columns(), 10);
        let odd = CityState::initialize(Catalog::standard(), 10, 0).unwrap();
        assert_eq!(odd.columns(), 4);
        let single = CityState::initialize(Catalog::standard(), 1, 0).unwrap();
        assert_eq!(single.columns(), 1);
    }
}

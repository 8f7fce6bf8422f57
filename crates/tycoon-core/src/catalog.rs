//! Structure catalog: the read-only registry of everything a player can
//! place, grouped into categories.
//!
//! The catalog is built once at startup and shared as an `Arc<Catalog>`;
//! every query is a pure read.

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::ordered_map::OrderedMap;

// ── Embedded catalog (same JSON the game server ships) ──────────────────
const CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

/// In-game currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    Koins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: u64,
    pub currency: Currency,
}

impl Price {
    pub fn koins(amount: u64) -> Self {
        Self {
            amount,
            currency: Currency::Koins,
        }
    }
}

/// Renderable/physical template a structure spawns from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureTemplate {
    /// Model name in the host's asset store
    pub model: String,
    /// Extents of the anchor box
    pub size: Vec3,
    /// Anchor box centre relative to the placement transform. A template
    /// without one cannot be placed.
    #[serde(default)]
    pub anchor: Option<Vec3>,
}

/// Catalog entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: String,
    pub name: String,
    pub description: String,
    pub template: StructureTemplate,
    pub price: Price,
}

/// Serialized shape of a category in the catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDef {
    pub id: String,
    pub icon: String,
    pub name: String,
    pub description: String,
    pub structures: Vec<Structure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogDef {
    categories: Vec<CategoryDef>,
}

/// Named grouping of structures, in catalog order.
#[derive(Debug, Clone)]
pub struct StructureCategory {
    id: String,
    icon: String,
    name: String,
    description: String,
    structures: OrderedMap<String, Arc<Structure>>,
}

impl StructureCategory {
    pub fn new(def: CategoryDef) -> Result<Self, CatalogError> {
        let mut structures = OrderedMap::with_capacity(def.structures.len());
        for structure in def.structures {
            let id = structure.id.clone();
            if structures.insert(id.clone(), Arc::new(structure)).is_err() {
                return Err(CatalogError::DuplicateStructure {
                    category: def.id,
                    structure: id,
                });
            }
        }
        Ok(Self {
            id: def.id,
            icon: def.icon,
            name: def.name,
            description: def.description,
            structures,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn structures(&self) -> impl Iterator<Item = &Arc<Structure>> {
        self.structures.values()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    pub fn get_structure_by_id(&self, id: &str) -> Option<&Arc<Structure>> {
        self.structures.get(id)
    }

    /// Exact, case-sensitive name match. First hit in catalog order.
    pub fn get_structure_by_name(&self, name: &str) -> Option<&Arc<Structure>> {
        self.structures().find(|s| s.name == name)
    }

    /// Every structure costing at most `ceiling`, in catalog order.
    pub fn get_structures_within_price(&self, ceiling: u64) -> Vec<Arc<Structure>> {
        self.structures()
            .filter(|s| s.price.amount <= ceiling)
            .cloned()
            .collect()
    }

    /// Case-insensitive substring search over name and description.
    /// An empty query matches everything.
    pub fn get_search_results(&self, query: &str) -> Vec<Arc<Structure>> {
        let needle = query.trim().to_lowercase();
        self.structures()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }
}

/// All categories, keyed by id in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    categories: OrderedMap<String, StructureCategory>,
}

impl Catalog {
    /// Build from category definitions. Structure ids must be unique across
    /// the whole catalog, category ids likewise.
    pub fn from_definitions(defs: Vec<CategoryDef>) -> Result<Self, CatalogError> {
        let mut categories: OrderedMap<String, StructureCategory> = OrderedMap::new();
        for def in defs {
            let category = StructureCategory::new(def)?;
            for structure in category.structures() {
                if let Some(owner) = categories
                    .values()
                    .find(|c| c.get_structure_by_id(&structure.id).is_some())
                {
                    return Err(CatalogError::DuplicateStructure {
                        category: owner.id.clone(),
                        structure: structure.id.clone(),
                    });
                }
            }
            let id = category.id.clone();
            if categories.insert(id.clone(), category).is_err() {
                return Err(CatalogError::DuplicateCategory(id));
            }
        }
        log::debug!(
            "Catalog built: {} categories, {} structures",
            categories.len(),
            categories.values().map(StructureCategory::len).sum::<usize>()
        );
        Ok(Self { categories })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let def: CatalogDef = serde_json::from_str(json)?;
        Self::from_definitions(def.categories)
    }

    /// The catalog shipped with the game
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(CATALOG_JSON)
    }

    pub fn categories(&self) -> impl Iterator<Item = &StructureCategory> {
        self.categories.values()
    }

    pub fn get_category(&self, id: &str) -> Option<&StructureCategory> {
        self.categories.get(id)
    }

    /// Resolve a structure id in any category
    pub fn find_structure(&self, id: &str) -> Option<&Arc<Structure>> {
        self.categories().find_map(|c| c.get_structure_by_id(id))
    }

    pub fn structure_count(&self) -> usize {
        self.categories().map(StructureCategory::len).sum()
    }

    /// Search every category, results in catalog order
    pub fn search(&self, query: &str) -> Vec<Arc<Structure>> {
        self.categories()
            .flat_map(|c| c.get_search_results(query))
            .collect()
    }
}

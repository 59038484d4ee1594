//! The inventory catalogue of installable components.
//!
//! The catalogue is supplied by the caller (read from `catalog.csv` in a quote directory) and is
//! read-only as far as the pricing engine is concerned. A configuration mid-edit may reference no
//! item at all, or an item that has been removed from the inventory; both resolve to a
//! zero-contribution [`ResolvedItem`] rather than an error so that the rest of the computation
//! can still produce a result.
use crate::id::{define_id_getter, define_id_type};
use crate::input::read_csv_id_file;
use crate::units::{Energy, Money, Power};
use anyhow::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const CATALOG_FILE_NAME: &str = "catalog.csv";

define_id_type!(ItemID);

/// The category of an inventory item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum ItemCategory {
    /// A PV panel
    #[string = "panel"]
    Panel,
    /// An inverter
    #[string = "inverter"]
    Inverter,
    /// An energy storage unit
    #[string = "storage"]
    Storage,
    /// A mounting accessory, billed per panel
    #[string = "mounting"]
    Mounting,
}

/// A single inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// A unique identifier for the item
    pub id: ItemID,
    /// The model name shown on offers
    pub name: String,
    /// The category of the item
    pub category: ItemCategory,
    /// Price for a single unit
    pub unit_price: Money,
    /// Rated power in kW (panels and inverters)
    pub power: Option<Power>,
    /// Usable capacity in kWh (storage units)
    pub capacity: Option<Energy>,
    /// Supported phase count for inverters (1 or 3); empty means phase-agnostic
    pub phases: Option<u8>,
}
define_id_getter!(CatalogItem, ItemID);

/// A map of [`CatalogItem`]s, keyed by item ID.
///
/// Iteration order follows the inventory file, which the auto-selection heuristic relies on.
pub type Catalog = IndexMap<ItemID, CatalogItem>;

/// Read the catalogue from the `catalog.csv` file in the given quote directory.
pub fn read_catalog(quote_dir: &Path) -> Result<Catalog> {
    read_csv_id_file(&quote_dir.join(CATALOG_FILE_NAME))
}

/// Iterate over the catalogue items of a given category, in file order.
pub fn items_in_category(
    catalog: &Catalog,
    category: ItemCategory,
) -> impl Iterator<Item = &CatalogItem> {
    catalog.values().filter(move |item| item.category == category)
}

/// A component reference resolved against the catalogue, with guaranteed numeric fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedItem {
    /// The model name (empty if no item is referenced)
    pub name: String,
    /// Price for a single unit
    pub unit_price: Money,
    /// Rated power in kW
    pub power: Power,
    /// Usable capacity in kWh
    pub capacity: Energy,
}

impl ResolvedItem {
    /// The neutral value for an absent or unknown component.
    fn absent() -> Self {
        Self {
            name: String::new(),
            unit_price: Money(0.0),
            power: Power(0.0),
            capacity: Energy(0.0),
        }
    }
}

/// Resolve an optional component reference to its attributes.
///
/// An unset reference or an ID not present in the catalogue yields the neutral zero value.
pub fn resolve(catalog: &Catalog, id: Option<&ItemID>) -> ResolvedItem {
    let Some(item) = id.and_then(|id| catalog.get(id)) else {
        return ResolvedItem::absent();
    };

    ResolvedItem {
        name: item.name.clone(),
        unit_price: item.unit_price,
        power: item.power.unwrap_or(Power(0.0)),
        capacity: item.capacity.unwrap_or(Energy(0.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::catalog;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[rstest]
    fn test_resolve_present(catalog: Catalog) {
        let resolved = resolve(&catalog, Some(&"panel450".into()));
        assert_eq!(resolved.name, "Astro 450W");
        assert_eq!(resolved.unit_price, Money(450.0));
        assert_eq!(resolved.power, Power(0.45));
        assert_eq!(resolved.capacity, Energy(0.0));
    }

    #[rstest]
    fn test_resolve_missing(catalog: Catalog) {
        for id in [None, Some(&"no-such-item".into())] {
            let resolved = resolve(&catalog, id);
            assert_eq!(resolved.name, "");
            assert_eq!(resolved.unit_price, Money(0.0));
            assert_eq!(resolved.power, Power(0.0));
            assert_eq!(resolved.capacity, Energy(0.0));
        }
    }

    #[rstest]
    fn test_items_in_category(catalog: Catalog) {
        let panels: Vec<_> = items_in_category(&catalog, ItemCategory::Panel).collect();
        assert!(panels.iter().all(|item| item.category == ItemCategory::Panel));
        assert!(!panels.is_empty());
    }

    #[test]
    fn test_read_catalog() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(CATALOG_FILE_NAME)).unwrap();
            writeln!(file, "id,name,category,unit_price,power,capacity,phases").unwrap();
            writeln!(file, "p1,Panel One,panel,450,0.45,,").unwrap();
            writeln!(file, "s1,Box 5,storage,9000,,5.0,").unwrap();
        }

        let catalog = read_catalog(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("p1").unwrap().power, Some(Power(0.45)));
        assert_eq!(catalog.get("p1").unwrap().capacity, None);
        assert_eq!(catalog.get("s1").unwrap().capacity, Some(Energy(5.0)));
    }
}

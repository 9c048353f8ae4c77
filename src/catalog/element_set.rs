use std::fmt;

use sgp4::{Constants, Elements};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ElementSetError {
    #[error(transparent)]
    Elements(#[from] sgp4::ElementsError),
    #[error("catalog number {0} out of range")]
    CatalogId(u64),
}

/// One object's orbital elements at its epoch, with the SGP4 constants
/// derived from them.
pub struct ElementSet {
    pub catalog_id: u32,
    pub international_id: String,
    pub name: String,
    pub elements: Elements,
    pub constants: Constants,
}

impl ElementSet {
    pub fn from_elements(elements: Elements) -> Result<Self, ElementSetError> {
        let catalog_id = u32::try_from(elements.norad_id)
            .map_err(|_| ElementSetError::CatalogId(elements.norad_id))?;
        let constants = Constants::from_elements(&elements)?;
        let name = elements
            .object_name
            .clone()
            .unwrap_or_else(|| format!("NORAD {}", catalog_id));

        Ok(Self {
            catalog_id,
            international_id: elements.international_designator.clone().unwrap_or_default(),
            name,
            elements,
            constants,
        })
    }
}

impl fmt::Debug for ElementSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementSet")
            .field("catalog_id", &self.catalog_id)
            .field("international_id", &self.international_id)
            .field("name", &self.name)
            .field("epoch", &self.elements.datetime)
            .finish()
    }
}

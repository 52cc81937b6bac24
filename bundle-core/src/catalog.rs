//! Endpoint catalog.
//!
//! The catalog is the static registry of upstream datasets. It hands out
//! descriptors in ascending `(priority_group, name)` order. Ties on the
//! group are broken by name so the processing order is identical on every
//! run.
//!
//! ## Ordering convention
//!
//! Endpoints that reference other endpoints must sit in a higher priority
//! group than the endpoints they reference (e.g. `wirkstoff_gehalt` in
//! group 4 references `wirkstoff` in group 2). This is not checked at
//! runtime; keep it in mind when adding endpoints.

use std::collections::HashSet;

use bundle_types::EndpointDescriptor;

use crate::error::CatalogError;

/// Ordered, immutable set of endpoint descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    endpoints: Vec<EndpointDescriptor>,
}

/// The BVL plant protection product API: name, group, category, description.
const BVL_ENDPOINTS: &[(&str, u32, &str, &str)] = &[
    // Group 1: lookup tables (no dependencies)
    ("kode", 1, "lookup", "Kodelisten-Dekodierung"),
    ("kodeliste", 1, "lookup", "Kodelisten-Beschreibung"),
    ("kultur_gruppe", 1, "lookup", "Kultur-Namen"),
    ("schadorg_gruppe", 1, "lookup", "Schadorganismen-Namen"),
    ("ghs_gefahrenhinweise", 1, "lookup", "H-Sätze (Hazard Statements)"),
    ("ghs_sicherheitshinweise", 1, "lookup", "P-Sätze (Precautionary Statements)"),
    ("ghs_gefahrensymbole", 1, "lookup", "GHS-Piktogramme"),
    ("hinweis", 1, "lookup", "Zusätzliche Hinweise"),
    ("stand", 1, "lookup", "Datenstand der BVL-Datenbank"),
    // Group 2: master data
    ("wirkstoff", 2, "stamm", "Wirkstoffe"),
    ("adresse", 2, "stamm", "Firmen-Adressen"),
    ("auflagen", 2, "stamm", "Gesetzliche Auflagen"),
    // Group 3: products
    ("mittel", 3, "mittel", "Zugelassene Pflanzenschutzmittel"),
    ("mittel_abgelaufen", 3, "mittel", "Abgelaufene Mittel mit Aufbrauchfrist"),
    ("staerkung", 3, "mittel", "Pflanzenstärkungsmittel"),
    ("zusatzstoff", 3, "mittel", "Zusatzstoffe"),
    // Group 4: product relations
    ("wirkstoff_gehalt", 4, "mittel_rel", "Wirkstoffgehalt pro Mittel"),
    ("mittel_vertrieb", 4, "mittel_rel", "Vertriebsfirmen pro Mittel"),
    ("mittel_gefahren_symbol", 4, "mittel_rel", "GHS-Symbole pro Mittel"),
    // Group 5: application areas
    ("awg", 5, "awg", "Anwendungsgebiete"),
    ("awg_zulassung", 5, "awg", "Zulassungszeiträume pro AWG"),
    // Group 6: application area relations
    ("awg_kultur", 6, "awg_rel", "Kulturen pro Anwendungsgebiet"),
    ("awg_schadorg", 6, "awg_rel", "Schadorganismen pro Anwendungsgebiet"),
    ("awg_aufwand", 6, "awg_rel", "Aufwandmengen pro Anwendungsgebiet"),
    ("awg_wartezeit", 6, "awg_rel", "Wartezeiten pro Anwendungsgebiet"),
];

impl Catalog {
    /// Build a catalog from descriptors in any order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateEndpoint`] if two descriptors share a name.
    pub fn new(endpoints: Vec<EndpointDescriptor>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(endpoints.len());
        for endpoint in &endpoints {
            if !seen.insert(endpoint.name.as_str()) {
                return Err(CatalogError::DuplicateEndpoint {
                    name: endpoint.name.clone(),
                });
            }
        }
        Ok(Self::sorted(endpoints))
    }

    /// The 25 endpoints of the BVL API.
    pub fn bvl() -> Self {
        let endpoints = BVL_ENDPOINTS
            .iter()
            .map(|&(name, group, category, description)| {
                EndpointDescriptor::new(name, format!("/{name}/"), group, description)
                    .with_category(category)
            })
            .collect();
        Self::sorted(endpoints)
    }

    fn sorted(mut endpoints: Vec<EndpointDescriptor>) -> Self {
        endpoints.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        Self { endpoints }
    }

    /// All descriptors in processing order.
    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Find a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Endpoint names in processing order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|e| e.name.as_str())
    }
}

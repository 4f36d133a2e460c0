//! Region → category → subcategory hierarchy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use incentive_core::{DomainError, DomainResult, RegionId};

/// A deal category inside a region, with its subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub subcategories: Vec<String>,
}

impl Category {
    pub fn new<I, S>(name: impl Into<String>, subcategories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            subcategories: subcategories.into_iter().map(Into::into).collect(),
        }
    }
}

/// A sales region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Region {
    /// Build a region, rejecting blank names and duplicate category or
    /// subcategory names (compared case-insensitively).
    pub fn new(
        id: RegionId,
        name: impl Into<String>,
        categories: Vec<Category>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("region name must not be empty"));
        }

        let mut seen = Vec::new();
        for category in &categories {
            let key = category.name.trim().to_lowercase();
            if key.is_empty() {
                return Err(DomainError::validation("category name must not be empty"));
            }
            if seen.contains(&key) {
                return Err(DomainError::validation(format!(
                    "duplicate category '{}' in region '{}'",
                    category.name, name
                )));
            }
            seen.push(key);

            let mut subs = Vec::new();
            for sub in &category.subcategories {
                let key = sub.trim().to_lowercase();
                if key.is_empty() || subs.contains(&key) {
                    return Err(DomainError::validation(format!(
                        "invalid or duplicate subcategory '{}' in category '{}'",
                        sub, category.name
                    )));
                }
                subs.push(key);
            }
        }

        Ok(Self {
            id,
            name,
            categories,
        })
    }

    fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| eq_ignore_case(&c.name, name))
    }
}

/// Where a deal belongs, with canonical names from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub region_id: RegionId,
    pub region: String,
    pub category: String,
    pub subcategory: String,
}

/// All known regions.
#[derive(Debug, Clone, Default)]
pub struct RegionDirectory {
    regions: BTreeMap<RegionId, Region>,
}

impl RegionDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a region. Returns the previous version, if any.
    pub fn upsert_region(&mut self, region: Region) -> Option<Region> {
        self.regions.insert(region.id, region)
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn list(&self) -> Vec<&Region> {
        self.regions.values().collect()
    }

    /// Resolve a (region, category, subcategory) triple.
    ///
    /// Names match case-insensitively; the returned placement carries the
    /// names as stored.
    pub fn resolve(
        &self,
        region_id: &RegionId,
        category: &str,
        subcategory: &str,
    ) -> DomainResult<Placement> {
        let region = self
            .regions
            .get(region_id)
            .ok_or_else(|| DomainError::validation(format!("unknown region {region_id}")))?;

        let cat = region.category(category).ok_or_else(|| {
            DomainError::validation(format!(
                "category '{category}' does not exist in region '{}'",
                region.name
            ))
        })?;

        let sub = cat
            .subcategories
            .iter()
            .find(|s| eq_ignore_case(s, subcategory))
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "subcategory '{subcategory}' does not exist in category '{}'",
                    cat.name
                ))
            })?;

        Ok(Placement {
            region_id: region.id,
            region: region.name.clone(),
            category: cat.name.clone(),
            subcategory: sub.clone(),
        })
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emea() -> Region {
        Region::new(
            RegionId::new(),
            "EMEA",
            vec![
                Category::new("Software", ["Licenses", "Subscriptions"]),
                Category::new("Hardware", ["Servers"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn resolve_returns_canonical_names() {
        let region = emea();
        let id = region.id;
        let mut dir = RegionDirectory::new();
        dir.upsert_region(region);

        let placement = dir.resolve(&id, " software", "SUBSCRIPTIONS").unwrap();
        assert_eq!(placement.region, "EMEA");
        assert_eq!(placement.category, "Software");
        assert_eq!(placement.subcategory, "Subscriptions");
    }

    #[test]
    fn resolve_rejects_unknown_levels() {
        let region = emea();
        let id = region.id;
        let mut dir = RegionDirectory::new();
        dir.upsert_region(region);

        assert!(matches!(
            dir.resolve(&RegionId::new(), "Software", "Licenses"),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            dir.resolve(&id, "Services", "Licenses"),
            Err(DomainError::Validation(_))
        ));
        // Subcategory exists, but under another category.
        assert!(matches!(
            dir.resolve(&id, "Software", "Servers"),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn region_rejects_duplicates_and_blank_names() {
        assert!(Region::new(RegionId::new(), "  ", vec![]).is_err());
        assert!(Region::new(
            RegionId::new(),
            "APAC",
            vec![Category::new("Cloud", ["A"]), Category::new("cloud", ["B"])]
        )
        .is_err());
        assert!(Region::new(
            RegionId::new(),
            "APAC",
            vec![Category::new("Cloud", ["Compute", "compute"])]
        )
        .is_err());
    }

    #[test]
    fn upsert_replaces_existing_region() {
        let mut dir = RegionDirectory::new();
        let region = emea();
        let id = region.id;
        assert!(dir.upsert_region(region).is_none());

        let renamed = Region::new(id, "Europe", vec![]).unwrap();
        let previous = dir.upsert_region(renamed).unwrap();
        assert_eq!(previous.name, "EMEA");
        assert_eq!(dir.region(&id).unwrap().name, "Europe");
        assert_eq!(dir.list().len(), 1);
    }
}

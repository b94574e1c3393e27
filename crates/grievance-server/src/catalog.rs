//! Department catalogue loaded from configuration.
//!
//! Stands in for the reference-data service: a routing triple is valid if
//! the department lists the category and the category lists the
//! sub-category. Codes are compared exactly.

use std::{collections::HashSet, convert::Infallible};

use grievance_core::collab::DepartmentValidator;
use serde::Deserialize;

/// One `[[departments]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentEntry {
  pub department_id: String,
  #[serde(default)]
  pub categories:    Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
  pub category_code:      String,
  #[serde(default)]
  pub sub_category_codes: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CatalogValidator {
  triples: HashSet<(String, String, String)>,
}

impl CatalogValidator {
  pub fn new(entries: &[DepartmentEntry]) -> Self {
    let triples = entries
      .iter()
      .flat_map(|d| {
        d.categories.iter().flat_map(move |c| {
          c.sub_category_codes.iter().map(move |s| {
            (d.department_id.clone(), c.category_code.clone(), s.clone())
          })
        })
      })
      .collect();
    Self { triples }
  }

  pub fn len(&self) -> usize { self.triples.len() }

  pub fn is_empty(&self) -> bool { self.triples.is_empty() }

  fn contains(&self, department: &str, category: &str, sub_category: &str) -> bool {
    self.triples.contains(&(
      department.to_owned(),
      category.to_owned(),
      sub_category.to_owned(),
    ))
  }
}

impl DepartmentValidator for CatalogValidator {
  type Error = Infallible;

  async fn is_valid(
    &self,
    department_id: &str,
    category_code: &str,
    sub_category_code: &str,
  ) -> Result<bool, Infallible> {
    Ok(self.contains(department_id, category_code, sub_category_code))
  }
}

use itertools::Itertools;
use thiserror::Error;

use crate::model::Category;

/// Marks a choice field as not applied.
pub const UNSELECTED: &str = "Unselected";

pub const CHARACTER_STATUS_OPTIONS: &[&str] = &[UNSELECTED, "Alive", "Dead", "unknown"];
pub const CHARACTER_GENDER_OPTIONS: &[&str] =
    &[UNSELECTED, "Male", "Female", "unknown", "Genderless"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Choice(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: FieldKind::Choice(options),
        }
    }

    fn default_value(&self) -> &'static str {
        match self.kind {
            FieldKind::Text => "",
            FieldKind::Choice(_) => UNSELECTED,
        }
    }
}

pub const CHARACTER_FILTERS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::choice("status", CHARACTER_STATUS_OPTIONS),
    FieldSpec::text("species"),
    FieldSpec::text("type"),
    FieldSpec::choice("gender", CHARACTER_GENDER_OPTIONS),
];
pub const LOCATION_FILTERS: &[FieldSpec] = &[
    FieldSpec::text("name"),
    FieldSpec::text("type"),
    FieldSpec::text("dimension"),
];
pub const EPISODE_FILTERS: &[FieldSpec] = &[FieldSpec::text("name"), FieldSpec::text("episode")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterTables {
    pub characters: &'static [FieldSpec],
    pub locations: &'static [FieldSpec],
    pub episodes: &'static [FieldSpec],
}

impl FilterTables {
    pub fn fields(&self, category: Category) -> &'static [FieldSpec] {
        match category {
            Category::Characters => self.characters,
            Category::Locations => self.locations,
            Category::Episodes => self.episodes,
        }
    }
}

impl Default for FilterTables {
    fn default() -> Self {
        Self {
            characters: CHARACTER_FILTERS,
            locations: LOCATION_FILTERS,
            episodes: EPISODE_FILTERS,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("'{field}' is not a filter for {category}")]
    UnknownField { category: Category, field: String },

    #[error("'{value}' is not an option for {field} (expected one of {options})")]
    InvalidOption {
        field: String,
        value: String,
        options: String,
    },
}

fn is_active(value: &str) -> bool {
    !value.is_empty() && value != UNSELECTED
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryFilters {
    fields: &'static [FieldSpec],
    values: Vec<String>,
}

impl CategoryFilters {
    fn new(fields: &'static [FieldSpec]) -> Self {
        Self {
            fields,
            values: fields.iter().map(|f| f.default_value().to_string()).collect(),
        }
    }

    fn reset(&mut self) {
        for (spec, value) in self.fields.iter().zip(self.values.iter_mut()) {
            *value = spec.default_value().to_string();
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .position(|f| f.name == field)
            .map(|i| self.values[i].as_str())
    }

    pub fn specs(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields
            .iter()
            .zip(self.values.iter())
            .map(|(spec, value)| (spec.name, value.as_str()))
    }

    pub fn active(&self) -> Vec<(&'static str, &str)> {
        self.entries().filter(|(_, v)| is_active(v)).collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterState {
    tables: FilterTables,
    characters: CategoryFilters,
    locations: CategoryFilters,
    episodes: CategoryFilters,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new(FilterTables::default())
    }
}

impl FilterState {
    pub fn new(tables: FilterTables) -> Self {
        Self {
            tables,
            characters: CategoryFilters::new(tables.characters),
            locations: CategoryFilters::new(tables.locations),
            episodes: CategoryFilters::new(tables.episodes),
        }
    }

    pub fn tables(&self) -> &FilterTables {
        &self.tables
    }

    pub fn filters(&self, category: Category) -> &CategoryFilters {
        match category {
            Category::Characters => &self.characters,
            Category::Locations => &self.locations,
            Category::Episodes => &self.episodes,
        }
    }

    fn filters_mut(&mut self, category: Category) -> &mut CategoryFilters {
        match category {
            Category::Characters => &mut self.characters,
            Category::Locations => &mut self.locations,
            Category::Episodes => &mut self.episodes,
        }
    }

    /// Updates exactly one field of `category`; rejected input leaves state untouched.
    pub fn set_field(
        &mut self,
        category: Category,
        field: &str,
        value: &str,
    ) -> Result<(), FilterError> {
        let filters = self.filters_mut(category);
        let Some(idx) = filters.fields.iter().position(|f| f.name == field) else {
            return Err(FilterError::UnknownField {
                category,
                field: field.to_string(),
            });
        };
        let value = match filters.fields[idx].kind {
            FieldKind::Text => value.to_string(),
            FieldKind::Choice(_) if value.is_empty() => UNSELECTED.to_string(),
            FieldKind::Choice(options) => match options.iter().find(|o| **o == value) {
                Some(option) => option.to_string(),
                None => {
                    return Err(FilterError::InvalidOption {
                        field: field.to_string(),
                        value: value.to_string(),
                        options: options.join(", "),
                    })
                }
            },
        };
        filters.values[idx] = value;
        Ok(())
    }

    pub fn current_filters(&self, category: Category) -> Vec<(&'static str, &str)> {
        self.filters(category).active()
    }

    pub fn serialize(&self, category: Category) -> String {
        encode_pairs(&self.current_filters(category))
    }

    pub fn can_search(&self, category: Category) -> bool {
        !self.current_filters(category).is_empty()
    }

    pub fn reset_category(&mut self, category: Category) {
        self.filters_mut(category).reset();
    }

    pub fn reset(&mut self) {
        self.characters.reset();
        self.locations.reset();
        self.episodes.reset();
    }

    /// Applies every pair that names a field of `category`; returns how many
    /// were taken. Unknown keys are skipped.
    pub fn apply_pairs<'a, I>(&mut self, category: Category, pairs: I) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .filter(|(k, v)| self.set_field(category, k, v).is_ok())
            .count()
    }

    pub fn summary(&self, category: Category) -> String {
        self.current_filters(category)
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .join(" ")
    }
}

pub fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    // serializing a slice of string pairs cannot fail
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}

pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let trimmed = query.trim().trim_start_matches('?');
    serde_urlencoded::from_str::<Vec<(String, String)>>(trimmed).unwrap_or_default()
}

use crate::filters;
use crate::model::Category;

pub const CATEGORY_PARAM: &str = "category";

/// Where a view query string leads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Main {
        category: Category,
        /// Every other query pair, in order; the controller decides which are filters.
        params: Vec<(String, String)>,
    },
    /// The category tag was not recognised; show the fallback page.
    Redirect { requested: String },
}

/// Resolves `?category=...&...`. A missing or empty category means Characters.
pub fn resolve(query: &str) -> Route {
    let mut category: Option<String> = None;
    let mut params = Vec::new();
    for (key, value) in filters::parse_query(query) {
        if key == CATEGORY_PARAM {
            if category.is_none() {
                category = Some(value);
            }
        } else {
            params.push((key, value));
        }
    }

    match category.as_deref() {
        None | Some("") => Route::Main {
            category: Category::default(),
            params,
        },
        Some(tag) => match Category::from_tag(tag) {
            Some(category) => Route::Main { category, params },
            None => Route::Redirect {
                requested: tag.to_string(),
            },
        },
    }
}

/// Builds the view query for `category` plus already-serialized filter params.
pub fn location(category: Category, params: &str) -> String {
    let mut out = filters::encode_pairs(&[(CATEGORY_PARAM, category.as_str())]);
    if !params.is_empty() {
        out.push('&');
        out.push_str(params);
    }
    out
}

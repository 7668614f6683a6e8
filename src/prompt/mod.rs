//! Prompt construction
//!
//! - **engine**: `{KEY}` substitution over a [`TemplateVariables`] set
//! - **variables**: per-entity variable builders and the Japanese date format
//! - **templates**: the search, sentiment and extraction templates per entity kind
//!
//! Nothing here suspends; rendering is pure and can be repeated across passes
//! (entity variables first, stage reports second).

mod engine;
pub mod templates;
pub mod variables;

pub use engine::{render_template, TemplateVariables, VariableValue};
pub use templates::TemplateSet;
pub use variables::{
    block_variables, build_candidates_section, build_district_list, build_party_list,
    format_date, national_variables, regional_variables,
};

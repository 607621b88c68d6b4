//! Built-in registry catalog.
//!
//! Pricing is expressed directly in credits. Costs here were derived from
//! upstream provider pricing with the platform margin applied; changing a
//! model's underlying provider does not touch business logic as long as its
//! credit cost stays on the same side of the tier ladder.

use once_cell::sync::Lazy;

use crate::tier::AccessTier;

use super::model::ModelEntry;
use super::tool::ToolEntry;
use super::Registry;

static BUILTIN: Lazy<Registry> = Lazy::new(|| {
    Registry::new(default_models(), default_tools()).expect("built-in registry is valid")
});

/// Returns the process-wide built-in registry.
#[must_use]
pub fn builtin() -> &'static Registry {
    &BUILTIN
}

fn model(
    id: &str,
    display_name: &str,
    tier_required: AccessTier,
    base_cost: i64,
    is_default: bool,
) -> ModelEntry {
    ModelEntry {
        id: id.to_string(),
        display_name: display_name.to_string(),
        tier_required,
        base_cost,
        daily_free_limit: 0,
        is_default,
    }
}

fn default_models() -> Vec<ModelEntry> {
    vec![
        // Free-tier orchestration model.
        model("nimbus-mini", "Nimbus Mini", AccessTier::Free, 1, true),
        // Paid-tier default.
        model("nimbus", "Nimbus", AccessTier::Paid, 3, true),
        // Best quality, used by the deep reasoning tool.
        model("nimbus-pro", "Nimbus Pro", AccessTier::Paid, 24, false),
        // Image generation, billed per request.
        model("nimbus-image", "Nimbus Image", AccessTier::Paid, 8, false),
    ]
}

fn default_tools() -> Vec<ToolEntry> {
    let tool = |id: &str,
                description: &str,
                tier_required: AccessTier,
                base_cost: i64,
                daily_free_limit: i64,
                model_id: Option<&str>| ToolEntry {
        id: id.to_string(),
        description: description.to_string(),
        tier_required,
        base_cost,
        daily_free_limit,
        model_id: model_id.map(str::to_string),
    };

    vec![
        tool(
            "web_search",
            "Search the web for current information",
            AccessTier::Free,
            0,
            10,
            None,
        ),
        tool(
            "update_memory",
            "Update the persistent memory for this chat",
            AccessTier::Free,
            0,
            100,
            None,
        ),
        tool(
            "render_image",
            "Generate an image from a text prompt",
            AccessTier::Paid,
            5,
            1,
            Some("nimbus-image"),
        ),
        tool(
            "edit_image",
            "Edit an existing image based on instructions",
            AccessTier::Paid,
            5,
            1,
            Some("nimbus-image"),
        ),
        tool(
            "think_deep",
            "Advanced reasoning for complex math and logic",
            AccessTier::Paid,
            10,
            0,
            Some("nimbus-pro"),
        ),
        tool(
            "narrate",
            "Generate speech audio from text",
            AccessTier::Paid,
            3,
            0,
            None,
        ),
    ]
}

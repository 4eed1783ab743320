use crate::error::{GoalgenError, Result};
use crate::spec::Spec;
use serde_json::Value;
use std::collections::HashMap;
use tera::Tera;

// ---------------------------------------------------------------------------
// Case-conversion filters
// ---------------------------------------------------------------------------

/// Split an identifier into lowercase words, breaking on `_`, `-`,
/// whitespace, and lower-to-upper camelCase boundaries.
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in text.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
        } else if c.is_uppercase() && prev_lower {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            current.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn snake_case(text: &str) -> String {
    split_words(text).join("_")
}

pub fn kebab_case(text: &str) -> String {
    split_words(text).join("-")
}

pub fn pascal_case(text: &str) -> String {
    split_words(text).iter().map(|w| capitalize(w)).collect()
}

pub fn camel_case(text: &str) -> String {
    let words = split_words(text);
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

pub fn upper_case(text: &str) -> String {
    snake_case(text).to_uppercase()
}

pub fn title_case(text: &str) -> String {
    let words: Vec<String> = split_words(text).iter().map(|w| capitalize(w)).collect();
    words.join(" ")
}

fn string_filter(
    name: &'static str,
    convert: fn(&str) -> String,
) -> impl tera::Filter {
    move |value: &Value, _args: &HashMap<String, Value>| -> tera::Result<Value> {
        let s = value
            .as_str()
            .ok_or_else(|| tera::Error::msg(format!("{name} filter expects a string")))?;
        Ok(Value::String(convert(s)))
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Tera instance with every generator template registered, plus the
/// case-conversion filters templates rely on for naming variants.
pub fn build_engine(templates: &[(&str, &str)]) -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(templates.to_vec())
        .map_err(|e| GoalgenError::Template {
            name: "<registration>".to_string(),
            source: e,
        })?;
    tera.register_filter("snake_case", string_filter("snake_case", snake_case));
    tera.register_filter("camel_case", string_filter("camel_case", camel_case));
    tera.register_filter("pascal_case", string_filter("pascal_case", pascal_case));
    tera.register_filter("kebab_case", string_filter("kebab_case", kebab_case));
    tera.register_filter("upper_case", string_filter("upper_case", upper_case));
    tera.register_filter("title_case", string_filter("title_case", title_case));
    Ok(tera)
}

/// Build the shared template context for one spec: identifiers in every
/// naming variant, the raw sections, and a few computed flags.
pub fn render_context(spec: &Spec) -> tera::Context {
    let value = spec.value();
    let goal_id = spec.id().unwrap_or("unknown").to_string();

    let mut ctx = tera::Context::new();
    ctx.insert("goal_id", &goal_id);
    ctx.insert(
        "goal_title",
        value
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or(&title_case(&goal_id)),
    );
    ctx.insert(
        "goal_description",
        value.get("description").and_then(Value::as_str).unwrap_or(""),
    );
    ctx.insert("version", spec.version().unwrap_or("1.0.0"));

    ctx.insert("goal_id_camel", &camel_case(&goal_id));
    ctx.insert("goal_id_pascal", &pascal_case(&goal_id));
    ctx.insert("goal_id_kebab", &kebab_case(&goal_id));
    ctx.insert("goal_id_upper", &upper_case(&goal_id));

    let empty_map = Value::Object(Default::default());
    let empty_list = Value::Array(Default::default());
    let agents = value.get("agents").unwrap_or(&empty_map);
    let tools = value.get("tools").unwrap_or(&empty_map);
    ctx.insert("agents", agents);
    ctx.insert("tools", tools);
    ctx.insert("tasks", value.get("tasks").unwrap_or(&empty_list));
    ctx.insert("ux", value.get("ux").unwrap_or(&empty_map));
    ctx.insert("deployment", value.get("deployment").unwrap_or(&empty_map));
    ctx.insert(
        "state_management",
        value.get("state_management").unwrap_or(&empty_map),
    );
    ctx.insert(
        "authentication",
        value.get("authentication").unwrap_or(&empty_map),
    );

    ctx.insert("num_agents", &spec.agent_names().len());
    ctx.insert("num_tools", &spec.tool_names().len());
    ctx.insert("has_tools", &!spec.tool_names().is_empty());
    ctx.insert("has_teams", &ux_enabled(value, "teams"));
    ctx.insert("has_webchat", &ux_enabled(value, "webchat"));
    ctx.insert("environments", &environment_names(spec));

    ctx
}

pub fn ux_enabled(spec: &Value, surface: &str) -> bool {
    spec.get("ux")
        .and_then(|ux| ux.get(surface))
        .and_then(|s| s.get("enabled"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Deployment environment names, falling back to the conventional trio when
/// the spec declares none.
pub fn environment_names(spec: &Spec) -> Vec<String> {
    spec.value()
        .get("deployment")
        .and_then(|d| d.get("environments"))
        .and_then(Value::as_object)
        .filter(|m| !m.is_empty())
        .map(|m| m.keys().cloned().collect())
        .unwrap_or_else(|| {
            vec!["dev".to_string(), "staging".to_string(), "prod".to_string()]
        })
}

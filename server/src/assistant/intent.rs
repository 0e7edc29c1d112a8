use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Look for a stored recipe.
    #[default]
    Search,
    /// Invent a new dish.
    Create,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    #[serde(deserialize_with = "null_as_default")]
    pub keyword: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub area: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntentAnalysis {
    pub intent: Intent,
    #[serde(deserialize_with = "null_as_default")]
    pub search_params: SearchParams,
    #[serde(deserialize_with = "null_as_default")]
    pub context_notes: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Models like to wrap JSON in Markdown fences even when told not to.
pub(crate) fn strip_code_fences(reply: &str) -> String {
    reply.replace("```json", "").replace("```", "").trim().to_string()
}

pub(crate) fn parse(reply: &str) -> Option<IntentAnalysis> {
    serde_json::from_str(&strip_code_fences(reply)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_replies_parse() {
        let reply = "```json\n{\"intent\":\"create\",\"searchParams\":{\"keyword\":\"gà\",\"ingredients\":[\"gà\",\"sả\"],\"area\":\"\"},\"contextNotes\":\"wants something new\"}\n```";

        let analysis = parse(reply).unwrap();

        assert_eq!(analysis.intent, Intent::Create);
        assert_eq!(analysis.search_params.keyword, "gà");
        assert_eq!(analysis.search_params.ingredients, vec!["gà", "sả"]);
        assert_eq!(analysis.context_notes, "wants something new");
    }

    #[test]
    fn nulls_and_missing_fields_become_empty() {
        let analysis =
            parse(r#"{"intent":"search","searchParams":{"keyword":null},"contextNotes":null}"#)
                .unwrap();

        assert_eq!(analysis, IntentAnalysis::default());
    }

    #[test]
    fn prose_and_unknown_intents_are_rejected() {
        assert_eq!(parse("Sure! The user wants soup."), None);
        assert_eq!(parse(r#"{"intent":"order"}"#), None);
    }
}

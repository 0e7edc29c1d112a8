use indoc::formatdoc;

use super::Candidate;

const CANDIDATES_SHOWN: usize = 3;
const INGREDIENTS_SHOWN: usize = 6;

pub(crate) fn intent(history_context: &str, prompt: &str) -> String {
    formatdoc! {r#"
        You analyse what the user wants in CookPac, a recipe sharing app.

        Recent conversation:
        {history_context}

        New request: "{prompt}"

        Reply with exactly this JSON and nothing else:
        {{
          "intent": "search" | "create",
          "searchParams": {{
            "keyword": "dish name or main keyword",
            "ingredients": ["ingredient 1", "ingredient 2"],
            "area": "regional cuisine if any"
          }},
          "contextNotes": "short note if needed (for example: the user wants something different from before)"
        }}

        Rules:
        - intent = "search" when the user asks how to cook something, looks for a dish, a guide or an existing recipe
        - intent = "create" when the user asks to invent, create, vary or fuse a dish, or wants something new or different
        "#,
        history_context = history_context,
        prompt = prompt,
    }
}

fn context_line(context_notes: &str) -> String {
    if context_notes.trim().is_empty() {
        String::new()
    } else {
        format!("Context: {}", context_notes.trim())
    }
}

fn knowledge_block(knowledge: &[String]) -> String {
    knowledge.join("\n\n")
}

pub(crate) fn existing_recipe(
    prompt: &str,
    context_notes: &str,
    candidates: &[Candidate],
    knowledge: &[String],
    language: &str,
) -> String {
    let recipes = candidates
        .iter()
        .take(CANDIDATES_SHOWN)
        .map(|c| {
            let ingredients = c
                .ingredients
                .iter()
                .take(INGREDIENTS_SHOWN)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            format!("- ID: {} | Name: {} | Main ingredients: {ingredients}", c.id, c.name)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let context = context_line(context_notes);
    let knowledge = knowledge_block(knowledge);

    formatdoc! {"
        You are the friendly cooking assistant of CookPac.

        Request: {prompt}
        {context}

        Matching recipes from the community (use the exact dish name):
        {recipes}

        Additional knowledge:
        {knowledge}

        How to answer:
        - Introduce the best matching CookPac recipe by its exact name so the app can show its card
        - Briefly explain why it fits
        - List 4-5 main ingredients
        - Summarise the 3 most important steps
        - Give 1-2 good tips
        Answer in {language}, warmly and concisely.
        ",
        prompt = prompt,
        context = context,
        recipes = recipes,
        knowledge = knowledge,
        language = language,
    }
}

pub(crate) fn new_recipe(
    prompt: &str,
    context_notes: &str,
    avoid: &[String],
    similar: &[Candidate],
    knowledge: &[String],
    language: &str,
) -> String {
    let context = context_line(context_notes);
    let avoid = if avoid.is_empty() {
        String::new()
    } else {
        format!("Avoid entirely the dishes already suggested: {}", avoid.join(", "))
    };
    let similar = if similar.is_empty() {
        String::new()
    } else {
        format!(
            "Similar dishes exist in the community: {}",
            similar
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    let knowledge = knowledge_block(knowledge);

    formatdoc! {"
        You are the creative chef of CookPac.

        Request: {prompt}
        {context}
        {avoid}

        For reference (do not copy directly):
        {knowledge}
        {similar}

        Create a NEW and ORIGINAL recipe:
        1. An appealing, novel dish name in **bold**
        2. Complete ingredients with exact quantities (for example: 300g chicken, 2 eggs)
        3. Detailed, clearly numbered steps
        4. What makes the dish special
        5. 1-2 tips to make it tastier

        Answer in {language}, detailed, engaging and easy to follow.
        ",
        prompt = prompt,
        context = context,
        avoid = avoid,
        knowledge = knowledge,
        similar = similar,
        language = language,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i32, name: &str, ingredients: usize) -> Candidate {
        Candidate {
            id,
            name: name.to_string(),
            description: String::new(),
            ingredients: (1..=ingredients).map(|i| format!("item{i} 1g")).collect(),
        }
    }

    #[test]
    fn existing_recipe_prompt_lists_top_three_with_six_ingredients() {
        let candidates = vec![
            candidate(1, "Phở bò", 8),
            candidate(2, "Bún chả", 1),
            candidate(3, "Cơm tấm", 1),
            candidate(4, "Bánh xèo", 1),
        ];

        let prompt = existing_recipe("beef soup", "", &candidates, &[], "Vietnamese");

        assert!(prompt.contains(
            "- ID: 1 | Name: Phở bò | Main ingredients: \
             item1 1g, item2 1g, item3 1g, item4 1g, item5 1g, item6 1g\n"
        ));
        assert!(prompt.contains("ID: 3 | Name: Cơm tấm"));
        assert!(!prompt.contains("Bánh xèo"));
        assert!(!prompt.contains("Context:"));
        assert!(prompt.contains("Answer in Vietnamese"));
    }

    #[test]
    fn new_recipe_prompt_mentions_what_to_avoid() {
        let prompt = new_recipe(
            "something new with chicken",
            "wants a change",
            &["Gà nướng".to_string()],
            &[candidate(5, "Gà kho", 0)],
            &["Lemongrass pairs well with chicken.".to_string()],
            "English",
        );

        assert!(prompt.contains("Context: wants a change"));
        assert!(prompt.contains("Avoid entirely the dishes already suggested: Gà nướng"));
        assert!(prompt.contains("Similar dishes exist in the community: Gà kho"));
        assert!(prompt.contains("Lemongrass pairs well with chicken."));
    }

    #[test]
    fn intent_prompt_embeds_history_and_request() {
        let prompt = intent("USER: hi", "how do I make phở?");

        assert!(prompt.contains("Recent conversation:\nUSER: hi\n"));
        assert!(prompt.contains("New request: \"how do I make phở?\""));
        assert!(prompt.contains("\"intent\": \"search\" | \"create\""));
    }
}

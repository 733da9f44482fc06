//! Prompt construction and response sanitation for the external classifier.
//!
//! The model is asked for bare JSON but answers with code fences, preambles
//! or trailing prose often enough that parsing is defensive: strip fences,
//! cut the widest brace window, then let serde decide.

use anyhow::{Context, Result};

use crate::aggregate::CategoryAggregate;
use crate::locator::{FactorTable, OTHER_CATEGORY};
use crate::result::{ClassificationResult, MAX_CATEGORIES};

/// Render the classification prompt from the ranked aggregates and the
/// factor table. Swedish, like the workbooks it describes.
pub fn build_prompt(aggregates: &[CategoryAggregate], factors: &FactorTable) -> String {
    let mut prompt = String::from(
        "Du är en AI som uppskattar klimatpåverkan från inköpsdata.\n\n\
         Inköp per kategori (namn: kostnad kr, antal st):\n",
    );

    for agg in aggregates {
        prompt.push_str(&format!(
            "- {}: {:.2} kr, {} st\n",
            agg.name, agg.total_cost, agg.total_quantity
        ));
    }

    prompt.push_str("\nUtsläppsfaktorer (kategori: kg CO2 per enhet):\n");
    for (category, factor) in factors.iter() {
        prompt.push_str(&format!("- {category}: {factor}\n"));
    }

    prompt.push_str(&format!(
        "\nGör så här:\n\
         1. Matcha varje inköpskategori mot en utsläppsfaktor via nyckelord och \
         delsträngar, skiftlägesokänsligt.\n\
         2. Beräkna utsläpp som antal gånger faktor.\n\
         3. Använd faktorn \"{OTHER_CATEGORY}\" när ingen kategori matchar.\n\
         4. Ta bara med de {MAX_CATEGORIES} kategorier som har högst kostnad.\n\
         5. Svara med ETT enda JSON-objekt utan någon annan text, exakt i denna form:\n\
         {{\"categories\":[{{\"name\":\"...\",\"items\":[\"...\"],\"totals\":{{\"quantity\":0,\
         \"emissions\":{{\"co2\":0}},\"cost\":0,\"energy\":0}}}}],\
         \"summary\":{{\"totalEmissions\":{{\"co2\":0}},\"totalCost\":0,\"totalEnergy\":0,\
         \"totalItems\":0}},\"recommendations\":[\"...\"]}}\n"
    ));

    prompt
}

/// Pull the JSON object out of a model reply: drop code-fence lines, then
/// take everything between the first `{` and the last `}`.
pub fn extract_json(text: &str) -> Option<String> {
    let unfenced: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    let unfenced = unfenced.join("\n");

    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    if end < start {
        return None;
    }
    Some(unfenced[start..=end].to_string())
}

/// Parse a model reply into a normalized [`ClassificationResult`].
pub fn parse_model_response(text: &str) -> Result<ClassificationResult> {
    let json = extract_json(text).context("no JSON object in model reply")?;
    let result: ClassificationResult =
        serde_json::from_str(&json).context("model reply does not match the result schema")?;
    Ok(result.normalize())
}

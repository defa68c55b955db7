//! Comparison rubrics sent to the vision model.
//!
//! Each rubric ends with the exact JSON field set expected back; field names
//! match the serde wire forms of the verdict types.

/// Fast same-location check, run before a checkout photo is committed.
pub fn quick_match_prompt(item_name: &str) -> String {
    format!(
        "You are a photo matching expert. Quickly verify if these two images show \
         the SAME location/item.\n\n\
         Compare these images of \"{item_name}\":\n\
         1. REFERENCE image (original intake photo)\n\
         2. NEW image (just captured)\n\n\
         QUICK CHECK:\n\
         - Same room/location? (walls, fixtures, layout)\n\
         - Same angle/perspective?\n\
         - Same item being photographed?\n\
         - Lighting/quality acceptable?\n\n\
         Respond with JSON ONLY (no markdown), exact field set:\n\
         {{\n\
           \"is_match\": boolean,\n\
           \"confidence\": \"high\" | \"medium\" | \"low\",\n\
           \"reason\": \"brief one-sentence explanation\",\n\
           \"recommendation\": \"accept\" | \"retake\" | \"warning\"\n\
         }}\n\n\
         Be fast but accurate. This is initial validation only."
    )
}

/// Full damage assessment across complete before/after photo sets.
pub fn full_comparison_prompt(item_name: &str, before_count: usize, after_count: usize) -> String {
    let total = before_count + after_count;
    format!(
        "You are an expert property damage assessor analyzing photo sets of the same \
         location.\n\n\
         Item: \"{item_name}\"\n\n\
         You will receive:\n\
         - {before_count} BEFORE image(s) (intake/move-in condition)\n\
         - {after_count} AFTER image(s) (checkout/current condition)\n\n\
         ANALYSIS:\n\
         1. First verify both sets show the same location by comparing architectural\n\
            features, distinctive marks and spatial layout\n\
         2. Cross-reference all before photos with all after photos\n\
         3. Identify every change: scratches, scuffs, dents, chips, stains,\n\
            discoloration, cracks, holes, missing fixtures, water damage, mold\n\
         4. Classify each change as normal wear or damage beyond normal use,\n\
            considering lease duration and reasonable use\n\n\
         SEVERITY: \"none\" identical or imperceptible; \"minor\" small marks, easily\n\
         repairable; \"moderate\" needs professional repair; \"major\" affects\n\
         functionality or value.\n\n\
         Respond with JSON ONLY (no markdown), exact field set:\n\
         {{\n\
           \"same_location\": boolean,\n\
           \"location_confidence\": \"high\" | \"medium\" | \"low\",\n\
           \"has_damage\": boolean,\n\
           \"severity\": \"none\" | \"minor\" | \"moderate\" | \"major\",\n\
           \"damage_types\": [\"scratch\", \"stain\", ...],\n\
           \"description\": \"2-3 sentence summary of findings across all photos\",\n\
           \"specific_issues\": [\"each issue with its location\"],\n\
           \"is_normal_wear\": boolean,\n\
           \"tenant_liable\": boolean,\n\
           \"liability_reasoning\": \"explanation grounded in Swiss rental law\",\n\
           \"repair_estimate\": \"none\" | \"low\" | \"medium\" | \"high\",\n\
           \"photos_analyzed\": {total}\n\
         }}\n\n\
         Analyze thoroughly across ALL {total} photos."
    )
}

/// Simple deterioration grading pass (A+ to F).
pub fn deterioration_prompt(item_name: &str) -> String {
    format!(
        "You are an expert property inspector. Compare the BEFORE (intake) and AFTER \
         (checkout) photos of \"{item_name}\" and grade the deterioration.\n\n\
         GRADES:\n\
         - A+ : perfect condition, no changes\n\
         - A  : excellent, minimal wear\n\
         - B  : good, normal wear only\n\
         - C  : fair, some deterioration\n\
         - D  : poor, significant damage\n\
         - F  : failed, major damage\n\n\
         Respond with JSON ONLY (no markdown), exact field set:\n\
         {{\n\
           \"state_grade\": \"A+\" | \"A\" | \"B\" | \"C\" | \"D\" | \"F\",\n\
           \"has_damage\": boolean,\n\
           \"severity\": \"none\" | \"minor\" | \"moderate\" | \"major\",\n\
           \"description\": \"brief comment on the differences observed\",\n\
           \"tenant_liable\": boolean,\n\
           \"is_normal_wear\": boolean\n\
         }}\n\n\
         Be concise and factual."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_match_prompt_names_item_and_schema() {
        let prompt = quick_match_prompt("Kitchen Countertops");
        assert!(prompt.contains("Kitchen Countertops"));
        assert!(prompt.contains("\"is_match\""));
        assert!(prompt.contains("\"recommendation\""));
    }

    #[test]
    fn full_prompt_counts_photos() {
        let prompt = full_comparison_prompt("Bathroom Tiles", 3, 2);
        assert!(prompt.contains("3 BEFORE"));
        assert!(prompt.contains("2 AFTER"));
        assert!(prompt.contains("\"photos_analyzed\": 5"));
    }

    #[test]
    fn deterioration_prompt_lists_grades() {
        let prompt = deterioration_prompt("Front Bumper");
        assert!(prompt.contains("\"state_grade\""));
        assert!(prompt.contains("A+"));
    }
}

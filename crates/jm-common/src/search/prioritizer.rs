use crate::SkillProfile;

fn is_term(skill: &str) -> bool {
    !skill.trim().is_empty()
}

/// Head of the key skill list that drives scoring, order preserved.
///
/// A blank entry still occupies its slot but is dropped, so it can never
/// match every listing. The structured skill list never substitutes for an
/// empty key list.
pub fn prioritize_skills(profile: &SkillProfile, max_terms: usize) -> Vec<String> {
    profile
        .key_skills
        .iter()
        .take(max_terms)
        .filter(|skill| is_term(skill))
        .cloned()
        .collect()
}

/// Every structured skill name, in the order supplied.
pub fn structured_skill_terms(profile: &SkillProfile) -> Vec<String> {
    profile
        .structured_skills
        .iter()
        .map(|skill| skill.skill_name.as_str())
        .filter(|name| is_term(name))
        .map(str::to_string)
        .collect()
}

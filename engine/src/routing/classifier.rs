//! Model-assisted classification
//!
//! The classification model answers in free text and cannot be trusted to
//! follow the requested format. Its answer is parsed in three layers: a
//! substring scan over the configured names, then a word-bounded regex, then
//! the catch-all.

use regex::Regex;

use super::RouteDefinition;

/// Temperature for classification calls
pub const CLASSIFICATION_TEMPERATURE: f64 = 0.1;

/// Output budget for classification calls
pub const CLASSIFICATION_MAX_TOKENS: u32 = 50;

/// Build the system prompt listing every route
pub fn build_classification_prompt(routes: &[RouteDefinition]) -> String {
    let descriptions: Vec<String> = routes
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let keywords = if route.keywords.is_empty() {
                "(default fallback)".to_string()
            } else {
                route.keywords.join(", ")
            };
            format!(
                "{}. **{}**: {}\n   Keywords: {}",
                i + 1,
                route.name,
                route.description,
                keywords
            )
        })
        .collect();

    let choices: Vec<String> = routes
        .iter()
        .map(|route| format!("\"{}\"", route.name))
        .collect();

    format!(
        "You are an intelligent routing agent.\n\n\
         Available agents:\n{}\n\n\
         Your task: Analyze the objective and respond with ONLY the agent name: {}.\n\n\
         Be specific: Match the objective to the agent whose description and keywords best fit the task.\n\
         If no specialized agent matches, choose the catchall/default agent.",
        descriptions.join("\n"),
        choices.join(" or ")
    )
}

/// Compile the case-insensitive alternation of all route names
pub fn route_name_pattern(routes: &[RouteDefinition]) -> Result<Regex, regex::Error> {
    let names: Vec<String> = routes.iter().map(|r| regex::escape(&r.name)).collect();
    Regex::new(&format!(r"(?i)\b({})\b", names.join("|")))
}

/// Map a classification response onto a configured route
///
/// Returns `None` when neither the substring scan nor the regex finds a
/// route name; the caller then selects the catch-all.
pub fn parse_classification<'a>(
    response: &str,
    routes: &'a [RouteDefinition],
    pattern: &Regex,
) -> Option<&'a RouteDefinition> {
    let cleaned = response.trim().to_lowercase();

    if let Some(route) = routes
        .iter()
        .find(|route| cleaned.contains(&route.name.to_lowercase()))
    {
        return Some(route);
    }

    let matched = pattern.captures(&cleaned)?.get(1)?.as_str().to_lowercase();
    routes
        .iter()
        .find(|route| route.name.to_lowercase() == matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Vec<RouteDefinition> {
        vec![
            RouteDefinition::new("electricalarch", ["wiring", "harness"], "Electrical architecture"),
            RouteDefinition::new("catchall", Vec::<String>::new(), "Anything else"),
        ]
    }

    #[test]
    fn test_prompt_lists_routes_in_order() {
        let prompt = build_classification_prompt(&routes());

        assert!(prompt.contains(
            "1. **electricalarch**: Electrical architecture\n   Keywords: wiring, harness"
        ));
        assert!(prompt.contains("2. **catchall**: Anything else\n   Keywords: (default fallback)"));
        assert!(prompt.contains("\"electricalarch\" or \"catchall\""));
        assert!(prompt.find("electricalarch").unwrap() < prompt.find("catchall").unwrap());
    }

    #[test]
    fn test_substring_match_ignores_surrounding_text() {
        let routes = routes();
        let pattern = route_name_pattern(&routes).unwrap();

        let route = parse_classification("I think ElectricalArch fits", &routes, &pattern);
        assert_eq!(route.unwrap().name, "electricalarch");

        let route = parse_classification("  CATCHALL\n", &routes, &pattern);
        assert_eq!(route.unwrap().name, "catchall");
    }

    #[test]
    fn test_earlier_route_wins_substring_scan() {
        let routes = routes();
        let pattern = route_name_pattern(&routes).unwrap();
        let route = parse_classification("catchall or electricalarch", &routes, &pattern);
        assert_eq!(route.unwrap().name, "electricalarch");
    }

    #[test]
    fn test_unrecognized_response() {
        let routes = routes();
        let pattern = route_name_pattern(&routes).unwrap();
        assert!(parse_classification("no idea", &routes, &pattern).is_none());
        assert!(parse_classification("", &routes, &pattern).is_none());
    }

    #[test]
    fn test_regex_returns_configured_name() {
        // Names containing regex metacharacters are escaped
        let routes = vec![
            RouteDefinition::new("Body.Trim", ["door"], ""),
            RouteDefinition::new("Fallback", Vec::<String>::new(), ""),
        ];
        let pattern = route_name_pattern(&routes).unwrap();

        assert!(pattern.is_match("use body.trim please"));
        assert!(!pattern.is_match("bodyxtrim"));

        let route = parse_classification("FALLBACK", &routes, &pattern);
        assert_eq!(route.unwrap().name, "Fallback");
    }
}

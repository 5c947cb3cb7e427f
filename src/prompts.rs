pub const COUNT: &str = include_str!("../data/prompts/count.txt");
pub const TICKET_ITEMS: &str = include_str!("../data/prompts/ticket_items.txt");
pub const TICKET_WITH_TOTALS: &str = include_str!("../data/prompts/ticket_with_totals.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_var() {
        assert_eq!(
            render("Count the {{object}}.", &[("object", "cats")]),
            "Count the cats."
        );
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render("{{a}} and {{b}}", &[("a", "cats")]), "cats and {{b}}");
    }

    #[test]
    fn test_prompts_are_non_empty() {
        assert!(!COUNT.is_empty());
        assert!(!TICKET_ITEMS.is_empty());
        assert!(!TICKET_WITH_TOTALS.is_empty());
    }

    #[test]
    fn test_count_has_object_placeholder() {
        assert!(COUNT.contains("{{object}}"));
    }

    #[test]
    fn test_ticket_prompts_name_the_fields() {
        for prompt in [TICKET_ITEMS, TICKET_WITH_TOTALS] {
            assert!(prompt.contains("\"quantity\""));
            assert!(prompt.contains("\"name\""));
            assert!(prompt.contains("\"price_unit\""));
        }
        assert!(TICKET_WITH_TOTALS.contains("\"price_total\""));
    }
}

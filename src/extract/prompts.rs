//! Extraction schema and prompt sent with every category scrape.

use serde_json::{json, Value};

/// JSON schema for the extracted product list.
pub fn product_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "products": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "price": { "type": "string" },
                        "availability": { "type": "string" },
                        "image": { "type": "string" },
                        "productUrl": { "type": "string" },
                        "description": { "type": "string" },
                        "supplier": { "type": "string" },
                        "features": { "type": "array", "items": { "type": "string" } },
                        "specifications": { "type": "object" }
                    },
                    "required": ["name", "price"]
                }
            }
        },
        "required": ["products"]
    })
}

const PROMPT_TEMPLATE: &str = r#"Extract up to {count} products from this {category} search results page for UK electricians.

For each product return:
- name: the full product name including brand and model number
- price: the displayed price including the currency symbol (e.g. "£49.99"), exactly as shown
- availability: stock or delivery status text if shown
- image: the main product image URL
- productUrl: the absolute link to the product page
- description: a one-sentence summary if available
- features: key features as short bullet strings
- specifications: technical specifications as key/value pairs

Only include real products listed on the page. Skip adverts, banners and category links. Do not invent prices."#;

/// Natural-language extraction instruction for a category.
pub fn extraction_prompt(category: &str, target_items: u32) -> String {
    PROMPT_TEMPLATE
        .replace("{category}", category)
        .replace("{count}", &target_items.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_name_and_price() {
        let schema = product_schema();
        let required = &schema["properties"]["products"]["items"]["required"];
        assert_eq!(required, &json!(["name", "price"]));
    }

    #[test]
    fn test_prompt_substitution() {
        let prompt = extraction_prompt("Test Equipment", 15);
        assert!(prompt.contains("up to 15 products"));
        assert!(prompt.contains("Test Equipment search results"));
        assert!(!prompt.contains('{'));
    }
}

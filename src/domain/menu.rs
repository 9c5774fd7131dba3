use serde::{Deserialize, Deserializer, Serialize};

/// Category used for items the model did not place in a category.
pub const DEFAULT_CATEGORY: &str = "Menu";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Models emit prices both as strings ("$12.50") and as bare numbers.
fn de_price<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Single-shot structuring output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredMenu {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// One incrementally produced unit of structured menu output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuChunk {
    Description { text: String },
    Cuisine { text: String },
    Tags { tags: Vec<String> },
    Category { name: String },
    Item(MenuItem),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// Menu reassembled from a chunk stream, ready to persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuDraft {
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<CategoryDraft>,
}

impl MenuDraft {
    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|c| c.items.len()).sum()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }
}

/// Reassembles category/item relationships from chunks in arrival order.
///
/// Items may reference a category before its `category` chunk arrives; the
/// category is created on first reference and keeps that position.
#[derive(Debug, Default)]
pub struct MenuAccumulator {
    draft: MenuDraft,
}

impl MenuAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: MenuChunk) {
        match chunk {
            MenuChunk::Description { text } => self.draft.description = non_empty(text),
            MenuChunk::Cuisine { text } => self.draft.cuisine = non_empty(text),
            MenuChunk::Tags { tags } => {
                for tag in tags {
                    let tag = tag.trim().to_string();
                    if !tag.is_empty() && !self.draft.tags.contains(&tag) {
                        self.draft.tags.push(tag);
                    }
                }
            }
            MenuChunk::Category { name } => {
                if let Some(name) = non_empty(name) {
                    self.category_mut(&name);
                }
            }
            MenuChunk::Item(item) => {
                if item.name.trim().is_empty() {
                    return;
                }
                let category = item
                    .category
                    .as_deref()
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .unwrap_or(DEFAULT_CATEGORY)
                    .to_string();
                self.category_mut(&category).items.push(item);
            }
        }
    }

    fn category_mut(&mut self, name: &str) -> &mut CategoryDraft {
        let position = self
            .draft
            .categories
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name));
        let index = match position {
            Some(index) => index,
            None => {
                self.draft.categories.push(CategoryDraft {
                    name: name.to_string(),
                    items: Vec::new(),
                });
                self.draft.categories.len() - 1
            }
        };
        &mut self.draft.categories[index]
    }

    /// Finish accumulation, dropping categories that never received an item.
    pub fn finish(mut self) -> MenuDraft {
        self.draft.categories.retain(|c| !c.items.is_empty());
        self.draft
    }
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, category: Option<&str>) -> MenuChunk {
        MenuChunk::Item(MenuItem {
            name: name.into(),
            category: category.map(Into::into),
            ..Default::default()
        })
    }

    #[test]
    fn test_chunk_wire_format() {
        let chunk: MenuChunk = serde_json::from_str(
            r#"{"kind":"item","name":"Club Sandwich","price":12.5,"category":"Lunch"}"#,
        )
        .unwrap();
        assert_eq!(
            chunk,
            MenuChunk::Item(MenuItem {
                name: "Club Sandwich".into(),
                price: Some("12.5".into()),
                category: Some("Lunch".into()),
                ..Default::default()
            })
        );

        let json = serde_json::to_value(MenuChunk::Category {
            name: "Drinks".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"kind": "category", "name": "Drinks"}));
    }

    #[test]
    fn test_price_accepts_strings_and_blank() {
        let item: MenuItem = serde_json::from_str(r#"{"name":"Soup","price":"$6"}"#).unwrap();
        assert_eq!(item.price.as_deref(), Some("$6"));

        let item: MenuItem = serde_json::from_str(r#"{"name":"Soup","price":"  "}"#).unwrap();
        assert_eq!(item.price, None);

        let item: MenuItem = serde_json::from_str(r#"{"name":"Soup","price":null}"#).unwrap();
        assert_eq!(item.price, None);
    }

    #[test]
    fn test_accumulator_buffers_items_before_category() {
        let mut acc = MenuAccumulator::new();
        acc.push(item("Pancakes", Some("Breakfast")));
        acc.push(MenuChunk::Category {
            name: "Lunch".into(),
        });
        acc.push(MenuChunk::Category {
            name: "Breakfast".into(),
        });
        acc.push(item("Burger", Some("Lunch")));
        acc.push(item("Waffles", Some("breakfast")));

        let draft = acc.finish();
        let names: Vec<&str> = draft.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Breakfast", "Lunch"]);
        assert_eq!(draft.categories[0].items.len(), 2);
        assert_eq!(draft.item_count(), 3);
        assert_eq!(draft.category_count(), 2);
    }

    #[test]
    fn test_accumulator_defaults_and_drops_empty() {
        let mut acc = MenuAccumulator::new();
        acc.push(MenuChunk::Category {
            name: "Desserts".into(),
        });
        acc.push(item("Fries", None));
        acc.push(item("   ", Some("Sides")));

        let draft = acc.finish();
        assert_eq!(draft.category_count(), 1);
        assert_eq!(draft.categories[0].name, DEFAULT_CATEGORY);
        assert_eq!(draft.categories[0].items[0].name, "Fries");
    }

    #[test]
    fn test_accumulator_metadata() {
        let mut acc = MenuAccumulator::new();
        acc.push(MenuChunk::Description {
            text: " Neighborhood diner ".into(),
        });
        acc.push(MenuChunk::Cuisine {
            text: "American".into(),
        });
        acc.push(MenuChunk::Tags {
            tags: vec!["brunch".into(), "".into(), "brunch".into(), "casual".into()],
        });

        let draft = acc.finish();
        assert_eq!(draft.description.as_deref(), Some("Neighborhood diner"));
        assert_eq!(draft.cuisine.as_deref(), Some("American"));
        assert_eq!(draft.tags, vec!["brunch", "casual"]);
    }
}

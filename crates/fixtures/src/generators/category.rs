//! Product category generation.

use batch_seed::record::record_id;
use batch_seed::{RecordId, SeedRecord};
use fake::{Fake, faker::lorem::en::Sentence, faker::lorem::en::Word};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Generated catalog category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCategory {
    pub id: RecordId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub position: u32,
}

impl SeedRecord for GeneratedCategory {
    const KIND: &'static str = "category";

    fn id(&self) -> RecordId {
        self.id
    }

    fn validate(&self) -> Result<(), String> {
        if self.slug.is_empty() {
            return Err("slug is empty".to_string());
        }
        Ok(())
    }
}

/// The parts of a committed category that products need.
///
/// Resolved through the store after categories are released, so products
/// never hold a handle into a finished batch.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    pub id: RecordId,
    pub slug: String,
}

impl From<&GeneratedCategory> for CategoryRef {
    fn from(category: &GeneratedCategory) -> Self {
        Self {
            id: category.id,
            slug: category.slug.clone(),
        }
    }
}

/// Generates catalog categories.
pub struct CategoryGenerator {
    names: Vec<String>,
}

impl CategoryGenerator {
    /// Creates a generator that cycles through the default names first.
    pub fn new() -> Self {
        Self {
            names: default_category_names(),
        }
    }

    /// Creates a generator with a custom list of names.
    pub fn with_names(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Generates the category with 1-based `index`.
    ///
    /// Names come from the configured list; once it runs out, lorem words
    /// are used instead. Slugs carry the index so they never collide.
    pub fn generate(&self, index: u64, rng: &mut impl Rng) -> GeneratedCategory {
        let id = record_id(rng);
        let name = match self.names.get((index - 1) as usize) {
            Some(name) => name.clone(),
            None => capitalize(&Word().fake_with_rng::<String, _>(rng)),
        };
        let slug = format!("{}-{index}", slugify(&name));
        let description: String = Sentence(6..14).fake_with_rng(rng);

        GeneratedCategory {
            id,
            name,
            slug,
            description,
            position: index as u32,
        }
    }
}

impl Default for CategoryGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn default_category_names() -> Vec<String> {
    [
        "Books",
        "Electronics",
        "Garden",
        "Kitchen",
        "Outdoor",
        "Toys",
        "Music",
        "Sports",
        "Office",
        "Pets",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercase, ASCII-alphanumeric words joined by hyphens.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_default_names_come_first() {
        let category_gen = CategoryGenerator::new();
        let mut rng = StdRng::seed_from_u64(12345);

        let first = category_gen.generate(1, &mut rng);
        assert_eq!(first.name, "Books");
        assert_eq!(first.slug, "books-1");
        assert_eq!(first.position, 1);
        assert!(!first.description.is_empty());
    }

    #[test]
    fn test_falls_back_to_lorem_words() {
        let category_gen = CategoryGenerator::with_names(vec![]);
        let mut rng = StdRng::seed_from_u64(12345);

        let category = category_gen.generate(42, &mut rng);
        assert!(category.slug.ends_with("-42"));
        assert!(category.validate().is_ok());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  Outdoor  "), "outdoor");
    }

    #[test]
    fn test_category_ref_from_category() {
        let category_gen = CategoryGenerator::new();
        let mut rng = StdRng::seed_from_u64(1);
        let category = category_gen.generate(2, &mut rng);

        let reference = CategoryRef::from(&category);
        assert_eq!(reference.id, category.id);
        assert_eq!(reference.slug, "electronics-2");
    }
}

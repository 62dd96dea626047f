use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::from_str;

use crate::error::{SkResult, SkissError};

static ASSET_DIR: Dir = include_dir!("src/assets");

/// The sketchable vocabulary shipped with the game
#[derive(Deserialize, Clone, Debug)]
pub struct Vocabulary {
    pub name: String,
    pub size: u32,
    pub labels: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
struct ResponseFile {
    phrases: Vec<String>,
}

/// Embedded label vocabulary plus the guess-phrase list for the HUD
#[derive(Clone, Debug)]
pub struct LabelBook {
    pub vocabulary: Vocabulary,
    phrases: Vec<String>,
}

impl LabelBook {
    /// Book over an explicit vocabulary, used by tests and custom label sets
    pub fn new(labels: Vec<String>, phrases: Vec<String>) -> Self {
        Self {
            vocabulary: Vocabulary {
                name: "custom".to_string(),
                size: labels.len() as u32,
                labels,
            },
            phrases,
        }
    }

    pub fn load() -> SkResult<Self> {
        let vocabulary: Vocabulary = from_str(asset_str("labels.json")?)?;
        let responses: ResponseFile = from_str(asset_str("responses.json")?)?;
        Ok(Self {
            vocabulary,
            phrases: responses.phrases,
        })
    }

    /// Shuffled, deduplicated target pool with banned labels removed
    pub fn target_pool<R: Rng>(&self, banned: &[String], rng: &mut R) -> Vec<String> {
        let mut pool: Vec<String> = self
            .vocabulary
            .labels
            .iter()
            .unique()
            .filter(|label| !banned.iter().any(|b| b == *label))
            .cloned()
            .collect();
        pool.shuffle(rng);
        pool
    }

    /// Shuffled copy of the guess phrases, cycled by the HUD per target
    pub fn response_pool<R: Rng>(&self, rng: &mut R) -> Vec<String> {
        let mut pool = self.phrases.clone();
        pool.shuffle(rng);
        pool
    }
}

fn asset_str(file_name: &str) -> SkResult<&'static str> {
    ASSET_DIR
        .get_file(file_name)
        .and_then(|f| f.contents_utf8())
        .ok_or_else(|| SkissError::Asset(format!("missing embedded asset {file_name}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_book() -> LabelBook {
        LabelBook {
            vocabulary: Vocabulary {
                name: "test".to_string(),
                size: 4,
                labels: vec![
                    "cat".to_string(),
                    "dog".to_string(),
                    "cat".to_string(),
                    "zigzag".to_string(),
                ],
            },
            phrases: vec!["I see".to_string(), "Looks like".to_string()],
        }
    }

    #[test]
    fn test_load_embedded_assets() {
        let book = LabelBook::load().unwrap();
        assert_eq!(book.vocabulary.name, "doodle");
        assert_eq!(book.vocabulary.size as usize, book.vocabulary.labels.len());
        assert!(!book.phrases.is_empty());
    }

    #[test]
    fn test_target_pool_excludes_banned() {
        let book = test_book();
        let banned = vec!["zigzag".to_string()];
        let mut rng = StdRng::seed_from_u64(7);
        let pool = book.target_pool(&banned, &mut rng);
        assert!(!pool.contains(&"zigzag".to_string()));
        assert!(pool.contains(&"cat".to_string()));
        assert!(pool.contains(&"dog".to_string()));
    }

    #[test]
    fn test_target_pool_deduplicates() {
        let book = test_book();
        let mut rng = StdRng::seed_from_u64(7);
        let pool = book.target_pool(&[], &mut rng);
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.iter().filter(|l| *l == "cat").count(), 1);
    }

    #[test]
    fn test_target_pool_seeded_rng_is_deterministic() {
        let book = LabelBook::load().unwrap();
        let a = book.target_pool(&[], &mut StdRng::seed_from_u64(42));
        let b = book.target_pool(&[], &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_response_pool_keeps_all_phrases() {
        let book = test_book();
        let mut rng = StdRng::seed_from_u64(1);
        let mut pool = book.response_pool(&mut rng);
        pool.sort();
        assert_eq!(pool, vec!["I see".to_string(), "Looks like".to_string()]);
    }

    #[test]
    fn test_default_banned_labels_exist_in_vocabulary() {
        let book = LabelBook::load().unwrap();
        for banned in crate::config::Config::default().banned_labels {
            assert!(
                book.vocabulary.labels.contains(&banned),
                "banned label {banned} not in vocabulary"
            );
        }
    }
}

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::scanner::Catalog;

/// Random picker that avoids repeating the previous pick
pub struct Shuffler<R: Rng = StdRng> {
    rng: R,
    last_played: Option<String>,
}

impl Shuffler<StdRng> {
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> Shuffler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            last_played: None,
        }
    }

    pub fn last_played(&self) -> Option<&str> {
        self.last_played.as_deref()
    }

    /// Pick the next file and remember it as last played.
    ///
    /// With a single entry that entry is always returned, even if it was just played.
    pub fn pick(&mut self, catalog: &Catalog) -> Option<String> {
        let files = catalog.files();
        let selected = match files {
            [] => return None,
            [only] => only.clone(),
            _ => {
                let mut available: Vec<&String> = files
                    .iter()
                    .filter(|f| Some(f.as_str()) != self.last_played.as_deref())
                    .collect();
                if available.is_empty() {
                    available = files.iter().collect();
                }
                (*available.choose(&mut self.rng)?).clone()
            }
        };

        self.last_played = Some(selected.clone());
        Some(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::new("mp3", names.iter().map(|n| n.to_string()).collect())
    }

    fn seeded() -> Shuffler<StdRng> {
        Shuffler::with_rng(StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_empty_catalog_picks_nothing() {
        let mut shuffler = seeded();
        assert_eq!(shuffler.pick(&catalog(&[])), None);
        assert_eq!(shuffler.last_played(), None);
    }

    #[test]
    fn test_single_file_always_returned() {
        let mut shuffler = seeded();
        let catalog = catalog(&["only.mp3"]);
        for _ in 0..10 {
            assert_eq!(shuffler.pick(&catalog).as_deref(), Some("only.mp3"));
        }
    }

    #[test]
    fn test_never_repeats_consecutively() {
        let mut shuffler = seeded();
        let catalog = catalog(&["a.mp3", "b.mp3"]);
        let mut previous = shuffler.pick(&catalog).unwrap();
        for _ in 0..200 {
            let next = shuffler.pick(&catalog).unwrap();
            assert_ne!(next, previous);
            assert_eq!(shuffler.last_played(), Some(next.as_str()));
            previous = next;
        }
    }

    #[test]
    fn test_covers_all_other_files_evenly() {
        let catalog = catalog(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut shuffler = seeded();
        let trials = 4000;

        for _ in 0..trials {
            shuffler.last_played = Some("a.mp3".to_string());
            let pick = shuffler.pick(&catalog).unwrap();
            *counts.entry(pick).or_default() += 1;
        }

        assert_eq!(counts.get("a.mp3"), None);
        for name in ["b.mp3", "c.mp3"] {
            let share = counts[name] as f64 / trials as f64;
            assert!((share - 0.5).abs() < 0.05, "{} picked {:.3}", name, share);
        }
    }

    #[test]
    fn test_unknown_last_played_allows_every_file() {
        let catalog = catalog(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut shuffler = seeded();
        let mut seen = std::collections::HashSet::new();

        for _ in 0..300 {
            shuffler.last_played = Some("gone.mp3".to_string());
            seen.insert(shuffler.pick(&catalog).unwrap());
        }
        assert_eq!(seen.len(), 3);
    }
}

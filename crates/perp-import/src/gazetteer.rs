//! Resolve free-text place descriptions to country, state, and location.
//!
//! The catalogue is TOML, one `[[country]]` table per country:
//!
//! ```toml
//! [[country]]
//! name       = "United States"
//! variations = ["USA", "US"]
//! states     = ["California", "Oregon/South Idaho"]
//!
//! [country.state_variations]
//! CA = "California"
//!
//! [country.cities]
//! Provo = ["Utah"]
//! ```
//!
//! Matching is case-sensitive and on whole words; a name is bounded by
//! whitespace, punctuation, or the ends of the text.

use std::{collections::BTreeMap, path::Path};

use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::Result;

const BUNDLED: &str = include_str!("../data/gazetteer.toml");

/// Compass abbreviations expanded before matching, e.g. `N. Dakota`.
const DIRECTIONS: &[(&str, &str)] = &[
  ("NW", "Northwest"),
  ("NE", "Northeast"),
  ("SW", "Southwest"),
  ("SE", "Southeast"),
  ("N", "North"),
  ("S", "South"),
  ("E", "East"),
  ("W", "West"),
];

// ─── Catalogue ───────────────────────────────────────────────────────────────

/// One country as written in the catalogue file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryEntry {
  pub name:             String,
  /// Alternative spellings and abbreviations of the country name.
  #[serde(default)]
  pub variations:       Vec<String>,
  #[serde(default)]
  pub states:           Vec<String>,
  /// Alias → canonical state name.
  #[serde(default)]
  pub state_variations: BTreeMap<String, String>,
  /// City → states containing a city of that name.
  #[serde(default)]
  pub cities:           BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Catalogue {
  #[serde(default)]
  country: Vec<CountryEntry>,
}

// ─── Result ──────────────────────────────────────────────────────────────────

/// What a piece of text was resolved to. Any part may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
  pub country:  Option<String>,
  pub state:    Option<String>,
  pub location: Option<String>,
}

// ─── Gazetteer ───────────────────────────────────────────────────────────────

/// A whole-word pattern that resolves to a canonical name.
#[derive(Debug)]
struct Matcher {
  pattern:   Regex,
  /// Length of the matched text; longer wins at equal positions.
  len:       usize,
  canonical: String,
  country:   usize,
}

impl Matcher {
  fn new(text: &str, canonical: &str, country: usize) -> Result<Self> {
    Ok(Self {
      pattern: Regex::new(&format!(r"(?:^|\W)({})(?:\W|$)", regex::escape(text)))?,
      len: text.len(),
      canonical: canonical.to_owned(),
      country,
    })
  }

  /// Byte offset of the first whole-word occurrence in `text`.
  fn find(&self, text: &str) -> Option<usize> {
    self
      .pattern
      .captures(text)
      .and_then(|c| c.get(1))
      .map(|m| m.start())
  }
}

/// A compiled place catalogue.
#[derive(Debug)]
pub struct Gazetteer {
  countries:  Vec<CountryEntry>,
  country_re: Vec<Matcher>,
  state_re:   Vec<Matcher>,
  directions: Vec<(Regex, &'static str)>,
}

impl Gazetteer {
  /// The catalogue shipped with this crate.
  pub fn bundled() -> Result<Self> { Self::from_toml(BUNDLED) }

  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let raw = std::fs::read_to_string(path)?;
    Self::from_toml(&raw)
  }

  pub fn from_toml(raw: &str) -> Result<Self> {
    let catalogue: Catalogue = toml::from_str(raw)?;
    Self::new(catalogue.country)
  }

  pub fn new(countries: Vec<CountryEntry>) -> Result<Self> {
    let mut country_re = Vec::new();
    let mut state_re = Vec::new();

    for (i, entry) in countries.iter().enumerate() {
      country_re.push(Matcher::new(&entry.name, &entry.name, i)?);
      for variation in entry.variations.iter().filter(|v| !v.is_empty()) {
        country_re.push(Matcher::new(variation, &entry.name, i)?);
      }
      for state in entry.states.iter().filter(|s| !s.is_empty()) {
        state_re.push(Matcher::new(state, state, i)?);
      }
      for (alias, state) in entry.state_variations.iter().filter(|(a, _)| !a.is_empty()) {
        state_re.push(Matcher::new(alias, state, i)?);
      }
    }

    let directions = DIRECTIONS
      .iter()
      .map(|(abbr, word)| -> Result<(Regex, &'static str)> {
        Ok((Regex::new(&format!(r"\b{abbr}\.?\s+"))?, *word))
      })
      .collect::<Result<_>>()?;

    Ok(Self { countries, country_re, state_re, directions })
  }

  pub fn countries(&self) -> &[CountryEntry] { &self.countries }

  /// The catalogue name for `name`, which may be the name itself or one of its
  /// variations. Comparison ignores ASCII case.
  pub fn canonical_country(&self, name: &str) -> Option<&str> {
    let name = name.trim();
    self
      .countries
      .iter()
      .find(|c| {
        c.name.eq_ignore_ascii_case(name)
          || c.variations.iter().any(|v| v.eq_ignore_ascii_case(name))
      })
      .map(|c| c.name.as_str())
  }

  /// Resolve `text` to the most specific placement the catalogue supports.
  pub fn resolve(&self, text: &str) -> Placement {
    let text = self.expand_directions(text);

    let country = earliest(&self.country_re, &text, |_| true).map(|m| m.country);
    let state = earliest(&self.state_re, &text, |m| {
      country.is_none_or(|c| c == m.country)
    });
    let country = country.or(state.map(|m| m.country));

    let mut placement = Placement {
      country:  country.map(|i| self.countries[i].name.clone()),
      state:    state.map(|m| m.canonical.clone()),
      location: None,
    };

    if let Some((city, state_name, country_idx)) =
      self.find_city(&text, country, placement.state.as_deref())
    {
      placement.location = Some(city);
      placement.state = state_name;
      placement.country = Some(self.countries[country_idx].name.clone());
    }

    debug!(input = %text, ?placement, "resolved place");
    placement
  }

  fn expand_directions(&self, text: &str) -> String {
    self
      .directions
      .iter()
      .fold(text.to_owned(), |acc, (re, word)| {
        re.replace_all(&acc, format!("{word} ").as_str()).into_owned()
      })
  }

  /// Scan left to right for the longest run of up to five words naming a
  /// city in scope. Returns the city, its state, and its country index.
  fn find_city(
    &self,
    text: &str,
    country: Option<usize>,
    state: Option<&str>,
  ) -> Option<(String, Option<String>, usize)> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let scope: Vec<usize> = match country {
      Some(i) => vec![i],
      None => (0..self.countries.len()).collect(),
    };

    for i in 0..words.len() {
      for count in (1..=5).rev() {
        if i + count > words.len() {
          continue;
        }
        let joined = words[i..i + count].join(" ");
        let candidate = joined.trim_end_matches(',');

        if state.is_some_and(|s| s.contains(candidate)) {
          continue;
        }

        for &idx in &scope {
          let Some(states) = self.countries[idx].cities.get(candidate) else {
            continue;
          };
          let chosen = match state {
            Some(s) if states.iter().any(|st| st == s) => Some(s.to_owned()),
            Some(_) => continue,
            None => states.first().cloned(),
          };
          return Some((candidate.to_owned(), chosen, idx));
        }
      }
    }
    None
  }
}

/// Earliest match among `matchers` accepted by `filter`; the longest wins a
/// tie on position.
fn earliest<'m>(
  matchers: &'m [Matcher],
  text: &str,
  filter: impl Fn(&Matcher) -> bool,
) -> Option<&'m Matcher> {
  matchers
    .iter()
    .filter(|m| filter(m))
    .filter_map(|m| m.find(text).map(|pos| (pos, m)))
    .min_by(|(pa, a), (pb, b)| pa.cmp(pb).then(b.len.cmp(&a.len)))
    .map(|(_, m)| m)
}

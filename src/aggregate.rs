use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::oa_structs::{GroupByResponse, Work};

/// ISO country code to display name. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CountryCodeTable {
    names: HashMap<String, String>,
}

impl CountryCodeTable {
    pub fn from_group_by(response: GroupByResponse) -> Self {
        response
            .group_by
            .into_iter()
            .map(|item| (item.key, item.key_display_name))
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for CountryCodeTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Author display name to country display name for a single work.
///
/// Entries keep first-insertion order. Inserting an author that is already
/// present replaces the country in place, so two co-authors sharing a display
/// name collapse into one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct AuthorCountryRecord {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
}

impl AuthorCountryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, author: String, country: String) {
        match self.positions.get(&author) {
            Some(&i) => self.entries[i].1 = country,
            None => {
                self.positions.insert(author.clone(), self.entries.len());
                self.entries.push((author, country));
            }
        }
    }

    pub fn get(&self, author: &str) -> Option<&str> {
        self.positions
            .get(author)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(a, c)| (a.as_str(), c.as_str()))
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.entries.iter().any(|(_, c)| c == country)
    }

    /// Distinct countries with their author counts, in first-seen order.
    pub fn country_counts(&self) -> Vec<(&str, usize)> {
        let mut out: Vec<(&str, usize)> = Vec::new();
        for (_, country) in self.iter() {
            match out.iter_mut().find(|(c, _)| *c == country) {
                Some((_, n)) => *n += 1,
                None => out.push((country, 1)),
            }
        }
        out
    }

    pub fn countries(&self) -> Vec<&str> {
        self.country_counts().into_iter().map(|(c, _)| c).collect()
    }
}

impl From<Vec<(String, String)>> for AuthorCountryRecord {
    fn from(value: Vec<(String, String)>) -> Self {
        let mut rec = Self::new();
        for (author, country) in value {
            rec.insert(author, country);
        }
        rec
    }
}

impl From<AuthorCountryRecord> for Vec<(String, String)> {
    fn from(value: AuthorCountryRecord) -> Self {
        value.entries
    }
}

impl<A, C> FromIterator<(A, C)> for AuthorCountryRecord
where
    A: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        let mut rec = Self::new();
        for (a, c) in iter {
            rec.insert(a.into(), c.into());
        }
        rec
    }
}

pub fn record_for_work(work: &Work, table: &CountryCodeTable) -> AuthorCountryRecord {
    let mut rec = AuthorCountryRecord::new();
    for authorship in work.authorships.iter() {
        let name = match &authorship.author_name {
            Some(name) => name,
            None => continue,
        };
        if let Some(country) = authorship
            .first_country_code()
            .and_then(|code| table.get(code))
        {
            rec.insert(name.clone(), country.to_string());
        }
    }
    rec
}

/// One record per work with at least one resolvable author, in input order.
pub fn aggregate<'a, I>(works: I, table: &CountryCodeTable) -> Vec<AuthorCountryRecord>
where
    I: IntoIterator<Item = &'a Work>,
{
    let mut out = Vec::new();
    let mut skipped = 0;
    for work in works {
        let rec = record_for_work(work, table);
        if rec.is_empty() {
            skipped += 1;
        } else {
            out.push(rec);
        }
    }
    debug!(kept = out.len(), skipped, "aggregated works");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CountryCodeTable {
        vec![("IN", "India"), ("BR", "Brazil"), ("FR", "France")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn work(json: serde_json::Value) -> Work {
        serde_json::from_value(json).unwrap()
    }

    fn authorship(name: &str, codes: &[&str]) -> serde_json::Value {
        let insts: Vec<serde_json::Value> = codes
            .iter()
            .map(|c| serde_json::json!({"id": "I", "country_code": c}))
            .collect();
        serde_json::json!({"author": {"display_name": name}, "institutions": insts})
    }

    #[test]
    fn table_from_group_by() {
        let resp: GroupByResponse = serde_json::from_value(serde_json::json!({
            "group_by": [
                {"key": "IN", "key_display_name": "India"},
                {"key": "KE", "key_display_name": "Kenya"}
            ]
        }))
        .unwrap();
        let t = CountryCodeTable::from_group_by(resp);
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("KE"), Some("Kenya"));
        assert_eq!(t.get("US"), None);
    }

    #[test]
    fn missing_institutions_contribute_nothing() {
        let w = work(serde_json::json!({
            "id": "W1",
            "publication_year": 2020,
            "authorships": [
                {"author": {"display_name": "no key"}},
                {"author": {"display_name": "null"}, "institutions": null},
                authorship("empty", &[]),
                authorship("kept", &["IN"]),
            ]
        }));
        let rec = record_for_work(&w, &table());
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.get("kept"), Some("India"));
        assert_eq!(rec.get("empty"), None);
    }

    #[test]
    fn only_first_institution_counts() {
        let w = work(serde_json::json!({
            "id": "W1",
            "authorships": [authorship("a", &["US", "IN"]), authorship("b", &["BR", "IN"])]
        }));
        let rec = record_for_work(&w, &table());
        assert_eq!(rec.get("a"), None);
        assert_eq!(rec.get("b"), Some("Brazil"));
    }

    #[test]
    fn duplicate_names_last_wins() {
        let w = work(serde_json::json!({
            "id": "W1",
            "authorships": [
                authorship("Wei Zhang", &["IN"]),
                authorship("x", &["FR"]),
                authorship("Wei Zhang", &["BR"])
            ]
        }));
        let rec = record_for_work(&w, &table());
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.get("Wei Zhang"), Some("Brazil"));
        assert_eq!(rec.iter().next(), Some(("Wei Zhang", "Brazil")));
    }

    #[test]
    fn unresolvable_works_dropped_order_kept() {
        let works = vec![
            work(serde_json::json!({"id": "W1", "authorships": [authorship("a", &["FR"])]})),
            work(serde_json::json!({"id": "W2", "authorships": [authorship("b", &["US"])]})),
            work(serde_json::json!({"id": "W3", "authorships": []})),
            work(serde_json::json!({"id": "W4", "authorships": [authorship("c", &["IN"])]})),
        ];
        let recs = aggregate(works.iter(), &table());
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].get("a"), Some("France"));
        assert_eq!(recs[1].get("c"), Some("India"));
    }

    #[test]
    fn counts_in_first_seen_order() {
        let rec: AuthorCountryRecord =
            vec![("a", "B"), ("b", "A"), ("c", "B")].into_iter().collect();
        assert_eq!(rec.country_counts(), vec![("B", 2), ("A", 1)]);
        assert!(rec.contains_country("A"));
        assert!(!rec.contains_country("C"));
    }

    #[test]
    fn serializes_as_pairs() {
        let rec: AuthorCountryRecord = vec![("a", "India"), ("b", "France")].into_iter().collect();
        let s = serde_json::to_string(&rec).unwrap();
        assert_eq!(s, r#"[["a","India"],["b","France"]]"#);
        let back: AuthorCountryRecord = serde_json::from_str(&s).unwrap();
        assert_eq!(back, rec);
    }
}

use serde::{Deserialize, Deserializer};

// STRUCTS

#[derive(Deserialize, Debug, Clone)]
pub struct Work {
    pub id: String,
    pub publication_year: Option<u16>,
    #[serde(default, deserialize_with = "deserialize_null_list")]
    pub authorships: Vec<Authorship>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Authorship {
    #[serde(default, deserialize_with = "deserialize_name_field", rename = "author")]
    pub author_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_list")]
    pub institutions: Vec<InstitutionRef>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct InstitutionRef {
    pub country_code: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct WorksPage {
    pub meta: PageMeta,
    #[serde(default)]
    pub results: Vec<Work>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PageMeta {
    pub next_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct GroupByResponse {
    #[serde(default)]
    pub group_by: Vec<GroupByItem>,
}

#[derive(Deserialize, Debug)]
pub struct GroupByItem {
    pub key: String,
    pub key_display_name: String,
}

#[derive(Deserialize)]
struct NameStruct {
    display_name: Option<String>,
}

impl Authorship {
    /// Country code of the first listed institution; later affiliations are ignored.
    pub fn first_country_code(&self) -> Option<&str> {
        self.institutions
            .first()
            .and_then(|inst| inst.country_code.as_deref())
    }
}

fn deserialize_name_field<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let name_o = Option::<NameStruct>::deserialize(deserializer)?;
    Ok(name_o.and_then(|n| n.display_name))
}

fn deserialize_null_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_work() {
        let work: Work = serde_json::from_str(
            r#"{
                "id": "https://openalex.org/W1",
                "publication_year": 2019,
                "authorships": [
                    {"author": {"id": "A1", "display_name": "Ana"}, "author_position": "first",
                     "institutions": [
                        {"id": "I1", "display_name": "USP", "country_code": "BR"},
                        {"id": "I2", "display_name": "Lisboa", "country_code": "PT"}
                     ]},
                    {"author": {"id": "A2", "display_name": "Raj"}, "institutions": []},
                    {"author": {"id": "A3", "display_name": "Kofi"}},
                    {"author": {"id": "A4", "display_name": "Li"}, "institutions": null},
                    {"author": null, "institutions": [{"id": "I3", "country_code": null}]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(work.publication_year, Some(2019));
        assert_eq!(work.authorships.len(), 5);
        let codes: Vec<Option<&str>> = work
            .authorships
            .iter()
            .map(|a| a.first_country_code())
            .collect();
        assert_eq!(codes, vec![Some("BR"), None, None, None, None]);
        assert_eq!(work.authorships[0].author_name.as_deref(), Some("Ana"));
        assert_eq!(work.authorships[4].author_name, None);
    }

    #[test]
    fn parses_sparse_work() {
        let work: Work = serde_json::from_str(r#"{"id": "W2", "publication_year": null}"#).unwrap();
        assert_eq!(work.publication_year, None);
        assert!(work.authorships.is_empty());
    }

    #[test]
    fn parses_page_with_extra_meta() {
        let page: WorksPage = serde_json::from_str(
            r#"{"meta": {"count": 2, "db_response_time_ms": 5, "page": null, "per_page": 25,
                         "next_cursor": "IlsxNjA5"},
                "results": [{"id": "W3", "publication_year": 2020, "authorships": []}],
                "group_by": []}"#,
        )
        .unwrap();
        assert_eq!(page.meta.next_cursor.as_deref(), Some("IlsxNjA5"));
        assert_eq!(page.results.len(), 1);

        let last: WorksPage =
            serde_json::from_str(r#"{"meta": {"count": 0, "next_cursor": null}}"#).unwrap();
        assert!(last.meta.next_cursor.is_none());
        assert!(last.results.is_empty());
    }

    #[test]
    fn parses_group_by() {
        let resp: GroupByResponse = serde_json::from_str(
            r#"{"meta": {"count": 10}, "group_by": [
                {"key": "IN", "key_display_name": "India", "count": 7},
                {"key": "BR", "key_display_name": "Brazil", "count": 3}
            ]}"#,
        )
        .unwrap();
        assert_eq!(resp.group_by.len(), 2);
        assert_eq!(resp.group_by[0].key_display_name, "India");
    }
}

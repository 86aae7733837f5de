use std::{
    fs::{create_dir_all, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

pub const WORKS: &str = "works";
pub const AUTHORS: &str = "authors";

pub const RECORDS: &str = "records";
pub const FULL_STEM: &str = "coauthors";
pub const EGO_PREFIX: &str = "ego";

pub const ID_PREFIX: &str = "https://openalex.org/";
pub const API_BASE: &str = "https://api.openalex.org";
pub const MAX_PER_PAGE: usize = 200;

macro_rules! pathfields_fn {
    ($($k:ident => $v:literal),*,) => {

        pub fn new<P: AsRef<Path>>(root_path: P) -> io::Result<Self> {
            $(
                let $k = root_path.as_ref().join($v);
                create_dir_all(&$k)?;
            )*

            Ok(Self {
                $(
                    $k,
                )*
            })
        }
    };
}

pub struct Stowage {
    pub records: PathBuf,
    pub graphs: PathBuf,
}

impl Stowage {
    pathfields_fn!(
        records => "records",
        graphs => "graphs",
    );

    pub fn records_path(&self) -> PathBuf {
        self.records.join(RECORDS).with_extension("json.gz")
    }

    pub fn graph_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.graphs.join(stem).with_extension(extension)
    }
}

/// Accepts both `S13479253` and `https://openalex.org/S13479253`.
pub fn short_oa_id(id: &str) -> &str {
    id.strip_prefix(ID_PREFIX).unwrap_or(id).trim_matches('/')
}

/// File-name friendly form of a country name, used for ego outputs.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

pub fn deserialize_verbose<T: DeserializeOwned>(s: &str, what: &str) -> Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_str(s);
    serde_path_to_error::deserialize(deserializer).map_err(|err| Error::Decode {
        what: what.to_string(),
        path: err.path().to_string(),
        source: err.into_inner(),
    })
}

pub fn get_gz_buf(path: &Path) -> io::Result<BufReader<GzDecoder<File>>> {
    let file = File::open(path)?;
    Ok(BufReader::new(GzDecoder::new(file)))
}

pub fn write_gz<T>(out_path: &Path, obj: &T) -> Result<()>
where
    T: Serialize,
{
    let out_file = File::create(out_path)?;
    let encoder = GzEncoder::new(out_file, Compression::default());
    let mut writer = BufWriter::new(encoder);
    serde_json::to_writer(&mut writer, obj)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| e.into_error())?
        .finish()?;
    Ok(())
}

pub fn read_gz<T>(in_path: &Path, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut buf = String::new();
    get_gz_buf(in_path)?.read_to_string(&mut buf)?;
    deserialize_verbose(&buf, what)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix() {
        assert_eq!(short_oa_id("https://openalex.org/S13479253"), "S13479253");
        assert_eq!(short_oa_id("S13479253"), "S13479253");
    }

    #[test]
    fn slugs() {
        assert_eq!(slug("India"), "india");
        assert_eq!(slug("Côte d'Ivoire"), "côte-d-ivoire");
        assert_eq!(slug("  Papua New Guinea "), "papua-new-guinea");
    }

    #[test]
    fn verbose_error_has_path() {
        #[derive(serde::Deserialize, Debug)]
        struct Inner {
            #[allow(dead_code)]
            year: u16,
        }
        #[derive(serde::Deserialize, Debug)]
        struct Outer {
            #[allow(dead_code)]
            inner: Vec<Inner>,
        }
        let body = r#"{"inner": [{"year": 1}, {"year": "x"}]}"#;
        let err = deserialize_verbose::<Outer>(body, "outer").unwrap_err();
        match err {
            Error::Decode { what, path, .. } => {
                assert_eq!(what, "outer");
                assert_eq!(path, "inner[1].year");
            }
            e => panic!("wrong error {e:?}"),
        }
    }

    #[test]
    fn gz_back_and_forth() {
        let dir = tempfile::tempdir().unwrap();
        let stowage = Stowage::new(dir.path()).unwrap();
        let p = stowage.records_path();
        let v = vec![("a".to_string(), 3u8), ("b".to_string(), 1)];
        write_gz(&p, &v).unwrap();
        let back: Vec<(String, u8)> = read_gz(&p, "pairs").unwrap();
        assert_eq!(v, back);
        assert!(p.to_str().unwrap().ends_with("records/records.json.gz"));
    }
}

use std::path::PathBuf;

use anyhow::{bail, Context};
use itertools::Itertools;
use serde::{de::{Error, MapAccess, Visitor}, Deserialize, Deserializer};

/// A program from `test_inputs/` together with what running it should do,
/// as described by the matching file in `test_outputs/`.
#[derive(Debug)]
pub struct Fixture {
    pub source: String,
    pub input: String,
    /// Output lines on success, error variant name on failure.
    pub expected: Result<Vec<String>, String>,
}

struct Expectation {
    input: Vec<String>,
    expected: Result<Vec<String>, String>,
}

struct ExpectationVisitor {}

impl<'de> Deserialize<'de> for Expectation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de> {

        deserializer.deserialize_map(ExpectationVisitor {})
    }
}

impl<'de> Visitor<'de> for ExpectationVisitor {
    type Value = Expectation;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(formatter, "A structure starting with the boolean key 'ok', an optional 'input' list, and either 'output' lines or an error 'type'")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>, {

        if map.next_key::<String>()? != Some("ok".to_owned()) {
            return Err(A::Error::custom("First key should be 'ok'"))
        }
        let ok: bool = map.next_value()?;

        let mut input = Vec::new();
        let mut output = None;
        let mut error_type = None;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "input" => input = map.next_value()?,
                "output" if ok => output = Some(map.next_value::<Vec<String>>()?),
                "type" if !ok => error_type = Some(map.next_value::<String>()?),
                other => return Err(A::Error::custom(format!("Unexpected key '{}' (ok = {})", other, ok))),
            }
        }

        let expected = match (ok, output, error_type) {
            (true, Some(output), _) => Ok(output),
            (false, _, Some(error_type)) => Err(error_type),
            (true, None, _) => return Err(A::Error::custom("Passing fixtures need an 'output' key")),
            (false, _, None) => return Err(A::Error::custom("Failing fixtures need a 'type' key")),
        };

        Ok(Expectation { input, expected })
    }
}

fn base_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn load_fixture(name: &str) -> anyhow::Result<Fixture> {
    let source_path = base_path().join("test_inputs").join(format!("{}.jif", name));
    let expectation_path = base_path().join("test_outputs").join(format!("{}.json", name));

    let source = std::fs::read_to_string(&source_path)
        .with_context(|| format!("reading {}", source_path.display()))?;
    let expectation: Expectation = serde_json::from_slice(&std::fs::read(&expectation_path)?)
        .with_context(|| format!("decoding {}", expectation_path.display()))?;

    let input = expectation.input.iter().map(|line| format!("{}\n", line)).join("");
    Ok(Fixture { source, input, expected: expectation.expected })
}

pub fn all_fixtures() -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in std::fs::read_dir(base_path().join("test_inputs"))? {
        let path = entry?.path();
        if path.extension().is_some_and(|extension| extension == "jif") {
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => names.push(stem.to_owned()),
                None => bail!("Fixture with an unreadable name: {}", path.display()),
            }
        }
    }

    if names.is_empty() { bail!("No fixtures found in test_inputs"); }
    Ok(names.into_iter().sorted().collect())
}

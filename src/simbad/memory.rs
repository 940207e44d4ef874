//! In-memory object database

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use super::{ObjectDatabase, ObjectRow};
use crate::outcome::{AttributeSet, AttributeValue};
use crate::Result;
use crate::StarqueryError;

#[derive(Debug, Clone)]
struct MemoryObject {
    main_id: String,
    ra: f64,
    dec: f64,
    attributes: HashMap<String, AttributeValue>,
}

/// An `ObjectDatabase` answering from objects added at construction
///
/// Aliases map to main identifiers; attributes missing from an object come
/// back absent. Individual names can be made to fail, and the whole batch
/// call can be switched off, to exercise the error paths.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    objects: Vec<MemoryObject>,
    aliases: HashMap<String, String>,
    failing: HashSet<String>,
    batch_fails: bool,
    batch_calls: Cell<usize>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object with its position and magnitudes
    pub fn with_object(
        mut self,
        main_id: &str,
        ra: f64,
        dec: f64,
        attributes: &[(&str, AttributeValue)],
    ) -> Self {
        self.aliases.insert(main_id.to_string(), main_id.to_string());
        self.objects.push(MemoryObject {
            main_id: main_id.to_string(),
            ra,
            dec,
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
        self
    }

    /// Make `alias` resolve to `main_id`
    pub fn with_alias(mut self, alias: &str, main_id: &str) -> Self {
        self.aliases.insert(alias.to_string(), main_id.to_string());
        self
    }

    /// Make every lookup of `name` fail
    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Make every multi-identifier batch call fail
    pub fn with_failing_batch(mut self) -> Self {
        self.batch_fails = true;
        self
    }

    /// Number of `query_objects` calls made so far
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.get()
    }

    fn check(&self, name: &str) -> Result<()> {
        if self.failing.contains(name) {
            return Err(StarqueryError::RemoteError(format!(
                "simulated failure for {}",
                name
            )));
        }
        Ok(())
    }

    fn object(&self, main_id: &str) -> Option<&MemoryObject> {
        self.objects.iter().find(|o| o.main_id == main_id)
    }

    fn attribute(object: &MemoryObject, field: &str) -> Option<AttributeValue> {
        match field {
            "main_id" => Some(AttributeValue::Text(object.main_id.clone())),
            "ra" => Some(AttributeValue::Number(object.ra)),
            "dec" => Some(AttributeValue::Number(object.dec)),
            _ => object.attributes.get(field).cloned(),
        }
    }
}

impl ObjectDatabase for MemoryDatabase {
    fn query_object_ids(&self, identifier: &str) -> Result<Vec<String>> {
        self.check(identifier)?;
        Ok(self.aliases.get(identifier).cloned().into_iter().collect())
    }

    fn query_region(&self, ra_deg: f64, dec_deg: f64, radius_arcsec: f64) -> Result<Vec<String>> {
        let radius_deg = radius_arcsec / 3600.0;
        Ok(self
            .objects
            .iter()
            .filter(|o| {
                let d_ra = (o.ra - ra_deg) * dec_deg.to_radians().cos();
                let d_dec = o.dec - dec_deg;
                (d_ra * d_ra + d_dec * d_dec).sqrt() <= radius_deg
            })
            .map(|o| o.main_id.clone())
            .collect())
    }

    fn query_objects(&self, identifiers: &[String], fields: &[String]) -> Result<Vec<ObjectRow>> {
        self.batch_calls.set(self.batch_calls.get() + 1);
        if self.batch_fails && identifiers.len() > 1 {
            return Err(StarqueryError::RemoteError("batch query timed out".to_string()));
        }

        let mut rows = Vec::new();
        for id in identifiers {
            self.check(id)?;
            let object = match self.aliases.get(id).and_then(|m| self.object(m)) {
                Some(object) => object,
                None => continue,
            };
            let mut attributes = AttributeSet::new();
            for field in fields {
                attributes.insert(field.as_str(), Self::attribute(object, field));
            }
            rows.push(ObjectRow {
                query_id: id.clone(),
                attributes,
            });
        }
        Ok(rows)
    }
}

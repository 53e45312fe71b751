use std::collections::{btree_map::Entry, BTreeMap, HashSet};

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate, TimeZone};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::calendar::{
    date_key::{rekey_in, DateKey},
    YearMonth,
};

use super::{
    entities::{DayRecordEntity, StoredRecord},
    key_value::KeyValueStore,
    records::DayRecord,
};

/// Entry of the key-value store holding the `DateKey -> record` mapping.
pub const ACTIVITIES_KEY: &str = "activities";

/// Mapping from day to what was recorded on it. The store is the only writer of
/// [ACTIVITIES_KEY] and writes the whole mapping back after every change.
pub struct ActivityStore<S: KeyValueStore> {
    records: BTreeMap<DateKey, StoredRecord>,
    backend: S,
}

impl<S: KeyValueStore> ActivityStore<S> {
    pub fn empty(backend: S) -> Self {
        Self {
            records: BTreeMap::new(),
            backend,
        }
    }

    /// Hydrates the store, migrating older record shapes and keys in the local time zone.
    pub fn load(backend: S) -> Result<Self> {
        Self::load_in(backend, &Local)
    }

    /// Hydrates the store and immediately writes the migrated mapping back, so that every stale
    /// entry is migrated at most once.
    #[instrument(skip_all)]
    pub fn load_in<Tz: TimeZone>(backend: S, tz: &Tz) -> Result<Self> {
        let Some(raw) = backend.load(ACTIVITIES_KEY)? else {
            debug!("No activities persisted yet");
            return Ok(Self::empty(backend));
        };

        let records = match raw {
            Value::Object(entries) => migrate_in(&entries, tz),
            other => {
                warn!("Activities should be an object, found {other}. Dropping them");
                BTreeMap::new()
            }
        };

        let store = Self { records, backend };
        store.persist()?;
        info!("Loaded {} day records", store.records.len());
        Ok(store)
    }

    pub fn get(&self, date: NaiveDate) -> DayRecord {
        self.records
            .get(&DateKey::from(date))
            .cloned()
            .map(DayRecord::from)
            .unwrap_or_default()
    }

    /// Replaces what was recorded for `date`.
    ///
    /// Vacation drops any project entries. Project lists are reduced to their valid entries and a
    /// list that ends up empty removes the day altogether, as does [DayRecord::Empty].
    #[instrument(skip(self, record))]
    pub fn set(&mut self, date: NaiveDate, record: DayRecord) -> Result<()> {
        let key = DateKey::from(date);
        let previous_extra = match self.records.get(&key) {
            Some(StoredRecord::Structured(entity)) => entity.extra.clone(),
            _ => Map::new(),
        };

        let entity = match record {
            DayRecord::Empty => None,
            DayRecord::Vacation { hours } => {
                if !hours.is_finite() || hours < 0. {
                    bail!("Vacation hours should be a non negative number, got {hours}");
                }
                Some(DayRecordEntity::vacation(hours))
            }
            DayRecord::Projects { entries } => {
                let entries = entries
                    .into_iter()
                    .filter(|v| v.is_valid())
                    .collect::<Vec<_>>();
                let mut seen = HashSet::new();
                if let Some(duplicate) = entries.iter().find(|v| !seen.insert(&v.project_id)) {
                    bail!(
                        "Project {} is recorded more than once on {key}",
                        duplicate.project_id
                    );
                }
                (!entries.is_empty()).then(|| DayRecordEntity::projects(entries))
            }
            DayRecord::LegacyText { .. } => {
                bail!("Free text records are read only, record projects or vacation instead")
            }
        };

        match entity {
            Some(entity) => {
                debug!("Storing {key}");
                self.records.insert(
                    key,
                    StoredRecord::Structured(DayRecordEntity {
                        extra: previous_extra,
                        ..entity
                    }),
                );
            }
            None => {
                debug!("Nothing valid left for {key}, removing it");
                self.records.remove(&key);
            }
        }

        self.persist()
    }

    /// Days of `month` that have anything recorded, in chronological order.
    pub fn records_in(
        &self,
        month: YearMonth,
    ) -> impl Iterator<Item = (NaiveDate, DayRecord)> + '_ {
        let range = DateKey::from(month.first_day())..=DateKey::from(month.last_day());
        self.records
            .range(range)
            .filter_map(|(key, record)| Some((key.to_date()?, record.clone().into())))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let value = serde_json::to_value(&self.records)?;
        self.backend.persist(ACTIVITIES_KEY, &value)
    }
}

/// Migrates raw persisted entries using the local time zone. See [migrate_in].
pub fn migrate(raw: &Map<String, Value>) -> BTreeMap<DateKey, StoredRecord> {
    migrate_in(raw, &Local)
}

/// Brings every raw entry to the current shape.
///
/// - Plain strings are legacy free text. Blank ones are dropped.
/// - Objects need an `isVacation` discriminant, anything else is dropped.
/// - Every key is rebuilt through midday anchoring, see [rekey_in]. Unparseable keys are dropped.
///
/// When two raw keys end up on the same day a structured record beats free text, otherwise the
/// later raw key wins.
pub fn migrate_in<Tz: TimeZone>(
    raw: &Map<String, Value>,
    tz: &Tz,
) -> BTreeMap<DateKey, StoredRecord> {
    let mut migrated = BTreeMap::new();

    for (raw_key, value) in raw {
        let Some(key) = rekey_in(raw_key, tz) else {
            warn!("Dropping record with unreadable key {raw_key:?}");
            continue;
        };

        let record = match serde_json::from_value::<StoredRecord>(value.clone()) {
            Ok(StoredRecord::Legacy(text)) if text.trim().is_empty() => {
                debug!("Dropping blank legacy record {raw_key}");
                continue;
            }
            Ok(record) => record,
            Err(e) => {
                warn!("Dropping malformed record {raw_key}: {e}");
                continue;
            }
        };

        if key.as_str() != raw_key {
            debug!("Migrating {raw_key} -> {key}");
        }

        match migrated.entry(key) {
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
            Entry::Occupied(mut entry) => {
                let keep_existing = matches!(
                    (entry.get(), &record),
                    (StoredRecord::Structured(_), StoredRecord::Legacy(_))
                );
                if !keep_existing {
                    entry.insert(record);
                }
                debug!("Two records collided on {}", entry.key());
            }
        }
    }

    migrated
}

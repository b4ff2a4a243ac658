//! Generation index persisted next to the entries.
//!
//! Layout inside the database:
//!
//! | key | value |
//! |-----|-------|
//! | `\0shelter/generations` | bincode `Vec<GenerationName>` |
//! | `\0shelter/index/<generation>` | bincode `Vec<CacheKey>` |
//! | `<generation>\x1f<method> <url>` | encoded stored response |
//!
//! The leading NUL keeps index records out of the entry key space.

use std::collections::{BTreeMap, BTreeSet};

use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use feoxdb::{FeoxError, FeoxStore};
use shelter_core::{CacheKey, GenerationName};

use crate::FeOxDbError;

const GENERATIONS_KEY: &[u8] = b"\0shelter/generations";
const INDEX_PREFIX: &str = "\0shelter/index/";
const SEPARATOR: char = '\u{1f}';

pub(crate) fn entry_key(generation: &GenerationName, key: &CacheKey) -> Vec<u8> {
    format!("{generation}{SEPARATOR}{key}").into_bytes()
}

fn index_key(generation: &GenerationName) -> Vec<u8> {
    format!("{INDEX_PREFIX}{generation}").into_bytes()
}

fn read_record<T>(store: &FeoxStore, key: &[u8]) -> Result<Option<T>, FeOxDbError>
where
    T: serde::de::DeserializeOwned,
{
    match store.get(key) {
        Ok(encoded) => {
            let (value, _) = decode_from_slice(&encoded, bincode_config())?;
            Ok(Some(value))
        }
        Err(FeoxError::KeyNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// In-memory mirror of the persisted index.
#[derive(Debug, Default)]
pub(crate) struct GenerationIndex {
    generations: BTreeMap<GenerationName, BTreeSet<CacheKey>>,
}

impl GenerationIndex {
    pub(crate) fn load(store: &FeoxStore) -> Result<Self, FeOxDbError> {
        let names: Vec<GenerationName> = read_record(store, GENERATIONS_KEY)?.unwrap_or_default();
        let mut generations = BTreeMap::new();
        for name in names {
            let keys: Vec<CacheKey> = read_record(store, &index_key(&name))?.unwrap_or_default();
            generations.insert(name, keys.into_iter().collect());
        }
        Ok(Self { generations })
    }

    pub(crate) fn names(&self) -> Vec<GenerationName> {
        self.generations.keys().cloned().collect()
    }

    /// Registers `generation`, persisting the list if it is new.
    pub(crate) fn open(
        &mut self,
        store: &FeoxStore,
        generation: &GenerationName,
    ) -> Result<(), FeOxDbError> {
        if self.generations.contains_key(generation) {
            return Ok(());
        }
        self.generations.insert(generation.clone(), BTreeSet::new());
        self.persist_names(store)
    }

    pub(crate) fn insert(
        &mut self,
        store: &FeoxStore,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> Result<(), FeOxDbError> {
        self.open(store, generation)?;
        let inserted = self
            .generations
            .get_mut(generation)
            .is_some_and(|keys| keys.insert(key.clone()));
        if inserted {
            self.persist_keys(store, generation)?;
        }
        Ok(())
    }

    pub(crate) fn remove(
        &mut self,
        store: &FeoxStore,
        generation: &GenerationName,
        key: &CacheKey,
    ) -> Result<(), FeOxDbError> {
        let removed = self
            .generations
            .get_mut(generation)
            .is_some_and(|keys| keys.remove(key));
        if removed {
            self.persist_keys(store, generation)?;
        }
        Ok(())
    }

    /// Deletes every entry of `generation` and its index records.
    ///
    /// Returns the number of entries removed, or `None` if the generation
    /// was unknown.
    ///
    /// The generation stays in the in-memory index until its entries, its
    /// key record and the persisted name list are all gone. A failure part
    /// way through leaves it listed by [`names`](Self::names), holding only
    /// the keys not deleted yet, so the next activation prunes it again.
    pub(crate) fn drop_generation(
        &mut self,
        store: &FeoxStore,
        generation: &GenerationName,
    ) -> Result<Option<u32>, FeOxDbError> {
        let Some(keys) = self.generations.get_mut(generation) else {
            return Ok(None);
        };
        let mut deleted = 0u32;
        while let Some(key) = keys.first().cloned() {
            match store.delete(&entry_key(generation, &key)) {
                Ok(_) => deleted += 1,
                Err(FeoxError::KeyNotFound) => {}
                Err(err) => return Err(err.into()),
            }
            keys.remove(&key);
        }
        match store.delete(&index_key(generation)) {
            Ok(_) | Err(FeoxError::KeyNotFound) => {}
            Err(err) => return Err(err.into()),
        }
        let remaining: Vec<&GenerationName> = self
            .generations
            .keys()
            .filter(|name| *name != generation)
            .collect();
        let encoded = encode_to_vec(&remaining, bincode_config())?;
        store.insert(GENERATIONS_KEY, &encoded)?;
        self.generations.remove(generation);
        Ok(Some(deleted))
    }

    fn persist_names(&self, store: &FeoxStore) -> Result<(), FeOxDbError> {
        let encoded = encode_to_vec(self.names(), bincode_config())?;
        store.insert(GENERATIONS_KEY, &encoded)?;
        Ok(())
    }

    fn persist_keys(
        &self,
        store: &FeoxStore,
        generation: &GenerationName,
    ) -> Result<(), FeOxDbError> {
        let keys: Vec<&CacheKey> = self
            .generations
            .get(generation)
            .map(|keys| keys.iter().collect())
            .unwrap_or_default();
        let encoded = encode_to_vec(&keys, bincode_config())?;
        store.insert(&index_key(generation), &encoded)?;
        Ok(())
    }
}

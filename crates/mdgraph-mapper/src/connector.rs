use mdgraph_odb::Realm;
use tracing::debug;

use crate::{Mapper, MapperError, Reference};

#[derive(Debug)]
enum State<V> {
    /// Only the reference is held.
    Unmapped,
    /// Value materialized; `None` is the absent value of a none-reference.
    Mapped { value: Option<V>, modified: bool },
}

/// Lazily materialized value.
///
/// ```text
/// Unmapped --load--> Clean --touch/get_mut--> Dirty --save--> Clean
///    ^                 |
///    +------purge------+
/// ```
///
/// An unmapped connector always holds a reference, and a dirty one cannot
/// be purged.
#[derive(Debug)]
pub struct Connector<V> {
    type_tag: String,
    reference: Option<Reference>,
    realm: Option<Realm>,
    state: State<V>,
}

impl<V> Connector<V> {
    /// New, unsaved value. Starts dirty.
    pub fn from_object(type_tag: impl Into<String>, value: V) -> Self {
        Self {
            type_tag: type_tag.into(),
            reference: None,
            realm: None,
            state: State::Mapped {
                value: Some(value),
                modified: true,
            },
        }
    }

    /// Unmapped connector for a stored value. `realm` falls back to the
    /// mapper's default realm when `None`.
    pub fn from_reference(reference: Reference, realm: Option<Realm>) -> Self {
        Self {
            type_tag: reference.type_tag.clone(),
            reference: Some(reference),
            realm,
            state: State::Unmapped,
        }
    }

    /// Connector for "no object" of type `type_tag`.
    pub fn none(type_tag: impl Into<String>) -> Self {
        let type_tag = type_tag.into();
        Self::from_reference(Reference::none(type_tag), None)
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Reference of the last load or save, if any.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }

    /// Realm the value was last loaded from or saved to.
    pub fn realm(&self) -> Option<&Realm> {
        self.realm.as_ref()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.state, State::Mapped { .. })
    }

    pub fn is_modified(&self) -> bool {
        matches!(self.state, State::Mapped { modified: true, .. })
    }

    /// Has a reference that reflects the current value.
    pub fn is_saved(&self) -> bool {
        self.reference.is_some() && !self.is_modified()
    }

    /// The materialized value, without loading.
    pub fn peek(&self) -> Option<&V> {
        match &self.state {
            State::Mapped { value, .. } => value.as_ref(),
            State::Unmapped => None,
        }
    }

    /// Materialize the value. `Ok(None)` for a none-reference.
    pub fn load(&mut self, mapper: &Mapper<V>) -> Result<Option<&V>, MapperError> {
        self.ensure_loaded(mapper)?;
        Ok(self.peek())
    }

    /// Same as [`load`](Self::load).
    pub fn get(&mut self, mapper: &Mapper<V>) -> Result<Option<&V>, MapperError> {
        self.load(mapper)
    }

    /// Materialize and mark dirty.
    pub fn get_mut(&mut self, mapper: &Mapper<V>) -> Result<Option<&mut V>, MapperError> {
        self.ensure_loaded(mapper)?;
        match &mut self.state {
            State::Mapped { value, modified } => {
                *modified = true;
                Ok(value.as_mut())
            }
            State::Unmapped => Err(MapperError::IllegalState("value vanished during load")),
        }
    }

    /// Replace the value and mark dirty.
    pub fn set(&mut self, value: Option<V>) {
        self.state = State::Mapped {
            value,
            modified: true,
        };
    }

    /// Record an in-place mutation of the materialized value.
    pub fn touch(&mut self) -> Result<(), MapperError> {
        match &mut self.state {
            State::Mapped { modified, .. } => {
                *modified = true;
                Ok(())
            }
            State::Unmapped => Err(MapperError::IllegalState("cannot touch an unmapped connector")),
        }
    }

    /// Save into the connector's realm, or the mapper's default.
    pub fn save(&mut self, mapper: &Mapper<V>, force: bool) -> Result<Reference, MapperError> {
        let realm = self
            .realm
            .clone()
            .or_else(|| mapper.default_realm().cloned())
            .ok_or(MapperError::MissingDestination)?;
        self.save_to(mapper, &realm, force)
    }

    /// Save into `realm`.
    ///
    /// A clean connector already saved in `realm` returns its reference
    /// without writing unless `force` is set. Saving into a different realm
    /// than the value came from loads it first and writes it in full.
    pub fn save_to(&mut self, mapper: &Mapper<V>, realm: &Realm, force: bool) -> Result<Reference, MapperError> {
        let relocating = self
            .realm
            .as_ref()
            .or(mapper.default_realm())
            .is_some_and(|r| r != realm);
        if !force && !relocating && !self.is_modified() {
            if let Some(reference) = &self.reference {
                return Ok(reference.clone());
            }
        }

        self.ensure_loaded(mapper)?;
        let State::Mapped { value, modified } = &mut self.state else {
            return Err(MapperError::IllegalState("value vanished during load"));
        };
        let location = match value {
            Some(value) => Some(mapper.codec(&self.type_tag)?.encode(value, mapper, realm)?),
            None => None,
        };
        *modified = false;

        let reference = Reference {
            type_tag: self.type_tag.clone(),
            location,
        };
        debug!(realm = %realm, reference = %reference, "saved connector");
        self.reference = Some(reference.clone());
        self.realm = Some(realm.clone());
        Ok(reference)
    }

    /// Drop the materialized value, keeping only the reference.
    pub fn purge(&mut self) -> Result<(), MapperError> {
        match self.state {
            State::Unmapped => Ok(()),
            State::Mapped { modified: true, .. } => {
                Err(MapperError::IllegalState("cannot purge a modified connector"))
            }
            State::Mapped { .. } if self.reference.is_none() => {
                Err(MapperError::IllegalState("cannot purge a connector that was never saved"))
            }
            State::Mapped { .. } => {
                self.state = State::Unmapped;
                debug!(tag = %self.type_tag, "purged connector");
                Ok(())
            }
        }
    }

    /// Independent, dirty copy of the value.
    ///
    /// An unmapped source is loaded for the copy and unmapped again
    /// afterwards. The copy has no reference or realm, so it can be saved
    /// anywhere.
    pub fn deep_copy(&mut self, mapper: &Mapper<V>) -> Result<Connector<V>, MapperError> {
        let was_unmapped = !self.is_mapped();
        self.ensure_loaded(mapper)?;

        let copied = match &mut self.state {
            State::Mapped { value: Some(value), .. } => mapper
                .codec(&self.type_tag)
                .and_then(|codec| codec.copy_value(value, mapper))
                .map(Some),
            _ => Ok(None),
        };
        if was_unmapped {
            self.state = State::Unmapped;
        }

        Ok(Connector {
            type_tag: self.type_tag.clone(),
            reference: None,
            realm: None,
            state: State::Mapped {
                value: copied?,
                modified: true,
            },
        })
    }

    fn ensure_loaded(&mut self, mapper: &Mapper<V>) -> Result<(), MapperError> {
        if self.is_mapped() {
            return Ok(());
        }
        let reference = self
            .reference
            .as_ref()
            .ok_or(MapperError::IllegalState("unmapped connector without a reference"))?;

        let value = match &reference.location {
            None => None,
            Some(oid) => {
                let realm = self
                    .realm
                    .clone()
                    .or_else(|| mapper.default_realm().cloned())
                    .ok_or(MapperError::MissingDestination)?;
                let value = mapper.codec(&reference.type_tag)?.decode(oid, mapper, &realm)?;
                debug!(realm = %realm, reference = %reference, "loaded connector");
                self.realm = Some(realm);
                Some(value)
            }
        };
        self.state = State::Mapped {
            value,
            modified: false,
        };
        Ok(())
    }
}

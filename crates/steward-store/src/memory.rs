use crate::api::ResourceStore;
use crate::{mint_uid, validate_ref, StoreError};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use steward_schema::{Namespace, ObjectRef, Resource, ResourceKind, ResourceVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreVerb {
    Create,
    Get,
    Update,
    Delete,
    List,
}

/// One call recorded in the [`MemoryStore`] journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOp {
    pub verb: StoreVerb,
    pub kind: ResourceKind,
    pub name: Option<String>,
    pub succeeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Conflict,
    Unavailable,
}

/// Injected failure for the next `times` matching calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub verb: StoreVerb,
    pub kind: ResourceKind,
    pub kind_of_error: FaultKind,
    pub times: u32,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectRef, Resource>,
    sequence: u64,
    journal: Vec<StoreOp>,
    faults: Vec<Fault>,
}

impl State {
    fn next_version(&mut self) -> ResourceVersion {
        self.sequence += 1;
        ResourceVersion::new(self.sequence.to_string())
    }

    fn take_fault(&mut self, verb: StoreVerb, object: &ObjectRef) -> Option<StoreError> {
        let fault = self
            .faults
            .iter_mut()
            .find(|f| f.verb == verb && f.kind == object.kind && f.times > 0)?;
        fault.times -= 1;
        let err = match fault.kind_of_error {
            FaultKind::Conflict => StoreError::Conflict {
                object: object.clone(),
                submitted: "injected".to_owned(),
                current: "injected".to_owned(),
            },
            FaultKind::Unavailable => {
                StoreError::Unavailable(format!("injected failure on {object}"))
            }
        };
        self.faults.retain(|f| f.times > 0);
        Some(err)
    }

    fn record<T>(
        &mut self,
        verb: StoreVerb,
        kind: ResourceKind,
        name: Option<&str>,
        result: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        self.journal.push(StoreOp {
            verb,
            kind,
            name: name.map(str::to_owned),
            succeeded: result.is_ok(),
        });
        result
    }
}

/// Process-local store used by tests and dry runs.
///
/// Every call is appended to a journal so callers can assert exactly which
/// writes a reconciliation pass issued.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::LockFailed(format!("mutex poisoned: {e}")))
    }

    /// Fail the next `fault.times` calls matching verb and kind.
    pub fn inject(&self, fault: Fault) {
        if let Ok(mut state) = self.lock() {
            state.faults.push(fault);
        }
    }

    pub fn journal(&self) -> Vec<StoreOp> {
        self.lock().map(|s| s.journal.clone()).unwrap_or_default()
    }

    pub fn clear_journal(&self) {
        if let Ok(mut state) = self.lock() {
            state.journal.clear();
        }
    }

    /// Number of successful calls matching verb and kind.
    pub fn count(&self, verb: StoreVerb, kind: ResourceKind) -> usize {
        self.journal()
            .iter()
            .filter(|op| op.verb == verb && op.kind == kind && op.succeeded)
            .count()
    }

    /// Number of calls matching verb and kind, failed ones included.
    pub fn attempts(&self, verb: StoreVerb, kind: ResourceKind) -> usize {
        self.journal()
            .iter()
            .filter(|op| op.verb == verb && op.kind == kind)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.objects.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn do_create(state: &mut State, resource: &Resource) -> Result<Resource, StoreError> {
        let object = resource.object_ref();
        validate_ref(&object)?;
        if let Some(err) = state.take_fault(StoreVerb::Create, &object) {
            return Err(err);
        }
        if state.objects.contains_key(&object) {
            return Err(StoreError::AlreadyExists(object));
        }
        let mut stored = resource.clone();
        let version = state.next_version();
        let meta = stored.meta_mut();
        if meta.uid.is_none() {
            meta.uid = Some(mint_uid(&object, state.sequence));
        }
        meta.resource_version = Some(version);
        meta.creation_timestamp = Some(chrono::Utc::now().to_rfc3339());
        state.objects.insert(object, stored.clone());
        Ok(stored)
    }

    fn do_get(state: &mut State, object: &ObjectRef) -> Result<Resource, StoreError> {
        if let Some(err) = state.take_fault(StoreVerb::Get, object) {
            return Err(err);
        }
        state
            .objects
            .get(object)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(object.clone()))
    }

    fn do_update(state: &mut State, resource: &Resource) -> Result<Resource, StoreError> {
        let object = resource.object_ref();
        if let Some(err) = state.take_fault(StoreVerb::Update, &object) {
            return Err(err);
        }
        let current = state
            .objects
            .get(&object)
            .ok_or_else(|| StoreError::NotFound(object.clone()))?;
        let current_version = current.meta().resource_version.clone().unwrap_or_default();
        let current_uid = current.meta().uid.clone();
        let current_created = current.meta().creation_timestamp.clone();
        let submitted = resource.meta().resource_version.clone();
        if submitted.as_ref() != Some(&current_version) {
            return Err(StoreError::Conflict {
                object,
                submitted: submitted.map(ResourceVersion::into_inner).unwrap_or_default(),
                current: current_version.into_inner(),
            });
        }
        let mut stored = resource.clone();
        let version = state.next_version();
        let meta = stored.meta_mut();
        meta.resource_version = Some(version);
        meta.uid = current_uid;
        meta.creation_timestamp = current_created;
        state.objects.insert(object, stored.clone());
        Ok(stored)
    }

    fn do_delete(state: &mut State, object: &ObjectRef) -> Result<(), StoreError> {
        if let Some(err) = state.take_fault(StoreVerb::Delete, object) {
            return Err(err);
        }
        state
            .objects
            .remove(object)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(object.clone()))
    }
}

impl ResourceStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn create(&self, resource: &Resource) -> Result<Resource, StoreError> {
        let mut state = self.lock()?;
        let result = Self::do_create(&mut state, resource);
        let name = resource.meta().name.clone();
        state.record(StoreVerb::Create, resource.kind(), Some(&name), result)
    }

    fn get(&self, object: &ObjectRef) -> Result<Resource, StoreError> {
        let mut state = self.lock()?;
        let result = Self::do_get(&mut state, object);
        state.record(StoreVerb::Get, object.kind, Some(&object.name), result)
    }

    fn update(&self, resource: &Resource) -> Result<Resource, StoreError> {
        let mut state = self.lock()?;
        let result = Self::do_update(&mut state, resource);
        let name = resource.meta().name.clone();
        state.record(StoreVerb::Update, resource.kind(), Some(&name), result)
    }

    fn delete(&self, object: &ObjectRef) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let result = Self::do_delete(&mut state, object);
        state.record(StoreVerb::Delete, object.kind, Some(&object.name), result)
    }

    fn list(&self, kind: ResourceKind, namespace: &Namespace) -> Result<Vec<Resource>, StoreError> {
        let mut state = self.lock()?;
        let items: Vec<Resource> = state
            .objects
            .iter()
            .filter(|(r, _)| r.kind == kind && r.namespace == *namespace)
            .map(|(_, res)| res.clone())
            .collect();
        state.record(StoreVerb::List, kind, None, Ok(items))
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use geometry_accel::selection::Density;
use geometry_accel::spatial::Bounds;
use geometry_accel::store::{
    ElementQuery, ElementRecord, ElementStream, GeometryField, GeometrySummary, ModelStore, ReadSession, Revision,
    StoreError, TypeHandle,
};
use geometry_accel::types::{ElementId, GeometryDataId, RevisionId};

pub const SCHEMA: &str = "ifc2x3tc1";

// Every type other than the base type is a direct subtype of it, so a query
// on the base type matches everything.
pub const BASE_TYPE: &str = "IfcProduct";
const BASE_HANDLE: TypeHandle = TypeHandle::new(0);
const TYPES: [&str; 6] = [
    "IfcProduct",
    "IfcWall",
    "IfcDoor",
    "IfcSpace",
    "IfcOpeningElement",
    "IfcFurnishingElement",
];

#[derive(Debug, Clone)]
struct StoredElement {
    record: ElementRecord,
    type_handle: TypeHandle,
}

#[derive(Debug, Clone, Default)]
struct StoreData {
    revisions: HashMap<RevisionId, Revision>,
    elements: Vec<StoredElement>,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub queries_run: AtomicUsize,
    pub revision_reads: AtomicUsize,
}

#[derive(Debug, Default)]
struct Behaviour {
    fail_next_opens: AtomicUsize,
    fail_streams: AtomicBool,
    query_delay_ms: AtomicU64,
}

/// In-memory model store with session accounting and failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Arc<StoreData>,
    counters: Arc<Counters>,
    behaviour: Arc<Behaviour>,
}

pub fn rid(raw: i64) -> RevisionId {
    RevisionId::new(raw)
}

pub fn gid(raw: i64) -> GeometryDataId {
    GeometryDataId::new(raw)
}

pub fn cube(min: f64, max: f64) -> Bounds {
    Bounds::from_arrays([min; 3], [max; 3])
}

pub fn no_types() -> Vec<String> {
    Vec::new()
}

pub fn no_reuse() -> Vec<GeometryDataId> {
    Vec::new()
}

fn type_handle(type_name: &str) -> Option<TypeHandle> {
    TYPES
        .iter()
        .position(|name| *name == type_name)
        .map(|index| TypeHandle::new(index as u32))
}

/// Geometry of one element as the store would report it.
pub fn geometry(data_id: i64, density: f32, primitive_count: u32, bounds: Bounds) -> GeometrySummary {
    GeometrySummary {
        density,
        data_id: gid(data_id),
        primitive_count,
        saveable_triangles: u64::from(primitive_count),
        bounds_mm: Some(bounds),
        data_bounds_mm: Some(bounds),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn data_mut(&mut self) -> &mut StoreData {
        Arc::make_mut(&mut self.data)
    }

    pub fn add_revision(&mut self, id: RevisionId, bounds_mm: Bounds, densities: Vec<Density>) -> &mut Self {
        self.data_mut().revisions.insert(
            id,
            Revision {
                id,
                schema: SCHEMA.to_string(),
                bounds_mm,
                densities,
            },
        );
        self
    }

    pub fn add_element(
        &mut self,
        revision_id: RevisionId,
        element_id: i64,
        type_name: &str,
        geometry: Option<GeometrySummary>,
    ) -> &mut Self {
        let type_handle = type_handle(type_name).expect("test type must be known");
        self.data_mut().elements.push(StoredElement {
            record: ElementRecord {
                element_id: ElementId::new(element_id),
                revision_id,
                geometry,
            },
            type_handle,
        });
        self
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn sessions_opened(&self) -> usize {
        self.counters.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.counters.sessions_closed.load(Ordering::SeqCst)
    }

    pub fn queries_run(&self) -> usize {
        self.counters.queries_run.load(Ordering::SeqCst)
    }

    pub fn fail_next_opens(&self, count: usize) {
        self.behaviour.fail_next_opens.store(count, Ordering::SeqCst);
    }

    pub fn fail_streams(&self, fail: bool) {
        self.behaviour.fail_streams.store(fail, Ordering::SeqCst);
    }

    pub fn set_query_delay(&self, delay: Duration) {
        self.behaviour
            .query_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

pub struct MemorySession {
    data: Arc<StoreData>,
    counters: Arc<Counters>,
    behaviour: Arc<Behaviour>,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.counters.sessions_closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl ModelStore for MemoryStore {
    type Session = MemorySession;

    fn open_read_session(&self) -> Result<MemorySession, StoreError> {
        let failing = self
            .behaviour
            .fail_next_opens
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::SessionUnavailable("injected failure".into()));
        }
        self.counters.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            data: Arc::clone(&self.data),
            counters: Arc::clone(&self.counters),
            behaviour: Arc::clone(&self.behaviour),
        })
    }
}

impl ReadSession for MemorySession {
    fn revision(&self, id: RevisionId) -> Result<Revision, StoreError> {
        self.counters.revision_reads.fetch_add(1, Ordering::SeqCst);
        self.data
            .revisions
            .get(&id)
            .cloned()
            .ok_or(StoreError::RevisionNotFound(id))
    }

    fn resolve_type(&self, schema: &str, type_name: &str) -> Result<Option<TypeHandle>, StoreError> {
        if schema != SCHEMA {
            return Err(StoreError::Read(format!("unknown schema {schema}")));
        }
        Ok(type_handle(type_name))
    }

    fn query(&self, query: &ElementQuery) -> Result<ElementStream<'_>, StoreError> {
        self.counters.queries_run.fetch_add(1, Ordering::SeqCst);
        let delay = self.behaviour.query_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }

        let base = query.base_type();
        let excluded = query.excluded_types().clone();
        let revisions = query.revision_ids().clone();
        let with_geometry = query.includes(GeometryField::Geometry);
        let with_bounds = query.includes(GeometryField::GeometryBounds);
        let with_data_bounds =
            query.includes(GeometryField::GeometryData) && query.includes(GeometryField::GeometryDataBounds);

        let records = self
            .data
            .elements
            .iter()
            .filter(move |element| revisions.contains(&element.record.revision_id))
            .filter(move |element| element.type_handle == base || base == BASE_HANDLE)
            .filter(move |element| !excluded.contains(&element.type_handle))
            .map(move |element| {
                let mut record = element.record.clone();
                record.geometry = if with_geometry {
                    record.geometry.map(|mut geometry| {
                        if !with_bounds {
                            geometry.bounds_mm = None;
                        }
                        if !with_data_bounds {
                            geometry.data_bounds_mm = None;
                        }
                        geometry
                    })
                } else {
                    None
                };
                Ok::<_, StoreError>(record)
            });

        if self.behaviour.fail_streams.load(Ordering::SeqCst) {
            let failure = std::iter::once(Err(StoreError::Read("injected stream failure".into())));
            return Ok(Box::new(records.take(1).chain(failure)));
        }
        Ok(Box::new(records))
    }
}

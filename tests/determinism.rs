mod common;

use std::collections::BTreeMap;

use common::{cube, geometry, no_reuse, no_types, rid, MemoryStore};
use geometry_accel::spatial::{Bounds, GeometryObject, Octree};
use geometry_accel::GeometryAccelerator;

struct Element {
    id: i64,
    type_name: &'static str,
    density: f32,
    triangles: u32,
    bounds: Bounds,
}

fn elements() -> Vec<Element> {
    let types = ["IfcWall", "IfcDoor", "IfcSpace", "IfcFurnishingElement"];
    (0..60)
        .map(|i| {
            let offset = f64::from((i * 37) % 90);
            Element {
                id: 1000 + i64::from(i),
                type_name: types[(i % 4) as usize],
                density: ((i * 7) % 5) as f32 * 0.5,
                triangles: ((i * 13) % 11 + 1) as u32 * 10,
                bounds: Bounds::from_arrays([offset, offset / 2.0, 3.0], [offset + 2.5, offset / 2.0 + 1.0, 4.0]),
            }
        })
        .collect()
}

fn store_with<'a>(elements: impl Iterator<Item = &'a Element>) -> MemoryStore {
    let mut store = MemoryStore::new();
    store.add_revision(rid(1), cube(0.0, 100.0), Vec::new());
    for (n, element) in elements.enumerate() {
        store.add_element(
            rid(1),
            element.id,
            element.type_name,
            Some(geometry(n as i64, element.density, element.triangles, element.bounds)),
        );
    }
    store
}

/// Node id -> element ids in stored order.
fn layout(octree: &Octree<GeometryObject>) -> BTreeMap<u64, Vec<i64>> {
    let mut layout: BTreeMap<u64, Vec<i64>> = BTreeMap::new();
    octree.visit_breadth_first(None, |node| {
        let ids: Vec<i64> = node.values().iter().map(|entry| entry.value.element_id.raw()).collect();
        layout.insert(node.id(), ids);
    });
    layout
}

fn build(store: MemoryStore) -> BTreeMap<u64, Vec<i64>> {
    let accelerator = GeometryAccelerator::new(store);
    let octree = accelerator
        .get_octree([rid(1)], no_types(), no_reuse(), 4, 0.0, f32::MAX)
        .unwrap();
    layout(&octree)
}

#[test]
fn octree_layout_independent_of_element_order() {
    let elements = elements();

    let forward = build(store_with(elements.iter()));
    let backward = build(store_with(elements.iter().rev()));

    assert_eq!(forward, backward);
    assert_eq!(forward.values().map(Vec::len).sum::<usize>(), elements.len());
}

#[test]
fn node_values_are_densest_first() {
    let accelerator = GeometryAccelerator::new(store_with(elements().iter()));
    let octree = accelerator
        .get_octree([rid(1)], no_types(), no_reuse(), 4, 0.0, f32::MAX)
        .unwrap();

    octree.visit_breadth_first(None, |node| {
        for pair in node.values().windows(2) {
            let (a, b) = (&pair[0].value, &pair[1].value);
            assert!(
                a.density > b.density || (a.density == b.density && a.triangles >= b.triangles),
                "node {} is out of order: {a:?} before {b:?}",
                node.id()
            );
        }
    });
}

#[test]
fn repeated_builds_are_identical() {
    let elements = elements();
    let first = build(store_with(elements.iter()));
    let second = build(store_with(elements.iter()));
    assert_eq!(first, second);
}

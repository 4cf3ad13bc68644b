use std::cell::RefCell;
use std::collections::HashMap;

use crate::geometry::RdcOffsetCurve;
use crate::math::{roots, Vector3};

/// Cap on cached entries; the cache is cleared wholesale when full, so
/// eviction is explicit and correctness never depends on it.
const CACHE_CAPACITY: usize = 256;

thread_local! {
    static CACHE: RefCell<HashMap<Vec<u64>, Vec<f64>>> = RefCell::new(HashMap::new());
}

/// Parameters of an offset curve where it meets the circle `p . n = h`.
///
/// There is no closed form; the signed plane distance along the offset
/// curve is scanned with the periodic bracket-and-refine search. Results
/// are cached per (curve, circle) so repeated probes against the same
/// circle are amortized.
#[must_use]
pub fn offset_circle_roots(curve: &RdcOffsetCurve, n: &Vector3, h: f64) -> Vec<f64> {
    let key = cache_key(curve, n, h);
    if let Some(hit) = CACHE.with(|c| c.borrow().get(&key).cloned()) {
        return hit;
    }
    let objective = |theta: f64| curve.point(theta).dot(n) - h;
    let found = roots::periodic_roots(objective, roots::DEFAULT_SAMPLES, 1e-9);
    CACHE.with(|c| {
        let mut map = c.borrow_mut();
        if map.len() >= CACHE_CAPACITY {
            map.clear();
        }
        map.insert(key, found.clone());
    });
    found
}

/// Drops all cached offset intersection results for this thread.
pub fn clear_offset_cache() {
    CACHE.with(|c| c.borrow_mut().clear());
}

fn cache_key(curve: &RdcOffsetCurve, n: &Vector3, h: f64) -> Vec<u64> {
    let base = curve.base();
    let tensor = base.tensor();
    let mut key = Vec::with_capacity(20);
    for value in [tensor.dxx(), tensor.dyy(), tensor.dzz()] {
        key.push(value.to_bits());
    }
    for value in tensor.rot_pof_to_mol().matrix().iter() {
        key.push(value.to_bits());
    }
    key.push(base.d().to_bits());
    key.push(u64::from(base.arcnum()));
    key.push(curve.distance().to_bits());
    for value in [n.x, n.y, n.z, h] {
        key.push(value.to_bits());
    }
    key
}

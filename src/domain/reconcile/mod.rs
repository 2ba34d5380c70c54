//! Folding partial updates into locally cached entity lists.
//!
//! Every consumer that keeps a list of incidents, responders or ambulances
//! merges incoming updates the same way:
//!
//! - an entity with the same id is replaced by the shallow merge of its
//!   fields and the update's present fields, keeping its position;
//! - otherwise a new entity built from the update is appended.
//!
//! The functions here are pure: they take the current list by reference and
//! return the new one.

mod entities;
mod json;

pub use entities::{
    Ambulance, AmbulancePatch, BedPool, BedPoolPatch, Eta, Incident, IncidentPatch, Priority,
    Responder, ResponderPatch, TimelineEntry,
};
pub use json::upsert_json;

/// An entity that can absorb partial updates keyed by id.
pub trait Reconcile: Clone {
    type Id: PartialEq;
    type Patch;

    fn id(&self) -> &Self::Id;

    fn patch_id(patch: &Self::Patch) -> &Self::Id;

    /// Builds a fresh entity from an update with no existing counterpart.
    fn from_patch(patch: &Self::Patch) -> Self;

    /// Overwrites the fields present in `patch`.
    fn apply(&mut self, patch: &Self::Patch);
}

/// Returns `list` with `patch` merged in.
pub fn upsert<T: Reconcile>(list: &[T], patch: &T::Patch) -> Vec<T> {
    let target = T::patch_id(patch);
    let mut next = list.to_vec();

    match next.iter_mut().find(|entity| entity.id() == target) {
        Some(existing) => existing.apply(patch),
        None => next.push(T::from_patch(patch)),
    }

    next
}

/// Applies several updates in arrival order.
pub fn upsert_all<'a, T, I>(list: &[T], patches: I) -> Vec<T>
where
    T: Reconcile,
    T::Patch: 'a,
    I: IntoIterator<Item = &'a T::Patch>,
{
    patches
        .into_iter()
        .fold(list.to_vec(), |acc, patch| upsert(&acc, patch))
}

//! Process-wide record of booted model types

use std::any::{type_name, TypeId};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::info;

use crate::context::Context;
use crate::events::ModelEvent;
use crate::model::lifecycle::fire_static;
use crate::model::Model;

static BOOTED: Lazy<DashMap<TypeId, &'static str>> = Lazy::new(DashMap::new);

/// Boot `M` unless it already was: fires `booting`, runs [`Model::boot`],
/// then fires `booted`.
pub(crate) fn maybe_boot<M: Model>(ctx: &Context) {
    if BOOTED.insert(TypeId::of::<M>(), type_name::<M>()).is_some() {
        return;
    }

    info!(model = type_name::<M>(), "Booting model");
    fire_static::<M>(ctx, ModelEvent::Booting);
    M::boot(ctx);
    fire_static::<M>(ctx, ModelEvent::Booted);
}

/// Forget every booted model type so each boots again on next construction
pub fn clear_booted_models() {
    let count = BOOTED.len();
    BOOTED.clear();
    info!(count, "Cleared booted models");
}

pub fn is_booted<M: 'static>() -> bool {
    BOOTED.contains_key(&TypeId::of::<M>())
}

/// Type names of the booted models
pub fn booted_models() -> Vec<&'static str> {
    BOOTED.iter().map(|entry| *entry.value()).collect()
}
